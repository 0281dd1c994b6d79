//! Typed repositories over a [`Store`].
//!
//! A [`Table`] is constructed once per process around a shared store and
//! handed to whoever needs it; callers never see which backend is active.

use std::{marker::PhantomData, sync::Arc};

use serde_json::Value;

use crate::{
    Admin, Brand, Color, Faq, Filter, FindMany, MapName, Record, Relation, StoreError, Trim,
    UniqueKey, Vehicle, VehicleOption, ids,
    store::{Document, KeyValueMap, Store},
};

/// Attempts made to find a free identifier before giving up.
const MAX_ID_ATTEMPTS: u32 = 100;

/// Typed access to the table holding `R`.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use carlease_core::{Brand, BrandDraft, BrandPatch, Table, test_support::MemoryStore};
///
/// # fn main() -> Result<(), carlease_core::StoreError> {
/// let brands: Table<Brand> = Table::new(Arc::new(MemoryStore::default()));
/// let kia = brands.create(BrandDraft { name: Some("Kia".into()), ..BrandDraft::default() })?;
/// let patch = BrandPatch { is_domestic: Some(true), ..BrandPatch::default() };
/// let updated = brands.update(&kia.id, &patch)?.expect("brand exists");
/// assert_eq!(updated.name, "Kia");
/// assert!(updated.is_domestic);
/// # Ok(())
/// # }
/// ```
pub struct Table<R> {
    store: Arc<dyn Store>,
    record: PhantomData<fn() -> R>,
}

impl<R> Clone for Table<R> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            record: PhantomData,
        }
    }
}

impl<R> std::fmt::Debug for Table<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl<R: Record> Table<R> {
    /// Wraps a shared store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            record: PhantomData,
        }
    }

    /// Records matching `query`.
    pub fn find_many(&self, query: &FindMany) -> Result<Vec<R>, StoreError> {
        self.store
            .find_many(R::TABLE, query)?
            .into_iter()
            .map(decode)
            .collect()
    }

    /// Record identified by `key`, or `None`.
    pub fn find_unique(&self, key: &UniqueKey) -> Result<Option<R>, StoreError> {
        self.find_unique_with(key, &[])
    }

    /// Record identified by `key` with the given relations attached.
    pub fn find_unique_with(
        &self,
        key: &UniqueKey,
        include: &[Relation],
    ) -> Result<Option<R>, StoreError> {
        self.store
            .find_unique(R::TABLE, key, include)?
            .map(decode)
            .transpose()
    }

    /// Number of records matching `filter`.
    pub fn count(&self, filter: &Filter) -> Result<usize, StoreError> {
        self.store.count(R::TABLE, filter)
    }

    /// Creates a record from `draft`, applying defaults and choosing an
    /// unused identifier.
    ///
    /// When the proposed identifier is taken, `-2`, `-3`, ... are appended.
    pub fn create(&self, draft: R::Draft) -> Result<R, StoreError> {
        let base = R::proposed_id(&draft);
        let id = self.free_id(&base)?;
        let record = R::from_draft(id, draft);
        let stored = self.store.insert(R::TABLE, encode(&record)?)?;
        decode(stored)
    }

    fn free_id(&self, base: &str) -> Result<String, StoreError> {
        for attempt in 1..=MAX_ID_ATTEMPTS {
            let candidate = ids::with_attempt(base, attempt);
            if self
                .store
                .find_unique(R::TABLE, &UniqueKey::id(candidate.as_str()), &[])?
                .is_none()
            {
                return Ok(candidate);
            }
        }
        Err(StoreError::DuplicateId {
            table: R::TABLE,
            id: base.to_owned(),
        })
    }

    /// Applies `patch` to the record with `id`; `None` when it does not
    /// exist.
    pub fn update(&self, id: &str, patch: &R::Patch) -> Result<Option<R>, StoreError> {
        let changes = to_document::<R, _>(patch)?;
        self.store
            .update(R::TABLE, id, changes)?
            .map(decode)
            .transpose()
    }

    /// Deletes the record with `id`, returning whether it existed.
    pub fn delete(&self, id: &str) -> Result<bool, StoreError> {
        self.store.delete(R::TABLE, id)
    }
}

fn encode<R: Record>(record: &R) -> Result<Document, StoreError> {
    to_document::<R, _>(record)
}

fn to_document<R: Record, T: serde::Serialize>(value: &T) -> Result<Document, StoreError> {
    let table = R::TABLE;
    match serde_json::to_value(value) {
        Ok(Value::Object(document)) => Ok(document),
        Ok(_) => Err(StoreError::Encode {
            table,
            source: serde::ser::Error::custom("record did not serialize to an object"),
        }),
        Err(source) => Err(StoreError::Encode { table, source }),
    }
}

fn decode<R: Record>(document: Document) -> Result<R, StoreError> {
    let id = document
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or("?")
        .to_owned();
    serde_json::from_value(Value::Object(document)).map_err(|source| StoreError::Decode {
        table: R::TABLE,
        id,
        source,
    })
}

/// Typed access to one key-value document.
#[derive(Clone)]
pub struct KeyValues {
    store: Arc<dyn Store>,
    name: MapName,
}

impl std::fmt::Debug for KeyValues {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyValues")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl KeyValues {
    /// Handle for the document `name` in `store`.
    pub fn new(store: Arc<dyn Store>, name: MapName) -> Self {
        Self { store, name }
    }

    /// Every entry.
    pub fn all(&self) -> Result<KeyValueMap, StoreError> {
        self.store.load_map(self.name)
    }

    /// Value stored under `key`.
    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.all()?.remove(key))
    }

    /// Stores `value` under `key`, keeping the other entries.
    pub fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.set_many([(key.to_owned(), value.to_owned())])
    }

    /// Stores several entries at once, keeping the others.
    pub fn set_many<I>(&self, entries: I) -> Result<(), StoreError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut all = self.all()?;
        all.extend(entries);
        self.store.save_map(self.name, &all)
    }

    /// Removes `key`, returning whether it was present.
    pub fn remove(&self, key: &str) -> Result<bool, StoreError> {
        let mut all = self.all()?;
        if all.remove(key).is_none() {
            return Ok(false);
        }
        self.store.save_map(self.name, &all)?;
        Ok(true)
    }
}

/// One repository per table plus the key-value documents, sharing a store.
#[derive(Debug, Clone)]
pub struct Tables {
    /// Vehicle manufacturers.
    pub brands: Table<Brand>,
    /// Vehicle models.
    pub vehicles: Table<Vehicle>,
    /// Trim levels.
    pub trims: Table<Trim>,
    /// Colours.
    pub colors: Table<Color>,
    /// Optional extras.
    pub options: Table<VehicleOption>,
    /// Frequently asked questions.
    pub faqs: Table<Faq>,
    /// Back-office accounts.
    pub admins: Table<Admin>,
    /// Site settings.
    pub settings: KeyValues,
    /// Company details.
    pub company_info: KeyValues,
    store: Arc<dyn Store>,
}

impl Tables {
    /// Builds every repository around `store`.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            brands: Table::new(Arc::clone(&store)),
            vehicles: Table::new(Arc::clone(&store)),
            trims: Table::new(Arc::clone(&store)),
            colors: Table::new(Arc::clone(&store)),
            options: Table::new(Arc::clone(&store)),
            faqs: Table::new(Arc::clone(&store)),
            admins: Table::new(Arc::clone(&store)),
            settings: KeyValues::new(Arc::clone(&store), MapName::Settings),
            company_info: KeyValues::new(Arc::clone(&store), MapName::CompanyInfo),
            store,
        }
    }

    /// The shared untyped store.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    /// Handle for the key-value document `name`.
    pub fn key_values(&self, name: MapName) -> &KeyValues {
        match name {
            MapName::Settings => &self.settings,
            MapName::CompanyInfo => &self.company_info,
        }
    }
}
