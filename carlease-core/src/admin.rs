use serde::{Deserialize, Serialize};

use crate::{Record, TableName};

pub(crate) const FIELDS: &[&str] = &["id", "email", "name"];

/// A back-office account.
///
/// The password is stored as an opaque hash; hashing and verification belong
/// to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    pub id: String,
    /// Login name, unique across admins.
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Creation payload for [`Admin`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDraft {
    pub email: String,
    pub password_hash: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// Partial update for [`Admin`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(
        default,
        deserialize_with = "crate::patch::present",
        skip_serializing_if = "Option::is_none"
    )]
    pub name: Option<Option<String>>,
}

impl Record for Admin {
    const TABLE: TableName = TableName::Admins;
    type Draft = AdminDraft;
    type Patch = AdminPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: AdminDraft) -> Self {
        Self {
            id,
            email: draft.email,
            password_hash: draft.password_hash,
            name: draft.name,
        }
    }
}
