use serde::{Deserialize, Serialize};

use crate::{
    DEFAULT_SORT_ORDER, Ordered, Record, TableName,
    patch::{default_sort_order, default_true},
};

pub(crate) const FIELDS: &[&str] = &["id", "question", "answer", "isActive", "sortOrder"];

/// A frequently asked question shown on the public site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faq {
    pub id: String,
    #[serde(default)]
    pub question: String,
    #[serde(default)]
    pub answer: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default = "default_sort_order")]
    pub sort_order: u32,
}

/// Creation payload for [`Faq`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FaqDraft {
    pub question: Option<String>,
    pub answer: Option<String>,
    pub is_active: Option<bool>,
    pub sort_order: Option<u32>,
}

/// Partial update for [`Faq`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FaqPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<u32>,
}

impl Record for Faq {
    const TABLE: TableName = TableName::Faqs;
    type Draft = FaqDraft;
    type Patch = FaqPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: FaqDraft) -> Self {
        Self {
            id,
            question: draft.question.unwrap_or_default(),
            answer: draft.answer.unwrap_or_default(),
            is_active: draft.is_active.unwrap_or(true),
            sort_order: draft.sort_order.unwrap_or(DEFAULT_SORT_ORDER),
        }
    }
}

impl Ordered for Faq {
    fn sort_order(&self) -> u32 {
        self.sort_order
    }

    fn reorder_patch(sort_order: u32) -> FaqPatch {
        FaqPatch {
            sort_order: Some(sort_order),
            ..FaqPatch::default()
        }
    }
}
