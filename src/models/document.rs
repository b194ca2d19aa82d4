use crate::engine::Hit;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// A stored document as exposed by the API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier
    pub id: String,
    pub text: String,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

impl From<Hit> for Document {
    fn from(hit: Hit) -> Self {
        Self {
            id: hit.id,
            text: hit.source.text,
        }
    }
}

/// Body of create and update requests
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DocumentInput {
    #[validate(length(min = 1))]
    pub text: String,
}

/// A hit in engine ranking order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedHit {
    pub id: String,
    /// Relevance reported by the engine; absent for unscored listings
    pub score: Option<f64>,
    pub text: String,
}

impl From<Hit> for RankedHit {
    fn from(hit: Hit) -> Self {
        Self {
            id: hit.id,
            score: hit.score,
            text: hit.source.text,
        }
    }
}

/// Response of the path-based insert
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertReceipt {
    pub status: String,
    pub document: Document,
}

impl InsertReceipt {
    pub fn inserted(document: Document) -> Self {
        Self {
            status: "Inserted".to_string(),
            document,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteConfirmation {
    pub message: String,
}
