//! The `{messages: {id: {msg_id, msg_name}}}` contract shared by both gateways.
//!
//! Engine hits are reshaped into a mapping keyed by document id. The mapping
//! carries no rank order: it only states that a document with a given id has
//! a given text.

use crate::models::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Numeric form of a document id.
///
/// Ids that parse as `i64` become numbers. Anything else (engine-generated
/// ids such as `"q1xT0JIBf3"`) is kept verbatim as a string, so the coercion
/// never fails and never merges distinct documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageId {
    Numeric(i64),
    Raw(String),
}

impl MessageId {
    pub fn from_document_id(id: &str) -> Self {
        id.parse::<i64>()
            .map(MessageId::Numeric)
            .unwrap_or_else(|_| MessageId::Raw(id.to_string()))
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            MessageId::Numeric(n) => Some(*n),
            MessageId::Raw(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageEntry {
    #[serde(rename = "msg_id")]
    pub numeric_id: MessageId,
    #[serde(rename = "msg_name")]
    pub text: String,
}

impl From<&Document> for MessageEntry {
    fn from(doc: &Document) -> Self {
        Self {
            numeric_id: MessageId::from_document_id(&doc.id),
            text: doc.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageSet {
    #[serde(default)]
    pub messages: BTreeMap<String, MessageEntry>,
}

impl MessageSet {
    pub fn from_documents<I>(documents: I) -> Self
    where
        I: IntoIterator<Item = Document>,
    {
        documents.into_iter().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.messages.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&MessageEntry> {
        self.messages.get(id)
    }
}

impl FromIterator<Document> for MessageSet {
    fn from_iter<T: IntoIterator<Item = Document>>(iter: T) -> Self {
        let messages = iter
            .into_iter()
            .map(|doc| {
                let entry = MessageEntry::from(&doc);
                (doc.id, entry)
            })
            .collect();
        Self { messages }
    }
}

/// What the frontend returns for `/get`: the backend's mapping, or an empty
/// mapping plus the reason the backend could not be used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchOutcome {
    #[serde(default)]
    pub messages: BTreeMap<String, MessageEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FetchOutcome {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            messages: BTreeMap::new(),
            error: Some(error.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl From<MessageSet> for FetchOutcome {
    fn from(set: MessageSet) -> Self {
        Self {
            messages: set.messages,
            error: None,
        }
    }
}
