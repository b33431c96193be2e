//! Request Bodies
//!
//! Raw and form-encoded request bodies.

use std::collections::{BTreeMap, HashMap};

use crate::error::HttpClientError;

/// Content type applied to form bodies sent with `POST`.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Request body handed to the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
    /// Pre-encoded body, sent as-is.
    Raw(String),
    /// Key/value pairs, form-encoded before sending. Order is kept.
    Form(Vec<(String, String)>),
}

impl RequestBody {
    /// Empty raw body.
    pub fn empty() -> Self {
        Self::Raw(String::new())
    }

    /// Build a form body from key/value pairs.
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Whether this is a structured (form) body.
    pub fn is_form(&self) -> bool {
        matches!(self, Self::Form(_))
    }

    /// Whether the body carries no content.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Raw(raw) => raw.is_empty(),
            Self::Form(pairs) => pairs.is_empty(),
        }
    }

    /// Serialize to the exact bytes sent on the wire.
    pub fn encode(&self) -> Result<String, HttpClientError> {
        match self {
            Self::Raw(raw) => Ok(raw.clone()),
            Self::Form(pairs) => serde_urlencoded::to_string(pairs).map_err(|e| {
                HttpClientError::invalid_request(format!("Failed to encode form body: {}", e))
            }),
        }
    }
}

impl Default for RequestBody {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<String> for RequestBody {
    fn from(raw: String) -> Self {
        Self::Raw(raw)
    }
}

impl From<&str> for RequestBody {
    fn from(raw: &str) -> Self {
        Self::Raw(raw.to_string())
    }
}

impl From<Option<String>> for RequestBody {
    fn from(raw: Option<String>) -> Self {
        raw.map(Self::Raw).unwrap_or_default()
    }
}

impl From<Vec<(String, String)>> for RequestBody {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::Form(pairs)
    }
}

impl From<Vec<(&str, &str)>> for RequestBody {
    fn from(pairs: Vec<(&str, &str)>) -> Self {
        Self::form(pairs)
    }
}

impl From<BTreeMap<String, String>> for RequestBody {
    fn from(map: BTreeMap<String, String>) -> Self {
        Self::Form(map.into_iter().collect())
    }
}

/// Hash maps have no stable order; pairs are sorted by key.
impl From<HashMap<String, String>> for RequestBody {
    fn from(map: HashMap<String, String>) -> Self {
        let mut pairs: Vec<_> = map.into_iter().collect();
        pairs.sort();
        Self::Form(pairs)
    }
}
