// src/core/model.rs

//! The records managed by the store: things, channels and the connections
//! between them.

use serde::{Deserialize, Serialize};

/// Free-form metadata attached to a thing or a channel.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// A managed device. Each thing carries an access key that is unique across
/// all things.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Thing {
    /// System-generated when left empty on save.
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub name: String,
    pub key: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A topic or group that things publish to or subscribe through.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct Channel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub group_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub metadata: Metadata,
}

/// A single channel/thing pair, as reported by connection lookups.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Connection {
    pub channel_id: String,
    pub thing_id: String,
}

/// The common surface of records stored in an `EntityTable`.
pub trait Entity: Clone + Send + Sync + 'static {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn group_id(&self) -> &str;
    fn name(&self) -> &str;
}

impl Entity for Thing {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn group_id(&self) -> &str {
        &self.group_id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Entity for Channel {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }

    fn group_id(&self) -> &str {
        &self.group_id
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Thing {
    /// Convenience constructor used when only the access key matters.
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            ..Default::default()
        }
    }
}
