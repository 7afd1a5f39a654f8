use serde::{Deserialize, Serialize};

use ecr_types::RecordId;

/// How a store mints ids for records written without one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdStrategy {
    /// Random UUIDs.
    #[default]
    UuidV4,
    /// Time-ordered UUIDs; ids sort by creation time.
    UuidV7,
}

impl IdStrategy {
    pub fn generate(&self) -> RecordId {
        match self {
            Self::UuidV4 => RecordId::random(),
            Self::UuidV7 => RecordId::time_ordered(),
        }
    }
}

/// Configuration for a record store.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub id_strategy: IdStrategy,
}
