use serde::{Deserialize, Serialize};

/// Behavior switches for record views.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcConfig {
    /// Log a warning when `let` writes a key nothing in the chain declares.
    pub warn_undeclared: bool,
    /// Upper bound on link expansion depth in `resolve` and `snapshot`.
    /// Parent-chain lookups are not bounded by it.
    pub max_depth: usize,
}

impl Default for EcConfig {
    fn default() -> Self {
        Self {
            warn_undeclared: true,
            max_depth: 256,
        }
    }
}
