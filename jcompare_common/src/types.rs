use serde::{Deserialize, Serialize};

/// Outcome of comparing one document pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairStatus {
    /// Documents are structurally equal after ignored fields are stripped
    Ok,
    /// Differences were found
    Bad,
    /// A document failed to load or parse
    FileError,
}

impl PairStatus {
    pub fn is_ok(self) -> bool {
        self == PairStatus::Ok
    }
}

/// Render configuration threaded into the report renderer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderOptions {
    /// Emit ANSI color codes
    pub color: bool,
    /// Character budget for one-line value previews
    pub max_preview_len: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            color: false,
            max_preview_len: 100,
        }
    }
}
