use thiserror::Error;

use crate::gemini::GenerationError;
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum StudioError {
    /// A generation task failed; `task` reads as "generate script", "process prompt", ...
    #[error("Failed to {task}: {source}")]
    Task {
        task: &'static str,
        #[source]
        source: GenerationError,
    },

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl StudioError {
    pub fn task(task: &'static str, source: GenerationError) -> Self {
        Self::Task { task, source }
    }
}
