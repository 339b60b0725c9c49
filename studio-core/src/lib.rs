pub mod config;
pub mod error;
pub mod gemini;
pub mod generation;
pub mod models;
pub mod prompts;
pub mod store;

pub use config::StudioConfig;
pub use error::StudioError;
pub use gemini::{GeminiTextClient, GenerationError, TextGenerator, GEMINI_BASE_URL};
pub use generation::GenerationService;
pub use models::{ContentRecord, Metadata};
pub use store::{ContentStore, StoreError};
