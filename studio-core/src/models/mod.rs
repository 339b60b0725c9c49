pub mod content;
pub mod generation;

pub use content::{ContentRecord, Metadata};
pub use generation::{
    EditingStyle, EditingSuggestions, ImagePromptEnhancement, PromptAnalysis, SuggestedTool,
};
