use serde::{Deserialize, Serialize};

/// Result of the image endpoint. No image is rendered; only the prompt is enhanced,
/// so `image_url` and `image_base64` are always `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePromptEnhancement {
    pub enhanced_prompt: String,
    pub original_prompt: String,
    pub style: String,
    pub size: u32,
    pub image_url: Option<String>,
    pub image_base64: Option<String>,
    pub note: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestedTool {
    ScriptWriter,
    ImageCreator,
    VideoEditor,
    HashtagGenerator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptAnalysis {
    pub analysis: String,
    pub suggested_tools: Vec<SuggestedTool>,
    pub recommendations: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditingStyle {
    Cinematic,
    Vintage,
    Dynamic,
    Professional,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditingSuggestions {
    pub suggestions: String,
    pub editing_style: EditingStyle,
    pub recommendations: String,
}
