//! Generation adapter
//!
//! Turns the five creator tasks into model prompts, makes one `TextGenerator`
//! call per task, and parses the returned text into structured results.
//! Failed or empty model calls become `StudioError::Task` carrying the cause.

use std::sync::Arc;

use crate::error::StudioError;
use crate::gemini::{GenerationError, TextGenerator};
use crate::models::{
    EditingStyle, EditingSuggestions, ImagePromptEnhancement, PromptAnalysis, SuggestedTool,
};
use crate::prompts::{self, HASHTAG_COUNT};

pub const DEFAULT_TONE: &str = "professional";
pub const DEFAULT_DURATION: &str = "5";
pub const DEFAULT_STYLE: &str = "realistic";
pub const DEFAULT_SIZE: u32 = 1024;
pub const DEFAULT_PLATFORM: &str = "general";

const IMAGE_NOTE: &str =
    "Image generation requires integration with an image generation API. Enhanced prompt provided.";

/// Tool rules, all evaluated in order; every matching rule contributes its tool.
const TOOL_RULES: &[(&[&str], SuggestedTool)] = &[
    (&["script", "writing"], SuggestedTool::ScriptWriter),
    (&["image", "visual", "thumbnail"], SuggestedTool::ImageCreator),
    (&["video", "editing"], SuggestedTool::VideoEditor),
    (&["hashtag", "social"], SuggestedTool::HashtagGenerator),
];

const DEFAULT_TOOLS: [SuggestedTool; 2] = [SuggestedTool::ScriptWriter, SuggestedTool::ImageCreator];

/// Style rules in priority order; the first match wins.
const STYLE_RULES: &[(&[&str], EditingStyle)] = &[
    (&["cinematic"], EditingStyle::Cinematic),
    (&["vintage", "retro"], EditingStyle::Vintage),
    (&["dynamic", "energetic"], EditingStyle::Dynamic),
];

#[derive(Clone)]
pub struct GenerationService {
    generator: Arc<dyn TextGenerator>,
}

impl GenerationService {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub fn backend_name(&self) -> &str {
        self.generator.name()
    }

    /// Script text exactly as the model returned it.
    pub async fn generate_script(
        &self,
        topic: &str,
        tone: &str,
        duration: &str,
        keywords: Option<&str>,
    ) -> Result<String, StudioError> {
        const TASK: &str = "generate script";

        let minutes: u32 = duration.trim().parse().map_err(|_| {
            StudioError::task(
                TASK,
                GenerationError::InvalidInput(format!(
                    "duration must be a whole number of minutes, got {:?}",
                    duration
                )),
            )
        })?;

        let prompt = prompts::script(topic, tone, duration, minutes, keywords);
        self.complete(TASK, &prompt).await
    }

    pub async fn enhance_image_prompt(
        &self,
        prompt: &str,
        style: &str,
        size: u32,
    ) -> Result<ImagePromptEnhancement, StudioError> {
        let text = self
            .complete("enhance image prompt", &prompts::image_enhancement(prompt, style, size))
            .await?;

        Ok(ImagePromptEnhancement {
            enhanced_prompt: text.trim().to_string(),
            original_prompt: prompt.to_string(),
            style: style.to_string(),
            size,
            image_url: None,
            image_base64: None,
            note: IMAGE_NOTE.to_string(),
        })
    }

    pub async fn generate_hashtags(
        &self,
        topic: &str,
        platform: &str,
    ) -> Result<Vec<String>, StudioError> {
        let text = self
            .complete("generate hashtags", &prompts::hashtags(topic, platform))
            .await?;
        Ok(parse_hashtags(&text, topic))
    }

    pub async fn process_prompt(&self, prompt: &str) -> Result<PromptAnalysis, StudioError> {
        let text = self
            .complete("process prompt", &prompts::prompt_analysis(prompt))
            .await?;

        Ok(PromptAnalysis {
            suggested_tools: suggested_tools(&text),
            analysis: text.clone(),
            recommendations: text,
        })
    }

    pub async fn video_editing_suggestions(
        &self,
        prompt: &str,
    ) -> Result<EditingSuggestions, StudioError> {
        let text = self
            .complete("get video suggestions", &prompts::video_editing(prompt))
            .await?;

        Ok(EditingSuggestions {
            editing_style: editing_style(&text),
            suggestions: text.clone(),
            recommendations: text,
        })
    }

    async fn complete(&self, task: &'static str, prompt: &str) -> Result<String, StudioError> {
        match self.generator.generate(prompt).await {
            Ok(text) if !text.is_empty() => Ok(text),
            Ok(_) => Err(StudioError::task(task, GenerationError::EmptyResponse)),
            Err(e) => {
                tracing::error!(task, backend = self.generator.name(), error = %e, "Generation failed");
                Err(StudioError::task(task, e))
            }
        }
    }
}

/// Parse model output into at most 20 hashtags.
///
/// Keeps trimmed lines that start with `#`. If there are none, the first 20
/// non-empty lines become tags (all `#` removed, one prepended). If that also
/// yields nothing, two tags are derived from `topic`.
pub fn parse_hashtags(text: &str, topic: &str) -> Vec<String> {
    let mut tags: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|l| l.starts_with('#'))
        .map(str::to_string)
        .collect();

    if tags.is_empty() {
        tags = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .take(HASHTAG_COUNT)
            .map(|l| format!("#{}", l.replace('#', "")))
            .collect();
    }

    if tags.is_empty() {
        let compact = topic.replace(' ', "");
        return vec![format!("#{}", compact), format!("#{}", compact.to_lowercase())];
    }

    tags.truncate(HASHTAG_COUNT);
    tags
}

fn contains_any(haystack: &str, triggers: &[&str]) -> bool {
    triggers.iter().any(|t| haystack.contains(t))
}

/// Tools whose trigger words appear in `text` (case-insensitive), in rule order.
pub fn suggested_tools(text: &str) -> Vec<SuggestedTool> {
    let lower = text.to_lowercase();
    let tools: Vec<SuggestedTool> = TOOL_RULES
        .iter()
        .filter(|(triggers, _)| contains_any(&lower, triggers))
        .map(|(_, tool)| *tool)
        .collect();

    if tools.is_empty() {
        DEFAULT_TOOLS.to_vec()
    } else {
        tools
    }
}

/// First style family mentioned in `text` by priority, else `Professional`.
pub fn editing_style(text: &str) -> EditingStyle {
    let lower = text.to_lowercase();
    STYLE_RULES
        .iter()
        .find(|(triggers, _)| contains_any(&lower, triggers))
        .map(|(_, style)| *style)
        .unwrap_or(EditingStyle::Professional)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    /// Replays a fixed reply and records every prompt it receives.
    struct ScriptedGenerator {
        reply: Result<String, u16>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedGenerator {
        fn replying(text: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn failing(code: u16) -> Arc<Self> {
            Arc::new(Self {
                reply: Err(code),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().push(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(code) => Err(GenerationError::Api {
                    code: *code,
                    message: "upstream unavailable".to_string(),
                }),
            }
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    fn service(generator: &Arc<ScriptedGenerator>) -> GenerationService {
        GenerationService::new(generator.clone())
    }

    // --- hashtag parsing ---

    #[test]
    fn test_hashtags_keep_only_hash_lines() {
        assert_eq!(parse_hashtags("#a\n#b\nfiller\n#c", "x"), vec!["#a", "#b", "#c"]);
    }

    #[test]
    fn test_hashtags_trim_surrounding_whitespace() {
        assert_eq!(parse_hashtags("  #rust  \r\n\t#code", "x"), vec!["#rust", "#code"]);
    }

    #[test]
    fn test_hashtags_without_hash_lines_are_prefixed() {
        assert_eq!(parse_hashtags("cats\ndogs", "x"), vec!["#cats", "#dogs"]);
    }

    #[test]
    fn test_hashtags_fallback_strips_inner_hashes_and_skips_blank_lines() {
        assert_eq!(
            parse_hashtags("1. cat#s\n\n   \nbig dogs", "x"),
            vec!["#1. cats", "#big dogs"]
        );
    }

    #[test]
    fn test_hashtags_unusable_text_falls_back_to_topic() {
        let expected = vec!["#HomeWorkouts", "#homeworkouts"];
        assert_eq!(parse_hashtags("", "Home Workouts"), expected);
        assert_eq!(parse_hashtags(" \n\t\n", "Home Workouts"), expected);
    }

    #[test]
    fn test_hashtags_capped_at_twenty_on_both_paths() {
        let tagged: String = (0..30).map(|i| format!("#tag{i}\n")).collect();
        let tags = parse_hashtags(&tagged, "x");
        assert_eq!(tags.len(), 20);
        assert_eq!(tags[19], "#tag19");

        let plain: String = (0..30).map(|i| format!("word{i}\n")).collect();
        let tags = parse_hashtags(&plain, "x");
        assert_eq!(tags.len(), 20);
        assert_eq!(tags[0], "#word0");
    }

    // --- classification rules ---

    #[test]
    fn test_tools_follow_rule_order() {
        let tools = suggested_tools("Post it on SOCIAL media, add a Thumbnail, then write a Script");
        assert_eq!(
            tools,
            vec![
                SuggestedTool::ScriptWriter,
                SuggestedTool::ImageCreator,
                SuggestedTool::HashtagGenerator
            ]
        );
    }

    #[test]
    fn test_tools_default_when_nothing_matches() {
        assert_eq!(
            suggested_tools("A podcast about gardening."),
            vec![SuggestedTool::ScriptWriter, SuggestedTool::ImageCreator]
        );
    }

    #[test]
    fn test_tools_all_four_categories() {
        let tools = suggested_tools("writing, visual, editing, hashtag");
        assert_eq!(tools.len(), 4);
        assert_eq!(tools[2], SuggestedTool::VideoEditor);
    }

    #[test]
    fn test_editing_style_cinematic_beats_later_dynamic() {
        assert_eq!(
            editing_style("Use fast DYNAMIC cuts with a Cinematic grade"),
            EditingStyle::Cinematic
        );
    }

    #[test]
    fn test_editing_style_priority_chain() {
        assert_eq!(editing_style("energetic and retro"), EditingStyle::Vintage);
        assert_eq!(editing_style("keep it Energetic"), EditingStyle::Dynamic);
        assert_eq!(editing_style("clean cuts"), EditingStyle::Professional);
    }

    // --- service operations ---

    #[tokio::test]
    async fn test_generate_script_returns_text_unmodified() {
        let generator = ScriptedGenerator::replying("  HOOK: hello\n\nCTA: subscribe  ");
        let result = service(&generator)
            .generate_script("Rust", "casual", "2", Some("borrowck"))
            .await
            .unwrap();

        assert_eq!(result, "  HOOK: hello\n\nCTA: subscribe  ");
        let prompts = generator.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("approximately 300 words"));
        assert!(prompts[0].contains("Key points to include: borrowck"));
    }

    #[tokio::test]
    async fn test_generate_script_rejects_non_numeric_duration_without_calling_model() {
        let generator = ScriptedGenerator::replying("never used");
        let err = service(&generator)
            .generate_script("Rust", DEFAULT_TONE, "five", None)
            .await
            .unwrap_err();

        assert!(err.to_string().starts_with("Failed to generate script: Invalid input"));
        assert!(generator.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_model_text_is_task_failure() {
        let generator = ScriptedGenerator::replying("");
        let err = service(&generator)
            .generate_script("Rust", DEFAULT_TONE, DEFAULT_DURATION, None)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to generate script: Empty response from Gemini API"
        );
    }

    #[tokio::test]
    async fn test_upstream_error_is_wrapped_with_task_name() {
        let generator = ScriptedGenerator::failing(503);
        let err = service(&generator)
            .generate_hashtags("Rust", DEFAULT_PLATFORM)
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to generate hashtags: API error (503): upstream unavailable"
        );
    }

    #[tokio::test]
    async fn test_image_enhancement_never_carries_image_data() {
        let generator = ScriptedGenerator::replying("\n  A fox in soft morning light  \n");
        let result = service(&generator)
            .enhance_image_prompt("a fox", DEFAULT_STYLE, DEFAULT_SIZE)
            .await
            .unwrap();

        assert_eq!(result.enhanced_prompt, "A fox in soft morning light");
        assert_eq!(result.original_prompt, "a fox");
        assert_eq!(result.style, "realistic");
        assert_eq!(result.size, 1024);
        assert!(result.image_url.is_none());
        assert!(result.image_base64.is_none());
    }

    #[tokio::test]
    async fn test_process_prompt_derives_tools_from_response() {
        let generator = ScriptedGenerator::replying("Record a video and cut it in editing.");
        let result = service(&generator).process_prompt("cooking show").await.unwrap();

        assert_eq!(result.suggested_tools, vec![SuggestedTool::VideoEditor]);
        assert_eq!(result.analysis, result.recommendations);
        assert!(generator.prompts.lock()[0].contains("\"cooking show\""));
    }

    #[tokio::test]
    async fn test_video_suggestions_pick_editing_style() {
        let generator = ScriptedGenerator::replying("Go for a retro film look.");
        let result = service(&generator)
            .video_editing_suggestions("summer road trip")
            .await
            .unwrap();

        assert_eq!(result.editing_style, EditingStyle::Vintage);
        assert_eq!(result.suggestions, "Go for a retro film look.");
    }

    #[tokio::test]
    async fn test_hashtags_through_service() {
        let generator = ScriptedGenerator::replying("Here you go:\n#travel\n#wanderlust");
        let tags = service(&generator)
            .generate_hashtags("travel", "instagram")
            .await
            .unwrap();

        assert_eq!(tags, vec!["#travel", "#wanderlust"]);
        assert!(generator.prompts.lock()[0].contains("Platform: instagram"));
    }
}
