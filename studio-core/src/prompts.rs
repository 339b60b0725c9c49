//! Prompt templates for each generation task. All builders are pure.

/// Narration pace used to size scripts.
pub const WORDS_PER_MINUTE: u32 = 150;

/// Number of hashtags requested from the model (and the cap on the parsed list).
pub const HASHTAG_COUNT: usize = 20;

/// Video script with hook / main content / call-to-action structure.
pub fn script(topic: &str, tone: &str, duration: &str, minutes: u32, keywords: Option<&str>) -> String {
    let word_count = minutes.saturating_mul(WORDS_PER_MINUTE);
    let key_points = match keywords.filter(|k| !k.is_empty()) {
        Some(k) => format!("Key points to include: {}", k),
        None => String::new(),
    };

    format!(
        "Create a {duration}-minute video script about \"{topic}\".\n\
         \n\
         Requirements:\n\
         - Tone: {tone}\n\
         - Target duration: {duration} minutes (approximately {word_count} words)\n\
         - Structure: Hook, Main Content, Call to Action\n\
         - Make it engaging and suitable for video content\n\
         \n\
         {key_points}\n\
         \n\
         Format the script with:\n\
         1. A compelling hook (first 15-30 seconds)\n\
         2. Main content broken into clear sections\n\
         3. A strong call-to-action at the end\n\
         4. Natural transitions between sections\n\
         \n\
         Write the script in a conversational style that works well for video narration."
    )
}

/// Rewrite an image prompt into a more detailed one.
pub fn image_enhancement(prompt: &str, style: &str, size: u32) -> String {
    format!(
        "Enhance this image generation prompt to be more detailed and effective:\n\
         \n\
         Original prompt: \"{prompt}\"\n\
         Style: {style}\n\
         Size: {size}x{size}\n\
         \n\
         Provide an enhanced, detailed prompt that includes:\n\
         - Specific visual details\n\
         - Lighting and mood\n\
         - Composition and framing\n\
         - Color palette\n\
         - Technical quality descriptors\n\
         \n\
         Return only the enhanced prompt, nothing else."
    )
}

/// Hashtags, one per line, each starting with `#`.
pub fn hashtags(topic: &str, platform: &str) -> String {
    format!(
        "Generate {HASHTAG_COUNT} relevant, trending hashtags for content about: \"{topic}\"\n\
         \n\
         Platform: {platform}\n\
         \n\
         Requirements:\n\
         - Mix of popular and niche hashtags\n\
         - Include trending and evergreen options\n\
         - Relevant to the topic\n\
         - Suitable for social media platforms\n\
         - Format: Return only the hashtags, one per line, starting with #\n\
         \n\
         Example format:\n\
         #hashtag1\n\
         #hashtag2\n\
         #hashtag3"
    )
}

pub fn prompt_analysis(prompt: &str) -> String {
    format!(
        "Analyze this content creation prompt and provide suggestions:\n\
         \n\
         \"{prompt}\"\n\
         \n\
         Provide:\n\
         1. Suggested content type (script, image, video, etc.)\n\
         2. Key themes and topics to cover\n\
         3. Recommended tone and style\n\
         4. Content structure suggestions\n\
         5. Tools that would be most useful\n\
         \n\
         Format as a structured analysis."
    )
}

pub fn video_editing(prompt: &str) -> String {
    format!(
        "Based on this video content description, provide editing suggestions:\n\
         \n\
         \"{prompt}\"\n\
         \n\
         Suggest:\n\
         1. Recommended editing style\n\
         2. Color grading suggestions\n\
         3. Music/audio recommendations\n\
         4. Text overlay suggestions\n\
         5. Transition effects\n\
         6. Pacing and rhythm tips\n\
         \n\
         Format as actionable editing recommendations."
    )
}
