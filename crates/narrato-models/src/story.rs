//! Story scripts returned by the text-generation service.

use serde::{Deserialize, Serialize};

/// One scene of a generated story.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryScene {
    /// Narration for the scene
    pub sentences: String,
    /// Image-generation prompt or stock-footage query, depending on genre
    #[serde(alias = "image_prompt", alias = "video_prompt")]
    pub visual_prompt: String,
}

/// A generated story: ordered scenes plus the full narration text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub scenes: Vec<StoryScene>,
    pub complete_story: String,
}

impl Story {
    /// The JSON schema the text-generation service must answer with.
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "scenes": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "sentences": { "type": "string" },
                            "visual_prompt": { "type": "string" }
                        },
                        "required": ["sentences", "visual_prompt"],
                        "additionalProperties": false
                    }
                },
                "complete_story": { "type": "string" }
            },
            "required": ["scenes", "complete_story"],
            "additionalProperties": false
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_legacy_prompt_names() {
        let json = r#"{
            "scenes": [
                {"sentences": "Once upon a time.", "image_prompt": "a castle, Pixar style"},
                {"sentences": "Keep going.", "video_prompt": "runner at dawn"}
            ],
            "complete_story": "Once upon a time. Keep going."
        }"#;
        let story: Story = serde_json::from_str(json).unwrap();
        assert_eq!(story.scenes.len(), 2);
        assert_eq!(story.scenes[0].visual_prompt, "a castle, Pixar style");
        assert_eq!(story.scenes[1].visual_prompt, "runner at dawn");
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = Story::json_schema();
        assert_eq!(schema["required"], serde_json::json!(["scenes", "complete_story"]));
    }
}
