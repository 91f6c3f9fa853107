//! Per-genre instructions for the text-generation service.

use narrato_models::Genre;

const ANIMATION_INSTRUCTIONS: &str = "\
You are a children's story writer. Write a short, heartwarming story for \
children aged 4 to 8, split into exactly 5 scenes. Each scene has 2 or 3 \
simple sentences of narration.

For every scene also write an image prompt, always in English, describing \
the scene as a single still frame in a colorful 3D Pixar-like animation \
style. Describe each character fully every time it appears (species, colors, \
clothing) so the characters look the same in every image. Never put text in \
the image.

Return the scenes in order together with the complete story as one text.";

const MOTIVATION_INSTRUCTIONS: &str = "\
You write short motivational videos. Write at most 4 scenes. Each scene has \
at most 2 short, powerful sentences of narration that build towards one \
message.

For every scene also write a stock-footage search query, always in English, \
of 2 to 4 plain words describing real footage that fits the narration \
(for example \"runner sunrise\", \"mountain summit\"). Do not describe \
people by name.

Return the scenes in order together with the complete narration as one \
text.";

const COMMERCIAL_INSTRUCTIONS: &str = "\
You write short video commercials. You are given a product, a business or a \
website address. Write 3 or 4 scenes that present the offer: the problem, \
the solution, the benefit and a closing call to action. Each scene has at \
most 2 short sentences of narration in a friendly, confident tone.

For every scene also write a stock-footage search query, always in English, \
of 2 to 4 plain words describing footage that fits the scene. Never \
mention brand names in the queries.

Return the scenes in order together with the complete narration as one \
text.";

/// System instructions for `genre`.
pub fn system_instructions(genre: Genre) -> &'static str {
    match genre {
        Genre::Animation => ANIMATION_INSTRUCTIONS,
        Genre::Motivation => MOTIVATION_INSTRUCTIONS,
        Genre::Commercial => COMMERCIAL_INSTRUCTIONS,
    }
}

/// User message carrying the topic and the narration language.
pub fn user_prompt(genre: Genre, topic: &str, language: &str) -> String {
    match genre {
        Genre::Animation => format!(
            "Story is about {topic}\nCreate the story in the following language: {language}"
        ),
        Genre::Motivation => format!(
            "The video is about {topic}\nCreate only the text for the story in the following language: {language}"
        ),
        Genre::Commercial => format!(
            "Create a commercial for: {topic}\nCreate only the narration in the following language: {language}"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_genre_has_instructions() {
        for genre in Genre::ALL {
            assert!(!system_instructions(genre).is_empty());
        }
    }

    #[test]
    fn test_user_prompt_carries_topic_and_language() {
        let prompt = user_prompt(Genre::Animation, "a brave turtle", "French");
        assert!(prompt.contains("a brave turtle"));
        assert!(prompt.ends_with("French"));
    }
}
