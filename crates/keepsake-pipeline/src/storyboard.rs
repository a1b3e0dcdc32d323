//! Heuristic storyboard building.
//!
//! Turns a feelings transcript plus a photo description into 3-5 scenes,
//! each with a caption seed, a hold duration, and an emotional tone. Pure
//! and infallible: bad input degrades to a fixed fallback storyboard.

use keepsake_models::{Scene, Tone};
use tracing::{debug, info};

/// Seconds each scene stays on screen.
pub const DEFAULT_SCENE_DURATION: f64 = 2.5;
/// Storyboards always land in this range.
pub const MIN_SCENES: usize = 3;
pub const MAX_SCENES: usize = 5;

const POSITIVE_KEYWORDS: &[&str] = &[
    "happy",
    "joy",
    "excited",
    "amazing",
    "wonderful",
    "beautiful",
    "love",
    "grateful",
    "blessed",
    "perfect",
    "incredible",
];

const REFLECTIVE_KEYWORDS: &[&str] = &[
    "remember",
    "think",
    "realize",
    "understand",
    "feel",
    "moment",
    "special",
    "meaningful",
    "important",
];

const NOSTALGIC_KEYWORDS: &[&str] = &[
    "memory",
    "reminds",
    "brings back",
    "takes me back",
    "childhood",
    "past",
    "always",
    "used to",
];

const THEME_KEYWORDS: &[(&str, &[&str])] = &[
    (
        "nature",
        &[
            "outdoor", "nature", "park", "tree", "flower", "sunset", "sunrise", "beach",
        ],
    ),
    (
        "family",
        &[
            "family", "mom", "dad", "sister", "brother", "child", "parent", "together",
        ],
    ),
    (
        "achievement",
        &[
            "proud",
            "accomplished",
            "success",
            "finished",
            "completed",
            "won",
        ],
    ),
    (
        "friendship",
        &["friend", "friends", "together", "laugh", "fun", "enjoy"],
    ),
    (
        "reflection",
        &[
            "peaceful",
            "quiet",
            "think",
            "contemplate",
            "mindful",
            "serene",
        ],
    ),
    (
        "celebration",
        &[
            "celebrate",
            "party",
            "birthday",
            "anniversary",
            "milestone",
        ],
    ),
];

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
];

/// Build a storyboard from the feelings transcript and photo description.
pub fn build_storyboard(transcript: &str, description: &str) -> Vec<Scene> {
    info!("Building storyboard from conversation");

    if transcript.trim().len() < 10 && description.trim().is_empty() {
        debug!("Input too thin, using fallback storyboard");
        return fallback_scenes();
    }

    let moments = emotional_moments(transcript);
    let themes = identify_themes(transcript, description);

    let mut scenes = Vec::new();

    // Opening scene, toned from the photo description.
    if !description.trim().is_empty() {
        scenes.push(Scene::new(
            "This moment captured something special",
            DEFAULT_SCENE_DURATION,
            tone_from_description(description),
        ));
    }

    // Up to two emotional moments from the conversation.
    for moment in moments.iter().take(2) {
        scenes.push(Scene::new(
            key_phrase(moment),
            DEFAULT_SCENE_DURATION,
            tone_from_moment(moment),
        ));
    }

    // Closing scene once any theme landed.
    if !themes.is_empty() {
        scenes.push(Scene::new(
            "A memory to treasure always",
            DEFAULT_SCENE_DURATION,
            Tone::Reflective,
        ));
    }

    normalize_scene_count(&mut scenes);
    info!(scene_count = scenes.len(), themes = themes.len(), "Storyboard ready");
    scenes
}

/// Sentences with at least one keyword hit, lowercased, at most [`MAX_SCENES`].
fn emotional_moments(transcript: &str) -> Vec<String> {
    let buckets = [POSITIVE_KEYWORDS, REFLECTIVE_KEYWORDS, NOSTALGIC_KEYWORDS];

    transcript
        .split(['.', '!', '?'])
        .filter_map(|sentence| {
            let sentence = sentence.trim().to_lowercase();
            if sentence.len() < 10 {
                return None;
            }
            let hits = buckets
                .iter()
                .filter(|bucket| bucket.iter().any(|kw| sentence.contains(kw)))
                .count();
            (hits > 0).then_some(sentence)
        })
        .take(MAX_SCENES)
        .collect()
}

/// Themes present in the combined text, at most 3, in fixed scan order.
fn identify_themes(transcript: &str, description: &str) -> Vec<&'static str> {
    let combined = format!("{} {}", transcript, description).to_lowercase();

    THEME_KEYWORDS
        .iter()
        .filter(|(_, keywords)| keywords.iter().any(|kw| combined.contains(kw)))
        .map(|(theme, _)| *theme)
        .take(3)
        .collect()
}

fn tone_from_description(description: &str) -> Tone {
    let lower = description.to_lowercase();
    if ["happy", "joy", "smile", "celebrate"].iter().any(|w| lower.contains(w)) {
        Tone::Joyful
    } else if ["peaceful", "calm", "serene", "quiet"].iter().any(|w| lower.contains(w)) {
        Tone::Peaceful
    } else if ["warm", "cozy", "comfortable", "home"].iter().any(|w| lower.contains(w)) {
        Tone::Warm
    } else {
        Tone::Contemplative
    }
}

fn tone_from_moment(text: &str) -> Tone {
    let lower = text.to_lowercase();
    if ["excited", "amazing", "wonderful", "incredible"].iter().any(|w| lower.contains(w)) {
        Tone::Excited
    } else if ["grateful", "blessed", "thankful"].iter().any(|w| lower.contains(w)) {
        Tone::Grateful
    } else if ["remember", "memory", "reminds"].iter().any(|w| lower.contains(w)) {
        Tone::Nostalgic
    } else {
        Tone::Reflective
    }
}

/// Condense a sentence into a caption seed: strip stopwords and short
/// words, keep the first 8, capitalize, terminate with punctuation.
fn key_phrase(sentence: &str) -> String {
    let words: Vec<&str> = sentence
        .split_whitespace()
        .filter(|w| w.len() > 2 && !STOPWORDS.contains(&w.to_lowercase().as_str()))
        .take(8)
        .collect();

    let phrase = words.join(" ");
    if phrase.is_empty() {
        return "A moment worth remembering.".to_string();
    }

    let mut chars = phrase.chars();
    let mut result: String = chars
        .next()
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_default();
    result.push_str(chars.as_str());

    if !result.ends_with(['.', '!', '?']) {
        result.push('.');
    }
    result
}

/// Pad with the filler scene up to [`MIN_SCENES`], truncate past [`MAX_SCENES`].
fn normalize_scene_count(scenes: &mut Vec<Scene>) {
    while scenes.len() < MIN_SCENES {
        scenes.push(Scene::new(
            "This moment tells a story",
            DEFAULT_SCENE_DURATION,
            Tone::Contemplative,
        ));
    }
    scenes.truncate(MAX_SCENES);
}

/// The fixed storyboard used when the inputs carry nothing to work with.
fn fallback_scenes() -> Vec<Scene> {
    vec![
        Scene::new(
            "A moment captured in time",
            DEFAULT_SCENE_DURATION,
            Tone::Contemplative,
        ),
        Scene::new("This memory matters", DEFAULT_SCENE_DURATION, Tone::Warm),
        Scene::new("Forever in my heart", DEFAULT_SCENE_DURATION, Tone::Nostalgic),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_uses_fallback() {
        let scenes = build_storyboard("", "");
        assert_eq!(scenes.len(), 3);
        assert_eq!(scenes[0].caption, "A moment captured in time");
        assert_eq!(scenes[1].tone, Tone::Warm);
        assert_eq!(scenes[2].tone, Tone::Nostalgic);
    }

    #[test]
    fn test_scene_count_always_in_bounds() {
        let inputs = [
            ("", ""),
            ("short", ""),
            ("I was so happy today. It was amazing and wonderful. I remember it well. A truly special moment. My family was together.", "A happy family smiling in the park"),
            ("no keywords here whatsoever", "plain description"),
        ];
        for (transcript, description) in inputs {
            let scenes = build_storyboard(transcript, description);
            assert!(
                (MIN_SCENES..=MAX_SCENES).contains(&scenes.len()),
                "got {} scenes for {:?}",
                scenes.len(),
                transcript
            );
        }
    }

    #[test]
    fn test_opening_tone_follows_description() {
        let scenes = build_storyboard("I felt grateful for this moment today", "Everyone is smiling with joy");
        assert_eq!(scenes[0].caption, "This moment captured something special");
        assert_eq!(scenes[0].tone, Tone::Joyful);

        let scenes = build_storyboard("I felt grateful for this moment today", "A quiet, serene lake at dawn");
        assert_eq!(scenes[0].tone, Tone::Peaceful);
    }

    #[test]
    fn test_moment_scenes_capped_at_two() {
        let transcript = "I was happy at the beach. It was a wonderful day. I feel so blessed. \
                          This moment was special. I will always remember it.";
        let scenes = build_storyboard(transcript, "A beautiful sunset");
        // opening + 2 moments + closing (nature theme matched)
        assert_eq!(scenes.len(), 4);
        assert_eq!(scenes[3].caption, "A memory to treasure always");
        assert_eq!(scenes[3].tone, Tone::Reflective);
    }

    #[test]
    fn test_key_phrase_strips_stopwords_and_punctuates() {
        assert_eq!(
            key_phrase("i was so happy at the beach with my family"),
            "Was happy beach family."
        );
    }

    #[test]
    fn test_key_phrase_keeps_existing_terminator() {
        assert_eq!(key_phrase("what wonderful day!"), "What wonderful day!");
    }

    #[test]
    fn test_key_phrase_empty_fallback() {
        assert_eq!(key_phrase("a an of to"), "A moment worth remembering.");
    }

    #[test]
    fn test_key_phrase_limits_to_eight_words() {
        let phrase = key_phrase(
            "today everyone gathered around celebrating grandma birthday while singing dancing laughing late into night",
        );
        assert_eq!(phrase.split_whitespace().count(), 8);
    }

    #[test]
    fn test_themes_capped_at_three() {
        let themes = identify_themes(
            "we had fun with friends at the party in the park, so proud of my family",
            "",
        );
        assert_eq!(themes.len(), 3);
    }

    #[test]
    fn test_moment_tones() {
        assert_eq!(tone_from_moment("it was amazing out there"), Tone::Excited);
        assert_eq!(tone_from_moment("i feel so blessed"), Tone::Grateful);
        assert_eq!(tone_from_moment("this reminds me of home"), Tone::Nostalgic);
        assert_eq!(tone_from_moment("just an ordinary sentence"), Tone::Reflective);
    }

    #[test]
    fn test_durations_are_uniform() {
        let scenes = build_storyboard("I was so happy today and it felt special", "warm light");
        assert!(scenes
            .iter()
            .all(|s| (s.duration - DEFAULT_SCENE_DURATION).abs() < f64::EPSILON));
    }
}
