//! Suggested imagery for a generated site, derived from the prompt alone.

use serde::{Deserialize, Serialize};

const IMAGE_SOURCE_URL: &str = "https://source.unsplash.com";

const STOP_WORDS: &[&str] = &[
    "create",
    "build",
    "make",
    "website",
    "for",
    "a",
    "an",
    "the",
    "with",
    "and",
    "or",
    "modern",
    "professional",
    "beautiful",
];

const DEFAULT_KEYWORDS: &[&str] = &["business", "professional"];

const SECTION_IMAGE_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionImage {
    pub url: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageContext {
    pub keywords: Vec<String>,
    pub hero_image: String,
    pub section_images: Vec<SectionImage>,
}

/// Pick up to three meaningful keywords out of a prompt.
pub fn extract_keywords(prompt: &str) -> Vec<String> {
    let keywords: Vec<String> = prompt
        .to_lowercase()
        .split_whitespace()
        .filter(|word| !STOP_WORDS.contains(word) && word.chars().count() > 3)
        .map(|word| word.trim_matches(|c| matches!(c, '.' | ',' | '!' | '?')))
        .filter(|word| !word.is_empty())
        .take(3)
        .map(str::to_string)
        .collect();

    if keywords.is_empty() {
        DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
    } else {
        keywords
    }
}

/// Build hero and section image URLs for a prompt.
pub fn image_context(prompt: &str) -> ImageContext {
    let keywords = extract_keywords(prompt);

    let hero_keyword = keywords.first().map(String::as_str).unwrap_or("modern");
    let hero_image = format!(
        "{IMAGE_SOURCE_URL}/1920x1080/?{}",
        urlencoding::encode(hero_keyword)
    );

    let query = keywords
        .iter()
        .map(|k| urlencoding::encode(k).into_owned())
        .collect::<Vec<_>>()
        .join("+");
    let section_images = (0..SECTION_IMAGE_COUNT)
        .map(|i| SectionImage {
            url: format!("{IMAGE_SOURCE_URL}/1600x900/?{query}&sig={i}"),
            description: format!("{} image {}", keywords.join(" "), i + 1),
        })
        .collect();

    ImageContext {
        keywords,
        hero_image,
        section_images,
    }
}
