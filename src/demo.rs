//! Offline stylist used when no API key is configured.

use async_trait::async_trait;
use base64::Engine;
use tracing::info;

use crate::gemini::GeminiError;
use crate::models::{AccessorySuggestion, OutfitIdea, Profile, StyleKeywords, StyleSuggestion, UserImage};
use crate::stylist::Stylist;

const SWATCHES: [&str; 5] = ["#C9A96E", "#8B5CF6", "#0F766E", "#B91C1C", "#1E3A8A"];

pub struct DemoStylist;

impl DemoStylist {
    fn placeholder(title: &str, seed: usize) -> UserImage {
        let color = SWATCHES[seed % SWATCHES.len()];
        let title: String = title.chars().filter(|c| !matches!(c, '<' | '>' | '&' | '"')).take(40).collect();
        let svg = format!(r#"<svg width="360" height="640" xmlns="http://www.w3.org/2000/svg">
            <defs>
                <linearGradient id="grad" x1="0%" y1="0%" x2="100%" y2="100%">
                    <stop offset="0%" style="stop-color:{color};stop-opacity:1" />
                    <stop offset="100%" style="stop-color:{color};stop-opacity:0.5" />
                </linearGradient>
            </defs>
            <rect width="360" height="640" fill="url(#grad)" />
            <text x="180" y="320" font-family="Georgia, serif" font-size="22" font-weight="bold"
                  text-anchor="middle" fill="white">{title}</text>
            <text x="180" y="360" font-family="Arial, sans-serif" font-size="12"
                  text-anchor="middle" fill="white" opacity="0.8">StyleMuse demo preview</text>
        </svg>"#);
        UserImage::new("image/svg+xml", base64::engine::general_purpose::STANDARD.encode(svg.as_bytes()))
    }
}

#[async_trait]
impl Stylist for DemoStylist {
    fn name(&self) -> &str {
        "demo"
    }

    async fn style_suggestions(&self, _image: &UserImage, occasion: &str) -> Result<Vec<StyleSuggestion>, GeminiError> {
        info!("Using demo mode - canned style suggestions for '{}'", occasion);
        let directions = [
            ("Modern Classic", "Clean lines and timeless tailoring.", "Polished", "Navy, camel, crisp cotton", "Carolyn Bessette-Kennedy"),
            ("Soft Romantic", "Fluid fabrics and gentle color.", "Romantic", "Blush, ivory, silk chiffon", "Chloé"),
            ("Bold Statement", "Confident color and sharp silhouettes.", "Bold", "Cobalt, emerald, structured satin", "Zendaya"),
        ];
        Ok(directions
            .iter()
            .map(|(name, description, vibe, colors, inspiration)| StyleSuggestion {
                name: format!("{name} {occasion}"),
                description: description.to_string(),
                keywords: StyleKeywords {
                    vibe: Some(vibe.to_string()),
                    colors_or_materials: Some(colors.to_string()),
                    style_inspirations: Some(inspiration.to_string()),
                },
            })
            .collect())
    }

    async fn outfit_ideas(&self, _image: &UserImage, profile: &Profile) -> Result<Vec<OutfitIdea>, GeminiError> {
        info!("Using demo mode - canned outfit ideas");
        let pieces = ["Tailored Set", "Layered Look", "Signature Dress"];
        Ok(pieces
            .iter()
            .map(|piece| OutfitIdea {
                name: format!("{} {}", profile.vibe, piece),
                explanation: format!(
                    "A {} {} for {} that stays within a {} budget.",
                    profile.vibe.to_lowercase(),
                    piece.to_lowercase(),
                    profile.occasion,
                    profile.budget
                ),
                edit_prompt: format!(
                    "Replace the clothing on the person with a {} {}. Keep the face, body, and background intact.",
                    profile.vibe.to_lowercase(),
                    piece.to_lowercase()
                ),
            })
            .collect())
    }

    async fn edit_image(&self, _image: &UserImage, instruction: &str) -> Result<UserImage, GeminiError> {
        if instruction.trim().is_empty() {
            return Err(GeminiError::EmptyPrompt);
        }
        info!("Using demo mode - placeholder image for edit");
        Ok(Self::placeholder(instruction, instruction.len()))
    }

    async fn accessory_suggestions(&self, look_name: &str, _explanation: &str) -> Result<Vec<AccessorySuggestion>, GeminiError> {
        info!("Using demo mode - canned accessories for '{}'", look_name);
        Ok(vec![
            AccessorySuggestion { name: "Structured Mini Bag".into(), description: format!("Keeps {look_name} polished without adding bulk.") },
            AccessorySuggestion { name: "Fine Gold Hoops".into(), description: "A warm accent that frames the face.".into() },
            AccessorySuggestion { name: "Pointed Slingbacks".into(), description: "Lengthen the leg line and suit day or night.".into() },
        ])
    }
}
