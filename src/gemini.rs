use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use reqwest::Client;
use tracing::{info, error};

use crate::config::GeminiConfig;
use crate::models::{AccessorySuggestion, OutfitIdea, Profile, StyleSuggestion, UserImage};
use crate::normalize::parse_list;
use crate::stylist::Stylist;

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")] Http(String),
    #[error("status={status} body={body}")] Status { status: u16, body: String },
    #[error("The AI response could not be processed: {0}")] Parse(String),
    #[error("AI response did not contain a valid list of {0}")] NotAnArray(String),
    #[error("Could not find edited image in the response")] MissingImage,
    #[error("No text content found in response")] MissingText,
    #[error("Cannot edit image: the edit prompt is empty")] EmptyPrompt,
}

// Shortens base64 `data` fields so logged payloads stay readable.
fn truncate_base64_in_json(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if key == "data" {
                    if let Value::String(s) = val {
                        if s.len() > 100 && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=') {
                            *val = Value::String(format!("{}...[truncated {} chars]", &s[..50], s.len() - 50));
                        }
                    }
                } else {
                    truncate_base64_in_json(val);
                }
            }
        }
        Value::Array(arr) => {
            for val in arr.iter_mut() {
                truncate_base64_in_json(val);
            }
        }
        _ => {}
    }
}

fn for_log(value: &Value) -> String {
    let mut copy = value.clone();
    truncate_base64_in_json(&mut copy);
    serde_json::to_string(&copy).unwrap_or_default()
}

fn inline_image(image: &UserImage) -> Value {
    json!({ "inlineData": { "data": image.data, "mimeType": image.mime_type } })
}

fn or_none(value: &str) -> &str {
    if value.trim().is_empty() { "None specified" } else { value }
}

pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Self {
        Self { client: Client::new(), config }
    }

    async fn generate_content(&self, model: &str, body: Value) -> Result<GeminiResponse, GeminiError> {
        let url = format!("{}/models/{}:generateContent?key={}", self.config.base_url, model, self.config.api_key);
        info!("🔗 Making request to: {}", url.replace(&self.config.api_key, "***"));
        info!("📤 Request body: {}", for_log(&body));

        let response = self.client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeminiError::Http(e.to_string()))?;

        let status = response.status();
        info!("📥 Response status: {}", status);

        let response_text = response.text().await.map_err(|e| GeminiError::Http(e.to_string()))?;
        if !status.is_success() {
            error!("❌ API Error response: {}", response_text);
            return Err(GeminiError::Status { status: status.as_u16(), body: response_text });
        }

        let parsed: Value = serde_json::from_str(&response_text)
            .map_err(|e| GeminiError::Parse(format!("provider envelope: {e}")))?;
        info!("📥 Raw Gemini API response: {}", for_log(&parsed));
        serde_json::from_value(parsed).map_err(|e| GeminiError::Parse(format!("provider envelope: {e}")))
    }

    async fn generate_text(&self, model: &str, body: Value) -> Result<String, GeminiError> {
        let parsed = self.generate_content(model, body).await?;
        extract_text(&parsed).ok_or(GeminiError::MissingText)
    }

    pub fn style_suggestion_prompt(occasion: &str) -> String {
        format!(
            "You are StyleMuse, a professional AI fashion stylist. Analyze the provided user photo. \
            The user has specified the occasion is: \"{occasion}\". \
            Based on their apparent style, body type, the photo's context, and the specified occasion, \
            generate 3 distinct, high-level fashion style suggestions. \
            For each suggestion, provide a name, a short description, and keywords for a style profile (do NOT include 'occasion')."
        )
    }

    pub fn outfit_prompt(profile: &Profile, image_model: &str) -> String {
        format!(
            "You are StyleMuse, a professional AI fashion stylist specializing in virtual try-on.\n\n\
            User Preferences:\n\
            - Occasion: {}\n\
            - Vibe: {}\n\
            - Preferred Colors/Materials: {}\n\
            - Style Inspirations: {}\n\
            - Budget: {}\n\n\
            Task:\n\
            Analyze the user's photo and preferences. Use Google Search for current trends.\n\
            Generate 3 distinct outfit concepts.\n\
            Return ONLY a valid JSON array of 3 objects.\n\
            Each object must have these exact keys:\n\
            1. \"name\": (string) A creative name for the look (e.g., \"Monochromatic Power Suit\").\n\
            2. \"explanation\": (string) A detailed explanation of why this outfit works for the user, including specific pieces and 2-3 styling tips.\n\
            3. \"editPrompt\": (string) A detailed, direct instruction for the '{image_model}' model. It should instruct the model to replace the clothing \
            on the person in the original photo with the new outfit described in the 'explanation', and explicitly say to keep the person's face, body, \
            and the background intact as much as possible.",
            profile.occasion,
            profile.vibe,
            or_none(&profile.colors_or_materials),
            or_none(&profile.style_inspirations),
            profile.budget,
        )
    }

    pub fn accessory_prompt(look_name: &str, explanation: &str) -> String {
        format!(
            "You are an expert fashion stylist. I have an outfit called '{look_name}' which is described as '{explanation}'. \
            Suggest 3 accessories (e.g., handbag, shoes, jewelry, scarf) that would perfectly complement this look. \
            For each suggestion, provide a name and a brief description of why it works with the outfit."
        )
    }
}

#[async_trait]
impl Stylist for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn style_suggestions(&self, image: &UserImage, occasion: &str) -> Result<Vec<StyleSuggestion>, GeminiError> {
        info!("🎯 Requesting style suggestions for occasion '{}'", occasion);
        let body = json!({
            "contents": [{ "parts": [inline_image(image), { "text": Self::style_suggestion_prompt(occasion) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING", "description": "A catchy name for the style, relevant to the occasion." },
                            "description": { "type": "STRING", "description": "A short, inspiring one-sentence description." },
                            "keywords": {
                                "type": "OBJECT",
                                "description": "Keywords to pre-fill a user profile form. Do NOT include 'occasion'.",
                                "properties": {
                                    "vibe": { "type": "STRING" },
                                    "colorsOrMaterials": { "type": "STRING" },
                                    "styleInspirations": { "type": "STRING" }
                                },
                                "required": ["vibe", "colorsOrMaterials", "styleInspirations"]
                            }
                        },
                        "required": ["name", "description", "keywords"]
                    }
                }
            }
        });
        let text = self.generate_text(&self.config.text_model, body).await?;
        let suggestions = parse_list(&text, "style suggestions")?;
        info!("✅ Received {} style suggestions", suggestions.len());
        Ok(suggestions)
    }

    async fn outfit_ideas(&self, image: &UserImage, profile: &Profile) -> Result<Vec<OutfitIdea>, GeminiError> {
        info!("🎯 Requesting outfit ideas (vibe '{}', budget {})", profile.vibe, profile.budget);
        let body = json!({
            "contents": [{ "parts": [inline_image(image), { "text": Self::outfit_prompt(profile, &self.config.image_model) }] }],
            "tools": [{ "googleSearch": {} }]
        });
        let text = self.generate_text(&self.config.text_model, body).await?;
        let ideas = parse_list(&text, "outfits")?;
        info!("✅ Received {} outfit ideas", ideas.len());
        Ok(ideas)
    }

    async fn edit_image(&self, image: &UserImage, instruction: &str) -> Result<UserImage, GeminiError> {
        if instruction.trim().is_empty() {
            error!("❌ Attempted to edit image with an empty prompt");
            return Err(GeminiError::EmptyPrompt);
        }
        info!("🎯 Editing image with prompt: {}", instruction.chars().take(100).collect::<String>());
        let body = json!({
            "contents": [{ "parts": [inline_image(image), { "text": instruction }] }],
            "generationConfig": { "responseModalities": ["IMAGE"] }
        });
        let parsed = self.generate_content(&self.config.image_model, body).await?;
        let edited = extract_first_image(&parsed).ok_or(GeminiError::MissingImage)?;
        info!("🖼️ Extracted {} image ({} chars)", edited.mime_type, edited.data.len());
        Ok(edited)
    }

    async fn accessory_suggestions(&self, look_name: &str, explanation: &str) -> Result<Vec<AccessorySuggestion>, GeminiError> {
        info!("🎯 Requesting accessories for look '{}'", look_name);
        let body = json!({
            "contents": [{ "parts": [{ "text": Self::accessory_prompt(look_name, explanation) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "name": { "type": "STRING", "description": "The name of the accessory (e.g., 'Gold Layered Necklace')." },
                            "description": { "type": "STRING", "description": "A brief explanation of why this accessory is a good choice for the outfit." }
                        },
                        "required": ["name", "description"]
                    }
                }
            }
        });
        let text = self.generate_text(&self.config.fast_model, body).await?;
        parse_list(&text, "accessories")
    }
}

// --- Response Parsing Helpers ---

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate { #[serde(default)] content: Content }

#[derive(Debug, Deserialize, Default)]
struct Content { #[serde(default)] parts: Vec<Part> }

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Part {
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData
    },
    Text { text: String },
    #[allow(dead_code)]
    Other(Value)
}

#[derive(Debug, Deserialize)]
struct InlineData {
    data: String,
    #[serde(rename = "mimeType", default = "default_image_mime")]
    mime_type: String,
}

fn default_image_mime() -> String {
    "image/jpeg".to_string()
}

fn extract_text(resp: &GeminiResponse) -> Option<String> {
    let candidate = resp.candidates.first()?;
    let text: String = candidate.content.parts.iter()
        .filter_map(|p| match p { Part::Text { text } => Some(text.as_str()), _ => None })
        .collect();
    if text.trim().is_empty() { None } else { Some(text.trim().to_string()) }
}

fn extract_first_image(resp: &GeminiResponse) -> Option<UserImage> {
    let candidate = resp.candidates.first()?;
    for p in &candidate.content.parts {
        if let Part::Inline { inline_data } = p {
            return Some(UserImage::new(inline_data.mime_type.clone(), inline_data.data.clone()));
        }
    }
    info!("⚠️ No inline image data found in response structure");
    None
}
