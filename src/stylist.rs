use async_trait::async_trait;

use crate::gemini::GeminiError;
use crate::models::{AccessorySuggestion, OutfitIdea, Profile, StyleSuggestion, UserImage};

/// The generation backend the wizard talks to.
#[async_trait]
pub trait Stylist: Send + Sync {
    fn name(&self) -> &str;

    async fn style_suggestions(&self, image: &UserImage, occasion: &str) -> Result<Vec<StyleSuggestion>, GeminiError>;

    async fn outfit_ideas(&self, image: &UserImage, profile: &Profile) -> Result<Vec<OutfitIdea>, GeminiError>;

    /// Applies a natural-language edit, keeping the subject and background.
    async fn edit_image(&self, image: &UserImage, instruction: &str) -> Result<UserImage, GeminiError>;

    async fn accessory_suggestions(&self, look_name: &str, explanation: &str) -> Result<Vec<AccessorySuggestion>, GeminiError>;
}
