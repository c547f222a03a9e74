use futures::future::try_join_all;
use tracing::info;

use crate::gemini::GeminiError;
use crate::models::{GeneratedLook, Profile, UserImage};
use crate::stylist::Stylist;

/// Outfit ideas first, then one try-on edit per idea, all at once.
///
/// `on_try_on` fires between the two stages. The batch is all-or-nothing:
/// the first failed edit fails the whole call.
pub async fn generate_looks(
    stylist: &dyn Stylist,
    image: &UserImage,
    profile: &Profile,
    on_try_on: impl FnOnce(),
) -> Result<Vec<GeneratedLook>, GeminiError> {
    let ideas = stylist.outfit_ideas(image, profile).await?;
    on_try_on();
    info!("👗 Trying on {} outfit ideas concurrently", ideas.len());

    let edits = ideas.into_iter().map(|idea| async move {
        let edited = stylist.edit_image(image, &idea.edit_prompt).await?;
        Ok::<_, GeminiError>(GeneratedLook::new(idea, &edited))
    });
    try_join_all(edits).await
}
