use serde::{Serialize, Deserialize};
use serde_with::skip_serializing_none;
use std::fmt;

/// Encoded photo plus its declared media type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserImage {
    pub mime_type: String,
    pub data: String,
}

impl UserImage {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self { mime_type: mime_type.into(), data: data.into() }
    }

    /// Splits `data:<mime>;base64,<payload>` into its header and payload.
    pub fn from_data_url(url: &str) -> Option<Self> {
        let (header, payload) = url.split_once(',')?;
        let mime_type = header.strip_prefix("data:")?.strip_suffix(";base64")?;
        if mime_type.is_empty() || payload.is_empty() {
            return None;
        }
        Some(Self::new(mime_type, payload))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Budget {
    #[default]
    Affordable,
    #[serde(rename = "Mid-range")]
    MidRange,
    Luxury,
}

impl Budget {
    pub const ALL: [Budget; 3] = [Budget::Affordable, Budget::MidRange, Budget::Luxury];

    pub fn label(self) -> &'static str {
        match self {
            Budget::Affordable => "Affordable",
            Budget::MidRange => "Mid-range",
            Budget::Luxury => "Luxury",
        }
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub occasion: String,
    pub vibe: String,
    #[serde(default)]
    pub colors_or_materials: String,
    #[serde(default)]
    pub style_inspirations: String,
    pub budget: Budget,
}

/// Profile fields a style suggestion may pre-fill. Never carries the occasion.
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StyleKeywords {
    #[serde(default)]
    pub vibe: Option<String>,
    #[serde(default)]
    pub colors_or_materials: Option<String>,
    #[serde(default)]
    pub style_inspirations: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct StyleSuggestion {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub keywords: StyleKeywords,
}

/// Partially filled profile handed to the profiling form.
#[skip_serializing_none]
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ProfileDraft {
    pub occasion: String,
    pub vibe: Option<String>,
    pub colors_or_materials: Option<String>,
    pub style_inspirations: Option<String>,
    pub budget: Option<Budget>,
}

impl ProfileDraft {
    pub fn from_occasion(occasion: &str) -> Self {
        Self { occasion: occasion.to_string(), ..Self::default() }
    }

    /// Suggestion keywords first, the submitted occasion always wins.
    pub fn merge(keywords: &StyleKeywords, occasion: &str) -> Self {
        Self {
            occasion: occasion.to_string(),
            vibe: keywords.vibe.clone(),
            colors_or_materials: keywords.colors_or_materials.clone(),
            style_inspirations: keywords.style_inspirations.clone(),
            budget: None,
        }
    }

    /// The form's starting values: draft fields over empty defaults.
    pub fn to_form(&self) -> Profile {
        Profile {
            occasion: self.occasion.clone(),
            vibe: self.vibe.clone().unwrap_or_default(),
            colors_or_materials: self.colors_or_materials.clone().unwrap_or_default(),
            style_inspirations: self.style_inspirations.clone().unwrap_or_default(),
            budget: self.budget.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OutfitIdea {
    pub name: String,
    pub explanation: String,
    pub edit_prompt: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLook {
    pub name: String,
    pub explanation: String,
    pub edit_prompt: String,
    pub image_url: String,
}

impl GeneratedLook {
    pub fn new(idea: OutfitIdea, image: &UserImage) -> Self {
        Self {
            name: idea.name,
            explanation: idea.explanation,
            edit_prompt: idea.edit_prompt,
            image_url: image.to_data_url(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessorySuggestion {
    pub name: String,
    pub description: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OccasionRequest {
    pub occasion: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RefineRequest {
    pub instruction: String,
}

pub const OCCASION_PRESETS: [&str; 6] = [
    "Casual Day Out",
    "Business Meeting",
    "Date Night",
    "Formal Event / Gala",
    "Wedding Guest",
    "Vacation / Travel",
];

#[derive(Debug, Serialize, Clone)]
pub struct Presets {
    pub occasions: Vec<&'static str>,
    pub budgets: Vec<Budget>,
}

impl Default for Presets {
    fn default() -> Self {
        Self { occasions: OCCASION_PRESETS.to_vec(), budgets: Budget::ALL.to_vec() }
    }
}
