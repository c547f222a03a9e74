//! JSON snapshots of a session, one screen per step.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_with::skip_serializing_none;
use uuid::Uuid;

use crate::looks::{ActionPanel, LookBoard};
use crate::models::{AccessorySuggestion, Profile, StyleSuggestion, OCCASION_PRESETS};
use crate::session::Session;
use crate::wizard::{Step, WizardState, SUGGESTIONS_LOADING};

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub id: Uuid,
    pub step: Step,
    pub error: Option<String>,
    pub screen: Screen,
    pub updated_at: DateTime<Utc>,
}

#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Screen {
    Upload,
    Occasion { presets: Vec<&'static str> },
    Progress { message: String },
    Suggestions { suggestions: Vec<StyleSuggestion> },
    Profile { image_url: String, form: Profile },
    Look {
        index: usize,
        total: usize,
        name: String,
        explanation: String,
        image_url: String,
        refining: bool,
        panel: PanelView,
        notice: Option<String>,
    },
    NoLooks,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum PanelView {
    Closed,
    Refine,
    AccessoriesLoading,
    Accessories { items: Vec<AccessorySuggestion> },
}

impl From<&ActionPanel> for PanelView {
    fn from(panel: &ActionPanel) -> Self {
        match panel {
            ActionPanel::Closed => PanelView::Closed,
            ActionPanel::Refine => PanelView::Refine,
            ActionPanel::Accessories { items: None, .. } => PanelView::AccessoriesLoading,
            ActionPanel::Accessories { items: Some(items), .. } => PanelView::Accessories { items: items.clone() },
        }
    }
}

fn look_screen(board: &LookBoard) -> Screen {
    let Some(look) = board.current_look() else {
        return Screen::NoLooks;
    };
    let index = board.current_index();
    Screen::Look {
        index,
        total: board.len(),
        name: look.name.clone(),
        explanation: look.explanation.clone(),
        image_url: board.display_image(index).unwrap_or(&look.image_url).to_string(),
        refining: board.is_refining(index),
        panel: board.panel().into(),
        notice: board.notice().map(str::to_string),
    }
}

pub fn render(state: &WizardState) -> Screen {
    match state {
        WizardState::Introduction => Screen::Upload,
        WizardState::Event { .. } => Screen::Occasion { presets: OCCASION_PRESETS.to_vec() },
        WizardState::Suggestion { suggestions: None, .. } => Screen::Progress { message: SUGGESTIONS_LOADING.to_string() },
        WizardState::Suggestion { suggestions: Some(list), .. } => Screen::Suggestions { suggestions: list.clone() },
        WizardState::Profiling { image, draft, .. } => Screen::Profile { image_url: image.to_data_url(), form: draft.to_form() },
        WizardState::Generating { message, .. } => Screen::Progress { message: message.to_string() },
        WizardState::Results { board, .. } => look_screen(board),
    }
}

impl From<&Session> for Snapshot {
    fn from(session: &Session) -> Self {
        let wizard = &session.wizard;
        Snapshot {
            id: session.id,
            step: wizard.step(),
            error: wizard.error().map(str::to_string),
            screen: render(wizard.state()),
            updated_at: session.updated_at,
        }
    }
}
