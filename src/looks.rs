//! Per-look state on the results screen.
//!
//! Lives only while the wizard sits in its results step and is dropped on
//! reset. Edits made here never touch the generated looks themselves; they
//! are display overrides keyed by look index.

use std::collections::HashMap;
use tracing::{info, warn};

use crate::gemini::GeminiError;
use crate::models::{AccessorySuggestion, GeneratedLook, UserImage};
use crate::wizard::WizardError;

pub const REFINE_FAILED: &str = "Sorry, we couldn't edit the image. Please try again.";
pub const ACCESSORIZE_FAILED: &str = "Sorry, we couldn't get accessory suggestions. Please try again.";

/// The one action panel shown under the current look.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActionPanel {
    #[default]
    Closed,
    /// Edit instruction input is open.
    Refine,
    /// `items` is `None` while the request is in flight.
    Accessories { ticket: u64, items: Option<Vec<AccessorySuggestion>> },
}

#[derive(Debug, Clone)]
pub struct RefineTarget {
    pub index: usize,
    pub image: UserImage,
    pub instruction: String,
}

#[derive(Debug, Clone)]
pub struct AccessoryTarget {
    pub ticket: u64,
    pub look_name: String,
    pub explanation: String,
}

#[derive(Debug, Clone, Default)]
pub struct LookBoard {
    looks: Vec<GeneratedLook>,
    current: usize,
    overrides: HashMap<usize, String>,
    /// In-flight refine count per look index.
    refining: HashMap<usize, usize>,
    panel: ActionPanel,
    panel_seq: u64,
    notice: Option<String>,
}

impl LookBoard {
    pub fn new(looks: Vec<GeneratedLook>) -> Self {
        Self { looks, ..Self::default() }
    }

    pub fn looks(&self) -> &[GeneratedLook] { &self.looks }
    pub fn len(&self) -> usize { self.looks.len() }
    pub fn is_empty(&self) -> bool { self.looks.is_empty() }
    pub fn current_index(&self) -> usize { self.current }
    pub fn panel(&self) -> &ActionPanel { &self.panel }
    pub fn notice(&self) -> Option<&str> { self.notice.as_deref() }

    pub fn current_look(&self) -> Option<&GeneratedLook> {
        self.looks.get(self.current)
    }

    /// The refined image for `index` if there is one, else the generated one.
    pub fn display_image(&self, index: usize) -> Option<&str> {
        self.overrides
            .get(&index)
            .map(String::as_str)
            .or_else(|| self.looks.get(index).map(|l| l.image_url.as_str()))
    }

    pub fn is_refining(&self, index: usize) -> bool {
        self.refining.get(&index).is_some_and(|n| *n > 0)
    }

    fn reset_actions(&mut self) {
        self.panel = ActionPanel::Closed;
        self.notice = None;
    }

    pub fn next(&mut self) {
        if self.looks.is_empty() {
            return;
        }
        self.current = (self.current + 1) % self.looks.len();
        self.reset_actions();
    }

    pub fn prev(&mut self) {
        if self.looks.is_empty() {
            return;
        }
        self.current = if self.current == 0 { self.looks.len() - 1 } else { self.current - 1 };
        self.reset_actions();
    }

    pub fn open_refine(&mut self) -> Result<(), WizardError> {
        if self.looks.is_empty() {
            return Err(WizardError::NoLooks);
        }
        self.reset_actions();
        self.panel = ActionPanel::Refine;
        Ok(())
    }

    pub fn close_panel(&mut self) {
        self.reset_actions();
    }

    pub fn begin_refine(&mut self, instruction: &str) -> Result<RefineTarget, WizardError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(WizardError::EmptyInstruction);
        }
        let index = self.current;
        let url = self.display_image(index).ok_or(WizardError::NoLooks)?;
        let image = UserImage::from_data_url(url).ok_or(WizardError::UnreadableImage(index))?;
        *self.refining.entry(index).or_default() += 1;
        self.reset_actions();
        info!("✏️ Refining look {} with '{}'", index, instruction);
        Ok(RefineTarget { index, image, instruction: instruction.to_string() })
    }

    /// Applies a refine result to the look it was started on, wherever the
    /// user has navigated since.
    pub fn finish_refine(&mut self, index: usize, result: Result<UserImage, GeminiError>) {
        if let Some(n) = self.refining.get_mut(&index) {
            *n -= 1;
            if *n == 0 {
                self.refining.remove(&index);
            }
        }
        match result {
            Ok(image) => {
                self.overrides.insert(index, image.to_data_url());
                info!("✅ Look {} refined", index);
            }
            Err(e) => {
                warn!("⚠️ Failed to edit look {}: {}", index, e);
                self.notice = Some(REFINE_FAILED.to_string());
            }
        }
    }

    pub fn begin_accessorize(&mut self) -> Result<AccessoryTarget, WizardError> {
        if matches!(self.panel, ActionPanel::Accessories { items: None, .. }) {
            return Err(WizardError::StillLoading);
        }
        let look = self.current_look().ok_or(WizardError::NoLooks)?;
        let target = AccessoryTarget {
            ticket: self.panel_seq + 1,
            look_name: look.name.clone(),
            explanation: look.explanation.clone(),
        };
        self.panel_seq = target.ticket;
        self.reset_actions();
        self.panel = ActionPanel::Accessories { ticket: target.ticket, items: None };
        Ok(target)
    }

    /// Returns false when the panel that asked has since been closed or replaced.
    pub fn finish_accessorize(&mut self, ticket: u64, result: Result<Vec<AccessorySuggestion>, GeminiError>) -> bool {
        match &self.panel {
            ActionPanel::Accessories { ticket: open, items: None } if *open == ticket => {}
            _ => return false,
        }
        match result {
            Ok(items) => {
                info!("✅ Received {} accessory suggestions", items.len());
                self.panel = ActionPanel::Accessories { ticket, items: Some(items) };
            }
            Err(e) => {
                warn!("⚠️ Failed to get accessory suggestions: {}", e);
                self.reset_actions();
                self.notice = Some(ACCESSORIZE_FAILED.to_string());
            }
        }
        true
    }
}
