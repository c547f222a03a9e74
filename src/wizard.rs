//! The wizard state machine.
//!
//! Each step is a variant carrying only the data valid in it, so a profile
//! form without a photo cannot be represented. Provider calls happen outside
//! this type: a `begin`-style method moves into a loading state and hands
//! back a job stamped with the session generation, and the matching `finish`
//! method applies the outcome only if that generation is still current.
//! `reset` bumps the generation, which orphans every job issued before it.

use serde::{Serialize, Deserialize};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::FailureKind;
use crate::gemini::GeminiError;
use crate::looks::{AccessoryTarget, LookBoard, RefineTarget};
use crate::models::{AccessorySuggestion, GeneratedLook, Profile, ProfileDraft, StyleSuggestion, UserImage};

pub const IMAGE_REQUIRED: &str = "An image is required to proceed.";
pub const SUGGESTIONS_LOADING: &str = "Analyzing your photo for style suggestions...";
pub const PROFILE_LOADING: &str = "Analyzing your style profile...";
pub const TRY_ON_LOADING: &str = "Virtually trying on your new looks...";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum WizardError {
    #[error("{}", IMAGE_REQUIRED)]
    ImageRequired,
    #[error("cannot {action} during the {step} step")]
    InvalidTransition { action: &'static str, step: Step },
    #[error("the previous request is still running")]
    StillLoading,
    #[error("please describe the occasion")]
    EmptyOccasion,
    #[error("no style suggestion at position {0}")]
    NoSuchSuggestion(usize),
    #[error("the {0} field is required")]
    MissingField(&'static str),
    #[error("please describe the change you want")]
    EmptyInstruction,
    #[error("no looks were generated")]
    NoLooks,
    #[error("look {0} has no readable image")]
    UnreadableImage(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Introduction,
    Event,
    Suggestion,
    Profiling,
    Generating,
    Results,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Introduction => "introduction",
            Self::Event => "event",
            Self::Suggestion => "suggestion",
            Self::Profiling => "profiling",
            Self::Generating => "generating",
            Self::Results => "results",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone)]
pub enum WizardState {
    Introduction,
    Event { image: UserImage },
    /// `suggestions` is `None` while the provider call is running.
    Suggestion { image: UserImage, occasion: String, suggestions: Option<Vec<StyleSuggestion>> },
    Profiling { image: UserImage, occasion: String, draft: ProfileDraft },
    Generating { image: UserImage, profile: Profile, message: &'static str },
    Results { image: UserImage, board: LookBoard },
}

impl WizardState {
    pub fn step(&self) -> Step {
        match self {
            Self::Introduction => Step::Introduction,
            Self::Event { .. } => Step::Event,
            Self::Suggestion { .. } => Step::Suggestion,
            Self::Profiling { .. } => Step::Profiling,
            Self::Generating { .. } => Step::Generating,
            Self::Results { .. } => Step::Results,
        }
    }
}

/// Session generation captured when a provider call starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone)]
pub struct SuggestionJob {
    pub ticket: Ticket,
    pub image: UserImage,
    pub occasion: String,
}

#[derive(Debug, Clone)]
pub struct LookJob {
    pub ticket: Ticket,
    pub image: UserImage,
    pub profile: Profile,
}

#[derive(Debug, Clone)]
pub struct RefineJob {
    pub ticket: Ticket,
    pub target: RefineTarget,
}

#[derive(Debug, Clone)]
pub struct AccessoryJob {
    pub ticket: Ticket,
    pub target: AccessoryTarget,
}

#[derive(Debug, Clone)]
pub struct Wizard {
    state: WizardState,
    error: Option<String>,
    generation: u64,
}

impl Default for Wizard {
    fn default() -> Self {
        Self { state: WizardState::Introduction, error: None, generation: 0 }
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &WizardState { &self.state }
    pub fn step(&self) -> Step { self.state.step() }
    pub fn error(&self) -> Option<&str> { self.error.as_deref() }

    fn ticket(&self) -> Ticket {
        Ticket(self.generation)
    }

    fn is_current(&self, ticket: Ticket) -> bool {
        ticket.0 == self.generation
    }

    fn invalid(&self, action: &'static str) -> WizardError {
        WizardError::InvalidTransition { action, step: self.step() }
    }

    fn enter(&mut self, state: WizardState) {
        info!("➡️ Wizard step {} -> {}", self.step(), state.step());
        self.state = state;
    }

    /// Drops everything the wizard holds and returns to the upload step.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.error = None;
        self.enter(WizardState::Introduction);
    }

    /// Session-fatal failure: full reset, then show what went wrong.
    fn fail(&mut self, err: &GeminiError) {
        let kind = FailureKind::classify(err);
        warn!("⚠️ Provider call failed ({:?}) during {}: {}", kind, self.step(), err);
        self.reset();
        self.error = Some(kind.message().to_string());
    }

    pub fn upload_image(&mut self, image: UserImage) -> Result<(), WizardError> {
        if !matches!(self.state, WizardState::Introduction) {
            return Err(self.invalid("upload a photo"));
        }
        self.error = None;
        self.enter(WizardState::Event { image });
        Ok(())
    }

    pub fn submit_occasion(&mut self, occasion: &str) -> Result<SuggestionJob, WizardError> {
        let image = match &self.state {
            WizardState::Introduction => {
                self.error = Some(IMAGE_REQUIRED.to_string());
                return Err(WizardError::ImageRequired);
            }
            WizardState::Event { image } => image.clone(),
            _ => return Err(self.invalid("submit an occasion")),
        };
        let occasion = occasion.trim();
        if occasion.is_empty() {
            return Err(WizardError::EmptyOccasion);
        }
        self.error = None;
        self.enter(WizardState::Suggestion { image: image.clone(), occasion: occasion.to_string(), suggestions: None });
        Ok(SuggestionJob { ticket: self.ticket(), image, occasion: occasion.to_string() })
    }

    /// Returns false when the outcome was dropped as stale.
    pub fn finish_suggestions(&mut self, ticket: Ticket, result: Result<Vec<StyleSuggestion>, GeminiError>) -> bool {
        if !self.is_current(ticket) {
            info!("🗑️ Dropping style suggestions for an abandoned session generation");
            return false;
        }
        if !matches!(self.state, WizardState::Suggestion { suggestions: None, .. }) {
            return false;
        }
        match result {
            Ok(list) => {
                info!("✅ Stored {} style suggestions", list.len());
                if let WizardState::Suggestion { suggestions, .. } = &mut self.state {
                    *suggestions = Some(list);
                }
            }
            Err(e) => self.fail(&e),
        }
        true
    }

    fn leave_suggestions(&mut self, pick: Option<usize>) -> Result<(), WizardError> {
        let WizardState::Suggestion { image, occasion, suggestions } = &self.state else {
            return Err(self.invalid(if pick.is_some() { "choose a suggestion" } else { "skip suggestions" }));
        };
        let list = suggestions.as_ref().ok_or(WizardError::StillLoading)?;
        let draft = match pick {
            Some(index) => {
                let chosen = list.get(index).ok_or(WizardError::NoSuchSuggestion(index))?;
                ProfileDraft::merge(&chosen.keywords, occasion)
            }
            None => ProfileDraft::from_occasion(occasion),
        };
        let next = WizardState::Profiling { image: image.clone(), occasion: occasion.clone(), draft };
        self.error = None;
        self.enter(next);
        Ok(())
    }

    pub fn choose_suggestion(&mut self, index: usize) -> Result<(), WizardError> {
        self.leave_suggestions(Some(index))
    }

    pub fn skip_suggestions(&mut self) -> Result<(), WizardError> {
        self.leave_suggestions(None)
    }

    pub fn submit_profile(&mut self, profile: Profile) -> Result<LookJob, WizardError> {
        let WizardState::Profiling { image, .. } = &self.state else {
            return Err(self.invalid("submit a profile"));
        };
        if profile.occasion.trim().is_empty() {
            return Err(WizardError::MissingField("occasion"));
        }
        if profile.vibe.trim().is_empty() {
            return Err(WizardError::MissingField("vibe"));
        }
        let image = image.clone();
        self.error = None;
        self.enter(WizardState::Generating { image: image.clone(), profile: profile.clone(), message: PROFILE_LOADING });
        Ok(LookJob { ticket: self.ticket(), image, profile })
    }

    /// Outfit ideas are in; the per-idea image edits are starting.
    pub fn mark_trying_on(&mut self, ticket: Ticket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        match &mut self.state {
            WizardState::Generating { message, .. } => {
                *message = TRY_ON_LOADING;
                true
            }
            _ => false,
        }
    }

    pub fn finish_looks(&mut self, ticket: Ticket, result: Result<Vec<GeneratedLook>, GeminiError>) -> bool {
        if !self.is_current(ticket) {
            info!("🗑️ Dropping generated looks for an abandoned session generation");
            return false;
        }
        let WizardState::Generating { image, .. } = &self.state else {
            return false;
        };
        match result {
            Ok(looks) => {
                info!("✅ Generated {} looks", looks.len());
                let next = WizardState::Results { image: image.clone(), board: LookBoard::new(looks) };
                self.error = None;
                self.enter(next);
            }
            Err(e) => self.fail(&e),
        }
        true
    }

    pub fn board(&self) -> Option<&LookBoard> {
        match &self.state {
            WizardState::Results { board, .. } => Some(board),
            _ => None,
        }
    }

    fn board_mut(&mut self, action: &'static str) -> Result<&mut LookBoard, WizardError> {
        let step = self.step();
        match &mut self.state {
            WizardState::Results { board, .. } => Ok(board),
            _ => Err(WizardError::InvalidTransition { action, step }),
        }
    }

    pub fn next_look(&mut self) -> Result<(), WizardError> {
        self.board_mut("browse looks")?.next();
        Ok(())
    }

    pub fn prev_look(&mut self) -> Result<(), WizardError> {
        self.board_mut("browse looks")?.prev();
        Ok(())
    }

    pub fn open_refine(&mut self) -> Result<(), WizardError> {
        self.board_mut("refine a look")?.open_refine()
    }

    pub fn close_panel(&mut self) -> Result<(), WizardError> {
        self.board_mut("close the action panel")?.close_panel();
        Ok(())
    }

    pub fn begin_refine(&mut self, instruction: &str) -> Result<RefineJob, WizardError> {
        let ticket = self.ticket();
        let target = self.board_mut("refine a look")?.begin_refine(instruction)?;
        Ok(RefineJob { ticket, target })
    }

    pub fn finish_refine(&mut self, ticket: Ticket, index: usize, result: Result<UserImage, GeminiError>) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        match self.board_mut("refine a look") {
            Ok(board) => {
                board.finish_refine(index, result);
                true
            }
            Err(_) => false,
        }
    }

    pub fn begin_accessorize(&mut self) -> Result<AccessoryJob, WizardError> {
        let ticket = self.ticket();
        let target = self.board_mut("accessorize a look")?.begin_accessorize()?;
        Ok(AccessoryJob { ticket, target })
    }

    pub fn finish_accessorize(&mut self, job_ticket: Ticket, panel_ticket: u64, result: Result<Vec<AccessorySuggestion>, GeminiError>) -> bool {
        if !self.is_current(job_ticket) {
            return false;
        }
        match self.board_mut("accessorize a look") {
            Ok(board) => board.finish_accessorize(panel_ticket, result),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CREDENTIAL_FAILURE, GENERIC_FAILURE};
    use crate::models::{Budget, OutfitIdea, StyleKeywords};
    use pretty_assertions::assert_eq;

    fn photo() -> UserImage {
        UserImage::new("image/jpeg", "/9j/PHOTO")
    }

    fn suggestion(name: &str) -> StyleSuggestion {
        StyleSuggestion {
            name: name.into(),
            description: format!("{name} direction"),
            keywords: StyleKeywords {
                vibe: Some(format!("{name} vibe")),
                colors_or_materials: Some("Navy wool".into()),
                style_inspirations: Some("Grace Kelly".into()),
            },
        }
    }

    fn profile() -> Profile {
        Profile {
            occasion: "Wedding Guest".into(),
            vibe: "Elegant".into(),
            colors_or_materials: String::new(),
            style_inspirations: String::new(),
            budget: Budget::Luxury,
        }
    }

    fn looks(n: usize) -> Vec<GeneratedLook> {
        (0..n)
            .map(|i| {
                let idea = OutfitIdea {
                    name: format!("Look {i}"),
                    explanation: "why".into(),
                    edit_prompt: "dress".into(),
                };
                GeneratedLook::new(idea, &UserImage::new("image/png", format!("L{i}")))
            })
            .collect()
    }

    fn at_suggestions(list: Vec<StyleSuggestion>) -> Wizard {
        let mut w = Wizard::new();
        w.upload_image(photo()).unwrap();
        let job = w.submit_occasion("Wedding Guest").unwrap();
        assert!(w.finish_suggestions(job.ticket, Ok(list)));
        w
    }

    fn at_results(n: usize) -> Wizard {
        let mut w = at_suggestions(vec![suggestion("Classic")]);
        w.skip_suggestions().unwrap();
        let job = w.submit_profile(profile()).unwrap();
        assert!(w.finish_looks(job.ticket, Ok(looks(n))));
        w
    }

    #[test]
    fn upload_moves_to_event_and_clears_error() {
        let mut w = Wizard::new();
        assert!(w.submit_occasion("Gala").is_err());
        assert_eq!(w.error(), Some(IMAGE_REQUIRED));

        w.upload_image(photo()).unwrap();
        assert_eq!(w.step(), Step::Event);
        assert_eq!(w.error(), None);
    }

    #[test]
    fn occasion_without_photo_stays_on_introduction() {
        let mut w = Wizard::new();
        assert_eq!(w.submit_occasion("Gala").unwrap_err(), WizardError::ImageRequired);
        assert_eq!(w.step(), Step::Introduction);
    }

    #[test]
    fn occasion_starts_one_suggestion_job() {
        let mut w = Wizard::new();
        w.upload_image(photo()).unwrap();
        assert_eq!(w.submit_occasion("   ").unwrap_err(), WizardError::EmptyOccasion);
        assert_eq!(w.step(), Step::Event);

        let job = w.submit_occasion("  Wedding Guest ").unwrap();
        assert_eq!(job.occasion, "Wedding Guest");
        assert_eq!(job.image, photo());
        assert_eq!(w.step(), Step::Suggestion);
        assert!(matches!(w.state(), WizardState::Suggestion { suggestions: None, .. }));
        assert!(matches!(w.submit_occasion("again"), Err(WizardError::InvalidTransition { .. })));
    }

    #[test]
    fn suggestion_failure_resets_with_message() {
        let mut w = Wizard::new();
        w.upload_image(photo()).unwrap();
        let job = w.submit_occasion("Gala").unwrap();
        assert!(w.finish_suggestions(job.ticket, Err(GeminiError::Parse("bad".into()))));
        assert_eq!(w.step(), Step::Introduction);
        assert_eq!(w.error(), Some(GENERIC_FAILURE));
    }

    #[test]
    fn quota_failure_gets_credential_message() {
        let mut w = Wizard::new();
        w.upload_image(photo()).unwrap();
        let job = w.submit_occasion("Gala").unwrap();
        let err = GeminiError::Status { status: 429, body: "RESOURCE_EXHAUSTED".into() };
        w.finish_suggestions(job.ticket, Err(err));
        assert_eq!(w.step(), Step::Introduction);
        assert_eq!(w.error(), Some(CREDENTIAL_FAILURE));
    }

    #[test]
    fn choosing_merges_keywords_with_occasion() {
        let mut w = at_suggestions(vec![suggestion("Classic"), suggestion("Bold")]);
        assert_eq!(w.choose_suggestion(5).unwrap_err(), WizardError::NoSuchSuggestion(5));
        w.choose_suggestion(1).unwrap();
        let WizardState::Profiling { draft, .. } = w.state() else { panic!("expected profiling") };
        assert_eq!(
            draft,
            &ProfileDraft {
                occasion: "Wedding Guest".into(),
                vibe: Some("Bold vibe".into()),
                colors_or_materials: Some("Navy wool".into()),
                style_inspirations: Some("Grace Kelly".into()),
                budget: None,
            }
        );
    }

    #[test]
    fn skipping_keeps_only_occasion() {
        let mut w = at_suggestions(vec![suggestion("Classic")]);
        w.skip_suggestions().unwrap();
        let WizardState::Profiling { draft, .. } = w.state() else { panic!("expected profiling") };
        assert_eq!(draft, &ProfileDraft::from_occasion("Wedding Guest"));
    }

    #[test]
    fn cannot_leave_suggestions_while_loading() {
        let mut w = Wizard::new();
        w.upload_image(photo()).unwrap();
        w.submit_occasion("Gala").unwrap();
        assert_eq!(w.skip_suggestions().unwrap_err(), WizardError::StillLoading);
        assert_eq!(w.choose_suggestion(0).unwrap_err(), WizardError::StillLoading);
    }

    #[test]
    fn profile_runs_through_generating_to_results() {
        let mut w = at_suggestions(vec![]);
        w.skip_suggestions().unwrap();
        let mut blank = profile();
        blank.vibe = " ".into();
        assert_eq!(w.submit_profile(blank).unwrap_err(), WizardError::MissingField("vibe"));

        let job = w.submit_profile(profile()).unwrap();
        assert_eq!(job.profile, profile());
        assert!(matches!(w.state(), WizardState::Generating { message: PROFILE_LOADING, .. }));
        assert!(w.mark_trying_on(job.ticket));
        assert!(matches!(w.state(), WizardState::Generating { message: TRY_ON_LOADING, .. }));

        assert!(w.finish_looks(job.ticket, Ok(looks(3))));
        assert_eq!(w.step(), Step::Results);
        let board = w.board().unwrap();
        assert_eq!(board.len(), 3);
        assert_eq!(board.current_index(), 0);
        assert_eq!(board.display_image(0), Some(board.looks()[0].image_url.as_str()));
    }

    #[test]
    fn failed_generation_stores_nothing() {
        let mut w = at_suggestions(vec![]);
        w.skip_suggestions().unwrap();
        let job = w.submit_profile(profile()).unwrap();
        w.finish_looks(job.ticket, Err(GeminiError::MissingImage));
        assert_eq!(w.step(), Step::Introduction);
        assert!(w.board().is_none());
        assert_eq!(w.error(), Some(GENERIC_FAILURE));
    }

    #[test]
    fn results_from_before_reset_are_dropped() {
        let mut w = Wizard::new();
        w.upload_image(photo()).unwrap();
        let stale = w.submit_occasion("Gala").unwrap();
        w.reset();
        assert!(!w.finish_suggestions(stale.ticket, Err(GeminiError::MissingText)));
        assert_eq!(w.error(), None);

        w.upload_image(photo()).unwrap();
        let fresh = w.submit_occasion("Brunch").unwrap();
        assert!(!w.finish_suggestions(stale.ticket, Ok(vec![suggestion("Old")])));
        assert!(matches!(w.state(), WizardState::Suggestion { suggestions: None, .. }));
        assert!(w.finish_suggestions(fresh.ticket, Ok(vec![suggestion("New")])));
    }

    #[test]
    fn stale_looks_and_refines_are_dropped() {
        let mut w = at_results(2);
        let refine = w.begin_refine("red jacket").unwrap();
        let accessorize = w.begin_accessorize().unwrap();
        w.reset();
        assert!(!w.finish_refine(refine.ticket, refine.target.index, Ok(UserImage::new("image/png", "X"))));
        assert!(!w.finish_accessorize(accessorize.ticket, accessorize.target.ticket, Ok(vec![])));
        assert_eq!(w.step(), Step::Introduction);
    }

    #[test]
    fn reset_during_generating_is_not_undone() {
        let mut w = at_suggestions(vec![]);
        w.skip_suggestions().unwrap();
        let stale = w.submit_profile(profile()).unwrap();
        w.reset();

        assert!(!w.mark_trying_on(stale.ticket));
        assert!(!w.finish_looks(stale.ticket, Ok(looks(2))));
        assert!(!w.finish_looks(stale.ticket, Err(GeminiError::MissingImage)));
        assert_eq!(w.step(), Step::Introduction);
        assert_eq!(w.error(), None);
        assert!(w.board().is_none());

        // a fresh run is not touched by the old one either
        w.upload_image(photo()).unwrap();
        let job = w.submit_occasion("Gala").unwrap();
        assert!(w.finish_suggestions(job.ticket, Ok(vec![])));
        w.skip_suggestions().unwrap();
        let fresh = w.submit_profile(profile()).unwrap();
        assert!(!w.mark_trying_on(stale.ticket));
        assert!(matches!(w.state(), WizardState::Generating { message: PROFILE_LOADING, .. }));
        assert!(!w.finish_looks(stale.ticket, Ok(looks(2))));
        assert_eq!(w.step(), Step::Generating);
        assert!(w.finish_looks(fresh.ticket, Ok(looks(1))));
        assert_eq!(w.board().unwrap().len(), 1);
    }

    #[test]
    fn reset_clears_everything_from_any_step() {
        let mut w = at_results(3);
        w.next_look().unwrap();
        w.reset();
        assert_eq!(w.step(), Step::Introduction);
        assert_eq!(w.error(), None);
        assert!(w.board().is_none());

        let mut w = Wizard::new();
        w.submit_occasion("x").unwrap_err();
        w.reset();
        assert_eq!(w.error(), None);
        assert_eq!(w.step(), Step::Introduction);
    }

    #[test]
    fn look_actions_need_results() {
        let mut w = Wizard::new();
        assert!(matches!(w.next_look(), Err(WizardError::InvalidTransition { step: Step::Introduction, .. })));
        assert!(w.begin_accessorize().is_err());

        let mut w = at_results(3);
        w.prev_look().unwrap();
        assert_eq!(w.board().unwrap().current_index(), 2);
        w.next_look().unwrap();
        assert_eq!(w.board().unwrap().current_index(), 0);
    }

    #[test]
    fn refine_applies_to_started_index_after_navigation() {
        let mut w = at_results(3);
        let job = w.begin_refine("add a hat").unwrap();
        w.next_look().unwrap();
        assert!(w.finish_refine(job.ticket, job.target.index, Ok(UserImage::new("image/png", "HAT"))));
        let board = w.board().unwrap();
        assert_eq!(board.display_image(0), Some("data:image/png;base64,HAT"));
        assert_eq!(board.display_image(1), Some("data:image/png;base64,L1"));
    }
}
