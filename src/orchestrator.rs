//! Drives wizard sessions against a stylist.
//!
//! Every user event is a short synchronous update of the session. Provider
//! calls are spawned and report back through the wizard's `finish_*`
//! methods, which drop outcomes from a superseded session generation.

use chrono::TimeDelta;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::{Profile, UserImage};
use crate::pipeline::generate_looks;
use crate::session::SessionStore;
use crate::stylist::Stylist;
use crate::view::Snapshot;
use crate::wizard::{AccessoryJob, LookJob, RefineJob, SuggestionJob, Wizard, WizardError};

#[derive(Clone)]
pub struct Orchestrator {
    sessions: SessionStore,
    stylist: Arc<dyn Stylist>,
}

impl Orchestrator {
    pub fn new(stylist: Arc<dyn Stylist>) -> Self {
        info!("🧵 Wizard orchestrator using stylist '{}'", stylist.name());
        Self { sessions: SessionStore::default(), stylist }
    }

    /// Periodically drops sessions that have seen no update for `ttl`.
    pub fn spawn_session_sweeper(&self, ttl: Duration) -> JoinHandle<()> {
        let sessions = self.sessions.clone();
        let period = ttl.clamp(Duration::from_millis(10), Duration::from_secs(60));
        tokio::spawn(async move {
            let Ok(max_idle) = TimeDelta::from_std(ttl) else {
                warn!("⚠️ Session TTL {:?} out of range, idle sessions will not expire", ttl);
                return;
            };
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let evicted = sessions.evict_idle(max_idle);
                if evicted > 0 {
                    info!("🧹 Expired {} idle sessions, {} remain", evicted, sessions.len());
                } else if !sessions.is_empty() {
                    debug!("{} active sessions", sessions.len());
                }
            }
        })
    }

    pub fn create_session(&self) -> Snapshot {
        let session = self.sessions.create();
        info!("🆕 Created session {}", session.id);
        Snapshot::from(&session)
    }

    pub fn snapshot(&self, id: Uuid) -> Result<Snapshot, ApiError> {
        self.sessions.read(id, |s| Snapshot::from(s)).ok_or(ApiError::SessionNotFound(id))
    }

    pub fn delete_session(&self, id: Uuid) -> Result<(), ApiError> {
        if self.sessions.remove(id) { Ok(()) } else { Err(ApiError::SessionNotFound(id)) }
    }

    /// Runs a synchronous wizard event and returns the resulting snapshot.
    fn apply<T>(&self, id: Uuid, f: impl FnOnce(&mut Wizard) -> Result<T, WizardError>) -> Result<(T, Snapshot), ApiError> {
        let out = self.sessions.update(id, f).ok_or(ApiError::SessionNotFound(id))??;
        Ok((out, self.snapshot(id)?))
    }

    pub fn upload_image(&self, id: Uuid, image: UserImage) -> Result<Snapshot, ApiError> {
        Ok(self.apply(id, |w| w.upload_image(image))?.1)
    }

    pub fn submit_occasion(&self, id: Uuid, occasion: &str) -> Result<Snapshot, ApiError> {
        let (job, snapshot) = self.apply(id, |w| w.submit_occasion(occasion))?;
        tokio::spawn(self.clone().run_suggestions(id, job));
        Ok(snapshot)
    }

    async fn run_suggestions(self, id: Uuid, job: SuggestionJob) {
        let result = self.stylist.style_suggestions(&job.image, &job.occasion).await;
        self.sessions.update(id, |w| w.finish_suggestions(job.ticket, result));
    }

    pub fn choose_suggestion(&self, id: Uuid, index: usize) -> Result<Snapshot, ApiError> {
        Ok(self.apply(id, |w| w.choose_suggestion(index))?.1)
    }

    pub fn skip_suggestions(&self, id: Uuid) -> Result<Snapshot, ApiError> {
        Ok(self.apply(id, |w| w.skip_suggestions())?.1)
    }

    pub fn submit_profile(&self, id: Uuid, profile: Profile) -> Result<Snapshot, ApiError> {
        let (job, snapshot) = self.apply(id, |w| w.submit_profile(profile))?;
        tokio::spawn(self.clone().run_looks(id, job));
        Ok(snapshot)
    }

    async fn run_looks(self, id: Uuid, job: LookJob) {
        let ticket = job.ticket;
        let sessions = self.sessions.clone();
        let result = generate_looks(self.stylist.as_ref(), &job.image, &job.profile, move || {
            sessions.update(id, |w| w.mark_trying_on(ticket));
        })
        .await;
        self.sessions.update(id, |w| w.finish_looks(ticket, result));
    }

    pub fn next_look(&self, id: Uuid) -> Result<Snapshot, ApiError> {
        Ok(self.apply(id, |w| w.next_look())?.1)
    }

    pub fn prev_look(&self, id: Uuid) -> Result<Snapshot, ApiError> {
        Ok(self.apply(id, |w| w.prev_look())?.1)
    }

    pub fn open_refine(&self, id: Uuid) -> Result<Snapshot, ApiError> {
        Ok(self.apply(id, |w| w.open_refine())?.1)
    }

    pub fn close_panel(&self, id: Uuid) -> Result<Snapshot, ApiError> {
        Ok(self.apply(id, |w| w.close_panel())?.1)
    }

    pub fn refine_look(&self, id: Uuid, instruction: &str) -> Result<Snapshot, ApiError> {
        let (job, snapshot) = self.apply(id, |w| w.begin_refine(instruction))?;
        tokio::spawn(self.clone().run_refine(id, job));
        Ok(snapshot)
    }

    async fn run_refine(self, id: Uuid, job: RefineJob) {
        let RefineJob { ticket, target } = job;
        let result = self.stylist.edit_image(&target.image, &target.instruction).await;
        self.sessions.update(id, |w| w.finish_refine(ticket, target.index, result));
    }

    pub fn accessorize(&self, id: Uuid) -> Result<Snapshot, ApiError> {
        let (job, snapshot) = self.apply(id, |w| w.begin_accessorize())?;
        tokio::spawn(self.clone().run_accessorize(id, job));
        Ok(snapshot)
    }

    async fn run_accessorize(self, id: Uuid, job: AccessoryJob) {
        let AccessoryJob { ticket, target } = job;
        let result = self.stylist.accessory_suggestions(&target.look_name, &target.explanation).await;
        self.sessions.update(id, |w| w.finish_accessorize(ticket, target.ticket, result));
    }

    pub fn reset(&self, id: Uuid) -> Result<Snapshot, ApiError> {
        Ok(self.apply(id, |w| {
            w.reset();
            Ok(())
        })?
        .1)
    }
}
