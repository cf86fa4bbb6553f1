//! Application state management
//!
//! This module provides the central state for the séance UI. Session state
//! arrives as notices from the session loop; everything else (history,
//! relics, the learning chat) lives here.

use crate::archive::{ArchiveClient, FetchError, Prophecy};
use crate::ledger::{HistoryEntry, LearnTranscript, ProphecyHistory, RelicTracker};
use crate::session::{SessionHandle, SessionNotice, SessionToken, SessionView};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// How long a notification stays visible
const NOTIFICATION_TTL: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Seance,
    Learn,
}

type LearnReply = std::result::Result<String, FetchError>;

pub struct AppState {
    pub page: Page,
    pub query_input: String,
    pub learn_input: String,
    /// Latest snapshot from the session loop
    pub view: SessionView,
    pub history: ProphecyHistory,
    pub relics: RelicTracker,
    pub transcript: LearnTranscript,
    /// Prophecy picked from the sidebar, shown instead of the live one
    pub selected: Option<HistoryEntry>,
    /// "Banish all" waiting for confirmation
    pub confirm_clear: bool,
    pub learn_pending: bool,
    notification: Option<(String, Instant)>,
    unlocked: bool,
    /// Newest session already written to history
    recorded: SessionToken,
    session: Option<SessionHandle>,
    archive: Option<Arc<ArchiveClient>>,
    runtime: Option<Handle>,
    learn_tx: Sender<LearnReply>,
    learn_rx: Receiver<LearnReply>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    /// State with no session loop or archive behind it
    pub fn new() -> Self {
        let (learn_tx, learn_rx) = unbounded();
        Self {
            page: Page::Seance,
            query_input: String::new(),
            learn_input: String::new(),
            view: SessionView::default(),
            history: ProphecyHistory::new(),
            relics: RelicTracker::new(),
            transcript: LearnTranscript::new(),
            selected: None,
            confirm_clear: false,
            learn_pending: false,
            notification: None,
            unlocked: false,
            recorded: SessionToken::NONE,
            session: None,
            archive: None,
            runtime: None,
            learn_tx,
            learn_rx,
        }
    }

    pub fn connected(session: SessionHandle, archive: Arc<ArchiveClient>, runtime: Handle) -> Self {
        Self {
            view: session.view(),
            session: Some(session),
            archive: Some(archive),
            runtime: Some(runtime),
            ..Self::new()
        }
    }

    /// First user interaction: background music may start
    pub fn unlock(&mut self) {
        if self.unlocked {
            return;
        }
        self.unlocked = true;
        if let Some(session) = &self.session {
            if let Err(e) = session.ambient_unlock() {
                warn!("Failed to unlock ambient audio: {}", e);
            }
        }
    }

    pub fn can_submit(&self) -> bool {
        !self.view.controls_disabled && !self.query_input.trim().is_empty()
    }

    /// Send the query box to the medium
    pub fn submit_query(&mut self) {
        let query = self.query_input.trim().to_string();
        if query.is_empty() {
            return;
        }

        for relic in self.relics.observe(&query) {
            info!("Relic found: {}", relic.keyword);
            self.notify(format!("{} {} unlocked!", relic.icon, relic.badge));
        }

        self.selected = None;
        self.query_input.clear();

        if let Some(session) = &self.session {
            if let Err(e) = session.submit(query) {
                warn!("Failed to submit query: {}", e);
            }
        }
    }

    /// Abandon the running session and return to rest
    pub fn reset_session(&mut self) {
        self.selected = None;
        if let Some(session) = &self.session {
            if let Err(e) = session.reset() {
                warn!("Failed to reset session: {}", e);
            }
        }
    }

    /// Drain notices from the session loop and finished learn requests
    pub fn poll_events(&mut self) {
        let notices: Vec<SessionNotice> = self
            .session
            .as_ref()
            .map(|s| s.notice_receiver().try_iter().collect())
            .unwrap_or_default();
        for notice in notices {
            self.apply_notice(notice);
        }

        while let Ok(reply) = self.learn_rx.try_recv() {
            self.apply_learn_reply(reply);
        }
    }

    pub fn apply_notice(&mut self, notice: SessionNotice) {
        match notice {
            SessionNotice::View(view) => {
                if view.token != self.recorded {
                    if let (Some(result), Some(query)) = (&view.result, &view.query) {
                        self.history.record(query.clone(), result);
                        self.recorded = view.token;
                    }
                }
                self.view = view;
            }
            SessionNotice::Transition { token, from, to } => {
                debug!("Session {} {} -> {}", token, from, to);
            }
            SessionNotice::Superseded { token } => {
                debug!("Session {} superseded", token);
            }
        }
    }

    /// What the prophecy panel shows
    pub fn displayed_prophecy(&self) -> Option<Prophecy> {
        self.selected
            .as_ref()
            .map(HistoryEntry::prophecy)
            .or_else(|| self.view.result.clone())
    }

    pub fn select(&mut self, entry: HistoryEntry) {
        self.selected = Some(entry);
        self.page = Page::Seance;
    }

    pub fn delete_history(&mut self, index: usize) {
        if let Some(removed) = self.history.delete(index) {
            if self.selected.as_ref().map(|s| s.id) == Some(removed.id) {
                self.selected = None;
            }
        }
    }

    pub fn confirm_clear_history(&mut self) {
        self.confirm_clear = false;
        self.history.clear();
        self.selected = None;
    }

    /// Send the learning chat's input to the archive
    pub fn ask_archive(&mut self) {
        let query = self.learn_input.trim().to_string();
        if query.is_empty() || self.learn_pending {
            return;
        }
        self.learn_input.clear();
        self.transcript.add_question(query.clone());

        let (Some(archive), Some(runtime)) = (&self.archive, &self.runtime) else {
            self.transcript.add_failure();
            return;
        };

        self.learn_pending = true;
        let archive = Arc::clone(archive);
        let tx = self.learn_tx.clone();
        runtime.spawn(async move {
            let reply = archive.learn(&query).await;
            let _ = tx.send(reply);
        });
    }

    pub fn apply_learn_reply(&mut self, reply: LearnReply) {
        self.learn_pending = false;
        match reply {
            Ok(text) => self.transcript.add_answer(text),
            Err(e) => {
                warn!("Learning request failed: {}", e);
                self.transcript.add_failure();
            }
        }
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notification = Some((message.into(), Instant::now()));
    }

    pub fn active_notification(&self, now: Instant) -> Option<&str> {
        self.notification
            .as_ref()
            .filter(|(_, at)| now.saturating_duration_since(*at) < NOTIFICATION_TTL)
            .map(|(message, _)| message.as_str())
    }

    pub fn shutdown(&self) {
        if let Some(session) = &self.session {
            if let Err(e) = session.shutdown() {
                debug!("Session loop already gone: {}", e);
            }
        }
    }
}
