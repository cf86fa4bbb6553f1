//! Thread that owns the orchestrator and feeds it events

use super::events::{EventSink, SessionEvent};
use super::orchestrator::{Flow, SessionOrchestrator, SessionParts};
use super::state::{SessionNotice, SessionView};
use crate::integration::SeanceConfig;
use crate::{Result, SeanceError};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{info, warn};

/// Handle for driving the session loop from the UI
#[derive(Clone)]
pub struct SessionHandle {
    event_tx: Sender<SessionEvent>,
    notice_rx: Receiver<SessionNotice>,
    view: Arc<Mutex<SessionView>>,
}

impl SessionHandle {
    fn send(&self, event: SessionEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .map_err(|e| SeanceError::ChannelError(format!("Failed to send event: {}", e)))
    }

    /// Submit a query; empty queries are ignored by the loop
    pub fn submit(&self, query: impl Into<String>) -> Result<()> {
        self.send(SessionEvent::Submit(query.into()))
    }

    pub fn reset(&self) -> Result<()> {
        self.send(SessionEvent::Reset)
    }

    /// Report the first user interaction
    pub fn ambient_unlock(&self) -> Result<()> {
        self.send(SessionEvent::AmbientUnlock)
    }

    pub fn shutdown(&self) -> Result<()> {
        self.send(SessionEvent::Shutdown)
    }

    /// Sink for posting raw events, e.g. from a sting stage
    pub fn sink(&self) -> EventSink {
        EventSink::new(self.event_tx.clone())
    }

    /// Try to receive a notice from the loop
    pub fn try_recv_notice(&self) -> Option<SessionNotice> {
        self.notice_rx.try_recv().ok()
    }

    pub fn notice_receiver(&self) -> Receiver<SessionNotice> {
        self.notice_rx.clone()
    }

    /// Latest snapshot published by the loop
    pub fn view(&self) -> SessionView {
        self.view.lock().clone()
    }
}

/// Session loop ready to be started
pub struct SessionRuntime {
    orchestrator: SessionOrchestrator,
    event_rx: Receiver<SessionEvent>,
    notice_tx: Sender<SessionNotice>,
    inner_rx: Receiver<SessionNotice>,
    view: Arc<Mutex<SessionView>>,
}

impl SessionRuntime {
    /// Wire the orchestrator to fresh event and notice queues
    pub fn new(parts: SessionParts, config: &SeanceConfig) -> (Self, SessionHandle) {
        let (event_tx, event_rx) = unbounded();
        let sink = EventSink::new(event_tx.clone());
        let (inner_tx, inner_rx) = unbounded();
        let (notice_tx, notice_rx) = unbounded();

        let orchestrator = SessionOrchestrator::new(parts, config, sink, inner_tx);
        let view = Arc::new(Mutex::new(orchestrator.view()));

        let handle = SessionHandle {
            event_tx,
            notice_rx,
            view: Arc::clone(&view),
        };

        let runtime = Self {
            orchestrator,
            event_rx,
            notice_tx,
            inner_rx,
            view,
        };

        (runtime, handle)
    }

    /// Start the loop on its own thread
    pub fn start(self) -> Result<JoinHandle<()>> {
        let Self {
            mut orchestrator,
            event_rx,
            notice_tx,
            inner_rx,
            view,
        } = self;

        thread::Builder::new()
            .name("seance-session".into())
            .spawn(move || {
                info!("Session loop started");

                loop {
                    let event = match event_rx.recv() {
                        Ok(event) => event,
                        Err(_) => {
                            warn!("Event channel disconnected");
                            break;
                        }
                    };

                    let flow = orchestrator.handle(event);

                    // Forward notices, keeping the latest view for polling
                    for notice in inner_rx.try_iter() {
                        if let SessionNotice::View(snapshot) = &notice {
                            *view.lock() = snapshot.clone();
                        }
                        let _ = notice_tx.send(notice);
                    }

                    if flow == Flow::Stop {
                        break;
                    }
                }

                info!("Session loop stopped");
            })
            .map_err(|e| SeanceError::ChannelError(format!("Failed to spawn session loop: {}", e)))
    }
}
