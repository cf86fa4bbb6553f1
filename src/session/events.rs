//! Tagged events that drive the session state machine
//!
//! Every asynchronous completion (fetch, narration end, sting end, timers)
//! is delivered back to the session loop as a [`SessionEvent`] carrying the
//! [`SessionToken`] it was issued for.

use crate::archive::{FetchError, Prophecy};
use crossbeam_channel::Sender;
use std::fmt;
use std::sync::OnceLock;
use std::thread;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, warn};

/// Identity of one playback session
///
/// Tokens increase monotonically; a completion whose token differs from the
/// live session's token belongs to an abandoned session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SessionToken(u64);

impl SessionToken {
    /// Token used before any session has started
    pub const NONE: SessionToken = SessionToken(0);

    /// The token issued to the session after this one
    pub fn next(self) -> Self {
        SessionToken(self.0 + 1)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Inputs to the session loop
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// User submitted a query
    Submit(String),

    /// Explicit reset: abandon any session and return to rest
    Reset,

    /// First user interaction; background music may start
    AmbientUnlock,

    /// The archive fetch for a session settled
    FetchSettled {
        token: SessionToken,
        outcome: Result<Prophecy, FetchError>,
    },

    /// Narration of an utterance ended (naturally, by watchdog, or instantly
    /// when no speech capability exists)
    NarrationEnded { token: SessionToken, utterance: u64 },

    /// The laugh clip reached its natural end
    LaughEnded { token: SessionToken },

    /// The sting fallback timer expired
    LaughFallback { token: SessionToken },

    /// The sting overlay finished its exit animation
    OverlayExited { token: SessionToken },

    /// Stop the session loop
    Shutdown,
}

impl SessionEvent {
    /// Session this event belongs to, if it is a completion
    pub fn token(&self) -> Option<SessionToken> {
        match self {
            SessionEvent::FetchSettled { token, .. }
            | SessionEvent::NarrationEnded { token, .. }
            | SessionEvent::LaughEnded { token }
            | SessionEvent::LaughFallback { token }
            | SessionEvent::OverlayExited { token } => Some(*token),
            SessionEvent::Submit(_)
            | SessionEvent::Reset
            | SessionEvent::AmbientUnlock
            | SessionEvent::Shutdown => None,
        }
    }
}

/// Cloneable handle for posting events into the session loop
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: Sender<SessionEvent>,
}

impl EventSink {
    pub fn new(tx: Sender<SessionEvent>) -> Self {
        Self { tx }
    }

    /// Post an event; dropped with a debug log once the loop is gone
    pub fn emit(&self, event: SessionEvent) {
        if let Err(e) = self.tx.send(event) {
            debug!("Session loop gone, dropping {:?}", e.into_inner());
        }
    }

    /// Build a one-shot completion that posts `event` when fired
    pub fn completion(&self, event: SessionEvent) -> Completion {
        Completion {
            sink: self.clone(),
            event,
        }
    }
}

/// A single registered continuation
///
/// Firing consumes the completion, so each one is delivered at most once.
#[derive(Debug)]
pub struct Completion {
    sink: EventSink,
    event: SessionEvent,
}

impl Completion {
    pub fn event(&self) -> &SessionEvent {
        &self.event
    }

    pub fn fire(self) {
        self.sink.emit(self.event);
    }

    /// A second completion posting the same event
    ///
    /// For callers that hand one completion to a backend but must still
    /// report the end themselves if the backend refuses it.
    pub(crate) fn duplicate(&self) -> Completion {
        Completion {
            sink: self.sink.clone(),
            event: self.event.clone(),
        }
    }
}

/// A pending [`schedule`]d completion
///
/// Dropping it leaves the timer running; only [`Timer::cancel`] stops it.
#[derive(Debug)]
pub struct Timer {
    task: AbortHandle,
}

impl Timer {
    pub fn cancel(self) {
        self.task.abort();
    }
}

/// Runtime that drives timers for threads outside any tokio runtime
fn timer_runtime() -> Option<&'static Handle> {
    static TIMERS: OnceLock<Option<Handle>> = OnceLock::new();

    TIMERS
        .get_or_init(|| {
            let runtime = match tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
            {
                Ok(runtime) => runtime,
                Err(e) => {
                    warn!("Failed to build timer runtime: {}", e);
                    return None;
                }
            };
            let handle = runtime.handle().clone();

            let spawned = thread::Builder::new()
                .name("seance-timers".into())
                .spawn(move || runtime.block_on(std::future::pending::<()>()));
            match spawned {
                Ok(_) => Some(handle),
                Err(e) => {
                    warn!("Failed to spawn timer thread: {}", e);
                    None
                }
            }
        })
        .as_ref()
}

/// Fire `completion` after `delay`
///
/// Runs on the caller's tokio runtime when there is one, otherwise on a
/// shared timer runtime. Stale firings are rejected by the receiver's token
/// checks, so cancelling is only needed to release the timer early.
pub fn schedule(delay: Duration, completion: Completion) -> Option<Timer> {
    let handle = Handle::try_current().ok().or_else(|| timer_runtime().cloned());

    let Some(handle) = handle else {
        // No runtime at all: a sleeping thread still delivers
        let spawned = thread::Builder::new()
            .name("seance-timer".into())
            .spawn(move || {
                thread::sleep(delay);
                completion.fire();
            });
        if let Err(e) = spawned {
            warn!("Failed to spawn timer thread: {}", e);
        }
        return None;
    };

    let task = handle.spawn(async move {
        tokio::time::sleep(delay).await;
        completion.fire();
    });
    Some(Timer {
        task: task.abort_handle(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_token_sequence() {
        let first = SessionToken::NONE.next();
        let second = first.next();
        assert!(second > first);
        assert_eq!(second.value(), 2);
        assert_eq!(format!("{}", second), "#2");
    }

    #[test]
    fn test_completion_fires_once() {
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        let token = SessionToken::NONE.next();

        let completion = sink.completion(SessionEvent::LaughEnded { token });
        assert_eq!(completion.event().token(), Some(token));
        completion.fire();

        assert!(matches!(rx.try_recv(), Ok(SessionEvent::LaughEnded { .. })));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_emit_after_loop_gone() {
        let (tx, rx) = unbounded();
        drop(rx);
        let sink = EventSink::new(tx);
        // Must not panic
        sink.emit(SessionEvent::Reset);
    }

    #[test]
    fn test_schedule_delivers() {
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        let token = SessionToken::NONE.next();

        schedule(
            Duration::from_millis(5),
            sink.completion(SessionEvent::LaughFallback { token }),
        );

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(event, SessionEvent::LaughFallback { .. }));
    }

    #[test]
    fn test_cancelled_timer_never_fires() {
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        let token = SessionToken::NONE.next();

        let timer = schedule(
            Duration::from_millis(20),
            sink.completion(SessionEvent::LaughFallback { token }),
        )
        .unwrap();
        timer.cancel();

        assert!(rx.recv_timeout(Duration::from_millis(150)).is_err());
    }

    #[test]
    fn test_cancelled_watchdogs_leave_later_timers_alone() {
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        let token = SessionToken::NONE.next();

        let timers: Vec<Timer> = (0..200)
            .map(|utterance| {
                schedule(
                    Duration::from_secs(90),
                    sink.completion(SessionEvent::NarrationEnded { token, utterance }),
                )
                .unwrap()
            })
            .collect();
        for timer in timers {
            timer.cancel();
        }
        schedule(
            Duration::from_millis(5),
            sink.completion(SessionEvent::LaughFallback { token }),
        );

        let event = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(matches!(event, SessionEvent::LaughFallback { .. }));
    }

    #[test]
    fn test_schedule_uses_callers_runtime() {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap();
        let (tx, rx) = unbounded();
        let sink = EventSink::new(tx);
        let token = SessionToken::NONE.next();

        rt.block_on(async {
            schedule(
                Duration::from_millis(5),
                sink.completion(SessionEvent::LaughFallback { token }),
            );
            tokio::time::sleep(Duration::from_millis(50)).await;
        });

        assert!(matches!(rx.try_recv(), Ok(SessionEvent::LaughFallback { .. })));
    }
}
