//! One deterministic, interruption-safe playback session per submission
//!
//! A single loop thread owns the [`SessionOrchestrator`]. Everything that
//! completes asynchronously (the archive fetch, narration, the laugh clip,
//! timers) reports back as a token-tagged [`SessionEvent`].

pub mod events;
pub mod orchestrator;
pub mod policy;
pub mod runtime;
pub mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use events::{schedule, Completion, EventSink, SessionEvent, SessionToken, Timer};
pub use orchestrator::{Flow, SessionOrchestrator, SessionParts};
pub use policy::VolumePolicy;
pub use runtime::{SessionHandle, SessionRuntime};
pub use state::{PlaybackSession, SessionNotice, SessionState, SessionView};
