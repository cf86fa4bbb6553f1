//! egui front-end for the séance
//!
//! Session state comes from the session loop; the overlay and shake are
//! drawn from the shared [`OverlayStage`].

mod app;
pub mod components;
mod stage;
mod state;
mod theme;

pub use app::SeanceApp;
pub use stage::{OverlayPhase, OverlayStage};
pub use state::{AppState, Page};
pub use theme::Theme;
