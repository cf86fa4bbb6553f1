//! Reusable UI components

mod history_sidebar;
mod input_bar;
mod learn_page;
mod prophecy_panel;
mod relic_box;
mod sting_overlay;

pub use history_sidebar::{HistorySidebar, CLEAR_CONFIRMATION};
pub use input_bar::InputBar;
pub use learn_page::LearnPage;
pub use prophecy_panel::ProphecyPanel;
pub use relic_box::RelicBox;
pub use sting_overlay::StingOverlay;
