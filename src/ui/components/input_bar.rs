//! Query input component
//!
//! Text field and "summon" button; both are disabled while a session
//! is in flight.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Key, RichText, Vec2};

pub struct InputBar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> InputBar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.horizontal(|ui| {
                    self.show_text_input(ui);
                    ui.add_space(self.theme.spacing_sm);
                    self.show_summon_button(ui);
                });
            });
    }

    fn show_text_input(&mut self, ui: &mut egui::Ui) {
        let disabled = self.state.view.controls_disabled;
        let available_width = ui.available_width() - 120.0;

        let text_edit = egui::TextEdit::singleline(&mut self.state.query_input)
            .hint_text("Ask the spirits of the archive...")
            .desired_width(available_width)
            .font(egui::TextStyle::Body)
            .margin(egui::Margin::symmetric(12.0, 8.0));

        let response = ui.add_enabled(!disabled, text_edit);

        if response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter)) && self.state.can_submit() {
            self.state.submit_query();
            response.request_focus();
        }
    }

    fn show_summon_button(&mut self, ui: &mut egui::Ui) {
        let can_submit = self.state.can_submit();
        let label = if self.state.view.loading {
            "Channeling..."
        } else {
            "Summon"
        };

        let color = if can_submit {
            self.theme.primary
        } else {
            self.theme.text_muted
        };

        let button = egui::Button::new(RichText::new(label).color(self.theme.bg_primary).strong())
            .min_size(Vec2::new(100.0, 36.0))
            .rounding(self.theme.button_rounding)
            .fill(color);

        let response = ui.add_enabled(can_submit, button);
        if response.clicked() {
            self.state.submit_query();
        }
        response.on_hover_text("Send your question into the void (Enter)");
    }
}
