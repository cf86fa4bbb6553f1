//! Prophecy display: loading state, cipher, interpretation and errors

use crate::archive::Prophecy;
use crate::session::SessionState;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct ProphecyPanel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> ProphecyPanel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let view = &self.state.view;

        if view.loading {
            self.show_loading(ui);
        } else if let Some(error) = &view.error {
            self.show_error(ui, error);
        }

        if let Some(prophecy) = self.state.displayed_prophecy() {
            ui.add_space(self.theme.spacing);
            self.show_prophecy(ui, &prophecy);
        } else if !view.loading && view.error.is_none() {
            self.show_empty_state(ui);
        }
    }

    fn show_loading(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(self.theme.spacing_lg);
            ui.spinner();
            ui.label(
                RichText::new("The spirits are stirring...")
                    .italics()
                    .color(self.theme.secondary),
            );
        });
    }

    fn show_error(&self, ui: &mut egui::Ui, error: &str) {
        egui::Frame::none()
            .fill(self.theme.error.gamma_multiply(0.15))
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.label(RichText::new(error).color(self.theme.error));
            });
    }

    fn show_prophecy(&self, ui: &mut egui::Ui, prophecy: &Prophecy) {
        let narrating = self.state.selected.is_none() && self.state.view.state == SessionState::Narrating;

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_lg)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());

                if let Some(entry) = &self.state.selected {
                    ui.label(
                        RichText::new(format!("Echo of \"{}\"", entry.query))
                            .small()
                            .color(self.theme.text_muted),
                    );
                    ui.add_space(self.theme.spacing_sm);
                }

                ui.label(
                    RichText::new(&prophecy.cipher)
                        .monospace()
                        .size(16.0)
                        .color(self.theme.cipher),
                );

                ui.add_space(self.theme.spacing);
                ui.separator();
                ui.add_space(self.theme.spacing);

                ui.label(
                    RichText::new(&prophecy.interpretation)
                        .size(16.0)
                        .color(self.theme.text_primary),
                );

                if narrating {
                    ui.add_space(self.theme.spacing_sm);
                    ui.label(
                        RichText::new("The medium speaks...")
                            .small()
                            .italics()
                            .color(self.theme.text_muted),
                    );
                }
            });
    }

    fn show_empty_state(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.label(
                RichText::new("Speak, and the archive shall answer")
                    .size(20.0)
                    .color(self.theme.text_secondary),
            );
            ui.label(
                RichText::new("Ask about the lost protocols of the old net.")
                    .color(self.theme.text_muted),
            );
        });
    }
}
