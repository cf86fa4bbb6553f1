//! Recent prophecies with delete and "banish all"

use crate::ledger::{HistoryEntry, VISIBLE_ECHOES};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub const CLEAR_CONFIRMATION: &str =
    "Banish all prophecies from the void? This action cannot be undone!";

enum Action {
    Select(HistoryEntry),
    Delete(usize),
}

pub struct HistorySidebar<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> HistorySidebar<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.heading(RichText::new("Echoes").color(self.theme.secondary));
        ui.add_space(self.theme.spacing_sm);

        let entries = self.state.history.recent();
        if entries.is_empty() {
            ui.label(
                RichText::new("The void is silent...")
                    .italics()
                    .color(self.theme.text_muted),
            );
            return;
        }

        let mut action = None;
        egui::ScrollArea::vertical()
            .auto_shrink([false, true])
            .show(ui, |ui| {
                for (index, entry) in entries.iter().take(VISIBLE_ECHOES).enumerate() {
                    if let Some(a) = self.show_entry(ui, index, entry) {
                        action = Some(a);
                    }
                    ui.add_space(self.theme.spacing_sm);
                }
            });

        match action {
            Some(Action::Select(entry)) => self.state.select(entry),
            Some(Action::Delete(index)) => self.state.delete_history(index),
            None => {}
        }

        ui.add_space(self.theme.spacing);
        let banish = egui::Button::new(RichText::new("Banish All Echoes").color(self.theme.error))
            .rounding(self.theme.button_rounding);
        if ui.add(banish).clicked() {
            self.state.confirm_clear = true;
        }

        if self.state.confirm_clear {
            self.show_confirm(ui.ctx());
        }
    }

    fn show_entry(&self, ui: &mut egui::Ui, index: usize, entry: &HistoryEntry) -> Option<Action> {
        let mut action = None;
        egui::Frame::none()
            .fill(self.theme.bg_tertiary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing_sm)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    let query = ui.add(
                        egui::Label::new(RichText::new(&entry.query).color(self.theme.text_primary))
                            .truncate()
                            .sense(egui::Sense::click()),
                    );
                    if query.clicked() {
                        action = Some(Action::Select(entry.clone()));
                    }

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.small_button("✖").on_hover_text("Banish this echo").clicked() {
                            action = Some(Action::Delete(index));
                        }
                    });
                });
                ui.label(
                    RichText::new(entry.timestamp.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
                        .small()
                        .color(self.theme.text_muted),
                );
            });
        action
    }

    fn show_confirm(&mut self, ctx: &egui::Context) {
        let mut confirmed = false;
        let mut cancelled = false;

        egui::Window::new("Banish the echoes")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label(CLEAR_CONFIRMATION);
                ui.add_space(self.theme.spacing);
                ui.horizontal(|ui| {
                    if ui.button(RichText::new("Banish").color(self.theme.error)).clicked() {
                        confirmed = true;
                    }
                    if ui.button("Keep them").clicked() {
                        cancelled = true;
                    }
                });
            });

        if confirmed {
            self.state.confirm_clear_history();
        } else if cancelled {
            self.state.confirm_clear = false;
        }
    }
}
