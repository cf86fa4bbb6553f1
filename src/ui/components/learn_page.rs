//! The learning chat page

use crate::ledger::{LearnMessage, Role};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, Align, Key, RichText, Vec2};

pub struct LearnPage<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> LearnPage<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading(RichText::new("Learning Portal").color(self.theme.primary));
            ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                if ui.button("📋 Copy").on_hover_text("Copy the conversation").clicked() {
                    ui.ctx().copy_text(self.state.transcript.transcript_text());
                    self.state.notify("Transcript copied");
                }
            });
        });
        ui.add_space(self.theme.spacing_sm);

        let input_height = 64.0;
        let messages = self.state.transcript.get_all();
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .max_height(ui.available_height() - input_height)
            .show(ui, |ui| {
                for message in &messages {
                    self.show_message(ui, message);
                    ui.add_space(self.theme.spacing_sm);
                }
                if self.state.learn_pending {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label(RichText::new("The archive is searching...").color(self.theme.text_muted));
                    });
                }
            });

        ui.add_space(self.theme.spacing_sm);
        self.show_input(ui);
    }

    fn show_message(&self, ui: &mut egui::Ui, message: &LearnMessage) {
        let (fill, label_color) = match message.role {
            Role::User => (self.theme.bg_tertiary, self.theme.secondary),
            Role::Archive if message.is_error => (self.theme.error.gamma_multiply(0.15), self.theme.error),
            Role::Archive => (self.theme.bg_secondary, self.theme.primary),
        };

        egui::Frame::none()
            .fill(fill)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new(message.role.label()).strong().monospace().color(label_color));
                    ui.label(
                        RichText::new(
                            message
                                .timestamp
                                .with_timezone(&chrono::Local)
                                .format("%H:%M:%S")
                                .to_string(),
                        )
                        .small()
                        .color(self.theme.text_muted),
                    );
                });
                ui.label(RichText::new(&message.content).color(self.theme.text_primary));
            });
    }

    fn show_input(&mut self, ui: &mut egui::Ui) {
        let pending = self.state.learn_pending;
        ui.horizontal(|ui| {
            let response = ui.add_enabled(
                !pending,
                egui::TextEdit::singleline(&mut self.state.learn_input)
                    .hint_text("Ask about Gopher, protocols, the old net...")
                    .desired_width(ui.available_width() - 90.0)
                    .margin(egui::Margin::symmetric(12.0, 8.0)),
            );

            let enter = response.lost_focus() && ui.input(|i| i.key_pressed(Key::Enter));
            let can_ask = !pending && !self.state.learn_input.trim().is_empty();
            let ask = ui.add_enabled(
                can_ask,
                egui::Button::new("Ask")
                    .min_size(Vec2::new(80.0, 36.0))
                    .rounding(self.theme.button_rounding),
            );

            if (enter && can_ask) || ask.clicked() {
                self.state.ask_archive();
            }
        });
    }
}
