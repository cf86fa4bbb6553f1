//! Badge box for the hidden relics

use crate::ledger::RELICS;
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{self, RichText};

pub struct RelicBox<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> RelicBox<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let relics = &self.state.relics;
        let (found, total) = relics.progress();

        egui::Frame::none()
            .fill(self.theme.bg_secondary)
            .rounding(self.theme.card_rounding)
            .inner_margin(self.theme.spacing)
            .show(ui, |ui| {
                ui.set_width(ui.available_width());
                ui.horizontal(|ui| {
                    ui.label(RichText::new("Relics").strong().color(self.theme.relic));
                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.label(
                            RichText::new(format!("{}/{}", found, total))
                                .monospace()
                                .color(self.theme.text_muted),
                        );
                    });
                });

                ui.add_space(self.theme.spacing_sm);
                ui.horizontal_wrapped(|ui| {
                    for relic in RELICS.iter() {
                        if relics.is_found(relic.keyword) {
                            ui.label(RichText::new(relic.icon).size(22.0))
                                .on_hover_text(relic.badge);
                        } else {
                            ui.label(RichText::new("❔").size(22.0).color(self.theme.text_muted))
                                .on_hover_text("Undiscovered");
                        }
                    }
                });

                ui.add_space(self.theme.spacing_sm);
                let hint_color = if relics.is_complete() {
                    self.theme.relic
                } else {
                    self.theme.text_muted
                };
                ui.label(RichText::new(relics.hint()).small().italics().color(hint_color));
            });
    }
}
