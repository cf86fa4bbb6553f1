//! Full-screen jump scare drawn while the laugh plays

use crate::ui::stage::OverlayStage;
use crate::ui::theme::Theme;
use egui::{self, Color32, RichText};
use std::time::Instant;

pub struct StingOverlay<'a> {
    stage: &'a OverlayStage,
    theme: &'a Theme,
}

impl<'a> StingOverlay<'a> {
    pub fn new(stage: &'a OverlayStage, theme: &'a Theme) -> Self {
        Self { stage, theme }
    }

    pub fn show(self, ctx: &egui::Context) {
        let alpha = self.stage.overlay_alpha(Instant::now());
        if alpha <= 0.0 {
            return;
        }

        let screen = ctx.screen_rect();
        egui::Area::new(egui::Id::new("sting_overlay"))
            .order(egui::Order::Foreground)
            .fixed_pos(screen.min)
            .show(ctx, |ui| {
                let veil = Color32::from_black_alpha((220.0 * alpha) as u8);
                ui.painter().rect_filled(screen, 0.0, veil);

                ui.allocate_new_ui(egui::UiBuilder::new().max_rect(screen), |ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(screen.height() * 0.35);
                        ui.label(
                            RichText::new("👻")
                                .size(120.0)
                                .color(Color32::WHITE.gamma_multiply(alpha)),
                        );
                        ui.label(
                            RichText::new("MWAHAHAHA")
                                .size(48.0)
                                .strong()
                                .color(self.theme.primary.gamma_multiply(alpha)),
                        );
                    });
                });
            });
    }
}
