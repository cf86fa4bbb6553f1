//! Main application struct and eframe integration

use crate::ui::components::{HistorySidebar, InputBar, LearnPage, ProphecyPanel, RelicBox, StingOverlay};
use crate::ui::stage::OverlayStage;
use crate::ui::state::{AppState, Page};
use crate::ui::theme::Theme;
use egui::{self, CentralPanel, RichText, SidePanel, TopBottomPanel};
use std::time::{Duration, Instant};
use tracing::info;

/// Idle repaint interval; notices from the session loop arrive in between
const IDLE_REPAINT: Duration = Duration::from_millis(100);

pub struct SeanceApp {
    state: AppState,
    stage: OverlayStage,
    theme: Theme,
}

impl SeanceApp {
    pub fn new(cc: &eframe::CreationContext<'_>, state: AppState, stage: OverlayStage) -> Self {
        let theme = Theme::haunted();
        theme.apply(&cc.egui_ctx);

        Self { state, stage, theme }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(egui::Frame::none().fill(self.theme.bg_secondary).inner_margin(12.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("SÉANCE")
                            .size(22.0)
                            .strong()
                            .monospace()
                            .color(self.theme.primary),
                    );
                    ui.label(
                        RichText::new("Oracle of the Gopher Archive")
                            .size(14.0)
                            .color(self.theme.text_muted),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        ui.selectable_value(&mut self.state.page, Page::Learn, "📖 Learn");
                        ui.selectable_value(&mut self.state.page, Page::Seance, "🔮 Séance");

                        let can_reset = self.state.view.state.is_active()
                            || self.state.displayed_prophecy().is_some();
                        if ui
                            .add_enabled(can_reset, egui::Button::new("⟲"))
                            .on_hover_text("Silence the spirits")
                            .clicked()
                        {
                            self.state.reset_session();
                        }

                        if let Some(message) = self.state.active_notification(Instant::now()) {
                            ui.label(RichText::new(message).color(self.theme.relic));
                        }
                    });
                });
            });
    }

    fn show_sidebar(&mut self, ctx: &egui::Context) {
        SidePanel::left("echoes")
            .resizable(true)
            .default_width(260.0)
            .min_width(200.0)
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                RelicBox::new(&self.state, &self.theme).show(ui);
                ui.add_space(self.theme.spacing);
                HistorySidebar::new(&mut self.state, &self.theme).show(ui);
            });
    }

    fn show_seance(&mut self, ctx: &egui::Context) {
        let shake = self.stage.shake_offset(Instant::now());

        TopBottomPanel::bottom("input_area")
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing))
            .show(ctx, |ui| {
                InputBar::new(&mut self.state, &self.theme).show(ui);
            });

        let margin = egui::Margin {
            left: self.theme.spacing_lg + shake.x,
            right: self.theme.spacing_lg - shake.x,
            top: self.theme.spacing_lg + shake.y,
            bottom: self.theme.spacing_lg - shake.y,
        };

        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(margin))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .show(ui, |ui| {
                        ProphecyPanel::new(&self.state, &self.theme).show(ui);
                    });
            });
    }

    fn show_learn(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary).inner_margin(self.theme.spacing_lg))
            .show(ctx, |ui| {
                LearnPage::new(&mut self.state, &self.theme).show(ui);
            });
    }
}

impl eframe::App for SeanceApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Background music waits for the first click
        if ctx.input(|i| i.pointer.any_click()) {
            self.state.unlock();
        }

        self.state.poll_events();

        self.show_header(ctx);
        self.show_sidebar(ctx);
        match self.state.page {
            Page::Seance => self.show_seance(ctx),
            Page::Learn => self.show_learn(ctx),
        }
        StingOverlay::new(&self.stage, &self.theme).show(ctx);

        if self.stage.is_busy() || self.state.view.loading || self.state.learn_pending {
            ctx.request_repaint();
        } else {
            ctx.request_repaint_after(IDLE_REPAINT);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        info!("Séance closing");
        self.state.shutdown();
    }
}
