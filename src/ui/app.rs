//! Chat page shell and eframe integration

use crate::ui::components::{ElapsedLabel, RecordButton, SpectrumView, WaveformView};
use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{CentralPanel, RichText, TopBottomPanel};

/// Voice message chat application
pub struct ChatApp {
    state: AppState,
    theme: Theme,
}

impl ChatApp {
    pub fn new(cc: &eframe::CreationContext<'_>, state: AppState) -> Self {
        let theme = Theme::dark();
        theme.apply(&cc.egui_ctx);
        Self { state, theme }
    }

    fn show_header(&mut self, ctx: &egui::Context) {
        TopBottomPanel::top("header")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_secondary)
                    .inner_margin(12.0),
            )
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new("Voicenote")
                            .size(20.0)
                            .strong()
                            .color(self.theme.text_primary),
                    );
                    ui.label(
                        RichText::new("Voice messages")
                            .size(14.0)
                            .color(self.theme.text_muted),
                    );

                    ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                        if ui.button("⏹").on_hover_text("Stop all playback").clicked() {
                            self.state.coordinator.pause_all();
                        }
                    });
                });
            });
    }

    fn show_input_area(&mut self, ctx: &egui::Context) {
        TopBottomPanel::bottom("input_area")
            .frame(
                egui::Frame::none()
                    .fill(self.theme.bg_primary)
                    .inner_margin(self.theme.spacing),
            )
            .show(ctx, |ui| {
                ui.vertical(|ui| {
                    if self.state.is_recording() {
                        SpectrumView::new(&mut self.state.spectrum, &self.theme)
                            .height(50.0)
                            .show(ui);
                        ui.add_space(self.theme.spacing_sm);
                    }

                    if let Some(error) = self.state.error.clone() {
                        ui.label(RichText::new(error).size(12.0).color(self.theme.warning));
                        ui.add_space(self.theme.spacing_sm);
                    }

                    ui.horizontal(|ui| {
                        RecordButton::new(&mut self.state, &self.theme).show(ui);
                        ui.add_space(self.theme.spacing_sm);
                        ElapsedLabel::new(&self.state, &self.theme).show(ui);
                    });
                });
            });
    }

    fn show_messages(&mut self, ctx: &egui::Context) {
        CentralPanel::default()
            .frame(egui::Frame::none().fill(self.theme.bg_primary))
            .show(ctx, |ui| {
                egui::ScrollArea::vertical()
                    .auto_shrink([false, false])
                    .stick_to_bottom(true)
                    .show(ui, |ui| {
                        ui.add_space(self.theme.spacing);

                        if self.state.messages.is_empty() {
                            self.show_empty_state(ui);
                            return;
                        }

                        for message in &self.state.messages {
                            ui.with_layout(
                                egui::Layout::top_down(egui::Align::RIGHT),
                                |ui| {
                                    ui.label(
                                        RichText::new("You")
                                            .size(12.0)
                                            .color(self.theme.text_muted),
                                    );

                                    egui::Frame::none()
                                        .fill(self.theme.bubble)
                                        .rounding(self.theme.card_rounding)
                                        .inner_margin(egui::Margin::symmetric(12.0, 8.0))
                                        .show(ui, |ui| {
                                            WaveformView::new(&message.player, &self.theme)
                                                .show(ui);
                                        });

                                    ui.label(
                                        RichText::new(
                                            message.sent_at.format("%H:%M").to_string(),
                                        )
                                        .size(10.0)
                                        .color(self.theme.text_muted),
                                    );
                                },
                            );
                            ui.add_space(self.theme.spacing_sm);
                        }
                    });
            });
    }

    fn show_empty_state(&self, ui: &mut egui::Ui) {
        ui.vertical_centered(|ui| {
            ui.add_space(80.0);
            ui.label(
                RichText::new("No voice messages yet")
                    .size(18.0)
                    .color(self.theme.text_primary),
            );
            ui.add_space(self.theme.spacing_sm);
            ui.label(
                RichText::new("Press the microphone button to record one.")
                    .size(13.0)
                    .color(self.theme.text_muted),
            );
        });
    }
}

impl eframe::App for ChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.state.frame();

        self.show_header(ctx);
        self.show_input_area(ctx);
        self.show_messages(ctx);

        if self.state.is_recording() {
            ctx.request_repaint();
        }
    }
}
