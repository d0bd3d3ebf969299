//! Record button component
//!
//! Toggles the capture session on/off, with right-click or Escape to cancel
//! a recording in progress.

use crate::ui::state::AppState;
use crate::ui::theme::Theme;
use egui::{Color32, Key, Rect, RichText, Sense, Vec2};

/// Record button for voice input
pub struct RecordButton<'a> {
    state: &'a mut AppState,
    theme: &'a Theme,
}

impl<'a> RecordButton<'a> {
    pub fn new(state: &'a mut AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    /// Show the record button and return the response
    pub fn show(mut self, ui: &mut egui::Ui) -> egui::Response {
        let size = Vec2::new(56.0, 56.0);
        let (rect, response) = ui.allocate_exact_size(size, Sense::click());

        if ui.is_rect_visible(rect) {
            self.paint_button(ui, rect, &response);
        }

        self.handle_interactions(ui, &response);
        self.show_tooltip(&response);

        response
    }

    fn paint_button(&self, ui: &egui::Ui, rect: Rect, response: &egui::Response) {
        let painter = ui.painter();
        let is_recording = self.state.is_recording();

        let bg_color = if is_recording {
            self.theme.recording
        } else if response.hovered() {
            self.theme.primary.gamma_multiply(1.2)
        } else {
            self.theme.primary
        };

        painter.circle_filled(rect.center(), 26.0, bg_color);

        if is_recording {
            // Stop square
            painter.rect_filled(
                Rect::from_center_size(rect.center(), Vec2::splat(14.0)),
                2.0,
                Color32::WHITE,
            );
            self.draw_pulsing_ring(ui, rect.center());
        } else {
            self.draw_mic_icon(painter, rect.center());
        }
    }

    fn draw_mic_icon(&self, painter: &egui::Painter, center: egui::Pos2) {
        let color = Color32::WHITE;

        // Mic body
        let mic_rect = Rect::from_center_size(
            egui::pos2(center.x, center.y - 3.0),
            Vec2::new(8.0, 13.0),
        );
        painter.rect_filled(mic_rect, 4.0, color);

        // Stand arc as line segments
        let arc_center = egui::pos2(center.x, center.y + 2.0);
        let arc_radius = 9.0;
        let segments = 8;
        for i in 0..segments {
            let a0 = std::f32::consts::PI * (i as f32 / segments as f32);
            let a1 = std::f32::consts::PI * ((i + 1) as f32 / segments as f32);
            let start = egui::pos2(
                arc_center.x - arc_radius * a0.cos(),
                arc_center.y + arc_radius * a0.sin(),
            );
            let end = egui::pos2(
                arc_center.x - arc_radius * a1.cos(),
                arc_center.y + arc_radius * a1.sin(),
            );
            painter.line_segment([start, end], egui::Stroke::new(2.0, color));
        }

        // Stem
        painter.line_segment(
            [
                egui::pos2(center.x, arc_center.y + arc_radius),
                egui::pos2(center.x, arc_center.y + arc_radius + 4.0),
            ],
            egui::Stroke::new(2.0, color),
        );
    }

    fn draw_pulsing_ring(&self, ui: &egui::Ui, center: egui::Pos2) {
        let t = ui.ctx().input(|i| i.time);
        let pulse = ((t * 3.0).sin() * 0.5 + 0.5) as f32;

        let radius = 28.0 + pulse * 7.0;
        let alpha = (1.0 - pulse) * 0.6;

        ui.painter().circle_stroke(
            center,
            radius,
            egui::Stroke::new(
                2.0 + pulse * 2.0,
                self.theme.recording.gamma_multiply(alpha),
            ),
        );

        ui.ctx().request_repaint();
    }

    fn handle_interactions(&mut self, ui: &egui::Ui, response: &egui::Response) {
        let is_recording = self.state.is_recording();

        if response.clicked() {
            if is_recording {
                self.state.stop_recording();
            } else {
                self.state.start_recording();
            }
            return;
        }

        // Right-click or Escape cancels a recording in progress
        if is_recording
            && (response.secondary_clicked() || ui.input(|i| i.key_pressed(Key::Escape)))
        {
            self.state.cancel_recording();
            return;
        }

        // Space toggles when no widget has focus
        let space_pressed = ui.input(|i| i.key_pressed(Key::Space));
        let any_widget_focused = ui.memory(|m| m.focused().is_some());
        if space_pressed && !any_widget_focused {
            if is_recording {
                self.state.stop_recording();
            } else {
                self.state.start_recording();
            }
        }
    }

    fn show_tooltip(&self, response: &egui::Response) {
        if !response.hovered() {
            return;
        }
        let text = if self.state.is_recording() {
            "Click to stop (Space)\nRight-click to cancel"
        } else {
            "Click to record (Space)"
        };
        response.clone().on_hover_text(text);
    }
}

/// Elapsed recording time label, MM:SS
pub struct ElapsedLabel<'a> {
    state: &'a AppState,
    theme: &'a Theme,
}

impl<'a> ElapsedLabel<'a> {
    pub fn new(state: &'a AppState, theme: &'a Theme) -> Self {
        Self { state, theme }
    }

    pub fn show(self, ui: &mut egui::Ui) {
        let seconds = self.state.elapsed_seconds();
        ui.label(
            RichText::new(format!("{:02}:{:02}", seconds / 60, seconds % 60))
                .size(13.0)
                .family(egui::FontFamily::Monospace)
                .color(if self.state.is_recording() {
                    self.theme.recording
                } else {
                    self.theme.text_muted
                }),
        );
    }
}
