//! Playback waveform widget
//!
//! Play/pause control plus the decorative bar waveform with a "played"
//! overlay clipped to the progress fraction. Clicking or dragging on the
//! bars seeks; the play button also responds to Enter/Space when focused.

use crate::playback::PlaybackWaveform;
use crate::ui::theme::Theme;
use egui::{Pos2, RichText, Sense, Vec2};

/// Waveform + controls for one voice message
pub struct WaveformView<'a> {
    player: &'a PlaybackWaveform,
    theme: &'a Theme,
    bar_area: Vec2,
}

impl<'a> WaveformView<'a> {
    pub fn new(player: &'a PlaybackWaveform, theme: &'a Theme) -> Self {
        Self {
            player,
            theme,
            bar_area: Vec2::new(160.0, 32.0),
        }
    }

    /// Show the widget and return the bar-area response
    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let response = ui
            .horizontal(|ui| {
                self.show_play_button(ui);
                let response = self.show_bars(ui);
                self.show_time(ui);
                response
            })
            .inner;

        if self.player.is_playing() {
            ui.ctx().request_repaint();
        }

        response
    }

    fn show_play_button(&self, ui: &mut egui::Ui) {
        let icon = if self.player.is_playing() {
            "⏸"
        } else {
            "▶"
        };

        // Button activation covers both click and Enter/Space when focused
        let button = ui.add(
            egui::Button::new(RichText::new(icon).size(16.0)).min_size(Vec2::splat(32.0)),
        );
        if button.clicked() {
            self.player.toggle();
        }
        button.on_hover_text(if self.player.is_playing() {
            "Pause"
        } else {
            "Play"
        });
    }

    fn show_bars(&self, ui: &mut egui::Ui) -> egui::Response {
        let (rect, response) = ui.allocate_exact_size(self.bar_area, Sense::click_and_drag());

        if ui.is_rect_visible(rect) {
            let painter = ui.painter();
            painter.rect_filled(rect, 4.0, self.theme.bg_tertiary);

            let draw_rect = rect.shrink2(Vec2::new(6.0, 4.0));
            let heights = self.player.bar_heights();
            let bar_width = draw_rect.width() / heights.len() as f32;
            let center_y = draw_rect.center().y;
            let max_height = draw_rect.height();

            let draw_pass = |painter: &egui::Painter, color: egui::Color32| {
                for (i, &height) in heights.iter().enumerate() {
                    let x = draw_rect.left() + (i as f32 + 0.5) * bar_width;
                    let half = height * max_height / 2.0;
                    painter.line_segment(
                        [Pos2::new(x, center_y - half), Pos2::new(x, center_y + half)],
                        egui::Stroke::new(2.0, color),
                    );
                }
            };

            // Unplayed base layer, then the played overlay clipped to the
            // progress fraction
            draw_pass(painter, self.theme.waveform_unplayed);

            let progress = self.player.progress();
            if progress > 0.0 {
                let played_rect = egui::Rect::from_min_size(
                    rect.min,
                    Vec2::new(rect.width() * progress, rect.height()),
                );
                let clipped = painter.with_clip_rect(played_rect);
                draw_pass(&clipped, self.theme.waveform_played);
            }
        }

        // Click or drag on the bars seeks
        if response.clicked() || response.dragged() {
            if let Some(pos) = response.interact_pointer_pos() {
                let fraction = ((pos.x - rect.left()) / rect.width()).clamp(0.0, 1.0);
                self.player.seek(fraction);
            }
        }

        response
    }

    fn show_time(&self, ui: &mut egui::Ui) {
        let state = self.player.state();
        ui.label(
            RichText::new(format!(
                "{} / {}",
                format_time(state.position),
                format_time(state.duration)
            ))
            .size(12.0)
            .family(egui::FontFamily::Monospace)
            .color(self.theme.text_muted),
        );
    }
}

/// Format time in MM:SS format
fn format_time(seconds: f32) -> String {
    let seconds = if seconds.is_finite() {
        seconds.max(0.0)
    } else {
        0.0
    };
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}
