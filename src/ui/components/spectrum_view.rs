//! Live spectrum visualization widget
//!
//! Renders the animated frequency bars while recording. One `tick` per
//! render frame drives the visualizer; the widget requests continuous
//! repaints only while the spectrum is attached to a live stream.

use crate::ui::theme::Theme;
use crate::visualize::LiveSpectrum;
use egui::{Pos2, Rect, Sense, Vec2};

/// Frequency-bar display for the recording in progress
pub struct SpectrumView<'a> {
    spectrum: &'a mut LiveSpectrum,
    theme: &'a Theme,
    height: f32,
}

impl<'a> SpectrumView<'a> {
    pub fn new(spectrum: &'a mut LiveSpectrum, theme: &'a Theme) -> Self {
        Self {
            spectrum,
            theme,
            height: 60.0,
        }
    }

    /// Set the height of the display
    pub fn height(mut self, height: f32) -> Self {
        self.height = height;
        self
    }

    /// Show the spectrum and return the response
    pub fn show(self, ui: &mut egui::Ui) -> egui::Response {
        let desired_size = Vec2::new(ui.available_width(), self.height);
        let (rect, response) = ui.allocate_exact_size(desired_size, Sense::hover());

        if !ui.is_rect_visible(rect) {
            return response;
        }

        let painter = ui.painter();
        painter.rect_filled(rect, self.theme.card_rounding, self.theme.bg_secondary);

        let padding = 8.0;
        let draw_rect = rect.shrink(padding);
        let recording = self.spectrum.is_active();

        // One visualizer computation per render frame
        let heights: Vec<f32> = if recording {
            self.spectrum.tick(draw_rect.height()).to_vec()
        } else {
            self.spectrum.bars().to_vec()
        };

        if heights.is_empty() {
            return response;
        }

        let bar_count = heights.len();
        let bar_width = draw_rect.width() / bar_count as f32;
        let bar_gap = 1.0;
        let bottom = draw_rect.bottom();

        for (i, &height) in heights.iter().enumerate() {
            let x = draw_rect.left() + i as f32 * bar_width;
            let bar_height = height.max(2.0);

            let bar_rect = Rect::from_min_max(
                Pos2::new(x, bottom - bar_height),
                Pos2::new(x + bar_width - bar_gap, bottom),
            );

            let color = if recording {
                self.theme.primary
            } else {
                self.theme.waveform_unplayed
            };
            painter.rect_filled(bar_rect, 1.0, color);
        }

        if recording {
            self.draw_recording_indicator(ui, rect);
            ui.ctx().request_repaint();
        }

        response
    }

    /// Pulsing red dot + text while recording
    fn draw_recording_indicator(&self, ui: &egui::Ui, rect: Rect) {
        let painter = ui.painter();

        let time = ui.ctx().input(|i| i.time);
        let pulse = ((time * 2.0).sin() * 0.5 + 0.5) as f32;

        let dot_center = Pos2::new(rect.left() + 16.0, rect.top() + 16.0);
        painter.circle_filled(
            dot_center,
            6.0 + pulse * 2.0,
            self.theme.recording.gamma_multiply(pulse * 0.5 + 0.5),
        );
        painter.circle_filled(dot_center, 4.0, self.theme.recording);

        painter.text(
            Pos2::new(dot_center.x + 12.0, dot_center.y),
            egui::Align2::LEFT_CENTER,
            "Recording",
            egui::FontId::proportional(12.0),
            self.theme.recording,
        );
    }
}
