use eframe::egui::{self, Color32, Rounding, Shadow, Stroke, Vec2};

/// Severity of an activity-log line, used to pick its color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Normal,
    Success,
    Warning,
    Error,
}

pub struct Theme {
    pub background: Color32,
    pub card: Color32,
    pub control: Color32,
    pub control_hover: Color32,
    pub outline: Color32,
    pub text_primary: Color32,
    pub text_secondary: Color32,
    pub text_muted: Color32,
    pub accent: Color32,
    pub success: Color32,
    pub warning: Color32,
    pub error: Color32,

    pub spacing_small: f32,
    pub spacing_medium: f32,
    pub spacing_large: f32,
    pub padding_medium: f32,

    pub rounding: Rounding,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color32::from_rgb(24, 24, 28),
            card: Color32::from_rgb(36, 36, 42),
            control: Color32::from_rgb(50, 50, 58),
            control_hover: Color32::from_rgb(64, 64, 74),
            outline: Color32::from_rgb(82, 82, 94),
            text_primary: Color32::from_rgb(240, 240, 244),
            text_secondary: Color32::from_rgb(190, 190, 198),
            text_muted: Color32::from_rgb(130, 130, 140),
            accent: Color32::from_rgb(196, 60, 196),
            success: Color32::from_rgb(80, 190, 110),
            warning: Color32::from_rgb(235, 160, 40),
            error: Color32::from_rgb(230, 80, 70),

            spacing_small: 4.0,
            spacing_medium: 8.0,
            spacing_large: 12.0,
            padding_medium: 10.0,

            rounding: Rounding::same(8.0),
        }
    }
}

impl Theme {
    pub fn apply_to_ctx(&self, ctx: &egui::Context) {
        let mut style = (*ctx.style()).clone();
        let visuals = &mut style.visuals;

        visuals.panel_fill = self.background;
        visuals.window_fill = self.card;
        visuals.window_rounding = self.rounding;
        visuals.window_stroke = Stroke::new(1.0, self.outline);
        visuals.window_shadow = Shadow {
            offset: Vec2::new(0.0, 3.0),
            blur: 10.0,
            spread: 0.0,
            color: Color32::from_black_alpha(60),
        };

        for (widget, fill) in [
            (&mut visuals.widgets.inactive, self.control),
            (&mut visuals.widgets.hovered, self.control_hover),
            (&mut visuals.widgets.active, self.control_hover),
        ] {
            widget.bg_fill = fill;
            widget.weak_bg_fill = fill;
            widget.rounding = self.rounding;
            widget.bg_stroke = Stroke::new(1.0, self.outline);
            widget.fg_stroke = Stroke::new(1.0, self.text_primary);
        }

        // Progress bar fill and text selection
        visuals.selection.bg_fill = self.accent;
        visuals.selection.stroke = Stroke::new(1.0, self.text_primary);

        ctx.set_style(style);
    }

    pub fn card_frame(&self) -> egui::Frame {
        egui::Frame::none()
            .fill(self.card)
            .rounding(self.rounding)
            .inner_margin(egui::Margin::same(self.padding_medium))
    }

    pub fn primary_button(&self, label: &str) -> egui::Button<'static> {
        egui::Button::new(
            egui::RichText::new(label.to_string())
                .color(Color32::WHITE)
                .strong(),
        )
        .fill(self.accent)
    }

    pub fn secondary_button(&self, label: &str) -> egui::Button<'static> {
        egui::Button::new(egui::RichText::new(label.to_string()).color(self.text_primary))
            .fill(self.control)
    }

    pub fn tone_color(&self, tone: Tone) -> Color32 {
        match tone {
            Tone::Normal => self.text_secondary,
            Tone::Success => self.success,
            Tone::Warning => self.warning,
            Tone::Error => self.error,
        }
    }
}
