use ratatui::style::Color;

use crate::model::config::TuiConfig;

/// Parsed color theme for the TUI
#[derive(Debug, Clone)]
pub struct Theme {
    pub background: Color,
    pub text: Color,
    pub text_bright: Color,
    pub highlight: Color,
    pub dim: Color,
    pub red: Color,
    pub yellow: Color,
    pub green: Color,
    pub cyan: Color,
    pub purple: Color,
    pub blue: Color,
    pub selection_bg: Color,
    pub selection_border: Color,
    pub banner_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            background: Color::Rgb(0x0C, 0x00, 0x1B),
            text: Color::Rgb(0xB0, 0xAA, 0xFF),
            text_bright: Color::Rgb(0xFF, 0xFF, 0xFF),
            highlight: Color::Rgb(0xFB, 0x41, 0x96),
            dim: Color::Rgb(0x7D, 0x78, 0xBF),
            red: Color::Rgb(0xFF, 0x44, 0x44),
            yellow: Color::Rgb(0xFF, 0xD7, 0x00),
            green: Color::Rgb(0x44, 0xFF, 0x88),
            cyan: Color::Rgb(0x44, 0xDD, 0xFF),
            purple: Color::Rgb(0xCC, 0x66, 0xFF),
            blue: Color::Rgb(0x44, 0x88, 0xFF),
            selection_bg: Color::Rgb(0x3D, 0x14, 0x38),
            selection_border: Color::Rgb(0xFB, 0x41, 0x96),
            banner_bg: Color::Rgb(0x5A, 0x10, 0x10),
        }
    }
}

/// Parse a hex color string like "#FF4444" into an RGB Color
fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
    let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
    let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
    Some(Color::Rgb(r, g, b))
}

impl Theme {
    /// Defaults with any `tui.colors` overrides applied. Unknown keys and
    /// unparseable values are ignored.
    pub fn from_config(tui: &TuiConfig) -> Self {
        let mut theme = Theme::default();
        for (key, value) in &tui.colors {
            let Some(color) = parse_hex_color(value) else {
                continue;
            };
            let slot = match key.as_str() {
                "background" => &mut theme.background,
                "text" => &mut theme.text,
                "text_bright" => &mut theme.text_bright,
                "highlight" => &mut theme.highlight,
                "dim" => &mut theme.dim,
                "red" => &mut theme.red,
                "yellow" => &mut theme.yellow,
                "green" => &mut theme.green,
                "cyan" => &mut theme.cyan,
                "purple" => &mut theme.purple,
                "blue" => &mut theme.blue,
                "selection_bg" => &mut theme.selection_bg,
                "selection_border" => &mut theme.selection_border,
                "banner_bg" => &mut theme.banner_bg,
                _ => continue,
            };
            *slot = color;
        }
        theme
    }

    /// Priorities are configured lowest first: the top one is red, the
    /// next yellow, the lowest dim.
    pub fn priority_color(&self, index: Option<usize>, count: usize) -> Color {
        let Some(index) = index else {
            return self.dim;
        };
        let from_top = count.saturating_sub(index + 1);
        match from_top {
            _ if count > 1 && index == 0 => self.dim,
            0 => self.red,
            1 => self.yellow,
            _ => self.text,
        }
    }

    /// Fresh cards are dim; each threshold crossed steps towards red.
    pub fn age_color(&self, days: i64, thresholds: &[u32]) -> Color {
        let crossed = thresholds.iter().filter(|&&t| days >= i64::from(t)).count();
        match crossed {
            0 => self.dim,
            1 => self.green,
            2 => self.yellow,
            _ => self.red,
        }
    }
}
