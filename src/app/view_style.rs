use ratatui::style::{Color, Modifier, Style};

use crate::{
    constants::{FALLBACK_BACKGROUND, FALLBACK_GLOW},
    domain::Settings,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct Theme {
    pub background: Color,
    pub glow: Color,
}

impl Theme {
    pub(super) fn from_settings(settings: &Settings) -> Self {
        Theme {
            background: parse_hex_color(&settings.background).unwrap_or(FALLBACK_BACKGROUND),
            glow: parse_hex_color(&settings.glow).unwrap_or(FALLBACK_GLOW),
        }
    }

    pub(super) fn base(&self) -> Style {
        Style::default().fg(self.glow).bg(self.background)
    }

    pub(super) fn highlight(&self) -> Style {
        Style::default()
            .fg(text_color_for_bg(self.glow))
            .bg(self.glow)
            .add_modifier(Modifier::BOLD)
    }
}

pub(super) fn parse_hex_color(value: &str) -> Option<Color> {
    let hex = value.trim().strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(Color::Rgb(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => {
            let expand = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some(Color::Rgb(expand(0)?, expand(1)?, expand(2)?))
        }
        _ => None,
    }
}

fn text_color_for_bg(bg_color: Color) -> Color {
    if let Color::Rgb(r, g, b) = bg_color {
        let brightness = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
        if brightness > 128 {
            Color::Black
        } else {
            Color::White
        }
    } else {
        Color::White
    }
}
