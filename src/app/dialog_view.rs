use ratatui::prelude::{Line, Span};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    widgets::{
        Block, BorderType, Borders, Clear, Paragraph,
        block::{Position, Title},
    },
};

use super::{
    App,
    forms::{Dialog, ItemField, SettingsField},
    view_style::{Theme, parse_hex_color},
};

const DIALOG_WIDTH: u16 = 44;
const DIALOG_HEIGHT: u16 = 8;

impl App {
    pub(super) fn render_dialog(&self, f: &mut Frame, terminal_size: Rect, theme: &Theme) {
        let Some(dialog) = self.dialog.as_ref() else {
            return;
        };
        let rect = modal_rect(terminal_size, DIALOG_WIDTH, DIALOG_HEIGHT);

        let (title, submit, lines) = match dialog {
            Dialog::Item(form) => {
                let emoji_hint = if form.emoji.is_empty() { "(none)" } else { "" };
                let lines = vec![
                    field_line(
                        "名稱",
                        &form.name,
                        form.field == ItemField::Name,
                        theme,
                    ),
                    field_line(
                        "圖示",
                        &format!("{}{}  ◀ ▶", form.emoji, emoji_hint),
                        form.field == ItemField::Emoji,
                        theme,
                    ),
                ];
                (form.title(), form.submit_label(), lines)
            }
            Dialog::Settings(form) => {
                let lines = vec![
                    color_line(
                        "背景",
                        &form.background,
                        form.field == SettingsField::Background,
                        theme,
                    ),
                    color_line(
                        "光暈",
                        &form.glow,
                        form.field == SettingsField::Glow,
                        theme,
                    ),
                ];
                ("設定", "套用", lines)
            }
        };

        let footer = format!("tab next · enter {} · esc cancel", submit);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(Line::from(Span::styled(
                title,
                Style::default().add_modifier(Modifier::BOLD),
            )))
            .title_alignment(Alignment::Center)
            .title(
                Title::from(footer)
                    .position(Position::Bottom)
                    .alignment(Alignment::Center),
            )
            .style(theme.base())
            .border_style(Style::default().fg(theme.glow));

        let mut body = vec![Line::from("")];
        for line in lines {
            body.push(line);
            body.push(Line::from(""));
        }

        f.render_widget(Clear, rect);
        f.render_widget(Paragraph::new(body).block(block), rect);
    }
}

fn field_line(label: &str, value: &str, focused: bool, theme: &Theme) -> Line<'static> {
    let value_style = if focused {
        theme.highlight()
    } else {
        Style::default()
    };
    let cursor = if focused { "_" } else { "" };

    Line::from(vec![
        Span::raw(format!(" {}  ", label)),
        Span::styled(format!("{}{}", value, cursor), value_style),
    ])
}

fn color_line(label: &str, value: &str, focused: bool, theme: &Theme) -> Line<'static> {
    let mut line = field_line(label, value, focused, theme);
    let swatch = match parse_hex_color(value) {
        Some(color) => Span::styled("  ██", Style::default().fg(color)),
        None => Span::raw("  ?"),
    };
    line.spans.push(swatch);
    line
}

fn modal_rect(terminal_size: Rect, width: u16, height: u16) -> Rect {
    let max_width = terminal_size.width.saturating_sub(2).max(1);
    let max_height = terminal_size.height.saturating_sub(2).max(1);

    let modal_width = width.clamp(1, max_width);
    let modal_height = height.clamp(1, max_height);

    let modal_x = (terminal_size.width.saturating_sub(modal_width)) / 2;
    let modal_y = (terminal_size.height.saturating_sub(modal_height)) / 2;

    Rect::new(modal_x, modal_y, modal_width, modal_height)
}
