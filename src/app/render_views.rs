use ratatui::prelude::{Line, Span};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{
        Block, BorderType, Borders, Gauge, List, ListItem, ListState, Paragraph,
        block::{Position, Title},
    },
};

use crate::{
    accounting::{filled_exp_segments, format_duration, level_info, seconds_to_next_level},
    constants::EXP_BAR,
    domain::Item,
};

use super::{App, View, ui_helpers, view_style::Theme};

const LIST_HELP: &str = "↑↓ select · enter open · a add · e edit · s settings · x export · q quit";
const TIMER_HELP: &str = "space start/pause · e edit · esc back · q quit";

impl App {
    pub(super) fn draw_frame(&mut self, f: &mut Frame) {
        let size = f.size();
        let theme = Theme::from_settings(&self.tracker.state.settings);

        match self.view {
            View::List => self.render_list(f, size, &theme),
            View::Timer => self.render_timer(f, size, &theme),
        }

        if self.dialog.is_some() {
            self.render_dialog(f, size, &theme);
        }
    }

    fn frame_block<'a>(&'a self, theme: &Theme, title: &'a str, help: &'a str) -> Block<'a> {
        let mut block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .title(
                Line::from(Span::styled(
                    title,
                    Style::default().add_modifier(Modifier::BOLD),
                ))
                .alignment(Alignment::Left),
            )
            .title(
                Title::from(help)
                    .position(Position::Bottom)
                    .alignment(Alignment::Center),
            )
            .style(theme.base())
            .border_style(Style::default().fg(theme.glow));

        if let Some(status) = self.status.as_deref() {
            block = block.title(Line::from(status).alignment(Alignment::Right));
        }
        block
    }

    fn render_list(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let name_width = 24;
        let items: Vec<ListItem> = self
            .tracker
            .state
            .items
            .iter()
            .map(|item| ListItem::new(list_row(item, name_width)))
            .collect();

        let mut list_state = ListState::default();
        list_state.select(Some(self.selected_index));

        let list = List::new(items)
            .block(self.frame_block(theme, "EXP TIMER", LIST_HELP))
            .highlight_style(theme.highlight())
            .highlight_symbol("▶ ");

        f.render_stateful_widget(list, area, &mut list_state);
    }

    fn render_timer(&self, f: &mut Frame, area: Rect, theme: &Theme) {
        let Some(item) = self.tracker.state.active_item() else {
            return;
        };

        let title = if item.emoji.is_empty() {
            item.name.clone()
        } else {
            format!("{} {}", item.emoji, item.name)
        };
        let block = self.frame_block(theme, &title, TIMER_HELP);
        let inner = block.inner(area);
        f.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Min(0),
            ])
            .split(inner);

        let info = level_info(item.total_seconds);
        let state_label = if item.running { "RUNNING" } else { "PAUSED" };

        f.render_widget(
            Paragraph::new(Span::styled(
                format_duration(item.total_seconds),
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .alignment(Alignment::Center),
            rows[1],
        );
        f.render_widget(
            Paragraph::new(ui_helpers::exp_bar(
                filled_exp_segments(item.total_seconds),
                EXP_BAR.segments,
            ))
            .alignment(Alignment::Center),
            rows[3],
        );
        f.render_widget(
            Paragraph::new(format!("LV {}  ·  {}", info.level, state_label))
                .alignment(Alignment::Center),
            rows[5],
        );
        f.render_widget(
            Paragraph::new(ui_helpers::next_level_hint(seconds_to_next_level(
                item.total_seconds,
            )))
            .alignment(Alignment::Center),
            rows[6],
        );

        let gauge_area = centered_width(rows[7], 60);
        let gauge = Gauge::default()
            .gauge_style(Style::default().fg(theme.glow).bg(theme.background))
            .ratio(info.progress)
            .label(format!("{}%", (info.progress * 100.0).round() as u32));
        f.render_widget(gauge, gauge_area);
    }
}

fn list_row(item: &Item, name_width: usize) -> Line<'static> {
    let info = level_info(item.total_seconds);
    let emoji = if item.emoji.is_empty() {
        "⬚".to_string()
    } else {
        item.emoji.clone()
    };
    let name = ui_helpers::truncate_label(&item.name, name_width);
    let running = if item.running { " ●" } else { "" };

    Line::from(vec![
        Span::raw(format!("{} ", emoji)),
        Span::styled(
            format!("{:<width$}", name, width = name_width),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" {} ", format_duration(item.total_seconds))),
        Span::raw(ui_helpers::progress_bar(info.progress, 10)),
        Span::raw(format!(" LV {}", info.level)),
        Span::raw(running),
    ])
}

fn centered_width(area: Rect, max_width: u16) -> Rect {
    let width = area.width.min(max_width);
    let x = area.x + (area.width - width) / 2;
    Rect::new(x, area.y, width, area.height)
}
