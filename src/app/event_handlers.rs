use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::accounting;

use super::{
    App, View,
    forms::{Dialog, ItemField},
    ui_helpers,
};

impl App {
    pub(super) fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return true;
        }

        if self.dialog.is_some() {
            self.handle_dialog_key(key);
            self.render_needed = true;
            return false;
        }

        let quit = match self.view {
            View::List => self.handle_list_key(key),
            View::Timer => self.handle_timer_key(key),
        };
        self.render_needed = true;
        quit
    }

    fn handle_list_key(&mut self, key: KeyEvent) -> bool {
        let len = self.tracker.state.items.len();

        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected_index = ui_helpers::wrap_prev_index(self.selected_index, len);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.selected_index = ui_helpers::wrap_next_index(self.selected_index, len);
            }
            KeyCode::Enter => {
                if let Some(id) = self.selected_item_id() {
                    self.show_timer(&id);
                }
            }
            KeyCode::Char('a') => self.open_add_dialog(),
            KeyCode::Char('e') => {
                if let Some(id) = self.selected_item_id() {
                    self.open_edit_dialog(&id);
                }
            }
            KeyCode::Char('s') => self.open_settings_dialog(),
            KeyCode::Char('x') => self.export_backup(),
            _ => {}
        }
        false
    }

    fn handle_timer_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char(' ') | KeyCode::Char('p') => {
                self.toggle_active(accounting::now_ms());
            }
            KeyCode::Char('e') => {
                if let Some(id) = self.tracker.state.active_item_id.clone() {
                    self.open_edit_dialog(&id);
                }
            }
            KeyCode::Esc | KeyCode::Backspace | KeyCode::Char('b') => self.show_list(),
            _ => {}
        }
        false
    }

    fn handle_dialog_key(&mut self, key: KeyEvent) {
        let Some(dialog) = self.dialog.as_mut() else {
            return;
        };

        match key.code {
            KeyCode::Esc => self.close_dialog(),
            KeyCode::Enter => match self.dialog.take() {
                Some(Dialog::Item(form)) => self.submit_item_form(form),
                Some(Dialog::Settings(form)) => self.submit_settings_form(form),
                None => {}
            },
            KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => match dialog {
                Dialog::Item(form) => form.next_field(),
                Dialog::Settings(form) => form.next_field(),
            },
            KeyCode::Left | KeyCode::Right => {
                if let Dialog::Item(form) = dialog {
                    if form.field == ItemField::Emoji {
                        form.cycle_emoji(key.code == KeyCode::Right);
                    }
                }
            }
            KeyCode::Backspace => match dialog {
                Dialog::Item(form) => form.pop(),
                Dialog::Settings(form) => form.pop(),
            },
            KeyCode::Char(c) => match dialog {
                Dialog::Item(form) => form.push(c),
                Dialog::Settings(form) => form.push(c),
            },
            _ => {}
        }
    }
}
