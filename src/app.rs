use std::{io, time::Duration};

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::{
    accounting,
    constants::TIME_SETTINGS,
    domain::{ItemId, Tracker},
    storage::{self, Storage},
};

mod dialog_view;
mod event_handlers;
mod forms;
mod render_views;
mod tick_schedule;
mod ui_helpers;
mod view_style;

use forms::{Dialog, ItemForm, SettingsForm};
use tick_schedule::TickSchedule;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum View {
    List,
    Timer,
}

struct App {
    tracker: Tracker,
    view: View,
    selected_index: usize,
    dialog: Option<Dialog>,
    schedule: TickSchedule,
    status: Option<String>,
    render_needed: bool,
}

impl App {
    fn new(tracker: Tracker) -> Self {
        let mut app = Self {
            tracker,
            view: View::List,
            selected_index: 0,
            dialog: None,
            schedule: TickSchedule::new(),
            status: None,
            render_needed: true,
        };
        app.show_list();
        app
    }

    fn persist(&mut self) {
        if let Err(e) = self.tracker.try_save() {
            warn!(error = %e, "could not save state");
            self.status = Some(format!("save failed: {}", e));
        }
    }

    fn show_list(&mut self) {
        if let Some(id) = self.tracker.state.active_item_id.clone() {
            if let Some(position) = self.tracker.state.position_of(&id) {
                self.selected_index = position;
            }
            self.tracker.clear_selection();
            self.persist();
        }
        self.view = View::List;
        self.clamp_selection();
        self.render_needed = true;
    }

    fn show_timer(&mut self, id: &ItemId) {
        if self.tracker.select(id) {
            self.persist();
            self.view = View::Timer;
            self.status = None;
            self.render_needed = true;
        }
    }

    fn selected_item_id(&self) -> Option<ItemId> {
        self.tracker
            .state
            .items
            .get(self.selected_index)
            .map(|item| item.id.clone())
    }

    fn clamp_selection(&mut self) {
        let len = self.tracker.state.items.len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    fn open_add_dialog(&mut self) {
        self.dialog = Some(Dialog::Item(ItemForm::for_new_item()));
        self.render_needed = true;
    }

    fn open_edit_dialog(&mut self, id: &ItemId) {
        if let Some(item) = self.tracker.state.find_item(id) {
            self.dialog = Some(Dialog::Item(ItemForm::for_item(item)));
            self.render_needed = true;
        }
    }

    fn open_settings_dialog(&mut self) {
        self.dialog = Some(Dialog::Settings(SettingsForm::from_settings(
            &self.tracker.state.settings,
        )));
        self.render_needed = true;
    }

    fn close_dialog(&mut self) {
        self.dialog = None;
        self.render_needed = true;
    }

    fn submit_item_form(&mut self, form: ItemForm) {
        match form.editing {
            Some(id) => {
                self.tracker.update_item(&id, &form.name, &form.emoji);
            }
            None => {
                self.tracker.add_item(&form.name, &form.emoji);
                self.selected_index = 0;
            }
        }
        self.persist();
        self.close_dialog();
    }

    fn submit_settings_form(&mut self, form: SettingsForm) {
        self.tracker.set_background(form.background.trim());
        self.tracker.set_glow(form.glow.trim());
        self.persist();
        self.close_dialog();
    }

    fn export_backup(&mut self) {
        self.status = Some(match self.tracker.export_to(std::path::Path::new(".")) {
            Ok(path) => format!("exported {}", path.display()),
            Err(e) => format!("export failed: {}", e),
        });
        self.render_needed = true;
    }

    fn toggle_active(&mut self, now: u64) {
        if self.tracker.toggle_active(now) {
            self.persist();
            self.render_needed = true;
        }
    }

    fn on_tick(&mut self, now: u64) {
        self.tracker.tick(now);
        self.render_needed = true;
    }
}

pub fn run_ui() -> Result<(), io::Error> {
    let tracker = Tracker::open(Storage::from_env(), accounting::now_ms());
    info!(dir = %tracker.storage().dir().display(), "opened state");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(tracker);
    app.schedule.reschedule(accounting::now_ms());
    let idle_poll = Duration::from_millis(TIME_SETTINGS.idle_poll_ms);

    loop {
        let now = accounting::now_ms();
        if app.schedule.take_due(now) {
            app.on_tick(now);
            app.schedule.reschedule(accounting::now_ms());
        }

        if app.render_needed {
            terminal.draw(|f| {
                app.draw_frame(f);
            })?;
            app.render_needed = false;
        }

        let timeout = app
            .schedule
            .time_until(accounting::now_ms())
            .unwrap_or(idle_poll)
            .min(idle_poll);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if app.handle_key(key) {
                        break;
                    }
                }
                Event::Resize(_, _) => app.render_needed = true,
                _ => {}
            }
        }
    }

    app.schedule.cancel();
    accounting::tick(&mut app.tracker.state, accounting::now_ms());
    app.persist();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    info!(log = %storage::get_log_path().display(), "closed");
    Ok(())
}
