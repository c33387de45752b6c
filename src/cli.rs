use std::{io, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};

use crate::{
    accounting::{self, format_duration, level_info},
    domain::{ItemId, Tracker},
    storage::{self, Storage},
};

#[derive(Parser, Debug)]
#[command(name = "exp-timer")]
#[command(about = "Level up the things you spend time on", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Open the terminal interface (default)")]
    Ui,

    #[command(about = "List items with their time and level")]
    List,

    #[command(about = "Add a new item")]
    Add {
        #[arg(help = "Item name")]
        name: String,

        #[arg(long, default_value = "", help = "Emoji shown next to the name")]
        emoji: String,
    },

    #[command(about = "Rename an item or change its emoji")]
    Edit {
        #[arg(help = "Item id, list position, or name")]
        item: String,

        #[arg(long, help = "New name")]
        name: Option<String>,

        #[arg(long, help = "New emoji")]
        emoji: Option<String>,
    },

    #[command(about = "Start accumulating time on an item")]
    Start {
        #[arg(help = "Item id, list position, or name")]
        item: String,
    },

    #[command(about = "Pause a running item")]
    Pause {
        #[arg(help = "Item id, list position, or name")]
        item: String,
    },

    #[command(about = "Write a JSON backup of all items and settings")]
    Export {
        #[arg(long, short, help = "Directory to write the backup into")]
        out: Option<PathBuf>,
    },

    #[command(about = "Replace all items and settings with a JSON backup")]
    Import {
        #[arg(help = "Backup file")]
        file: PathBuf,
    },

    #[command(about = "Show or change the theme colours")]
    Settings {
        #[arg(long, help = "Background colour, e.g. #0f380f")]
        background: Option<String>,

        #[arg(long, help = "Glow colour, e.g. #9bbc0f")]
        glow: Option<String>,
    },

    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(help = "Shell type (bash, zsh, fish)")]
        shell: String,
    },
}

// Accrues running items in memory only; each command persists at most once.
fn open_tracker() -> Tracker {
    let mut tracker = Tracker::load(Storage::from_env());
    accounting::tick(&mut tracker.state, accounting::now_ms());
    tracker
}

fn save(tracker: &Tracker) -> Result<(), String> {
    tracker.try_save().map_err(|e| e.to_string())
}

fn resolve(tracker: &Tracker, selector: &str) -> Result<ItemId, String> {
    tracker
        .resolve(selector)
        .ok_or_else(|| format!("Item '{}' not found", selector))
}

fn item_name(tracker: &Tracker, id: &ItemId) -> String {
    tracker
        .state
        .find_item(id)
        .map(|item| item.name.clone())
        .unwrap_or_default()
}

pub fn list_items() -> Result<(), String> {
    let tracker = open_tracker();

    for (i, item) in tracker.state.items.iter().enumerate() {
        let info = level_info(item.total_seconds);
        let emoji = if item.emoji.is_empty() { "⬚" } else { &item.emoji };
        println!(
            "{:>3} {} {:24} {} LV {:<4} {:>3}% {}",
            i + 1,
            emoji,
            item.name,
            format_duration(item.total_seconds),
            info.level,
            (info.progress * 100.0).round() as u32,
            if item.running { "▶" } else { " " }
        );
    }
    Ok(())
}

pub fn add_item(name: &str, emoji: &str) -> Result<(), String> {
    let mut tracker = open_tracker();
    let id = tracker.add_item(name, emoji);
    save(&tracker)?;
    println!("Added '{}' ({})", item_name(&tracker, &id), id);
    Ok(())
}

pub fn edit_item(selector: &str, name: Option<String>, emoji: Option<String>) -> Result<(), String> {
    let mut tracker = open_tracker();
    let id = resolve(&tracker, selector)?;
    let Some(item) = tracker.state.find_item(&id) else {
        return Err(format!("Item '{}' not found", selector));
    };

    let name = name.unwrap_or_else(|| item.name.clone());
    let emoji = emoji.unwrap_or_else(|| item.emoji.clone());
    tracker.update_item(&id, &name, &emoji);
    save(&tracker)?;

    println!("Updated '{}'", item_name(&tracker, &id));
    Ok(())
}

pub fn start_item(selector: &str) -> Result<(), String> {
    let mut tracker = open_tracker();
    let id = resolve(&tracker, selector)?;

    if tracker.start_item(&id, accounting::now_ms()) {
        save(&tracker)?;
        println!("Started '{}'", item_name(&tracker, &id));
    } else {
        println!("'{}' is already running", item_name(&tracker, &id));
    }
    Ok(())
}

pub fn pause_item(selector: &str) -> Result<(), String> {
    let mut tracker = open_tracker();
    let id = resolve(&tracker, selector)?;

    if tracker.pause_item(&id, accounting::now_ms()) {
        save(&tracker)?;
        let total = tracker
            .state
            .find_item(&id)
            .map_or(0, |item| item.total_seconds);
        println!(
            "Paused '{}'. Total: {}",
            item_name(&tracker, &id),
            format_duration(total)
        );
    } else {
        println!("'{}' is not running", item_name(&tracker, &id));
    }
    Ok(())
}

pub fn export_data(out_dir: Option<PathBuf>) -> Result<(), String> {
    let tracker = open_tracker();
    let dir = out_dir.unwrap_or_else(|| PathBuf::from("."));
    let path = tracker.export_to(&dir).map_err(|e| e.to_string())?;
    println!("Exported to {}", path.display());
    Ok(())
}

pub fn import_data(file: PathBuf) -> Result<(), String> {
    let text = storage::read_text_file(&file).map_err(|e| e.to_string())?;
    let mut tracker = open_tracker();
    if !tracker.import_str(&text) {
        return Err(format!("{} is not a JSON backup", file.display()));
    }
    save(&tracker)?;
    println!(
        "Imported {} item(s) from {}",
        tracker.state.items.len(),
        file.display()
    );
    Ok(())
}

pub fn settings(background: Option<String>, glow: Option<String>) -> Result<(), String> {
    let mut tracker = open_tracker();
    let mut changed = false;
    if let Some(color) = background {
        changed |= tracker.set_background(&color);
    }
    if let Some(color) = glow {
        changed |= tracker.set_glow(&color);
    }
    if changed {
        save(&tracker)?;
    }

    println!("background {}", tracker.state.settings.background);
    println!("glow       {}", tracker.state.settings.glow);
    Ok(())
}

pub fn print_completions(shell: &str) -> Result<(), String> {
    use clap_complete::Shell;
    let shell = match shell {
        "bash" => Shell::Bash,
        "zsh" => Shell::Zsh,
        "fish" => Shell::Fish,
        _ => {
            return Err(format!(
                "Unsupported shell: {}. Use bash, zsh, or fish.",
                shell
            ));
        }
    };
    clap_complete::generate(shell, &mut Cli::command(), "exp-timer", &mut io::stdout());
    Ok(())
}

pub fn run_command(command: Command) {
    let result = match command {
        Command::Ui => Ok(()),
        Command::List => list_items(),
        Command::Add { name, emoji } => add_item(&name, &emoji),
        Command::Edit { item, name, emoji } => edit_item(&item, name, emoji),
        Command::Start { item } => start_item(&item),
        Command::Pause { item } => pause_item(&item),
        Command::Export { out } => export_data(out),
        Command::Import { file } => import_data(file),
        Command::Settings { background, glow } => settings(background, glow),
        Command::Completions { shell } => print_completions(&shell),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
