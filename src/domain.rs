use std::{
    fmt,
    path::{Path, PathBuf},
};

use chrono::{Local, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::{
    accounting,
    constants::{DEFAULTS, ITEM_LIMITS, STATE_VERSION},
    error::StoreError,
    normalize,
    storage::{self, Storage},
};

const ID_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        ItemId(id.into())
    }

    pub fn generate() -> Self {
        let mut rng = rand::thread_rng();
        let suffix: String = (0..8)
            .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
            .collect();
        let millis = Utc::now().timestamp_millis().max(0) as u64;
        ItemId(format!("id_{}_{}", to_base36(millis), suffix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ID_ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub emoji: String,
    pub total_seconds: u64,
    pub running: bool,
    pub last_timestamp: u64,
}

impl Item {
    pub fn new(name: &str, emoji: &str) -> Self {
        Item {
            id: ItemId::generate(),
            name: clean_name(name),
            emoji: clean_emoji(emoji),
            total_seconds: 0,
            running: false,
            last_timestamp: 0,
        }
    }
}

pub fn clean_name(raw: &str) -> String {
    let truncated: String = raw
        .trim()
        .chars()
        .take(ITEM_LIMITS.name_max_chars)
        .collect();
    let truncated = truncated.trim_end();
    if truncated.is_empty() {
        DEFAULTS.placeholder_name.to_string()
    } else {
        truncated.to_string()
    }
}

pub fn clean_emoji(raw: &str) -> String {
    raw.chars().take(ITEM_LIMITS.emoji_max_chars).collect()
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub background: String,
    pub glow: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            background: DEFAULTS.background.to_string(),
            glow: DEFAULTS.glow.to_string(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub version: u32,
    pub settings: Settings,
    pub items: Vec<Item>,
    pub active_item_id: Option<ItemId>,
}

impl Default for AppState {
    fn default() -> Self {
        AppState {
            version: STATE_VERSION,
            settings: Settings::default(),
            items: vec![Item::new(DEFAULTS.item_name, "")],
            active_item_id: None,
        }
    }
}

impl AppState {
    pub fn find_item(&self, id: &ItemId) -> Option<&Item> {
        self.items.iter().find(|item| &item.id == id)
    }

    pub fn find_item_mut(&mut self, id: &ItemId) -> Option<&mut Item> {
        self.items.iter_mut().find(|item| &item.id == id)
    }

    pub fn active_item(&self) -> Option<&Item> {
        self.active_item_id
            .as_ref()
            .and_then(|id| self.find_item(id))
    }

    pub fn position_of(&self, id: &ItemId) -> Option<usize> {
        self.items.iter().position(|item| &item.id == id)
    }
}

pub struct Tracker {
    pub state: AppState,
    storage: Storage,
}

impl Tracker {
    pub fn load(storage: Storage) -> Self {
        let state = storage.load();
        Tracker { state, storage }
    }

    pub fn open(storage: Storage, now: u64) -> Self {
        let mut tracker = Self::load(storage);
        let settled = accounting::settle_and_pause_all(&mut tracker.state, now);
        if settled > 0 {
            info!(settled, "settled items left running by a previous session");
        }
        tracker.save();
        tracker
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn try_save(&self) -> Result<(), StoreError> {
        self.storage.save(&self.state)
    }

    pub fn save(&self) {
        if let Err(e) = self.try_save() {
            warn!(error = %e, "could not save state");
        }
    }

    pub fn tick(&mut self, now: u64) -> bool {
        let changed = accounting::tick(&mut self.state, now);
        if changed {
            self.save();
        }
        changed
    }

    pub fn start_item(&mut self, id: &ItemId, now: u64) -> bool {
        let Some(item) = self.state.find_item_mut(id) else {
            return false;
        };
        if !accounting::start(item, now) {
            return false;
        }
        debug!(item = %id, "started");
        true
    }

    pub fn pause_item(&mut self, id: &ItemId, now: u64) -> bool {
        let running = self.state.find_item(id).is_some_and(|item| item.running);
        if !running {
            return false;
        }

        accounting::tick(&mut self.state, now);
        if let Some(item) = self.state.find_item_mut(id) {
            accounting::pause(item, now);
        }
        debug!(item = %id, "paused");
        true
    }

    pub fn start_active(&mut self, now: u64) -> bool {
        match self.state.active_item_id.clone() {
            Some(id) => self.start_item(&id, now),
            None => false,
        }
    }

    pub fn pause_active(&mut self, now: u64) -> bool {
        match self.state.active_item_id.clone() {
            Some(id) => self.pause_item(&id, now),
            None => false,
        }
    }

    pub fn toggle_active(&mut self, now: u64) -> bool {
        let running = self.state.active_item().is_some_and(|item| item.running);
        if running {
            self.pause_active(now)
        } else {
            self.start_active(now)
        }
    }

    pub fn add_item(&mut self, name: &str, emoji: &str) -> ItemId {
        let item = Item::new(name, emoji);
        let id = item.id.clone();
        self.state.items.insert(0, item);
        id
    }

    pub fn update_item(&mut self, id: &ItemId, name: &str, emoji: &str) -> bool {
        let Some(item) = self.state.find_item_mut(id) else {
            return false;
        };
        item.name = clean_name(name);
        item.emoji = clean_emoji(emoji);
        true
    }

    pub fn select(&mut self, id: &ItemId) -> bool {
        if self.state.find_item(id).is_none() {
            return false;
        }
        self.state.active_item_id = Some(id.clone());
        true
    }

    pub fn clear_selection(&mut self) {
        self.state.active_item_id = None;
    }

    pub fn set_background(&mut self, color: &str) -> bool {
        if color.is_empty() {
            return false;
        }
        self.state.settings.background = color.to_string();
        true
    }

    pub fn set_glow(&mut self, color: &str) -> bool {
        if color.is_empty() {
            return false;
        }
        self.state.settings.glow = color.to_string();
        true
    }

    pub fn export_to(&self, dir: &Path) -> Result<PathBuf, StoreError> {
        storage::export_state(dir, &self.state, Local::now())
    }

    pub fn import_str(&mut self, text: &str) -> bool {
        let Some(mut imported) = normalize::parse_state(text) else {
            warn!("ignoring import: not a JSON object");
            return false;
        };
        imported.active_item_id = None;

        match self.storage.backup_state() {
            Ok(Some(path)) => debug!(path = %path.display(), "backed up state before import"),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not back up state before import"),
        }
        self.state = imported;
        info!(items = self.state.items.len(), "imported state");
        true
    }

    pub fn resolve(&self, selector: &str) -> Option<ItemId> {
        let items = &self.state.items;
        if let Some(item) = items.iter().find(|item| item.id.as_str() == selector) {
            return Some(item.id.clone());
        }
        if let Ok(position) = selector.parse::<usize>() {
            if position >= 1 {
                if let Some(item) = items.get(position - 1) {
                    return Some(item.id.clone());
                }
            }
        }
        items
            .iter()
            .find(|item| item.name == selector)
            .map(|item| item.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::{fs, time::SystemTime};

    use super::*;
    use crate::constants::FILE_NAMES;

    const T: u64 = 1_700_000_000_000;

    fn temp_storage(prefix: &str) -> Storage {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("{}_{}", prefix, now));
        fs::create_dir_all(&dir).unwrap();
        Storage::new(dir)
    }

    #[test]
    fn test_fresh_state_has_single_stopped_item() {
        let state = AppState::default();
        assert_eq!(state.version, 1);
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].name, "預設項目");
        assert_eq!(state.items[0].total_seconds, 0);
        assert!(!state.items[0].running);
        assert_eq!(state.active_item_id, None);
        assert_eq!(accounting::level_info(0).level, 0);
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let a = ItemId::generate();
        let b = ItemId::generate();
        assert_ne!(a, b);
        assert!(a.as_str().starts_with("id_"));
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
    }

    #[test]
    fn test_clean_name_trims_truncates_and_defaults() {
        assert_eq!(clean_name("  deep work  "), "deep work");
        assert_eq!(clean_name("   "), "未命名");
        let long = "a".repeat(40);
        assert_eq!(clean_name(&long).chars().count(), 24);
        let spaced = format!("{} tail", "b".repeat(23));
        assert_eq!(clean_name(&spaced), "b".repeat(23));
    }

    #[test]
    fn test_clean_emoji_truncates() {
        assert_eq!(clean_emoji("🎸🎸🎸🎸🎸"), "🎸🎸🎸🎸");
        assert_eq!(clean_emoji(""), "");
    }

    #[test]
    fn test_json_field_names_are_camel_case() {
        let state = AppState::default();
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("activeItemId").is_some());
        let item = &json["items"][0];
        assert!(item.get("totalSeconds").is_some());
        assert!(item.get("lastTimestamp").is_some());
    }

    #[test]
    fn test_add_item_goes_to_front_and_persists() {
        let storage = temp_storage("exp_timer_add");
        let dir = storage.dir().to_path_buf();
        let mut tracker = Tracker::load(storage);

        let id = tracker.add_item("  guitar ", "🎸");
        assert_eq!(tracker.state.items.len(), 2);
        assert_eq!(tracker.state.items[0].id, id);
        assert_eq!(tracker.state.items[0].name, "guitar");
        tracker.try_save().unwrap();

        let reloaded = Tracker::load(Storage::new(dir.clone()));
        assert_eq!(reloaded.state.items[0].id, id);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_update_item_rewrites_name_and_emoji() {
        let storage = temp_storage("exp_timer_update");
        let dir = storage.dir().to_path_buf();
        let mut tracker = Tracker::load(storage);
        let id = tracker.state.items[0].id.clone();

        assert!(tracker.update_item(&id, "", "📚📚📚📚📚"));
        assert_eq!(tracker.state.items[0].name, "未命名");
        assert_eq!(tracker.state.items[0].emoji, "📚📚📚📚");
        assert!(!tracker.update_item(&ItemId::new("missing"), "x", ""));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_active_item_start_and_pause() {
        let storage = temp_storage("exp_timer_active");
        let dir = storage.dir().to_path_buf();
        let mut tracker = Tracker::load(storage);
        let id = tracker.state.items[0].id.clone();

        assert!(!tracker.start_active(T));
        assert!(tracker.select(&id));
        assert!(tracker.start_active(T));
        assert!(!tracker.start_active(T + 1000));
        assert!(tracker.pause_active(T + 5000));
        assert!(!tracker.pause_active(T + 6000));

        let item = &tracker.state.items[0];
        assert_eq!(item.total_seconds, 5);
        assert!(!item.running);
        assert_eq!(item.last_timestamp, 0);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_pause_folds_other_running_items() {
        let storage = temp_storage("exp_timer_pause_all");
        let dir = storage.dir().to_path_buf();
        let mut tracker = Tracker::load(storage);
        let second = tracker.add_item("second", "");
        let first = tracker.state.items[1].id.clone();

        tracker.start_item(&first, T);
        tracker.start_item(&second, T);
        assert!(tracker.pause_item(&second, T + 3000));

        let first_item = tracker.state.find_item(&first).unwrap();
        assert_eq!(first_item.total_seconds, 3);
        assert!(first_item.running);
        assert_eq!(first_item.last_timestamp, T + 3000);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_open_settles_running_items() {
        let storage = temp_storage("exp_timer_open");
        let dir = storage.dir().to_path_buf();
        let mut tracker = Tracker::load(storage);
        let id = tracker.state.items[0].id.clone();
        tracker.start_item(&id, T);
        tracker.try_save().unwrap();

        let reopened = Tracker::open(Storage::new(dir.clone()), T + 10_400);
        let item = &reopened.state.items[0];
        assert_eq!(item.total_seconds, 10);
        assert!(!item.running);
        assert_eq!(item.last_timestamp, 0);

        let persisted = Tracker::load(Storage::new(dir.clone()));
        assert!(!persisted.state.items[0].running);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_import_replaces_state_and_clears_selection() {
        let storage = temp_storage("exp_timer_import");
        let dir = storage.dir().to_path_buf();
        let mut tracker = Tracker::load(storage);
        let id = tracker.state.items[0].id.clone();
        tracker.select(&id);

        assert!(tracker.import_str(r#"{"items":[{"name":"  ","totalSeconds":-5}]}"#));
        assert_eq!(tracker.state.items.len(), 1);
        assert_eq!(tracker.state.items[0].name, "未命名");
        assert_eq!(tracker.state.items[0].total_seconds, 0);
        assert_eq!(tracker.state.active_item_id, None);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_import_backs_up_previous_document() {
        let storage = temp_storage("exp_timer_import_backup");
        let dir = storage.dir().to_path_buf();
        let mut tracker = Tracker::load(storage);
        tracker.add_item("before import", "");
        tracker.state.items[0].total_seconds = 4321;
        tracker.try_save().unwrap();
        let before = tracker.state.clone();

        assert!(tracker.import_str(r#"{"items":[{"name":"x"}]}"#));
        tracker.try_save().unwrap();

        let backups: Vec<_> = fs::read_dir(dir.join(FILE_NAMES.backup_dir))
            .unwrap()
            .filter_map(|e| e.ok())
            .collect();
        assert_eq!(backups.len(), 1);
        let text = fs::read_to_string(backups[0].path()).unwrap();
        assert_eq!(normalize::parse_state(&text), Some(before));

        let current = Tracker::load(Storage::new(dir.clone()));
        assert_eq!(current.state.items.len(), 1);
        assert_eq!(current.state.items[0].name, "x");

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_tick_saves_only_when_seconds_accrue() {
        let storage = temp_storage("exp_timer_tick_save");
        let dir = storage.dir().to_path_buf();
        let state_path = storage.state_path();
        let mut tracker = Tracker::load(storage);
        let id = tracker.state.items[0].id.clone();
        tracker.start_item(&id, T);
        tracker.try_save().unwrap();
        let saved = fs::read(&state_path).unwrap();

        assert!(!tracker.tick(T + 999));
        assert_eq!(fs::read(&state_path).unwrap(), saved);

        assert!(tracker.tick(T + 1000));
        let reloaded = Tracker::load(Storage::new(dir.clone()));
        let item = &reloaded.state.items[0];
        assert_eq!(item.total_seconds, 1);
        assert_eq!(item.last_timestamp, T + 1000);
        assert!(item.running);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_mutators_leave_persisting_to_the_caller() {
        let storage = temp_storage("exp_timer_no_autosave");
        let dir = storage.dir().to_path_buf();
        let state_path = storage.state_path();
        let mut tracker = Tracker::load(storage);

        tracker.add_item("unsaved", "");
        tracker.set_glow("#ffffff");
        assert!(!state_path.exists());

        tracker.try_save().unwrap();
        let reloaded = Tracker::load(Storage::new(dir.clone()));
        assert_eq!(reloaded.state.items[0].name, "unsaved");
        assert_eq!(reloaded.state.settings.glow, "#ffffff");

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_import_ignores_malformed_input() {
        let storage = temp_storage("exp_timer_import_bad");
        let dir = storage.dir().to_path_buf();
        let mut tracker = Tracker::load(storage);
        let before = tracker.state.clone();

        assert!(!tracker.import_str("{not json"));
        assert!(!tracker.import_str("null"));
        assert!(!tracker.import_str("[1, 2, 3]"));
        assert_eq!(tracker.state, before);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_settings_ignore_empty_colors() {
        let storage = temp_storage("exp_timer_settings");
        let dir = storage.dir().to_path_buf();
        let mut tracker = Tracker::load(storage);

        assert!(!tracker.set_background(""));
        assert!(tracker.set_glow("#ffffff"));
        assert_eq!(tracker.state.settings.background, "#0f380f");
        assert_eq!(tracker.state.settings.glow, "#ffffff");

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_resolve_by_id_position_and_name() {
        let storage = temp_storage("exp_timer_resolve");
        let dir = storage.dir().to_path_buf();
        let mut tracker = Tracker::load(storage);
        let writing = tracker.add_item("writing", "");
        let default_id = tracker.state.items[1].id.clone();

        assert_eq!(tracker.resolve(writing.as_str()), Some(writing.clone()));
        assert_eq!(tracker.resolve("2"), Some(default_id));
        assert_eq!(tracker.resolve("writing"), Some(writing));
        assert_eq!(tracker.resolve("0"), None);
        assert_eq!(tracker.resolve("nope"), None);

        fs::remove_dir_all(dir).ok();
    }
}
