use std::{
    env,
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use directories::ProjectDirs;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::{
    constants::{BACKUPS, DATA_DIR_ENV, FILE_NAMES, LEGACY_KEYS},
    domain::AppState,
    error::StoreError,
    normalize,
};

#[derive(Clone, Debug)]
pub struct Storage {
    dir: PathBuf,
}

impl Storage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Storage { dir: dir.into() }
    }

    pub fn from_env() -> Self {
        Storage::new(get_data_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn state_path(&self) -> PathBuf {
        self.dir.join(FILE_NAMES.app_state)
    }

    fn legacy_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }

    pub fn load(&self) -> AppState {
        if let Some(state) = self.load_primary() {
            return state;
        }
        migrate_legacy(self)
    }

    fn load_primary(&self) -> Option<AppState> {
        let path = self.state_path();
        if !path.exists() {
            return None;
        }

        match fs::read_to_string(&path) {
            Ok(text) => {
                let state = normalize::parse_state(&text);
                if state.is_none() {
                    warn!(path = %path.display(), "state document is not a JSON object, ignoring it");
                }
                state
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read state document");
                None
            }
        }
    }

    pub fn save(&self, state: &AppState) -> Result<(), StoreError> {
        fs::create_dir_all(&self.dir).map_err(|e| StoreError::io("create", &self.dir, e))?;
        write_json_atomic(&self.state_path(), state)
    }

    pub fn read_legacy_number(&self, key: &str) -> Option<u64> {
        let text = fs::read_to_string(self.legacy_path(key)).ok()?;
        parse_leading_int(&text).and_then(|n| u64::try_from(n).ok())
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.dir.join(FILE_NAMES.backup_dir)
    }

    // Copies the current document aside before it is replaced wholesale,
    // keeping the newest BACKUPS.keep copies. Nothing to copy yields None.
    pub fn backup_state(&self) -> Result<Option<PathBuf>, StoreError> {
        let source = self.state_path();
        if !source.exists() {
            return Ok(None);
        }

        let backup_dir = self.backup_dir();
        fs::create_dir_all(&backup_dir).map_err(|e| StoreError::io("create", &backup_dir, e))?;
        let backup_path = backup_dir.join(backup_file_name(Local::now()));
        fs::copy(&source, &backup_path).map_err(|e| StoreError::io("copy", &backup_path, e))?;

        prune_backups(&backup_dir)?;
        Ok(Some(backup_path))
    }
}

fn backup_file_name(now: DateTime<Local>) -> String {
    format!(
        "{}{}.json",
        FILE_NAMES.backup_prefix,
        now.format(BACKUPS.stamp_format)
    )
}

// Stamps sort lexically in time order, so the oldest copies come first.
fn prune_backups(backup_dir: &Path) -> Result<(), StoreError> {
    let entries = fs::read_dir(backup_dir).map_err(|e| StoreError::io("list", backup_dir, e))?;
    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .filter(|name| name.starts_with(FILE_NAMES.backup_prefix) && name.ends_with(".json"))
        .collect();
    names.sort();

    let excess = names.len().saturating_sub(BACKUPS.keep);
    for name in names.iter().take(excess) {
        let path = backup_dir.join(name);
        if let Err(e) = fs::remove_file(&path) {
            warn!(path = %path.display(), error = %e, "could not remove old backup");
        }
    }
    Ok(())
}

pub fn migrate_legacy(storage: &Storage) -> AppState {
    let seconds = storage.read_legacy_number(LEGACY_KEYS.seconds);
    let last_timestamp = storage.read_legacy_number(LEGACY_KEYS.timestamp);

    let mut state = AppState::default();
    if seconds.is_none() && last_timestamp.is_none() {
        debug!("no stored state, starting fresh");
        return state;
    }

    let last_timestamp = last_timestamp.unwrap_or(0);
    let item = &mut state.items[0];
    item.total_seconds = seconds.unwrap_or(0);
    item.running = last_timestamp > 0;
    item.last_timestamp = last_timestamp;
    state.active_item_id = None;

    info!(
        seconds = item.total_seconds,
        running = item.running,
        "migrated legacy counter"
    );
    state
}

// Optional leading whitespace, optional sign, then digits; trailing garbage is
// ignored. Values past the i64 range saturate instead of being dropped.
pub fn parse_leading_int(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let digits: &str = &rest[..rest.bytes().take_while(u8::is_ascii_digit).count()];
    if digits.is_empty() {
        return None;
    }

    let value: i64 = digits.parse().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

pub fn get_data_dir() -> PathBuf {
    if let Ok(dir) = env::var(DATA_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }

    if Path::new(".").join(FILE_NAMES.app_state).exists() {
        return PathBuf::from(".");
    }

    if let Some(proj_dirs) = ProjectDirs::from("com", "exp-timer", "exp-timer") {
        let data_dir = proj_dirs.data_dir().to_path_buf();
        fs::create_dir_all(&data_dir).ok();
        data_dir
    } else {
        PathBuf::from(".")
    }
}

pub fn get_state_dir() -> PathBuf {
    if let Some(proj_dirs) = ProjectDirs::from("com", "exp-timer", "exp-timer") {
        if let Some(state_dir) = proj_dirs.state_dir() {
            let dir = state_dir.to_path_buf();
            fs::create_dir_all(&dir).ok();
            return dir;
        }
    }
    get_data_dir()
}

pub fn get_log_path() -> PathBuf {
    get_state_dir().join(FILE_NAMES.log)
}

pub fn export_file_name(now: DateTime<Local>) -> String {
    format!(
        "{}-{}.json",
        FILE_NAMES.export_prefix,
        now.format("%Y%m%d-%H%M%S")
    )
}

pub fn export_state(
    dir: &Path,
    state: &AppState,
    now: DateTime<Local>,
) -> Result<PathBuf, StoreError> {
    fs::create_dir_all(dir).map_err(|e| StoreError::io("create", dir, e))?;
    let path = dir.join(export_file_name(now));
    write_json_atomic(&path, state)?;
    info!(path = %path.display(), "exported state");
    Ok(path)
}

pub fn read_text_file(path: &Path) -> Result<String, StoreError> {
    fs::read_to_string(path).map_err(|e| StoreError::io("read", path, e))
}

pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(value)?;
    atomic_write(path, &json)
}

pub fn atomic_write(path: &Path, content: &str) -> Result<(), StoreError> {
    let tmp_path = path.with_extension("tmp");
    let mut tmp_file = File::create(&tmp_path).map_err(|e| StoreError::io("create", &tmp_path, e))?;
    tmp_file
        .write_all(content.as_bytes())
        .map_err(|e| StoreError::io("write", &tmp_path, e))?;
    tmp_file
        .sync_all()
        .map_err(|e| StoreError::io("sync", &tmp_path, e))?;
    fs::rename(&tmp_path, path).map_err(|e| StoreError::io("rename", path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use chrono::TimeZone;

    use super::*;

    fn unique_dir(prefix: &str) -> PathBuf {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let dir = env::temp_dir().join(format!("{}_{}", prefix, now));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_everything_loads_defaults() {
        let dir = unique_dir("exp_timer_empty");
        let state = Storage::new(&dir).load();

        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].total_seconds, 0);
        assert!(!state.items[0].running);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_state_round_trip() {
        let dir = unique_dir("exp_timer_roundtrip");
        let storage = Storage::new(&dir);
        let mut state = AppState::default();
        state.items[0].total_seconds = 3600;
        state.settings.background = "#202020".to_string();

        storage.save(&state).unwrap();
        assert_eq!(storage.load(), state);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_corrupt_document_falls_back_to_legacy() {
        let dir = unique_dir("exp_timer_corrupt");
        fs::write(dir.join(FILE_NAMES.app_state), "{{{ not json").unwrap();
        fs::write(dir.join(LEGACY_KEYS.seconds), "125").unwrap();

        let state = Storage::new(&dir).load();
        assert_eq!(state.items.len(), 1);
        assert_eq!(state.items[0].total_seconds, 125);
        assert!(!state.items[0].running);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_legacy_timestamp_marks_item_running() {
        let dir = unique_dir("exp_timer_legacy");
        fs::write(dir.join(LEGACY_KEYS.seconds), "  77abc").unwrap();
        fs::write(dir.join(LEGACY_KEYS.timestamp), "1700000000000").unwrap();

        let state = Storage::new(&dir).load();
        let item = &state.items[0];
        assert_eq!(item.total_seconds, 77);
        assert!(item.running);
        assert_eq!(item.last_timestamp, 1_700_000_000_000);
        assert_eq!(state.active_item_id, None);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_negative_legacy_values_fall_back_to_zero() {
        let dir = unique_dir("exp_timer_legacy_negative");
        fs::write(dir.join(LEGACY_KEYS.seconds), "-40").unwrap();
        fs::write(dir.join(LEGACY_KEYS.timestamp), "junk").unwrap();

        let state = Storage::new(&dir).load();
        assert_eq!(state.items[0].total_seconds, 0);
        assert!(!state.items[0].running);
        assert_eq!(state.items[0].last_timestamp, 0);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_primary_document_wins_over_legacy() {
        let dir = unique_dir("exp_timer_primary_wins");
        let storage = Storage::new(&dir);
        let mut state = AppState::default();
        state.items[0].total_seconds = 9;
        storage.save(&state).unwrap();
        fs::write(dir.join(LEGACY_KEYS.seconds), "5000").unwrap();

        assert_eq!(storage.load().items[0].total_seconds, 9);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_parse_leading_int() {
        assert_eq!(parse_leading_int("42"), Some(42));
        assert_eq!(parse_leading_int("  42xyz"), Some(42));
        assert_eq!(parse_leading_int("-7"), Some(-7));
        assert_eq!(parse_leading_int("+8"), Some(8));
        assert_eq!(parse_leading_int("x42"), None);
        assert_eq!(parse_leading_int(""), None);
        assert_eq!(parse_leading_int("-"), None);
        assert_eq!(parse_leading_int("99999999999999999999"), Some(i64::MAX));
        assert_eq!(parse_leading_int("-99999999999999999999"), Some(-i64::MAX));
    }

    #[test]
    fn test_oversized_legacy_counter_keeps_its_magnitude() {
        let dir = unique_dir("exp_timer_legacy_huge");
        fs::write(dir.join(LEGACY_KEYS.seconds), "99999999999999999999").unwrap();

        let state = Storage::new(&dir).load();
        assert_eq!(state.items[0].total_seconds, i64::MAX as u64);
        assert!(!state.items[0].running);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_export_file_name_uses_local_stamp() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(export_file_name(now), "exp-timer-backup-20240309-070501.json");
    }

    #[test]
    fn test_export_writes_pretty_json_that_imports_back() {
        let dir = unique_dir("exp_timer_export");
        let mut state = AppState::default();
        state.items[0].total_seconds = 600;
        let now = Local.with_ymd_and_hms(2025, 12, 31, 23, 59, 58).unwrap();

        let path = export_state(&dir, &state, now).unwrap();
        let text = read_text_file(&path).unwrap();
        assert!(text.contains("\n  \"version\": 1"));
        assert_eq!(normalize::parse_state(&text), Some(state));

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_backup_without_document_is_skipped() {
        let dir = unique_dir("exp_timer_backup_none");
        let storage = Storage::new(&dir);

        assert!(storage.backup_state().unwrap().is_none());
        assert!(!storage.backup_dir().exists());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_backups_are_rotated() {
        let dir = unique_dir("exp_timer_backups");
        let storage = Storage::new(&dir);
        storage.save(&AppState::default()).unwrap();

        let backup_dir = storage.backup_dir();
        fs::create_dir_all(&backup_dir).unwrap();
        for i in 0..(BACKUPS.keep + 3) {
            let name = format!("{}20000101-0000{:02}.000.json", FILE_NAMES.backup_prefix, i);
            fs::write(backup_dir.join(name), "{}").unwrap();
        }
        fs::write(backup_dir.join("notes.txt"), "keep me").unwrap();

        let newest = storage.backup_state().unwrap().unwrap();

        let mut names: Vec<String> = fs::read_dir(&backup_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), BACKUPS.keep + 1);
        assert!(names.contains(&"notes.txt".to_string()));
        assert!(newest.exists());
        assert!(!backup_dir
            .join(format!("{}20000101-000000.000.json", FILE_NAMES.backup_prefix))
            .exists());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_backup_file_name_uses_state_prefix() {
        let now = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(backup_file_name(now), "exp_timer_state-20240309-070501.000.json");
    }
}
