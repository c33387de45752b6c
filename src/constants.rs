use ratatui::style::Color;

pub const STATE_VERSION: u32 = 1;

pub const LEGACY_KEYS: LegacyKeys = LegacyKeys {
    seconds: "cumulativeSeconds",
    timestamp: "lastTimestamp",
};

pub const FILE_NAMES: FileNames = FileNames {
    app_state: "exp_timer_state.json",
    log: "exp_timer.log",
    export_prefix: "exp-timer-backup",
    backup_dir: "backups",
    backup_prefix: "exp_timer_state-",
};

pub const BACKUPS: BackupSettings = BackupSettings {
    keep: 10,
    stamp_format: "%Y%m%d-%H%M%S%.3f",
};

pub const ITEM_LIMITS: ItemLimits = ItemLimits {
    name_max_chars: 24,
    emoji_max_chars: 4,
};

pub const DEFAULTS: Defaults = Defaults {
    item_name: "預設項目",
    placeholder_name: "未命名",
    background: "#0f380f",
    glow: "#9bbc0f",
};

pub const TIME_UNITS: TimeUnits = TimeUnits {
    second_ms: 1000,
    minute: 60,
    hour: 60 * 60,
    day: 24 * 60 * 60,
    year: 365 * 24 * 60 * 60,
};

pub const LEVEL_CURVE: LevelCurve = LevelCurve { step: 10 };

pub const EXP_BAR: ExpBar = ExpBar { segments: 60 };

pub const TIME_SETTINGS: TimeSettings = TimeSettings {
    tick_ms: 1000,
    idle_poll_ms: 250,
};

pub const DATA_DIR_ENV: &str = "EXP_TIMER_DATA_DIR";

pub const EMOJI_CHOICES: [&str; 8] = ["", "📚", "💻", "🏃", "🎸", "🎨", "🧘", "🍳"];

pub const FALLBACK_GLOW: Color = Color::Rgb(155, 188, 15);
pub const FALLBACK_BACKGROUND: Color = Color::Rgb(15, 56, 15);

pub struct LegacyKeys {
    pub seconds: &'static str,
    pub timestamp: &'static str,
}

pub struct FileNames {
    pub app_state: &'static str,
    pub log: &'static str,
    pub export_prefix: &'static str,
    pub backup_dir: &'static str,
    pub backup_prefix: &'static str,
}

pub struct BackupSettings {
    pub keep: usize,
    pub stamp_format: &'static str,
}

pub struct ItemLimits {
    pub name_max_chars: usize,
    pub emoji_max_chars: usize,
}

pub struct Defaults {
    pub item_name: &'static str,
    pub placeholder_name: &'static str,
    pub background: &'static str,
    pub glow: &'static str,
}

pub struct TimeUnits {
    pub second_ms: u64,
    pub minute: u64,
    pub hour: u64,
    pub day: u64,
    pub year: u64,
}

pub struct LevelCurve {
    pub step: u64,
}

pub struct ExpBar {
    pub segments: usize,
}

pub struct TimeSettings {
    pub tick_ms: u64,
    pub idle_poll_ms: u64,
}
