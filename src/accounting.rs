use chrono::Utc;

use crate::{
    constants::{EXP_BAR, LEVEL_CURVE, TIME_UNITS},
    domain::{AppState, Item},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelInfo {
    pub level: u64,
    pub prev_threshold: u64,
    pub next_threshold: u64,
    pub progress: f64,
}

pub fn now_ms() -> u64 {
    Utc::now().timestamp_millis().max(0) as u64
}

pub fn elapsed_whole_seconds(last: u64, now: u64) -> Option<u64> {
    if now <= last {
        return None;
    }
    let delta = (now - last) / TIME_UNITS.second_ms;
    (delta > 0).then_some(delta)
}

/// Folds whole elapsed seconds into a running item. The timestamp advances by
/// exactly the consumed amount so the sub-second remainder carries over.
pub fn accrue(item: &mut Item, now: u64) -> bool {
    if !item.running || item.last_timestamp == 0 {
        return false;
    }

    match elapsed_whole_seconds(item.last_timestamp, now) {
        Some(delta) => {
            item.total_seconds = item.total_seconds.saturating_add(delta);
            item.last_timestamp += delta * TIME_UNITS.second_ms;
            true
        }
        None => false,
    }
}

pub fn tick(state: &mut AppState, now: u64) -> bool {
    let mut changed = false;
    for item in &mut state.items {
        changed |= accrue(item, now);
    }
    changed
}

pub fn start(item: &mut Item, now: u64) -> bool {
    if item.running {
        return false;
    }
    item.running = true;
    item.last_timestamp = now.max(1);
    true
}

pub fn pause(item: &mut Item, now: u64) -> bool {
    if !item.running {
        return false;
    }
    accrue(item, now);
    item.running = false;
    item.last_timestamp = 0;
    true
}

pub fn settle_and_pause_all(state: &mut AppState, now: u64) -> usize {
    let mut settled = 0;
    for item in &mut state.items {
        if item.running {
            settled += 1;
            if item.last_timestamp > 0 {
                if let Some(delta) = elapsed_whole_seconds(item.last_timestamp, now) {
                    item.total_seconds = item.total_seconds.saturating_add(delta);
                }
            }
        }
        item.running = false;
        item.last_timestamp = 0;
    }
    settled
}

// fixed 365-day years and 24-hour days
pub fn format_duration(total_seconds: u64) -> String {
    let mut s = total_seconds;
    let years = s / TIME_UNITS.year;
    s -= years * TIME_UNITS.year;
    let days = s / TIME_UNITS.day;
    s -= days * TIME_UNITS.day;
    let hours = s / TIME_UNITS.hour;
    s -= hours * TIME_UNITS.hour;
    let minutes = s / TIME_UNITS.minute;
    s -= minutes * TIME_UNITS.minute;

    format!(
        "{:03}:{:03}:{:02}:{:02}:{:02}",
        years, days, hours, minutes, s
    )
}

fn level_threshold(level: u64) -> u64 {
    let base = level.saturating_mul(LEVEL_CURVE.step);
    base.saturating_mul(base)
}

pub fn level_info(total_seconds: u64) -> LevelInfo {
    let level = total_seconds.isqrt() / LEVEL_CURVE.step;
    let prev_threshold = level_threshold(level);
    let next_threshold = level_threshold(level + 1);

    let progress = if next_threshold == prev_threshold {
        1.0
    } else {
        let gained = total_seconds.saturating_sub(prev_threshold) as f64;
        let span = (next_threshold - prev_threshold) as f64;
        (gained / span).clamp(0.0, 1.0)
    };

    LevelInfo {
        level,
        prev_threshold,
        next_threshold,
        progress,
    }
}

pub fn seconds_to_next_level(total_seconds: u64) -> u64 {
    level_info(total_seconds)
        .next_threshold
        .saturating_sub(total_seconds)
}

pub fn filled_exp_segments(total_seconds: u64) -> usize {
    let filled = (total_seconds % TIME_UNITS.minute) as usize + 1;
    filled.min(EXP_BAR.segments)
}
