use std::collections::HashSet;

use serde_json::{Map, Value};

use crate::{
    constants::STATE_VERSION,
    domain::{AppState, Item, ItemId, clean_emoji, clean_name},
};

pub fn parse_state(text: &str) -> Option<AppState> {
    let raw: Value = serde_json::from_str(text).ok()?;
    raw.is_object().then(|| normalize_state(&raw))
}

pub fn normalize_state(raw: &Value) -> AppState {
    let mut state = AppState::default();
    let Some(obj) = raw.as_object() else {
        return state;
    };

    let mut items: Vec<Item> = obj
        .get("items")
        .and_then(Value::as_array)
        .map(|raw_items| raw_items.iter().filter_map(normalize_item).collect())
        .unwrap_or_default();
    dedupe_ids(&mut items);
    if !items.is_empty() {
        state.items = items;
    }

    if let Some(settings) = obj.get("settings").and_then(Value::as_object) {
        if let Some(background) = non_empty_str(settings, "background") {
            state.settings.background = background.to_string();
        }
        if let Some(glow) = non_empty_str(settings, "glow") {
            state.settings.glow = glow.to_string();
        }
    }

    let active_item_id = obj
        .get("activeItemId")
        .and_then(Value::as_str)
        .map(ItemId::new)
        .filter(|id| state.find_item(id).is_some());
    state.active_item_id = active_item_id;
    state.version = STATE_VERSION;
    state
}

fn normalize_item(raw: &Value) -> Option<Item> {
    let obj = raw.as_object()?;

    let id = non_empty_str(obj, "id")
        .map(ItemId::new)
        .unwrap_or_else(ItemId::generate);
    let name = clean_name(obj.get("name").and_then(Value::as_str).unwrap_or(""));
    let emoji = clean_emoji(obj.get("emoji").and_then(Value::as_str).unwrap_or(""));
    let total_seconds = whole_non_negative(obj.get("totalSeconds"));
    let running = matches!(obj.get("running"), Some(Value::Bool(true)));
    let last_timestamp = whole_non_negative(obj.get("lastTimestamp"));

    // a running item needs a start point; a stopped one must not keep one
    let (running, last_timestamp) = if running && last_timestamp > 0 {
        (true, last_timestamp)
    } else {
        (false, 0)
    };

    Some(Item {
        id,
        name,
        emoji,
        total_seconds,
        running,
        last_timestamp,
    })
}

fn dedupe_ids(items: &mut [Item]) {
    let mut seen = HashSet::new();
    for item in items.iter_mut() {
        while !seen.insert(item.id.clone()) {
            item.id = ItemId::generate();
        }
    }
}

fn non_empty_str<'a>(obj: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    obj.get(key)
        .and_then(Value::as_str)
        .filter(|value| !value.is_empty())
}

fn whole_non_negative(value: Option<&Value>) -> u64 {
    let Some(Value::Number(number)) = value else {
        return 0;
    };
    if let Some(exact) = number.as_u64() {
        return exact;
    }
    match number.as_f64() {
        Some(n) if n.is_finite() && n > 0.0 => n.floor() as u64,
        _ => 0,
    }
}
