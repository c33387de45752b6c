use crate::{
    constants::{EMOJI_CHOICES, ITEM_LIMITS},
    domain::{Item, ItemId, Settings},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum ItemField {
    Name,
    Emoji,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct ItemForm {
    pub editing: Option<ItemId>,
    pub name: String,
    pub emoji: String,
    pub field: ItemField,
}

impl ItemForm {
    pub(super) fn for_new_item() -> Self {
        ItemForm {
            editing: None,
            name: String::new(),
            emoji: String::new(),
            field: ItemField::Name,
        }
    }

    pub(super) fn for_item(item: &Item) -> Self {
        ItemForm {
            editing: Some(item.id.clone()),
            name: item.name.clone(),
            emoji: item.emoji.clone(),
            field: ItemField::Name,
        }
    }

    pub(super) fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "修改項目"
        } else {
            "新增項目"
        }
    }

    pub(super) fn submit_label(&self) -> &'static str {
        if self.editing.is_some() { "儲存" } else { "新增" }
    }

    pub(super) fn next_field(&mut self) {
        self.field = match self.field {
            ItemField::Name => ItemField::Emoji,
            ItemField::Emoji => ItemField::Name,
        };
    }

    pub(super) fn push(&mut self, c: char) {
        match self.field {
            ItemField::Name => {
                if self.name.chars().count() < ITEM_LIMITS.name_max_chars {
                    self.name.push(c);
                }
            }
            ItemField::Emoji => {
                if self.emoji.chars().count() < ITEM_LIMITS.emoji_max_chars {
                    self.emoji.push(c);
                }
            }
        }
    }

    pub(super) fn pop(&mut self) {
        match self.field {
            ItemField::Name => self.name.pop(),
            ItemField::Emoji => self.emoji.pop(),
        };
    }

    // a custom emoji sits before the first preset
    pub(super) fn cycle_emoji(&mut self, forward: bool) {
        let len = EMOJI_CHOICES.len();
        let next = match EMOJI_CHOICES.iter().position(|e| *e == self.emoji) {
            Some(pos) if forward => (pos + 1) % len,
            Some(pos) => (pos + len - 1) % len,
            None if forward => 0,
            None => len - 1,
        };
        self.emoji = EMOJI_CHOICES[next].to_string();
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum SettingsField {
    Background,
    Glow,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct SettingsForm {
    pub background: String,
    pub glow: String,
    pub field: SettingsField,
}

impl SettingsForm {
    pub(super) fn from_settings(settings: &Settings) -> Self {
        SettingsForm {
            background: settings.background.clone(),
            glow: settings.glow.clone(),
            field: SettingsField::Background,
        }
    }

    pub(super) fn next_field(&mut self) {
        self.field = match self.field {
            SettingsField::Background => SettingsField::Glow,
            SettingsField::Glow => SettingsField::Background,
        };
    }

    fn current_mut(&mut self) -> &mut String {
        match self.field {
            SettingsField::Background => &mut self.background,
            SettingsField::Glow => &mut self.glow,
        }
    }

    pub(super) fn push(&mut self, c: char) {
        self.current_mut().push(c);
    }

    pub(super) fn pop(&mut self) {
        self.current_mut().pop();
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum Dialog {
    Item(ItemForm),
    Settings(SettingsForm),
}
