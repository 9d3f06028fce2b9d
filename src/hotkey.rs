use serde::{Deserialize, Serialize};
use std::fmt;

/// A modifier key, independent of left/right placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKey {
    Shift,
    Control,
    Alt,
    Meta,
    Function,
}

impl ModifierKey {
    pub const ALL: [ModifierKey; 5] = [
        ModifierKey::Shift,
        ModifierKey::Control,
        ModifierKey::Alt,
        ModifierKey::Meta,
        ModifierKey::Function,
    ];

    fn bit(self) -> u8 {
        match self {
            ModifierKey::Shift => 1 << 0,
            ModifierKey::Control => 1 << 1,
            ModifierKey::Alt => 1 << 2,
            ModifierKey::Meta => 1 << 3,
            ModifierKey::Function => 1 << 4,
        }
    }
}

impl fmt::Display for ModifierKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModifierKey::Shift => "Shift",
            ModifierKey::Control => "Ctrl",
            ModifierKey::Alt => "Alt",
            ModifierKey::Meta => "Meta",
            ModifierKey::Function => "Fn",
        };
        f.write_str(name)
    }
}

/// The set of modifiers currently held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ModifierFlags(u8);

impl ModifierFlags {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn contains(self, key: ModifierKey) -> bool {
        self.0 & key.bit() != 0
    }

    pub fn insert(&mut self, key: ModifierKey) {
        self.0 |= key.bit();
    }

    pub fn remove(&mut self, key: ModifierKey) {
        self.0 &= !key.bit();
    }

    pub fn with(mut self, key: ModifierKey) -> Self {
        self.insert(key);
        self
    }

    pub fn without(mut self, key: ModifierKey) -> Self {
        self.remove(key);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = ModifierKey> {
        ModifierKey::ALL.into_iter().filter(move |k| self.contains(*k))
    }
}

impl FromIterator<ModifierKey> for ModifierFlags {
    fn from_iter<I: IntoIterator<Item = ModifierKey>>(iter: I) -> Self {
        let mut flags = ModifierFlags::empty();
        for key in iter {
            flags.insert(key);
        }
        flags
    }
}

impl From<ModifierKey> for ModifierFlags {
    fn from(key: ModifierKey) -> Self {
        ModifierFlags::empty().with(key)
    }
}

impl fmt::Display for ModifierFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|k| k.to_string()).collect();
        if parts.is_empty() {
            f.write_str("none")
        } else {
            f.write_str(&parts.join("+"))
        }
    }
}

/// Which modifier starts a lookup gesture and which single extra modifier may
/// be held alongside it to select the paragraph gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierSpec {
    pub target: ModifierKey,
    pub allowed_additional: Option<ModifierKey>,
}

impl Default for ModifierSpec {
    fn default() -> Self {
        Self {
            target: ModifierKey::Alt,
            allowed_additional: Some(ModifierKey::Shift),
        }
    }
}

impl ModifierSpec {
    pub fn new(target: ModifierKey) -> Self {
        Self {
            target,
            allowed_additional: None,
        }
    }

    pub fn with_additional(mut self, key: ModifierKey) -> Self {
        if key != self.target {
            self.allowed_additional = Some(key);
        }
        self
    }
}

/// Parse a single modifier name such as `"Alt"`, `"option"` or `"Cmd"`.
pub fn parse_modifier(s: &str) -> Option<ModifierKey> {
    match s.trim().to_ascii_uppercase().as_str() {
        "SHIFT" => Some(ModifierKey::Shift),
        "CTRL" | "CONTROL" => Some(ModifierKey::Control),
        "ALT" | "OPTION" | "OPT" => Some(ModifierKey::Alt),
        "META" | "CMD" | "COMMAND" | "WIN" | "SUPER" => Some(ModifierKey::Meta),
        "FN" | "FUNCTION" => Some(ModifierKey::Function),
        _ => None,
    }
}

/// Parse the gesture modifier and the optional paragraph modifier.
///
/// The gesture string must name exactly one modifier; combinations such as
/// `"Ctrl+Alt"` are rejected because the gesture is defined as holding a
/// single key.
pub fn parse_modifier_spec(hotkey: &str, paragraph: Option<&str>) -> Option<ModifierSpec> {
    let mut parts = hotkey.split('+').filter(|p| !p.trim().is_empty());
    let target = parse_modifier(parts.next()?)?;
    if parts.next().is_some() {
        return None;
    }

    let mut spec = ModifierSpec::new(target);
    if let Some(extra) = paragraph {
        let key = parse_modifier(extra)?;
        if key == target {
            return None;
        }
        spec = spec.with_additional(key);
    }
    Some(spec)
}
