//! Attack-modifier cards and action modifiers

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{Condition, Element};

/// Value printed on an attack-modifier card
///
/// Serialized as a plain integer, or as the strings `"x2"` and `"miss"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModifierValue {
    Add(i32),
    Double,
    Miss,
}

impl ModifierValue {
    /// Whether drawing this value forces a reshuffle of its deck
    pub fn forces_reshuffle(&self) -> bool {
        matches!(self, ModifierValue::Double | ModifierValue::Miss)
    }
}

impl std::fmt::Display for ModifierValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModifierValue::Add(value) if *value >= 0 => write!(f, "+{}", value),
            ModifierValue::Add(value) => write!(f, "{}", value),
            ModifierValue::Double => write!(f, "x2"),
            ModifierValue::Miss => write!(f, "miss"),
        }
    }
}

impl Serialize for ModifierValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ModifierValue::Add(value) => serializer.serialize_i32(*value),
            ModifierValue::Double => serializer.serialize_str("x2"),
            ModifierValue::Miss => serializer.serialize_str("miss"),
        }
    }
}

impl<'de> Deserialize<'de> for ModifierValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(i32),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(value) => Ok(ModifierValue::Add(value)),
            Raw::Text(text) => match text.to_lowercase().as_str() {
                "x2" => Ok(ModifierValue::Double),
                "miss" | "null" => Ok(ModifierValue::Miss),
                other => other
                    .parse::<i32>()
                    .map(ModifierValue::Add)
                    .map_err(|_| serde::de::Error::custom(format!("invalid modifier: {}", text))),
            },
        }
    }
}

/// Extra effect printed on a modifier card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ModifierEffect {
    Pierce(u32),
    Push(u32),
    Pull(u32),
    Condition(Condition),
    Infuse(Element),
}

/// A single attack-modifier card
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierCard {
    pub modifier: ModifierValue,
    #[serde(default)]
    pub effects: Vec<ModifierEffect>,
}

impl ModifierCard {
    pub fn new(modifier: ModifierValue) -> Self {
        Self {
            modifier,
            effects: Vec::new(),
        }
    }

    pub fn add(value: i32) -> Self {
        Self::new(ModifierValue::Add(value))
    }

    pub fn double() -> Self {
        Self::new(ModifierValue::Double)
    }

    pub fn miss() -> Self {
        Self::new(ModifierValue::Miss)
    }

    pub fn with_effect(mut self, effect: ModifierEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Modifier attached to an ability action (card text or monster stat line)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionModifier {
    Pierce { value: u32 },
    Push { value: u32 },
    Pull { value: u32 },
    Condition { condition: Condition },
    /// Infuse the element after the action resolves
    Infuse { element: Element },
    /// Consume the element, if available, for extra damage
    ConsumeElement { element: Element, bonus: i32 },
    Experience { value: u32 },
}
