//! Elemental infusion value objects

use serde::{Deserialize, Serialize};

/// The six infusable elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Element {
    Fire,
    Ice,
    Air,
    Earth,
    Light,
    Dark,
}

impl Element {
    pub const ALL: [Element; 6] = [
        Element::Fire,
        Element::Ice,
        Element::Air,
        Element::Earth,
        Element::Light,
        Element::Dark,
    ];
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Element::Fire => "fire",
            Element::Ice => "ice",
            Element::Air => "air",
            Element::Earth => "earth",
            Element::Light => "light",
            Element::Dark => "dark",
        };
        write!(f, "{}", name)
    }
}

/// Infusion strength of a single element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementIntensity {
    #[default]
    Inert,
    Waning,
    Strong,
}

/// Room-wide infusion state for all six elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ElementalState {
    pub fire: ElementIntensity,
    pub ice: ElementIntensity,
    pub air: ElementIntensity,
    pub earth: ElementIntensity,
    pub light: ElementIntensity,
    pub dark: ElementIntensity,
}

impl ElementalState {
    pub fn get(&self, element: Element) -> ElementIntensity {
        match element {
            Element::Fire => self.fire,
            Element::Ice => self.ice,
            Element::Air => self.air,
            Element::Earth => self.earth,
            Element::Light => self.light,
            Element::Dark => self.dark,
        }
    }

    pub fn with(mut self, element: Element, intensity: ElementIntensity) -> Self {
        let slot = match element {
            Element::Fire => &mut self.fire,
            Element::Ice => &mut self.ice,
            Element::Air => &mut self.air,
            Element::Earth => &mut self.earth,
            Element::Light => &mut self.light,
            Element::Dark => &mut self.dark,
        };
        *slot = intensity;
        self
    }

    pub fn is_all_inert(&self) -> bool {
        Element::ALL
            .iter()
            .all(|e| self.get(*e) == ElementIntensity::Inert)
    }
}
