use serde::{Deserialize, Serialize};
use std::convert::TryFrom;

/// Named colour palettes the card can be drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeName {
    Light,
    #[default]
    Dark,
}

/// Colour values handed to the presentation layer as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub background: &'static str,
    pub foreground: &'static str,
    pub box_shadow: &'static str,
    pub title: &'static str,
    pub temperature: &'static str,
    pub text: &'static str,
}

const LIGHT: Palette = Palette {
    background: "#ededed",
    foreground: "#f9f9f9",
    box_shadow: "0 1px 3px 0 #999999",
    title: "#212121",
    temperature: "#757575",
    text: "#828282",
};

const DARK: Palette = Palette {
    background: "#1F2022",
    foreground: "#121416",
    box_shadow: "0 1px 4px 0 rgba(12, 12, 13, 0.2), 0 0 0 1px rgba(0, 0, 0, 0.15)",
    title: "#f9f9fa",
    temperature: "#dddddd",
    text: "#cccccc",
};

impl ThemeName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeName::Light => "light",
            ThemeName::Dark => "dark",
        }
    }

    pub const fn all() -> &'static [ThemeName] {
        &[ThemeName::Light, ThemeName::Dark]
    }

    pub fn palette(&self) -> &'static Palette {
        match self {
            ThemeName::Light => &LIGHT,
            ThemeName::Dark => &DARK,
        }
    }

    /// The other palette.
    pub fn toggled(self) -> Self {
        match self {
            ThemeName::Light => ThemeName::Dark,
            ThemeName::Dark => ThemeName::Light,
        }
    }
}

impl std::fmt::Display for ThemeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ThemeName {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "light" => Ok(ThemeName::Light),
            "dark" => Ok(ThemeName::Dark),
            _ => Err(anyhow::anyhow!("Unknown theme '{value}'. Supported themes: light, dark.")),
        }
    }
}
