use crate::collections::Identifier;
use crate::error::ConfigError;
use crate::picker::PickerPolicy;
use ratatui::style::Color;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

const FALLBACK_GLYPH: &str = "*";

/// Colors and icon glyphs handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub icon: Color,
    pub muted: Color,
    pub highlight_fg: Color,
    pub highlight_bg: Color,
    pub error: Color,
    glyphs: HashMap<String, String>,
}

impl Default for Theme {
    fn default() -> Self {
        let glyphs = [
            ("folder", "+"),
            ("person", "@"),
            ("group", "&"),
            ("table", "#"),
            ("bar", "|"),
            ("line", "~"),
            ("pie", "o"),
            ("scalar", "1"),
        ]
        .into_iter()
        .map(|(name, glyph)| (name.to_string(), glyph.to_string()))
        .collect();
        Theme {
            icon: Color::Gray,
            muted: Color::DarkGray,
            highlight_fg: Color::White,
            highlight_bg: Color::DarkGray,
            error: Color::Red,
            glyphs,
        }
    }
}

impl Theme {
    pub fn glyph(&self, icon: &str) -> &str {
        self.glyphs.get(icon).map(String::as_str).unwrap_or(FALLBACK_GLYPH)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    pub current_user: Option<Identifier>,
    pub theme: Theme,
    pub policy: PickerPolicy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawConfig {
    current_user: Option<Identifier>,
    theme: RawTheme,
    policy: RawPolicy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawTheme {
    icon: Option<String>,
    muted: Option<String>,
    highlight_fg: Option<String>,
    highlight_bg: Option<String>,
    error: Option<String>,
    glyphs: HashMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct RawPolicy {
    personal_requires_search: Option<bool>,
    hide_nested_root: Option<bool>,
}

fn color(key: &'static str, value: Option<String>, fallback: Color) -> Result<Color, ConfigError> {
    match value {
        Some(value) => {
            Color::from_str(&value).map_err(|_| ConfigError::InvalidColor { key, value })
        }
        None => Ok(fallback),
    }
}

impl AppConfig {
    /// Defaults, overlaid with the TOML file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(AppConfig::default());
        };
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let raw: RawConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let defaults = AppConfig::default();
        let base = defaults.theme;
        let mut theme = Theme {
            icon: color("icon", raw.theme.icon, base.icon)?,
            muted: color("muted", raw.theme.muted, base.muted)?,
            highlight_fg: color("highlight_fg", raw.theme.highlight_fg, base.highlight_fg)?,
            highlight_bg: color("highlight_bg", raw.theme.highlight_bg, base.highlight_bg)?,
            error: color("error", raw.theme.error, base.error)?,
            glyphs: base.glyphs,
        };
        theme.glyphs.extend(raw.theme.glyphs);

        let policy = PickerPolicy {
            personal_requires_search: raw
                .policy
                .personal_requires_search
                .unwrap_or(defaults.policy.personal_requires_search),
            hide_nested_root: raw
                .policy
                .hide_nested_root
                .unwrap_or(defaults.policy.hide_nested_root),
        };

        Ok(AppConfig {
            current_user: raw.current_user,
            theme,
            policy,
        })
    }
}
