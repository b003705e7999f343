use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::markup::{Color, TextStyle};
use crate::measure::TextMetrics;

pub const APP_NAME: &str = "timeline-render";

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StoredSession {
    pub homeserver: String,
    pub user_id: String,
    pub access_token: String,
    pub device_id: String,
}

/// How message bodies are styled and measured.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub font_size: f32,
    pub text_color: Color,
    pub link_color: Color,
    pub max_nesting: usize,
    pub metrics: TextMetrics,
    /// Widest a message bubble may grow, in points.
    pub bubble_width: f32,
    /// Bodies with more characters than this are measured off the render path.
    pub deferred_threshold: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        let style = TextStyle::default();
        Self {
            font_size: style.font_size,
            text_color: style.text_color,
            link_color: style.link_color,
            max_nesting: style.max_nesting,
            metrics: TextMetrics::default(),
            bubble_width: 420.0,
            deferred_threshold: 4_000,
        }
    }
}

impl RenderSettings {
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            font_size: self.font_size,
            text_color: self.text_color,
            link_color: self.link_color,
            max_nesting: self.max_nesting,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppSettings {
    #[serde(default)]
    pub render: RenderSettings,
}

pub fn config_dir() -> PathBuf {
    let base = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_NAME)
}

pub fn data_dir() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join(APP_NAME)
}

pub fn session_path() -> PathBuf {
    config_dir().join("session.json")
}

pub fn settings_path() -> PathBuf {
    config_dir().join("settings.json")
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)
            .map_err(|e| format!("Failed to create {}: {e}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    std::fs::write(path, json).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

/// `None` when the file is missing or unreadable.
fn read_file(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(data) => Some(data),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!("Could not read {}: {e}", path.display());
            None
        }
    }
}

pub fn save_session(session: &StoredSession) -> Result<(), String> {
    write_json(&session_path(), session)
}

pub fn load_session() -> Option<StoredSession> {
    let data = read_file(&session_path())?;
    serde_json::from_str(&data)
        .inspect_err(|e| tracing::warn!("Ignoring malformed session file: {e}"))
        .ok()
}

pub fn save_settings(settings: &AppSettings) -> Result<(), String> {
    write_json(&settings_path(), settings)
}

pub fn load_settings() -> AppSettings {
    read_file(&settings_path())
        .map(|data| parse_settings(&data))
        .unwrap_or_default()
}

fn parse_settings(data: &str) -> AppSettings {
    match serde_json::from_str(data) {
        Ok(settings) => settings,
        Err(e) => {
            tracing::warn!("Ignoring unreadable settings: {e}");
            AppSettings::default()
        }
    }
}
