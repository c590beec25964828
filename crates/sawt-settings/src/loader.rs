//! Settings loading with deep merge and environment variable overrides.
//!
//! Deep merge rules:
//! - Objects are merged recursively (source overrides target per-key)
//! - Arrays and primitives are replaced entirely by source
//! - Null values in source are skipped (preserving target)

use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::debug;

use crate::errors::Result;
use crate::types::SawtSettings;

/// Resolve the path to the settings file (`~/.sawt/settings.json`).
pub fn settings_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
    PathBuf::from(home).join(".sawt").join("settings.json")
}

/// Load settings from the default path with env var overrides.
pub fn load_settings() -> Result<SawtSettings> {
    load_settings_from_path(&settings_path())
}

/// Load settings from a specific path with env var overrides.
///
/// If the file does not exist, returns defaults. If the file contains
/// invalid JSON, returns an error.
pub fn load_settings_from_path(path: &Path) -> Result<SawtSettings> {
    let mut settings = load_file_layer(path)?;
    apply_env_overrides(&mut settings);
    settings.validate()?;
    Ok(settings)
}

/// Defaults with the file at `path` merged on top. No env overrides.
pub fn load_file_layer(path: &Path) -> Result<SawtSettings> {
    let defaults = serde_json::to_value(SawtSettings::default())?;

    let merged = if path.exists() {
        debug!(?path, "loading settings from file");
        let content = std::fs::read_to_string(path)?;
        let user: Value = serde_json::from_str(&content)?;
        deep_merge(defaults, user)
    } else {
        debug!(?path, "settings file not found, using defaults");
        defaults
    };

    Ok(serde_json::from_value(merged)?)
}

/// Recursive deep merge of two JSON values.
pub fn deep_merge(target: Value, source: Value) -> Value {
    match (target, source) {
        (Value::Object(mut target_map), Value::Object(source_map)) => {
            for (key, source_val) in source_map {
                if source_val.is_null() {
                    continue;
                }
                let merged = if let Some(target_val) = target_map.remove(&key) {
                    deep_merge(target_val, source_val)
                } else {
                    source_val
                };
                let _ = target_map.insert(key, merged);
            }
            Value::Object(target_map)
        }
        (_, source) => source,
    }
}

/// Apply process environment overrides to loaded settings.
pub fn apply_env_overrides(settings: &mut SawtSettings) {
    apply_overrides_from(settings, |name| std::env::var(name).ok());
}

/// Apply overrides read through `lookup`. Empty values are treated as unset;
/// unparseable numbers are ignored with a warning.
pub fn apply_overrides_from(settings: &mut SawtSettings, lookup: impl Fn(&str) -> Option<String>) {
    let read = |name: &str| lookup(name).filter(|v| !v.is_empty());

    // ── Server ──────────────────────────────────────────────────────
    if let Some(v) = read("SAWT_HOST") {
        settings.server.host = v;
    }
    if let Some(v) = read("SAWT_PORT") {
        match parse_u16_range(&v, 1, 65535) {
            Some(port) => settings.server.port = port,
            None => tracing::warn!(key = "SAWT_PORT", value = %v, "invalid port env var, ignoring"),
        }
    }
    if let Some(v) = read("SAWT_ALLOWED_ORIGINS") {
        settings.server.allowed_origins = parse_list(&v);
    }

    // ── Logging ─────────────────────────────────────────────────────
    if let Some(v) = read("SAWT_LOG_LEVEL") {
        settings.logging.level = v;
    }
    if let Some(v) = read("SAWT_LOG_FORMAT") {
        settings.logging.format = v;
    }

    // ── Transcription ───────────────────────────────────────────────
    if let Some(v) = read("HUGGING_FACE_API_TOKEN") {
        settings.transcription.api_token = Some(v);
    }
    if let Some(v) = read("HUGGING_FACE_TRANSCRIPTION_MODEL") {
        settings.transcription.model = v;
    }
    if let Some(v) = read("SAWT_TRANSCRIPTION_URL") {
        settings.transcription.base_url = v;
    }
    if let Some(v) = read("SAWT_DEBUG_WAV_PATH") {
        settings.transcription.debug_wav_path = Some(v);
    }

    // ── Agent ───────────────────────────────────────────────────────
    if let Some(v) = read("AGENT_MODEL") {
        settings.agent.model = v;
    }
    if let Some(v) = read("AGENT_API_KEY") {
        settings.agent.api_key = Some(v);
    }
    if let Some(v) = read("AGENT_BASE_URL") {
        settings.agent.base_url = v;
    }

    // ── Speech ──────────────────────────────────────────────────────
    if let Some(v) = read("GOOGLE_TTS_API_KEY") {
        settings.speech.api_key = Some(v);
    }
    if let Some(v) = read("SAWT_TTS_VOICE") {
        settings.speech.voice_name = v;
    }
    if let Some(v) = read("SAWT_TTS_LANGUAGE") {
        settings.speech.language_code = v;
    }
}

/// Parse a string as a `u16` within a range.
pub fn parse_u16_range(val: &str, min: u16, max: u16) -> Option<u16> {
    let n: u16 = val.trim().parse().ok()?;
    (n >= min && n <= max).then_some(n)
}

/// Split a comma separated list, dropping blanks.
pub fn parse_list(val: &str) -> Vec<String> {
    val.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
