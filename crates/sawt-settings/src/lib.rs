//! # sawt-settings
//!
//! Settings are loaded from three layers (in priority order):
//! 1. **Compiled defaults** — [`SawtSettings::default()`]
//! 2. **User file** — `~/.sawt/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** — highest priority
//!
//! The binary applies its CLI flags on top of the loaded value.

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{deep_merge, load_settings, load_settings_from_path, settings_path};
pub use types::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_are_valid() {
        let settings = SawtSettings::default();
        assert_eq!(settings.server.port, 8000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.allowed_origins, vec!["http://localhost:3000"]);
        assert_eq!(settings.transcription.model, "openai/whisper-base");
        assert_eq!(settings.speech.voice_name, "en-US-Neural2-J");
        assert_eq!(settings.logging.level, "info");
        assert!(settings.agent.api_key.is_none());
    }
}
