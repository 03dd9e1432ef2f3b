// SPDX-FileCopyrightText: 2026 Mnemo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config-backed settings lookup.

use async_trait::async_trait;
use mnemo_config::model::ExtractionConfig;
use mnemo_core::traits::SettingsLookup;
use mnemo_core::MnemoError;

/// [`SettingsLookup`] backed by static configuration.
///
/// Serves the config file's system override and no per-user
/// preferences. Embedders with a live settings store provide their own
/// implementation instead.
pub struct StaticSettings {
    system_model_override: Option<String>,
}

impl StaticSettings {
    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self {
            system_model_override: config.system_model_override.clone(),
        }
    }
}

#[async_trait]
impl SettingsLookup for StaticSettings {
    async fn system_extractor_override(&self) -> Result<Option<String>, MnemoError> {
        Ok(self.system_model_override.clone())
    }

    async fn user_extractor_preference(
        &self,
        _user_id: &str,
    ) -> Result<Option<String>, MnemoError> {
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn serves_the_configured_override() {
        let config = ExtractionConfig {
            system_model_override: Some("pinned-model".to_string()),
            ..ExtractionConfig::default()
        };
        let settings = StaticSettings::from_config(&config);
        assert_eq!(
            settings.system_extractor_override().await.unwrap().as_deref(),
            Some("pinned-model")
        );
        assert!(settings
            .user_extractor_preference("user-1")
            .await
            .unwrap()
            .is_none());
    }
}
