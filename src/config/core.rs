use std::path::Path;

use anyhow::{Context, Result, ensure};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::Serialize;

use super::WalkConfig;
use super::overrides::without_unset;

// Embed the default config at compile time
const DEFAULT_CONFIG: &str = include_str!("../../default-config.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ConfigFormat {
    Toml,
    Json,
}

pub struct NestwalkConfig {
    figment: Figment,
}

impl NestwalkConfig {
    /// Load the layered configuration.
    ///
    /// Lowest to highest priority: embedded defaults, user config, repository
    /// config (or only `custom_config` when given), `NESTWALK_` environment
    /// variables, then `cli_overrides`. Unset override values are ignored.
    pub fn load<T: Serialize>(custom_config: Option<&str>, cli_overrides: Option<T>) -> Result<Self> {
        tracing::trace!("CONFIG LOAD: Starting");

        let mut figment = Figment::new().merge(Toml::string(DEFAULT_CONFIG));

        if let Some(custom_path) = custom_config {
            ensure!(
                Path::new(custom_path).is_file(),
                "configuration file not found: {custom_path}"
            );
            figment = match Path::new(custom_path).extension().and_then(|e| e.to_str()) {
                Some("json") => figment.merge(Json::file(custom_path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(custom_path)),
                _ => figment.merge(Toml::file(custom_path)),
            };
        } else {
            let user = Self::user_config_base_path();
            figment = figment
                // User config
                .merge(Toml::file(format!("{user}.toml")))
                .merge(Json::file(format!("{user}.json")))
                .merge(Yaml::file(format!("{user}.yaml")))
                // Repository config
                .merge(Toml::file("nestwalk.toml"))
                .merge(Json::file("nestwalk.json"))
                .merge(Yaml::file("nestwalk.yaml"));
        }

        figment = figment.merge(Env::prefixed("NESTWALK_").split("__"));

        if let Some(overrides) = cli_overrides {
            tracing::trace!("CONFIG LOAD: Applying CLI overrides");
            figment = figment.merge(Serialized::defaults(without_unset(overrides)));
        }

        Ok(NestwalkConfig { figment })
    }

    /// The typed `[walk]` section.
    pub fn walk_config(&self) -> Result<WalkConfig> {
        self.figment
            .extract_inner("walk")
            .context("invalid [walk] configuration")
    }

    /// Get a nested object/section as JSON
    pub fn get_section(&self, path: &str) -> Result<serde_json::Value> {
        Ok(self.figment.extract_inner(path)?)
    }

    /// Get the full merged configuration as a structured value
    pub fn get_full_config(&self) -> Result<serde_json::Value> {
        Ok(self.figment.extract()?)
    }

    pub fn export_config(&self, format: ConfigFormat) -> Result<String> {
        let config = self.get_full_config()?;
        let output = match format {
            ConfigFormat::Json => serde_json::to_string_pretty(&config)?,
            ConfigFormat::Toml => toml::to_string_pretty(&config)?,
        };
        Ok(output)
    }

    fn user_config_base_path() -> String {
        match std::env::var("HOME") {
            Ok(home) => format!("{home}/.config/nestwalk/config"),
            Err(_) => "~/.config/nestwalk/config".to_string(),
        }
    }
}
