use crate::config::AppConfig;
use anyhow::{anyhow, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads application configuration by merging defaults, TOML, environment variables, and JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or the result is invalid.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Loads application configuration from a specific TOML file.
    ///
    /// Missing files are skipped; every field has a default.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or the result is invalid.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let figment = Self::base(path.as_ref());
        Self::extract(&figment)
    }

    /// Loads application configuration with a specific profile.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or the result is invalid.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(DEFAULT_CONFIG_PATH))
            .merge(Toml::file(format!("config/Config.{profile}.toml")))
            .merge(Env::prefixed("ARCADIA_").split("__"))
            .join(Json::file("config/Config.json"));
        Self::extract(&figment)
    }

    fn base(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("ARCADIA_").split("__"))
            .join(Json::file("config/Config.json"))
    }

    fn extract(figment: &Figment) -> Result<AppConfig> {
        let config: AppConfig = figment.extract()?;
        config
            .simulator
            .validate()
            .map_err(|e| anyhow!("invalid simulator config: {e}"))?;
        tracing::debug!(
            network = %config.wallet.network,
            ticker = %config.simulator.ticker,
            "Configuration loaded"
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Network, DEFAULT_SETTLEMENT_DELAY_MS};
    use figment::Jail;

    #[test]
    fn test_defaults_without_files() {
        Jail::expect_with(|_jail| {
            let config = ConfigLoader::load().expect("defaults load");
            assert_eq!(config.simulator.settlement_delay_ms, DEFAULT_SETTLEMENT_DELAY_MS);
            assert!(config.wallet.auto_detect);
            Ok(())
        });
    }

    #[test]
    fn test_toml_and_env_override() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/Config.toml",
                r#"
                [wallet]
                network = "testnet"

                [simulator]
                ticker = "PEPE"
                settlement_delay_ms = 250
                "#,
            )?;
            jail.set_env("ARCADIA_SIMULATOR__RANDOM_SEED", "7");

            let config = ConfigLoader::load().expect("config loads");
            assert_eq!(config.wallet.network, Network::Testnet);
            assert_eq!(config.simulator.ticker, "PEPE");
            assert_eq!(config.simulator.settlement_delay_ms, 250);
            assert_eq!(config.simulator.random_seed, Some(7));
            Ok(())
        });
    }

    #[test]
    fn test_profile_file_merges_over_base() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file("config/Config.toml", "[simulator]\nticker = \"ARC\"\n")?;
            jail.create_file(
                "config/Config.demo.toml",
                "[simulator]\nsettlement_delay_ms = 10\n",
            )?;

            let config = ConfigLoader::load_with_profile("demo").expect("config loads");
            assert_eq!(config.simulator.ticker, "ARC");
            assert_eq!(config.simulator.settlement_delay_ms, 10);
            Ok(())
        });
    }

    #[test]
    fn test_invalid_range_rejected() {
        Jail::expect_with(|jail| {
            jail.create_dir("config")?;
            jail.create_file(
                "config/Config.toml",
                "[simulator]\npnl_min = 10.0\npnl_max = -10.0\n",
            )?;

            assert!(ConfigLoader::load().is_err());
            Ok(())
        });
    }
}
