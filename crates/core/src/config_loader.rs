use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::config::EngineConfig;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads engine configuration by layering TOML and environment overrides
    /// on top of the built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<EngineConfig> {
        let config: EngineConfig = Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("config/VolDesk.toml"))
            .merge(Env::prefixed("VOL_DESK_").split("__"))
            .extract()?;

        Ok(config)
    }

    /// Loads configuration from an explicit TOML path (tests, CLI `--config`).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &str) -> Result<EngineConfig> {
        let config: EngineConfig = Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("VOL_DESK_").split("__"))
            .extract()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_falls_back_to_defaults_without_a_file() {
        let config = ConfigLoader::load().unwrap();
        assert!((config.edge.weights.iv_rv_spread - 0.30).abs() < f64::EPSILON);
        assert_eq!(config.gates.max_open_per_underlying, 3);
    }
}
