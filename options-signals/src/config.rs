//! Application configuration.
//!
//! Layers, later wins:
//! 1. Built-in defaults
//! 2. Optional TOML file
//! 3. `OPTIONS_SIGNALS__SECTION__KEY` environment variables

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backtest::BacktestConfig;
use crate::scanner::ScannerConfig;

pub const ENV_PREFIX: &str = "OPTIONS_SIGNALS";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub backtest: BacktestConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let bt = &self.backtest;
        if bt.initial_capital <= rust_decimal::Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "backtest.initial_capital must be positive".to_string(),
            ));
        }
        if !(bt.position_fraction > 0.0 && bt.position_fraction <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "backtest.position_fraction must be in (0, 1], got {}",
                bt.position_fraction
            )));
        }
        if bt.stop_loss_pct <= 0.0 || bt.take_profit_pct <= 0.0 {
            return Err(ConfigError::Invalid(
                "backtest stop loss and take profit must be positive".to_string(),
            ));
        }
        if bt.reference_vol <= 0.0 || self.scanner.reference_vol <= 0.0 {
            return Err(ConfigError::Invalid(
                "reference volatility must be positive".to_string(),
            ));
        }
        if bt.rsi_period == 0 {
            return Err(ConfigError::Invalid("backtest.rsi_period must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Load configuration from defaults, an optional file and the environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    load_with_env(path, None)
}

fn load_with_env(
    path: Option<&Path>,
    env: Option<HashMap<String, String>>,
) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder().add_source(Config::try_from(&AppConfig::default())?);

    if let Some(path) = path {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        builder = builder.add_source(File::from(path).format(FileFormat::Toml));
    }

    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(env),
    );

    let config: AppConfig = builder.build()?.try_deserialize()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategies::StrategyId;
    use rust_decimal_macros::dec;
    use std::fs;

    fn no_env() -> Option<HashMap<String, String>> {
        Some(HashMap::new())
    }

    #[test]
    fn test_defaults() {
        let config = load_with_env(None, no_env()).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.backtest.initial_capital, dec!(10000));
        assert_eq!(config.scanner.risk_free_rate, 0.1175);
    }

    #[test]
    fn test_toml_file_overrides_defaults() {
        let dir = std::env::temp_dir().join("options_signals_config_test");
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("settings.toml");
        fs::write(
            &path,
            r#"
[scanner]
strategies = ["long_call", "rsi_reversal"]
min_score = 60

[backtest]
stop_loss_pct = 25.0
max_open_trades = 3

[backtest.chain]
days_to_expiry = 45
"#,
        )
        .unwrap();

        let config = load_with_env(Some(&path), no_env()).unwrap();
        assert_eq!(
            config.scanner.strategies,
            vec![StrategyId::LongCall, StrategyId::RsiReversal]
        );
        assert_eq!(config.scanner.min_score, 60);
        assert_eq!(config.backtest.stop_loss_pct, 25.0);
        assert_eq!(config.backtest.max_open_trades, 3);
        assert_eq!(config.backtest.chain.days_to_expiry, 45);
        assert_eq!(config.backtest.take_profit_pct, 50.0);

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_environment_overrides() {
        let env = HashMap::from([
            ("OPTIONS_SIGNALS__BACKTEST__WARMUP_DAYS".to_string(), "20".to_string()),
            ("OPTIONS_SIGNALS__SCANNER__REFERENCE_VOL".to_string(), "0.25".to_string()),
        ]);
        let config = load_with_env(None, Some(env)).unwrap();
        assert_eq!(config.backtest.warmup_days, 20);
        assert_eq!(config.scanner.reference_vol, 0.25);
    }

    #[test]
    fn test_shipped_default_file_matches_defaults() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("config/default.toml");
        let config = load_with_env(Some(&path), no_env()).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_missing_file() {
        let err = load_with_env(Some(Path::new("/nonexistent/settings.toml")), no_env());
        assert!(matches!(err, Err(ConfigError::FileNotFound(_))));
    }

    #[test]
    fn test_validation() {
        let mut config = AppConfig::default();
        assert!(config.validate().is_ok());
        config.backtest.position_fraction = 1.5;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
