use serde::Deserialize;
use std::path::PathBuf;

/// Rate attached to approvals when the reviewer does not supply one.
pub const DEFAULT_INTEREST_RATE: &str = "6.5%";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub port: u16,
    /// Directory holding one JSON file per storage key.
    pub storage_dir: PathBuf,
    pub default_interest_rate: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            storage_dir: PathBuf::from("./data"),
            default_interest_rate: DEFAULT_INTEREST_RATE.to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number between 1-65535"))?,
            storage_dir: std::env::var("STORAGE_DIR")
                .or_else(|_| Ok::<_, anyhow::Error>("./data".to_string()))
                .and_then(|dir| {
                    if dir.trim().is_empty() {
                        anyhow::bail!("STORAGE_DIR cannot be empty");
                    }
                    Ok(PathBuf::from(dir.trim()))
                })?,
            default_interest_rate: std::env::var("DEFAULT_INTEREST_RATE")
                .or_else(|_| Ok::<_, anyhow::Error>(DEFAULT_INTEREST_RATE.to_string()))
                .and_then(parse_interest_rate)?,
        };

        // Log successful configuration load
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("Storage directory: {}", config.storage_dir.display());
        tracing::debug!("Default interest rate: {}", config.default_interest_rate);
        tracing::debug!("Server Port: {}", config.port);

        Ok(config)
    }
}

/// Accepts `6.5` or `6.5%` and always returns the `%` form stored on approvals.
fn parse_interest_rate(raw: String) -> anyhow::Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        anyhow::bail!("DEFAULT_INTEREST_RATE cannot be empty");
    }
    let numeric = trimmed.trim_end_matches('%');
    match numeric.parse::<f64>() {
        Ok(value) if (0.0..=100.0).contains(&value) => Ok(format!("{}%", numeric)),
        _ => anyhow::bail!(
            "DEFAULT_INTEREST_RATE must be a percentage like 6.5%, got {}",
            raw
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn interest_rate_accepts_plain_and_percent_forms() {
        assert_eq!(parse_interest_rate("6.5%".to_string()).unwrap(), "6.5%");
        assert_eq!(parse_interest_rate(" 7.125 ".to_string()).unwrap(), "7.125%");
    }

    #[test]
    fn interest_rate_rejects_garbage() {
        assert!(parse_interest_rate("".to_string()).is_err());
        assert!(parse_interest_rate("abc".to_string()).is_err());
        assert!(parse_interest_rate("150%".to_string()).is_err());
    }

    #[test]
    fn default_config_matches_env_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.storage_dir, PathBuf::from("./data"));
        assert_eq!(config.default_interest_rate, "6.5%");
    }
}
