use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{
    advisory::{FALLBACK_FINANCIAL_ADVICE, FALLBACK_LOAN_RISK},
    core::{
        services::journal_service::PostingRules,
        utils::{ensure_dir, write_atomic, PathResolver},
    },
    domain::InterestBasis,
    errors::{KoperasiError, KoperasiResult},
};

/// Which identifier scheme new records receive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdStyle {
    /// `MEM001`, `LOAN001`, `TRX001`, `JE0001`.
    #[default]
    Sequential,
    Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdvisoryConfig {
    pub timeout_ms: u64,
    pub financial_fallback: String,
    pub loan_risk_fallback: String,
}

impl Default for AdvisoryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 8_000,
            financial_fallback: FALLBACK_FINANCIAL_ADVICE.into(),
            loan_risk_fallback: FALLBACK_LOAN_RISK.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    pub locale: String,
    pub currency: String,
    #[serde(default)]
    pub id_style: IdStyle,
    #[serde(default)]
    pub interest_basis: InterestBasis,
    #[serde(default)]
    pub posting: PostingRules,
    #[serde(default)]
    pub advisory: AdvisoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            locale: "id-ID".into(),
            currency: "IDR".into(),
            id_style: IdStyle::default(),
            interest_basis: InterestBasis::default(),
            posting: PostingRules::default(),
            advisory: AdvisoryConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> KoperasiResult<()> {
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(KoperasiError::Config(format!(
                "currency must be a 3-letter uppercase code, got `{}`",
                self.currency
            )));
        }
        if self.advisory.timeout_ms == 0 {
            return Err(KoperasiError::Config(
                "advisory timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// Loads and saves [`Config`] as JSON under the application directory.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> KoperasiResult<Self> {
        Self::with_base_dir(PathResolver::base_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> KoperasiResult<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: PathResolver::config_file_in(&base),
        })
    }

    /// Returns the stored configuration, or defaults when none was saved yet.
    pub fn load(&self) -> KoperasiResult<Config> {
        if !self.path.exists() {
            return Ok(Config::default());
        }
        let data = fs::read_to_string(&self.path)?;
        let config: Config = serde_json::from_str(&data)
            .map_err(|err| KoperasiError::Config(format!("{}: {err}", self.path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, config: &Config) -> KoperasiResult<()> {
        config.validate()?;
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
