//! Runtime configuration.
//!
//! Values come from [`Config::default`], then `ULIMI_*` environment variables, then
//! whatever the binary's command-line flags override.

use std::env;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::{Error, Result};

/// Whether new and updated records must point at records that exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReferentialIntegrity {
    /// Reject unknown farm, crop, product and user ids with [`Error::InvalidReference`].
    #[default]
    Strict,
    /// Accept any id. Matches how the web front end has always behaved.
    Lenient,
}

impl FromStr for ReferentialIntegrity {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "strict" => Ok(ReferentialIntegrity::Strict),
            "lenient" => Ok(ReferentialIntegrity::Lenient),
            other => Err(Error::InvalidInput(format!("unknown integrity mode '{}'", other))),
        }
    }
}

impl fmt::Display for ReferentialIntegrity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ReferentialIntegrity::Strict => "strict",
            ReferentialIntegrity::Lenient => "lenient",
        })
    }
}

/// Which products go when a farm is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CascadePolicy {
    /// Products on the farm and products of any crop removed with it.
    #[default]
    Transitive,
    /// Only products whose `farmId` is the farm. A product listed against another farm
    /// but one of this farm's crops survives with a dangling `cropId`.
    FarmIdOnly,
}

impl FromStr for CascadePolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "transitive" => Ok(CascadePolicy::Transitive),
            "farm-id-only" | "farm_id_only" => Ok(CascadePolicy::FarmIdOnly),
            other => Err(Error::InvalidInput(format!("unknown cascade policy '{}'", other))),
        }
    }
}

impl fmt::Display for CascadePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CascadePolicy::Transitive => "transitive",
            CascadePolicy::FarmIdOnly => "farm-id-only",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding one JSON file per collection.
    pub data_dir: PathBuf,
    pub integrity: ReferentialIntegrity,
    pub cascade: CascadePolicy,
    /// Simulated round trip before login and signup resolve.
    pub login_latency: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: PathBuf::from("data"),
            integrity: ReferentialIntegrity::Strict,
            cascade: CascadePolicy::Transitive,
            login_latency: Duration::from_millis(1000),
        }
    }
}

impl Config {
    /// Defaults overridden by `ULIMI_DATA_DIR`, `ULIMI_INTEGRITY`, `ULIMI_CASCADE` and
    /// `ULIMI_LOGIN_LATENCY_MS`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(dir) = var("ULIMI_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(mode) = var("ULIMI_INTEGRITY") {
            config.integrity = mode.parse()?;
        }
        if let Some(policy) = var("ULIMI_CASCADE") {
            config.cascade = policy.parse()?;
        }
        if let Some(ms) = var("ULIMI_LOGIN_LATENCY_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| Error::InvalidInput(format!("ULIMI_LOGIN_LATENCY_MS must be a number, got '{}'", ms)))?;
            config.login_latency = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Defaults with no simulated latency. Handy for tests and scripted use.
    pub fn instant() -> Self {
        Config {
            login_latency: Duration::ZERO,
            ..Config::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.login_latency, Duration::from_secs(1));
    }

    #[test]
    fn test_env_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("ULIMI_DATA_DIR", "/tmp/ulimi"),
            ("ULIMI_INTEGRITY", "lenient"),
            ("ULIMI_CASCADE", "farm-id-only"),
            ("ULIMI_LOGIN_LATENCY_MS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/ulimi"));
        assert_eq!(config.integrity, ReferentialIntegrity::Lenient);
        assert_eq!(config.cascade, CascadePolicy::FarmIdOnly);
        assert_eq!(config.login_latency, Duration::ZERO);
    }

    #[test]
    fn test_bad_values_are_errors() {
        assert!(Config::from_lookup(lookup(&[("ULIMI_CASCADE", "sideways")])).is_err());
        assert!(Config::from_lookup(lookup(&[("ULIMI_LOGIN_LATENCY_MS", "soon")])).is_err());
    }

    #[test]
    fn test_empty_values_are_ignored() {
        let config = Config::from_lookup(lookup(&[("ULIMI_DATA_DIR", "")])).unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
    }
}
