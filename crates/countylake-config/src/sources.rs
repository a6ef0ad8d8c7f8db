// Configuration source loading
//
// Priority order:
// 1. Environment variables
// 2. Config file path from COUNTYLAKE_CONFIG
// 3. Inline config content from COUNTYLAKE_CONFIG_CONTENT
// 4. Default config file (./countylake.toml)
// 5. Built-in defaults

use crate::env_overrides::{self, EnvSource, ENV_PREFIX};
use crate::*;
use anyhow::{Context, Result};
use std::env;
use std::path::Path;

const DEFAULT_CONFIG_FILE: &str = "./countylake.toml";

/// Load configuration using the given environment source.
pub fn load_config<E: EnvSource>(env: &E) -> Result<RuntimeConfig> {
    let mut config = load_from_file(env)?.unwrap_or_default();
    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

fn parse_file(path: &Path) -> Result<RuntimeConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn load_from_file<E: EnvSource>(env: &E) -> Result<Option<RuntimeConfig>> {
    if let Some(path) = env.get("CONFIG") {
        return parse_file(Path::new(&path)).map(Some);
    }

    if let Some(content) = env.get("CONFIG_CONTENT") {
        let config: RuntimeConfig = toml::from_str(&content).with_context(|| {
            format!("Failed to parse inline config from {}CONFIG_CONTENT", ENV_PREFIX)
        })?;
        return Ok(Some(config));
    }

    let default_path = Path::new(DEFAULT_CONFIG_FILE);
    if default_path.exists() {
        return parse_file(default_path).map(Some);
    }

    Ok(None)
}

/// Load configuration from a specific file path (for CLI --config flag).
/// Returns error if file doesn't exist or can't be parsed.
pub fn load_from_file_path<E: EnvSource>(path: impl AsRef<Path>, env: &E) -> Result<RuntimeConfig> {
    let mut config = parse_file(path.as_ref())?;
    env_overrides::apply_env_overrides(&mut config, env)?;
    config.validate()?;
    Ok(config)
}

/// Reads the process environment
pub struct StdEnvSource;

impl EnvSource for StdEnvSource {
    fn get(&self, key: &str) -> Option<String> {
        env::var(format!("{}{}", ENV_PREFIX, key)).ok()
    }

    fn get_raw(&self, key: &str) -> Option<String> {
        env::var(key).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env_overrides::tests::MapEnv;

    #[test]
    fn inline_content_then_env_overrides() {
        let env = MapEnv::with(&[
            (
                "COUNTYLAKE_CONFIG_CONTENT",
                "[pipeline]\ningest_date = \"2023-12-31\"\n\n[storage.local]\nroot = \"/srv/lake\"\n",
            ),
            ("INGEST_DATE", "2024-01-01"),
        ]);
        let config = load_config(&env).unwrap();
        assert_eq!(config.pipeline.ingest_date.as_deref(), Some("2024-01-01"));
        assert_eq!(config.storage.local.unwrap().root, "/srv/lake");
    }

    #[test]
    fn missing_config_file_is_error() {
        let env = MapEnv::with(&[("COUNTYLAKE_CONFIG", "/nonexistent/countylake.toml")]);
        let err = load_config(&env).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn invalid_toml_is_error() {
        let env = MapEnv::with(&[("COUNTYLAKE_CONFIG_CONTENT", "[storage\nmode=")]);
        assert!(load_config(&env).is_err());
    }

    #[test]
    fn explicit_file_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("countylake.toml");
        std::fs::write(&path, "[datasets]\ngold = \"custom.parquet\"\n").unwrap();

        let config = load_from_file_path(&path, &MapEnv::default()).unwrap();
        assert_eq!(config.datasets.gold, "custom.parquet");
    }
}
