use super::{AdlsConfig, LocalConfig, LogFormat, RuntimeConfig, StorageMode};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "COUNTYLAKE_";

/// Abstraction over environment-variable lookups so tests can supply
/// overrides without touching the process environment.
pub trait EnvSource {
    /// Get an environment variable with the COUNTYLAKE_ prefix
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the COUNTYLAKE_ prefix
    /// Used for the deployment's app settings (PIPELINE_STORAGE_MODE, ADLS_*, ...)
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Function app settings, unprefixed
    if let Some(mode) = get_raw_env_string(env, "PIPELINE_STORAGE_MODE") {
        config.storage.mode = mode
            .parse::<StorageMode>()
            .context("Invalid PIPELINE_STORAGE_MODE value")?;
    }
    // Local-dev fallback; an explicit ADLS_ACCOUNT_URL still wins
    if let Some(conn) = get_raw_env_string(env, "AZURE_STORAGE_CONNECTION_STRING") {
        apply_connection_string(ensure_adls(config), &conn)?;
    }
    if let Some(url) = get_raw_env_string(env, "ADLS_ACCOUNT_URL") {
        ensure_adls(config).account_url = url;
    }
    if let Some(file_system) = get_raw_env_string(env, "ADLS_FILE_SYSTEM") {
        ensure_adls(config).file_system = file_system;
    }
    if let Some(client_id) = get_raw_env_string(env, "AZURE_CLIENT_ID") {
        ensure_adls(config).client_id = Some(client_id);
    }
    // Also used as the local root prefix, so it lives on the storage section
    if let Some(base_path) = get_raw_env_string(env, "ADLS_BASE_PATH") {
        config.storage.base_path = base_path.trim_matches('/').to_string();
    }
    if let Some(date) = get_raw_env_string(env, "INGEST_DATE") {
        config.pipeline.ingest_date = Some(date);
    }

    // Prefixed overrides
    if let Some(root) = get_env_string(env, "LOCAL_ROOT") {
        ensure_local(config).root = root;
    }
    if let Some(val) = get_env_bool(env, "REQUIRE_FULL_COVERAGE")? {
        config.pipeline.require_full_coverage = val;
    }
    if let Some(row_group_size) = get_env_usize(env, "PARQUET_ROW_GROUP_SIZE")? {
        config.storage.parquet_row_group_size = row_group_size;
    }

    // Server configuration (listen addr, log level/format)
    if let Some(addr) = get_env_string(env, "LISTEN_ADDR") {
        config.server.listen_addr = addr;
    }
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.server.log_level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.server.log_format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }

    Ok(())
}

/// Fill account key and URL from an Azure storage connection string
/// (`DefaultEndpointsProtocol=https;AccountName=..;AccountKey=..;EndpointSuffix=..`)
fn apply_connection_string(adls: &mut AdlsConfig, conn: &str) -> Result<()> {
    let mut account_name = None;
    let mut protocol = "https";
    let mut suffix = "core.windows.net";
    for part in conn.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        // Keys are base64, so only split on the first '='
        let (key, value) = part.split_once('=').ok_or_else(|| {
            anyhow!("Malformed AZURE_STORAGE_CONNECTION_STRING segment '{}'", part)
        })?;
        match key {
            "AccountName" => account_name = Some(value),
            "AccountKey" => adls.account_key = Some(value.to_string()),
            "DefaultEndpointsProtocol" => protocol = value,
            "EndpointSuffix" => suffix = value,
            _ => {}
        }
    }
    let account_name =
        account_name.ok_or_else(|| anyhow!("AZURE_STORAGE_CONNECTION_STRING has no AccountName"))?;
    if adls.account_key.is_none() {
        return Err(anyhow!("AZURE_STORAGE_CONNECTION_STRING has no AccountKey"));
    }
    if adls.account_url.trim().is_empty() {
        adls.account_url = format!("{}://{}.dfs.{}", protocol, account_name, suffix);
    }
    Ok(())
}

fn ensure_adls(config: &mut RuntimeConfig) -> &mut AdlsConfig {
    config.storage.adls.get_or_insert_with(AdlsConfig::default)
}

fn ensure_local(config: &mut RuntimeConfig) -> &mut LocalConfig {
    config.storage.local.get_or_insert_with(LocalConfig::default)
}

/// Blank values count as unset
fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    non_empty(env.get(key))
}

fn get_raw_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    non_empty(env.get_raw(key))
}

fn get_env_usize<E: EnvSource>(env: &E, key: &str) -> Result<Option<usize>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = val
                .parse::<usize>()
                .map_err(|e| anyhow!("Failed to parse {}{}: {}", ENV_PREFIX, key, e))?;
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str) -> Result<Option<bool>> {
    match get_env_string(env, key) {
        Some(val) => {
            let parsed = match val.to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(anyhow!(
                        "Failed to parse {}{} (expected bool): {}",
                        ENV_PREFIX,
                        key,
                        val
                    ))
                }
            };
            Ok(Some(parsed))
        }
        None => Ok(None),
    }
}
