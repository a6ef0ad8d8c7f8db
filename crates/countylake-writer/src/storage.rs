// OpenDAL-based object storage
//
// Two backends behind one async trait:
// - Local filesystem (development, tests, the `run` subcommand)
// - Azure Data Lake Storage Gen2 (deployed function)
//
// Every path handed to a store is container-relative
// (`{layer}/{dataset}/ingest_date=.../{file}`); the backend root absorbs the
// configured base path.

use async_trait::async_trait;
use bytes::Bytes;
use opendal::Operator;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

use countylake_config::{AdlsConfig, StorageConfig, StorageMode};

use crate::error::{read_error, write_error, PipelineError, Result};

/// Directory under the local root that holds in-flight writes
const ATOMIC_WRITE_DIR: &str = ".countylake-tmp";

/// Byte-level access to the lake
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Short backend name used in logs and the readiness probe
    fn backend(&self) -> &'static str;

    /// Read a whole object; `NotFound` when it does not exist
    async fn read_bytes(&self, path: &str) -> Result<Bytes>;

    /// Create or replace an object
    async fn write_bytes(&self, path: &str, data: Vec<u8>) -> Result<()>;

    async fn exists(&self, path: &str) -> Result<bool>;

    /// Verify the backend is reachable
    async fn probe(&self) -> Result<()>;
}

async fn read_with(operator: &Operator, path: &str) -> Result<Bytes> {
    let buffer = operator.read(path).await.map_err(|e| read_error(path, e))?;
    let bytes = buffer.to_bytes();
    debug!(path, bytes = bytes.len(), "Read object");
    Ok(bytes)
}

async fn write_with(operator: &Operator, path: &str, data: Vec<u8>) -> Result<()> {
    let len = data.len();
    operator
        .write(path, data)
        .await
        .map_err(|e| write_error(path, e))?;
    debug!(path, bytes = len, "Wrote object");
    Ok(())
}

async fn exists_with(operator: &Operator, path: &str) -> Result<bool> {
    // OpenDAL 0.54: stat() and check for NotFound
    match operator.stat(path).await {
        Ok(_) => Ok(true),
        Err(e) if e.kind() == opendal::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(PipelineError::storage_read(path, e)),
    }
}

async fn probe_with(operator: &Operator) -> Result<()> {
    operator
        .check()
        .await
        .map_err(|e| PipelineError::storage_read("/", e))
}

/// Local filesystem store
#[derive(Clone)]
pub struct LocalStore {
    operator: Operator,
}

impl LocalStore {
    /// Store rooted at `root/base_path`
    ///
    /// Writes are staged in a scratch directory under the root and renamed
    /// into place, so readers never observe a partial object.
    pub fn new(root: impl AsRef<Path>, base_path: &str) -> Result<Self> {
        let mut root = root.as_ref().to_path_buf();
        let base_path = base_path.trim_matches('/');
        if !base_path.is_empty() {
            root.push(base_path);
        }
        let root_str = root.to_str().ok_or_else(|| {
            PipelineError::invalid_config(format!(
                "local root '{}' is not valid UTF-8",
                root.display()
            ))
        })?;

        let builder = opendal::services::Fs::default()
            .root(root_str)
            .atomic_write_dir(&format!("{}/{}", root_str, ATOMIC_WRITE_DIR));

        let operator = Operator::new(builder)
            .map_err(|e| PipelineError::invalid_config(format!("local storage: {}", e)))?
            .finish();

        Ok(Self { operator })
    }
}

#[async_trait]
impl ObjectStore for LocalStore {
    fn backend(&self) -> &'static str {
        "local"
    }

    async fn read_bytes(&self, path: &str) -> Result<Bytes> {
        read_with(&self.operator, path).await
    }

    async fn write_bytes(&self, path: &str, data: Vec<u8>) -> Result<()> {
        write_with(&self.operator, path, data).await
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        exists_with(&self.operator, path).await
    }

    async fn probe(&self) -> Result<()> {
        probe_with(&self.operator).await
    }
}

/// Azure Data Lake Storage Gen2 store
///
/// Credentials come from the ambient Azure identity chain (managed identity,
/// workload identity or environment); `AZURE_CLIENT_ID` selects a
/// user-assigned identity. A shared account key, when configured, takes
/// precedence over the identity chain. Payloads are buffered and uploaded in one call.
#[derive(Clone)]
pub struct AdlsStore {
    operator: Operator,
}

impl AdlsStore {
    pub fn new(adls: &AdlsConfig, base_path: &str) -> Result<Self> {
        let account_name = adls.account_name().ok_or_else(|| {
            PipelineError::invalid_config(format!(
                "ADLS_ACCOUNT_URL '{}' does not name a storage account",
                adls.account_url
            ))
        })?;

        let mut builder = opendal::services::Azdls::default()
            .filesystem(&adls.file_system)
            .endpoint(adls.endpoint())
            .account_name(account_name)
            .root(&format!("/{}", base_path.trim_matches('/')));
        if let Some(key) = adls.account_key.as_deref() {
            builder = builder.account_key(key);
        }

        let operator = Operator::new(builder)
            .map_err(|e| PipelineError::invalid_config(format!("adls storage: {}", e)))?
            .finish();

        Ok(Self { operator })
    }
}

#[async_trait]
impl ObjectStore for AdlsStore {
    fn backend(&self) -> &'static str {
        "adls"
    }

    async fn read_bytes(&self, path: &str) -> Result<Bytes> {
        read_with(&self.operator, path).await
    }

    async fn write_bytes(&self, path: &str, data: Vec<u8>) -> Result<()> {
        write_with(&self.operator, path, data).await
    }

    async fn exists(&self, path: &str) -> Result<bool> {
        exists_with(&self.operator, path).await
    }

    async fn probe(&self) -> Result<()> {
        probe_with(&self.operator).await
    }
}

/// Open the store selected by the configuration
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn ObjectStore>> {
    match config.mode {
        StorageMode::Local => {
            let local = config.local.clone().unwrap_or_default();
            info!(root = %local.root, base_path = %config.base_path, "Using local filesystem storage");
            Ok(Arc::new(LocalStore::new(&local.root, &config.base_path)?))
        }
        StorageMode::Adls => {
            let adls = config.adls.as_ref().ok_or_else(|| {
                PipelineError::invalid_config(
                    "ADLS_ACCOUNT_URL and ADLS_FILE_SYSTEM are required when PIPELINE_STORAGE_MODE=adls",
                )
            })?;
            info!(
                account_url = %adls.account_url,
                file_system = %adls.file_system,
                base_path = %config.base_path,
                managed_identity = adls.client_id.is_some(),
                shared_key = adls.account_key.is_some(),
                "Using Azure Data Lake storage"
            );
            Ok(Arc::new(AdlsStore::new(adls, &config.base_path)?))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use countylake_config::LocalConfig;

    #[tokio::test]
    async fn test_local_round_trip_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "").unwrap();

        let path = "silver/housing_affordability/ingest_date=2024-01-01/x.parquet";
        store.write_bytes(path, b"PAR1".to_vec()).await.unwrap();

        assert!(store.exists(path).await.unwrap());
        assert_eq!(store.read_bytes(path).await.unwrap().as_ref(), b"PAR1");
        assert!(dir.path().join(path).is_file());
    }

    #[tokio::test]
    async fn test_local_missing_object_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "").unwrap();

        assert!(!store.exists("bronze/nope.csv").await.unwrap());
        let err = store.read_bytes("bronze/nope.csv").await.unwrap_err();
        assert_eq!(err.code().as_str(), "E001");
        assert!(err.to_string().contains("bronze/nope.csv"));
    }

    #[tokio::test]
    async fn test_local_overwrite_replaces_object() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "").unwrap();

        store.write_bytes("gold/a", b"first".to_vec()).await.unwrap();
        store.write_bytes("gold/a", b"second".to_vec()).await.unwrap();
        assert_eq!(store.read_bytes("gold/a").await.unwrap().as_ref(), b"second");
    }

    #[tokio::test]
    async fn test_local_failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::new(dir.path(), "").unwrap();
        // A regular file where a directory is needed
        std::fs::write(dir.path().join("gold"), b"x").unwrap();

        let err = store
            .write_bytes("gold/a/b.parquet", b"PAR1".to_vec())
            .await
            .unwrap_err();
        assert_eq!(err.code().as_str(), "E003");
        assert!(err.to_string().contains("gold/a/b.parquet"));

        assert!(!dir.path().join("gold/a/b.parquet").exists());
        assert!(!store.exists("gold/a/b.parquet").await.unwrap_or(false));
        let staging = dir.path().join(ATOMIC_WRITE_DIR);
        if staging.exists() {
            assert_eq!(std::fs::read_dir(&staging).unwrap().count(), 0);
        }
    }

    #[tokio::test]
    async fn test_base_path_prefixes_local_root() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig {
            base_path: "/lake/".to_string(),
            local: Some(LocalConfig {
                root: dir.path().to_string_lossy().into_owned(),
            }),
            ..StorageConfig::default()
        };
        let store = open_store(&config).unwrap();
        assert_eq!(store.backend(), "local");

        store.write_bytes("bronze/x.csv", b"a".to_vec()).await.unwrap();
        assert!(dir.path().join("lake/bronze/x.csv").is_file());
        store.probe().await.unwrap();
    }

    #[test]
    fn test_adls_mode_without_settings_is_config_error() {
        let config = StorageConfig {
            mode: StorageMode::Adls,
            adls: None,
            ..StorageConfig::default()
        };
        let err = open_store(&config).err().unwrap();
        assert_eq!(err.code().as_str(), "E006");
    }

    #[test]
    fn test_adls_store_builds_without_network() {
        let adls = AdlsConfig {
            account_url: "https://countylake.dfs.core.windows.net/".to_string(),
            file_system: "lake".to_string(),
            client_id: None,
            account_key: None,
        };
        let store = AdlsStore::new(&adls, "mvp").unwrap();
        assert_eq!(store.backend(), "adls");
    }

    #[test]
    fn test_adls_store_accepts_shared_key() {
        let adls = AdlsConfig {
            account_url: "https://countylake.dfs.core.windows.net".to_string(),
            file_system: "lake".to_string(),
            client_id: None,
            account_key: Some("c2VjcmV0".to_string()),
        };
        assert!(AdlsStore::new(&adls, "").is_ok());
    }
}
