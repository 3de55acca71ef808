//! Opening and persisting the file-backed storage tiers.

use std::{path::PathBuf, sync::Arc, time::Duration};

use transitpay::{
    Portal,
    cache::InMemoryCache,
    remote::{InMemoryRemote, RemoteStore},
    sync::SyncConfig,
};

use crate::cli::StoreArgs;

const CACHE_FILE: &str = "cache.json";
const REMOTE_FILE: &str = "remote.json";

/// A portal over `cache.json` and, unless offline, `remote.json`.
pub struct Store {
    pub portal: Portal,
    cache: Arc<InMemoryCache>,
    remote: Option<Arc<InMemoryRemote>>,
    data_dir: PathBuf,
}

impl Store {
    pub async fn open(args: &StoreArgs) -> Result<Self, Box<dyn std::error::Error>> {
        std::fs::create_dir_all(&args.data_dir)?;

        let cache_path = args.data_dir.join(CACHE_FILE);
        let cache = Arc::new(InMemoryCache::load_from_file(&cache_path)?);
        tracing::debug!("Loaded {} cache entries from {}", cache.len(), cache_path.display());

        let remote = if args.offline {
            tracing::info!("Offline: remote store disabled");
            None
        } else {
            let remote = InMemoryRemote::load_from_file(args.data_dir.join(REMOTE_FILE))?;
            Some(Arc::new(remote))
        };

        let config = SyncConfig {
            registry_timeout: Duration::from_millis(args.registry_timeout_ms),
            ..Default::default()
        };
        let portal = Portal::open(
            cache.clone(),
            remote.clone().map(|r| r as Arc<dyn RemoteStore>),
            config,
        );
        Ok(Self {
            portal,
            cache,
            remote,
            data_dir: args.data_dir.clone(),
        })
    }

    /// Push pending writes and save both tiers to disk.
    pub async fn close(self) -> Result<(), Box<dyn std::error::Error>> {
        if let Err(e) = self.portal.flush().await {
            tracing::warn!("Pending remote writes not flushed: {e}");
        }
        self.cache.save_to_file(self.data_dir.join(CACHE_FILE))?;
        if let Some(remote) = &self.remote {
            remote.save_to_file(self.data_dir.join(REMOTE_FILE)).await?;
        }
        Ok(())
    }
}
