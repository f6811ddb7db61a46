use crate::config::{ClientConfig, ProviderConfig};
use crate::SessionError;
use async_trait::async_trait;
use skylink_schema::{ProviderContext, VAR_ENDPOINT_URL, VAR_PROFILE, VAR_REGION};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};
use tokio::sync::OnceCell;
use tracing::debug;

/// Call metadata that refines the client config, e.g. a per-resource region.
pub type Metadata = BTreeMap<String, String>;

/// Derives a fresh client config. Implementations may perform I/O.
#[async_trait]
pub trait ConfigLoader: Send + Sync {
    async fn derive(
        &self,
        ctx: &ProviderContext,
        metadata: &Metadata,
    ) -> Result<ClientConfig, SessionError>;
}

/// Supplies client configs to the engine.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn get_config(
        &self,
        ctx: &ProviderContext,
        metadata: &Metadata,
    ) -> Result<Arc<ClientConfig>, SessionError>;
}

/// Derives configs from the provider config file, letting provider context
/// variables and then call metadata override it.
#[derive(Debug, Clone, Default)]
pub struct FileConfigLoader {
    config: ProviderConfig,
}

impl FileConfigLoader {
    pub fn new(config: ProviderConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl ConfigLoader for FileConfigLoader {
    async fn derive(
        &self,
        ctx: &ProviderContext,
        metadata: &Metadata,
    ) -> Result<ClientConfig, SessionError> {
        let pick = |name: &str, file_value: Option<&str>| -> Option<String> {
            metadata
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .or_else(|| ctx.variable(name))
                .or(file_value)
                .map(str::to_owned)
        };

        let region = pick(VAR_REGION, self.config.aws.region.as_deref())
            .map(|r| r.to_lowercase())
            .ok_or(SessionError::MissingRegion {
                variable: VAR_REGION,
            })?;

        Ok(ClientConfig {
            region,
            profile: pick(VAR_PROFILE, self.config.aws.profile.as_deref()),
            endpoint_url: pick(VAR_ENDPOINT_URL, self.config.aws.endpoint_url.as_deref()),
            session_id: ctx.session().map(str::to_owned),
        })
    }
}

type Slot = Arc<OnceCell<Arc<ClientConfig>>>;

/// Session id and metadata, compared as a pair rather than joined into a
/// string, so no session id can collide with another session's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    session_id: String,
    metadata: Metadata,
}

impl CacheKey {
    fn new(session_id: &str, metadata: &Metadata) -> Self {
        Self {
            session_id: session_id.to_owned(),
            metadata: metadata.clone(),
        }
    }
}

/// Caches derived client configs per session and metadata.
///
/// Each cache key holds a once-cell, so concurrent callers sharing a key
/// wait on a single derivation. A failed derivation leaves the cell empty
/// and the next caller retries. Calls without a session id bypass the cache.
pub struct SessionConfigCache<L> {
    loader: L,
    entries: RwLock<HashMap<CacheKey, Slot>>,
}

impl<L: ConfigLoader> SessionConfigCache<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            entries: RwLock::new(HashMap::new()),
        }
    }

    fn slot(&self, key: CacheKey) -> Result<Slot, SessionError> {
        {
            let entries = self
                .entries
                .read()
                .map_err(|_| SessionError::LockPoisoned)?;
            if let Some(slot) = entries.get(&key) {
                return Ok(Arc::clone(slot));
            }
        }
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        Ok(Arc::clone(entries.entry(key).or_default()))
    }

    /// Drop every cached config of a session. Returns how many were removed.
    pub fn evict_session(&self, session_id: &str) -> Result<usize, SessionError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| SessionError::LockPoisoned)?;
        let before = entries.len();
        entries.retain(|key, _| key.session_id != session_id);
        Ok(before - entries.len())
    }

    /// Number of keys holding a derived config.
    pub fn cached_entries(&self) -> Result<usize, SessionError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| SessionError::LockPoisoned)?;
        Ok(entries.values().filter(|slot| slot.initialized()).count())
    }
}

#[async_trait]
impl<L: ConfigLoader> ConfigSource for SessionConfigCache<L> {
    async fn get_config(
        &self,
        ctx: &ProviderContext,
        metadata: &Metadata,
    ) -> Result<Arc<ClientConfig>, SessionError> {
        let Some(session) = ctx.session() else {
            debug!("no session id; deriving client config without caching");
            return Ok(Arc::new(self.loader.derive(ctx, metadata).await?));
        };

        let slot = self.slot(CacheKey::new(session, metadata))?;
        let config = slot
            .get_or_try_init(|| async {
                debug!("deriving client config for session {session} ({} metadata keys)", metadata.len());
                self.loader.derive(ctx, metadata).await.map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(config))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingLoader {
        calls: AtomicUsize,
        fail_first: bool,
    }

    impl CountingLoader {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                fail_first: false,
            }
        }
    }

    #[async_trait]
    impl ConfigLoader for CountingLoader {
        async fn derive(
            &self,
            ctx: &ProviderContext,
            metadata: &Metadata,
        ) -> Result<ClientConfig, SessionError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail_first && n == 0 {
                return Err(SessionError::Derivation("credentials expired".to_owned()));
            }
            let mut config = ClientConfig::new(
                metadata
                    .get(VAR_REGION)
                    .map_or("us-east-1", String::as_str),
            );
            config.session_id = ctx.session().map(str::to_owned);
            Ok(config)
        }
    }

    fn session(id: &str) -> ProviderContext {
        ProviderContext::new().with_session(id)
    }

    fn metadata(pairs: &[(&str, &str)]) -> Metadata {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    #[test]
    fn cache_key_ignores_metadata_insertion_order() {
        let a = metadata(&[("region", "eu-west-1"), ("profile", "p")]);
        let b = metadata(&[("profile", "p"), ("region", "eu-west-1")]);
        assert_eq!(CacheKey::new("s1", &a), CacheKey::new("s1", &b));
        assert_ne!(CacheKey::new("s1", &a), CacheKey::new("s1", &Metadata::new()));
    }

    #[tokio::test]
    async fn separator_characters_do_not_merge_keys() {
        let cache = SessionConfigCache::new(CountingLoader::new());
        cache.get_config(&session("a|x=1"), &Metadata::new()).await.unwrap();
        cache
            .get_config(&session("a"), &metadata(&[("x", "1")]))
            .await
            .unwrap();
        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_entries().unwrap(), 2);

        assert_eq!(cache.evict_session("a").unwrap(), 1);
        assert_eq!(cache.cached_entries().unwrap(), 1);
        cache.get_config(&session("a|x=1"), &Metadata::new()).await.unwrap();
        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_derive_once_per_key() {
        let cache = Arc::new(SessionConfigCache::new(CountingLoader::new()));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let cache = Arc::clone(&cache);
            handles.push(tokio::spawn(async move {
                cache
                    .get_config(&session("deploy-1"), &Metadata::new())
                    .await
            }));
        }

        let mut configs = Vec::new();
        for handle in handles {
            configs.push(handle.await.unwrap().unwrap());
        }

        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 1);
        assert!(configs.iter().all(|c| Arc::ptr_eq(c, &configs[0])));
        assert_eq!(configs[0].session_id.as_deref(), Some("deploy-1"));
        assert_eq!(cache.cached_entries().unwrap(), 1);
    }

    #[tokio::test]
    async fn distinct_metadata_gets_distinct_entries() {
        let cache = SessionConfigCache::new(CountingLoader::new());
        let mut eu = Metadata::new();
        eu.insert(VAR_REGION.to_owned(), "eu-west-2".to_owned());

        let default = cache.get_config(&session("s"), &Metadata::new()).await.unwrap();
        let regional = cache.get_config(&session("s"), &eu).await.unwrap();

        assert_eq!(default.region, "us-east-1");
        assert_eq!(regional.region, "eu-west-2");
        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_entries().unwrap(), 2);
    }

    #[tokio::test]
    async fn missing_session_bypasses_cache() {
        let cache = SessionConfigCache::new(CountingLoader::new());
        let ctx = ProviderContext::new();
        cache.get_config(&ctx, &Metadata::new()).await.unwrap();
        cache.get_config(&ctx, &Metadata::new()).await.unwrap();
        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.cached_entries().unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_derivation_is_retried() {
        let cache = SessionConfigCache::new(CountingLoader {
            calls: AtomicUsize::new(0),
            fail_first: true,
        });
        let err = cache
            .get_config(&session("s"), &Metadata::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Derivation(_)));

        let config = cache.get_config(&session("s"), &Metadata::new()).await.unwrap();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn evict_session_only_drops_that_session() {
        let cache = SessionConfigCache::new(CountingLoader::new());
        cache.get_config(&session("a"), &Metadata::new()).await.unwrap();
        cache.get_config(&session("ab"), &Metadata::new()).await.unwrap();

        assert_eq!(cache.evict_session("a").unwrap(), 1);
        assert_eq!(cache.cached_entries().unwrap(), 1);

        cache.get_config(&session("a"), &Metadata::new()).await.unwrap();
        assert_eq!(cache.loader.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn file_loader_applies_override_precedence() {
        let mut file = ProviderConfig::default();
        file.aws.region = Some("us-east-1".to_owned());
        file.aws.profile = Some("file-profile".to_owned());
        let loader = FileConfigLoader::new(file);

        let ctx = ProviderContext::new()
            .with_session("s")
            .with_variable(VAR_REGION, "eu-west-1")
            .with_variable(VAR_ENDPOINT_URL, "http://localhost:4566");
        let mut metadata = Metadata::new();
        metadata.insert(VAR_REGION.to_owned(), "AP-SOUTHEAST-2".to_owned());

        let config = loader.derive(&ctx, &metadata).await.unwrap();
        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(config.profile.as_deref(), Some("file-profile"));
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:4566"));
        assert_eq!(config.session_id.as_deref(), Some("s"));

        let from_ctx = loader.derive(&ctx, &Metadata::new()).await.unwrap();
        assert_eq!(from_ctx.region, "eu-west-1");
    }

    #[tokio::test]
    async fn file_loader_requires_a_region() {
        let loader = FileConfigLoader::default();
        let err = loader
            .derive(&ProviderContext::new(), &Metadata::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::MissingRegion { .. }));
    }
}
