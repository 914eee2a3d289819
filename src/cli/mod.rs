pub mod add_cmd;
pub mod analyze_cmd;
pub mod config_cmd;
pub mod keywords_cmd;
pub mod output;
pub mod quota_cmd;
pub mod renderer;
pub mod saved_cmd;
pub mod search_cmd;

use std::sync::Arc;

use anyhow::{bail, Context};

use crate::core::config::AppConfig;
use crate::core::orchestrator::Orchestrator;
use crate::core::provider::{KeywordServiceClient, YoutubeClient};
use crate::core::quota::{JsonLedgerStore, QuotaTracker, RotationPolicy};
use crate::core::store::SupabaseStore;

/// Shared wiring for every command that talks to the provider: config,
/// HTTP client, and the quota tracker bound to its state file.
pub struct AppContext {
    pub config: AppConfig,
    pub api: Arc<YoutubeClient>,
    pub tracker: Arc<QuotaTracker>,
    pub policy: RotationPolicy,
}

impl AppContext {
    pub fn init() -> anyhow::Result<Self> {
        let config = AppConfig::load().context("failed to load config")?;
        if config.api_keys.is_empty() {
            bail!(
                "no API keys configured; add api_keys to {}",
                AppConfig::config_path().display()
            );
        }
        let api = Arc::new(
            YoutubeClient::new(config.endpoints.youtube_api_base.clone())
                .context("failed to build HTTP client")?,
        );
        let store = JsonLedgerStore::new(JsonLedgerStore::default_path());
        let tracker = Arc::new(
            QuotaTracker::load(Box::new(store), config.api_keys.len())
                .context("failed to load quota ledger")?,
        );
        let policy = RotationPolicy::new(config.quota.daily_limit, config.quota.switch_threshold);
        Ok(Self {
            config,
            api,
            tracker,
            policy,
        })
    }

    pub fn orchestrator(&self) -> Orchestrator<YoutubeClient> {
        Orchestrator::new(
            Arc::clone(&self.api),
            Arc::clone(&self.tracker),
            self.policy,
            self.config.api_keys.clone(),
            self.config.region_code.clone(),
        )
    }

    /// Persistence adapter, when the store is configured.
    pub fn store(&self) -> anyhow::Result<Option<SupabaseStore>> {
        if !self.config.store.is_configured() {
            return Ok(None);
        }
        let url = self.config.store.url.as_deref().unwrap_or_default();
        let key = self.config.store.api_key.as_deref().unwrap_or_default();
        Ok(Some(
            SupabaseStore::new(url, key).context("failed to build store client")?,
        ))
    }

    pub fn store_required(&self) -> anyhow::Result<SupabaseStore> {
        match self.store()? {
            Some(store) => Ok(store),
            None => bail!(
                "store is not configured; set store.url and store.api_key in {}",
                AppConfig::config_path().display()
            ),
        }
    }

    pub fn suggestion_client(&self) -> anyhow::Result<KeywordServiceClient> {
        KeywordServiceClient::new(
            self.config.endpoints.keyword_api.clone(),
            self.config.endpoints.trends_api.clone(),
            self.config.endpoints.related_api.clone(),
        )
        .context("failed to build keyword service client")
    }
}
