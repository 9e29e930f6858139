use crate::client::models::Root;
use crate::client::MailchimpClient;
use crate::config::MailchimpConnectionConfig;
use anyhow::{Context, Result};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tablekit::cache::{ConnectionCache, MemoryCache, SingleFlight};
use tracing::{error, info};

const CLIENT_CACHE_KEY: &str = "mailchimp";
const ACCOUNT_CACHE_KEY: &str = "account";

/// One configured Mailchimp connection.
///
/// Holds the API client (built on first use and reused afterwards) and the
/// account identity, fetched at most once per connection.
pub struct MailchimpConnection {
    name: String,
    config: MailchimpConnectionConfig,
    clients: Arc<dyn ConnectionCache<Arc<MailchimpClient>>>,
    client_init: Mutex<()>,
    account: SingleFlight<Arc<Root>>,
}

impl MailchimpConnection {
    pub fn new(config: MailchimpConnectionConfig) -> Self {
        Self::with_caches(
            config,
            Arc::new(MemoryCache::<Arc<MailchimpClient>>::new()),
            Arc::new(MemoryCache::<Arc<Root>>::new()),
        )
    }

    /// Builds a connection on caller-supplied caches.
    pub fn with_caches(
        config: MailchimpConnectionConfig,
        clients: Arc<dyn ConnectionCache<Arc<MailchimpClient>>>,
        accounts: Arc<dyn ConnectionCache<Arc<Root>>>,
    ) -> Self {
        Self {
            name: config.name.clone(),
            config,
            clients,
            client_init: Mutex::new(()),
            account: SingleFlight::new(accounts),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The connection's API client, built on first call.
    pub fn client(&self) -> Result<Arc<MailchimpClient>> {
        if let Some(client) = self.clients.get(CLIENT_CACHE_KEY) {
            return Ok(client);
        }

        let _guard = self
            .client_init
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some(client) = self.clients.get(CLIENT_CACHE_KEY) {
            return Ok(client);
        }

        let client = self.build_client().inspect_err(|e| {
            error!(connection = %self.name, error = %e, "Failed to create Mailchimp client");
        })?;
        self.clients.set(CLIENT_CACHE_KEY, Arc::clone(&client));
        Ok(client)
    }

    fn build_client(&self) -> Result<Arc<MailchimpClient>> {
        let api_key = self.config.resolve_api_key()?;
        let base_url = self.config.resolve_base_url(&api_key)?;
        let client = MailchimpClient::new(
            api_key,
            &base_url,
            Duration::from_secs(self.config.timeout_secs),
        )?;
        info!(connection = %self.name, base_url = %base_url, "Created Mailchimp client");
        Ok(Arc::new(client))
    }

    /// Account details of the key's owner. Concurrent first callers share
    /// one request; a successful result is kept for the connection's life.
    pub async fn account(&self) -> Result<Arc<Root>> {
        let client = self.client()?;
        let name = self.name.clone();
        self.account
            .get_or_load(ACCOUNT_CACHE_KEY, move || async move {
                info!(connection = %name, "Fetching Mailchimp account");
                let root = client
                    .root()
                    .await
                    .context("Failed to fetch Mailchimp account")?;
                Ok(Arc::new(root))
            })
            .await
    }

    pub async fn account_id(&self) -> Result<String> {
        Ok(self.account().await?.account_id.clone())
    }
}
