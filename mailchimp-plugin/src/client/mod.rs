//! HTTP client for the Mailchimp Marketing API (v3).
//!
//! Authenticates with HTTP Basic auth (any user name, the API key as the
//! password). List endpoints are offset-paginated with `count`/`offset`
//! and report `total_items` next to the collection.

use anyhow::{anyhow, Context, Result};
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tablekit::fetch::{NotFoundPredicate, Page, PageRequest};
use tracing::debug;

pub mod models;
pub mod params;

use models::{
    ApiErrorBody, AuthorizedApp, Automation, AutomationEmail, AutomationQueue,
    AutomationQueueEntry, BatchOperation, Campaign, Folder, List, Root, Store, Template,
};
use params::{AutomationFilter, CampaignFilter, ListFilter, TemplateFilter, NO_FILTERS};

const USER_AGENT: &str = "mailchimp-plugin/0.1";
const AUTH_USER: &str = "mailchimp-plugin";

#[derive(Deserialize)]
struct AutomationEmails {
    #[serde(default)]
    emails: Vec<AutomationEmail>,
}

#[derive(Deserialize)]
struct RemovedSubscribers {
    #[serde(default)]
    subscribers: Value,
}

pub struct MailchimpClient {
    api_key: String,
    http_client: Client,
    base_url: Url,
}

impl MailchimpClient {
    pub fn new(api_key: String, base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid Mailchimp base URL: {}", base_url))?;
        let http_client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            api_key,
            http_client,
            base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL with `segments` appended; each segment is percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        if segments.is_empty() {
            return Ok(url);
        }
        url.path_segments_mut()
            .map_err(|_| anyhow!("Invalid Mailchimp base URL: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// GET a single JSON document.
    pub async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.url(segments)?;
        debug!(url = %url, "Mailchimp GET");
        let response = self
            .http_client
            .get(url.clone())
            .basic_auth(AUTH_USER, Some(&self.api_key))
            .send()
            .await
            .with_context(|| format!("Failed to send request to {}", url.path()))?;

        let response = check_response(response).await?;
        response
            .json::<T>()
            .await
            .with_context(|| format!("Failed to parse response from {}", url.path()))
    }

    /// GET one page of the collection `collection` at `segments`.
    pub async fn list_page<T, Q>(
        &self,
        segments: &[&str],
        collection: &str,
        request: PageRequest,
        filters: &Q,
    ) -> Result<Page<T>>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        let url = self.url(segments)?;
        debug!(
            url = %url,
            offset = request.offset,
            count = request.page_size,
            "Mailchimp list"
        );
        let response = self
            .http_client
            .get(url.clone())
            .basic_auth(AUTH_USER, Some(&self.api_key))
            .query(&[
                ("count", u64::from(request.page_size)),
                ("offset", request.offset),
            ])
            .query(filters)
            .send()
            .await
            .with_context(|| format!("Failed to send {} request", collection))?;

        let response = check_response(response).await?;
        let mut body: Value = response
            .json()
            .await
            .with_context(|| format!("Failed to parse {} response", collection))?;

        let total_items = body
            .get("total_items")
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let items = match body.get_mut(collection).map(Value::take) {
            Some(items) => serde_json::from_value(items)
                .with_context(|| format!("Failed to parse {} items", collection))?,
            None => Vec::new(),
        };
        Ok(Page::new(items, total_items))
    }

    /// Account details of the key's owner.
    pub async fn root(&self) -> Result<Root> {
        self.get_json(&[]).await
    }

    pub async fn list_campaigns(
        &self,
        request: PageRequest,
        filter: &CampaignFilter,
    ) -> Result<Page<Campaign>> {
        self.list_page(&["campaigns"], "campaigns", request, filter)
            .await
    }

    pub async fn get_campaign(&self, id: &str) -> Result<Campaign> {
        self.get_json(&["campaigns", id]).await
    }

    pub async fn get_campaign_content(&self, id: &str) -> Result<Value> {
        self.get_json(&["campaigns", id, "content"]).await
    }

    pub async fn list_campaign_folders(&self, request: PageRequest) -> Result<Page<Folder>> {
        self.list_page(&["campaign-folders"], "folders", request, NO_FILTERS)
            .await
    }

    pub async fn list_lists(&self, request: PageRequest, filter: &ListFilter) -> Result<Page<List>> {
        self.list_page(&["lists"], "lists", request, filter).await
    }

    pub async fn get_list(&self, id: &str) -> Result<List> {
        self.get_json(&["lists", id]).await
    }

    pub async fn list_templates(
        &self,
        request: PageRequest,
        filter: &TemplateFilter,
    ) -> Result<Page<Template>> {
        self.list_page(&["templates"], "templates", request, filter)
            .await
    }

    pub async fn get_template(&self, id: i64) -> Result<Template> {
        let id = id.to_string();
        self.get_json(&["templates", id.as_str()]).await
    }

    pub async fn get_template_default_content(&self, id: i64) -> Result<Value> {
        let id = id.to_string();
        self.get_json(&["templates", id.as_str(), "default-content"]).await
    }

    pub async fn list_template_folders(&self, request: PageRequest) -> Result<Page<Folder>> {
        self.list_page(&["template-folders"], "folders", request, NO_FILTERS)
            .await
    }

    pub async fn list_automations(
        &self,
        request: PageRequest,
        filter: &AutomationFilter,
    ) -> Result<Page<Automation>> {
        self.list_page(&["automations"], "automations", request, filter)
            .await
    }

    pub async fn get_automation(&self, id: &str) -> Result<Automation> {
        self.get_json(&["automations", id]).await
    }

    pub async fn get_automation_removed_subscribers(&self, id: &str) -> Result<Value> {
        let body: RemovedSubscribers = self
            .get_json(&["automations", id, "removed-subscribers"])
            .await?;
        Ok(body.subscribers)
    }

    /// Emails of one workflow. The endpoint is not paginated.
    pub async fn list_automation_emails(&self, workflow_id: &str) -> Result<Vec<AutomationEmail>> {
        let body: AutomationEmails = self
            .get_json(&["automations", workflow_id, "emails"])
            .await?;
        Ok(body.emails)
    }

    pub async fn get_automation_email(
        &self,
        workflow_id: &str,
        email_id: &str,
    ) -> Result<AutomationEmail> {
        self.get_json(&["automations", workflow_id, "emails", email_id])
            .await
    }

    pub async fn list_automation_queue(
        &self,
        workflow_id: &str,
        email_id: &str,
    ) -> Result<AutomationQueue> {
        self.get_json(&["automations", workflow_id, "emails", email_id, "queue"])
            .await
    }

    pub async fn get_automation_queue_entry(
        &self,
        workflow_id: &str,
        email_id: &str,
        id: &str,
    ) -> Result<AutomationQueueEntry> {
        self.get_json(&["automations", workflow_id, "emails", email_id, "queue", id])
            .await
    }

    pub async fn list_batches(&self, request: PageRequest) -> Result<Page<BatchOperation>> {
        self.list_page(&["batches"], "batches", request, NO_FILTERS)
            .await
    }

    pub async fn get_batch(&self, id: &str) -> Result<BatchOperation> {
        self.get_json(&["batches", id]).await
    }

    pub async fn list_authorized_apps(&self, request: PageRequest) -> Result<Page<AuthorizedApp>> {
        self.list_page(&["authorized-apps"], "apps", request, NO_FILTERS)
            .await
    }

    pub async fn get_authorized_app(&self, id: i64) -> Result<AuthorizedApp> {
        let id = id.to_string();
        self.get_json(&["authorized-apps", id.as_str()]).await
    }

    pub async fn list_stores(&self, request: PageRequest) -> Result<Page<Store>> {
        self.list_page(&["ecommerce", "stores"], "stores", request, NO_FILTERS)
            .await
    }

    pub async fn get_store(&self, id: &str) -> Result<Store> {
        self.get_json(&["ecommerce", "stores", id]).await
    }
}

/// Maps non-2xx responses to descriptive errors carrying the status code
/// and the API's `detail` message.
///
/// - 401 → auth error (API key invalid or revoked)
/// - 404 → resource not found
/// - 429 → rate limited
/// - Other non-2xx → generic API error
/// Non-2xx answer from the Mailchimp API.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub detail: String,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            StatusCode::UNAUTHORIZED => write!(
                f,
                "Mailchimp auth error: API key invalid or revoked (401): {}",
                self.detail
            ),
            StatusCode::NOT_FOUND => {
                write!(f, "Mailchimp resource not found (404): {}", self.detail)
            }
            StatusCode::TOO_MANY_REQUESTS => {
                write!(f, "Mailchimp rate limit exceeded (429): {}", self.detail)
            }
            s => write!(f, "Mailchimp API error: {}: {}", s, self.detail),
        }
    }
}

impl std::error::Error for ApiError {}

/// True if the API answered 404 somewhere in the error chain.
pub fn is_not_found(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<ApiError>())
        .any(|api| api.status == StatusCode::NOT_FOUND)
}

/// Not-found predicate for the registry and the fan-out tables.
pub fn not_found() -> NotFoundPredicate {
    NotFoundPredicate::from_fn(is_not_found)
}

async fn check_response(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.json::<ApiErrorBody>().await.unwrap_or_default();
    let detail = body
        .detail
        .or(body.title)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown error").to_string());
    Err(ApiError { status, detail }.into())
}
