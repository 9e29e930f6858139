//! Response payloads of the Mailchimp Marketing API.
//!
//! Only the fields the tables expose are modelled. Nested objects the
//! tables surface as JSON columns stay untyped [`Value`]s.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Account details returned by `GET /`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Root {
    pub account_id: String,
    pub account_name: Option<String>,
    pub email: Option<String>,
    pub last_login: Option<String>,
    pub pro_enabled: Option<bool>,
    pub role: Option<String>,
    pub total_subscribers: Option<i64>,
    pub contact: Value,
    pub industry_stats: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Campaign {
    pub id: String,
    pub web_id: Option<i64>,
    #[serde(rename = "type")]
    pub campaign_type: Option<String>,
    pub create_time: Option<String>,
    pub archive_url: Option<String>,
    pub long_archive_url: Option<String>,
    pub status: Option<String>,
    pub emails_sent: Option<i64>,
    pub send_time: Option<String>,
    pub content_type: Option<String>,
    pub needs_block_refresh: Option<bool>,
    pub delivery_status: Value,
    pub recipients: Value,
    pub settings: Value,
    pub tracking: Value,
    pub report_summary: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct List {
    pub id: String,
    pub web_id: Option<i64>,
    pub name: Option<String>,
    pub permission_reminder: Option<String>,
    pub use_archive_bar: Option<bool>,
    pub notify_on_subscribe: Option<String>,
    pub notify_on_unsubscribe: Option<String>,
    pub date_created: Option<String>,
    pub list_rating: Option<i64>,
    pub email_type_option: Option<bool>,
    pub subscribe_url_short: Option<String>,
    pub subscribe_url_long: Option<String>,
    pub beamer_address: Option<String>,
    pub visibility: Option<String>,
    pub contact: Value,
    pub campaign_defaults: Value,
    pub modules: Value,
    pub stats: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Template {
    pub id: i64,
    #[serde(rename = "type")]
    pub template_type: Option<String>,
    pub name: Option<String>,
    pub drag_and_drop: Option<bool>,
    pub responsive: Option<bool>,
    pub category: Option<String>,
    pub date_created: Option<String>,
    pub created_by: Option<String>,
    pub active: Option<bool>,
    pub folder_id: Option<String>,
    pub thumbnail: Option<String>,
    pub share_url: Option<String>,
}

/// Campaign or template folder.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Folder {
    pub id: String,
    pub name: Option<String>,
    pub count: Option<i64>,
}

/// Classic automation workflow.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Automation {
    pub id: String,
    pub create_time: Option<String>,
    pub start_time: Option<String>,
    pub status: Option<String>,
    pub emails_sent: Option<i64>,
    pub recipients: Value,
    pub settings: Value,
    pub tracking: Value,
    pub trigger_settings: Value,
    pub report_summary: Value,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationEmail {
    pub id: String,
    pub workflow_id: Option<String>,
    pub position: Option<i64>,
    pub create_time: Option<String>,
    pub start_time: Option<String>,
    pub archive_url: Option<String>,
    pub status: Option<String>,
    pub emails_sent: Option<i64>,
    pub send_time: Option<String>,
    pub content_type: Option<String>,
    pub delay: Value,
    pub recipients: Value,
    pub settings: Value,
    pub social_card: Value,
    pub tracking: Value,
    pub trigger_settings: Value,
    pub report_summary: Value,
}

/// Subscriber waiting in an automation email queue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomationQueueEntry {
    pub id: String,
    pub workflow_id: Option<String>,
    pub email_id: Option<String>,
    pub list_id: Option<String>,
    pub email_address: Option<String>,
    pub next_send: Option<String>,
}

/// `GET /automations/{workflow_id}/emails/{email_id}/queue`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AutomationQueue {
    pub workflow_id: Option<String>,
    pub email_id: Option<String>,
    pub queue: Vec<AutomationQueueEntry>,
    pub total_items: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchOperation {
    pub id: String,
    pub status: Option<String>,
    pub total_operations: Option<i64>,
    pub finished_operations: Option<i64>,
    pub errored_operations: Option<i64>,
    pub submitted_at: Option<String>,
    pub completed_at: Option<String>,
    pub response_body_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthorizedApp {
    pub id: i64,
    pub name: Option<String>,
    pub description: Option<String>,
    pub users: Value,
}

/// E-commerce store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    pub id: String,
    pub list_id: Option<String>,
    pub name: Option<String>,
    pub platform: Option<String>,
    pub domain: Option<String>,
    pub email_address: Option<String>,
    pub currency_code: Option<String>,
    pub money_format: Option<String>,
    pub primary_locale: Option<String>,
    pub timezone: Option<String>,
    pub phone: Option<String>,
    pub address: Value,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Error document Mailchimp returns with non-2xx responses.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ApiErrorBody {
    pub title: Option<String>,
    pub detail: Option<String>,
}
