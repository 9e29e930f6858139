//! Query-string filters of the list endpoints.

use serde::Serialize;

/// For endpoints without filters.
pub const NO_FILTERS: &[(&str, &str)] = &[];

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CampaignFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub campaign_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_create_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_send_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_send_time: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_date_created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_date_created: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TemplateFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub template_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since_date_created: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub before_date_created: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AutomationFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}
