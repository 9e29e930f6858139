use super::{account_id_column, hydrate_account_id, log_failure, title_column};
use crate::client::models::Campaign;
use crate::client::params::CampaignFilter;
use crate::connection::MailchimpConnection;
use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tablekit::fetch::{lookup, paginate, MappedSink, RowSink};
use tablekit::query::TimeFormat;
use tablekit::table::{Column, Hydrated, KeyColumn, Row, Table, TableDefinition};
use tablekit::QueryContext;

const TABLE: &str = "mailchimp_campaign";

pub struct CampaignTable {
    connection: Arc<MailchimpConnection>,
    definition: TableDefinition,
}

impl CampaignTable {
    pub fn new(connection: Arc<MailchimpConnection>) -> Self {
        let definition = TableDefinition::new(TABLE, "Mailchimp Campaign.")
            .with_columns(vec![
                account_id_column(),
                Column::string("id", "A string that uniquely identifies this campaign."),
                Column::string("archive_url", "The link to the campaign's archive version."),
                Column::string("content_type", "How the campaign's content is put together."),
                Column::timestamp("create_time", "The date and time the campaign was created."),
                Column::bool("delivery_status_enabled", "Updates on campaigns in the process of sending.")
                    .from_field("delivery_status.enabled"),
                Column::int("emails_sent", "The total number of emails sent for this campaign."),
                Column::string("long_archive_url", "The original link to the campaign's archive version."),
                Column::bool(
                    "needs_block_refresh",
                    "Determines if the campaign needs its blocks refreshed by opening the web-based campaign editor.",
                ),
                Column::timestamp("send_time", "The date and time a campaign was sent."),
                Column::string("status", "The current status of the campaign."),
                Column::string("type", "Type of the campaign."),
                Column::int("web_id", "The ID used in the Mailchimp web application."),
                Column::json(
                    "campaign_content",
                    "The HTML, plain-text, and template content for the campaign.",
                )
                .hydrated(),
                Column::json("recipients", "List settings for the campaign."),
                Column::json(
                    "report_summary",
                    "For sent campaigns, a summary of opens, clicks, and e-commerce data.",
                ),
                Column::json(
                    "settings",
                    "Settings for the campaign including the subject line, from name, reply-to address, and more.",
                ),
                Column::json("tracking", "The tracking options for a campaign."),
                title_column("The title of the campaign.", "settings.title"),
            ])
            .with_list_keys(vec![
                KeyColumn::range("create_time"),
                KeyColumn::range("send_time"),
                KeyColumn::optional("status"),
                KeyColumn::optional("type"),
            ])
            .with_get_keys(vec![KeyColumn::required("id"), KeyColumn::optional("status")]);
        Self {
            connection,
            definition,
        }
    }

    async fn row(&self, campaign: Campaign, ctx: &QueryContext) -> Result<Row> {
        let mut row = self.definition.build_row(&campaign, Hydrated::new())?;
        if !self.definition.may_match(ctx, &row) {
            return Ok(row);
        }

        let mut hydrated = Hydrated::new();
        if ctx.wants_column("campaign_content") {
            let content = self
                .connection
                .client()?
                .get_campaign_content(&campaign.id)
                .await
                .inspect_err(|e| log_failure(TABLE, "campaign_content", e))?;
            hydrated.insert("campaign_content", content);
        }
        hydrate_account_id(&self.connection, ctx, &mut hydrated).await?;
        self.definition.hydrate(&mut row, hydrated);
        Ok(row)
    }
}

/// Server-side filters for the campaign list.
pub(crate) fn campaign_filter(ctx: &QueryContext) -> CampaignFilter {
    let created = ctx.time_range("create_time");
    let sent = ctx.time_range("send_time");
    CampaignFilter {
        status: ctx.equals_string("status"),
        campaign_type: ctx.equals_string("type"),
        since_create_time: created.since_param(TimeFormat::Rfc3339),
        before_create_time: created.before_param(TimeFormat::Rfc3339),
        since_send_time: sent.since_param(TimeFormat::Rfc3339),
        before_send_time: sent.before_param(TimeFormat::Rfc3339),
    }
}

#[async_trait]
impl Table for CampaignTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    async fn list(&self, ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()> {
        let client = self.connection.client()?;
        let filter = campaign_filter(ctx);

        let client = &*client;
        let filter = &filter;
        let mut rows = MappedSink::new(sink, |campaign: Campaign| self.row(campaign, ctx).boxed());
        paginate(ctx.limit, &mut rows, move |request| {
            client.list_campaigns(request, filter)
        })
        .await
        .inspect_err(|e| log_failure(TABLE, "list", e))
    }

    async fn get(&self, ctx: &QueryContext) -> Result<Option<Row>> {
        let id = ctx.equals_string("id").unwrap_or_default();
        let client = self.connection.client()?;
        let campaign = lookup(&[id.as_str()], || client.get_campaign(&id))
            .await
            .inspect_err(|e| log_failure(TABLE, "get", e))?;
        match campaign {
            Some(campaign) => self.row(campaign, ctx).await.map(Some),
            None => Ok(None),
        }
    }
}
