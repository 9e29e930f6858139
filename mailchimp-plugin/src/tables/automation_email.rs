use super::{account_id_column, hydrate_account_id, log_failure, title_column};
use crate::client;
use crate::client::models::{Automation, AutomationEmail};
use crate::client::params::AutomationFilter;
use crate::connection::MailchimpConnection;
use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tablekit::fetch::{lookup, paginate, FanOutSink, NotFoundPredicate, RowSink};
use tablekit::table::{Column, Hydrated, KeyColumn, Row, Table, TableDefinition};
use tablekit::QueryContext;
use tracing::debug;

const TABLE: &str = "mailchimp_automation_email";

/// Emails of classic automation workflows.
///
/// Without a `workflow_id` qual every automation is listed and its emails
/// are fetched one workflow at a time. An unknown `workflow_id` yields no
/// rows.
pub struct AutomationEmailTable {
    connection: Arc<MailchimpConnection>,
    definition: TableDefinition,
    not_found: NotFoundPredicate,
}

impl AutomationEmailTable {
    pub fn new(connection: Arc<MailchimpConnection>) -> Self {
        let definition = TableDefinition::new(
            TABLE,
            "Get a summary of the emails in a classic automation workflow.",
        )
        .with_columns(vec![
            account_id_column(),
            Column::string("id", "A string that identifies the automation email."),
            Column::string("archive_url", "The link to the campaign's archive version."),
            Column::string("content_type", "How the campaign's content is put together."),
            Column::timestamp("create_time", "The date and time the campaign was created."),
            Column::int("emails_sent", "The total number of emails sent for this campaign."),
            Column::int("position", "The position of an automation email in a workflow."),
            Column::timestamp("send_time", "The date and time a campaign was sent."),
            Column::timestamp("start_time", "The date and time the campaign was started."),
            Column::string("status", "The current status of the automation email."),
            Column::string(
                "workflow_id",
                "A string that uniquely identifies an automation workflow.",
            ),
            Column::json("delay", "The delay settings for an automation email."),
            Column::json("recipients", "List settings for the campaign."),
            Column::json("report_summary", "A summary of opens and clicks for sent campaigns."),
            Column::json("settings", "Settings for the campaign."),
            Column::json("social_card", "The preview for the campaign."),
            Column::json("tracking", "The tracking options for a campaign."),
            Column::json("trigger_settings", "Available triggers for automation workflows."),
            title_column("The title of the automation email.", "settings.title"),
        ])
        .with_list_keys(vec![KeyColumn::optional("workflow_id")])
        .with_get_keys(vec![
            KeyColumn::required("id"),
            KeyColumn::required("workflow_id"),
        ]);
        Self {
            connection,
            definition,
            not_found: client::not_found(),
        }
    }

    async fn row(&self, email: AutomationEmail, ctx: &QueryContext) -> Result<Row> {
        let mut row = self.definition.build_row(&email, Hydrated::new())?;
        if !self.definition.may_match(ctx, &row) {
            return Ok(row);
        }

        let mut hydrated = Hydrated::new();
        hydrate_account_id(&self.connection, ctx, &mut hydrated).await?;
        self.definition.hydrate(&mut row, hydrated);
        Ok(row)
    }

    async fn workflow_rows(&self, workflow_id: &str, ctx: &QueryContext) -> Result<Vec<Row>> {
        let emails = self
            .connection
            .client()?
            .list_automation_emails(workflow_id)
            .await?;
        let mut rows = Vec::with_capacity(emails.len());
        for email in emails {
            rows.push(self.row(email, ctx).await?);
        }
        Ok(rows)
    }

    /// Emails of `workflow_id`, empty if the workflow does not exist.
    async fn existing_workflow_rows(
        &self,
        workflow_id: &str,
        ctx: &QueryContext,
    ) -> Result<Vec<Row>> {
        match self.workflow_rows(workflow_id, ctx).await {
            Err(e) if self.not_found.matches(&e) => {
                debug!(workflow_id = %workflow_id, "Workflow not found");
                Ok(Vec::new())
            }
            result => result,
        }
    }
}

#[async_trait]
impl Table for AutomationEmailTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    async fn list(&self, ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()> {
        if let Some(workflow_id) = ctx.equals_string("workflow_id") {
            let rows = self
                .existing_workflow_rows(&workflow_id, ctx)
                .await
                .inspect_err(|e| log_failure(TABLE, "list", e))?;
            for row in rows {
                if !sink.wants_more() {
                    break;
                }
                sink.emit(row).await?;
            }
            return Ok(());
        }

        let client = self.connection.client()?;
        let filter = AutomationFilter::default();

        let client = &*client;
        let filter = &filter;
        let mut emails = FanOutSink::new(sink, |automation: Automation| {
            async move { self.workflow_rows(&automation.id, ctx).await }.boxed()
        });
        // Parents are not limited; the row limit applies to emails.
        paginate(None, &mut emails, move |request| {
            client.list_automations(request, filter)
        })
        .await
        .inspect_err(|e| log_failure(TABLE, "list", e))
    }

    async fn get(&self, ctx: &QueryContext) -> Result<Option<Row>> {
        let id = ctx.equals_string("id").unwrap_or_default();
        let workflow_id = ctx.equals_string("workflow_id").unwrap_or_default();
        let client = self.connection.client()?;
        let email = lookup(&[id.as_str(), workflow_id.as_str()], || {
            client.get_automation_email(&workflow_id, &id)
        })
        .await
        .inspect_err(|e| log_failure(TABLE, "get", e))?;
        match email {
            Some(email) => self.row(email, ctx).await.map(Some),
            None => Ok(None),
        }
    }
}
