use super::{log_failure, title_column};
use crate::client::models::Automation;
use crate::client::params::AutomationFilter;
use crate::connection::MailchimpConnection;
use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tablekit::fetch::{lookup, paginate, MappedSink, RowSink};
use tablekit::table::{Column, Hydrated, KeyColumn, Row, Table, TableDefinition};
use tablekit::QueryContext;

const TABLE: &str = "mailchimp_automation";

/// Classic automation workflows.
pub struct AutomationTable {
    connection: Arc<MailchimpConnection>,
    definition: TableDefinition,
}

impl AutomationTable {
    pub fn new(connection: Arc<MailchimpConnection>) -> Self {
        let definition = TableDefinition::new(
            TABLE,
            "Get a summary of an account's classic automations.",
        )
        .with_columns(vec![
            Column::string("id", "The unique identifier for the automation."),
            Column::timestamp("create_time", "The date and time the automation was created."),
            Column::int("emails_sent", "The total number of emails sent for the automation."),
            Column::timestamp("start_time", "The date and time the automation was started."),
            Column::string("status", "The current status of the automation."),
            Column::json("recipients", "List settings for the automation."),
            Column::json(
                "removed_subscribers",
                "A list of subscribers removed from the automation workflow.",
            )
            .hydrated(),
            Column::json("report_summary", "A summary of opens and clicks for sent campaigns."),
            Column::json("settings", "The settings for the automation workflow."),
            Column::json("tracking", "The tracking options for the automation."),
            Column::json("trigger_settings", "Available triggers for Automation workflows."),
            title_column("The title of the automation.", "settings.title"),
        ])
        .with_list_keys(vec![KeyColumn::optional("status")])
        .with_get_keys(vec![KeyColumn::required("id")]);
        Self {
            connection,
            definition,
        }
    }

    async fn row(&self, automation: Automation, ctx: &QueryContext) -> Result<Row> {
        let mut row = self.definition.build_row(&automation, Hydrated::new())?;
        if !self.definition.may_match(ctx, &row) {
            return Ok(row);
        }

        let mut hydrated = Hydrated::new();
        if ctx.wants_column("removed_subscribers") {
            let removed = self
                .connection
                .client()?
                .get_automation_removed_subscribers(&automation.id)
                .await
                .inspect_err(|e| log_failure(TABLE, "removed_subscribers", e))?;
            hydrated.insert("removed_subscribers", removed);
        }
        self.definition.hydrate(&mut row, hydrated);
        Ok(row)
    }
}

pub(crate) fn automation_filter(ctx: &QueryContext) -> AutomationFilter {
    AutomationFilter {
        status: ctx.equals_string("status"),
    }
}

#[async_trait]
impl Table for AutomationTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    async fn list(&self, ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()> {
        let client = self.connection.client()?;
        let filter = automation_filter(ctx);

        let client = &*client;
        let filter = &filter;
        let mut rows =
            MappedSink::new(sink, |automation: Automation| self.row(automation, ctx).boxed());
        paginate(ctx.limit, &mut rows, move |request| {
            client.list_automations(request, filter)
        })
        .await
        .inspect_err(|e| log_failure(TABLE, "list", e))
    }

    async fn get(&self, ctx: &QueryContext) -> Result<Option<Row>> {
        let id = ctx.equals_string("id").unwrap_or_default();
        let client = self.connection.client()?;
        let automation = lookup(&[id.as_str()], || client.get_automation(&id))
            .await
            .inspect_err(|e| log_failure(TABLE, "get", e))?;
        match automation {
            Some(automation) => self.row(automation, ctx).await.map(Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::test_support::{connection, query};
    use mockito::{Matcher, Server};
    use tablekit::Operator;

    #[tokio::test]
    async fn test_list_with_status_and_removed_subscribers() {
        let mut server = Server::new_async().await;
        let list = server
            .mock("GET", "/automations")
            .match_query(Matcher::UrlEncoded("status".into(), "sending".into()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"automations": [
                    {"id": "wf1", "status": "sending", "emails_sent": 12,
                     "settings": {"title": "Welcome series"}}
                ], "total_items": 1}"#,
            )
            .create_async()
            .await;
        let removed = server
            .mock("GET", "/automations/wf1/removed-subscribers")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"workflow_id": "wf1", "subscribers": [{"email_address": "gone@example.com"}]}"#,
            )
            .create_async()
            .await;

        let table = Arc::new(AutomationTable::new(connection(&server.url())));
        let ctx = QueryContext::new().with_qual("status", Operator::Eq, "sending");
        let rows = query(table, ctx).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Welcome series");
        assert_eq!(rows[0]["emails_sent"], 12);
        assert_eq!(
            rows[0]["removed_subscribers"][0]["email_address"],
            "gone@example.com"
        );
        list.assert_async().await;
        removed.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_skips_removed_subscribers_when_not_projected() {
        let mut server = Server::new_async().await;
        let _get = server
            .mock("GET", "/automations/wf1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "wf1", "status": "paused"}"#)
            .create_async()
            .await;
        let removed = server
            .mock("GET", "/automations/wf1/removed-subscribers")
            .expect(0)
            .create_async()
            .await;

        let table = Arc::new(AutomationTable::new(connection(&server.url())));
        let ctx = QueryContext::new()
            .with_qual("id", Operator::Eq, "wf1")
            .with_columns(["id", "status"]);
        let rows = query(table, ctx).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["status"], "paused");
        assert!(!rows[0].contains_key("removed_subscribers"));
        removed.assert_async().await;
    }
}
