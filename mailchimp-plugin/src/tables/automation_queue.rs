use super::{log_failure, title_column};
use crate::client;
use crate::client::models::{Automation, AutomationQueueEntry};
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

const TABLE: &str = "mailchimp_automation_queue";

/// Subscribers queued for an automation email.
///
/// `email_id` is mandatory. When `workflow_id` is not given every
/// automation is tried; workflows that do not own the email answer 404 and
/// are skipped, and an unknown `workflow_id` yields no rows.
pub struct AutomationQueueTable {
    connection: Arc<MailchimpConnection>,
    definition: TableDefinition,
    not_found: NotFoundPredicate,
}

impl AutomationQueueTable {
    pub fn new(connection: Arc<MailchimpConnection>) -> Self {
        let definition = TableDefinition::new(
            TABLE,
            "Get information about a classic automation email queue.",
        )
        .with_columns(vec![
            Column::string(
                "id",
                "The MD5 hash of the lowercase version of the list member's email address.",
            ),
            Column::string("email_address", "The list member's email address."),
            Column::string(
                "email_id",
                "A string that uniquely identifies an email in an automation workflow.",
            ),
            Column::string("list_id", "A string that uniquely identifies a list."),
            Column::timestamp(
                "next_send",
                "The date and time of the next send for the workflow email.",
            ),
            Column::string(
                "workflow_id",
                "A string that uniquely identifies an automation workflow.",
            ),
            title_column("The title of the resource.", "email_address"),
        ])
        .with_list_keys(vec![
            KeyColumn::required("email_id"),
            KeyColumn::optional("workflow_id"),
        ])
        .with_get_keys(vec![
            KeyColumn::required("id"),
            KeyColumn::required("workflow_id"),
            KeyColumn::required("email_id"),
        ]);
        Self {
            connection,
            definition,
            not_found: client::not_found(),
        }
    }

    fn row(
        &self,
        mut entry: AutomationQueueEntry,
        workflow_id: &str,
        email_id: &str,
    ) -> Result<Row> {
        entry.workflow_id.get_or_insert_with(|| workflow_id.to_string());
        entry.email_id.get_or_insert_with(|| email_id.to_string());
        self.definition.build_row(&entry, Hydrated::new())
    }

    async fn queue_rows(&self, workflow_id: &str, email_id: &str) -> Result<Vec<Row>> {
        let queue = self
            .connection
            .client()?
            .list_automation_queue(workflow_id, email_id)
            .await?;
        queue
            .queue
            .into_iter()
            .map(|entry| self.row(entry, workflow_id, email_id))
            .collect()
    }

    /// Queue of `email_id` under `workflow_id`, empty if the workflow does
    /// not own the email.
    async fn owned_queue_rows(&self, workflow_id: &str, email_id: &str) -> Result<Vec<Row>> {
        match self.queue_rows(workflow_id, email_id).await {
            Err(e) if self.not_found.matches(&e) => {
                debug!(workflow_id = %workflow_id, email_id = %email_id, "Email not in workflow");
                Ok(Vec::new())
            }
            result => result,
        }
    }
}

#[async_trait]
impl Table for AutomationQueueTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    async fn list(&self, ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()> {
        let email_id = ctx.equals_string("email_id").unwrap_or_default();
        if email_id.is_empty() {
            return Ok(());
        }

        if let Some(workflow_id) = ctx.equals_string("workflow_id") {
            let rows = self
                .owned_queue_rows(&workflow_id, &email_id)
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
        let email_id = email_id.as_str();
        let mut entries = FanOutSink::new(sink, move |automation: Automation| {
            async move { self.owned_queue_rows(&automation.id, email_id).await }.boxed()
        });
        paginate(None, &mut entries, move |request| {
            client.list_automations(request, filter)
        })
        .await
        .inspect_err(|e| log_failure(TABLE, "list", e))
    }

    async fn get(&self, ctx: &QueryContext) -> Result<Option<Row>> {
        let id = ctx.equals_string("id").unwrap_or_default();
        let workflow_id = ctx.equals_string("workflow_id").unwrap_or_default();
        let email_id = ctx.equals_string("email_id").unwrap_or_default();
        let client = self.connection.client()?;
        lookup(
            &[id.as_str(), workflow_id.as_str(), email_id.as_str()],
            || client.get_automation_queue_entry(&workflow_id, &email_id, &id),
        )
        .await
        .inspect_err(|e| log_failure(TABLE, "get", e))?
        .map(|entry| self.row(entry, &workflow_id, &email_id))
        .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::test_support::{connection, query};
    use mockito::{Matcher, Server};
    use tablekit::Operator;

    #[tokio::test]
    async fn test_list_requires_email_id() {
        let server = Server::new_async().await;
        let table = Arc::new(AutomationQueueTable::new(connection(&server.url())));
        let err = query(table, QueryContext::new()).await.unwrap_err();
        assert!(err.to_string().contains("email_id"));
    }

    #[tokio::test]
    async fn test_list_skips_workflows_without_the_email() {
        let mut server = Server::new_async().await;
        let _automations = server
            .mock("GET", "/automations")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"automations": [{"id": "wf1"}, {"id": "wf2"}], "total_items": 2}"#)
            .create_async()
            .await;
        let _wf1 = server
            .mock("GET", "/automations/wf1/emails/em9/queue")
            .with_status(404)
            .with_header("content-type", "application/problem+json")
            .with_body(r#"{"title": "Resource Not Found", "detail": "The requested resource could not be found."}"#)
            .create_async()
            .await;
        let _wf2 = server
            .mock("GET", "/automations/wf2/emails/em9/queue")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"workflow_id": "wf2", "email_id": "em9", "queue": [
                    {"id": "q1", "list_id": "l1", "email_address": "a@example.com",
                     "next_send": "2024-05-01T09:00:00+00:00"}
                ], "total_items": 1}"#,
            )
            .create_async()
            .await;

        let table = Arc::new(AutomationQueueTable::new(connection(&server.url())));
        let ctx = QueryContext::new().with_qual("email_id", Operator::Eq, "em9");
        let rows = query(table, ctx).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["email_address"], "a@example.com");
        assert_eq!(rows[0]["workflow_id"], "wf2");
        assert_eq!(rows[0]["email_id"], "em9");
    }

    #[tokio::test]
    async fn test_unknown_workflow_is_empty() {
        let mut server = Server::new_async().await;
        let automations = server
            .mock("GET", "/automations")
            .match_query(Matcher::Any)
            .expect(0)
            .create_async()
            .await;
        let _queue = server
            .mock("GET", "/automations/nope/emails/em1/queue")
            .with_status(404)
            .with_header("content-type", "application/problem+json")
            .with_body(r#"{"title": "Resource Not Found", "detail": "The requested resource could not be found."}"#)
            .create_async()
            .await;

        let table = Arc::new(AutomationQueueTable::new(connection(&server.url())));
        let ctx = QueryContext::new()
            .with_qual("email_id", Operator::Eq, "em1")
            .with_qual("workflow_id", Operator::Eq, "nope");
        assert!(query(table, ctx).await.unwrap().is_empty());
        automations.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_entry() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/automations/wf1/emails/em1/queue/q1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "q1", "email_address": "b@example.com"}"#)
            .create_async()
            .await;

        let table = Arc::new(AutomationQueueTable::new(connection(&server.url())));
        let ctx = QueryContext::new()
            .with_qual("id", Operator::Eq, "q1")
            .with_qual("workflow_id", Operator::Eq, "wf1")
            .with_qual("email_id", Operator::Eq, "em1");
        let rows = query(table, ctx).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["workflow_id"], "wf1");
        assert_eq!(rows[0]["email_address"], "b@example.com");
    }
}
