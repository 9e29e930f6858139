use super::log_failure;
use crate::client::models::BatchOperation;
use crate::connection::MailchimpConnection;
use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tablekit::fetch::{lookup, paginate, MappedSink, RowSink};
use tablekit::table::{Column, Hydrated, KeyColumn, Row, Table, TableDefinition};
use tablekit::QueryContext;

const TABLE: &str = "mailchimp_batch_operation";

pub struct BatchOperationTable {
    connection: Arc<MailchimpConnection>,
    definition: TableDefinition,
}

impl BatchOperationTable {
    pub fn new(connection: Arc<MailchimpConnection>) -> Self {
        let definition = TableDefinition::new(
            TABLE,
            "Get a summary of batch requests that have been made.",
        )
        .with_columns(vec![
            Column::string("id", "The unique identifier for the batch request."),
            Column::timestamp(
                "completed_at",
                "The date and time when all operations in the batch request completed.",
            ),
            Column::int(
                "errored_operations",
                "The number of completed operations that returned an error.",
            ),
            Column::int(
                "finished_operations",
                "The number of completed operations. This includes operations that returned an error.",
            ),
            Column::string(
                "response_body_url",
                "The URL of the gzipped archive of the results of all the operations.",
            ),
            Column::string("status", "The status of the batch call."),
            Column::timestamp(
                "submitted_at",
                "The date and time when the server received the batch request.",
            ),
            Column::int(
                "total_operations",
                "The total number of operations to complete as part of this batch request.",
            ),
            // Batches have no name; the ID doubles as the title.
            Column::string("title", "The title of the resource.").from_field("id"),
        ])
        .with_get_keys(vec![KeyColumn::required("id")]);
        Self {
            connection,
            definition,
        }
    }
}

#[async_trait]
impl Table for BatchOperationTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    async fn list(&self, ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()> {
        let client = self.connection.client()?;
        let client = &*client;
        let definition = &self.definition;
        let mut rows = MappedSink::new(sink, move |batch: BatchOperation| {
            let row = definition.build_row(&batch, Hydrated::new());
            async move { row }.boxed()
        });
        paginate(ctx.limit, &mut rows, move |request| client.list_batches(request))
            .await
            .inspect_err(|e| log_failure(TABLE, "list", e))
    }

    async fn get(&self, ctx: &QueryContext) -> Result<Option<Row>> {
        let id = ctx.equals_string("id").unwrap_or_default();
        let client = self.connection.client()?;
        lookup(&[id.as_str()], || client.get_batch(&id))
            .await
            .inspect_err(|e| log_failure(TABLE, "get", e))?
            .map(|batch| self.definition.build_row(&batch, Hydrated::new()))
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
    async fn test_list_stops_on_short_page() {
        let mut server = Server::new_async().await;
        // total_items overstates the collection; the short page ends the scan
        let mock = server
            .mock("GET", "/batches")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"batches": [
                    {"id": "b1", "status": "finished", "total_operations": 3,
                     "submitted_at": "2024-04-01T10:00:00+00:00"}
                ], "total_items": 5000}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let table = Arc::new(BatchOperationTable::new(connection(&server.url())));
        let rows = query(table, QueryContext::new()).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "b1");
        assert_eq!(rows[0]["submitted_at"], "2024-04-01T10:00:00+00:00");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_server_error_propagates() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/batches/b1")
            .with_status(503)
            .create_async()
            .await;

        let table = Arc::new(BatchOperationTable::new(connection(&server.url())));
        let ctx = QueryContext::new().with_qual("id", Operator::Eq, "b1");
        let err = query(table, ctx).await.unwrap_err();
        assert!(err.to_string().contains("503"));
    }
}
