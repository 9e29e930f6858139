use super::{log_failure, title_column};
use crate::client::models::Store;
use crate::connection::MailchimpConnection;
use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tablekit::fetch::{lookup, paginate, MappedSink, RowSink};
use tablekit::table::{Column, Hydrated, KeyColumn, Row, Table, TableDefinition};
use tablekit::QueryContext;

const TABLE: &str = "mailchimp_store";

/// E-commerce stores connected to the account.
pub struct StoreTable {
    connection: Arc<MailchimpConnection>,
    definition: TableDefinition,
}

impl StoreTable {
    pub fn new(connection: Arc<MailchimpConnection>) -> Self {
        let definition = TableDefinition::new(TABLE, "List of E-commerce Stores.")
            .with_columns(vec![
                Column::string("id", "The unique identifier for the store."),
                Column::string("name", "The name of the store."),
                Column::timestamp("created_at", "The date and time the store was created."),
                Column::string(
                    "currency_code",
                    "The three-letter ISO 4217 code for the currency that the store accepts.",
                ),
                Column::string(
                    "domain",
                    "The store domain. The store domain must be unique within a user account.",
                ),
                Column::string("email_address", "The email address for the store."),
                Column::string(
                    "list_id",
                    "The unique identifier for the list that's associated with the store.",
                ),
                Column::string("money_format", "The currency format for the store."),
                Column::string("phone", "The store phone number."),
                Column::string("platform", "The e-commerce platform of the store."),
                Column::string("primary_locale", "The primary locale for the store."),
                Column::string("timezone", "The timezone for the store."),
                Column::timestamp("updated_at", "The date and time the store was last updated."),
                Column::json("address", "The store address."),
                title_column("The title of the resource.", "name"),
            ])
            .with_get_keys(vec![KeyColumn::required("id")]);
        Self {
            connection,
            definition,
        }
    }
}

#[async_trait]
impl Table for StoreTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    async fn list(&self, ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()> {
        let client = self.connection.client()?;
        let client = &*client;
        let definition = &self.definition;
        let mut rows = MappedSink::new(sink, move |store: Store| {
            let row = definition.build_row(&store, Hydrated::new());
            async move { row }.boxed()
        });
        paginate(ctx.limit, &mut rows, move |request| client.list_stores(request))
            .await
            .inspect_err(|e| log_failure(TABLE, "list", e))
    }

    async fn get(&self, ctx: &QueryContext) -> Result<Option<Row>> {
        let id = ctx.equals_string("id").unwrap_or_default();
        let client = self.connection.client()?;
        lookup(&[id.as_str()], || client.get_store(&id))
            .await
            .inspect_err(|e| log_failure(TABLE, "get", e))?
            .map(|store| self.definition.build_row(&store, Hydrated::new()))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::test_support::{connection, query};
    use mockito::Server;
    use tablekit::Operator;

    #[tokio::test]
    async fn test_get_store() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/ecommerce/stores/s1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"id": "s1", "name": "Freddie's Merch", "currency_code": "USD",
                    "address": {"city": "Atlanta"}}"#,
            )
            .create_async()
            .await;

        let table = Arc::new(StoreTable::new(connection(&server.url())));
        let ctx = QueryContext::new().with_qual("id", Operator::Eq, "s1");
        let rows = query(table, ctx).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Freddie's Merch");
        assert_eq!(rows[0]["address"]["city"], "Atlanta");
        assert!(rows[0]["phone"].is_null());
    }
}
