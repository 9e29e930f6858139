use super::{log_failure, title_column};
use crate::client::models::AuthorizedApp;
use crate::connection::MailchimpConnection;
use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tablekit::fetch::{paginate, MappedSink, RowSink};
use tablekit::table::{Column, Hydrated, KeyColumn, Row, Table, TableDefinition};
use tablekit::QueryContext;

const TABLE: &str = "mailchimp_authorized_app";

pub struct AuthorizedAppTable {
    connection: Arc<MailchimpConnection>,
    definition: TableDefinition,
}

impl AuthorizedAppTable {
    pub fn new(connection: Arc<MailchimpConnection>) -> Self {
        let definition = TableDefinition::new(
            TABLE,
            "Get a list of an account's registered, connected applications.",
        )
        .with_columns(vec![
            Column::int("id", "The ID for the application."),
            Column::string("name", "The name of the application."),
            Column::string("description", "A short description of the application."),
            Column::json("users", "An array of usernames for users who have linked the app."),
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
impl Table for AuthorizedAppTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    async fn list(&self, ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()> {
        let client = self.connection.client()?;
        let client = &*client;
        let definition = &self.definition;
        let mut rows = MappedSink::new(sink, move |app: AuthorizedApp| {
            let row = definition.build_row(&app, Hydrated::new());
            async move { row }.boxed()
        });
        paginate(ctx.limit, &mut rows, move |request| {
            client.list_authorized_apps(request)
        })
        .await
        .inspect_err(|e| log_failure(TABLE, "list", e))
    }

    async fn get(&self, ctx: &QueryContext) -> Result<Option<Row>> {
        let id = match ctx.equals_i64("id") {
            Some(id) if id != 0 => id,
            _ => return Ok(None),
        };
        let client = self.connection.client()?;
        let app = client
            .get_authorized_app(id)
            .await
            .inspect_err(|e| log_failure(TABLE, "get", e))?;
        self.definition.build_row(&app, Hydrated::new()).map(Some)
    }
}
