use super::{log_failure, title_column};
use crate::client::models::Folder;
use crate::connection::MailchimpConnection;
use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tablekit::fetch::{paginate, MappedSink, RowSink};
use tablekit::table::{Column, Hydrated, Row, Table, TableDefinition};
use tablekit::QueryContext;

const TABLE: &str = "mailchimp_template_folder";

pub struct TemplateFolderTable {
    connection: Arc<MailchimpConnection>,
    definition: TableDefinition,
}

impl TemplateFolderTable {
    pub fn new(connection: Arc<MailchimpConnection>) -> Self {
        let definition = TableDefinition::new(TABLE, "Folders for organizing templates.")
            .with_columns(vec![
                Column::string("id", "A string that uniquely identifies this template folder."),
                Column::string("name", "The name of the folder."),
                Column::int("count", "The number of templates in the folder."),
                title_column("The title of the resource.", "name"),
            ]);
        Self {
            connection,
            definition,
        }
    }
}

#[async_trait]
impl Table for TemplateFolderTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    async fn list(&self, ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()> {
        let client = self.connection.client()?;
        let client = &*client;
        let definition = &self.definition;
        let mut rows = MappedSink::new(sink, move |folder: Folder| {
            let row = definition.build_row(&folder, Hydrated::new());
            async move { row }.boxed()
        });
        paginate(ctx.limit, &mut rows, move |request| {
            client.list_template_folders(request)
        })
        .await
        .inspect_err(|e| log_failure(TABLE, "list", e))
    }
}
