use super::{account_id_column, hydrate_account_id, log_failure, title_column};
use crate::client::models::Folder;
use crate::connection::MailchimpConnection;
use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tablekit::fetch::{paginate, MappedSink, RowSink};
use tablekit::table::{Column, Hydrated, Row, Table, TableDefinition};
use tablekit::QueryContext;

const TABLE: &str = "mailchimp_campaign_folder";

pub struct CampaignFolderTable {
    connection: Arc<MailchimpConnection>,
    definition: TableDefinition,
}

impl CampaignFolderTable {
    pub fn new(connection: Arc<MailchimpConnection>) -> Self {
        let definition = TableDefinition::new(TABLE, "Folders for organizing campaigns.")
            .with_columns(vec![
                account_id_column(),
                Column::string("id", "A string that uniquely identifies this campaign folder."),
                Column::string("name", "The name of the folder."),
                Column::int("count", "The number of campaigns in the folder."),
                title_column("The title of the resource.", "name"),
            ]);
        Self {
            connection,
            definition,
        }
    }

    async fn row(&self, folder: Folder, ctx: &QueryContext) -> Result<Row> {
        let mut row = self.definition.build_row(&folder, Hydrated::new())?;
        if !self.definition.may_match(ctx, &row) {
            return Ok(row);
        }

        let mut hydrated = Hydrated::new();
        hydrate_account_id(&self.connection, ctx, &mut hydrated).await?;
        self.definition.hydrate(&mut row, hydrated);
        Ok(row)
    }
}

#[async_trait]
impl Table for CampaignFolderTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    async fn list(&self, ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()> {
        let client = self.connection.client()?;
        let client = &*client;
        let mut rows = MappedSink::new(sink, |folder: Folder| self.row(folder, ctx).boxed());
        paginate(ctx.limit, &mut rows, move |request| {
            client.list_campaign_folders(request)
        })
        .await
        .inspect_err(|e| log_failure(TABLE, "list", e))
    }
}
