use super::{log_failure, title_column};
use crate::connection::MailchimpConnection;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tablekit::fetch::RowSink;
use tablekit::table::{Column, Hydrated, Row, Table, TableDefinition};
use tablekit::QueryContext;

const TABLE: &str = "mailchimp_root";

/// Details about the Mailchimp user account. Always a single row.
pub struct RootTable {
    connection: Arc<MailchimpConnection>,
    definition: TableDefinition,
}

impl RootTable {
    pub fn new(connection: Arc<MailchimpConnection>) -> Self {
        let definition = TableDefinition::new(
            TABLE,
            "The root directory returns details about the Mailchimp user account.",
        )
        .with_columns(vec![
            Column::string("account_id", "The Mailchimp account ID."),
            Column::string("account_name", "The name of the account."),
            Column::string("email", "The account email address."),
            Column::timestamp("last_login", "The date and time of the last login for this account."),
            Column::bool("pro_enabled", "Whether the account includes Mailchimp Pro."),
            Column::string("role", "The user role for the account."),
            Column::int(
                "total_subscribers",
                "The total number of subscribers across all lists in the account.",
            ),
            Column::json("contact", "Information about the account contact."),
            Column::json(
                "industry_stats",
                "The average campaign statistics for all campaigns in the account's specified industry.",
            ),
            title_column("The title of the resource.", "account_name"),
        ]);
        Self {
            connection,
            definition,
        }
    }
}

#[async_trait]
impl Table for RootTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    async fn list(&self, _ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()> {
        if !sink.wants_more() {
            return Ok(());
        }
        let account = self
            .connection
            .account()
            .await
            .inspect_err(|e| log_failure(TABLE, "list", e))?;
        let row = self.definition.build_row(account.as_ref(), Hydrated::new())?;
        sink.emit(row).await
    }
}
