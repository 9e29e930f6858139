//! Mailchimp table definitions.
//!
//! Each table maps one Mailchimp resource to a [`TableDefinition`] and
//! implements [`tablekit::Table`] on top of the shared
//! [`MailchimpConnection`]. List functions stream through
//! [`tablekit::fetch::paginate`]; get functions go through
//! [`tablekit::fetch::lookup`].

use crate::connection::MailchimpConnection;
use anyhow::Result;
use serde_json::Value;
use tablekit::table::{Column, Hydrated};
use tablekit::QueryContext;
use tracing::error;

mod authorized_app;
mod automation;
mod automation_email;
mod automation_queue;
mod batch_operation;
mod campaign;
mod campaign_folder;
mod list;
mod root;
mod store;
mod template;
mod template_folder;

pub use authorized_app::AuthorizedAppTable;
pub use automation::AutomationTable;
pub use automation_email::AutomationEmailTable;
pub use automation_queue::AutomationQueueTable;
pub use batch_operation::BatchOperationTable;
pub use campaign::CampaignTable;
pub use campaign_folder::CampaignFolderTable;
pub use list::ListTable;
pub use root::RootTable;
pub use store::StoreTable;
pub use template::TemplateTable;
pub use template_folder::TemplateFolderTable;

/// `account_id` column shared by tables that carry the owning account.
pub(crate) fn account_id_column() -> Column {
    Column::string("account_id", "The Mailchimp account ID.").hydrated()
}

pub(crate) fn title_column(description: &'static str, path: &'static str) -> Column {
    Column::string("title", description).from_field(path)
}

/// Fills `account_id` from the connection's cached account when requested.
pub(crate) async fn hydrate_account_id(
    connection: &MailchimpConnection,
    ctx: &QueryContext,
    hydrated: &mut Hydrated,
) -> Result<()> {
    if ctx.wants_column("account_id") {
        let account_id = connection.account_id().await?;
        hydrated.insert("account_id", Value::String(account_id));
    }
    Ok(())
}

pub(crate) fn log_failure(table: &'static str, operation: &'static str, err: &anyhow::Error) {
    error!(table = table, operation = operation, error = %format!("{:#}", err), "Mailchimp query failed");
}
