//! Table registry - every Mailchimp table served by the plugin.

use crate::client;
use crate::connection::MailchimpConnection;
use crate::tables::{
    AuthorizedAppTable, AutomationEmailTable, AutomationQueueTable, AutomationTable,
    BatchOperationTable, CampaignFolderTable, CampaignTable, ListTable, RootTable, StoreTable,
    TemplateFolderTable, TemplateTable,
};
use std::sync::Arc;
use tablekit::TableRegistry;

/// Builds the registry of all tables sharing one connection.
pub fn build_registry(connection: Arc<MailchimpConnection>) -> TableRegistry {
    let mut registry = TableRegistry::new().with_not_found(client::not_found());
    registry.register(Arc::new(RootTable::new(Arc::clone(&connection))));
    registry.register(Arc::new(CampaignTable::new(Arc::clone(&connection))));
    registry.register(Arc::new(CampaignFolderTable::new(Arc::clone(&connection))));
    registry.register(Arc::new(ListTable::new(Arc::clone(&connection))));
    registry.register(Arc::new(TemplateTable::new(Arc::clone(&connection))));
    registry.register(Arc::new(TemplateFolderTable::new(Arc::clone(&connection))));
    registry.register(Arc::new(AutomationTable::new(Arc::clone(&connection))));
    registry.register(Arc::new(AutomationEmailTable::new(Arc::clone(&connection))));
    registry.register(Arc::new(AutomationQueueTable::new(Arc::clone(&connection))));
    registry.register(Arc::new(BatchOperationTable::new(Arc::clone(&connection))));
    registry.register(Arc::new(AuthorizedAppTable::new(Arc::clone(&connection))));
    registry.register(Arc::new(StoreTable::new(connection)));
    registry
}
