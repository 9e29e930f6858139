use super::{log_failure, title_column};
use crate::client::models::Template;
use crate::client::params::TemplateFilter;
use crate::connection::MailchimpConnection;
use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tablekit::fetch::{paginate, MappedSink, RowSink};
use tablekit::query::TimeFormat;
use tablekit::table::{Column, Hydrated, KeyColumn, Row, Table, TableDefinition};
use tablekit::QueryContext;

const TABLE: &str = "mailchimp_template";

pub struct TemplateTable {
    connection: Arc<MailchimpConnection>,
    definition: TableDefinition,
}

impl TemplateTable {
    pub fn new(connection: Arc<MailchimpConnection>) -> Self {
        let definition = TableDefinition::new(TABLE, "Templates for the account's campaigns.")
        .with_columns(vec![
            Column::int("id", "The individual id for the template."),
            Column::string("name", "The name of the template."),
            Column::bool(
                "active",
                "User templates are not 'deleted,' but rather marked as 'inactive.'",
            ),
            Column::string("category", "If available, the category the template is listed in."),
            Column::string("created_by", "The login name for template's creator."),
            Column::timestamp("date_created", "The date and time the template was created."),
            Column::bool("drag_and_drop", "Whether the template uses the drag and drop editor."),
            Column::string("folder_id", "The id of the folder the template is currently in."),
            Column::bool(
                "responsive",
                "Whether the template contains media queries to make it responsive.",
            ),
            Column::string("share_url", "The URL used for template sharing."),
            Column::string("thumbnail", "If available, the URL for a thumbnail of the template."),
            Column::string("type", "The type of template (user, base, or gallery)."),
            Column::json(
                "template_default_content",
                "The sections that you can edit in a template.",
            )
            .hydrated(),
            title_column("The title of the resource.", "name"),
        ])
        .with_list_keys(vec![
            KeyColumn::optional("created_by"),
            KeyColumn::range("date_created"),
            KeyColumn::optional("folder_id"),
            KeyColumn::optional("type"),
        ])
        .with_get_keys(vec![KeyColumn::required("id")]);
        Self {
            connection,
            definition,
        }
    }

    async fn row(&self, template: Template, ctx: &QueryContext) -> Result<Row> {
        let mut row = self.definition.build_row(&template, Hydrated::new())?;
        if !self.definition.may_match(ctx, &row) {
            return Ok(row);
        }

        let mut hydrated = Hydrated::new();
        if ctx.wants_column("template_default_content") {
            let content = self
                .connection
                .client()?
                .get_template_default_content(template.id)
                .await
                .inspect_err(|e| log_failure(TABLE, "template_default_content", e))?;
            hydrated.insert("template_default_content", content);
        }
        self.definition.hydrate(&mut row, hydrated);
        Ok(row)
    }
}

pub(crate) fn template_filter(ctx: &QueryContext) -> TemplateFilter {
    let created = ctx.time_range("date_created");
    TemplateFilter {
        created_by: ctx.equals_string("created_by"),
        folder_id: ctx.equals_string("folder_id"),
        template_type: ctx.equals_string("type"),
        since_date_created: created.since_param(TimeFormat::DateTime),
        before_date_created: created.before_param(TimeFormat::DateTime),
    }
}

#[async_trait]
impl Table for TemplateTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    async fn list(&self, ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()> {
        let client = self.connection.client()?;
        let filter = template_filter(ctx);

        let client = &*client;
        let filter = &filter;
        let mut rows = MappedSink::new(sink, |template: Template| self.row(template, ctx).boxed());
        paginate(ctx.limit, &mut rows, move |request| {
            client.list_templates(request, filter)
        })
        .await
        .inspect_err(|e| log_failure(TABLE, "list", e))
    }

    async fn get(&self, ctx: &QueryContext) -> Result<Option<Row>> {
        // Template IDs are integers; zero never names a template.
        let id = match ctx.equals_i64("id") {
            Some(id) if id != 0 => id,
            _ => return Ok(None),
        };
        let client = self.connection.client()?;
        let template = client
            .get_template(id)
            .await
            .inspect_err(|e| log_failure(TABLE, "get", e))?;
        self.row(template, ctx).await.map(Some)
    }
}
