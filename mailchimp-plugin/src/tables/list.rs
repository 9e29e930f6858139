use super::{log_failure, title_column};
use crate::client::models::List;
use crate::client::params::ListFilter;
use crate::connection::MailchimpConnection;
use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use std::sync::Arc;
use tablekit::fetch::{lookup, paginate, MappedSink, RowSink};
use tablekit::query::TimeFormat;
use tablekit::table::{Column, Hydrated, KeyColumn, Row, Table, TableDefinition};
use tablekit::QueryContext;

const TABLE: &str = "mailchimp_list";

/// Audiences (lists) of the account.
pub struct ListTable {
    connection: Arc<MailchimpConnection>,
    definition: TableDefinition,
}

impl ListTable {
    pub fn new(connection: Arc<MailchimpConnection>) -> Self {
        let definition = TableDefinition::new(
            TABLE,
            "Lists are the audiences a Mailchimp account sends campaigns to.",
        )
        .with_columns(vec![
            Column::string("id", "A string that uniquely identifies this list."),
            Column::string("name", "The name of the list."),
            Column::string("beamer_address", "The list's Email Beamer address."),
            Column::timestamp("date_created", "The date and time that this list was created."),
            Column::bool(
                "email_type_option",
                "Whether the list supports multiple formats for emails.",
            ),
            Column::int("list_rating", "An auto-generated activity score for the list (0-5)."),
            Column::string(
                "notify_on_subscribe",
                "The email address to send subscribe notifications to.",
            ),
            Column::string(
                "notify_on_unsubscribe",
                "The email address to send unsubscribe notifications to.",
            ),
            Column::string("permission_reminder", "The permission reminder for the list."),
            Column::string(
                "subscribe_url_long",
                "The full version of this list's subscribe form.",
            ),
            Column::string(
                "subscribe_url_short",
                "Our EepURL shortened version of this list's subscribe form.",
            ),
            Column::bool(
                "use_archive_bar",
                "Whether campaigns for this list use the Archive Bar in archives by default.",
            ),
            Column::string("visibility", "Whether this list is public or private."),
            Column::int("web_id", "The ID used in the Mailchimp web application."),
            Column::json(
                "campaign_defaults",
                "Default values for campaigns created for this list.",
            ),
            Column::json("contact", "Contact information displayed in campaign footers."),
            Column::json("modules", "Any list-specific modules installed for this list."),
            Column::json("stats", "Stats for the list."),
            title_column("The title of the resource.", "name"),
        ])
        .with_list_keys(vec![KeyColumn::range("date_created")])
        .with_get_keys(vec![KeyColumn::required("id")]);
        Self {
            connection,
            definition,
        }
    }

    fn row(&self, list: &List) -> Result<Row> {
        self.definition.build_row(list, Hydrated::new())
    }
}

pub(crate) fn list_filter(ctx: &QueryContext) -> ListFilter {
    let created = ctx.time_range("date_created");
    ListFilter {
        since_date_created: created.since_param(TimeFormat::DateTime),
        before_date_created: created.before_param(TimeFormat::DateTime),
    }
}

#[async_trait]
impl Table for ListTable {
    fn definition(&self) -> &TableDefinition {
        &self.definition
    }

    async fn list(&self, ctx: &QueryContext, sink: &mut dyn RowSink<Row>) -> Result<()> {
        let client = self.connection.client()?;
        let filter = list_filter(ctx);

        let client = &*client;
        let filter = &filter;
        let mut rows = MappedSink::new(sink, |list: List| {
            let row = self.row(&list);
            async move { row }.boxed()
        });
        paginate(ctx.limit, &mut rows, move |request| client.list_lists(request, filter))
            .await
            .inspect_err(|e| log_failure(TABLE, "list", e))
    }

    async fn get(&self, ctx: &QueryContext) -> Result<Option<Row>> {
        let id = ctx.equals_string("id").unwrap_or_default();
        let client = self.connection.client()?;
        lookup(&[id.as_str()], || client.get_list(&id))
            .await
            .inspect_err(|e| log_failure(TABLE, "get", e))?
            .map(|list| self.row(&list))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::test_support::{connection, query};
    use chrono::{TimeZone, Utc};
    use mockito::{Matcher, Server};
    use tablekit::Operator;

    #[test]
    fn test_list_filter_inclusive_upper_bound() {
        let ts = Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap();
        let ctx = QueryContext::new().with_qual("date_created", Operator::Le, ts);
        let filter = list_filter(&ctx);
        assert!(filter.since_date_created.is_none());
        assert_eq!(filter.before_date_created.as_deref(), Some("2024-01-01 00:00:00"));

        let ctx = QueryContext::new().with_qual("date_created", Operator::Gt, ts);
        let filter = list_filter(&ctx);
        assert_eq!(filter.since_date_created.as_deref(), Some("2023-12-31 23:59:59"));
        assert!(filter.before_date_created.is_none());
    }

    #[tokio::test]
    async fn test_list_lists() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/lists")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("count".into(), "1000".into()),
                Matcher::UrlEncoded("since_date_created".into(), "2024-01-01 00:00:00".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"lists": [
                    {"id": "l1", "name": "Newsletter", "date_created": "2024-01-05T08:00:00+00:00",
                     "list_rating": 0, "stats": {"member_count": 12}}
                ], "total_items": 1}"#,
            )
            .create_async()
            .await;

        let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let table = Arc::new(ListTable::new(connection(&server.url())));
        let ctx = QueryContext::new().with_qual("date_created", Operator::Ge, since);
        let rows = query(table, ctx).await.unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["title"], "Newsletter");
        assert!(rows[0]["list_rating"].is_null());
        assert_eq!(rows[0]["stats"]["member_count"], 12);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_get_list() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/lists/l1")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": "l1", "name": "Newsletter", "visibility": "pub"}"#)
            .create_async()
            .await;

        let table = Arc::new(ListTable::new(connection(&server.url())));
        let ctx = QueryContext::new().with_qual("id", Operator::Eq, "l1");
        let rows = query(table, ctx).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["visibility"], "pub");
    }
}
