use super::Row;
use crate::fetch::RowSink;
use crate::query::QueryContext;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Host-side sink for one query.
///
/// Re-applies every qual to incoming rows (pushed-down quals are only a
/// hint to the remote side), counts matching rows toward the limit and
/// projects the requested columns. The query can be cancelled from another
/// task through [`QuerySink::cancel_handle`].
pub struct QuerySink {
    ctx: QueryContext,
    rows: Vec<Row>,
    cancelled: Arc<AtomicBool>,
}

impl QuerySink {
    pub fn new(ctx: QueryContext) -> Self {
        Self {
            ctx,
            rows: Vec::new(),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn project(&self, row: Row) -> Row {
        match &self.ctx.columns {
            Some(columns) => row
                .into_iter()
                .filter(|(name, _)| columns.iter().any(|c| c == name))
                .collect(),
            None => row,
        }
    }
}

#[async_trait]
impl RowSink<Row> for QuerySink {
    async fn emit(&mut self, row: Row) -> Result<()> {
        if !self.wants_more() {
            return Ok(());
        }
        if self.ctx.quals.iter().all(|qual| qual.matches(&row)) {
            let row = self.project(row);
            self.rows.push(row);
        }
        Ok(())
    }

    fn wants_more(&self) -> bool {
        if self.cancelled.load(Ordering::Relaxed) {
            return false;
        }
        self.ctx
            .limit
            .map_or(true, |limit| (self.rows.len() as u64) < limit)
    }
}
