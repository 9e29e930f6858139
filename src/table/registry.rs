use super::{Row, Table, TableDefinition};
use crate::fetch::{NotFoundPredicate, RowSink};
use crate::query::QueryContext;
use anyhow::{anyhow, Result};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// All tables a plugin exposes, keyed by table name.
pub struct TableRegistry {
    tables: BTreeMap<&'static str, Arc<dyn Table>>,
    not_found: NotFoundPredicate,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self {
            tables: BTreeMap::new(),
            not_found: NotFoundPredicate::default(),
        }
    }

    /// Replaces the predicate used to map get errors to "no row".
    pub fn with_not_found(mut self, not_found: NotFoundPredicate) -> Self {
        self.not_found = not_found;
        self
    }

    pub fn register(&mut self, table: Arc<dyn Table>) {
        let name = table.definition().name;
        if self.tables.insert(name, table).is_some() {
            warn!(table = %name, "Table registered twice, keeping the last one");
        }
    }

    pub fn table(&self, name: &str) -> Option<Arc<dyn Table>> {
        self.tables.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.tables.keys().copied().collect()
    }

    /// Table schemas sorted by name.
    pub fn definitions(&self) -> Vec<&TableDefinition> {
        self.tables.values().map(|t| t.definition()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Runs a query against table `name`, streaming rows into `sink`.
    ///
    /// Uses the table's get function when every required get key has an
    /// `=` qual; a not-found error from the remote side then yields no
    /// rows. Otherwise the list function is used.
    pub async fn execute(
        &self,
        name: &str,
        ctx: &QueryContext,
        sink: &mut dyn RowSink<Row>,
    ) -> Result<()> {
        let table = self
            .table(name)
            .ok_or_else(|| anyhow!("Unknown table: {}", name))?;
        let definition = table.definition();
        definition.validate(ctx)?;

        if !definition.uses_get(ctx) {
            debug!(table = %name, operation = "list", "Executing query");
            return table.list(ctx, sink).await;
        }

        debug!(table = %name, operation = "get", "Executing query");
        match table.get(ctx).await {
            Ok(Some(row)) => sink.emit(row).await,
            Ok(None) => Ok(()),
            Err(e) if self.not_found.matches(&e) => {
                debug!(table = %name, error = %e, "Row not found");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for TableRegistry {
    fn default() -> Self {
        Self::new()
    }
}
