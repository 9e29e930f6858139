use super::RowSink;
use crate::table::Row;
use anyhow::Result;
use async_trait::async_trait;
use futures::future::BoxFuture;

/// Collects items in memory, optionally capped at `limit`.
pub struct CollectSink<T> {
    items: Vec<T>,
    limit: Option<u64>,
}

impl<T> CollectSink<T> {
    pub fn new(limit: Option<u64>) -> Self {
        Self {
            items: Vec::new(),
            limit,
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[async_trait]
impl<T: Send + 'static> RowSink<T> for CollectSink<T> {
    async fn emit(&mut self, item: T) -> Result<()> {
        self.items.push(item);
        Ok(())
    }

    fn wants_more(&self) -> bool {
        self.limit
            .map_or(true, |limit| (self.items.len() as u64) < limit)
    }
}

/// Adapts a row sink to typed items.
///
/// Each item is turned into a [`Row`] by `map` (which may hydrate extra
/// columns with further remote calls) before being forwarded.
pub struct MappedSink<'a, T> {
    inner: &'a mut dyn RowSink<Row>,
    map: Box<dyn FnMut(T) -> BoxFuture<'a, Result<Row>> + Send + 'a>,
}

impl<'a, T> MappedSink<'a, T> {
    pub fn new<F>(inner: &'a mut dyn RowSink<Row>, map: F) -> Self
    where
        F: FnMut(T) -> BoxFuture<'a, Result<Row>> + Send + 'a,
    {
        Self {
            inner,
            map: Box::new(map),
        }
    }
}

#[async_trait]
impl<'a, T: Send + 'static> RowSink<T> for MappedSink<'a, T> {
    async fn emit(&mut self, item: T) -> Result<()> {
        let row = (self.map)(item).await?;
        self.inner.emit(row).await
    }

    fn wants_more(&self) -> bool {
        self.inner.wants_more()
    }
}

/// Expands each parent item into child rows.
///
/// For every parent emitted by a list fetch, `children` loads that parent's
/// rows, which are forwarded until the inner sink is satisfied. Parents are
/// not requested once the inner sink stops wanting rows.
pub struct FanOutSink<'a, P> {
    inner: &'a mut dyn RowSink<Row>,
    children: Box<dyn FnMut(P) -> BoxFuture<'a, Result<Vec<Row>>> + Send + 'a>,
}

impl<'a, P> FanOutSink<'a, P> {
    pub fn new<F>(inner: &'a mut dyn RowSink<Row>, children: F) -> Self
    where
        F: FnMut(P) -> BoxFuture<'a, Result<Vec<Row>>> + Send + 'a,
    {
        Self {
            inner,
            children: Box::new(children),
        }
    }
}

#[async_trait]
impl<'a, P: Send + 'static> RowSink<P> for FanOutSink<'a, P> {
    async fn emit(&mut self, parent: P) -> Result<()> {
        let rows = (self.children)(parent).await?;
        for row in rows {
            if !self.inner.wants_more() {
                break;
            }
            self.inner.emit(row).await?;
        }
        Ok(())
    }

    fn wants_more(&self) -> bool {
        self.inner.wants_more()
    }
}
