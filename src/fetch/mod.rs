//! Paginated resource fetching.
//!
//! [`paginate`] drives an offset-paginated list endpoint and streams every
//! item into a [`RowSink`]:
//!
//! ```text
//! PageRequest { offset: 0, page_size: min(1000, limit) }
//!          ↓
//!   fetch_page(request) ──► Page { items, total_items }
//!          ↓
//!   sink.emit(item)  (stop as soon as sink.wants_more() is false)
//!          ↓
//!   offset += items.len()   (stop on short page or offset >= total_items)
//! ```
//!
//! The fetcher keeps no state between calls and never retries; a failed
//! page request aborts the fetch with the client's error. Items emitted
//! before the failure stay emitted.

use crate::query::InvalidQuery;
use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use tracing::debug;

mod lookup;
mod sink;

pub use lookup::{lookup, NotFoundPredicate};
pub use sink::{CollectSink, FanOutSink, MappedSink};

/// Hard cap on the page size accepted by list endpoints.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Cursor state of one fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub offset: u64,
    pub page_size: u32,
}

/// One page of a remote collection.
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Size of the whole collection as reported by the remote side.
    pub total_items: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_items: u64) -> Self {
        Self { items, total_items }
    }
}

/// Consumer of fetched items.
///
/// `wants_more` is checked after every emitted item; once it returns false
/// the producer stops without issuing further remote calls.
#[async_trait]
pub trait RowSink<T: Send + 'static>: Send {
    async fn emit(&mut self, item: T) -> Result<()>;

    fn wants_more(&self) -> bool;
}

/// Page size for the first request: `min(MAX_PAGE_SIZE, limit)`.
///
/// A limit of zero would produce an empty page request and is rejected.
pub fn initial_page_size(limit: Option<u64>) -> Result<u32> {
    let size = match limit {
        Some(limit) => limit.min(u64::from(MAX_PAGE_SIZE)) as u32,
        None => MAX_PAGE_SIZE,
    };
    if size == 0 {
        return Err(InvalidQuery("page size must be positive (row limit was 0)".to_string()).into());
    }
    Ok(size)
}

/// Streams an offset-paginated collection into `sink`.
///
/// `fetch_page` performs one remote call for the given request. The loop
/// ends when the sink stops wanting rows, when a page comes back shorter
/// than requested (an empty page included), or when the offset reaches the
/// reported `total_items`.
pub async fn paginate<T, F, Fut>(
    limit: Option<u64>,
    sink: &mut dyn RowSink<T>,
    mut fetch_page: F,
) -> Result<()>
where
    T: Send + 'static,
    F: FnMut(PageRequest) -> Fut,
    Fut: Future<Output = Result<Page<T>>>,
{
    let mut request = PageRequest {
        offset: 0,
        page_size: initial_page_size(limit)?,
    };

    loop {
        if !sink.wants_more() {
            return Ok(());
        }

        let page = fetch_page(request).await?;
        let received = page.items.len() as u64;
        debug!(
            offset = request.offset,
            page_size = request.page_size,
            received,
            total_items = page.total_items,
            "Fetched page"
        );

        for item in page.items {
            sink.emit(item).await?;
            if !sink.wants_more() {
                return Ok(());
            }
        }

        if received < u64::from(request.page_size) {
            return Ok(());
        }
        request.offset += received;
        if request.offset >= page.total_items {
            return Ok(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::Mutex;

    /// In-memory offset-paginated source that records every request.
    struct FakeSource {
        items: Vec<u32>,
        total_override: Option<u64>,
        fail_at_offset: Option<u64>,
        requests: Mutex<Vec<PageRequest>>,
    }

    impl FakeSource {
        fn new(n: u32) -> Self {
            Self {
                items: (0..n).collect(),
                total_override: None,
                fail_at_offset: None,
                requests: Mutex::new(Vec::new()),
            }
        }

        async fn page(&self, request: PageRequest) -> Result<Page<u32>> {
            self.requests.lock().unwrap().push(request);
            if self.fail_at_offset == Some(request.offset) {
                return Err(anyhow!("Mailchimp API error: 500 Internal Server Error"));
            }
            let start = (request.offset as usize).min(self.items.len());
            let end = (start + request.page_size as usize).min(self.items.len());
            let total = self
                .total_override
                .unwrap_or(self.items.len() as u64);
            Ok(Page::new(self.items[start..end].to_vec(), total))
        }

        fn requests(&self) -> Vec<PageRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn run(source: &FakeSource, limit: Option<u64>) -> Result<Vec<u32>> {
        let mut sink = CollectSink::new(limit);
        paginate(limit, &mut sink, |request| source.page(request)).await?;
        Ok(sink.into_items())
    }

    #[tokio::test]
    async fn test_three_pages_without_limit() {
        let source = FakeSource::new(2500);
        let items = run(&source, None).await.unwrap();

        assert_eq!(items.len(), 2500);
        assert_eq!(items, (0..2500).collect::<Vec<_>>());

        let offsets: Vec<u64> = source.requests().iter().map(|r| r.offset).collect();
        assert_eq!(offsets, vec![0, 1000, 2000]);
        assert!(source.requests().iter().all(|r| r.page_size == 1000));
    }

    #[tokio::test]
    async fn test_limit_stops_after_first_page() {
        let source = FakeSource::new(50);
        let items = run(&source, Some(5)).await.unwrap();

        assert_eq!(items, vec![0, 1, 2, 3, 4]);
        assert_eq!(
            source.requests(),
            vec![PageRequest {
                offset: 0,
                page_size: 5
            }]
        );
    }

    #[tokio::test]
    async fn test_emits_min_of_total_and_limit() {
        for (n, limit) in [(0u32, None), (1, None), (7, Some(3)), (7, Some(20)), (1000, None), (1001, Some(1001))] {
            let source = FakeSource::new(n);
            let items = run(&source, limit).await.unwrap();
            let expected = limit.map_or(n as u64, |l| l.min(n as u64));
            assert_eq!(items.len() as u64, expected, "n={} limit={:?}", n, limit);
            // Each item exactly once, in source order
            assert!(items.iter().enumerate().all(|(i, v)| *v == i as u32));
        }
    }

    #[tokio::test]
    async fn test_empty_page_terminates_despite_total() {
        let mut source = FakeSource::new(0);
        source.total_override = Some(10_000);
        let items = run(&source, None).await.unwrap();

        assert!(items.is_empty());
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_short_page_terminates_despite_total() {
        let mut source = FakeSource::new(1500);
        source.total_override = Some(5000);
        let items = run(&source, None).await.unwrap();

        assert_eq!(items.len(), 1500);
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_sink_stop_prevents_further_calls() {
        let source = FakeSource::new(3000);
        // Sink capped at 1200 while the page size stays at 1000
        let mut sink = CollectSink::new(Some(1200));
        paginate(None, &mut sink, |request| source.page(request))
            .await
            .unwrap();

        assert_eq!(sink.len(), 1200);
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_limit_rejected_before_request() {
        let source = FakeSource::new(10);
        let err = run(&source, Some(0)).await.unwrap_err();

        assert!(err.to_string().contains("page size must be positive"));
        assert!(source.requests().is_empty());
    }

    #[tokio::test]
    async fn test_error_aborts_and_keeps_emitted_items() {
        let mut source = FakeSource::new(2500);
        source.fail_at_offset = Some(1000);
        let mut sink = CollectSink::new(None);
        let err = paginate(None, &mut sink, |request| source.page(request))
            .await
            .unwrap_err();

        assert!(err.to_string().contains("500"));
        assert_eq!(sink.len(), 1000);
        assert_eq!(source.requests().len(), 2);
    }

    #[test]
    fn test_initial_page_size() {
        assert_eq!(initial_page_size(None).unwrap(), 1000);
        assert_eq!(initial_page_size(Some(25)).unwrap(), 25);
        assert_eq!(initial_page_size(Some(50_000)).unwrap(), 1000);
        assert!(initial_page_size(Some(0)).is_err());
    }
}
