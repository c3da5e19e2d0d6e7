//! Paginated fetch producer
//!
//! Requests pages 1, 2, 3, ... in order and appends every record to the item
//! queue, stopping at the first empty page. Total-count fields in the
//! upstream response are never consulted.

use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};

use super::item_queue::ItemQueue;
use crate::errors::SourceResult;
use crate::models::QueueItem;
use crate::sources::PageSource;

const FIRST_PAGE: u32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FetchReport {
    pub pages_requested: u32,
    pub items_enqueued: usize,
    /// The consumer closed the queue before the last page was reached
    pub stopped_early: bool,
}

pub struct FetchProducer {
    source: Arc<dyn PageSource>,
    queue: Arc<ItemQueue>,
}

impl FetchProducer {
    pub fn new(source: Arc<dyn PageSource>, queue: Arc<ItemQueue>) -> Self {
        Self { source, queue }
    }

    /// Fetch every page into the queue, then close it
    ///
    /// An upstream error aborts the run; items already queued stay queued
    /// and are still delivered.
    pub async fn run(&self) -> SourceResult<FetchReport> {
        let result = self.fetch_all().await;
        self.queue.close();
        result
    }

    async fn fetch_all(&self) -> SourceResult<FetchReport> {
        let mut report = FetchReport::default();
        let mut page = FIRST_PAGE;

        loop {
            report.pages_requested += 1;
            let records = self.source.fetch_page(page).await?;

            if records.is_empty() {
                debug!("Page {} of {} is empty, fetch complete", page, self.source.name());
                break;
            }

            debug!("Page {} returned {} record(s)", page, records.len());
            for record in records {
                let item_id = record.id.clone();
                if self
                    .queue
                    .push(QueueItem::new(record.id, page, record.payload))
                    .await
                    .is_err()
                {
                    info!("Item queue closed by consumer, stopping fetch at page {}", page);
                    report.stopped_early = true;
                    return Ok(report);
                }
                info!("Queued item {}", item_id);
                report.items_enqueued += 1;
            }

            page += 1;
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::PagedSource;
    use std::sync::atomic::Ordering;
    use tokio_util::sync::CancellationToken;

    #[tokio::test]
    async fn test_stops_at_first_empty_page() {
        let source = Arc::new(PagedSource::with_page_sizes(&[3, 2]));
        let queue = Arc::new(ItemQueue::new(10));

        let report = FetchProducer::new(source.clone(), queue.clone())
            .run()
            .await
            .unwrap();

        assert_eq!(report.items_enqueued, 5);
        assert_eq!(report.pages_requested, 3);
        assert!(!report.stopped_early);
        assert_eq!(source.requests.load(Ordering::SeqCst), 3);
        assert!(queue.is_closed());

        let pages: Vec<u32> = queue.snapshot().await.iter().map(|i| i.page).collect();
        assert_eq!(pages, vec![1, 1, 1, 2, 2]);
    }

    #[tokio::test]
    async fn test_empty_first_page_enqueues_nothing() {
        let source = Arc::new(PagedSource::with_page_sizes(&[]));
        let queue = Arc::new(ItemQueue::new(10));

        let report = FetchProducer::new(source, queue.clone()).run().await.unwrap();

        assert_eq!(report.pages_requested, 1);
        assert_eq!(report.items_enqueued, 0);
        assert!(queue.pop(&CancellationToken::new()).await.is_none());
    }

    #[tokio::test]
    async fn test_upstream_error_keeps_queued_items() {
        let source = Arc::new(PagedSource::with_page_sizes(&[2, 2]).failing_on(2));
        let queue = Arc::new(ItemQueue::new(10));

        let result = FetchProducer::new(source, queue.clone()).run().await;

        assert!(result.is_err());
        assert!(queue.is_closed());
        let ids: Vec<String> = queue.snapshot().await.into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["p1-0", "p1-1"]);
    }

    #[tokio::test]
    async fn test_closed_queue_stops_fetch() {
        let source = Arc::new(PagedSource::with_page_sizes(&[2, 2]));
        let queue = Arc::new(ItemQueue::new(10));
        queue.close();

        let report = FetchProducer::new(source.clone(), queue).run().await.unwrap();

        assert!(report.stopped_early);
        assert_eq!(report.items_enqueued, 0);
        assert_eq!(source.requests.load(Ordering::SeqCst), 1);
    }
}
