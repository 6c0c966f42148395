//! Hand-off of finished rows to the consumer, one at a time or in batches.

use crate::config::DEFAULT_BATCH_SIZE;
use crate::models::ScrappedRow;
use anyhow::Result;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

pub type RowHandler = Box<dyn Fn(ScrappedRow) -> Result<()> + Send + Sync>;
pub type BatchHandler<T = ScrappedRow> = Box<dyn Fn(Vec<T>) -> Result<()> + Send + Sync>;

/// Size-triggered FIFO buffer.
///
/// Every `size` handled items are removed from the front of the buffer and
/// passed to the handler in one call. The handler runs under the buffer lock,
/// so concurrent producers never interleave an append with a flush; it must
/// not call back into the same container.
pub struct BatchingContainer<T = ScrappedRow> {
    size: usize,
    buffer: Mutex<Vec<T>>,
    handler: BatchHandler<T>,
}

impl<T> BatchingContainer<T> {
    pub fn new(size: usize, handler: BatchHandler<T>) -> Self {
        Self {
            size: size.max(1),
            buffer: Mutex::new(Vec::new()),
            handler,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        // a panicking handler leaves the buffer consistent: the batch was
        // already drained
        self.buffer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Buffers `item` and delivers a full batch once `size` items are held.
    ///
    /// A handler error is returned as is; the batch it was given is not put
    /// back.
    pub fn handle(&self, item: T) -> Result<()> {
        let mut buffer = self.lock();
        buffer.push(item);

        if buffer.len() >= self.size {
            let batch: Vec<T> = buffer.drain(..self.size).collect();
            debug!(batch_size = batch.len(), remaining = buffer.len(), "Delivering batch");
            (self.handler)(batch)?;
        }

        Ok(())
    }

    /// Delivers whatever is buffered, returning how many items were sent.
    pub fn flush(&self) -> Result<usize> {
        let mut buffer = self.lock();
        if buffer.is_empty() {
            return Ok(0);
        }

        let batch = std::mem::take(&mut *buffer);
        let count = batch.len();
        debug!(batch_size = count, "Flushing partial batch");
        (self.handler)(batch)?;

        Ok(count)
    }

    pub fn buffered_len(&self) -> usize {
        self.lock().len()
    }
}

impl<T: Clone> BatchingContainer<T> {
    /// Snapshot of the buffered items; does not flush
    pub fn buffered_rows(&self) -> Vec<T> {
        self.lock().clone()
    }
}

/// How the consumer wants rows, chosen once at construction
pub enum OnScrapped {
    Row(RowHandler),
    Batch {
        handler: BatchHandler,
        /// Defaults to [`DEFAULT_BATCH_SIZE`]
        size: Option<usize>,
    },
}

impl OnScrapped {
    pub fn row(handler: impl Fn(ScrappedRow) -> Result<()> + Send + Sync + 'static) -> Self {
        Self::Row(Box::new(handler))
    }

    pub fn batch(
        handler: impl Fn(Vec<ScrappedRow>) -> Result<()> + Send + Sync + 'static,
        size: Option<usize>,
    ) -> Self {
        Self::Batch {
            handler: Box::new(handler),
            size,
        }
    }
}

pub enum RowDelivery {
    PerRow(RowHandler),
    Batched(BatchingContainer),
}

impl From<OnScrapped> for RowDelivery {
    fn from(on_scrapped: OnScrapped) -> Self {
        match on_scrapped {
            OnScrapped::Row(handler) => Self::PerRow(handler),
            OnScrapped::Batch { handler, size } => {
                let size = size.unwrap_or(DEFAULT_BATCH_SIZE);
                debug!("Batching is enabled with size: {}", size);
                Self::Batched(BatchingContainer::new(size, handler))
            }
        }
    }
}

impl RowDelivery {
    pub fn deliver(&self, row: ScrappedRow) -> Result<()> {
        match self {
            Self::PerRow(handler) => handler(row),
            Self::Batched(container) => container.handle(row),
        }
    }

    /// Sends any partial batch. Per-row delivery has nothing to flush.
    pub fn flush(&self) -> Result<usize> {
        match self {
            Self::PerRow(_) => Ok(0),
            Self::Batched(container) => container.flush(),
        }
    }

    pub fn buffered_rows(&self) -> Vec<ScrappedRow> {
        match self {
            Self::PerRow(_) => Vec::new(),
            Self::Batched(container) => container.buffered_rows(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    type Batches = Arc<Mutex<Vec<Vec<&'static str>>>>;

    fn container(size: usize) -> (BatchingContainer<&'static str>, Batches) {
        let batches: Batches = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&batches);
        let container = BatchingContainer::new(
            size,
            Box::new(move |batch: Vec<&'static str>| -> Result<()> {
                sink.lock().unwrap().push(batch);
                Ok(())
            }),
        );
        (container, batches)
    }

    #[test]
    fn buffers_under_the_limit() {
        let (container, batches) = container(10);
        for item in ["1", "2", "3", "4", "5", "6", "7", "8", "9"] {
            container.handle(item).unwrap();
        }

        assert!(batches.lock().unwrap().is_empty());
        assert_eq!(container.buffered_rows().len(), 9);
    }

    #[test]
    fn delivers_full_batch_and_keeps_remainder() {
        let (container, batches) = container(2);
        container.handle("a").unwrap();
        container.handle("b").unwrap();

        assert_eq!(*batches.lock().unwrap(), vec![vec!["a", "b"]]);
        assert!(container.buffered_rows().is_empty());

        container.handle("c").unwrap();
        assert_eq!(batches.lock().unwrap().len(), 1);
        assert_eq!(container.buffered_rows(), vec!["c"]);
    }

    #[test]
    fn inspection_does_not_flush() {
        let (container, batches) = container(3);
        container.handle("a").unwrap();
        assert_eq!(container.buffered_rows(), vec!["a"]);
        assert_eq!(container.buffered_rows(), vec!["a"]);
        assert_eq!(container.buffered_len(), 1);
        assert!(batches.lock().unwrap().is_empty());
    }

    #[test]
    fn explicit_flush_sends_partial_batch() {
        let (container, batches) = container(3);
        container.handle("a").unwrap();
        container.handle("b").unwrap();

        assert_eq!(container.flush().unwrap(), 2);
        assert_eq!(container.flush().unwrap(), 0);
        assert_eq!(*batches.lock().unwrap(), vec![vec!["a", "b"]]);
        assert!(container.buffered_rows().is_empty());
    }

    #[test]
    fn failed_delivery_is_not_restored() {
        let container = BatchingContainer::new(2, Box::new(|_batch: Vec<&'static str>| -> Result<()> {
            anyhow::bail!("sink down")
        }));
        container.handle("a").unwrap();

        assert!(container.handle("b").is_err());
        assert!(container.buffered_rows().is_empty());
    }

    #[test]
    fn concurrent_producers_keep_batch_boundaries() {
        let (container, batches) = container(4);
        let container = Arc::new(container);

        let producers: Vec<_> = (0..8)
            .map(|_| {
                let container = Arc::clone(&container);
                std::thread::spawn(move || {
                    for _ in 0..25 {
                        container.handle("row").unwrap();
                    }
                })
            })
            .collect();
        for producer in producers {
            producer.join().unwrap();
        }

        let batches = batches.lock().unwrap();
        assert_eq!(batches.len(), 50);
        assert!(batches.iter().all(|batch| batch.len() == 4));
        assert_eq!(container.buffered_len(), 0);
    }

    #[test]
    fn huge_size_allocates_nothing_up_front() {
        let (container, batches) = container(usize::MAX);
        assert_eq!(container.size(), usize::MAX);

        container.handle("a").unwrap();
        assert_eq!(container.buffered_len(), 1);
        assert!(batches.lock().unwrap().is_empty());
    }

    #[test]
    fn zero_size_is_clamped() {
        let (container, batches) = container(0);
        assert_eq!(container.size(), 1);
        container.handle("a").unwrap();
        assert_eq!(batches.lock().unwrap().len(), 1);
    }
}
