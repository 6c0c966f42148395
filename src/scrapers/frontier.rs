//! Crawl queue: FIFO order, one visit per URL, bounded re-queueing.

use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestLabel {
    List,
    Detail,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlRequest {
    pub url: String,
    pub label: RequestLabel,
    /// Zero on the first visit
    pub attempt: u32,
}

impl CrawlRequest {
    pub fn new(url: impl Into<String>, label: RequestLabel) -> Self {
        Self {
            url: url.into(),
            label,
            attempt: 0,
        }
    }

    fn retry(self) -> Self {
        Self {
            attempt: self.attempt + 1,
            ..self
        }
    }
}

/// Outcome of handing a retryable failure back to the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Requeued { attempt: u32 },
    GaveUp,
}

#[derive(Debug)]
pub struct CrawlFrontier {
    queue: VecDeque<CrawlRequest>,
    seen: HashSet<String>,
    max_retries: u32,
}

impl CrawlFrontier {
    pub fn new(max_retries: u32) -> Self {
        Self {
            queue: VecDeque::new(),
            seen: HashSet::new(),
            max_retries,
        }
    }

    /// Frontier holding `urls` as search pages
    pub fn seeded<I, S>(urls: I, max_retries: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut frontier = Self::new(max_retries);
        for url in urls {
            frontier.enqueue(CrawlRequest::new(url, RequestLabel::List));
        }
        frontier
    }

    /// Queues `request` unless its URL was queued before. Returns whether it
    /// was added.
    pub fn enqueue(&mut self, request: CrawlRequest) -> bool {
        if !self.seen.insert(request.url.clone()) {
            return false;
        }
        self.queue.push_back(request);
        true
    }

    pub fn pop(&mut self) -> Option<CrawlRequest> {
        self.queue.pop_front()
    }

    /// Puts a failed request back at the end of the queue while it has
    /// attempts left. Re-queued requests bypass the seen set.
    pub fn retry(&mut self, request: CrawlRequest) -> RetryDecision {
        if request.attempt >= self.max_retries {
            return RetryDecision::GaveUp;
        }

        let request = request.retry();
        let attempt = request.attempt;
        self.queue.push_back(request);
        RetryDecision::Requeued { attempt }
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
