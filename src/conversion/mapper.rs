//! Bounded-concurrency task mapping.
//!
//! A fan-out/fan-in construct: up to `limit` workers run at once over an
//! ordered input, and every input index produces exactly one output. The
//! three drains differ only in how results are handed back:
//!
//! - [`map_bounded`] collects everything and preserves input order;
//! - [`input_order`] yields results one by one, still in input order (the
//!   multipart writer needs positional correspondence with the upload);
//! - [`completion_order`] yields results as they finish (archive entries
//!   are independent, so the fastest item goes out first).
//!
//! Workers are infallible by construction: per-item failures are folded into
//! the worker's output type, so one bad item can never abort its siblings.

use std::future::Future;

use futures::stream::{self, Stream, StreamExt};

/// Run `worker` over `items` with at most `limit` invocations in flight,
/// returning one result per item in input order. A `limit` of zero is
/// treated as one.
pub async fn map_bounded<T, R, F, Fut>(items: Vec<T>, limit: usize, worker: F) -> Vec<R>
where
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items.into_iter().enumerate().map(|(i, item)| worker(i, item)))
        .buffered(limit.max(1))
        .collect()
        .await
}

/// Bounded drain yielding `(input_index, result)` pairs in input order.
pub fn input_order<T, R, F, Fut>(
    items: Vec<T>,
    limit: usize,
    worker: F,
) -> impl Stream<Item = (usize, R)>
where
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items.into_iter().enumerate().map(move |(i, item)| {
        let fut = worker(i, item);
        async move { (i, fut.await) }
    }))
    .buffered(limit.max(1))
}

/// Bounded drain yielding `(input_index, result)` pairs in completion order.
pub fn completion_order<T, R, F, Fut>(
    items: Vec<T>,
    limit: usize,
    worker: F,
) -> impl Stream<Item = (usize, R)>
where
    F: Fn(usize, T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items.into_iter().enumerate().map(move |(i, item)| {
        let fut = worker(i, item);
        async move { (i, fut.await) }
    }))
    .buffer_unordered(limit.max(1))
}
