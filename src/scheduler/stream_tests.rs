//! Tests for the `Paced` stream combinator.

use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;

use super::test_fixtures::ms;
use super::{ConfigError, Paced, SchedulerConfig};

#[tokio::test(start_paused = true)]
async fn settle_yields_the_last_item_of_each_burst() {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = UnboundedReceiverStream::new(rx);
    let paced = Paced::new(stream, SchedulerConfig::settle(ms(300))).unwrap();
    let start = Instant::now();

    let producer = tokio::spawn(async move {
        for item in [1, 2, 3] {
            tx.send(item).unwrap();
        }
        tokio::time::sleep(ms(400)).await;
        tx.send(4).unwrap();
    });

    let items: Vec<_> = paced.map(|item| (item, Instant::now() - start)).collect().await;
    producer.await.unwrap();

    // The burst settles to its last item at t=300; item 4 is yielded when
    // the upstream closes right behind it.
    assert_eq!(items, vec![(3, ms(300)), (4, ms(400))]);
}

#[tokio::test(start_paused = true)]
async fn rate_capped_paces_a_continuous_stream() {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = UnboundedReceiverStream::new(rx);
    let paced = Paced::new(stream, SchedulerConfig::rate_capped(ms(200))).unwrap();
    let start = Instant::now();

    let producer = tokio::spawn(async move {
        for item in 0..8 {
            tx.send(item).unwrap();
            tokio::time::sleep(ms(45)).await;
        }
        // Keep the upstream open until well past the trailing edge.
        tokio::time::sleep(ms(500)).await;
        drop(tx);
    });

    let items: Vec<_> = paced.map(|item| (item, Instant::now() - start)).collect().await;
    producer.await.unwrap();

    // Leading edge, one trailing execution per window with the latest
    // item seen inside it.
    assert_eq!(items, vec![(0, ms(0)), (4, ms(200)), (7, ms(400))]);
}

#[tokio::test(start_paused = true)]
async fn items_slower_than_the_interval_all_pass() {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = UnboundedReceiverStream::new(rx);
    let paced = Paced::new(stream, SchedulerConfig::rate_capped(ms(100))).unwrap();
    let start = Instant::now();

    let producer = tokio::spawn(async move {
        for item in 0..3 {
            tx.send(item).unwrap();
            tokio::time::sleep(ms(150)).await;
        }
    });

    let items: Vec<_> = paced.map(|item| (item, Instant::now() - start)).collect().await;
    producer.await.unwrap();

    assert_eq!(items, vec![(0, ms(0)), (1, ms(150)), (2, ms(300))]);
}

#[tokio::test(start_paused = true)]
async fn settle_with_leading_fires_both_edges() {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = UnboundedReceiverStream::new(rx);
    let config = SchedulerConfig::settle(ms(300)).with_leading(true);
    let paced = Paced::new(stream, config).unwrap();
    let start = Instant::now();

    let producer = tokio::spawn(async move {
        for item in [1, 2, 3] {
            tx.send(item).unwrap();
        }
        tokio::time::sleep(ms(400)).await;
        drop(tx);
    });

    let items: Vec<_> = paced.map(|item| (item, Instant::now() - start)).collect().await;
    producer.await.unwrap();

    assert_eq!(items, vec![(1, ms(0)), (3, ms(300))]);
}

#[tokio::test(start_paused = true)]
async fn finite_burst_collapses_to_the_last_item() {
    let paced = Paced::new(
        tokio_stream::iter([1, 2, 3]),
        SchedulerConfig::settle(ms(300)),
    )
    .unwrap();
    let start = Instant::now();

    let items: Vec<_> = paced.collect().await;

    // The upstream ended, so the pending item is yielded without waiting
    // out the window.
    assert_eq!(items, vec![3]);
    assert_eq!(Instant::now(), start);
}

#[tokio::test(start_paused = true)]
async fn empty_upstream_yields_nothing() {
    let paced = Paced::new(
        tokio_stream::iter(Vec::<u32>::new()),
        SchedulerConfig::settle(ms(300)),
    )
    .unwrap();

    let items: Vec<u32> = paced.collect().await;

    assert!(items.is_empty());
}

#[tokio::test(start_paused = true)]
async fn invalid_config_is_rejected() {
    let result = Paced::new(
        tokio_stream::iter([1, 2, 3]),
        SchedulerConfig::settle(ms(0)),
    );

    assert!(matches!(result, Err(ConfigError::ZeroInterval)));
}

#[tokio::test(start_paused = true)]
async fn into_inner_returns_the_upstream() {
    let (tx, rx) = mpsc::unbounded_channel();
    let stream = UnboundedReceiverStream::new(rx);
    let paced = Paced::new(stream, SchedulerConfig::settle(ms(300))).unwrap();

    tx.send(1).unwrap();
    let mut inner = paced.into_inner();

    assert_eq!(inner.next().await, Some(1));
}
