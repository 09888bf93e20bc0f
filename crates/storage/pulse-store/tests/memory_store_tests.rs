//! Contract tests for the in-memory backend

mod common;

use common::StoreFixture;
use pulse_store::EventFilter;

#[tokio::test]
async fn test_append_and_read() {
    let fixture = StoreFixture::memory().await;
    assert_eq!(fixture.store.backend_name(), "memory");
    common::check_append_and_read(&fixture).await;
}

#[tokio::test]
async fn test_newest_first_with_limit() {
    common::check_newest_first(&StoreFixture::memory().await).await;
}

#[tokio::test]
async fn test_time_window() {
    common::check_time_window(&StoreFixture::memory().await).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_appends() {
    common::check_concurrent_appends(&StoreFixture::memory().await, 200).await;
}

#[tokio::test]
async fn test_grouped_summaries() {
    common::check_grouped_summaries(&StoreFixture::memory().await).await;
}

#[tokio::test]
async fn test_schema_is_idempotent() {
    common::check_schema_is_idempotent(&StoreFixture::memory().await).await;
}

#[tokio::test]
async fn test_empty_store() {
    let fixture = StoreFixture::memory().await;
    assert!(fixture.store.replacements(&EventFilter::all()).await.unwrap().is_empty());
    assert!(fixture.store.errors(&EventFilter::newest(10)).await.unwrap().is_empty());
    assert_eq!(fixture.store.count_errors(&EventFilter::all()).await.unwrap(), 0);
}
