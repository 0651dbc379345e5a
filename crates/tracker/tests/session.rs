#![allow(missing_docs)]


use std::time::Duration;

use fleet_sdk::WatchId;
use fleet_tracker::{Config, DeviceId, Error, Session, SessionHandle};
use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::time::sleep;

use self::provider::{LocationMode, MockProvider, Reply};

fn start(provider: &MockProvider) -> (SessionHandle, tokio::task::JoinHandle<()>) {
    let session =
        Session::with_device_id(provider.clone(), Config::default(), DeviceId::from("mobile-test00001"));
    let handle = session.handle();
    (handle, tokio::spawn(session.run()))
}

// Should stop polling and release the location watch on shutdown.
#[tokio::test(start_paused = true)]
async fn shutdown_releases_everything() {
    let provider = MockProvider::new(LocationMode::Stream);
    let (handle, task) = start(&provider);

    handle.arm().expect("session running");
    sleep(Duration::from_millis(10)).await;
    assert_eq!(provider.watches(), 1);

    handle.shutdown().expect("session running");
    task.await.expect("session exits cleanly");

    assert_eq!(provider.unsubscribed(), [WatchId(1)]);
    let requests = provider.total_requests();
    sleep(Duration::from_secs(30)).await;
    assert_eq!(provider.total_requests(), requests);

    assert_eq!(handle.arm(), Err(Error::SessionClosed));
    assert_eq!(handle.select("v1"), Err(Error::SessionClosed));
}

// Should stop everything when the session is dropped without running.
#[tokio::test(start_paused = true)]
async fn dropped_session_closes_handle() {
    let provider = MockProvider::new(LocationMode::Stream);
    let session = Session::new(provider.clone(), Config::default());
    let handle = session.handle();
    drop(session);

    sleep(Duration::from_secs(10)).await;
    assert_eq!(provider.total_requests(), 0);
    assert_eq!(handle.toggle(), Err(Error::SessionClosed));
}

// Should generate a device id of the expected shape.
#[tokio::test]
async fn generated_device_id() {
    let session = Session::new(MockProvider::default(), Config::default());
    let id = session.device_id().to_string();

    assert!(id.starts_with("mobile-"));
    assert_eq!(session.handle().snapshot().device_id.to_string(), id);
}

// Should notify subscribers on every applied change.
#[tokio::test(start_paused = true)]
async fn snapshots_notify_changes() {
    let provider = MockProvider::new(LocationMode::Stream);
    provider.fleet(Reply::json(&json!([{"id": "v1", "name": "Van", "lat": 1.0, "lng": 1.0}])));
    let (handle, _task) = start(&provider);
    let mut snapshots = handle.snapshots();

    snapshots.changed().await.expect("session running");
    assert_eq!(snapshots.borrow_and_update().entities.len(), 1);

    handle.select("v1").expect("session running");
    snapshots.changed().await.expect("session running");
    let snapshot = snapshots.borrow_and_update().clone();
    assert_eq!(snapshot.selected().map(|e| e.name.as_str()), Some("Van"));

    handle.clear_selection().expect("session running");
    snapshots.changed().await.expect("session running");
    assert!(snapshots.borrow_and_update().view.selected_id.is_none());
}

// Should apply commands in the order they were issued.
#[tokio::test(start_paused = true)]
async fn commands_apply_in_order() {
    let provider = MockProvider::new(LocationMode::Stream);
    let (handle, _task) = start(&provider);

    handle.arm().expect("session running");
    handle.disarm().expect("session running");
    handle.toggle().expect("session running");
    handle.select("a").expect("session running");
    handle.select("b").expect("session running");
    sleep(Duration::from_millis(10)).await;

    let view = handle.snapshot().view;
    assert!(view.transmitting);
    assert_eq!(view.selected_id.as_deref(), Some("b"));
    assert_eq!(provider.watches(), 2);
    assert_eq!(provider.unsubscribed(), [WatchId(1)]);
}
