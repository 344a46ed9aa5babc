//! Fixture-style tests: build a store per test, drive it through clients,
//! reset it on teardown.

use bytes::Bytes;
use mockkv::{MockClient, MockPubSubClient, MockStore, Reply, StoreConfig, StoreError};
use std::time::Duration;

/// Per-test fixture holding one store and the clients the test uses.
struct Fixture {
    store: MockStore,
    client: MockClient,
    pubsub: MockPubSubClient,
}

impl Fixture {
    fn new(name: &str) -> Self {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();

        let store = MockStore::with_config(StoreConfig {
            name: name.to_string(),
            ..Default::default()
        });
        Self {
            client: MockClient::new(store.clone()),
            pubsub: MockPubSubClient::new(store.clone()),
            store,
        }
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        self.store.reset_all();
    }
}

#[tokio::test]
async fn test_pubsub_ordering() -> anyhow::Result<()> {
    let fx = Fixture::new("pubsub-ordering");

    fx.pubsub.subscribe(["c"]);
    fx.client.call("PUBLISH", ["c", "m1"])?;
    fx.client.call("PUBLISH", ["c", "m2"])?;

    assert_eq!(fx.pubsub.pop_message().await, Bytes::from("m1"));
    assert_eq!(fx.pubsub.pop_message().await, Bytes::from("m2"));
    Ok(())
}

#[tokio::test]
async fn test_blocking_pop_resolves() -> anyhow::Result<()> {
    let fx = Fixture::new("blocking-pop");
    fx.pubsub.subscribe(["c"]);

    let publisher = fx.client.clone();
    let (popped, published) = tokio::join!(fx.pubsub.pop_message(), async move {
        tokio::task::yield_now().await;
        publisher.call("PUBLISH", ["c", "m"])
    });

    assert_eq!(published?, Reply::integer(1));
    assert_eq!(popped, Bytes::from("m"));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_expiry_through_client() -> anyhow::Result<()> {
    let fx = Fixture::new("expiry");

    fx.client.call("SETEX", ["token", "30", "abc"])?;
    tokio::time::advance(Duration::from_secs(29)).await;
    assert_eq!(fx.client.call("GET", ["token"])?, Reply::bulk("abc"));

    tokio::time::advance(Duration::from_secs(1)).await;
    assert_eq!(fx.client.call("GET", ["token"])?, Reply::Null);
    assert_eq!(fx.store.stats().storage.keys, 0);
    Ok(())
}

#[tokio::test]
async fn test_pop_timeout_leaves_no_trace() -> anyhow::Result<()> {
    let fx = Fixture::new("pop-timeout");
    fx.pubsub.subscribe(["c"]);

    let popped = fx.pubsub.pop_message_timeout(Duration::from_millis(20)).await;
    assert_eq!(popped, None);

    fx.client.call("PUBLISH", ["c", "after"])?;
    assert_eq!(fx.pubsub.pending(), 1);
    assert_eq!(fx.pubsub.pop_message().await, Bytes::from("after"));
    Ok(())
}

#[test]
fn test_hash_and_list_workflow() -> anyhow::Result<()> {
    let fx = Fixture::new("workflow");

    fx.client.call("HMSET", ["cart:1", "apples", "2", "pears", "1"])?;
    assert_eq!(fx.client.call("HSET", ["cart:1", "plums", "4"])?, Reply::integer(1));
    assert_eq!(fx.client.call("HSET", ["cart:1", "plums", "5"])?, Reply::integer(0));
    assert_eq!(fx.client.call("HGET", ["cart:1", "plums"])?, Reply::bulk("5"));

    fx.client.call("RPUSH", ["log", "created", "updated"])?;
    assert_eq!(
        fx.client.call("LRANGE", ["log", "1"])?,
        Reply::array(vec![Reply::bulk("updated")])
    );

    assert_eq!(fx.client.call("DEL", ["cart:1", "log", "ghost"])?, Reply::integer(2));
    Ok(())
}

#[test]
fn test_errors_surface_to_caller() {
    let fx = Fixture::new("errors");

    assert_eq!(
        fx.client.call("BLPOP", ["q", "0"]),
        Err(StoreError::UnknownCommand("BLPOP".to_string()))
    );
    let err = fx.client.call("HMSET", ["h", "odd"]).unwrap_err();
    assert!(err.is_invalid_arguments());
}

#[test]
fn test_reset_between_cases() {
    let store = {
        let fx = Fixture::new("teardown");
        fx.client.call("SET", ["leak", "1"]).unwrap();
        fx.pubsub.subscribe(["c"]);
        fx.store.clone()
    };

    // Fixture dropped: keyspace and channels are gone
    assert!(store.channels().is_empty());
    assert_eq!(store.execute("GET", ["leak"]).unwrap(), Reply::Null);
}
