//! Black-box tests against the real router and a real Postgres.
//!
//! Set `TEST_DATABASE_URL` to run these; without it each test skips with a
//! note. Every test seeds its own uniquely-named item, so suites can run in
//! parallel against a shared database.

use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use uuid::Uuid;

use flashdrop_api::app::{self, services::AppServices};
use flashdrop_api::config::Config;
use flashdrop_core::{Item, ItemId};

struct TestServer {
    base_url: String,
    seed: Item,
    services: Arc<AppServices>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    /// Build the prod router (same wiring as `main.rs`) against the test
    /// database, bound to an ephemeral port.
    async fn spawn(seed: Item) -> Option<Self> {
        let database_url = match std::env::var("TEST_DATABASE_URL") {
            Ok(url) => url,
            Err(_) => {
                eprintln!("TEST_DATABASE_URL not set; skipping black-box API test");
                return None;
            }
        };

        let config = Config {
            database_url,
            bind_addr: "127.0.0.1:0".to_string(),
            item: seed.clone(),
        };

        let services = Arc::new(
            app::services::build_services(&config)
                .await
                .expect("build services"),
        );
        let router = app::build_app(services.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        let base_url = format!("http://{addr}");

        let handle = tokio::spawn(async move {
            axum::serve(listener, router).await.expect("serve");
        });

        Some(Self {
            base_url,
            seed,
            services,
            handle,
        })
    }

    fn item_id(&self) -> &str {
        self.seed.id.as_str()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn fresh_seed(quantity: i64) -> Item {
    Item {
        id: ItemId::new(format!("drop-{}", Uuid::now_v7())),
        name: "Limited Edition Print".to_string(),
        description: Some("black-box fixture".to_string()),
        image_url: Some("https://example.com/print.png".to_string()),
        quantity,
    }
}

#[tokio::test]
async fn health_is_unconditionally_ok() {
    let Some(srv) = TestServer::spawn(fresh_seed(1)).await else {
        return;
    };

    let res = reqwest::get(format!("{}/health", srv.base_url)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn status_of_unknown_item_is_a_stable_not_found() {
    let Some(srv) = TestServer::spawn(fresh_seed(1)).await else {
        return;
    };

    let client = reqwest::Client::new();
    let res = client
        .get(format!("{}/status/ghost-{}", srv.base_url, Uuid::now_v7()))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn buy_decrements_stock_and_appends_an_order() {
    let Some(srv) = TestServer::spawn(fresh_seed(2)).await else {
        return;
    };
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/buy/{}", srv.base_url, srv.item_id()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["item_id"].as_str().unwrap(), srv.item_id());
    assert!(body["order_id"].is_i64());

    let res = client
        .get(format!("{}/status/{}", srv.base_url, srv.item_id()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["quantity"].as_i64().unwrap(), 1);
    assert_eq!(body["orders"].as_i64().unwrap(), 1);
}

#[tokio::test]
async fn sold_out_is_a_stable_conflict() {
    let Some(srv) = TestServer::spawn(fresh_seed(0)).await else {
        return;
    };

    let client = reqwest::Client::new();
    let res = client
        .post(format!("{}/buy/{}", srv.base_url, srv.item_id()))
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["error"], "sold_out");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn hundred_concurrent_buyers_exactly_one_winner() {
    let Some(srv) = TestServer::spawn(fresh_seed(1)).await else {
        return;
    };
    let client = reqwest::Client::new();

    let mut requests = Vec::with_capacity(100);
    for _ in 0..100 {
        let client = client.clone();
        let url = format!("{}/buy/{}", srv.base_url, srv.item_id());
        requests.push(tokio::spawn(async move {
            client.post(url).send().await.unwrap().status()
        }));
    }

    let mut won = 0;
    let mut sold_out = 0;
    for request in requests {
        let status = request.await.unwrap();
        if status == StatusCode::OK {
            won += 1;
        } else if status == StatusCode::CONFLICT {
            sold_out += 1;
        } else {
            panic!("unexpected status: {status}");
        }
    }
    assert_eq!(won, 1);
    assert_eq!(sold_out, 99);

    let res = client
        .get(format!("{}/status/{}", srv.base_url, srv.item_id()))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = res.json().await.unwrap();
    assert_eq!(body["quantity"].as_i64().unwrap(), 0);
    assert_eq!(body["orders"].as_i64().unwrap(), 1);
}

#[tokio::test]
async fn reset_restores_the_configured_quantity_idempotently() {
    let Some(srv) = TestServer::spawn(fresh_seed(1)).await else {
        return;
    };
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/buy/{}", srv.base_url, srv.item_id()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    for _ in 0..2 {
        let res = client
            .post(format!("{}/reset/{}", srv.base_url, srv.item_id()))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);

        let res = client
            .get(format!("{}/status/{}", srv.base_url, srv.item_id()))
            .send()
            .await
            .unwrap();
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["quantity"].as_i64().unwrap(), 1);
        assert_eq!(body["orders"].as_i64().unwrap(), 0);
    }

    // Unknown ids keep the taxonomy: reset is a 404, not a silent no-op.
    let res = client
        .post(format!("{}/reset/ghost-{}", srv.base_url, Uuid::now_v7()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn live_feed_streams_stock_events_and_cleans_up_on_disconnect() {
    let Some(srv) = TestServer::spawn(fresh_seed(1)).await else {
        return;
    };
    let client = reqwest::Client::new();

    let mut feed = client
        .get(format!("{}/live", srv.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(feed.status(), StatusCode::OK);
    assert_eq!(srv.services.hub().listener_count(), 1);

    let res = client
        .post(format!("{}/buy/{}", srv.base_url, srv.item_id()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // The committed purchase must surface as one framed `stock` event.
    let mut body = String::new();
    let received = tokio::time::timeout(Duration::from_secs(5), async {
        while let Some(bytes) = feed.chunk().await.expect("read live feed") {
            body.push_str(&String::from_utf8_lossy(&bytes));
            if body.contains("event: stock") && body.contains("\"quantity\":0") {
                return;
            }
        }
        panic!("live feed ended unexpectedly");
    })
    .await;
    assert!(received.is_ok(), "no stock event within timeout: {body:?}");

    // Disconnecting unregisters the listener exactly once.
    drop(feed);
    for _ in 0..250 {
        if srv.services.hub().listener_count() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(srv.services.hub().listener_count(), 0);
}
