mod common;

use common::MockFetch;
use httpmock::Method::GET;
use httpmock::MockServer;
use mcp_relay::config::TrainConfig;
use mcp_relay::fetch::HttpFetcher;
use mcp_relay::servers::train::VEHICLE_KINDS_UNAVAILABLE;
use mcp_relay::servers::TrainServer;
use serde_json::json;
use std::sync::Arc;

fn vehicle_kinds() -> serde_json::Value {
    json!({ "response": {
        "header": { "resultCode": "00", "resultMsg": "NORMAL SERVICE." },
        "body": { "items": { "item": [
            { "vehiclekndid": "00", "vehiclekndnm": "KTX" },
            { "vehiclekndid": "01", "vehiclekndnm": "새마을호" },
            { "vehiclekndid": "07", "vehiclekndnm": "KTX-산천" }
        ]}, "numOfRows": 10, "pageNo": 1, "totalCount": 3 }
    }})
}

#[tokio::test]
async fn exact_name_match_only() {
    let fetch = MockFetch::new().route("https://trains.test/getVhcleKndList", vehicle_kinds());
    let server = TrainServer::new(Arc::new(fetch), "https://trains.test/", None);

    assert_eq!(server.train_code("KTX").await, "Code: 00\nName: KTX");
    assert_eq!(server.train_code("KTX-산천").await, "Code: 07\nName: KTX-산천");
}

#[tokio::test]
async fn unmatched_name_is_reported() {
    let fetch = MockFetch::new().route("https://trains.test/getVhcleKndList", vehicle_kinds());
    let server = TrainServer::new(Arc::new(fetch), "https://trains.test", None);

    assert_eq!(server.train_code("ktx").await, "No vehicle type named ktx.");
}

#[tokio::test]
async fn lookup_failure_sentinel() {
    let server = TrainServer::new(Arc::new(MockFetch::new()), "https://trains.test", None);
    assert_eq!(server.train_code("KTX").await, VEHICLE_KINDS_UNAVAILABLE);
}

#[tokio::test]
async fn service_key_and_format_are_sent() {
    let upstream = MockServer::start();
    let mock = upstream.mock(|when, then| {
        when.method(GET)
            .path("/getVhcleKndList")
            .query_param("_type", "json")
            .query_param("serviceKey", "test-key");
        then.status(200).json_body(vehicle_kinds());
    });

    let config = TrainConfig {
        base_url: upstream.base_url(),
        service_key: Some("test-key".to_string()),
    };
    let fetcher = HttpFetcher::new(config.transport_options()).unwrap();
    let server = TrainServer::new(Arc::new(fetcher), config.base_url, config.service_key);

    let kinds = server.vehicle_kinds().await.unwrap();
    mock.assert();
    assert_eq!(kinds.len(), 3);
    assert_eq!(kinds[1].name, "새마을호");
}

#[tokio::test]
async fn empty_listing_finds_nothing() {
    let fetch = MockFetch::new().route(
        "https://trains.test/getVhcleKndList",
        json!({ "response": { "body": { "items": "" } } }),
    );
    let server = TrainServer::new(Arc::new(fetch), "https://trains.test", None);

    assert!(server.vehicle_kinds().await.unwrap().is_empty());
    assert_eq!(server.train_code("KTX").await, "No vehicle type named KTX.");
}
