//! Business-network membership requests over HTTP.

mod common;

use axum::http::StatusCode;
use common::{TestServer, network_config};
use serde_json::json;

const BNO: &str = "O=BNO, L=London, C=GB";
const BNO_QUERY: &str = "bno=O%3DBNO%2C%20L%3DLondon%2C%20C%3DGB";

#[tokio::test]
async fn create_list_amend_round_trip() {
    let server = TestServer::new();

    let (status, created) = server
        .json_request(
            "POST",
            "/api/bnms/member/memberships",
            Some(json!({"bno": BNO, "metadata": {"role": "member"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["bno"], BNO);
    assert_eq!(created["member"], "O=PartyA, L=London, C=GB");
    assert_eq!(created["networkId"], "default");
    assert_eq!(created["status"], "PENDING");
    assert_eq!(created["metadata"]["role"], "member");

    let (status, listed) = server
        .json_request(
            "GET",
            &format!("/api/bnms/member/memberships?{BNO_QUERY}"),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created.clone()]));

    let (status, amended) = server
        .json_request(
            "PUT",
            "/api/bnms/member/memberships",
            Some(json!({"bno": BNO, "metadata": {"role": "admin"}})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amended["linearId"], created["linearId"]);
    assert_eq!(amended["metadata"]["role"], "admin");

    let (_, other_network) = server
        .json_request(
            "GET",
            &format!("/api/bnms/member/memberships?{BNO_QUERY}&networkId=other"),
            None,
        )
        .await;
    assert_eq!(other_network, json!([]));
}

#[tokio::test]
async fn memberships_are_per_node() {
    let server = TestServer::with_config(network_config());

    let (status, created) = server
        .json_request(
            "POST",
            "/api/nodes/partyB/bnms/member/memberships",
            Some(json!({"bno": BNO, "networkId": "trade"})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(created["member"], "O=PartyB, L=New York, C=US");
    assert_eq!(created["networkId"], "trade");

    let (_, on_b) = server
        .json_request(
            "GET",
            &format!("/api/bnms/member/memberships?{BNO_QUERY}&nodeName=partyB"),
            None,
        )
        .await;
    assert_eq!(on_b.as_array().unwrap().len(), 1);

    let (_, on_a) = server
        .json_request(
            "GET",
            &format!("/api/nodes/partyA/bnms/member/memberships?{BNO_QUERY}"),
            None,
        )
        .await;
    assert_eq!(on_a, json!([]));
}

#[tokio::test]
async fn amend_without_membership_is_not_found() {
    let server = TestServer::new();
    let (status, body) = server
        .json_request(
            "PUT",
            "/api/bnms/member/memberships",
            Some(json!({"bno": BNO})),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "not_found");
}

#[tokio::test]
async fn invalid_membership_requests() {
    let server = TestServer::new();

    let (status, body) = server
        .json_request("GET", "/api/bnms/member/memberships", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    let (status, body) = server
        .json_request(
            "POST",
            "/api/bnms/member/memberships",
            Some(json!({"bno": "not a party"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");

    let (status, body) = server
        .json_request(
            "GET",
            "/api/bnms/member/memberships?bno=O%3DBNO&forceRefresh=maybe",
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "bad_request");
}
