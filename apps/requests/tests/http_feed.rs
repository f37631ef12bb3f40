use daopad_requests::controller::ControllerOptions;
use daopad_requests::presentation::render_snapshot;
use daopad_requests::{
    Decision, Domain, FeedController, FetchOutcome, HttpStationActor, LogNotifier, TokenId,
};
use mockito::{Matcher, Server};
use serde_json::json;
use std::sync::Arc;

const TOKEN: &str = "ryjl3-tyaaa-aaaaa-aaaba-cai";

const LIST_BODY: &str = r#"{
  "Ok": {
    "requests": [
      {
        "id": "0b1c2d3e-4f50-6172-8394-a5b6c7d8e9f0",
        "title": "Transfer 250 ICP to grants",
        "status": { "Created": null },
        "operation_type": "Transfer",
        "requested_by": "member-1",
        "requester_name": "Alice",
        "created_at": "1700000000000000000",
        "expires_at": "1700086400000000000",
        "yes_votes": "600000000",
        "no_votes": "0",
        "total_voting_power": "1000000000"
      }
    ],
    "total": "1",
    "next_offset": null
  }
}"#;

fn feed_for(server: &Server, identity: Option<&str>) -> FeedController {
    let actor = HttpStationActor::new(&server.url(), identity).unwrap();
    FeedController::new(
        Arc::new(actor),
        Arc::new(LogNotifier),
        ControllerOptions::default(),
    )
    .unwrap()
}

#[tokio::test]
async fn lists_transfers_over_http() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("POST", "/list_orbit_requests")
        .match_body(Matcher::PartialJson(json!({
            "token_canister_id": TOKEN,
            "filters": {
                "operation_types": [{ "Transfer": null }],
                "paginate": { "limit": 20 }
            }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(LIST_BODY)
        .create_async()
        .await;

    let feed = feed_for(&server, None);
    feed.set_domain(Domain::Transfers).await;
    let outcome = feed.set_token(Some(TokenId::parse(TOKEN).unwrap())).await;
    assert_eq!(outcome, FetchOutcome::Applied);

    let snapshot = feed.snapshot();
    assert_eq!(snapshot.requests.len(), 1);
    assert_eq!(snapshot.requests[0].yes_votes, 600_000_000);
    assert_eq!(snapshot.requests[0].requester_name.as_deref(), Some("Alice"));

    let text = render_snapshot(&snapshot, chrono::Utc::now());
    assert!(text.contains("Transfer 250 ICP to grants"));
    assert!(text.contains("Showing 1 of 1 requests"));

    list.assert_async().await;
    feed.teardown().await;
}

#[tokio::test]
async fn vote_over_http_refetches_once() {
    let mut server = Server::new_async().await;
    let list = server
        .mock("POST", "/list_orbit_requests")
        .with_status(200)
        .with_body(LIST_BODY)
        .expect(2)
        .create_async()
        .await;
    let vote = server
        .mock("POST", "/vote_on_orbit_request")
        .match_header("authorization", "Bearer member-session")
        .match_body(Matcher::Json(json!({
            "token_id": TOKEN,
            "orbit_request_id": "0b1c2d3e-4f50-6172-8394-a5b6c7d8e9f0",
            "vote": false
        })))
        .with_status(200)
        .with_body(r#"{"Ok":null}"#)
        .expect(1)
        .create_async()
        .await;

    let feed = feed_for(&server, Some("member-session"));
    feed.set_token(Some(TokenId::parse(TOKEN).unwrap())).await;
    let outcome = feed
        .decide(
            "0b1c2d3e-4f50-6172-8394-a5b6c7d8e9f0",
            Decision::VoteNo,
            None,
        )
        .await
        .unwrap();

    assert_eq!(outcome, FetchOutcome::Applied);
    vote.assert_async().await;
    list.assert_async().await;
}

#[tokio::test]
async fn http_failures_surface_in_the_snapshot() {
    let mut server = Server::new_async().await;
    let _list = server
        .mock("POST", "/list_orbit_requests")
        .with_status(500)
        .with_body("internal error")
        .create_async()
        .await;

    let feed = feed_for(&server, None);
    let outcome = feed.set_token(Some(TokenId::parse(TOKEN).unwrap())).await;

    assert_eq!(outcome, FetchOutcome::Failed);
    let error = feed.snapshot().error.unwrap();
    assert!(error.contains("500"), "{error}");
}
