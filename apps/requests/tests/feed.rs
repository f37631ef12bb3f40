mod common;

use common::*;
use daopad_orbit::{ApprovalDecision, BackendError, RequestStatusCode, codes};
use daopad_requests::controller::ControllerOptions;
use daopad_requests::{Decision, Domain, FeedError, FeedPhase, FetchOutcome, StatusPreset};
use std::time::Duration;

#[tokio::test]
async fn same_state_sends_identical_payloads() {
    let station = MockStation::new();
    let (feed, _) = feed(&station);

    feed.set_token(Some(token())).await;
    feed.refresh().await;

    let calls = station.list_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].0, TOKEN);
    assert_eq!(
        serde_json::to_string(&calls[0].1).unwrap(),
        serde_json::to_string(&calls[1].1).unwrap()
    );
}

#[tokio::test]
async fn no_token_means_no_backend_call() {
    let station = MockStation::new();
    let (feed, notifier) = feed(&station);

    assert_eq!(feed.refresh().await, FetchOutcome::Skipped);
    assert_eq!(feed.set_domain(Domain::Transfers).await, FetchOutcome::Skipped);
    assert_eq!(feed.next_page().await, FetchOutcome::Skipped);

    let snapshot = feed.snapshot();
    assert_eq!(station.list_call_count(), 0);
    assert_eq!(snapshot.phase, FeedPhase::Idle);
    assert!(snapshot.requests.is_empty());
    assert!(snapshot.error.is_none());
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn clearing_the_token_empties_the_feed_without_a_call() {
    let station = MockStation::new();
    station.push_list(Ok(page_of(vec![wire_request("a", "Created", "Transfer")], 1)));
    let (feed, _) = feed(&station);

    feed.set_token(Some(token())).await;
    assert_eq!(feed.snapshot().requests.len(), 1);

    assert_eq!(feed.set_token(None).await, FetchOutcome::Skipped);
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.phase, FeedPhase::Idle);
    assert!(snapshot.requests.is_empty());
    assert_eq!(snapshot.pagination.total, 0);
    assert_eq!(station.list_call_count(), 1);
}

#[tokio::test]
async fn users_domain_queries_completed_requests_too() {
    let station = MockStation::new();
    let (feed, _) = feed(&station);

    feed.set_domain(Domain::Users).await;
    feed.set_token(Some(token())).await;

    let (_, input) = station.list_calls().pop().unwrap();
    let statuses = input.statuses.unwrap();
    assert!(statuses.contains(&RequestStatusCode::Completed));
    assert_eq!(statuses.len(), 5);
    assert_eq!(input.operation_types.unwrap().len(), 5);
}

#[tokio::test]
async fn filter_changes_go_back_to_the_first_page() {
    let station = MockStation::new();
    let (feed, _) = feed(&station);
    feed.set_token(Some(token())).await;

    feed.set_page(3).await;
    let (_, input) = station.list_calls().pop().unwrap();
    assert_eq!(input.paginate.unwrap().offset, Some(60));

    feed.toggle_status(RequestStatusCode::Failed).await.unwrap();
    let (_, input) = station.list_calls().pop().unwrap();
    assert_eq!(input.paginate.unwrap().offset, None);
    assert_eq!(feed.snapshot().filters.page(), 0);
}

#[tokio::test]
async fn next_page_stops_on_the_last_page() {
    let station = MockStation::new();
    station.push_list(Ok(page_of(vec![wire_request("a", "Created", "Transfer")], 1)));
    let (feed, _) = feed(&station);
    feed.set_token(Some(token())).await;

    assert_eq!(feed.next_page().await, FetchOutcome::Skipped);
    assert_eq!(station.list_call_count(), 1);

    let snapshot = feed.snapshot();
    assert_eq!(snapshot.filters.page(), 0);
    assert_eq!(snapshot.page_count(), 1);
}

#[tokio::test]
async fn next_page_follows_the_backend_until_it_runs_out() {
    let station = MockStation::new();
    station.push_list(Ok(page_with_more(
        vec![wire_request("a", "Created", "Transfer")],
        25,
        20,
    )));
    station.push_list(Ok(page_of(vec![wire_request("b", "Created", "Transfer")], 25)));
    let (feed, _) = feed(&station);
    feed.set_token(Some(token())).await;

    assert_eq!(feed.next_page().await, FetchOutcome::Applied);
    let (_, input) = station.list_calls().pop().unwrap();
    assert_eq!(input.paginate.unwrap().offset, Some(20));

    assert_eq!(feed.next_page().await, FetchOutcome::Skipped);
    assert_eq!(station.list_call_count(), 2);
    assert_eq!(feed.snapshot().filters.page(), 1);
}

#[tokio::test]
async fn status_presets_replace_statuses_and_reset_the_page() {
    let station = MockStation::new();
    let (feed, _) = feed(&station);
    feed.set_token(Some(token())).await;

    feed.set_page(3).await;
    assert_eq!(feed.pending_only().await, FetchOutcome::Applied);
    let (_, input) = station.list_calls().pop().unwrap();
    assert_eq!(input.paginate.unwrap().offset, None);
    assert_eq!(
        input.statuses.unwrap(),
        vec![RequestStatusCode::Created, RequestStatusCode::Scheduled]
    );
    assert_eq!(
        feed.snapshot().filters.active_preset(),
        Some(StatusPreset::PendingOnly)
    );

    feed.set_page(2).await;
    assert_eq!(feed.resolved_only().await, FetchOutcome::Applied);
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.filters.page(), 0);
    assert_eq!(snapshot.filters.active_preset(), Some(StatusPreset::ResolvedOnly));
    assert_eq!(
        station.list_calls().pop().unwrap().1.paginate.unwrap().offset,
        None
    );
}

#[tokio::test]
async fn vote_triggers_exactly_one_refetch_with_current_page() {
    let station = MockStation::new();
    let (feed, notifier) = feed(&station);

    feed.set_token(Some(token())).await;
    feed.set_page(2).await;
    let before = station.list_call_count();

    let outcome = feed.decide("req-7", Decision::VoteYes, None).await.unwrap();
    assert_eq!(outcome, FetchOutcome::Applied);

    let calls = station.list_calls();
    assert_eq!(calls.len(), before + 1);
    let (_, refetch) = calls.last().unwrap();
    assert_eq!(refetch.paginate.as_ref().unwrap().offset, Some(40));

    let decisions = station.decision_calls();
    assert_eq!(decisions.len(), 1);
    assert_eq!(
        decisions[0].0,
        DecisionCall::Vote {
            request_id: "req-7".to_string(),
            vote: true
        }
    );
    assert!(notifier.messages().contains(&"success: Voted yes".to_string()));
}

#[tokio::test(start_paused = true)]
async fn refetch_after_vote_uses_the_page_current_when_it_lands() {
    let station = MockStation::new();
    station.push_decision(unavailable());
    let (feed, _) = feed(&station);
    feed.set_token(Some(token())).await;

    let vote = tokio::spawn({
        let feed = feed.clone();
        async move { feed.decide("req-3", Decision::VoteYes, None).await }
    });
    tokio::time::sleep(Duration::from_millis(1000)).await;
    feed.set_page(5).await;
    let before = station.list_call_count();

    vote.await.unwrap().unwrap();

    let calls = station.list_calls();
    assert_eq!(calls.len(), before + 1);
    assert_eq!(calls.last().unwrap().1.paginate.as_ref().unwrap().offset, Some(100));
}

#[tokio::test]
async fn reasons_are_only_sent_with_approvals() {
    let station = MockStation::new();
    let (feed, _) = feed(&station);
    feed.set_token(Some(token())).await;

    feed.decide("req-1", Decision::VoteNo, Some("ignored"))
        .await
        .unwrap();
    feed.decide("req-2", Decision::Reject, Some("over budget"))
        .await
        .unwrap();

    let decisions: Vec<_> = station
        .decision_calls()
        .into_iter()
        .map(|(call, _)| call)
        .collect();
    assert_eq!(
        decisions,
        vec![
            DecisionCall::Vote {
                request_id: "req-1".to_string(),
                vote: false
            },
            DecisionCall::Approval {
                request_id: "req-2".to_string(),
                decision: ApprovalDecision::Rejected,
                reason: Some("over budget".to_string())
            },
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn service_unavailable_vote_is_retried_once_after_three_seconds() {
    let station = MockStation::new();
    station.push_decision(unavailable());
    let (feed, notifier) = feed(&station);
    feed.set_token(Some(token())).await;
    let before = station.list_call_count();

    feed.decide("req-1", Decision::VoteYes, None).await.unwrap();

    let decisions = station.decision_calls();
    assert_eq!(decisions.len(), 2);
    assert_eq!(decisions[0].0, decisions[1].0);
    let waited = decisions[1].1 - decisions[0].1;
    assert!(waited >= Duration::from_millis(3000), "waited {waited:?}");
    assert!(waited < Duration::from_millis(3100), "waited {waited:?}");

    assert_eq!(station.list_call_count(), before + 1);
    assert!(
        notifier
            .messages()
            .iter()
            .any(|m| m.starts_with("info: service unavailable"))
    );
}

#[tokio::test(start_paused = true)]
async fn teardown_cancels_a_pending_vote_retry() {
    let station = MockStation::new();
    station.push_decision(unavailable());
    let (feed, _) = feed(&station);
    feed.set_token(Some(token())).await;

    let pending = tokio::spawn({
        let feed = feed.clone();
        async move { feed.decide("req-1", Decision::VoteYes, None).await }
    });

    tokio::time::sleep(Duration::from_millis(1000)).await;
    feed.teardown().await;

    assert!(matches!(pending.await.unwrap(), Err(FeedError::Cancelled)));
    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(station.decision_calls().len(), 1);
}

#[tokio::test]
async fn failed_decision_sets_the_error_and_skips_the_refetch() {
    let station = MockStation::new();
    station.push_decision(Ok(daopad_orbit::ActionResult::Err(BackendError::new(
        codes::ALREADY_VOTED,
        "You have already voted",
    ))));
    let (feed, notifier) = feed(&station);
    feed.set_token(Some(token())).await;
    let before = station.list_call_count();

    let err = feed
        .decide("req-1", Decision::VoteYes, None)
        .await
        .unwrap_err();

    assert_eq!(err.code(), Some(codes::ALREADY_VOTED));
    assert_eq!(station.list_call_count(), before);
    assert_eq!(feed.snapshot().error.as_deref(), Some("You have already voted"));
    assert!(
        notifier
            .messages()
            .contains(&"error: You have already voted".to_string())
    );
}

#[tokio::test]
async fn anonymous_sessions_cannot_vote() {
    let station = MockStation::anonymous();
    let (feed, _) = feed(&station);
    feed.set_token(Some(token())).await;

    let err = feed
        .decide("req-1", Decision::VoteYes, None)
        .await
        .unwrap_err();
    assert!(matches!(err, FeedError::AuthRequired));
    assert!(station.decision_calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn stale_responses_are_discarded() {
    let station = MockStation::new();
    station.push_list(Ok(page_of(vec![wire_request("first", "Created", "Transfer")], 1)));
    station.push_list_delayed(
        Duration::from_millis(500),
        Ok(page_of(vec![wire_request("old", "Created", "Transfer")], 1)),
    );
    station.push_list_delayed(
        Duration::from_millis(10),
        Ok(page_of(vec![wire_request("new", "Created", "Transfer")], 1)),
    );
    let (feed, _) = feed(&station);
    feed.set_token(Some(token())).await;

    let slow = tokio::spawn({
        let feed = feed.clone();
        async move { feed.refresh().await }
    });
    tokio::time::sleep(Duration::from_millis(1)).await;

    assert_eq!(feed.refresh().await, FetchOutcome::Applied);
    assert_eq!(slow.await.unwrap(), FetchOutcome::Stale);

    let ids: Vec<_> = feed
        .snapshot()
        .requests
        .into_iter()
        .map(|r| r.id)
        .collect();
    assert_eq!(ids, vec!["new".to_string()]);
    assert!(!feed.snapshot().loading);
}

#[tokio::test(start_paused = true)]
async fn teardown_drops_in_flight_responses() {
    let station = MockStation::new();
    station.push_list(Ok(page_of(vec![wire_request("kept", "Created", "Transfer")], 1)));
    station.push_list_delayed(
        Duration::from_millis(500),
        Ok(page_of(vec![wire_request("late", "Created", "Transfer")], 1)),
    );
    let (feed, _) = feed(&station);
    feed.set_token(Some(token())).await;

    let in_flight = tokio::spawn({
        let feed = feed.clone();
        async move { feed.refresh().await }
    });
    tokio::time::sleep(Duration::from_millis(1)).await;
    feed.teardown().await;

    assert_eq!(in_flight.await.unwrap(), FetchOutcome::Stale);
    let snapshot = feed.snapshot();
    assert_eq!(snapshot.phase, FeedPhase::TornDown);
    assert_eq!(snapshot.requests[0].id, "kept");
}

#[tokio::test]
async fn fetch_errors_keep_the_last_good_list() {
    let station = MockStation::new();
    station.push_list(Ok(page_of(vec![wire_request("a", "Created", "Transfer")], 1)));
    station.push_list(Ok(daopad_orbit::ListRequestsResult::Err(
        "Orbit Station unreachable".to_string(),
    )));
    let (feed, notifier) = feed(&station);

    feed.set_token(Some(token())).await;
    assert_eq!(feed.refresh().await, FetchOutcome::Failed);

    let snapshot = feed.snapshot();
    assert_eq!(snapshot.requests.len(), 1);
    assert_eq!(snapshot.error.as_deref(), Some("Orbit Station unreachable"));
    assert!(!snapshot.loading);
    assert!(
        notifier
            .messages()
            .contains(&"error: Failed to load requests from Orbit Station".to_string())
    );

    assert_eq!(feed.refresh().await, FetchOutcome::Applied);
    assert!(feed.snapshot().error.is_none());
}

#[tokio::test]
async fn selection_helpers_track_pending_requests() {
    let station = MockStation::new();
    station.push_list(Ok(page_of(
        vec![
            wire_request("a", "Created", "Transfer"),
            wire_request("b", "Scheduled", "AddUser"),
            wire_request("c", "Approved", "EditAccount"),
        ],
        3,
    )));
    let (feed, _) = feed(&station);
    feed.set_token(Some(token())).await;

    assert_eq!(feed.select_all_pending().await, 2);
    assert!(!feed.toggle_selection("a").await);
    assert!(feed.toggle_selection("c").await);
    let selection: Vec<_> = feed.snapshot().selection.into_iter().collect();
    assert_eq!(selection, vec!["b".to_string(), "c".to_string()]);

    feed.clear_selection().await;
    assert!(feed.snapshot().selection.is_empty());

    feed.toggle_selection("a").await;
    feed.refresh().await;
    assert!(feed.snapshot().selection.is_empty());
}

#[tokio::test(start_paused = true)]
async fn refresh_interval_polls_until_teardown() {
    let station = MockStation::new();
    let (feed, _) = feed_with(
        &station,
        ControllerOptions {
            refresh_interval: Some(Duration::from_secs(15)),
            ..ControllerOptions::default()
        },
    );

    feed.set_token(Some(token())).await;
    assert_eq!(station.list_call_count(), 1);

    tokio::time::sleep(Duration::from_secs(31)).await;
    assert_eq!(station.list_call_count(), 3);

    feed.teardown().await;
    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(station.list_call_count(), 3);
}

#[tokio::test]
async fn subscribers_see_the_applied_page() {
    let station = MockStation::new();
    station.push_list(Ok(page_of(vec![wire_request("a", "Created", "Transfer")], 41)));
    let (feed, _) = feed(&station);
    let mut updates = feed.subscribe();

    feed.set_token(Some(token())).await;

    let snapshot = updates.borrow_and_update().clone();
    assert_eq!(snapshot.requests.len(), 1);
    assert_eq!(snapshot.pagination.total, 41);
    assert_eq!(snapshot.page_count(), 3);
    assert_eq!(snapshot.phase, FeedPhase::Polling);
}
