#![allow(dead_code)]

use async_trait::async_trait;
use daopad_orbit::{
    ActionResult, ApprovalDecision, BackendError, ListRequestsInput, ListRequestsResponse,
    ListRequestsResult, WireRequest, codes,
};
use daopad_requests::controller::ControllerOptions;
use daopad_requests::{FeedController, FeedError, Notifier, StationActor, TokenId};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const TOKEN: &str = "ryjl3-tyaaa-aaaaa-aaaba-cai";

pub fn token() -> TokenId {
    TokenId::parse(TOKEN).unwrap()
}

pub fn wire_request(id: &str, status: &str, operation_type: &str) -> WireRequest {
    serde_json::from_value(json!({
        "id": id,
        "title": format!("Request {id}"),
        "status": { status: null },
        "operation_type": operation_type,
        "requested_by": "member-1",
        "created_at": "1700000000000000000",
        "expires_at": "1700086400000000000",
        "yes_votes": "300",
        "no_votes": "100",
        "total_voting_power": "1000"
    }))
    .unwrap()
}

pub fn page_of(requests: Vec<WireRequest>, total: u64) -> ListRequestsResult {
    ListRequestsResult::Ok(ListRequestsResponse {
        requests,
        total: total.into(),
        next_offset: None,
    })
}

pub fn page_with_more(requests: Vec<WireRequest>, total: u64, next_offset: u64) -> ListRequestsResult {
    ListRequestsResult::Ok(ListRequestsResponse {
        requests,
        total: total.into(),
        next_offset: Some(next_offset.into()),
    })
}

pub fn unavailable() -> Result<ActionResult, FeedError> {
    Ok(ActionResult::Err(BackendError::new(
        codes::SERVICE_UNAVAILABLE,
        "Kong Locker service is down",
    )))
}

struct ScriptedList {
    delay: Duration,
    result: Result<ListRequestsResult, FeedError>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecisionCall {
    Vote {
        request_id: String,
        vote: bool,
    },
    Approval {
        request_id: String,
        decision: ApprovalDecision,
        reason: Option<String>,
    },
}

/// In-memory station that records every call and replays scripted
/// replies in order. Unscripted list calls return an empty page and
/// unscripted decisions succeed.
#[derive(Default)]
pub struct MockStation {
    anonymous: bool,
    lists: Mutex<VecDeque<ScriptedList>>,
    decisions: Mutex<VecDeque<Result<ActionResult, FeedError>>>,
    list_calls: Mutex<Vec<(String, ListRequestsInput)>>,
    decision_calls: Mutex<Vec<(DecisionCall, Instant)>>,
}

impl MockStation {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn anonymous() -> Arc<Self> {
        Arc::new(Self {
            anonymous: true,
            ..Self::default()
        })
    }

    pub fn push_list(&self, result: Result<ListRequestsResult, FeedError>) {
        self.push_list_delayed(Duration::ZERO, result);
    }

    pub fn push_list_delayed(&self, delay: Duration, result: Result<ListRequestsResult, FeedError>) {
        self.lists
            .lock()
            .unwrap()
            .push_back(ScriptedList { delay, result });
    }

    pub fn push_decision(&self, result: Result<ActionResult, FeedError>) {
        self.decisions.lock().unwrap().push_back(result);
    }

    pub fn list_calls(&self) -> Vec<(String, ListRequestsInput)> {
        self.list_calls.lock().unwrap().clone()
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.lock().unwrap().len()
    }

    pub fn decision_calls(&self) -> Vec<(DecisionCall, Instant)> {
        self.decision_calls.lock().unwrap().clone()
    }

    fn next_decision(&self, call: DecisionCall) -> Result<ActionResult, FeedError> {
        self.decision_calls
            .lock()
            .unwrap()
            .push((call, Instant::now()));
        self.decisions
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(ActionResult::Ok))
    }
}

#[async_trait]
impl StationActor for MockStation {
    async fn list_orbit_requests(
        &self,
        token_id: &str,
        input: &ListRequestsInput,
    ) -> Result<ListRequestsResult, FeedError> {
        self.list_calls
            .lock()
            .unwrap()
            .push((token_id.to_string(), input.clone()));
        let scripted = self.lists.lock().unwrap().pop_front();
        match scripted {
            Some(ScriptedList { delay, result }) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                result
            }
            None => Ok(page_of(Vec::new(), 0)),
        }
    }

    async fn vote_on_orbit_request(
        &self,
        _token_id: &str,
        request_id: &str,
        vote: bool,
    ) -> Result<ActionResult, FeedError> {
        self.next_decision(DecisionCall::Vote {
            request_id: request_id.to_string(),
            vote,
        })
    }

    async fn submit_request_approval(
        &self,
        _token_id: &str,
        request_id: &str,
        decision: ApprovalDecision,
        reason: Option<&str>,
    ) -> Result<ActionResult, FeedError> {
        self.next_decision(DecisionCall::Approval {
            request_id: request_id.to_string(),
            decision,
            reason: reason.map(str::to_string),
        })
    }

    fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("success: {message}"));
    }

    fn info(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("info: {message}"));
    }

    fn error(&self, message: &str) {
        self.messages.lock().unwrap().push(format!("error: {message}"));
    }
}

pub fn feed_with(
    station: &Arc<MockStation>,
    options: ControllerOptions,
) -> (FeedController, Arc<RecordingNotifier>) {
    let notifier = Arc::new(RecordingNotifier::default());
    let feed = FeedController::new(station.clone(), notifier.clone(), options).unwrap();
    (feed, notifier)
}

pub fn feed(station: &Arc<MockStation>) -> (FeedController, Arc<RecordingNotifier>) {
    feed_with(station, ControllerOptions::default())
}
