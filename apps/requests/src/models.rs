use crate::domains::Domain;
use crate::error::FeedError;
use chrono::{DateTime, Utc};
use daopad_orbit::{
    ApprovalDecision, ListRequestsResponse, RequestStatusCode, WireApproval, WireNat, WireRequest,
};
use serde::Serialize;

const LIST_METHOD: &str = "list_orbit_requests";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Approval {
    pub approver_id: String,
    pub decision: ApprovalDecision,
    pub reason: Option<String>,
    pub decided_at: u64,
}

/// A request with every wire integer converted to `u64`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    pub status: RequestStatusCode,
    pub status_detail: Option<String>,
    pub operation_type: String,
    pub requested_by: String,
    pub requester_name: Option<String>,
    /// Nanoseconds since the Unix epoch.
    pub created_at: u64,
    /// Nanoseconds since the Unix epoch.
    pub expires_at: u64,
    pub yes_votes: u64,
    pub no_votes: u64,
    pub total_voting_power: u64,
    pub approvals: Vec<Approval>,
}

impl Request {
    pub fn domain(&self) -> Domain {
        Domain::classify(&self.operation_type)
    }

    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        nanos_to_utc(self.created_at)
    }

    pub fn expires_at_utc(&self) -> Option<DateTime<Utc>> {
        nanos_to_utc(self.expires_at)
    }

    /// Share of the total voting power that voted yes, in percent.
    pub fn yes_percent(&self) -> f64 {
        percent_of(self.yes_votes, self.total_voting_power)
    }

    pub fn no_percent(&self) -> f64 {
        percent_of(self.no_votes, self.total_voting_power)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at_utc().is_some_and(|expiry| expiry <= now)
    }
}

fn percent_of(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (part as f64 / total as f64) * 100.0
}

fn nanos_to_utc(nanos: u64) -> Option<DateTime<Utc>> {
    if nanos == 0 {
        return None;
    }
    let nanos = i64::try_from(nanos).ok()?;
    Some(DateTime::from_timestamp_nanos(nanos))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PaginationSummary {
    pub total: u64,
    pub page: u64,
    pub has_more: bool,
}

impl PaginationSummary {
    /// Number of pages for the given page size (at least one).
    pub fn page_count(&self, limit: u16) -> u64 {
        let limit = u64::from(limit.max(1));
        self.total.div_ceil(limit).max(1)
    }
}

fn nat(field: &'static str, value: &WireNat) -> Result<u64, FeedError> {
    value.to_u64_saturating().map_err(|e| FeedError::Decode {
        method: LIST_METHOD,
        reason: format!("{field}: {e}"),
    })
}

fn normalize_approval(wire: WireApproval) -> Result<Approval, FeedError> {
    let (code, _) = wire.status.resolve().map_err(|e| FeedError::Decode {
        method: LIST_METHOD,
        reason: format!("approval status: {e}"),
    })?;
    let decision = match code {
        RequestStatusCode::Approved => ApprovalDecision::Approved,
        RequestStatusCode::Rejected => ApprovalDecision::Rejected,
        other => {
            return Err(FeedError::Decode {
                method: LIST_METHOD,
                reason: format!("approval status: unexpected {other}"),
            });
        }
    };
    Ok(Approval {
        decided_at: nat("decided_at", &wire.decided_at)?,
        approver_id: wire.approver_id,
        decision,
        reason: wire.status_reason,
    })
}

/// Converts a wire record into a [`Request`]; the single place where wire
/// integers become native ones.
pub fn normalize_request(wire: WireRequest) -> Result<Request, FeedError> {
    let (status, detail) = wire.status.resolve().map_err(|e| FeedError::Decode {
        method: LIST_METHOD,
        reason: format!("request {}: {e}", wire.id),
    })?;

    let approvals = wire
        .approvals
        .into_iter()
        .map(normalize_approval)
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Request {
        created_at: nat("created_at", &wire.created_at)?,
        expires_at: nat("expires_at", &wire.expires_at)?,
        yes_votes: nat("yes_votes", &wire.yes_votes)?,
        no_votes: nat("no_votes", &wire.no_votes)?,
        total_voting_power: nat("total_voting_power", &wire.total_voting_power)?,
        status_detail: wire.status_detail.or(detail),
        id: wire.id,
        title: wire.title,
        summary: wire.summary,
        status,
        operation_type: wire.operation_type,
        requested_by: wire.requested_by,
        requester_name: wire.requester_name,
        approvals,
    })
}

/// Normalizes a whole `list_orbit_requests` payload.
pub fn normalize_response(
    response: ListRequestsResponse,
    page: u64,
) -> Result<(Vec<Request>, PaginationSummary), FeedError> {
    let requests = response
        .requests
        .into_iter()
        .map(normalize_request)
        .collect::<Result<Vec<_>, _>>()?;

    let pagination = PaginationSummary {
        total: nat("total", &response.total)?,
        page,
        has_more: response.next_offset.is_some(),
    };

    Ok((requests, pagination))
}
