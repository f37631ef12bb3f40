//! Filter state of the feed.
//!
//! Every mutation other than a page move sends the feed back to page 0, and
//! the status set can never become empty.

use crate::domains::Domain;
use crate::error::FeedError;
use crate::models::PaginationSummary;
use chrono::{DateTime, Utc};
use daopad_orbit::{ListRequestsSortBy, RequestStatusCode};

pub const DEFAULT_PAGE_SIZE: u16 = 20;

/// Statuses shown until the user picks otherwise: everything still in
/// flight.
pub const DEFAULT_STATUSES: [RequestStatusCode; 4] = [
    RequestStatusCode::Created,
    RequestStatusCode::Approved,
    RequestStatusCode::Processing,
    RequestStatusCode::Scheduled,
];

/// Default statuses for a domain. Member management keeps completed
/// operations visible.
pub fn default_statuses_for(domain: Domain) -> Vec<RequestStatusCode> {
    let mut statuses = DEFAULT_STATUSES.to_vec();
    if domain == Domain::Users {
        statuses.push(RequestStatusCode::Completed);
    }
    statuses
}

/// One-click status selections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusPreset {
    PendingOnly,
    ResolvedOnly,
}

impl StatusPreset {
    pub const ALL: [StatusPreset; 2] = [StatusPreset::PendingOnly, StatusPreset::ResolvedOnly];

    pub fn statuses(self) -> &'static [RequestStatusCode] {
        match self {
            StatusPreset::PendingOnly => &[RequestStatusCode::Created, RequestStatusCode::Scheduled],
            StatusPreset::ResolvedOnly => &[
                RequestStatusCode::Completed,
                RequestStatusCode::Rejected,
                RequestStatusCode::Cancelled,
                RequestStatusCode::Failed,
            ],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StatusPreset::PendingOnly => "Pending only",
            StatusPreset::ResolvedOnly => "Resolved only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    statuses: Vec<RequestStatusCode>,
    created_from: Option<DateTime<Utc>>,
    created_to: Option<DateTime<Utc>>,
    expiration_from: Option<DateTime<Utc>>,
    expiration_to: Option<DateTime<Utc>>,
    sort_by: Option<ListRequestsSortBy>,
    only_approvable: bool,
    page: u64,
    limit: u16,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            statuses: DEFAULT_STATUSES.to_vec(),
            created_from: None,
            created_to: None,
            expiration_from: None,
            expiration_to: None,
            sort_by: None,
            only_approvable: false,
            page: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// A partial update merged over the current filters. `None` leaves a field
/// alone; for the optional fields `Some(None)` clears them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterChange {
    pub statuses: Option<Vec<RequestStatusCode>>,
    pub created_from: Option<Option<DateTime<Utc>>>,
    pub created_to: Option<Option<DateTime<Utc>>>,
    pub expiration_from: Option<Option<DateTime<Utc>>>,
    pub expiration_to: Option<Option<DateTime<Utc>>>,
    pub sort_by: Option<Option<ListRequestsSortBy>>,
    pub only_approvable: Option<bool>,
    pub limit: Option<u16>,
}

fn dedup(statuses: impl IntoIterator<Item = RequestStatusCode>) -> Vec<RequestStatusCode> {
    let mut out: Vec<RequestStatusCode> = Vec::new();
    for status in statuses {
        if !out.contains(&status) {
            out.push(status);
        }
    }
    out
}

fn check_range(
    name: &str,
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> Result<(), FeedError> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(FeedError::InvalidFilter(format!(
            "{name} range starts after it ends"
        ))),
        _ => Ok(()),
    }
}

impl FilterState {
    pub fn with_page_size(limit: u16) -> Result<Self, FeedError> {
        let mut state = Self::default();
        state.apply(FilterChange {
            limit: Some(limit),
            ..FilterChange::default()
        })?;
        Ok(state)
    }

    pub fn statuses(&self) -> &[RequestStatusCode] {
        &self.statuses
    }

    pub fn created_from(&self) -> Option<DateTime<Utc>> {
        self.created_from
    }

    pub fn created_to(&self) -> Option<DateTime<Utc>> {
        self.created_to
    }

    pub fn expiration_from(&self) -> Option<DateTime<Utc>> {
        self.expiration_from
    }

    pub fn expiration_to(&self) -> Option<DateTime<Utc>> {
        self.expiration_to
    }

    pub fn sort_by(&self) -> Option<ListRequestsSortBy> {
        self.sort_by
    }

    pub fn only_approvable(&self) -> bool {
        self.only_approvable
    }

    pub fn page(&self) -> u64 {
        self.page
    }

    pub fn limit(&self) -> u16 {
        self.limit
    }

    /// Offset of the first request on the current page.
    pub fn offset(&self) -> u64 {
        self.page.saturating_mul(u64::from(self.limit))
    }

    /// Resets statuses to the domain's defaults and goes back to page 0.
    /// Dates, sort and page size are kept.
    pub fn switch_domain(&mut self, domain: Domain) {
        self.statuses = default_statuses_for(domain);
        self.page = 0;
    }

    /// Merges `change` over the current filters and resets the page. The
    /// state is left untouched when the result would be invalid.
    pub fn apply(&mut self, change: FilterChange) -> Result<(), FeedError> {
        let mut next = self.clone();

        if let Some(statuses) = change.statuses {
            let statuses = dedup(statuses);
            if statuses.is_empty() {
                return Err(FeedError::InvalidFilter(
                    "at least one status must be selected".to_string(),
                ));
            }
            next.statuses = statuses;
        }
        if let Some(created_from) = change.created_from {
            next.created_from = created_from;
        }
        if let Some(created_to) = change.created_to {
            next.created_to = created_to;
        }
        if let Some(expiration_from) = change.expiration_from {
            next.expiration_from = expiration_from;
        }
        if let Some(expiration_to) = change.expiration_to {
            next.expiration_to = expiration_to;
        }
        if let Some(sort_by) = change.sort_by {
            next.sort_by = sort_by;
        }
        if let Some(only_approvable) = change.only_approvable {
            next.only_approvable = only_approvable;
        }
        if let Some(limit) = change.limit {
            if limit == 0 {
                return Err(FeedError::InvalidFilter(
                    "page size must be positive".to_string(),
                ));
            }
            next.limit = limit;
        }

        check_range("created", next.created_from, next.created_to)?;
        check_range("expiration", next.expiration_from, next.expiration_to)?;

        next.page = 0;
        *self = next;
        Ok(())
    }

    pub fn set_statuses(&mut self, statuses: Vec<RequestStatusCode>) -> Result<(), FeedError> {
        self.apply(FilterChange {
            statuses: Some(statuses),
            ..FilterChange::default()
        })
    }

    /// Adds or removes one status. Removing the last selected status is
    /// refused.
    pub fn toggle_status(&mut self, status: RequestStatusCode) -> Result<(), FeedError> {
        let statuses = if self.statuses.contains(&status) {
            self.statuses.iter().copied().filter(|s| *s != status).collect()
        } else {
            let mut statuses = self.statuses.clone();
            statuses.push(status);
            statuses
        };
        self.set_statuses(statuses)
    }

    /// Replaces the statuses with a preset's set and goes back to page 0.
    pub fn apply_preset(&mut self, preset: StatusPreset) {
        self.statuses = preset.statuses().to_vec();
        self.page = 0;
    }

    pub fn pending_only(&mut self) {
        self.apply_preset(StatusPreset::PendingOnly);
    }

    pub fn resolved_only(&mut self) {
        self.apply_preset(StatusPreset::ResolvedOnly);
    }

    /// The preset whose statuses match the current selection, in any order.
    pub fn active_preset(&self) -> Option<StatusPreset> {
        StatusPreset::ALL.into_iter().find(|preset| {
            let wanted = preset.statuses();
            self.statuses.len() == wanted.len()
                && wanted.iter().all(|status| self.statuses.contains(status))
        })
    }

    pub fn select_all_statuses(&mut self) {
        self.statuses = RequestStatusCode::ALL.to_vec();
        self.page = 0;
    }

    pub fn reset_statuses(&mut self) {
        self.statuses = DEFAULT_STATUSES.to_vec();
        self.page = 0;
    }

    pub fn set_page(&mut self, page: u64) {
        self.page = page;
    }

    /// Moves one page forward when the last response said more requests
    /// follow. Returns whether the page changed.
    pub fn next_page(&mut self, pagination: &PaginationSummary) -> bool {
        if !pagination.has_more {
            return false;
        }
        self.page = self.page.saturating_add(1);
        true
    }

    pub fn previous_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }
}
