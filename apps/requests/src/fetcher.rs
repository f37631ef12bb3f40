//! Query construction and result normalization for `list_orbit_requests`.

use crate::actor::StationActor;
use crate::domains::Domain;
use crate::error::FeedError;
use crate::filters::FilterState;
use crate::models::{PaginationSummary, Request, normalize_response};
use crate::token::TokenId;
use chrono::{DateTime, SecondsFormat, Utc};
use daopad_orbit::{ListRequestsInput, ListRequestsResult, PaginationInput};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

fn timestamp(value: Option<DateTime<Utc>>) -> Option<String> {
    value.map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Builds the backend query for a domain and filter state. The output only
/// depends on its arguments.
///
/// `send_sort` gates `sort_by`: some backend builds reject sorted queries,
/// so deployments can switch it off.
pub fn build_list_input(domain: Domain, filters: &FilterState, send_sort: bool) -> ListRequestsInput {
    let operation_types = domain.operation_types();
    let offset = filters.offset();

    ListRequestsInput {
        statuses: Some(filters.statuses().to_vec()),
        operation_types: (!operation_types.is_empty()).then(|| operation_types.to_vec()),
        expiration_from_dt: timestamp(filters.expiration_from()),
        expiration_to_dt: timestamp(filters.expiration_to()),
        created_from_dt: timestamp(filters.created_from()),
        created_to_dt: timestamp(filters.created_to()),
        paginate: Some(PaginationInput {
            offset: (filters.page() > 0).then_some(offset),
            limit: Some(filters.limit()),
        }),
        sort_by: filters.sort_by().filter(|_| send_sort),
        only_approvable: filters.only_approvable(),
        with_evaluation_results: false,
        ..ListRequestsInput::default()
    }
}

/// One page of normalized requests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPage {
    pub requests: Vec<Request>,
    pub pagination: PaginationSummary,
}

impl FeedPage {
    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Clone)]
pub struct RequestFetcher {
    actor: Arc<dyn StationActor>,
    send_sort: bool,
}

impl RequestFetcher {
    pub fn new(actor: Arc<dyn StationActor>) -> Self {
        Self {
            actor,
            send_sort: true,
        }
    }

    pub fn with_sort(mut self, send_sort: bool) -> Self {
        self.send_sort = send_sort;
        self
    }

    pub fn sends_sort(&self) -> bool {
        self.send_sort
    }

    /// Lists one page. Without a token there is nothing to list: the page
    /// is empty and the backend is not called.
    #[instrument(skip(self, token_id, filters), fields(token_id = ?token_id.map(TokenId::as_str), page = filters.page()))]
    pub async fn fetch(
        &self,
        token_id: Option<&TokenId>,
        domain: Domain,
        filters: &FilterState,
    ) -> Result<FeedPage, FeedError> {
        let Some(token_id) = token_id else {
            debug!("No token selected, skipping fetch");
            return Ok(FeedPage::empty());
        };

        let input = build_list_input(domain, filters, self.send_sort);
        match self.actor.list_orbit_requests(token_id.as_str(), &input).await? {
            ListRequestsResult::Ok(response) => {
                let (requests, pagination) = normalize_response(response, filters.page())?;
                debug!(
                    count = requests.len(),
                    total = pagination.total,
                    "Fetched requests"
                );
                Ok(FeedPage {
                    requests,
                    pagination,
                })
            }
            ListRequestsResult::Err(message) => {
                warn!(error = %message, "Backend refused to list requests");
                Err(FeedError::Backend {
                    code: None,
                    message,
                })
            }
        }
    }
}
