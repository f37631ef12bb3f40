//! Boundary to the DAOPad backend.
//!
//! [`StationActor`] is the only way the feed reaches the remote side.
//! [`HttpStationActor`] speaks to the backend's JSON gateway: every method
//! is a `POST {gateway}/{method}` with the arguments as a JSON object.

use crate::error::FeedError;
use async_trait::async_trait;
use daopad_orbit::{
    ActionResult, ApprovalDecision, ListOrbitRequestsArgs, ListRequestsInput, ListRequestsResult,
    SubmitRequestApprovalArgs, VoteOnOrbitRequestArgs,
};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const LIST_ORBIT_REQUESTS: &str = "list_orbit_requests";
pub const VOTE_ON_ORBIT_REQUEST: &str = "vote_on_orbit_request";
pub const SUBMIT_REQUEST_APPROVAL: &str = "submit_request_approval";

#[async_trait]
pub trait StationActor: Send + Sync {
    async fn list_orbit_requests(
        &self,
        token_id: &str,
        input: &ListRequestsInput,
    ) -> Result<ListRequestsResult, FeedError>;

    async fn vote_on_orbit_request(
        &self,
        token_id: &str,
        request_id: &str,
        vote: bool,
    ) -> Result<ActionResult, FeedError>;

    async fn submit_request_approval(
        &self,
        token_id: &str,
        request_id: &str,
        decision: ApprovalDecision,
        reason: Option<&str>,
    ) -> Result<ActionResult, FeedError>;

    /// True when calls go out without an identity. Listing works
    /// anonymously; decisions do not.
    fn is_anonymous(&self) -> bool;
}

#[derive(Clone)]
pub struct HttpStationActor {
    client: Client,
    gateway_url: String,
    anonymous: bool,
}

impl HttpStationActor {
    pub fn new(gateway_url: &str, identity: Option<&str>) -> Result<Self, FeedError> {
        Self::new_with_timeout(gateway_url, identity, None)
    }

    /// `timeout` of `None` keeps reqwest's transport defaults.
    pub fn new_with_timeout(
        gateway_url: &str,
        identity: Option<&str>,
        timeout: Option<Duration>,
    ) -> Result<Self, FeedError> {
        let identity = identity.map(str::trim).filter(|i| !i.is_empty());
        let mut builder = Client::builder().default_headers(Self::default_headers(identity)?);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|source| FeedError::Transport {
            method: "client_builder",
            source,
        })?;

        Ok(Self {
            client,
            gateway_url: gateway_url.trim_end_matches('/').to_string(),
            anonymous: identity.is_none(),
        })
    }

    fn default_headers(identity: Option<&str>) -> Result<HeaderMap, FeedError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_static("daopad-requests/0.1 (https://daopad.org) reqwest/0.12"),
        );
        if let Some(identity) = identity {
            let mut value = HeaderValue::from_str(&format!("Bearer {identity}"))
                .map_err(|_| FeedError::InvalidIdentity)?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }
        Ok(headers)
    }

    async fn call<A, T>(&self, method: &'static str, args: &A) -> Result<T, FeedError>
    where
        A: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.gateway_url, method);
        debug!(url = %url, "Calling gateway");

        let response = self
            .client
            .post(&url)
            .json(args)
            .send()
            .await
            .map_err(|source| FeedError::Transport { method, source })?;

        match response.status() {
            status if status.is_success() => {
                let body = response
                    .text()
                    .await
                    .map_err(|source| FeedError::Transport { method, source })?;
                serde_json::from_str(&body).map_err(|e| FeedError::Decode {
                    method,
                    reason: e.to_string(),
                })
            }
            StatusCode::SERVICE_UNAVAILABLE => {
                let body = response.text().await.unwrap_or_default();
                warn!(method, body = %body, "Gateway reported service unavailable");
                Err(FeedError::ServiceUnavailable {
                    message: if body.trim().is_empty() {
                        format!("{method} is temporarily unavailable")
                    } else {
                        body
                    },
                })
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                warn!(method, status = %status, body = %body, "Gateway request failed");
                Err(FeedError::Status {
                    method,
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}

#[async_trait]
impl StationActor for HttpStationActor {
    #[instrument(skip(self, input), fields(token_id = %token_id))]
    async fn list_orbit_requests(
        &self,
        token_id: &str,
        input: &ListRequestsInput,
    ) -> Result<ListRequestsResult, FeedError> {
        let args = ListOrbitRequestsArgs {
            token_canister_id: token_id.to_string(),
            filters: input.clone(),
        };
        self.call(LIST_ORBIT_REQUESTS, &args).await
    }

    #[instrument(skip(self), fields(token_id = %token_id))]
    async fn vote_on_orbit_request(
        &self,
        token_id: &str,
        request_id: &str,
        vote: bool,
    ) -> Result<ActionResult, FeedError> {
        let args = VoteOnOrbitRequestArgs {
            token_id: token_id.to_string(),
            orbit_request_id: request_id.to_string(),
            vote,
        };
        self.call(VOTE_ON_ORBIT_REQUEST, &args).await
    }

    #[instrument(skip(self, reason), fields(token_id = %token_id))]
    async fn submit_request_approval(
        &self,
        token_id: &str,
        request_id: &str,
        decision: ApprovalDecision,
        reason: Option<&str>,
    ) -> Result<ActionResult, FeedError> {
        let args = SubmitRequestApprovalArgs {
            token_id: token_id.to_string(),
            request_id: request_id.to_string(),
            decision,
            reason: reason.map(str::to_string),
        };
        self.call(SUBMIT_REQUEST_APPROVAL, &args).await
    }

    fn is_anonymous(&self) -> bool {
        self.anonymous
    }
}
