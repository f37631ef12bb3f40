//! Unified request feed for a DAO's Orbit Station treasury.
//!
//! The feed lists governance/treasury requests through the DAOPad backend,
//! narrows them by domain and filters, keeps them fresh, and forwards
//! votes and approval decisions.

pub mod actor;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod domains;
pub mod error;
pub mod fetcher;
pub mod filters;
pub mod models;
pub mod notify;
pub mod presentation;
pub mod token;

pub use actor::{HttpStationActor, StationActor};
pub use config::FeedConfig;
pub use controller::{ControllerOptions, FeedController, FeedPhase, FeedSnapshot, FetchOutcome};
pub use dispatcher::{Decision, VoteDispatcher};
pub use domains::Domain;
pub use error::FeedError;
pub use fetcher::{FeedPage, RequestFetcher};
pub use filters::{FilterChange, FilterState, StatusPreset};
pub use models::{PaginationSummary, Request};
pub use notify::{LogNotifier, Notifier};
pub use token::TokenId;
