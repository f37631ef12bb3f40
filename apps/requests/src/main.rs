use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use daopad_orbit::{ListRequestsSortBy, RequestStatusCode, SortDirection, SortField};
use daopad_requests::controller::FetchOutcome;
use daopad_requests::presentation::render_snapshot;
use daopad_requests::{
    Decision, Domain, FeedConfig, FeedController, FilterChange, HttpStationActor, LogNotifier,
    StatusPreset, TokenId,
};
use dotenv::dotenv;
use std::sync::Arc;
use tracing::{info, warn};
use utils::errors::*;
use utils::tracing::run_with_tracing;

/// Refresh period for `watch` when none is configured.
const WATCH_REFRESH_SECS: u64 = 15;

/// Unified request feed for a DAO treasury on Orbit Station.
#[derive(Parser, Debug)]
#[command(name = "daopad-requests", version, about, long_about = None)]
struct Cli {
    /// Request domain (all, accounts, transfers, users, address-book,
    /// external-canisters, system, assets).
    #[arg(long, global = true, default_value = "all")]
    domain: Domain,

    /// Status to include. Repeat for several; defaults to the domain's set.
    #[arg(long = "status", global = true)]
    statuses: Vec<RequestStatusCode>,

    /// Zero-based page number.
    #[arg(long, global = true, default_value_t = 0)]
    page: u64,

    /// Only pending requests (Created, Scheduled).
    #[arg(long, global = true, conflicts_with_all = ["statuses", "resolved_only"])]
    pending_only: bool,

    /// Only resolved requests (Completed, Rejected, Cancelled, Failed).
    #[arg(long, global = true, conflicts_with = "statuses")]
    resolved_only: bool,

    /// Only list requests the caller can still decide on.
    #[arg(long, global = true)]
    only_approvable: bool,

    /// Created on or after this RFC 3339 instant.
    #[arg(long, global = true)]
    created_from: Option<DateTime<Utc>>,

    /// Created on or before this RFC 3339 instant.
    #[arg(long, global = true)]
    created_to: Option<DateTime<Utc>>,

    /// Expiring on or after this RFC 3339 instant.
    #[arg(long, global = true)]
    expires_from: Option<DateTime<Utc>>,

    /// Expiring on or before this RFC 3339 instant.
    #[arg(long, global = true)]
    expires_to: Option<DateTime<Utc>>,

    /// Sort field (CreatedAt, ExpirationDt, LastModificationDt).
    #[arg(long, global = true)]
    sort: Option<SortField>,

    /// Sort descending instead of ascending.
    #[arg(long, global = true, requires = "sort")]
    descending: bool,

    /// Requests per page; overrides DAOPAD_PAGE_SIZE.
    #[arg(long, global = true, value_parser = clap::value_parser!(u16).range(1..))]
    limit: Option<u16>,

    /// Token canister id; overrides DAOPAD_TOKEN_ID.
    #[arg(long, global = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

impl Cli {
    fn preset(&self) -> Option<StatusPreset> {
        if self.pending_only {
            Some(StatusPreset::PendingOnly)
        } else if self.resolved_only {
            Some(StatusPreset::ResolvedOnly)
        } else {
            None
        }
    }

    /// Filter flags as a change over the domain's defaults. Unset flags
    /// leave the corresponding filter alone.
    fn filter_change(&self) -> FilterChange {
        let statuses = match self.preset() {
            Some(preset) => Some(preset.statuses().to_vec()),
            None => (!self.statuses.is_empty()).then(|| self.statuses.clone()),
        };
        let sort_by = self.sort.map(|field| ListRequestsSortBy {
            field,
            direction: if self.descending {
                SortDirection::Desc
            } else {
                SortDirection::Asc
            },
        });

        FilterChange {
            statuses,
            created_from: self.created_from.map(Some),
            created_to: self.created_to.map(Some),
            expiration_from: self.expires_from.map(Some),
            expiration_to: self.expires_to.map(Some),
            sort_by: sort_by.map(Some),
            only_approvable: Some(self.only_approvable),
            limit: self.limit,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Keep the feed open and print every update until Ctrl+C.
    Watch,
    /// Print one page and exit.
    List,
    /// Vote on a request.
    Vote {
        request_id: String,
        #[arg(value_enum)]
        choice: VoteChoice,
    },
    /// Approve a request.
    Approve {
        request_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Reject a request.
    Reject {
        request_id: String,
        #[arg(long)]
        reason: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum VoteChoice {
    Yes,
    No,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let cli = Cli::parse();
    run_with_tracing(|| run(cli)).await
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = FeedConfig::load();
    if let Some(token) = &cli.token {
        config.token_id = Some(token.clone());
    }
    if matches!(cli.command, Command::Watch) && config.refresh_interval_secs.is_none() {
        config.refresh_interval_secs = Some(WATCH_REFRESH_SECS);
    }

    let token = config.token()?;
    let actor = HttpStationActor::new(config.gateway_url()?, config.identity.as_deref())
        .context(GATEWAY_CLIENT_BUILD_FAILED)?;
    let feed = FeedController::new(
        Arc::new(actor),
        Arc::new(LogNotifier),
        config.controller_options(),
    )?;

    // No token is set yet, so none of these fetch.
    feed.set_domain(cli.domain).await;
    feed.apply_filters(cli.filter_change()).await?;
    feed.set_page(cli.page).await;

    let result = match cli.command {
        Command::Watch => watch(&feed, token).await,
        Command::List => list(&feed, token.context(TOKEN_ID_NOT_SET)?).await,
        Command::Vote { request_id, choice } => {
            let decision = match choice {
                VoteChoice::Yes => Decision::VoteYes,
                VoteChoice::No => Decision::VoteNo,
            };
            decide(&feed, token, &request_id, decision, None).await
        }
        Command::Approve { request_id, reason } => {
            decide(&feed, token, &request_id, Decision::Approve, reason.as_deref()).await
        }
        Command::Reject { request_id, reason } => {
            decide(&feed, token, &request_id, Decision::Reject, reason.as_deref()).await
        }
    };

    feed.teardown().await;
    result
}

async fn watch(feed: &FeedController, token: Option<TokenId>) -> Result<()> {
    if token.is_none() {
        warn!("{TOKEN_ID_NOT_SET} Waiting idle");
    }

    let mut snapshots = feed.subscribe();
    feed.set_token(token).await;
    println!("{}", render_snapshot(&feed.snapshot(), Utc::now()));

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            changed = snapshots.changed() => {
                changed.context(SNAPSHOT_CHANNEL_CLOSED)?;
                let snapshot = snapshots.borrow_and_update().clone();
                if !snapshot.loading {
                    println!("{}", render_snapshot(&snapshot, Utc::now()));
                }
            }
            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, shutting down");
                return Ok(());
            }
        }
    }
}

async fn list(feed: &FeedController, token: TokenId) -> Result<()> {
    let outcome = feed.set_token(Some(token)).await;
    let snapshot = feed.snapshot();
    println!("{}", render_snapshot(&snapshot, Utc::now()));

    if outcome == FetchOutcome::Failed {
        let message = snapshot.error.unwrap_or_default();
        return Err(anyhow!(message)).context(LIST_REQUESTS_FAILED);
    }
    Ok(())
}

async fn decide(
    feed: &FeedController,
    token: Option<TokenId>,
    request_id: &str,
    decision: Decision,
    reason: Option<&str>,
) -> Result<()> {
    let token = token.context(TOKEN_ID_NOT_SET)?;
    let request_id = request_id.trim();
    if request_id.is_empty() {
        return Err(anyhow!(REQUEST_ID_NOT_SET));
    }

    feed.set_token(Some(token)).await;
    feed.decide(request_id, decision, reason)
        .await
        .context(DECISION_FAILED)?;

    println!("{}", render_snapshot(&feed.snapshot(), Utc::now()));
    Ok(())
}
