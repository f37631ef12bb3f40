//! Plain-text rendering of feed snapshots for the terminal.

use crate::controller::FeedSnapshot;
use crate::domains::{Domain, counts_by_domain};
use crate::models::Request;
use chrono::{DateTime, Utc};
use daopad_orbit::RequestStatusCode;
use std::collections::BTreeMap;
use std::fmt::Write;

pub fn status_label(status: RequestStatusCode) -> &'static str {
    match status {
        RequestStatusCode::Created => "Pending",
        other => other.as_str(),
    }
}

pub fn status_badge(status: RequestStatusCode) -> String {
    format!("[{}]", status_label(status))
}

fn short_id(id: &str) -> &str {
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn title_of(request: &Request) -> String {
    if request.title.trim().is_empty() {
        format!("Request #{}", request.id)
    } else {
        request.title.clone()
    }
}

fn expiry_of(request: &Request, now: DateTime<Utc>) -> String {
    match request.expires_at_utc() {
        None => "no expiry".to_string(),
        Some(_) if request.is_expired_at(now) => "expired".to_string(),
        Some(at) => format!("expires {}", at.format("%Y-%m-%d %H:%M UTC")),
    }
}

/// Domain menu with per-domain counts; the selected entry is marked.
pub fn render_domain_menu(counts: &BTreeMap<Domain, usize>, selected: Domain) -> String {
    let mut out = String::new();
    for domain in Domain::ALL {
        let marker = if domain == selected { '>' } else { ' ' };
        let count = counts.get(&domain).copied().unwrap_or(0);
        let _ = writeln!(out, "{marker} {} ({count})", domain.display_name());
    }
    out
}

pub fn render_request(request: &Request, selected: bool, now: DateTime<Utc>) -> String {
    let mark = if selected { '*' } else { ' ' };
    format!(
        "{mark} {id:<8} {badge:<12} {title} ({op})  yes {yes} / no {no} ({yes_pct:.1}% / {no_pct:.1}%)  {expiry}",
        id = short_id(&request.id),
        badge = status_badge(request.status),
        title = title_of(request),
        op = request.operation_type,
        yes = request.yes_votes,
        no = request.no_votes,
        yes_pct = request.yes_percent(),
        no_pct = request.no_percent(),
        expiry = expiry_of(request, now),
    )
}

pub fn render_summary(snapshot: &FeedSnapshot) -> String {
    format!(
        "Showing {} of {} requests",
        snapshot.requests.len(),
        snapshot.pagination.total
    )
}

pub fn render_page_indicator(snapshot: &FeedSnapshot) -> String {
    format!(
        "Page {} of {}",
        snapshot.filters.page() + 1,
        snapshot.page_count()
    )
}

/// Full view of a snapshot: menu, banners, request lines and pagination.
pub fn render_snapshot(snapshot: &FeedSnapshot, now: DateTime<Utc>) -> String {
    let mut out = render_domain_menu(&counts_by_domain(&snapshot.requests), snapshot.domain);

    let statuses: Vec<&str> = snapshot
        .filters
        .statuses()
        .iter()
        .map(|s| status_label(*s))
        .collect();
    match snapshot.filters.active_preset() {
        Some(preset) => {
            let _ = writeln!(out, "\nStatuses: {} [{}]", statuses.join(", "), preset.label());
        }
        None => {
            let _ = writeln!(out, "\nStatuses: {}", statuses.join(", "));
        }
    }

    if let Some(error) = &snapshot.error {
        let _ = writeln!(out, "!! {error}");
    }
    if snapshot.loading {
        let _ = writeln!(out, "Loading...");
    }

    if snapshot.token.is_none() {
        let _ = writeln!(out, "No token selected");
        return out;
    }

    if snapshot.requests.is_empty() && !snapshot.loading {
        let _ = writeln!(out, "No requests found");
    }
    for request in &snapshot.requests {
        let selected = snapshot.selection.contains(&request.id);
        let _ = writeln!(out, "{}", render_request(request, selected, now));
    }

    let _ = writeln!(out, "{}", render_summary(snapshot));
    let _ = writeln!(out, "{}", render_page_indicator(snapshot));
    out
}
