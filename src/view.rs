// View engine: status filter, search, and status-first stable sort over a snapshot

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::NodeResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Online,
    /// Every non-online status, pending included.
    Offline,
}

impl StatusFilter {
    pub fn matches(self, result: &NodeResult) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Online => result.is_online(),
            StatusFilter::Offline => !result.is_online(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Uptime,
    Cpu,
    Ram,
    Storage,
    /// Ascending; every other key sorts descending.
    #[serde(alias = "ip")]
    Address,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ViewQuery {
    pub status: StatusFilter,
    pub search: String,
    pub sort: SortKey,
}

fn matches_search(result: &NodeResult, term: &str) -> bool {
    result.address().to_lowercase().contains(term)
        || result
            .error()
            .is_some_and(|e| e.to_lowercase().contains(term))
}

fn metric(result: &NodeResult, key: SortKey) -> f64 {
    result.stats().map_or(0.0, |s| match key {
        SortKey::Uptime => s.uptime as f64,
        SortKey::Cpu => s.cpu_percent,
        SortKey::Ram => s.ram_used as f64,
        SortKey::Storage => s.file_size as f64,
        SortKey::Address => 0.0,
    })
}

/// Online before anything else, then the chosen key. Equal elements compare `Equal`.
pub fn compare(a: &NodeResult, b: &NodeResult, key: SortKey) -> Ordering {
    b.is_online().cmp(&a.is_online()).then_with(|| match key {
        SortKey::Address => a.address().cmp(b.address()),
        _ => metric(b, key).total_cmp(&metric(a, key)),
    })
}

/// Filtered, sorted copy of `results`. The input is left untouched.
pub fn view(results: &[NodeResult], query: &ViewQuery) -> Vec<NodeResult> {
    let term = query.search.trim().to_lowercase();
    let mut out: Vec<NodeResult> = results
        .iter()
        .filter(|r| query.status.matches(r))
        .filter(|r| term.is_empty() || matches_search(r, &term))
        .cloned()
        .collect();
    // sort_by is stable: equal keys keep fetch order.
    out.sort_by(|a, b| compare(a, b, query.sort));
    out
}
