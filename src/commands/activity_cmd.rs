//! Activity Commands
//!
//! Read access to recorded item activity, scoped to lists the caller
//! belongs to, plus maintenance commands.

use crate::domain::{ActivityFilter, DomainResult, ItemActivity};
use crate::service::RepairReport;
use crate::AppState;

pub async fn query_activity(state: &AppState, credential: &str, filter: ActivityFilter) -> DomainResult<Vec<ItemActivity>> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.get_list(filter.list_id, &actor).await?;
    state.activity.query(&filter).await
}

/// Distinct item names with recorded activity on a list
pub async fn activity_names(state: &AppState, credential: &str, list_id: u32) -> DomainResult<Vec<String>> {
    let actor = state.identity.resolve(credential).await?;
    state.lists.get_list(list_id, &actor).await?;
    state.activity.names(list_id).await
}

/// Run a repair pass now
pub async fn run_repair(state: &AppState, credential: &str) -> DomainResult<RepairReport> {
    state.identity.resolve(credential).await?;
    state.repair.repair().await
}

/// Last `lines` lines of the server log
pub async fn recent_logs(state: &AppState, credential: &str, lines: usize) -> DomainResult<Vec<String>> {
    state.identity.resolve(credential).await?;
    Ok(rolling_logger::recent_lines(lines))
}
