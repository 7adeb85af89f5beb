//! Read-repair
//!
//! Item, set and list writes are independent, so an interrupted operation
//! can leave a list pointing at records that are gone, or an item that no
//! list references. `repair` removes both. Items younger than the grace
//! period are skipped since they may belong to an operation still in flight.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

use crate::domain::{now_millis, DomainResult};
use crate::repository::{ItemRepository, ItemSetRepository, ListRepository, Repository};
use super::list_locks::ListLocks;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairReport {
    pub dangling_item_ids: usize,
    pub dangling_item_set_ids: usize,
    pub orphaned_items: usize,
}

impl RepairReport {
    pub fn is_clean(&self) -> bool {
        self.dangling_item_ids == 0 && self.dangling_item_set_ids == 0 && self.orphaned_items == 0
    }
}

pub struct RepairService {
    lists: Arc<ListRepository>,
    items: Arc<ItemRepository>,
    sets: Arc<ItemSetRepository>,
    locks: Arc<ListLocks>,
    grace_millis: i64,
}

impl RepairService {
    pub fn new(
        lists: Arc<ListRepository>,
        items: Arc<ItemRepository>,
        sets: Arc<ItemSetRepository>,
        locks: Arc<ListLocks>,
        grace: Duration,
    ) -> Self {
        Self {
            lists,
            items,
            sets,
            locks,
            grace_millis: i64::try_from(grace.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub async fn repair(&self) -> DomainResult<RepairReport> {
        let mut report = RepairReport::default();
        let mut referenced = HashSet::new();

        for summary in self.lists.list().await? {
            let _guard = self.locks.acquire(summary.id).await;
            // Reload under the lock; the list may have changed or gone
            let Some(mut list) = self.lists.find_by_id(summary.id).await? else {
                continue;
            };

            let live_items: HashSet<u32> = self
                .items
                .find_by_ids(&list.item_ids)
                .await?
                .iter()
                .map(|item| item.id)
                .collect();
            let live_sets: HashSet<u32> = self
                .sets
                .find_by_ids(&list.item_set_ids)
                .await?
                .iter()
                .map(|set| set.id)
                .collect();

            let items_before = list.item_ids.len();
            let sets_before = list.item_set_ids.len();
            list.item_ids.retain(|id| live_items.contains(id));
            list.item_set_ids.retain(|id| live_sets.contains(id));

            let dropped_items = items_before - list.item_ids.len();
            let dropped_sets = sets_before - list.item_set_ids.len();
            if dropped_items + dropped_sets > 0 {
                self.lists.update(&list).await?;
                report.dangling_item_ids += dropped_items;
                report.dangling_item_set_ids += dropped_sets;
            }
            referenced.extend(list.item_ids.iter().copied());
        }

        let cutoff = now_millis().saturating_sub(self.grace_millis);
        for item in self.items.list().await? {
            if referenced.contains(&item.id) || item.edited_at > cutoff {
                continue;
            }
            self.items.delete(item.id).await?;
            report.orphaned_items += 1;
        }

        if report.is_clean() {
            log::debug!("Repair pass found nothing to fix");
        } else {
            log::info!(
                "Repair removed {} dangling item ids, {} dangling item set ids, {} orphaned items",
                report.dangling_item_ids,
                report.dangling_item_set_ids,
                report.orphaned_items
            );
        }
        Ok(report)
    }
}

/// Run `repair` every `interval` until the handle is aborted
pub fn spawn_repair_task(service: Arc<RepairService>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(e) = service.repair().await {
                log::error!("Repair pass failed: {}", e);
            }
        }
    })
}
