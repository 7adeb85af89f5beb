//! Analytics Sink
//!
//! Fire-and-forget recording of item activity. Callers log and drop sink
//! failures; they never fail the item operation that triggered them.

use async_trait::async_trait;

use crate::domain::{now_millis, ActivityAction, DomainResult, ItemActivity, ShoppingItem};
use crate::repository::ActivityRepository;

#[async_trait]
pub trait ActivitySink: Send + Sync {
    async fn record_event(
        &self,
        list_id: u32,
        user_id: u32,
        item: &ShoppingItem,
        action: ActivityAction,
    ) -> DomainResult<()>;
}

#[async_trait]
impl ActivitySink for ActivityRepository {
    async fn record_event(
        &self,
        list_id: u32,
        user_id: u32,
        item: &ShoppingItem,
        action: ActivityAction,
    ) -> DomainResult<()> {
        let activity = ItemActivity::record(list_id, user_id, item, action, now_millis());
        self.insert(&activity).await?;
        Ok(())
    }
}
