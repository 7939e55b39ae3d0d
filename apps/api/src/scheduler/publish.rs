//! Publish phase — flips content visibility from validity windows.
//!
//! Both scans are idempotent single-predicate updates; a failed scan is
//! logged and retried at the next weekly trigger.

use tracing::{error, info};

use crate::scheduler::clock::Clock;
use crate::store::ContentStore;

pub async fn run_publish_cycle(content: &dyn ContentStore, clock: &dyn Clock) {
    let now = clock.now();

    match content.publish_due(now).await {
        Ok(published) => info!("Publish scan: {published} items published"),
        Err(e) => error!("Publish scan failed, will retry next trigger: {e}"),
    }

    match content.expire_overdue(now).await {
        Ok(expired) => {
            if expired > 0 {
                info!("Expiry scan: {expired} items unpublished");
            }
        }
        Err(e) => error!("Expiry scan failed, will retry next trigger: {e}"),
    }
}
