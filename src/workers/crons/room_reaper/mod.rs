pub mod tasks;

use crate::common::context::Context;
use crate::cron_tasks;
use std::time::Duration;
use tasks::reap_idle_rooms::reap_idle_rooms;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Sweeps idle match rooms every `interval` until `shutdown` fires
pub async fn serve<C: Context>(ctx: C, interval: Duration, shutdown: CancellationToken) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick completes immediately
    ticker.tick().await;
    info!(interval = ?interval, "Room reaper started");
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = ticker.tick() => {
                cron_tasks! {
                    &ctx,
                    reap_idle_rooms,
                }
            }
        }
    }
    info!("Room reaper stopped");
}
