use crate::common::context::Context;
use crate::common::error::ServiceResult;
use std::time::Instant;
use tracing::info;

pub async fn reap_idle_rooms<C: Context>(ctx: &C) -> ServiceResult<usize> {
    let reaped = ctx.rooms().reap(Instant::now());
    for match_id in &reaped {
        info!(%match_id, "Reaped idle match room");
    }
    Ok(reaped.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::auth_service::AllowAllScorers;
    use crate::common::state::AppState;
    use crate::repositories::match_states::MemoryMatchStateStore;
    use crate::rooms::RoomConfig;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn reaps_rooms_past_the_idle_timeout() {
        let config = RoomConfig {
            idle_timeout: Duration::ZERO,
            ..Default::default()
        };
        let ctx = AppState::new(
            Arc::new(MemoryMatchStateStore::new()),
            Arc::new(AllowAllScorers),
            config,
        );
        ctx.rooms().get_or_create("m1");
        ctx.rooms().get_or_create("m2");

        assert_eq!(reap_idle_rooms(&ctx).await.unwrap(), 2);
        assert!(ctx.rooms().is_empty());
    }
}
