pub mod matches;

use crate::common::state::AppState;
use axum::Router;
use axum::routing::{get, post};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/matches/raid", post(matches::submit_raid))
        .route("/matches/{match_id}", get(matches::fetch_one))
        .route("/matches/{match_id}/end", post(matches::end))
}
