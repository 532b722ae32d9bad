use crate::api::RequestContext;
use crate::common::axum_token::ScorerToken;
use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResponse};
use crate::models::frames::OutboundFrame;
use crate::models::raids::RaidRequest;
use crate::usecases::matches::{self, MatchCommand};
use axum::Json;
use axum::body::Bytes;
use axum::extract::Path;

fn decode_raid(body: &Bytes) -> Result<RaidRequest, AppError> {
    let request: RaidRequest =
        serde_json::from_slice(body).map_err(|_| AppError::DecodingRequestFailed)?;
    match request.match_id.is_empty() {
        true => Err(AppError::DecodingRequestFailed),
        false => Ok(request),
    }
}

/// Resolves a raid submitted over HTTP and broadcasts the result to the match
pub async fn submit_raid(
    ctx: RequestContext,
    token: ScorerToken,
    body: Bytes,
) -> ServiceResponse<OutboundFrame> {
    let request = decode_raid(&body)?;
    ctx.authorizer()
        .authorize(token.as_deref(), &request.match_id)
        .await?;
    let command = MatchCommand::Raid(request.raid);
    let committed = matches::submit(&ctx, &request.match_id, command, None)
        .await
        .map_err(|e| match e {
            AppError::MatchesNotInitialized => AppError::MatchesNotFound,
            e => e,
        })?;
    Ok(Json(OutboundFrame::game_stats(&committed.state)))
}

pub async fn fetch_one(
    ctx: RequestContext,
    Path(match_id): Path<String>,
) -> ServiceResponse<OutboundFrame> {
    let state = matches::fetch_one(&ctx, &match_id).await?;
    Ok(Json(OutboundFrame::game_stats(&state)))
}

pub async fn end(
    ctx: RequestContext,
    token: ScorerToken,
    Path(match_id): Path<String>,
) -> ServiceResponse<OutboundFrame> {
    ctx.authorizer().authorize(token.as_deref(), &match_id).await?;
    let state = matches::end(&ctx, &match_id).await?;
    Ok(Json(OutboundFrame::game_stats(&state)))
}
