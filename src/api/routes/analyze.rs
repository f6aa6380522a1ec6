use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::api::state::AppState;
use crate::api::ApiError;
use crate::calculate;
use crate::models::{AnalysisResult, ProfileId};

#[derive(Debug, Deserialize)]
pub struct AnalyzeParams {
    pub profile_id: Option<String>,
}

/// Accepts the raw query value so a missing id and a malformed one get
/// different messages.
pub fn parse_profile_id(raw: Option<&str>) -> Result<ProfileId, ApiError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing profile_id".to_string()))?;

    raw.parse::<ProfileId>()
        .map_err(|_| ApiError::BadRequest("Invalid profile_id".to_string()))
}

/// `GET /api/analyze?profile_id=<int>`
///
/// Refreshes the stored history, then analyzes the full merged history.
pub async fn analyze(
    State(state): State<AppState>,
    Query(params): Query<AnalyzeParams>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let profile_id = parse_profile_id(params.profile_id.as_deref())?;

    let outcome = state.sync.refresh(profile_id).await?;
    let result = calculate::analyze(&outcome.history, profile_id);

    info!(
        "Analyzed player {}: {} matches, {} civilizations",
        profile_id,
        result.match_stats.total,
        result.civ_stats.len()
    );

    Ok(Json(result))
}
