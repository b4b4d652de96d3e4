use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::api::{
        auth::{Admin, AuthToken},
        results::{AggregateResult, LeaderboardStatus, RecentActivity, VotingStats},
    },
    service::{ResultsAggregator, Viewer},
};

/// Number of votes shown in the admin activity feed.
const RECENT_ACTIVITY_LIMIT: usize = 10;

pub fn routes() -> Vec<Route> {
    routes![
        results_admin,
        results_public,
        leaderboard_status,
        stats,
        recent_activity,
    ]
}

#[get("/api/results", rank = 1)]
pub async fn results_admin(
    _token: AuthToken<Admin>,
    results: &State<ResultsAggregator>,
) -> Result<Json<Vec<AggregateResult>>> {
    Ok(Json(results.compute_results(Viewer::Admin).await?))
}

#[get("/api/results", rank = 2)]
pub async fn results_public(
    results: &State<ResultsAggregator>,
) -> Result<Json<Vec<AggregateResult>>> {
    Ok(Json(results.compute_results(Viewer::Public).await?))
}

#[get("/api/leaderboard-status")]
pub async fn leaderboard_status(
    results: &State<ResultsAggregator>,
) -> Result<Json<LeaderboardStatus>> {
    Ok(Json(results.leaderboard_status().await?))
}

#[get("/api/stats")]
pub async fn stats(
    _token: AuthToken<Admin>,
    results: &State<ResultsAggregator>,
) -> Result<Json<VotingStats>> {
    Ok(Json(results.compute_stats().await?))
}

#[get("/api/recent-activity")]
pub async fn recent_activity(
    _token: AuthToken<Admin>,
    results: &State<ResultsAggregator>,
) -> Result<Json<Vec<RecentActivity>>> {
    Ok(Json(
        results.recent_activity(RECENT_ACTIVITY_LIMIT).await?,
    ))
}
