use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::{
        api::{
            auth::{Admin, AuthToken},
            ballot::VoteDescription,
            leaderboard::LeaderboardSchedule,
            results::LeaderboardStatus,
        },
        db::setting::{format_instant, LEADERBOARD_VISIBLE_TIME},
    },
    service::ResultsAggregator,
    store::Store,
};

pub fn routes() -> Vec<Route> {
    routes![votes, get_leaderboard, set_leaderboard]
}

/// The full ledger, newest first.
#[get("/api/admin/votes")]
pub async fn votes(
    _token: AuthToken<Admin>,
    store: &State<Store>,
) -> Result<Json<Vec<VoteDescription>>> {
    let records = store.ledger.all().await?;
    Ok(Json(records.into_iter().map(Into::into).collect()))
}

#[get("/api/admin/leaderboard")]
pub async fn get_leaderboard(
    _token: AuthToken<Admin>,
    results: &State<ResultsAggregator>,
) -> Result<Json<LeaderboardStatus>> {
    Ok(Json(results.leaderboard_status().await?))
}

/// Reschedule the public leaderboard. A time in the past opens it immediately.
#[put("/api/admin/leaderboard", data = "<schedule>", format = "json")]
pub async fn set_leaderboard(
    token: AuthToken<Admin>,
    schedule: Json<LeaderboardSchedule>,
    store: &State<Store>,
    results: &State<ResultsAggregator>,
) -> Result<Json<LeaderboardStatus>> {
    store
        .settings
        .set(LEADERBOARD_VISIBLE_TIME, &format_instant(schedule.visible_at))
        .await?;
    info!(
        "Admin {} moved the leaderboard reveal to {}",
        token.id, schedule.visible_at
    );
    Ok(Json(results.leaderboard_status().await?))
}
