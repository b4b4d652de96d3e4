use rocket::{serde::json::Json, Route, State};

use crate::{
    error::Result,
    model::api::{
        auth::{Account, AuthToken},
        ballot::{VoteReceipt, VoteRequest, VoteStatus},
        candidate::CandidateDescription,
    },
    service::VotingService,
    store::Store,
};

pub fn routes() -> Vec<Route> {
    routes![candidates, vote, vote_status]
}

#[get("/api/candidates")]
pub async fn candidates(store: &State<Store>) -> Result<Json<Vec<CandidateDescription>>> {
    let candidates = store.candidates.list().await?;
    Ok(Json(candidates.into_iter().map(Into::into).collect()))
}

#[post("/api/vote", data = "<ballot>", format = "json")]
pub async fn vote(
    token: AuthToken<Account>,
    ballot: Json<VoteRequest>,
    voting: &State<VotingService>,
) -> Result<Json<VoteReceipt>> {
    let record = voting.submit_vote(token.id, ballot.candidate_id).await?;
    Ok(Json(record.into()))
}

#[get("/api/vote-status")]
pub async fn vote_status(
    token: AuthToken<Account>,
    voting: &State<VotingService>,
) -> Result<Json<VoteStatus>> {
    let has_voted = voting.has_voted(token.id).await?;
    Ok(Json(VoteStatus { has_voted }))
}

#[cfg(test)]
mod tests {
    use rocket::{
        http::{ContentType, Status},
        local::asynchronous::Client,
        serde::json::serde_json::json,
    };

    use crate::model::{api::auth::LoginRequest, db::voter::NewVoter};

    use super::*;

    #[backend_test]
    async fn candidates_are_listed_in_order(client: Client) {
        let response = client.get(uri!(candidates)).dispatch().await;
        assert_eq!(Status::Ok, response.status());

        let candidates: Vec<CandidateDescription> = response.into_json().await.unwrap();
        let ids: Vec<_> = candidates.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
        assert_eq!(candidates[0].name, "Ashvith");
    }

    #[backend_test(voter)]
    async fn vote_once(client: Client, store: Store) {
        let response = client.get(uri!(vote_status)).dispatch().await;
        let status: VoteStatus = response.into_json().await.unwrap();
        assert!(!status.has_voted);

        // First vote is accepted.
        let response = cast(&client, 2).await;
        assert_eq!(Status::Ok, response.status());
        let receipt: VoteReceipt = response.into_json().await.unwrap();
        assert_eq!(receipt.vote.candidate_id, 2);

        let response = client.get(uri!(vote_status)).dispatch().await;
        let status: VoteStatus = response.into_json().await.unwrap();
        assert!(status.has_voted);

        // Second vote, even for someone else, is rejected.
        let response = cast(&client, 3).await;
        assert_eq!(Status::Conflict, response.status());

        // Exactly one record exists.
        let votes = store.ledger.all().await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].voter_id, receipt.vote.voter_id);
    }

    #[backend_test(voter)]
    async fn vote_for_unknown_candidate(client: Client, store: Store) {
        let response = cast(&client, 99).await;
        assert_eq!(Status::BadRequest, response.status());
        assert!(store.ledger.all().await.unwrap().is_empty());

        // The voter may still vote properly afterwards.
        let response = cast(&client, 1).await;
        assert_eq!(Status::Ok, response.status());
    }

    #[backend_test(admin)]
    async fn admin_cannot_vote(client: Client, store: Store) {
        let response = cast(&client, 1).await;
        assert_eq!(Status::Forbidden, response.status());
        assert!(store.ledger.all().await.unwrap().is_empty());
    }

    #[backend_test]
    async fn vote_requires_login(client: Client, store: Store) {
        let response = cast(&client, 1).await;
        assert_eq!(Status::NotFound, response.status());
        assert!(store.ledger.all().await.unwrap().is_empty());

        let response = client.get(uri!(vote_status)).dispatch().await;
        assert_eq!(Status::NotFound, response.status());

        // Existing but logged-out voters cannot vote either.
        store.voters.create(NewVoter::example()).await.unwrap();
        let response = cast(&client, 1).await;
        assert_eq!(Status::NotFound, response.status());
        assert!(store.ledger.all().await.unwrap().is_empty());

        // The same request succeeds once logged in.
        let response = client
            .post(uri!(crate::api::auth::login))
            .header(ContentType::JSON)
            .body(json!(LoginRequest::example()).to_string())
            .dispatch()
            .await;
        assert_eq!(Status::Ok, response.status());
        let response = cast(&client, 1).await;
        assert_eq!(Status::Ok, response.status());
        assert_eq!(store.ledger.all().await.unwrap().len(), 1);
    }

    #[test]
    fn routes_live_under_api() {
        assert_eq!(uri!(candidates).to_string(), "/api/candidates");
        assert_eq!(uri!(vote).to_string(), "/api/vote");
        assert_eq!(uri!(vote_status).to_string(), "/api/vote-status");
    }

    async fn cast(client: &Client, candidate_id: u32) -> rocket::local::asynchronous::LocalResponse<'_> {
        client
            .post(uri!(vote))
            .header(ContentType::JSON)
            .body(json!(VoteRequest { candidate_id }).to_string())
            .dispatch()
            .await
    }
}
