use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::clock::Clock;
use crate::error::{Error, Result};
use crate::model::{
    api::results::{AggregateResult, LeaderboardStatus, RecentActivity, VotingStats},
    db::setting::{parse_instant, LEADERBOARD_VISIBLE_TIME},
};
use crate::store::Store;

/// Leading candidate reported while the ledger is empty.
pub const NO_VOTES_YET: &str = "No votes yet";

/// Who is asking for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Viewer {
    /// Sees live results at any time.
    Admin,
    /// Sees results only once the leaderboard has opened.
    Public,
}

/// Derives read-only views of the election from the current store contents.
/// Holds no state of its own.
pub struct ResultsAggregator {
    store: Store,
    clock: Arc<dyn Clock>,
}

impl ResultsAggregator {
    pub fn new(store: Store, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Every candidate with their tally, most votes first. Candidates with equal
    /// tallies keep their registration order.
    ///
    /// Public viewers are refused until the leaderboard opens.
    pub async fn compute_results(&self, viewer: Viewer) -> Result<Vec<AggregateResult>> {
        if viewer == Viewer::Public {
            let status = self.leaderboard_status().await?;
            if !status.visible {
                return Err(Error::ResultsNotYetAvailable {
                    visible_at: status.visible_at,
                });
            }
        }
        let (results, _) = self.tally().await?;
        Ok(results)
    }

    /// Headline figures for the admin dashboard.
    pub async fn compute_stats(&self) -> Result<VotingStats> {
        let (results, total_votes) = self.tally().await?;
        let eligible = self.store.voters.count_eligible().await?;
        let status = self.leaderboard_status().await?;

        let leading_candidate = match results.first() {
            Some(leader) if total_votes > 0 => leader.candidate.name.clone(),
            _ => NO_VOTES_YET.to_string(),
        };

        Ok(VotingStats {
            total_votes,
            turnout_rate: percentage(total_votes, eligible),
            leading_candidate,
            time_left: time_left(self.clock.now(), status.visible_at),
            leaderboard_visible: status.visible,
            leaderboard_visible_time: status.visible_at,
        })
    }

    /// Whether the public leaderboard is open, and when it opens.
    /// A missing or unreadable reveal time keeps the leaderboard closed.
    pub async fn leaderboard_status(&self) -> Result<LeaderboardStatus> {
        let visible_at = match self.store.settings.get(LEADERBOARD_VISIBLE_TIME).await? {
            Some(value) => {
                let parsed = parse_instant(&value);
                if parsed.is_none() {
                    warn!("Ignoring unparsable {LEADERBOARD_VISIBLE_TIME} setting {value:?}");
                }
                parsed
            }
            None => None,
        };
        let visible = visible_at.map_or(false, |at| self.clock.now() >= at);
        Ok(LeaderboardStatus {
            visible,
            visible_at,
        })
    }

    /// The newest votes, without revealing who cast them.
    pub async fn recent_activity(&self, limit: usize) -> Result<Vec<RecentActivity>> {
        let candidates = self.store.candidates.list().await?;
        let votes = self.store.ledger.all().await?;
        let activity = votes
            .into_iter()
            .take(limit)
            .map(|vote| RecentActivity {
                candidate_name: candidates
                    .iter()
                    .find(|candidate| candidate.id == vote.candidate_id)
                    .map(|candidate| candidate.name.clone())
                    .unwrap_or_else(|| "Unknown".to_string()),
                timestamp: vote.timestamp,
            })
            .collect();
        Ok(activity)
    }

    /// Ranked results plus the total number of votes.
    async fn tally(&self) -> Result<(Vec<AggregateResult>, u32)> {
        let candidates = self.store.candidates.list().await?;
        let counts = self.store.ledger.counts_by_candidate().await?;
        let total_votes: u32 = counts.values().sum();

        let mut results = candidates
            .into_iter()
            .map(|candidate| {
                let vote_count = counts.get(&candidate.id).copied().unwrap_or(0);
                AggregateResult {
                    candidate: candidate.into(),
                    vote_count,
                    percentage: percentage(vote_count, total_votes),
                }
            })
            .collect::<Vec<_>>();
        // `sort_by` is stable, so ties keep registry order.
        results.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));

        Ok((results, total_votes))
    }
}

/// `part / whole` as a whole percentage, rounding halves up. Zero when `whole` is zero.
fn percentage(part: u32, whole: u32) -> u32 {
    if whole == 0 {
        return 0;
    }
    let (part, whole) = (u64::from(part), u64::from(whole));
    let rounded = (part * 200 + whole) / (2 * whole);
    u32::try_from(rounded).unwrap_or(u32::MAX)
}

/// Human-readable countdown to the leaderboard opening.
fn time_left(now: DateTime<Utc>, visible_at: Option<DateTime<Utc>>) -> String {
    let Some(visible_at) = visible_at else {
        return "Not scheduled".to_string();
    };
    if now >= visible_at {
        return "Leaderboard open".to_string();
    }

    let remaining = visible_at - now;
    let days = remaining.num_days();
    let hours = remaining.num_hours() % 24;
    let minutes = remaining.num_minutes() % 60;
    if days > 0 {
        format!("{days}d {hours}h")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::clock::ManualClock;
    use crate::model::db::{
        candidate::NewCandidate,
        setting::format_instant,
        voter::{NewVoter, Voter},
    };

    struct Fixture {
        store: Store,
        clock: ManualClock,
        aggregator: ResultsAggregator,
    }

    async fn fixture(candidates: &[&str]) -> Fixture {
        let store = Store::memory();
        for name in candidates {
            store
                .candidates
                .create(NewCandidate::named(name))
                .await
                .unwrap();
        }
        let clock = ManualClock::default();
        let aggregator = ResultsAggregator::new(store.clone(), Arc::new(clock.clone()));
        Fixture {
            store,
            clock,
            aggregator,
        }
    }

    /// Register a fresh voter and record their vote directly in the ledger.
    async fn cast(store: &Store, candidate_id: u32) -> Voter {
        let n = store.voters.count_eligible().await.unwrap() + 1;
        let voter = store.voters.create(NewVoter::unhashed(n)).await.unwrap();
        store
            .ledger
            .append(candidate_id, voter.id, Utc::now())
            .await
            .unwrap();
        store.voters.mark_voted(voter.id).await.unwrap();
        voter
    }

    fn summary(results: &[AggregateResult]) -> Vec<(&str, u32, u32)> {
        results
            .iter()
            .map(|r| (r.candidate.name.as_str(), r.vote_count, r.percentage))
            .collect()
    }

    #[test]
    fn percentages_round_half_up() {
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 200), 1);
        assert_eq!(percentage(0, 5), 0);
        assert_eq!(percentage(5, 5), 100);
        assert_eq!(percentage(3, 0), 0);
    }

    #[test]
    fn countdown_formats() {
        let now = Utc::now();
        assert_eq!(time_left(now, None), "Not scheduled");
        assert_eq!(time_left(now, Some(now)), "Leaderboard open");
        assert_eq!(
            time_left(now, Some(now + Duration::hours(62) + Duration::minutes(5))),
            "2d 14h"
        );
        assert_eq!(
            time_left(now, Some(now + Duration::minutes(3 * 60 + 20))),
            "3h 20m"
        );
        assert_eq!(time_left(now, Some(now + Duration::seconds(150))), "2m");
    }

    #[rocket::async_test]
    async fn results_are_ranked_with_percentages() {
        let Fixture {
            store, aggregator, ..
        } = fixture(&["A", "B", "C"]).await;
        cast(&store, 1).await;
        cast(&store, 1).await;
        cast(&store, 2).await;

        let results = aggregator.compute_results(Viewer::Admin).await.unwrap();
        assert_eq!(
            summary(&results),
            vec![("A", 2, 67), ("B", 1, 33), ("C", 0, 0)]
        );
    }

    #[rocket::async_test]
    async fn ties_keep_registration_order() {
        let Fixture {
            store, aggregator, ..
        } = fixture(&["X", "Y"]).await;
        // Y's votes reach the ledger first; the ranking must not care.
        for _ in 0..5 {
            cast(&store, 2).await;
        }
        for _ in 0..5 {
            cast(&store, 1).await;
        }

        let results = aggregator.compute_results(Viewer::Admin).await.unwrap();
        assert_eq!(summary(&results), vec![("X", 5, 50), ("Y", 5, 50)]);
    }

    #[rocket::async_test]
    async fn lower_ranked_candidates_overtake_on_more_votes() {
        let Fixture {
            store, aggregator, ..
        } = fixture(&["First", "Second", "Third"]).await;
        cast(&store, 3).await;

        let results = aggregator.compute_results(Viewer::Admin).await.unwrap();
        assert_eq!(
            summary(&results),
            vec![("Third", 1, 100), ("First", 0, 0), ("Second", 0, 0)]
        );
    }

    #[rocket::async_test]
    async fn public_results_wait_for_the_leaderboard() {
        let Fixture {
            store,
            clock,
            aggregator,
        } = fixture(&["A", "B"]).await;
        cast(&store, 2).await;
        let opens = clock.now() + Duration::hours(1);
        store
            .settings
            .set(LEADERBOARD_VISIBLE_TIME, &format_instant(opens))
            .await
            .unwrap();

        clock.set(opens - Duration::seconds(1));
        match aggregator.compute_results(Viewer::Public).await {
            Err(Error::ResultsNotYetAvailable { visible_at }) => assert_eq!(visible_at, Some(opens)),
            other => panic!("expected ResultsNotYetAvailable, got {other:?}"),
        }
        // Admins are never gated.
        assert_eq!(
            aggregator.compute_results(Viewer::Admin).await.unwrap().len(),
            2
        );

        clock.set(opens);
        let results = aggregator.compute_results(Viewer::Public).await.unwrap();
        assert_eq!(summary(&results), vec![("B", 1, 100), ("A", 0, 0)]);

        clock.advance(Duration::days(3));
        assert!(aggregator.compute_results(Viewer::Public).await.is_ok());
    }

    #[rocket::async_test]
    async fn unset_or_garbled_reveal_time_keeps_leaderboard_closed() {
        let Fixture {
            store, aggregator, ..
        } = fixture(&["A"]).await;

        match aggregator.compute_results(Viewer::Public).await {
            Err(Error::ResultsNotYetAvailable { visible_at: None }) => {}
            other => panic!("expected ResultsNotYetAvailable, got {other:?}"),
        }

        store
            .settings
            .set(LEADERBOARD_VISIBLE_TIME, "after lunch")
            .await
            .unwrap();
        let status = aggregator.leaderboard_status().await.unwrap();
        assert!(!status.visible);
        assert_eq!(status.visible_at, None);
        assert!(aggregator.compute_results(Viewer::Admin).await.is_ok());
    }

    #[rocket::async_test]
    async fn stats_with_no_voters() {
        let Fixture { aggregator, .. } = fixture(&["A", "B"]).await;

        let stats = aggregator.compute_stats().await.unwrap();
        assert_eq!(stats.total_votes, 0);
        assert_eq!(stats.turnout_rate, 0);
        assert_eq!(stats.leading_candidate, NO_VOTES_YET);
        assert_eq!(stats.time_left, "Not scheduled");
        assert!(!stats.leaderboard_visible);
    }

    #[rocket::async_test]
    async fn stats_with_no_candidates() {
        let Fixture { aggregator, .. } = fixture(&[]).await;

        let stats = aggregator.compute_stats().await.unwrap();
        assert_eq!(stats.leading_candidate, NO_VOTES_YET);
        assert!(aggregator
            .compute_results(Viewer::Admin)
            .await
            .unwrap()
            .is_empty());
    }

    #[rocket::async_test]
    async fn stats_count_turnout_among_students() {
        let Fixture {
            store,
            clock,
            aggregator,
        } = fixture(&["A", "B"]).await;
        cast(&store, 2).await;
        cast(&store, 2).await;
        store.voters.create(NewVoter::unhashed(100)).await.unwrap();
        let mut admin = NewVoter::unhashed(101);
        admin.is_admin = true;
        store.voters.create(admin).await.unwrap();
        let opens = clock.now() + Duration::hours(62);
        store
            .settings
            .set(LEADERBOARD_VISIBLE_TIME, &format_instant(opens))
            .await
            .unwrap();

        let stats = aggregator.compute_stats().await.unwrap();
        assert_eq!(stats.total_votes, 2);
        // Two of the three students voted; the admin doesn't count.
        assert_eq!(stats.turnout_rate, 67);
        assert_eq!(stats.leading_candidate, "B");
        assert_eq!(stats.time_left, "2d 14h");
        assert!(!stats.leaderboard_visible);
        assert_eq!(stats.leaderboard_visible_time, Some(opens));
    }

    #[rocket::async_test]
    async fn recent_activity_is_newest_first() {
        let Fixture {
            store, aggregator, ..
        } = fixture(&["A", "B"]).await;
        let start = Utc::now();
        for (n, candidate_id) in [1, 2, 1].into_iter().enumerate() {
            let voter = store
                .voters
                .create(NewVoter::unhashed(n as u32))
                .await
                .unwrap();
            store
                .ledger
                .append(candidate_id, voter.id, start + Duration::seconds(n as i64))
                .await
                .unwrap();
        }

        let activity = aggregator.recent_activity(2).await.unwrap();
        let names = activity
            .iter()
            .map(|a| a.candidate_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["A", "B"]);
        assert_eq!(activity[0].timestamp, start + Duration::seconds(2));
    }

    #[rocket::async_test]
    async fn activity_for_unregistered_candidate_is_unknown() {
        let Fixture {
            store, aggregator, ..
        } = fixture(&["A"]).await;
        let voter = store.voters.create(NewVoter::unhashed(1)).await.unwrap();
        store.ledger.append(7, voter.id, Utc::now()).await.unwrap();

        let activity = aggregator.recent_activity(10).await.unwrap();
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].candidate_name, "Unknown");

        // The stray vote still counts towards the total but not towards "A".
        let results = aggregator.compute_results(Viewer::Admin).await.unwrap();
        assert_eq!(summary(&results), vec![("A", 0, 0)]);
    }
}
