mod config;
pub mod builder;
pub mod flow;
pub mod manual;
pub mod names;
pub mod parser;

use log::{debug, info, warn};

use std::collections::{BTreeMap, HashSet};

pub use crate::config::*;

// **** Private structures ****

type RoundId = u32;

#[derive(PartialEq, Debug, Clone, Copy, Default)]
struct CandidateScore {
    primary: f64,
    // Contributions of the second and third live preferences.
    tiebreak: f64,
}

impl CandidateScore {
    fn total(&self) -> f64 {
        self.primary + self.tiebreak
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum Extreme {
    Top,
    Bottom,
}

#[derive(PartialEq, Debug, Clone)]
struct Winner {
    cid: CandidateId,
    round: RoundId,
    quota: f64,
}

/// A single STV count, advanced one round at a time.
///
/// The tabulation owns its copy of the ballots: rankings and voting powers
/// are rewritten in place from one round to the next, and the ballots of the
/// caller are never touched.
#[derive(Debug, Clone)]
pub struct Tabulation {
    rules: StvRules,
    candidates: Vec<String>,
    ballots: Vec<Ballot>,
    // Indexed by candidate position.
    running: Vec<bool>,
    winners: Vec<Winner>,
    rounds: Vec<RoundSnapshot>,
    initial_voting_power: f64,
    remaining_voting_power: f64,
    cumulative_exhausted: f64,
    locked_voting_power: f64,
}

impl Tabulation {
    pub fn new(
        ballots: &[Ballot],
        rules: &StvRules,
        candidates: &[String],
    ) -> Result<Tabulation, VotingErrors> {
        check_configuration(rules, candidates)?;
        info!(
            "STV with {} winners, {} candidates, {} ballots",
            rules.seats,
            candidates.len(),
            ballots.len()
        );
        for (idx, name) in candidates.iter().enumerate() {
            info!("Candidate: {}: {}", idx + 1, name);
        }

        let num_candidates = candidates.len() as u32;
        let mut arena: Vec<Ballot> = Vec::with_capacity(ballots.len());
        for b in ballots.iter() {
            let mut ballot = b.clone();
            for choice in ballot.ranking.iter_mut() {
                if let Choice::Filled(cid) = *choice {
                    if cid.0 == 0 || cid.0 > num_candidates {
                        warn!(
                            "Ballot {}: dropping unknown candidate number {}",
                            ballot.voter, cid.0
                        );
                        *choice = Choice::Removed;
                    }
                }
            }
            ballot.voting_power = ballot.voting_power.clamp(0.0, 1.0);
            arena.push(ballot);
        }
        let initial_voting_power: f64 = arena.iter().map(|b| b.voting_power).sum();

        Ok(Tabulation {
            rules: *rules,
            candidates: candidates.to_vec(),
            ballots: arena,
            running: vec![true; candidates.len()],
            winners: Vec::new(),
            rounds: Vec::new(),
            initial_voting_power,
            remaining_voting_power: initial_voting_power,
            cumulative_exhausted: 0.0,
            locked_voting_power: 0.0,
        })
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self.ballots
    }

    pub fn rounds(&self) -> &[RoundSnapshot] {
        &self.rounds
    }

    pub fn winners(&self) -> Vec<String> {
        self.winners
            .iter()
            .map(|w| self.candidates[w.cid.index()].clone())
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.winners.len() as u32 >= self.rules.seats
    }

    pub fn initial_voting_power(&self) -> f64 {
        self.initial_voting_power
    }

    /// Voting power of the ballots that are not exhausted, including the part
    /// already locked in by the winners.
    pub fn remaining_voting_power(&self) -> f64 {
        self.remaining_voting_power
    }

    pub fn cumulative_exhausted(&self) -> f64 {
        self.cumulative_exhausted
    }

    /// Voting power kept by the elected candidates.
    pub fn locked_voting_power(&self) -> f64 {
        self.locked_voting_power
    }

    pub fn quota(&self) -> f64 {
        self.remaining_voting_power / (self.rules.seats as f64 + 1.0)
    }

    /// Runs one round: elects the top candidate if they reach the quota,
    /// eliminates the bottom candidate otherwise.
    pub fn next_round(&mut self) -> Result<&RoundSnapshot, VotingErrors> {
        if self.is_complete() {
            return Err(VotingErrors::CountComplete);
        }
        let round_id = (self.rounds.len() + 1) as RoundId;
        info!("--- Round {} ---", round_id);

        let scores = compute_scores(&self.ballots, self.candidates.len(), &self.rules);
        let mut tally: BTreeMap<String, f64> = BTreeMap::new();
        for (idx, score) in scores.iter().enumerate() {
            if score.primary > 0.0 {
                tally.insert(self.candidates[idx].clone(), score.primary);
            }
        }
        {
            let mut sorted_tally: Vec<(&String, &f64)> = tally.iter().collect();
            sorted_tally.sort_by(|a, b| b.1.total_cmp(a.1));
            for (name, votes) in sorted_tally {
                info!("  {}: {:.3} votes", name, votes);
            }
        }

        let top = match find_extreme_candidate(&scores, Extreme::Top) {
            Some(cid) => cid,
            None => {
                warn!(
                    "Round {}: cannot determine the top candidate, stopping the count",
                    round_id
                );
                return Err(VotingErrors::Deadlock {
                    round: round_id,
                    completed_rounds: self.rounds.clone(),
                });
            }
        };
        // Every round removes a candidate that still holds votes.
        if self.rounds.len() >= self.candidates.len() {
            return Err(VotingErrors::NoConvergence);
        }
        let quota = self.quota();
        let top_score = scores[top.index()];
        debug!(
            "next_round: top candidate {:?} score {:?} quota {:?}",
            top, top_score, quota
        );

        let tally_result = if top_score.total() >= quota {
            self.elect(top, top_score, quota, round_id)
        } else {
            let bottom = find_extreme_candidate(&scores, Extreme::Bottom)
                .unwrap_or_else(|| self.first_running_candidate());
            self.eliminate(bottom, scores[bottom.index()])
        };

        self.rounds.push(RoundSnapshot {
            round: round_id,
            tally,
            quota,
            exhausted: self.cumulative_exhausted,
            tally_result: Some(tally_result),
            is_final_round: false,
        });

        self.sweep_exhausted();
        info!(
            "  Total remaining voting power: {:.3}",
            self.remaining_voting_power
        );
        Ok(&self.rounds[self.rounds.len() - 1])
    }

    /// Runs the remaining rounds and closes the count.
    pub fn finish(mut self) -> Result<StvResult, VotingErrors> {
        while !self.is_complete() {
            self.next_round()?;
        }

        // Closing round: every winner holds the quota they were elected with.
        let mut final_tally: BTreeMap<String, f64> = BTreeMap::new();
        for w in self.winners.iter() {
            final_tally.insert(self.candidates[w.cid.index()].clone(), w.quota);
        }
        let quota = self.quota();
        self.rounds.push(RoundSnapshot {
            round: (self.rounds.len() + 1) as RoundId,
            tally: final_tally,
            quota,
            exhausted: self.cumulative_exhausted,
            tally_result: None,
            is_final_round: true,
        });

        Ok(StvResult {
            winners: self.winners(),
            quota,
            rounds: self.rounds,
        })
    }

    fn elect(
        &mut self,
        cid: CandidateId,
        score: CandidateScore,
        quota: f64,
        round: RoundId,
    ) -> TallyResult {
        let name = self.candidates[cid.index()].clone();
        info!(
            "WIN: {} ({:.3} votes, quota: {:.3})",
            name,
            score.total(),
            quota
        );

        let counted = counted_ballots(&self.ballots, cid);
        self.remove_candidate(cid);

        // Winning through the tiebreak score may leave the primary votes under the quota.
        let surplus_fraction = if score.primary > 0.0 {
            ((score.primary - quota) / score.primary).max(0.0)
        } else {
            0.0
        };
        debug!(
            "elect: {} ballots scaled by surplus fraction {:?}",
            counted.len(),
            surplus_fraction
        );
        for idx in counted {
            let ballot = &mut self.ballots[idx];
            let kept = ballot.voting_power * (1.0 - surplus_fraction);
            ballot.voting_power -= kept;
            self.locked_voting_power += kept;
        }

        self.winners.push(Winner { cid, round, quota });
        TallyResult::Elected(name)
    }

    fn eliminate(&mut self, cid: CandidateId, score: CandidateScore) -> TallyResult {
        let name = self.candidates[cid.index()].clone();
        let counted = counted_ballots(&self.ballots, cid);
        info!(
            "ELIM: {} ({:.3} votes from {} ballots)",
            name,
            score.primary,
            counted.len()
        );

        self.remove_candidate(cid);

        for idx in counted {
            let ballot = &self.ballots[idx];
            let next_name = match ballot.ranked_choice(1) {
                Some(next) => self.candidates[next.index()].as_str(),
                None => "[exhausted]",
            };
            debug!(
                "  {} (power: {:.3}) -> {}",
                ballot.voter, ballot.voting_power, next_name
            );
        }
        TallyResult::Eliminated(name)
    }

    fn remove_candidate(&mut self, cid: CandidateId) {
        self.running[cid.index()] = false;
        for ballot in self.ballots.iter_mut() {
            ballot.remove_candidate(cid);
        }
    }

    fn first_running_candidate(&self) -> CandidateId {
        let idx = self.running.iter().position(|r| *r).unwrap_or(0);
        CandidateId((idx + 1) as u32)
    }

    // Zeroes the power of the ballots that have no live preference left.
    fn sweep_exhausted(&mut self) {
        let mut exhausted_count = 0;
        let mut exhausted_power = 0.0;
        for ballot in self.ballots.iter_mut() {
            if ballot.voting_power > 0.0 && ballot.is_exhausted() {
                exhausted_count += 1;
                exhausted_power += ballot.voting_power;
                ballot.voting_power = 0.0;
            }
        }
        if exhausted_count > 0 {
            self.remaining_voting_power -= exhausted_power;
            self.cumulative_exhausted += exhausted_power;
            info!(
                "  {} ballot(s) exhausted (total power: {:.3})",
                exhausted_count, exhausted_power
            );
        }
    }
}

/// Runs the single transferable vote on the given ballots.
///
/// Arguments:
/// * `ballots` the ballots to count. They are copied and left untouched.
/// * `rules` the number of seats and the tiebreak weights
/// * `candidates` the candidate names. The position in this list is the
/// candidate number used by the ballots (starting at 1).
pub fn run_stv(
    ballots: &[Ballot],
    rules: &StvRules,
    candidates: &[String],
) -> Result<StvResult, VotingErrors> {
    let res = Tabulation::new(ballots, rules, candidates)?.finish()?;
    info!("Winners: {:?}", res.winners);
    Ok(res)
}

/// Lists the elected and eliminated candidates with the round in which it happened.
pub fn outcomes_from_rounds(rounds: &[RoundSnapshot]) -> Vec<Outcome> {
    rounds
        .iter()
        .filter(|r| !r.is_final_round)
        .filter_map(|r| match &r.tally_result {
            Some(TallyResult::Elected(name)) => Some(Outcome {
                candidate: name.clone(),
                round: r.round,
                kind: OutcomeKind::Elected,
            }),
            Some(TallyResult::Eliminated(name)) => Some(Outcome {
                candidate: name.clone(),
                round: r.round,
                kind: OutcomeKind::Eliminated,
            }),
            None => None,
        })
        .collect()
}

pub(crate) fn check_configuration(rules: &StvRules, candidates: &[String]) -> Result<(), VotingErrors> {
    if candidates.is_empty() {
        return Err(VotingErrors::EmptyElection);
    }
    if rules.seats == 0 {
        return Err(VotingErrors::InvalidSeats(rules.seats));
    }
    if rules.seats as usize > candidates.len() {
        return Err(VotingErrors::TooManySeats {
            seats: rules.seats,
            candidates: candidates.len(),
        });
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for name in candidates.iter() {
        if !seen.insert(name.as_str()) {
            return Err(VotingErrors::DuplicateCandidate(name.clone()));
        }
    }
    Ok(())
}

fn compute_scores(
    ballots: &[Ballot],
    num_candidates: usize,
    rules: &StvRules,
) -> Vec<CandidateScore> {
    let mut scores = vec![CandidateScore::default(); num_candidates];
    for b in ballots.iter() {
        if let Some(cid) = b.ranked_choice(1) {
            scores[cid.index()].primary += b.voting_power;
        }
        if let Some(cid) = b.ranked_choice(2) {
            scores[cid.index()].tiebreak += b.voting_power * rules.second_choice_weight;
        }
        if let Some(cid) = b.ranked_choice(3) {
            scores[cid.index()].tiebreak += b.voting_power * rules.third_choice_weight;
        }
    }
    scores
}

fn counted_ballots(ballots: &[Ballot], cid: CandidateId) -> Vec<usize> {
    ballots
        .iter()
        .enumerate()
        .filter_map(|(idx, b)| {
            if b.ranked_choice(1) == Some(cid) {
                Some(idx)
            } else {
                None
            }
        })
        .collect()
}

// Candidates without any score are never selected.
// On equal scores, the candidate listed first wins the comparison.
fn find_extreme_candidate(scores: &[CandidateScore], extreme: Extreme) -> Option<CandidateId> {
    let mut selected: Option<(usize, f64)> = None;
    for (idx, score) in scores.iter().enumerate() {
        let total = score.total();
        if total == 0.0 {
            continue;
        }
        let better = match (selected, extreme) {
            (None, _) => true,
            (Some((_, best)), Extreme::Top) => total > best,
            (Some((_, best)), Extreme::Bottom) => total < best,
        };
        if better {
            selected = Some((idx, total));
        }
    }
    selected.map(|(idx, _)| CandidateId((idx + 1) as u32))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    fn ballot(voter: &str, ranks: &[u32]) -> Ballot {
        Ballot::new(
            voter,
            ranks.iter().map(|c| Choice::Filled(CandidateId(*c))).collect(),
        )
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn ranked_choice_skips_removed_and_stops_at_blank() {
        let b = Ballot::new(
            "v",
            vec![
                Choice::Removed,
                Choice::Filled(CandidateId(2)),
                Choice::Filled(CandidateId(3)),
                Choice::Blank,
                Choice::Filled(CandidateId(1)),
            ],
        );
        assert_eq!(b.ranked_choice(1), Some(CandidateId(2)));
        assert_eq!(b.ranked_choice(2), Some(CandidateId(3)));
        assert_eq!(b.ranked_choice(3), None);
        assert!(!b.is_exhausted());
    }

    #[test]
    fn simple_majority() {
        let candidates = names(&["A", "B", "C"]);
        let ballots: Vec<Ballot> = (0..5)
            .map(|i| ballot(&format!("v{}", i), &[1, 2]))
            .collect();
        let mut tab = Tabulation::new(&ballots, &StvRules::with_seats(1), &candidates).unwrap();
        let round = tab.next_round().unwrap().clone();
        assert_eq!(round.round, 1);
        assert_close(round.quota, 2.5);
        assert_close(round.tally_of("A"), 5.0);
        assert_eq!(round.elected(), Some("A"));
        for b in tab.ballots() {
            assert_close(b.voting_power, 0.5);
        }
        assert!(tab.is_complete());
        assert_eq!(tab.next_round().unwrap_err(), VotingErrors::CountComplete);
        assert_eq!(tab.rounds().len(), 1);
        assert_eq!(tab.winners(), names(&["A"]));

        let res = run_stv(&ballots, &StvRules::with_seats(1), &candidates).unwrap();
        assert_eq!(res.winners, names(&["A"]));
        assert_eq!(res.rounds.len(), 2);
        let last = res.rounds.last().unwrap();
        assert!(last.is_final_round);
        assert_close(last.tally_of("A"), 2.5);
    }

    #[test]
    fn elimination_cascade() {
        let candidates = names(&["A", "B", "C"]);
        let ballots = vec![
            ballot("a1", &[1]),
            ballot("a2", &[1]),
            ballot("b1", &[2]),
            ballot("b2", &[2]),
            ballot("c1", &[3, 2]),
        ];
        let mut tab = Tabulation::new(&ballots, &StvRules::with_seats(1), &candidates).unwrap();
        let r1 = tab.next_round().unwrap().clone();
        assert_close(r1.quota, 2.5);
        assert_eq!(r1.eliminated(), Some("C"));
        assert_close(r1.tally_of("C"), 1.0);

        let r2 = tab.next_round().unwrap().clone();
        assert_close(r2.tally_of("B"), 3.0);
        assert_eq!(r2.elected(), Some("B"));
    }

    #[test]
    fn exhausted_ballot_leaves_the_count() {
        let candidates = names(&["A", "B", "C"]);
        let ballots = vec![
            ballot("a1", &[1]),
            ballot("a2", &[1]),
            ballot("b1", &[2]),
            ballot("b2", &[2]),
            ballot("c1", &[3]),
        ];
        let mut tab = Tabulation::new(&ballots, &StvRules::with_seats(1), &candidates).unwrap();
        tab.next_round().unwrap();
        let c1 = tab.ballots().iter().find(|b| b.voter == "c1").unwrap();
        assert_eq!(c1.voting_power, 0.0);
        assert!(c1.is_exhausted());
        assert_close(tab.remaining_voting_power(), 4.0);
        assert_close(tab.cumulative_exhausted(), 1.0);

        let r2 = tab.next_round().unwrap().clone();
        assert_close(r2.quota, 2.0);
        assert_close(r2.exhausted, 1.0);
        assert!(!r2.tally.contains_key("C"));
        // A and B are tied on primary votes: the first listed reaches the quota.
        assert_eq!(r2.elected(), Some("A"));
    }

    #[test]
    fn second_choices_break_ties() {
        let candidates = names(&["A", "B", "C", "D"]);
        let ballots = vec![
            ballot("a1", &[1]),
            ballot("b1", &[2]),
            ballot("c1", &[3, 1]),
            ballot("d1", &[4]),
        ];
        let mut tab = Tabulation::new(&ballots, &StvRules::with_seats(1), &candidates).unwrap();
        let r1 = tab.next_round().unwrap().clone();
        // Everyone has one primary vote, A also has a second preference.
        assert_close(r1.quota, 2.0);
        assert_eq!(r1.eliminated(), Some("B"));

        let no_tiebreak = StvRules {
            second_choice_weight: 0.0,
            third_choice_weight: 0.0,
            ..StvRules::with_seats(1)
        };
        let mut tab = Tabulation::new(&ballots, &no_tiebreak, &candidates).unwrap();
        assert_eq!(tab.next_round().unwrap().eliminated(), Some("A"));
    }

    #[test]
    fn caller_ballots_are_not_mutated() {
        let candidates = names(&["A", "B"]);
        let ballots = vec![ballot("a1", &[1, 2]), ballot("a2", &[1]), ballot("b1", &[2])];
        let copy = ballots.clone();
        let first = run_stv(&ballots, &StvRules::with_seats(1), &candidates).unwrap();
        let second = run_stv(&ballots, &StvRules::with_seats(1), &candidates).unwrap();
        assert_eq!(ballots, copy);
        assert_eq!(first, second);
    }

    #[test]
    fn deadlock_reports_completed_rounds() {
        let candidates = names(&["A", "B", "C"]);
        // Two seats but every ballot exhausts once A is elected.
        let ballots = vec![ballot("a1", &[1]), ballot("a2", &[1]), ballot("a3", &[1])];
        let err = run_stv(&ballots, &StvRules::with_seats(2), &candidates).unwrap_err();
        match err {
            VotingErrors::Deadlock {
                round,
                completed_rounds,
            } => {
                assert_eq!(round, 2);
                assert_eq!(completed_rounds.len(), 1);
                assert_eq!(completed_rounds[0].elected(), Some("A"));
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn deadlock_after_every_candidate_left() {
        let candidates = names(&["A", "B", "C"]);
        let mut ballots: Vec<Ballot> = (0..10).map(|i| ballot(&format!("a{}", i), &[1])).collect();
        ballots.push(ballot("b1", &[2]));
        ballots.push(ballot("c1", &[3]));
        let err = run_stv(&ballots, &StvRules::with_seats(2), &candidates).unwrap_err();
        match err {
            VotingErrors::Deadlock {
                round,
                completed_rounds,
            } => {
                assert_eq!(round, 4);
                assert_eq!(completed_rounds.len(), 3);
                assert_eq!(completed_rounds[0].elected(), Some("A"));
                assert_eq!(completed_rounds[1].eliminated(), Some("B"));
                assert_eq!(completed_rounds[2].eliminated(), Some("C"));
            }
            e => panic!("unexpected error {:?}", e),
        }
    }

    #[test]
    fn empty_ballots_count_in_the_first_quota() {
        let candidates = names(&["A", "B", "C"]);
        let ballots = vec![
            ballot("a1", &[1]),
            ballot("a2", &[1]),
            ballot("a3", &[1]),
            ballot("b1", &[2]),
            ballot("c1", &[3]),
            ballot("e1", &[]),
            ballot("e2", &[]),
        ];
        let mut tab = Tabulation::new(&ballots, &StvRules::with_seats(1), &candidates).unwrap();
        assert_close(tab.remaining_voting_power(), 7.0);

        let r1 = tab.next_round().unwrap().clone();
        assert_close(r1.quota, 3.5);
        assert_close(r1.exhausted, 0.0);
        assert_eq!(r1.eliminated(), Some("B"));
        // The empty ballots and the ballot of B leave after the first round.
        assert_close(tab.cumulative_exhausted(), 3.0);

        let r2 = tab.next_round().unwrap().clone();
        assert_close(r2.quota, 2.0);
        assert_close(r2.exhausted, 3.0);
        assert_eq!(r2.elected(), Some("A"));
    }

    fn heavy_second_choices() -> StvRules {
        StvRules {
            second_choice_weight: 0.9,
            ..StvRules::with_seats(1)
        }
    }

    #[test]
    fn elected_under_the_quota_keeps_all_votes() {
        let candidates = names(&["A", "B", "C", "D"]);
        let ballots = vec![
            ballot("a1", &[1]),
            ballot("b1", &[2, 1]),
            ballot("c1", &[3, 1]),
            ballot("d1", &[4, 1]),
        ];
        let mut tab = Tabulation::new(&ballots, &heavy_second_choices(), &candidates).unwrap();
        let r1 = tab.next_round().unwrap().clone();
        // A has a single primary vote, under the quota of 2, but a score of 3.7.
        assert_close(r1.quota, 2.0);
        assert_close(r1.tally_of("A"), 1.0);
        assert_eq!(r1.elected(), Some("A"));

        let a1 = tab.ballots().iter().find(|b| b.voter == "a1").unwrap();
        assert_eq!(a1.voting_power, 0.0);
        for b in tab.ballots().iter().filter(|b| b.voter != "a1") {
            assert_close(b.voting_power, 1.0);
        }
        assert_close(tab.locked_voting_power(), 1.0);
        assert_close(tab.remaining_voting_power(), 4.0);
        assert!(tab.is_complete());
    }

    #[test]
    fn elected_without_primary_votes() {
        let candidates = names(&["A", "B", "C", "D"]);
        let ballots = vec![
            ballot("b1", &[2, 1]),
            ballot("c1", &[3, 1]),
            ballot("d1", &[4, 1]),
        ];
        let res = run_stv(&ballots, &heavy_second_choices(), &candidates).unwrap();
        assert_eq!(res.winners, names(&["A"]));
        assert!(!res.rounds[0].tally.contains_key("A"));
        assert_eq!(res.rounds[0].elected(), Some("A"));
        // Nothing was locked: every ballot still holds its full power.
        assert_close(res.quota, 1.5);
    }

    #[test]
    fn rejects_malformed_configuration() {
        let ballots = vec![ballot("a1", &[1])];
        assert_eq!(
            run_stv(&ballots, &StvRules::with_seats(1), &[]).unwrap_err(),
            VotingErrors::EmptyElection
        );
        assert_eq!(
            run_stv(&ballots, &StvRules::with_seats(0), &names(&["A"])).unwrap_err(),
            VotingErrors::InvalidSeats(0)
        );
        assert_eq!(
            run_stv(&ballots, &StvRules::with_seats(3), &names(&["A", "B"])).unwrap_err(),
            VotingErrors::TooManySeats {
                seats: 3,
                candidates: 2
            }
        );
        assert_eq!(
            run_stv(&ballots, &StvRules::with_seats(1), &names(&["A", "A"])).unwrap_err(),
            VotingErrors::DuplicateCandidate("A".to_string())
        );
    }

    #[test]
    fn outcomes_follow_rounds() {
        let candidates = names(&["A", "B", "C"]);
        let ballots = vec![
            ballot("a1", &[1]),
            ballot("a2", &[1]),
            ballot("b1", &[2]),
            ballot("b2", &[2]),
            ballot("c1", &[3, 2]),
        ];
        let res = run_stv(&ballots, &StvRules::with_seats(1), &candidates).unwrap();
        let outcomes = outcomes_from_rounds(&res.rounds);
        assert_eq!(
            outcomes,
            vec![
                Outcome {
                    candidate: "C".to_string(),
                    round: 1,
                    kind: OutcomeKind::Eliminated
                },
                Outcome {
                    candidate: "B".to_string(),
                    round: 2,
                    kind: OutcomeKind::Elected
                },
            ]
        );
    }
}
