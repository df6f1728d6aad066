// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// The position of a candidate in the candidate list of an election, starting at 1.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct CandidateId(pub u32);

impl CandidateId {
    pub(crate) fn index(self) -> usize {
        (self.0 - 1) as usize
    }
}

/// One position in the ranking of a ballot.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Choice {
    /// No further preference. Anything ranked after it is ignored.
    Blank,
    /// The candidate at this position has been elected or eliminated.
    Removed,
    Filled(CandidateId),
}

/// The ranked preference of one voter.
///
/// The ranking is mutated in place as candidates leave the count, and the
/// voting power only ever decreases.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Ballot {
    pub voter: String,
    pub ranking: Vec<Choice>,
    #[serde(rename = "votingPower")]
    pub voting_power: f64,
}

impl Ballot {
    pub fn new(voter: &str, ranking: Vec<Choice>) -> Ballot {
        Ballot {
            voter: voter.to_string(),
            ranking,
            voting_power: 1.0,
        }
    }

    /// The n-th live preference (starting at 1), skipping removed candidates.
    pub fn ranked_choice(&self, num: usize) -> Option<CandidateId> {
        let mut remaining = num;
        for choice in self.ranking.iter() {
            match choice {
                Choice::Removed => {}
                Choice::Blank => return None,
                Choice::Filled(cid) if remaining == 1 => return Some(*cid),
                Choice::Filled(_) => {
                    remaining -= 1;
                }
            }
        }
        None
    }

    pub fn remove_candidate(&mut self, cid: CandidateId) {
        for choice in self.ranking.iter_mut() {
            if *choice == Choice::Filled(cid) {
                *choice = Choice::Removed;
            }
        }
    }

    pub fn is_exhausted(&self) -> bool {
        self.ranked_choice(1).is_none()
    }
}

// ******** Output data structures *********

/// What happened to a candidate in a round.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TallyResult {
    Elected(String),
    Eliminated(String),
}

/// Statistics for one round
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub round: u32,
    /// Primary votes, only for the candidates that received some.
    pub tally: BTreeMap<String, f64>,
    pub quota: f64,
    /// Cumulative voting power of the exhausted ballots at the start of the round.
    pub exhausted: f64,
    #[serde(
        rename = "tallyResult",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub tally_result: Option<TallyResult>,
    #[serde(rename = "isFinalRound", default)]
    pub is_final_round: bool,
}

impl RoundSnapshot {
    pub fn elected(&self) -> Option<&str> {
        match &self.tally_result {
            Some(TallyResult::Elected(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn eliminated(&self) -> Option<&str> {
        match &self.tally_result {
            Some(TallyResult::Eliminated(name)) => Some(name.as_str()),
            _ => None,
        }
    }

    pub fn tally_of(&self, name: &str) -> f64 {
        self.tally.get(name).cloned().unwrap_or(0.0)
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StvResult {
    /// In the order in which they were elected.
    pub winners: Vec<String>,
    /// Quota computed from the voting power left at the end of the count.
    pub quota: f64,
    pub rounds: Vec<RoundSnapshot>,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeKind {
    Elected,
    Eliminated,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Outcome {
    pub candidate: String,
    pub round: u32,
    #[serde(rename = "type")]
    pub kind: OutcomeKind,
}

/// Errors that prevent the algorithm from completing successfully.
#[derive(PartialEq, Debug, Clone)]
pub enum VotingErrors {
    EmptyElection,
    InvalidSeats(u32),
    TooManySeats { seats: u32, candidates: usize },
    DuplicateCandidate(String),
    /// No candidate holds any vote while a seat is still open.
    /// The rounds that were completed are kept for inspection.
    Deadlock {
        round: u32,
        completed_rounds: Vec<RoundSnapshot>,
    },
    NoConvergence,
    /// Every seat is already filled.
    CountComplete,
}

impl Error for VotingErrors {}

impl Display for VotingErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VotingErrors::EmptyElection => write!(f, "the election has no candidate"),
            VotingErrors::InvalidSeats(seats) => {
                write!(f, "the number of seats must be positive, got {}", seats)
            }
            VotingErrors::TooManySeats { seats, candidates } => write!(
                f,
                "{} seats cannot be filled with only {} candidates",
                seats, candidates
            ),
            VotingErrors::DuplicateCandidate(name) => {
                write!(f, "candidate {:?} is listed more than once", name)
            }
            VotingErrors::Deadlock { round, .. } => write!(
                f,
                "cannot determine the top candidate in round {}: no candidate has any vote left",
                round
            ),
            VotingErrors::NoConvergence => {
                write!(f, "the count did not finish within the expected number of rounds")
            }
            VotingErrors::CountComplete => write!(f, "every seat is already filled"),
        }
    }
}

// ********* Configuration **********

#[derive(PartialEq, Debug, Clone, Copy)]
pub struct StvRules {
    pub seats: u32,
    /// Weight of a second live preference in the ranking score.
    pub second_choice_weight: f64,
    /// Weight of a third live preference in the ranking score.
    pub third_choice_weight: f64,
}

impl StvRules {
    pub const DEFAULT_RULES: StvRules = StvRules {
        seats: 1,
        second_choice_weight: 0.001,
        third_choice_weight: 0.000001,
    };

    pub fn with_seats(seats: u32) -> StvRules {
        StvRules {
            seats,
            ..StvRules::DEFAULT_RULES
        }
    }
}

impl Default for StvRules {
    fn default() -> Self {
        StvRules::DEFAULT_RULES
    }
}
