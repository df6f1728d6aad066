//! Matching the names written on the ballots with the registered candidates.

use std::collections::{BTreeMap, HashMap, HashSet};

use log::{debug, warn};

use crate::config::{Ballot, CandidateId, Choice};
use crate::parser::{clean_candidate_name, simplify_voter_name, ParsedBallot};

/// Override target that marks a text as not being a vote at all.
pub const NOT_A_BALLOT: &str = "__NOT_A_BALLOT__";

// Shortest simplified name accepted for a prefix match.
const MIN_PREFIX_LEN: usize = 3;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum NameMatch {
    Candidate(CandidateId),
    NotABallot,
    Unmatched,
}

/// Resolves free text into candidate numbers.
///
/// Explicit overrides (usually checked by a human reviewer) come first, then
/// an exact case-insensitive comparison, then a comparison of the simplified
/// forms, and finally a prefix match when it designates a single candidate.
#[derive(Debug, Clone)]
pub struct NameMatcher {
    candidates: Vec<String>,
    simplified: Vec<String>,
    overrides: HashMap<String, NameMatch>,
}

impl NameMatcher {
    pub fn new(candidates: &[String], overrides: &BTreeMap<String, Option<String>>) -> NameMatcher {
        let mut matcher = NameMatcher {
            candidates: candidates.to_vec(),
            simplified: candidates.iter().map(|c| simplify_voter_name(c)).collect(),
            overrides: HashMap::new(),
        };
        for (text, target) in overrides.iter() {
            let m = match target.as_deref() {
                None | Some(NOT_A_BALLOT) => NameMatch::NotABallot,
                Some(name) => match matcher.exact(name) {
                    Some(cid) => NameMatch::Candidate(cid),
                    None => {
                        warn!(
                            "Override {:?} -> {:?}: not a registered candidate, ignored",
                            text, name
                        );
                        continue;
                    }
                },
            };
            matcher.overrides.insert(text.clone(), m);
        }
        matcher
    }

    pub fn resolve(&self, text: &str) -> NameMatch {
        if let Some(m) = self.overrides.get(text) {
            return *m;
        }
        let cleaned = clean_candidate_name(text);
        if let Some(m) = self.overrides.get(&cleaned) {
            return *m;
        }
        if let Some(cid) = self.exact(&cleaned) {
            return NameMatch::Candidate(cid);
        }

        let simplified = simplify_voter_name(&cleaned);
        if simplified.is_empty() {
            return NameMatch::Unmatched;
        }
        if let Some(idx) = self.simplified.iter().position(|s| *s == simplified) {
            return NameMatch::Candidate(CandidateId((idx + 1) as u32));
        }

        let prefixed: Vec<usize> = self
            .simplified
            .iter()
            .enumerate()
            .filter(|(_, s)| {
                let (short, long) = if s.len() < simplified.len() {
                    (s.as_str(), simplified.as_str())
                } else {
                    (simplified.as_str(), s.as_str())
                };
                short.len() >= MIN_PREFIX_LEN && long.starts_with(short)
            })
            .map(|(idx, _)| idx)
            .collect();
        match prefixed.as_slice() {
            [idx] => {
                debug!(
                    "resolve: {:?} matched by prefix to {:?}",
                    text, self.candidates[*idx]
                );
                NameMatch::Candidate(CandidateId((*idx + 1) as u32))
            }
            _ => NameMatch::Unmatched,
        }
    }

    /// Converts the rankings of a parsed ballot into candidate numbers.
    ///
    /// Unmatched texts are skipped, as well as the repeated mentions of a candidate.
    pub fn ballot(&self, parsed: &ParsedBallot) -> Ballot {
        let mut seen: HashSet<CandidateId> = HashSet::new();
        let mut ranking: Vec<Choice> = Vec::new();
        for text in parsed.rankings.iter() {
            match self.resolve(text) {
                NameMatch::Candidate(cid) if seen.insert(cid) => ranking.push(Choice::Filled(cid)),
                NameMatch::Candidate(cid) => {
                    debug!(
                        "ballot {}: skipping duplicate choice {:?}",
                        parsed.voter, self.candidates[cid.index()]
                    );
                }
                NameMatch::NotABallot => {}
                NameMatch::Unmatched => {
                    debug!("ballot {}: skipping unmatched choice {:?}", parsed.voter, text);
                }
            }
        }
        Ballot::new(&parsed.voter, ranking)
    }

    pub fn ballots(&self, parsed: &[ParsedBallot]) -> Vec<Ballot> {
        parsed.iter().map(|pb| self.ballot(pb)).collect()
    }

    /// The names that cannot be associated with a candidate, in the given order.
    pub fn unmatched(&self, names: &[String]) -> Vec<String> {
        names
            .iter()
            .filter(|n| self.resolve(n) == NameMatch::Unmatched)
            .cloned()
            .collect()
    }

    fn exact(&self, name: &str) -> Option<CandidateId> {
        let normalized = name.trim().to_lowercase();
        self.candidates
            .iter()
            .position(|c| c.trim().to_lowercase() == normalized)
            .map(|idx| CandidateId((idx + 1) as u32))
    }
}
