//! Reconstruction of the vote transfers between rounds.
//!
//! The rounds only record the tallies, not the movement of the ballots.
//! The flow graph estimates the movements from the differences between
//! consecutive tallies, in a shape that can be fed directly to a Sankey
//! diagram: one column of nodes per round, then a final column with the
//! winners and the exhausted ballots.

use std::collections::{BTreeMap, HashMap};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::{Outcome, OutcomeKind, RoundSnapshot};

/// Values at or under this threshold produce neither nodes nor links.
pub const FLOW_EPSILON: f64 = 0.001;

const EXHAUSTED: &str = "Exhausted";

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FlowNode {
    pub name: String,
    pub value: f64,
    /// The column of the node: 0 for the first round.
    pub depth: u32,
    #[serde(rename = "isWinner")]
    pub is_winner: bool,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FlowLink {
    pub source: String,
    pub target: String,
    pub value: f64,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FlowGraph {
    pub nodes: Vec<FlowNode>,
    pub links: Vec<FlowLink>,
}

impl FlowGraph {
    pub fn node(&self, name: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.name == name)
    }

    /// Total value of the links leaving a node.
    pub fn outflow(&self, name: &str) -> f64 {
        self.links
            .iter()
            .filter(|l| l.source == name)
            .map(|l| l.value)
            .sum()
    }

    /// Total value of the links arriving at a node.
    pub fn inflow(&self, name: &str) -> f64 {
        self.links
            .iter()
            .filter(|l| l.target == name)
            .map(|l| l.value)
            .sum()
    }
}

fn election_of<'a>(elected: &'a [(String, Election)], name: &str) -> Option<&'a Election> {
    elected.iter().find(|(n, _)| n == name).map(|(_, e)| e)
}

fn round_label(round: u32, name: &str) -> String {
    format!("R{}: {}", round, name)
}

fn final_label(name: &str) -> String {
    format!("Final: {}", name)
}

#[derive(Debug, Clone)]
struct Election {
    round: u32,
    quota: f64,
}

// Tally of a regular round in which the earlier winners hold their quota.
#[derive(Debug, Clone)]
struct AugmentedRound<'a> {
    snapshot: &'a RoundSnapshot,
    tally: BTreeMap<String, f64>,
    depth: u32,
}

#[derive(Debug, Default)]
struct GraphBuilder {
    graph: FlowGraph,
    index: HashMap<String, usize>,
    // Depth of the nodes that links may point to.
    depths: HashMap<String, u32>,
}

impl GraphBuilder {
    fn add_node(&mut self, name: String, value: f64, depth: u32, is_winner: bool) {
        self.index.insert(name.clone(), self.graph.nodes.len());
        self.depths.insert(name.clone(), depth);
        self.graph.nodes.push(FlowNode {
            name,
            value,
            depth,
            is_winner,
        });
    }

    fn add_link(&mut self, source: &str, target: String, target_depth: u32, value: f64) {
        self.depths.entry(target.clone()).or_insert(target_depth);
        self.graph.links.push(FlowLink {
            source: source.to_string(),
            target,
            value,
        });
    }

    // Creates the nodes that links refer to but that no tally produced.
    fn complete(mut self) -> FlowGraph {
        let mut missing: Vec<(String, bool)> = Vec::new();
        for link in self.graph.links.iter() {
            if !self.index.contains_key(&link.source) && !missing.iter().any(|(n, _)| *n == link.source) {
                missing.push((link.source.clone(), true));
            }
            if !self.index.contains_key(&link.target) && !missing.iter().any(|(n, _)| *n == link.target) {
                missing.push((link.target.clone(), false));
            }
        }
        for (name, is_source) in missing {
            let value = if is_source {
                self.graph.outflow(&name)
            } else {
                self.graph.inflow(&name)
            };
            let depth = self.depths.get(&name).cloned().unwrap_or(0);
            debug!("flow: adding node {:?} referenced by links ({:.3})", name, value);
            self.add_node(name, value, depth, false);
        }
        self.graph
    }
}

/// Builds the flow graph of a count.
///
/// Arguments:
/// * `rounds` the snapshots of the count, including the closing round if any
/// * `candidates` the candidate names, which give the order of the nodes in a column
/// * `fallback_quota` the quota used for a winner whose round is not in `rounds`
/// * `outcomes` the elections and eliminations, see [crate::outcomes_from_rounds]
pub fn build_flow_graph(
    rounds: &[RoundSnapshot],
    candidates: &[String],
    fallback_quota: f64,
    outcomes: &[Outcome],
) -> FlowGraph {
    // Winners in the order of the outcomes.
    let mut elected: Vec<(String, Election)> = Vec::new();
    let mut eliminated: HashMap<String, u32> = HashMap::new();
    for outcome in outcomes.iter() {
        match outcome.kind {
            OutcomeKind::Elected => {
                let quota = rounds
                    .iter()
                    .find(|r| r.round == outcome.round)
                    .map(|r| r.quota)
                    .unwrap_or(fallback_quota);
                elected.push((
                    outcome.candidate.clone(),
                    Election {
                        round: outcome.round,
                        quota,
                    },
                ));
            }
            OutcomeKind::Eliminated => {
                eliminated.insert(outcome.candidate.clone(), outcome.round);
            }
        }
    }
    let regular: Vec<&RoundSnapshot> = rounds.iter().filter(|r| !r.is_final_round).collect();
    let closing = rounds.iter().find(|r| r.is_final_round);

    let augmented: Vec<AugmentedRound> = regular
        .into_iter()
        .enumerate()
        .map(|(depth, snapshot)| {
            let mut tally = snapshot.tally.clone();
            for (name, election) in elected.iter() {
                if election.round < snapshot.round {
                    tally.insert(name.clone(), election.quota);
                }
            }
            AugmentedRound {
                snapshot,
                tally,
                depth: depth as u32,
            }
        })
        .collect();

    let mut builder = GraphBuilder::default();

    // Nodes, one column per regular round.
    for aug in augmented.iter() {
        let round = aug.snapshot.round;
        let mut names: Vec<&String> = candidates.iter().filter(|c| aug.tally.contains_key(*c)).collect();
        names.extend(aug.tally.keys().filter(|n| !candidates.contains(*n)));
        for name in names {
            let votes = aug.tally[name];
            if votes > FLOW_EPSILON {
                let is_winner = election_of(&elected, name).map(|e| e.round <= round).unwrap_or(false);
                builder.add_node(round_label(round, name), votes, aug.depth, is_winner);
            }
        }
        if aug.snapshot.exhausted > FLOW_EPSILON {
            builder.add_node(
                round_label(round, EXHAUSTED),
                aug.snapshot.exhausted,
                aug.depth,
                false,
            );
        }
    }

    // Links between consecutive rounds.
    for pair in augmented.windows(2) {
        let (current, next) = (&pair[0], &pair[1]);
        let (cur_round, next_round) = (current.snapshot.round, next.snapshot.round);
        let prev_exhausted = current.snapshot.exhausted;
        let next_exhausted = next.snapshot.exhausted;
        let new_exhausted = (next_exhausted - prev_exhausted).max(0.0);

        for (name, &votes) in current.tally.iter() {
            if votes < FLOW_EPSILON {
                continue;
            }
            let source = round_label(cur_round, name);
            let next_votes = next.tally.get(name).cloned().unwrap_or(0.0);
            let elected_now = election_of(&elected, name).filter(|e| e.round == cur_round);

            if let Some(election) = elected_now {
                let kept = votes.min(election.quota);
                let surplus = votes - kept;
                if kept > FLOW_EPSILON {
                    builder.add_link(&source, round_label(next_round, name), next.depth, kept);
                }
                if surplus > FLOW_EPSILON {
                    redistribute(&mut builder, &source, name, surplus, current, next, new_exhausted);
                }
            } else if eliminated.get(name) == Some(&cur_round) {
                redistribute(&mut builder, &source, name, votes, current, next, new_exhausted);
            } else if next_votes > FLOW_EPSILON {
                let transfer = votes.min(next_votes);
                if transfer > FLOW_EPSILON {
                    builder.add_link(&source, round_label(next_round, name), next.depth, transfer);
                }
            }
        }

        if prev_exhausted > FLOW_EPSILON && next_exhausted > FLOW_EPSILON {
            builder.add_link(
                &round_label(cur_round, EXHAUSTED),
                round_label(next_round, EXHAUSTED),
                next.depth,
                prev_exhausted,
            );
        }
    }

    // Closing column.
    if let Some(last) = augmented.last() {
        let last_round = last.snapshot.round;
        let final_depth = augmented.len() as u32;
        for (name, election) in elected.iter() {
            let target = final_label(name);
            builder.add_node(target.clone(), election.quota, final_depth, true);
            builder.add_link(
                &round_label(last_round, name),
                target,
                final_depth,
                election.quota,
            );
        }
        let final_exhausted = closing
            .map(|r| r.exhausted)
            .unwrap_or(last.snapshot.exhausted);
        if final_exhausted > FLOW_EPSILON {
            let target = final_label(EXHAUSTED);
            builder.add_node(target.clone(), final_exhausted, final_depth, false);
            if last.snapshot.exhausted > FLOW_EPSILON {
                builder.add_link(
                    &round_label(last_round, EXHAUSTED),
                    target,
                    final_depth,
                    last.snapshot.exhausted,
                );
            }
        }
    }

    builder.complete()
}

// Splits the votes leaving a candidate between the candidates that gained
// votes in the next round, in proportion to their gains. The newly exhausted
// ballots take their share as well.
fn redistribute(
    builder: &mut GraphBuilder,
    source: &str,
    excluded: &str,
    votes: f64,
    current: &AugmentedRound,
    next: &AugmentedRound,
    new_exhausted: f64,
) {
    if votes < FLOW_EPSILON {
        return;
    }
    let cur_tally = &current.snapshot.tally;
    let next_tally = &next.snapshot.tally;
    let next_round = next.snapshot.round;
    let exhausted_target = round_label(next_round, EXHAUSTED);

    let mut gainers: Vec<(&String, f64)> = Vec::new();
    for name in cur_tally.keys().chain(next_tally.keys().filter(|n| !cur_tally.contains_key(*n))) {
        if name == excluded {
            continue;
        }
        let gain = next_tally.get(name).cloned().unwrap_or(0.0) - cur_tally.get(name).cloned().unwrap_or(0.0);
        if gain > FLOW_EPSILON {
            gainers.push((name, gain));
        }
    }
    let total_gains: f64 = gainers.iter().map(|(_, g)| g).sum();

    if total_gains < FLOW_EPSILON {
        builder.add_link(source, exhausted_target, next.depth, votes);
        return;
    }

    let total_transferring = total_gains + new_exhausted;
    let to_distribute = votes - votes * (new_exhausted / total_transferring);
    let mut distributed = 0.0;
    for (name, gain) in gainers {
        let transfer = to_distribute * (gain / total_gains);
        if transfer > FLOW_EPSILON {
            builder.add_link(source, round_label(next_round, name), next.depth, transfer);
            distributed += transfer;
        }
    }
    let remainder = votes - distributed;
    if remainder > FLOW_EPSILON {
        builder.add_link(source, exhausted_target, next.depth, remainder);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Ballot, CandidateId, Choice, StvRules, TallyResult};
    use crate::{outcomes_from_rounds, run_stv};

    fn names(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    fn snapshot(
        round: u32,
        tally: &[(&str, f64)],
        quota: f64,
        exhausted: f64,
        tally_result: Option<TallyResult>,
    ) -> RoundSnapshot {
        RoundSnapshot {
            round,
            tally: tally.iter().map(|(n, v)| (n.to_string(), *v)).collect(),
            quota,
            exhausted,
            is_final_round: tally_result.is_none(),
            tally_result,
        }
    }

    fn assert_no_dangling_links(graph: &FlowGraph) {
        for link in graph.links.iter() {
            assert!(graph.node(&link.source).is_some(), "{:?}", link);
            assert!(graph.node(&link.target).is_some(), "{:?}", link);
        }
    }

    #[test]
    fn elimination_with_exhausted_ballots() {
        let candidates = names(&["A", "B", "C"]);
        let filled = |c: u32| Choice::Filled(CandidateId(c));
        let mut ballots = Vec::new();
        for i in 0..4 {
            ballots.push(Ballot::new(&format!("a{}", i), vec![filled(1)]));
        }
        for i in 0..3 {
            ballots.push(Ballot::new(&format!("b{}", i), vec![filled(2)]));
        }
        ballots.push(Ballot::new("c0", vec![filled(3), filled(2)]));
        ballots.push(Ballot::new("c1", vec![filled(3)]));

        let res = run_stv(&ballots, &StvRules::with_seats(1), &candidates).unwrap();
        assert_eq!(res.winners, names(&["A"]));
        let outcomes = outcomes_from_rounds(&res.rounds);
        let graph = build_flow_graph(&res.rounds, &candidates, res.quota, &outcomes);

        let node_names: Vec<&str> = graph.nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(
            node_names,
            vec![
                "R1: A",
                "R1: B",
                "R1: C",
                "R2: A",
                "R2: B",
                "R2: Exhausted",
                "Final: A",
                "Final: Exhausted"
            ]
        );
        assert!(graph.node("R2: A").unwrap().is_winner);
        assert!(!graph.node("R2: B").unwrap().is_winner);
        assert_eq!(graph.node("Final: A").unwrap().depth, 2);

        let link = |s: &str, t: &str| {
            graph
                .links
                .iter()
                .find(|l| l.source == s && l.target == t)
                .map(|l| l.value)
        };
        assert_eq!(link("R1: A", "R2: A"), Some(4.0));
        assert_eq!(link("R1: B", "R2: B"), Some(3.0));
        assert_eq!(link("R1: C", "R2: B"), Some(1.0));
        assert_eq!(link("R1: C", "R2: Exhausted"), Some(1.0));
        assert_eq!(link("R2: A", "Final: A"), Some(4.0));
        assert_eq!(link("R2: Exhausted", "Final: Exhausted"), Some(1.0));
        assert_eq!(graph.links.len(), 6);
        assert_no_dangling_links(&graph);
    }

    #[test]
    fn surplus_is_split_by_gains() {
        let candidates = names(&["A", "B", "C"]);
        let rounds = vec![
            snapshot(
                1,
                &[("A", 6.0), ("B", 2.0), ("C", 1.0)],
                3.0,
                0.0,
                Some(TallyResult::Elected("A".to_string())),
            ),
            snapshot(
                2,
                &[("B", 3.5), ("C", 2.5)],
                3.0,
                0.0,
                Some(TallyResult::Elected("B".to_string())),
            ),
            snapshot(3, &[("A", 3.0), ("B", 3.0)], 3.0, 0.0, None),
        ];
        let outcomes = outcomes_from_rounds(&rounds);
        let graph = build_flow_graph(&rounds, &candidates, 3.0, &outcomes);

        assert_eq!(graph.node("R2: A").unwrap().value, 3.0);
        assert!(graph.node("R1: A").unwrap().is_winner);
        assert!(!graph.node("R1: B").unwrap().is_winner);
        assert!(graph.node("R2: B").unwrap().is_winner);
        assert_eq!(graph.outflow("R1: A"), 6.0);
        assert_eq!(graph.inflow("R2: B"), 3.5);
        assert_eq!(graph.inflow("R2: C"), 2.5);
        assert_eq!(graph.node("Final: B").unwrap().value, 3.0);
        assert!(graph.node("R2: Exhausted").is_none());
        assert_no_dangling_links(&graph);
    }

    #[test]
    fn exhausted_targets_get_nodes() {
        // The votes of B disappear without any exhausted ballot being recorded.
        let candidates = names(&["A", "B"]);
        let rounds = vec![
            snapshot(
                1,
                &[("A", 3.0), ("B", 1.0)],
                2.0,
                0.0,
                Some(TallyResult::Eliminated("B".to_string())),
            ),
            snapshot(
                2,
                &[("A", 3.0)],
                1.5,
                0.0,
                Some(TallyResult::Elected("A".to_string())),
            ),
        ];
        let outcomes = outcomes_from_rounds(&rounds);
        let graph = build_flow_graph(&rounds, &candidates, 1.5, &outcomes);

        let exhausted = graph.node("R2: Exhausted").unwrap();
        assert_eq!(exhausted.value, 1.0);
        assert_eq!(exhausted.depth, 1);
        // The winner quota comes from the round of the election.
        assert_eq!(graph.node("Final: A").unwrap().value, 1.5);
        assert_no_dangling_links(&graph);
    }

    #[test]
    fn empty_count() {
        let graph = build_flow_graph(&[], &names(&["A"]), 1.0, &[]);
        assert_eq!(graph, FlowGraph::default());
    }
}
