pub use crate::config::*;

use log::warn;

/// A builder for adding ballots by candidate names.
///
/// ```
/// use stv_voting::builder::Builder;
/// use stv_voting::StvRules;
/// # use stv_voting::VotingErrors;
///
/// let mut builder = Builder::new(&StvRules::with_seats(1))?
///     .candidates(&["Anna".to_string(), "Bob".to_string()])?;
///
/// builder.add_ballot_simple("voter1", &["Anna".to_string(), "Bob".to_string()])?;
/// builder.add_ballot_simple("voter2", &["Anna".to_string()])?;
/// builder.add_ballot_simple("voter3", &["Bob".to_string(), "".to_string(), "Anna".to_string()])?;
///
/// let result = builder.run()?;
/// assert_eq!(result.winners, vec!["Anna".to_string()]);
/// # Ok::<(), VotingErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: StvRules,
    pub(crate) _candidates: Vec<String>,
    pub(crate) _ballots: Vec<Ballot>,
}

impl Builder {
    pub fn new(rules: &StvRules) -> Result<Builder, VotingErrors> {
        if rules.seats == 0 {
            return Err(VotingErrors::InvalidSeats(rules.seats));
        }
        Ok(Builder {
            _rules: *rules,
            _candidates: Vec::new(),
            _ballots: Vec::new(),
        })
    }

    pub fn candidates(self, cands: &[String]) -> Result<Builder, VotingErrors> {
        crate::check_configuration(&self._rules, cands)?;
        Ok(Builder {
            _rules: self._rules,
            _candidates: cands.to_vec(),
            _ballots: Vec::new(),
        })
    }

    /// Adds a ballot with full voting power.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_ballot_simple(&mut self, voter: &str, choices: &[String]) -> Result<(), VotingErrors> {
        self.add_ballot(voter, choices, 1.0)
    }

    /// Adds a ballot, with a voting power attached to it.
    ///
    /// choices: the names chosen by the voter, in order. An empty name is a blank
    /// choice and ends the preferences. Unknown names are ignored.
    pub fn add_ballot(
        &mut self,
        voter: &str,
        choices: &[String],
        voting_power: f64,
    ) -> Result<(), VotingErrors> {
        if self._candidates.is_empty() {
            return Err(VotingErrors::EmptyElection);
        }
        let mut ranking: Vec<Choice> = Vec::new();
        for c in choices {
            if c.is_empty() {
                ranking.push(Choice::Blank);
                continue;
            }
            match self._candidates.iter().position(|name| name == c) {
                Some(idx) => ranking.push(Choice::Filled(CandidateId((idx + 1) as u32))),
                None => {
                    warn!("Ballot {}: unknown candidate {:?} ignored", voter, c);
                }
            }
        }
        let mut ballot = Ballot::new(voter, ranking);
        ballot.voting_power = voting_power;
        self.add_ballot_2(&ballot)
    }

    pub fn add_ballot_2(&mut self, ballot: &Ballot) -> Result<(), VotingErrors> {
        self._ballots.push(ballot.clone());
        Ok(())
    }

    pub fn ballots(&self) -> &[Ballot] {
        &self._ballots
    }

    pub fn tabulation(&self) -> Result<crate::Tabulation, VotingErrors> {
        crate::Tabulation::new(&self._ballots, &self._rules, &self._candidates)
    }

    pub fn run(&self) -> Result<StvResult, VotingErrors> {
        crate::run_stv(&self._ballots, &self._rules, &self._candidates)
    }
}
