//! Reading ballots out of thread transcripts.
//!
//! A transcript is the raw text of a discussion thread in which every voter
//! posts a message with their ranked list of candidates. There is no fixed
//! grammar: a message usually starts with a header (the display name of the
//! voter followed by a timestamp, sometimes split over two lines) and is
//! followed by one candidate per line.
//!
//! ```
//! use stv_voting::parser::parse_transcript;
//!
//! let text = "Alice — 3/1/2026 6:14 am\n1. Bob\n2. @Carol\n";
//! let candidates = vec!["Bob".to_string(), "Carol".to_string()];
//! let parsed = parse_transcript(text, None, &candidates);
//! assert_eq!(parsed.ballots[0].voter, "alice");
//! assert_eq!(parsed.ballots[0].rankings, vec!["Bob", "Carol"]);
//! ```

use std::collections::{BTreeMap, HashMap, HashSet};

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::names::NameMatcher;

const ROLE_PREFIXES: [&str; 17] = [
    "ex-councilor",
    "ex councilor",
    "ex-councillor",
    "ex councillor",
    "councilor",
    "councillor",
    "council",
    "mayor",
    "president",
    "ceo",
    "speaker",
    "turbo janny",
    "senator",
    "judge",
    "trial_len",
    "lord",
    "sir",
];

lazy_static! {
    static ref TIMESTAMP_RX: Regex =
        Regex::new(r"(?i)[-–—]\s*(\d{1,2}/\d{1,2}/\d{4}|yesterday at|today at)").unwrap();
    static ref CLOCK_RX: Regex = Regex::new(r"(?i)\d{1,2}:\d{2}(\s*[ap]\.?m\.?)?").unwrap();
    static ref LEADING_NUMBER_RX: Regex = Regex::new(r"^\d+\.?\s*").unwrap();
    static ref PARENTHESES_RX: Regex = Regex::new(r"\([^)]*\)").unwrap();
    static ref QUOTES_RX: Regex = Regex::new(r#"["'“”‘’]"#).unwrap();
    static ref SPACES_RX: Regex = Regex::new(r"\s+").unwrap();
    static ref PUNCTUATION_ONLY_RX: Regex = Regex::new(r"^[\d.)\-]+$").unwrap();
    static ref ROLE_PREFIX_RXS: Vec<Regex> = ROLE_PREFIXES
        .iter()
        .map(|p| Regex::new(&format!(r"(?i)^{}\s+", regex::escape(p))).unwrap())
        .collect();
}

/// Removes the decorations around a candidate name: mentions, list numbers,
/// parenthetical asides and quotes.
pub fn clean_candidate_name(name: &str) -> String {
    let s = name.replace('@', "");
    let s = LEADING_NUMBER_RX.replace(s.trim_start(), "");
    let s = PARENTHESES_RX.replace_all(&s, "");
    let s = QUOTES_RX.replace_all(&s, "");
    SPACES_RX.replace_all(s.trim(), " ").to_string()
}

/// The identity key of a voter: role titles removed, only ASCII alphanumerics
/// and underscores, lowercased.
pub fn simplify_voter_name(name: &str) -> String {
    let mut simplified = name.trim().to_string();
    for rx in ROLE_PREFIX_RXS.iter() {
        simplified = rx.replace(&simplified, "").to_string();
    }
    let simplified: String = simplified
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect::<String>()
        .to_lowercase();
    if simplified.is_empty() {
        name.to_lowercase()
            .chars()
            .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
            .collect()
    } else {
        simplified
    }
}

/// The identity key of the author of a header line.
pub fn voter_identity(display_name: &str) -> String {
    let cleaned = clean_candidate_name(display_name);
    if cleaned.is_empty() {
        simplify_voter_name(display_name)
    } else {
        simplify_voter_name(&cleaned)
    }
}

pub fn has_timestamp(line: &str) -> bool {
    TIMESTAMP_RX.is_match(line)
}

/// The display name in front of the timestamp of a header line.
pub fn extract_voter_name(line: &str) -> String {
    match TIMESTAMP_RX.find(line) {
        Some(m) => line[..m.start()].trim().to_string(),
        None => line.trim().to_string(),
    }
}

// Text posted on the same line as the timestamp, after the clock time.
fn text_after_timestamp(line: &str) -> Option<String> {
    let m = TIMESTAMP_RX.find(line)?;
    let rest = &line[m.end()..];
    let clock = CLOCK_RX.find(rest)?;
    let cleaned = clean_candidate_name(&rest[clock.end()..]);
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned)
    }
}

fn matches_voter_key(line: &str, voter_key: &str) -> bool {
    let key = simplify_voter_name(strip_ballot_suffix(voter_key));
    if key.is_empty() {
        return false;
    }
    [
        simplify_voter_name(&clean_candidate_name(line)),
        simplify_voter_name(line),
    ]
    .iter()
    .any(|s| !s.is_empty() && (*s == key || s.starts_with(&key) || key.starts_with(s.as_str())))
}

fn strip_ballot_suffix(voter: &str) -> &str {
    match voter.rfind('#') {
        Some(idx) if voter[idx + 1..].chars().all(|c| c.is_ascii_digit()) => &voter[..idx],
        _ => voter,
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ParserState {
    AwaitingVoterHeader,
    CollectingRankings,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Serialize, Deserialize)]
pub enum NoiseReason {
    Blank,
    /// A timestamp line whose display name sits on the previous line.
    HeaderTimestamp,
    TooShort,
    Disqualification,
    WriteIn,
    /// A ranking line before any voter was identified.
    NoVoter,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub enum LineClass {
    VoterHeader {
        name: String,
        first_ranking: Option<String>,
    },
    RankingEntry(String),
    Noise(NoiseReason),
}

/// Classifies one line of a transcript.
///
/// The predicates are tried in order. The check against the known voter key
/// happens before the line can be taken for a candidate name, so a voter
/// whose display name looks like a candidate still opens a ballot.
pub fn classify_line(
    line: &str,
    next_non_empty: Option<&str>,
    state: ParserState,
    voter_key: Option<&str>,
) -> LineClass {
    let line = line.trim();
    if line.is_empty() {
        return LineClass::Noise(NoiseReason::Blank);
    }

    if has_timestamp(line) {
        let name = extract_voter_name(line);
        let trailing = text_after_timestamp(line);
        if name.chars().count() >= 2 {
            let identity = voter_identity(&name);
            let first_ranking =
                trailing.filter(|t| simplify_voter_name(t) != identity && t.chars().count() >= 2);
            return LineClass::VoterHeader {
                name,
                first_ranking,
            };
        }
        return match trailing {
            Some(t) if t.chars().count() >= 2 => LineClass::RankingEntry(t),
            _ => LineClass::Noise(NoiseReason::HeaderTimestamp),
        };
    }

    let cleaned = clean_candidate_name(line);

    // Display name on its own line, the timestamp follows.
    if let Some(next) = next_non_empty {
        if !cleaned.is_empty()
            && has_timestamp(next)
            && extract_voter_name(next).chars().count() < 2
        {
            return LineClass::VoterHeader {
                name: line.to_string(),
                first_ranking: None,
            };
        }
    }

    if let (ParserState::AwaitingVoterHeader, Some(key)) = (state, voter_key) {
        if matches_voter_key(line, key) {
            return LineClass::VoterHeader {
                name: line.to_string(),
                first_ranking: None,
            };
        }
    }

    if cleaned.chars().count() < 2 || PUNCTUATION_ONLY_RX.is_match(&cleaned) {
        return LineClass::Noise(NoiseReason::TooShort);
    }
    let lower = cleaned.to_lowercase();
    if lower.contains("barred from") {
        return LineClass::Noise(NoiseReason::Disqualification);
    }
    if lower.contains("write-in") {
        return LineClass::Noise(NoiseReason::WriteIn);
    }
    LineClass::RankingEntry(cleaned)
}

/// A ballot as read from the transcript, before the names are matched to candidates.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ParsedBallot {
    pub voter: String,
    pub rankings: Vec<String>,
    /// The lines of the transcript that produced this ballot.
    #[serde(rename = "sourceText")]
    pub source_text: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct DroppedLine {
    pub line: String,
    pub reason: NoiseReason,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ParsedTranscript {
    pub ballots: Vec<ParsedBallot>,
    /// Every ranking text seen in any ballot, in first-seen order.
    #[serde(rename = "foundNames")]
    pub found_names: Vec<String>,
    /// The found names that do not correspond to any candidate.
    #[serde(rename = "unmatchedNames")]
    pub unmatched_names: Vec<String>,
    #[serde(rename = "droppedLines")]
    pub dropped_lines: Vec<DroppedLine>,
}

struct OpenBallot {
    voter: String,
    rankings: Vec<String>,
    start_line: usize,
}

// For each line, the first non-empty line after it, trimmed.
fn next_non_empty_lines<'a>(lines: &[&'a str]) -> Vec<Option<&'a str>> {
    let mut res = vec![None; lines.len()];
    let mut next: Option<&'a str> = None;
    for (idx, line) in lines.iter().enumerate().rev() {
        res[idx] = next;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            next = Some(trimmed);
        }
    }
    res
}

/// Accumulates the ballots of one election over one or several transcripts.
pub struct TranscriptParser {
    candidates: Vec<String>,
    ballots: Vec<ParsedBallot>,
    found_names: Vec<String>,
    seen_names: HashSet<String>,
    dropped_lines: Vec<DroppedLine>,
    voter_ballot_counts: HashMap<String, usize>,
}

impl TranscriptParser {
    pub fn new(candidates: &[String]) -> TranscriptParser {
        TranscriptParser {
            candidates: candidates.to_vec(),
            ballots: Vec::new(),
            found_names: Vec::new(),
            seen_names: HashSet::new(),
            dropped_lines: Vec::new(),
            voter_ballot_counts: HashMap::new(),
        }
    }

    /// Reads the ballots of one transcript.
    ///
    /// `voter_key` is the identity of the author when it is known from another
    /// source (for instance the index of the scraped messages).
    pub fn parse(&mut self, text: &str, voter_key: Option<&str>) {
        let lines: Vec<&str> = text.lines().collect();
        let mut state = ParserState::AwaitingVoterHeader;
        let mut current: Option<OpenBallot> = None;

        let lookahead = next_non_empty_lines(&lines);

        for (idx, raw) in lines.iter().enumerate() {
            let class = classify_line(raw, lookahead[idx], state, voter_key);
            debug!("parse: line {}: {:?} -> {:?}", idx, raw, class);

            match class {
                LineClass::VoterHeader {
                    name,
                    first_ranking,
                } => {
                    if let Some(b) = current.take() {
                        self.save_ballot(b, &lines, idx);
                    }
                    let mut open = OpenBallot {
                        voter: voter_identity(&name),
                        rankings: Vec::new(),
                        start_line: idx,
                    };
                    if let Some(r) = first_ranking {
                        self.add_found_name(&r);
                        open.rankings.push(r);
                    }
                    current = Some(open);
                    state = ParserState::CollectingRankings;
                }
                LineClass::RankingEntry(name) => {
                    if current.is_none() {
                        if let Some(key) = voter_key {
                            debug!("parse: no header found, using the voter key {:?}", key);
                            current = Some(OpenBallot {
                                voter: simplify_voter_name(strip_ballot_suffix(key)),
                                rankings: Vec::new(),
                                start_line: idx,
                            });
                            state = ParserState::CollectingRankings;
                        }
                    }
                    match current.as_mut() {
                        Some(open) => {
                            self.add_found_name(&name);
                            open.rankings.push(name);
                        }
                        None => self.dropped_lines.push(DroppedLine {
                            line: raw.trim().to_string(),
                            reason: NoiseReason::NoVoter,
                        }),
                    }
                }
                LineClass::Noise(NoiseReason::Blank) | LineClass::Noise(NoiseReason::HeaderTimestamp) => {}
                LineClass::Noise(reason) => self.dropped_lines.push(DroppedLine {
                    line: raw.trim().to_string(),
                    reason,
                }),
            }
        }
        if let Some(b) = current.take() {
            self.save_ballot(b, &lines, lines.len());
        }
    }

    pub fn finish(self) -> ParsedTranscript {
        let matcher = NameMatcher::new(&self.candidates, &BTreeMap::new());
        let unmatched_names = matcher.unmatched(&self.found_names);
        ParsedTranscript {
            ballots: self.ballots,
            found_names: self.found_names,
            unmatched_names,
            dropped_lines: self.dropped_lines,
        }
    }

    fn add_found_name(&mut self, name: &str) {
        if self.seen_names.insert(name.to_string()) {
            self.found_names.push(name.to_string());
        }
    }

    // end_line is excluded
    fn save_ballot(&mut self, open: OpenBallot, lines: &[&str], end_line: usize) {
        if open.rankings.is_empty() {
            return;
        }
        let count = self.voter_ballot_counts.entry(open.voter.clone()).or_insert(0);
        *count += 1;
        let voter = if *count > 1 {
            format!("{}#{}", open.voter, count)
        } else {
            open.voter
        };
        let source_text = lines[open.start_line..end_line]
            .iter()
            .map(|l| l.trim_end())
            .collect::<Vec<&str>>()
            .join("\n")
            .trim_end()
            .to_string();
        debug!("save_ballot: {} {:?}", voter, open.rankings);
        self.ballots.push(ParsedBallot {
            voter,
            rankings: open.rankings,
            source_text,
        });
    }
}

/// Parses a single transcript.
pub fn parse_transcript(
    text: &str,
    voter_key: Option<&str>,
    candidates: &[String],
) -> ParsedTranscript {
    let mut parser = TranscriptParser::new(candidates);
    parser.parse(text, voter_key);
    parser.finish()
}
