use log::{debug, info, warn};

use snafu::{prelude::*, Snafu};
use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use stv_voting::flow::{build_flow_graph, FlowGraph};
use stv_voting::names::NameMatcher;
use stv_voting::parser::{ParsedTranscript, TranscriptParser};
use stv_voting::*;

use crate::args::Args;

pub mod config_reader;
use crate::election::config_reader::*;

#[derive(Debug, Snafu)]
pub enum ElectionError {
    #[snafu(display("Error opening file {path}: {source}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON: {source}"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Error reading transcript {path}: {source}"))]
    ReadingTranscript {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing the summary to {path}: {source}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The configuration file {path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(display("Either --config or --input (with --candidates) must be provided"))]
    MissingInput {},
    #[snafu(display("The count could not complete: {source}"))]
    Counting { source: VotingErrors },
    #[snafu(display(
        "Difference detected between calculated summary and reference summary {path}"
    ))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ElectionResult<T> = Result<T, ElectionError>;

/// Everything produced by counting one election.
#[derive(Debug, Clone)]
pub struct ElectionOutcome {
    pub transcript: ParsedTranscript,
    /// The found names that match no candidate, after applying the overrides.
    pub unmatched_names: Vec<String>,
    pub ballots: Vec<Ballot>,
    pub result: StvResult,
}

impl ElectionOutcome {
    pub fn flow(&self, candidates: &[String]) -> FlowGraph {
        let outcomes = outcomes_from_rounds(&self.result.rounds);
        build_flow_graph(
            &self.result.rounds,
            candidates,
            self.result.quota,
            &outcomes,
        )
    }
}

// Limits the summary values to 6 decimals, which keeps the JSON files readable
// and stable when they are read back.
fn round_value(x: f64) -> f64 {
    (x * 1e6).round() / 1e6
}

fn result_stats_to_json(rs: &StvResult) -> Vec<JSValue> {
    let mut l: Vec<JSValue> = Vec::new();
    for round_stat in rs.rounds.iter() {
        let mut tally: JSMap<String, JSValue> = JSMap::new();
        for (name, count) in round_stat.tally.iter() {
            tally.insert(name.clone(), json!(round_value(*count)));
        }

        let mut tally_results: Vec<JSValue> = Vec::new();
        match &round_stat.tally_result {
            Some(TallyResult::Elected(name)) => tally_results.push(json!({ "elected": name })),
            Some(TallyResult::Eliminated(name)) => {
                tally_results.push(json!({ "eliminated": name }))
            }
            None => {}
        }

        let js = json!({
            "round": round_stat.round,
            "tally": tally,
            "quota": round_value(round_stat.quota),
            "exhausted": round_value(round_stat.exhausted),
            "tallyResults": tally_results,
            "isFinalRound": round_stat.is_final_round,
        });
        l.push(js);
    }
    l
}

fn flow_to_json(flow: &FlowGraph) -> JSValue {
    let nodes: Vec<JSValue> = flow
        .nodes
        .iter()
        .map(|n| {
            json!({
                "name": n.name,
                "value": round_value(n.value),
                "depth": n.depth,
                "isWinner": n.is_winner,
            })
        })
        .collect();
    let links: Vec<JSValue> = flow
        .links
        .iter()
        .map(|l| json!({ "source": l.source, "target": l.target, "value": round_value(l.value) }))
        .collect();
    json!({ "nodes": nodes, "links": links })
}

pub fn build_summary_js(
    config: &ElectionConfig,
    outcome: &ElectionOutcome,
    with_flow: bool,
) -> JSValue {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        jurisdiction: config.output_settings.contest_jurisdiction.clone(),
        office: config.output_settings.contest_office.clone(),
        seats: config.seats.unwrap_or(1),
        threshold: round_value(outcome.result.quota),
    };
    let mut summary = json!({
        "config": c,
        "winners": outcome.result.winners,
        "results": result_stats_to_json(&outcome.result),
        "unmatchedNames": outcome.unmatched_names,
        "droppedLines": outcome.transcript.dropped_lines,
    });
    if with_flow {
        summary["flow"] = flow_to_json(&outcome.flow(&config.candidates));
    }
    summary
}

/// Reads the transcripts of an election and counts the ballots.
///
/// `root` is the directory against which the transcript paths are resolved.
pub fn tabulate(config: &ElectionConfig, root: &Path) -> ElectionResult<ElectionOutcome> {
    let rules = config.stv_rules()?;
    if config.transcripts.is_empty() {
        whatever!("No transcript in the election description")
    }

    let mut parser = TranscriptParser::new(&config.candidates);
    for source in config.transcripts.iter() {
        let p: PathBuf = root.join(&source.file_path);
        let path = p.display().to_string();
        info!("Attempting to read transcript {:?}", path);
        let text = fs::read_to_string(&p).context(ReadingTranscriptSnafu { path })?;
        parser.parse(&text, source.voter_key.as_deref());
    }
    let transcript = parser.finish();
    info!(
        "Found {} ballots, {} distinct names",
        transcript.ballots.len(),
        transcript.found_names.len()
    );

    let matcher = NameMatcher::new(&config.candidates, &config.name_matches);
    let unmatched_names = matcher.unmatched(&transcript.found_names);
    for name in unmatched_names.iter() {
        warn!("Unmatched name: {:?}", name);
    }
    let ballots = matcher.ballots(&transcript.ballots);
    debug!("ballots: {:?}", ballots);

    let result = match run_stv(&ballots, &rules, &config.candidates) {
        Ok(x) => x,
        Err(e) => {
            if let VotingErrors::Deadlock {
                completed_rounds, ..
            } = &e
            {
                for r in completed_rounds.iter() {
                    warn!("Completed round {}: {:?}", r.round, r.tally_result);
                }
            }
            return Err(e).context(CountingSnafu {});
        }
    };

    Ok(ElectionOutcome {
        transcript,
        unmatched_names,
        ballots,
        result,
    })
}

/// Counts an election and writes its summary.
///
/// Arguments:
/// * `config` the election description
/// * `root` the directory of the configuration file
/// * `check_summary_path` a reference summary that the result must match
/// * `out_path` where to write the summary: a file path or `stdout`. When absent,
/// the output directory of the configuration is used, or the standard output.
/// * `with_flow` whether the summary includes the vote flows
pub fn run_election(
    config: &ElectionConfig,
    root: &Path,
    check_summary_path: Option<String>,
    out_path: Option<String>,
    with_flow: bool,
) -> ElectionResult<JSValue> {
    let outcome = tabulate(config, root)?;
    info!("Winners: {:?}", outcome.result.winners);

    // Assemble the final json
    let result_js = build_summary_js(config, &outcome, with_flow);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {})?;

    let out_file: Option<PathBuf> = match out_path.as_deref() {
        Some("stdout") => None,
        Some(p) => Some(PathBuf::from(p)),
        None => config
            .output_settings
            .output_directory
            .as_ref()
            .map(|d| root.join(d).join("summary.json")),
    };
    match out_file {
        Some(p) => {
            let path = p.display().to_string();
            if let Some(dir) = p.parent() {
                if !dir.as_os_str().is_empty() {
                    fs::create_dir_all(dir).context(WritingSummarySnafu { path: path.clone() })?;
                }
            }
            fs::write(&p, &pretty_js_stats).context(WritingSummarySnafu { path: path.clone() })?;
            info!("Summary written to {}", path);
        }
        None => println!("{}", pretty_js_stats),
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_summary(&summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu { path: summary_p }.fail();
        }
    }

    Ok(result_js)
}

pub fn run_election_args(args: &Args) -> ElectionResult<JSValue> {
    let (config, root): (ElectionConfig, PathBuf) = match (&args.config, &args.input) {
        (Some(config_path), _) => {
            let config = read_config(config_path)?;
            info!("config: {:?}", config);
            let root = Path::new(config_path)
                .parent()
                .context(MissingParentDirSnafu { path: config_path })?
                .to_path_buf();
            (config, root)
        }
        (None, Some(input)) => {
            let candidates = args.candidates.clone().context(MissingInputSnafu {})?;
            let config = ElectionConfig::for_transcript(
                input,
                args.voter_key.clone(),
                &candidates,
                args.seats,
            );
            (config, PathBuf::new())
        }
        (None, None) => return MissingInputSnafu {}.fail(),
    };
    run_election(
        &config,
        &root,
        args.reference.clone(),
        args.out.clone(),
        args.flow,
    )
}
