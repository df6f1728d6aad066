use crate::election::*;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName", default)]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

/// The description of the election, as written in the summary.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub seats: u32,
    /// The quota at the end of the count.
    pub threshold: f64,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSource {
    /// Relative to the directory of the configuration file.
    #[serde(rename = "filePath")]
    pub file_path: String,
    /// The author of the transcript, when it holds a single ballot.
    #[serde(rename = "voterKey")]
    pub voter_key: Option<String>,
}

#[derive(PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RulesConfig {
    #[serde(rename = "secondChoiceWeight")]
    pub second_choice_weight: Option<f64>,
    #[serde(rename = "thirdChoiceWeight")]
    pub third_choice_weight: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ElectionConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    pub seats: Option<u32>,
    pub candidates: Vec<String>,
    pub transcripts: Vec<TranscriptSource>,
    /// Manual corrections: text as written on the ballots -> candidate name.
    /// A null value marks a text that is not a vote.
    #[serde(rename = "nameMatches", default)]
    pub name_matches: BTreeMap<String, Option<String>>,
    #[serde(default)]
    pub rules: RulesConfig,
}

impl ElectionConfig {
    /// A configuration for a single transcript, as given on the command line.
    pub fn for_transcript(
        file_path: &str,
        voter_key: Option<String>,
        candidates: &[String],
        seats: Option<u32>,
    ) -> ElectionConfig {
        ElectionConfig {
            output_settings: OutputSettings {
                contest_name: simplify_file_name(file_path),
                ..OutputSettings::default()
            },
            seats,
            candidates: candidates.to_vec(),
            transcripts: vec![TranscriptSource {
                file_path: file_path.to_string(),
                voter_key,
            }],
            name_matches: BTreeMap::new(),
            rules: RulesConfig::default(),
        }
    }

    pub fn stv_rules(&self) -> ElectionResult<StvRules> {
        let defaults = StvRules::with_seats(self.seats.unwrap_or(1));
        let res = StvRules {
            second_choice_weight: self
                .rules
                .second_choice_weight
                .unwrap_or(defaults.second_choice_weight),
            third_choice_weight: self
                .rules
                .third_choice_weight
                .unwrap_or(defaults.third_choice_weight),
            ..defaults
        };
        for w in [res.second_choice_weight, res.third_choice_weight] {
            if !(0.0..1.0).contains(&w) {
                whatever!("Choice weights must be in [0, 1), got {}", w)
            }
        }
        Ok(res)
    }
}

pub fn read_config(path: &str) -> ElectionResult<ElectionConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: ElectionConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn read_summary(path: &str) -> ElectionResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("read content: {:?}", contents);
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}
