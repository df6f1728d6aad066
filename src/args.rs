use clap::Parser;

/// This is a single transferable vote tabulation program for elections held in discussion threads.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the election description in JSON format.
    /// For more information about the file format, read the manual of the stv_voting crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,
    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, stvtally will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) A transcript to count without a configuration file. The candidates must then be
    /// provided with the --candidates option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (string, optional) The voter who posted the transcript given with --input, when it is known.
    #[clap(long, value_parser)]
    pub voter_key: Option<String>,

    /// (list of comma-separated values) The candidates of the election, when --input is used.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub candidates: Option<Vec<String>>,

    /// (default 1) The number of seats to fill, when --input is used.
    #[clap(long, value_parser)]
    pub seats: Option<u32>,

    /// If passed as an argument, the summary will also contain the vote flows between rounds.
    #[clap(long, takes_value = false)]
    pub flow: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
