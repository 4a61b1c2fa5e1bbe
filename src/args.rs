use clap::Parser;

/// Computes the results of a community music challenge: scoreboard, generosity,
/// distribution of the votes and self-votes.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The configuration of the event, in YAML or JSON.
    /// See the manual of the score_voting crate for the format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (number, optional) The event to tabulate. Overrides the eventId of the configuration.
    #[clap(short, long, value_parser)]
    pub event: Option<u32>,

    /// (file path, optional) The file containing the ballots. Overrides the
    /// ballot sources of the configuration.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default tinydb) The type of the input: tinydb or csv.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (file path, optional) The table of the users, mapping handles to artist names.
    #[clap(long, value_parser)]
    pub users: Option<String>,

    /// (file path, optional) The participants of each event, as artist names.
    #[clap(long, value_parser)]
    pub participants: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the results will be written in JSON format to the given
    /// location. Setting this option overrides the output directory of the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the results of an event in JSON format. If provided,
    /// lmcresults will check that the computed results match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, the participants with incomplete ballots are
    /// disqualified without asking.
    #[clap(long, takes_value = false)]
    pub disqualify_incomplete: bool,

    /// If passed as an argument, stops without results when some participants
    /// have incomplete ballots, without asking.
    #[clap(long, takes_value = false)]
    pub abort_incomplete: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
