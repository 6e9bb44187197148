use clap::Parser;

/// This is a program to draw event attendees and alternates from a list of RSVPs.
#[derive(Parser, Debug, Clone, Default)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the draw. All the other options override
    /// the values it contains.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) The RSVP table, tab-separated by default. If not provided here or in the
    /// configuration, it will be asked for.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path, optional) The list of banned people (comma-separated, with First name and
    /// Last name columns).
    #[clap(short, long, value_parser)]
    pub banned: Option<String>,

    /// (file path, optional) The list of people who attended previous events (comma-separated,
    /// with First name and Last name columns).
    #[clap(short, long, value_parser)]
    pub previous: Option<String>,

    /// (number) How many attendees to draw. Asked for if not provided.
    #[clap(short, long, value_parser)]
    pub attendees: Option<usize>,

    /// (number) How many alternates to draw. Asked for if not provided.
    #[clap(long, value_parser)]
    pub alternates: Option<usize>,

    /// (number, optional) The seed of the random draw. Runs with the same seed and the same
    /// inputs select the same people.
    #[clap(long, value_parser)]
    pub seed: Option<u64>,

    /// (directory, default current directory) Where to write the output spreadsheet.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (default "Guest list ") The prefix removed from the RSVP file name to build the name of
    /// the output file.
    #[clap(long, value_parser)]
    pub label_prefix: Option<String>,

    /// If passed as an argument, the previous attendees are always shuffled into the output, even
    /// when the eligible pool covers the request.
    #[clap(long, takes_value = false)]
    pub always_shuffle_previous: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
