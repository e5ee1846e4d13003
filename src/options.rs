//! Parsing Options.
//! `frmq [-i FILE] [-c N] [--check-invariants] [--on-invalid abort|skip]
//! [--config FILE] [--dump FILE] [--report]`

use clap::{Arg, ArgAction, Command, value_parser};

use crate::config::{InvalidMarkPolicy, RmqConfig};

fn make_options_parser() -> clap::Command {
    let parser = Command::new("frmq")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Range-minimum queries over a binary command stream")
        .arg(
            Arg::new("input")
                .short('i')
                .long("input")
                .value_name("FILE")
                .help("Binary command stream to read instead of stdin"),
        )
        .arg(
            Arg::new("capacity")
                .short('c')
                .long("initial-capacity")
                .value_name("N")
                .help("Marks the first generation holds before it is rebuilt")
                .value_parser(value_parser!(usize)),
        )
        .arg(
            Arg::new("check")
                .long("check-invariants")
                .help("Verify every structural invariant after each command")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("on-invalid")
                .long("on-invalid")
                .help("What to do with a query or close of a mark that is not open")
                .value_parser(["abort", "skip"]),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("dump")
                .long("dump")
                .value_name("FILE")
                .help("Write the final generation as JSON"),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .help("Print run statistics to stderr")
                .action(ArgAction::SetTrue),
        );
    parser
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Options {
    pub input: Option<String>,
    pub initial_capacity: Option<usize>,
    pub check_invariants: bool,
    pub on_invalid_mark: Option<InvalidMarkPolicy>,
    pub config: Option<String>,
    pub dump: Option<String>,
    pub report: bool,
}

impl Options {
    pub fn parse_from_args(flags: &[String]) -> Result<Self, clap::Error> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;
        let on_invalid_mark = match matches.get_one::<String>("on-invalid").map(String::as_str) {
            Some("skip") => Some(InvalidMarkPolicy::Skip),
            Some(_) => Some(InvalidMarkPolicy::Abort),
            None => None,
        };
        Ok(Options {
            input: matches.get_one::<String>("input").cloned(),
            initial_capacity: matches.get_one::<usize>("capacity").copied(),
            check_invariants: matches.get_flag("check"),
            on_invalid_mark,
            config: matches.get_one::<String>("config").cloned(),
            dump: matches.get_one::<String>("dump").cloned(),
            report: matches.get_flag("report"),
        })
    }

    /// Command-line flags win over the configuration file.
    pub fn apply(&self, config: &mut RmqConfig) {
        if let Some(capacity) = self.initial_capacity {
            config.initial_capacity = capacity;
        }
        if self.check_invariants {
            config.check_invariants = true;
        }
        if let Some(policy) = self.on_invalid_mark {
            config.on_invalid_mark = policy;
        }
    }
}
