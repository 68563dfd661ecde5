//! Typed column sort
//!
//! Sorts delimited text by typed columns given as `<KIND><COLUMN>` specifications,
//! highest priority first.

use std::io::IsTerminal;
use std::process;

use clap::{error::ErrorKind, Arg, ArgAction, Command};

use typed_sort::{
    config::{ColumnSpec, SortConfig, SortConfigBuilder, DEFAULT_SEPARATOR},
    error::SortResult,
    logging::{init_logging, LogConfig},
    sort, ExitStatus, ARGUMENT_FAILURE,
};

fn main() {
    let matches = match build_cli().try_get_matches() {
        Ok(matches) => matches,
        Err(e) => exit_on_clap_error(e),
    };

    let log_config = LogConfig::from_verbosity(matches.get_count("verbose"))
        .with_quiet(matches.get_flag("quiet"))
        .with_ansi(std::io::stderr().is_terminal());
    if let Err(e) = init_logging(&log_config) {
        eprintln!("tsort: failed to initialize logging: {e}");
    }

    let status = match parse_config_from_matches(&matches) {
        Ok(config) => sort(&config),
        Err(e) => ExitStatus::from(e),
    };

    if !status.is_success() {
        eprintln!("tsort: {status}");
    }
    process::exit(status.code());
}

/// Help and version keep clap's exit; every other parse error is an argument failure
fn exit_on_clap_error(e: clap::Error) -> ! {
    if is_informational(e.kind()) {
        e.exit();
    }
    let _ = e.print();
    process::exit(ARGUMENT_FAILURE)
}

fn is_informational(kind: ErrorKind) -> bool {
    matches!(kind, ErrorKind::DisplayHelp | ErrorKind::DisplayVersion)
}

fn build_cli() -> Command {
    Command::new("tsort")
        .version(env!("CARGO_PKG_VERSION"))
        .override_usage("tsort [-i FILE] [-o FILE] [-s SEP] [SPEC]...")
        .about("Sort delimited text by typed columns")
        .long_about("Sort delimited text by typed columns.\n\nEach SPEC is a kind letter followed by a 1-based column number. Columns are compared in the order the specs are given; columns without a spec are kept as text.\n\nKinds:\n  N  integer\n  S  text (byte order)\n  U  decimal of unlimited precision\n  F  text ranked by letter frequency (most frequent letter first)\n\nExamples:\n  tsort N1         - sort by the first column as integers\n  tsort -s , U2 S1 - sort by column 2 as decimals, then column 1 as text")

        // Column specifications
        .arg(Arg::new("specs")
            .help("Typed sort columns, highest priority first (e.g. N1 S2)")
            .num_args(0..)
            .value_name("SPEC"))

        // I/O options
        .arg(Arg::new("input")
            .short('i')
            .long("input")
            .help("Read input from FILE instead of standard input")
            .value_name("FILE"))
        .arg(Arg::new("output")
            .short('o')
            .long("output")
            .help("Write result to FILE instead of standard output")
            .value_name("FILE"))
        .arg(Arg::new("separator")
            .short('s')
            .long("separator")
            .help("Use SEP as the literal field separator")
            .value_name("SEP")
            .default_value(DEFAULT_SEPARATOR))

        // Diagnostics
        .arg(Arg::new("verbose")
            .short('v')
            .long("verbose")
            .help("Log more details to stderr (repeat for more)")
            .action(ArgAction::Count))
        .arg(Arg::new("quiet")
            .short('q')
            .long("quiet")
            .help("Only log errors")
            .action(ArgAction::SetTrue)
            .conflicts_with("verbose"))
}

/// Parse configuration from command line matches
fn parse_config_from_matches(matches: &clap::ArgMatches) -> SortResult<SortConfig> {
    let mut builder = SortConfigBuilder::new();

    if let Some(input) = matches.get_one::<String>("input") {
        builder = builder.input_file(input);
    }
    if let Some(output) = matches.get_one::<String>("output") {
        builder = builder.output_file(output);
    }
    if let Some(separator) = matches.get_one::<String>("separator") {
        builder = builder.separator(separator);
    }

    for spec in matches.get_many::<String>("specs").unwrap_or_default() {
        builder = builder.column(ColumnSpec::parse(spec)?);
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use typed_sort::{SortError, ValueKind};

    fn parse(args: &[&str]) -> SortResult<SortConfig> {
        let matches = build_cli()
            .try_get_matches_from(args)
            .expect("Failed to parse test arguments");
        parse_config_from_matches(&matches)
    }

    #[test]
    fn test_parse_basic_config() {
        let config = parse(&["tsort", "N1", "S2"]).expect("Failed to parse test config");

        assert_eq!(config.separator, " ");
        assert_eq!(config.input_file, None);
        assert_eq!(
            config.columns,
            vec![
                ColumnSpec::new(ValueKind::Integer, 1),
                ColumnSpec::new(ValueKind::Text, 2)
            ]
        );
    }

    #[test]
    fn test_parse_attached_and_separate_values() {
        let config = parse(&["tsort", "-iin.txt", "-o", "out.txt", "-s,", "U3", "F1"])
            .expect("Failed to parse test config");

        assert_eq!(config.input_file, Some(PathBuf::from("in.txt")));
        assert_eq!(config.output_file, Some(PathBuf::from("out.txt")));
        assert_eq!(config.separator, ",");
        assert_eq!(config.sort_priority().columns(), &[2, 0]);
    }

    #[test]
    fn test_multi_character_separator() {
        let config = parse(&["tsort", "--separator", "::", "N1"]).expect("Failed to parse test config");
        assert_eq!(config.separator, "::");
    }

    #[test]
    fn test_invalid_spec_is_rejected() {
        assert!(matches!(
            parse(&["tsort", "Q1"]),
            Err(SortError::InvalidKindSpec { .. })
        ));
        assert!(matches!(
            parse(&["tsort", "N1x"]),
            Err(SortError::InvalidColumnSpec { .. })
        ));
    }

    #[test]
    fn test_empty_separator_is_rejected() {
        let err = parse(&["tsort", "-s", "", "N1"]).expect_err("empty separator accepted");
        assert_eq!(ExitStatus::from(err).code(), typed_sort::ARGUMENT_FAILURE);
    }

    #[test]
    fn test_clap_errors_are_argument_failures() {
        let unknown = build_cli()
            .try_get_matches_from(["tsort", "-x"])
            .expect_err("unknown flag accepted");
        assert!(!is_informational(unknown.kind()));

        let repeated = build_cli()
            .try_get_matches_from(["tsort", "-s", "a", "-s", "b", "N1"])
            .expect_err("repeated separator accepted");
        assert!(!is_informational(repeated.kind()));

        let help = build_cli()
            .try_get_matches_from(["tsort", "--help"])
            .expect_err("help did not short-circuit");
        assert!(is_informational(help.kind()));
    }

    #[test]
    fn test_quiet_conflicts_with_verbose() {
        assert!(build_cli()
            .try_get_matches_from(["tsort", "-q", "-v"])
            .is_err());
    }
}
