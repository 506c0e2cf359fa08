use std::fmt::Write;
use std::path::PathBuf;

use clap::{
    ArgAction, ColorChoice, Command, CommandFactory, FromArgMatches, Parser, ValueEnum,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};

use crate::app_dirs;

/// Version banner including the configuration directory.
fn long_version() -> &'static str {
    let config_dir = match app_dirs::get_config_dir() {
        Ok(path) => path.display().to_string(),
        Err(err) => format!("unavailable ({err})"),
    };

    let mut details = format!("facetree {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(details);
    let _ = writeln!(details, "config directory: {config_dir}");

    Box::leak(details.into_boxed_str())
}

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
}

/// Parse command line arguments into [`CliArgs`].
pub(crate) fn parse_cli() -> CliArgs {
    let mut matches = cli_command().get_matches();
    CliArgs::from_arg_matches_mut(&mut matches).unwrap_or_else(|err| err.exit())
}

fn cli_command() -> Command {
    CliArgs::command()
}

#[derive(Parser, Debug)]
#[command(
    name = "facetree",
    version,
    long_version = long_version(),
    about = "Run a widget layout against a record set and print the synchronized search state",
    color = ColorChoice::Auto,
    styles = cli_styles()
)]
/// Command-line arguments accepted by the `facetree` binary.
pub(crate) struct CliArgs {
    #[arg(
        short,
        long = "config",
        value_name = "FILE",
        env = "FACETREE_CONFIG",
        action = ArgAction::Append,
        help = "Additional configuration file to merge (default: none)"
    )]
    pub(crate) config: Vec<PathBuf>,
    #[arg(
        short = 'n',
        long = "no-config",
        help = "Skip loading default configuration files (default: disabled)"
    )]
    pub(crate) no_config: bool,
    #[arg(
        short = 'r',
        long,
        value_name = "FILE",
        help = "JSON records to search: an array, or an object of arrays keyed by index name"
    )]
    pub(crate) records: Option<PathBuf>,
    #[arg(
        short = 'i',
        long = "root-index",
        value_name = "NAME",
        help = "Name of the root index (default: records file stem)"
    )]
    pub(crate) root_index: Option<String>,
    #[arg(
        short = 'u',
        long,
        value_name = "QUERY",
        help = "Routed URL or query string to restore the UI state from (default: none)"
    )]
    pub(crate) url: Option<String>,
    #[arg(
        short = 'p',
        long = "print-config",
        help = "Print the resolved configuration before running (default: disabled)"
    )]
    pub(crate) print_config: bool,
    #[arg(
        short = 'v',
        long = "verbose",
        action = ArgAction::Count,
        help = "Increase log verbosity; FACETREE_LOG takes precedence"
    )]
    pub(crate) verbose: u8,
    #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Plain, help = "Choose how to print the result")]
    pub(crate) output: OutputFormat,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
/// Output formats supported by the CLI utility.
pub(crate) enum OutputFormat {
    Plain,
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_supports_custom_styles() {
        let command = cli_command();
        assert!(command.get_about().is_some());
    }

    #[test]
    fn parse_cli_accepts_default_arguments() {
        let command = CliArgs::command();
        let mut matches = command.get_matches_from(vec!["facetree"]);
        let parsed = CliArgs::from_arg_matches_mut(&mut matches).expect("parses");
        assert_eq!(parsed.output, OutputFormat::Plain);
        assert_eq!(parsed.verbose, 0);
    }

    #[test]
    fn flags_are_collected() {
        let parsed = CliArgs::parse_from([
            "facetree",
            "--no-config",
            "--records",
            "products.json",
            "--url",
            "?products%5Bquery%5D=phone",
            "-vv",
            "--output",
            "json",
        ]);
        assert!(parsed.no_config);
        assert_eq!(parsed.records, Some(PathBuf::from("products.json")));
        assert_eq!(parsed.url.as_deref(), Some("?products%5Bquery%5D=phone"));
        assert_eq!(parsed.verbose, 2);
        assert_eq!(parsed.output, OutputFormat::Json);
    }
}
