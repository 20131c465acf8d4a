use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use std::ffi::OsString;

#[derive(Parser, Debug)]
#[command(name = "verifier")]
#[command(version, about = "Smoke tests for the local OpenLDAP container")]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Run the connectivity, TLS-enforcement and data-import checks
    Test,
    /// Run one ad hoc search with admin credentials
    Search,
}

#[derive(Debug)]
pub enum Invocation {
    Run(Commands),
    /// `--help` or `--version`; print and exit 0
    Display(clap::Error),
    /// Missing or unrecognised arguments; print usage and exit 1
    Usage,
}

pub fn parse<I, T>(args: I) -> Invocation
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(Cli {
            command: Some(command),
        }) => Invocation::Run(command),
        Ok(Cli { command: None }) => Invocation::Usage,
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Invocation::Display(err),
            _ => Invocation::Usage,
        },
    }
}

pub fn usage() -> String {
    Cli::command().render_help().to_string()
}
