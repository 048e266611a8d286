//! Process arguments.

use std::ffi::OsString;
use std::os::unix::ffi::OsStringExt;

use boundary_io::DEFAULT_BUFFER_CAPACITY;
use clap::{Arg, ArgAction, Command, builder::OsStringValueParser, value_parser};
use platform::TargetIdentity;

/// Settings taken from the command line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Options {
    /// Number of `-v` flags.
    pub verbosity: u8,
    /// Token that ends each request unit.
    pub client_boundary: Vec<u8>,
    /// Token written after each response unit.
    pub server_boundary: Vec<u8>,
    /// Identity to switch to before serving.
    pub identity: TargetIdentity,
}

/// Outcome of parsing that does not lead to a session.
#[derive(Debug)]
pub enum ParseOutcome {
    /// Help or version text to print before exiting successfully.
    Informational(String),
    /// Usage error to report before exiting with status 2.
    Usage(String),
}

pub(crate) fn clap_command(program_name: &'static str) -> Command {
    Command::new(program_name)
        .version(env!("CARGO_PKG_VERSION"))
        .about("Serves filesystem requests framed by boundary tokens on standard input")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .help("Increase log verbosity (repeatable)"),
        )
        .arg(
            Arg::new("client-boundary")
                .value_name("CLIENT_BOUNDARY")
                .required(true)
                .value_parser(OsStringValueParser::new())
                .help("Token ending each request unit"),
        )
        .arg(
            Arg::new("server-boundary")
                .value_name("SERVER_BOUNDARY")
                .required(true)
                .value_parser(OsStringValueParser::new())
                .help("Token written after each response unit"),
        )
        .arg(
            Arg::new("uid")
                .value_name("UID")
                .required(true)
                .value_parser(value_parser!(u32))
                .help("User to switch to; 0 with GID 0 keeps the current identity"),
        )
        .arg(
            Arg::new("gid")
                .value_name("GID")
                .required(true)
                .value_parser(value_parser!(u32))
                .help("Group to switch to"),
        )
}

/// Parses `arguments`, the first of which is the program name.
pub fn parse<I, T>(arguments: I) -> Result<Options, ParseOutcome>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = match clap_command("fs-interpreter").try_get_matches_from(arguments) {
        Ok(matches) => matches,
        Err(error) => {
            use clap::error::ErrorKind;
            let text = error.render().to_string();
            return Err(match error.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    ParseOutcome::Informational(text)
                }
                _ => ParseOutcome::Usage(text),
            });
        }
    };

    let token = |id: &str| -> Result<Vec<u8>, ParseOutcome> {
        let value = matches
            .get_one::<OsString>(id)
            .cloned()
            .unwrap_or_default()
            .into_vec();
        if value.is_empty() {
            return Err(ParseOutcome::Usage(format!("{id} token must not be empty\n")));
        }
        if value.len() >= DEFAULT_BUFFER_CAPACITY {
            return Err(ParseOutcome::Usage(format!(
                "{id} token must be shorter than {DEFAULT_BUFFER_CAPACITY} bytes\n"
            )));
        }
        Ok(value)
    };

    let client_boundary = token("client-boundary")?;
    let server_boundary = token("server-boundary")?;
    let uid = matches.get_one::<u32>("uid").copied().unwrap_or_default();
    let gid = matches.get_one::<u32>("gid").copied().unwrap_or_default();

    Ok(Options {
        verbosity: matches.get_count("verbose"),
        client_boundary,
        server_boundary,
        identity: TargetIdentity::new(uid, gid),
    })
}
