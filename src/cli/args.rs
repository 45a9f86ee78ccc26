//! Command-line argument parsing for the educloud CLI.
//!
//! Arguments are positional: `educloud <group> <action> [args]`.

/// Parsed CLI command to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum CliCommand {
    /// Show version information
    Version,
    /// Print usage
    Help,
    Key(KeyCommand),
    Sms(SmsCommand),
    Email(EmailCommand),
    Search(SearchCommand),
    /// Arguments that do not form a command
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum KeyCommand {
    Verify { access_key: String, secret_key: String },
    Install { access_key: String, secret_key: String },
    Info,
    Bind { host: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SmsCommand {
    Open { name: Option<String> },
    Close,
    Sign { name: String },
    Refresh,
    Apply { name: String },
    ApplyStatus,
    Dismiss,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EmailCommand {
    Open,
    Close,
    Sign { sender: String },
    Refresh,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchCommand {
    Status,
    Connection,
    Submit { site_url: Option<String> },
    Close,
    Callback { url: String },
}

pub const USAGE: &str = "\
usage: educloud <group> <action> [args]

  key verify AK SK | install AK SK | info | bind HOST
  sms open [NAME] | close | sign NAME | refresh | apply NAME | apply-status | dismiss
  email open | close | sign NAME | refresh
  search status | connection | submit [SITE_URL] | close | callback URL

  --version, -V    print version
  --help, -h       print this message";

/// Parse command-line arguments and return the appropriate command.
///
/// # Examples
///
/// ```
/// use educloud::cli::args::{parse_args, CliCommand, SmsCommand};
///
/// let args = ["educloud", "sms", "open", "MySchool"].map(String::from);
/// assert_eq!(
///     parse_args(args.into_iter()),
///     CliCommand::Sms(SmsCommand::Open { name: Some("MySchool".to_string()) })
/// );
/// ```
pub fn parse_args<I>(args: I) -> CliCommand
where
    I: Iterator<Item = String>,
{
    // Skip the program name
    let args: Vec<String> = args.skip(1).collect();

    if args.iter().any(|a| a == "--version" || a == "-V") {
        return CliCommand::Version;
    }
    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        return CliCommand::Help;
    }

    let words: Vec<&str> = args.iter().map(String::as_str).collect();
    let parsed = match words.as_slice() {
        ["key", "verify", ak, sk] => Some(CliCommand::Key(KeyCommand::Verify {
            access_key: ak.to_string(),
            secret_key: sk.to_string(),
        })),
        ["key", "install", ak, sk] => Some(CliCommand::Key(KeyCommand::Install {
            access_key: ak.to_string(),
            secret_key: sk.to_string(),
        })),
        ["key", "info"] => Some(CliCommand::Key(KeyCommand::Info)),
        ["key", "bind", host] => Some(CliCommand::Key(KeyCommand::Bind {
            host: host.to_string(),
        })),

        ["sms", "open"] => Some(CliCommand::Sms(SmsCommand::Open { name: None })),
        ["sms", "open", name] => Some(CliCommand::Sms(SmsCommand::Open {
            name: Some(name.to_string()),
        })),
        ["sms", "close"] => Some(CliCommand::Sms(SmsCommand::Close)),
        ["sms", "sign", name] => Some(CliCommand::Sms(SmsCommand::Sign {
            name: name.to_string(),
        })),
        ["sms", "refresh"] => Some(CliCommand::Sms(SmsCommand::Refresh)),
        ["sms", "apply", name] => Some(CliCommand::Sms(SmsCommand::Apply {
            name: name.to_string(),
        })),
        ["sms", "apply-status"] => Some(CliCommand::Sms(SmsCommand::ApplyStatus)),
        ["sms", "dismiss"] => Some(CliCommand::Sms(SmsCommand::Dismiss)),

        ["email", "open"] => Some(CliCommand::Email(EmailCommand::Open)),
        ["email", "close"] => Some(CliCommand::Email(EmailCommand::Close)),
        ["email", "sign", sender] => Some(CliCommand::Email(EmailCommand::Sign {
            sender: sender.to_string(),
        })),
        ["email", "refresh"] => Some(CliCommand::Email(EmailCommand::Refresh)),

        ["search", "status"] => Some(CliCommand::Search(SearchCommand::Status)),
        ["search", "connection"] => Some(CliCommand::Search(SearchCommand::Connection)),
        ["search", "submit"] => Some(CliCommand::Search(SearchCommand::Submit { site_url: None })),
        ["search", "submit", url] => Some(CliCommand::Search(SearchCommand::Submit {
            site_url: Some(url.to_string()),
        })),
        ["search", "close"] => Some(CliCommand::Search(SearchCommand::Close)),
        ["search", "callback", url] => Some(CliCommand::Search(SearchCommand::Callback {
            url: url.to_string(),
        })),
        _ => None,
    };

    parsed.unwrap_or_else(|| CliCommand::Invalid(args.join(" ")))
}
