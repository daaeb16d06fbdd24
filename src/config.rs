use std::env;
use std::fs;
use lettre::message::Mailbox;
use log::LevelFilter;
use serde::Deserialize;
use crate::errors::ConfigError;
use crate::history::MergePolicy;

#[derive(Deserialize)]
pub struct SourceParameters {
    pub url: String,
    #[serde(default = "default_table_selector")]
    pub table_selector: String,
    #[serde(default = "default_header_row")]
    pub header_row: usize,
    #[serde(default = "default_location")]
    pub default_location: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Deserialize)]
pub struct Files {
    pub history_csv: String,
    pub history_json: String,
}

#[derive(Deserialize)]
pub struct General {
    pub log_path: String,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
    #[serde(default)]
    pub persist_failure_fatal: bool,
    #[serde(default)]
    pub merge_policy: MergePolicy,
}

#[derive(Deserialize)]
pub struct Config {
    pub source: SourceParameters,
    pub files: Files,
    pub general: General,
}

/// Mail transport parameters, only ever read from the environment
pub struct MailParameters {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from: Mailbox,
    pub to: Vec<Mailbox>,
}

fn default_table_selector() -> String { r#"table[border="2"]"#.to_string() }
fn default_header_row() -> usize { 1 }
fn default_location() -> String { "Your Location".to_string() }
fn default_timeout_secs() -> u64 { 30 }

/// Loads the configuration file and returns a struct with all configuration items
///
/// # Arguments
///
/// * 'config_path' - path to the configuration file
pub fn load_config(config_path: &str) -> Result<Config, ConfigError> {
    let toml = fs::read_to_string(config_path)
        .map_err(|e| ConfigError::File(format!("{}: {}", config_path, e)))?;
    let config: Config = toml::from_str(&toml)?;

    if config.source.url.trim().is_empty() {
        return Err(ConfigError::from("source url is empty"));
    }

    Ok(config)
}

impl MailParameters {
    /// Reads and validates all mail parameters from the environment.
    /// Every variable is checked before anything is parsed so that one run reports
    /// all missing variables at once.
    ///
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads and validates mail parameters through the given lookup
    ///
    /// # Arguments
    ///
    /// * 'lookup' - returns the value of a variable, None if it isn't set
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where F: Fn(&str) -> Option<String> {
        const KEYS: [&str; 6] = ["SMTP_SERVER", "SMTP_PORT", "SMTP_USERNAME", "SMTP_PASSWORD", "SENDER_EMAIL", "RECIPIENT_EMAILS"];

        let values = KEYS
            .iter()
            .map(|k| lookup(*k).filter(|v| !v.trim().is_empty()))
            .collect::<Vec<Option<String>>>();

        let missing = KEYS
            .iter()
            .zip(values.iter())
            .filter(|(_, v)| v.is_none())
            .map(|(k, _)| *k)
            .collect::<Vec<&str>>();
        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing.join(", ")));
        }

        let [server, port, username, password, from, to]: [String; 6] = values
            .into_iter()
            .flatten()
            .collect::<Vec<String>>()
            .try_into()
            .map_err(|_| ConfigError::from("mail parameters incomplete"))?;

        let smtp_port = port.trim().parse::<u16>()
            .map_err(|_| ConfigError::Invalid(format!("SMTP_PORT '{}' is not a port number", port)))?;
        let from = parse_mailbox(&from)?;
        let to = parse_recipients(&to)?
            .iter()
            .map(|r| parse_mailbox(r))
            .collect::<Result<Vec<Mailbox>, ConfigError>>()?;

        Ok(Self {
            smtp_server: server.trim().to_string(),
            smtp_port,
            smtp_username: username,
            smtp_password: password,
            from,
            to,
        })
    }
}

/// Splits a comma separated recipient list, trimming every address and stripping one
/// layer of enclosing quotes
///
/// # Arguments
///
/// * 'list' - the recipient list as configured
pub fn parse_recipients(list: &str) -> Result<Vec<String>, ConfigError> {
    let recipients = list
        .split(',')
        .map(|r| strip_quotes(r.trim()).trim().to_string())
        .filter(|r| !r.is_empty())
        .collect::<Vec<String>>();

    if recipients.is_empty() {
        Err(ConfigError::Invalid("recipient list is empty".to_string()))
    } else {
        Ok(recipients)
    }
}

fn strip_quotes(s: &str) -> &str {
    for q in ['"', '\''] {
        if let Some(inner) = s.strip_prefix(q).and_then(|r| r.strip_suffix(q)) {
            return inner;
        }
    }
    s
}

fn parse_mailbox(address: &str) -> Result<Mailbox, ConfigError> {
    address.trim()
        .parse::<Mailbox>()
        .map_err(|e| ConfigError::Invalid(format!("address '{}': {}", address, e)))
}
