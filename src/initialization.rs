use std::env;
use log::info;
use log4rs::append::console::ConsoleAppender;
use log4rs::append::file::FileAppender;
use log4rs::config::{Appender, Config as LogConfig, Root};
use log4rs::encode::pattern::PatternEncoder;
use crate::config::{load_config, Config, General, MailParameters};
use crate::errors::{LoggingError, UVForecastError};
use crate::history::HistoryStore;
use crate::manager_mail::Mail;
use crate::manager_temis::Temis;

const LOG_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {l} - {m}{n}";

/// Collaborators of a run
pub struct Mgr {
    pub temis: Temis,
    pub mail: Mail,
    pub history: HistoryStore,
}

/// Loads configuration, sets up logging and validates mail parameters before any network
/// access takes place. Returns the configuration and the collaborators of the run.
///
pub fn init() -> Result<(Config, Mgr), UVForecastError> {
    let config_path = env::args()
        .nth(1)
        .or_else(|| env::var("CONFIG_FILE").ok())
        .unwrap_or("config.toml".to_string());

    let config = load_config(&config_path)?;
    setup_logger(&config.general)?;

    info!("uvforecast version: {}", env!("CARGO_PKG_VERSION"));
    info!("configuration loaded from {}", config_path);

    let mail_params = MailParameters::from_env()?;
    let mail = Mail::new(&mail_params)?;
    let temis = Temis::new(&config.source);
    let history = HistoryStore::open(&config.files.history_csv, &config.files.history_json);

    Ok((config, Mgr { temis, mail, history }))
}

/// Sets up log4rs with a file appender and, if configured, a stdout appender
///
/// # Arguments
///
/// * 'general' - log path, level and whether to log to stdout
fn setup_logger(general: &General) -> Result<(), LoggingError> {
    let file = FileAppender::builder()
        .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
        .build(&general.log_path)?;

    let mut builder = LogConfig::builder()
        .appender(Appender::builder().build("file", Box::new(file)));
    let mut root = Root::builder().appender("file");

    if general.log_to_stdout {
        let stdout = ConsoleAppender::builder()
            .encoder(Box::new(PatternEncoder::new(LOG_PATTERN)))
            .build();
        builder = builder.appender(Appender::builder().build("stdout", Box::new(stdout)));
        root = root.appender("stdout");
    }

    let log_config = builder.build(root.build(general.log_level))?;
    log4rs::init_config(log_config)?;

    Ok(())
}
