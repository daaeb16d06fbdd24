use log::{error, info};
use crate::config::Config;
use crate::errors::UVForecastError;
use crate::extraction::{extract, ExtractOptions};
use crate::history::HistoryStore;
use crate::manager_mail::errors::MailError;
use crate::manager_temis::errors::FetchError;
use crate::normalization::normalize;
use crate::report::{render, Report};

/// Where the forecast markup comes from
pub trait MarkupSource {
    fn fetch(&self) -> Result<String, FetchError>;
}

/// Where the finished report goes
pub trait ReportSender {
    fn send(&self, report: &Report) -> Result<(), MailError>;
}

/// Runs the pipeline once: fetch, extract, normalize, merge into history, render and send.
///
/// A failure to persist history is logged and, unless configured as fatal, the report
/// is still rendered and sent from the freshly fetched records.
///
/// # Arguments
///
/// * 'config' - configuration
/// * 'source' - forecast page source
/// * 'history' - the history store to merge into
/// * 'sender' - report delivery
pub fn run(config: &Config, source: &impl MarkupSource, history: &HistoryStore, sender: &impl ReportSender)
    -> Result<Report, UVForecastError> {

    let markup = source.fetch()?;

    let table = extract(&markup, &ExtractOptions::from(&config.source))?;
    let records = normalize(&table.rows)?;
    for r in &records {
        info!("{}", r);
    }

    let (merged, persisted) = history.update(&records, config.general.merge_policy);
    match persisted {
        Ok(()) => info!("history now holds {} records", merged.len()),
        Err(e) if config.general.persist_failure_fatal => return Err(e.into()),
        Err(e) => error!("{}, history not updated but continuing with the report", e),
    }

    let report = render(&table.location, &records, &config.source.url)?;
    sender.send(&report)?;
    info!("report '{}' delivered", report.subject);

    Ok(report)
}
