use anyhow::{Context, Result};
use log::error;
use crate::initialization::init;

mod advice;
mod config;
mod errors;
mod extraction;
mod history;
mod initialization;
mod manager_mail;
mod manager_temis;
mod models;
mod normalization;
mod report;
mod worker;

fn main() -> Result<()> {
    let (config, mgr) = init().context("initializing uvforecast")?;

    worker::run(&config, &mgr.temis, &mgr.history, &mgr.mail)
        .inspect_err(|e| error!("{}", e))
        .context("uv forecast run failed")?;

    Ok(())
}
