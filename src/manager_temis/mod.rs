pub mod errors;

use std::time::Duration;
use log::info;
use ureq::Agent;
use crate::config::SourceParameters;
use crate::manager_temis::errors::FetchError;
use crate::worker::MarkupSource;

/// Fetches the UV index forecast page published by TEMIS
pub struct Temis {
    agent: Agent,
    url: String,
}

impl Temis {
    /// Returns a new instance of the Temis struct
    ///
    /// # Arguments
    ///
    /// * 'source' - url and timeout of the forecast page
    pub fn new(source: &SourceParameters) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(source.timeout_secs)))
            .build();

        let agent = config.into();

        Self { agent, url: source.url.clone() }
    }
}

impl MarkupSource for Temis {
    /// Retrieves the raw forecast page, any non-success status is an error
    ///
    fn fetch(&self) -> Result<String, FetchError> {
        let html = self.agent
            .get(self.url.as_str())
            .call()?
            .body_mut()
            .read_to_string()?;

        if html.trim().is_empty() {
            return Err(FetchError(format!("empty response from {}", self.url)));
        }
        info!("fetched {} bytes from {}", html.len(), self.url);

        Ok(html)
    }
}
