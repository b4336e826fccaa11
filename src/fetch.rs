use std::io::Read;
use std::time::Duration;

use regex::Regex;
use reqwest::blocking::{Client, ClientBuilder};

use crate::error::FetchError;

pub const FETCH_TIMEOUT: Duration = Duration::from_secs(15);
pub const MAX_BODY_BYTES: u64 = 20 * 1024 * 1024;
pub const USER_AGENT: &str = "Mozilla/5.0";

/// Anything that can hand back the body of a page.
pub trait PageSource {
    fn get_page(&self, url: &str) -> Result<String, FetchError>;
}

/// Knobs for [`HttpPageSource`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub max_body_bytes: u64,
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        FetchSettings {
            timeout: FETCH_TIMEOUT,
            max_body_bytes: MAX_BODY_BYTES,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

fn client_builder(settings: &FetchSettings) -> ClientBuilder {
    Client::builder()
        .user_agent(settings.user_agent.as_str())
        .timeout(settings.timeout)
}

/// Read all of `reader`, failing once more than `limit` bytes turn up.
pub fn read_capped(reader: impl Read, limit: u64) -> Result<Vec<u8>, FetchError> {
    let mut body = Vec::new();
    reader.take(limit.saturating_add(1)).read_to_end(&mut body)?;
    if body.len() as u64 > limit {
        return Err(FetchError::TooLarge { limit });
    }
    Ok(body)
}

/// Plain GET with a browser-ish user agent, a timeout and a body cap.
pub struct HttpPageSource {
    client: Client,
    settings: FetchSettings,
}

impl HttpPageSource {
    pub fn new() -> Result<Self, FetchError> {
        Self::with_settings(FetchSettings::default())
    }

    pub fn with_settings(settings: FetchSettings) -> Result<Self, FetchError> {
        let client = client_builder(&settings).build()?;
        Ok(HttpPageSource { client, settings })
    }

    pub fn settings(&self) -> &FetchSettings {
        &self.settings
    }
}

impl PageSource for HttpPageSource {
    fn get_page(&self, url: &str) -> Result<String, FetchError> {
        let limit = self.settings.max_body_bytes;
        let response = self.client.get(url).send()?.error_for_status()?;

        if response.content_length().is_some_and(|len| len > limit) {
            return Err(FetchError::TooLarge { limit });
        }

        let body = read_capped(response, limit)?;
        Ok(String::from_utf8_lossy(&body).into_owned())
    }
}

/// Pulls `<field>: <digits>` (or `"field"=digits`, any case) out of a page.
#[derive(Debug, Clone)]
pub struct MetricPattern {
    field: String,
    regex: Regex,
}

impl MetricPattern {
    pub fn new(field: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!(
            r#"(?i)["']?{}["']?\s*[:=]\s*(\d+)"#,
            regex::escape(field)
        ))?;
        Ok(MetricPattern {
            field: field.to_string(),
            regex,
        })
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// First match in `body`, or 0 when there is none or it does not fit.
    pub fn extract(&self, body: &str) -> i64 {
        self.regex
            .captures(body)
            .and_then(|caps| caps.get(1))
            .and_then(|digits| digits.as_str().parse::<i64>().ok())
            .unwrap_or(0)
    }
}

/// Which source cells are worth fetching.
#[derive(Debug, Clone)]
pub struct Eligibility {
    host: String,
}

impl Eligibility {
    pub fn new(host: &str) -> Self {
        Eligibility {
            host: host.to_string(),
        }
    }

    pub fn accepts(&self, url: &str) -> bool {
        !url.is_empty() && url.starts_with("http") && url.contains(&self.host)
    }
}

/// Fetches one page and extracts one metric from it.
pub struct MetricFetcher<P> {
    source: P,
    pattern: MetricPattern,
}

impl<P> MetricFetcher<P>
where
    P: PageSource,
{
    pub fn new(source: P, pattern: MetricPattern) -> Self {
        MetricFetcher { source, pattern }
    }

    pub fn pattern(&self) -> &MetricPattern {
        &self.pattern
    }

    pub fn source(&self) -> &P {
        &self.source
    }

    /// Errors only on fetch failure; a page without the metric yields 0.
    pub fn fetch(&self, url: &str) -> Result<i64, FetchError> {
        let body = self.source.get_page(url)?;
        Ok(self.pattern.extract(&body))
    }
}
