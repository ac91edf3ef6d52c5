use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

const USER_AGENT: &str = "owx";

/// Which upstream call a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    fn path(self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    /// The API answered, but with a non-success `cod`.
    #[error("{endpoint:?} request rejected ({code}): {message}")]
    Api {
        endpoint: Endpoint,
        code: String,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Text for the blocking notice, if this failure is one the user is told about.
    ///
    /// Only a rejected current-conditions lookup is reported; forecast rejections
    /// and transport failures end the query silently.
    pub fn notice(&self) -> Option<String> {
        match self {
            FetchError::Api {
                endpoint: Endpoint::Current,
                message,
                ..
            } => Some(format!("Error: {message}")),
            _ => None,
        }
    }
}

/// The `cod` status field. The current-conditions endpoint reports success as a
/// number and the forecast endpoint as a numeric string, and both switch to a
/// string on failure.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum Code {
    Number(i64),
    Text(String),
}

impl Code {
    pub fn is_number(&self, expected: i64) -> bool {
        matches!(self, Code::Number(n) if *n == expected)
    }

    pub fn is_text(&self, expected: &str) -> bool {
        matches!(self, Code::Text(s) if s == expected)
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Code::Number(n) => write!(f, "{n}"),
            Code::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Deserialize, Debug, Default, Clone)]
pub struct Condition {
    pub description: Option<String>,
}

/// Renders the loosely typed `message` field; the forecast endpoint sends `0` on success.
fn message_text(message: Option<&serde_json::Value>) -> String {
    match message {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Null) | None => "unknown error".to_string(),
        Some(other) => other.to_string(),
    }
}

fn rejected(endpoint: Endpoint, cod: Option<&Code>, message: Option<&serde_json::Value>) -> FetchError {
    FetchError::Api {
        endpoint,
        code: cod.map_or_else(|| "--".to_string(), Code::to_string),
        message: message_text(message),
    }
}

pub mod current {
    use super::*;

    #[derive(Deserialize, Debug, Default, Clone)]
    pub struct Current {
        pub cod: Option<Code>,

        pub message: Option<serde_json::Value>,

        pub name: Option<String>,

        pub main: Option<Main>,

        pub wind: Option<Wind>,

        pub weather: Option<Vec<Condition>>,

        pub coord: Option<Coord>,
    }

    impl Current {
        /// Succeeds only on the literal numeric marker `200`.
        pub fn check(self) -> Result<Self, FetchError> {
            if self.cod.as_ref().is_some_and(|c| c.is_number(200)) {
                Ok(self)
            } else {
                Err(rejected(
                    Endpoint::Current,
                    self.cod.as_ref(),
                    self.message.as_ref(),
                ))
            }
        }
    }

    #[derive(Deserialize, Debug, Default, Clone)]
    pub struct Main {
        pub temp: Option<f64>,

        pub humidity: Option<f64>,
    }

    #[derive(Deserialize, Debug, Default, Clone)]
    pub struct Wind {
        pub speed: Option<f64>,

        pub deg: Option<f64>,
    }

    #[derive(Deserialize, Debug, Default, Clone, Copy)]
    pub struct Coord {
        pub lat: Option<f64>,

        pub lon: Option<f64>,
    }
}

pub mod forecast {
    use super::*;

    #[derive(Deserialize, Debug, Default, Clone)]
    pub struct Forecast {
        pub cod: Option<Code>,

        pub message: Option<serde_json::Value>,

        #[serde(default)]
        pub list: Vec<Entry>,
    }

    impl Forecast {
        /// Succeeds only on the literal string marker `"200"`.
        pub fn check(self) -> Result<Self, FetchError> {
            if self.cod.as_ref().is_some_and(|c| c.is_text("200")) {
                Ok(self)
            } else {
                Err(rejected(
                    Endpoint::Forecast,
                    self.cod.as_ref(),
                    self.message.as_ref(),
                ))
            }
        }
    }

    #[derive(Deserialize, Debug, Default, Clone)]
    pub struct Entry {
        #[serde(default)]
        pub dt_txt: String,

        pub main: Option<Main>,

        pub weather: Option<Vec<Condition>>,
    }

    #[derive(Deserialize, Debug, Default, Clone)]
    pub struct Main {
        pub temp: Option<f64>,
    }
}

/// Anything that can answer the two lookups a query needs.
pub trait WeatherSource: Send + Sync {
    fn current(&self, city: &str) -> Result<current::Current, FetchError>;

    fn forecast(&self, city: &str) -> Result<forecast::Forecast, FetchError>;
}

#[derive(Debug, Clone)]
pub struct OpenWeatherMap {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OpenWeatherMap {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path())
    }

    // Rejections come back with a 4xx status and a JSON body carrying `cod`,
    // so the body is decoded regardless of the HTTP status.
    fn get_web_json<T: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        city: &str,
    ) -> Result<T, FetchError> {
        let url = self.url(endpoint);
        let res = self
            .client
            .get(&url)
            .query(&[("q", city), ("appid", self.api_key.as_str()), ("units", "metric")])
            .send()?;
        debug!(%url, status = %res.status(), "response received");
        let body = res.text()?;
        Ok(serde_json::from_str(&body)?)
    }
}

impl WeatherSource for OpenWeatherMap {
    fn current(&self, city: &str) -> Result<current::Current, FetchError> {
        self.get_web_json(Endpoint::Current, city)
    }

    fn forecast(&self, city: &str) -> Result<forecast::Forecast, FetchError> {
        self.get_web_json(Endpoint::Forecast, city)
    }
}
