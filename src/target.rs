//! Description of the service under test: where it lives and which of its
//! two endpoints each iteration talks to.

use std::fmt;

use anyhow::anyhow;
use serde::Deserialize;


#[derive(Debug, confique::Config)]
pub(crate) struct TargetConfig {
    /// Base URL of the service under test, including the scheme, e.g.
    /// 'http://localhost:8080'. Can also be set via env `TRACELOAD_BASE_URL`.
    /// The harness option `--host` takes precedence over this value.
    #[config(default = "http://localhost:8080", env = "TRACELOAD_BASE_URL")]
    pub(crate) base_url: BaseUrl,
}


/// A validated `http(s)://` URL with trailing slashes stripped, so endpoint
/// paths can simply be appended.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub(crate) struct BaseUrl(String);

impl BaseUrl {
    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for BaseUrl {
    type Error = anyhow::Error;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        let rest = value.strip_prefix("http://")
            .or_else(|| value.strip_prefix("https://"))
            .ok_or_else(|| anyhow!("base URL must start with 'http://' or 'https://'"))?;
        if rest.trim_end_matches('/').is_empty() {
            return Err(anyhow!("base URL is missing a host"));
        }
        Ok(Self(value.trim_end_matches('/').to_owned()))
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}


/// The two endpoints the generated traffic is split across.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Endpoint {
    Traced,
    Untraced,
}

impl Endpoint {
    /// Selects an endpoint from a uniform draw in `[0, 1)`: draws below 0.5
    /// map to the traced endpoint. This gives an approximate 50/50 split
    /// over a run. Intentionally probabilistic, no rebalancing.
    pub(crate) fn pick(draw: f64) -> Self {
        if draw < 0.5 { Self::Traced } else { Self::Untraced }
    }

    pub(crate) fn path(&self) -> &'static str {
        match self {
            Self::Traced => "/process-traced",
            Self::Untraced => "/process-untraced",
        }
    }
}
