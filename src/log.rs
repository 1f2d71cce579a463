use std::{
    collections::HashMap,
    fs::OpenOptions,
    path::PathBuf,
    sync::Arc,
};
use serde::Deserialize;
use tracing_subscriber::{
    filter::{FilterFn, LevelFilter},
    prelude::*,
};

use crate::prelude::*;


#[derive(Debug, confique::Config)]
pub(crate) struct LogConfig {
    /// Specifies what log messages to emit, based on the module path and log
    /// level.
    ///
    /// This is a map where the key specifies a module path prefix, and the
    /// value a minimum log level. For each log message, the entry with the
    /// longest prefix matching the log's module path is chosen; if no entry
    /// matches, the message is dropped. Valid log levels: off, error, warn,
    /// info, debug, trace.
    ///
    /// The harness logs under the `goose` prefix, so for example:
    ///
    ///    [log]
    ///    filters.traceload = "debug"
    ///    filters.goose = "warn"
    #[config(default = { "traceload": "info", "goose": "info" })]
    pub(crate) filters: Filters,

    /// If this is set, log messages are also written to this file.
    pub(crate) file: Option<PathBuf>,

    /// If this is set to `false`, log messages are not written to stdout.
    #[config(default = true)]
    pub(crate) stdout: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "HashMap<String, String>")]
pub(crate) struct Filters(HashMap<String, LevelFilter>);

impl Filters {
    /// Returns the configured level of the longest prefix matching `target`,
    /// if any matches at all.
    fn level_for(&self, target: &str) -> Option<LevelFilter> {
        self.0.iter()
            .filter(|(prefix, _)| target.starts_with(*prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, level)| *level)
    }

    fn max_level(&self) -> LevelFilter {
        self.0.values().max().copied().unwrap_or(LevelFilter::OFF)
    }
}

impl TryFrom<HashMap<String, String>> for Filters {
    type Error = String;
    fn try_from(value: HashMap<String, String>) -> Result<Self, Self::Error> {
        value.into_iter()
            .map(|(target_prefix, level)| {
                let level = parse_level_filter(&level)?;
                Ok((target_prefix, level))
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

fn parse_level_filter(s: &str) -> Result<LevelFilter, String> {
    match s {
        "off" => Ok(LevelFilter::OFF),
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        other => Err(format!("invalid log level '{other}'")),
    }
}

pub(crate) fn init(config: &LogConfig) -> anyhow::Result<()> {
    // Note: the harness's internal logging goes through the `log` crate and
    // reaches this subscriber via the tracing-log bridge under its own
    // target prefix.
    let filter = {
        let filters = config.filters.clone();
        let max_level = filters.max_level();
        FilterFn::new(move |metadata| {
            filters.level_for(metadata.target())
                .map(|level| *metadata.level() <= level)
                .unwrap_or(false)
        })
        .with_max_level_hint(max_level)
    };

    let stdout_output = if config.stdout {
        Some(tracing_subscriber::fmt::layer())
    } else {
        None
    };

    let file_output = if let Some(path) = &config.file {
        use std::io::Write;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .with_context(|| format!("failed to open/create log file '{}'", path.display()))?;

        // Add an empty line separator to see process restarts easier.
        file.write_all(b"\n\n").context("could not write to log file")?;

        Some(tracing_subscriber::fmt::layer().with_writer(Arc::new(file)))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_output)
        .with(stdout_output)
        .init();

    Ok(())
}


#[cfg(test)]
mod tests {
    use super::*;

    fn filters(entries: &[(&str, &str)]) -> Filters {
        let map: HashMap<String, String> = entries.iter()
            .map(|(prefix, level)| (prefix.to_string(), level.to_string()))
            .collect();
        Filters::try_from(map).unwrap()
    }

    #[test]
    fn longest_prefix_wins() {
        let filters = filters(&[
            ("traceload", "info"),
            ("traceload::scenario", "trace"),
            ("goose", "warn"),
        ]);
        assert_eq!(filters.level_for("traceload::report"), Some(LevelFilter::INFO));
        assert_eq!(filters.level_for("traceload::scenario"), Some(LevelFilter::TRACE));
        assert_eq!(filters.level_for("goose::metrics"), Some(LevelFilter::WARN));
        assert_eq!(filters.level_for("hyper::client"), None);
    }

    #[test]
    fn invalid_level_is_rejected() {
        let map: HashMap<String, String> =
            [("traceload".to_string(), "loud".to_string())].into();
        assert!(Filters::try_from(map).is_err());
    }
}
