use std::{env, path::Path, time::Duration};

use confique::Config as _;

use crate::{
    log::LogConfig,
    prelude::*,
    profile::LoadConfig,
    report::ThresholdConfig,
    target::TargetConfig,
};


/// Paths checked for a config file when neither `--config` nor
/// `TRACELOAD_CONFIG_PATH` is given. Missing files are simply skipped, so a
/// config file is entirely optional.
const DEFAULT_LOCATIONS: &[&str] = &["config.toml", "/etc/traceload/config.toml"];


#[derive(Debug, confique::Config)]
pub(crate) struct Config {
    #[config(nested)]
    pub(crate) target: TargetConfig,

    #[config(nested)]
    pub(crate) load: LoadConfig,

    #[config(nested)]
    pub(crate) thresholds: ThresholdConfig,

    #[config(nested)]
    pub(crate) log: LogConfig,
}

pub(crate) fn load(cli_path: Option<&Path>) -> Result<Config> {
    let env_path = env::var_os("TRACELOAD_CONFIG_PATH");
    let mut builder = Config::builder().env();
    match (cli_path, &env_path) {
        (Some(path), _) => {
            if !path.exists() {
                bail!("config file '{}' does not exist", path.display());
            }
            builder = builder.file(path);
        }
        (None, Some(path)) => {
            let path = Path::new(path);
            if !path.exists() {
                bail!(
                    "config file '{}' (from TRACELOAD_CONFIG_PATH) does not exist",
                    path.display(),
                );
            }
            builder = builder.file(path);
        }
        (None, None) => {
            for location in DEFAULT_LOCATIONS {
                builder = builder.file(location);
            }
        }
    }

    builder.load().context("failed to load configuration")
}

pub(crate) fn template() -> String {
    let mut options = confique::toml::FormatOptions::default();
    options.general.nested_field_gap = 2;
    confique::toml::template::<Config>(options)
}


/// Custom format for durations. Requires a unit ('s', 'min' or 'h') to keep
/// config files readable. Unit-less zeroes are allowed.
pub(crate) fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where D: serde::Deserializer<'de>,
{
    use serde::{Deserialize as _, de::Error};

    let s = String::deserialize(deserializer)?;

    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let start_unit = s.find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| D::Error::custom("no time unit for duration"))?;
    let (num, unit) = s.split_at(start_unit);
    let num: u64 = num.parse()
        .map_err(|e| D::Error::custom(format!("invalid integer for duration: {e}")))?;

    match unit {
        "s" => Ok(Duration::from_secs(num)),
        "min" => Ok(Duration::from_secs(num * 60)),
        "h" => Ok(Duration::from_secs(num * 60 * 60)),
        _ => Err(D::Error::custom("invalid unit of time for duration (use 's', 'min' or 'h')")),
    }
}


#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde::de::{IntoDeserializer as _, value::{Error, StrDeserializer}};

    use super::deserialize_duration;

    fn parse(input: &str) -> Result<Duration, Error> {
        let deserializer: StrDeserializer<Error> = input.into_deserializer();
        deserialize_duration(deserializer)
    }

    #[test]
    fn durations_with_units() {
        assert_eq!(parse("0").unwrap(), Duration::ZERO);
        assert_eq!(parse("15s").unwrap(), Duration::from_secs(15));
        assert_eq!(parse("2min").unwrap(), Duration::from_secs(120));
        assert_eq!(parse("1h").unwrap(), Duration::from_secs(3600));
    }

    #[test]
    fn durations_without_unit_are_rejected() {
        assert!(parse("15").is_err());
        assert!(parse("s").is_err());
        assert!(parse("15ms").is_err());
        assert!(parse("fast").is_err());
    }
}
