//! The load profile: an ordered list of ramp stages consumed by the harness
//! as a test plan.

use std::time::Duration;

use serde::Deserialize;


#[derive(Debug, confique::Config)]
pub(crate) struct LoadConfig {
    /// Ordered ramp stages of the run. Each stage linearly ramps the number
    /// of concurrent virtual users to `target` over `duration`. Durations
    /// require a unit ('s', 'min' or 'h').
    ///
    /// The default profile ramps to 5 users over 15s, to 20 over another
    /// 30s, holds 20 for 60s and ramps back down to 0 over 10s.
    #[config(
        default = [
            { "duration": "15s", "target": 5 },
            { "duration": "30s", "target": 20 },
            { "duration": "60s", "target": 20 },
            { "duration": "10s", "target": 0 },
        ],
        validate(!stages.is_empty(), "must not be empty"),
    )]
    pub(crate) stages: Vec<Stage>,
}

/// One time-boxed ramp segment of the load profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub(crate) struct Stage {
    /// Wall-clock length of the segment.
    #[serde(deserialize_with = "crate::config::deserialize_duration")]
    pub(crate) duration: Duration,

    /// Concurrent virtual users to reach by the end of the segment.
    pub(crate) target: u32,
}

impl LoadConfig {
    /// Renders the stages in the harness's test plan syntax, a semicolon
    /// separated list of "<users>,<duration>" steps.
    pub(crate) fn test_plan(&self) -> String {
        self.stages.iter()
            .map(|stage| format!("{},{}s", stage.target, stage.duration.as_secs()))
            .collect::<Vec<_>>()
            .join(";")
    }
}


#[cfg(test)]
mod tests {
    use confique::Config as _;

    use super::*;

    #[test]
    fn default_stages_render_like_the_original_profile() {
        let config = LoadConfig::builder().load().unwrap();
        assert_eq!(config.stages.len(), 4);
        assert_eq!(config.test_plan(), "5,15s;20,30s;20,60s;0,10s");
    }

    #[test]
    fn test_plan_for_custom_stages() {
        let config = LoadConfig {
            stages: vec![
                Stage { duration: Duration::from_secs(120), target: 50 },
                Stage { duration: Duration::from_secs(0), target: 0 },
            ],
        };
        assert_eq!(config.test_plan(), "50,120s;0,0s");
    }
}
