//! Run-level pass/fail decision: merges the per-path request aggregates the
//! harness collected and judges them against the configured thresholds.

use std::{collections::BTreeMap, fmt};

use goose::metrics::GooseMetrics;


#[derive(Debug, confique::Config)]
pub(crate) struct ThresholdConfig {
    /// Maximum tolerated fraction of failed requests over the whole run.
    /// The default 0.01 fails the run if 1% or more of all requests failed.
    #[config(default = 0.01)]
    pub(crate) max_failure_rate: f64,

    /// Upper bound for the 95th-percentile response time over the whole
    /// run, in milliseconds.
    #[config(default = 2000)]
    pub(crate) max_p95_millis: u64,
}

/// A threshold the finished run did not stay within.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Breach {
    FailureRate { actual: f64, limit: f64 },
    SlowP95 { actual_millis: usize, limit_millis: u64 },
}

impl fmt::Display for Breach {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::FailureRate { actual, limit } => {
                write!(f, "request failure rate {actual:.4} is not below {limit}")
            }
            Self::SlowP95 { actual_millis, limit_millis } => {
                write!(
                    f,
                    "95th percentile response time {actual_millis}ms \
                        is not below {limit_millis}ms",
                )
            }
        }
    }
}

/// Judges the aggregated run metrics against the thresholds. Returns one
/// breach per failed condition; an empty result means the run passed. A run
/// without any recorded requests passes.
pub(crate) fn evaluate(metrics: &GooseMetrics, thresholds: &ThresholdConfig) -> Vec<Breach> {
    judge(&RunTotals::from_metrics(metrics), thresholds)
}


/// Whole-run totals merged from the harness's per-path request aggregates.
#[derive(Debug, Default, Clone, PartialEq)]
struct RunTotals {
    success_count: usize,
    fail_count: usize,
    /// Response time histogram: time in ms mapped to number of requests.
    times: BTreeMap<usize, usize>,
    counter: usize,
}

impl RunTotals {
    fn from_metrics(metrics: &GooseMetrics) -> Self {
        let mut totals = Self::default();
        for request in metrics.requests.values() {
            totals.success_count += request.success_count;
            totals.fail_count += request.fail_count;
            totals.counter += request.raw_data.counter;
            for (time, count) in &request.raw_data.times {
                *totals.times.entry(*time).or_insert(0) += count;
            }
        }
        totals
    }

    fn failure_rate(&self) -> f64 {
        let total = self.success_count + self.fail_count;
        if total == 0 {
            return 0.0;
        }
        self.fail_count as f64 / total as f64
    }

    fn p95(&self) -> usize {
        percentile(&self.times, self.counter, 95.0)
    }
}

fn judge(totals: &RunTotals, thresholds: &ThresholdConfig) -> Vec<Breach> {
    let mut breaches = Vec::new();

    let rate = totals.failure_rate();
    if rate >= thresholds.max_failure_rate {
        breaches.push(Breach::FailureRate { actual: rate, limit: thresholds.max_failure_rate });
    }

    let p95 = totals.p95();
    if p95 as u64 >= thresholds.max_p95_millis {
        breaches.push(Breach::SlowP95 {
            actual_millis: p95,
            limit_millis: thresholds.max_p95_millis,
        });
    }

    breaches
}

/// Returns the given percentile from a response time histogram, where
/// `total` is the overall number of recorded values.
fn percentile(times: &BTreeMap<usize, usize>, total: usize, percent: f64) -> usize {
    if total == 0 {
        return 0;
    }

    let rank = ((percent / 100.0) * total as f64).ceil().max(1.0) as usize;
    let mut seen = 0;
    for (time, count) in times {
        seen += count;
        if seen >= rank {
            return *time;
        }
    }

    // Only reachable if `total` exceeds the histogram sum.
    times.keys().next_back().copied().unwrap_or(0)
}


#[cfg(test)]
mod tests {
    use confique::Config as _;

    use super::*;

    fn totals(success: usize, fail: usize, times: &[(usize, usize)]) -> RunTotals {
        RunTotals {
            success_count: success,
            fail_count: fail,
            times: times.iter().copied().collect(),
            counter: times.iter().map(|(_, count)| count).sum(),
        }
    }

    fn default_thresholds() -> ThresholdConfig {
        ThresholdConfig::builder().load().unwrap()
    }

    #[test]
    fn percentile_of_uniform_histogram() {
        let times: BTreeMap<_, _> = (1..=100).map(|ms| (ms, 1)).collect();
        assert_eq!(percentile(&times, 100, 95.0), 95);
        assert_eq!(percentile(&times, 100, 50.0), 50);
        assert_eq!(percentile(&times, 100, 100.0), 100);
    }

    #[test]
    fn percentile_of_empty_histogram_is_zero() {
        assert_eq!(percentile(&BTreeMap::new(), 0, 95.0), 0);
    }

    #[test]
    fn quick_and_reliable_run_passes() {
        let totals = totals(995, 4, &[(12, 900), (80, 90), (300, 9)]);
        assert_eq!(judge(&totals, &default_thresholds()), vec![]);
    }

    #[test]
    fn empty_run_passes() {
        assert_eq!(judge(&RunTotals::default(), &default_thresholds()), vec![]);
    }

    #[test]
    fn too_many_failures_breach() {
        let totals = totals(98, 2, &[(10, 100)]);
        let breaches = judge(&totals, &default_thresholds());
        assert_eq!(breaches, vec![Breach::FailureRate { actual: 0.02, limit: 0.01 }]);
    }

    #[test]
    fn slow_p95_breaches() {
        // 10% of requests at 2.5s pushes the p95 over the 2000ms limit.
        let totals = totals(100, 0, &[(50, 90), (2500, 10)]);
        let breaches = judge(&totals, &default_thresholds());
        assert_eq!(
            breaches,
            vec![Breach::SlowP95 { actual_millis: 2500, limit_millis: 2000 }],
        );
    }

    #[test]
    fn rate_exactly_at_limit_breaches() {
        let totals = totals(99, 1, &[(10, 100)]);
        let breaches = judge(&totals, &default_thresholds());
        assert_eq!(breaches.len(), 1);
        assert!(matches!(breaches[0], Breach::FailureRate { .. }));
    }
}
