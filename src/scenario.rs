//! The per-iteration behavior of a virtual user: draw one of the two
//! endpoints, send a correlated GET and record the outcome of two
//! independent response checks.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use goose::prelude::*;

use crate::target::Endpoint;


/// Bounds of the random pause between two iterations of one virtual user,
/// emulating human-paced traffic instead of a tight request loop. The
/// harness sleeps a uniformly drawn duration within these bounds after
/// every iteration.
const PAUSE_MIN: Duration = Duration::from_millis(100);
const PAUSE_MAX: Duration = Duration::from_millis(1600);

/// Builds the scenario every virtual user runs in a loop.
pub(crate) fn traffic() -> Result<Scenario, GooseError> {
    Ok(scenario!("ProcessTraffic")
        .register_transaction(transaction!(process_request))
        .set_wait_time(PAUSE_MIN, PAUSE_MAX)?)
}

/// One iteration: select an endpoint, send a GET carrying the correlation
/// headers and evaluate both checks against the response. Failed checks are
/// recorded for aggregation and never abort the run; there are no retries,
/// a single best-effort sample per iteration.
async fn process_request(user: &mut GooseUser) -> TransactionResult {
    let endpoint = Endpoint::pick(rand::random());
    let iteration = next_iteration(user);
    // VU numbering is 1-based, matching the harness's own user display.
    let request_id = request_id(user.weighted_users_index + 1, iteration, epoch_millis());

    let request_builder = user
        .get_request_builder(&GooseMethod::Get, endpoint.path())?
        .header("X-Request-Id", request_id.as_str())
        .header("Accept", "application/json");
    let request = GooseRequest::builder()
        .set_request_builder(request_builder)
        .build();

    let mut goose = user.request(request).await?;

    let checks = match &goose.response {
        Ok(response) => {
            let content_type = response
                .headers()
                .get("content-type")
                .and_then(|value| value.to_str().ok());
            ResponseChecks::evaluate(response.status().as_u16(), content_type)
        }
        // Connection refused, DNS failure and friends: there is no response
        // to look at, both checks fail.
        Err(_) => ResponseChecks::transport_failed(),
    };

    if !checks.passed() {
        return user.set_failure(checks.failure_tag(), &mut goose.request, None, None);
    }

    Ok(())
}


/// Per-user iteration counter, kept as harness session data. The first
/// iteration of every virtual user is number 0.
struct IterationState {
    count: u64,
}

fn next_iteration(user: &mut GooseUser) -> u64 {
    match user.get_session_data_mut::<IterationState>() {
        Some(state) => {
            state.count += 1;
            state.count
        }
        None => {
            user.set_session_data(IterationState { count: 0 });
            0
        }
    }
}

/// Correlation token attached as `X-Request-Id`, to grep for across the
/// target's logs. Unique with overwhelming probability thanks to the
/// (user, iteration, timestamp) triple; collisions are not checked.
fn request_id(user: usize, iteration: u64, epoch_ms: u128) -> String {
    format!("{user}-{iteration}-{epoch_ms}")
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis())
        .unwrap_or(0)
}


/// Outcome of the two independent response checks. A failed check does not
/// short-circuit the other one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ResponseChecks {
    status_is_200: bool,
    is_json: bool,
}

impl ResponseChecks {
    fn evaluate(status: u16, content_type: Option<&str>) -> Self {
        Self {
            status_is_200: status == 200,
            is_json: content_type.is_some_and(|ct| ct.contains("application/json")),
        }
    }

    fn transport_failed() -> Self {
        Self { status_is_200: false, is_json: false }
    }

    fn passed(&self) -> bool {
        self.status_is_200 && self.is_json
    }

    fn failure_tag(&self) -> &'static str {
        match (self.status_is_200, self.is_json) {
            (false, false) => "status is not 200, response is not json",
            (false, true) => "status is not 200",
            (true, false) => "response is not json",
            (true, true) => "all checks passed",
        }
    }
}
