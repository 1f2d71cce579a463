use std::{fs, io::{self, Write as _}};

use clap::Parser as _;
use goose::{config::GooseConfiguration, prelude::*};
use gumdrop::Options as _;

use crate::{
    cli::{Cli, Command},
    config::Config,
    prelude::*,
};


mod cli;
mod config;
mod log;
mod prelude;
mod profile;
mod report;
mod scenario;
mod target;


#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Run { harness_args } => {
            let config = config::load(cli.config.as_deref())?;
            log::init(&config.log)?;
            run(config, &harness_args).await?;
        }

        Command::Check => {
            let config = config::load(cli.config.as_deref())?;
            println!("configuration OK");
            println!("target:     {}", config.target.base_url);
            println!("test plan:  {}", config.load.test_plan());
            println!(
                "thresholds: failure rate < {}, p95 < {}ms",
                config.thresholds.max_failure_rate,
                config.thresholds.max_p95_millis,
            );
        }

        Command::GenConfigTemplate { out } => {
            let template = config::template();
            match out {
                Some(path) => fs::write(path, &template)?,
                None => io::stdout().write_all(template.as_bytes())?,
            }
        }
    }

    Ok(())
}

/// Executes the load test and judges the aggregated metrics against the
/// configured thresholds.
async fn run(config: Config, harness_args: &[String]) -> Result<()> {
    let goose_config = GooseConfiguration::parse_args_default(harness_args)
        .map_err(|e| anyhow!("invalid harness option: {e}"))?;

    let test_plan = config.load.test_plan();
    info!(base_url = %config.target.base_url, plan = %test_plan, "starting load generation");

    let metrics = GooseAttack::initialize_with_config(goose_config)?
        .register_scenario(scenario::traffic()?)
        .set_default(GooseDefault::Host, config.target.base_url.as_str())?
        .set_default(GooseDefault::TestPlan, test_plan.as_str())?
        // Thresholds cover the whole run including ramp-up, so the metrics
        // must not be reset once all users are up.
        .set_default(GooseDefault::NoResetMetrics, true)?
        .execute()
        .await?;

    let breaches = report::evaluate(&metrics, &config.thresholds);
    if !breaches.is_empty() {
        for breach in &breaches {
            error!("threshold breached: {breach}");
        }
        bail!("run failed: {} threshold(s) breached", breaches.len());
    }

    info!("run passed: all thresholds held");
    Ok(())
}
