use std::path::PathBuf;


#[derive(clap::Parser)]
#[command(version, about)]
pub struct Cli {
    #[clap(subcommand)]
    pub cmd: Command,

    /// Specifies config file location. Default locations are: 'config.toml'
    /// and '/etc/traceload/config.toml'. Can also be set via env
    /// `TRACELOAD_CONFIG_PATH`.
    #[clap(long)]
    pub config: Option<PathBuf>,
}

#[derive(Debug, clap::Parser)]
pub enum Command {
    /// Runs the load test against the configured target service.
    ///
    /// Trailing arguments are forwarded to the load-test harness unchanged,
    /// e.g. `traceload run -- --users 10 --run-time 30s`. Harness options
    /// take precedence over values from the config file.
    Run {
        #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
        harness_args: Vec<String>,
    },

    /// Checks the config and prints the resolved target, load profile and
    /// thresholds without sending any traffic. Useful to run before
    /// starting a long run.
    Check,

    /// Outputs a template of the configuration, including all config options
    /// with descriptions, great as a starting point.
    GenConfigTemplate {
        /// File to write it to. If unspecified, written to stdout.
        #[clap(short, long)]
        out: Option<PathBuf>,
    },
}
