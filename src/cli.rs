//! Command-line argument parsing for the `smarthouse-sim` binary.

use std::env;
use std::path::PathBuf;

use crate::sim::ServiceOrder;

/// Parsed CLI arguments.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOptions {
    pub config: Option<PathBuf>,
    pub preset: Option<String>,
    /// Overrides `balancer.order` from the configuration.
    pub order: Option<String>,
    /// Overrides `balancer.seed` from the configuration.
    pub seed: Option<u64>,
    /// Run one balancing pass on the configured state and exit.
    pub balance: bool,
    pub report_out: Option<PathBuf>,
    pub tui: bool,
    pub help: bool,
}

/// Parses the process arguments.
///
/// # Errors
///
/// Returns a description of the first invalid argument.
pub fn parse_args() -> Result<CliOptions, String> {
    let args: Vec<String> = env::args().skip(1).collect();
    parse_args_from(&args)
}

/// Parses an explicit argument list (without the program name).
///
/// # Errors
///
/// Returns a description of the first invalid argument.
pub fn parse_args_from(args: &[String]) -> Result<CliOptions, String> {
    let mut i = 0usize;
    let mut opts = CliOptions::default();

    while i < args.len() {
        match args[i].as_str() {
            "--config" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --config (expected a TOML file path)",
                )?;
                if opts.config.replace(PathBuf::from(path)).is_some() {
                    return Err("--config provided more than once".to_string());
                }
            }
            "--preset" => {
                i += 1;
                let name = args.next_or_err(
                    i,
                    "missing value for --preset (expected a preset name)",
                )?;
                if opts.preset.replace(name.to_string()).is_some() {
                    return Err("--preset provided more than once".to_string());
                }
            }
            "--order" => {
                i += 1;
                let order = args.next_or_err(
                    i,
                    "missing value for --order (expected an order name)",
                )?;
                if ServiceOrder::from_key(order, 0).is_none() {
                    return Err(format!(
                        "--order value \"{order}\" is not one of {}",
                        ServiceOrder::KEYS.join(", ")
                    ));
                }
                opts.order = Some(order.to_string());
            }
            "--seed" => {
                i += 1;
                let raw = args.next_or_err(i, "missing value for --seed (expected a u64)")?;
                let seed = raw
                    .parse::<u64>()
                    .map_err(|_| format!("--seed value \"{raw}\" is not a valid u64"))?;
                opts.seed = Some(seed);
            }
            "--report-out" => {
                i += 1;
                let path = args.next_or_err(
                    i,
                    "missing value for --report-out (expected a file path)",
                )?;
                if opts.report_out.replace(PathBuf::from(path)).is_some() {
                    return Err("--report-out provided more than once".to_string());
                }
            }
            "--balance" => opts.balance = true,
            "--tui" => opts.tui = true,
            "--help" | "-h" => opts.help = true,
            other => return Err(format!("unknown argument: {other}")),
        }
        i += 1;
    }

    if opts.config.is_some() && opts.preset.is_some() {
        return Err(
            "arguments `--config` and `--preset` are mutually exclusive; choose one source"
                .to_string(),
        );
    }
    if opts.report_out.is_some() && !opts.balance {
        return Err("--report-out requires --balance".to_string());
    }
    if opts.tui && opts.balance {
        return Err("--tui and --balance are mutually exclusive".to_string());
    }

    Ok(opts)
}

trait SliceArgExt {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String>;
}

impl SliceArgExt for [String] {
    fn next_or_err(&self, index: usize, err: &str) -> Result<&str, String> {
        self.get(index)
            .map(String::as_str)
            .ok_or_else(|| err.to_string())
    }
}

pub fn print_usage() {
    eprintln!("smarthouse-sim: smart house energy management simulator");
    eprintln!();
    eprintln!("Usage: smarthouse-sim [OPTIONS]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --config <path>        Load the house from a TOML file");
    eprintln!("  --preset <name>        Use a built-in preset (default, all_on, tight)");
    eprintln!("  --order <name>         Worker service order (collection, scheduler, shuffled)");
    eprintln!("  --seed <u64>           Seed for the shuffled service order");
    eprintln!("  --balance              Run one balancing pass and exit");
    eprintln!("  --report-out <path>    Write the pass report as CSV (with --balance)");
    eprintln!("  --tui                  Start the live terminal UI (requires the `tui` feature)");
    eprintln!("  --help                 Show this help message");
    eprintln!();
    eprintln!("Without --balance or --tui the interactive console menu starts.");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn supports_config_cli() {
        let opts =
            parse_args_from(&args(&["--config", "house.toml"])).expect("parse should succeed");
        assert_eq!(
            opts.config.as_deref().and_then(|p| p.to_str()),
            Some("house.toml")
        );
        assert!(opts.preset.is_none());
    }

    #[test]
    fn supports_balance_with_report() {
        let opts = parse_args_from(&args(&[
            "--preset",
            "all_on",
            "--order",
            "shuffled",
            "--seed",
            "9",
            "--balance",
            "--report-out",
            "pass.csv",
        ]))
        .expect("parse should succeed");
        assert_eq!(opts.preset.as_deref(), Some("all_on"));
        assert_eq!(opts.order.as_deref(), Some("shuffled"));
        assert_eq!(opts.seed, Some(9));
        assert!(opts.balance);
        assert!(opts.report_out.is_some());
    }

    #[test]
    fn empty_args_start_menu() {
        let opts = parse_args_from(&[]).expect("parse should succeed");
        assert_eq!(opts, CliOptions::default());
    }

    #[test]
    fn rejects_conflicts_and_bad_values() {
        assert!(parse_args_from(&args(&["--config", "a.toml", "--preset", "tight"])).is_err());
        assert!(parse_args_from(&args(&["--report-out", "x.csv"])).is_err());
        assert!(parse_args_from(&args(&["--tui", "--balance"])).is_err());
        assert!(parse_args_from(&args(&["--order", "fifo"])).is_err());
        assert!(parse_args_from(&args(&["--seed", "minus-one"])).is_err());
        assert!(parse_args_from(&args(&["--preset"])).is_err());
        assert!(parse_args_from(&args(&["--frobnicate"])).is_err());
    }
}
