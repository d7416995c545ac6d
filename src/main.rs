//! Smart-house simulator entry point: CLI wiring and config-driven coordinator construction.

use std::io;
use std::path::Path;
use std::process;

use smarthouse_sim::cli::{self, CliOptions};
use smarthouse_sim::config::HouseConfig;
use smarthouse_sim::io::export::export_csv;
use smarthouse_sim::logging::{init_tracing, tracing_sink};
use smarthouse_sim::menu::Menu;
use smarthouse_sim::sim::PassSummary;

/// Resolves the configuration: `--config` takes priority, then `--preset`,
/// then the default house. CLI overrides are applied last.
fn load_config(opts: &CliOptions) -> HouseConfig {
    let mut cfg = if let Some(ref path) = opts.config {
        match HouseConfig::from_toml_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else if let Some(ref name) = opts.preset {
        match HouseConfig::from_preset(name) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("{e}");
                process::exit(1);
            }
        }
    } else {
        HouseConfig::default_house()
    };

    if let Some(ref order) = opts.order {
        cfg.balancer.order = order.clone();
    }
    if let Some(seed) = opts.seed {
        cfg.balancer.seed = seed;
    }

    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    cfg
}

fn run_balance_once(cfg: &HouseConfig, report_out: Option<&Path>) {
    let mut coordinator = cfg.build(tracing_sink()).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let report = match coordinator.balance() {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    // per-device lines were already logged by the balancer
    print!("{}", PassSummary::from_report(&report, coordinator.sources()));

    if let Some(path) = report_out {
        if let Err(e) = export_csv(&report, path) {
            eprintln!("error: failed to write CSV: {e}");
            process::exit(1);
        }
        eprintln!("Pass report written to {}", path.display());
    }
}

fn run_menu(cfg: &HouseConfig) {
    let mut coordinator = cfg.build(tracing_sink()).unwrap_or_else(|e| {
        eprintln!("{e}");
        process::exit(1);
    });

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut menu = Menu::new(&mut coordinator, stdin.lock(), stdout.lock());
    if let Err(e) = menu.run() {
        tracing::error!(error = %e, "console menu terminated");
        process::exit(1);
    }
}

fn main() {
    let opts = match cli::parse_args() {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("error: {e}");
            cli::print_usage();
            process::exit(1);
        }
    };
    if opts.help {
        cli::print_usage();
        return;
    }

    let cfg = load_config(&opts);

    if opts.tui {
        #[cfg(feature = "tui")]
        {
            // keep log output off the terminal the TUI draws on
            if cfg.logging.file.is_some() {
                if let Err(e) = init_tracing(&cfg.logging) {
                    eprintln!("error: failed to initialize logging: {e}");
                }
            }
            smarthouse_sim::tui::run(cfg);
            return;
        }
        #[cfg(not(feature = "tui"))]
        {
            eprintln!("error: this build does not include the `tui` feature");
            process::exit(1);
        }
    }

    if let Err(e) = init_tracing(&cfg.logging) {
        eprintln!("error: failed to initialize logging: {e}");
    }
    tracing::info!("Logging setup completed!");

    if opts.balance {
        run_balance_once(&cfg, opts.report_out.as_deref());
    } else {
        run_menu(&cfg);
    }
}
