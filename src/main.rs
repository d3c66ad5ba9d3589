use std::process::ExitCode;
use tracing::{error, info};

use docket_scout::session::checkpoint::TerminalGate;
use docket_scout::session::{SessionCoordinator, SessionError};
use docket_scout::workflows;

const USAGE: &str = "\
docket-scout: human-assisted caseload collection and contractor lookup

USAGE:
    docket-scout cases [--config <path>] [--debug-html <dir>]
    docket-scout lookup <UBI> [--config <path>] [--debug-html <dir>]

The browser window this opens is yours to drive at each checkpoint: solve
any challenge the site shows, then press ENTER in this terminal to let the
automation continue (';' skips the current source).
";

struct CliArgs {
    command: String,
    ubi: Option<String>,
    config_path: Option<String>,
    debug_html_dir: Option<String>,
}

fn parse_args() -> Option<CliArgs> {
    let mut args = std::env::args().skip(1).peekable();
    let command = args.next()?;
    let mut ubi = None;
    let mut config_path = None;
    let mut debug_html_dir = None;
    while let Some(a) = args.next() {
        if a == "--config" {
            config_path = args.next();
        } else if let Some(rest) = a.strip_prefix("--config=") {
            config_path = Some(rest.to_string());
        } else if a == "--debug-html" {
            debug_html_dir = args.next();
        } else if let Some(rest) = a.strip_prefix("--debug-html=") {
            debug_html_dir = Some(rest.to_string());
        } else if ubi.is_none() && !a.starts_with("--") {
            ubi = Some(a);
        }
    }
    Some(CliArgs {
        command,
        ubi,
        config_path,
        debug_html_dir,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let Some(args) = parse_args() else {
        eprintln!("{USAGE}");
        return ExitCode::from(1);
    };

    let mut cfg = docket_scout::load_config(args.config_path.as_deref());
    if let Some(dir) = &args.debug_html_dir {
        cfg.debug_html_dir = Some(dir.into());
    }
    info!(
        "bar number {}, primary root {}",
        cfg.bar_number,
        cfg.case_root.display()
    );

    // A missing browser binary is the one failure that aborts the process;
    // everything downstream is reported as a run result instead.
    let coordinator = match SessionCoordinator::discover() {
        Ok(c) => c,
        Err(e @ SessionError::BrowserMissing) => {
            error!("{}", e);
            return ExitCode::from(1);
        }
        Err(e) => {
            error!("browser setup failed: {}", e);
            return ExitCode::from(1);
        }
    };

    let gate = TerminalGate;

    match args.command.as_str() {
        "cases" => match workflows::run_case_collection(&coordinator, &cfg, &gate).await {
            Ok(summary) => {
                println!("Run complete: {summary}");
                ExitCode::SUCCESS
            }
            Err(e) => {
                error!("case collection failed: {:#}", e);
                ExitCode::from(2)
            }
        },
        "lookup" => {
            let Some(ubi) = args.ubi else {
                eprintln!("lookup requires a UBI number\n\n{USAGE}");
                return ExitCode::from(1);
            };
            match workflows::run_contractor_lookup(&coordinator, &cfg, &ubi, &gate).await {
                Ok(lookup) => {
                    println!(
                        "Lookup complete: {} records across {} sources, {} skipped",
                        lookup.records.len(),
                        lookup.sources.len(),
                        lookup.skipped
                    );
                    match serde_json::to_string_pretty(&lookup) {
                        Ok(json) => println!("{json}"),
                        Err(e) => error!("could not encode lookup result: {}", e),
                    }
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    error!("contractor lookup failed: {:#}", e);
                    ExitCode::from(2)
                }
            }
        }
        other => {
            eprintln!("unknown command: {other}\n\n{USAGE}");
            ExitCode::from(1)
        }
    }
}
