// # ipwatch - health-check driven DNS reconciliation
//
// This binary is a thin integration layer. It:
// 1. Parses flags (with `IPWATCH_*` environment fallbacks)
// 2. Validates the configuration and the domain list
// 3. Reads one health-check report from stdin
// 4. Builds the record store and notifier from the plugin registry
// 5. Runs the reconciler once and maps the outcome to an exit code
//
// All reconciliation logic lives in ipwatch-core. Logs go to stderr so
// stdout stays free for the process that invoked the handler.
//
// ## Example
//
// ```bash
// export IPWATCH_CLOUDFLARE_API_TOKEN=your_token
// ipwatch watch -H example.com -C global-ip \
//     -D www.example.com:web,api.example.com:api < report.json
// ```

mod cli;

use anyhow::Context;
use clap::Parser;
use clap::error::ErrorKind as ClapErrorKind;
use ipwatch_core::domain::Domain;
use ipwatch_core::{
    CheckReport, ErrorKind, PluginRegistry, Reconciler, RunResult, WatchConfig, read_report,
};
use std::io::Read;
use std::process::ExitCode;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::cli::{Cli, Command};

/// Exit codes for the ways a run can end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IpwatchExitCode {
    /// Every domain handled
    Success = 0,
    /// Invalid flags, configuration or domain list
    ConfigError = 1,
    /// Zone lookup, store or timeout failure, or a failed domain
    RuntimeError = 2,
    /// The report stream was empty
    NoInput = 3,
    /// The report could not be parsed
    MalformedInput = 4,
}

impl From<IpwatchExitCode> for ExitCode {
    fn from(code: IpwatchExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn exit_code_for(kind: ErrorKind) -> IpwatchExitCode {
    match kind {
        ErrorKind::Config | ErrorKind::Validation => IpwatchExitCode::ConfigError,
        ErrorKind::EmptyInput => IpwatchExitCode::NoInput,
        ErrorKind::Parse => IpwatchExitCode::MalformedInput,
        ErrorKind::ZoneNotFound
        | ErrorKind::StoreRead
        | ErrorKind::StoreWrite
        | ErrorKind::Notify
        | ErrorKind::Timeout
        | ErrorKind::Runtime => IpwatchExitCode::RuntimeError,
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ClapErrorKind::DisplayHelp | ClapErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            // Printing can only fail if stderr is gone
            let _ = e.print();
            return IpwatchExitCode::ConfigError.into();
        }
    };

    let Command::Watch(args) = cli.command;
    let config = args.to_config();

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return IpwatchExitCode::ConfigError.into();
    }

    let domains = match config.build_domains() {
        Ok(domains) => domains,
        Err(e) => {
            eprintln!("Configuration validation error: {}", e);
            return IpwatchExitCode::ConfigError.into();
        }
    };

    if let Err(e) = init_tracing(args.log_level()) {
        eprintln!("{:#}", e);
        return IpwatchExitCode::ConfigError.into();
    }

    info!(
        "Watch called: hosted_zone={}, domains={:?}, check_id={}",
        config.zone_name(),
        config.domains,
        config.check_id.as_deref().unwrap_or("<any>")
    );

    let report = match load_report(std::io::stdin().lock(), &config) {
        Ok(report) => report,
        Err(e) => {
            error!("{}", e);
            return exit_code_for(e.kind()).into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IpwatchExitCode::RuntimeError.into();
        }
    };

    let registry = build_registry();
    let code = rt.block_on(async {
        match run_watch(&config, &domains, &report, &registry).await {
            Ok(result) if result.is_success() => IpwatchExitCode::Success,
            Ok(result) => {
                error!("{} domain(s) failed", result.failed());
                IpwatchExitCode::RuntimeError
            }
            Err(e) => {
                error!("Watch failed: {}", e);
                exit_code_for(e.kind())
            }
        }
    });

    code.into()
}

/// Install the stderr log subscriber
fn init_tracing(level: Level) -> anyhow::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")
}

/// Registry with every store and notifier compiled into this binary
fn build_registry() -> PluginRegistry {
    let registry = PluginRegistry::with_builtins();

    #[cfg(feature = "cloudflare")]
    ipwatch_store_cloudflare::register(&registry);

    #[cfg(feature = "slack")]
    ipwatch_notify_slack::register(&registry);

    registry
}

/// Read and parse the whole report before any collaborator is built
fn load_report<R: Read>(input: R, config: &WatchConfig) -> ipwatch_core::Result<CheckReport> {
    let report = read_report(input, config.check_id.as_deref())?;
    if report.is_empty() {
        warn!("Report carries no observations, every domain will be skipped");
    } else {
        info!("Report carries {} observation(s)", report.len());
    }
    Ok(report)
}

/// Build collaborators from `registry` and reconcile once
async fn run_watch(
    config: &WatchConfig,
    domains: &[Domain],
    report: &CheckReport,
    registry: &PluginRegistry,
) -> ipwatch_core::Result<RunResult> {
    let store = registry.create_store(&config.store)?;
    let notifier = registry.create_notifier(&config.notifier)?;
    info!(
        "Using record store {} and notifier {}",
        store.store_name(),
        notifier.notifier_name()
    );

    let reconciler = Reconciler::from_config(store, notifier, config)?;
    reconciler.run(domains, report).await
}
