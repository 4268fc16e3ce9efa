//! nmcd daemon entry point.

use std::process::ExitCode;
use std::sync::Arc;

use nmcd::config::{EarlyExit, Resolution, USAGE_HINT};
use nmcd::{observability, ConfigResolver, Defaults, Node, ProcessManager, ServiceOrchestrator};

fn main() -> ExitCode {
    let resolver = ConfigResolver::new(Defaults::from_app_data_dir());
    let resolved = match resolver.resolve(std::env::args_os()) {
        Ok(Resolution::Run(resolved)) => resolved,
        Ok(Resolution::Exit(exit)) => return early_exit(exit),
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE_HINT}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = observability::logging::init(&resolved.config.debug_level) {
        eprintln!("failed to initialize logging: {e}");
    }

    tracing::info!(version = nmcd::VERSION, "nmcd starting");
    tracing::info!(
        network = %resolved.config.network,
        config_file = %resolved.config.config_file.display(),
        data_dir = %resolved.config.data_dir.display(),
        log_dir = %resolved.config.log_dir.display(),
        "Configuration loaded"
    );
    if !resolved.remaining_args.is_empty() {
        tracing::debug!(args = ?resolved.remaining_args, "Ignoring extra arguments");
    }
    for warning in &resolved.warnings {
        tracing::warn!("{warning}");
    }

    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => {
            tracing::error!(error = %e, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    let config = Arc::new(resolved.config);
    let outcome = runtime.block_on(async move {
        let mut orchestrator = ServiceOrchestrator::new(ProcessManager::new());
        orchestrator.run(Node::new(), config).await
    });

    match outcome.exit_code() {
        0 => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    }
}

fn early_exit(exit: EarlyExit) -> ExitCode {
    match exit {
        EarlyExit::Version => println!("nmcd version {}", nmcd::VERSION),
        EarlyExit::Help(text) => print!("{text}"),
        EarlyExit::Service(cmd) => {
            eprintln!("service command {cmd:?} has nothing to do for a console process")
        }
    }
    ExitCode::SUCCESS
}
