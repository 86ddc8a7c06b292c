// This runs daemon on windows without creating a console. Disable during development to see
// stdout.
#![windows_subsystem = "windows"]

use std::{env::args, path::PathBuf};

use anyhow::Result;
use clap::Parser;
use steptrack::{
    daemon::{args::DaemonArgs, start_daemon},
    utils::{
        dir::resolve_application_path,
        logging::{enable_logging, DAEMON_PREFIX},
        runtime::single_thread_runtime,
    },
};

fn main() -> Result<()> {
    run_service(args().collect::<Vec<_>>())
}

fn run_service(command_args: Vec<String>) -> Result<()> {
    let args = DaemonArgs::parse_from(&command_args);
    // Resolved before detaching, the daemon process runs from the root directory.
    let app_dir = std::fs::canonicalize(resolve_application_path(args.dir.clone())?)?;

    if !args.force {
        #[cfg(unix)]
        {
            use daemonize::Daemonize;
            use tracing::error;

            let daemonize = Daemonize::new()
                .stdout(daemonize::Stdio::devnull())
                .stderr(daemonize::Stdio::devnull())
                .execute();
            match daemonize {
                daemonize::Outcome::Parent(parent) => {
                    parent
                        .inspect_err(|e| error!("Failed to create daemon on parent side {e:?}"))?;
                    println!("Created daemon");
                    return Ok(());
                }
                daemonize::Outcome::Child(_) => (),
            }
        }
    }

    run(app_dir, args)
}

fn run(app_dir: PathBuf, args: DaemonArgs) -> Result<()> {
    enable_logging(DAEMON_PREFIX, &app_dir.join("logs"), args.log, args.log_console)?;
    single_thread_runtime()?.block_on(async move { start_daemon(app_dir).await })?;
    Ok(())
}
