//! Entry point for the `flb-client` binary.

use std::io;
use std::process::ExitCode;

use flb_client::{SystemConfigLoader, report_startup_failure};

fn main() -> ExitCode {
    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(runtime_error) => {
            report_startup_failure(
                &mut io::stderr().lock(),
                &format_args!("failed to start the async runtime: {runtime_error}"),
            );
            return ExitCode::FAILURE;
        }
    };
    runtime.block_on(flb_client::run(&SystemConfigLoader))
}
