mod animation;
mod app;
mod config;

use std::process::ExitCode;

use whirlpool_engine::device::GpuInit;
use whirlpool_engine::logging::{LoggingConfig, init_logging};
use whirlpool_engine::window::Runtime;

use crate::app::WhirlpoolApp;
use crate::config::DemoConfig;

fn main() -> ExitCode {
    init_logging(LoggingConfig::default());

    let config = DemoConfig::default();
    let runtime = config.runtime();
    log::info!("starting \"{}\"", runtime.title);

    match Runtime::run(runtime, GpuInit::default(), WhirlpoolApp::new(config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
