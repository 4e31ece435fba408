use std::process::ExitCode;

mod app;
mod config;
mod controller;
mod discovery;
mod dom;
mod engine;
mod media;
mod overlay;
mod settings;
mod shortcuts;
mod utils;

#[tokio::main]
async fn main() -> ExitCode {
    let result = app::start().await;
    match result {
        Ok(..) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err:?}");
            ExitCode::FAILURE
        }
    }
}
