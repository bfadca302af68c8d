use std::process::ExitCode;

use oxyload::app::run_app;
use oxyload::config::load_config;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    ExitCode::from(run_app(load_config()).await)
}
