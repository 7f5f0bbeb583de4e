use log::{error, info};
use service::{config::Config, logging::Logger, reporting, AppState};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }
    // Held until main returns so pending Sentry events are flushed on exit.
    let _sentry = reporting::init_sentry(&config);
    // With forwarding on, error! already produces a Sentry event.
    let report = !config.forward_logs_to_sentry();

    info!("Starting up groceries_rs [{}]...", config.runtime_env());

    let (cache, pubsub) = match service::init_backends(&config).await {
        Ok(backends) => backends,
        Err(e) => {
            error!("Failed to start: {e}");
            if report {
                reporting::report_error(&e);
            }
            return ExitCode::FAILURE;
        }
    };

    let app_state = AppState::new(config, cache, pubsub);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped with error: {e}");
        if report {
            reporting::report_error(&e);
        }
        return ExitCode::FAILURE;
    }

    info!("Shutdown successful");
    ExitCode::SUCCESS
}
