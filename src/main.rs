use log::error;
use timetable_solver::config::ServerConfig;
use timetable_solver::server;

#[tokio::main]
async fn main() {
    let config = ServerConfig::from_env();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_filter)).init();

    if let Err(e) = server::run_server(config).await {
        error!("Server stopped: {}", e);
        std::process::exit(1);
    }
}
