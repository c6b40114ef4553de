//! # HTTP File Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor: parsea la configuración (CLI + env),
//! la valida, instala el logger y corre el dispatcher.

use httpserver::config::Config;
use httpserver::server::Server;

fn main() {
    let config = Config::new();

    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {}", e);
        std::process::exit(1);
    }

    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_writer(std::io::stdout)
        .init();

    config.print_summary();

    let server = match Server::bind(config) {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(error = %e, "failed to start server");
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!(error = %e, "server error");
        std::process::exit(1);
    }
}
