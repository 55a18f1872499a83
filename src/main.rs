//! # Ternic Server - Entry Point
//! src/main.rs
//!
//! Carga la configuración, registra las rutas de la aplicación y atiende
//! hasta recibir Ctrl-C / SIGTERM.

use std::process;
use std::sync::Arc;
use ternic_server::auth::AuthContext;
use ternic_server::config::Config;
use ternic_server::error::ServerError;
use ternic_server::handlers::{self, AppState};
use ternic_server::logging;
use ternic_server::server::Server;
use ternic_server::template::TemplateEngine;
use tracing::{error, info};

fn run(config: Config) -> Result<(), ServerError> {
    config.validate().map_err(ServerError::Config)?;

    let auth = Arc::new(AuthContext::new());
    if let Err(e) = auth.load_users(&config.users_file) {
        error!(error = %e, path = %config.users_file, "no se pudo cargar la base de usuarios");
    }

    let server = Arc::new(Server::new(config.clone()));
    let state = Arc::new(AppState::new(
        TemplateEngine::new(&config.templates_dir),
        Arc::clone(&auth),
    ));
    handlers::register_routes(server.router(), state, &config.static_prefix, &config.static_dir)?;

    info!(address = %config.address(), "iniciando servidor");
    let listener = server.bind()?;

    let stopper = Arc::clone(&server);
    ctrlc::set_handler(move || {
        info!("señal recibida, deteniendo servidor");
        stopper.stop();
    })
    .map_err(|e| ServerError::Io(std::io::Error::other(e)))?;

    server.serve(listener)?;

    if let Err(e) = auth.save_users(&config.users_file) {
        error!(error = %e, path = %config.users_file, "no se pudo guardar la base de usuarios");
    }
    info!("servidor detenido");
    Ok(())
}

fn main() {
    let config = Config::new();

    let log_guard = match logging::init_logging(config.log_file()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("no se pudo abrir el archivo de log {}: {}", config.log_file, e);
            process::exit(1);
        }
    };

    if let Err(e) = run(config) {
        error!(error = %e, "error fatal");
        drop(log_guard);
        process::exit(1);
    }
}
