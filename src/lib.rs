//! # Ternic Server
//! src/lib.rs
//!
//! Servidor HTTP/1.1 embebible, implementado desde cero sobre `std::net`:
//! un thread por conexión, tabla de rutas compartida y archivos estáticos.
//!
//! ## Arquitectura
//!
//! - `http`: lectura del socket, parsing de requests, construcción de responses
//! - `router`: tabla de rutas, dispatcher y archivos estáticos
//! - `server`: socket de escucha, workers y ciclo de vida
//! - `template`: sustitución de `{{variables}}` en HTML
//! - `auth`: usuarios, sesiones y middleware
//! - `handlers`: rutas de la aplicación
//! - `config`, `error`, `logging`: configuración, errores y logs
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use ternic_server::config::Config;
//! use ternic_server::server::Server;
//!
//! let server = Server::new(Config::default());
//! server
//!     .add_route("GET", "/status", |_req, resp| {
//!         resp.set_header("Content-Type", "application/json");
//!         resp.set_body(r#"{"status":"ok"}"#);
//!     })
//!     .unwrap();
//! server.start().unwrap();
//! ```

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod logging;
pub mod router;
pub mod server;
pub mod template;

pub use error::ServerError;
