//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración por argumentos CLI, con variables de entorno como
//! alternativa para cada flag.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./ternic_server --port 8080 \
//!   --static-dir ./public \
//!   --read-timeout-ms 2000 \
//!   --max-connections 256
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 HTTP_HOST=127.0.0.1 ./ternic_server
//! LOG_FILE=logs/server.log ./ternic_server
//! ```

use crate::http::reader::DEFAULT_MAX_REQUEST_BYTES;
use crate::http::request::MAX_HEADERS;
use crate::router::DEFAULT_MAX_FILE_BYTES;
use clap::Parser;
use std::path::Path;
use std::time::Duration;

/// Configuración del servidor HTTP/1.1
#[derive(Debug, Clone, Parser)]
#[command(name = "ternic_server")]
#[command(about = "Servidor HTTP/1.1 embebible: un thread por conexión, rutas y archivos estáticos")]
#[command(version)]
pub struct Config {
    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "5000", env = "HTTP_PORT")]
    pub port: u16,

    // === Archivos ===

    /// Prefijo de URL para archivos estáticos
    #[arg(long = "static-prefix", default_value = "/static", env = "STATIC_PREFIX")]
    pub static_prefix: String,

    /// Directorio raíz de los archivos estáticos
    #[arg(long = "static-dir", default_value = "static", env = "STATIC_DIR")]
    pub static_dir: String,

    /// Directorio de templates HTML
    #[arg(long = "templates-dir", default_value = "templates", env = "TEMPLATES_DIR")]
    pub templates_dir: String,

    /// Archivo JSON con la base de usuarios
    #[arg(long = "users-file", default_value = "data/users.json", env = "USERS_FILE")]
    pub users_file: String,

    // === Límites ===

    /// Capacidad del buffer de entrada por request
    #[arg(long = "max-request-bytes", default_value = "65536", env = "MAX_REQUEST_BYTES")]
    pub max_request_bytes: usize,

    /// Tamaño máximo de un archivo estático
    #[arg(long = "max-file-bytes", default_value = "65536", env = "MAX_FILE_BYTES")]
    pub max_file_bytes: u64,

    /// Máximo de headers que se guardan por request
    #[arg(long = "max-headers", default_value = "50", env = "MAX_HEADERS")]
    pub max_headers: usize,

    /// Timeout de lectura por conexión en milisegundos (0 = sin timeout)
    #[arg(long = "read-timeout-ms", default_value = "5000", env = "READ_TIMEOUT_MS")]
    pub read_timeout_ms: u64,

    /// Conexiones atendidas a la vez (0 = sin límite)
    /// Por encima del límite se responde 503
    #[arg(long = "max-connections", default_value = "0", env = "MAX_CONNECTIONS")]
    pub max_connections: usize,

    // === Logs ===

    /// Archivo de log (vacío = solo consola)
    #[arg(long = "log-file", default_value = "server.log", env = "LOG_FILE")]
    pub log_file: String,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use ternic_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:5000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeout de lectura, `None` si está deshabilitado
    pub fn read_timeout(&self) -> Option<Duration> {
        match self.read_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Archivo de log, `None` si está deshabilitado
    pub fn log_file(&self) -> Option<&Path> {
        match self.log_file.trim() {
            "" => None,
            path => Some(Path::new(path)),
        }
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        // Validar límites
        if self.max_request_bytes == 0 {
            return Err("Max request bytes must be >= 1".to_string());
        }
        if self.max_file_bytes == 0 {
            return Err("Max file bytes must be >= 1".to_string());
        }
        if self.max_headers == 0 {
            return Err("Max headers must be >= 1".to_string());
        }

        // Validar prefijo estático
        if self.static_prefix.is_empty() {
            return Err("Static prefix must not be empty".to_string());
        }
        if !self.static_prefix.starts_with('/') {
            return Err("Static prefix must start with '/'".to_string());
        }

        Ok(())
    }
}

impl Default for Config {
    /// Configuración por defecto (igual a los defaults del CLI)
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            static_prefix: "/static".to_string(),
            static_dir: "static".to_string(),
            templates_dir: "templates".to_string(),
            users_file: "data/users.json".to_string(),
            max_request_bytes: DEFAULT_MAX_REQUEST_BYTES,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
            max_headers: MAX_HEADERS,
            read_timeout_ms: 5000,
            max_connections: 0,
            log_file: "server.log".to_string(),
        }
    }
}
