//! # Errores del Servidor
//! src/error.rs

use crate::router::RouterError;
use std::io;
use thiserror::Error;

/// Errores que detienen el arranque o el ciclo de aceptación
#[derive(Debug, Error)]
pub enum ServerError {
    /// No se pudo abrir el socket de escucha
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Configuración rechazada por `Config::validate`
    #[error("invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Router(#[from] RouterError),
}

pub type Result<T> = std::result::Result<T, ServerError>;
