//! # Logging
//! src/logging.rs
//!
//! Dos destinos:
//! - archivo (`--log-file`, por defecto `server.log`): todos los eventos
//!   que deje pasar `RUST_LOG`, escritos por un thread aparte
//! - consola: solo `WARN` y `ERROR` mientras haya archivo; todo si no hay
//!
//! El nivel se controla con `RUST_LOG` (por defecto `info`):
//!
//! ```bash
//! RUST_LOG=debug ./ternic_server
//! RUST_LOG=ternic_server::router=warn ./ternic_server --log-file logs/app.log
//! ./ternic_server --log-file ""   # solo consola
//! ```

use std::fs;
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Writer no bloqueante que agrega al final de `path`
///
/// Crea los directorios que falten. Los eventos se escriben en el archivo
/// hasta que se suelta el [`WorkerGuard`].
pub fn file_writer(path: &Path) -> io::Result<(NonBlocking, WorkerGuard)> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, format!("archivo de log inválido: {}", path.display())))?;
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(dir)
        .map_err(io::Error::other)?;
    Ok(tracing_appender::non_blocking(appender))
}

/// Instala el subscriber global
///
/// Con `log_file` retorna el guard del writer del archivo: hay que
/// mantenerlo vivo hasta el final de `main` o se pierden los últimos eventos.
///
/// # Panics
///
/// Si ya había un subscriber instalado. Llamar una sola vez desde `main`.
pub fn init_logging(log_file: Option<&Path>) -> io::Result<Option<WorkerGuard>> {
    let (file_layer, guard) = match log_file {
        Some(path) => {
            let (writer, guard) = file_writer(path)?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_thread_names(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let console_level = if file_layer.is_some() {
        LevelFilter::WARN
    } else {
        LevelFilter::TRACE
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(fmt::layer().with_thread_names(true).with_filter(console_level))
        .init();

    Ok(guard)
}

/// Igual que [`init_logging`] sin archivo, ignorando si ya había un subscriber
///
/// Útil en tests, donde varios casos pueden intentar inicializarlo.
pub fn try_init_logging() -> bool {
    tracing_subscriber::registry()
        .with(env_filter())
        .with(fmt::layer().with_thread_names(true).with_test_writer())
        .try_init()
        .is_ok()
}
