//! # Archivos Estáticos
//! src/router/static_files.rs
//!
//! Sirve un archivo completo desde disco. El router ya resolvió el path
//! candidato (`raíz/relativo`); aquí se aplican las reglas:
//!
//! - Un path con `..` se rechaza con 400 sin tocar el disco.
//! - Archivo inexistente: 404.
//! - Archivo más grande que el límite o error de lectura: 500.
//! - Si todo va bien: 200 con el contenido y un `Content-Type` según la
//!   extensión.

use crate::http::{Response, StatusCode};
use std::fs;
use std::io;
use std::path::Path;
use tracing::{error, info, warn};

/// Tamaño máximo de archivo que se carga en memoria
pub const DEFAULT_MAX_FILE_BYTES: u64 = 65536;

/// Tipo MIME según la extensión
///
/// # Ejemplo
/// ```
/// use ternic_server::router::static_files::content_type_for;
///
/// assert_eq!(content_type_for("static/index.html"), "text/html");
/// assert_eq!(content_type_for("static/app.js"), "application/javascript");
/// assert_eq!(content_type_for("static/logo.png"), "application/octet-stream");
/// ```
pub fn content_type_for(path: &str) -> &'static str {
    let extension = Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match extension.as_str() {
        "html" | "htm" => "text/html",
        "css" => "text/css",
        "js" => "application/javascript",
        "json" => "application/json",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
}

/// Construye la respuesta para el archivo en `file_path`
pub fn serve_file(file_path: &str, max_bytes: u64) -> Response {
    if file_path.contains("..") {
        warn!(path = file_path, "intento de directory traversal bloqueado");
        return Response::text(StatusCode::BAD_REQUEST, "Bad Request");
    }

    let metadata = match fs::metadata(file_path) {
        Ok(metadata) if metadata.is_file() => metadata,
        Ok(_) => {
            warn!(path = file_path, "el path estático no es un archivo");
            return Response::text(StatusCode::NOT_FOUND, "File Not Found");
        }
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!(path = file_path, "archivo estático no encontrado");
            return Response::text(StatusCode::NOT_FOUND, "File Not Found");
        }
        Err(e) => {
            error!(path = file_path, error = %e, "no se pudo leer el archivo estático");
            return internal_error();
        }
    };

    if metadata.len() > max_bytes {
        error!(
            path = file_path,
            size = metadata.len(),
            max = max_bytes,
            "archivo estático demasiado grande"
        );
        return internal_error();
    }

    let content = match fs::read(file_path) {
        Ok(content) => content,
        Err(e) => {
            error!(path = file_path, error = %e, "no se pudo leer el archivo estático");
            return internal_error();
        }
    };

    // El archivo pudo crecer entre metadata() y read()
    if content.len() as u64 > max_bytes {
        error!(path = file_path, "archivo estático demasiado grande");
        return internal_error();
    }

    info!(path = file_path, bytes = content.len(), "archivo estático servido");
    Response::with_status(StatusCode::OK)
        .with_header("Content-Type", content_type_for(file_path))
        .with_body(content)
}

fn internal_error() -> Response {
    Response::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path_str(path: &Path) -> String {
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for("a.html"), "text/html");
        assert_eq!(content_type_for("a.htm"), "text/html");
        assert_eq!(content_type_for("a.css"), "text/css");
        assert_eq!(content_type_for("a.json"), "application/json");
        assert_eq!(content_type_for("a.txt"), "text/plain");
        assert_eq!(content_type_for("a.HTML"), "text/html");
        assert_eq!(content_type_for("Makefile"), "application/octet-stream");
    }

    #[test]
    fn test_serves_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("style.css");
        fs::write(&file, "body { color: red; }").unwrap();

        let response = serve_file(&path_str(&file), DEFAULT_MAX_FILE_BYTES);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.header("Content-Type"), Some("text/css"));
        assert_eq!(response.body(), b"body { color: red; }");
    }

    #[test]
    fn test_binary_file_is_served_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("blob.bin");
        let bytes = vec![0u8, 1, 2, 0, 255];
        fs::write(&file, &bytes).unwrap();

        let response = serve_file(&path_str(&file), DEFAULT_MAX_FILE_BYTES);
        assert_eq!(response.body(), &bytes[..]);
        assert_eq!(response.header("Content-Type"), Some("application/octet-stream"));
    }

    #[test]
    fn test_traversal_rejected() {
        let response = serve_file("static/../Cargo.toml", DEFAULT_MAX_FILE_BYTES);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let response = serve_file(&path_str(&dir.path().join("nope.txt")), DEFAULT_MAX_FILE_BYTES);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_directory_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let response = serve_file(&path_str(dir.path()), DEFAULT_MAX_FILE_BYTES);
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_oversized_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("big.txt");
        fs::write(&file, vec![b'x'; 200]).unwrap();

        let response = serve_file(&path_str(&file), 100);
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
