//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! Los handlers reciben un `&mut Response` que empieza en `200 OK`, sin
//! headers y sin body, y lo van modificando. El worker lo serializa una
//! sola vez con [`Response::to_bytes`].
//!
//! ## Formato serializado
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 15\r\n
//! \r\n
//! {"status":"ok"}
//! ```
//!
//! ## Ejemplo de uso
//!
//! ```
//! use ternic_server::http::{Response, StatusCode};
//!
//! let mut response = Response::new();
//! response.set_status(StatusCode::OK);
//! response.set_header("Content-Type", "application/json");
//! response.set_body(r#"{"status":"ok"}"#);
//!
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 200 OK\r\n"));
//! ```

use super::StatusCode;

/// Representa una respuesta HTTP completa
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// Código de estado HTTP (200 por defecto)
    status: StatusCode,

    /// Headers en orden de inserción; un nombre aparece una sola vez
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta; `None` si nunca se asignó
    body: Option<Vec<u8>>,
}

impl Response {
    /// Crea una respuesta `200 OK` vacía
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Crea una respuesta vacía con el código indicado
    pub fn with_status(status: StatusCode) -> Self {
        Self {
            status,
            ..Self::new()
        }
    }

    /// Cambia el código de estado
    pub fn set_status(&mut self, status: impl Into<StatusCode>) {
        self.status = status.into();
    }

    /// Agrega un header o sobrescribe el valor si el nombre ya existe
    ///
    /// La comparación de nombres no distingue mayúsculas; se conserva el
    /// nombre original y su posición.
    ///
    /// # Ejemplo
    /// ```
    /// use ternic_server::http::Response;
    ///
    /// let mut response = Response::new();
    /// response.set_header("Content-Type", "text/plain");
    /// response.set_header("content-type", "text/html");
    ///
    /// assert_eq!(response.headers().len(), 1);
    /// assert_eq!(response.header("CONTENT-TYPE"), Some("text/html"));
    /// ```
    pub fn set_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, existing_value)) => *existing_value = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Reemplaza el body anterior (si había)
    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = Some(body.into());
    }

    /// Versión builder de [`Response::set_header`]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// Versión builder de [`Response::set_body`]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.set_body(body);
        self
    }

    /// Respuesta de texto plano
    pub fn text(status: StatusCode, body: &str) -> Self {
        Self::with_status(status)
            .with_header("Content-Type", "text/plain")
            .with_body(body)
    }

    /// Respuesta HTML
    pub fn html(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(status)
            .with_header("Content-Type", "text/html")
            .with_body(body)
    }

    /// Respuesta JSON con un body ya serializado
    pub fn json(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self::with_status(status)
            .with_header("Content-Type", "application/json")
            .with_body(body)
    }

    /// Respuesta de error con formato `{"error":"mensaje"}`
    ///
    /// # Ejemplo
    /// ```
    /// use ternic_server::http::{Response, StatusCode};
    ///
    /// let response = Response::error(StatusCode::UNAUTHORIZED, "Authorization header required");
    /// assert_eq!(response.body(), br#"{"error":"Authorization header required"}"#);
    /// ```
    pub fn error(status: StatusCode, message: &str) -> Self {
        let body = serde_json::json!({ "error": message }).to_string();
        Self::json(status, body)
    }

    /// Convierte la respuesta a bytes listos para enviar por el socket
    ///
    /// - Status line: `HTTP/1.1 200 OK\r\n`
    /// - Headers: `Name: Value\r\n`
    /// - `Content-Length` calculado si hay body
    /// - Línea vacía: `\r\n`
    /// - Body sin modificar
    ///
    /// Si hay body, un `Content-Length` puesto a mano se reemplaza por el
    /// calculado. El buffer crece lo necesario; nunca se trunca.
    pub fn to_bytes(&self) -> Vec<u8> {
        let body_len = self.body.as_ref().map_or(0, Vec::len);
        let mut result = Vec::with_capacity(256 + body_len);

        // 1. Status line
        let status_line = format!(
            "HTTP/1.1 {} {}\r\n",
            self.status.as_u16(),
            self.status.reason_phrase()
        );
        result.extend_from_slice(status_line.as_bytes());

        // 2. Headers
        for (name, value) in &self.headers {
            if self.body.is_some() && name.eq_ignore_ascii_case("Content-Length") {
                continue;
            }
            let header_line = format!("{}: {}\r\n", name, value);
            result.extend_from_slice(header_line.as_bytes());
        }

        // 3. Content-Length
        if let Some(body) = &self.body {
            let header_line = format!("Content-Length: {}\r\n", body.len());
            result.extend_from_slice(header_line.as_bytes());
        }

        // 4. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        // 5. Body
        if let Some(body) = &self.body {
            result.extend_from_slice(body);
        }

        result
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene los headers en orden
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Obtiene un header (el nombre no distingue mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        super::request::find_header(&self.headers, name)
    }

    /// Obtiene el body (vacío si no hay)
    pub fn body(&self) -> &[u8] {
        self.body.as_deref().unwrap_or_default()
    }

    /// Indica si se asignó un body
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Largo del body en bytes
    pub fn body_len(&self) -> usize {
        self.body().len()
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn as_text(response: &Response) -> String {
        String::from_utf8(response.to_bytes()).unwrap()
    }

    #[test]
    fn test_new_response() {
        let response = Response::new();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().is_empty());
        assert!(!response.has_body());
        assert_eq!(response.body_len(), 0);
    }

    #[test]
    fn test_set_header_overwrites_case_insensitively() {
        let mut response = Response::new();
        response.set_header("Content-Type", "text/plain");
        response.set_header("X-Custom", "a");
        response.set_header("content-type", "application/json");

        assert_eq!(response.headers().len(), 2);
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.headers()[0].0, "Content-Type");
    }

    #[test]
    fn test_set_body_replaces_previous() {
        let mut response = Response::new();
        response.set_body("first body");
        response.set_body("second");

        assert_eq!(response.body(), b"second");
        assert_eq!(response.body_len(), 6);
    }

    #[test]
    fn test_synthesized_content_length() {
        let response = Response::new().with_body("hello");
        let text = as_text(&response);

        assert!(text.contains("Content-Length: 5\r\n"));
        assert!(text.ends_with("\r\n\r\nhello"));
    }

    #[test]
    fn test_manual_content_length_is_replaced() {
        let response = Response::new()
            .with_header("Content-Length", "999")
            .with_body("abc");
        let text = as_text(&response);

        assert_eq!(text.matches("Content-Length").count(), 1);
        assert!(text.contains("Content-Length: 3\r\n"));
    }

    #[test]
    fn test_no_body_no_content_length() {
        let response = Response::with_status(StatusCode::NO_CONTENT);
        let text = as_text(&response);

        assert_eq!(text, "HTTP/1.1 204 No Content\r\n\r\n");
    }

    #[test]
    fn test_unknown_status_serializes_as_unknown() {
        let mut response = Response::new();
        response.set_status(StatusCode::from_u16(299));
        assert!(as_text(&response).starts_with("HTTP/1.1 299 Unknown\r\n"));
    }

    #[test]
    fn test_headers_serialized_in_order() {
        let response = Response::new()
            .with_header("B", "2")
            .with_header("A", "1")
            .with_body("x");
        let text = as_text(&response);

        let b = text.find("B: 2").unwrap();
        let a = text.find("A: 1").unwrap();
        let cl = text.find("Content-Length").unwrap();
        assert!(b < a && a < cl);
    }

    #[test]
    fn test_large_body_is_not_truncated() {
        let body = vec![b'z'; 1 << 20];
        let response = Response::new().with_body(body.clone());
        let bytes = response.to_bytes();

        assert!(bytes.ends_with(&body));
        let text = String::from_utf8_lossy(&bytes[..200]);
        assert!(text.contains("Content-Length: 1048576\r\n"));
    }

    #[test]
    fn test_error_response_escapes_message() {
        let response = Response::error(StatusCode::BAD_REQUEST, "bad \"input\"");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(response.header("Content-Type"), Some("application/json"));
        assert_eq!(response.body(), br#"{"error":"bad \"input\""}"#);
    }

    #[test]
    fn test_status_json_example() {
        let response = Response::json(StatusCode::OK, r#"{"status":"ok"}"#);
        let text = as_text(&response);

        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 15\r\n"));
        assert!(text.ends_with(r#"{"status":"ok"}"#));
    }
}
