//! # Parsing de Requests HTTP/1.1
//! src/http/request.rs
//!
//! Este módulo convierte los bytes crudos que entrega el lector
//! (`http::reader`) en un [`Request`] estructurado.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /submit HTTP/1.1\r\n
//! Host: localhost:5000\r\n
//! Content-Length: 11\r\n
//! \r\n
//! hello=world
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD /path VERSION`
//! 2. **Headers**: Pares `Name: Value` (uno por línea, en orden de llegada)
//! 3. **Empty Line**: `\r\n\r\n` separa headers del body
//! 4. **Body**: `Content-Length` bytes, o todo lo que llegó si no hay header

use thiserror::Error;

/// Línea vacía que termina la sección de headers
pub const HEADER_TERMINATOR: &[u8] = b"\r\n\r\n";

/// Máximo de headers que se guardan; los demás se descartan
pub const MAX_HEADERS: usize = 50;

/// Longitudes máximas de los tokens de la request line
pub const MAX_METHOD_LEN: usize = 15;
pub const MAX_PATH_LEN: usize = 1023;
pub const MAX_VERSION_LEN: usize = 15;

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Request vacío
    #[error("Empty request")]
    EmptyRequest,

    /// No apareció la línea vacía que cierra los headers
    #[error("Malformed request: no header terminator")]
    MissingTerminator,

    /// La request line no tiene METHOD PATH VERSION
    #[error("Invalid request line format")]
    InvalidRequestLine,

    /// Un token de la request line supera su límite
    #[error("Request line {0} too long")]
    TokenTooLong(&'static str),

    /// La sección de headers no es UTF-8
    #[error("Header section is not valid UTF-8")]
    InvalidEncoding,

    /// `Content-Length` no es un entero decimal
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),
}

/// Representa un request HTTP parseado
///
/// Se crea una vez por conexión y no se modifica después del parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Método HTTP tal como llegó (ej: "GET")
    method: String,

    /// Path de la petición, sin normalizar (ej: "/api/status")
    path: String,

    /// Versión HTTP (ej: "HTTP/1.1")
    version: String,

    /// Headers en orden de llegada
    headers: Vec<(String, String)>,

    /// Body del request
    body: Vec<u8>,
}

impl Request {
    /// Parsea un request completo usando el límite de headers por defecto
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use ternic_server::http::Request;
    ///
    /// let raw = b"GET /api/status HTTP/1.1\r\nHost: x\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), "GET");
    /// assert_eq!(request.path(), "/api/status");
    /// assert_eq!(request.header("host"), Some("x"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        Self::parse_with_limit(buffer, MAX_HEADERS)
    }

    /// Parsea un request guardando como mucho `max_headers` headers
    pub fn parse_with_limit(buffer: &[u8], max_headers: usize) -> Result<Self, ParseError> {
        if buffer.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::EmptyRequest);
        }

        let head_end = find_header_end(buffer).ok_or(ParseError::MissingTerminator)?;
        let head = std::str::from_utf8(&buffer[..head_end])
            .map_err(|_| ParseError::InvalidEncoding)?;

        let mut lines = head.split("\r\n");

        // 1. Request line
        let request_line = lines.next().ok_or(ParseError::InvalidRequestLine)?;
        let (method, path, version) = Self::parse_request_line(request_line)?;

        // 2. Headers
        let headers = Self::parse_headers(lines, max_headers);

        // 3. Body
        let rest = &buffer[head_end + HEADER_TERMINATOR.len()..];
        let body = match find_header(&headers, "Content-Length") {
            Some(value) => {
                let declared = parse_content_length(value)?;
                rest[..declared.min(rest.len())].to_vec()
            }
            None => rest.to_vec(),
        };

        Ok(Request {
            method,
            path,
            version,
            headers,
            body,
        })
    }

    /// Formato: `GET /path HTTP/1.1`
    ///
    /// Los tokens después del tercero se ignoran.
    fn parse_request_line(line: &str) -> Result<(String, String, String), ParseError> {
        let mut parts = line.split(' ').filter(|part| !part.is_empty());

        let (Some(method), Some(path), Some(version)) = (parts.next(), parts.next(), parts.next())
        else {
            return Err(ParseError::InvalidRequestLine);
        };

        if method.len() > MAX_METHOD_LEN {
            return Err(ParseError::TokenTooLong("method"));
        }
        if path.len() > MAX_PATH_LEN {
            return Err(ParseError::TokenTooLong("path"));
        }
        if version.len() > MAX_VERSION_LEN {
            return Err(ParseError::TokenTooLong("version"));
        }

        Ok((method.to_string(), path.to_string(), version.to_string()))
    }

    /// Cada header tiene formato "Name: Value"; las líneas sin ':' se ignoran
    fn parse_headers<'a>(
        lines: impl Iterator<Item = &'a str>,
        max_headers: usize,
    ) -> Vec<(String, String)> {
        let mut headers = Vec::new();

        for line in lines {
            if line.trim().is_empty() {
                break;
            }
            if headers.len() >= max_headers {
                break;
            }
            if let Some((name, value)) = line.split_once(':') {
                headers.push((name.trim().to_string(), value.trim().to_string()));
            }
        }

        headers
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Obtiene el path del request
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Obtiene todos los headers en orden de llegada
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Obtiene un header específico (el nombre no distingue mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Obtiene el body del request
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Cantidad de bytes del body capturados
    pub fn body_len(&self) -> usize {
        self.body.len()
    }

    /// Obtiene el body como texto, si es UTF-8
    pub fn body_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.body).ok()
    }

    /// Interpreta el body como `application/x-www-form-urlencoded`
    ///
    /// # Ejemplo
    /// ```
    /// use ternic_server::http::Request;
    ///
    /// let raw = b"POST /api/login HTTP/1.1\r\nContent-Length: 25\r\n\r\nusername=ana&password=a+b";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.form_param("username").as_deref(), Some("ana"));
    /// assert_eq!(request.form_param("password").as_deref(), Some("a b"));
    /// ```
    pub fn form_params(&self) -> Vec<(String, String)> {
        let body = String::from_utf8_lossy(&self.body);
        parse_form(&body)
    }

    /// Obtiene un campo del formulario en el body
    pub fn form_param(&self, name: &str) -> Option<String> {
        self.form_params()
            .into_iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }
}

/// Busca la posición donde empieza `\r\n\r\n`
pub fn find_header_end(buffer: &[u8]) -> Option<usize> {
    buffer
        .windows(HEADER_TERMINATOR.len())
        .position(|window| window == HEADER_TERMINATOR)
}

/// Busca el `Content-Length` declarado en una sección de headers cruda
///
/// Lo usa el lector para saber cuántos bytes más esperar antes de que
/// exista un [`Request`].
pub fn declared_content_length(head: &[u8]) -> Result<Option<usize>, ParseError> {
    let head = String::from_utf8_lossy(head);

    for line in head.split("\r\n").skip(1) {
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("Content-Length") {
                return parse_content_length(value).map(Some);
            }
        }
    }

    Ok(None)
}

fn parse_content_length(value: &str) -> Result<usize, ParseError> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| ParseError::InvalidContentLength(value.trim().to_string()))
}

/// Búsqueda lineal sin distinguir mayúsculas; gana la primera coincidencia
pub(crate) fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(header, _)| header.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

/// Parsea `key=value&key2=value2` decodificando cada parte
pub fn parse_form(input: &str) -> Vec<(String, String)> {
    input
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (url_decode(key), url_decode(value)),
            // Parámetro sin valor (ej: "debug")
            None => (url_decode(pair), String::new()),
        })
        .collect()
}

/// Decodifica `%XX` y convierte `+` en espacio
///
/// Una secuencia `%` inválida se copia tal cual.
pub fn url_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'%' if i + 2 < bytes.len() => match (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                (Some(high), Some(low)) => {
                    decoded.push((high << 4) | low);
                    i += 3;
                }
                _ => {
                    decoded.push(b'%');
                    i += 1;
                }
            },
            b'+' => {
                decoded.push(b' ');
                i += 1;
            }
            other => {
                decoded.push(other);
                i += 1;
            }
        }
    }

    String::from_utf8_lossy(&decoded).into_owned()
}

/// Valor de un dígito hexadecimal; `from_str_radix` aceptaría signos
fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}
