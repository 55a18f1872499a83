//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! El servidor reconoce un conjunto fijo de códigos. Cualquier otro valor
//! se puede usar igual, pero su reason phrase se serializa como `Unknown`.
//!
//! - **2xx**: Éxito (200, 201, 204)
//! - **4xx**: Error del cliente (400, 401, 403, 404, 405)
//! - **5xx**: Error del servidor (500, 503)

/// Código de estado de una respuesta
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(u16);

impl StatusCode {
    /// 200 OK - La petición fue exitosa
    pub const OK: StatusCode = StatusCode(200);

    /// 201 Created - Recurso creado (ej: registro de usuario)
    pub const CREATED: StatusCode = StatusCode(201);

    /// 204 No Content - Petición exitosa sin contenido en el body
    pub const NO_CONTENT: StatusCode = StatusCode(204);

    /// 400 Bad Request - Request malformado o path rechazado
    pub const BAD_REQUEST: StatusCode = StatusCode(400);

    /// 401 Unauthorized - Falta sesión válida
    pub const UNAUTHORIZED: StatusCode = StatusCode(401);

    /// 403 Forbidden - Sesión válida pero sin permisos
    pub const FORBIDDEN: StatusCode = StatusCode(403);

    /// 404 Not Found - Ruta o archivo no encontrado
    pub const NOT_FOUND: StatusCode = StatusCode(404);

    /// 405 Method Not Allowed
    pub const METHOD_NOT_ALLOWED: StatusCode = StatusCode(405);

    /// 500 Internal Server Error - Error interno del servidor
    pub const INTERNAL_SERVER_ERROR: StatusCode = StatusCode(500);

    /// 503 Service Unavailable - Límite de conexiones alcanzado
    pub const SERVICE_UNAVAILABLE: StatusCode = StatusCode(503);

    /// Crea un código a partir de su valor numérico (reconocido o no)
    pub const fn from_u16(code: u16) -> Self {
        StatusCode(code)
    }

    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use ternic_server::http::StatusCode;
    /// assert_eq!(StatusCode::OK.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        self.0
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use ternic_server::http::StatusCode;
    /// assert_eq!(StatusCode::NOT_FOUND.reason_phrase(), "Not Found");
    /// assert_eq!(StatusCode::from_u16(418).reason_phrase(), "Unknown");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self.0 {
            200 => "OK",
            201 => "Created",
            204 => "No Content",
            400 => "Bad Request",
            401 => "Unauthorized",
            403 => "Forbidden",
            404 => "Not Found",
            405 => "Method Not Allowed",
            500 => "Internal Server Error",
            503 => "Service Unavailable",
            _ => "Unknown",
        }
    }

    /// Verifica si el código indica éxito (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.0)
    }

    /// Verifica si el código indica error del cliente (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.0)
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.0)
    }
}

impl Default for StatusCode {
    fn default() -> Self {
        StatusCode::OK
    }
}

impl From<u16> for StatusCode {
    fn from(code: u16) -> Self {
        StatusCode(code)
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.0, self.reason_phrase())
    }
}
