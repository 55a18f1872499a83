//! # Middleware de Autenticación
//! src/auth/middleware.rs
//!
//! Se llama al principio de un handler protegido. Si falla, la response ya
//! quedó con el error JSON y el handler solo tiene que retornar:
//!
//! ```
//! use ternic_server::auth::{require_login, AuthContext};
//! use ternic_server::http::{Request, Response, StatusCode};
//!
//! let auth = AuthContext::new();
//! let request = Request::parse(b"GET /api/me HTTP/1.1\r\n\r\n").unwrap();
//! let mut response = Response::new();
//!
//! assert_eq!(require_login(&request, &mut response, &auth), None);
//! assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
//! ```

use super::{AuthContext, Role};
use crate::http::{Request, Response, StatusCode};

const BEARER_PREFIX: &str = "Bearer ";

/// Extrae el token de un header `Authorization: Bearer <token>`
pub fn parse_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix(BEARER_PREFIX)
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

fn reject(response: &mut Response, status: StatusCode, message: &str) {
    *response = Response::error(status, message);
}

/// Exige una sesión válida; retorna el id del usuario
pub fn require_login(request: &Request, response: &mut Response, auth: &AuthContext) -> Option<u32> {
    let Some(header) = request.header("Authorization") else {
        reject(response, StatusCode::UNAUTHORIZED, "Authorization header required");
        return None;
    };

    let Some(token) = parse_bearer_token(header) else {
        reject(response, StatusCode::UNAUTHORIZED, "Invalid authorization format");
        return None;
    };

    match auth.validate_session(token) {
        Some(session) => Some(session.user_id),
        None => {
            reject(response, StatusCode::UNAUTHORIZED, "Invalid or expired session");
            None
        }
    }
}

/// Como [`require_login`] pero además exige rol de administrador
pub fn require_admin(request: &Request, response: &mut Response, auth: &AuthContext) -> Option<u32> {
    let user_id = require_login(request, response, auth)?;

    match auth.user_by_id(user_id) {
        Some(user) if user.role == Role::Admin => Some(user_id),
        _ => {
            reject(response, StatusCode::FORBIDDEN, "Admin access required");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request_with_auth(value: Option<&str>) -> Request {
        let raw = match value {
            Some(value) => format!("GET /api/me HTTP/1.1\r\nAuthorization: {}\r\n\r\n", value),
            None => "GET /api/me HTTP/1.1\r\n\r\n".to_string(),
        };
        Request::parse(raw.as_bytes()).unwrap()
    }

    fn logged_in() -> (AuthContext, u32, String) {
        let auth = AuthContext::new();
        let id = auth.register_user("alice", "a@example.com", "Password1").unwrap();
        let token = auth.create_session(id, None).unwrap();
        (auth, id, token)
    }

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer_token("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_bearer_token("Basic abc123"), None);
        assert_eq!(parse_bearer_token("Bearer "), None);
        assert_eq!(parse_bearer_token("bearer abc"), None);
    }

    #[test]
    fn test_missing_header() {
        let (auth, _, _) = logged_in();
        let mut response = Response::new();

        assert_eq!(require_login(&request_with_auth(None), &mut response, &auth), None);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.body(), br#"{"error":"Authorization header required"}"#);
    }

    #[test]
    fn test_wrong_scheme() {
        let (auth, _, token) = logged_in();
        let mut response = Response::new();
        let request = request_with_auth(Some(&format!("Token {}", token)));

        assert_eq!(require_login(&request, &mut response, &auth), None);
        assert_eq!(response.body(), br#"{"error":"Invalid authorization format"}"#);
    }

    #[test]
    fn test_invalid_token() {
        let (auth, _, _) = logged_in();
        let mut response = Response::new();
        let request = request_with_auth(Some("Bearer nope"));

        assert_eq!(require_login(&request, &mut response, &auth), None);
        assert_eq!(response.body(), br#"{"error":"Invalid or expired session"}"#);
    }

    #[test]
    fn test_valid_session_leaves_response_untouched() {
        let (auth, id, token) = logged_in();
        let mut response = Response::new();
        let request = request_with_auth(Some(&format!("Bearer {}", token)));

        assert_eq!(require_login(&request, &mut response, &auth), Some(id));
        assert_eq!(response, Response::new());
    }

    #[test]
    fn test_admin_required() {
        let (auth, id, token) = logged_in();
        let request = request_with_auth(Some(&format!("Bearer {}", token)));

        let mut response = Response::new();
        assert_eq!(require_admin(&request, &mut response, &auth), None);
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(response.body(), br#"{"error":"Admin access required"}"#);

        auth.set_role(id, Role::Admin);
        let mut response = Response::new();
        assert_eq!(require_admin(&request, &mut response, &auth), Some(id));
        assert_eq!(response.status(), StatusCode::OK);
    }
}
