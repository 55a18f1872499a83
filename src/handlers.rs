//! # Handlers de la Aplicación
//! src/handlers.rs
//!
//! Rutas que expone el binario:
//!
//! | Método | Path            | Respuesta                                  |
//! |--------|-----------------|--------------------------------------------|
//! | GET    | `/`             | Página de mantenimiento                    |
//! | GET    | `/server`       | Página con información del servidor        |
//! | GET    | `/api/status`   | JSON con el estado                         |
//! | POST   | `/submit`       | Página que muestra el body recibido        |
//! | POST   | `/api/register` | Alta de usuario (form urlencoded)          |
//! | POST   | `/api/login`    | Token de sesión (form urlencoded)          |
//! | POST   | `/api/logout`   | Cierra la sesión del token                 |
//! | GET    | `/api/me`       | Datos del usuario (requiere login)         |
//! | GET    | `/api/admin`    | Estadísticas (requiere rol admin)          |

use crate::auth::{self, AuthContext, AuthError, SESSION_DURATION};
use crate::http::{Request, Response, StatusCode};
use crate::router::{Router, RouterError};
use crate::template::{TemplateContext, TemplateEngine};
use serde_json::json;
use std::sync::Arc;
use tracing::error;

pub const SERVER_NAME: &str = "Ternic Web Server";
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Estado compartido por los handlers
pub struct AppState {
    pub templates: TemplateEngine,
    pub auth: Arc<AuthContext>,
}

impl AppState {
    pub fn new(templates: TemplateEngine, auth: Arc<AuthContext>) -> Self {
        Self { templates, auth }
    }
}

/// Registra todas las rutas de la aplicación en `router`
pub fn register_routes(
    router: &Router,
    state: Arc<AppState>,
    static_prefix: &str,
    static_dir: &str,
) -> Result<(), RouterError> {
    let s = Arc::clone(&state);
    router.add_route("GET", "/", move |req, resp| maintenance_handler(&s, req, resp))?;

    let s = Arc::clone(&state);
    router.add_route("GET", "/server", move |req, resp| server_handler(&s, req, resp))?;

    router.add_route("GET", "/api/status", status_handler)?;

    let s = Arc::clone(&state);
    router.add_route("POST", "/submit", move |req, resp| submit_handler(&s, req, resp))?;

    let s = Arc::clone(&state);
    router.add_route("POST", "/api/register", move |req, resp| register_handler(&s, req, resp))?;

    let s = Arc::clone(&state);
    router.add_route("POST", "/api/login", move |req, resp| login_handler(&s, req, resp))?;

    let s = Arc::clone(&state);
    router.add_route("POST", "/api/logout", move |req, resp| logout_handler(&s, req, resp))?;

    let s = Arc::clone(&state);
    router.add_route("GET", "/api/me", move |req, resp| me_handler(&s, req, resp))?;

    router.add_route("GET", "/api/admin", move |req, resp| admin_handler(&state, req, resp))?;

    router.add_static_route(static_prefix, static_dir)
}

/// Renderiza `name` en la response; si falla, 500
fn render_page(templates: &TemplateEngine, name: &str, ctx: &TemplateContext, resp: &mut Response) {
    match templates.render(name, ctx) {
        Ok(rendered) => {
            resp.set_status(StatusCode::OK);
            resp.set_header("Content-Type", "text/html");
            resp.set_body(rendered);
        }
        Err(e) => {
            error!(template = name, error = %e, "no se pudo renderizar");
            *resp = Response::text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
    }
}

/// Escapa el texto que viene del cliente antes de ponerlo en HTML
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn json_response(resp: &mut Response, status: StatusCode, body: serde_json::Value) {
    *resp = Response::json(status, body.to_string());
}

pub fn maintenance_handler(state: &AppState, _req: &Request, resp: &mut Response) {
    let mut ctx = TemplateContext::new();
    ctx.set("root_title", "Ternic: Maintenance")
        .set("root_message", "Maintenance Mode");
    render_page(&state.templates, "maintenance.html", &ctx, resp);
}

pub fn server_handler(state: &AppState, _req: &Request, resp: &mut Response) {
    let mut ctx = TemplateContext::new();
    ctx.set("title", "Server Information")
        .set("message", "Information about the server running this dashboard.")
        .set("version", SERVER_VERSION);
    render_page(&state.templates, "server.html", &ctx, resp);
}

pub fn status_handler(_req: &Request, resp: &mut Response) {
    json_response(
        resp,
        StatusCode::OK,
        json!({
            "status": "running",
            "server": SERVER_NAME,
            "version": SERVER_VERSION,
        }),
    );
}

pub fn submit_handler(state: &AppState, req: &Request, resp: &mut Response) {
    let data = match req.body_str() {
        Some(body) if !body.is_empty() => escape_html(body),
        Some(_) => "No data received".to_string(),
        None => "(binary data)".to_string(),
    };

    let mut ctx = TemplateContext::new();
    ctx.set("title", "POST Data Received").set("data", &data);
    render_page(&state.templates, "index.html", &ctx, resp);
}

pub fn register_handler(state: &AppState, req: &Request, resp: &mut Response) {
    let (Some(username), Some(email), Some(password)) = (
        req.form_param("username"),
        req.form_param("email"),
        req.form_param("password"),
    ) else {
        *resp = Response::error(StatusCode::BAD_REQUEST, "username, email and password are required");
        return;
    };

    match state.auth.register_user(&username, &email, &password) {
        Ok(id) => json_response(resp, StatusCode::CREATED, json!({ "id": id, "username": username })),
        Err(e @ (AuthError::Io(_) | AuthError::Corrupt(_))) => {
            error!(error = %e, "error interno al registrar");
            *resp = Response::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error");
        }
        Err(e) => *resp = Response::error(StatusCode::BAD_REQUEST, &e.to_string()),
    }
}

pub fn login_handler(state: &AppState, req: &Request, resp: &mut Response) {
    let (Some(username), Some(password)) = (req.form_param("username"), req.form_param("password"))
    else {
        *resp = Response::error(StatusCode::BAD_REQUEST, "username and password are required");
        return;
    };

    let user_id = match state.auth.authenticate_user(&username, &password) {
        Ok(user_id) => user_id,
        Err(_) => {
            *resp = Response::error(StatusCode::UNAUTHORIZED, "Invalid credentials");
            return;
        }
    };

    let client_ip = req.header("X-Forwarded-For");
    match state.auth.create_session(user_id, client_ip) {
        Ok(token) => json_response(
            resp,
            StatusCode::OK,
            json!({
                "token": token,
                "user_id": user_id,
                "expires_in": SESSION_DURATION.as_secs(),
            }),
        ),
        Err(e) => {
            error!(error = %e, "no se pudo crear la sesión");
            *resp = Response::error(StatusCode::SERVICE_UNAVAILABLE, "Too many sessions");
        }
    }
}

pub fn logout_handler(state: &AppState, req: &Request, resp: &mut Response) {
    if auth::require_login(req, resp, &state.auth).is_none() {
        return;
    }

    if let Some(token) = req.header("Authorization").and_then(auth::parse_bearer_token) {
        state.auth.destroy_session(token);
    }
    json_response(resp, StatusCode::OK, json!({ "status": "logged out" }));
}

pub fn me_handler(state: &AppState, req: &Request, resp: &mut Response) {
    let Some(user_id) = auth::require_login(req, resp, &state.auth) else {
        return;
    };
    let Some(user) = state.auth.user_by_id(user_id) else {
        *resp = Response::error(StatusCode::NOT_FOUND, "User not found");
        return;
    };

    json_response(
        resp,
        StatusCode::OK,
        json!({
            "id": user.id,
            "username": user.username,
            "email": user.email,
            "role": user.role.name(),
            "created_at": user.created_at,
            "last_login": user.last_login,
        }),
    );
}

pub fn admin_handler(state: &AppState, req: &Request, resp: &mut Response) {
    if auth::require_admin(req, resp, &state.auth).is_none() {
        return;
    }

    json_response(
        resp,
        StatusCode::OK,
        json!({
            "users": state.auth.user_count(),
            "sessions": state.auth.session_count(),
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        state: AppState,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("index.html"), "<h1>{{title}}</h1><pre>{{data}}</pre>").unwrap();
        fs::write(dir.path().join("server.html"), "<p>{{title}} v{{version}}</p>").unwrap();
        let state = AppState::new(TemplateEngine::new(dir.path()), Arc::new(AuthContext::new()));
        Fixture { _dir: dir, state }
    }

    fn post(path: &str, body: &str) -> Request {
        let raw = format!(
            "POST {} HTTP/1.1\r\nContent-Length: {}\r\n\r\n{}",
            path,
            body.len(),
            body
        );
        Request::parse(raw.as_bytes()).unwrap()
    }

    fn get_with_token(path: &str, token: &str) -> Request {
        let raw = format!("GET {} HTTP/1.1\r\nAuthorization: Bearer {}\r\n\r\n", path, token);
        Request::parse(raw.as_bytes()).unwrap()
    }

    fn body_json(resp: &Response) -> serde_json::Value {
        serde_json::from_slice(resp.body()).unwrap()
    }

    fn login(state: &AppState) -> String {
        let mut resp = Response::new();
        register_handler(
            state,
            &post("/api/register", "username=alice&email=alice%40example.com&password=Wonderland1"),
            &mut resp,
        );
        assert_eq!(resp.status(), StatusCode::CREATED);

        let mut resp = Response::new();
        login_handler(state, &post("/api/login", "username=alice&password=Wonderland1"), &mut resp);
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(&resp)["token"].as_str().unwrap().to_string()
    }

    #[test]
    fn test_status_json() {
        let mut resp = Response::new();
        status_handler(&post("/api/status", ""), &mut resp);

        assert_eq!(resp.header("Content-Type"), Some("application/json"));
        assert_eq!(body_json(&resp)["status"], "running");
    }

    #[test]
    fn test_submit_echoes_escaped_body() {
        let f = fixture();
        let mut resp = Response::new();
        submit_handler(&f.state, &post("/submit", "<b>hi</b>"), &mut resp);

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(
            resp.body(),
            b"<h1>POST Data Received</h1><pre>&lt;b&gt;hi&lt;/b&gt;</pre>"
        );
    }

    #[test]
    fn test_submit_without_body() {
        let f = fixture();
        let mut resp = Response::new();
        submit_handler(&f.state, &post("/submit", ""), &mut resp);
        assert!(String::from_utf8_lossy(resp.body()).contains("No data received"));
    }

    #[test]
    fn test_missing_template_is_500() {
        let f = fixture();
        let mut resp = Response::new();
        maintenance_handler(&f.state, &post("/", ""), &mut resp);

        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(resp.body(), b"Internal Server Error");
    }

    #[test]
    fn test_server_page() {
        let f = fixture();
        let mut resp = Response::new();
        server_handler(&f.state, &post("/server", ""), &mut resp);

        let body = String::from_utf8_lossy(resp.body()).into_owned();
        assert_eq!(body, format!("<p>Server Information v{}</p>", SERVER_VERSION));
    }

    #[test]
    fn test_register_validation_error() {
        let f = fixture();
        let mut resp = Response::new();
        register_handler(
            &f.state,
            &post("/api/register", "username=al&email=a%40b.com&password=Password1"),
            &mut resp,
        );

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(&resp)["error"], "invalid username");
    }

    #[test]
    fn test_register_missing_fields() {
        let f = fixture();
        let mut resp = Response::new();
        register_handler(&f.state, &post("/api/register", "username=alice"), &mut resp);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_login_wrong_password() {
        let f = fixture();
        login(&f.state);

        let mut resp = Response::new();
        login_handler(&f.state, &post("/api/login", "username=alice&password=nope"), &mut resp);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(&resp)["error"], "Invalid credentials");
    }

    #[test]
    fn test_me_with_token() {
        let f = fixture();
        let token = login(&f.state);

        let mut resp = Response::new();
        me_handler(&f.state, &get_with_token("/api/me", &token), &mut resp);

        let json = body_json(&resp);
        assert_eq!(json["username"], "alice");
        assert_eq!(json["email"], "alice@example.com");
        assert_eq!(json["role"], "user");
    }

    #[test]
    fn test_logout_invalidates_token() {
        let f = fixture();
        let token = login(&f.state);

        let mut resp = Response::new();
        logout_handler(&f.state, &get_with_token("/api/logout", &token), &mut resp);
        assert_eq!(resp.status(), StatusCode::OK);

        let mut resp = Response::new();
        me_handler(&f.state, &get_with_token("/api/me", &token), &mut resp);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_admin_requires_role() {
        let f = fixture();
        let token = login(&f.state);

        let mut resp = Response::new();
        admin_handler(&f.state, &get_with_token("/api/admin", &token), &mut resp);
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);

        let id = f.state.auth.user_by_username("alice").unwrap().id;
        f.state.auth.set_role(id, Role::Admin);

        let mut resp = Response::new();
        admin_handler(&f.state, &get_with_token("/api/admin", &token), &mut resp);
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(&resp)["users"], 1);
    }

    #[test]
    fn test_register_routes() {
        let f = fixture();
        let router = Router::new();
        register_routes(&router, Arc::new(f.state), "/static", "static").unwrap();

        assert_eq!(router.route_count(), 9);
        assert_eq!(router.static_routes().len(), 1);
    }
}
