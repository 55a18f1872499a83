//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Tabla de rutas compartida por todos los workers.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → Router → { Handler | Archivo estático | 404 } → Response
//! ```
//!
//! 1. Rutas dinámicas, en orden de registro: gana la primera con el mismo
//!    método y exactamente el mismo path.
//! 2. Rutas estáticas, en orden de registro: gana la primera cuyo prefijo
//!    sea prefijo literal del path.
//! 3. Si nada coincide, 404.
//!
//! La tabla vive detrás de un `RwLock`. El lock solo se toma para recorrer
//! o agregar entradas; el handler se ejecuta con el lock ya liberado, así
//! un handler puede registrar rutas o despachar otro request.

pub mod static_files;

use crate::http::{Request, Response, StatusCode};
use crate::template::{TemplateContext, TemplateEngine};
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;
use tracing::{info, warn};

pub use static_files::DEFAULT_MAX_FILE_BYTES;

/// Tipo de función handler
///
/// Recibe el request parseado y modifica la response (que empieza en 200).
pub type Handler = Arc<dyn Fn(&Request, &mut Response) + Send + Sync>;

/// Errores al registrar rutas
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouterError {
    #[error("out of memory while adding route {0}")]
    OutOfMemory(String),
}

/// Ruta dinámica: método + path exacto
#[derive(Clone)]
struct Route {
    method: String,
    path: String,
    handler: Handler,
}

/// Ruta estática: prefijo de URL → directorio en disco
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRoute {
    pub url_prefix: String,
    pub root: String,
}

#[derive(Default)]
struct RouteTable {
    routes: Vec<Route>,
    static_routes: Vec<StaticRoute>,
}

/// Resultado de recorrer la tabla, ya sin el lock
enum Target {
    Handler(Handler),
    StaticFile(String),
    NotFound,
}

impl RouteTable {
    fn resolve(&self, request: &Request) -> Target {
        let route = self
            .routes
            .iter()
            .find(|route| route.method == request.method() && route.path == request.path());
        if let Some(route) = route {
            return Target::Handler(Arc::clone(&route.handler));
        }

        for static_route in &self.static_routes {
            if let Some(relative) = request.path().strip_prefix(static_route.url_prefix.as_str()) {
                let relative = relative.strip_prefix('/').unwrap_or(relative);
                return Target::StaticFile(format!("{}/{}", static_route.root, relative));
            }
        }

        Target::NotFound
    }
}

/// Router que mapea requests a handlers o archivos
pub struct Router {
    table: RwLock<RouteTable>,
    templates: TemplateEngine,
    max_file_bytes: u64,
}

impl Router {
    /// Crea un router vacío que busca templates en `./templates`
    pub fn new() -> Self {
        Self::with_templates(TemplateEngine::new("templates"))
    }

    /// Crea un router vacío con el motor de templates indicado
    pub fn with_templates(templates: TemplateEngine) -> Self {
        Self {
            table: RwLock::new(RouteTable::default()),
            templates,
            max_file_bytes: DEFAULT_MAX_FILE_BYTES,
        }
    }

    /// Cambia el tamaño máximo de archivo estático
    pub fn max_file_bytes(mut self, max_file_bytes: u64) -> Self {
        self.max_file_bytes = max_file_bytes;
        self
    }

    /// Motor de templates usado por el responder 404
    pub fn templates(&self) -> &TemplateEngine {
        &self.templates
    }

    /// Registra una ruta con su handler
    ///
    /// # Ejemplo
    /// ```
    /// use ternic_server::router::Router;
    /// use ternic_server::http::{Request, Response};
    ///
    /// let router = Router::new();
    /// router
    ///     .add_route("GET", "/hello", |_req: &Request, resp: &mut Response| {
    ///         resp.set_body("hello");
    ///     })
    ///     .unwrap();
    ///
    /// let request = Request::parse(b"GET /hello HTTP/1.1\r\n\r\n").unwrap();
    /// assert_eq!(router.dispatch(&request).body(), b"hello");
    /// ```
    pub fn add_route<F>(&self, method: &str, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        let route = Route {
            method: method.to_string(),
            path: path.to_string(),
            handler: Arc::new(handler),
        };

        {
            let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
            table
                .routes
                .try_reserve(1)
                .map_err(|_| RouterError::OutOfMemory(format!("{} {}", method, path)))?;
            table.routes.push(route);
        }

        info!(method, path, "ruta agregada");
        Ok(())
    }

    /// Registra un directorio para servir archivos bajo `url_prefix`
    pub fn add_static_route(&self, url_prefix: &str, root: &str) -> Result<(), RouterError> {
        let static_route = StaticRoute {
            url_prefix: url_prefix.to_string(),
            root: root.to_string(),
        };

        {
            let mut table = self.table.write().unwrap_or_else(PoisonError::into_inner);
            table
                .static_routes
                .try_reserve(1)
                .map_err(|_| RouterError::OutOfMemory(url_prefix.to_string()))?;
            table.static_routes.push(static_route);
        }

        info!(url_prefix, root, "ruta estática agregada");
        Ok(())
    }

    /// Cantidad de rutas dinámicas registradas
    pub fn route_count(&self) -> usize {
        self.table.read().unwrap_or_else(PoisonError::into_inner).routes.len()
    }

    /// Rutas estáticas registradas, en orden
    pub fn static_routes(&self) -> Vec<StaticRoute> {
        self.table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .static_routes
            .clone()
    }

    /// Encuentra y ejecuta el responder apropiado para un request
    pub fn dispatch(&self, request: &Request) -> Response {
        let target = self
            .table
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .resolve(request);

        match target {
            Target::Handler(handler) => {
                let mut response = Response::new();
                handler(request, &mut response);
                response
            }
            Target::StaticFile(path) => static_files::serve_file(&path, self.max_file_bytes),
            Target::NotFound => self.not_found(request),
        }
    }

    /// Responder 404: página `error.html` o texto plano si no se puede renderizar
    pub fn not_found(&self, request: &Request) -> Response {
        warn!(method = request.method(), path = request.path(), "404 Not Found");

        let mut ctx = TemplateContext::new();
        ctx.set("title", "Page Not Found")
            .set("message", "The requested page could not be found.")
            .set("error_code", "404");

        match self.templates.render("error.html", &ctx) {
            Ok(rendered) => Response::html(StatusCode::NOT_FOUND, rendered),
            Err(e) => {
                warn!(error = %e, "no se pudo renderizar la página 404");
                Response::text(StatusCode::NOT_FOUND, "404 Not Found")
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}
