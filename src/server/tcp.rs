//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Un thread por conexión. El acceptor nunca espera a los workers; cada
//! worker hace Reader → Parser → Router → Response → write y cierra.
//!
//! ## Parada
//!
//! `stop()` baja el flag `running` y abre una conexión local contra el
//! listener para que el `accept` bloqueado retorne. El ciclo ve el flag
//! en falso, sale y el listener se cierra al salir de `serve`. Las
//! conexiones ya aceptadas terminan normalmente. Un `stop()` anterior a
//! `bind`/`serve` queda registrado y `serve` retorna sin aceptar nada.
//!
//! ## Cierre de conexiones
//!
//! Toda response termina igual: `write`, `shutdown(Write)` y drenado del
//! resto que el cliente haya enviado (con tope de bytes y de tiempo).
//! Cerrar con datos sin leer en el buffer de recepción hace que el kernel
//! mande RST y el cliente pierda la response.

use crate::config::Config;
use crate::error::ServerError;
use crate::http::{read_request, ReadError, Request, Response, StatusCode};
use crate::router::{Router, RouterError};
use crate::template::TemplateEngine;
use std::io::{self, Read, Write};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, info_span, warn};

const WAKE_TIMEOUT: Duration = Duration::from_secs(1);
/// Tiempo máximo esperando que el cliente cierre tras la response
const LINGER_TIMEOUT: Duration = Duration::from_secs(2);
/// Bytes máximos descartados al cerrar una conexión
const DRAIN_LIMIT: usize = 1024 * 1024;
const DRAIN_CHUNK: usize = 4096;

/// Servidor HTTP/1.1 concurrente
pub struct Server {
    config: Config,
    router: Arc<Router>,
    running: Arc<AtomicBool>,
    stop_requested: Arc<AtomicBool>,
    local_addr: Mutex<Option<SocketAddr>>,
    active_connections: Arc<AtomicUsize>,
}

/// Parámetros que cada worker necesita de la configuración
#[derive(Debug, Clone, Copy)]
struct WorkerSettings {
    max_request_bytes: usize,
    max_headers: usize,
    read_timeout: Option<Duration>,
}

impl From<&Config> for WorkerSettings {
    fn from(config: &Config) -> Self {
        Self {
            max_request_bytes: config.max_request_bytes,
            max_headers: config.max_headers,
            read_timeout: config.read_timeout(),
        }
    }
}

/// Cuenta una conexión activa mientras vive
struct ConnectionGuard {
    active: Arc<AtomicUsize>,
}

impl ConnectionGuard {
    fn acquire(active: &Arc<AtomicUsize>) -> (Self, usize) {
        let count = active.fetch_add(1, Ordering::SeqCst) + 1;
        (
            Self {
                active: Arc::clone(active),
            },
            count,
        )
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

impl Server {
    /// Crea un servidor con un router vacío configurado desde `config`
    pub fn new(config: Config) -> Self {
        let router = Router::with_templates(TemplateEngine::new(&config.templates_dir))
            .max_file_bytes(config.max_file_bytes);
        Self::with_router(config, Arc::new(router))
    }

    /// Crea un servidor que despacha con un router ya construido
    pub fn with_router(config: Config, router: Arc<Router>) -> Self {
        Self {
            config,
            router,
            running: Arc::new(AtomicBool::new(false)),
            stop_requested: Arc::new(AtomicBool::new(false)),
            local_addr: Mutex::new(None),
            active_connections: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Atajo para [`Router::add_route`]
    pub fn add_route<F>(&self, method: &str, path: &str, handler: F) -> Result<(), RouterError>
    where
        F: Fn(&Request, &mut Response) + Send + Sync + 'static,
    {
        self.router.add_route(method, path, handler)
    }

    /// Atajo para [`Router::add_static_route`]
    pub fn add_static_route(&self, url_prefix: &str, root: &str) -> Result<(), RouterError> {
        self.router.add_static_route(url_prefix, root)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Dirección real de escucha (útil con puerto 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Conexiones siendo atendidas en este momento
    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// Abre el socket de escucha y marca el servidor como corriendo
    pub fn bind(&self) -> Result<TcpListener, ServerError> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            addr: address.clone(),
            source,
        })?;
        let local_addr = listener.local_addr()?;

        *self.local_addr.lock().unwrap_or_else(PoisonError::into_inner) = Some(local_addr);
        self.running.store(true, Ordering::SeqCst);

        info!(%local_addr, "servidor escuchando");
        Ok(listener)
    }

    /// Ciclo de aceptación; retorna cuando se llama a [`Server::stop`]
    pub fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        if self.stop_requested() {
            self.running.store(false, Ordering::SeqCst);
            info!("parada pedida antes de atender, no se aceptan conexiones");
            return Ok(());
        }
        info!("modo concurrente: un thread por conexión");

        for stream in listener.incoming() {
            if !self.is_running() || self.stop_requested() {
                break;
            }

            match stream {
                Ok(stream) => self.dispatch_connection(stream),
                Err(e) => error!(error = %e, "error al aceptar conexión"),
            }
        }

        info!("ciclo de aceptación terminado");
        Ok(())
    }

    /// `bind` + `serve`
    ///
    /// # Ejemplo
    /// ```no_run
    /// use ternic_server::config::Config;
    /// use ternic_server::server::Server;
    ///
    /// let server = Server::new(Config::default());
    /// server.add_route("GET", "/ping", |_req, resp| resp.set_body("pong")).unwrap();
    /// server.start().unwrap();
    /// ```
    pub fn start(&self) -> Result<(), ServerError> {
        let listener = self.bind()?;
        self.serve(listener)
    }

    /// Pide al ciclo de aceptación que termine
    ///
    /// Se puede llamar desde cualquier thread y más de una vez. Si llega
    /// antes de `bind`/`serve` el pedido queda guardado: una vez detenido,
    /// el servidor no vuelve a atender.
    pub fn stop(&self) {
        if self.stop_requested.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("deteniendo servidor");

        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(addr) = self.local_addr() {
            let target = wake_target(addr);
            if let Err(e) = TcpStream::connect_timeout(&target, WAKE_TIMEOUT) {
                debug!(%target, error = %e, "no se pudo despertar al acceptor");
            }
        }
    }

    fn stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::SeqCst)
    }

    fn dispatch_connection(&self, stream: TcpStream) {
        let peer = stream
            .peer_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| "unknown".to_string());

        let (guard, active) = ConnectionGuard::acquire(&self.active_connections);
        let limit = self.config.max_connections;
        if limit > 0 && active > limit {
            warn!(%peer, active, limit, "límite de conexiones alcanzado");
            drop(guard);
            self.reject_connection(stream, peer);
            return;
        }

        debug!(%peer, active, "nueva conexión");

        let router = Arc::clone(&self.router);
        let settings = WorkerSettings::from(&self.config);
        let spawned = thread::Builder::new()
            .name("conn-worker".to_string())
            .spawn(move || {
                let _guard = guard;
                let span = info_span!("conn", %peer);
                let _enter = span.enter();

                if let Err(e) = handle_connection(stream, &router, settings) {
                    error!(error = %e, "error en la conexión");
                }
            });

        if let Err(e) = spawned {
            error!(error = %e, "no se pudo crear el thread del worker");
        }
    }

    /// Responde 503 fuera del acceptor: el drenado puede tardar
    fn reject_connection(&self, stream: TcpStream, peer: String) {
        let read_timeout = self.config.read_timeout();
        let spawned = thread::Builder::new()
            .name("conn-reject".to_string())
            .spawn(move || {
                let response = Response::text(StatusCode::SERVICE_UNAVAILABLE, "Service Unavailable");
                if let Err(e) = finish_response(stream, response, read_timeout) {
                    debug!(%peer, error = %e, "no se pudo enviar 503");
                }
            });

        if let Err(e) = spawned {
            error!(error = %e, "no se pudo crear el thread de rechazo");
        }
    }
}

/// Con `0.0.0.0` / `::` hay que conectarse por loopback
fn wake_target(addr: SocketAddr) -> SocketAddr {
    match addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => SocketAddr::new(Ipv4Addr::LOCALHOST.into(), addr.port()),
        IpAddr::V6(ip) if ip.is_unspecified() => SocketAddr::new(Ipv6Addr::LOCALHOST.into(), addr.port()),
        _ => addr,
    }
}

/// Atiende un request completo en una conexión
fn handle_connection(mut stream: TcpStream, router: &Router, settings: WorkerSettings) -> io::Result<()> {
    let start = Instant::now();
    stream.set_read_timeout(settings.read_timeout)?;

    let raw = match read_request(&mut stream, settings.max_request_bytes) {
        Ok(raw) => raw,
        Err(ReadError::Closed) => {
            debug!("conexión cerrada sin datos");
            return Ok(());
        }
        Err(ReadError::Malformed(e)) => {
            warn!(error = %e, "request malformado");
            return finish_response(stream, bad_request(), settings.read_timeout);
        }
        Err(ReadError::Io(e)) => return Err(e),
    };

    let request = match Request::parse_with_limit(&raw, settings.max_headers) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "request malformado");
            return finish_response(stream, bad_request(), settings.read_timeout);
        }
    };

    let response = router.dispatch(&request);
    let status = response.status();
    finish_response(stream, response, settings.read_timeout)?;

    info!(
        method = request.method(),
        path = request.path(),
        status = status.as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request atendido"
    );
    Ok(())
}

fn bad_request() -> Response {
    Response::text(StatusCode::BAD_REQUEST, "Bad Request")
}

/// Serializa, envía y cierra; una conexión = una response
fn finish_response(mut stream: TcpStream, mut response: Response, read_timeout: Option<Duration>) -> io::Result<()> {
    response.set_header("Connection", "close");
    stream.write_all(&response.to_bytes())?;
    stream.flush()?;
    linger_close(stream, read_timeout);
    Ok(())
}

/// Cierra el lado de escritura y descarta lo que el cliente siga enviando
/// hasta EOF, error, `DRAIN_LIMIT` bytes o el timeout
fn linger_close(mut stream: TcpStream, read_timeout: Option<Duration>) {
    if let Err(e) = stream.shutdown(Shutdown::Write) {
        debug!(error = %e, "shutdown de escritura falló");
        return;
    }

    let linger = read_timeout.map_or(LINGER_TIMEOUT, |t| t.min(LINGER_TIMEOUT));
    if let Err(e) = stream.set_read_timeout(Some(linger)) {
        debug!(error = %e, "no se pudo fijar el timeout de cierre");
        return;
    }

    let deadline = Instant::now() + linger;
    let mut scratch = [0u8; DRAIN_CHUNK];
    let mut drained = 0usize;
    while drained < DRAIN_LIMIT && Instant::now() < deadline {
        match stream.read(&mut scratch) {
            Ok(0) => break,
            Ok(n) => drained += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                debug!(error = %e, drained, "drenado interrumpido");
                break;
            }
        }
    }

    if drained > 0 {
        debug!(drained, "bytes descartados al cerrar");
    }
}
