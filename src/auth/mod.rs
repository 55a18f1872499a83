//! # Autenticación
//! src/auth/mod.rs
//!
//! Usuarios con password hasheado, sesiones con token Bearer y
//! middleware para rutas protegidas.
//!
//! ## Flujo
//!
//! ```text
//! POST /api/register  → register_user
//! POST /api/login     → authenticate_user + create_session → token
//! GET  /api/me        → require_login (Authorization: Bearer <token>)
//! ```
//!
//! El contexto se construye explícitamente y se comparte con `Arc`; todo
//! el estado vive detrás de un `Mutex`.

pub mod middleware;
pub mod password;
pub mod storage;

pub use middleware::{parse_bearer_token, require_admin, require_login};

use serde::{Deserialize, Serialize};
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{info, warn};

/// Máximo de usuarios registrados
pub const MAX_USERS: usize = 1000;

/// Máximo de sesiones vivas
pub const MAX_SESSIONS: usize = 1000;

/// Duración de una sesión
pub const SESSION_DURATION: Duration = Duration::from_secs(3600);

/// Errores de autenticación y persistencia
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid username")]
    InvalidUsername,

    #[error("invalid email")]
    InvalidEmail,

    #[error("password too weak")]
    WeakPassword,

    #[error("user already exists: {0}")]
    UserExists(String),

    #[error("maximum users reached")]
    TooManyUsers,

    #[error("user not found: {0}")]
    UserNotFound(String),

    #[error("user inactive: {0}")]
    UserInactive(String),

    #[error("wrong password")]
    WrongPassword,

    #[error("maximum sessions reached")]
    TooManySessions,

    #[error("users file I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("users file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Rol de un usuario
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn name(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

/// Usuario registrado
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u32,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    /// Segundos desde epoch
    pub created_at: u64,
    /// 0 si nunca inició sesión
    pub last_login: u64,
    pub active: bool,
    pub role: Role,
}

/// Sesión abierta por un login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: u32,
    pub created_at: u64,
    pub expires_at: u64,
    pub ip_address: Option<String>,
}

impl Session {
    fn is_live(&self, now: u64) -> bool {
        now < self.expires_at
    }
}

#[derive(Debug, Default)]
struct AuthState {
    users: Vec<User>,
    sessions: Vec<Session>,
}

/// Base de usuarios y sesiones en memoria
#[derive(Debug)]
pub struct AuthContext {
    state: Mutex<AuthState>,
    session_duration: Duration,
}

pub(crate) fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl AuthContext {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(AuthState::default()),
            session_duration: SESSION_DURATION,
        }
    }

    /// Cambia la duración de las sesiones nuevas
    pub fn with_session_duration(mut self, duration: Duration) -> Self {
        self.session_duration = duration;
        self
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registra un usuario nuevo y retorna su id
    ///
    /// # Ejemplo
    /// ```
    /// use ternic_server::auth::AuthContext;
    ///
    /// let auth = AuthContext::new();
    /// let id = auth.register_user("alice", "alice@example.com", "Wonderland1").unwrap();
    /// assert_eq!(id, 1);
    /// assert!(auth.register_user("alice", "other@example.com", "Wonderland1").is_err());
    /// ```
    pub fn register_user(&self, username: &str, email: &str, password: &str) -> Result<u32, AuthError> {
        if !password::is_valid_username(username) {
            warn!(username, "username inválido");
            return Err(AuthError::InvalidUsername);
        }
        if !password::is_valid_email(email) {
            warn!(email, "email inválido");
            return Err(AuthError::InvalidEmail);
        }
        if !password::is_strong_password(password) {
            warn!(username, "password demasiado débil");
            return Err(AuthError::WeakPassword);
        }

        let mut state = self.lock();
        if state.users.iter().any(|user| user.username == username) {
            warn!(username, "el usuario ya existe");
            return Err(AuthError::UserExists(username.to_string()));
        }
        if state.users.len() >= MAX_USERS {
            return Err(AuthError::TooManyUsers);
        }

        let id = state.users.len() as u32 + 1;
        let salt = password::generate_salt();
        state.users.push(User {
            id,
            username: username.to_string(),
            email: email.to_string(),
            password_hash: password::hash_password(password, &salt),
            salt,
            created_at: now_secs(),
            last_login: 0,
            active: true,
            role: Role::User,
        });

        info!(username, id, "usuario registrado");
        Ok(id)
    }

    /// Verifica credenciales; si son correctas actualiza `last_login`
    pub fn authenticate_user(&self, username: &str, password: &str) -> Result<u32, AuthError> {
        let mut state = self.lock();
        let Some(user) = state.users.iter_mut().find(|user| user.username == username) else {
            warn!(username, "autenticación fallida: usuario no encontrado");
            return Err(AuthError::UserNotFound(username.to_string()));
        };

        if !user.active {
            warn!(username, "autenticación fallida: usuario inactivo");
            return Err(AuthError::UserInactive(username.to_string()));
        }
        if !password::verify_password(password, &user.salt, &user.password_hash) {
            warn!(username, "autenticación fallida: password incorrecto");
            return Err(AuthError::WrongPassword);
        }

        user.last_login = now_secs();
        info!(username, "usuario autenticado");
        Ok(user.id)
    }

    pub fn user_by_id(&self, id: u32) -> Option<User> {
        self.lock().users.iter().find(|user| user.id == id).cloned()
    }

    pub fn user_by_username(&self, username: &str) -> Option<User> {
        self.lock()
            .users
            .iter()
            .find(|user| user.username == username)
            .cloned()
    }

    /// Cambia el rol de un usuario; `false` si no existe
    pub fn set_role(&self, id: u32, role: Role) -> bool {
        match self.lock().users.iter_mut().find(|user| user.id == id) {
            Some(user) => {
                user.role = role;
                true
            }
            None => false,
        }
    }

    /// Activa o desactiva una cuenta; `false` si no existe
    pub fn set_active(&self, id: u32, active: bool) -> bool {
        match self.lock().users.iter_mut().find(|user| user.id == id) {
            Some(user) => {
                user.active = active;
                true
            }
            None => false,
        }
    }

    pub fn user_count(&self) -> usize {
        self.lock().users.len()
    }

    /// Abre una sesión para `user_id` y retorna el token
    pub fn create_session(&self, user_id: u32, ip_address: Option<&str>) -> Result<String, AuthError> {
        let now = now_secs();
        let mut state = self.lock();
        purge_expired(&mut state.sessions, now);

        if state.sessions.len() >= MAX_SESSIONS {
            warn!(user_id, "máximo de sesiones alcanzado");
            return Err(AuthError::TooManySessions);
        }

        let token = password::generate_token();
        state.sessions.push(Session {
            token: token.clone(),
            user_id,
            created_at: now,
            expires_at: now + self.session_duration.as_secs(),
            ip_address: ip_address.map(str::to_string),
        });

        info!(user_id, "sesión creada");
        Ok(token)
    }

    /// Retorna la sesión si el token existe y no expiró
    pub fn validate_session(&self, token: &str) -> Option<Session> {
        let now = now_secs();
        self.lock()
            .sessions
            .iter()
            .find(|session| session.token == token && session.is_live(now))
            .cloned()
    }

    /// Cierra una sesión; `false` si el token no existe
    pub fn destroy_session(&self, token: &str) -> bool {
        let mut state = self.lock();
        let before = state.sessions.len();
        state.sessions.retain(|session| session.token != token);
        let destroyed = state.sessions.len() < before;
        if destroyed {
            info!("sesión destruida");
        }
        destroyed
    }

    /// Elimina las sesiones expiradas y retorna cuántas eran
    pub fn cleanup_expired_sessions(&self) -> usize {
        purge_expired(&mut self.lock().sessions, now_secs())
    }

    pub fn session_count(&self) -> usize {
        self.lock().sessions.len()
    }
}

impl Default for AuthContext {
    fn default() -> Self {
        Self::new()
    }
}

fn purge_expired(sessions: &mut Vec<Session>, now: u64) -> usize {
    let before = sessions.len();
    sessions.retain(|session| session.is_live(now));
    let expired = before - sessions.len();
    if expired > 0 {
        info!(expired, "sesiones expiradas eliminadas");
    }
    expired
}
