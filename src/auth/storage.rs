//! # Persistencia de Usuarios
//! src/auth/storage.rs
//!
//! Guarda la base de usuarios en un archivo JSON. Las sesiones no se
//! persisten: un reinicio obliga a volver a iniciar sesión.

use super::{AuthContext, AuthError, User, MAX_USERS};
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{error, info};

impl AuthContext {
    /// Escribe todos los usuarios en `path`
    ///
    /// Se escribe primero a `path.tmp` y luego se renombra, así un corte a
    /// mitad de escritura no deja un archivo truncado.
    pub fn save_users(&self, path: impl AsRef<Path>) -> Result<(), AuthError> {
        let path = path.as_ref();
        let users = self.lock().users.clone();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        let file = File::create(&temp_path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &users)?;
        writer.flush()?;

        fs::rename(&temp_path, path)?;

        info!(count = users.len(), path = %path.display(), "usuarios guardados");
        Ok(())
    }

    /// Reemplaza los usuarios en memoria con los de `path`
    ///
    /// Un archivo inexistente equivale a una base vacía. Retorna cuántos
    /// usuarios se cargaron.
    pub fn load_users(&self, path: impl AsRef<Path>) -> Result<usize, AuthError> {
        let path = path.as_ref();
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                info!(path = %path.display(), "no hay archivo de usuarios, base vacía");
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let users: Vec<User> = serde_json::from_reader(BufReader::new(file)).map_err(|e| {
            error!(path = %path.display(), error = %e, "archivo de usuarios inválido");
            e
        })?;

        if users.len() > MAX_USERS {
            error!(count = users.len(), "demasiados usuarios en el archivo");
            return Err(AuthError::TooManyUsers);
        }

        let count = users.len();
        self.lock().users = users;

        info!(count, path = %path.display(), "usuarios cargados");
        Ok(count)
    }
}
