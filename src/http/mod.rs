//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Implementa el framing HTTP/1.1 que necesita el servidor, sin librerías
//! de alto nivel:
//!
//! - Lectura de un request completo desde el socket (`reader`)
//! - Parsing de requests (`request`)
//! - Construcción y serialización de responses (`response`)
//! - Códigos de estado (`status`)
//!
//! Sin keep-alive ni chunked encoding: un request y una response por
//! conexión.
//!
//! ### Formato de Request
//!
//! ```text
//! GET /path HTTP/1.1\r\n
//! Header-Name: Header-Value\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: application/json\r\n
//! Content-Length: 15\r\n
//! \r\n
//! {"status":"ok"}
//! ```

pub mod reader;
pub mod request;
pub mod response;
pub mod status;

// Re-exportamos los tipos principales para facilitar su uso
pub use reader::{read_request, ReadError};
pub use request::{ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
