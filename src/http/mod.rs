//! # Módulo HTTP
//!
//! Implementa, sin librerías de alto nivel, la parte del protocolo que
//! necesita el servidor de archivos:
//!
//! - Parsing de la cabecera de requests GET/PUT
//! - Construcción de responses
//! - Lectura del body de un PUT y envío de archivos por streaming
//!
//! ### Formato de Request
//!
//! ```text
//! GET /archivo.txt HTTP/1.1\r\n
//! Request-Id: 42\r\n
//! \r\n
//! ```
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Length: 13\r\n
//! \r\n
//! <contenido>
//! ```

pub mod connection; // Lectura/escritura sobre el stream
pub mod request; // Parsing de la cabecera
pub mod response; // Construcción de responses
pub mod status; // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use connection::Connection;
pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
