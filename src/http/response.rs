//! # Construcción de Respuestas HTTP
//!
//! API para construir respuestas y convertirlas a bytes.
//!
//! ## Formato
//!
//! ```text
//! HTTP/1.1 404 Not Found\r\n
//! Content-Length: 10\r\n
//! \r\n
//! Not Found\n
//! ```
//!
//! Para un GET exitoso sólo se construye la cabecera (`head_bytes`) y el
//! contenido del archivo se copia después directo al socket.
//!
//! ## Ejemplo de uso
//!
//! ```
//! use httpserver::http::{Response, StatusCode};
//!
//! let response = Response::status_only(StatusCode::Created);
//! let bytes = response.to_bytes();
//! assert!(bytes.starts_with(b"HTTP/1.1 201 Created\r\n"));
//! ```

use super::StatusCode;

/// Versión con la que responde el servidor
pub const HTTP_VERSION: &str = "HTTP/1.1";

/// Representa una respuesta HTTP completa
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP (200, 404, etc.)
    status: StatusCode,

    /// Headers en orden de inserción (sin duplicados)
    headers: Vec<(String, String)>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una nueva respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Respuesta cuyo body es la reason phrase (ej: "Not Found\n")
    ///
    /// Es la forma de todas las respuestas que no llevan un archivo.
    pub fn status_only(status: StatusCode) -> Self {
        let body = format!("{}\n", status.reason_phrase());
        Self::new(status).with_body(&body)
    }

    /// Agrega un header (si ya existe, se sobrescribe)
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Agrega un header a una respuesta existente (versión mutable)
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
        {
            Some((_, v)) => *v = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece el cuerpo desde un string y agrega `Content-Length`
    pub fn with_body(self, body: &str) -> Self {
        self.with_body_bytes(body.as_bytes().to_vec())
    }

    /// Establece el cuerpo desde bytes y agrega `Content-Length`
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        let len = self.body.len().to_string();
        self.add_header("Content-Length", &len);
        self
    }

    /// Cabecera de la respuesta (status line + headers + línea vacía)
    ///
    /// No incluye el body: sirve para enviar un archivo por streaming
    /// después de la cabecera.
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();

        // 1. Status line
        result.extend_from_slice(format!("{} {}\r\n", HTTP_VERSION, self.status).as_bytes());

        // 2. Headers
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        result
    }

    /// Convierte la respuesta completa a bytes listos para el socket
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = self.head_bytes();
        result.extend_from_slice(&self.body);
        result
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene un header por nombre (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
