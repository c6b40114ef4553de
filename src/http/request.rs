//! # Parsing de Requests HTTP
//! src/http/request.rs
//!
//! Parser de la cabecera de un request (request line + headers). El body
//! de un PUT no pasa por aquí: se copia directo del socket al archivo en
//! `Connection::receive_body_into`.
//!
//! ## Formato
//!
//! ```text
//! PUT /archivo.txt HTTP/1.1\r\n
//! Content-Length: 12\r\n
//! Request-Id: 7\r\n
//! \r\n
//! hola mundo!\n
//! ```
//!
//! ## Reglas
//!
//! 1. **Método**: 1 a 8 letras ASCII. `GET` y `PUT` se atienden; cualquier
//!    otro método bien formado se responde con 501.
//! 2. **URI**: empieza con `/`, hasta 64 bytes, sólo `[A-Za-z0-9._/-]`,
//!    sin segmentos vacíos, `.` ni `..`. Así cada archivo tiene una única
//!    URI y por lo tanto un único lock.
//! 3. **Versión**: `HTTP/1.0` o `HTTP/1.1`; otra `HTTP/x.y` es 505.
//! 4. **PUT**: requiere `Content-Length` numérico.

use super::StatusCode;
use std::collections::HashMap;
use thiserror::Error;

/// Largo máximo de la URI (incluye la `/` inicial)
pub const MAX_URI_LEN: usize = 64;

/// Largo máximo de un método
const MAX_METHOD_LEN: usize = 8;

/// Métodos HTTP
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    /// GET - Leer un archivo (acceso compartido)
    GET,

    /// PUT - Crear o reemplazar un archivo (acceso exclusivo)
    PUT,

    /// Cualquier otro método bien formado (HEAD, POST, DELETE...)
    Unsupported(String),
}

impl Method {
    /// Parsea un método HTTP desde un string
    fn from_str(s: &str) -> Result<Self, ParseError> {
        if s.is_empty() || s.len() > MAX_METHOD_LEN || !s.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(ParseError::InvalidRequestLine);
        }

        Ok(match s {
            "GET" => Method::GET,
            "PUT" => Method::PUT,
            other => Method::Unsupported(other.to_string()),
        })
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::PUT => "PUT",
            Method::Unsupported(name) => name,
        }
    }
}

/// Representa la cabecera de un request ya parseada
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP
    method: Method,

    /// URI validada (ej: "/archivo.txt"); es la clave del recurso
    path: String,

    /// Headers con el nombre en minúsculas
    headers: HashMap<String, String>,

    /// Versión HTTP ("HTTP/1.0" o "HTTP/1.1")
    version: String,

    /// Largo del body declarado (obligatorio en PUT)
    content_length: Option<u64>,
}

/// Errores de protocolo; cada uno se responde con un código fijo
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Request vacío
    #[error("Empty request")]
    EmptyRequest,

    /// La cabecera superó el tamaño máximo sin terminar
    #[error("Request header too large")]
    HeaderTooLarge,

    /// La conexión se cerró antes de terminar la cabecera
    #[error("Incomplete HTTP request")]
    IncompleteRequest,

    /// Formato inválido de la request line
    #[error("Invalid request line format")]
    InvalidRequestLine,

    /// URI con caracteres o largo inválidos
    #[error("Invalid URI: {0}")]
    InvalidUri(String),

    /// Versión con formato inválido
    #[error("Invalid HTTP version: {0}")]
    InvalidHttpVersion(String),

    /// Versión bien formada pero no soportada
    #[error("Unsupported HTTP version: {0}")]
    UnsupportedVersion(String),

    /// Header malformado
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// PUT sin Content-Length
    #[error("Missing Content-Length")]
    MissingContentLength,

    /// Content-Length no numérico
    #[error("Invalid Content-Length: {0}")]
    InvalidContentLength(String),
}

impl ParseError {
    /// Código de estado con el que se responde este error
    pub fn status(&self) -> StatusCode {
        match self {
            ParseError::UnsupportedVersion(_) => StatusCode::VersionNotSupported,
            _ => StatusCode::BadRequest,
        }
    }
}

impl Request {
    /// Parsea la cabecera de un request desde bytes
    ///
    /// `buffer` contiene la request line y los headers; lo que venga después
    /// de la línea vacía se ignora.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use httpserver::http::{Method, Request};
    ///
    /// let raw = b"GET /hola.txt HTTP/1.1\r\nRequest-Id: 3\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), &Method::GET);
    /// assert_eq!(request.path(), "/hola.txt");
    /// assert_eq!(request.request_id(), 3);
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        // Convertir a string (validando que sea UTF-8 válido)
        let request_str =
            std::str::from_utf8(buffer).map_err(|_| ParseError::InvalidRequestLine)?;

        if request_str.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        // Separar por \r\n para obtener líneas
        let lines: Vec<&str> = request_str.split("\r\n").collect();

        // 1. Request line
        let (method, path, version) = Self::parse_request_line(lines[0])?;

        // 2. Headers hasta la línea vacía
        let headers = Self::parse_headers(&lines[1..])?;

        // 3. Content-Length
        let content_length = match headers.get("content-length") {
            Some(value) => Some(
                value
                    .parse::<u64>()
                    .map_err(|_| ParseError::InvalidContentLength(value.clone()))?,
            ),
            None => None,
        };

        if method == Method::PUT && content_length.is_none() {
            return Err(ParseError::MissingContentLength);
        }

        Ok(Request {
            method,
            path,
            headers,
            version,
            content_length,
        })
    }

    /// Parsea la request line
    ///
    /// Formato: `GET /path HTTP/1.1`
    fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
        let parts: Vec<&str> = line.split(' ').collect();

        // Debe tener exactamente 3 partes: METHOD URI VERSION
        if parts.len() != 3 {
            return Err(ParseError::InvalidRequestLine);
        }

        let method = Method::from_str(parts[0])?;
        let path = Self::validate_uri(parts[1])?;
        let version = Self::validate_version(parts[2])?;

        Ok((method, path, version))
    }

    /// Valida la URI y la retorna como clave del recurso
    fn validate_uri(uri: &str) -> Result<String, ParseError> {
        let invalid = || ParseError::InvalidUri(uri.to_string());

        if !uri.starts_with('/') || uri.len() < 2 || uri.len() > MAX_URI_LEN {
            return Err(invalid());
        }

        let allowed = |b: u8| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'-' | b'_' | b'/');
        if !uri.bytes().all(allowed) {
            return Err(invalid());
        }

        // Una sola forma por recurso: sin segmentos vacíos ("//", "/" final),
        // sin "." y sin ".." (nada de escapar del directorio de datos)
        if uri[1..]
            .split('/')
            .any(|segment| matches!(segment, "" | "." | ".."))
        {
            return Err(invalid());
        }

        Ok(uri.to_string())
    }

    /// Valida la versión HTTP
    fn validate_version(version: &str) -> Result<String, ParseError> {
        match version {
            "HTTP/1.0" | "HTTP/1.1" => Ok(version.to_string()),
            _ => {
                let bytes = version.as_bytes();
                let well_formed = bytes.len() == 8
                    && version.starts_with("HTTP/")
                    && bytes[5].is_ascii_digit()
                    && bytes[6] == b'.'
                    && bytes[7].is_ascii_digit();

                if well_formed {
                    Err(ParseError::UnsupportedVersion(version.to_string()))
                } else {
                    Err(ParseError::InvalidHttpVersion(version.to_string()))
                }
            }
        }
    }

    /// Parsea los headers HTTP
    ///
    /// Cada header tiene formato: "Name: Value"
    fn parse_headers(lines: &[&str]) -> Result<HashMap<String, String>, ParseError> {
        let mut headers = HashMap::new();

        for line in lines {
            // La línea vacía marca el fin de los headers
            if line.is_empty() {
                break;
            }

            match line.find(':') {
                Some(colon_pos) if colon_pos > 0 => {
                    let name = &line[..colon_pos];
                    if name.contains(char::is_whitespace) {
                        return Err(ParseError::InvalidHeader(line.to_string()));
                    }
                    let value = line[colon_pos + 1..].trim().to_string();
                    headers.insert(name.to_ascii_lowercase(), value);
                }
                _ => return Err(ParseError::InvalidHeader(line.to_string())),
            }
        }

        Ok(headers)
    }

    // === Métodos públicos para acceder a los campos ===

    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Obtiene el path del request (clave del recurso)
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Path relativo al directorio de datos (sin la `/` inicial)
    pub fn relative_path(&self) -> &str {
        self.path.trim_start_matches('/')
    }

    /// Obtiene un header específico (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|s| s.as_str())
    }

    /// Obtiene la versión HTTP
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Largo del body declarado
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Id de correlación del header `Request-Id` (0 si falta o es inválido)
    pub fn request_id(&self) -> u64 {
        self.header("Request-Id")
            .and_then(|value| value.parse().ok())
            .unwrap_or(0)
    }
}
