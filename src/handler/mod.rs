//! # Handler de Requests
//! src/handler/mod.rs
//!
//! Atiende una conexión completa:
//!
//! ```text
//! START → LOCK_ACQUIRED → FILE_OP → RESPONDED → DONE
//!   │                        │
//!   └── error de protocolo ──┴──→ RESPONDED
//! ```
//!
//! 1. Se parsea la cabecera; un error de protocolo se responde y termina.
//! 2. GET toma el lock del recurso en modo lectura, PUT en modo escritura.
//!    Cualquier otro método se responde 501 sin tocar locks.
//! 3. Se hace la operación sobre el archivo y se mapea cada error de I/O
//!    a un código de estado.
//! 4. Se envía la respuesta y se registra una línea de auditoría.
//! 5. El guard del lock se suelta al salir de la función, en todos los
//!    caminos.

use crate::audit::{AuditRecord, AuditSink};
use crate::http::{Connection, Method, Request, Response, StatusCode};
use crate::sync::LockRegistry;
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Handler compartido por todos los workers
pub struct RequestHandler {
    /// Locks por URI
    registry: Arc<LockRegistry>,

    /// Destino de la auditoría
    audit: Arc<dyn AuditSink>,

    /// Directorio bajo el que se resuelven las URIs
    root: PathBuf,
}

impl RequestHandler {
    pub fn new(registry: Arc<LockRegistry>, audit: Arc<dyn AuditSink>, root: impl Into<PathBuf>) -> Self {
        Self {
            registry,
            audit,
            root: root.into(),
        }
    }

    /// Registro de locks que usa este handler
    pub fn registry(&self) -> &Arc<LockRegistry> {
        &self.registry
    }

    /// Atiende una conexión de principio a fin
    ///
    /// Retorna el código enviado, o `None` si el cliente cerró sin enviar
    /// nada. El stream se cierra al soltarse cuando esta función retorna.
    pub fn handle_connection<S: Read + Write>(&self, stream: S) -> Option<StatusCode> {
        let mut conn = Connection::new(stream);

        let request = match conn.parse() {
            Ok(Some(request)) => request,
            Ok(None) => {
                tracing::debug!("peer closed without sending a request");
                return None;
            }
            Err(e) => {
                tracing::debug!(error = %e, "rejecting malformed request");
                let status = e.status();
                self.respond(&mut conn, status);
                return Some(status);
            }
        };

        tracing::debug!(
            method = request.method().as_str(),
            uri = request.path(),
            version = request.version(),
            "request"
        );

        let status = match request.method() {
            Method::GET => self.handle_get(&mut conn, &request),
            Method::PUT => self.handle_put(&mut conn, &request),
            Method::Unsupported(_) => self.handle_unsupported(&mut conn),
        };

        Some(status)
    }

    /// GET: lectura compartida del archivo
    fn handle_get<S: Read + Write>(&self, conn: &mut Connection<S>, request: &Request) -> StatusCode {
        let lock = self.registry.get_or_create(request.path());
        let _guard = lock.acquire_read();

        let status = self.serve_file(conn, request);

        // Se audita antes de soltar el lock: el orden del log respeta el
        // orden en que el lock concedió el acceso.
        self.record(request, status);
        status
    }

    fn serve_file<S: Read + Write>(&self, conn: &mut Connection<S>, request: &Request) -> StatusCode {
        let path = self.resolve(request);

        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) => return self.respond(conn, get_error_status(&e)),
        };

        let metadata = match file.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "stat failed");
                return self.respond(conn, StatusCode::InternalServerError);
            }
        };

        // Un directorio se abre sin error, pero no se sirve
        if metadata.is_dir() {
            return self.respond(conn, StatusCode::Forbidden);
        }

        if let Err(e) = conn.send_file(&mut file, metadata.len()) {
            tracing::warn!(uri = request.path(), error = %e, "failed to send file");
        }
        StatusCode::Ok
    }

    /// PUT: escritura exclusiva del archivo
    fn handle_put<S: Read + Write>(&self, conn: &mut Connection<S>, request: &Request) -> StatusCode {
        let lock = self.registry.get_or_create(request.path());
        let _guard = lock.acquire_write();

        let status = self.store_file(conn, request);

        self.record(request, status);
        status
    }

    fn store_file<S: Read + Write>(&self, conn: &mut Connection<S>, request: &Request) -> StatusCode {
        let path = self.resolve(request);

        // Con el lock de escritura tomado nadie más puede crear el archivo
        let existed = path.exists();

        let mut file = match open_for_write(&path) {
            Ok(file) => file,
            Err(e) => return self.respond(conn, put_error_status(&e)),
        };

        // El parser garantiza Content-Length en un PUT
        let length = request.content_length().unwrap_or(0);

        let status = match conn.receive_body_into(&mut file, length) {
            Ok(()) if existed => StatusCode::Ok,
            Ok(()) => StatusCode::Created,
            Err(e) => {
                tracing::warn!(uri = request.path(), error = %e, "failed to receive body");
                StatusCode::InternalServerError
            }
        };

        self.respond(conn, status)
    }

    /// Método no soportado: 501, sin locks ni auditoría
    fn handle_unsupported<S: Read + Write>(&self, conn: &mut Connection<S>) -> StatusCode {
        self.respond(conn, StatusCode::NotImplemented)
    }

    /// Envía una respuesta sin archivo y retorna su código
    fn respond<S: Read + Write>(&self, conn: &mut Connection<S>, status: StatusCode) -> StatusCode {
        if let Err(e) = conn.send_response(&Response::status_only(status)) {
            tracing::warn!(status = status.as_u16(), error = %e, "failed to send response");
        }
        status
    }

    fn record(&self, request: &Request, status: StatusCode) {
        self.audit.record(&AuditRecord::new(
            request.method().as_str(),
            request.path(),
            status.as_u16(),
            request.request_id(),
        ));
    }

    fn resolve(&self, request: &Request) -> PathBuf {
        self.root.join(request.relative_path())
    }
}

/// Crea o trunca el archivo destino de un PUT
fn open_for_write(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options.open(path)
}

/// Código para un error al abrir un archivo para lectura
fn get_error_status(error: &io::Error) -> StatusCode {
    match error.kind() {
        io::ErrorKind::PermissionDenied => StatusCode::Forbidden,
        io::ErrorKind::NotFound => StatusCode::NotFound,
        io::ErrorKind::IsADirectory => StatusCode::Forbidden,
        _ => StatusCode::InternalServerError,
    }
}

/// Código para un error al abrir un archivo para escritura
///
/// `NotFound` aquí significa que falta el directorio padre: no se crean
/// directorios, así que se trata como prohibido.
fn put_error_status(error: &io::Error) -> StatusCode {
    match error.kind() {
        io::ErrorKind::PermissionDenied | io::ErrorKind::NotFound | io::ErrorKind::IsADirectory => {
            StatusCode::Forbidden
        }
        _ => StatusCode::InternalServerError,
    }
}
