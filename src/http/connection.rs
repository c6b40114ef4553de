//! # Conexión HTTP
//! src/http/connection.rs
//!
//! Envuelve un stream (un `TcpStream` en el servidor, un stream en memoria
//! en las pruebas) y expone las operaciones que usa el handler:
//!
//! - `parse`: lee y parsea la cabecera del request
//! - `send_response`: envía una respuesta completa
//! - `send_file`: envía cabecera + contenido de un archivo por streaming
//! - `receive_body_into`: copia el body de un PUT hacia un archivo
//!
//! El handler nunca toca bytes crudos del socket.

use super::request::{ParseError, Request};
use super::response::Response;
use super::StatusCode;
use std::io::{self, Read, Write};

/// Tamaño máximo de la cabecera de un request
pub const MAX_HEADER_SIZE: usize = 8192;

/// Tamaño de cada lectura del socket
const READ_CHUNK: usize = 1024;

/// Terminador de la cabecera
const HEADER_END: &[u8] = b"\r\n\r\n";

/// Una conexión con un cliente
pub struct Connection<S> {
    stream: S,

    /// Bytes leídos después de la cabecera (comienzo del body)
    pending: Vec<u8>,
}

impl<S: Read + Write> Connection<S> {
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            pending: Vec::new(),
        }
    }

    /// Lee la cabecera completa y la parsea
    ///
    /// Retorna `Ok(None)` si el cliente cerró sin enviar nada.
    pub fn parse(&mut self) -> Result<Option<Request>, ParseError> {
        let mut buffer = Vec::with_capacity(READ_CHUNK);
        let mut chunk = [0u8; READ_CHUNK];

        let header_len = loop {
            let bytes_read = match self.stream.read(&mut chunk) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "read failed while parsing request");
                    return Err(ParseError::IncompleteRequest);
                }
            };

            if bytes_read == 0 {
                if buffer.is_empty() {
                    return Ok(None);
                }
                return Err(ParseError::IncompleteRequest);
            }

            // Buscar el terminador sólo en la zona nueva (más 3 bytes de solape)
            let search_from = buffer.len().saturating_sub(HEADER_END.len() - 1);
            buffer.extend_from_slice(&chunk[..bytes_read]);

            if let Some(pos) = find_subsequence(&buffer[search_from..], HEADER_END) {
                break search_from + pos + HEADER_END.len();
            }

            if buffer.len() >= MAX_HEADER_SIZE {
                return Err(ParseError::HeaderTooLarge);
            }
        };

        if header_len > MAX_HEADER_SIZE {
            return Err(ParseError::HeaderTooLarge);
        }

        self.pending = buffer.split_off(header_len);
        Request::parse(&buffer).map(Some)
    }

    /// Envía una respuesta completa
    pub fn send_response(&mut self, response: &Response) -> io::Result<()> {
        self.stream.write_all(&response.to_bytes())?;
        self.stream.flush()
    }

    /// Envía `200 OK` con los primeros `length` bytes de `file`
    pub fn send_file<R: Read>(&mut self, file: &mut R, length: u64) -> io::Result<()> {
        let head = Response::new(StatusCode::Ok).with_header("Content-Length", &length.to_string());
        self.stream.write_all(&head.head_bytes())?;

        let sent = io::copy(&mut file.take(length), &mut self.stream)?;
        if sent < length {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("file shrank while sending: {} of {} bytes", sent, length),
            ));
        }

        self.stream.flush()
    }

    /// Copia exactamente `length` bytes del body hacia `dest`
    ///
    /// Falla con `UnexpectedEof` si el cliente envía menos bytes.
    pub fn receive_body_into<W: Write>(&mut self, dest: &mut W, length: u64) -> io::Result<()> {
        // 1. Lo que ya llegó junto con la cabecera
        let buffered = (self.pending.len() as u64).min(length) as usize;
        dest.write_all(&self.pending[..buffered])?;
        self.pending.drain(..buffered);

        // 2. El resto directo del socket
        let remaining = length - buffered as u64;
        let copied = io::copy(&mut (&mut self.stream).take(remaining), dest)?;
        if copied < remaining {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("body ended after {} of {} bytes", buffered as u64 + copied, length),
            ));
        }

        dest.flush()
    }

    /// Recupera el stream subyacente
    pub fn into_inner(self) -> S {
        self.stream
    }
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Stream en memoria para las pruebas
#[cfg(test)]
pub(crate) mod mock {
    use std::io::{self, Cursor, Read, Write};

    #[derive(Debug)]
    pub(crate) struct MockStream {
        input: Cursor<Vec<u8>>,
        pub(crate) output: Vec<u8>,

        /// Máximo de bytes entregados por lectura
        chunk: usize,
    }

    impl MockStream {
        pub(crate) fn new(input: &[u8]) -> Self {
            Self::with_chunk(input, usize::MAX)
        }

        pub(crate) fn with_chunk(input: &[u8], chunk: usize) -> Self {
            Self {
                input: Cursor::new(input.to_vec()),
                output: Vec::new(),
                chunk,
            }
        }

        pub(crate) fn output_text(&self) -> String {
            String::from_utf8_lossy(&self.output).to_string()
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let n = buf.len().min(self.chunk);
            self.input.read(&mut buf[..n])
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}
