//! Tests de integración para el servidor de archivos
//! tests/integration_test.rs
//!
//! Cada test levanta un servidor real en un puerto efímero, con un
//! directorio temporal como raíz, y le habla HTTP crudo por `TcpStream`.

use httpserver::audit::MemoryAudit;
use httpserver::config::Config;
use httpserver::error::ServerError;
use httpserver::server::{Server, ShutdownHandle};
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tempfile::TempDir;

/// Servidor corriendo en otro thread
struct TestServer {
    dir: TempDir,
    addr: SocketAddr,
    handle: ShutdownHandle,
    thread: JoinHandle<Result<(), ServerError>>,
    audit: Arc<MemoryAudit>,
}

impl TestServer {
    fn start(threads: usize, fairness: usize) -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = Config {
            port: 0,
            data_dir: dir.path().to_string_lossy().to_string(),
            threads,
            fairness,
            ..Config::default()
        };

        let audit = Arc::new(MemoryAudit::new());
        let server = Server::bind(config)
            .expect("bind")
            .with_audit(audit.clone());
        let addr = server.local_addr().expect("local_addr");
        let handle = server.shutdown_handle().expect("shutdown handle");
        let thread = thread::spawn(move || server.run());

        Self {
            dir,
            addr,
            handle,
            thread,
            audit,
        }
    }

    fn stop(self) -> Arc<MemoryAudit> {
        self.handle.shutdown();
        self.thread.join().expect("dispatcher panicked").expect("server error");
        self.audit
    }
}

/// Helper: envía bytes crudos y retorna la response completa
fn send_raw(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).expect("connect");
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    stream.write_all(raw).unwrap();
    stream.shutdown(std::net::Shutdown::Write).unwrap();

    let mut response = Vec::new();
    stream.read_to_end(&mut response).unwrap();
    response
}

fn get(addr: SocketAddr, path: &str, id: u64) -> (u16, Vec<u8>) {
    let raw = format!("GET {} HTTP/1.1\r\nRequest-Id: {}\r\n\r\n", path, id);
    split_response(&send_raw(addr, raw.as_bytes()))
}

fn put(addr: SocketAddr, path: &str, id: u64, body: &[u8]) -> (u16, Vec<u8>) {
    let mut raw = format!(
        "PUT {} HTTP/1.1\r\nContent-Length: {}\r\nRequest-Id: {}\r\n\r\n",
        path,
        body.len(),
        id
    )
    .into_bytes();
    raw.extend_from_slice(body);
    split_response(&send_raw(addr, &raw))
}

/// Helper: separa código de estado y body
fn split_response(response: &[u8]) -> (u16, Vec<u8>) {
    let head_end = response
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response without header terminator");
    let head = String::from_utf8_lossy(&response[..head_end]);
    let status = head
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .expect("status code");

    (status, response[head_end + 4..].to_vec())
}

#[test]
fn test_get_missing_file() {
    let server = TestServer::start(2, 1);

    let (status, body) = get(server.addr, "/nope.txt", 1);
    assert_eq!(status, 404);
    assert_eq!(body, b"Not Found\n");

    let audit = server.stop();
    assert_eq!(audit.last().unwrap().to_csv(), "GET,/nope.txt,404,1");
}

#[test]
fn test_put_create_then_overwrite() {
    let server = TestServer::start(2, 1);

    let (status, _) = put(server.addr, "/a.txt", 1, b"primera version larga");
    assert_eq!(status, 201);

    let (status, _) = put(server.addr, "/a.txt", 2, b"corta");
    assert_eq!(status, 200);

    let (status, body) = get(server.addr, "/a.txt", 3);
    assert_eq!(status, 200);
    assert_eq!(body, b"corta");

    let on_disk = std::fs::read(server.dir.path().join("a.txt")).unwrap();
    assert_eq!(on_disk, b"corta");

    let audit = server.stop();
    let lines: Vec<String> = audit.records().iter().map(|r| r.to_csv()).collect();
    assert_eq!(lines, vec!["PUT,/a.txt,201,1", "PUT,/a.txt,200,2", "GET,/a.txt,200,3"]);
}

#[test]
fn test_get_directory_is_forbidden() {
    let server = TestServer::start(2, 1);
    std::fs::create_dir(server.dir.path().join("sub")).unwrap();

    let (status, _) = get(server.addr, "/sub", 7);
    assert_eq!(status, 403);

    server.stop();
}

#[test]
fn test_protocol_errors() {
    let server = TestServer::start(2, 1);

    let (status, _) = split_response(&send_raw(server.addr, b"DELETE /a.txt HTTP/1.1\r\n\r\n"));
    assert_eq!(status, 501);

    let (status, _) = split_response(&send_raw(server.addr, b"GET /a.txt HTTP/2.0\r\n\r\n"));
    assert_eq!(status, 505);

    let (status, _) = split_response(&send_raw(server.addr, b"\x00\x01garbage\r\n\r\n"));
    assert_eq!(status, 400);

    let (status, _) = split_response(&send_raw(server.addr, b"PUT /a.txt HTTP/1.1\r\n\r\n"));
    assert_eq!(status, 400);

    // Los errores de protocolo y los 501 no se auditan
    let audit = server.stop();
    assert!(audit.records().is_empty());
}

#[test]
fn test_concurrent_readers_never_see_partial_writes() {
    const SIZE: usize = 64 * 1024;
    let server = TestServer::start(4, 1);
    put(server.addr, "/shared.bin", 0, &vec![b'a'; SIZE]);

    let mut clients = Vec::new();
    for i in 0..12u64 {
        let addr = server.addr;
        clients.push(thread::spawn(move || {
            for j in 0..5u64 {
                let id = i * 100 + j;
                if i % 3 == 0 {
                    let fill = b'a' + (id % 26) as u8;
                    let (status, _) = put(addr, "/shared.bin", id, &vec![fill; SIZE]);
                    assert_eq!(status, 200);
                } else {
                    let (status, body) = get(addr, "/shared.bin", id);
                    assert_eq!(status, 200);
                    assert_eq!(body.len(), SIZE);
                    assert!(body.iter().all(|&b| b == body[0]), "torn read");
                }
            }
        }));
    }

    for client in clients {
        client.join().unwrap();
    }

    let audit = server.stop();
    assert_eq!(audit.records().len(), 1 + 12 * 5);
}

#[test]
fn test_distinct_resources_in_parallel() {
    let server = TestServer::start(4, 2);

    let mut clients = Vec::new();
    for i in 0..8u64 {
        let addr = server.addr;
        clients.push(thread::spawn(move || {
            let path = format!("/file-{}.txt", i);
            let content = format!("contenido {}", i);

            assert_eq!(put(addr, &path, i, content.as_bytes()).0, 201);
            let (status, body) = get(addr, &path, i);
            assert_eq!(status, 200);
            assert_eq!(body, content.as_bytes());
        }));
    }

    for client in clients {
        client.join().unwrap();
    }

    let audit = server.stop();
    assert_eq!(audit.records().len(), 16);
}

#[test]
fn test_shutdown_with_idle_server() {
    let server = TestServer::start(3, 1);
    let audit = server.stop();
    assert!(audit.records().is_empty());
}
