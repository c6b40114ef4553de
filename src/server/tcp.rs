//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! El dispatcher: un único thread que acepta conexiones y las deja en la
//! cola acotada. Si la cola está llena, `push` bloquea y el dispatcher deja
//! de aceptar hasta que un worker libere un lugar.
//!
//! ```text
//! accept() → BoundedQueue<TcpStream> → WorkerPool → RequestHandler
//! ```

use super::pool::WorkerPool;
use crate::audit::{AuditSink, StderrAudit};
use crate::config::Config;
use crate::error::ServerError;
use crate::handler::RequestHandler;
use crate::sync::{BoundedQueue, LockRegistry, QueueClosed};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Servidor de archivos con pool de workers
pub struct Server {
    config: Config,
    listener: TcpListener,
    registry: Arc<LockRegistry>,
    queue: BoundedQueue<TcpStream>,
    audit: Arc<dyn AuditSink>,
    shutdown: Arc<AtomicBool>,
}

/// Permite detener un servidor que está corriendo en otro thread
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    addr: SocketAddr,
}

impl ShutdownHandle {
    /// Pide al dispatcher que deje de aceptar conexiones
    ///
    /// Las conexiones ya encoladas se atienden antes de que `run` retorne.
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);

        // Despertar el accept() bloqueado con una conexión propia
        if let Err(e) = TcpStream::connect(self.addr) {
            tracing::debug!(error = %e, "wake-up connection failed");
        }
    }

    /// Si ya se pidió detener el servidor
    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

impl Server {
    /// Hace bind del listener y prepara registro de locks y cola
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        let address = config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            addr: address.clone(),
            source,
        })?;

        let registry = Arc::new(LockRegistry::new(config.threads, config.fairness));
        let queue = BoundedQueue::new(config.effective_queue_capacity());
        let audit: Arc<dyn AuditSink> = Arc::new(StderrAudit::new(config.audit_format));

        tracing::info!(address = %address, "listening");

        Ok(Self {
            config,
            listener,
            registry,
            queue,
            audit,
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Reemplaza el destino de la auditoría (por defecto, stderr)
    pub fn with_audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    /// Dirección real del listener (útil con puerto 0)
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn shutdown_handle(&self) -> std::io::Result<ShutdownHandle> {
        let mut addr = self.local_addr()?;

        // No se puede conectar a 0.0.0.0 / :: en todas las plataformas
        if addr.ip().is_unspecified() {
            let loopback = match addr.ip() {
                IpAddr::V4(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
                IpAddr::V6(_) => IpAddr::V6(Ipv6Addr::LOCALHOST),
            };
            addr.set_ip(loopback);
        }

        Ok(ShutdownHandle {
            flag: Arc::clone(&self.shutdown),
            addr,
        })
    }

    pub fn registry(&self) -> &Arc<LockRegistry> {
        &self.registry
    }

    /// Lanza los workers y corre el dispatcher hasta que se pida detenerlo
    pub fn run(self) -> Result<(), ServerError> {
        let handler = Arc::new(RequestHandler::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.audit),
            &self.config.data_dir,
        ));
        let pool = WorkerPool::spawn(self.config.threads, self.queue.clone(), handler)?;

        tracing::info!(
            workers = pool.size(),
            queue_capacity = self.queue.capacity(),
            fairness = self.registry.fairness(),
            "server started"
        );

        for stream in self.listener.incoming() {
            if self.shutdown.load(Ordering::SeqCst) {
                break;
            }

            match stream {
                Ok(stream) => {
                    if let Ok(peer) = stream.peer_addr() {
                        tracing::debug!(peer = %peer, "connection accepted");
                    }

                    if let Err(QueueClosed(stream)) = self.queue.push(stream) {
                        drop(stream);
                        break;
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }

        tracing::info!(pending = self.queue.len(), "shutting down, draining queue");
        self.queue.close();

        match pool.join() {
            0 => {
                tracing::info!("server stopped");
                Ok(())
            }
            panicked => Err(ServerError::WorkerPanicked(panicked)),
        }
    }
}
