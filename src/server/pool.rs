//! # Pool de Workers
//! src/server/pool.rs
//!
//! N threads de vida larga. Cada uno repite:
//!
//! 1. Sacar una conexión de la cola (bloquea si está vacía)
//! 2. Atenderla con el `RequestHandler`
//! 3. Cerrarla (al soltar el stream)
//!
//! Cuando la cola se cierra y queda vacía, `pop` retorna `None` y el worker
//! termina.

use crate::handler::RequestHandler;
use crate::sync::BoundedQueue;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Conjunto de workers que consumen la cola de conexiones
pub struct WorkerPool {
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Lanza `size` workers sobre la cola dada
    ///
    /// Si no se puede crear algún thread, la cola se cierra y se espera a
    /// los workers ya lanzados antes de retornar el error.
    pub fn spawn<S>(size: usize, queue: BoundedQueue<S>, handler: Arc<RequestHandler>) -> io::Result<Self>
    where
        S: Read + Write + Send + 'static,
    {
        Self::spawn_with(size, queue, handler, |name, work| {
            thread::Builder::new().name(name).spawn(work)
        })
    }

    fn spawn_with<S, F>(
        size: usize,
        queue: BoundedQueue<S>,
        handler: Arc<RequestHandler>,
        mut spawner: F,
    ) -> io::Result<Self>
    where
        S: Read + Write + Send + 'static,
        F: FnMut(String, Box<dyn FnOnce() + Send>) -> io::Result<JoinHandle<()>>,
    {
        let mut pool = Self {
            workers: Vec::with_capacity(size),
        };

        for i in 0..size {
            let worker_queue = queue.clone();
            let handler = Arc::clone(&handler);
            let work = Box::new(move || Self::worker_loop(i, worker_queue, handler));

            match spawner(format!("worker-{}", i), work) {
                Ok(worker) => pool.workers.push(worker),
                Err(e) => {
                    tracing::error!(worker = i, error = %e, "failed to spawn worker");
                    queue.close();
                    pool.join();
                    return Err(e);
                }
            }
        }

        Ok(pool)
    }

    /// Loop principal del worker
    fn worker_loop<S: Read + Write>(id: usize, queue: BoundedQueue<S>, handler: Arc<RequestHandler>) {
        tracing::debug!(worker = id, "worker started");
        let mut served = 0u64;

        while let Some(stream) = queue.pop() {
            if let Some(status) = handler.handle_connection(stream) {
                tracing::trace!(worker = id, status = status.as_u16(), "connection served");
            }
            served += 1;
        }

        tracing::debug!(worker = id, served, "worker stopped");
    }

    /// Número de workers
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Espera a que todos los workers terminen
    ///
    /// Sólo retorna después de que la cola se cerró. Retorna cuántos
    /// workers terminaron con pánico.
    pub fn join(self) -> usize {
        let mut panicked = 0;
        for worker in self.workers {
            if worker.join().is_err() {
                panicked += 1;
            }
        }
        panicked
    }
}
