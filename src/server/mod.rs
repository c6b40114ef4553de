//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! 1. `tcp`: escucha en un puerto y encola cada conexión aceptada
//! 2. `pool`: N workers que sacan conexiones de la cola y las atienden
//!
//! El apagado es ordenado: se deja de aceptar, se cierra la cola y los
//! workers terminan después de vaciarla.

pub mod pool;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use pool::WorkerPool;
pub use tcp::{Server, ShutdownHandle};
