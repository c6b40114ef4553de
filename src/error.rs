//! # Errores del Servidor
//! src/error.rs
//!
//! Errores tipados de arranque y de ejecución. Los errores de protocolo
//! viven en `http::request::ParseError`.

use thiserror::Error;

/// Valores de configuración inválidos
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("threads must be at least 1 (got {0})")]
    InvalidThreads(usize),

    #[error("port must be between 1024 and 65535 (got {0})")]
    InvalidPort(u16),

    #[error("queue capacity must be at least 1 (got {0})")]
    InvalidQueueCapacity(usize),

    #[error("fairness must be at least 1 (got {0})")]
    InvalidFairness(usize),

    #[error("data directory does not exist: {0}")]
    InvalidDataDir(String),
}

/// Fallos del servidor en `bind`/`run`
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} worker thread(s) panicked")]
    WorkerPanicked(usize),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
