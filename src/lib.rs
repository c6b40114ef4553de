//! # HTTP File Server
//! src/lib.rs
//!
//! Servidor HTTP concurrente de archivos (GET/PUT) implementado desde cero
//! para demostrar conceptos de sistemas operativos: sincronización con
//! locks lector/escritor justos, productor/consumidor sobre una cola
//! acotada y un pool de threads.
//!
//! ## Arquitectura
//!
//! - `sync`: lock lector/escritor N-way, registro de locks por URI y cola acotada
//! - `http`: parsing de requests y construcción de responses
//! - `handler`: atiende una conexión (GET/PUT) bajo el lock del recurso
//! - `server`: dispatcher TCP y pool de workers
//! - `audit`: una línea por request atendido
//! - `config` / `error`: configuración CLI y errores tipados
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use httpserver::config::Config;
//! use httpserver::server::Server;
//!
//! let config = Config::default();
//! let server = Server::bind(config).expect("Error al hacer bind");
//! server.run().expect("Error en el servidor");
//! ```

pub mod audit;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod server;
pub mod sync;
