//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor con soporte para argumentos CLI y variables
//! de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./httpserver -t 8 --data-dir ./data --fairness 2 8080
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8080 WORKER_THREADS=8 ./httpserver
//! ```

use crate::audit::AuditFormat;
use crate::error::ConfigError;
use clap::Parser;

/// Puertos reservados (no se permiten)
pub const MIN_PORT: u16 = 1024;

/// Configuración del servidor de archivos
#[derive(Debug, Clone, Parser)]
#[command(name = "httpserver")]
#[command(about = "Servidor HTTP concurrente de archivos (GET/PUT) con locks por recurso")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(value_name = "PORT", default_value = "8080", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "HTTP_HOST")]
    pub host: String,

    /// Directorio donde se guardan/leen archivos
    #[arg(long, default_value = ".", env = "DATA_DIR")]
    pub data_dir: String,

    // === Workers ===

    /// Número de threads worker
    #[arg(short = 't', long = "threads", default_value = "4", env = "WORKER_THREADS")]
    pub threads: usize,

    // === Cola ===

    /// Capacidad de la cola de conexiones (por defecto, igual a --threads)
    #[arg(long = "queue-capacity", env = "QUEUE_CAPACITY")]
    pub queue_capacity: Option<usize>,

    // === Locks ===

    /// Máximo de lectores consecutivos mientras un escritor espera
    #[arg(long = "fairness", default_value = "1", env = "RWLOCK_FAIRNESS")]
    pub fairness: usize,

    // === Logging ===

    /// Formato del log de auditoría (stderr)
    #[arg(long = "audit-format", value_enum, default_value = "csv", env = "AUDIT_FORMAT")]
    pub audit_format: AuditFormat,

    /// Nivel del log operacional (error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: tracing::Level,
}

impl Config {
    /// Crea una nueva configuración parseando argumentos CLI
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use httpserver::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Capacidad efectiva de la cola
    pub fn effective_queue_capacity(&self) -> usize {
        self.queue_capacity.unwrap_or(self.threads)
    }

    /// Valida la configuración
    ///
    /// Cualquier error aquí es fatal para el arranque.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.threads == 0 {
            return Err(ConfigError::InvalidThreads(self.threads));
        }

        if self.port < MIN_PORT {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.effective_queue_capacity() == 0 {
            return Err(ConfigError::InvalidQueueCapacity(0));
        }

        if self.fairness == 0 {
            return Err(ConfigError::InvalidFairness(self.fairness));
        }

        if !std::path::Path::new(&self.data_dir).is_dir() {
            return Err(ConfigError::InvalidDataDir(self.data_dir.clone()));
        }

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║              HTTP File Server Configuration                  ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      {}", self.address());
        println!("   Data dir:     {}", self.data_dir);
        println!();
        println!("👷 Workers & Queue:");
        println!("   Threads:      {}", self.threads);
        println!("   Queue cap:    {}", self.effective_queue_capacity());
        println!();
        println!("🔒 Locks:");
        println!("   Fairness N:   {} reader(s) per waiting writer", self.fairness);
        println!();
        println!("📝 Logging:");
        println!("   Audit:        {:?} on stderr", self.audit_format);
        println!("   Level:        {}", self.log_level);
        println!();
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8080,
            host: "127.0.0.1".to_string(),
            data_dir: ".".to_string(),
            threads: 4,
            queue_capacity: None,
            fairness: 1,
            audit_format: AuditFormat::Csv,
            log_level: tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.threads, 4);
        assert_eq!(config.fairness, 1);
        assert_eq!(config.audit_format, AuditFormat::Csv);
    }

    #[test]
    fn test_address() {
        let config = Config::default();
        assert_eq!(config.address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "0.0.0.0".to_string();
        config.port = 3000;
        assert_eq!(config.address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_validate_success() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_queue_capacity_defaults_to_threads() {
        let mut config = Config::default();
        config.threads = 7;
        assert_eq!(config.effective_queue_capacity(), 7);

        config.queue_capacity = Some(32);
        assert_eq!(config.effective_queue_capacity(), 32);
    }

    // ==================== Validación ====================

    #[test]
    fn test_validate_invalid_threads() {
        let mut config = Config::default();
        config.threads = 0;
        let err = config.validate().unwrap_err();
        assert_eq!(err, ConfigError::InvalidThreads(0));
        assert!(err.to_string().contains("threads"));
    }

    #[test]
    fn test_validate_reserved_port() {
        let mut config = Config::default();
        config.port = 80;
        assert_eq!(config.validate().unwrap_err(), ConfigError::InvalidPort(80));

        config.port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_port_bounds() {
        let mut config = Config::default();
        config.port = 1024;
        assert!(config.validate().is_ok());

        config.port = 65535;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_invalid_queue_capacity() {
        let mut config = Config::default();
        config.queue_capacity = Some(0);
        assert_eq!(
            config.validate().unwrap_err(),
            ConfigError::InvalidQueueCapacity(0)
        );
    }

    #[test]
    fn test_validate_invalid_fairness() {
        let mut config = Config::default();
        config.fairness = 0;
        assert_eq!(config.validate().unwrap_err(), ConfigError::InvalidFairness(0));
    }

    #[test]
    fn test_validate_missing_data_dir() {
        let mut config = Config::default();
        config.data_dir = "/definitivamente/no/existe".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDataDir(_))
        ));
    }

    // ==================== CLI ====================

    #[test]
    fn test_parse_cli_args() {
        let config = Config::try_parse_from([
            "httpserver",
            "-t",
            "8",
            "--fairness",
            "3",
            "--audit-format",
            "json",
            "--log-level",
            "debug",
            "9000",
        ])
        .unwrap();

        assert_eq!(config.port, 9000);
        assert_eq!(config.threads, 8);
        assert_eq!(config.fairness, 3);
        assert_eq!(config.audit_format, AuditFormat::Json);
        assert_eq!(config.log_level, tracing::Level::DEBUG);
        assert_eq!(config.effective_queue_capacity(), 8);
    }

    #[test]
    fn test_parse_positional_port() {
        let config = Config::try_parse_from(["httpserver", "-t", "2", "9090"]).unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.threads, 2);

        // Sin puerto: el valor por defecto
        let config = Config::try_parse_from(["httpserver"]).unwrap();
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_parse_cli_rejects_non_numeric_threads() {
        assert!(Config::try_parse_from(["httpserver", "-t", "muchos"]).is_err());
    }

    #[test]
    fn test_config_print_summary() {
        let config = Config::default();
        // Should not panic
        config.print_summary();
    }
}
