//! # Log de Auditoría
//! src/audit/mod.rs
//!
//! Una línea por request atendido (GET/PUT), en stderr:
//!
//! ```text
//! GET,/archivo.txt,404,0
//! PUT,/nuevo.txt,201,17
//! ```
//!
//! También puede emitirse como JSON (`--audit-format json`). Escribir el
//! registro nunca hace fallar el request: los errores se descartan.

use serde::Serialize;
use std::io::Write;
use std::sync::Mutex;

/// Un request completado
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditRecord {
    /// Método ("GET" o "PUT")
    pub operation: String,

    /// Clave del recurso
    pub uri: String,

    /// Código de estado enviado
    pub status: u16,

    /// Valor del header Request-Id (0 si faltaba)
    pub request_id: u64,
}

impl AuditRecord {
    pub fn new(operation: &str, uri: &str, status: u16, request_id: u64) -> Self {
        Self {
            operation: operation.to_string(),
            uri: uri.to_string(),
            status,
            request_id,
        }
    }

    /// Formato CSV: `OP,URI,STATUS,ID`
    pub fn to_csv(&self) -> String {
        format!(
            "{},{},{},{}",
            self.operation, self.uri, self.status, self.request_id
        )
    }

    /// Formato JSON en una sola línea
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| self.to_csv())
    }
}

/// Formato de salida del log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum AuditFormat {
    #[default]
    Csv,
    Json,
}

/// Destino de los registros de auditoría
pub trait AuditSink: Send + Sync {
    /// Registra un request; nunca bloquea la respuesta por un error
    fn record(&self, record: &AuditRecord);
}

/// Escribe los registros en stderr
#[derive(Debug, Default)]
pub struct StderrAudit {
    format: AuditFormat,
}

impl StderrAudit {
    pub fn new(format: AuditFormat) -> Self {
        Self { format }
    }

    fn render(&self, record: &AuditRecord) -> String {
        match self.format {
            AuditFormat::Csv => record.to_csv(),
            AuditFormat::Json => record.to_json(),
        }
    }
}

impl AuditSink for StderrAudit {
    fn record(&self, record: &AuditRecord) {
        let line = self.render(record);
        // El lock de stderr mantiene cada línea entera entre threads
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", line);
    }
}

/// Acumula los registros en memoria
#[derive(Debug, Default)]
pub struct MemoryAudit {
    records: Mutex<Vec<AuditRecord>>,
}

impl MemoryAudit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copia de todos los registros hasta ahora
    pub fn records(&self) -> Vec<AuditRecord> {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Último registro
    pub fn last(&self) -> Option<AuditRecord> {
        self.records().pop()
    }
}

impl AuditSink for MemoryAudit {
    fn record(&self, record: &AuditRecord) {
        self.records
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(record.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_format() {
        let record = AuditRecord::new("GET", "/a.txt", 404, 0);
        assert_eq!(record.to_csv(), "GET,/a.txt,404,0");
    }

    #[test]
    fn test_json_format() {
        let record = AuditRecord::new("PUT", "/b.txt", 201, 12);
        let value: serde_json::Value = serde_json::from_str(&record.to_json()).unwrap();

        assert_eq!(value["operation"], "PUT");
        assert_eq!(value["uri"], "/b.txt");
        assert_eq!(value["status"], 201);
        assert_eq!(value["request_id"], 12);
    }

    #[test]
    fn test_stderr_render() {
        let record = AuditRecord::new("GET", "/a.txt", 200, 3);

        assert_eq!(StderrAudit::new(AuditFormat::Csv).render(&record), "GET,/a.txt,200,3");
        assert!(StderrAudit::new(AuditFormat::Json)
            .render(&record)
            .starts_with('{'));

        // No debe entrar en pánico
        StderrAudit::default().record(&record);
    }

    #[test]
    fn test_memory_audit() {
        let audit = MemoryAudit::new();
        audit.record(&AuditRecord::new("GET", "/a", 200, 1));
        audit.record(&AuditRecord::new("PUT", "/a", 201, 2));

        assert_eq!(audit.records().len(), 2);
        assert_eq!(audit.last().unwrap().status, 201);
    }
}
