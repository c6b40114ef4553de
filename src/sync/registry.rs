//! # Registro de Locks por Recurso
//! src/sync/registry.rs
//!
//! Mapa concurrente `clave de recurso -> FairRwLock`. Cada lock se crea de
//! forma perezosa en el primer acceso y nunca se elimina mientras viva el
//! proceso, así que su identidad es estable para todos los que lo toman.
//!
//! El mutex global sólo protege la estructura del mapa (buscar o insertar);
//! el lock devuelto se adquiere y se libera fuera de esa sección crítica.

use super::rwlock::FairRwLock;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Handle compartido a un lock del registro
pub type LockHandle = Arc<FairRwLock>;

/// Registro de locks por URI
pub struct LockRegistry {
    /// Mapa clave -> lock
    locks: Mutex<HashMap<String, LockHandle>>,

    /// Umbral N con el que se crean los locks nuevos
    fairness: usize,
}

impl LockRegistry {
    /// Crea un registro vacío
    ///
    /// `capacity` es una pista de tamaño inicial (el número de workers);
    /// el mapa crece si hace falta.
    pub fn new(capacity: usize, fairness: usize) -> Self {
        Self {
            locks: Mutex::new(HashMap::with_capacity(capacity)),
            fairness: fairness.max(1),
        }
    }

    fn lock_map(&self) -> MutexGuard<'_, HashMap<String, LockHandle>> {
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Retorna el lock único de `key`, creándolo si no existe
    ///
    /// Buscar e insertar ocurren bajo el mismo mutex: si dos threads piden
    /// por primera vez la misma clave, sólo uno crea el lock y ambos
    /// reciben la misma instancia.
    pub fn get_or_create(&self, key: &str) -> LockHandle {
        let mut locks = self.lock_map();

        if let Some(lock) = locks.get(key) {
            return Arc::clone(lock);
        }

        tracing::trace!(key, "creating resource lock");
        let lock = Arc::new(FairRwLock::new(self.fairness));
        locks.insert(key.to_string(), Arc::clone(&lock));
        lock
    }

    /// Verifica si ya existe un lock para `key`
    pub fn contains(&self, key: &str) -> bool {
        self.lock_map().contains_key(key)
    }

    /// Número de recursos registrados
    pub fn len(&self) -> usize {
        self.lock_map().len()
    }

    /// Verifica si el registro está vacío
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Umbral de equidad de los locks creados
    pub fn fairness(&self) -> usize {
        self.fairness
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new(16, 1)
    }
}
