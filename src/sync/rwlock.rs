//! # Lock Lector/Escritor con Equidad N-way
//! src/sync/rwlock.rs
//!
//! Lock para un solo recurso: admite muchos lectores simultáneos o un único
//! escritor exclusivo.
//!
//! ## Política de equidad
//!
//! El contador de rotación cuenta los lectores admitidos desde el último
//! escritor. Mientras haya escritores esperando, como máximo `n` lectores
//! entran antes de que el siguiente turno sea de un escritor. A la inversa,
//! un escritor que llega mientras hay lectores esperando les deja su turno
//! de hasta `n` lectores antes de entrar.
//!
//! Con `n = 1` (valor por defecto) un escritor en espera bloquea a todos los
//! lectores nuevos: prioridad estricta de escritores.
//!
//! ```text
//!   lectores: R R R ... (hasta n) | W | R ... (hasta n) | W | ...
//! ```
//!
//! La liberación se hace con guards RAII: soltar el guard libera el lock,
//! así que ningún camino de error puede dejarlo tomado.

use std::sync::{Condvar, Mutex, MutexGuard};

/// Estado interno protegido por el mutex
#[derive(Debug, Default)]
struct LockState {
    /// Lectores dentro de la sección crítica
    active_readers: usize,

    /// Hay un escritor dentro
    writer_active: bool,

    /// Lectores bloqueados en `acquire_read`
    waiting_readers: usize,

    /// Escritores bloqueados en `acquire_write`
    waiting_writers: usize,

    /// Lectores admitidos desde el último escritor
    reads_since_writer: usize,
}

/// Foto del estado del lock (para observabilidad y pruebas)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStats {
    pub active_readers: usize,
    pub writer_active: bool,
    pub waiting_readers: usize,
    pub waiting_writers: usize,
}

/// Lock lector/escritor con umbral de rotación N
#[derive(Debug)]
pub struct FairRwLock {
    state: Mutex<LockState>,

    /// Donde esperan los lectores
    readers_cv: Condvar,

    /// Donde esperan los escritores
    writers_cv: Condvar,

    /// Máximo de lectores consecutivos con un escritor esperando
    n: usize,
}

impl FairRwLock {
    /// Crea un lock con umbral `n` (se fuerza a >= 1)
    pub fn new(n: usize) -> Self {
        Self {
            state: Mutex::new(LockState::default()),
            readers_cv: Condvar::new(),
            writers_cv: Condvar::new(),
            n: n.max(1),
        }
    }

    /// Umbral de rotación configurado
    pub fn fairness(&self) -> usize {
        self.n
    }

    fn lock_state(&self) -> MutexGuard<'_, LockState> {
        // Nadie entra en pánico con el mutex tomado salvo por una violación
        // de invariante, que de todos modos aborta el proceso.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn reader_may_enter(&self, state: &LockState) -> bool {
        !state.writer_active
            && (state.waiting_writers == 0 || state.reads_since_writer < self.n)
    }

    fn writer_may_enter(&self, state: &LockState) -> bool {
        !state.writer_active
            && state.active_readers == 0
            && (state.waiting_readers == 0 || state.reads_since_writer >= self.n)
    }

    /// Adquiere el lock en modo lectura
    ///
    /// Bloquea mientras haya un escritor activo, o mientras haya escritores
    /// esperando y ya se hayan admitido `n` lectores desde el último escritor.
    pub fn acquire_read(&self) -> ReadGuard<'_> {
        let mut state = self.lock_state();

        if !self.reader_may_enter(&state) {
            state.waiting_readers += 1;
            while !self.reader_may_enter(&state) {
                state = self
                    .readers_cv
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
            }
            state.waiting_readers -= 1;
        }

        state.active_readers += 1;
        state.reads_since_writer = state.reads_since_writer.saturating_add(1);

        // Un escritor pudo haber quedado esperando el turno de este lector
        if state.waiting_readers == 0 && state.waiting_writers > 0 {
            self.writers_cv.notify_all();
        }

        ReadGuard { lock: self }
    }

    /// Libera un permiso de lectura
    fn release_read(&self) {
        let mut state = self.lock_state();

        assert!(
            state.active_readers > 0,
            "FairRwLock: release_read sin lectores activos"
        );
        assert!(
            !state.writer_active,
            "FairRwLock: lector liberando con un escritor activo"
        );

        state.active_readers -= 1;

        if state.active_readers == 0 && state.waiting_writers > 0 {
            // Solo uno de los escritores pasará; el resto vuelve a dormir
            self.writers_cv.notify_all();
        }
    }

    /// Adquiere el lock en modo escritura exclusiva
    ///
    /// Bloquea mientras haya lectores activos o un escritor activo. Al entrar
    /// reinicia el contador de rotación.
    pub fn acquire_write(&self) -> WriteGuard<'_> {
        let mut state = self.lock_state();

        if !self.writer_may_enter(&state) {
            state.waiting_writers += 1;
            while !self.writer_may_enter(&state) {
                state = self
                    .writers_cv
                    .wait(state)
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
            }
            state.waiting_writers -= 1;
        }

        state.writer_active = true;
        state.reads_since_writer = 0;

        WriteGuard { lock: self }
    }

    /// Libera el permiso de escritura
    fn release_write(&self) {
        let mut state = self.lock_state();

        assert!(
            state.writer_active,
            "FairRwLock: release_write sin escritor activo"
        );
        assert_eq!(
            state.active_readers, 0,
            "FairRwLock: escritor activo coexistiendo con lectores"
        );

        state.writer_active = false;

        // Turno de los lectores (hasta n); si no hay, de un escritor
        if state.waiting_readers > 0 {
            self.readers_cv.notify_all();
        } else if state.waiting_writers > 0 {
            self.writers_cv.notify_one();
        }
    }

    /// Foto del estado actual
    pub fn stats(&self) -> LockStats {
        let state = self.lock_state();
        LockStats {
            active_readers: state.active_readers,
            writer_active: state.writer_active,
            waiting_readers: state.waiting_readers,
            waiting_writers: state.waiting_writers,
        }
    }
}

impl Default for FairRwLock {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Permiso de lectura; se libera al soltarlo
#[must_use = "el lock se libera en cuanto se suelta el guard"]
#[derive(Debug)]
pub struct ReadGuard<'a> {
    lock: &'a FairRwLock,
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_read();
    }
}

/// Permiso de escritura; se libera al soltarlo
#[must_use = "el lock se libera en cuanto se suelta el guard"]
#[derive(Debug)]
pub struct WriteGuard<'a> {
    lock: &'a FairRwLock,
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        self.lock.release_write();
    }
}
