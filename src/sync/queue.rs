//! # Cola Acotada de Conexiones
//! src/sync/queue.rs
//!
//! Cola FIFO thread-safe de capacidad fija entre el dispatcher (productor)
//! y los workers (consumidores).
//!
//! - `push` bloquea mientras la cola está llena
//! - `pop` bloquea mientras la cola está vacía
//! - `close` despierta a todos: los consumidores drenan lo pendiente y
//!   luego reciben `None`

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use thiserror::Error;

/// Error de `push` sobre una cola cerrada; devuelve el elemento
#[derive(Debug, Error, PartialEq, Eq)]
#[error("queue is closed")]
pub struct QueueClosed<T>(pub T);

/// Estado interno protegido por el mutex
struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Cola acotada bloqueante
pub struct BoundedQueue<T> {
    /// Elementos pendientes + bandera de cierre
    state: Arc<Mutex<QueueState<T>>>,

    /// Notifica a consumidores que hay elementos
    not_empty: Arc<Condvar>,

    /// Notifica a productores que hay espacio
    not_full: Arc<Condvar>,

    /// Capacidad máxima de la cola
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Crea una cola con capacidad máxima (se fuerza a >= 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Arc::new(Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            })),
            not_empty: Arc::new(Condvar::new()),
            not_full: Arc::new(Condvar::new()),
            capacity,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Encola un elemento al final
    ///
    /// Bloquea mientras la cola esté llena. Si la cola está (o queda)
    /// cerrada, devuelve el elemento dentro de `QueueClosed`.
    pub fn push(&self, item: T) -> Result<(), QueueClosed<T>> {
        let mut state = self.lock_state();

        while state.items.len() >= self.capacity && !state.closed {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }

        if state.closed {
            return Err(QueueClosed(item));
        }

        state.items.push_back(item);
        assert!(
            state.items.len() <= self.capacity,
            "BoundedQueue: tamaño por encima de la capacidad"
        );

        // Notificar a un worker esperando
        self.not_empty.notify_one();

        Ok(())
    }

    /// Desencola el elemento más antiguo
    ///
    /// Bloquea hasta que haya un elemento. Retorna `None` sólo cuando la
    /// cola está cerrada y vacía.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock_state();

        loop {
            if let Some(item) = state.items.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }

            if state.closed {
                return None;
            }

            // Esperar a que haya elementos
            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(|poisoned| poisoned.into_inner());
        }
    }

    /// Intenta desencolar sin bloquear
    pub fn try_pop(&self) -> Option<T> {
        let mut state = self.lock_state();
        let item = state.items.pop_front();
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Cierra la cola: no admite más elementos y despierta a todos
    pub fn close(&self) {
        let mut state = self.lock_state();
        state.closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Verifica si la cola fue cerrada
    pub fn is_closed(&self) -> bool {
        self.lock_state().closed
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.lock_state().items.len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Retorna la capacidad máxima
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Verifica si la cola está llena
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }
}

impl<T> Clone for BoundedQueue<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            not_empty: Arc::clone(&self.not_empty),
            not_full: Arc::clone(&self.not_full),
            capacity: self.capacity,
        }
    }
}
