//! # Cola de Despacho Acotada
//! src/server/queue.rs
//!
//! Cola FIFO thread-safe de capacidad fija entre el hilo que acepta
//! conexiones (productor) y los workers (consumidores).
//!
//! - `push` bloquea mientras la cola está llena (backpressure)
//! - `pop` bloquea mientras la cola está vacía
//!
//! Un mutex protege el buffer y dos condvars (`not_empty`, `not_full`) se
//! usan solo para esperar/notificar.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Estado protegido por el mutex
struct QueueState<T> {
    /// Buffer circular de elementos encolados
    items: VecDeque<T>,

    /// Una cola cerrada no acepta más elementos
    closed: bool,
}

/// Cola bloqueante de capacidad fija
pub struct DispatchQueue<T> {
    state: Mutex<QueueState<T>>,

    /// Se notifica al encolar
    not_empty: Condvar,

    /// Se notifica al desencolar
    not_full: Condvar,

    /// Capacidad máxima de la cola
    capacity: usize,
}

impl<T> DispatchQueue<T> {
    /// Crea una nueva cola. Una capacidad 0 se trata como 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    // Cada operación deja el estado consistente, así que un panic de otro
    // hilo con el lock tomado no invalida la cola.
    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Encola al final, bloqueando mientras la cola esté llena
    ///
    /// Retorna `Err(item)` solo si la cola está (o se cierra) cerrada.
    pub fn push(&self, item: T) -> Result<(), T> {
        let mut state = self.lock();

        while state.items.len() >= self.capacity && !state.closed {
            state = self
                .not_full
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }

        if state.closed {
            return Err(item);
        }

        state.items.push_back(item);
        drop(state);

        // Despertar a un worker esperando
        self.not_empty.notify_one();
        Ok(())
    }

    /// Intenta encolar sin bloquear
    ///
    /// Retorna `Err(item)` si la cola está llena o cerrada.
    pub fn try_push(&self, item: T) -> Result<(), T> {
        let mut state = self.lock();

        if state.closed || state.items.len() >= self.capacity {
            return Err(item);
        }

        state.items.push_back(item);
        drop(state);

        self.not_empty.notify_one();
        Ok(())
    }

    /// Desencola del frente, bloqueando mientras la cola esté vacía
    ///
    /// Retorna `None` cuando la cola está cerrada y ya no quedan elementos.
    pub fn pop(&self) -> Option<T> {
        let mut state = self.lock();

        loop {
            if let Some(item) = state.items.pop_front() {
                drop(state);
                // Despertar a un productor esperando espacio
                self.not_full.notify_one();
                return Some(item);
            }

            if state.closed {
                return None;
            }

            state = self
                .not_empty
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Cierra la cola y despierta a todos los que esperan
    ///
    /// Los elementos ya encolados se siguen entregando con `pop`.
    pub fn close(&self) {
        self.lock().closed = true;
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Retorna el tamaño actual de la cola
    pub fn len(&self) -> usize {
        self.lock().items.len()
    }

    /// Verifica si la cola está vacía
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verifica si la cola está llena
    pub fn is_full(&self) -> bool {
        self.len() >= self.capacity
    }

    /// Verifica si la cola fue cerrada
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Retorna la capacidad máxima
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
