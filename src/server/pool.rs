//! # Pool de Workers
//! src/server/pool.rs
//!
//! N hilos de larga vida que repiten: sacar un trabajo de la cola,
//! procesarlo, volver a esperar. Cada trabajo se ejecuta dentro de
//! `catch_unwind`, así que un panic afecta solo a ese trabajo y el worker
//! sigue vivo.

use super::queue::DispatchQueue;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{debug, error};

/// Pool de workers alimentado por una [`DispatchQueue`]
pub struct WorkerPool<T> {
    queue: Arc<DispatchQueue<T>>,
    workers: Vec<JoinHandle<()>>,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Lanza `worker_count` workers que procesan trabajos con `job`
    ///
    /// `job` recibe el id del worker (0..N) y el trabajo desencolado.
    /// Falla solo si el sistema operativo no puede crear un hilo.
    pub fn spawn<F>(worker_count: usize, queue_capacity: usize, job: F) -> io::Result<Self>
    where
        F: Fn(usize, T) + Send + Sync + 'static,
    {
        let queue = Arc::new(DispatchQueue::new(queue_capacity));
        let job = Arc::new(job);
        let mut workers = Vec::with_capacity(worker_count);

        for worker_id in 0..worker_count {
            let worker_queue = Arc::clone(&queue);
            let job = Arc::clone(&job);

            let spawned = thread::Builder::new()
                .name(format!("worker-{}", worker_id))
                .spawn(move || Self::worker_loop(worker_id, &worker_queue, job.as_ref()));

            match spawned {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    // Liberar a los workers ya creados antes de fallar
                    queue.close();
                    return Err(e);
                }
            }
        }

        debug!(workers = worker_count, capacity = queue.capacity(), "Worker pool iniciado");

        Ok(Self { queue, workers })
    }

    fn worker_loop<F>(worker_id: usize, queue: &DispatchQueue<T>, job: &F)
    where
        F: Fn(usize, T),
    {
        while let Some(item) = queue.pop() {
            if panic::catch_unwind(AssertUnwindSafe(|| job(worker_id, item))).is_err() {
                error!(worker = worker_id, "Panic procesando un trabajo; el worker continúa");
            }
        }

        debug!(worker = worker_id, "Cola cerrada, worker termina");
    }

    /// Entrega un trabajo a los workers (bloquea si la cola está llena)
    ///
    /// Retorna `Err(item)` si el pool ya fue cerrado.
    pub fn submit(&self, item: T) -> Result<(), T> {
        self.queue.push(item)
    }

    /// La cola compartida con los workers
    pub fn queue(&self) -> &DispatchQueue<T> {
        &self.queue
    }

    /// Número de workers lanzados
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Cierra la cola: los workers terminan lo encolado y salen
    pub fn close(&self) {
        self.queue.close();
    }

    /// Cierra la cola y espera a que todos los workers terminen
    pub fn join(self) {
        self.queue.close();
        for worker in self.workers {
            // Los panics de los trabajos ya se atraparon en worker_loop
            let _ = worker.join();
        }
    }
}
