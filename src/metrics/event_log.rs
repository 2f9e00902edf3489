//! # Log de Eventos por Entidad
//! src/metrics/event_log.rs
//!
//! Tabla de diagnóstico con el estado actual del hilo aceptador y de cada
//! worker. Cada evento actualiza el estado de una entidad y escribe una
//! fila completa:
//!
//! ```text
//! Timestamp    | Conn   | Acceptor   | Worker 0   | Worker 1   | Comments
//! ----------------------------------------------------------------------------
//! 15:02:11.412 | 7      | Ready      | Running    | Waiting    | GET /index.html
//! ```
//!
//! Es best-effort: errores de escritura se ignoran y un logger deshabilitado
//! no hace nada.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Quién produce el evento
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    /// El hilo que acepta conexiones
    Acceptor,
    /// Un worker del pool
    Worker(usize),
}

/// Estado mutable de la tabla
struct EventTable {
    /// Estado actual: índice 0 = aceptador, 1..=N = workers (inician en `Waiting`)
    states: Vec<String>,
    sink: Box<dyn Write + Send>,
}

/// Logger de eventos thread-safe
pub struct EventLog {
    table: Option<Mutex<EventTable>>,
}

impl EventLog {
    /// Logger que no registra nada
    pub fn disabled() -> Self {
        Self { table: None }
    }

    /// Tabla escrita en stdout
    pub fn stdout(worker_count: usize) -> Self {
        Self::with_writer(worker_count, Box::new(io::stdout()))
    }

    /// Tabla escrita en un archivo (se trunca al abrir)
    pub fn file(worker_count: usize, path: &Path) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self::with_writer(worker_count, Box::new(BufWriter::new(file))))
    }

    /// Tabla escrita en cualquier destino
    pub fn with_writer(worker_count: usize, mut sink: Box<dyn Write + Send>) -> Self {
        let _ = write_header(sink.as_mut(), worker_count);
        Self {
            table: Some(Mutex::new(EventTable {
                states: std::iter::once(String::from("Ready"))
                    .chain(std::iter::repeat(String::from("Waiting")).take(worker_count))
                    .collect(),
                sink,
            })),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.table.is_some()
    }

    /// Registra un cambio de estado de `entity`
    ///
    /// Ids de worker fuera de rango se ignoran.
    pub fn record(&self, entity: Entity, conn: Option<u64>, state: &str, comment: &str) {
        let table = match &self.table {
            Some(table) => table,
            None => return,
        };

        let mut table = table.lock().unwrap_or_else(PoisonError::into_inner);

        let slot = match entity {
            Entity::Acceptor => 0,
            Entity::Worker(id) if id + 1 < table.states.len() => id + 1,
            Entity::Worker(_) => return,
        };

        table.states[slot] = state.to_string();

        let timestamp = chrono::Local::now().format("%H:%M:%S%.3f").to_string();
        let conn = conn.map_or_else(|| String::from("-"), |id| id.to_string());

        let mut row = format!("{:<12} | {:<6}", timestamp, conn);
        for current in &table.states {
            row.push_str(&format!(" | {:<10}", current));
        }
        row.push_str(&format!(" | {}\n", comment));

        let _ = table.sink.write_all(row.as_bytes());
        let _ = table.sink.flush();
    }
}

fn write_header(sink: &mut dyn Write, worker_count: usize) -> io::Result<()> {
    let mut header = format!("{:<12} | {:<6} | {:<10}", "Timestamp", "Conn", "Acceptor");
    for worker in 0..worker_count {
        header.push_str(&format!(" | {:<10}", format!("Worker {}", worker)));
    }
    header.push_str(" | Comments\n");

    let separator = "-".repeat(header.len() + 10);

    sink.write_all(header.as_bytes())?;
    sink.write_all(separator.as_bytes())?;
    sink.write_all(b"\n")?;
    sink.flush()
}
