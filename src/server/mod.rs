//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! Pipeline de despacho de conexiones:
//!
//! ```text
//! Listener.accept() -> DispatchQueue.push() -> worker pop() -> ConnectionHandler -> close
//! ```
//!
//! Un solo hilo acepta conexiones y las encola; N workers las sacan de la
//! cola y atienden una request cada una. Si la cola se llena, el hilo que
//! acepta se bloquea (backpressure).

pub mod handler;
pub mod listener;
pub mod pool;
pub mod queue;
pub mod tcp;

use thiserror::Error;

// Re-exportar para facilitar el uso
pub use handler::{ConnectionHandler, Outcome};
pub use listener::{Accepted, Connection, Listener};
pub use pool::WorkerPool;
pub use queue::DispatchQueue;
pub use tcp::Server;

/// Errores fatales de arranque; los únicos que detienen el proceso
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("No se pudo escuchar en {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No se pudieron crear los workers: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("No se pudo abrir el log de eventos {path}: {source}")]
    EventLog {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuración inválida: {0}")]
    Config(String),
}
