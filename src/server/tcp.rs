//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Une todas las piezas: un hilo acepta conexiones y las entrega a un pool
//! fijo de workers a través de la cola acotada. Cada worker atiende una
//! request por conexión.
//!
//! El loop de aceptación revisa la bandera de apagado entre intentos de
//! `accept`; al activarse deja de aceptar, cierra la cola y retorna.

use super::handler::ConnectionHandler;
use super::listener::{Accepted, Connection, Listener};
use super::pool::WorkerPool;
use super::ServerError;
use crate::config::Config;
use crate::metrics::{Entity, EventLog, ServerStats};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{debug, info, warn};

/// Servidor HTTP/1.0 de archivos estáticos
pub struct Server {
    config: Config,
    stats: Arc<ServerStats>,
    events: Arc<EventLog>,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Crea el servidor; falla si la configuración es inválida o si no se
    /// puede abrir el archivo del log de eventos
    pub fn new(config: Config) -> Result<Self, ServerError> {
        config.validate().map_err(ServerError::Config)?;

        let workers = config.effective_workers();
        if config.workers > workers {
            warn!(requested = config.workers, workers, "Demasiados workers, se usará el máximo");
        }

        let events = match (&config.log, &config.log_file) {
            (false, _) => EventLog::disabled(),
            (true, None) => EventLog::stdout(workers),
            (true, Some(path)) => {
                EventLog::file(workers, path).map_err(|source| ServerError::EventLog {
                    path: path.display().to_string(),
                    source,
                })?
            }
        };

        Ok(Self::with_event_log(config, events))
    }

    /// Crea el servidor con un log de eventos ya construido
    pub fn with_event_log(config: Config, events: EventLog) -> Self {
        Self {
            config,
            stats: Arc::new(ServerStats::new()),
            events: Arc::new(events),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Contadores compartidos con los workers
    pub fn stats(&self) -> Arc<ServerStats> {
        Arc::clone(&self.stats)
    }

    /// Bandera que detiene el loop de aceptación al ponerse en `true`
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Crea el socket de escucha y atiende hasta que se pida apagar
    pub fn run(&self) -> Result<(), ServerError> {
        let address = self.config.address();
        let listener = Listener::bind(&address, self.config.accept_poll())?;

        info!(%address, root = %self.config.root.display(), "Servidor escuchando");

        self.serve(listener)
    }

    /// Loop de aceptación sobre un listener ya creado
    pub fn serve(&self, mut listener: Listener) -> Result<(), ServerError> {
        let workers = self.config.effective_workers();
        let handler = Arc::new(ConnectionHandler::from_config(
            &self.config,
            Arc::clone(&self.stats),
            Arc::clone(&self.events),
        ));

        let pool = WorkerPool::spawn(
            workers,
            self.config.queue_capacity,
            move |worker, connection: Connection| handler.serve(worker, connection),
        )
        .map_err(ServerError::Spawn)?;

        info!(workers, queue_capacity = self.config.queue_capacity, "Workers listos");

        let mut idle = false;
        while !self.shutdown.load(Ordering::Relaxed) {
            if !idle {
                self.events
                    .record(Entity::Acceptor, None, "Sleep", "Waiting for connection");
                idle = true;
            }

            let connection = match listener.accept() {
                Ok(Accepted::Connection(connection)) => connection,
                Ok(Accepted::Timeout) => continue,
                Err(e) => {
                    warn!(error = %e, "Error al aceptar conexión");
                    thread::sleep(self.config.accept_poll());
                    continue;
                }
            };
            idle = false;

            let id = connection.id;
            debug!(conn = id, peer = %connection.peer, "Conexión aceptada");
            self.events
                .record(Entity::Acceptor, Some(id), "Running", "New connection accepted");

            if pool.queue().is_full() {
                debug!(conn = id, "Cola llena, esperando a un worker");
            }

            // Bloquea mientras la cola esté llena
            if pool.submit(connection).is_err() {
                break;
            }

            self.events
                .record(Entity::Acceptor, Some(id), "Ready", "Client added to queue");
        }

        info!("Apagando: no se aceptan más conexiones");
        pool.close();

        Ok(())
    }
}
