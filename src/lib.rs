//! # File Server
//! src/lib.rs
//!
//! Servidor HTTP/1.0 de archivos estáticos implementado desde cero para
//! demostrar conceptos de sistemas operativos: concurrencia con un pool
//! fijo de workers, sincronización productor/consumidor con una cola
//! acotada y backpressure.
//!
//! ## Arquitectura
//!
//! - `http`: parsing de requests, respuestas y rangos de bytes
//! - `files`: sanitización de rutas y tipos MIME
//! - `server`: listener, cola de despacho, pool de workers y handler
//! - `metrics`: estadísticas del servidor y log de eventos por worker
//! - `config`: argumentos CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use file_server::config::Config;
//! use file_server::server::Server;
//!
//! let server = Server::new(Config::default()).unwrap();
//! server.run().unwrap();
//! ```

pub mod config;
pub mod files;
pub mod http;
pub mod metrics;
pub mod server;
