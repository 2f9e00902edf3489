//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración del servidor de archivos con soporte para argumentos CLI
//! y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./file_server --port 8000 \
//!   --root ./www \
//!   --workers 8 \
//!   --queue-capacity 256 \
//!   --log --log-file events.log
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! HTTP_PORT=8000 SERVE_ROOT=./www WORKERS=8 ./file_server
//! ```

use crate::metrics::StatsFormat;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Máximo de workers; valores mayores se recortan
pub const MAX_WORKERS: usize = 64;

/// Configuración del servidor HTTP/1.0 de archivos
#[derive(Debug, Clone, Parser)]
#[command(name = "file_server")]
#[command(about = "Servidor HTTP/1.0 de archivos estáticos con pool de workers")]
#[command(version = "0.1.0")]
pub struct Config {
    /// Puerto en el que escucha el servidor
    #[arg(short, long, default_value = "8000", env = "HTTP_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "0.0.0.0", env = "HTTP_HOST")]
    pub host: String,

    /// Directorio raíz de los archivos servidos
    #[arg(short, long, default_value = "./www", env = "SERVE_ROOT")]
    pub root: PathBuf,

    // === Workers y cola ===

    /// Número de workers (máximo 64)
    #[arg(short, long, default_value = "4", env = "WORKERS")]
    pub workers: usize,

    /// Capacidad de la cola de conexiones pendientes
    #[arg(long = "queue-capacity", default_value = "128", env = "QUEUE_CAPACITY")]
    pub queue_capacity: usize,

    /// Documento servido para rutas que terminan en `/`
    #[arg(long = "default-document", default_value = "index.html", env = "DEFAULT_DOCUMENT")]
    pub default_document: String,

    /// Intervalo en ms con el que el aceptador revisa la señal de apagado
    #[arg(long = "accept-poll-ms", default_value = "10", env = "ACCEPT_POLL_MS")]
    pub accept_poll_ms: u64,

    // === Diagnóstico ===

    /// Habilita la tabla de estados por worker
    #[arg(short, long, env = "EVENT_LOG")]
    pub log: bool,

    /// Escribe la tabla de estados en un archivo en vez de stdout
    #[arg(long = "log-file", env = "EVENT_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Agrega el reporte final de estadísticas a este archivo
    #[arg(long = "stats-file", env = "STATS_FILE")]
    pub stats_file: Option<PathBuf>,

    /// Formato del reporte de estadísticas
    #[arg(long = "stats-format", value_enum, default_value_t = StatsFormat::Text, env = "STATS_FORMAT")]
    pub stats_format: StatsFormat,

    /// Nivel máximo de logs (error, warn, info, debug, trace)
    #[arg(long = "log-level", default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,
}

impl Config {
    /// Dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use file_server::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "0.0.0.0:8000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Workers realmente lanzados
    pub fn effective_workers(&self) -> usize {
        self.workers.min(MAX_WORKERS)
    }

    pub fn accept_poll(&self) -> Duration {
        Duration::from_millis(self.accept_poll_ms)
    }

    /// Nivel de `tracing` configurado
    pub fn level(&self) -> Result<Level, String> {
        self.log_level
            .parse::<Level>()
            .map_err(|_| format!("Unknown log level '{}'", self.log_level))
    }

    /// Valida la configuración
    ///
    /// Retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == 0 {
            return Err("Workers must be >= 1".to_string());
        }

        if self.queue_capacity == 0 {
            return Err("Queue capacity must be >= 1".to_string());
        }

        if !(1..=1000).contains(&self.accept_poll_ms) {
            return Err("Accept poll must be 1-1000 ms".to_string());
        }

        let document = &self.default_document;
        if document.is_empty() || document.contains('/') || document.contains("..") {
            return Err(format!("Default document '{}' must be a plain file name", document));
        }

        self.level()?;

        Ok(())
    }

    /// Imprime un resumen de la configuración
    pub fn print_summary(&self) {
        println!("╔══════════════════════════════════════════════════════════════╗");
        println!("║           HTTP/1.0 File Server Configuration                 ║");
        println!("╚══════════════════════════════════════════════════════════════╝");
        println!();
        println!("🌐 Network:");
        println!("   Address:      {}", self.address());
        println!("   Root:         {}", self.root.display());
        println!("   Default doc:  {}", self.default_document);
        println!();
        println!("👷 Workers & Queue:");
        println!("   Workers:      {}", self.effective_workers());
        println!("   Queue cap:    {}", self.queue_capacity);
        println!("   Accept poll:  {} ms", self.accept_poll_ms);
        println!();
        println!("📊 Diagnostics:");
        match (&self.log, &self.log_file) {
            (false, _) => println!("   Event log:    disabled"),
            (true, None) => println!("   Event log:    stdout"),
            (true, Some(path)) => println!("   Event log:    {}", path.display()),
        }
        match &self.stats_file {
            Some(path) => println!("   Stats:        {} ({:?})", path.display(), self.stats_format),
            None => println!("   Stats:        stdout ({:?})", self.stats_format),
        }
        println!();
        println!("Escriba 'q' y Enter para detener el servidor");
        println!("═══════════════════════════════════════════════════════════════");
        println!();
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 8000,
            host: "0.0.0.0".to_string(),
            root: PathBuf::from("./www"),
            workers: 4,
            queue_capacity: 128,
            default_document: "index.html".to_string(),
            accept_poll_ms: 10,
            log: false,
            log_file: None,
            stats_file: None,
            stats_format: StatsFormat::Text,
            log_level: "info".to_string(),
        }
    }
}
