//! # File Server - Entry Point
//! src/main.rs
//!
//! Punto de entrada del servidor HTTP/1.0 de archivos.
//!
//! Lee la configuración, arranca el servidor y espera a que el operador
//! escriba `q` en stdin. Al apagar imprime el reporte de estadísticas.

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use file_server::config::Config;
use file_server::server::Server;
use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use tracing::{info, warn};

fn main() -> Result<()> {
    let config = Config::parse();
    config
        .validate()
        .map_err(|e| anyhow!(e))
        .context("Configuración inválida")?;

    let level = config.level().map_err(|e| anyhow!(e))?;
    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(io::stderr)
        .with_max_level(level)
        .init();

    // La tabla de eventos en stdout no se mezcla con el resumen
    if !(config.log && config.log_file.is_none()) {
        config.print_summary();
    }

    let stats_file = config.stats_file.clone();
    let stats_format = config.stats_format;

    let server = Server::new(config).context("No se pudo crear el servidor")?;
    spawn_quit_watcher(server.shutdown_handle()).context("No se pudo leer stdin")?;

    server.run()?;

    info!("Servidor detenido");
    server
        .stats()
        .write_report(stats_file.as_deref(), stats_format)
        .context("No se pudo escribir el reporte de estadísticas")?;

    Ok(())
}

/// Activa `shutdown` cuando se lee una línea `q` o `Q` en stdin
///
/// Fin de stdin no apaga el servidor (permite correrlo sin terminal).
fn spawn_quit_watcher(shutdown: Arc<AtomicBool>) -> io::Result<thread::JoinHandle<()>> {
    thread::Builder::new()
        .name("quit-watcher".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) if line.trim().eq_ignore_ascii_case("q") => {
                        info!("Apagado solicitado");
                        shutdown.store(true, Ordering::Relaxed);
                        return;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!(error = %e, "Error leyendo stdin");
                        return;
                    }
                }
            }
        })
}
