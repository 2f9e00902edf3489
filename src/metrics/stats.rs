//! # Estadísticas del Servidor
//! src/metrics/stats.rs
//!
//! Contadores atómicos que cualquier worker incrementa sin locks, más el
//! reporte final que se imprime al apagar el servidor.

use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::warn;

/// Formato del reporte final
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StatsFormat {
    /// Tabla legible
    Text,
    /// Un objeto JSON por reporte
    Json,
}

/// Contadores del servidor, seguros para incrementar desde cualquier hilo
#[derive(Debug)]
pub struct ServerStats {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    aborted_requests: AtomicU64,
    bytes_sent: AtomicU64,
    total_turnaround_us: AtomicU64,
    total_response_us: AtomicU64,
    start_time: Instant,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            aborted_requests: AtomicU64::new(0),
            bytes_sent: AtomicU64::new(0),
            total_turnaround_us: AtomicU64::new(0),
            total_response_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_request_started(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_success(&self) {
        self.successful_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::Relaxed);
    }

    /// La transferencia empezó pero el cliente cortó a mitad de camino
    pub fn record_aborted(&self) {
        self.aborted_requests.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bytes_sent(&self, bytes: u64) {
        self.bytes_sent.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Tiempo desde que se aceptó la conexión hasta que se cerró
    pub fn record_turnaround_micros(&self, micros: u64) {
        self.total_turnaround_us.fetch_add(micros, Ordering::Relaxed);
    }

    /// Tiempo desde que un worker tomó la conexión hasta enviar la cabecera
    pub fn record_response_micros(&self, micros: u64) {
        self.total_response_us.fetch_add(micros, Ordering::Relaxed);
    }

    /// Toma una foto de los contadores con los valores derivados
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot::from_totals(
            self.total_requests.load(Ordering::Relaxed),
            self.successful_requests.load(Ordering::Relaxed),
            self.failed_requests.load(Ordering::Relaxed),
            self.aborted_requests.load(Ordering::Relaxed),
            self.bytes_sent.load(Ordering::Relaxed),
            self.total_turnaround_us.load(Ordering::Relaxed),
            self.total_response_us.load(Ordering::Relaxed),
            self.start_time.elapsed(),
        )
    }

    /// Escribe el reporte en `outfile` (modo append) o en stdout
    ///
    /// Si el archivo no se puede abrir se usa stdout.
    pub fn write_report(&self, outfile: Option<&Path>, format: StatsFormat) -> io::Result<()> {
        let report = self.snapshot().render(format);

        if let Some(path) = outfile {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(mut file) => return file.write_all(report.as_bytes()),
                Err(e) => warn!(path = %path.display(), error = %e, "No se pudo abrir el archivo de estadísticas"),
            }
        }

        let stdout = io::stdout();
        let mut out = stdout.lock();
        out.write_all(report.as_bytes())?;
        out.flush()
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot de estadísticas (para reportes)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub uptime_secs: u64,
    pub total_requests: u64,
    pub successful_requests: u64,
    pub failed_requests: u64,
    pub aborted_requests: u64,
    pub bytes_sent: u64,
    pub requests_per_sec: f64,
    pub throughput_kb_per_sec: f64,
    pub avg_turnaround_ms: f64,
    pub avg_response_ms: f64,
}

impl StatsSnapshot {
    #[allow(clippy::too_many_arguments)]
    fn from_totals(
        total: u64,
        successful: u64,
        failed: u64,
        aborted: u64,
        bytes: u64,
        turnaround_us: u64,
        response_us: u64,
        uptime: Duration,
    ) -> Self {
        let uptime_secs = uptime.as_secs();
        let (requests_per_sec, throughput_kb_per_sec) = if uptime_secs > 0 {
            (
                total as f64 / uptime_secs as f64,
                (bytes as f64 / 1024.0) / uptime_secs as f64,
            )
        } else {
            (0.0, 0.0)
        };

        let average_ms = |total_us: u64| {
            if total > 0 {
                (total_us as f64 / total as f64) / 1000.0
            } else {
                0.0
            }
        };

        Self {
            uptime_secs,
            total_requests: total,
            successful_requests: successful,
            failed_requests: failed,
            aborted_requests: aborted,
            bytes_sent: bytes,
            requests_per_sec,
            throughput_kb_per_sec,
            avg_turnaround_ms: average_ms(turnaround_us),
            avg_response_ms: average_ms(response_us),
        }
    }

    /// Renderiza el snapshot en el formato pedido
    pub fn render(&self, format: StatsFormat) -> String {
        match format {
            StatsFormat::Text => self.render_text(),
            StatsFormat::Json => self.to_json(),
        }
    }

    /// Tabla legible del reporte final
    pub fn render_text(&self) -> String {
        let rule = "═".repeat(59);
        let mut out = String::new();

        out.push('\n');
        out.push_str(&format!("{}\n", rule));
        out.push_str("                   SERVER STATISTICS\n");
        out.push_str(&format!("{}\n", rule));
        out.push_str(&format!("  Uptime:              {} seconds\n", self.uptime_secs));
        out.push_str(&format!("  Total Requests:      {}\n", self.total_requests));
        out.push_str(&format!("  Successful:          {}\n", self.successful_requests));
        out.push_str(&format!("  Failed:              {}\n", self.failed_requests));
        out.push_str(&format!("  Aborted (Client):    {}\n", self.aborted_requests));
        out.push_str(&format!(
            "  Bytes Sent:          {} ({:.2} MB)\n",
            self.bytes_sent,
            self.bytes_sent as f64 / 1024.0 / 1024.0
        ));
        if self.uptime_secs > 0 {
            out.push_str(&format!("  Requests/sec:        {:.2}\n", self.requests_per_sec));
            out.push_str(&format!("  Throughput:          {:.2} KB/s\n", self.throughput_kb_per_sec));
        }
        out.push_str(&format!("  Avg Turnaround Time: {:.2} ms\n", self.avg_turnaround_ms));
        out.push_str(&format!("  Avg Response Time:   {:.2} ms\n", self.avg_response_ms));
        out.push_str(&format!("{}\n\n", rule));

        out
    }

    /// Una línea JSON con todos los campos
    pub fn to_json(&self) -> String {
        // Serializar un struct de campos numéricos no puede fallar
        let mut json = serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"));
        json.push('\n');
        json
    }
}
