//! # Manejo de una Conexión
//! src/server/handler.rs
//!
//! Unidad de trabajo de un worker: atiende exactamente una request por
//! conexión y luego la cierra.
//!
//! ```text
//! Reading -> Parsed -> Resolving -> { NotFound | RangeError | Serving } -> Closed
//! ```
//!
//! Una vez escrita la cabecera 200/206 ya no se puede avisar un error al
//! cliente: si el socket falla a mitad de la transferencia simplemente se
//! deja de enviar y la conexión se cierra.

use super::listener::Connection;
use crate::config::Config;
use crate::files::{mime_for, resolve, sanitize_path};
use crate::http::{resolve_range, RangeRequest, Request, Response, StatusCode};
use crate::metrics::{Entity, EventLog, ServerStats};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error};

/// Bytes que se leen del socket (una sola lectura por request)
pub const READ_BUFFER_SIZE: usize = 8192;

/// Tamaño de cada chunk del archivo que se transmite
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Cómo terminó una conexión
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// El cliente cerró sin enviar nada
    Empty,

    /// Falló la lectura del socket
    ReadFailed,

    /// Request line inválida: se cierra sin responder
    Malformed,

    /// Se respondió 404
    NotFound,

    /// Se respondió 416
    RangeNotSatisfiable,

    /// Se envió la cabecera y todo el cuerpo prometido
    Served { status: StatusCode, body_bytes: u64 },

    /// Se envió la cabecera (o se intentó) pero la transferencia se cortó
    Aborted {
        status: StatusCode,
        sent: u64,
        expected: u64,
    },

    /// El handler entró en panic
    Panicked,
}

impl Outcome {
    /// Etiqueta corta para logs
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Empty => "empty",
            Outcome::ReadFailed => "read-failed",
            Outcome::Malformed => "malformed",
            Outcome::NotFound => "404",
            Outcome::RangeNotSatisfiable => "416",
            Outcome::Served {
                status: StatusCode::PartialContent,
                ..
            } => "206",
            Outcome::Served { .. } => "200",
            Outcome::Aborted { .. } => "aborted",
            Outcome::Panicked => "panicked",
        }
    }
}

/// Atiende conexiones sirviendo archivos de `root`
pub struct ConnectionHandler {
    root: PathBuf,
    default_document: String,
    stats: Arc<ServerStats>,
    events: Arc<EventLog>,
}

impl ConnectionHandler {
    pub fn new(
        root: impl Into<PathBuf>,
        default_document: impl Into<String>,
        stats: Arc<ServerStats>,
        events: Arc<EventLog>,
    ) -> Self {
        Self {
            root: root.into(),
            default_document: default_document.into(),
            stats,
            events,
        }
    }

    pub fn from_config(config: &Config, stats: Arc<ServerStats>, events: Arc<EventLog>) -> Self {
        Self::new(config.root.clone(), config.default_document.clone(), stats, events)
    }

    /// Directorio servido
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Ciclo completo de una conexión aceptada, ejecutado por un worker
    ///
    /// El socket se cierra siempre al salir, sin importar el resultado.
    pub fn serve(&self, worker: usize, connection: Connection) {
        let Connection {
            id,
            mut stream,
            peer,
            accepted_at,
        } = connection;

        self.events.record(
            Entity::Worker(worker),
            Some(id),
            "Running",
            &format!("Handling {}", peer),
        );
        self.stats.record_request_started();

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.handle(&mut stream)))
            .unwrap_or_else(|_| {
                error!(worker, conn = id, "Panic atendiendo la conexión");
                Outcome::Panicked
            });

        self.record_outcome(&outcome);
        drop(stream);

        self.stats
            .record_turnaround_micros(micros(accepted_at.elapsed()));
        self.events
            .record(Entity::Worker(worker), Some(id), "Done", outcome.label());

        debug!(worker, conn = id, %peer, outcome = outcome.label(), "Conexión cerrada");

        // De vuelta a la cola
        self.events
            .record(Entity::Worker(worker), None, "Waiting", "Waiting for connection");
    }

    fn record_outcome(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Served { .. } => self.stats.record_success(),
            Outcome::Aborted { .. } | Outcome::Empty => self.stats.record_aborted(),
            Outcome::ReadFailed
            | Outcome::Malformed
            | Outcome::NotFound
            | Outcome::RangeNotSatisfiable
            | Outcome::Panicked => self.stats.record_failure(),
        }
    }

    /// Lee la request, resuelve el archivo y escribe la respuesta
    ///
    /// No cierra `stream`: eso le toca a quien lo posee.
    pub fn handle<S: Read + Write>(&self, stream: &mut S) -> Outcome {
        let started = Instant::now();

        // 1. Reading: una sola lectura
        let mut buffer = vec![0u8; READ_BUFFER_SIZE];
        let bytes_read = match stream.read(&mut buffer) {
            Ok(0) => return Outcome::Empty,
            Ok(n) => n,
            Err(e) => {
                debug!(error = %e, "Error leyendo del socket");
                return Outcome::ReadFailed;
            }
        };

        // 2. Parsed
        let request = match Request::parse(&buffer[..bytes_read]) {
            Ok(request) => request,
            Err(e) => {
                debug!(error = %e, "Request descartada");
                return Outcome::Malformed;
            }
        };

        debug!(method = request.method().as_str(), target = request.target(), "Request");

        // 3. Resolving
        let sanitized = match sanitize_path(request.target(), &self.default_document) {
            Ok(path) => path,
            Err(e) => {
                debug!(error = %e, "Path rechazado");
                return self.respond(stream, &Response::not_found(), started, Outcome::NotFound);
            }
        };

        let file_path = resolve(&self.root, &sanitized);
        let (mut file, file_size) = match open_regular_file(&file_path) {
            Ok(opened) => opened,
            Err(e) => {
                debug!(path = %file_path.display(), error = %e, "Archivo no disponible");
                return self.respond(stream, &Response::not_found(), started, Outcome::NotFound);
            }
        };

        // 4. Serving
        let range = match resolve_range(request.range(), file_size) {
            RangeRequest::Absent => None,
            RangeRequest::Valid(range) => Some(range),
            RangeRequest::Unsatisfiable => {
                debug!(range = request.range(), file_size, "Rango no satisfacible");
                return self.respond(
                    stream,
                    &Response::range_not_satisfiable(file_size),
                    started,
                    Outcome::RangeNotSatisfiable,
                );
            }
        };

        let (offset, length) = range.map_or((0, file_size), |range| (range.start, range.len()));

        if let Err(e) = file.seek(SeekFrom::Start(offset)) {
            debug!(path = %file_path.display(), error = %e, "No se pudo posicionar el archivo");
            return self.respond(stream, &Response::not_found(), started, Outcome::NotFound);
        }

        let head = Response::file(mime_for(&sanitized), file_size, range);
        let status = head.status();

        if let Err(e) = self.write_counted(stream, &head.to_bytes()) {
            debug!(error = %e, "Cliente desconectado antes de la cabecera");
            return Outcome::Aborted {
                status,
                sent: 0,
                expected: length,
            };
        }
        self.stats.record_response_micros(micros(started.elapsed()));

        let (sent, result) = copy_range(&mut file, stream, length);
        self.stats.record_bytes_sent(sent);

        match result.and_then(|_| stream.flush()) {
            Ok(()) => Outcome::Served {
                status,
                body_bytes: sent,
            },
            Err(e) => {
                debug!(sent, expected = length, error = %e, "Transferencia interrumpida");
                Outcome::Aborted {
                    status,
                    sent,
                    expected: length,
                }
            }
        }
    }

    /// Escribe una respuesta completa en memoria (404 / 416)
    fn respond<S: Write>(
        &self,
        stream: &mut S,
        response: &Response,
        started: Instant,
        outcome: Outcome,
    ) -> Outcome {
        match self.write_counted(stream, &response.to_bytes()) {
            Ok(()) => self.stats.record_response_micros(micros(started.elapsed())),
            Err(e) => debug!(status = %response.status(), error = %e, "No se pudo enviar la respuesta"),
        }
        outcome
    }

    fn write_counted<S: Write>(&self, stream: &mut S, bytes: &[u8]) -> io::Result<()> {
        let (written, result) = write_counting(stream, bytes);
        self.stats.record_bytes_sent(written);
        result?;
        stream.flush()
    }
}

/// Abre un archivo regular; directorios y otros tipos se tratan como ausentes
fn open_regular_file(path: &Path) -> io::Result<(File, u64)> {
    let file = File::open(path)?;
    let metadata = file.metadata()?;

    if !metadata.is_file() {
        return Err(io::Error::new(io::ErrorKind::NotFound, "not a regular file"));
    }

    Ok((file, metadata.len()))
}

/// Escribe todo `buf` reintentando escrituras parciales
///
/// A diferencia de `write_all`, retorna cuántos bytes llegaron al socket
/// aunque la escritura falle a mitad.
fn write_counting<W: Write>(sink: &mut W, buf: &[u8]) -> (u64, io::Result<()>) {
    let mut written = 0usize;

    while written < buf.len() {
        match sink.write(&buf[written..]) {
            Ok(0) => {
                return (
                    written as u64,
                    Err(io::Error::new(io::ErrorKind::WriteZero, "socket accepted no bytes")),
                )
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return (written as u64, Err(e)),
        }
    }

    (written as u64, Ok(()))
}

/// Copia `length` bytes de `source` a `sink` en chunks de [`CHUNK_SIZE`]
///
/// Retorna los bytes efectivamente escritos junto con el resultado; un
/// archivo que se acaba antes de tiempo cuenta como error porque la
/// cabecera ya prometió `length` bytes.
fn copy_range<R: Read, W: Write>(source: &mut R, sink: &mut W, length: u64) -> (u64, io::Result<()>) {
    let mut chunk = vec![0u8; CHUNK_SIZE.min(length as usize).max(1)];
    let mut sent = 0u64;

    while sent < length {
        let wanted = (length - sent).min(chunk.len() as u64) as usize;

        let read = match source.read(&mut chunk[..wanted]) {
            Ok(0) => {
                return (
                    sent,
                    Err(io::Error::new(io::ErrorKind::UnexpectedEof, "file shrank while streaming")),
                )
            }
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return (sent, Err(e)),
        };

        let (written, result) = write_counting(sink, &chunk[..read]);
        sent += written;
        if let Err(e) = result {
            return (sent, Err(e));
        }
    }

    (sent, Ok(()))
}

fn micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    /// Socket en memoria: entrada fija, salida acumulada
    struct MockStream {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
        /// Máximo de bytes aceptados por cada `write` (escrituras parciales)
        max_write: usize,
        /// Después de este total las escrituras fallan (cliente se fue)
        fail_after: Option<usize>,
        fail_read: bool,
    }

    impl MockStream {
        fn new(request: &str) -> Self {
            Self {
                input: Cursor::new(request.as_bytes().to_vec()),
                output: Vec::new(),
                max_write: usize::MAX,
                fail_after: None,
                fail_read: false,
            }
        }

        fn split(&self) -> (String, Vec<u8>) {
            let pos = self
                .output
                .windows(4)
                .position(|window| window == b"\r\n\r\n")
                .expect("response without header terminator");
            (
                String::from_utf8(self.output[..pos + 4].to_vec()).unwrap(),
                self.output[pos + 4..].to_vec(),
            )
        }
    }

    impl Read for MockStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.fail_read {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset"));
            }
            self.input.read(buf)
        }
    }

    impl Write for MockStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut allowed = buf.len().min(self.max_write);
            if let Some(limit) = self.fail_after {
                if self.output.len() >= limit {
                    return Err(io::Error::new(io::ErrorKind::BrokenPipe, "peer reset"));
                }
                allowed = allowed.min(limit - self.output.len());
            }
            self.output.extend_from_slice(&buf[..allowed]);
            Ok(allowed)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn fixture() -> (TempDir, ConnectionHandler, Arc<ServerStats>) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("index.html"), b"0123456789").unwrap();
        std::fs::create_dir(dir.path().join("hls")).unwrap();
        std::fs::write(dir.path().join("hls").join("seg0.ts"), vec![7u8; 200_000]).unwrap();
        std::fs::write(dir.path().join("empty.txt"), b"").unwrap();

        let stats = Arc::new(ServerStats::new());
        let handler = ConnectionHandler::new(
            dir.path(),
            "index.html",
            Arc::clone(&stats),
            Arc::new(EventLog::disabled()),
        );
        (dir, handler, stats)
    }

    #[test]
    fn test_full_file() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GET /index.html HTTP/1.0\r\n\r\n");

        let outcome = handler.handle(&mut stream);

        assert_eq!(
            outcome,
            Outcome::Served {
                status: StatusCode::Ok,
                body_bytes: 10
            }
        );
        let (head, body) = stream.split();
        assert!(head.starts_with("HTTP/1.0 200 OK\r\n"));
        assert!(head.contains("Content-Length: 10\r\n"));
        assert!(head.contains("Content-Type: text/html\r\n"));
        assert!(head.contains("Accept-Ranges: bytes\r\n"));
        assert!(head.contains("Connection: close\r\n"));
        assert_eq!(body, b"0123456789");
    }

    #[test]
    fn test_root_serves_default_document() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GET / HTTP/1.0\r\n\r\n");

        handler.handle(&mut stream);

        let (head, body) = stream.split();
        assert!(head.starts_with("HTTP/1.0 200 OK"));
        assert_eq!(body, b"0123456789");
    }

    #[test]
    fn test_partial_content() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GET /index.html HTTP/1.1\r\nRange: bytes=2-5\r\n\r\n");

        let outcome = handler.handle(&mut stream);

        assert_eq!(outcome.label(), "206");
        let (head, body) = stream.split();
        assert!(head.starts_with("HTTP/1.0 206 Partial Content\r\n"));
        assert!(head.contains("Content-Range: bytes 2-5/10\r\n"));
        assert!(head.contains("Content-Length: 4\r\n"));
        assert_eq!(body, b"2345");
    }

    #[test]
    fn test_suffix_range() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GET /index.html HTTP/1.1\r\nRange: bytes=-3\r\n\r\n");

        handler.handle(&mut stream);

        let (head, body) = stream.split();
        assert!(head.contains("Content-Range: bytes 7-9/10\r\n"));
        assert_eq!(body, b"789");
    }

    #[test]
    fn test_missing_file_is_404() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GET /nope.txt HTTP/1.0\r\n\r\n");

        assert_eq!(handler.handle(&mut stream), Outcome::NotFound);

        let (head, body) = stream.split();
        assert!(head.starts_with("HTTP/1.0 404 Not Found\r\n"));
        assert_eq!(body, crate::http::response::NOT_FOUND_BODY.as_bytes());
    }

    #[test]
    fn test_traversal_is_404() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GET /../../etc/passwd HTTP/1.0\r\n\r\n");

        assert_eq!(handler.handle(&mut stream), Outcome::NotFound);
        assert!(stream.split().0.starts_with("HTTP/1.0 404"));
    }

    #[test]
    fn test_directory_is_404() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GET /hls HTTP/1.0\r\n\r\n");

        assert_eq!(handler.handle(&mut stream), Outcome::NotFound);
    }

    #[test]
    fn test_unsatisfiable_range_is_416() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GET /index.html HTTP/1.1\r\nRange: bytes=20-\r\n\r\n");

        assert_eq!(handler.handle(&mut stream), Outcome::RangeNotSatisfiable);

        let (head, body) = stream.split();
        assert!(head.starts_with("HTTP/1.0 416 Range Not Satisfiable\r\n"));
        assert!(head.contains("Content-Length: 0\r\n"));
        assert!(body.is_empty());
    }

    #[test]
    fn test_empty_file() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GET /empty.txt HTTP/1.0\r\n\r\n");

        assert_eq!(
            handler.handle(&mut stream),
            Outcome::Served {
                status: StatusCode::Ok,
                body_bytes: 0
            }
        );
        let (head, body) = stream.split();
        assert!(head.contains("Content-Length: 0\r\n"));
        assert!(body.is_empty());
    }

    #[test]
    fn test_malformed_request_gets_no_response() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GARBAGE\r\n\r\n");

        assert_eq!(handler.handle(&mut stream), Outcome::Malformed);
        assert!(stream.output.is_empty());
    }

    #[test]
    fn test_empty_read_closes() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("");

        assert_eq!(handler.handle(&mut stream), Outcome::Empty);
        assert!(stream.output.is_empty());
    }

    #[test]
    fn test_read_error_closes() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GET / HTTP/1.0\r\n\r\n");
        stream.fail_read = true;

        assert_eq!(handler.handle(&mut stream), Outcome::ReadFailed);
        assert!(stream.output.is_empty());
    }

    #[test]
    fn test_partial_writes_are_retried() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GET /hls/seg0.ts HTTP/1.0\r\n\r\n");
        stream.max_write = 333;

        let outcome = handler.handle(&mut stream);

        assert_eq!(
            outcome,
            Outcome::Served {
                status: StatusCode::Ok,
                body_bytes: 200_000
            }
        );
        let (head, body) = stream.split();
        assert!(head.contains("Content-Type: video/mp2t\r\n"));
        assert_eq!(body.len(), 200_000);
        assert!(body.iter().all(|&b| b == 7));
    }

    #[test]
    fn test_peer_reset_mid_stream_aborts() {
        let (_dir, handler, _) = fixture();
        let mut stream = MockStream::new("GET /hls/seg0.ts HTTP/1.0\r\n\r\n");
        stream.fail_after = Some(100_000);

        match handler.handle(&mut stream) {
            Outcome::Aborted {
                status,
                sent,
                expected,
            } => {
                assert_eq!(status, StatusCode::Ok);
                assert_eq!(expected, 200_000);
                assert!(sent < expected);
            }
            other => panic!("expected Aborted, got {:?}", other),
        }
        assert!(stream.output.len() <= 100_000);
    }

    #[test]
    fn test_bytes_sent_are_counted() {
        let (_dir, handler, stats) = fixture();
        let mut stream = MockStream::new("GET /index.html HTTP/1.0\r\n\r\n");

        handler.handle(&mut stream);

        assert_eq!(stats.snapshot().bytes_sent, stream.output.len() as u64);
    }

    #[test]
    fn test_bytes_sent_match_socket_on_abort() {
        let (_dir, handler, stats) = fixture();
        let mut stream = MockStream::new("GET /hls/seg0.ts HTTP/1.0\r\n\r\n");
        stream.fail_after = Some(100_000);

        let outcome = handler.handle(&mut stream);

        let (head, body) = stream.split();
        match outcome {
            Outcome::Aborted { sent, .. } => assert_eq!(sent, body.len() as u64),
            other => panic!("expected Aborted, got {:?}", other),
        }
        assert_eq!(head.len() + body.len(), 100_000);
        assert_eq!(stats.snapshot().bytes_sent, stream.output.len() as u64);
    }

    #[test]
    fn test_write_counting_reports_partial_progress() {
        let mut stream = MockStream::new("");
        stream.max_write = 3;
        stream.fail_after = Some(7);

        let (written, result) = write_counting(&mut stream, b"0123456789");

        assert_eq!(written, 7);
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::BrokenPipe);
        assert_eq!(stream.output, b"0123456");
    }

    #[test]
    fn test_copy_range_stops_on_short_source() {
        let mut source = Cursor::new(vec![1u8; 10]);
        let mut sink = Vec::new();

        let (sent, result) = copy_range(&mut source, &mut sink, 20);

        assert_eq!(sent, 10);
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::NotFound.label(), "404");
        assert_eq!(
            Outcome::Served {
                status: StatusCode::Ok,
                body_bytes: 1
            }
            .label(),
            "200"
        );
    }
}
