//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! Este módulo arma la cabecera de las respuestas HTTP/1.0 del servidor de
//! archivos. El cuerpo de un archivo NO vive aquí: el handler lo transmite
//! por chunks después de escribir la cabecera. Solo las respuestas de error
//! (404, 416) llevan su cuerpo fijo dentro del `Response`.
//!
//! ## Formato de una respuesta parcial
//!
//! ```text
//! HTTP/1.0 206 Partial Content\r\n
//! Content-Type: video/mp4\r\n
//! Content-Length: 4\r\n
//! Accept-Ranges: bytes\r\n
//! Content-Range: bytes 2-5/10\r\n
//! Connection: close\r\n
//! \r\n
//! ```
//!
//! Una vez enviados los headers no hay vuelta atrás: el handler se
//! compromete a mandar exactamente `Content-Length` bytes o a cortar la
//! conexión.

use super::range::ByteRange;
use super::StatusCode;

/// Cuerpo fijo de las respuestas 404
pub const NOT_FOUND_BODY: &str = "<html><body><h1>404 Not Found</h1></body></html>\n";

/// Respuesta HTTP/1.0: status line, headers en orden y cuerpo opcional
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado HTTP
    status: StatusCode,

    /// Headers en el orden en que se escriben
    headers: Vec<(String, String)>,

    /// Cuerpo en memoria (solo para respuestas de error)
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta sin headers ni body
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Agrega un header a la respuesta
    ///
    /// Si el header ya existe (sin distinguir mayúsculas), se sobrescribe
    /// conservando su posición.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Versión mutable de [`Response::with_header`]
    pub fn add_header(&mut self, name: &str, value: &str) {
        match self
            .headers
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some(entry) => entry.1 = value.to_string(),
            None => self.headers.push((name.to_string(), value.to_string())),
        }
    }

    /// Establece un cuerpo en memoria y su `Content-Length`
    pub fn with_body(mut self, body: &[u8]) -> Self {
        self.body = body.to_vec();
        let length = self.body.len().to_string();
        self.add_header("Content-Length", &length);
        self
    }

    /// Cabecera para transmitir un archivo (o un rango de él)
    ///
    /// - Sin rango: `200 OK` con el tamaño completo.
    /// - Con rango: `206 Partial Content` con `Content-Range`.
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::{ByteRange, Response, StatusCode};
    ///
    /// let head = Response::file("text/plain", 10, Some(ByteRange::new(2, 5)));
    /// assert_eq!(head.status(), StatusCode::PartialContent);
    /// assert_eq!(head.header("Content-Range"), Some("bytes 2-5/10"));
    /// assert_eq!(head.header("Content-Length"), Some("4"));
    /// ```
    pub fn file(mime: &str, file_size: u64, range: Option<ByteRange>) -> Self {
        let (status, length) = match range {
            Some(range) => (StatusCode::PartialContent, range.len()),
            None => (StatusCode::Ok, file_size),
        };

        let mut response = Self::new(status)
            .with_header("Content-Type", mime)
            .with_header("Content-Length", &length.to_string())
            .with_header("Accept-Ranges", "bytes");

        if let Some(range) = range {
            response.add_header(
                "Content-Range",
                &format!("bytes {}-{}/{}", range.start, range.end, file_size),
            );
        }

        response.with_header("Connection", "close")
    }

    /// Respuesta fija `404 Not Found`
    pub fn not_found() -> Self {
        Self::new(StatusCode::NotFound)
            .with_header("Content-Type", "text/html")
            .with_body(NOT_FOUND_BODY.as_bytes())
            .with_header("Connection", "close")
    }

    /// Respuesta `416 Range Not Satisfiable` con cuerpo vacío
    ///
    /// Incluye `Content-Range: bytes */<size>` para que el cliente sepa el
    /// tamaño real del archivo.
    pub fn range_not_satisfiable(file_size: u64) -> Self {
        Self::new(StatusCode::RangeNotSatisfiable)
            .with_header("Content-Length", "0")
            .with_header("Accept-Ranges", "bytes")
            .with_header("Content-Range", &format!("bytes */{}", file_size))
            .with_header("Connection", "close")
    }

    /// Convierte la respuesta a bytes listos para el socket
    ///
    /// Genera: status line, headers, línea vacía y el cuerpo en memoria.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::with_capacity(128 + self.body.len());

        // 1. Status line
        result.extend_from_slice(format!("HTTP/1.0 {}\r\n", self.status).as_bytes());

        // 2. Headers
        for (name, value) in &self.headers {
            result.extend_from_slice(format!("{}: {}\r\n", name, value).as_bytes());
        }

        // 3. Línea vacía que separa headers del body
        result.extend_from_slice(b"\r\n");

        // 4. Body (si existe)
        result.extend_from_slice(&self.body);

        result
    }

    /// Obtiene el código de estado de la respuesta
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene un header (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Obtiene todos los headers en orden
    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Obtiene el body en memoria
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
