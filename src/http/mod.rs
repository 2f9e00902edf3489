//! # Módulo HTTP
//!
//! Lo mínimo del protocolo HTTP/1.x que necesita un servidor de archivos
//! de una request por conexión:
//!
//! - Parsing de la request line y del header `Range`
//! - Cálculo del rango de bytes a servir
//! - Cabeceras de respuesta (200, 206, 404, 416)
//!
//! No hay keep-alive, ni chunked encoding, ni cuerpos de request.
//!
//! ### Formato de Response
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 10\r\n
//! Accept-Ranges: bytes\r\n
//! Connection: close\r\n
//! \r\n
//! <10 bytes del archivo>
//! ```

pub mod range;     // Header Range -> intervalo de bytes
pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use range::{resolve_range, ByteRange, RangeRequest};
pub use request::{Method, ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
