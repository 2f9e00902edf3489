//! # Parsing de Requests HTTP/1.x
//! src/http/request.rs
//!
//! Parser mínimo y estricto: solo interesa la request line y, de los
//! headers, el `Range`. El servidor lee una sola vez del socket, así que
//! todo lo que no haya llegado en ese buffer simplemente no existe.
//!
//! ## Formato
//!
//! ```text
//! GET /video/seg1.ts HTTP/1.1\r\n
//! Host: localhost:8000\r\n
//! Range: bytes=0-1023\r\n
//! \r\n
//! ```
//!
//! Una request line con menos de dos tokens (método y path) es un error:
//! la conexión se cierra sin respuesta.

use thiserror::Error;

/// Método HTTP de la request
///
/// El servidor sirve archivos igual para cualquier método; el método solo
/// se conserva para logging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    /// Cualquier otro token (POST, PUT, basura...)
    Other(String),
}

impl Method {
    fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::Get,
            "HEAD" => Method::Head,
            other => Method::Other(other.to_string()),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
            Method::Other(token) => token,
        }
    }
}

/// Errores que pueden ocurrir durante el parsing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// No llegó ningún byte útil
    #[error("Empty request")]
    EmptyRequest,

    /// La request line no tiene método y path
    #[error("Invalid request line: {0:?}")]
    InvalidRequestLine(String),
}

/// Request HTTP parseada
#[derive(Debug, Clone)]
pub struct Request {
    /// Método HTTP
    method: Method,

    /// Target tal como vino en la request line (sin sanitizar)
    target: String,

    /// Versión HTTP, si vino en la request line
    version: Option<String>,

    /// Headers en el orden recibido
    headers: Vec<(String, String)>,
}

impl Request {
    /// Parsea una request desde los bytes leídos del socket
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use file_server::http::Request;
    ///
    /// let raw = b"GET /index.html HTTP/1.0\r\nRange: bytes=2-5\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.target(), "/index.html");
    /// assert_eq!(request.range(), Some("bytes=2-5"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        // Bytes no-UTF-8 en el path se reemplazan; ese archivo no existirá
        let text = String::from_utf8_lossy(buffer);

        if text.trim().is_empty() {
            return Err(ParseError::EmptyRequest);
        }

        let mut lines = text.split('\n').map(|line| line.trim_end_matches('\r'));

        // 1. Request line
        let request_line = lines.next().unwrap_or_default();
        let (method, target, version) = Self::parse_request_line(request_line)?;

        // 2. Headers hasta la línea vacía
        let headers = Self::parse_headers(lines);

        Ok(Request {
            method,
            target,
            version,
            headers,
        })
    }

    /// Formato: `METHOD TARGET [VERSION]`
    fn parse_request_line(
        line: &str,
    ) -> Result<(Method, String, Option<String>), ParseError> {
        let mut parts = line.split_whitespace();

        match (parts.next(), parts.next()) {
            (Some(method), Some(target)) => Ok((
                Method::from_token(method),
                target.to_string(),
                parts.next().map(str::to_string),
            )),
            _ => Err(ParseError::InvalidRequestLine(line.to_string())),
        }
    }

    /// Cada header tiene formato "Name: Value"; líneas sin ':' se descartan
    fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<(String, String)> {
        lines
            .take_while(|line| !line.trim().is_empty())
            .filter_map(|line| line.split_once(':'))
            .map(|(name, value)| (name.trim().to_string(), value.trim().to_string()))
            .collect()
    }

    /// Obtiene el método HTTP
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Obtiene el target crudo de la request line
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Obtiene la versión HTTP, si vino
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Obtiene un header (sin distinguir mayúsculas)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Valor crudo del header `Range`, si vino
    pub fn range(&self) -> Option<&str> {
        self.header("Range")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_get() {
        let request = Request::parse(b"GET / HTTP/1.0\r\n\r\n").unwrap();

        assert_eq!(request.method(), &Method::Get);
        assert_eq!(request.target(), "/");
        assert_eq!(request.version(), Some("HTTP/1.0"));
        assert_eq!(request.range(), None);
    }

    #[test]
    fn test_parse_without_version() {
        let request = Request::parse(b"GET /file.txt\r\n\r\n").unwrap();

        assert_eq!(request.target(), "/file.txt");
        assert_eq!(request.version(), None);
    }

    #[test]
    fn test_parse_range_header_case_insensitive() {
        let raw = b"GET /a.mp4 HTTP/1.1\r\nHost: x\r\nrange: bytes=0-99\r\n\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.range(), Some("bytes=0-99"));
        assert_eq!(request.header("HOST"), Some("x"));
    }

    #[test]
    fn test_headers_stop_at_blank_line() {
        let raw = b"GET / HTTP/1.0\r\n\r\nRange: bytes=0-1\r\n";
        let request = Request::parse(raw).unwrap();

        assert_eq!(request.range(), None);
    }

    #[test]
    fn test_bare_newlines_are_accepted() {
        let request = Request::parse(b"GET /x HTTP/1.0\nRange: bytes=1-2\n\n").unwrap();

        assert_eq!(request.target(), "/x");
        assert_eq!(request.range(), Some("bytes=1-2"));
    }

    #[test]
    fn test_other_methods_are_kept() {
        let request = Request::parse(b"POST /upload HTTP/1.0\r\n\r\n").unwrap();

        assert_eq!(request.method(), &Method::Other("POST".to_string()));
        assert_eq!(request.method().as_str(), "POST");
    }

    #[test]
    fn test_empty_request() {
        assert_eq!(Request::parse(b"").unwrap_err(), ParseError::EmptyRequest);
        assert_eq!(Request::parse(b"\r\n\r\n").unwrap_err(), ParseError::EmptyRequest);
    }

    #[test]
    fn test_single_token_is_rejected() {
        let result = Request::parse(b"GET\r\n\r\n");

        assert!(matches!(result, Err(ParseError::InvalidRequestLine(_))));
    }

    #[test]
    fn test_garbage_with_one_token_is_rejected() {
        let result = Request::parse(b"\x00\x01\x02garbage");

        assert!(matches!(result, Err(ParseError::InvalidRequestLine(_))));
    }
}
