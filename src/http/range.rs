//! # Cálculo de Rangos de Bytes
//! src/http/range.rs
//!
//! Convierte el valor crudo del header `Range` en un intervalo válido del
//! archivo, o en la señal de que el rango no se puede satisfacer.
//!
//! ## Formas soportadas
//!
//! ```text
//! bytes=0-99      explícito         -> [0, 99]
//! bytes=500-      abierto           -> [500, size-1]
//! bytes=-50       sufijo            -> últimos 50 bytes
//! ```
//!
//! Solo se soporta un rango. Un header con varios rangos separados por
//! coma (`bytes=0-10,20-30`) se ignora y se sirve el archivo completo.

/// Intervalo inclusivo `[start, end]` dentro de un archivo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    pub fn new(start: u64, end: u64) -> Self {
        Self { start, end }
    }

    /// Cantidad de bytes del intervalo (siempre >= 1)
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// Resultado de evaluar un header `Range` contra el tamaño del archivo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeRequest {
    /// No hay rango (o se ignora): se sirve el archivo completo con 200
    Absent,

    /// Rango válido: se sirve con 206. Garantiza `start <= end < size`
    Valid(ByteRange),

    /// Rango malformado o fuera del archivo: se responde 416
    Unsatisfiable,
}

/// Evalúa el valor del header `Range` para un archivo de `file_size` bytes
///
/// # Ejemplo
/// ```
/// use file_server::http::{resolve_range, ByteRange, RangeRequest};
///
/// assert_eq!(resolve_range(None, 1000), RangeRequest::Absent);
/// assert_eq!(
///     resolve_range(Some("bytes=-50"), 1000),
///     RangeRequest::Valid(ByteRange::new(950, 999))
/// );
/// assert_eq!(resolve_range(Some("bytes=2000-"), 1000), RangeRequest::Unsatisfiable);
/// ```
pub fn resolve_range(header: Option<&str>, file_size: u64) -> RangeRequest {
    let ranges = match header.and_then(|value| value.trim().strip_prefix("bytes=")) {
        Some(ranges) => ranges.trim(),
        None => return RangeRequest::Absent,
    };

    // Multi-rango: no soportado, se ignora el header
    if ranges.contains(',') {
        return RangeRequest::Absent;
    }

    let (first, last) = match ranges.split_once('-') {
        Some((first, last)) => (first.trim(), last.trim()),
        None => return RangeRequest::Unsatisfiable,
    };

    if first.is_empty() {
        suffix_range(last, file_size)
    } else {
        explicit_range(first, last, file_size)
    }
}

/// `bytes=-N`: los últimos N bytes, N recortado al tamaño del archivo
fn suffix_range(count: &str, file_size: u64) -> RangeRequest {
    let count = match parse_position(count) {
        Some(count) if count > 0 => count,
        _ => return RangeRequest::Unsatisfiable,
    };

    if file_size == 0 {
        return RangeRequest::Unsatisfiable;
    }

    let count = count.min(file_size);
    RangeRequest::Valid(ByteRange::new(file_size - count, file_size - 1))
}

/// `bytes=start-end` o `bytes=start-`
fn explicit_range(first: &str, last: &str, file_size: u64) -> RangeRequest {
    let start = match parse_position(first) {
        Some(start) => start,
        None => return RangeRequest::Unsatisfiable,
    };

    if start >= file_size {
        return RangeRequest::Unsatisfiable;
    }

    let end = if last.is_empty() {
        file_size - 1
    } else {
        match parse_position(last) {
            Some(end) => end,
            None => return RangeRequest::Unsatisfiable,
        }
    };

    if end < start {
        return RangeRequest::Unsatisfiable;
    }

    RangeRequest::Valid(ByteRange::new(start, end.min(file_size - 1)))
}

/// Posición de byte: solo dígitos ASCII (sin signo ni espacios internos)
fn parse_position(field: &str) -> Option<u64> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}
