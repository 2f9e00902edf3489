//! # Clasificación MIME
//! src/files/mime.rs
//!
//! Tabla fija extensión -> Content-Type. No se inspecciona el contenido.

use std::path::Path;

/// Tipo para cualquier extensión desconocida
pub const DEFAULT_MIME: &str = "application/octet-stream";

/// Tabla de extensiones conocidas (en minúscula)
const MIME_TABLE: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("css", "text/css"),
    ("js", "application/javascript"),
    ("json", "application/json"),
    ("txt", "text/plain"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("ico", "image/x-icon"),
    ("svg", "image/svg+xml"),
    // Streaming (HLS / DASH)
    ("m3u8", "application/vnd.apple.mpegurl"),
    ("ts", "video/mp2t"),
    ("m4s", "video/iso.segment"),
    ("mp4", "video/mp4"),
];

/// Devuelve el Content-Type según la extensión del archivo
///
/// La extensión es el texto después del último `.` del nombre. Un nombre
/// sin extensión, o que es solo extensión (`.bashrc`), da el tipo binario.
///
/// # Ejemplo
/// ```
/// use file_server::files::mime_for;
///
/// assert_eq!(mime_for("/index.html"), "text/html");
/// assert_eq!(mime_for("/logo.PNG"), "image/png");
/// assert_eq!(mime_for("/LICENSE"), "application/octet-stream");
/// ```
pub fn mime_for(path: impl AsRef<Path>) -> &'static str {
    let extension = match path.as_ref().extension().and_then(|ext| ext.to_str()) {
        Some(extension) => extension.to_ascii_lowercase(),
        None => return DEFAULT_MIME,
    };

    MIME_TABLE
        .iter()
        .find(|(known, _)| *known == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME)
}
