//! # Archivos Servidos
//! src/files/mod.rs
//!
//! Funciones puras sobre los archivos que se sirven:
//! - `path`: sanitización del target y resolución bajo el directorio raíz
//! - `mime`: Content-Type según la extensión

pub mod mime;
pub mod path;

pub use mime::mime_for;
pub use path::{resolve, sanitize_path, PathError};
