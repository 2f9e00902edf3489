//! # Resolución de Paths
//! src/files/path.rs
//!
//! Sanitiza el target de la request y lo convierte en una ruta dentro del
//! directorio servido.
//!
//! Reglas:
//! 1. Se descarta la query string (`?...`) y el fragmento (`#...`)
//! 2. Si falta el `/` inicial, se agrega
//! 3. Cualquier segmento `..` se rechaza (no se normaliza)
//! 4. Un path que termina en `/` recibe el documento por defecto

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errores de sanitización
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    /// El path intenta salir del directorio servido
    #[error("Path traversal rejected: {0}")]
    Traversal(String),
}

/// Sanitiza el target de una request
///
/// # Ejemplo
/// ```
/// use file_server::files::sanitize_path;
///
/// assert_eq!(sanitize_path("/", "index.html").unwrap(), "/index.html");
/// assert_eq!(sanitize_path("style.css", "index.html").unwrap(), "/style.css");
/// assert!(sanitize_path("/../../etc/passwd", "index.html").is_err());
/// ```
pub fn sanitize_path(target: &str, default_document: &str) -> Result<String, PathError> {
    let path = target
        .split(['?', '#'])
        .next()
        .unwrap_or_default();

    let mut path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{}", path)
    };

    if path.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(PathError::Traversal(target.to_string()));
    }

    if path.ends_with('/') {
        path.push_str(default_document);
    }

    Ok(path)
}

/// Une un path ya sanitizado al directorio raíz servido
pub fn resolve(root: &Path, sanitized: &str) -> PathBuf {
    root.join(sanitized.trim_start_matches('/'))
}

#[cfg(test)]
mod tests {
    use super::*;

    const INDEX: &str = "index.html";

    #[test]
    fn test_root_maps_to_default_document() {
        assert_eq!(sanitize_path("/", INDEX).unwrap(), "/index.html");
    }

    #[test]
    fn test_directory_maps_to_default_document() {
        assert_eq!(sanitize_path("/hls/movie1/", INDEX).unwrap(), "/hls/movie1/index.html");
    }

    #[test]
    fn test_custom_default_document() {
        assert_eq!(sanitize_path("/", "home.htm").unwrap(), "/home.htm");
    }

    #[test]
    fn test_missing_leading_slash() {
        assert_eq!(sanitize_path("index.html", INDEX).unwrap(), "/index.html");
        assert_eq!(sanitize_path("", INDEX).unwrap(), "/index.html");
    }

    #[test]
    fn test_query_and_fragment_are_stripped() {
        assert_eq!(sanitize_path("/a.js?v=3", INDEX).unwrap(), "/a.js");
        assert_eq!(sanitize_path("/page.html#top", INDEX).unwrap(), "/page.html");
        assert_eq!(sanitize_path("/?x=1", INDEX).unwrap(), "/index.html");
    }

    #[test]
    fn test_traversal_is_rejected_at_any_depth() {
        for target in [
            "/..",
            "/../etc/passwd",
            "/../../etc/passwd",
            "/a/b/../../../../etc/passwd",
            "../secret",
            "/static/..",
            "/static\\..\\secret",
        ] {
            assert!(
                matches!(sanitize_path(target, INDEX), Err(PathError::Traversal(_))),
                "{} should be rejected",
                target
            );
        }
    }

    #[test]
    fn test_dots_inside_names_are_allowed() {
        assert_eq!(sanitize_path("/a..b.txt", INDEX).unwrap(), "/a..b.txt");
        assert_eq!(sanitize_path("/.well-known/x", INDEX).unwrap(), "/.well-known/x");
    }

    #[test]
    fn test_resolve_stays_under_root() {
        let root = Path::new("/srv/www");

        assert_eq!(resolve(root, "/index.html"), PathBuf::from("/srv/www/index.html"));
        assert_eq!(resolve(root, "//etc/passwd"), PathBuf::from("/srv/www/etc/passwd"));
    }
}
