//! # Códigos de Estado HTTP
//!
//! Este módulo define los códigos de estado que emite el servidor de archivos.
//! Solo hay cuatro posibles respuestas:
//!
//! - **200**: archivo completo
//! - **206**: un rango de bytes del archivo
//! - **404**: archivo inexistente, ilegible o path rechazado
//! - **416**: rango imposible de satisfacer

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    /// 200 OK - Se envía el archivo completo
    Ok = 200,

    /// 206 Partial Content - Se envía solo el rango pedido
    PartialContent = 206,

    /// 404 Not Found - Archivo no encontrado (o path con `..`)
    NotFound = 404,

    /// 416 Range Not Satisfiable - El header `Range` no cabe en el archivo
    RangeNotSatisfiable = 416,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::StatusCode;
    /// assert_eq!(StatusCode::PartialContent.as_u16(), 206);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use file_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::RangeNotSatisfiable.reason_phrase(), "Range Not Satisfiable");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::PartialContent => "Partial Content",
            StatusCode::NotFound => "Not Found",
            StatusCode::RangeNotSatisfiable => "Range Not Satisfiable",
        }
    }

    /// Verifica si el código indica éxito (2xx)
    pub fn is_success(&self) -> bool {
        matches!(self, StatusCode::Ok | StatusCode::PartialContent)
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "206 Partial Content"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_values() {
        assert_eq!(StatusCode::Ok.as_u16(), 200);
        assert_eq!(StatusCode::PartialContent.as_u16(), 206);
        assert_eq!(StatusCode::NotFound.as_u16(), 404);
        assert_eq!(StatusCode::RangeNotSatisfiable.as_u16(), 416);
    }

    #[test]
    fn test_is_success() {
        assert!(StatusCode::Ok.is_success());
        assert!(StatusCode::PartialContent.is_success());
        assert!(!StatusCode::NotFound.is_success());
        assert!(!StatusCode::RangeNotSatisfiable.is_success());
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::Ok.to_string(), "200 OK");
        assert_eq!(StatusCode::PartialContent.to_string(), "206 Partial Content");
        assert_eq!(StatusCode::NotFound.to_string(), "404 Not Found");
        assert_eq!(
            StatusCode::RangeNotSatisfiable.to_string(),
            "416 Range Not Satisfiable"
        );
    }
}
