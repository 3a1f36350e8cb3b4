//! # Módulo HTTP
//! src/http/mod.rs
//!
//! Implementa la porción de HTTP/1.x que este borde necesita, desde cero y
//! sin librerías de protocolo:
//!
//! - Parsing de requests a un entorno estilo CGI
//! - Construcción y serialización de responses
//! - Códigos de estado
//!
//! Fuera de alcance, a propósito: keep-alive, pipelining, chunked transfer
//! encoding y cualquier versión del protocolo más allá de lo que expresa la
//! request line. Una conexión transporta exactamente un intercambio.

pub mod request;   // Parsing de HTTP requests
pub mod response;  // Construcción de HTTP responses
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use request::{ParseError, Request};
pub use response::Response;
pub use status::StatusCode;
