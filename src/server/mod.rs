//! # Módulo del Servidor
//! src/server/mod.rs
//!
//! La frontera entre los bytes de la red y la abstracción request/response:
//! 1. `tcp`: socket de escucha, accept loop y apagado graceful
//! 2. `connection`: una conexión de punta a punta, con limpieza garantizada

pub mod connection;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use connection::{ConnectionProcessor, ProcessError, NOT_FOUND_RESPONSE};
pub use tcp::Server;
