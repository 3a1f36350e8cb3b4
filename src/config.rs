//! # Configuración del Servidor
//! src/config.rs
//!
//! Configuración vía argumentos CLI y variables de entorno.
//!
//! ## Ejemplos de uso
//!
//! ### CLI
//! ```bash
//! ./puerta --port 3000 --chunk-size 8192 --timeout-ms 30000
//! ```
//!
//! ### Variables de entorno
//! ```bash
//! PUERTA_PORT=3000 PUERTA_HOST=0.0.0.0 ./puerta
//! ```

use clap::Parser;

/// Configuración del borde de escucha
#[derive(Debug, Clone, Parser)]
#[command(name = "puerta")]
#[command(about = "Borde de escucha TCP/HTTP: un request por conexión, despachado a una cadena de handlers")]
#[command(version)]
pub struct Config {
    /// Puerto en el que escucha el servidor (0 = efímero)
    #[arg(short, long, default_value = "3000", env = "PUERTA_PORT")]
    pub port: u16,

    /// Host/IP en el que escucha
    #[arg(long, default_value = "127.0.0.1", env = "PUERTA_HOST")]
    pub host: String,

    /// Tamaño en bytes de la única lectura acotada por conexión
    #[arg(long = "chunk-size", default_value = "8192", env = "PUERTA_CHUNK_SIZE")]
    pub chunk_size: usize,

    /// Deadline de lectura/escritura por conexión, en milisegundos
    #[arg(long = "timeout-ms", default_value = "30000", env = "PUERTA_TIMEOUT_MS")]
    pub timeout_ms: u64,

    /// Intervalo de sondeo del accept loop, en milisegundos
    #[arg(long = "poll-ms", default_value = "10", env = "PUERTA_POLL_MS")]
    pub poll_ms: u64,
}

impl Config {
    /// Crea la configuración parseando argumentos CLI (y env vars)
    pub fn new() -> Self {
        Config::parse()
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use puerta::config::Config;
    ///
    /// let config = Config::default();
    /// assert_eq!(config.address(), "127.0.0.1:3000");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Valida la configuración; retorna errores si hay valores inválidos
    pub fn validate(&self) -> Result<(), String> {
        if self.host.is_empty() {
            return Err("Host must not be empty".to_string());
        }
        if self.chunk_size == 0 {
            return Err("Chunk size must be >= 1".to_string());
        }
        if self.timeout_ms == 0 {
            return Err("Connection timeout must be > 0".to_string());
        }
        if self.poll_ms == 0 {
            return Err("Poll interval must be > 0".to_string());
        }
        Ok(())
    }
}

impl Default for Config {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            port: 3000,
            host: "127.0.0.1".to_string(),
            chunk_size: 8192,
            timeout_ms: 30_000,
            poll_ms: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.port, 3000);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.chunk_size, 8192);
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.poll_ms, 10);
    }

    #[test]
    fn test_address() {
        let config = Config::default();
        assert_eq!(config.address(), "127.0.0.1:3000");
    }

    #[test]
    fn test_address_custom() {
        let mut config = Config::default();
        config.host = "0.0.0.0".to_string();
        config.port = 8080;
        assert_eq!(config.address(), "0.0.0.0:8080");
    }

    #[test]
    fn test_validate_success() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_host() {
        let mut config = Config::default();
        config.host = String::new();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Host"));
    }

    #[test]
    fn test_validate_zero_chunk_size() {
        let mut config = Config::default();
        config.chunk_size = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Chunk size"));
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.timeout_ms = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("timeout"));
    }

    #[test]
    fn test_validate_zero_poll_interval() {
        let mut config = Config::default();
        config.poll_ms = 0;
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Poll"));
    }
}
