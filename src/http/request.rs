//! # Parsing de Requests HTTP/1.x
//! src/http/request.rs
//!
//! Este módulo traduce el buffer crudo leído del socket a un `Request`
//! estructurado, sin hacer I/O. El resultado expone los metadatos al estilo
//! CGI: un mapa de strings con claves como `REQUEST_METHOD`, `QUERY_STRING`
//! o `HTTP_HOST`, que es el contrato que consumen los handlers.
//!
//! ## Formato consumido
//!
//! ```text
//! GET /page?cool=thing HTTP/1.1\r\n
//! Host: localhost:3000\r\n
//! \r\n
//! cuerpo opcional
//! ```
//!
//! La versión del protocolo se tolera como opcional y se ignora. Se aceptan
//! terminadores `\r\n` y `\n` indistintamente.

use std::collections::HashMap;

use thiserror::Error;

/// Errores de parseo: el buffer no respeta la gramática mínima de
/// request-line + headers. Todos se tratan igual aguas arriba (la conexión
/// se cierra sin escribir bytes), pero distinguirlos ayuda en los logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Buffer vacío
    #[error("empty request")]
    Empty,

    /// La request line no termina en salto de línea
    #[error("request line has no line terminator")]
    MissingLineTerminator,

    /// La request line no tiene al menos método y target
    #[error("invalid request line format")]
    InvalidRequestLine,

    /// Línea de header sin `:`
    #[error("invalid header line: {0}")]
    InvalidHeader(String),

    /// La request line o un header no es UTF-8 válido
    #[error("request head is not valid UTF-8")]
    InvalidEncoding,
}

/// Un request HTTP/1.x parseado, inmutable salvo dos excepciones del ciclo
/// de vida: la inserción tardía de `REMOTE_ADDR` (la hace la capa de
/// conexión, que es la única que conoce al peer) y la liberación del body
/// en `close()`.
#[derive(Debug, Clone)]
pub struct Request {
    /// Método de la request line, siempre en mayúsculas
    method: String,

    /// Target sin el componente de query (nunca contiene `?`)
    path: String,

    /// Entorno estilo CGI: REQUEST_METHOD, REQUEST_URI, QUERY_STRING,
    /// CONTENT_TYPE / CONTENT_LENGTH sin prefijo, HTTP_<NOMBRE> para el
    /// resto de headers y RAW_POST_DATA cuando el body es texto UTF-8
    env: HashMap<String, String>,

    /// Body verbatim, byte a byte. Solo la cabecera del request (request
    /// line + headers) tiene que ser UTF-8; el body puede ser binario.
    body: Vec<u8>,
}

impl Request {
    /// Parsea un request desde los bytes de una única lectura acotada.
    ///
    /// El buffer no tiene por qué contener el mensaje completo: lo que haya
    /// después de la línea en blanco se toma como body, verbatim, sin
    /// contrastarlo contra `CONTENT_LENGTH`. La validación UTF-8 aplica
    /// línea por línea a la cabecera; el body se conserva como bytes.
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use puerta::http::Request;
    ///
    /// let raw = b"GET /page?cool=thing HTTP/1.1\r\nHost: localhost:3000\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.method(), "GET");
    /// assert_eq!(request.path(), "/page");
    /// assert_eq!(request.query_string(), "cool=thing");
    /// assert_eq!(request.param("HTTP_HOST"), Some("localhost:3000"));
    /// ```
    pub fn parse(buffer: &[u8]) -> Result<Self, ParseError> {
        if buffer.is_empty() {
            return Err(ParseError::Empty);
        }

        // 1. Request line: hasta el primer salto de línea
        let terminator = buffer
            .iter()
            .position(|&b| b == b'\n')
            .ok_or(ParseError::MissingLineTerminator)?;
        let request_line = Self::decode_line(&buffer[..terminator])?;
        let mut remainder = &buffer[terminator + 1..];

        // 2. METHOD TARGET [VERSION]
        let mut fields = request_line.split_whitespace();
        let method = fields
            .next()
            .ok_or(ParseError::InvalidRequestLine)?
            .to_ascii_uppercase();
        let target = fields.next().ok_or(ParseError::InvalidRequestLine)?;

        // 3. El target se parte en el primer `?`
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path.to_string(), query.to_string()),
            None => (target.to_string(), String::new()),
        };

        let mut env = HashMap::new();
        env.insert("REQUEST_METHOD".to_string(), method.clone());
        env.insert("REQUEST_URI".to_string(), target.to_string());
        // QUERY_STRING siempre presente, vacío si no hubo `?`
        env.insert("QUERY_STRING".to_string(), query);

        // 4. Headers hasta la línea en blanco o el fin del buffer
        let mut saw_blank_line = false;
        while !remainder.is_empty() {
            let (raw_line, rest) = match remainder.iter().position(|&b| b == b'\n') {
                Some(pos) => (&remainder[..pos], &remainder[pos + 1..]),
                // Última línea sin terminador: sigue siendo un header
                None => (remainder, &[][..]),
            };
            remainder = rest;
            let line = Self::decode_line(raw_line)?;
            if line.is_empty() {
                saw_blank_line = true;
                break;
            }
            Self::parse_header_line(line, &mut env)?;
        }

        // 5. Lo que queda tras la línea en blanco es el body, byte a byte.
        // RAW_POST_DATA solo se publica cuando el body es texto UTF-8; un
        // body binario sigue disponible vía `body()`.
        let body = if saw_blank_line {
            remainder.to_vec()
        } else {
            Vec::new()
        };
        if !body.is_empty() {
            if let Ok(text) = std::str::from_utf8(&body) {
                env.insert("RAW_POST_DATA".to_string(), text.to_string());
            }
        }

        Ok(Request {
            method,
            path,
            env,
            body,
        })
    }

    /// Decodifica una línea de la cabecera: descarta el `\r` final y exige
    /// UTF-8 válido. El body nunca pasa por acá.
    fn decode_line(line: &[u8]) -> Result<&str, ParseError> {
        let line = match line.last() {
            Some(b'\r') => &line[..line.len() - 1],
            _ => line,
        };
        std::str::from_utf8(line).map_err(|_| ParseError::InvalidEncoding)
    }

    /// Parsea una línea `Nombre: valor` y la inserta en el entorno.
    ///
    /// Regla de mapeo: nombre en mayúsculas con `-` → `_`. `Content-Type` y
    /// `Content-Length` se guardan sin prefijo; el resto como `HTTP_<NOMBRE>`.
    fn parse_header_line(line: &str, env: &mut HashMap<String, String>) -> Result<(), ParseError> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| ParseError::InvalidHeader(line.to_string()))?;

        let canonical = name.trim().to_ascii_uppercase().replace('-', "_");
        let key = match canonical.as_str() {
            "CONTENT_TYPE" | "CONTENT_LENGTH" => canonical,
            _ => format!("HTTP_{}", canonical),
        };
        env.insert(key, value.trim_start().to_string());
        Ok(())
    }

    /// Inserta la dirección del peer en el entorno.
    ///
    /// La llama la capa de conexión después del parseo: el parser no puede
    /// conocer al cliente porque no ve el socket.
    pub fn set_remote_addr(&mut self, addr: &str) {
        self.env.insert("REMOTE_ADDR".to_string(), addr.to_string());
    }

    /// Libera los recursos temporales del request (el body retenido).
    ///
    /// Idempotente: cerrarlo más de una vez no falla ni hace nada nuevo.
    /// También se invoca automáticamente al hacer drop.
    pub fn close(&mut self) {
        self.body = Vec::new();
        self.env.remove("RAW_POST_DATA");
    }

    // === Accesores ===

    /// Método HTTP en mayúsculas (ej: "GET")
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Path sin query string (ej: "/page")
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Target literal de la request line, query incluida
    pub fn request_uri(&self) -> &str {
        self.env
            .get("REQUEST_URI")
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Porción después del `?`, vacía si no hubo
    pub fn query_string(&self) -> &str {
        self.env
            .get("QUERY_STRING")
            .map(String::as_str)
            .unwrap_or_default()
    }

    /// Entorno completo estilo CGI
    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    /// Una clave concreta del entorno
    ///
    /// # Ejemplo
    /// ```
    /// use puerta::http::Request;
    ///
    /// let raw = b"GET /index.html HTTP/1.1\r\n\r\n";
    /// let request = Request::parse(raw).unwrap();
    ///
    /// assert_eq!(request.param("REQUEST_METHOD"), Some("GET"));
    /// assert_eq!(request.param("REMOTE_ADDR"), None);
    /// ```
    pub fn param(&self, name: &str) -> Option<&str> {
        self.env.get(name).map(String::as_str)
    }

    /// Vista del body (vacía si no hubo body o ya se liberó)
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl Drop for Request {
    fn drop(&mut self) {
        self.close();
    }
}
