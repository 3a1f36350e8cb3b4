//! # Construcción de Respuestas HTTP
//! src/http/response.rs
//!
//! Este módulo proporciona el acumulador de respuesta que mutan los
//! handlers (status, headers, body) y su única operación de serialización,
//! que escribe la respuesta completa sobre un sink en una sola pasada.
//!
//! ## Formato producido
//!
//! ```text
//! HTTP/1.0 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 12\r\n
//! \r\n
//! <h1>hola</h1>
//! ```

use std::collections::HashMap;
use std::io::{self, Write};

use super::StatusCode;

/// Una respuesta HTTP en construcción.
///
/// Se crea fresca por conexión, la muta el handler que reclama el request
/// y se serializa exactamente una vez.
#[derive(Debug, Clone)]
pub struct Response {
    /// Código de estado; 200 OK si ningún handler lo cambia
    status: StatusCode,

    /// Headers HTTP; HashMap para garantizar claves únicas
    headers: HashMap<String, String>,

    /// Cuerpo de la respuesta (puede ser vacío)
    body: Vec<u8>,
}

impl Response {
    /// Crea una respuesta vacía con estado 200 OK.
    ///
    /// # Ejemplo
    /// ```
    /// use puerta::http::{Response, StatusCode};
    ///
    /// let response = Response::new();
    /// assert_eq!(response.status(), StatusCode::Ok);
    /// ```
    pub fn new() -> Self {
        Self {
            status: StatusCode::Ok,
            headers: HashMap::new(),
            body: Vec::new(),
        }
    }

    /// Cambia el código de estado
    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    /// Versión builder de `set_status`
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Agrega un header; si ya existe se sobrescribe
    pub fn add_header(&mut self, name: &str, value: &str) {
        self.headers.insert(name.to_string(), value.to_string());
    }

    /// Versión builder de `add_header`
    ///
    /// # Ejemplo
    /// ```
    /// use puerta::http::Response;
    ///
    /// let response = Response::new()
    ///     .with_header("Content-Type", "text/html");
    /// ```
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.add_header(name, value);
        self
    }

    /// Establece el body desde bytes y calcula `Content-Length`
    pub fn set_body(&mut self, body: Vec<u8>) {
        self.headers
            .insert("Content-Length".to_string(), body.len().to_string());
        self.body = body;
    }

    /// Versión builder de `set_body` para texto
    ///
    /// # Ejemplo
    /// ```
    /// use puerta::http::Response;
    ///
    /// let response = Response::new().with_body("Hello World");
    /// assert_eq!(response.headers().get("Content-Length"), Some(&"11".to_string()));
    /// ```
    pub fn with_body(mut self, body: &str) -> Self {
        self.set_body(body.as_bytes().to_vec());
        self
    }

    /// Versión builder de `set_body` para contenido binario
    pub fn with_body_bytes(mut self, body: Vec<u8>) -> Self {
        self.set_body(body);
        self
    }

    /// Serializa la respuesta completa sobre el sink, en una sola pasada:
    /// status line, headers, línea en blanco y body.
    pub fn write<W: Write>(&self, sink: &mut W) -> io::Result<()> {
        sink.write_all(&self.to_bytes())?;
        sink.flush()
    }

    /// Convierte la respuesta a los bytes del wire format
    ///
    /// # Ejemplo
    /// ```
    /// use puerta::http::Response;
    ///
    /// let bytes = Response::new().with_body("Test").to_bytes();
    /// let text = String::from_utf8(bytes).unwrap();
    /// assert!(text.starts_with("HTTP/1.0 200 OK\r\n"));
    /// assert!(text.ends_with("\r\n\r\nTest"));
    /// ```
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut result = Vec::new();

        // 1. Status line: HTTP/1.0 200 OK\r\n
        let status_line = format!("HTTP/1.0 {}\r\n", self.status);
        result.extend_from_slice(status_line.as_bytes());

        // 2. Headers: Nombre: Valor\r\n
        for (name, value) in &self.headers {
            let header_line = format!("{}: {}\r\n", name, value);
            result.extend_from_slice(header_line.as_bytes());
        }

        // 3. Línea en blanco que separa headers del body
        result.extend_from_slice(b"\r\n");

        // 4. Body (si existe)
        result.extend_from_slice(&self.body);

        result
    }

    /// Obtiene el código de estado
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Obtiene una referencia a los headers
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    /// Obtiene una referencia al body
    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}
