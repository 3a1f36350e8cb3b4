//! # Puerta
//! src/lib.rs
//!
//! El borde de escucha de un servidor de aplicaciones chico: acepta
//! conexiones TCP crudas, parsea un request HTTP/1.x por conexión, lo
//! despacha por una cadena ordenada de handlers (el primero que lo reclama
//! gana) y escribe la respuesta de vuelta al socket.
//!
//! ## Arquitectura
//!
//! - `http`: parsing de requests a entorno estilo CGI, responses y status codes
//! - `handler`: el contrato `process(request, response) -> served` y la cadena
//! - `server`: accept loop, procesamiento por conexión y apagado graceful
//! - `config`: argumentos CLI y variables de entorno
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use puerta::config::Config;
//! use puerta::handler::{HandlerChain, HandlerError};
//! use puerta::http::{Request, Response};
//! use puerta::server::Server;
//!
//! fn hola(_request: &Request, response: &mut Response) -> Result<bool, HandlerError> {
//!     response.set_body(b"hola".to_vec());
//!     Ok(true)
//! }
//!
//! let chain = HandlerChain::new().with(hola);
//! let mut server = Server::bind(Config::default(), chain).expect("bind");
//! server.run().expect("run");
//! ```

pub mod config;
pub mod handler;
pub mod http;
pub mod server;
