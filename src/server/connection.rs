//! # Procesamiento de Conexiones
//! src/server/connection.rs
//!
//! Orquesta una conexión aceptada de punta a punta: lectura acotada única,
//! parseo, inyección de `REMOTE_ADDR`, recorrido de la cadena de handlers y
//! escritura de la respuesta (o del 404 literal de fallback). Pase lo que
//! pase, la conexión se cierra y los recursos se liberan.
//!
//! Los fallos quedan aislados por conexión: un request malformado o un
//! handler que falla se loguea y el cliente solo observa la conexión
//! cerrada, sin bytes de respuesta. El accept loop nunca se entera.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::Arc;

use thiserror::Error;

use crate::handler::{HandlerChain, HandlerError};
use crate::http::{ParseError, Request, Response};

/// Payload literal enviado verbatim cuando ningún handler reclama el
/// request. No se construye un `Response` para este caso.
pub const NOT_FOUND_RESPONSE: &[u8] =
    b"HTTP/1.0 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

/// Taxonomía de fallos al procesar una conexión. Solo dos clases importan
/// aguas arriba: request malformado y todo lo demás.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// El byte stream no respeta la gramática mínima del request
    #[error("request malformado: {0}")]
    Malformed(#[from] ParseError),

    /// Un handler falló mientras se ejecutaba
    #[error("fallo de handler: {0}")]
    Handler(HandlerError),

    /// Fallo de I/O leyendo o escribiendo el socket
    #[error("fallo de i/o en la conexión: {0}")]
    Io(#[from] io::Error),
}

/// Procesador de conexiones: comparte la cadena (solo lectura) entre todas
/// las conexiones y no guarda ningún otro estado.
#[derive(Clone)]
pub struct ConnectionProcessor {
    chain: Arc<HandlerChain>,
    chunk_size: usize,
}

impl ConnectionProcessor {
    pub fn new(chain: Arc<HandlerChain>, chunk_size: usize) -> Self {
        Self { chain, chunk_size }
    }

    /// Procesa una conexión aceptada.
    ///
    /// Exactamente una de tres salidas: response serializada, 404 literal,
    /// o ningún byte escrito (input malformado / fallo inesperado). En
    /// todos los casos la conexión termina cerrada.
    pub fn process(&self, mut stream: TcpStream) {
        match self.exchange(&mut stream) {
            Ok(()) => {}
            Err(ProcessError::Malformed(e)) => {
                log::error!("Request inválido: {}", e);
            }
            Err(e) => {
                log::error!("Error inesperado procesando la conexión: {}", e);
            }
        }

        // Cierre del socket, independiente del resultado anterior.
        // NotConnected significa que el peer ya cerró: no es un fallo.
        if let Err(e) = stream.shutdown(Shutdown::Both) {
            if e.kind() != io::ErrorKind::NotConnected {
                log::warn!("Error liberando la conexión: {}", e);
            }
        }
    }

    /// El intercambio completo: una lectura, un parseo, un dispatch, una
    /// escritura. El request se libera antes de propagar cualquier fallo.
    fn exchange(&self, stream: &mut TcpStream) -> Result<(), ProcessError> {
        let mut buffer = vec![0u8; self.chunk_size];
        let bytes_read = stream.read(&mut buffer)?;

        // Fin de stream inmediato: el peer conectó y cerró. No es un error.
        if bytes_read == 0 {
            return Ok(());
        }

        let mut request = Request::parse(&buffer[..bytes_read])?;

        // REMOTE_ADDR recién se conoce acá, con el socket en la mano
        if let Ok(peer) = stream.peer_addr() {
            request.set_remote_addr(&peer.ip().to_string());
        }

        log::debug!("{} {}", request.method(), request.request_uri());

        let mut response = Response::new();
        let dispatched = self.chain.dispatch(&request, &mut response);

        let written = match dispatched {
            Ok(true) => response.write(stream).map_err(ProcessError::Io),
            Ok(false) => stream
                .write_all(NOT_FOUND_RESPONSE)
                .and_then(|_| stream.flush())
                .map_err(ProcessError::Io),
            Err(e) => Err(ProcessError::Handler(e)),
        };

        // La liberación del request no depende de cómo salió el dispatch
        // ni la escritura; la response se libera al salir del scope.
        request.close();
        written
    }
}
