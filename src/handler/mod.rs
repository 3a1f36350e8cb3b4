//! # Cadena de Handlers
//! src/handler/mod.rs
//!
//! Este módulo define el contrato entre el servidor y la lógica de
//! aplicación: un `Handler` es una capacidad opaca que puede responder un
//! request por completo, y la `HandlerChain` los prueba en orden hasta que
//! alguno lo reclame.
//!
//! ## Arquitectura
//!
//! ```text
//! Request → [Handler 1] → [Handler 2] → ... → served / not-found
//! ```
//!
//! El primero que retorna `Ok(true)` gana y nadie más se ejecuta. La cadena
//! es configuración: se arma una vez al construir el servidor y después es
//! de solo lectura, compartida entre conexiones.

use std::error::Error;

use crate::http::{Request, Response};

/// Error opaco de un handler. El servidor no distingue causas: cualquier
/// fallo se loguea y la conexión se cierra sin respuesta.
pub type HandlerError = Box<dyn Error + Send + Sync>;

/// Una unidad enchufable que puede responder un request por completo.
///
/// Retornar `Ok(true)` significa "serví este request: la response quedó
/// poblada y nadie más debe correr". `Ok(false)` significa "no es mío,
/// prueben con el siguiente".
///
/// Los handlers se comparten entre conexiones concurrentes; si uno guarda
/// estado mutable, la sincronización de ese estado es responsabilidad suya
/// (de ahí el bound `Send + Sync`).
pub trait Handler: Send + Sync {
    fn process(&self, request: &Request, response: &mut Response) -> Result<bool, HandlerError>;
}

/// Las funciones y closures con la firma correcta son handlers directamente.
///
/// # Ejemplo
/// ```
/// use puerta::handler::{HandlerChain, HandlerError};
/// use puerta::http::{Request, Response};
///
/// fn hola(_request: &Request, response: &mut Response) -> Result<bool, HandlerError> {
///     response.set_body(b"hola".to_vec());
///     Ok(true)
/// }
///
/// let chain = HandlerChain::new().with(hola);
/// ```
impl<F> Handler for F
where
    F: Fn(&Request, &mut Response) -> Result<bool, HandlerError> + Send + Sync,
{
    fn process(&self, request: &Request, response: &mut Response) -> Result<bool, HandlerError> {
        self(request, response)
    }
}

/// Secuencia ordenada de handlers, con semántica de primer-match-gana
pub struct HandlerChain {
    handlers: Vec<Box<dyn Handler>>,
}

impl HandlerChain {
    /// Crea una cadena vacía (todo request terminará en el 404 de fallback)
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Agrega un handler al final de la cadena
    pub fn push(&mut self, handler: impl Handler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    /// Versión builder de `push`
    pub fn with(mut self, handler: impl Handler + 'static) -> Self {
        self.push(handler);
        self
    }

    /// Cantidad de handlers registrados
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Verifica si la cadena está vacía
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Recorre la cadena en orden de registro y retorna si alguien sirvió.
    ///
    /// Se detiene en el primer `Ok(true)`; un `Err` aborta el recorrido y
    /// se propaga tal cual (el servidor lo trata como fallo de conexión).
    pub fn dispatch(
        &self,
        request: &Request,
        response: &mut Response,
    ) -> Result<bool, HandlerError> {
        for handler in &self.handlers {
            if handler.process(request, response)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

impl Default for HandlerChain {
    fn default() -> Self {
        Self::new()
    }
}
