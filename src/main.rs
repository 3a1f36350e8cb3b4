//! # Puerta - Entry Point
//! src/main.rs
//!
//! Punto de entrada: configuración, logger y arranque del servidor con una
//! cadena de ejemplo. La lógica de aplicación real viene de afuera, como
//! handlers; acá solo se registra uno mínimo para poder probar el borde.

use puerta::config::Config;
use puerta::handler::{HandlerChain, HandlerError};
use puerta::http::{Request, Response};
use puerta::server::Server;

/// Handler de ejemplo: responde "pong" en /ping y deja pasar el resto
fn ping_handler(request: &Request, response: &mut Response) -> Result<bool, HandlerError> {
    if request.path() != "/ping" {
        return Ok(false);
    }
    response.add_header("Content-Type", "text/plain");
    response.set_body(b"pong\n".to_vec());
    Ok(true)
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::new();
    if let Err(e) = config.validate() {
        log::error!("Configuración inválida: {}", e);
        std::process::exit(1);
    }

    let chain = HandlerChain::new().with(ping_handler);

    let mut server = match Server::bind(config, chain) {
        Ok(server) => server,
        Err(e) => {
            log::error!("No se pudo abrir el socket de escucha: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        log::error!("Error fatal: {}", e);
        std::process::exit(1);
    }
}
