//! # Servidor TCP
//! src/server/tcp.rs
//!
//! El dueño del socket de escucha. Acepta conexiones en loop y entrega cada
//! una a un `ConnectionProcessor` en su propio thread; la cadena de
//! handlers queda fija en la construcción y se comparte de solo lectura.
//!
//! ## Apagado graceful
//!
//! El stop flag es un `AtomicBool` compartido: lo setea `stop()`, o SIGINT
//! a través de `signal_hook::flag::register`. El listener trabaja en modo
//! no bloqueante y el loop sondea el flag en cada vuelta, así que el
//! apagado se concreta dentro de un ciclo de accept (el intervalo de
//! sondeo). Nada cancela una conexión ya en vuelo: al salir del loop se
//! deja de aceptar y se espera a que los workers pendientes terminen.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::Config;
use crate::handler::HandlerChain;
use crate::server::connection::ConnectionProcessor;

/// Servidor HTTP de un intercambio por conexión.
///
/// Ciclo de vida: `bind` abre el socket (Created), `run` activa el accept
/// loop (Running) y el stop flag o SIGINT lo llevan a Stopped, con el
/// socket de escucha cerrado exactamente una vez.
pub struct Server {
    config: Config,
    processor: ConnectionProcessor,
    stop: Arc<AtomicBool>,
    listener: Option<TcpListener>,
}

impl Server {
    /// Abre el socket de escucha y deja el servidor listo para `run`.
    ///
    /// La cadena de handlers se entrega acá y no se puede mutar después.
    pub fn bind(config: Config, chain: HandlerChain) -> io::Result<Self> {
        let listener = TcpListener::bind(config.address())?;
        let processor = ConnectionProcessor::new(Arc::new(chain), config.chunk_size);

        Ok(Self {
            config,
            processor,
            stop: Arc::new(AtomicBool::new(false)),
            listener: Some(listener),
        })
    }

    /// Dirección real en la que quedó escuchando (útil con puerto 0)
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.listener.as_ref().and_then(|l| l.local_addr().ok())
    }

    /// Handle clonable del stop flag, para detener el servidor desde otro
    /// thread mientras `run` bloquea este
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop)
    }

    /// Pide el apagado: el accept loop termina dentro de un ciclo de sondeo
    pub fn stop(&self) {
        log::info!("[*] Deteniendo ...");
        self.stop.store(true, Ordering::SeqCst);
    }

    /// Verifica si el socket de escucha ya se cerró
    pub fn is_stopped(&self) -> bool {
        self.listener.is_none()
    }

    /// Corre el accept loop hasta que el stop flag se active.
    ///
    /// Un accept fallido o interrumpido cuenta como "sin conexión en esta
    /// vuelta", nunca como error fatal. Al salir, se espera a los workers
    /// en vuelo, el socket de escucha se cierra (idempotente) y el servidor
    /// queda en estado Stopped.
    pub fn run(&mut self) -> io::Result<()> {
        let listener = self.listener.as_ref().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotConnected, "el servidor ya fue detenido")
        })?;

        self.stop.store(false, Ordering::SeqCst);

        // SIGINT activa el mismo flag que stop()
        #[cfg(unix)]
        if let Err(e) =
            signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&self.stop))
        {
            log::warn!("No se pudo registrar el handler de SIGINT: {}", e);
        }

        // Accept no bloqueante: el loop sondea el stop flag entre intentos
        listener.set_nonblocking(true)?;
        let poll_interval = Duration::from_millis(self.config.poll_ms);

        let bound = listener
            .local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_else(|_| self.config.address());

        log::info!("[*] Puerta v{}", env!("CARGO_PKG_VERSION"));
        log::info!("[+] Escuchando en {}, CTRL+C para detener", bound);

        let mut workers: Vec<thread::JoinHandle<()>> = Vec::new();

        while !self.stop.load(Ordering::SeqCst) {
            // Los handles de workers ya terminados se descartan acá para
            // que la lista no crezca sin límite
            workers.retain(|worker| !worker.is_finished());

            match listener.accept() {
                Ok((stream, peer)) => {
                    log::debug!("[+] Nueva conexión desde {}", peer);
                    workers.push(self.dispatch(stream));
                }
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::Interrupted =>
                {
                    thread::sleep(poll_interval);
                }
                Err(e) => {
                    // Tolerado: se intenta de nuevo en la próxima vuelta
                    log::warn!("Error al aceptar conexión: {}", e);
                    thread::sleep(poll_interval);
                }
            }
        }

        // Drenaje: las conexiones ya aceptadas terminan su intercambio
        // antes de declarar el apagado
        for worker in workers {
            if worker.join().is_err() {
                log::warn!("Un worker de conexión terminó con panic");
            }
        }

        // Cierre idempotente del socket de escucha
        self.listener.take();
        log::info!("[*] Servidor detenido");
        Ok(())
    }

    /// Entrega una conexión aceptada a su propio thread.
    ///
    /// El trío request/response/socket queda en propiedad exclusiva del
    /// thread; lo único compartido es la cadena, detrás de un Arc. El
    /// deadline por conexión evita que un cliente colgado retenga su thread
    /// para siempre. El handle devuelto permite que `run` drene los workers
    /// pendientes antes de declararse detenido.
    fn dispatch(&self, stream: TcpStream) -> thread::JoinHandle<()> {
        let timeout = Duration::from_millis(self.config.timeout_ms);

        // El socket aceptado vuelve a modo bloqueante, con deadline
        if let Err(e) = stream
            .set_nonblocking(false)
            .and_then(|_| stream.set_read_timeout(Some(timeout)))
            .and_then(|_| stream.set_write_timeout(Some(timeout)))
        {
            log::warn!("No se pudo configurar el socket aceptado: {}", e);
        }

        let processor = self.processor.clone();
        thread::spawn(move || processor.process(stream))
    }
}
