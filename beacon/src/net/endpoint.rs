use crate::robot::Robot;
use lodestone::logging;
use std::io;
use std::net::TcpListener;
use std::thread;

/// Owns the listening socket and hands every accepted connection to its own
/// driver thread. The accept loop is the only serialization point; drivers
/// share nothing.
pub struct Endpoint {
    listener: TcpListener,
    port: u16,
    log: logging::Logger,
}

impl Endpoint {
    /// Binds the listener, probing ports upward from `base_port` until one
    /// binds. Exhausting the port range surfaces the last bind error.
    pub fn bind(host: &str, base_port: u16, log: &logging::Logger) -> io::Result<Endpoint> {
        let mut probe = base_port;

        loop {
            match TcpListener::bind((host, probe)) {
                Ok(listener) => {
                    let port = listener.local_addr()?.port();
                    let log = log.new(logging::o!("port" => port));

                    logging::debug!(log, "listener bound"; "context" => "bind");

                    return Ok(Endpoint { listener, port, log });
                }
                Err(error) => {
                    logging::debug!(log, "port probe failed";
                                    "context" => "bind",
                                    "port" => probe,
                                    "error" => ?error);

                    probe = match probe.checked_add(1) {
                        Some(next) => next,
                        None => return Err(error),
                    };
                }
            }
        }
    }

    /// Port the listener ended up on.
    #[inline]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Accepts connections forever, spawning one driver per client.
    pub fn run(self) {
        println!("Started server on port {}", self.port);

        logging::info!(self.log, "server started"; "context" => "run");

        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => {
                    logging::debug!(self.log, "connection accepted"; "context" => "run", "peer" => %peer);

                    let log = self.log.new(logging::o!("peer" => peer.to_string()));

                    thread::spawn(move || Robot::new(stream, &log).run());
                }
                Err(error) => {
                    logging::warn!(self.log, "accept failed"; "context" => "run", "error" => ?error);
                }
            }
        }
    }
}
