//! # Listener TCP
//! src/server/listener.rs
//!
//! Socket de escucha con `accept` de timeout corto. El timeout no limita a
//! las conexiones: solo le permite al loop de aceptación revisar
//! periódicamente si se pidió apagar el servidor.
//!
//! La librería estándar no ofrece timeout para `accept`, así que el socket
//! queda en modo no bloqueante y un `WouldBlock` se convierte en
//! `Accepted::Timeout` después de dormir el intervalo de sondeo.

use super::ServerError;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

/// Conexión aceptada, propiedad exclusiva de un único worker
#[derive(Debug)]
pub struct Connection {
    /// Id secuencial (para logs)
    pub id: u64,
    pub stream: TcpStream,
    pub peer: SocketAddr,
    /// Momento en que se aceptó (para el turnaround)
    pub accepted_at: Instant,
}

/// Resultado de un intento de `accept`
#[derive(Debug)]
pub enum Accepted {
    Connection(Connection),
    /// No llegó ninguna conexión dentro del intervalo de sondeo
    Timeout,
}

/// Socket de escucha del servidor
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
    poll_interval: Duration,
    next_id: u64,
}

impl Listener {
    /// Crea el socket de escucha; un fallo aquí es fatal para el servidor
    pub fn bind(address: &str, poll_interval: Duration) -> Result<Self, ServerError> {
        let bind_error = |source| ServerError::Bind {
            address: address.to_string(),
            source,
        };

        let inner = TcpListener::bind(address).map_err(bind_error)?;
        inner.set_nonblocking(true).map_err(bind_error)?;

        Ok(Self {
            inner,
            poll_interval,
            next_id: 1,
        })
    }

    /// Dirección real de escucha (útil con el puerto 0)
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    /// Espera una conexión durante a lo sumo un intervalo de sondeo
    pub fn accept(&mut self) -> io::Result<Accepted> {
        match self.inner.accept() {
            Ok((stream, peer)) => {
                // Algunas plataformas heredan el modo no bloqueante del listener
                stream.set_nonblocking(false)?;

                let id = self.next_id;
                self.next_id += 1;

                Ok(Accepted::Connection(Connection {
                    id,
                    stream,
                    peer,
                    accepted_at: Instant::now(),
                }))
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(self.poll_interval);
                Ok(Accepted::Timeout)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    fn listener() -> Listener {
        Listener::bind("127.0.0.1:0", Duration::from_millis(5)).unwrap()
    }

    #[test]
    fn test_timeout_without_clients() {
        let mut listener = listener();
        assert!(matches!(listener.accept().unwrap(), Accepted::Timeout));
    }

    #[test]
    fn test_accepts_blocking_stream_with_sequential_ids() {
        let mut listener = listener();
        let addr = listener.local_addr().unwrap();

        let _first = TcpStream::connect(addr).unwrap();
        let _second = TcpStream::connect(addr).unwrap();

        let mut ids = Vec::new();
        while ids.len() < 2 {
            if let Accepted::Connection(connection) = listener.accept().unwrap() {
                ids.push(connection.id);
            }
        }
        assert_eq!(ids, vec![1, 2]);
    }

    #[test]
    fn test_accepted_stream_is_blocking() {
        let mut listener = listener();
        let addr = listener.local_addr().unwrap();

        let mut client = TcpStream::connect(addr).unwrap();
        let mut connection = loop {
            if let Accepted::Connection(connection) = listener.accept().unwrap() {
                break connection;
            }
        };

        let writer = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            client.write_all(b"ping").unwrap();
        });

        // En modo no bloqueante este read fallaría con WouldBlock
        let mut buf = [0u8; 4];
        connection.stream.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"ping");
        writer.join().unwrap();
    }

    #[test]
    fn test_bind_conflict_is_an_error() {
        let first = listener();
        let addr = first.local_addr().unwrap().to_string();

        let result = Listener::bind(&addr, Duration::from_millis(5));
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }
}
