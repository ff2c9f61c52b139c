// Listener bootstrap module
// Binds the configured port, walking forward through a small window when the
// address is already taken.

use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::logger;

/// How many successive ports to try before giving up
const PORT_RETRY_WINDOW: u16 = 10;

/// Bind `addr`, retrying on successive ports while the address is in use.
///
/// Returns the listener together with the address actually bound, which may
/// differ from the configured one.
pub fn bind_with_retry(addr: SocketAddr) -> io::Result<(TcpListener, SocketAddr)> {
    let base_port = addr.port();

    for offset in 0..PORT_RETRY_WINDOW {
        let Some(port) = base_port.checked_add(offset) else {
            break;
        };
        let mut candidate = addr;
        candidate.set_port(port);

        match create_listener(candidate) {
            Ok(listener) => {
                // Asking for port 0 binds an ephemeral port; report what the
                // OS actually handed out.
                let bound = listener.local_addr()?;
                if offset > 0 {
                    logger::log_port_fallback(base_port, bound.port());
                }
                return Ok((listener, bound));
            }
            Err(e) if e.kind() == io::ErrorKind::AddrInUse => {
                logger::log_port_in_use(port);
            }
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        io::ErrorKind::AddrInUse,
        format!(
            "no free port in {base_port}..{}",
            u32::from(base_port) + u32::from(PORT_RETRY_WINDOW)
        ),
    ))
}

/// Create a non-blocking `TcpListener` on `addr`.
///
/// `SO_REUSEADDR` lets a restart rebind through TIME_WAIT. No `SO_REUSEPORT`:
/// an actively bound port must surface `AddrInUse` for the retry walk.
fn create_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(128)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bind_free_port() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let (_listener, bound) = bind_with_retry(addr).expect("ephemeral bind");
        assert_ne!(bound.port(), 0);
    }

    #[tokio::test]
    async fn test_occupied_port_falls_forward() {
        // Occupy an ephemeral port, then ask for that exact port again.
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let (_holder, taken) = bind_with_retry(addr).expect("ephemeral bind");

        let (_listener, bound) = bind_with_retry(taken).expect("fallback bind");
        assert_ne!(bound.port(), taken.port());
        assert!(bound.port() > taken.port());
        assert!(bound.port() < taken.port() + PORT_RETRY_WINDOW);
    }
}
