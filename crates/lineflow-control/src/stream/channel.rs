use std::io;
use std::net::{SocketAddr, UdpSocket};

use crate::error::{DeviceError, Result};

/// Resolves the device's stream endpoint without blocking the runtime.
pub async fn resolve(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await?
        .next()
        .ok_or_else(|| DeviceError::DeviceUnreachable(format!("Cannot resolve {}", host)))
}

/// Non-blocking, send-only datagram socket aimed at the device.
#[derive(Debug)]
pub struct StreamChannel {
    socket: UdpSocket,
    target: SocketAddr,
}

impl StreamChannel {
    /// Binds an ephemeral local socket of the same family as `target`.
    pub fn open(target: SocketAddr) -> Result<Self> {
        let bind = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
        let socket = UdpSocket::bind(bind)?;
        socket.set_nonblocking(true)?;

        tracing::info!("Stream channel opened -> {}", target);

        Ok(Self { socket, target })
    }

    /// Sends one datagram. Never waits; a full socket buffer is an error.
    pub fn send(&self, datagram: &[u8]) -> io::Result<()> {
        let sent = self.socket.send_to(datagram, self.target)?;
        if sent != datagram.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short datagram: {} of {} bytes", sent, datagram.len()),
            ));
        }
        tracing::trace!("Sent {} byte frame to {}", sent, self.target);
        Ok(())
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}
