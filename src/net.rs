//! Local network helpers.

use std::net::{IpAddr, Ipv4Addr};

use tokio::net::UdpSocket;

/// Address used only to pick the outbound interface; no packet is sent.
const PROBE_ADDR: &str = "8.8.8.8:80";

/// Best guess at this host's LAN address.
///
/// Connecting a UDP socket makes the OS choose the interface of the default
/// route without sending anything. Falls back to `127.0.0.1`.
pub async fn suggest_local_ip() -> IpAddr {
    match detect_local_ip().await {
        Ok(ip) if !ip.is_unspecified() => ip,
        Ok(_) => IpAddr::V4(Ipv4Addr::LOCALHOST),
        Err(e) => {
            tracing::debug!(error = %e, "Could not determine LAN address");
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        }
    }
}

async fn detect_local_ip() -> std::io::Result<IpAddr> {
    let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
    socket.connect(PROBE_ADDR).await?;
    Ok(socket.local_addr()?.ip())
}
