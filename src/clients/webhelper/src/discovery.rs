use std::net::{IpAddr, Ipv4Addr};
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;

pub const PROBE_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("no port in use between {start} and {end}")]
    NotFound { start: u16, end: u16 },
}

/// Returns the first port in `range` (ascending) that accepts a TCP
/// connection on `host`.
///
/// Anything listening there is assumed to be the helper.
pub async fn probe(
    host: IpAddr,
    range: RangeInclusive<u16>,
    per_port_timeout: Duration,
) -> Result<u16, ProbeError> {
    let (start, end) = (*range.start(), *range.end());
    for port in range {
        if port_in_use(host, port, per_port_timeout).await {
            tracing::debug!(port, "port in use");
            return Ok(port);
        }
    }
    Err(ProbeError::NotFound { start, end })
}

pub async fn port_in_use(host: IpAddr, port: u16, timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(timeout, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}
