//! Where rendered reports go.
//!
//! [`MetricSink`] is the seam between the scheduler and the network.
//! [`GraphiteTarget`] is the plaintext TCP sink: one connection per push,
//! payload written, write half closed.

use std::future::Future;
use std::net::IpAddr;
use std::pin::Pin;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::{ReporterError, ReporterResult};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Receives one rendered report per push.
pub trait MetricSink: Send + Sync {
    fn send<'a>(&'a self, payload: &'a str) -> BoxFuture<'a, ReporterResult<()>>;

    /// Human-readable destination, for logs.
    fn describe(&self) -> String;
}

/// A Graphite carbon endpoint (`host:port`).
///
/// Construction only validates the address; nothing touches the network until
/// the first push.
#[derive(Debug, Clone)]
pub struct GraphiteTarget {
    host: String,
    port: u16,
    connect_timeout: Duration,
}

impl GraphiteTarget {
    pub fn new(host: &str, port: u16) -> ReporterResult<Self> {
        validate_host(host)?;
        if port == 0 {
            return Err(ReporterError::InvalidPort(port));
        }
        Ok(Self {
            host: host.to_string(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl MetricSink for GraphiteTarget {
    fn send<'a>(&'a self, payload: &'a str) -> BoxFuture<'a, ReporterResult<()>> {
        Box::pin(async move {
            if payload.is_empty() {
                return Ok(());
            }

            let connect = TcpStream::connect((self.host.as_str(), self.port));
            let mut stream = tokio::time::timeout(self.connect_timeout, connect)
                .await
                .map_err(|_| ReporterError::ConnectTimeout(self.endpoint()))??;

            stream.write_all(payload.as_bytes()).await?;
            stream.shutdown().await?;

            debug!(endpoint = %self.endpoint(), bytes = payload.len(), "report sent");
            Ok(())
        })
    }

    fn describe(&self) -> String {
        self.endpoint()
    }
}

/// Accept an IP literal or an RFC 1123 hostname.
fn validate_host(host: &str) -> ReporterResult<()> {
    if host.parse::<IpAddr>().is_ok() {
        return Ok(());
    }

    let invalid = || ReporterError::InvalidHost(host.to_string());
    let name = host.strip_suffix('.').unwrap_or(host);
    if name.is_empty() || name.len() > 253 {
        return Err(invalid());
    }

    for label in name.split('.') {
        let valid = !label.is_empty()
            && label.len() <= 63
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(invalid());
        }
    }
    Ok(())
}
