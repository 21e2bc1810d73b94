use super::protocol;
use crate::config::GatewayConfig;
use crate::domain::field_map::FieldMap;
use crate::domain::fields::Field;
use crate::domain::ports::Gateway;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, instrument};

/// Byte stream to the gateway, encrypted or not.
pub trait GatewayStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> GatewayStream for T {}

pub type BoxedStream = Box<dyn GatewayStream>;

/// Opens a fresh connection for a single exchange.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, host: &str, port: u16) -> io::Result<BoxedStream>;
}

/// TLS over TCP using the platform's trust store.
#[derive(Clone)]
pub struct TlsConnector {
    inner: tokio_native_tls::TlsConnector,
}

impl TlsConnector {
    pub fn new() -> Result<Self> {
        let connector = native_tls::TlsConnector::new()
            .map_err(|e| PaymentError::ConfigError(format!("TLS setup failed: {}", e)))?;
        Ok(Self {
            inner: tokio_native_tls::TlsConnector::from(connector),
        })
    }
}

#[async_trait]
impl Connector for TlsConnector {
    async fn connect(&self, host: &str, port: u16) -> io::Result<BoxedStream> {
        let tcp = TcpStream::connect((host, port)).await?;
        let tls = self
            .inner
            .connect(host, tcp)
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::ConnectionAborted, e))?;
        Ok(Box::new(tls))
    }
}

/// Unencrypted TCP, for gateways simulated on localhost.
#[derive(Clone, Copy, Default)]
pub struct PlainConnector;

#[async_trait]
impl Connector for PlainConnector {
    async fn connect(&self, host: &str, port: u16) -> io::Result<BoxedStream> {
        let tcp = TcpStream::connect((host, port)).await?;
        tcp.set_nodelay(true)?;
        Ok(Box::new(tcp))
    }
}

/// Client for the gateway's line-oriented interface.
///
/// Every call validates the request, opens its own connection, performs one
/// exchange and closes the connection. Connections are never reused.
pub struct AgiClient {
    host: String,
    port: u16,
    connect_timeout: Duration,
    read_timeout: Duration,
    connector: Box<dyn Connector>,
}

impl AgiClient {
    pub fn new(config: &GatewayConfig, connector: Box<dyn Connector>) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            connect_timeout: config.connect_timeout(),
            read_timeout: config.read_timeout(),
            connector,
        }
    }

    /// Picks TLS or plain TCP from `config.tls`.
    pub fn from_config(config: &GatewayConfig) -> Result<Self> {
        let connector: Box<dyn Connector> = if config.tls {
            Box::new(TlsConnector::new()?)
        } else {
            Box::new(PlainConnector)
        };
        Ok(Self::new(config, connector))
    }

    async fn open(&self) -> Result<BoxedStream> {
        match tokio::time::timeout(
            self.connect_timeout,
            self.connector.connect(&self.host, self.port),
        )
        .await
        {
            Ok(stream) => Ok(stream?),
            Err(_) => Err(timed_out("connect", self.connect_timeout)),
        }
    }
}

fn timed_out(phase: &str, after: Duration) -> PaymentError {
    PaymentError::TransportError(io::Error::new(
        io::ErrorKind::TimedOut,
        format!("gateway {} timed out after {:?}", phase, after),
    ))
}

#[async_trait]
impl Gateway for AgiClient {
    #[instrument(
        skip_all,
        fields(
            host = %self.host,
            port = self.port,
            transaction_type = request.get(Field::TransactionType).unwrap_or_default()
        )
    )]
    async fn exchange(&self, request: FieldMap) -> Result<FieldMap> {
        protocol::validate_request(&request)?;

        let mut stream = self.open().await?;
        debug!("connection opened");

        let result = match tokio::time::timeout(
            self.read_timeout,
            protocol::exchange(&mut stream, &request),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(timed_out("response", self.read_timeout)),
        };

        // Closing failures do not change the outcome of the exchange. A peer
        // that never acknowledges the close gets the connect timeout.
        match tokio::time::timeout(self.connect_timeout, stream.shutdown()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "shutdown after exchange failed"),
            Err(_) => debug!(after = ?self.connect_timeout, "shutdown timed out"),
        }
        drop(stream);
        debug!(ok = result.is_ok(), "connection closed");

        result
    }
}
