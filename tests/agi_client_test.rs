mod common;

use async_trait::async_trait;
use common::{FakeGateway, Reply};
use forte_agi::domain::field_map::FieldMap;
use forte_agi::domain::fields::Field;
use forte_agi::domain::ports::Gateway;
use forte_agi::error::PaymentError;
use forte_agi::infrastructure::agi_client::{AgiClient, BoxedStream, Connector, PlainConnector};
use std::io;
use std::pin::Pin;
use std::sync::Mutex;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, ReadBuf};

/// Answers normally but never completes a close.
struct NeverClosingStream(DuplexStream);

impl AsyncRead for NeverClosingStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_read(cx, buf)
    }
}

impl AsyncWrite for NeverClosingStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.0).poll_write(cx, buf)
    }

    fn poll_flush(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.0).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Pending
    }
}

struct OneShotConnector(Mutex<Option<DuplexStream>>);

#[async_trait]
impl Connector for OneShotConnector {
    async fn connect(&self, _host: &str, _port: u16) -> io::Result<BoxedStream> {
        let stream = self
            .0
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| io::Error::new(io::ErrorKind::ConnectionRefused, "already used"))?;
        Ok(Box::new(NeverClosingStream(stream)))
    }
}

fn client(gateway: &FakeGateway) -> AgiClient {
    AgiClient::new(&gateway.config(), Box::new(PlainConnector))
}

fn card_sale() -> FieldMap {
    let mut request = FieldMap::new();
    for (field, value) in [
        (Field::MerchantId, "123456"),
        (Field::Password, "secret"),
        (Field::TransactionType, "10"),
        (Field::TotalAmount, "10.00"),
        (Field::BillToFirstName, "John"),
        (Field::BillToLastName, "Smith"),
        (Field::CardType, "VISA"),
        (Field::CardName, "John Smith"),
        (Field::CardNumber, "4111111111111111"),
        (Field::CardExpMonth, "08"),
        (Field::CardExpYear, "2030"),
    ] {
        request.insert(field, value);
    }
    request
}

#[tokio::test]
async fn test_exchange_against_local_gateway() {
    let gateway = FakeGateway::approving();
    let response = client(&gateway).exchange(card_sale()).await.unwrap();

    assert_eq!(response.get(Field::ResponseType), Some("A"));
    assert_eq!(response.get(Field::TraceNumber), Some("TRACE-10"));

    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        common::field(&requests[0], "ecom_payment_card_number"),
        Some("4111111111111111")
    );
    assert_eq!(requests[0].len(), card_sale().len());
}

#[tokio::test]
async fn test_each_exchange_opens_its_own_connection() {
    let gateway = FakeGateway::approving();
    let client = client(&gateway);

    for _ in 0..3 {
        client.exchange(card_sale()).await.unwrap();
    }
    assert_eq!(gateway.connections(), 3);
}

#[tokio::test]
async fn test_invalid_request_never_connects() {
    let gateway = FakeGateway::approving();
    let request: FieldMap = card_sale()
        .iter()
        .filter(|(name, _)| *name != "ecom_payment_card_expdate_year")
        .collect();

    let result = client(&gateway).exchange(request).await;
    assert!(matches!(result, Err(PaymentError::ValidationError(_))));
    assert_eq!(gateway.connections(), 0);
}

#[tokio::test]
async fn test_missing_sentinel_is_transport_error() {
    let gateway = FakeGateway::start(|_| Reply::Raw("pg_response_type=A\npg_trace_number=T\n".into()));

    match client(&gateway).exchange(card_sale()).await {
        Err(PaymentError::TransportError(e)) => {
            assert_eq!(e.kind(), std::io::ErrorKind::UnexpectedEof)
        }
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_response_is_framing_error() {
    let gateway = FakeGateway::start(|_| Reply::Raw("pg_response_type=A\nHTTP/1.1 400\nendofdata\n".into()));

    let result = client(&gateway).exchange(card_sale()).await;
    assert!(matches!(result, Err(PaymentError::FramingError(_))));
}

#[tokio::test]
async fn test_silent_gateway_times_out() {
    let gateway = FakeGateway::start(|_| Reply::Stall(Duration::from_secs(3)));
    let config = common::gateway_config(gateway.port, 1);
    let client = AgiClient::new(&config, Box::new(PlainConnector));

    match client.exchange(card_sale()).await {
        Err(PaymentError::TransportError(e)) => assert_eq!(e.kind(), std::io::ErrorKind::TimedOut),
        other => panic!("expected timeout, got {:?}", other),
    }
}

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = common::gateway_config(port, 1);
    let client = AgiClient::new(&config, Box::new(PlainConnector));

    let result = client.exchange(card_sale()).await;
    assert!(matches!(result, Err(PaymentError::TransportError(_))));
}

#[tokio::test]
async fn test_concurrent_exchanges_do_not_share_sockets() {
    let gateway = FakeGateway::approving();
    let client = std::sync::Arc::new(client(&gateway));

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let client = client.clone();
            tokio::spawn(async move { client.exchange(card_sale()).await })
        })
        .collect();
    for handle in handles {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response.get(Field::ResponseType), Some("A"));
    }
    assert_eq!(gateway.connections(), 4);
}

#[tokio::test]
async fn test_stuck_close_does_not_hang_the_exchange() {
    let (client_half, server_half) = tokio::io::duplex(4096);
    let server = tokio::spawn(async move {
        let mut reader = BufReader::new(server_half);
        let mut line = String::new();
        loop {
            line.clear();
            reader.read_line(&mut line).await.unwrap();
            if line.trim_end() == "endofdata" || line.is_empty() {
                break;
            }
        }
        reader
            .get_mut()
            .write_all(b"pg_response_type=A\nendofdata\n")
            .await
            .unwrap();
        // Keep the peer alive while the client tries to close.
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let config = common::gateway_config(1, 5);
    let client = AgiClient::new(
        &config,
        Box::new(OneShotConnector(Mutex::new(Some(client_half)))),
    );

    let response = tokio::time::timeout(Duration::from_secs(10), client.exchange(card_sale()))
        .await
        .expect("exchange must not wait on the close forever")
        .unwrap();
    assert_eq!(response.get(Field::ResponseType), Some("A"));
    server.abort();
}
