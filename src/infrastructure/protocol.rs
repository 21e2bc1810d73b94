//! Line-oriented framing: `name=value` lines terminated by an `endofdata` line.

use crate::domain::field_map::FieldMap;
use crate::domain::fields::{END_OF_DATA, Field};
use crate::error::{PaymentError, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

const ALWAYS_REQUIRED: &[Field] = &[Field::MerchantId, Field::Password, Field::TransactionType];

const CARD_REQUIRED: &[Field] = &[
    Field::TotalAmount,
    Field::BillToFirstName,
    Field::BillToLastName,
    Field::CardType,
    Field::CardName,
    Field::CardExpMonth,
    Field::CardExpYear,
];

const EFT_REQUIRED: &[Field] = &[
    Field::TotalAmount,
    Field::BillToFirstName,
    Field::BillToLastName,
    Field::CheckTrn,
    Field::CheckAccountType,
];

const TOKEN_REQUIRED: &[Field] = &[Field::TotalAmount];

const ADMINISTRATIVE_REQUIRED: &[Field] = &[Field::OriginalTraceNumber];

/// Checks the request before any connection is made.
///
/// The shape is recognised by the credential it carries: card number, then
/// bank account number, then payment method token, otherwise administrative.
pub fn validate_request(request: &FieldMap) -> Result<()> {
    require(request, ALWAYS_REQUIRED)?;

    let shape_required = if request.contains(Field::CardNumber) {
        CARD_REQUIRED
    } else if request.contains(Field::CheckAccount) {
        EFT_REQUIRED
    } else if request.contains(Field::PaymentMethodId) {
        TOKEN_REQUIRED
    } else {
        ADMINISTRATIVE_REQUIRED
    };
    require(request, shape_required)?;

    for (name, value) in request.iter() {
        if name.is_empty() || name.contains(['=', '\r', '\n']) {
            return Err(PaymentError::ValidationError(format!(
                "invalid field name {:?}",
                name
            )));
        }
        if value.contains(['\r', '\n']) {
            return Err(PaymentError::ValidationError(format!(
                "{} contains a line break",
                name
            )));
        }
    }
    Ok(())
}

fn require(request: &FieldMap, fields: &[Field]) -> Result<()> {
    let present = |field: Field| request.get(field).is_some_and(|value| !value.is_empty());
    match fields.iter().find(|field| !present(**field)) {
        Some(missing) => Err(PaymentError::ValidationError(format!(
            "{} must be specified",
            missing
        ))),
        None => Ok(()),
    }
}

/// Serializes the whole outbound payload, sentinel line included.
pub fn encode_request(request: &FieldMap) -> String {
    let lines: Vec<String> = request
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect();
    format!("{}\n{}\n", lines.join("\n"), END_OF_DATA)
}

/// Splits one response line on its first `=`.
pub fn parse_line(line: &str) -> Result<(&str, &str)> {
    line.split_once('=')
        .ok_or_else(|| PaymentError::FramingError(format!("response line without '=': {:?}", line)))
}

/// Reads response lines until the sentinel.
///
/// A stream that ends before the sentinel is an I/O failure: the response
/// may be truncated. A line that is not UTF-8 is a framing error.
pub async fn read_response<R>(mut reader: R) -> Result<FieldMap>
where
    R: AsyncBufRead + Unpin,
{
    let mut response = FieldMap::new();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let line = std::str::from_utf8(trim_line_end(&buf))
            .map_err(|e| PaymentError::FramingError(format!("response line is not UTF-8: {}", e)))?;
        if line == END_OF_DATA {
            return Ok(response);
        }
        let (name, value) = parse_line(line)?;
        response.insert_raw(name, value);
    }
    Err(PaymentError::TransportError(std::io::Error::new(
        std::io::ErrorKind::UnexpectedEof,
        "gateway closed the connection before endofdata",
    )))
}

fn trim_line_end(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}

/// Writes the request and reads the response on an already-open stream.
pub async fn exchange<S>(mut stream: S, request: &FieldMap) -> Result<FieldMap>
where
    S: tokio::io::AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(encode_request(request).as_bytes()).await?;
    stream.flush().await?;
    read_response(tokio::io::BufReader::new(stream)).await
}
