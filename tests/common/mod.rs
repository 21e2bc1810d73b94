#![allow(dead_code)]

use forte_agi::config::{GatewayConfig, Settings};
use std::io::{BufRead, BufReader, Write};
use std::net::{Shutdown, TcpListener};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

pub type Fields = Vec<(String, String)>;

/// What the fake gateway does with one request.
pub enum Reply {
    /// Written verbatim, then the connection is closed.
    Raw(String),
    /// Keeps the connection open without answering.
    Stall(Duration),
}

/// Line-protocol gateway on 127.0.0.1, one connection at a time.
pub struct FakeGateway {
    pub port: u16,
    connections: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Fields>>>,
}

impl FakeGateway {
    pub fn start<F>(reply: F) -> Self
    where
        F: Fn(&Fields) -> Reply + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let connections = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));

        let seen = connections.clone();
        let log = requests.clone();
        thread::spawn(move || {
            for stream in listener.incoming() {
                let Ok(mut stream) = stream else { continue };
                seen.fetch_add(1, Ordering::SeqCst);

                let mut fields = Fields::new();
                let reader = BufReader::new(stream.try_clone().unwrap());
                for line in reader.lines() {
                    let Ok(line) = line else { break };
                    if line == "endofdata" {
                        break;
                    }
                    if let Some((name, value)) = line.split_once('=') {
                        fields.push((name.to_string(), value.to_string()));
                    }
                }

                let reply = reply(&fields);
                log.lock().unwrap().push(fields);
                match reply {
                    Reply::Raw(payload) => {
                        let _ = stream.write_all(payload.as_bytes());
                    }
                    Reply::Stall(duration) => thread::sleep(duration),
                }
                let _ = stream.shutdown(Shutdown::Both);
            }
        });

        Self {
            port,
            connections,
            requests,
        }
    }

    /// Approves every request, echoing its transaction type.
    pub fn approving() -> Self {
        Self::start(|fields| Reply::Raw(approval(fields)))
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<Fields> {
        self.requests.lock().unwrap().clone()
    }

    pub fn config(&self) -> GatewayConfig {
        gateway_config(self.port, 5)
    }
}

pub fn field<'a>(fields: &'a Fields, name: &str) -> Option<&'a str> {
    fields
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, v)| v.as_str())
}

pub fn approval(fields: &Fields) -> String {
    let transaction_type = field(fields, "pg_transaction_type").unwrap_or_default();
    format!(
        "pg_response_type=A\n\
         pg_response_code=A01\n\
         pg_response_description=APPROVED\n\
         pg_trace_number=TRACE-{}\n\
         pg_authorization_code=AUTH01\n\
         pg_transaction_type={}\n\
         endofdata\n",
        transaction_type, transaction_type
    )
}

pub fn decline(_fields: &Fields) -> String {
    "pg_response_type=D\npg_response_code=U02\npg_response_description=DECLINED\nendofdata\n"
        .to_string()
}

pub fn gateway_toml(port: u16, read_timeout_secs: u64) -> String {
    format!(
        "[gateway]\n\
         merchant_id = \"123456\"\n\
         password = \"secret\"\n\
         host = \"127.0.0.1\"\n\
         port = {}\n\
         tls = false\n\
         connect_timeout_secs = 2\n\
         read_timeout_secs = {}\n",
        port, read_timeout_secs
    )
}

pub fn gateway_config(port: u16, read_timeout_secs: u64) -> GatewayConfig {
    Settings::from_toml(&gateway_toml(port, read_timeout_secs))
        .unwrap()
        .gateway
}

pub fn write_config(dir: &Path, port: u16) -> std::path::PathBuf {
    let path = dir.join("gateway.toml");
    std::fs::write(&path, gateway_toml(port, 5)).unwrap();
    path
}
