//! Mock of Discord's gateway
//!
//! Every accepted socket gets HELLO right away and its heartbeats are
//! acknowledged automatically. Tests drive the rest through
//! [`MockConnection`].

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use cord_gateway::protocol::{GatewayMessage, OpCode};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode as WsCloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use crate::TEST_TIMEOUT;

/// Something the client sent
#[derive(Debug, Clone)]
pub enum Inbound {
    Frame(GatewayMessage),
    /// The client closed the socket, with its close code if it sent one
    Closed(Option<u16>),
}

/// Running mock gateway
pub struct MockGateway {
    pub addr: SocketAddr,
    connections: mpsc::UnboundedReceiver<MockConnection>,
    _handle: JoinHandle<()>,
}

impl MockGateway {
    /// Start with the given heartbeat interval
    pub async fn start(heartbeat_interval_ms: u64) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let (tx, connections) = mpsc::unbounded_channel();

        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                match accept(stream, heartbeat_interval_ms).await {
                    Ok(connection) => {
                        if tx.send(connection).is_err() {
                            break;
                        }
                    }
                    Err(e) => eprintln!("mock gateway handshake failed: {e}"),
                }
            }
        });

        Ok(Self {
            addr,
            connections,
            _handle: handle,
        })
    }

    /// Value for `gateway_url` and `resume_gateway_url`
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Wait for the client to connect
    pub async fn accept(&mut self) -> Result<MockConnection> {
        tokio::time::timeout(TEST_TIMEOUT, self.connections.recv())
            .await
            .map_err(|_| anyhow!("client did not connect"))?
            .ok_or_else(|| anyhow!("mock gateway stopped"))
    }
}

/// One client connection
pub struct MockConnection {
    outgoing: mpsc::UnboundedSender<Message>,
    inbound: mpsc::UnboundedReceiver<Inbound>,
    sequence: AtomicU64,
    heartbeats: Arc<AtomicUsize>,
}

impl MockConnection {
    pub fn send(&self, message: &GatewayMessage) -> Result<()> {
        self.outgoing
            .send(Message::Text(message.to_json()?))
            .map_err(|_| anyhow!("connection closed"))
    }

    /// Send a dispatch with the next sequence number
    pub fn dispatch(&self, event_type: &str, data: Value) -> Result<u64> {
        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        self.send(&GatewayMessage::dispatch(event_type, sequence, data))?;
        Ok(sequence)
    }

    /// Continue numbering after a resumed session
    pub fn set_sequence(&self, sequence: u64) {
        self.sequence.store(sequence, Ordering::Release);
    }

    pub fn close(&self, code: u16, reason: &str) -> Result<()> {
        let frame = CloseFrame {
            code: WsCloseCode::from(code),
            reason: reason.to_string().into(),
        };
        self.outgoing
            .send(Message::Close(Some(frame)))
            .map_err(|_| anyhow!("connection closed"))
    }

    /// Heartbeats received so far
    pub fn heartbeats(&self) -> usize {
        self.heartbeats.load(Ordering::Acquire)
    }

    pub async fn next(&mut self) -> Result<Inbound> {
        tokio::time::timeout(TEST_TIMEOUT, self.inbound.recv())
            .await
            .map_err(|_| anyhow!("nothing received from the client"))?
            .ok_or_else(|| anyhow!("connection task ended"))
    }

    /// Skip frames until one with `op` arrives
    pub async fn expect_op(&mut self, op: OpCode) -> Result<GatewayMessage> {
        loop {
            match self.next().await? {
                Inbound::Frame(message) if message.op == op => return Ok(message),
                Inbound::Frame(_) => {}
                Inbound::Closed(code) => bail!("client closed with {code:?} while waiting for {op:?}"),
            }
        }
    }

    /// Skip frames until the client closes; returns its close code
    pub async fn expect_close(&mut self) -> Result<Option<u16>> {
        loop {
            if let Inbound::Closed(code) = self.next().await? {
                return Ok(code);
            }
        }
    }
}

async fn accept(stream: TcpStream, heartbeat_interval_ms: u64) -> Result<MockConnection> {
    let socket = tokio_tungstenite::accept_async(stream).await?;
    let (mut sink, mut stream) = socket.split();
    let (outgoing, mut outgoing_rx) = mpsc::unbounded_channel::<Message>();
    let (inbound_tx, inbound) = mpsc::unbounded_channel();
    let heartbeats = Arc::new(AtomicUsize::new(0));

    tokio::spawn(async move {
        while let Some(message) = outgoing_rx.recv().await {
            let closing = matches!(message, Message::Close(_));
            if sink.send(message).await.is_err() || closing {
                break;
            }
        }
    });

    let ack = outgoing.clone();
    let beats = Arc::clone(&heartbeats);
    tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    let Ok(message) = GatewayMessage::from_json(&text) else {
                        continue;
                    };
                    if message.op == OpCode::Heartbeat {
                        beats.fetch_add(1, Ordering::AcqRel);
                        if let Ok(json) = GatewayMessage::heartbeat_ack().to_json() {
                            let _ = ack.send(Message::Text(json));
                        }
                    }
                    let _ = inbound_tx.send(Inbound::Frame(message));
                }
                Ok(Message::Close(frame)) => {
                    let _ = inbound_tx.send(Inbound::Closed(frame.map(|f| u16::from(f.code))));
                    return;
                }
                Ok(_) => {}
                Err(_) => break,
            }
        }
        let _ = inbound_tx.send(Inbound::Closed(None));
    });

    let connection = MockConnection {
        outgoing,
        inbound,
        sequence: AtomicU64::new(0),
        heartbeats,
    };
    connection.send(&GatewayMessage::hello(heartbeat_interval_ms))?;
    Ok(connection)
}

/// Time for the client to notice something, for negative checks
pub const SETTLE: Duration = Duration::from_millis(300);
