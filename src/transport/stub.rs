//! Component L: the one concrete [`Transport`]/[`Session`] pair, plus an
//! in-process server used by the integration tests.
//!
//! The wire format is intentionally simple: a 4-byte big-endian length
//! prefix followed by a JSON body, framed the same way the teacher reads a
//! fixed header then a variable payload. Real deployments would replace
//! this module with a wire-protocol-accurate implementation; nothing above
//! the [`Transport`]/[`Session`] seam depends on the JSON framing.

// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2012-2025 Andrei Maltsev

use std::{
    collections::BTreeMap,
    io::{Read, Write},
    net::{TcpListener, TcpStream},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, Ordering},
    },
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{Context, Result, anyhow, bail};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    cfg::enums::ConnectionType,
    model::server::ServerDef,
    transport::{IsMasterReply, Session, Transport},
};

#[derive(Debug, Serialize, Deserialize)]
enum WireRequest {
    GetNonce,
    Authenticate { user: String, digest: String },
    IsMaster,
    Ping,
}

#[derive(Debug, Serialize, Deserialize)]
enum WireResponse {
    Nonce(String),
    AuthResult(bool),
    IsMaster(IsMasterWire),
    Pong,
    Error(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct IsMasterWire {
    connection_type: ConnectionType,
    repl_set_name: Option<String>,
    hosts: Vec<String>,
    tags: BTreeMap<String, String>,
    max_bson_object_size: u32,
}

impl From<IsMasterReply> for IsMasterWire {
    fn from(r: IsMasterReply) -> Self {
        Self {
            connection_type: r.connection_type,
            repl_set_name: r.repl_set_name,
            hosts: r.hosts,
            tags: r.tags,
            max_bson_object_size: r.max_bson_object_size,
        }
    }
}

impl From<IsMasterWire> for IsMasterReply {
    fn from(w: IsMasterWire) -> Self {
        Self {
            connection_type: w.connection_type,
            repl_set_name: w.repl_set_name,
            hosts: w.hosts,
            tags: w.tags,
            max_bson_object_size: w.max_bson_object_size,
        }
    }
}

fn write_frame(stream: &mut TcpStream, body: &[u8]) -> Result<()> {
    let len = u32::try_from(body.len()).context("frame body too large")?;
    stream.write_all(&len.to_be_bytes())?;
    stream.write_all(body)?;
    Ok(())
}

fn read_frame(stream: &mut TcpStream) -> Result<Vec<u8>> {
    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let len = u32::from_be_bytes(len_buf) as usize;
    let mut body = vec![0u8; len];
    stream.read_exact(&mut body)?;
    Ok(body)
}

fn send_request(stream: &mut TcpStream, req: &WireRequest) -> Result<WireResponse> {
    let body = serde_json::to_vec(req).context("encoding request")?;
    write_frame(stream, &body)?;
    let reply = read_frame(stream)?;
    serde_json::from_slice(&reply).context("decoding response")
}

/// Blocking TCP transport speaking the length-prefixed JSON protocol.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubTransport;

impl Transport for StubTransport {
    fn connect(&self, def: &ServerDef, timeout: Duration) -> Result<Box<dyn Session>> {
        let addr = def.host_port();
        let stream = TcpStream::connect(&addr)
            .with_context(|| format!("connecting to {addr}"))?;
        stream.set_nodelay(true)?;
        stream.set_read_timeout(Some(timeout))?;
        stream.set_write_timeout(Some(timeout))?;
        Ok(Box::new(StubSession { stream }))
    }
}

pub struct StubSession {
    stream: TcpStream,
}

impl Session for StubSession {
    fn getnonce(&mut self) -> Result<String> {
        match send_request(&mut self.stream, &WireRequest::GetNonce)? {
            WireResponse::Nonce(n) => Ok(n),
            WireResponse::Error(e) => bail!("getnonce failed: {e}"),
            other => bail!("unexpected reply to getnonce: {other:?}"),
        }
    }

    fn authenticate(&mut self, user: &str, digest: &str) -> Result<()> {
        let req = WireRequest::Authenticate {
            user: user.to_string(),
            digest: digest.to_string(),
        };
        match send_request(&mut self.stream, &req)? {
            WireResponse::AuthResult(true) => Ok(()),
            WireResponse::AuthResult(false) => bail!("authentication rejected"),
            WireResponse::Error(e) => bail!("authenticate failed: {e}"),
            other => bail!("unexpected reply to authenticate: {other:?}"),
        }
    }

    fn ismaster(&mut self) -> Result<IsMasterReply> {
        match send_request(&mut self.stream, &WireRequest::IsMaster)? {
            WireResponse::IsMaster(w) => Ok(w.into()),
            WireResponse::Error(e) => bail!("ismaster failed: {e}"),
            other => bail!("unexpected reply to ismaster: {other:?}"),
        }
    }

    fn ping(&mut self) -> Result<Duration> {
        let start = Instant::now();
        match send_request(&mut self.stream, &WireRequest::Ping)? {
            WireResponse::Pong => Ok(start.elapsed()),
            WireResponse::Error(e) => bail!("ping failed: {e}"),
            other => bail!("unexpected reply to ping: {other:?}"),
        }
    }

    fn destroy(self: Box<Self>) {
        let _ = self.stream.shutdown(std::net::Shutdown::Both);
    }
}

/// Scripted behavior for a [`StubServer`], consulted on every `ismaster`
/// call so tests can simulate topology changes across probes.
#[derive(Debug, Clone, Default)]
pub struct IsMasterScript {
    pub replies: Vec<IsMasterReply>,
}

impl IsMasterScript {
    pub fn fixed(reply: IsMasterReply) -> Self {
        Self { replies: vec![reply] }
    }

    fn reply_for(&self, call_index: usize) -> IsMasterReply {
        let idx = call_index.min(self.replies.len().saturating_sub(1));
        self.replies
            .get(idx)
            .cloned()
            .unwrap_or_default()
    }
}

/// Minimal in-process server for integration tests: binds an ephemeral
/// port, accepts connections on a background thread, and answers requests
/// according to an [`IsMasterScript`].
pub struct StubServer {
    pub addr: String,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl StubServer {
    pub fn spawn(script: IsMasterScript) -> Result<Self> {
        Self::spawn_with(|_addr| script)
    }

    /// Like [`StubServer::spawn`], but the script is built from the
    /// server's own `host:port` once the ephemeral port is known — needed
    /// for scenarios where a server's `ismaster` reply must report itself
    /// as a member of the host list.
    pub fn spawn_with(build_script: impl FnOnce(&str) -> IsMasterScript) -> Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .context("binding stub server listener")?;
        let addr = listener.local_addr()?.to_string();
        let script = build_script(&addr);
        listener.set_nonblocking(true)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_thread = Arc::clone(&shutdown);
        let call_count = Arc::new(Mutex::new(0usize));

        let handle = thread::spawn(move || {
            while !shutdown_thread.load(Ordering::Relaxed) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        stream
                            .set_nonblocking(false)
                            .expect("stub server: set_nonblocking");
                        let script = script.clone();
                        let call_count = Arc::clone(&call_count);
                        thread::spawn(move || {
                            if let Err(e) = serve_one(stream, &script, &call_count) {
                                debug!("stub server connection ended: {e}");
                            }
                        });
                    },
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(Duration::from_millis(5));
                    },
                    Err(e) => {
                        warn!("stub server accept failed: {e}");
                        break;
                    },
                }
            }
        });

        Ok(Self { addr, shutdown, handle: Some(handle) })
    }

    pub fn host_port(&self) -> (String, u16) {
        let (host, port) = self.addr.rsplit_once(':').expect("addr has a port");
        (host.to_string(), port.parse().expect("addr port is numeric"))
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn serve_one(
    mut stream: TcpStream,
    script: &IsMasterScript,
    call_count: &Mutex<usize>,
) -> Result<()> {
    loop {
        let body = match read_frame(&mut stream) {
            Ok(b) => b,
            Err(_) => return Ok(()),
        };
        let req: WireRequest = serde_json::from_slice(&body)
            .map_err(|e| anyhow!("stub server: bad request: {e}"))?;

        let resp = match req {
            WireRequest::GetNonce => WireResponse::Nonce("deadbeef".to_string()),
            WireRequest::Authenticate { .. } => WireResponse::AuthResult(true),
            WireRequest::IsMaster => {
                let mut guard = call_count.lock().expect("stub server mutex poisoned");
                let idx = *guard;
                *guard += 1;
                WireResponse::IsMaster(script.reply_for(idx).into())
            },
            WireRequest::Ping => WireResponse::Pong,
        };

        let out = serde_json::to_vec(&resp)
            .map_err(|e| anyhow!("stub server: encoding reply: {e}"))?;
        write_frame(&mut stream, &out)?;
    }
}
