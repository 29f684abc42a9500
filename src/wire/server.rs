//! RESP listener answering `GET key` straight from the backing store.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::backend::BackingStore;
use crate::resp::{encode_bulk, encode_error, match_get, CommandDecoder, Frame};

/// Reply sent when the backing store cannot be reached.
const UNAVAILABLE_REPLY: &str = "ERR backing store not available";

// == Wire Server ==
/// Accepts RESP connections and serves each on its own task.
///
/// No cache and no admission control: every recognized `GET` goes to the
/// backing store.
pub struct WireServer {
    listener: TcpListener,
    store: Arc<dyn BackingStore>,
}

impl WireServer {
    /// Binds the listener.
    pub async fn bind(addr: impl ToSocketAddrs, store: Arc<dyn BackingStore>) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener, store })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections forever.
    pub async fn run(self) {
        loop {
            match self.listener.accept().await {
                Ok((socket, peer)) => {
                    info!("Wire client connected: {}", peer);
                    let store = self.store.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(socket, store).await {
                            warn!("Wire client {} failed: {}", peer, err);
                        }
                        info!("Wire client disconnected: {}", peer);
                    });
                }
                Err(err) => {
                    warn!("Failed to accept wire connection: {}", err);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }
}

/// Spawns the accept loop, returning a handle that can abort it on shutdown.
pub fn spawn_wire_server(server: WireServer) -> JoinHandle<()> {
    if let Ok(addr) = server.local_addr() {
        info!("Wire protocol listening on {}", addr);
    }
    tokio::spawn(server.run())
}

/// Serves one connection until the peer closes it.
///
/// Frames may arrive split across reads or several per read; each complete
/// frame gets exactly one reply, in order. An oversized command is dropped
/// as it streams in and answered once. The socket is closed when this
/// returns, whether normally or with an error.
async fn handle_connection(mut socket: TcpStream, store: Arc<dyn BackingStore>) -> io::Result<()> {
    let mut buf = BytesMut::with_capacity(1024);
    let mut decoder = CommandDecoder::new();

    loop {
        if socket.read_buf(&mut buf).await? == 0 {
            return Ok(());
        }

        loop {
            let reply = match decoder.decode(&mut buf) {
                Ok(None) => break,
                Ok(Some(Frame::Command(parts))) => respond(&parts, store.as_ref()).await,
                Ok(Some(Frame::Skipped)) => {
                    debug!("Skipped oversized command");
                    encode_bulk(None)
                }
                Err(err) => {
                    debug!("Discarding undecodable input: {}", err);
                    buf.clear();
                    encode_bulk(None)
                }
            };
            socket.write_all(&reply).await?;
        }
    }
}

async fn respond(parts: &[Bytes], store: &dyn BackingStore) -> Bytes {
    let Some(key) = match_get(parts) else {
        return encode_bulk(None);
    };

    match store.get(key).await {
        Ok(value) => encode_bulk(value.as_deref()),
        Err(err) => {
            warn!("Wire GET {:?} failed: {}", String::from_utf8_lossy(key), err);
            encode_error(UNAVAILABLE_REPLY)
        }
    }
}
