//! Redis backing store client.

use std::io;
use std::time::Instant;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::debug;

use super::{retry, BackingStore, RetryPolicy};
use crate::error::StoreError;
use crate::resp::{decode_reply, encode_command, Reply};

/// Where the backing Redis lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisEndpoint {
    pub host: String,
    pub port: u16,
    /// Database index, selected after connecting when non-zero
    pub db: u32,
}

impl RedisEndpoint {
    pub fn new(host: impl Into<String>, port: u16, db: u32) -> Self {
        Self {
            host: host.into(),
            port,
            db,
        }
    }
}

// == Redis Client ==
/// Connects to Redis per lookup and issues a single `GET`.
///
/// Connection failures are retried according to the configured
/// [`RetryPolicy`], reconnecting on every attempt.
#[derive(Debug, Clone)]
pub struct RedisClient {
    endpoint: RedisEndpoint,
    policy: RetryPolicy,
}

impl RedisClient {
    pub fn new(endpoint: RedisEndpoint, policy: RetryPolicy) -> Self {
        Self { endpoint, policy }
    }

    /// Creates a client from the proxy configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(
            RedisEndpoint::new(config.redis_host.clone(), config.redis_port, config.redis_db),
            config.retry,
        )
    }

    // == Single Attempt ==
    async fn get_once(&self, key: &[u8]) -> Result<Option<Bytes>, StoreError> {
        let mut stream =
            TcpStream::connect((self.endpoint.host.as_str(), self.endpoint.port)).await?;
        let mut buf = BytesMut::with_capacity(4096);

        if self.endpoint.db != 0 {
            let db = self.endpoint.db.to_string();
            match request(&mut stream, &mut buf, &[b"SELECT".as_slice(), db.as_bytes()]).await? {
                Reply::Simple(_) => {}
                Reply::Error(msg) => return Err(StoreError::Server(msg)),
                other => {
                    return Err(StoreError::Protocol(format!(
                        "unexpected reply to SELECT: {:?}",
                        other
                    )))
                }
            }
        }

        match request(&mut stream, &mut buf, &[b"GET".as_slice(), key]).await? {
            Reply::Bulk(value) => Ok(value),
            Reply::Error(msg) => Err(StoreError::Server(msg)),
            other => Err(StoreError::Protocol(format!(
                "unexpected reply to GET: {:?}",
                other
            ))),
        }
    }
}

#[async_trait]
impl BackingStore for RedisClient {
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>, StoreError> {
        let begin = Instant::now();
        let result = retry(&self.policy, || self.get_once(key)).await;
        debug!(
            "Redis GET {:?} took {:?}",
            String::from_utf8_lossy(key),
            begin.elapsed()
        );
        result
    }
}

/// Writes one command and reads exactly one reply.
async fn request(
    stream: &mut TcpStream,
    buf: &mut BytesMut,
    parts: &[&[u8]],
) -> Result<Reply, StoreError> {
    stream.write_all(&encode_command(parts)).await?;
    loop {
        if let Some(reply) =
            decode_reply(buf).map_err(|err| StoreError::Protocol(err.to_string()))?
        {
            return Ok(reply);
        }
        if stream.read_buf(buf).await? == 0 {
            return Err(StoreError::Connection(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "backing store closed the connection",
            )));
        }
    }
}
