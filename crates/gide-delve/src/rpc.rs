use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

use crate::{Error, Result};

/// Longest response accepted from the server.
const MAX_MESSAGE: usize = 64 * 1024 * 1024;

type Pending = Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>;

#[derive(Serialize)]
struct Request<'a, P> {
    method: &'a str,
    params: [P; 1],
    id: u64,
}

#[derive(Deserialize)]
struct Response {
    id: u64,

    #[serde(default)]
    result: Value,

    #[serde(default)]
    error: Value,
}

/// Client of the JSON-RPC service of a Delve server.
///
/// Requests may be issued concurrently: responses are matched to their
/// request by ID. When the connection closes, every outstanding request
/// fails with [ConnectionLost](Error::ConnectionLost).
pub(crate) struct RpcClient {
    writer: tokio::sync::Mutex<FramedWrite<OwnedWriteHalf, LinesCodec>>,
    pending: Pending,
    closed: Arc<AtomicBool>,
    next_id: AtomicU64,
    reader: JoinHandle<()>,
}

impl RpcClient {
    /// Connects to the Delve server listening at `addr`.
    #[tracing::instrument(name = "Connect", skip_all, fields(%addr))]
    pub(crate) async fn connect(addr: &str) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| Error::Connect(addr.to_owned(), e))?;

        tracing::debug!("connected");

        Ok(Self::new(stream))
    }

    fn new(stream: TcpStream) -> Self {
        let (read, write) = stream.into_split();

        let pending = Pending::default();
        let closed = Arc::new(AtomicBool::new(false));

        let reader = tokio::spawn(read_responses(
            FramedRead::new(read, LinesCodec::new_with_max_length(MAX_MESSAGE)),
            Arc::clone(&pending),
            Arc::clone(&closed),
        ));

        Self {
            writer: tokio::sync::Mutex::new(FramedWrite::new(write, LinesCodec::new())),
            pending,
            closed,
            next_id: AtomicU64::new(0),
            reader,
        }
    }

    /// Calls the given `RPCServer` method and waits for its result.
    pub(crate) async fn call<P, R>(&self, method: &str, params: P) -> Result<R>
    where
        P: Serialize,
        R: DeserializeOwned,
    {
        let reply = self.send(method, params).await?;

        let value = reply.await.map_err(|_| Error::ConnectionLost)??;

        Ok(serde_json::from_value(value)?)
    }

    /// Calls the given `RPCServer` method without waiting for its result.
    pub(crate) async fn notify<P: Serialize>(&self, method: &str, params: P) -> Result<()> {
        self.send(method, params).await.map(drop)
    }

    async fn send<P: Serialize>(
        &self,
        method: &str,
        params: P,
    ) -> Result<oneshot::Receiver<Result<Value>>> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);

        let line = serde_json::to_string(&Request {
            method: &format!("RPCServer.{method}"),
            params: [params],
            id,
        })?;

        let (tx, rx) = oneshot::channel();
        lock(&self.pending).insert(id, tx);

        // the reader may have exited before the reply slot was registered
        if self.closed.load(Ordering::SeqCst) {
            lock(&self.pending).remove(&id);
            return Err(Error::ConnectionLost);
        }

        tracing::trace!(id, method, "request");

        if let Err(e) = self.writer.lock().await.send(line).await {
            lock(&self.pending).remove(&id);
            return Err(e.into());
        }

        Ok(rx)
    }
}

impl Drop for RpcClient {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn read_responses(
    mut lines: FramedRead<OwnedReadHalf, LinesCodec>,
    pending: Pending,
    closed: Arc<AtomicBool>,
) {
    while let Some(line) = lines.next().await {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read from debugger");
                break;
            }
        };

        let resp: Response = match serde_json::from_str(&line) {
            Ok(resp) => resp,
            Err(e) => {
                tracing::warn!(error = %e, "malformed response");
                continue;
            }
        };

        let Some(reply) = lock(&pending).remove(&resp.id) else {
            tracing::debug!(id = resp.id, "response to unknown request");
            continue;
        };

        let res = match resp.error {
            Value::Null => Ok(resp.result),
            Value::String(msg) => Err(Error::Rpc(msg)),
            other => Err(Error::Rpc(other.to_string())),
        };

        tracing::trace!(id = resp.id, ok = res.is_ok(), "response");

        // the caller may have given up on this request
        let _ = reply.send(res);
    }

    tracing::debug!("debugger connection closed");

    closed.store(true, Ordering::SeqCst);
    lock(&pending).clear();
}
