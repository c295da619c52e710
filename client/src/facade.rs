use anyhow::{anyhow, Result};
use common::ops::{Frame, Outcome, Request};
use common::push::PushMessage;
use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{Framed, LinesCodec};

type PendingReplies = Arc<Mutex<HashMap<u64, oneshot::Sender<Outcome>>>>;

/// Handle to the remote game engine: request/response calls addressed
/// by dotted operation name, plus the persistent push subscription
/// surfaced as the receiver returned alongside this handle.
///
/// Call futures settle when the matching reply frame arrives; pushes
/// never interleave with reply delivery because a single dispatch task
/// owns the incoming frame stream.
pub struct RemoteServer {
    outgoing: mpsc::UnboundedSender<Request>,
    pending: PendingReplies,
    next_id: AtomicU64,
}

impl std::fmt::Debug for RemoteServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteServer")
            .field("pending", &self.pending.lock().unwrap().len())
            .finish()
    }
}

/// The scriptable end of an in-memory connection: outgoing requests
/// arrive on `requests`, and anything written to `frames` is dispatched
/// exactly as if it came off the network.
pub struct TestWire {
    pub requests: mpsc::UnboundedReceiver<Request>,
    pub frames: mpsc::UnboundedSender<Frame>,
}

impl RemoteServer {
    /// Connect over TCP, newline-delimited JSON frames.
    pub async fn connect(addr: &str) -> Result<(Self, mpsc::UnboundedReceiver<PushMessage>)> {
        let stream = TcpStream::connect(addr).await?;
        let (mut sink, mut source) = Framed::new(stream, LinesCodec::new()).split();
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<Request>();
        tokio::spawn(async move {
            while let Some(request) = out_rx.recv().await {
                let line = match serde_json::to_string(&request) {
                    Ok(line) => line,
                    Err(err) => {
                        warn!("unserializable request {}: {}", request.op, err);
                        continue;
                    }
                };
                if sink.send(line).await.is_err() {
                    warn!("connection closed on send");
                    break;
                }
            }
        });
        tokio::spawn(async move {
            while let Some(line) = source.next().await {
                let line = match line {
                    Ok(line) => line,
                    Err(err) => {
                        warn!("connection broke on read: {}", err);
                        break;
                    }
                };
                match serde_json::from_str::<Frame>(&line) {
                    Ok(frame) => {
                        if frame_tx.send(frame).is_err() {
                            break;
                        }
                    }
                    Err(err) => warn!("discarding unparseable frame: {}", err),
                }
            }
        });
        let (server, push_rx) = Self::start(out_tx, frame_rx);
        Ok((server, push_rx))
    }

    /// In-memory connection for tests: no socket, the returned
    /// [`TestWire`] plays the server.
    pub fn test_pair() -> (Self, mpsc::UnboundedReceiver<PushMessage>, TestWire) {
        let (frame_tx, frame_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (server, push_rx) = Self::start(out_tx, frame_rx);
        (
            server,
            push_rx,
            TestWire {
                requests: out_rx,
                frames: frame_tx,
            },
        )
    }

    fn start(
        outgoing: mpsc::UnboundedSender<Request>,
        mut frames: mpsc::UnboundedReceiver<Frame>,
    ) -> (Self, mpsc::UnboundedReceiver<PushMessage>) {
        let pending: PendingReplies = Arc::new(Mutex::new(HashMap::new()));
        let (push_tx, push_rx) = mpsc::unbounded_channel();
        let dispatch_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            while let Some(frame) = frames.recv().await {
                match frame {
                    Frame::Reply(reply) => {
                        let waiter = dispatch_pending.lock().unwrap().remove(&reply.id);
                        match waiter {
                            Some(waiter) => {
                                let _ = waiter.send(reply.outcome);
                            }
                            None => debug!("reply {} has no waiter, dropping", reply.id),
                        }
                    }
                    Frame::Push(message) => {
                        if push_tx.send(message).is_err() {
                            break;
                        }
                    }
                }
            }
            //Fail out anyone still waiting when the connection dies
            dispatch_pending.lock().unwrap().clear();
        });
        (
            RemoteServer {
                outgoing,
                pending,
                next_id: AtomicU64::new(1),
            },
            push_rx,
        )
    }

    /// One mutation round-trip. Remote rejections come back as `Err`;
    /// they are not retried here and do not disturb the subscription.
    pub async fn call(&self, op: &str, token: Option<String>, args: Value) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(id, tx);
        let request = Request {
            id,
            op: op.to_string(),
            token,
            args,
        };
        if self.outgoing.send(request).is_err() {
            self.pending.lock().unwrap().remove(&id);
            return Err(anyhow!("connection closed"));
        }
        match rx.await {
            Ok(Outcome::Ok(value)) => Ok(value),
            Ok(Outcome::Err(message)) => Err(anyhow!("{} failed: {}", op, message)),
            Err(_) => Err(anyhow!("connection closed awaiting reply to {}", op)),
        }
    }
}
