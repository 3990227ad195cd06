//! Listener: accepts connections, frames one request per connection and
//! dispatches it to the [`RequestHandler`].
//!
//! Per connection:
//!
//! ```text
//! ACCEPTED -> BUFFERING -> DISPATCHED -> RESPONDED
//!                       |             -> CLOSED     (handler error, peer gone)
//!                       -> MALFORMED  -> CLOSED
//! ```
//!
//! `CLOSED` never writes a byte; the remote only observes the close.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use corelib::{Envelope, Error, Request, Result};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::codec::{self, FrameState, RequestFramer};
use crate::handler::{Reply, RequestHandler, Responder};

/// Handle to a running accept loop.
///
/// Dropping the handle stops accepting; [`Listener::close`] does the same and
/// waits for the listening socket to be released. Connections already in
/// flight are never cut by either.
#[derive(Debug)]
pub struct Listener {
    local_addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Listener {
    /// Bind `host:port` and start accepting connections.
    pub async fn bind(host: &str, port: u16, handler: Arc<dyn RequestHandler>) -> Result<Self> {
        let listener = TcpListener::bind((host, port)).await.map_err(|source| Error::Bind {
            addr: format!("{host}:{port}"),
            source,
        })?;
        let local_addr = listener.local_addr()?;
        info!(%local_addr, "listening");

        let (shutdown, stop) = oneshot::channel();
        let task = tokio::spawn(accept_loop(listener, handler, stop));

        Ok(Self {
            local_addr,
            shutdown: Some(shutdown),
            task: Some(task),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Stop accepting and wait until the listening socket is closed.
    pub async fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "accept loop ended abnormally");
            }
        }
        debug!(local_addr = %self.local_addr, "listener closed");
    }
}

impl Drop for Listener {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
    }
}

/// Pause after a failed `accept` so a persistent error (EMFILE, ENFILE)
/// does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Source of inbound connections for the accept loop.
#[async_trait]
trait Acceptor: Send + Sync + 'static {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
}

#[async_trait]
impl Acceptor for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }
}

async fn accept_loop<A: Acceptor>(
    listener: A,
    handler: Arc<dyn RequestHandler>,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        let accepted = tokio::select! {
            _ = &mut stop => break,
            accepted = listener.accept() => accepted,
        };
        match accepted {
            Ok((stream, peer)) => {
                trace!(%peer, "connection accepted");
                tokio::spawn(handle_connection(stream, peer, handler.clone()));
            }
            Err(e) => {
                warn!(error = %e, "failed to accept connection");
                tokio::select! {
                    _ = &mut stop => break,
                    _ = tokio::time::sleep(ACCEPT_ERROR_BACKOFF) => {}
                }
            }
        }
    }
}

/// Serve exactly one request on `stream`, then close it.
async fn handle_connection(mut stream: TcpStream, peer: SocketAddr, handler: Arc<dyn RequestHandler>) {
    let Some(envelope) = read_request(&mut stream, peer).await else {
        return;
    };

    let Envelope { request, sender } = envelope;
    debug!(
        %peer,
        kind = request.kind(),
        node_id = %request.node_id(),
        sender = ?sender.as_ref().map(|contact| &contact.id),
        "dispatching request"
    );

    let (responder, reply) = Responder::channel();
    let task_responder = responder.clone();
    tokio::spawn(async move {
        match request {
            Request::FindNode(node_id) => handler.find_node(node_id, sender, task_responder).await,
            Request::Ping(node_id) => handler.ping(node_id, sender, task_responder).await,
        }
    });

    let reply: Option<Reply> = tokio::select! {
        reply = reply => reply.ok(),
        _ = peer_gone(&mut stream) => {
            debug!(%peer, "peer went away before the reply");
            responder.clear();
            return;
        }
    };

    match reply {
        Some(Some(value)) => {
            if let Err(e) = write_reply(&mut stream, &value).await {
                debug!(%peer, error = %e, "failed to write reply");
                return;
            }
            trace!(%peer, "reply written");
        }
        Some(None) => debug!(%peer, "handler signalled an error, closing without reply"),
        None => debug!(%peer, "handler dropped the responder, closing without reply"),
    }
}

/// Accumulate bytes until a full frame is decoded.
///
/// Returns `None` when the connection should be dropped without a reply.
async fn read_request(stream: &mut TcpStream, peer: SocketAddr) -> Option<Envelope> {
    let mut framer = RequestFramer::new();
    loop {
        match stream.read_buf(framer.buffer_mut()).await {
            Ok(0) => {
                trace!(%peer, buffered = framer.buffered(), "peer closed before a complete frame");
                return None;
            }
            Ok(_) => {}
            Err(e) => {
                debug!(%peer, error = %e, "read failed");
                return None;
            }
        }

        match framer.decode() {
            FrameState::Buffering => continue,
            FrameState::Decoded(envelope) => return Some(envelope),
            FrameState::Malformed(e) => {
                warn!(%peer, error = %e, "malformed request, closing connection");
                return None;
            }
        }
    }
}

async fn write_reply(stream: &mut TcpStream, value: &serde_json::Value) -> Result<()> {
    let frame = codec::encode(value)?;
    stream.write_all(&frame).await?;
    stream.shutdown().await?;
    Ok(())
}

/// Resolves once the peer closes its side or the socket errors.
async fn peer_gone(stream: &mut TcpStream) {
    let mut scratch = [0u8; 512];
    loop {
        match stream.read(&mut scratch).await {
            Ok(0) | Err(_) => return,
            Ok(_) => {}
        }
    }
}
