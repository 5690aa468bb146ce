//! The channel adapter: a stateful wrapper around the push transport.
//!
//! The transport ([`PushTransport`]) only moves bytes; this adapter owns
//! everything stateful about the realtime channel:
//!
//! - decoding frames into typed [`ServerEvent`]s and fanning them out to
//!   subscribers,
//! - the [`ConnectionStatus`] state machine,
//! - the bounded reconnect loop with exponential backoff and jitter.
//!
//! A lost link is not an error to any caller. It flips the status to
//! `Degraded`, runs the retry loop in the background task, and tells
//! subscribers what happened through [`ChannelEvent::Reconnected`] or
//! [`ChannelEvent::RetriesExhausted`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use dungeonlink_protocol::{ClientMessage, Codec, JsonCodec, ServerEvent};
use dungeonlink_transport::{PushLink, PushTransport};

use crate::{ChannelConfig, ChannelError, ConnectionStatus};

/// What subscribers receive from the channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A decoded push frame from the server.
    Push(ServerEvent),

    /// The link was lost and re-established. Snapshot-owning layers
    /// should re-handshake and refetch, because pushes sent while the
    /// link was down are gone for good.
    Reconnected,

    /// The reconnect loop gave up. No more events will arrive until the
    /// next explicit attach.
    RetriesExhausted,
}

/// Shared state between the adapter handle and its background read task.
struct Inner<L, C> {
    codec: C,
    config: ChannelConfig,
    link: Mutex<Option<Arc<L>>>,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<ChannelEvent>>>,
    status: watch::Sender<ConnectionStatus>,
    /// Bumped on every attach/detach. A background task holding a stale
    /// epoch must not touch shared state.
    epoch: AtomicU64,
}

impl<L, C> Inner<L, C> {
    fn set_status(&self, status: ConnectionStatus) {
        if self.status.send_replace(status) != status {
            tracing::debug!(%status, "connection status changed");
        }
    }

    fn fan_out(&self, event: ChannelEvent) {
        let mut subs = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Dropped receivers are pruned as a side effect.
        subs.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn current_link(&self) -> Option<Arc<L>> {
        self.link
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set_link(&self, link: Option<Arc<L>>) -> Option<Arc<L>> {
        std::mem::replace(
            &mut *self.link.lock().unwrap_or_else(PoisonError::into_inner),
            link,
        )
    }
}

/// Owns the realtime push channel.
///
/// Generic over the transport so tests drive it with an in-memory fake,
/// and over the [`Codec`] so the frame format can change without touching
/// this layer. The default codec is [`JsonCodec`], matching the server.
pub struct ChannelAdapter<P: PushTransport, C: Codec = JsonCodec> {
    push: Arc<P>,
    inner: Arc<Inner<P::Link, C>>,
    pump: Mutex<Option<JoinHandle<()>>>,
}

impl<P: PushTransport, C: Codec + Default> ChannelAdapter<P, C> {
    /// Creates a detached adapter with the default codec.
    pub fn new(push: Arc<P>, config: ChannelConfig) -> Self {
        Self::with_codec(push, config, C::default())
    }
}

impl<P: PushTransport, C: Codec> ChannelAdapter<P, C> {
    /// Creates a detached adapter with an explicit codec.
    pub fn with_codec(push: Arc<P>, config: ChannelConfig, codec: C) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            push,
            inner: Arc::new(Inner {
                codec,
                config: config.validated(),
                link: Mutex::new(None),
                subscribers: Mutex::new(Vec::new()),
                status,
                epoch: AtomicU64::new(0),
            }),
            pump: Mutex::new(None),
        }
    }

    /// Opens the push link and starts delivering events to subscribers.
    ///
    /// Re-attaching is allowed: the previous link and read task are torn
    /// down first.
    ///
    /// # Errors
    /// [`ChannelError::AttachFailed`] when no link could be opened. The
    /// status is left at `Disconnected` and no retry loop runs — the
    /// retry loop only guards an already-working attachment.
    pub async fn attach(&self, url: &str) -> Result<(), ChannelError> {
        let epoch = self.invalidate();
        if let Some(old) = self.inner.set_link(None) {
            let _ = old.close().await;
        }

        self.inner.set_status(ConnectionStatus::Connecting);
        let link = match self.push.connect(url).await {
            Ok(link) => Arc::new(link),
            Err(e) => {
                self.inner.set_status(ConnectionStatus::Disconnected);
                return Err(ChannelError::AttachFailed(e));
            }
        };

        self.inner.set_link(Some(link.clone()));
        self.inner.set_status(ConnectionStatus::Connected);
        tracing::info!(url, "push channel attached");

        let handle = tokio::spawn(read_loop(
            self.push.clone(),
            self.inner.clone(),
            url.to_string(),
            link,
            epoch,
        ));
        let prev = self
            .pump
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(handle);
        if let Some(prev) = prev {
            prev.abort();
        }
        Ok(())
    }

    /// Tears the channel down: stops the read task, closes the link,
    /// drops every subscriber, and settles at `Disconnected`.
    ///
    /// A fresh attach afterwards starts with a clean subscriber set, so
    /// no handler ever fires twice across re-attachments.
    pub async fn detach(&self) {
        self.invalidate();
        if let Some(pump) = self
            .pump
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pump.abort();
        }
        if let Some(link) = self.inner.set_link(None) {
            let _ = link.close().await;
        }
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.inner.set_status(ConnectionStatus::Disconnected);
        tracing::info!("push channel detached");
    }

    /// Sends a client message over the live link.
    ///
    /// # Errors
    /// - [`ChannelError::NotAttached`] with no live link.
    /// - [`ChannelError::Transport`] when the send failed on the wire.
    pub async fn emit(&self, msg: &ClientMessage) -> Result<(), ChannelError> {
        let link = self
            .inner
            .current_link()
            .ok_or(ChannelError::NotAttached)?;
        let bytes = self.inner.codec.encode(msg)?;
        link.send(&bytes).await?;
        Ok(())
    }

    /// Registers a subscriber. Every [`ChannelEvent`] from now until the
    /// next detach is delivered to the returned receiver.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ChannelEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(tx);
        rx
    }

    /// The current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.borrow()
    }

    /// Subscribes to status changes.
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status.subscribe()
    }

    /// Bumps the epoch so background tasks from earlier attachments
    /// stand down. Returns the new epoch.
    fn invalidate(&self) -> u64 {
        self.inner.epoch.fetch_add(1, Ordering::SeqCst) + 1
    }
}

/// Adds 0–25% random jitter on top of a backoff delay.
fn jittered(base: Duration) -> Duration {
    let spread = base.as_millis() as u64 / 4;
    if spread == 0 {
        return base;
    }
    base + Duration::from_millis(rand::rng().random_range(0..spread))
}

/// The background read task: delivers frames until the link dies, then
/// hands control to the reconnect loop, and exits when that loop gives
/// up or the epoch moves on.
async fn read_loop<P: PushTransport, C: Codec>(
    push: Arc<P>,
    inner: Arc<Inner<P::Link, C>>,
    url: String,
    mut link: Arc<P::Link>,
    epoch: u64,
) {
    loop {
        let lost = match link.recv().await {
            Ok(Some(frame)) => {
                match inner.codec.decode::<ServerEvent>(&frame) {
                    Ok(event) => {
                        tracing::trace!(?event, "push event received");
                        inner.fan_out(ChannelEvent::Push(event));
                    }
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            len = frame.len(),
                            "malformed push frame dropped"
                        );
                    }
                }
                false
            }
            Ok(None) => {
                tracing::info!("push link closed by server");
                true
            }
            Err(e) => {
                tracing::warn!(error = %e, "push link failed");
                true
            }
        };

        if inner.epoch.load(Ordering::SeqCst) != epoch {
            return;
        }
        if !lost {
            continue;
        }

        match reconnect(&push, &inner, &url, epoch).await {
            Some(new_link) => link = new_link,
            None => return,
        }
    }
}

/// Runs the bounded reconnect loop. Returns the fresh link on success,
/// `None` when the attempts are exhausted or the epoch moved on.
async fn reconnect<P: PushTransport, C: Codec>(
    push: &Arc<P>,
    inner: &Arc<Inner<P::Link, C>>,
    url: &str,
    epoch: u64,
) -> Option<Arc<P::Link>> {
    inner.set_status(ConnectionStatus::Degraded);

    for attempt in 1..=inner.config.max_reconnect_attempts {
        let delay = jittered(inner.config.backoff(attempt));
        tracing::debug!(
            attempt,
            delay_ms = delay.as_millis() as u64,
            "reconnect scheduled"
        );
        tokio::time::sleep(delay).await;
        if inner.epoch.load(Ordering::SeqCst) != epoch {
            return None;
        }

        match push.connect(url).await {
            Ok(link) => {
                if inner.epoch.load(Ordering::SeqCst) != epoch {
                    return None;
                }
                let link = Arc::new(link);
                inner.set_link(Some(link.clone()));
                inner.set_status(ConnectionStatus::Connected);
                inner.fan_out(ChannelEvent::Reconnected);
                tracing::info!(attempt, "push channel reconnected");
                return Some(link);
            }
            Err(e) => {
                tracing::warn!(attempt, error = %e, "reconnect attempt failed");
            }
        }
    }

    if inner.epoch.load(Ordering::SeqCst) == epoch {
        inner.set_link(None);
        inner.set_status(ConnectionStatus::Disconnected);
        inner.fan_out(ChannelEvent::RetriesExhausted);
        tracing::warn!(
            attempts = inner.config.max_reconnect_attempts,
            "reconnect attempts exhausted, channel down"
        );
    }
    None
}

// =========================================================================
// Tests
// =========================================================================
