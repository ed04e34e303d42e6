use log::{error, info, trace, warn};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use zine_msg::SseMessage;

use crate::{api::EventSource, Error};

const CHANNEL_CAPACITY: usize = 256;

/// Fans server events out to every subscriber and keeps the real-time
/// connection open while a session exists.
pub struct ConnectHub {
    source: Arc<dyn EventSource>,
    events: broadcast::Sender<SseMessage>,
    connected: watch::Sender<bool>,
    reconnect_times: u32,
}

impl ConnectHub {
    pub fn new(source: Arc<dyn EventSource>, reconnect_times: u32) -> Self {
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        let (connected, _) = watch::channel(false);
        ConnectHub {
            source,
            events,
            connected,
            reconnect_times,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SseMessage> {
        self.events.subscribe()
    }

    pub fn is_connected(&self) -> bool {
        *self.connected.borrow()
    }

    pub fn watch_connected(&self) -> watch::Receiver<bool> {
        self.connected.subscribe()
    }

    /// Hands an event to every subscriber. Returns how many got it.
    pub fn dispatch(&self, event: SseMessage) -> usize {
        trace!("Dispatching {} {}", event.entity, event.action);
        self.events.send(event).unwrap_or(0)
    }

    /// Streams events for `token` until cancelled. A closed or failed
    /// connection is retried up to the reconnect limit; every successful
    /// open starts the count again.
    pub async fn run(&self, token: &str, cancel: &CancellationToken) -> Result<(), Error> {
        let mut retried = 0;
        loop {
            let connection = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                connection = self.source.connect(token) => connection,
            };
            match connection {
                Ok(mut events) => {
                    info!("Real-time connection opened");
                    retried = 0;
                    self.connected.send_replace(true);
                    loop {
                        tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                self.connected.send_replace(false);
                                return Ok(());
                            }
                            event = events.recv() => match event {
                                Some(event) => {
                                    self.dispatch(event);
                                }
                                None => break,
                            },
                        }
                    }
                    self.connected.send_replace(false);
                    warn!("Real-time connection closed by server");
                    if retried >= self.reconnect_times {
                        return Err(Error::ConnectionClosed(retried));
                    }
                }
                Err(err) => {
                    error!("Real-time connection failed: {}", err);
                    if retried >= self.reconnect_times {
                        return Err(err.into());
                    }
                }
            }
            retried += 1;
        }
    }
}
