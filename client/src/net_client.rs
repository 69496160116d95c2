//! Maintains the single outbound connection (spec.md §4.8). Generalizes the
//! teacher's polled `MiddleLayer`/`ConnectionInformation` pair into a
//! background tokio task plus a subscription surface, since this client
//! runs on tokio rather than an egui per-frame `update()` heartbeat.

use futures_util::{SinkExt, StreamExt};
use protocol::{ConnectPayload, Envelope, Message, PlayerId, config::ReconnectionConfig};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::error::ClientError;

/// Subscription surface for connection lifecycle and inbound messages
/// (spec.md §4.8: `onConnect`, `onDisconnect`, `onMessage`, `onReconnecting`,
/// `onReconnected`). Default bodies let a caller implement only what it
/// needs, the same capability-trait idiom as `Renderer`/`Input` (spec.md §6).
pub trait NetClientEvents: Send {
    fn on_connect(&mut self) {}
    fn on_disconnect(&mut self) {}
    fn on_message(&mut self, envelope: Envelope) {}
    fn on_reconnecting(&mut self, attempt: u32, delay: Duration) {}
    fn on_reconnected(&mut self) {}
}

enum Outbound {
    Send(Message),
    Close,
}

pub struct NetClient {
    outbound: mpsc::UnboundedSender<Outbound>,
    manual_close: Arc<AtomicBool>,
    resume_player_id: Arc<Mutex<Option<PlayerId>>>,
    task: JoinHandle<()>,
}

impl NetClient {
    /// Starts the background connection loop immediately.
    pub fn connect(
        url: String,
        reconnection: ReconnectionConfig,
        mut events: Box<dyn NetClientEvents>,
    ) -> NetClient {
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Outbound>();
        let manual_close = Arc::new(AtomicBool::new(false));
        let resume_player_id: Arc<Mutex<Option<PlayerId>>> = Arc::new(Mutex::new(None));

        let task_manual_close = manual_close.clone();
        let task_resume_player_id = resume_player_id.clone();
        let task = tokio::spawn(async move {
            let mut attempt: u32 = 0;
            let mut ever_connected = false;

            loop {
                if task_manual_close.load(Ordering::SeqCst) {
                    return;
                }

                match tokio_tungstenite::connect_async(&url).await {
                    Ok((stream, _response)) => {
                        attempt = 0;
                        if ever_connected {
                            events.on_reconnected();
                        } else {
                            events.on_connect();
                            ever_connected = true;
                        }

                        let resume = *task_resume_player_id.lock().await;
                        let (mut write, mut read) = stream.split();
                        if let Some(player_id) = resume {
                            let payload = ConnectPayload {
                                client_id: None,
                                player_id: Some(player_id),
                                player_name: None,
                                game_state: None,
                                wait_message: None,
                            };
                            let envelope = Envelope::new(Message::Connect(payload), 0);
                            let _ = write.send(WsMessage::Text(envelope.encode().into())).await;
                        }

                        loop {
                            tokio::select! {
                                outbound = outbound_rx.recv() => {
                                    match outbound {
                                        Some(Outbound::Send(message)) => {
                                            let envelope = Envelope::new(message, 0);
                                            if write.send(WsMessage::Text(envelope.encode().into())).await.is_err() {
                                                break;
                                            }
                                        }
                                        Some(Outbound::Close) => {
                                            task_manual_close.store(true, Ordering::SeqCst);
                                            let _ = write.send(WsMessage::Close(None)).await;
                                            return;
                                        }
                                        None => return,
                                    }
                                }
                                incoming = read.next() => {
                                    match incoming {
                                        Some(Ok(WsMessage::Text(text))) => {
                                            match Envelope::decode(&text) {
                                                Ok(envelope) => {
                                                    if let Message::Connect(ref payload) = envelope.message {
                                                        if let Some(player_id) = payload.player_id {
                                                            *task_resume_player_id.lock().await = Some(player_id);
                                                        }
                                                    }
                                                    // Liveness is driven by the server's periodic PING
                                                    // (spec.md §4.5); answer immediately rather than
                                                    // routing it through `on_message`.
                                                    if matches!(envelope.message, Message::Ping) {
                                                        let pong = Envelope::new(Message::Pong, 0);
                                                        if write.send(WsMessage::Text(pong.encode().into())).await.is_err() {
                                                            break;
                                                        }
                                                    } else {
                                                        events.on_message(envelope);
                                                    }
                                                }
                                                Err(err) => tracing::warn!(?err, "dropping malformed server message"),
                                            }
                                        }
                                        Some(Ok(WsMessage::Close(_))) | None => break,
                                        Some(Ok(_)) => {}
                                        Some(Err(err)) => {
                                            tracing::warn!(?err, "websocket read error");
                                            break;
                                        }
                                    }
                                }
                            }
                        }

                        events.on_disconnect();
                    }
                    Err(err) => {
                        tracing::warn!(?err, "connect attempt failed");
                    }
                }

                if task_manual_close.load(Ordering::SeqCst) || !reconnection.enabled {
                    return;
                }
                attempt += 1;
                if attempt > reconnection.max_attempts {
                    return;
                }
                let delay = backoff_delay(&reconnection, attempt);
                events.on_reconnecting(attempt, delay);
                tokio::time::sleep(delay).await;
            }
        });

        NetClient {
            outbound: outbound_tx,
            manual_close,
            resume_player_id,
            task,
        }
    }

    pub fn send(&self, message: Message) -> Result<(), ClientError> {
        self.outbound.send(Outbound::Send(message)).map_err(|_| ClientError::Closed)
    }

    pub fn close(&self) {
        let _ = self.outbound.send(Outbound::Close);
    }

    pub async fn set_resume_player_id(&self, player_id: PlayerId) {
        *self.resume_player_id.lock().await = Some(player_id);
    }

    pub fn is_closed(&self) -> bool {
        self.task.is_finished()
    }
}

/// `delay(n) = min(retryDelay * 2^n, maxRetryDelay)` when exponential
/// backoff is enabled, else a flat `retryDelay` (spec.md §4.8).
fn backoff_delay(config: &ReconnectionConfig, attempt: u32) -> Duration {
    if !config.exponential_backoff {
        return Duration::from_millis(config.retry_delay_ms);
    }
    let scaled = config.retry_delay_ms.saturating_mul(1u64 << attempt.min(32));
    Duration::from_millis(scaled.min(config.max_retry_delay_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_exponentially_then_caps() {
        let config = ReconnectionConfig {
            enabled: true,
            max_attempts: 10,
            retry_delay_ms: 250,
            exponential_backoff: true,
            max_retry_delay_ms: 8_000,
        };
        assert_eq!(backoff_delay(&config, 1).as_millis(), 500);
        assert_eq!(backoff_delay(&config, 2).as_millis(), 1_000);
        assert_eq!(backoff_delay(&config, 10).as_millis(), 8_000);
    }

    #[test]
    fn flat_backoff_ignores_attempt_number() {
        let config = ReconnectionConfig {
            enabled: true,
            max_attempts: 10,
            retry_delay_ms: 250,
            exponential_backoff: false,
            max_retry_delay_ms: 8_000,
        };
        assert_eq!(backoff_delay(&config, 1).as_millis(), 250);
        assert_eq!(backoff_delay(&config, 9).as_millis(), 250);
    }
}
