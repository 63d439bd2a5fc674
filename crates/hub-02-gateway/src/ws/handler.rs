//! WebSocket handler: one task per client.
//!
//! Security features:
//! - Auth deadline (default 15s), enforced by the connection's gate
//! - Message size limits (default 1MB)
//! - Connection-level subscription limits
//! - Rate limiting per connection
//!
//! The task multiplexes four sources:
//!
//! ```text
//!   socket frames ──┐
//!   outbound queue ─┼──► select! ──► Connection (gate + subscriptions)
//!   auth deadline ──┤
//!   shutdown ───────┘
//! ```
//!
//! Because every gate transition is applied here, a deadline and a
//! credential check can never both take effect.

use crate::auth::{CredentialVerifier, Transition};
use crate::domain::{ConnectionId, GatewayConfig, WebSocketConfig};
use crate::ws::connection::Connection;
use crate::ws::messages::{ClientMessage, ServerMessage};
use crate::ws::registry::ConnectionRegistry;
use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use hub_01_state_machine::StateMachineApi;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

type Sender = SplitSink<WebSocket, Message>;

/// What the read loop does after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Flush queued replies, then close with a policy violation.
    Reject,
    Close,
}

/// WebSocket connection handler
pub struct WebSocketHandler {
    connection: Connection,
    outbound_rx: mpsc::Receiver<ServerMessage>,
    verifier: Arc<dyn CredentialVerifier>,
    registry: Arc<ConnectionRegistry>,
    config: WebSocketConfig,
    /// Message counter for rate limiting
    message_count: u32,
    /// Rate limit window start
    rate_limit_window: Instant,
}

impl WebSocketHandler {
    pub fn new(
        machine: Arc<dyn StateMachineApi>,
        verifier: Arc<dyn CredentialVerifier>,
        registry: Arc<ConnectionRegistry>,
        config: &GatewayConfig,
    ) -> Self {
        let (outbound_tx, outbound_rx) = mpsc::channel(config.websocket.outbound_buffer);
        Self {
            connection: Connection::new(machine, outbound_tx, config),
            outbound_rx,
            verifier,
            registry,
            config: config.websocket.clone(),
            message_count: 0,
            rate_limit_window: Instant::now(),
        }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection.id()
    }

    /// Check rate limit, returns true if request is allowed
    fn check_rate_limit(&mut self) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.rate_limit_window);

        // Reset window every second
        if elapsed >= Duration::from_secs(1) {
            self.rate_limit_window = now;
            self.message_count = 0;
        }

        self.message_count += 1;
        self.message_count <= self.config.rate_limit
    }

    /// Check message size, returns error reply if too large
    fn check_message_size(&self, size: usize) -> Option<ServerMessage> {
        if size > self.config.max_message_size {
            warn!(
                connection_id = %self.connection_id(),
                size = size,
                max = self.config.max_message_size,
                "Message exceeds size limit"
            );
            Some(ServerMessage::error(format!(
                "Message too large: {} bytes (max: {})",
                size, self.config.max_message_size
            )))
        } else {
            None
        }
    }

    /// Serve the connection until the client leaves, fails auth, or the
    /// gateway shuts down.
    pub async fn handle(mut self, socket: WebSocket, mut shutdown: watch::Receiver<bool>) {
        let connection_id = self.connection_id();
        info!(connection_id = %connection_id, "New WebSocket connection");

        self.registry.insert(Arc::clone(self.connection.handle()));
        self.connection.send_initial_state();

        let (deadline_tx, mut deadline_rx) = oneshot::channel::<()>();
        self.connection.arm_auth_timer(move || {
            let _ = deadline_tx.send(());
        });
        let mut deadline_armed = true;

        let (mut sender, mut receiver) = socket.split();

        loop {
            tokio::select! {
                Some(message) = self.outbound_rx.recv() => {
                    if let Err(e) = sender.send(Message::Text(message.to_text())).await {
                        error!(connection_id = %connection_id, error = %e, "Failed to send frame");
                        break;
                    }
                }
                fired = &mut deadline_rx, if deadline_armed => {
                    deadline_armed = false;
                    // Err means the timer was cancelled by a successful authentication.
                    if fired.is_ok() {
                        if let Transition::Unauthorized(_) = self.connection.expire() {
                            self.reject(&mut sender).await;
                            break;
                        }
                    }
                }
                frame = receiver.next() => {
                    let flow = match frame {
                        Some(Ok(message)) => self.on_frame(message, &mut sender).await,
                        Some(Err(e)) => {
                            warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                            Flow::Close
                        }
                        None => Flow::Close,
                    };
                    match flow {
                        Flow::Continue => {}
                        Flow::Reject => {
                            self.reject(&mut sender).await;
                            break;
                        }
                        Flow::Close => break,
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!(connection_id = %connection_id, "Closing connection for shutdown");
                        let _ = sender
                            .send(Message::Close(Some(CloseFrame {
                                code: close_code::AWAY,
                                reason: "shutting down".into(),
                            })))
                            .await;
                        break;
                    }
                }
            }
        }

        // Cleanup subscriptions on disconnect
        self.connection.close();
        self.registry.remove(&connection_id);

        info!(connection_id = %connection_id, "WebSocket connection closed");
    }

    async fn on_frame(&mut self, message: Message, sender: &mut Sender) -> Flow {
        match message {
            Message::Text(text) => self.on_payload(&text).await,
            Message::Binary(data) => match String::from_utf8(data) {
                Ok(text) => self.on_payload(&text).await,
                Err(_) => {
                    self.reply(ServerMessage::error("Binary frame is not valid UTF-8"));
                    Flow::Continue
                }
            },
            Message::Ping(data) => {
                if let Err(e) = sender.send(Message::Pong(data)).await {
                    error!(error = %e, "Failed to send pong");
                    return Flow::Close;
                }
                Flow::Continue
            }
            Message::Pong(_) => {
                // Ignore pongs
                Flow::Continue
            }
            Message::Close(_) => {
                debug!(connection_id = %self.connection_id(), "WebSocket close received");
                Flow::Close
            }
        }
    }

    async fn on_payload(&mut self, text: &str) -> Flow {
        if let Some(error_reply) = self.check_message_size(text.len()) {
            self.reply(error_reply);
            return Flow::Continue;
        }

        if !self.check_rate_limit() {
            self.reply(ServerMessage::error("Rate limit exceeded"));
            return Flow::Continue;
        }

        let message: ClientMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(e) => {
                debug!(connection_id = %self.connection_id(), error = %e, "Malformed frame");
                self.reply(ServerMessage::error(format!("Malformed message: {}", e)));
                return Flow::Continue;
            }
        };

        self.handle_message(message).await
    }

    async fn handle_message(&mut self, message: ClientMessage) -> Flow {
        match message {
            ClientMessage::Action { action, data } => {
                // Fire-and-forget; the dispatcher logs rejected actions.
                // Dispatch runs inline under the dispatcher's blocking lock, so
                // mutators must stay short. Heavy work belongs outside them.
                let _ =self.connection.forward_action(&action, &data);
            }
            ClientMessage::Subscribe { event } => {
                if let Err(e) = self.connection.subscribe(&event) {
                    self.reply(ServerMessage::error(format!("{}: {}", e, event)));
                }
            }
            ClientMessage::Unsubscribe { event } => {
                self.connection.unsubscribe(&event);
            }
            ClientMessage::Authenticate { token } => {
                let verdict = self.verifier.verify(&token).await;
                if let Transition::Unauthorized(_) = self.connection.complete_authentication(&verdict) {
                    return Flow::Reject;
                }
            }
        }
        Flow::Continue
    }

    fn reply(&self, message: ServerMessage) {
        self.connection.handle().send(message);
    }

    /// Deliver whatever is queued (including the `unauthorized` notice),
    /// then close.
    async fn reject(&mut self, sender: &mut Sender) {
        while let Ok(message) = self.outbound_rx.try_recv() {
            if sender.send(Message::Text(message.to_text())).await.is_err() {
                return;
            }
        }
        let _ = sender
            .send(Message::Close(Some(CloseFrame {
                code: close_code::POLICY,
                reason: "unauthorized".into(),
            })))
            .await;
    }
}
