//! One client session: its auth gate, its subscriptions, its outbound queue.
//!
//! A `Connection` is owned by the task serving the socket. Bus listeners
//! only ever see the shared [`ConnectionHandle`], so delivery eligibility
//! is decided at publish time, not at subscribe time.

use crate::auth::{AuthGate, Claims, Transition};
use crate::domain::{AuthError, ConnectionId, GatewayConfig};
use crate::ws::messages::ServerMessage;
use crate::ws::registry::ConnectionHandle;
use hub_01_state_machine::{DispatchError, DispatchOutcome, StateMachineApi};
use serde_json::Value;
use shared_bus::{ListenerResult, Subscription};
use shared_types::Topic;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Subscription errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscribeError {
    #[error("too many subscriptions for this connection")]
    TooManySubscriptions,
    #[error("invalid event name")]
    InvalidTopic,
}

pub struct Connection {
    handle: Arc<ConnectionHandle>,
    gate: AuthGate,
    subscriptions: HashMap<Topic, Subscription>,
    machine: Arc<dyn StateMachineApi>,
    max_subscriptions: usize,
}

impl Connection {
    pub fn new(
        machine: Arc<dyn StateMachineApi>,
        outbound: mpsc::Sender<ServerMessage>,
        config: &GatewayConfig,
    ) -> Self {
        Self {
            handle: Arc::new(ConnectionHandle::new(ConnectionId::new(), outbound)),
            gate: AuthGate::new(config.auth.timeout),
            subscriptions: HashMap::new(),
            machine,
            max_subscriptions: config.websocket.max_subscriptions_per_connection,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn handle(&self) -> &Arc<ConnectionHandle> {
        &self.handle
    }

    pub fn gate(&self) -> &AuthGate {
        &self.gate
    }

    /// Start the auth deadline; `on_timeout` must route back to
    /// [`Connection::expire`] on the owning task.
    pub fn arm_auth_timer<F>(&mut self, on_timeout: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.gate.arm(on_timeout);
    }

    /// Queue the full snapshot. Sent in every phase, including PENDING.
    pub fn send_initial_state(&self) {
        let snapshot = self.machine.get_state();
        self.handle.send(ServerMessage::initial_state(&snapshot));
    }

    /// Hand a client action to the dispatcher. Failures were already logged
    /// by the state machine.
    pub fn forward_action(
        &self,
        action: &str,
        data: &Value,
    ) -> Result<DispatchOutcome, DispatchError> {
        debug!(connection_id = %self.id(), action, "Forwarding client action");
        self.machine.dispatch(action, data)
    }

    /// Subscribe this connection to `event`. Returns false if it was
    /// already subscribed.
    pub fn subscribe(&mut self, event: &str) -> Result<bool, SubscribeError> {
        let topic = Topic::new(event).map_err(|_| SubscribeError::InvalidTopic)?;
        if self.subscriptions.contains_key(&topic) {
            return Ok(false);
        }
        if self.subscriptions.len() >= self.max_subscriptions {
            return Err(SubscribeError::TooManySubscriptions);
        }

        let handle = Arc::clone(&self.handle);
        let subscription = if topic.is_wildcard() {
            self.machine.subscribe_all(Box::new(
                move |topic: &Topic, payload: &Value| -> ListenerResult {
                    handle.deliver(ServerMessage::all_events(topic, payload));
                    Ok(())
                },
            ))
        } else {
            let name = topic.to_string();
            self.machine.subscribe(
                topic.clone(),
                Box::new(move |payload: &Value| -> ListenerResult {
                    handle.deliver(ServerMessage::relay(&name, payload));
                    Ok(())
                }),
            )
        };

        debug!(
            connection_id = %self.id(),
            topic = %subscription.topic(),
            subscription_id = subscription.id(),
            "Subscribed"
        );
        self.subscriptions.insert(topic, subscription);
        Ok(true)
    }

    /// Returns false if the connection was not subscribed to `event`.
    pub fn unsubscribe(&mut self, event: &str) -> bool {
        let Ok(topic) = Topic::new(event) else {
            return false;
        };
        match self.subscriptions.remove(&topic) {
            Some(subscription) => {
                subscription.unsubscribe();
                debug!(
                    connection_id = %self.id(),
                    topic = %topic,
                    subscription_id = subscription.id(),
                    "Unsubscribed"
                );
                true
            }
            None => false,
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Feed a credential check into the gate and notify the client.
    pub fn complete_authentication(&mut self, verdict: &Result<Claims, AuthError>) -> Transition {
        let transition = self.gate.authenticate(verdict);
        match transition {
            Transition::Authenticated => {
                self.handle.set_eligible(true);
                self.handle.send(ServerMessage::authenticated());
                info!(
                    connection_id = %self.id(),
                    subject = verdict.as_ref().ok().and_then(|c| c.sub.as_deref()).unwrap_or("-"),
                    "Connection authenticated"
                );
            }
            Transition::Unauthorized(reason) => {
                self.handle.send(ServerMessage::unauthorized(reason));
                if let Err(err) = verdict {
                    warn!(connection_id = %self.id(), error = %err, "Rejected credential");
                }
            }
            Transition::Ignored => {
                debug!(connection_id = %self.id(), "Ignoring credential outside PENDING");
            }
        }
        transition
    }

    /// The auth deadline fired.
    pub fn expire(&mut self) -> Transition {
        let transition = self.gate.expire();
        if let Transition::Unauthorized(reason) = transition {
            warn!(connection_id = %self.id(), "Authentication timed out");
            self.handle.send(ServerMessage::unauthorized(reason));
        }
        transition
    }

    /// Leave the session: no more deliveries, every subscription released.
    pub fn close(&mut self) {
        self.gate.close();
        self.handle.set_eligible(false);
        let released = self.subscriptions.len();
        for (_, subscription) in self.subscriptions.drain() {
            subscription.unsubscribe();
        }
        debug!(connection_id = %self.id(), released, "Connection subscriptions released");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.handle.set_eligible(false);
    }
}
