//! In-process hub and a minimal WebSocket client for end-to-end tests.

use futures::{SinkExt, StreamExt};
use hub_01_state_machine::{ActionRegistryBuilder, StateMachine, StateMachineApi};
use hub_02_gateway::{GatewayConfig, GatewayService, JwtVerifier};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use shared_bus::EventBus;
use shared_types::State;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

pub const SECRET: &str = "integration-secret";
pub const ISSUER: &str = "hearth-sso";
pub const AUDIENCE: &str = "hearth-hub";

/// How long a client waits for a frame before giving up.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(3);

pub fn increment(state: &State, payload: &Value) -> State {
    let mut next = state.clone();
    let count = state.get("count").and_then(Value::as_i64).unwrap_or(0);
    next.insert(
        "count".into(),
        json!(count + payload["amount"].as_i64().unwrap_or(0)),
    );
    next
}

pub fn counter_machine() -> Arc<StateMachine> {
    let mut builder = ActionRegistryBuilder::new();
    builder
        .register("COUNTER:INCREMENT", increment, |_| true)
        .expect("valid action id");

    let mut initial = State::new();
    initial.insert("count".into(), json!(0));
    Arc::new(StateMachine::new(builder.build(), initial, EventBus::new()))
}

pub fn gateway_config(auth_timeout: Duration) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.auth.secret = SECRET.to_string();
    config.auth.issuer = ISSUER.to_string();
    config.auth.audience = AUDIENCE.to_string();
    config.auth.timeout = auth_timeout;
    config.auth.leeway = 0;
    config
}

/// A gateway serving a counter state machine on an ephemeral port.
pub struct TestHub {
    pub machine: Arc<StateMachine>,
    pub gateway: Arc<GatewayService>,
    pub addr: SocketAddr,
    server: JoinHandle<()>,
}

impl TestHub {
    pub async fn start(auth_timeout: Duration) -> Self {
        Self::start_with(counter_machine(), gateway_config(auth_timeout)).await
    }

    pub async fn start_with(machine: Arc<StateMachine>, config: GatewayConfig) -> Self {
        let verifier = Arc::new(JwtVerifier::new(&config.auth));
        let gateway = Arc::new(
            GatewayService::new(
                config,
                Arc::clone(&machine) as Arc<dyn StateMachineApi>,
                verifier,
            )
            .expect("valid gateway config"),
        );

        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let server = {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                gateway.serve(listener).await.expect("gateway serve");
            })
        };

        Self {
            machine,
            gateway,
            addr,
            server,
        }
    }

    pub async fn connect(&self) -> Client {
        Client::connect(self.addr).await
    }

    pub async fn stop(self) {
        self.gateway.shutdown();
        let _ = tokio::time::timeout(RECV_TIMEOUT, self.server).await;
    }

    /// Poll until `check` holds or the receive timeout elapses.
    pub async fn eventually<F>(&self, check: F) -> bool
    where
        F: Fn(&Self) -> bool,
    {
        let deadline = tokio::time::Instant::now() + RECV_TIMEOUT;
        while tokio::time::Instant::now() < deadline {
            if check(self) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check(self)
    }
}

/// Mint a token signed with `secret`, expiring `ttl_secs` from now.
pub fn mint_token(secret: &str, issuer: &str, audience: &str, ttl_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "sub": "integration-user",
        "iss": issuer,
        "aud": audience,
        "iat": now,
        "exp": now + ttl_secs,
    });
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("encode token")
}

pub fn valid_token() -> String {
    mint_token(SECRET, ISSUER, AUDIENCE, 600)
}

pub struct Client {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Self {
        let (ws, _) = connect_async(format!("ws://{}/ws", addr))
            .await
            .expect("websocket connect");
        Self { ws }
    }

    pub async fn send(&mut self, event: &str, data: Value) {
        let frame = json!({ "event": event, "data": data }).to_string();
        self.send_raw(&frame).await;
    }

    pub async fn send_raw(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("send frame");
    }

    pub async fn authenticate(&mut self, token: &str) {
        self.send("authenticate", json!({ "token": token })).await;
    }

    pub async fn subscribe(&mut self, event: &str) {
        self.send("subscribe", json!({ "event": event })).await;
    }

    pub async fn unsubscribe(&mut self, event: &str) {
        self.send("unsubscribe", json!({ "event": event })).await;
    }

    pub async fn action(&mut self, action: &str, data: Value) {
        self.send("action", json!({ "action": action, "data": data }))
            .await;
    }

    /// Next `{event, data}` frame; `None` once the server closed.
    pub async fn recv_within(&mut self, wait: Duration) -> Option<Value> {
        loop {
            let next = tokio::time::timeout(wait, self.ws.next()).await.ok()??;
            match next {
                Ok(Message::Text(text)) => {
                    return Some(serde_json::from_str(text.as_str()).expect("json frame"));
                }
                Ok(Message::Close(_)) | Err(_) => return None,
                Ok(_) => continue,
            }
        }
    }

    pub async fn recv(&mut self) -> Option<Value> {
        self.recv_within(RECV_TIMEOUT).await
    }

    /// Next frame, which must carry `event`.
    pub async fn expect(&mut self, event: &str) -> Value {
        let frame = self
            .recv()
            .await
            .unwrap_or_else(|| panic!("connection closed while waiting for {event}"));
        assert_eq!(frame["event"], json!(event), "unexpected frame {frame}");
        frame["data"].clone()
    }

    /// Every frame that arrives within `window`.
    pub async fn collect_for(&mut self, window: Duration) -> Vec<Value> {
        let deadline = tokio::time::Instant::now() + window;
        let mut frames = Vec::new();
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            if remaining.is_zero() {
                return frames;
            }
            match self.recv_within(remaining).await {
                Some(frame) => frames.push(frame),
                None => return frames,
            }
        }
    }

    /// True if the server closes the connection (skipping any frames
    /// still in flight) before the receive timeout.
    pub async fn is_closed(&mut self) -> bool {
        loop {
            match tokio::time::timeout(RECV_TIMEOUT, self.ws.next()).await {
                Err(_) => return false,
                Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
                Ok(Some(Ok(_))) => continue,
            }
        }
    }
}
