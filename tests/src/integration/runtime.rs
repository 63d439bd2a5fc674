//! The assembled hub: configuration, built-in modules and gateway together.

#[cfg(test)]
mod tests {
    use crate::harness::{valid_token, Client, AUDIENCE, ISSUER, SECRET};
    use hub_runtime::config::HubConfig;
    use hub_runtime::HubRuntime;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    fn config() -> HubConfig {
        let mut config = HubConfig::default();
        config.gateway.auth.secret = SECRET.to_string();
        config.gateway.auth.issuer = ISSUER.to_string();
        config.gateway.auth.audience = AUDIENCE.to_string();
        config
    }

    async fn start(config: HubConfig) -> (HubRuntime, std::net::SocketAddr) {
        let mut runtime = HubRuntime::new(config).unwrap();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        runtime.start_on(listener).unwrap();
        (runtime, addr)
    }

    #[tokio::test]
    async fn test_notifications_over_the_wire() {
        let (mut runtime, addr) = start(config()).await;
        let mut client = Client::connect(addr).await;
        assert_eq!(client.expect("initial-state").await, json!({"state": {}}));

        client.authenticate(&valid_token()).await;
        client.expect("authenticated").await;
        client.subscribe("update:notifications").await;

        client
            .action(
                "notifications:create",
                json!({
                    "id": "washer",
                    "title": "Laundry done",
                    "level": "info",
                    "createdAt": "2026-10-16T08:30:00Z"
                }),
            )
            .await;
        let diff = client.expect("update:notifications").await;
        assert_eq!(diff["state"]["notifications"][0]["id"], json!("washer"));

        client
            .action("NOTIFICATIONS:DISMISS", json!({"id": "washer"}))
            .await;
        let diff = client.expect("update:notifications").await;
        assert_eq!(diff["state"]["notifications"], json!([]));

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_initial_state_file_is_served() {
        let path = std::env::temp_dir().join(format!("hub-tests-state-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"lights": {"kitchen": "on"}}"#).unwrap();

        let mut config = config();
        config.initial_state = Some(path.clone());
        let (mut runtime, addr) = start(config).await;
        std::fs::remove_file(&path).ok();

        let mut client = Client::connect(addr).await;
        assert_eq!(
            client.expect("initial-state").await,
            json!({"state": {"lights": {"kitchen": "on"}}})
        );

        runtime.shutdown().await;
    }

    #[tokio::test]
    async fn test_health_reports_connections() {
        let (mut runtime, addr) = start(config()).await;
        let mut client = Client::connect(addr).await;
        client.expect("initial-state").await;
        client.authenticate(&valid_token()).await;
        client.expect("authenticated").await;

        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream
            .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
            .await
            .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();

        assert!(response.starts_with("HTTP/1.1 200"));
        let body = &response[response.find("\r\n\r\n").unwrap() + 4..];
        let health: serde_json::Value = serde_json::from_str(body.trim()).unwrap();
        assert_eq!(
            health,
            json!({"status": "ok", "connections": 1, "authenticated": 1})
        );

        runtime.shutdown().await;
    }
}
