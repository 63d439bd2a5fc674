//! Connection lifecycle through the auth gate.

#[cfg(test)]
mod tests {
    use crate::harness::{mint_token, valid_token, TestHub, AUDIENCE, ISSUER, SECRET};
    use serde_json::json;
    use std::time::Duration;

    #[tokio::test]
    async fn test_initial_state_sent_before_authentication() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut client = hub.connect().await;

        let data = client.expect("initial-state").await;
        assert_eq!(data, json!({"state": {"count": 0}}));

        hub.stop().await;
    }

    #[tokio::test]
    async fn test_valid_token_authenticates() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut client = hub.connect().await;
        client.expect("initial-state").await;

        client.authenticate(&valid_token()).await;
        assert_eq!(client.expect("authenticated").await, json!(null));
        assert!(hub.eventually(|h| h.gateway.connections().authenticated_count() == 1).await);

        hub.stop().await;
    }

    #[tokio::test]
    async fn test_deadline_closes_with_timeout() {
        let hub = TestHub::start(Duration::from_millis(200)).await;
        let mut client = hub.connect().await;
        client.expect("initial-state").await;

        let data = client.expect("unauthorized").await;
        assert_eq!(data, json!({"type": "TIMEOUT"}));
        assert!(client.is_closed().await);

        hub.stop().await;
    }

    #[tokio::test]
    async fn test_authenticated_connection_outlives_deadline() {
        let hub = TestHub::start(Duration::from_millis(200)).await;
        let mut client = hub.connect().await;
        client.expect("initial-state").await;
        client.authenticate(&valid_token()).await;
        client.expect("authenticated").await;

        // No late timeout after the deadline has passed.
        let frames = client.collect_for(Duration::from_millis(500)).await;
        assert!(frames.is_empty(), "unexpected frames {frames:?}");

        client.subscribe("update").await;
        client.action("COUNTER:INCREMENT", json!({"amount": 1})).await;
        assert_eq!(client.expect("update").await["action"], json!("COUNTER:INCREMENT"));

        hub.stop().await;
    }

    #[tokio::test]
    async fn test_bad_credentials_close_with_invalid_token() {
        let cases = [
            mint_token("wrong-secret", ISSUER, AUDIENCE, 600),
            mint_token(SECRET, "rogue-issuer", AUDIENCE, 600),
            mint_token(SECRET, ISSUER, "another-app", 600),
            mint_token(SECRET, ISSUER, AUDIENCE, -600),
            "not-a-token".to_string(),
        ];

        let hub = TestHub::start(Duration::from_secs(15)).await;
        for token in cases {
            let mut client = hub.connect().await;
            client.expect("initial-state").await;

            client.authenticate(&token).await;
            let data = client.expect("unauthorized").await;
            assert_eq!(data, json!({"type": "INVALID_TOKEN"}));
            assert!(client.is_closed().await);
        }
        assert!(hub.eventually(|h| h.gateway.connections().connection_count() == 0).await);

        hub.stop().await;
    }

    #[tokio::test]
    async fn test_timed_out_connection_never_sees_updates() {
        let hub = TestHub::start(Duration::from_millis(300)).await;

        let mut pending = hub.connect().await;
        pending.expect("initial-state").await;
        pending.subscribe("*").await;
        pending.subscribe("update:count").await;

        let mut driver = hub.connect().await;
        driver.expect("initial-state").await;
        driver.authenticate(&valid_token()).await;
        driver.expect("authenticated").await;
        for _ in 0..3 {
            driver.action("COUNTER:INCREMENT", json!({"amount": 1})).await;
        }

        assert_eq!(
            pending.expect("unauthorized").await,
            json!({"type": "TIMEOUT"})
        );
        assert!(pending.is_closed().await);
        assert_eq!(hub.machine.get_state()["count"], json!(3));

        hub.stop().await;
    }

    #[tokio::test]
    async fn test_shutdown_closes_open_connections() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut client = hub.connect().await;
        client.expect("initial-state").await;
        client.subscribe("*").await;
        assert!(hub.eventually(|h| h.machine.bus().listener_count() == 1).await);

        hub.gateway.shutdown();
        assert!(client.is_closed().await);
        assert!(hub.eventually(|h| h.machine.bus().listener_count() == 0).await);

        hub.stop().await;
    }
}
