//! Subscription handling and delivery gating.

#[cfg(test)]
mod tests {
    use crate::harness::{valid_token, Client, TestHub};
    use serde_json::{json, Value};
    use std::time::Duration;

    const QUIET: Duration = Duration::from_millis(300);

    async fn authenticated(hub: &TestHub) -> Client {
        let mut client = hub.connect().await;
        client.expect("initial-state").await;
        client.authenticate(&valid_token()).await;
        client.expect("authenticated").await;
        client
    }

    fn events(frames: &[Value]) -> Vec<String> {
        frames
            .iter()
            .map(|f| f["event"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_wildcard_relays_only_after_authentication() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut client = hub.connect().await;
        client.expect("initial-state").await;

        // Subscribed and dispatching while PENDING: nothing is relayed.
        client.subscribe("*").await;
        client.action("COUNTER:INCREMENT", json!({"amount": 1})).await;
        client.authenticate(&valid_token()).await;
        client.action("COUNTER:INCREMENT", json!({"amount": 5})).await;

        client.expect("authenticated").await;

        let first = client.expect("all-events").await;
        assert_eq!(
            first,
            json!({"event": "update:count", "data": {"state": {"count": 6}}})
        );

        let second = client.expect("all-events").await;
        assert_eq!(second["event"], json!("update"));
        assert_eq!(second["data"]["diff"], json!(["count"]));

        let third = client.expect("all-events").await;
        assert_eq!(third["event"], json!("action:COUNTER:INCREMENT"));
        assert_eq!(third["data"]["actionData"], json!({"amount": 5}));
        assert_eq!(third["data"]["state"], json!({"count": 6}));

        assert!(client.collect_for(QUIET).await.is_empty());
        hub.stop().await;
    }

    #[tokio::test]
    async fn test_named_subscription_relays_under_its_name() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut client = authenticated(&hub).await;

        client.subscribe("update:count").await;
        client.action("counter:increment", json!({"amount": 2})).await;

        let data = client.expect("update:count").await;
        assert_eq!(data, json!({"state": {"count": 2}}));
        hub.stop().await;
    }

    #[tokio::test]
    async fn test_resubscribe_delivers_once() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut client = authenticated(&hub).await;

        client.subscribe("update").await;
        client.subscribe("update").await;
        client.action("COUNTER:INCREMENT", json!({"amount": 1})).await;

        let frames = client.collect_for(QUIET).await;
        assert_eq!(events(&frames), vec!["update"]);
        assert_eq!(hub.machine.bus().listener_count(), 1);
        hub.stop().await;
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_relays() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut client = authenticated(&hub).await;

        client.subscribe("update").await;
        client.action("COUNTER:INCREMENT", json!({"amount": 1})).await;
        client.expect("update").await;

        client.unsubscribe("update").await;
        // Unsubscribing twice is harmless.
        client.unsubscribe("update").await;
        client.action("COUNTER:INCREMENT", json!({"amount": 1})).await;

        assert!(client.collect_for(QUIET).await.is_empty());
        assert_eq!(hub.machine.get_state()["count"], json!(2));
        hub.stop().await;
    }

    #[tokio::test]
    async fn test_resubscribe_after_unsubscribe_delivers_once() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut client = authenticated(&hub).await;

        client.subscribe("update").await;
        client.unsubscribe("update").await;
        client.subscribe("update").await;
        client.action("COUNTER:INCREMENT", json!({"amount": 3})).await;

        let frames = client.collect_for(QUIET).await;
        assert_eq!(events(&frames), vec!["update"]);
        assert_eq!(frames[0]["data"]["state"], json!({"count": 3}));
        assert_eq!(hub.machine.bus().listener_count(), 1);
        hub.stop().await;
    }

    #[tokio::test]
    async fn test_relays_reach_only_the_subscriber() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut listener = authenticated(&hub).await;
        let mut bystander = authenticated(&hub).await;

        listener.subscribe("update").await;
        assert!(hub.eventually(|h| h.machine.bus().listener_count() == 1).await);
        bystander.action("COUNTER:INCREMENT", json!({"amount": 4})).await;

        assert_eq!(listener.expect("update").await["state"], json!({"count": 4}));
        assert!(bystander.collect_for(QUIET).await.is_empty());
        hub.stop().await;
    }

    #[tokio::test]
    async fn test_application_events_are_relayed() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut client = authenticated(&hub).await;

        client.subscribe("doorbell:ring").await;
        assert!(hub.eventually(|h| h.machine.bus().listener_count() == 1).await);

        let topic = shared_types::Topic::new("doorbell:ring").unwrap();
        hub.machine.emit(&topic, &json!({"door": "front"}));

        assert_eq!(client.expect("doorbell:ring").await, json!({"door": "front"}));
        hub.stop().await;
    }

    #[tokio::test]
    async fn test_unknown_action_publishes_nothing() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut client = authenticated(&hub).await;

        client.subscribe("*").await;
        client.action("LIGHTS:EXPLODE", json!({})).await;

        assert!(client.collect_for(QUIET).await.is_empty());
        assert_eq!(hub.machine.get_state()["count"], json!(0));
        hub.stop().await;
    }

    #[tokio::test]
    async fn test_malformed_frames_keep_connection_open() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut client = authenticated(&hub).await;

        client.send_raw("{definitely not json").await;
        let error = client.expect("error").await;
        assert!(error["message"].as_str().unwrap().starts_with("Malformed message"));

        client.send("reboot", json!({})).await;
        client.expect("error").await;

        client.subscribe("update").await;
        client.action("COUNTER:INCREMENT", json!({"amount": 1})).await;
        client.expect("update").await;
        hub.stop().await;
    }

    #[tokio::test]
    async fn test_disconnect_releases_subscriptions() {
        let hub = TestHub::start(Duration::from_secs(15)).await;
        let mut client = authenticated(&hub).await;
        client.subscribe("*").await;
        client.subscribe("update").await;
        client.subscribe("update:count").await;
        assert!(hub.eventually(|h| h.machine.bus().listener_count() == 3).await);

        drop(client);

        assert!(hub.eventually(|h| h.machine.bus().listener_count() == 0).await);
        assert!(hub.eventually(|h| h.gateway.connections().connection_count() == 0).await);
        hub.stop().await;
    }
}
