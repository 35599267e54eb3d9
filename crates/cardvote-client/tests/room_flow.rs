use cardvote_client::{wait_for_result, LivenessProbe, VotingClient, WsVotingClient};
use cardvote_server::{RoomServer, ServerConfig, ServerEvent};
use cardvote_types::{RoomId, UserId};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::time::timeout;

struct TestServer {
    backend_url: String,
    shutdown: Option<oneshot::Sender<()>>,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

async fn start_server() -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    let server = RoomServer::with_config(ServerConfig::new().with_logging(false));
    tokio::spawn(async move {
        server
            .serve_on_listener(listener, async {
                let _ = rx.await;
            })
            .await
            .unwrap();
    });

    TestServer {
        backend_url: format!("ws://{}", addr),
        shutdown: Some(tx),
    }
}

async fn join(server: &TestServer, room: &str, user: &str) -> anyhow::Result<WsVotingClient> {
    WsVotingClient::connect(
        &server.backend_url,
        RoomId::parse(room).unwrap(),
        UserId::parse(user).unwrap(),
    )
    .await
}

async fn wait_for_users(client: &mut WsVotingClient, expected: usize) {
    loop {
        let event = timeout(Duration::from_secs(5), client.next_event())
            .await
            .expect("no room event")
            .unwrap()
            .expect("connection closed");
        if let ServerEvent::UsersUpdated { users } = event {
            assert!(users.iter().all(|u| !u.submitted));
            if users.len() == expected {
                return;
            }
        }
    }
}

#[tokio::test]
async fn two_players_complete_a_vote() {
    let server = start_server().await;
    // digit 1: two players, two cards each
    let mut alice = join(&server, "1roomabc", "alice").await.unwrap();
    // fixes the join order the logs are reported in
    wait_for_users(&mut alice, 1).await;
    let mut bob = join(&server, "1roomabc", "bob").await.unwrap();
    wait_for_users(&mut alice, 2).await;

    alice.update_user_name("Alice").await.unwrap();
    bob.update_user_name("Bob").await.unwrap();
    alice
        .submit_selections(vec!["Smithy".into(), "Village".into()])
        .await
        .unwrap();
    bob.submit_selections(vec!["Village".into(), "Moat".into()])
        .await
        .unwrap();

    for client in [&mut alice, &mut bob] {
        let result = timeout(Duration::from_secs(5), wait_for_result(client, |_| {}))
            .await
            .expect("vote did not complete in time")
            .unwrap();

        match result {
            Some(ServerEvent::VotingCompleted { cards, logs }) => {
                assert_eq!(cards, vec!["Smithy", "Village", "Moat"]);
                assert_eq!(
                    logs,
                    vec![
                        "Aliceは「Smithy」と「Village」を指定しました。",
                        "Bobは「Village」と「Moat」を指定しました。",
                    ]
                );
            }
            other => panic!("Expected voting completed, got {:?}", other),
        }
    }

    alice.close().await.unwrap();
    bob.close().await.unwrap();
}

#[tokio::test]
async fn users_updated_reaches_everyone() {
    let server = start_server().await;
    let mut alice = join(&server, "4roomabc", "alice").await.unwrap();
    let _bob = join(&server, "4roomabc", "bob").await.unwrap();

    wait_for_users(&mut alice, 2).await;
}

/// HTTP status of a handshake the service refused before upgrading.
async fn handshake_status(server: &TestServer, path: &str) -> u16 {
    match tokio_tungstenite::connect_async(format!("{}{}", server.backend_url, path)).await {
        Err(tokio_tungstenite::tungstenite::Error::Http(response)) => response.status().as_u16(),
        Err(e) => panic!("unexpected handshake error for {}: {}", path, e),
        Ok(_) => panic!("handshake for {} was accepted", path),
    }
}

#[tokio::test]
async fn full_room_and_bad_room_ids_are_rejected() {
    let server = start_server().await;
    // digit 0: two players
    let mut alice = join(&server, "0roomabc", "alice").await.unwrap();
    let _bob = join(&server, "0roomabc", "bob").await.unwrap();
    wait_for_users(&mut alice, 2).await;

    assert_eq!(handshake_status(&server, "/0roomabc/carol").await, 409);
    assert!(join(&server, "0roomabc", "carol").await.is_err());
    assert!(join(&server, "0roomabc", "alice").await.is_ok());

    // no leading digit, so no room rules
    assert_eq!(handshake_status(&server, "/roomabc/eve").await, 400);
}

#[tokio::test]
async fn liveness_probe_and_overview() {
    let server = start_server().await;
    let probe = LivenessProbe::new(&server.backend_url)
        .with_attempts(3)
        .with_interval(Duration::from_millis(50));
    probe.check().await.unwrap();

    let _alice = join(&server, "2roomabc", "alice").await.unwrap();
    let mut overview = probe.overview().await.unwrap();
    // the join broadcast can race the listing
    for _ in 0..20 {
        if overview.contains_key("2roomabc") {
            break;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
        overview = probe.overview().await.unwrap();
    }
    assert_eq!(overview["2roomabc"], vec!["alice".to_string()]);
}
