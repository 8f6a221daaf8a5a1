//! End-to-end tests against a real TCP listener.
//!
//! Tests CAN use `.unwrap()` and `.expect()`.

use std::time::Duration;

use simview_client::{ClientConfig, SimClient};
use simview_core::ConnectionState;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use tokio::time::timeout;

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

fn config_for(port: u16) -> ClientConfig {
    ClientConfig {
        host: "127.0.0.1".to_string(),
        port,
        connect_retry_delay: Duration::from_millis(20),
        reconnect_delay: Duration::from_millis(50),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_tcp_frame_and_command() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        let (reader, mut writer) = socket.into_split();
        writer
            .write_all(
                b"CONFIG;20;10\r\n\
                  AGENT;Alice;1;1;50;10;100;Sain;0.0\r\n\
                  AGENT;Bob;4;5;10;80;5;Mort;1.5\r\n\
                  LOISIR;3;3;0\r\n\
                  STATS;30;45;52.5;1;1;0\r\n\
                  END\r\n",
            )
            .await
            .unwrap();

        let mut lines = BufReader::new(reader).lines();
        let command = lines.next_line().await.unwrap();
        // Keep the socket open until the command has been read
        drop(writer);
        command
    });

    let client = SimClient::spawn(config_for(port));
    let mut snapshots = client.store().subscribe();
    timeout(WAIT_TIMEOUT, snapshots.wait_for(|s| s.sequence() == 1))
        .await
        .expect("frame should arrive")
        .unwrap();

    let snapshot = client.latest();
    assert_eq!(client.grid().width, 20);
    assert_eq!(client.grid().height, 10);
    assert_eq!(snapshot.agents().len(), 2);
    assert_eq!(snapshot.places().len(), 1);
    assert!(snapshot.received_at().is_some());
    let counts = snapshot.condition_counts();
    assert_eq!((counts.healthy, counts.dead), (1, 1));

    assert!(client.commands().stop());
    let received = timeout(WAIT_TIMEOUT, server).await.unwrap().unwrap();
    assert_eq!(received.as_deref(), Some("STOP"));

    client.shutdown().await;
}

#[tokio::test]
async fn test_tcp_reconnects_after_server_restart() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let client = SimClient::spawn(config_for(port));

    // First session: one frame, then hang up
    let (mut socket, _) = timeout(WAIT_TIMEOUT, listener.accept()).await.unwrap().unwrap();
    socket.write_all(b"END\n").await.unwrap();
    let mut snapshots = client.store().subscribe();
    timeout(WAIT_TIMEOUT, snapshots.wait_for(|s| s.sequence() == 1))
        .await
        .unwrap()
        .unwrap();
    drop(socket);

    // Second session on the same listener
    let (mut socket, _) = timeout(WAIT_TIMEOUT, listener.accept()).await.unwrap().unwrap();
    assert!(client.wait_connected(WAIT_TIMEOUT).await);
    socket
        .write_all(b"AGENT;Carol;2;2;60;5;10;Repos;0\nEND\n")
        .await
        .unwrap();
    timeout(WAIT_TIMEOUT, snapshots.wait_for(|s| s.sequence() == 2))
        .await
        .unwrap()
        .unwrap();

    assert!(client.latest().agent("Carol").is_some());
    assert_eq!(client.connection_state(), ConnectionState::Connected);

    client.shutdown().await;
}
