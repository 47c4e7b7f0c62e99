//! End-to-end tests driving both front-ends of a running simulator.

use scale::Scale;
use serde_json::{json, Value};
use server::{Server, ServerConfig, ServerHandle, SimulatorServer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;

struct Running {
    tcp: SocketAddr,
    http: SocketAddr,
    token: CancellationToken,
    handle: tokio::task::JoinHandle<server::Result<()>>,
}

impl Running {
    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.http, path)
    }

    async fn stop(self) {
        self.token.cancel();
        let stopped = tokio::time::timeout(Duration::from_secs(10), self.handle).await;
        assert!(
            matches!(stopped, Ok(Ok(Ok(())))),
            "simulator should stop cleanly"
        );
    }
}

async fn start(scale: Arc<Scale>) -> Running {
    let config =
        ServerConfig::new("127.0.0.1", 0, 0).with_shutdown_grace(Duration::from_millis(500));
    let server = Arc::new(SimulatorServer::new(config, scale));

    let token = CancellationToken::new();
    let handle = {
        let server = Arc::clone(&server);
        let token = token.clone();
        tokio::spawn(async move { server.run(token).await })
    };

    for _ in 0..200 {
        if let (Some(tcp), Some(http)) = (server.tcp_address(), server.http_address()) {
            return Running {
                tcp,
                http,
                token,
                handle,
            };
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("simulator did not bind both ports");
}

async fn connect(addr: SocketAddr) -> BufReader<TcpStream> {
    BufReader::new(TcpStream::connect(addr).await.unwrap())
}

async fn send(client: &mut BufReader<TcpStream>, line: &str) -> String {
    client
        .get_mut()
        .write_all(format!("{}\r\n", line).as_bytes())
        .await
        .unwrap();
    let mut response = String::new();
    client.read_line(&mut response).await.unwrap();
    response
}

#[tokio::test]
async fn test_end_to_end_weighing() {
    let running = start(Arc::new(Scale::new(0.0, true))).await;
    let http = reqwest::Client::new();
    let mut client = connect(running.tcp).await;

    assert_eq!(send(&mut client, "T").await, "T A\r\n");
    assert_eq!(send(&mut client, "S").await, "S S 0.00 g\r\n");

    let response = http
        .post(running.url("/state"))
        .json(&json!({ "weight": 5.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    assert_eq!(send(&mut client, "S").await, "S S 5.00 g\r\n");

    let state: Value = http
        .get(running.url("/state"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["weight"], json!(5.0));
    assert_eq!(state["netWeight"], json!(5.0));
    assert_eq!(state["lastCommand"], json!("S"));
    assert_eq!(state["lastResponse"], json!("S S 5.00 g"));

    drop(client);
    running.stop().await;
}

#[tokio::test]
async fn test_tare_and_zero_over_tcp() {
    let scale = Arc::new(Scale::new(10.0, true));
    let running = start(Arc::clone(&scale)).await;
    let mut client = connect(running.tcp).await;

    assert_eq!(send(&mut client, "TA 2.346").await, "TA A\r\n");
    assert_eq!(send(&mut client, "TA").await, "TA A 2.35 g\r\n");
    assert_eq!(send(&mut client, "S").await, "S S 7.65 g\r\n");
    assert_eq!(send(&mut client, "TA abc").await, "EL\r\n");
    assert_eq!(send(&mut client, "TA").await, "TA A 2.35 g\r\n");

    assert_eq!(send(&mut client, "Z").await, "Z A\r\n");
    assert_eq!(send(&mut client, "Z").await, "Z A\r\n");
    assert_eq!(send(&mut client, "S").await, "S S 0.00 g\r\n");
    assert_eq!(send(&mut client, "TA").await, "TA A 0.00 g\r\n");

    assert_eq!(send(&mut client, "FOO").await, "ES\r\n");
    assert_eq!(scale.snapshot().weight, 0.0);

    drop(client);
    running.stop().await;
}

#[tokio::test]
async fn test_stability_reported_by_s_but_not_si() {
    let running = start(Arc::new(Scale::new(1.5, true))).await;
    let http = reqwest::Client::new();
    let mut client = connect(running.tcp).await;

    assert_eq!(send(&mut client, "S").await, "S S 1.50 g\r\n");
    assert_eq!(send(&mut client, "SI").await, "S D 1.50 g\r\n");

    http.post(running.url("/state/"))
        .json(&json!({ "stable": false }))
        .send()
        .await
        .unwrap();
    assert_eq!(send(&mut client, "S").await, "S D 1.50 g\r\n");

    drop(client);
    running.stop().await;
}

#[tokio::test]
async fn test_concurrent_clients_each_get_a_response() {
    const CLIENTS: usize = 16;

    let scale = Arc::new(Scale::new(0.0, true));
    let running = start(Arc::clone(&scale)).await;

    let tasks: Vec<_> = (0..CLIENTS)
        .map(|i| {
            let addr = running.tcp;
            tokio::spawn(async move {
                let mut client = connect(addr).await;
                send(&mut client, &format!("TA {}", i)).await
            })
        })
        .collect();

    let mut responses = Vec::new();
    for task in tasks {
        responses.push(task.await.unwrap());
    }

    assert_eq!(responses.len(), CLIENTS);
    assert!(responses.iter().all(|response| response == "TA A\r\n"));

    // Final tare is whichever command ran last, paired with its response
    let snapshot = scale.snapshot();
    let last = snapshot.last_command.expect("a command was recorded");
    let value: f64 = last.trim_start_matches("TA ").parse().unwrap();
    assert_eq!(snapshot.tare, value);
    assert_eq!(snapshot.last_response.as_deref(), Some("TA A"));

    let mut client = connect(running.tcp).await;
    assert_eq!(
        send(&mut client, "TA").await,
        format!("TA A {:.2} g\r\n", value)
    );
    drop(client);

    running.stop().await;
}

#[tokio::test]
async fn test_control_plane_validation() {
    let scale = Arc::new(Scale::new(0.0, true));
    let running = start(Arc::clone(&scale)).await;
    let http = reqwest::Client::new();

    let response = http
        .post(running.url("/state"))
        .json(&json!({ "pieces": -5 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let state: Value = http
        .get(running.url("/state"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(state["pieces"], json!(0));

    let response = http
        .post(running.url("/state"))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "invalid json payload" }));

    let response = http.get(running.url("/other")).send().await.unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "not found" }));

    let response = http.put(running.url("/state")).send().await.unwrap();
    assert_eq!(response.status(), 404);

    running.stop().await;
}

#[tokio::test]
async fn test_spawned_simulator_stops_on_cancel() {
    let config = ServerConfig::new("127.0.0.1", 0, 0);
    let server = SimulatorServer::new(config, Arc::new(Scale::default()));
    assert_eq!(server.name(), "mtsim");

    let handle = ServerHandle::spawn(server, CancellationToken::new());
    tokio::time::sleep(Duration::from_millis(100)).await;

    let result = tokio::time::timeout(Duration::from_secs(10), handle.stop())
        .await
        .expect("simulator should stop");
    assert!(result.is_ok());
}
