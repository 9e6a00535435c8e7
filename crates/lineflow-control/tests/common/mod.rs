//! In-process fixture controller for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use lineflow_control::DeviceConfig;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::UdpSocket;

pub const TOKEN: &str = "test-token";

/// Segment ids in layout order. Angle order is 100..=108.
pub const LAYOUT_ORDER: [u16; 9] = [105, 100, 108, 103, 101, 107, 102, 106, 104];

#[derive(Default)]
pub struct Behaviour {
    pub reject_ext_control: bool,
    pub custom_delay: Option<Duration>,
    pub fail_info: bool,
    pub pairing_open: bool,
    pub global_on: bool,
    pub report_stream_port: bool,
    /// Every token is rejected, as after a factory reset.
    pub revoke_token: bool,
    /// Device info answers 200 with a body that is not JSON.
    pub garble_info: bool,
}

#[derive(Default)]
pub struct Recorded {
    pub effects: Vec<Value>,
    pub state_writes: Vec<Value>,
    pub pair_requests: usize,
}

struct Shared {
    behaviour: Mutex<Behaviour>,
    recorded: Mutex<Recorded>,
    stream_port: u16,
}

pub struct MockDevice {
    pub addr: SocketAddr,
    pub udp: UdpSocket,
    shared: Arc<Shared>,
}

impl MockDevice {
    pub async fn start() -> Self {
        Self::start_with(Behaviour {
            global_on: true,
            report_stream_port: true,
            ..Behaviour::default()
        })
        .await
    }

    pub async fn start_with(behaviour: Behaviour) -> Self {
        let udp = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let shared = Arc::new(Shared {
            behaviour: Mutex::new(behaviour),
            recorded: Mutex::new(Recorded::default()),
            stream_port: udp.local_addr().unwrap().port(),
        });

        let app = Router::new()
            .route("/api/v1/new", post(pair))
            .route("/api/v1/:token", get(info))
            .route("/api/v1/:token/panelLayout/layout", get(layout))
            .route("/api/v1/:token/state", put(write_state))
            .route("/api/v1/:token/effects", put(write_effect))
            .with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, udp, shared }
    }

    pub fn config(&self) -> DeviceConfig {
        self.config_with_token(TOKEN)
    }

    pub fn config_with_token(&self, token: &str) -> DeviceConfig {
        let mut config = DeviceConfig::new("127.0.0.1", token);
        config.port = self.addr.port();
        config.stream_port = self.shared.stream_port;
        config
    }

    pub fn behaviour(&self) -> parking_lot::MutexGuard<'_, Behaviour> {
        self.shared.behaviour.lock()
    }

    pub fn effects(&self) -> Vec<Value> {
        self.shared.recorded.lock().effects.clone()
    }

    /// `animData` strings of every custom animation written so far.
    pub fn custom_anims(&self) -> Vec<String> {
        self.effects()
            .iter()
            .filter(|e| e["write"]["animType"] == "custom")
            .filter_map(|e| e["write"]["animData"].as_str().map(str::to_string))
            .collect()
    }

    pub fn state_writes(&self) -> Vec<Value> {
        self.shared.recorded.lock().state_writes.clone()
    }

    pub fn pair_requests(&self) -> usize {
        self.shared.recorded.lock().pair_requests
    }

    pub async fn recv_datagram(&self) -> Vec<u8> {
        let mut buf = [0u8; 2048];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), self.udp.recv_from(&mut buf))
            .await
            .expect("no datagram within 2s")
            .unwrap();
        buf[..len].to_vec()
    }
}

/// Address of a port nothing listens on.
pub async fn closed_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Nine segments on a ring at 10, 50, ... 330 degrees, scrambled, with a
/// connector after each and the controller last.
pub fn ring_layout() -> Value {
    let mut position_data = Vec::new();
    for id in LAYOUT_ORDER {
        let k = (id - 100) as f64;
        let angle = (10.0 + 40.0 * k).to_radians();
        position_data.push(json!({
            "panelId": id,
            "x": 1000.0 * angle.cos(),
            "y": 1000.0 * angle.sin(),
            "o": 0,
            "shapeType": 18
        }));
        position_data.push(json!({ "panelId": id + 100, "x": 0, "y": 0, "o": 0, "shapeType": 16 }));
    }
    position_data.push(json!({ "panelId": 1, "x": 0, "y": 0, "o": 0, "shapeType": 19 }));

    json!({
        "numPanels": position_data.len(),
        "sideLength": 0,
        "positionData": position_data
    })
}

async fn layout(State(shared): State<Arc<Shared>>, Path(token): Path<String>) -> Response {
    if token != TOKEN || shared.behaviour.lock().revoke_token {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(ring_layout()).into_response()
}

async fn info(State(shared): State<Arc<Shared>>, Path(token): Path<String>) -> Response {
    if token != TOKEN {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    let behaviour = shared.behaviour.lock();
    if behaviour.revoke_token {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if behaviour.fail_info {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if behaviour.garble_info {
        return (StatusCode::OK, "<html>busy</html>").into_response();
    }
    let mut body = json!({
        "name": "Lines 1A2B",
        "model": "NL59",
        "firmwareVersion": "9.2.4",
        "state": {
            "on": { "value": behaviour.global_on },
            "brightness": { "value": 80, "max": 100, "min": 0 }
        }
    });
    if behaviour.report_stream_port {
        body["streamControlPort"] = json!(shared.stream_port);
    }
    Json(body).into_response()
}

async fn write_state(
    State(shared): State<Arc<Shared>>,
    Path(token): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    if token != TOKEN {
        return StatusCode::UNAUTHORIZED;
    }
    if let Some(on) = body["on"]["value"].as_bool() {
        shared.behaviour.lock().global_on = on;
    }
    shared.recorded.lock().state_writes.push(body);
    StatusCode::NO_CONTENT
}

async fn write_effect(
    State(shared): State<Arc<Shared>>,
    Path(token): Path<String>,
    Json(body): Json<Value>,
) -> StatusCode {
    if token != TOKEN {
        return StatusCode::UNAUTHORIZED;
    }
    let anim_type = body["write"]["animType"].as_str().unwrap_or_default().to_string();
    shared.recorded.lock().effects.push(body);

    let (reject, delay) = {
        let behaviour = shared.behaviour.lock();
        (behaviour.reject_ext_control, behaviour.custom_delay)
    };
    match anim_type.as_str() {
        "extControl" if reject => StatusCode::BAD_REQUEST,
        "custom" => {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            StatusCode::NO_CONTENT
        }
        _ => StatusCode::OK,
    }
}

async fn pair(State(shared): State<Arc<Shared>>) -> Response {
    shared.recorded.lock().pair_requests += 1;
    if !shared.behaviour.lock().pairing_open {
        return StatusCode::FORBIDDEN.into_response();
    }
    Json(json!({ "auth_token": "fresh-token" })).into_response()
}
