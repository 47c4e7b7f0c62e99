//! HTTP control plane for the simulated balance
//!
//! Test harnesses use it to read the full state and to script what the
//! instrument reports (weight, stability, tare, piece count) without going
//! through MT-SICS.
//!
//! # Endpoints
//!
//! - `GET /state` - current [`StateSnapshot`] as JSON
//! - `POST /state` - apply a partial update, e.g. `{"weight": 5.0}`
//!
//! A trailing slash is accepted on both and the query string is ignored, so
//! `GET /state?x=1` is the same request as `GET /state`. Every other path or
//! method answers `404 {"error": "not found"}`.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    routing::{get, MethodRouter},
    Json, Router,
};
use scale::{Scale, StateSnapshot};
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

/// Path of the state resource
pub const STATE_PATH: &str = "/state";

/// Errors returned by the control endpoints
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ControlError {
    #[error("not found")]
    NotFound,

    #[error("invalid content length")]
    InvalidContentLength,

    #[error("invalid json payload")]
    InvalidJson,

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("{field} must be {expected}")]
    InvalidField {
        field: &'static str,
        expected: &'static str,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl ControlError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

/// Body of every failed control request
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ErrorReply = (StatusCode, Json<ErrorResponse>);

impl From<ControlError> for ErrorReply {
    fn from(err: ControlError) -> Self {
        (
            err.status(),
            Json(ErrorResponse {
                error: err.to_string(),
            }),
        )
    }
}

/// One field of a `POST /state` body after coercion
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StateUpdate {
    Weight(f64),
    Stable(bool),
    Tare(f64),
    Pieces(i64),
}

impl StateUpdate {
    /// Coerce a body field. Unknown keys yield `Ok(None)`.
    pub fn from_field(key: &str, value: &Value) -> Result<Option<Self>, ControlError> {
        let update = match key {
            "weight" => Self::Weight(coerce_f64(value).ok_or(ControlError::InvalidField {
                field: "weight",
                expected: "numeric",
            })?),
            "tare" => Self::Tare(coerce_f64(value).ok_or(ControlError::InvalidField {
                field: "tare",
                expected: "numeric",
            })?),
            "pieces" => Self::Pieces(coerce_i64(value).ok_or(ControlError::InvalidField {
                field: "pieces",
                expected: "integer",
            })?),
            "stable" => Self::Stable(truthy(value)),
            _ => return Ok(None),
        };
        Ok(Some(update))
    }

    pub fn apply(&self, scale: &Scale) {
        match *self {
            Self::Weight(weight) => scale.set_weight(weight),
            Self::Stable(stable) => scale.set_stable(stable),
            Self::Tare(tare) => scale.set_tare(tare),
            Self::Pieces(count) => scale.set_piece_count(count),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::Weight(_) => "weight",
            Self::Stable(_) => "stable",
            Self::Tare(_) => "tare",
            Self::Pieces(_) => "pieces",
        }
    }

    /// The coerced value as it is echoed in the `POST` response
    pub fn value(&self) -> Value {
        match *self {
            Self::Weight(v) | Self::Tare(v) => json!(v),
            Self::Stable(stable) => Value::Bool(stable),
            Self::Pieces(count) => json!(count),
        }
    }
}

/// Numbers, numeric strings and booleans; non-finite results are rejected.
fn coerce_f64(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

/// Integers, floats (truncated toward zero), integer strings and booleans.
fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite())
                .map(|f| f.trunc() as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Build the control router around the shared scale
///
/// Routing matches on the path alone; query parameters never reach a handler.
pub fn control_routes(scale: Arc<Scale>) -> Router {
    fn state_route() -> MethodRouter<Arc<Scale>> {
        get(get_state).post(update_state).fallback(not_found)
    }

    Router::new()
        .route(STATE_PATH, state_route())
        .route("/state/", state_route())
        .fallback(not_found)
        .with_state(scale)
}

async fn get_state(State(scale): State<Arc<Scale>>) -> Json<StateSnapshot> {
    Json(scale.snapshot())
}

/// Apply body fields in wire order, stopping at the first invalid one.
///
/// Fields applied before the failure stay applied.
async fn update_state(
    State(scale): State<Arc<Scale>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ErrorReply> {
    apply_updates(&scale, &headers, &body)
        .map(Json)
        .map_err(ErrorReply::from)
}

fn apply_updates(scale: &Scale, headers: &HeaderMap, body: &[u8]) -> Result<Value, ControlError> {
    if let Some(length) = headers.get(header::CONTENT_LENGTH) {
        length
            .to_str()
            .ok()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .ok_or(ControlError::InvalidContentLength)?;
    }

    let payload: Value = serde_json::from_slice(body).map_err(|e| {
        debug!(%e, "Rejected control payload");
        ControlError::InvalidJson
    })?;
    let fields = match payload {
        Value::Object(fields) => fields,
        _ => return Err(ControlError::NotAnObject),
    };

    let mut applied = Map::new();
    for (key, value) in &fields {
        let update = match StateUpdate::from_field(key, value) {
            Ok(Some(update)) => update,
            Ok(None) => continue,
            Err(e) => {
                warn!(field = key.as_str(), %e, "Control update stopped");
                return Err(e);
            }
        };
        update.apply(scale);
        debug!(field = update.field(), value = %update.value(), "Control update applied");
        applied.insert(update.field().to_string(), update.value());
    }

    let mut response = match serde_json::to_value(scale.snapshot()) {
        Ok(Value::Object(snapshot)) => snapshot,
        Ok(_) => return Err(ControlError::Internal("snapshot is not an object".into())),
        Err(e) => return Err(ControlError::Internal(e.to_string())),
    };
    response.extend(applied);

    Ok(Value::Object(response))
}

async fn not_found() -> ErrorReply {
    ControlError::NotFound.into()
}
