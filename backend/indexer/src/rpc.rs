//! Soroban RPC client: polls `getEvents` and decodes investment handler events.
//!
//! ## Resilience
//!
//! * Transport errors, HTTP 429 and soft JSON-RPC errors are retried with
//!   exponential back-off from [`INITIAL_BACKOFF_SECS`] up to [`MAX_BACKOFF_SECS`].
//! * `-32600` (invalid request) and `-32601` (unknown method) are returned
//!   immediately; retrying cannot fix them.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, HandlerEvent};

const MAX_BACKOFF_SECS: u64 = 60;
const INITIAL_BACKOFF_SECS: u64 = 2;

// ─────────────────────────────────────────────────────────
// JSON-RPC response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    pub result: Option<EventsResult>,
    pub error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct EventsResult {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    #[serde(rename = "latestLedger")]
    pub latest_ledger: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawEvent {
    /// Topic list, one JSON-encoded `ScVal` per entry
    pub topic: Vec<String>,
    /// Event data as decoded by the RPC
    pub value: Value,
    #[serde(rename = "contractId")]
    pub contract_id: Option<String>,
    #[serde(rename = "txHash")]
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    #[serde(rename = "ledgerClosedAt")]
    pub ledger_closed_at: Option<String>,
    #[serde(rename = "inSuccessfulContractCall")]
    pub in_successful_contract_call: Option<bool>,
}

/// One page of `getEvents` output.
#[derive(Debug, Default)]
pub struct EventsPage {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

/// Doubling delay, capped at [`MAX_BACKOFF_SECS`].
struct Backoff {
    secs: u64,
}

impl Backoff {
    fn new() -> Self {
        Self {
            secs: INITIAL_BACKOFF_SECS,
        }
    }

    async fn wait(&mut self) {
        tokio::time::sleep(Duration::from_secs(self.secs)).await;
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
    }
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of contract events.
///
/// With a `cursor`, pagination continues from it and `start_ledger` is
/// ignored; otherwise the scan starts at `start_ledger` (inclusive).
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<EventsPage> {
    let mut backoff = Backoff::new();
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "getEvents",
        "params": build_params(contract_id, start_ledger, cursor, limit),
    });

    loop {
        let resp = match client.post(rpc_url).json(&request).send().await {
            Ok(resp) => resp,
            Err(e) => {
                warn!(retry_in = backoff.secs, "getEvents request failed: {e}");
                backoff.wait().await;
                continue;
            }
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!(retry_in = backoff.secs, "rate-limited by RPC");
            backoff.wait().await;
            continue;
        }

        let body: RpcResponse = resp.json().await?;

        if let Some(err) = body.error {
            if err.code == -32600 || err.code == -32601 {
                return Err(IndexerError::Rpc {
                    code: err.code,
                    message: err.message,
                });
            }
            warn!(
                retry_in = backoff.secs,
                code = err.code,
                "RPC soft error: {}",
                err.message
            );
            backoff.wait().await;
            continue;
        }

        let result = body
            .result
            .ok_or_else(|| IndexerError::EventParse("empty result from getEvents".to_string()))?;

        debug!(
            count = result.events.len(),
            latest_ledger = ?result.latest_ledger,
            "fetched events page"
        );

        return Ok(EventsPage {
            events: result.events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [{ "type": "contract", "contractIds": [contract_id] }],
        "pagination": { "limit": limit },
    });

    match cursor {
        Some(cur) => params["pagination"]["cursor"] = json!(cur),
        None => params["startLedger"] = json!(start_ledger),
    }
    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Decode raw RPC events into [`HandlerEvent`]s.
///
/// Events from failed contract calls are dropped.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<HandlerEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call != Some(false))
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

/// Fields pulled out of a single event's topics and data.
#[derive(Debug, Default, PartialEq)]
struct Decoded {
    round_id: Option<String>,
    identity: Option<String>,
    actor: Option<String>,
    amount: Option<String>,
    detail: Option<String>,
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<HandlerEvent> {
    let kind = EventKind::from_topic(&scalar_string(raw.topic.first()?)?);
    if kind == EventKind::Unknown {
        debug!(topic = ?raw.topic.first(), "skipping unrecognised event");
    }

    let fields = decode_fields(kind, &raw.topic, &raw.value);

    Some(HandlerEvent {
        event_type: kind.as_str().to_string(),
        event_id: raw.id.clone(),
        round_id: fields.round_id,
        identity: fields.identity,
        actor: fields.actor,
        amount: fields.amount,
        detail: fields.detail,
        ledger: raw.ledger.unwrap_or(0) as i64,
        timestamp: raw
            .ledger_closed_at
            .as_deref()
            .and_then(parse_iso_to_unix)
            .unwrap_or(0),
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

fn decode_fields(kind: EventKind, topic: &[String], data: &Value) -> Decoded {
    let key = topic.get(1).and_then(|t| scalar_string(t));
    let mut out = Decoded::default();

    if kind.keyed_by_round() {
        out.round_id = key.clone().or_else(|| field(data, "round_id"));
    }

    match kind {
        EventKind::RoundCreated => {
            out.amount = field(data, "total_allocated");
            out.detail = field(data, "signer").and_then(|s| normalize_signer(&s));
        }
        EventKind::PhaseChanged => out.detail = field(data, "phase"),
        EventKind::RewardTokenSet => out.detail = field(data, "token"),
        EventKind::RewardAllocationSet => out.amount = field(data, "allocation"),
        EventKind::Invested => {
            out.identity = field(data, "identity");
            out.actor = field(data, "caller");
            out.amount = field(data, "amount");
        }
        EventKind::RewardDeposited => {
            out.actor = field(data, "depositor");
            out.amount = field(data, "amount");
        }
        EventKind::Claimed => {
            out.identity = field(data, "identity");
            out.actor = field(data, "recipient");
            out.amount = field(data, "amount");
        }
        EventKind::PaymentWithdrawn => {
            out.actor = field(data, "recipient");
            out.amount = field(data, "amount");
        }
        EventKind::LinkAdded | EventKind::LinkRemoved => {
            out.identity = key.or_else(|| field(data, "canonical"));
            out.actor = field(data, "delegate");
        }
        EventKind::RoleSet | EventKind::RoleDel => {
            // Topics: (symbol, target[, role]); data is the acting admin.
            out.identity = key;
            out.detail = topic.get(2).and_then(|t| scalar_string(t));
            out.actor = scalar(data);
        }
        EventKind::Unknown => {}
    }
    out
}

/// Render a JSON scalar, or the `value` of a `{"type":…,"value":…}` wrapper.
fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Object(map) => map.get("value").and_then(scalar),
        Value::Array(items) if items.len() == 1 => scalar(&items[0]),
        _ => None,
    }
}

fn field(data: &Value, key: &str) -> Option<String> {
    data.get(key).and_then(scalar)
}

/// Decode a topic entry, which the RPC may deliver as a JSON-encoded `ScVal`
/// or as the bare string.
fn scalar_string(raw: &str) -> Option<String> {
    match serde_json::from_str::<Value>(raw) {
        Ok(v) => scalar(&v),
        Err(_) => Some(raw.to_string()),
    }
}

/// Render a 20-byte signer address as `0x`-prefixed lowercase hex. Accepts hex
/// (with or without `0x`) or base64.
pub fn normalize_signer(raw: &str) -> Option<String> {
    let bytes = hex::decode(raw.trim_start_matches("0x"))
        .ok()
        .filter(|b| b.len() == 20)
        .or_else(|| BASE64.decode(raw).ok().filter(|b| b.len() == 20))?;
    Some(format!("0x{}", hex::encode(bytes)))
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
