//! Soroban RPC client — polls `getEvents` and decodes crowdfund events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{CrowdfundEvent, EventKind};
use crate::xdr::{self, TopicValue};

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
#[allow(dead_code)]
pub struct RawEvent {
    /// Base64 XDR topics, sent by RPCs that ignore `xdrFormat`.
    #[serde(default)]
    pub topic: Vec<String>,
    /// Topics in JSON form.
    #[serde(rename = "topicJson", default)]
    pub topic_json: Vec<Value>,
    /// Base64 XDR event data, or an already-plain JSON value.
    #[serde(default)]
    pub value: Value,
    /// Event data in JSON form.
    #[serde(rename = "valueJson")]
    pub value_json: Option<Value>,
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
    #[serde(rename = "pagingToken")]
    pub paging_token: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger` — the ledger sequence to scan from (inclusive).
/// * `cursor`       — optional opaque pagination cursor from a previous response.
/// * `limit`        — maximum number of events to return.
///
/// Returns `(events, next_cursor, latest_ledger)`.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
) -> Result<(Vec<RawEvent>, Option<String>, Option<u64>)> {
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
                backoff.wait(&format!("RPC request failed: {e}")).await;
                continue;
            }
        };
        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            backoff.wait("Rate-limited by RPC").await;
            continue;
        }

        let body: RpcResponse = resp.json().await?;
        if let Some(err) = body.error {
            // Malformed request or unknown method will not get better on retry.
            if err.code == -32600 || err.code == -32601 {
                return Err(IndexerError::EventParse(format!(
                    "RPC hard error {}: {}",
                    err.code, err.message
                )));
            }
            backoff
                .wait(&format!("RPC soft error: {} {}", err.code, err.message))
                .await;
            continue;
        }

        let result = body.result.ok_or_else(|| {
            IndexerError::EventParse("Empty result from getEvents".to_string())
        })?;
        debug!(
            "Fetched {} events (latest_ledger={:?})",
            result.events.len(),
            result.latest_ledger
        );
        return Ok((result.events, result.cursor, result.latest_ledger));
    }
}

/// Doubling retry delay, capped at [`MAX_BACKOFF_SECS`].
struct Backoff {
    secs: u64,
}

impl Backoff {
    fn new() -> Self {
        Self {
            secs: INITIAL_BACKOFF_SECS,
        }
    }

    async fn wait(&mut self, reason: &str) {
        warn!("{reason} (will retry in {}s)", self.secs);
        tokio::time::sleep(Duration::from_secs(self.secs)).await;
        self.secs = (self.secs * 2).min(MAX_BACKOFF_SECS);
    }
}

fn build_params(contract_id: &str, start_ledger: u32, cursor: Option<&str>, limit: u32) -> Value {
    let mut params = json!({
        "filters": [
            {
                "type": "contract",
                "contractIds": [contract_id]
            }
        ],
        "pagination": {
            "limit": limit
        },
        "xdrFormat": "json"
    });

    if let Some(cur) = cursor {
        params["pagination"]["cursor"] = json!(cur);
    } else {
        params["startLedger"] = json!(start_ledger);
    }

    params
}

// ─────────────────────────────────────────────────────────
// Event decoding
// ─────────────────────────────────────────────────────────

/// Fields pulled out of an event's data payload.
#[derive(Debug, Default, PartialEq, Eq)]
struct DecodedData {
    actor: Option<String>,
    amount: Option<String>,
    phase_id: Option<i64>,
    end_time: Option<i64>,
}

/// Decode a list of raw RPC events into [`CrowdfundEvent`] structs.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<CrowdfundEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call.unwrap_or(true))
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<CrowdfundEvent> {
    let (symbol, project_id) = if raw.topic_json.is_empty() {
        (
            extract_symbol(raw.topic.first()?),
            raw.topic.get(1).map(|t| extract_u64_or_raw(t)),
        )
    } else {
        (
            json_topic_string(raw.topic_json.first()?)?,
            raw.topic_json.get(1).and_then(json_topic_string),
        )
    };
    let kind = EventKind::from_topic(&symbol);
    if kind == EventKind::Unknown {
        debug!("Unrecognised topic {symbol}");
    }

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    let data = match &raw.value_json {
        Some(value) => decode_data(&xdr::plain(value), kind),
        None => decode_data(&raw.value, kind),
    };

    Some(CrowdfundEvent {
        event_type: kind.as_str().to_string(),
        project_id,
        phase_id: data.phase_id,
        actor: data.actor,
        amount: data.amount,
        end_time: data.end_time,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.as_deref().map(normalize_tx_hash),
    })
}

/// Pull the fields of `kind` out of a flattened payload (see [`xdr::plain`]).
fn decode_data(value: &Value, kind: EventKind) -> DecodedData {
    match kind {
        EventKind::ProjectCreated => DecodedData {
            actor: extract_field(value, &["creator"]).or_else(|| find_nested(value, "creator")),
            amount: extract_field(value, &["goal"]),
            end_time: extract_i64(value, "end_time"),
            ..DecodedData::default()
        },
        EventKind::ProjectFunded | EventKind::FundingReduced => DecodedData {
            actor: extract_field(value, &["funder"]),
            amount: extract_field(value, &["amount"]),
            ..DecodedData::default()
        },
        EventKind::PhaseProposed | EventKind::PhaseReworked => DecodedData {
            amount: extract_field(value, &["amount"]),
            phase_id: extract_i64(value, "phase_id"),
            end_time: extract_i64(value, "end_time"),
            ..DecodedData::default()
        },
        EventKind::VoteCast | EventKind::VoteDelegated => DecodedData {
            actor: extract_field(value, &["voter"]),
            amount: extract_field(value, &["weight"]),
            phase_id: extract_i64(value, "phase_id"),
            ..DecodedData::default()
        },
        EventKind::FundsClaimed => DecodedData {
            actor: extract_field(value, &["creator"]),
            amount: extract_field(value, &["amount"]),
            phase_id: extract_i64(value, "phase_id"),
            ..DecodedData::default()
        },
        EventKind::FundingRefund | EventKind::DevelopmentRefund => DecodedData {
            actor: extract_field(value, &["funder"]),
            amount: extract_field(value, &["amount"]),
            ..DecodedData::default()
        },
        EventKind::ThresholdUpdated => DecodedData {
            amount: scalar_string(value),
            ..DecodedData::default()
        },
        EventKind::AdminTransferred => {
            // Data is the `(previous, admin)` tuple; the new admin is the actor.
            let actor = value
                .as_array()
                .and_then(|pair| pair.get(1))
                .and_then(scalar_string);
            DecodedData {
                actor,
                ..DecodedData::default()
            }
        }
        EventKind::PeriodsUpdated | EventKind::Unknown => DecodedData::default(),
    }
}

fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| value.get(key))
        .find_map(scalar_string)
}

fn extract_i64(value: &Value, key: &str) -> Option<i64> {
    extract_field(value, &[key]).and_then(|s| s.parse().ok())
}

fn find_nested(value: &Value, key: &str) -> Option<String> {
    if let Value::Object(map) = value {
        for (k, v) in map {
            if k == key {
                return v.as_str().map(String::from);
            }
            if let Some(found) = find_nested(v, key) {
                return Some(found);
            }
        }
    }
    None
}

fn json_topic_string(topic: &Value) -> Option<String> {
    match xdr::json_topic(topic)? {
        TopicValue::Symbol(s) => Some(s),
        TopicValue::U64(n) => Some(n.to_string()),
        TopicValue::U32(n) => Some(n.to_string()),
    }
}

/// Extract a Soroban Symbol from a topic entry.
/// The RPC returns base64 XDR by default, `{"type":"symbol","value":"created"}`
/// in JSON mode, or occasionally the bare string.
fn extract_symbol(raw: &str) -> String {
    if let Some(TopicValue::Symbol(s)) = xdr::decode_topic(raw) {
        return s;
    }
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(s) = v.get("value").and_then(|x| x.as_str()) {
            return s.to_string();
        }
    }
    // Fallback: treat the raw string as the symbol
    raw.to_string()
}

/// Extract the project_id from a topic entry that might be XDR, a JSON object or raw number/string.
fn extract_u64_or_raw(raw: &str) -> String {
    match xdr::decode_topic(raw) {
        Some(TopicValue::U64(n)) => return n.to_string(),
        Some(TopicValue::U32(n)) => return n.to_string(),
        _ => {}
    }
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(n) = v.get("value").and_then(|x| x.as_u64()) {
            return n.to_string();
        }
        if let Some(s) = v.get("value").and_then(|x| x.as_str()) {
            return s.to_string();
        }
    }
    raw.to_string()
}

/// Lower-case a 32-byte hex transaction hash; anything else is kept verbatim.
fn normalize_tx_hash(raw: &str) -> String {
    match hex::decode(raw) {
        Ok(bytes) if bytes.len() == 32 => hex::encode(bytes),
        _ => raw.to_string(),
    }
}

/// Parse an ISO-8601 timestamp string into a Unix epoch (seconds).
fn parse_iso_to_unix(s: &str) -> Option<i64> {
    use chrono::DateTime;
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.timestamp())
}

// ─────────────────────────────────────────────────────────
// Unit tests
// ─────────────────────────────────────────────────────────
