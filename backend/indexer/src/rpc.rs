//! Soroban RPC client: polls `getEvents` and decodes registry events.
//!
//! ## Resilience
//!
//! * Exponential back-off is applied when the RPC returns an error or rate-limit
//!   response, up to [`MAX_BACKOFF_SECS`] seconds.
//! * Transient network errors (connection reset, timeout) are retried silently.
//! * Every back-off sleep is interrupted by shutdown.
//!
//! ## Encodings
//!
//! Depending on the RPC version and `xdrFormat`, a topic arrives as a JSON
//! object (`{"type":"symbol","value":"mrv_new"}`), as base64 XDR of an
//! `ScVal`, or as a bare string. All three are accepted. The event value
//! is either JSON or a base64 XDR `ScVal`; XDR values are converted to the
//! same JSON shape (maps become objects keyed by symbol) before fields are
//! read, so both encodings go through one extraction path.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use stellar_xdr::curr::{Limits, ReadXdr, ScVal};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::errors::{IndexerError, Result};
use crate::events::{EventKind, RegistryEvent};

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
#[serde(rename_all = "camelCase")]
pub struct RawEvent {
    /// Encoded topic list
    pub topic: Vec<String>,
    /// Encoded event value / data
    pub value: Value,
    pub contract_id: Option<String>,
    pub tx_hash: Option<String>,
    pub id: Option<String>,
    pub ledger: Option<u64>,
    pub ledger_closed_at: Option<String>,
    pub in_successful_contract_call: Option<bool>,
}

/// One page of `getEvents` output.
#[derive(Debug)]
pub struct EventsPage {
    pub events: Vec<RawEvent>,
    pub cursor: Option<String>,
    pub latest_ledger: Option<u64>,
}

// ─────────────────────────────────────────────────────────
// Public API
// ─────────────────────────────────────────────────────────

/// Fetch a page of events from the RPC.
///
/// * `start_ledger`: the ledger sequence to scan from (inclusive).
/// * `cursor`: optional opaque pagination cursor from a previous response.
/// * `limit`: maximum number of events to return.
///
/// Retries soft failures until they clear or `shutdown` fires.
pub async fn fetch_events(
    client: &Client,
    rpc_url: &str,
    contract_id: &str,
    start_ledger: u32,
    cursor: Option<&str>,
    limit: u32,
    shutdown: &CancellationToken,
) -> Result<EventsPage> {
    let mut backoff = INITIAL_BACKOFF_SECS;
    let params = build_params(contract_id, start_ledger, cursor, limit);

    loop {
        let response = client
            .post(rpc_url)
            .json(&json!({
                "jsonrpc": "2.0",
                "id": 1,
                "method": "getEvents",
                "params": params,
            }))
            .send()
            .await;

        let resp = match response {
            Err(e) => {
                warn!("RPC request failed (will retry in {backoff}s): {e}");
                back_off(&mut backoff, shutdown).await?;
                continue;
            }
            Ok(resp) => resp,
        };

        if resp.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            warn!("Rate-limited by RPC (will retry in {backoff}s)");
            back_off(&mut backoff, shutdown).await?;
            continue;
        }

        let body: RpcResponse = resp.json().await?;

        if let Some(err) = body.error {
            if is_hard_error(err.code) {
                return Err(IndexerError::EventParse(format!(
                    "RPC hard error {}: {}",
                    err.code, err.message
                )));
            }
            warn!(
                "RPC soft error (will retry in {backoff}s): {} {}",
                err.code, err.message
            );
            back_off(&mut backoff, shutdown).await?;
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

        return Ok(EventsPage {
            events: result.events,
            cursor: result.cursor,
            latest_ledger: result.latest_ledger,
        });
    }
}

/// Invalid-request and method-not-found never succeed on retry.
fn is_hard_error(code: i64) -> bool {
    code == -32600 || code == -32601
}

async fn back_off(backoff: &mut u64, shutdown: &CancellationToken) -> Result<()> {
    tokio::select! {
        _ = shutdown.cancelled() => return Err(IndexerError::Shutdown),
        _ = tokio::time::sleep(Duration::from_secs(*backoff)) => {}
    }
    *backoff = (*backoff * 2).min(MAX_BACKOFF_SECS);
    Ok(())
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
        }
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

/// Decode a list of raw RPC events into [`RegistryEvent`] structs.
///
/// Events from reverted calls are dropped.
pub fn decode_events(raw: &[RawEvent], contract_id: &str) -> Vec<RegistryEvent> {
    raw.iter()
        .filter(|e| e.in_successful_contract_call.unwrap_or(true))
        .filter_map(|e| decode_single(e, contract_id))
        .collect()
}

fn decode_single(raw: &RawEvent, contract_id: &str) -> Option<RegistryEvent> {
    let first_topic = raw.topic.first()?;
    let kind = EventKind::from_topic(&extract_symbol(first_topic));

    let ledger = raw.ledger.unwrap_or(0) as i64;
    let timestamp = raw
        .ledger_closed_at
        .as_deref()
        .and_then(parse_iso_to_unix)
        .unwrap_or(0);

    // Role topics are (role_set, address, role); only record events carry a
    // project ID in the second slot.
    let second_topic = raw.topic.get(1);
    let project_id = if kind.is_project_scoped() {
        second_topic.map(|t| extract_u64_or_raw(t))
    } else {
        None
    };

    let value = normalise_value(&raw.value);
    let (mut actor, record_id, amount) = decode_data(&value, kind);
    if matches!(kind, EventKind::RoleSet | EventKind::RoleDel) {
        actor = second_topic.map(|t| extract_address(t)).or(actor);
    }

    let event_id = raw.id.clone().unwrap_or_else(|| {
        format!(
            "{ledger}-{}-{}-{}-{}",
            raw.tx_hash.as_deref().unwrap_or("-"),
            kind.as_str(),
            project_id.as_deref().unwrap_or("-"),
            record_id.map(|id| id.to_string()).unwrap_or_default(),
        )
    });

    Some(RegistryEvent {
        event_id,
        event_type: kind.as_str().to_string(),
        project_id,
        record_id,
        actor,
        amount,
        ledger,
        timestamp,
        contract_id: raw
            .contract_id
            .clone()
            .unwrap_or_else(|| contract_id.to_string()),
        tx_hash: raw.tx_hash.clone(),
    })
}

/// Pull apart the JSON `value` blob that Soroban returns for event data.
///
/// Returns `(actor, record_id, amount)`.
fn decode_data(value: &Value, kind: EventKind) -> (Option<String>, Option<i64>, Option<String>) {
    match kind {
        EventKind::MrvRecordCreated => (
            extract_field(value, &["creator", "address"]),
            extract_id(value, "record_id"),
            extract_field(value, &["co2_measured", "amount"]),
        ),
        EventKind::AuditRecordCreated => (
            extract_field(value, &["auditor", "address"]),
            extract_id(value, "audit_id"),
            None,
        ),
        EventKind::MrvVerified => (
            extract_field(value, &["verifier", "address"]),
            extract_id(value, "verification_id"),
            None,
        ),
        EventKind::RoleSet
        | EventKind::RoleDel
        | EventKind::RegistryPaused
        | EventKind::RegistryUnpaused => {
            // The data is the admin address that made the change.
            let actor = value
                .as_str()
                .map(String::from)
                .or_else(|| extract_field(value, &["address", "caller", "by"]));
            (actor, None, None)
        }
        EventKind::Unknown => (None, None, None),
    }
}

fn extract_field(value: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(v) = value.get(key) {
            let s = match v {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                _ => v.get("value").and_then(scalar_to_string),
            };
            if s.is_some() {
                return s;
            }
        }
    }
    None
}

fn extract_id(value: &Value, key: &str) -> Option<i64> {
    extract_field(value, &[key])?.parse().ok()
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Extract a Soroban Symbol from a topic entry.
fn extract_symbol(raw: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(s) = v.get("value").and_then(|x| x.as_str()) {
            return s.to_string();
        }
    }
    if let Some(ScVal::Symbol(s)) = decode_scval(raw) {
        return s.0.to_utf8_string_lossy();
    }
    raw.to_string()
}

/// Extract the project ID from a topic entry that might be JSON, XDR, or a raw string.
fn extract_u64_or_raw(raw: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(s) = v.get("value").and_then(scalar_to_string) {
            return s;
        }
    }
    if let Some(ScVal::U64(n)) = decode_scval(raw) {
        return n.to_string();
    }
    raw.to_string()
}

fn extract_address(raw: &str) -> String {
    if let Ok(v) = serde_json::from_str::<Value>(raw) {
        if let Some(s) = v.get("value").and_then(|x| x.as_str()) {
            return s.to_string();
        }
    }
    if let Some(ScVal::Address(address)) = decode_scval(raw) {
        return address.to_string();
    }
    raw.to_string()
}

/// Decode `raw` as a base64 XDR `ScVal`, if it is one.
fn decode_scval(raw: &str) -> Option<ScVal> {
    ScVal::from_xdr_base64(raw, Limits::none()).ok()
}

/// XDR event values become JSON; anything else is passed through.
fn normalise_value(value: &Value) -> Value {
    value
        .as_str()
        .and_then(decode_scval)
        .map(|v| scval_to_json(&v))
        .unwrap_or_else(|| value.clone())
}

/// Map an `ScVal` onto plain JSON. Addresses become strkeys and `i128`
/// amounts become decimal strings so no precision is lost.
fn scval_to_json(value: &ScVal) -> Value {
    match value {
        ScVal::Bool(b) => Value::Bool(*b),
        ScVal::U32(n) => json!(n),
        ScVal::I32(n) => json!(n),
        ScVal::U64(n) => json!(n),
        ScVal::I64(n) => json!(n),
        ScVal::I128(parts) => {
            let n = (i128::from(parts.hi) << 64) | i128::from(parts.lo);
            Value::String(n.to_string())
        }
        ScVal::Symbol(s) => Value::String(s.0.to_utf8_string_lossy()),
        ScVal::String(s) => Value::String(s.0.to_utf8_string_lossy()),
        ScVal::Address(address) => Value::String(address.to_string()),
        ScVal::Vec(Some(items)) => Value::Array(items.0.iter().map(scval_to_json).collect()),
        ScVal::Map(Some(entries)) => {
            let object: Map<String, Value> = entries
                .0
                .iter()
                .filter_map(|entry| match &entry.key {
                    ScVal::Symbol(key) => {
                        Some((key.0.to_utf8_string_lossy(), scval_to_json(&entry.val)))
                    }
                    _ => None,
                })
                .collect();
            Value::Object(object)
        }
        _ => Value::Null,
    }
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
