//! Narrow capability interface over the hosted data store.
//!
//! The orchestration code only needs two things from the store: read rows
//! from a table by filter, and call a named remote procedure. [`Store`]
//! exposes exactly that, [`RestStore`] implements it over PostgREST.

use crate::config::Config;
use crate::error::{HealError, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, InvalidHeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;

/// Reply from a remote procedure call that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcReply {
    Ok(Value),
    Rejected { status: u16, message: String },
}

pub trait Store {
    /// Fetch rows from `table`, filtered by PostgREST query parameters.
    fn select(&self, table: &str, query: &[(&str, &str)]) -> Result<Vec<Value>>;

    /// Invoke the remote procedure `operation` with named JSON parameters.
    fn rpc(&self, operation: &str, params: &Value) -> Result<RpcReply>;
}

// ---------------------------------------------------------------------------
// RestStore
// ---------------------------------------------------------------------------

pub struct RestStore {
    base_url: String,
    client: Client,
}

impl RestStore {
    pub fn new(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .default_headers(auth_headers(&config.service_key)?)
            .build()?;
        Ok(Self {
            base_url: config.base_url.clone(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/rest/v1/{path}", self.base_url)
    }
}

fn auth_headers(key: &str) -> Result<HeaderMap> {
    let invalid = |_: InvalidHeaderValue| {
        HealError::InvalidConfig("service key is not a valid header value".into())
    };

    let mut apikey = HeaderValue::from_str(key).map_err(invalid)?;
    apikey.set_sensitive(true);
    let mut bearer = HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert("apikey", apikey);
    headers.insert(AUTHORIZATION, bearer);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert("Prefer", HeaderValue::from_static("return=representation"));
    Ok(headers)
}

impl Store for RestStore {
    fn select(&self, table: &str, query: &[(&str, &str)]) -> Result<Vec<Value>> {
        let url = self.endpoint(table);
        tracing::debug!(%url, ?query, "select");

        let resp = self.client.get(&url).query(query).send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        if status != 200 {
            return Err(HealError::Status { status, body });
        }
        Ok(serde_json::from_str(&body)?)
    }

    fn rpc(&self, operation: &str, params: &Value) -> Result<RpcReply> {
        let url = self.endpoint(&format!("rpc/{operation}"));
        tracing::debug!(%url, "rpc");

        let resp = self.client.post(&url).json(params).send()?;
        let status = resp.status().as_u16();
        let body = resp.text()?;
        if status == 200 {
            return Ok(RpcReply::Ok(success_payload(body)));
        }
        Ok(RpcReply::Rejected {
            status,
            message: error_message(&body),
        })
    }
}

/// A 200 is a success whatever the body holds; non-JSON text is kept as a
/// string.
fn success_payload(body: String) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(&body).unwrap_or(Value::String(body))
}

/// The `message` field of a JSON error body, or the body itself.
fn error_message(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(value) => match value.get("message").and_then(Value::as_str) {
            Some(msg) => msg.to_string(),
            None => value.to_string(),
        },
        Err(_) => body.to_string(),
    }
}
