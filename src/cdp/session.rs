//! WebSocket command client for the remote debugging protocol. Commands are
//! JSON objects with a monotonically increasing `id`; the browser interleaves
//! responses with unsolicited events, so reads skip everything that doesn't
//! answer the command we sent.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::trace;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const RESPONSE_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CdpSession {
    ws: WebSocketStream<MaybeTlsStream<TcpStream>>,
    next_id: u64,
    session_id: Option<String>,
}

impl CdpSession {
    /// Connects to the browser-level WebSocket url from `/json/version`.
    pub async fn connect(ws_url: &str) -> Result<Self> {
        let (ws, _) = tokio::time::timeout(CONNECT_TIMEOUT, connect_async(ws_url))
            .await
            .context("Timed out connecting to the debugging WebSocket")?
            .context("Failed to connect to the debugging WebSocket")?;
        Ok(Self {
            ws,
            next_id: 0,
            session_id: None,
        })
    }

    /// Sends one command and waits for its response. Commands issued after
    /// [CdpSession::attach_to_page] are scoped to the attached page session.
    pub async fn call(&mut self, method: &str, params: Option<Value>) -> Result<Value> {
        self.next_id += 1;
        let id = self.next_id;

        let mut payload = json!({ "id": id, "method": method });
        if let Some(params) = params {
            payload["params"] = params;
        }
        if let Some(session_id) = &self.session_id {
            payload["sessionId"] = json!(session_id);
        }

        trace!("Sending command {method} with id {id}");
        self.ws
            .send(Message::Text(payload.to_string()))
            .await
            .with_context(|| format!("Failed to send {method}"))?;
        self.recv_until(id).await
    }

    /// Reads frames until the response with the wanted id shows up. Event
    /// notifications carry no id and are skipped.
    async fn recv_until(&mut self, id: u64) -> Result<Value> {
        loop {
            let msg = tokio::time::timeout(RESPONSE_TIMEOUT, self.ws.next())
                .await
                .context("Timed out waiting for a response")?
                .context("Debugging WebSocket closed")?
                .context("Debugging WebSocket error")?;

            let Message::Text(text) = msg else {
                continue;
            };
            let value: Value = serde_json::from_str(&text)?;
            if value.get("id").and_then(Value::as_u64) != Some(id) {
                continue;
            }
            if let Some(error) = value.get("error") {
                bail!("Protocol error for id {id}: {error}");
            }
            return Ok(value.get("result").cloned().unwrap_or(Value::Null));
        }
    }

    /// Attaches to a page target in flat mode. Later commands are routed to
    /// the page through the returned session id.
    pub async fn attach_to_page(&mut self, target_id: &str) -> Result<()> {
        let result = self
            .call(
                "Target.attachToTarget",
                Some(json!({ "targetId": target_id, "flatten": true })),
            )
            .await?;
        let session_id = result
            .get("sessionId")
            .and_then(Value::as_str)
            .context("Failed to attach to page target")?
            .to_owned();
        self.session_id = Some(session_id);

        self.call("Runtime.enable", None).await?;
        Ok(())
    }

    /// Lists the browser's debugging targets.
    pub async fn targets(&mut self) -> Result<Vec<super::discovery::TargetInfo>> {
        let result = self.call("Target.getTargets", None).await?;
        let infos = result
            .get("targetInfos")
            .cloned()
            .unwrap_or_else(|| json!([]));
        Ok(serde_json::from_value(infos)?)
    }

    /// Evaluates an expression on the attached page and returns its string
    /// value. Non-string results come back empty, same as a page without the
    /// timer rendered.
    pub async fn evaluate_string(&mut self, expression: &str) -> Result<String> {
        let result = self
            .call(
                "Runtime.evaluate",
                Some(json!({ "expression": expression, "returnByValue": true })),
            )
            .await?;
        Ok(result
            .pointer("/result/value")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned())
    }
}
