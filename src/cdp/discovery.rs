//! Finding the browser endpoint and picking a page target to attach to.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tokio::net::TcpStream;

const PORT_PROBE_TIMEOUT: Duration = Duration::from_millis(250);
const VERSION_FETCH_TIMEOUT: Duration = Duration::from_secs(2);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VersionInfo {
    web_socket_debugger_url: Option<String>,
}

/// Debugging target as reported by `Target.getTargets`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub target_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

/// Quick TCP probe to tell whether the app was started with a debugging port.
pub async fn is_port_open(host: &str, port: u16) -> bool {
    matches!(
        tokio::time::timeout(PORT_PROBE_TIMEOUT, TcpStream::connect((host, port))).await,
        Ok(Ok(_))
    )
}

/// Asks the browser's http endpoint for its WebSocket url.
pub async fn fetch_browser_ws_url(port: u16) -> Result<String> {
    let url = format!("http://127.0.0.1:{port}/json/version");
    let version: VersionInfo = reqwest::Client::new()
        .get(&url)
        .timeout(VERSION_FETCH_TIMEOUT)
        .send()
        .await
        .with_context(|| format!("Failed to reach {url}"))?
        .json()
        .await
        .context("Malformed /json/version response")?;

    version.web_socket_debugger_url.with_context(|| {
        "Browser webSocketDebuggerUrl not found; ensure --remote-debugging-port is set".to_string()
    })
}

/// Ranks targets so we attach to the actual app page and not a devtools or
/// extension page that happens to be open in the same browser.
fn score(target: &TargetInfo, prefer: Option<&str>) -> i32 {
    let mut sc = 0;
    if target.kind == "page" {
        sc += 10;
    }
    let title = target.title.to_lowercase();
    if let Some(prefer) = prefer {
        let haystack = format!("{title} {}", target.url.to_lowercase());
        if haystack.contains(&prefer.to_lowercase()) {
            sc += 5;
        }
    }
    if title.contains("brain") {
        sc += 3;
    }
    if target.url.starts_with("chrome-extension://") {
        sc -= 5;
    }
    if target.url.starts_with("devtools://") {
        sc -= 10;
    }
    sc
}

/// Picks the most plausible page target. Errors out when nothing looks like a
/// page, since attaching to anything else can't produce timer text.
pub fn choose_target<'a>(targets: &'a [TargetInfo], prefer: Option<&str>) -> Result<&'a TargetInfo> {
    let best = targets.iter().max_by_key(|t| score(t, prefer));
    match best {
        Some(t) if t.kind == "page" => Ok(t),
        _ => bail!("No suitable page target found"),
    }
}

#[cfg(test)]
mod tests {
    use super::{choose_target, TargetInfo};

    fn target(kind: &str, title: &str, url: &str) -> TargetInfo {
        TargetInfo {
            target_id: format!("{kind}-{title}"),
            kind: kind.into(),
            title: title.into(),
            url: url.into(),
        }
    }

    #[test]
    fn prefers_page_over_other_kinds() {
        let targets = vec![
            target("service_worker", "Brain.fm", "https://my.brain.fm/sw.js"),
            target("page", "player", "https://my.brain.fm/player"),
        ];
        let chosen = choose_target(&targets, None).unwrap();
        assert_eq!(chosen.kind, "page");
    }

    #[test]
    fn brain_title_beats_other_pages() {
        let targets = vec![
            target("page", "Settings", "https://example.com"),
            target("page", "Brain.fm - Focus", "https://my.brain.fm"),
        ];
        let chosen = choose_target(&targets, None).unwrap();
        assert_eq!(chosen.title, "Brain.fm - Focus");
    }

    #[test]
    fn prefer_hint_overrides_heuristics() {
        let targets = vec![
            target("page", "Brain.fm - Focus", "https://my.brain.fm"),
            target("page", "Player window", "https://my.brain.fm/player"),
        ];
        let chosen = choose_target(&targets, Some("player")).unwrap();
        assert_eq!(chosen.title, "Player window");
    }

    #[test]
    fn devtools_pages_are_penalized() {
        let targets = vec![
            target("page", "DevTools - brain", "devtools://devtools/bundled"),
            target("page", "blank", "about:blank"),
        ];
        let chosen = choose_target(&targets, None).unwrap();
        assert_eq!(chosen.url, "about:blank");
    }

    #[test]
    fn no_page_target_is_an_error() {
        let targets = vec![target("service_worker", "sw", "https://my.brain.fm/sw.js")];
        assert!(choose_target(&targets, None).is_err());
        assert!(choose_target(&[], None).is_err());
    }

    #[test]
    fn target_info_parses_protocol_shape() {
        let raw = r#"{
            "targetId": "AB12",
            "type": "page",
            "title": "Brain.fm",
            "url": "https://my.brain.fm/",
            "attached": false
        }"#;
        let parsed: TargetInfo = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.target_id, "AB12");
        assert_eq!(parsed.kind, "page");
    }
}
