use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

use super::{
    discovery::{choose_target, fetch_browser_ws_url},
    session::CdpSession,
};

/// Intended to serve as a contract between the poll loop and whatever exposes
/// the timer text. Lets tests run the daemon without a live browser.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TimerProbe: Send + 'static {
    /// Reads the raw text the timer element currently shows.
    async fn read_timer_text(&mut self) -> Result<String>;
}

/// How the probe finds the browser endpoint.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    pub port: u16,
    /// Overrides the `/json/version` lookup when set.
    pub ws_url: Option<String>,
    /// Preference hint for target selection, matched against title and url.
    pub target_contains: Option<String>,
    pub selector: Option<String>,
}

/// Probe backed by a live debugging session. The session is built lazily and
/// dropped on any failure, so a restarted app just causes one missed poll
/// followed by a reconnect.
pub struct CdpTimerProbe {
    config: ProbeConfig,
    expression: String,
    session: Option<CdpSession>,
}

impl CdpTimerProbe {
    pub fn new(config: ProbeConfig) -> Self {
        let expression = timer_expression(config.selector.as_deref());
        Self {
            config,
            expression,
            session: None,
        }
    }

    async fn ensure_session(&mut self) -> Result<&mut CdpSession> {
        if self.session.is_none() {
            let ws_url = match &self.config.ws_url {
                Some(url) => url.clone(),
                None => fetch_browser_ws_url(self.config.port).await?,
            };
            debug!("Connecting to {ws_url}");
            let mut session = CdpSession::connect(&ws_url).await?;

            let targets = session.targets().await?;
            let target = choose_target(&targets, self.config.target_contains.as_deref())?;
            info!("Attaching to target {} ({})", target.title, target.url);
            let target_id = target.target_id.clone();
            session.attach_to_page(&target_id).await?;

            self.session = Some(session);
        }
        Ok(self.session.as_mut().unwrap())
    }
}

#[async_trait]
impl TimerProbe for CdpTimerProbe {
    async fn read_timer_text(&mut self) -> Result<String> {
        let expression = self.expression.clone();
        let session = self.ensure_session().await?;
        match session.evaluate_string(&expression).await {
            Ok(text) => Ok(text),
            Err(e) => {
                // Stale session. Reconnect on the next tick.
                self.session = None;
                Err(e)
            }
        }
    }
}

/// Builds the page-side expression that digs out the timer text. Search
/// order: elements styled with tabular numerals (how Brain.fm renders its
/// countdown), then the user selector, then the whole body text.
fn timer_expression(selector: Option<&str>) -> String {
    let selector_literal = match selector {
        // serde_json handles the quoting, the selector ends up as a JS string.
        Some(s) => serde_json::to_string(s).unwrap_or_else(|_| "null".into()),
        None => "null".into(),
    };
    format!(
        concat!(
            "(function(){{\n",
            "  var r=/(?:\\d+:)?[0-5]?\\d:[0-5]\\d/;\n",
            "  function fromInlineStyle(){{\n",
            "    try{{\n",
            "      var nodes=document.querySelectorAll('[style]');\n",
            "      for(var i=0;i<nodes.length;i++){{\n",
            "        var el=nodes[i];\n",
            "        var st=(el.getAttribute('style')||'').toLowerCase();\n",
            "        if(st.includes('font-variant-numeric') && st.includes('tabular-nums')){{\n",
            "          var txt=(el.textContent||'').trim();\n",
            "          var m=txt.match(r);\n",
            "          if(m) return m[0];\n",
            "          if(txt) return txt;\n",
            "        }}\n",
            "      }}\n",
            "    }}catch(e){{}}\n",
            "    return '';\n",
            "  }}\n",
            "  var s={selector};\n",
            "  var t=fromInlineStyle(); if(t) return t;\n",
            "  if(s){{ var el=document.querySelector(s); if(el){{ var txt=(el.textContent||'').trim(); var m=txt.match(r); if(m) return m[0]; if(txt) return txt; }} }}\n",
            "  if(document && document.body){{ var b=(document.body.innerText||'').trim(); var m=b.match(r); if(m) return m[0]; return b; }}\n",
            "  return '';\n",
            "}})()"
        ),
        selector = selector_literal,
    )
}
