//! Dashboard Route
//!
//! - GET / - The dashboard page
//!
//! The page is rendered server-side with the current chart inlined, then
//! listens on `/ws` and swaps in `/chart.svg` whenever the series changes.

use axum::{extract::State, response::Html};
use std::sync::Arc;

use crate::api::error::ApiResult;
use crate::api::state::AppState;
use crate::chart::{escape, render_svg};
use crate::poller::{PollSnapshot, PollStatus};

const PAGE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>Population</title>
<style>
  body { font-family: sans-serif; margin: 1rem; }
  #status { color: #444; margin-bottom: 0.5rem; }
  #status.failing { color: #b00; }
  #refresh { margin-top: 0.5rem; }
</style>
</head>
<body>
<div id="status" class="@STATUS_CLASS@">@STATUS@</div>
<div id="chart">@CHART@</div>
<button id="refresh" type="button">@BUTTON@</button>
<script>
(function () {
  const status = document.getElementById('status');
  const chart = document.getElementById('chart');
  const button = document.getElementById('refresh');

  function label(n) { return n + (n === 1 ? ' sample' : ' samples'); }
  function failing(s) { return s === 'degraded' || s === 'failing'; }

  function reloadChart() {
    fetch('/chart.svg', { cache: 'no-store' })
      .then(function (r) { return r.text(); })
      .then(function (svg) { chart.innerHTML = svg; });
  }

  button.addEventListener('click', function () {
    fetch('/api/v1/refresh', { method: 'POST' });
  });

  function connect() {
    const scheme = location.protocol === 'https:' ? 'wss' : 'ws';
    const ws = new WebSocket(scheme + '://' + location.host + '/ws');

    ws.onopen = function () {
      ws.send(JSON.stringify({ type: 'subscribe', topics: ['series', 'status'] }));
    };

    ws.onmessage = function (event) {
      const msg = JSON.parse(event.data);
      if (msg.type === 'series_updated') {
        button.textContent = label(msg.samples);
        status.className = failing(msg.status) ? 'failing' : '';
        status.textContent = 'Status: ' + msg.status + ', updated at tick ' + msg.tick;
        reloadChart();
      } else if (msg.type === 'poll_failed') {
        status.className = failing(msg.status) ? 'failing' : '';
        status.textContent = 'Status: ' + msg.status + ', last fetch failed (' + msg.kind + '): ' + msg.message;
      }
    };

    ws.onclose = function () { setTimeout(connect, @RECONNECT_MS@); };
  }

  connect();
})();
</script>
</body>
</html>
"#;

/// GET /
pub async fn dashboard(State(state): State<Arc<AppState>>) -> ApiResult<Html<String>> {
    let snapshot = state.poller.snapshot();
    let chart = render_svg(snapshot.series.samples(), &state.chart)?;
    let reconnect_ms = state.interval_secs.max(1) * 1000;

    Ok(Html(render_page(&snapshot, &chart, reconnect_ms)))
}

fn render_page(snapshot: &PollSnapshot, chart: &str, reconnect_ms: u64) -> String {
    let status_class = match snapshot.status() {
        PollStatus::Degraded | PollStatus::Failing => "failing",
        PollStatus::Waiting | PollStatus::Ready => "",
    };

    fill(
        PAGE,
        &[
            ("STATUS_CLASS", status_class),
            ("STATUS", &escape(&status_line(snapshot))),
            ("CHART", chart),
            ("BUTTON", &button_label(snapshot.series.len())),
            ("RECONNECT_MS", &reconnect_ms.to_string()),
        ],
    )
}

/// Substitute `@KEY@` placeholders in one pass over `template`
///
/// Inserted values are never scanned, so text that looks like a placeholder
/// survives as-is. Unknown keys are left untouched.
fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let extra: usize = values.iter().map(|(_, value)| value.len()).sum();
    let mut out = String::with_capacity(template.len() + extra);
    let mut rest = template;

    while let Some(start) = rest.find('@') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];

        let replaced = after.find('@').and_then(|end| {
            let key = &after[..end];
            values
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, value)| (*value, end))
        });

        match replaced {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('@');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Text of the refresh button: the number of samples charted
pub fn button_label(samples: usize) -> String {
    if samples == 1 {
        "1 sample".to_string()
    } else {
        format!("{} samples", samples)
    }
}

/// One-line description of the poller state
pub fn status_line(snapshot: &PollSnapshot) -> String {
    let status = snapshot.status();
    match (&snapshot.last_failure, status) {
        (_, PollStatus::Waiting) => "Status: waiting for first result".to_string(),
        (Some(failure), PollStatus::Degraded | PollStatus::Failing) => format!(
            "Status: {}, last fetch failed ({}): {}",
            status, failure.kind, failure.message
        ),
        _ => format!("Status: {}, {}", status, snapshot.series.summary()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UpdateMode;
    use crate::poller::PollFailure;
    use crate::series::{AnimalCount, Series};
    use crate::source::FetchError;
    use std::path::PathBuf;

    fn ready_snapshot() -> PollSnapshot {
        let mut snapshot = PollSnapshot::default();
        snapshot.apply_success(
            1,
            Series::new(vec![AnimalCount::new(2020, 10, 2), AnimalCount::new(2021, 12, 3)]),
            UpdateMode::Replace,
        );
        snapshot
    }

    #[test]
    fn test_button_label() {
        assert_eq!(button_label(0), "0 samples");
        assert_eq!(button_label(1), "1 sample");
        assert_eq!(button_label(20), "20 samples");
    }

    #[test]
    fn test_status_line_ready() {
        let line = status_line(&ready_snapshot());
        assert!(line.starts_with("Status: ready, 2 samples, years 2020-2021"));
    }

    #[test]
    fn test_status_line_waiting() {
        assert_eq!(
            status_line(&PollSnapshot::default()),
            "Status: waiting for first result"
        );
    }

    #[test]
    fn test_status_line_degraded() {
        let mut snapshot = ready_snapshot();
        snapshot.apply_failure(PollFailure::from_error(2, &FetchError::Status { status: 500 }));

        let line = status_line(&snapshot);
        assert!(line.contains("degraded"));
        assert!(line.contains("Unexpected status 500"));
    }

    #[test]
    fn test_render_page_fills_placeholders() {
        let page = render_page(&ready_snapshot(), "<svg></svg>", 10_000);

        assert!(page.contains("<div id=\"chart\"><svg></svg></div>"));
        assert!(page.contains(">2 samples</button>"));
        assert!(page.contains("setTimeout(connect, 10000)"));
        assert!(!page.contains('@'));
    }

    #[test]
    fn test_render_page_does_not_rescan_inserted_text() {
        let mut snapshot = ready_snapshot();
        snapshot.apply_failure(PollFailure::from_error(
            2,
            &FetchError::Io {
                path: PathBuf::from("@CHART@"),
                error: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
            },
        ));

        let page = render_page(&snapshot, "<svg id=\"c\"></svg>", 10_000);

        assert_eq!(page.matches("<svg id=\"c\">").count(), 1);
        assert!(page.contains("@CHART@"));
        assert!(page.contains(">2 samples</button>"));
    }

    #[test]
    fn test_fill_leaves_unknown_and_lone_markers() {
        let filled = fill("a@X@b @NOPE@ user@host", &[("X", "@X@")]);
        assert_eq!(filled, "a@X@b @NOPE@ user@host");
    }
}
