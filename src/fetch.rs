//! Loading chart sources, and the per-view load state.
//!
//! Sources are plain files reachable by URL or path. Each chart view tracks its own
//! loads: when a newer load starts, results of earlier in-flight loads are dropped on
//! arrival (last load started wins).
//!
//! ```no_run
//! # use housing_charts::fetch::{DataSource, Fetcher};
//! let fetcher = Fetcher::new()?;
//! let src = DataSource::resolve("https://example.org/data/", "pipr_uk.csv");
//! let text = fetcher.load_text(&src)?;
//! # Ok::<(), housing_charts::ChartError>(())
//! ```

use crate::error::{ChartError, Result};
use log::{info, warn};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use std::path::PathBuf;
use std::time::Duration;

// Allow -, _, . unescaped in file names
const SAFE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.');

/// Where a source's bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Url(String),
    File(PathBuf),
    /// Already in memory (tests, embedded samples).
    Inline { name: String, text: String },
}

impl DataSource {
    /// Resolve `file_name` against `base`: a `http(s)://` prefix yields a URL with the
    /// name percent-encoded, anything else is treated as a directory.
    pub fn resolve(base: &str, file_name: &str) -> Self {
        let base = base.trim();
        if base.starts_with("http://") || base.starts_with("https://") {
            let enc = percent_encoding::utf8_percent_encode(file_name.trim(), SAFE).to_string();
            DataSource::Url(format!("{}/{}", base.trim_end_matches('/'), enc))
        } else {
            DataSource::File(PathBuf::from(base).join(file_name.trim()))
        }
    }

    pub fn name(&self) -> String {
        match self {
            DataSource::Url(u) => u.clone(),
            DataSource::File(p) => p.display().to_string(),
            DataSource::Inline { name, .. } => name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Fetcher {
    http: HttpClient,
}

impl Fetcher {
    pub fn new() -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30)) // total request timeout
            .connect_timeout(Duration::from_secs(10))
            .redirect(Policy::limited(5))
            .user_agent(concat!("housing-charts/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ChartError::Fetch {
                source_name: "http client".into(),
                message: e.to_string(),
            })?;
        Ok(Self { http })
    }

    /// Read a source fully as UTF-8 text.
    ///
    /// URLs get a small retry for transient failures (5xx and network errors);
    /// 4xx answers fail immediately.
    pub fn load_text(&self, source: &DataSource) -> Result<String> {
        let fail = |message: String| ChartError::Fetch {
            source_name: source.name(),
            message,
        };
        let text = match source {
            DataSource::Inline { text, .. } => text.clone(),
            DataSource::File(path) => std::fs::read_to_string(path).map_err(|e| fail(e.to_string()))?,
            DataSource::Url(url) => {
                let mut last_err: Option<String> = None;
                let mut body = None;
                for backoff_ms in [100u64, 300, 700] {
                    match self.http.get(url).send() {
                        Ok(r) if r.status().is_success() => {
                            body = Some(r.text().map_err(|e| fail(format!("read body: {e}")))?);
                            break;
                        }
                        Ok(r) if r.status().is_server_error() => {
                            last_err = Some(format!("HTTP {}", r.status()));
                        }
                        Ok(r) => return Err(fail(format!("request failed with HTTP {}", r.status()))),
                        Err(e) => last_err = Some(e.to_string()),
                    }
                    std::thread::sleep(Duration::from_millis(backoff_ms));
                }
                body.ok_or_else(|| fail(format!("network error: {}", last_err.unwrap_or_default())))?
            }
        };
        info!("loaded {} ({} bytes)", source.name(), text.len());
        Ok(text)
    }
}

/// Identifies one started load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Generation counter deciding which load result may be applied.
#[derive(Debug, Clone, Default)]
pub struct LoadTracker {
    generation: u64,
}

impl LoadTracker {
    /// Start a load; every earlier ticket becomes stale.
    pub fn begin(&mut self) -> LoadTicket {
        self.generation += 1;
        LoadTicket(self.generation)
    }

    pub fn is_current(&self, ticket: LoadTicket) -> bool {
        ticket.0 == self.generation
    }
}

/// What a chart view can currently show.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState<T> {
    Loading,
    Ready(T),
    Failed(String),
}

impl<T> ViewState<T> {
    pub fn ready(&self) -> Option<&T> {
        match self {
            ViewState::Ready(t) => Some(t),
            _ => None,
        }
    }
}

/// Load state of one chart view plus the tracker guarding it.
#[derive(Debug, Clone)]
pub struct ViewSlot<T> {
    tracker: LoadTracker,
    state: ViewState<T>,
}

impl<T> Default for ViewSlot<T> {
    fn default() -> Self {
        Self {
            tracker: LoadTracker::default(),
            state: ViewState::Loading,
        }
    }
}

impl<T> ViewSlot<T> {
    pub fn state(&self) -> &ViewState<T> {
        &self.state
    }

    /// The loaded value, for in-place selection changes.
    pub fn ready_mut(&mut self) -> Option<&mut T> {
        match &mut self.state {
            ViewState::Ready(t) => Some(t),
            _ => None,
        }
    }

    /// Start a new load: the view shows its loading placeholder until it completes.
    pub fn start(&mut self) -> LoadTicket {
        self.state = ViewState::Loading;
        self.tracker.begin()
    }

    /// Apply a finished load. Returns `false` (and changes nothing) if a newer load has
    /// started since `ticket` was issued.
    pub fn finish(&mut self, ticket: LoadTicket, result: Result<T>) -> bool {
        if !self.tracker.is_current(ticket) {
            warn!("discarding result of superseded load {ticket:?}");
            return false;
        }
        self.state = match result {
            Ok(v) => ViewState::Ready(v),
            Err(e) => ViewState::Failed(e.to_string()),
        };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_encodes_url_names_and_joins_paths() {
        assert_eq!(
            DataSource::resolve("https://host/data/", "my file.csv"),
            DataSource::Url("https://host/data/my%20file.csv".into())
        );
        assert_eq!(
            DataSource::resolve("data", "pipr_uk.csv"),
            DataSource::File(PathBuf::from("data").join("pipr_uk.csv"))
        );
    }

    #[test]
    fn stale_load_is_discarded() {
        let mut slot: ViewSlot<u32> = ViewSlot::default();
        let first = slot.start();
        let second = slot.start();
        assert!(slot.finish(second, Ok(2)));
        assert!(!slot.finish(first, Ok(1)));
        assert_eq!(slot.state(), &ViewState::Ready(2));
    }

    #[test]
    fn failure_becomes_inline_state() {
        let mut slot: ViewSlot<u32> = ViewSlot::default();
        let t = slot.start();
        assert_eq!(slot.state(), &ViewState::Loading);
        slot.finish(t, Err(ChartError::NoValidRows("pipr_uk.csv".into())));
        assert!(matches!(slot.state(), ViewState::Failed(m) if m.contains("no valid rows")));
    }

    #[test]
    fn inline_and_missing_files() {
        let f = Fetcher::new().unwrap();
        let inline = DataSource::Inline {
            name: "x".into(),
            text: "date,a\n".into(),
        };
        assert_eq!(f.load_text(&inline).unwrap(), "date,a\n");
        let missing = DataSource::File(PathBuf::from("/definitely/not/here.csv"));
        assert!(matches!(f.load_text(&missing), Err(ChartError::Fetch { .. })));
    }
}
