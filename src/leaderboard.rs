//! Online leaderboard
//!
//! Submissions are validated and normalized here before they leave the
//! game. Entries are ordered by time survived, then score, both
//! descending. The server keeps the best 100 and hands back 13 for
//! display; the same ordering decides "your rank".

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::waves::RunMode;

/// Longest accepted player name, in characters
pub const MAX_NAME_CHARS: usize = 20;

/// Entries retained by the board
pub const RETAINED_ENTRIES: usize = 100;

/// Entries shown in the leaderboard panel
pub const DISPLAYED_ENTRIES: usize = 13;

/// Name used when the player leaves the field blank
pub const ANONYMOUS: &str = "anon";

#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("time survived must be a finite number, got {0}")]
    InvalidTime(f32),
    #[error("{0} runs are not ranked")]
    UnrankedMode(&'static str),
    #[error("daily id must look like YYYY-MM-DD, got {0:?}")]
    InvalidDailyId(String),
    #[error("malformed leaderboard payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("leaderboard request failed: {0}")]
    Network(String),
}

/// Which board a run belongs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BoardMode {
    #[default]
    Normal,
    Daily,
}

/// Payload posted when a run ends
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreSubmission {
    pub name: String,
    pub time_survived: u32,
    pub score: u32,
    pub mode: BoardMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_id: Option<String>,
}

impl ScoreSubmission {
    /// Validate and normalize a finished run.
    ///
    /// The name is trimmed and cut to [`MAX_NAME_CHARS`]; a blank name
    /// becomes [`ANONYMOUS`]. Time is floored to whole seconds and clamped
    /// at zero. Debug runs are rejected.
    pub fn new(
        name: &str,
        time_survived: f32,
        score: u32,
        mode: &RunMode,
    ) -> Result<Self, LeaderboardError> {
        if !time_survived.is_finite() {
            return Err(LeaderboardError::InvalidTime(time_survived));
        }
        let (mode, daily_id) = match mode {
            RunMode::Normal => (BoardMode::Normal, None),
            RunMode::Daily { id } => {
                if !is_daily_id(id) {
                    return Err(LeaderboardError::InvalidDailyId(id.clone()));
                }
                (BoardMode::Daily, Some(id.clone()))
            }
            RunMode::Debug(_) => return Err(LeaderboardError::UnrankedMode(mode.label())),
        };
        Ok(Self {
            name: normalize_name(name),
            time_survived: time_survived.max(0.0).floor() as u32,
            score,
            mode,
            daily_id,
        })
    }

    pub fn to_json(&self) -> Result<String, LeaderboardError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Trim, truncate by characters and substitute the anonymous name
pub fn normalize_name(name: &str) -> String {
    let trimmed: String = name.trim().chars().take(MAX_NAME_CHARS).collect();
    let trimmed = trimmed.trim_end();
    if trimmed.is_empty() {
        ANONYMOUS.to_string()
    } else {
        trimmed.to_string()
    }
}

/// `YYYY-MM-DD` with ASCII digits
pub fn is_daily_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// A ranked row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub name: String,
    pub time_survived: u32,
    pub score: u32,
    #[serde(default)]
    pub created_at: String,
}

impl LeaderboardEntry {
    pub fn from_submission(sub: &ScoreSubmission, created_at: impl Into<String>) -> Self {
        Self {
            name: sub.name.clone(),
            time_survived: sub.time_survived,
            score: sub.score,
            created_at: created_at.into(),
        }
    }
}

/// Board order: longer survival first, higher score breaks ties
pub fn board_order(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.time_survived
        .cmp(&a.time_survived)
        .then(b.score.cmp(&a.score))
}

/// Ordered leaderboard, capped at [`RETAINED_ENTRIES`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Leaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl Leaderboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from any list, restoring board order and the cap
    pub fn from_entries(mut entries: Vec<LeaderboardEntry>) -> Self {
        entries.sort_by(board_order);
        entries.truncate(RETAINED_ENTRIES);
        Self { entries }
    }

    /// Parse a `{ "entries": [...] }` response body
    pub fn from_json(json: &str) -> Result<Self, LeaderboardError> {
        let parsed: Leaderboard = serde_json::from_str(json)?;
        Ok(Self::from_entries(parsed.entries))
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rows for the leaderboard panel
    pub fn top(&self) -> &[LeaderboardEntry] {
        &self.entries[..self.entries.len().min(DISPLAYED_ENTRIES)]
    }

    /// Insert a submission. Returns its 1-based rank, or `None` when it
    /// fell off the end of the retained list.
    ///
    /// A new entry lands behind existing entries it ties with.
    pub fn submit(
        &mut self,
        sub: &ScoreSubmission,
        created_at: impl Into<String>,
    ) -> Option<usize> {
        let entry = LeaderboardEntry::from_submission(sub, created_at);
        let index = self
            .entries
            .partition_point(|e| board_order(e, &entry) != Ordering::Greater);
        self.entries.insert(index, entry);
        self.entries.truncate(RETAINED_ENTRIES);
        (index < self.entries.len()).then_some(index + 1)
    }

    /// Rank a run would take if submitted now (1-based)
    pub fn rank_for(&self, time_survived: u32, score: u32) -> usize {
        let candidate = LeaderboardEntry {
            name: String::new(),
            time_survived,
            score,
            created_at: String::new(),
        };
        1 + self
            .entries
            .partition_point(|e| board_order(e, &candidate) != Ordering::Greater)
    }
}

/// Text copied to the clipboard from the game-over screen
pub fn share_text(mode: &RunMode, wave: u32, seconds: f32) -> String {
    let seconds = seconds.max(0.0).floor() as u32;
    match mode.daily_id() {
        Some(id) => format!("Daily Disk {} - Wave {}, {}s", id, wave, seconds),
        None => format!("Disk Survivor - Wave {}, {}s", wave, seconds),
    }
}

#[cfg(target_arch = "wasm32")]
pub use client::LeaderboardClient;

#[cfg(target_arch = "wasm32")]
mod client {
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::{JsFuture, spawn_local};
    use web_sys::{Request, RequestInit, RequestMode, Response};

    use super::{Leaderboard, LeaderboardError, ScoreSubmission};

    const SUBMIT_URL: &str = "/.netlify/functions/leaderboard-submit";
    const TOP_URL: &str = "/.netlify/functions/leaderboard-top";

    fn js_err(value: JsValue) -> LeaderboardError {
        LeaderboardError::Network(format!("{:?}", value))
    }

    async fn request(method: &str, url: &str, body: Option<&str>) -> Result<String, LeaderboardError> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        if let Some(body) = body {
            opts.set_body(&JsValue::from_str(body));
        }
        let request = Request::new_with_str_and_init(url, &opts).map_err(js_err)?;
        request
            .headers()
            .set("Content-Type", "application/json")
            .map_err(js_err)?;

        let window = web_sys::window()
            .ok_or_else(|| LeaderboardError::Network("no window".to_string()))?;
        let resp: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_err)?
            .dyn_into()
            .map_err(js_err)?;
        if !resp.ok() {
            return Err(LeaderboardError::Network(format!("HTTP {}", resp.status())));
        }
        let text = JsFuture::from(resp.text().map_err(js_err)?)
            .await
            .map_err(js_err)?;
        Ok(text.as_string().unwrap_or_default())
    }

    /// Browser client. Failures are logged and leave the panel empty or
    /// the submit button usable again.
    #[derive(Default)]
    pub struct LeaderboardClient {
        in_flight: Rc<Cell<bool>>,
        submitted: Rc<Cell<bool>>,
        board: Rc<RefCell<Option<Leaderboard>>>,
    }

    impl LeaderboardClient {
        pub fn new() -> Self {
            Self::default()
        }

        /// True while a submission is pending
        pub fn is_submitting(&self) -> bool {
            self.in_flight.get()
        }

        pub fn was_submitted(&self) -> bool {
            self.submitted.get()
        }

        /// Latest fetched board, `None` until a fetch succeeds
        pub fn board(&self) -> Option<Leaderboard> {
            self.board.borrow().clone()
        }

        /// Post a run. Returns false if a submission is already in flight.
        pub fn submit(&self, sub: ScoreSubmission) -> bool {
            if self.in_flight.replace(true) {
                return false;
            }
            let in_flight = Rc::clone(&self.in_flight);
            let submitted = Rc::clone(&self.submitted);
            spawn_local(async move {
                let result = match sub.to_json() {
                    Ok(body) => request("POST", SUBMIT_URL, Some(&body)).await,
                    Err(e) => Err(e),
                };
                match result {
                    Ok(_) => {
                        log::info!("Leaderboard entry submitted for {}", sub.name);
                        submitted.set(true);
                    }
                    Err(e) => log::warn!("Leaderboard submit failed: {}", e),
                }
                in_flight.set(false);
            });
            true
        }

        /// Refresh the displayed board
        pub fn refresh(&self) {
            let board = Rc::clone(&self.board);
            spawn_local(async move {
                let fetched = match request("GET", TOP_URL, None).await {
                    Ok(body) => Leaderboard::from_json(&body),
                    Err(e) => Err(e),
                };
                match fetched {
                    Ok(b) => *board.borrow_mut() = Some(b),
                    Err(e) => {
                        log::warn!("Leaderboard fetch failed: {}", e);
                        *board.borrow_mut() = None;
                    }
                }
            });
        }
    }
}
