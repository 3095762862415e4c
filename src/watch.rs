//! Terminal countdown board: polls the arrivals endpoint on one timer,
//! refreshes the clock line on another, and only redraws the arrival list
//! when the data actually changed.

use std::io::Write as _;
use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, Timelike};
use tokio::sync::mpsc;
use tracing::debug;

use crate::aggregate::AggregateResponse;
use crate::display::{DisplayPolicy, fingerprint, format_eta, is_arriving};
use crate::extract::Arrival;

const CLOCK_INTERVAL: Duration = Duration::from_secs(1);

/// Renders one direction section of the board.
fn render_direction(title: &str, arrivals: &[Arrival], policy: &DisplayPolicy) -> String {
    let mut out = String::new();
    out.push_str(&format!("  {title}\n"));

    let planned = policy.plan_direction(arrivals);
    if planned.is_empty() {
        out.push_str("    No upcoming arrivals\n");
        return out;
    }

    for arrival in &planned {
        let eta = format_eta(arrival.minutes_away);
        if is_arriving(arrival.minutes_away) {
            out.push_str(&format!("    [{:>5}]  \x1b[1m{eta}\x1b[0m\n", arrival.line));
        } else {
            out.push_str(&format!("    [{:>5}]  {eta}\n", arrival.line));
        }
    }

    out
}

/// Renders the arrival sections, downtown first, matching the board layout.
pub fn render_board(response: &AggregateResponse, policy: &DisplayPolicy) -> String {
    let mut out = String::new();
    out.push_str(&render_direction(
        "Downtown",
        &response.arrivals.downtown,
        policy,
    ));
    out.push('\n');
    out.push_str(&render_direction("Uptown", &response.arrivals.uptown, policy));
    out
}

/// Renders the error panel shown when a poll fails.
pub fn render_error(message: &str) -> String {
    format!("  Failed to load arrivals\n    {message}\n")
}

/// Everything the board needs between redraws. The arrival body is cached so
/// clock ticks can repaint without recomputing the display plan.
struct BoardState {
    station: String,
    body: String,
    last_fingerprint: Option<String>,
    last_updated: Option<DateTime<Local>>,
    displayed_minute: Option<u32>,
}

impl BoardState {
    fn new(station: String) -> Self {
        BoardState {
            station,
            body: String::from("  Loading...\n"),
            last_fingerprint: None,
            last_updated: None,
            displayed_minute: None,
        }
    }

    /// Ingests a successful poll. Returns whether the board was redrawn;
    /// identical data (by fingerprint) skips the redraw and leaves the
    /// last-updated time untouched.
    fn apply(&mut self, response: &AggregateResponse, policy: &DisplayPolicy) -> bool {
        let fp = fingerprint(response);
        if self.last_fingerprint.as_deref() == Some(fp.as_str()) {
            debug!("Arrival data unchanged, skipping redraw");
            return false;
        }

        self.last_fingerprint = Some(fp);
        self.last_updated = Some(Local::now());
        self.station = response.station.clone();
        self.body = render_board(response, policy);
        self.redraw();
        true
    }

    /// Ingests a failed poll: show the error panel, and forget the last
    /// fingerprint so the next good poll always repaints over it.
    fn apply_error(&mut self, message: &str) {
        self.last_fingerprint = None;
        self.body = render_error(message);
        self.redraw();
    }

    /// Refreshes the clock line. Only repaints when the displayed minute
    /// changed. Returns whether a repaint happened.
    fn clock_tick(&mut self) -> bool {
        let now = Local::now();
        let minute = now.hour() * 60 + now.minute();
        if self.displayed_minute == Some(minute) {
            return false;
        }
        self.displayed_minute = Some(minute);
        self.redraw();
        true
    }

    fn redraw(&self) {
        let clock = Local::now().format("%H:%M");
        let updated = match &self.last_updated {
            Some(t) => format!("Last updated {}", t.format("%H:%M")),
            None => "Loading...".to_string(),
        };

        // Clear screen, home cursor, repaint everything
        print!("\x1b[2J\x1b[H");
        println!("  {}", self.station);
        println!("  It's now {clock} · {updated}");
        println!();
        println!("{}", self.body);
        let _ = std::io::stdout().flush();
    }
}

async fn poll_once(client: &reqwest::Client, url: &str) -> Result<AggregateResponse> {
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.json().await?)
}

/// Runs the board against `url`, polling every `poll_secs` seconds.
///
/// The poll timer and the clock timer are independent: each poll runs in its
/// own task and reports back over a channel, so a slow or hung poll never
/// blocks the clock repaint. There is no retry inside a cycle; a failed poll
/// shows the error panel until the next interval fires.
pub async fn watch(url: String, poll_secs: u64) -> Result<()> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(poll_secs.max(1)))
        .build()?;

    let (tx, mut rx) = mpsc::channel::<Result<AggregateResponse, String>>(4);

    let mut poll = tokio::time::interval(Duration::from_secs(poll_secs.max(1)));
    let mut clock = tokio::time::interval(CLOCK_INTERVAL);

    let policy = DisplayPolicy::default();
    let mut state = BoardState::new("Arrival board".to_string());

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let client = client.clone();
                let url = url.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let result = poll_once(&client, &url).await.map_err(|e| e.to_string());
                    let _ = tx.send(result).await;
                });
            }
            _ = clock.tick() => {
                state.clock_tick();
            }
            Some(result) = rx.recv() => {
                match result {
                    Ok(response) => {
                        state.apply(&response, &policy);
                    }
                    Err(message) => state.apply_error(&message),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DirectionalArrivals;
    use crate::config::Direction;
    use chrono::Utc;

    const NOW: i64 = 1_700_000_000;

    fn arrival(line: &str, direction: Direction, minutes: i64) -> Arrival {
        Arrival {
            line: line.to_string(),
            direction,
            arrival_time: NOW + minutes * 60,
            minutes_away: minutes,
        }
    }

    fn response(uptown: Vec<Arrival>, downtown: Vec<Arrival>) -> AggregateResponse {
        AggregateResponse {
            station: "Columbus Circle-59 St".to_string(),
            updated_at: Utc::now(),
            arrivals: DirectionalArrivals { uptown, downtown },
        }
    }

    #[test]
    fn test_render_board_downtown_first() {
        let policy = DisplayPolicy::default();
        let r = response(
            vec![arrival("A", Direction::Uptown, 5)],
            vec![arrival("1", Direction::Downtown, 7)],
        );

        let board = render_board(&r, &policy);
        let downtown_at = board.find("Downtown").unwrap();
        let uptown_at = board.find("Uptown").unwrap();
        assert!(downtown_at < uptown_at);
        assert!(board.contains("5 min"));
        assert!(board.contains("7 min"));
    }

    #[test]
    fn test_render_board_empty_direction() {
        let policy = DisplayPolicy::default();
        // Under the 4-minute threshold, so nothing displays
        let r = response(vec![arrival("A", Direction::Uptown, 2)], vec![]);

        let board = render_board(&r, &policy);
        assert_eq!(board.matches("No upcoming arrivals").count(), 2);
    }

    #[test]
    fn test_render_error_includes_message() {
        let panel = render_error("HTTP 500");
        assert!(panel.contains("Failed to load arrivals"));
        assert!(panel.contains("HTTP 500"));
    }

    #[test]
    fn test_identical_data_skips_redraw_and_keeps_timestamp() {
        let policy = DisplayPolicy::default();
        let mut state = BoardState::new("Test".to_string());
        let r = response(vec![arrival("A", Direction::Uptown, 5)], vec![]);

        assert!(state.apply(&r, &policy));
        let updated = state.last_updated;
        assert!(updated.is_some());

        // Same (line, arrivalTime) pairs: no redraw, timestamp untouched
        assert!(!state.apply(&r.clone(), &policy));
        assert_eq!(state.last_updated, updated);
    }

    #[test]
    fn test_changed_data_redraws() {
        let policy = DisplayPolicy::default();
        let mut state = BoardState::new("Test".to_string());

        let first = response(vec![arrival("A", Direction::Uptown, 5)], vec![]);
        let second = response(vec![arrival("A", Direction::Uptown, 6)], vec![]);

        assert!(state.apply(&first, &policy));
        assert!(state.apply(&second, &policy));
    }

    #[test]
    fn test_error_then_same_data_repaints() {
        let policy = DisplayPolicy::default();
        let mut state = BoardState::new("Test".to_string());
        let r = response(vec![arrival("A", Direction::Uptown, 5)], vec![]);

        assert!(state.apply(&r, &policy));
        state.apply_error("connection refused");
        assert!(state.body.contains("Failed to load arrivals"));

        // The error panel must not be left up when unchanged data returns
        assert!(state.apply(&r, &policy));
    }

    #[test]
    fn test_clock_tick_repaints_once_per_minute() {
        let mut state = BoardState::new("Test".to_string());
        assert!(state.clock_tick());
        assert!(!state.clock_tick());
    }
}
