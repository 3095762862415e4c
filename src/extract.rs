//! Turns a decoded GTFS-RT feed into normalized arrival events for the
//! monitored station.

use serde::{Deserialize, Serialize};

use crate::config::{Direction, StationConfig};
use crate::gtfs_rt::FeedMessage;

/// One predicted train arrival at a monitored platform.
///
/// Recomputed from scratch every fetch cycle; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Arrival {
    /// Route ID from the trip descriptor (empty when the feed omits it).
    pub line: String,
    pub direction: Direction,
    /// Predicted arrival, seconds since the epoch. Strictly greater than
    /// the `now` the extractor ran with.
    pub arrival_time: i64,
    /// Minutes until arrival, rounded half up. May be 0.
    pub minutes_away: i64,
}

/// Minutes until an arrival `delta_secs` in the future, rounded half up:
/// 90 s rounds to 2, 89 s to 1, 30 s to 1.
fn minutes_away(delta_secs: i64) -> i64 {
    (delta_secs + 30) / 60
}

/// Walks the feed's trip updates and emits one [`Arrival`] per stop-time
/// update that targets a monitored stop and predicts a future arrival.
///
/// Past or absent arrival times are skipped silently. A `None` feed (the
/// upstream fetch failed) yields an empty list; that is a degraded result,
/// not an error. Output preserves feed entity order; no sorting happens here.
///
/// The prost-decoded `arrival.time` is already a plain `i64` of epoch
/// seconds, so no further normalization of the 64-bit wire encoding is
/// needed.
pub fn extract_arrivals(
    feed: Option<&FeedMessage>,
    config: &StationConfig,
    now: i64,
) -> Vec<Arrival> {
    let mut arrivals = Vec::new();

    let Some(feed) = feed else {
        return arrivals;
    };

    for entity in &feed.entity {
        let Some(trip_update) = &entity.trip_update else {
            continue;
        };

        let route_id = trip_update.trip.route_id.clone().unwrap_or_default();

        for stop_time in &trip_update.stop_time_update {
            let Some(stop_id) = stop_time.stop_id.as_deref() else {
                continue;
            };
            let Some(info) = config.stop(stop_id) else {
                continue;
            };

            let Some(arrival_time) = stop_time.arrival.as_ref().and_then(|a| a.time) else {
                continue;
            };
            if arrival_time <= now {
                continue;
            }

            arrivals.push(Arrival {
                line: route_id.clone(),
                direction: info.direction,
                arrival_time,
                minutes_away: minutes_away(arrival_time - now),
            });
        }
    }

    arrivals
}
