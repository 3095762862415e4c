//! Display policy for the countdown board: which arrivals are worth
//! showing, in what order, and how to label them.

use crate::aggregate::AggregateResponse;
use crate::extract::Arrival;

/// Fixed partition of lines into display groups plus the per-group and
/// lead-time limits. Lines outside every group are not displayed.
#[derive(Debug, Clone)]
pub struct DisplayPolicy {
    /// Line groups in display order.
    pub groups: Vec<Vec<String>>,
    /// Maximum trains shown per group.
    pub trains_per_group: usize,
    /// Arrivals closer than this many minutes are hidden.
    pub min_minutes_away: i64,
}

impl Default for DisplayPolicy {
    /// Columbus Circle defaults: A/C, then B/D, then 1; three trains per
    /// group; nothing under four minutes out.
    fn default() -> Self {
        DisplayPolicy {
            groups: vec![
                vec!["A".to_string(), "C".to_string()],
                vec!["B".to_string(), "D".to_string()],
                vec!["1".to_string()],
            ],
            trains_per_group: 3,
            min_minutes_away: 4,
        }
    }
}

impl DisplayPolicy {
    /// Index of the group containing `line`, or `None` when the line is not
    /// displayed.
    fn group_index(&self, line: &str) -> Option<usize> {
        self.groups
            .iter()
            .position(|group| group.iter().any(|l| l == line))
    }

    /// Applies the full display policy to one direction's arrivals: drop
    /// anything under the lead-time threshold, bucket by line group, sort
    /// each bucket by arrival time and keep the first `trains_per_group`,
    /// then concatenate buckets in group order.
    ///
    /// The result is deliberately not re-sorted across groups; the board
    /// shows each line family as its own block.
    pub fn plan_direction(&self, arrivals: &[Arrival]) -> Vec<Arrival> {
        let mut buckets: Vec<Vec<Arrival>> = vec![Vec::new(); self.groups.len()];

        for arrival in arrivals {
            if arrival.minutes_away < self.min_minutes_away {
                continue;
            }
            if let Some(i) = self.group_index(&arrival.line) {
                buckets[i].push(arrival.clone());
            }
        }

        let mut planned = Vec::new();
        for mut bucket in buckets {
            bucket.sort_by_key(|a| a.arrival_time);
            bucket.truncate(self.trains_per_group);
            planned.extend(bucket);
        }

        planned
    }
}

/// Countdown label for a train `minutes` away.
pub fn format_eta(minutes: i64) -> String {
    if minutes <= 0 {
        "Now".to_string()
    } else if minutes == 1 {
        "1 min".to_string()
    } else {
        format!("{minutes} min")
    }
}

/// Whether a train is close enough to highlight as arriving.
pub fn is_arriving(minutes_away: i64) -> bool {
    minutes_away <= 1
}

/// Cheap equality proxy over the full (pre-filter) arrival set, used to skip
/// redundant re-renders. Downtown then uptown, in server order.
pub fn fingerprint(response: &AggregateResponse) -> String {
    response
        .arrivals
        .downtown
        .iter()
        .chain(response.arrivals.uptown.iter())
        .map(|a| format!("{}-{}", a.line, a.arrival_time))
        .collect::<Vec<_>>()
        .join("|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::DirectionalArrivals;
    use crate::config::Direction;
    use chrono::Utc;

    const NOW: i64 = 1_700_000_000;

    fn arrival(line: &str, minutes: i64) -> Arrival {
        Arrival {
            line: line.to_string(),
            direction: Direction::Uptown,
            arrival_time: NOW + minutes * 60,
            minutes_away: minutes,
        }
    }

    fn response(uptown: Vec<Arrival>, downtown: Vec<Arrival>) -> AggregateResponse {
        AggregateResponse {
            station: "Test".to_string(),
            updated_at: Utc::now(),
            arrivals: DirectionalArrivals { uptown, downtown },
        }
    }

    #[test]
    fn test_imminent_arrivals_are_hidden() {
        let policy = DisplayPolicy::default();
        let planned = policy.plan_direction(&[
            arrival("A", 1),
            arrival("A", 3),
            arrival("A", 4),
            arrival("A", 10),
        ]);

        assert_eq!(planned.len(), 2);
        assert!(planned.iter().all(|a| a.minutes_away >= 4));
    }

    #[test]
    fn test_groups_capped_and_ordered() {
        let policy = DisplayPolicy::default();
        // More than three per group, interleaved, some too imminent to
        // show, plus a line in no group
        let planned = policy.plan_direction(&[
            arrival("1", 20),
            arrival("C", 6),
            arrival("B", 9),
            arrival("A", 4),
            arrival("D", 5),
            arrival("A", 2),
            arrival("A", 12),
            arrival("C", 8),
            arrival("A", 16),
            arrival("B", 7),
            arrival("Q", 5),
            arrival("1", 3),
            arrival("1", 10),
        ]);

        assert!(planned.iter().all(|a| a.minutes_away >= 4));

        let lines: Vec<&str> = planned.iter().map(|a| a.line.as_str()).collect();
        // A/C block first, then B/D, then 1; three per block, each block
        // sorted by arrival time
        assert_eq!(lines, vec!["A", "C", "C", "D", "B", "B", "1", "1"]);

        let ac_minutes: Vec<i64> = planned[..3].iter().map(|a| a.minutes_away).collect();
        assert_eq!(ac_minutes, vec![4, 6, 8]);

        // No global re-sort: the 1 at 10 min displays after the B at 9 min
        assert_eq!(planned.last().unwrap().minutes_away, 20);
    }

    #[test]
    fn test_lines_outside_groups_are_dropped() {
        let policy = DisplayPolicy::default();
        let planned = policy.plan_direction(&[arrival("Q", 10), arrival("7", 15)]);
        assert!(planned.is_empty());
    }

    #[test]
    fn test_format_eta() {
        assert_eq!(format_eta(0), "Now");
        assert_eq!(format_eta(-1), "Now");
        assert_eq!(format_eta(1), "1 min");
        assert_eq!(format_eta(5), "5 min");
    }

    #[test]
    fn test_is_arriving() {
        assert!(is_arriving(0));
        assert!(is_arriving(1));
        assert!(!is_arriving(2));
    }

    #[test]
    fn test_fingerprint_is_stable_for_identical_data() {
        let a = response(vec![arrival("A", 5)], vec![arrival("1", 7)]);
        let b = response(vec![arrival("A", 5)], vec![arrival("1", 7)]);
        assert_eq!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_changes_with_arrival_time() {
        let a = response(vec![arrival("A", 5)], vec![]);
        let b = response(vec![arrival("A", 6)], vec![]);
        assert_ne!(fingerprint(&a), fingerprint(&b));
    }

    #[test]
    fn test_fingerprint_covers_both_directions_downtown_first() {
        let r = response(vec![arrival("A", 5)], vec![arrival("1", 7)]);
        assert_eq!(
            fingerprint(&r),
            format!("1-{}|A-{}", NOW + 7 * 60, NOW + 5 * 60)
        );
    }
}
