use serde::{Deserialize, Serialize};

/// One day of activity on an external platform, quantized for a heatmap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDay {
    pub date: String,
    pub count: u32,
    pub level: u8,
}

/// Maps a raw count onto the 0-4 heat scale, relative to the series maximum.
pub fn level_for(count: u32, max: u32) -> u8 {
    if count == 0 || max == 0 {
        return 0;
    }
    let ratio = count as f64 / max as f64;
    if ratio <= 0.25 {
        1
    } else if ratio <= 0.50 {
        2
    } else if ratio <= 0.75 {
        3
    } else {
        4
    }
}

/// Assembles raw `(date, count)` pairs into a leveled series sorted by date.
/// Dates are `YYYY-MM-DD`, so lexicographic order is chronological order.
pub fn build_series(mut pairs: Vec<(String, u32)>) -> Vec<ActivityDay> {
    let max = pairs.iter().map(|(_, count)| *count).max().unwrap_or(0);
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
        .into_iter()
        .map(|(date, count)| ActivityDay {
            date,
            count,
            level: level_for(count, max),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_buckets() {
        assert_eq!(level_for(0, 10), 0);
        assert_eq!(level_for(5, 0), 0);
        assert_eq!(level_for(1, 10), 1);
        assert_eq!(level_for(2, 10), 1);
        assert_eq!(level_for(3, 10), 2);
        assert_eq!(level_for(5, 10), 2);
        assert_eq!(level_for(7, 10), 3);
        assert_eq!(level_for(8, 10), 4);
        assert_eq!(level_for(10, 10), 4);
    }

    #[test]
    fn test_series_levels_are_relative_to_max() {
        let series = build_series(vec![
            ("2026-01-01".to_string(), 0),
            ("2026-01-02".to_string(), 10),
            ("2026-01-03".to_string(), 5),
        ]);
        let levels: Vec<u8> = series.iter().map(|d| d.level).collect();
        assert_eq!(levels, vec![0, 4, 2]);
    }

    #[test]
    fn test_series_is_deterministic() {
        let pairs = vec![
            ("2026-03-01".to_string(), 2),
            ("2026-03-02".to_string(), 9),
            ("2026-03-03".to_string(), 4),
        ];
        let first = build_series(pairs.clone());
        let second = build_series(pairs);
        assert_eq!(first, second);
    }

    #[test]
    fn test_series_sorted_by_date() {
        let series = build_series(vec![
            ("2026-02-10".to_string(), 1),
            ("2025-12-31".to_string(), 3),
            ("2026-01-05".to_string(), 2),
        ]);
        let dates: Vec<&str> = series.iter().map(|d| d.date.as_str()).collect();
        assert_eq!(dates, vec!["2025-12-31", "2026-01-05", "2026-02-10"]);
    }

    #[test]
    fn test_empty_series() {
        assert!(build_series(Vec::new()).is_empty());
    }
}
