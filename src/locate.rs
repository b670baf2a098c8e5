//! Nearest-point lookup used to drive chart tooltips.

use crate::models::ChartPoint;
use chrono::{NaiveDate, NaiveDateTime};

fn point_time(point: &ChartPoint) -> NaiveDateTime {
    NaiveDateTime::from(point.date)
}

/// Returns the point whose date is closest to `target`.
///
/// Bisects for the left insertion index of `target`, never below 1, and
/// compares the neighbours on either side of it. An exact midpoint goes to
/// the earlier point. `points` must be sorted ascending by date; `None` only
/// for an empty slice.
pub fn locate(points: &[ChartPoint], target: NaiveDateTime) -> Option<&ChartPoint> {
    if points.is_empty() {
        return None;
    }

    let index = 1 + points[1..].partition_point(|point| point_time(point) < target);
    let before = &points[index - 1];

    match points.get(index) {
        Some(after) if target - point_time(before) > point_time(after) - target => Some(after),
        _ => Some(before),
    }
}

pub fn locate_date(points: &[ChartPoint], target: NaiveDate) -> Option<&ChartPoint> {
    locate(points, NaiveDateTime::from(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    fn sample() -> Vec<ChartPoint> {
        vec![
            ChartPoint {
                date: day(1),
                value: 10.0,
            },
            ChartPoint {
                date: day(5),
                value: 20.0,
            },
            ChartPoint {
                date: day(10),
                value: 30.0,
            },
        ]
    }

    #[test]
    fn locate_exact_match() {
        let points = sample();
        assert_eq!(locate_date(&points, day(1)).unwrap().date, day(1));
        assert_eq!(locate_date(&points, day(10)).unwrap().date, day(10));
    }

    #[test]
    fn locate_picks_closer_neighbour() {
        let points = sample();
        assert_eq!(locate_date(&points, day(6)).unwrap().value, 20.0);
        assert_eq!(locate_date(&points, day(9)).unwrap().value, 30.0);
        assert_eq!(locate_date(&points, day(2)).unwrap().value, 10.0);
    }

    #[test]
    fn locate_beyond_range_returns_edges() {
        let points = sample();
        assert_eq!(locate_date(&points, day(20)).unwrap().date, day(10));
        let before_start = NaiveDateTime::from(day(1)) - Duration::days(3);
        assert_eq!(locate(&points, before_start).unwrap().date, day(1));
    }

    #[test]
    fn locate_tie_favors_earlier_point() {
        let points = sample();
        // Midway between day 1 and day 5.
        assert_eq!(locate_date(&points, day(3)).unwrap().date, day(1));
        let just_after = NaiveDateTime::from(day(3)) + Duration::seconds(1);
        assert_eq!(locate(&points, just_after).unwrap().date, day(5));
    }

    #[test]
    fn locate_single_and_empty() {
        let single = vec![ChartPoint {
            date: day(4),
            value: 1.0,
        }];
        assert_eq!(locate_date(&single, day(28)).unwrap().date, day(4));
        assert_eq!(locate_date(&single, day(1)).unwrap().date, day(4));
        assert!(locate_date(&[], day(1)).is_none());
    }
}
