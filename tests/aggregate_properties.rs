use chrono::{Datelike, Duration, NaiveDate, Weekday};
use npm_insights::aggregate::{to_monthly, to_weekly, to_yearly, trim_leading_zeros};
use npm_insights::locate::locate_date;
use npm_insights::models::{to_chart_points, DailySeries, DownloadPoint};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Contiguous series starting anywhere in 2019-2024, up to ~3 years long.
fn daily_series() -> impl Strategy<Value = DailySeries> {
    (0i64..2190, prop::collection::vec(0u64..1_000_000, 0..1100)).prop_map(|(offset, downloads)| {
        let start = NaiveDate::from_ymd_opt(2019, 1, 1).unwrap() + Duration::days(offset);
        downloads
            .into_iter()
            .enumerate()
            .map(|(index, downloads)| DownloadPoint {
                day: start + Duration::days(index as i64),
                downloads,
            })
            .collect()
    })
}

fn total(series: &[DownloadPoint]) -> u64 {
    series.iter().map(|point| point.downloads).sum()
}

proptest! {
    #[test]
    fn prop_monthly_and_yearly_conserve_downloads(series in daily_series()) {
        let monthly: u64 = to_monthly(&series).iter().map(|bucket| bucket.downloads).sum();
        let yearly: u64 = to_yearly(&series).iter().map(|bucket| bucket.downloads).sum();
        prop_assert_eq!(monthly, total(&series));
        prop_assert_eq!(yearly, total(&series));
    }

    #[test]
    fn prop_weekly_conserves_retained_days(series in daily_series()) {
        let retained: Vec<DownloadPoint> = series
            .iter()
            .copied()
            .skip_while(|point| point.day.weekday() != Weekday::Mon)
            .collect();
        let weekly = to_weekly(&series);

        let weekly_total: u64 = weekly.iter().map(|bucket| bucket.downloads).sum();
        prop_assert_eq!(weekly_total, total(&retained));
        prop_assert!(weekly.iter().all(|bucket| bucket.bucket_start.weekday() == Weekday::Mon));
        if let Some(first) = weekly.first() {
            prop_assert_eq!(Some(first.bucket_start), retained.first().map(|point| point.day));
        }
    }

    #[test]
    fn prop_one_bucket_per_calendar_period(series in daily_series()) {
        let months: BTreeSet<(i32, u32)> =
            series.iter().map(|point| (point.day.year(), point.day.month())).collect();
        let years: BTreeSet<i32> = series.iter().map(|point| point.day.year()).collect();

        prop_assert_eq!(to_monthly(&series).len(), months.len());
        prop_assert_eq!(to_yearly(&series).len(), years.len());
    }

    #[test]
    fn prop_trim_is_idempotent(series in daily_series()) {
        let points = to_chart_points(series.as_slice());
        let once = trim_leading_zeros(&points);
        let twice = trim_leading_zeros(once);

        prop_assert_eq!(once, twice);
        if points.iter().any(|point| point.value != 0.0) {
            prop_assert!(once[0].value != 0.0);
        } else {
            prop_assert_eq!(once.len(), points.len());
        }
    }

    #[test]
    fn prop_locate_returns_an_existing_day(series in daily_series(), offset in 0i64..4000) {
        let points = to_chart_points(series.as_slice());
        let target = NaiveDate::from_ymd_opt(2018, 6, 1).unwrap() + Duration::days(offset);

        match locate_date(&points, target) {
            None => prop_assert!(points.is_empty()),
            Some(found) => {
                prop_assert!(points.iter().any(|point| point.date == found.date));
                if let (Some(first), Some(last)) = (points.first(), points.last()) {
                    if first.date <= target && target <= last.date {
                        prop_assert_eq!(found.date, target);
                    }
                }
            }
        }
    }
}
