//! Roll-ups of a daily downloads series into weekly, monthly and yearly buckets.

use crate::models::{AggregatedBucket, ChartPoint, DailySeries, DownloadPoint};
use chrono::{Datelike, Weekday};
use std::sync::Arc;

/// Sums each Monday-to-Sunday week.
///
/// Days before the first Monday are dropped rather than merged into the first
/// full week, so a series without a Monday yields no buckets.
pub fn to_weekly(series: &[DownloadPoint]) -> Vec<AggregatedBucket> {
    let mut buckets: Vec<AggregatedBucket> = Vec::new();

    for point in series
        .iter()
        .skip_while(|point| point.day.weekday() != Weekday::Mon)
    {
        match buckets.last_mut() {
            Some(open) if point.day.weekday() != Weekday::Mon => {
                open.downloads = open.downloads.saturating_add(point.downloads);
            }
            _ => buckets.push(AggregatedBucket {
                bucket_start: point.day,
                downloads: point.downloads,
            }),
        }
    }

    buckets
}

pub fn to_monthly(series: &[DownloadPoint]) -> Vec<AggregatedBucket> {
    bucket_by(series, |point| (point.day.year(), point.day.month()))
}

pub fn to_yearly(series: &[DownloadPoint]) -> Vec<AggregatedBucket> {
    bucket_by(series, |point| point.day.year())
}

/// Opens a bucket on the first entry and whenever `key` differs from the
/// previous entry's key.
fn bucket_by<K, F>(series: &[DownloadPoint], key: F) -> Vec<AggregatedBucket>
where
    K: PartialEq,
    F: Fn(&DownloadPoint) -> K,
{
    let mut buckets: Vec<AggregatedBucket> = Vec::new();
    let mut previous: Option<K> = None;

    for point in series {
        let current = key(point);
        match buckets.last_mut() {
            Some(open) if previous.as_ref() == Some(&current) => {
                open.downloads = open.downloads.saturating_add(point.downloads);
            }
            _ => buckets.push(AggregatedBucket {
                bucket_start: point.day,
                downloads: point.downloads,
            }),
        }
        previous = Some(current);
    }

    buckets
}

/// Drops the zero-valued history before the first recorded download.
///
/// An all-zero series is returned untouched so "no data yet" still charts as
/// a flat line instead of an empty chart.
pub fn trim_leading_zeros(points: &[ChartPoint]) -> &[ChartPoint] {
    match points.iter().position(|point| point.value != 0.0) {
        Some(first) => &points[first..],
        None => points,
    }
}

/// Derived series cached against the identity of the daily series they came
/// from. Handing in a different `Arc` discards everything cached.
#[derive(Debug, Default)]
pub struct SeriesMemo {
    source: Option<Arc<DailySeries>>,
    weekly: Option<Vec<AggregatedBucket>>,
    monthly: Option<Vec<AggregatedBucket>>,
    yearly: Option<Vec<AggregatedBucket>>,
}

impl SeriesMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn weekly(&mut self, series: &Arc<DailySeries>) -> &[AggregatedBucket] {
        self.sync(series);
        self.weekly.get_or_insert_with(|| to_weekly(series))
    }

    pub fn monthly(&mut self, series: &Arc<DailySeries>) -> &[AggregatedBucket] {
        self.sync(series);
        self.monthly.get_or_insert_with(|| to_monthly(series))
    }

    pub fn yearly(&mut self, series: &Arc<DailySeries>) -> &[AggregatedBucket] {
        self.sync(series);
        self.yearly.get_or_insert_with(|| to_yearly(series))
    }

    fn sync(&mut self, series: &Arc<DailySeries>) {
        let same = self
            .source
            .as_ref()
            .is_some_and(|source| Arc::ptr_eq(source, series));
        if !same {
            self.source = Some(Arc::clone(series));
            self.weekly = None;
            self.monthly = None;
            self.yearly = None;
        }
    }

    #[cfg(test)]
    fn is_cached(&self) -> bool {
        self.weekly.is_some() || self.monthly.is_some() || self.yearly.is_some()
    }
}
