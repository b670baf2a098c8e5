use crate::aggregate::{to_monthly, to_weekly, to_yearly, trim_leading_zeros, SeriesMemo};
use crate::models::{to_chart_points, ChartPoint, DailySeries, DownloadPoint};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Granularity {
    pub const ALL: [Granularity; 4] = [
        Granularity::Daily,
        Granularity::Weekly,
        Granularity::Monthly,
        Granularity::Yearly,
    ];

    pub fn title(self) -> &'static str {
        match self {
            Granularity::Daily => "Daily downloads",
            Granularity::Weekly => "Weekly downloads",
            Granularity::Monthly => "Monthly downloads",
            Granularity::Yearly => "Yearly downloads",
        }
    }

    pub fn date_format(self) -> &'static str {
        match self {
            Granularity::Daily | Granularity::Weekly => "%d %b %Y",
            Granularity::Monthly => "%b %Y",
            Granularity::Yearly => "%Y",
        }
    }
}

/// Every granularity of one daily series, trimmed of leading zero history.
#[derive(Debug, Clone, Default)]
pub struct DashboardSeries {
    pub daily: Vec<ChartPoint>,
    pub weekly: Vec<ChartPoint>,
    pub monthly: Vec<ChartPoint>,
    pub yearly: Vec<ChartPoint>,
}

impl DashboardSeries {
    /// One-shot aggregation for a series that is rendered once.
    pub fn from_daily(series: &[DownloadPoint]) -> Self {
        Self {
            daily: trimmed(to_chart_points(series)),
            weekly: trimmed(to_chart_points(to_weekly(series).as_slice())),
            monthly: trimmed(to_chart_points(to_monthly(series).as_slice())),
            yearly: trimmed(to_chart_points(to_yearly(series).as_slice())),
        }
    }

    /// Same as `from_daily`, but the aggregates come from `memo`, so hosts
    /// that re-render one shared series only aggregate it once.
    pub fn build(series: &Arc<DailySeries>, memo: &mut SeriesMemo) -> Self {
        Self {
            daily: trimmed(to_chart_points(series.as_slice())),
            weekly: trimmed(to_chart_points(memo.weekly(series))),
            monthly: trimmed(to_chart_points(memo.monthly(series))),
            yearly: trimmed(to_chart_points(memo.yearly(series))),
        }
    }

    pub fn get(&self, granularity: Granularity) -> &[ChartPoint] {
        match granularity {
            Granularity::Daily => &self.daily,
            Granularity::Weekly => &self.weekly,
            Granularity::Monthly => &self.monthly,
            Granularity::Yearly => &self.yearly,
        }
    }
}

fn trimmed(points: Vec<ChartPoint>) -> Vec<ChartPoint> {
    trim_leading_zeros(&points).to_vec()
}

/// The last `count` points.
pub fn recent(points: &[ChartPoint], count: usize) -> &[ChartPoint] {
    &points[points.len().saturating_sub(count)..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DownloadPoint;
    use chrono::{Duration, NaiveDate};

    #[test]
    fn build_trims_every_granularity() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let series: DailySeries = (0..400)
            .map(|offset| DownloadPoint {
                day: start + Duration::days(offset),
                downloads: if offset < 40 { 0 } else { 100 },
            })
            .collect();
        let series = Arc::new(series);
        let mut memo = SeriesMemo::new();
        let dashboard = DashboardSeries::build(&series, &mut memo);

        assert_eq!(dashboard.daily.len(), 360);
        // January 2023 is all zeros.
        assert_eq!(dashboard.monthly.len(), 13);
        assert_eq!(dashboard.monthly[0].date, NaiveDate::from_ymd_opt(2023, 2, 1).unwrap());
        assert_eq!(dashboard.yearly.len(), 2);
        // First downloads land on Friday 2023-02-10.
        assert_eq!(dashboard.weekly[0].date, NaiveDate::from_ymd_opt(2023, 2, 6).unwrap());
        assert_eq!(dashboard.weekly[0].value, 300.0);
        assert_eq!(dashboard.get(Granularity::Yearly), dashboard.yearly.as_slice());
    }

    #[test]
    fn build_reuses_memo_for_the_same_series() {
        let start = NaiveDate::from_ymd_opt(2023, 1, 2).unwrap();
        let series: DailySeries = (0..90)
            .map(|offset| DownloadPoint {
                day: start + Duration::days(offset),
                downloads: 10,
            })
            .collect();
        let series = Arc::new(series);
        let mut memo = SeriesMemo::new();

        let first = DashboardSeries::build(&series, &mut memo);
        let cached = memo.monthly(&series).as_ptr();
        let second = DashboardSeries::build(&series, &mut memo);
        assert_eq!(memo.monthly(&series).as_ptr(), cached);

        let fresh = DashboardSeries::from_daily(&series);
        for granularity in Granularity::ALL {
            assert_eq!(first.get(granularity), second.get(granularity));
            assert_eq!(first.get(granularity), fresh.get(granularity));
        }
    }

    #[test]
    fn recent_takes_tail() {
        let points: Vec<ChartPoint> = (1..=5)
            .map(|day| ChartPoint {
                date: NaiveDate::from_ymd_opt(2023, 1, day).unwrap(),
                value: day as f64,
            })
            .collect();
        assert_eq!(recent(&points, 2).len(), 2);
        assert_eq!(recent(&points, 2)[0].value, 4.0);
        assert_eq!(recent(&points, 10).len(), 5);
    }
}
