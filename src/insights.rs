use crate::models::{DownloadPoint, PackageInsights};

const WEEK: usize = 7;
const MONTH: usize = 30;
const YEAR: usize = 365;

/// Headline numbers for the insight cards, counted back from the latest day.
pub fn build_insights(series: &[DownloadPoint]) -> PackageInsights {
    PackageInsights {
        last_day: window_sum(series, 0, 1),
        last_day_previous_week: window_sum(series, WEEK, 1),
        last_week: window_sum(series, 0, WEEK),
        previous_week: window_sum(series, WEEK, WEEK),
        last_month: window_sum(series, 0, MONTH),
        previous_month: window_sum(series, MONTH, MONTH),
        last_year: window_sum(series, 0, YEAR),
        previous_year: window_sum(series, YEAR, YEAR),
    }
}

/// Sums `len` days ending `skip` days before the last entry. Windows reaching
/// past the start of the series sum whatever is left.
fn window_sum(series: &[DownloadPoint], skip: usize, len: usize) -> u64 {
    let end = series.len().saturating_sub(skip);
    let start = end.saturating_sub(len);
    series[start..end]
        .iter()
        .fold(0u64, |acc, point| acc.saturating_add(point.downloads))
}

/// Change from `previous` to `value` in percent; 0 when either side is 0.
pub fn percentage_diff(value: u64, previous: u64) -> f64 {
    if value == 0 || previous == 0 {
        return 0.0;
    }
    (value as f64 - previous as f64) / previous as f64 * 100.0
}

/// Title, current value and comparison value of one insight card.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Card {
    pub title: &'static str,
    pub value: u64,
    pub previous: u64,
}

impl Card {
    pub fn change(&self) -> f64 {
        percentage_diff(self.value, self.previous)
    }
}

pub fn cards(insights: &PackageInsights) -> [Card; 4] {
    [
        Card {
            title: "Last day",
            value: insights.last_day,
            previous: insights.last_day_previous_week,
        },
        Card {
            title: "Last week",
            value: insights.last_week,
            previous: insights.previous_week,
        },
        Card {
            title: "Last month",
            value: insights.last_month,
            previous: insights.previous_month,
        },
        Card {
            title: "Last year",
            value: insights.last_year,
            previous: insights.previous_year,
        },
    ]
}
