use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Total downloads recorded for one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadPoint {
    pub day: NaiveDate,
    pub downloads: u64,
}

/// Chronologically ascending, one entry per calendar day.
pub type DailySeries = Vec<DownloadPoint>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatedBucket {
    pub bucket_start: NaiveDate,
    pub downloads: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl From<&DownloadPoint> for ChartPoint {
    fn from(point: &DownloadPoint) -> Self {
        Self {
            date: point.day,
            value: point.downloads as f64,
        }
    }
}

impl From<&AggregatedBucket> for ChartPoint {
    fn from(bucket: &AggregatedBucket) -> Self {
        Self {
            date: bucket.bucket_start,
            value: bucket.downloads as f64,
        }
    }
}

pub fn to_chart_points<'a, T>(items: &'a [T]) -> Vec<ChartPoint>
where
    ChartPoint: From<&'a T>,
{
    items.iter().map(ChartPoint::from).collect()
}

/// Body of `GET /downloads/range/{start}:{end}[/{package}]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpmRangeData {
    pub downloads: Vec<DownloadPoint>,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub package: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PackageInsights {
    pub last_day: u64,
    pub last_day_previous_week: u64,
    pub last_week: u64,
    pub previous_week: u64,
    pub last_month: u64,
    pub previous_month: u64,
    pub last_year: u64,
    pub previous_year: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InsightsResponse {
    pub package: Option<String>,
    pub insights: PackageInsights,
    pub daily: Vec<ChartPoint>,
    pub weekly: Vec<ChartPoint>,
    pub monthly: Vec<ChartPoint>,
    pub yearly: Vec<ChartPoint>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestionsQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    pub package: SuggestedPackage,
    pub score: SuggestionScore,
    #[serde(rename = "searchScore")]
    pub search_score: f64,
    #[serde(default)]
    pub highlight: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestedPackage {
    pub name: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionScore {
    #[serde(rename = "final")]
    pub final_score: f64,
    pub detail: ScoreDetail,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ScoreDetail {
    pub quality: f64,
    pub popularity: f64,
    pub maintenance: f64,
}
