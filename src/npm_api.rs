//! Client for the npm downloads API.

use crate::config::Config;
use crate::models::{DailySeries, DownloadPoint, NpmRangeData};
use chrono::{Duration, Local, NaiveDate};
use reqwest::{Client, StatusCode, Url};
use std::time::Duration as StdDuration;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, info, instrument};

/// The API refuses ranges longer than 18 months.
const CHUNK_DAYS: i64 = 540;

const MAX_NAME_LEN: usize = 214;

#[derive(Debug, Error)]
pub enum NpmApiError {
    #[error("package {0} not found")]
    NotFound(String),

    #[error("invalid package name: {0}")]
    InvalidPackage(String),

    #[error("invalid npm API base URL: {0}")]
    BaseUrl(String),

    #[error("request to npm downloads API failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("npm downloads API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed downloads series: {0}")]
    MalformedSeries(String),

    #[error("downloads fetch task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

#[derive(Debug, Clone)]
pub struct NpmClient {
    client: Client,
    base_url: String,
    history_start: NaiveDate,
}

impl NpmClient {
    pub fn new(config: &Config) -> Result<Self, NpmApiError> {
        let client = Client::builder()
            .timeout(StdDuration::from_secs(config.request_timeout_secs))
            .user_agent(concat!("npm_insights/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.npm_api_url.clone(),
            history_start: config.history_start,
        })
    }

    /// Full daily history up to yesterday, for one package or, with `None`,
    /// for the whole registry.
    #[instrument(skip(self))]
    pub async fn daily_downloads(&self, package: Option<&str>) -> Result<DailySeries, NpmApiError> {
        let end = Local::now().date_naive() - Duration::days(1);
        self.daily_downloads_between(package, self.history_start, end)
            .await
    }

    #[instrument(skip(self))]
    pub async fn daily_downloads_between(
        &self,
        package: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<DailySeries, NpmApiError> {
        if let Some(package) = package {
            validate_package_name(package)?;
        }
        let ranges = chunk_ranges(start, end, CHUNK_DAYS);
        let chunk_count = ranges.len();

        let mut tasks = JoinSet::new();
        for (index, (from, to)) in ranges.into_iter().enumerate() {
            let client = self.clone();
            let package = package.map(str::to_owned);
            tasks.spawn(async move {
                let result = client.fetch_range(package.as_deref(), from, to).await;
                (index, result)
            });
        }

        let mut chunks = Vec::with_capacity(chunk_count);
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined?;
            chunks.push((index, result?));
        }
        chunks.sort_by_key(|(index, _)| *index);

        let series: DailySeries = chunks
            .into_iter()
            .flat_map(|(_, chunk)| chunk.downloads)
            .collect();
        validate_series(&series)?;

        info!(
            package = package.unwrap_or("<all>"),
            days = series.len(),
            chunks = chunk_count,
            "fetched daily downloads"
        );
        Ok(series)
    }

    async fn fetch_range(
        &self,
        package: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<NpmRangeData, NpmApiError> {
        let url = range_url(&self.base_url, package, start, end)?;
        debug!(%url, "fetching downloads chunk");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(NpmApiError::NotFound(package.unwrap_or_default().to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NpmApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<NpmRangeData>().await?)
    }
}

/// Each `/`-separated part of the package name becomes its own
/// percent-encoded path segment.
fn range_url(
    base_url: &str,
    package: Option<&str>,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<Url, NpmApiError> {
    let mut url =
        Url::parse(base_url).map_err(|err| NpmApiError::BaseUrl(format!("{base_url}: {err}")))?;
    let range = format!("{start}:{end}");
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| NpmApiError::BaseUrl(base_url.to_string()))?;
        segments
            .pop_if_empty()
            .extend(["downloads", "range", range.as_str()]);
        if let Some(package) = package {
            segments.extend(package.split('/'));
        }
    }
    Ok(url)
}

/// Accepts `name` or `@scope/name` where both parts use URL-safe characters
/// and do not start with `.` or `_`.
pub fn validate_package_name(name: &str) -> Result<(), NpmApiError> {
    let invalid = || NpmApiError::InvalidPackage(name.to_string());
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(invalid());
    }

    let parts: Vec<&str> = match name.strip_prefix('@') {
        Some(scoped) => match scoped.split_once('/') {
            Some((scope, rest)) => vec![scope, rest],
            None => return Err(invalid()),
        },
        None => vec![name],
    };

    let part_ok = |part: &str| {
        !part.is_empty()
            && !part.starts_with(['.', '_'])
            && part
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '.' | '_' | '~'))
    };
    if parts.into_iter().all(part_ok) {
        Ok(())
    } else {
        Err(invalid())
    }
}

/// Splits `[start, end]` into consecutive inclusive ranges of at most `days`.
fn chunk_ranges(start: NaiveDate, end: NaiveDate, days: i64) -> Vec<(NaiveDate, NaiveDate)> {
    let mut ranges = Vec::new();
    let mut from = start;
    while from <= end {
        let to = (from + Duration::days(days - 1)).min(end);
        ranges.push((from, to));
        from = to + Duration::days(1);
    }
    ranges
}

/// Checks that days are strictly ascending with no gaps.
pub fn validate_series(series: &[DownloadPoint]) -> Result<(), NpmApiError> {
    for pair in series.windows(2) {
        let expected = pair[0].day + Duration::days(1);
        if pair[1].day != expected {
            return Err(NpmApiError::MalformedSeries(format!(
                "expected {expected} after {}, got {}",
                pair[0].day, pair[1].day
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn chunks_cover_range_without_overlap() {
        let ranges = chunk_ranges(day(2020, 1, 1), day(2021, 12, 31), CHUNK_DAYS);
        assert_eq!(ranges.len(), 2);
        assert_eq!(ranges[0], (day(2020, 1, 1), day(2021, 6, 23)));
        assert_eq!(ranges[1], (day(2021, 6, 24), day(2021, 12, 31)));

        assert_eq!(
            chunk_ranges(day(2020, 1, 1), day(2020, 1, 1), CHUNK_DAYS),
            vec![(day(2020, 1, 1), day(2020, 1, 1))]
        );
        assert!(chunk_ranges(day(2020, 1, 2), day(2020, 1, 1), CHUNK_DAYS).is_empty());
    }

    #[test]
    fn range_url_handles_scoped_and_registry_wide() {
        let scoped = range_url(
            "https://api.npmjs.org",
            Some("@scope/pkg"),
            day(2023, 1, 1),
            day(2023, 2, 1),
        )
        .unwrap();
        assert_eq!(
            scoped.as_str(),
            "https://api.npmjs.org/downloads/range/2023-01-01:2023-02-01/@scope/pkg"
        );

        let all = range_url("http://mock", None, day(2023, 1, 1), day(2023, 1, 2)).unwrap();
        assert_eq!(all.as_str(), "http://mock/downloads/range/2023-01-01:2023-01-02");

        let prefixed = range_url("http://mock/npm/", None, day(2023, 1, 1), day(2023, 1, 2)).unwrap();
        assert_eq!(prefixed.path(), "/npm/downloads/range/2023-01-01:2023-01-02");
    }

    #[test]
    fn range_url_keeps_package_name_inside_the_path() {
        let url = range_url(
            "http://mock",
            Some("left-pad?period=x"),
            day(2023, 1, 1),
            day(2023, 1, 2),
        )
        .unwrap();
        assert_eq!(url.query(), None);
        assert_eq!(url.path(), "/downloads/range/2023-01-01:2023-01-02/left-pad%3Fperiod=x");

        let url = range_url(
            "http://mock",
            Some("../../point/last-week"),
            day(2023, 1, 1),
            day(2023, 1, 2),
        )
        .unwrap();
        assert!(url.path().starts_with("/downloads/range/2023-01-01:2023-01-02/"));

        assert!(matches!(
            range_url("not a url", None, day(2023, 1, 1), day(2023, 1, 2)),
            Err(NpmApiError::BaseUrl(_))
        ));
    }

    #[test]
    fn package_names_follow_npm_rules() {
        for name in ["left-pad", "@types/node", "lodash.merge", "JSONStream", "a~b"] {
            assert!(validate_package_name(name).is_ok(), "{name}");
        }
        for name in [
            "",
            "left-pad?period=x",
            "../../point/last-week",
            ".hidden",
            "_private",
            "@scope",
            "@scope/",
            "@/pkg",
            "@scope/pkg/extra",
            "plain/nested",
            "with space",
            "{{CHARTS}}",
            "%2F",
        ] {
            assert!(
                matches!(validate_package_name(name), Err(NpmApiError::InvalidPackage(_))),
                "{name}"
            );
        }
        assert!(validate_package_name(&"a".repeat(215)).is_err());
    }

    #[test]
    fn validate_series_rejects_gaps_and_disorder() {
        let point = |d: u32| DownloadPoint {
            day: day(2023, 1, d),
            downloads: 1,
        };
        assert!(validate_series(&[]).is_ok());
        assert!(validate_series(&[point(1), point(2), point(3)]).is_ok());
        assert!(matches!(
            validate_series(&[point(1), point(3)]),
            Err(NpmApiError::MalformedSeries(_))
        ));
        assert!(validate_series(&[point(2), point(1)]).is_err());
        assert!(validate_series(&[point(2), point(2)]).is_err());
    }

    #[test]
    fn parses_range_payload() {
        let body = r#"{
            "start": "2023-01-01",
            "end": "2023-01-02",
            "package": "left-pad",
            "downloads": [
                {"downloads": 10, "day": "2023-01-01"},
                {"downloads": 12, "day": "2023-01-02"}
            ]
        }"#;
        let data: NpmRangeData = serde_json::from_str(body).unwrap();
        assert_eq!(data.package.as_deref(), Some("left-pad"));
        assert_eq!(data.downloads[1].downloads, 12);
        assert_eq!(data.downloads[1].day, day(2023, 1, 2));
    }
}
