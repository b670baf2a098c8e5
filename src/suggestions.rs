//! Package name suggestions for the search box, proxied from npms.io.

use crate::models::Suggestion;
use reqwest::Client;
use std::cmp::Ordering;
use tracing::warn;

/// Closely matching packages first, then the most popular ones.
fn suggestion_order(a: &Suggestion, b: &Suggestion) -> Ordering {
    if (b.search_score.ln() - a.search_score.ln()).abs() > 1.0 {
        b.search_score.total_cmp(&a.search_score)
    } else {
        b.score
            .detail
            .popularity
            .total_cmp(&a.score.detail.popularity)
    }
}

/// Stable insertion sort. `suggestion_order` is not transitive, which the
/// standard sorts are allowed to reject with a panic.
pub fn rank_suggestions(mut suggestions: Vec<Suggestion>) -> Vec<Suggestion> {
    for index in 1..suggestions.len() {
        let mut cursor = index;
        while cursor > 0
            && suggestion_order(&suggestions[cursor - 1], &suggestions[cursor]) == Ordering::Greater
        {
            suggestions.swap(cursor - 1, cursor);
            cursor -= 1;
        }
    }
    suggestions
}

/// Fetches and ranks suggestions; failures degrade to an empty list.
pub async fn fetch_suggestions(client: &Client, npms_api_url: &str, query: &str) -> Vec<Suggestion> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }

    let url = format!("{npms_api_url}/v2/search/suggestions");
    let response = match client.get(&url).query(&[("q", query)]).send().await {
        Ok(response) => response,
        Err(err) => {
            warn!("suggestions request failed: {err}");
            return Vec::new();
        }
    };

    if !response.status().is_success() {
        warn!(status = %response.status(), "suggestions request rejected");
        return Vec::new();
    }

    match response.json::<Vec<Suggestion>>().await {
        Ok(suggestions) => rank_suggestions(suggestions),
        Err(err) => {
            warn!("failed to parse suggestions: {err}");
            Vec::new()
        }
    }
}
