use crate::aggregate::to_monthly;
use crate::dashboard::DashboardSeries;
use crate::errors::AppError;
use crate::insights::build_insights;
use crate::models::{to_chart_points, InsightsResponse, Suggestion, SuggestionsQuery};
use crate::npm_api::validate_package_name;
use crate::social::{render_social_card, CardLayout, CACHE_CONTROL, CONTENT_TYPE};
use crate::state::AppState;
use crate::suggestions::fetch_suggestions;
use crate::ui::{render_dashboard, PageContext};
use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{Html, IntoResponse, Response},
    Json,
};

pub async fn index(State(state): State<AppState>) -> Result<Html<String>, AppError> {
    dashboard_page(&state, None).await
}

pub async fn package_page(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Html<String>, AppError> {
    let package = package_name(&name)?;
    dashboard_page(&state, Some(package)).await
}

async fn dashboard_page(state: &AppState, package: Option<&str>) -> Result<Html<String>, AppError> {
    let series = state.npm.daily_downloads(package).await?;
    let insights = build_insights(&series);
    let dashboard = DashboardSeries::from_daily(&series);

    Ok(Html(render_dashboard(&PageContext {
        package,
        site_url: &state.config.site_url,
        insights: &insights,
        series: &dashboard,
    })))
}

pub async fn all_insights(State(state): State<AppState>) -> Result<Json<InsightsResponse>, AppError> {
    insights_response(&state, None).await
}

pub async fn package_insights(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<InsightsResponse>, AppError> {
    let package = package_name(&name)?;
    insights_response(&state, Some(package)).await
}

async fn insights_response(
    state: &AppState,
    package: Option<&str>,
) -> Result<Json<InsightsResponse>, AppError> {
    let series = state.npm.daily_downloads(package).await?;
    let dashboard = DashboardSeries::from_daily(&series);

    Ok(Json(InsightsResponse {
        package: package.map(str::to_owned),
        insights: build_insights(&series),
        daily: dashboard.daily,
        weekly: dashboard.weekly,
        monthly: dashboard.monthly,
        yearly: dashboard.yearly,
    }))
}

pub async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionsQuery>,
) -> Json<Vec<Suggestion>> {
    Json(fetch_suggestions(&state.http, &state.config.npms_api_url, &query.q).await)
}

pub async fn og_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    social_image(&state, &name, CardLayout::OpenGraph).await
}

pub async fn readme_image(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    social_image(&state, &name, CardLayout::Readme).await
}

async fn social_image(state: &AppState, name: &str, layout: CardLayout) -> Result<Response, AppError> {
    let package = package_name(name)?;
    let series = state.npm.daily_downloads(Some(package)).await?;
    // Image bars cover the full history, zero months included.
    let monthly = to_chart_points(to_monthly(&series).as_slice());
    let png = render_social_card(layout, package, &build_insights(&series), &monthly)?;

    Ok((
        [
            (header::CONTENT_TYPE, CONTENT_TYPE),
            (header::CACHE_CONTROL, CACHE_CONTROL),
        ],
        png,
    )
        .into_response())
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// Scoped names arrive as two path segments; both are kept. `Path` has
/// already percent-decoded them, so the name is checked before it goes
/// anywhere near an upstream URL.
fn package_name(raw: &str) -> Result<&str, AppError> {
    let name = raw.trim_matches('/');
    if name.is_empty() {
        return Err(AppError::bad_request("Missing package name"));
    }
    validate_package_name(name)?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn package_name_keeps_scope() {
        assert_eq!(package_name("@types/node").unwrap(), "@types/node");
        assert_eq!(package_name("/react/").unwrap(), "react");
    }

    #[test]
    fn package_name_rejects_empty() {
        let err = package_name("/").unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn package_name_rejects_decoded_url_syntax() {
        for raw in ["left-pad?period=x", "../../point/last-week", "a/b/c"] {
            let err = package_name(raw).unwrap_err();
            assert_eq!(err.status, StatusCode::BAD_REQUEST, "{raw}");
        }
    }
}
