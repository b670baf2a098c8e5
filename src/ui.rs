use crate::chart::{AreaChart, BarsChart, ChartConfig};
use crate::dashboard::{recent, DashboardSeries, Granularity};
use crate::format::{escape_html, percentage, thousands};
use crate::insights::{cards, Card};
use crate::models::PackageInsights;

const AREA_WIDTH: f64 = 1000.0;
const AREA_HEIGHT: f64 = 384.0;
const DAILY_WINDOW: usize = 365;

pub struct PageContext<'a> {
    /// `None` renders the registry-wide dashboard.
    pub package: Option<&'a str>,
    pub site_url: &'a str,
    pub insights: &'a PackageInsights,
    pub series: &'a DashboardSeries,
}

pub fn render_dashboard(ctx: &PageContext<'_>) -> String {
    let (title, heading, meta) = match ctx.package {
        Some(package) => {
            let name = escape_html(package);
            (
                format!("{name} - npminsights.com"),
                format!(r#"{name} <span class="muted">insights</span>"#),
                package_meta(package, ctx.site_url),
            )
        }
        None => (
            "npminsights.com".to_string(),
            r#"all NPM packages <span class="muted">insights</span>"#.to_string(),
            r#"<meta name="description" content="Get insights about NPM packages and authors" />"#
                .to_string(),
        ),
    };
    let placeholder = if ctx.package.is_some() {
        "find another package"
    } else {
        "find a package"
    };

    // Slots carrying the package name are filled last.
    PAGE_HTML
        .replace("{{CARDS}}", &render_cards(ctx.insights))
        .replace("{{CHARTS}}", &render_charts(ctx.series))
        .replace("{{PLACEHOLDER}}", placeholder)
        .replace("{{META}}", &meta)
        .replace("{{HEADING}}", &heading)
        .replace("{{TITLE}}", &title)
}

fn package_meta(package: &str, site_url: &str) -> String {
    let name = escape_html(package);
    let site = escape_html(site_url);
    let description = format!("Get insights about {name} NPM package");
    let page_url = format!("{site}/package/{name}");
    let image_url = format!("{site}/api/package/og-image/{name}");

    [
        format!(r#"<meta name="description" content="{description}" />"#),
        format!(r#"<meta property="og:url" content="{page_url}" />"#),
        r#"<meta property="og:site_name" content="npminsights.com" />"#.to_string(),
        format!(r#"<meta property="og:title" content="{name}" />"#),
        format!(r#"<meta property="og:description" content="{description}" />"#),
        r#"<meta property="og:type" content="website" />"#.to_string(),
        format!(r#"<meta property="og:image" content="{image_url}" />"#),
        r#"<meta property="og:image:width" content="1200" />"#.to_string(),
        r#"<meta property="og:image:height" content="630" />"#.to_string(),
        r#"<meta name="twitter:card" content="summary_large_image" />"#.to_string(),
        format!(r#"<meta name="twitter:url" content="{page_url}" />"#),
        format!(r#"<meta name="twitter:title" content="{name}" />"#),
        format!(r#"<meta name="twitter:description" content="{description}" />"#),
        format!(r#"<meta name="twitter:image" content="{image_url}" />"#),
        format!(r#"<meta name="twitter:image:alt" content="{name} insights preview" />"#),
        r#"<meta name="twitter:domain" content="npminsights.com" />"#.to_string(),
    ]
    .join("\n  ")
}

fn render_cards(insights: &PackageInsights) -> String {
    cards(insights).iter().map(render_card).collect()
}

fn render_card(card: &Card) -> String {
    let change = card.change();
    let (class, sign) = if change > 0.0 { ("up", "+") } else { ("down", "") };
    format!(
        r#"<div class="card"><div class="card-head"><h3>{title}</h3><p class="{class}">{sign}{pct}%</p></div><div class="card-body"><span class="value">{value}</span><span class="muted">from {previous}</span></div></div>"#,
        title = card.title,
        pct = percentage(change),
        value = thousands(card.value),
        previous = thousands(card.previous),
    )
}

fn render_charts(series: &DashboardSeries) -> String {
    let mut out = String::new();
    for granularity in Granularity::ALL {
        let config = ChartConfig::default().with_date_format(granularity.date_format());

        let svg = match granularity {
            Granularity::Daily => AreaChart::new(
                recent(series.get(granularity), DAILY_WINDOW).to_vec(),
                config,
                AREA_WIDTH,
                AREA_HEIGHT,
            )
            .render_svg(),
            Granularity::Weekly => AreaChart::new(
                series.get(granularity).to_vec(),
                config,
                AREA_WIDTH,
                AREA_HEIGHT,
            )
            .render_svg(),
            Granularity::Monthly | Granularity::Yearly => BarsChart::new(
                series.get(granularity).to_vec(),
                config,
                AREA_WIDTH,
                AREA_HEIGHT,
            )
            .render_svg(),
        };

        out.push_str(&format!(
            "<section class=\"chart\"><h3>{}</h3>\n{svg}</section>\n",
            granularity.title()
        ));
    }
    out
}

const PAGE_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="UTF-8" />
  <meta name="viewport" content="width=device-width, initial-scale=1, maximum-scale=1.0, user-scalable=no" />
  <title>{{TITLE}}</title>
  {{META}}
  <link rel="icon" href="/favicon.ico" />
  <style>
    :root {
      --bg: #111827;
      --panel: #1f2937;
      --ink: #f8fafc;
      --muted: #9ca3af;
      --accent: #f59e0b;
      --up: #22c55e;
      --down: #dc2626;
    }

    * {
      box-sizing: border-box;
    }

    body {
      margin: 0;
      min-height: 100vh;
      background: var(--bg);
      color: var(--ink);
      font-family: "Space Grotesk", "Trebuchet MS", sans-serif;
      padding: 16px;
    }

    main {
      width: min(1100px, 100%);
      margin: 0 auto;
    }

    h1 {
      text-align: center;
      font-size: 2.25rem;
      margin: 32px 0;
    }

    .muted {
      color: var(--muted);
    }

    .search {
      position: relative;
      width: 100%;
      max-width: 32rem;
      margin: 16px auto;
    }

    .search input {
      width: 100%;
      border: none;
      border-radius: 4px;
      padding: 12px 24px;
      background: var(--panel);
      color: var(--ink);
      font-size: 1rem;
    }

    .search ul {
      position: absolute;
      left: 0;
      right: 0;
      margin: 4px 0 0;
      padding: 0;
      max-height: 20rem;
      overflow: auto;
      list-style: none;
      background: #374151;
      border-radius: 0 0 4px 4px;
      z-index: 10;
    }

    .search li {
      display: flex;
      flex-direction: column;
      padding: 8px 12px;
      cursor: pointer;
    }

    .search li.active,
    .search li:hover {
      background: rgba(245, 158, 11, 0.2);
    }

    .search li small {
      color: var(--muted);
    }

    .cards {
      display: grid;
      grid-template-columns: repeat(auto-fit, minmax(220px, 1fr));
      gap: 16px;
      margin-bottom: 32px;
    }

    .card {
      background: var(--panel);
      border-radius: 8px;
      padding: 16px;
    }

    .card-head {
      display: flex;
      justify-content: space-between;
      align-items: center;
    }

    .card-head h3 {
      margin: 0;
      font-size: 1.1rem;
    }

    .card-head p {
      margin: 0;
    }

    .card-head .up {
      color: var(--up);
    }

    .card-head .down {
      color: var(--down);
    }

    .card-body .value {
      color: #facc15;
      font-size: 1.5rem;
      margin-right: 8px;
    }

    .chart {
      position: relative;
      background: var(--panel);
      border-radius: 12px 12px 0 0;
      margin-bottom: 24px;
      padding-top: 32px;
    }

    .chart h3 {
      position: absolute;
      top: 8px;
      left: 16px;
      margin: 0;
      font-size: 0.85rem;
      text-transform: uppercase;
    }

    .chart svg {
      display: block;
      width: 100%;
      height: auto;
    }

    .grid-column {
      stroke: #f8fafc;
      stroke-opacity: 0.2;
      stroke-dasharray: 1 3;
    }

    .area {
      stroke-width: 1;
    }

    .axis {
      stroke: var(--accent);
    }

    .axis-label {
      fill: var(--accent);
      font-size: 10px;
    }

    .hover-zone .tooltip {
      visibility: hidden;
      pointer-events: none;
    }

    .hover-zone:hover .tooltip {
      visibility: visible;
    }

    .tooltip-line {
      stroke: var(--accent);
      stroke-width: 2;
      stroke-dasharray: 5 2;
    }

    .tooltip-dot {
      fill: var(--accent);
      stroke: white;
      stroke-width: 2;
    }

    .tooltip-value,
    .tooltip-date {
      fill: white;
      font-size: 14px;
      paint-order: stroke;
      stroke: var(--bg);
      stroke-width: 4px;
    }

    .chart-empty {
      fill: var(--muted);
    }
  </style>
</head>
<body>
  <main>
    <div class="search">
      <input id="search" placeholder="{{PLACEHOLDER}}" autocomplete="off" />
      <ul id="suggestions" hidden></ul>
    </div>
    <h1>{{HEADING}}</h1>
    <section class="cards">{{CARDS}}</section>
    {{CHARTS}}
  </main>

  <script>
    const input = document.getElementById('search');
    const list = document.getElementById('suggestions');
    let timer = null;
    let active = -1;
    let items = [];
    let latestQuery = '';

    const open = (name) => {
      window.location.href = '/package/' + name;
    };

    const render = (query) => {
      list.innerHTML = '';
      if (!items.length) {
        if (query) {
          const li = document.createElement('li');
          li.textContent = 'No package found';
          list.appendChild(li);
        }
        list.hidden = !query;
        return;
      }
      items.forEach((item, index) => {
        const li = document.createElement('li');
        li.className = index === active ? 'active' : '';
        const name = document.createElement('span');
        name.textContent = item.package.name;
        const description = document.createElement('small');
        description.textContent = item.package.description || '';
        li.append(name, description);
        li.addEventListener('mousedown', () => open(item.package.name));
        list.appendChild(li);
      });
      list.hidden = false;
    };

    const search = async (query) => {
      latestQuery = query;
      if (!query) {
        items = [];
        render('');
        return;
      }
      const res = await fetch('/api/suggestions?q=' + encodeURIComponent(query));
      const suggestions = res.ok ? await res.json() : [];
      if (query === latestQuery) {
        items = suggestions;
        active = -1;
        render(query);
      }
    };

    input.addEventListener('input', () => {
      clearTimeout(timer);
      const query = input.value.trim();
      timer = setTimeout(() => search(query).catch(() => {}), 300);
    });

    input.addEventListener('keydown', (event) => {
      if (event.key === 'ArrowDown' && items.length) {
        active = (active + 1) % items.length;
        render(latestQuery);
      } else if (event.key === 'ArrowUp' && items.length) {
        active = (active - 1 + items.length) % items.length;
        render(latestQuery);
      } else if (event.key === 'Enter') {
        const item = items[active] || items[0];
        if (item) {
          open(item.package.name);
        }
      } else if (event.key === 'Escape') {
        list.hidden = true;
      }
    });

    input.addEventListener('blur', () => {
      list.hidden = true;
    });
  </script>
</body>
</html>
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChartPoint;
    use chrono::NaiveDate;

    fn series() -> DashboardSeries {
        let point = |m: u32, value: f64| ChartPoint {
            date: NaiveDate::from_ymd_opt(2023, m, 1).unwrap(),
            value,
        };
        DashboardSeries {
            daily: vec![point(1, 5.0), point(2, 7.0)],
            weekly: vec![point(1, 35.0), point(2, 49.0)],
            monthly: vec![point(1, 150.0), point(2, 210.0)],
            yearly: vec![point(1, 1_234_567.0)],
        }
    }

    #[test]
    fn package_page_escapes_name_and_links_og_image() {
        let insights = PackageInsights::default();
        let series = series();
        let html = render_dashboard(&PageContext {
            package: Some("<evil>"),
            site_url: "https://npminsights.com",
            insights: &insights,
            series: &series,
        });

        assert!(!html.contains("<evil>"));
        assert!(html.contains("&lt;evil&gt; - npminsights.com"));
        assert!(html.contains("https://npminsights.com/api/package/og-image/&lt;evil&gt;"));
        assert!(html.contains("find another package"));
    }

    #[test]
    fn template_slots_in_package_name_stay_literal() {
        let insights = PackageInsights::default();
        let series = series();
        let html = render_dashboard(&PageContext {
            package: Some("{{CHARTS}}"),
            site_url: "https://npminsights.com",
            insights: &insights,
            series: &series,
        });

        assert_eq!(html.matches(r#"<section class="chart">"#).count(), 4);
        assert!(html.contains("&#123;&#123;CHARTS&#125;&#125; - npminsights.com"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn dashboard_renders_cards_and_all_charts() {
        let insights = PackageInsights {
            last_week: 1500,
            previous_week: 1000,
            ..PackageInsights::default()
        };
        let series = series();
        let html = render_dashboard(&PageContext {
            package: None,
            site_url: "https://npminsights.com",
            insights: &insights,
            series: &series,
        });

        assert!(html.contains("all NPM packages"));
        assert!(html.contains(r#"<p class="up">+50%</p>"#));
        assert!(html.contains("1,500"));
        for granularity in Granularity::ALL {
            assert!(html.contains(granularity.title()));
        }
        assert!(html.contains("1,234,567"));
        assert!(!html.contains("{{"));
    }
}
