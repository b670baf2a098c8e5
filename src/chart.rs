//! Scales, tooltip interaction and SVG rendering for downloads charts.

use crate::format::{compact, escape_html, thousands_f64};
use crate::locate::locate;
use crate::models::ChartPoint;
use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::fmt::{self, Write};
use std::sync::Arc;

pub type DateFormatter = Arc<dyn Fn(NaiveDate) -> String + Send + Sync>;
pub type ValueFormatter = Arc<dyn Fn(f64) -> String + Send + Sync>;

#[derive(Clone)]
pub struct ChartConfig {
    pub margin_top: f64,
    pub margin_right: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub date_formatter: DateFormatter,
    pub value_formatter: ValueFormatter,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            margin_top: 0.0,
            margin_right: 0.0,
            margin_bottom: 0.0,
            margin_left: 0.0,
            date_formatter: Arc::new(|date: NaiveDate| date.format("%Y-%m-%d").to_string()),
            value_formatter: Arc::new(thousands_f64),
        }
    }
}

impl fmt::Debug for ChartConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChartConfig")
            .field("margin_top", &self.margin_top)
            .field("margin_right", &self.margin_right)
            .field("margin_bottom", &self.margin_bottom)
            .field("margin_left", &self.margin_left)
            .finish_non_exhaustive()
    }
}

impl ChartConfig {
    /// Formats dates with a chrono format string such as `%b %Y`.
    pub fn with_date_format(mut self, pattern: &str) -> Self {
        let pattern = pattern.to_string();
        self.date_formatter = Arc::new(move |date: NaiveDate| date.format(&pattern).to_string());
        self
    }

    pub fn with_margins(mut self, top: f64, right: f64, bottom: f64, left: f64) -> Self {
        self.margin_top = top;
        self.margin_right = right;
        self.margin_bottom = bottom;
        self.margin_left = left;
        self
    }
}

/// Linear mapping between a date-time domain and a pixel range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    domain: (NaiveDateTime, NaiveDateTime),
    range: (f64, f64),
}

impl TimeScale {
    pub fn new(domain: (NaiveDateTime, NaiveDateTime), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    /// Domain is the extent of the point dates.
    pub fn from_points(points: &[ChartPoint], range: (f64, f64)) -> Option<Self> {
        let first = points.iter().map(|point| point.date).min()?;
        let last = points.iter().map(|point| point.date).max()?;
        Some(Self::new(
            (NaiveDateTime::from(first), NaiveDateTime::from(last)),
            range,
        ))
    }

    fn span_ms(&self) -> f64 {
        (self.domain.1 - self.domain.0).num_milliseconds() as f64
    }

    pub fn scale(&self, time: NaiveDateTime) -> f64 {
        let span = self.span_ms();
        if span == 0.0 {
            return (self.range.0 + self.range.1) / 2.0;
        }
        let offset = (time - self.domain.0).num_milliseconds() as f64;
        self.range.0 + offset / span * (self.range.1 - self.range.0)
    }

    pub fn scale_date(&self, date: NaiveDate) -> f64 {
        self.scale(NaiveDateTime::from(date))
    }

    /// Pixel to domain. Pixels outside the range extrapolate, saturating at
    /// the limits of `NaiveDateTime`.
    pub fn invert(&self, pixel: f64) -> NaiveDateTime {
        let width = self.range.1 - self.range.0;
        if width == 0.0 {
            return self.domain.0;
        }
        let offset = (pixel - self.range.0) / width * self.span_ms();
        if offset.is_nan() {
            return self.domain.0;
        }
        let limit = if offset < 0.0 {
            NaiveDateTime::MIN
        } else {
            NaiveDateTime::MAX
        };
        // `as` saturates, so huge offsets clamp to i64 before the range check.
        Duration::try_milliseconds(offset.round() as i64)
            .and_then(|delta| self.domain.0.checked_add_signed(delta))
            .unwrap_or(limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearScale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self { domain, range }
    }

    pub fn scale(&self, value: f64) -> f64 {
        let span = self.domain.1 - self.domain.0;
        if span == 0.0 {
            return (self.range.0 + self.range.1) / 2.0;
        }
        self.range.0 + (value - self.domain.0) / span * (self.range.1 - self.range.0)
    }
}

/// Step between roughly `count` round ticks covering `[0, max]`.
fn tick_step(max: f64, count: usize) -> f64 {
    let raw = max / count.max(1) as f64;
    let power = 10f64.powf(raw.log10().floor());
    let error = raw / power;
    if error >= 50f64.sqrt() {
        power * 10.0
    } else if error >= 10f64.sqrt() {
        power * 5.0
    } else if error >= 2f64.sqrt() {
        power * 2.0
    } else {
        power
    }
}

pub fn ticks(max: f64, count: usize) -> Vec<f64> {
    if !(max > 0.0) {
        return vec![0.0];
    }
    let step = tick_step(max, count);
    let steps = (max / step).floor() as usize;
    (0..=steps).map(|index| index as f64 * step).collect()
}

/// Extends `max` to the next tick boundary.
pub fn nice_max(max: f64) -> f64 {
    if !(max > 0.0) {
        return 1.0;
    }
    let step = tick_step(max, 10);
    (max / step).ceil() * step
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tooltip {
    pub point: ChartPoint,
    pub pixel_x: f64,
    pub pixel_y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum TooltipState {
    #[default]
    Idle,
    Hovering(Tooltip),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Move { x: f64 },
    TouchStart { x: f64 },
    TouchMove { x: f64 },
    Leave,
}

/// Pixel span of the chart in which the pointer snaps to one point.
///
/// Neighbouring zones share a boundary. It belongs to the earlier zone,
/// matching the tie rule of `locate`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoverZone {
    pub index: usize,
    pub x_start: f64,
    pub x_end: f64,
}

impl HoverZone {
    pub fn contains(&self, x: f64) -> bool {
        let after_start = if self.index == 0 {
            x >= self.x_start
        } else {
            x > self.x_start
        };
        after_start && x <= self.x_end
    }
}

/// Area chart over a time-scaled x axis.
#[derive(Debug, Clone)]
pub struct AreaChart {
    points: Vec<ChartPoint>,
    config: ChartConfig,
    width: f64,
    height: f64,
    date_scale: Option<TimeScale>,
    value_scale: LinearScale,
}

impl AreaChart {
    pub fn new(points: Vec<ChartPoint>, config: ChartConfig, width: f64, height: f64) -> Self {
        let inner_width = width - config.margin_left - config.margin_right;
        let inner_height = height - config.margin_top - config.margin_bottom;

        let date_scale = TimeScale::from_points(
            &points,
            (config.margin_left, config.margin_left + inner_width),
        );
        let max = points.iter().map(|point| point.value).fold(0.0, f64::max);
        let value_scale = LinearScale::new(
            (0.0, nice_max(max + inner_height / 3.0)),
            (inner_height + config.margin_top, config.margin_top),
        );

        Self {
            points,
            config,
            width,
            height,
            date_scale,
            value_scale,
        }
    }

    pub fn points(&self) -> &[ChartPoint] {
        &self.points
    }

    pub fn date_scale(&self) -> Option<&TimeScale> {
        self.date_scale.as_ref()
    }

    pub fn value_y(&self, value: f64) -> f64 {
        self.value_scale.scale(value)
    }

    /// Nearest point to a horizontal pixel coordinate.
    pub fn on_hover(&self, pixel_x: f64) -> Option<&ChartPoint> {
        let scale = self.date_scale.as_ref()?;
        locate(&self.points, scale.invert(pixel_x))
    }

    pub fn tooltip_at(&self, pixel_x: f64) -> TooltipState {
        match self.on_hover(pixel_x) {
            Some(point) => TooltipState::Hovering(Tooltip {
                point: *point,
                pixel_x,
                pixel_y: self.value_y(point.value),
            }),
            None => TooltipState::Idle,
        }
    }

    /// Splits the plot width at the pixel midpoints between neighbouring
    /// points, which is where `on_hover` switches from one point to the next.
    pub fn hover_zones(&self) -> Vec<HoverZone> {
        let Some(scale) = self.date_scale.as_ref() else {
            return Vec::new();
        };
        let left = self.config.margin_left;
        let right = self.width - self.config.margin_right;
        let xs: Vec<f64> = self
            .points
            .iter()
            .map(|point| scale.scale_date(point.date))
            .collect();

        (0..xs.len())
            .map(|index| HoverZone {
                index,
                x_start: if index == 0 {
                    left
                } else {
                    (xs[index - 1] + xs[index]) / 2.0
                },
                x_end: if index + 1 == xs.len() {
                    right
                } else {
                    (xs[index] + xs[index + 1]) / 2.0
                },
            })
            .collect()
    }

    pub fn render_svg(&self) -> String {
        let mut svg = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_svg(&mut svg);
        svg
    }

    fn write_svg(&self, svg: &mut String) -> fmt::Result {
        let (width, height) = (self.width, self.height);
        let top = self.config.margin_top;
        let bottom = height - self.config.margin_bottom;
        writeln!(
            svg,
            r#"<svg class="area-chart" viewBox="0 0 {width} {height}" width="100%" role="img">"#
        )?;
        svg.push_str(concat!(
            r#"<defs><linearGradient id="area-gradient" x1="0" y1="0" x2="0" y2="1">"#,
            r##"<stop offset="0%" stop-color="#f8fafc" stop-opacity="1"/>"##,
            r##"<stop offset="100%" stop-color="#f8fafc" stop-opacity="0.1"/>"##,
            "</linearGradient></defs>\n"
        ));

        let Some(scale) = self.date_scale.as_ref() else {
            writeln!(
                svg,
                r#"<text class="chart-empty" x="50%" y="50%" text-anchor="middle">No data yet</text></svg>"#
            )?;
            return Ok(());
        };

        let columns = 10.min(self.points.len());
        for column in 0..columns {
            let point = &self.points[column * self.points.len() / columns];
            let x = scale.scale_date(point.date);
            writeln!(
                svg,
                r#"<line class="grid-column" x1="{x:.2}" y1="{top}" x2="{x:.2}" y2="{bottom}"/>"#
            )?;
        }

        let baseline = self.value_y(0.0);
        let mut path = String::new();
        for (index, point) in self.points.iter().enumerate() {
            let command = if index == 0 { 'M' } else { 'L' };
            write!(
                path,
                "{command}{:.2},{:.2} ",
                scale.scale_date(point.date),
                self.value_y(point.value)
            )?;
        }
        if let (Some(first), Some(last)) = (self.points.first(), self.points.last()) {
            write!(
                path,
                "L{:.2},{baseline:.2} L{:.2},{baseline:.2} Z",
                scale.scale_date(last.date),
                scale.scale_date(first.date)
            )?;
        }
        writeln!(
            svg,
            r#"<path class="area" d="{path}" fill="url(#area-gradient)" stroke="url(#area-gradient)"/>"#
        )?;

        // Later zones are painted first so a shared edge stays with the
        // earlier point.
        for zone in self.hover_zones().into_iter().rev() {
            let point = &self.points[zone.index];
            let x = scale.scale_date(point.date);
            let y = self.value_y(point.value);
            let value = escape_html(&(self.config.value_formatter)(point.value));
            let date = escape_html(&(self.config.date_formatter)(point.date));
            writeln!(
                svg,
                concat!(
                    r#"<g class="hover-zone">"#,
                    r#"<rect x="{x0:.2}" y="{top}" width="{w:.2}" height="{h}" fill="transparent"/>"#,
                    r#"<g class="tooltip">"#,
                    r#"<line x1="{x:.2}" y1="{top}" x2="{x:.2}" y2="{bottom}" class="tooltip-line"/>"#,
                    r#"<circle cx="{x:.2}" cy="{y:.2}" r="4" class="tooltip-dot"/>"#,
                    r#"<text x="{tx:.2}" y="{ty:.2}" class="tooltip-value">{value}</text>"#,
                    r#"<text x="{x:.2}" y="{dy:.2}" text-anchor="middle" class="tooltip-date">{date}</text>"#,
                    "</g></g>"
                ),
                x0 = zone.x_start,
                w = (zone.x_end - zone.x_start).max(0.0),
                h = bottom - top,
                top = top,
                bottom = bottom,
                x = x,
                y = y,
                value = value,
                date = date,
                tx = x + 12.0,
                ty = (y - 28.0).max(top + 14.0),
                dy = bottom - 8.0,
            )?;
        }

        svg.push_str("</svg>\n");
        Ok(())
    }
}

/// Interaction state of one chart instance.
#[derive(Debug, Default)]
pub struct ChartInteraction {
    state: TooltipState,
}

impl ChartInteraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TooltipState {
        &self.state
    }

    pub fn handle(&mut self, chart: &AreaChart, event: PointerEvent) -> &TooltipState {
        self.state = match event {
            PointerEvent::Move { x }
            | PointerEvent::TouchStart { x }
            | PointerEvent::TouchMove { x } => chart.tooltip_at(x),
            PointerEvent::Leave => TooltipState::Idle,
        };
        &self.state
    }
}

/// Evenly spaced bands with padding on both sides, pixel-rounded.
#[derive(Debug, Clone, Copy, PartialEq)]
struct BandScale {
    start: f64,
    step: f64,
    bandwidth: f64,
}

impl BandScale {
    fn new(count: usize, range: (f64, f64), padding: f64) -> Self {
        let n = count as f64;
        let extent = range.1 - range.0;
        let step = (extent / (n - padding + padding * 2.0).max(1.0)).floor();
        let start = (range.0 + (extent - step * (n - padding)) / 2.0).round();
        let bandwidth = (step * (1.0 - padding)).round();
        Self {
            start,
            step,
            bandwidth,
        }
    }

    fn x(&self, index: usize) -> f64 {
        self.start + self.step * index as f64
    }
}

/// Bar chart over evenly spaced buckets.
#[derive(Debug, Clone)]
pub struct BarsChart {
    points: Vec<ChartPoint>,
    config: ChartConfig,
    width: f64,
    height: f64,
}

impl BarsChart {
    const LEFT_MARGIN: f64 = 40.0;
    const VERTICAL_MARGIN: f64 = 70.0;

    pub fn new(points: Vec<ChartPoint>, config: ChartConfig, width: f64, height: f64) -> Self {
        Self {
            points,
            config,
            width,
            height,
        }
    }

    /// Date labels along the bottom only fit when bars are wide enough.
    pub fn shows_bottom_axis(&self) -> bool {
        !self.points.is_empty() && self.width / self.points.len() as f64 > 15.0
    }

    fn layout(&self) -> (BandScale, LinearScale, f64) {
        let x_max = self.width - Self::LEFT_MARGIN;
        let y_max = self.height - Self::VERTICAL_MARGIN;
        let max = self.points.iter().map(|point| point.value).fold(0.0, f64::max);
        let bands = BandScale::new(self.points.len(), (0.0, x_max), 0.1);
        let values = LinearScale::new((0.0, max), (y_max, 0.0));
        (bands, values, y_max)
    }

    /// Full chart with axes and per-bar tooltips.
    pub fn render_svg(&self) -> String {
        let mut svg = String::new();
        let _ = self.write_svg(&mut svg);
        svg
    }

    fn write_svg(&self, svg: &mut String) -> fmt::Result {
        let (width, height) = (self.width, self.height);
        let (bands, values, y_max) = self.layout();
        let half_margin = Self::VERTICAL_MARGIN / 2.0;

        writeln!(
            svg,
            r#"<svg class="bars-chart" viewBox="0 0 {width} {height}" width="{width}" height="{height}" xmlns="http://www.w3.org/2000/svg">"#
        )?;
        svg.push_str(concat!(
            r#"<defs><linearGradient id="bars-gradient" x1="0" y1="0" x2="0" y2="1">"#,
            r##"<stop offset="0%" stop-color="#f1f5f9" stop-opacity="1"/>"##,
            r##"<stop offset="100%" stop-color="#f8fafc" stop-opacity="0.1"/>"##,
            "</linearGradient></defs>\n"
        ));
        writeln!(
            svg,
            r#"<g transform="translate({}, {half_margin})">"#,
            Self::LEFT_MARGIN
        )?;

        for (index, point) in self.points.iter().enumerate() {
            let bar_x = bands.x(index);
            let bar_y = values.scale(point.value).round();
            let bar_height = (y_max - bar_y).max(0.0);
            let date = escape_html(&(self.config.date_formatter)(point.date));
            let value = escape_html(&(self.config.value_formatter)(point.value));
            writeln!(
                svg,
                concat!(
                    r#"<g class="hover-zone">"#,
                    r#"<rect x="{bar_x}" y="{bar_y}" width="{bw}" height="{bar_height}" fill="url(#bars-gradient)"/>"#,
                    r#"<g class="tooltip"><text x="{cx}" y="{ty}" text-anchor="middle" class="tooltip-date">{date}</text>"#,
                    r#"<text x="{cx}" y="{vy}" text-anchor="middle" class="tooltip-value">{value}</text></g></g>"#
                ),
                bar_x = bar_x,
                bar_y = bar_y,
                bar_height = bar_height,
                bw = bands.bandwidth,
                cx = bar_x + bands.bandwidth / 2.0,
                date = date,
                value = value,
                ty = bar_y - 22.0,
                vy = bar_y - 6.0,
            )?;
        }

        let max = self.points.iter().map(|point| point.value).fold(0.0, f64::max);
        writeln!(svg, r#"<line class="axis" x1="0" y1="0" x2="0" y2="{y_max}"/>"#)?;
        for tick in ticks(max, 5) {
            let y = values.scale(tick).round();
            writeln!(
                svg,
                r#"<text class="axis-label" x="-4" y="{:.1}" text-anchor="end">{}</text>"#,
                y + 3.0,
                compact(tick)
            )?;
        }
        if self.shows_bottom_axis() {
            writeln!(
                svg,
                r#"<line class="axis" x1="0" y1="{y_max}" x2="{}" y2="{y_max}"/>"#,
                width - Self::LEFT_MARGIN
            )?;
            for (index, point) in self.points.iter().enumerate() {
                writeln!(
                    svg,
                    r#"<text class="axis-label" x="{}" y="{}" text-anchor="middle">{}</text>"#,
                    bands.x(index) + bands.bandwidth / 2.0,
                    y_max + 18.0,
                    escape_html(&(self.config.date_formatter)(point.date))
                )?;
            }
        }

        svg.push_str("</g></svg>\n");
        Ok(())
    }
}
