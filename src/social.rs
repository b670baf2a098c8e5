//! Link-preview cards rasterized to 1200x630 PNG images.

use crate::format::{percentage, thousands};
use crate::insights::{cards, Card};
use crate::models::{ChartPoint, PackageInsights};
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder, ImageError};
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;
use tracing::debug;

pub const CARD_WIDTH: u32 = 1200;
pub const CARD_HEIGHT: u32 = 630;
pub const CONTENT_TYPE: &str = "image/png";
pub const CACHE_CONTROL: &str = "public, immutable, no-transform, max-age=21600";

const BACKGROUND: RGBColor = RGBColor(17, 24, 39);
const PANEL: RGBColor = RGBColor(31, 41, 55);
const BAR: RGBColor = RGBColor(241, 245, 249);
const TEXT: RGBColor = RGBColor(243, 244, 246);
const MUTED: RGBColor = RGBColor(156, 163, 175);
const HIGHLIGHT: RGBColor = RGBColor(250, 204, 21);
const UP: RGBColor = RGBColor(34, 197, 94);
const DOWN: RGBColor = RGBColor(220, 38, 38);
const FONT: &str = "sans-serif";

type Canvas<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

#[derive(Debug, Error)]
pub enum SocialCardError {
    #[error("failed to draw social card: {0}")]
    Drawing(String),

    #[error("failed to encode social card: {0}")]
    Encoding(#[from] ImageError),
}

impl<T> From<DrawingAreaErrorKind<T>> for SocialCardError
where
    T: std::error::Error + Send + Sync + 'static,
{
    fn from(err: DrawingAreaErrorKind<T>) -> Self {
        Self::Drawing(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardLayout {
    /// Three stacked cards beside a large chart, for Open Graph previews.
    OpenGraph,
    /// A row of four cards above a wide chart, for README embeds.
    Readme,
}

/// Draws the card and returns it PNG-encoded.
pub fn render_social_card(
    layout: CardLayout,
    package: &str,
    insights: &PackageInsights,
    monthly: &[ChartPoint],
) -> Result<Vec<u8>, SocialCardError> {
    let mut pixels = vec![0u8; (CARD_WIDTH * CARD_HEIGHT * 3) as usize];
    {
        let root = BitMapBackend::with_buffer(&mut pixels, (CARD_WIDTH, CARD_HEIGHT))
            .into_drawing_area();
        root.fill(&BACKGROUND)?;
        draw_layout(&root, layout, package, insights, monthly)?;
        label(
            &root,
            "npminsights.com",
            (CARD_WIDTH as i32 / 2, CARD_HEIGHT as i32 - 24),
            14.0,
            &TEXT,
            HPos::Center,
        );
        root.present()?;
    }

    let mut png = Vec::new();
    PngEncoder::new(&mut png).write_image(&pixels, CARD_WIDTH, CARD_HEIGHT, ColorType::Rgb8)?;
    Ok(png)
}

fn draw_layout(
    root: &Canvas<'_>,
    layout: CardLayout,
    package: &str,
    insights: &PackageInsights,
    monthly: &[ChartPoint],
) -> Result<(), SocialCardError> {
    let title = format!("{package} insights");
    let all_cards = cards(insights);

    match layout {
        CardLayout::OpenGraph => {
            label(root, &title, (600, 30), 60.0, &TEXT, HPos::Center);
            for (row, card) in all_cards[1..].iter().enumerate() {
                stat_card(root, card, (32, 140 + row as i32 * 150), (320, 126))?;
            }
            monthly_bars(&root.clone().shrink((410, 130), (750, 450)), monthly)?;
        }
        CardLayout::Readme => {
            label(root, &title, (600, 24), 36.0, &TEXT, HPos::Center);
            label(root, "Downloads", (56, 84), 20.0, &TEXT, HPos::Left);
            for (column, card) in all_cards.iter().enumerate() {
                stat_card(root, card, (40 + column as i32 * 284, 120), (260, 120))?;
            }
            label(root, "Monthly downloads history", (56, 266), 20.0, &TEXT, HPos::Left);
            monthly_bars(&root.clone().shrink((200, 300), (800, 290)), monthly)?;
        }
    }
    Ok(())
}

fn stat_card(
    root: &Canvas<'_>,
    card: &Card,
    (x, y): (i32, i32),
    (width, height): (i32, i32),
) -> Result<(), SocialCardError> {
    root.draw(&Rectangle::new(
        [(x, y), (x + width, y + height)],
        PANEL.filled(),
    ))?;

    let change = card.change();
    let (color, sign) = if change > 0.0 { (&UP, "+") } else { (&DOWN, "") };
    let right = x + width - 16;
    label(root, card.title, (x + 16, y + 14), 24.0, &TEXT, HPos::Left);
    label(
        root,
        &format!("{sign}{}%", percentage(change)),
        (right, y + 16),
        20.0,
        color,
        HPos::Right,
    );
    label(root, &thousands(card.value), (x + 16, y + 52), 24.0, &HIGHLIGHT, HPos::Left);
    label(
        root,
        &format!("from {}", thousands(card.previous)),
        (x + 16, y + 88),
        16.0,
        &MUTED,
        HPos::Left,
    );
    Ok(())
}

/// One bar per month, with a third of headroom above the tallest bar.
fn monthly_bars(area: &Canvas<'_>, monthly: &[ChartPoint]) -> Result<(), SocialCardError> {
    if monthly.is_empty() {
        return Ok(());
    }
    let count = monthly.len() as u32;
    let max = monthly.iter().map(|point| point.value).fold(0.0, f64::max);
    let y_max = if max > 0.0 { max * 4.0 / 3.0 } else { 1.0 };

    let mut chart = ChartBuilder::on(area)
        .margin(8)
        .build_cartesian_2d((0u32..count).into_segmented(), 0.0..y_max)?;
    chart.draw_series(
        Histogram::vertical(&chart)
            .style(BAR.filled())
            .margin(2)
            .data(
                monthly
                    .iter()
                    .enumerate()
                    .map(|(index, point)| (index as u32, point.value)),
            ),
    )?;
    Ok(())
}

/// Text needs a system font. Without one the card is still drawn, unlabelled.
fn label(
    area: &Canvas<'_>,
    text: &str,
    pos: (i32, i32),
    size: f64,
    color: &RGBColor,
    anchor: HPos,
) {
    let style = (FONT, size)
        .into_font()
        .color(color)
        .pos(Pos::new(anchor, VPos::Top));
    if let Err(err) = area.draw_text(text, &style, pos) {
        debug!("skipping social card label {text:?}: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use image::RgbImage;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn monthly() -> Vec<ChartPoint> {
        (1..=6)
            .map(|month| ChartPoint {
                date: NaiveDate::from_ymd_opt(2023, month, 1).unwrap(),
                value: month as f64 * 1000.0,
            })
            .collect()
    }

    fn decode(png: &[u8]) -> RgbImage {
        assert_eq!(&png[..8], &PNG_SIGNATURE);
        let image = image::load_from_memory(png).unwrap().to_rgb8();
        assert_eq!(image.dimensions(), (CARD_WIDTH, CARD_HEIGHT));
        image
    }

    fn is(image: &RgbImage, (x, y): (u32, u32), color: RGBColor) -> bool {
        image.get_pixel(x, y).0 == [color.0, color.1, color.2]
    }

    fn count_of(image: &RgbImage, color: RGBColor) -> usize {
        image
            .pixels()
            .filter(|pixel| pixel.0 == [color.0, color.1, color.2])
            .count()
    }

    #[test]
    fn open_graph_card_is_png_with_three_stats_and_bars() {
        let insights = PackageInsights {
            last_week: 2000,
            previous_week: 1000,
            ..PackageInsights::default()
        };
        let png = render_social_card(CardLayout::OpenGraph, "left-pad", &insights, &monthly())
            .unwrap();
        let image = decode(&png);

        assert!(is(&image, (5, 5), BACKGROUND));
        for row in 0..3 {
            assert!(is(&image, (36, 140 + row * 150 + 120), PANEL), "card {row}");
        }
        // Bars live in the chart area only.
        assert!(count_of(&image, BAR) > 1000);
        assert!(image
            .enumerate_pixels()
            .filter(|(_, _, pixel)| pixel.0 == [BAR.0, BAR.1, BAR.2])
            .all(|(x, y, _)| x >= 410 && y >= 130));
    }

    #[test]
    fn readme_card_has_four_stats() {
        let png = render_social_card(
            CardLayout::Readme,
            "@scope/pkg",
            &PackageInsights::default(),
            &monthly(),
        )
        .unwrap();
        let image = decode(&png);

        for column in 0..4 {
            assert!(is(&image, (44 + column * 284, 230), PANEL), "card {column}");
        }
        assert!(count_of(&image, BAR) > 1000);
    }

    #[test]
    fn card_without_history_has_no_bars() {
        let png = render_social_card(
            CardLayout::OpenGraph,
            "fresh",
            &PackageInsights::default(),
            &[],
        )
        .unwrap();
        let image = decode(&png);
        assert_eq!(count_of(&image, BAR), 0);
    }
}
