// Bar chart of occurrences per outcome, rendered as PNG for the summary photo.
use crate::slots::OUTCOME_COUNT;
use image::{
    ImageFormat,
    Rgb,
    RgbImage,
};
use std::io::Cursor;

const BAR_WIDTH: u32 = 10;
const BAR_GAP: u32 = 2;
const MARGIN: u32 = 16;
const PLOT_HEIGHT: u32 = 320;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const BAR: Rgb<u8> = Rgb([31, 119, 180]);
const AXIS: Rgb<u8> = Rgb([64, 64, 64]);

pub fn width() -> u32 {
    2 * MARGIN + OUTCOME_COUNT as u32 * (BAR_WIDTH + BAR_GAP) - BAR_GAP
}

pub fn height() -> u32 {
    2 * MARGIN + PLOT_HEIGHT + 1
}

/// Pixel height of the bar for `count` when the tallest bar is `max`.
fn bar_height(count: u64, max: u64) -> u32 {
    if max == 0 {
        return 0;
    }
    let scaled = u128::from(count) * u128::from(PLOT_HEIGHT) / u128::from(max);
    // a non-zero count always shows up
    (scaled as u32).max(u32::from(count > 0))
}

pub fn render_image(occurrences: &[u64; OUTCOME_COUNT]) -> RgbImage {
    let mut image = RgbImage::from_pixel(width(), height(), BACKGROUND);
    let baseline = MARGIN + PLOT_HEIGHT;
    for x in MARGIN - 1..width() - MARGIN + 1 {
        image.put_pixel(x, baseline, AXIS);
    }
    let max = occurrences.iter().copied().max().unwrap_or_default();
    for (index, count) in occurrences.iter().enumerate() {
        let left = MARGIN + index as u32 * (BAR_WIDTH + BAR_GAP);
        let top = baseline - bar_height(*count, max);
        for x in left..left + BAR_WIDTH {
            for y in top..baseline {
                image.put_pixel(x, y, BAR);
            }
        }
    }
    image
}

pub fn render_png(occurrences: &[u64; OUTCOME_COUNT]) -> crate::Result<Vec<u8>> {
    let mut bytes = Vec::new();
    render_image(occurrences).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}
