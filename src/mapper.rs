use crate::{core::Point, frame::VideoFrame, layout::Layout, params::Params};

/// Row after lifting `y` by the brightness-driven displacement.
///
/// Brighter pixels and larger weights move the row up (toward smaller `y`).
pub fn displaced_row(y: u32, brightness: u8, weight: f64, params: &Params) -> f64 {
    let displacement =
        f64::from(brightness) * weight * params.curve_strength * params.peak_height_scale();
    f64::from(y) - displacement
}

/// Output x for source column `x`.
pub fn map_x(x: u32, params: &Params, layout: &Layout) -> f64 {
    layout.origin.x + (f64::from(x) * layout.scales.width) * params.centre_scaling
}

/// Output y for a (possibly displaced) source row.
pub fn map_row(row: f64, params: &Params, layout: &Layout) -> f64 {
    layout.origin.y + (row * layout.scales.height) * params.centre_scaling
}

/// Map source pixel `(x, y)` sampled at envelope position `envelope_index`
/// into logical output coordinates.
///
/// Pure: the result depends only on the arguments.
pub fn map_point(
    x: u32,
    y: u32,
    envelope_index: usize,
    frame: &VideoFrame,
    params: &Params,
    layout: &Layout,
) -> Point {
    let row = displaced_row(
        y,
        frame.brightness(x, y),
        layout.envelope.weight(envelope_index),
        params,
    );
    Point::new(map_x(x, params, layout), map_row(row, params, layout))
}
