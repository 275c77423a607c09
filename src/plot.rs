use crate::{
    core::{BezPath, Point},
    error::{JoyplotError, JoyplotResult},
    frame::VideoFrame,
    layout::Layout,
    mapper::{map_point, map_x},
    params::Params,
};

/// Offset of the base vertices below the line ends, in logical pixels.
pub const BASE_DROP: f64 = 1.0;

/// Closed shape for the line at source row `y`.
///
/// The scan walks columns `0, R, 2R, ..` below `crop.end_x`; scan step `k`
/// samples envelope weight `k`. Only columns strictly inside the crop window
/// emit vertices. A flat base one pixel below the left end caps both sides so
/// the filled shape never crosses itself.
pub fn build_line(y: u32, frame: &VideoFrame, params: &Params, layout: &Layout) -> BezPath {
    let crop = layout.crop;
    let step = params.sampling_resolution.max(1);

    let left = map_point(crop.start_x, y, 0, frame, params, layout);
    let base_y = left.y + BASE_DROP;

    let mut path = BezPath::new();
    path.move_to(Point::new(left.x, base_y));

    let mut index = 0usize;
    let mut x = 0u32;
    while x < crop.end_x {
        if x > crop.start_x {
            path.line_to(map_point(x, y, index, frame, params, layout));
        }
        index += 1;
        x = match x.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }

    path.line_to(Point::new(map_x(crop.end_x, params, layout), base_y));
    path.close_path();
    path
}

/// Rows that receive a line: `0, pitch, 2 * pitch, ..` below the frame height.
pub fn line_rows(frame_height: u32, line_pitch: u32) -> impl Iterator<Item = u32> {
    (0..frame_height).step_by(line_pitch.max(1) as usize)
}

/// Every line shape for one frame, top to bottom.
///
/// Fails without producing any shape when `layout` was computed for a frame
/// of different size.
pub fn build_lines(
    frame: &VideoFrame,
    params: &Params,
    layout: &Layout,
) -> JoyplotResult<Vec<BezPath>> {
    if !layout.fits_frame(frame.width(), frame.height()) {
        return Err(JoyplotError::render(format!(
            "layout computed for {}x{} but frame is {}x{}",
            layout.frame_width,
            layout.frame_height,
            frame.width(),
            frame.height()
        )));
    }

    Ok(line_rows(frame.height(), params.line_pitch)
        .map(|y| build_line(y, frame, params, layout))
        .collect())
}

#[cfg(test)]
mod tests {
    use kurbo::PathEl;

    use super::*;
    use crate::core::Surface;

    fn layout_for(frame: &VideoFrame, params: &Params) -> Layout {
        Layout::compute(
            params,
            frame.width(),
            frame.height(),
            Surface::new(960, 720, 1.0).unwrap(),
        )
        .unwrap()
    }

    fn points(path: &BezPath) -> Vec<Point> {
        path.elements()
            .iter()
            .filter_map(|el| match *el {
                PathEl::MoveTo(p) | PathEl::LineTo(p) => Some(p),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn line_has_bases_and_one_vertex_per_inner_sample() {
        let frame = VideoFrame::solid(480, 360, 128).unwrap();
        let params = Params::default();
        let layout = layout_for(&frame, &params);

        let path = build_line(40, &frame, &params, &layout);
        let els = path.elements();
        assert!(matches!(els.first(), Some(PathEl::MoveTo(_))));
        assert!(matches!(els.last(), Some(PathEl::ClosePath)));

        // columns 122..=358 step 2, plus two base vertices
        let pts = points(&path);
        assert_eq!(pts.len(), 119 + 2);
    }

    #[test]
    fn bases_share_one_row_below_the_left_end() {
        let frame = VideoFrame::from_fn(480, 360, |x, _| (x % 256) as u8).unwrap();
        let params = Params::default();
        let layout = layout_for(&frame, &params);

        let path = build_line(100, &frame, &params, &layout);
        let pts = points(&path);
        let left = map_point(120, 100, 0, &frame, &params, &layout);
        let first = pts[0];
        let last = *pts.last().unwrap();

        assert_eq!(first, Point::new(left.x, left.y + BASE_DROP));
        assert_eq!(last.y, first.y);
        assert_eq!(last.x, map_x(360, &params, &layout));
    }

    #[test]
    fn envelope_index_follows_the_scan_counter() {
        let frame = VideoFrame::solid(480, 360, 255).unwrap();
        let params = Params::default();
        let layout = layout_for(&frame, &params);

        let pts = points(&build_line(50, &frame, &params, &layout));
        // first inner vertex is column 122 = scan step 61
        assert_eq!(pts[1], map_point(122, 50, 61, &frame, &params, &layout));
        // the tallest peak sits on the frame centre (column 240, weight 1)
        let top = pts
            .iter()
            .skip(1)
            .take(pts.len() - 2)
            .min_by(|a, b| a.y.total_cmp(&b.y))
            .unwrap();
        assert_eq!(top.x, map_x(240, &params, &layout));
    }

    #[test]
    fn black_frame_lines_are_flat() {
        let frame = VideoFrame::solid(480, 360, 0).unwrap();
        let params = Params::default();
        let layout = layout_for(&frame, &params);

        for (n, path) in build_lines(&frame, &params, &layout).unwrap().iter().enumerate() {
            let y = n as u32 * params.line_pitch;
            let expected =
                f64::from(y) * layout.scales.height * params.centre_scaling + layout.origin.y;
            let pts = points(path);
            for p in &pts[1..pts.len() - 1] {
                assert!((p.y - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn one_line_per_pitch_row() {
        let frame = VideoFrame::solid(64, 48, 10).unwrap();
        let params = Params {
            line_pitch: 5,
            ..Params::default()
        };
        let layout = layout_for(&frame, &params);
        assert_eq!(build_lines(&frame, &params, &layout).unwrap().len(), 10);
        assert_eq!(line_rows(48, 5).last(), Some(45));
    }

    #[test]
    fn stale_layout_is_rejected_whole() {
        let params = Params::default();
        let small = VideoFrame::solid(64, 48, 0).unwrap();
        let big = VideoFrame::solid(128, 96, 0).unwrap();
        let layout = layout_for(&small, &params);
        assert!(build_lines(&big, &params, &layout).is_err());
    }

    #[test]
    fn full_width_crop_reads_inside_the_frame() {
        let frame = VideoFrame::solid(31, 9, 200).unwrap();
        let params = Params {
            width_crop: 1.0,
            sampling_resolution: 3,
            line_pitch: 1,
            ..Params::default()
        };
        let layout = layout_for(&frame, &params);
        let lines = build_lines(&frame, &params, &layout).unwrap();
        assert_eq!(lines.len(), 9);
        for path in &lines {
            assert!(points(path).iter().all(|p| p.x.is_finite() && p.y.is_finite()));
        }
    }
}
