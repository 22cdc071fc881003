//! The vector backend: a recording surface with a Cairo-shaped API.
//!
//! Drawing calls are flattened to device space as they arrive and appended
//! to a display list; `show_page` seals the list into a page. Nothing is
//! rasterized: the PDF writer in [pdf] replays the recorded operations
//! into content streams.

pub(crate) mod pdf;

use crate::{font::Slant, matrix::Matrix};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub(crate) struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PathElement {
    MoveTo(Point),
    LineTo(Point),
    CurveTo(Point, Point, Point),
    Close,
}

/// A device-space path
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Path {
    pub elements: Vec<PathElement>,
}

impl Path {
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// The point the pen rests at after replaying the path, plus the start
    /// of the open subpath
    fn end_state(&self) -> (Option<Point>, Option<Point>) {
        let mut current = None;
        let mut subpath_start = None;

        for element in &self.elements {
            match element {
                PathElement::MoveTo(p) => {
                    current = Some(*p);
                    subpath_start = Some(*p);
                }
                PathElement::LineTo(p) => current = Some(*p),
                PathElement::CurveTo(.., p) => current = Some(*p),
                PathElement::Close => current = subpath_start,
            }
        }

        (current, subpath_start)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FillRule {
    Winding,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineCap {
    Butt,
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LineJoin {
    Miter,
    Round,
    Bevel,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub fn black() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

/// Stroke parameters captured at the moment of the stroke
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StrokeStyle {
    pub width: f64,
    pub cap: LineCap,
    pub join: LineJoin,
    pub miter_limit: f64,
    pub dash: Option<(Vec<f64>, f64)>,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct TextRun {
    pub origin: Point,
    pub matrix: Matrix,
    pub color: Rgb,
    pub family: &'static str,
    pub slant: Slant,
    pub bold: bool,
    pub size: f64,
    pub text: Vec<u8>,
}

/// One recorded drawing operation
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PageOp {
    Stroke {
        path: Path,
        color: Rgb,
        style: StrokeStyle,
    },
    Fill {
        path: Path,
        color: Rgb,
        rule: FillRule,
    },
    Clip {
        path: Path,
        rule: FillRule,
    },
    /// Flood the whole surface with a color
    Paint {
        color: Rgb,
    },
    Text(TextRun),
    Save,
    Restore,
}

#[derive(Debug, Clone)]
pub(crate) struct TextExtents {
    pub x_advance: f64,
    pub y_advance: f64,
}

#[derive(Debug, Clone)]
struct CanvasState {
    matrix: Matrix,
    color: Rgb,
    line_width: f64,
    cap: LineCap,
    join: LineJoin,
    miter_limit: f64,
    tolerance: f64,
    dash: Option<(Vec<f64>, f64)>,
    font_family: &'static str,
    font_slant: Slant,
    font_bold: bool,
    font_size: f64,
}

/// The recording surface plus its drawing context
#[derive(Debug)]
pub(crate) struct Canvas {
    matrix: Matrix,
    path: Path,
    current: Option<Point>,
    subpath_start: Option<Point>,
    color: Rgb,
    line_width: f64,
    cap: LineCap,
    join: LineJoin,
    miter_limit: f64,
    tolerance: f64,
    dash: Option<(Vec<f64>, f64)>,
    font_family: &'static str,
    font_slant: Slant,
    font_bold: bool,
    font_size: f64,
    saved: Vec<CanvasState>,
    ops: Vec<PageOp>,
    pages: Vec<Vec<PageOp>>,
    width: f64,
    height: f64,
}

impl Canvas {
    /// `width` and `height` are the device-space surface extents
    pub fn new(width: f64, height: f64, matrix: Matrix) -> Self {
        Self {
            matrix,
            path: Path::default(),
            current: None,
            subpath_start: None,
            color: Rgb::black(),
            line_width: 1.0,
            cap: LineCap::Butt,
            join: LineJoin::Miter,
            miter_limit: 10.0,
            tolerance: 0.1,
            dash: None,
            font_family: "Times New Roman",
            font_slant: Slant::Normal,
            font_bold: false,
            font_size: 10.0,
            saved: Vec::new(),
            ops: Vec::new(),
            pages: Vec::new(),
            width,
            height,
        }
    }

    pub fn matrix(&self) -> Matrix {
        self.matrix
    }

    pub fn set_matrix(&mut self, matrix: Matrix) {
        self.matrix = matrix;
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.matrix.scale(sx, sy);
    }

    pub fn rotate(&mut self, radians: f64) {
        self.matrix.rotate(radians);
    }

    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.matrix.translate(tx, ty);
    }

    pub fn set_source_rgb(&mut self, r: f64, g: f64, b: f64) {
        self.color = Rgb::new(r, g, b);
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.line_width = width;
    }

    pub fn line_width(&self) -> f64 {
        self.line_width
    }

    pub fn set_line_cap(&mut self, cap: LineCap) {
        self.cap = cap;
    }

    pub fn line_cap(&self) -> LineCap {
        self.cap
    }

    pub fn set_line_join(&mut self, join: LineJoin) {
        self.join = join;
    }

    pub fn line_join(&self) -> LineJoin {
        self.join
    }

    pub fn set_miter_limit(&mut self, limit: f64) {
        self.miter_limit = limit;
    }

    pub fn miter_limit(&self) -> f64 {
        self.miter_limit
    }

    pub fn set_tolerance(&mut self, tolerance: f64) {
        self.tolerance = tolerance;
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    pub fn set_dash(&mut self, dashes: Vec<f64>, offset: f64) {
        self.dash = if dashes.is_empty() {
            None
        } else {
            Some((dashes, offset))
        };
    }

    pub fn has_current_point(&self) -> bool {
        self.current.is_some()
    }

    pub fn new_path(&mut self) {
        self.path = Path::default();
        self.current = None;
        self.subpath_start = None;
    }

    pub fn copy_path(&self) -> Path {
        self.path.clone()
    }

    /// Appends an already-recorded device-space path
    pub fn append_path(&mut self, path: Path) {
        self.path.elements.extend(path.elements.clone());

        let (current, subpath_start) = self.path.end_state();
        self.current = current;
        self.subpath_start = subpath_start;
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        let (dx, dy) = self.matrix.transform_point(x, y);
        let p = Point::new(dx, dy);

        self.path.elements.push(PathElement::MoveTo(p));
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        let (dx, dy) = self.matrix.transform_point(x, y);
        let p = Point::new(dx, dy);

        self.path.elements.push(PathElement::LineTo(p));
        self.current = Some(p);
    }

    pub fn curve_to(&mut self, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        let c1 = self.device_point(x1, y1);
        let c2 = self.device_point(x2, y2);
        let end = self.device_point(x3, y3);

        self.path.elements.push(PathElement::CurveTo(c1, c2, end));
        self.current = Some(end);
    }

    fn device_point(&self, x: f64, y: f64) -> Point {
        let (dx, dy) = self.matrix.transform_point(x, y);
        Point::new(dx, dy)
    }

    /// The device-space current point mapped back to user space
    fn user_current(&self) -> Option<(f64, f64)> {
        let p = self.current?;
        let inverse = self.matrix.invert()?;

        Some(inverse.transform_point(p.x, p.y))
    }

    pub fn rel_move_to(&mut self, dx: f64, dy: f64) {
        if let Some((ux, uy)) = self.user_current() {
            self.move_to(ux + dx, uy + dy);
        }
    }

    pub fn rel_line_to(&mut self, dx: f64, dy: f64) {
        if let Some((ux, uy)) = self.user_current() {
            self.line_to(ux + dx, uy + dy);
        }
    }

    pub fn rel_curve_to(&mut self, dx1: f64, dy1: f64, dx2: f64, dy2: f64, dx3: f64, dy3: f64) {
        if let Some((ux, uy)) = self.user_current() {
            self.curve_to(ux + dx1, uy + dy1, ux + dx2, uy + dy2, ux + dx3, uy + dy3);
        }
    }

    pub fn close_path(&mut self) {
        if self.subpath_start.is_some() {
            self.path.elements.push(PathElement::Close);
            self.current = self.subpath_start;
        }
    }

    pub fn rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(x, y);
        self.rel_line_to(width, 0.0);
        self.rel_line_to(0.0, height);
        self.rel_line_to(-width, 0.0);
        self.close_path();
    }

    /// Appends a circular arc, sweeping counterclockwise from `a1` to
    /// `a2` (radians). A current point is first connected to the arc
    /// start with a line segment.
    pub fn arc(&mut self, xc: f64, yc: f64, radius: f64, a1: f64, a2: f64) {
        self.arc_inner(xc, yc, radius, a1, a2, false);
    }

    pub fn arc_negative(&mut self, xc: f64, yc: f64, radius: f64, a1: f64, a2: f64) {
        self.arc_inner(xc, yc, radius, a1, a2, true);
    }

    fn arc_inner(&mut self, xc: f64, yc: f64, radius: f64, a1: f64, mut a2: f64, negative: bool) {
        use std::f64::consts::PI;

        if negative {
            while a2 > a1 {
                a2 -= 2.0 * PI;
            }
        } else {
            while a2 < a1 {
                a2 += 2.0 * PI;
            }
        }

        let start = (xc + radius * a1.cos(), yc + radius * a1.sin());
        if self.current.is_some() {
            self.line_to(start.0, start.1);
        } else {
            self.move_to(start.0, start.1);
        }

        let sweep = a2 - a1;
        let segments = (sweep.abs() / (PI / 2.0)).ceil().max(1.0) as usize;
        let step = sweep / segments as f64;

        for i in 0..segments {
            let t1 = a1 + step * i as f64;
            let t2 = t1 + step;

            // cubic approximation of the arc segment
            let k = 4.0 / 3.0 * ((t2 - t1) / 4.0).tan();

            let (sin1, cos1) = t1.sin_cos();
            let (sin2, cos2) = t2.sin_cos();

            let c1 = (
                xc + radius * (cos1 - k * sin1),
                yc + radius * (sin1 + k * cos1),
            );
            let c2 = (
                xc + radius * (cos2 + k * sin2),
                yc + radius * (sin2 - k * cos2),
            );
            let end = (xc + radius * cos2, yc + radius * sin2);

            self.curve_to(c1.0, c1.1, c2.0, c2.1, end.0, end.1);
        }
    }

    fn stroke_style(&self) -> StrokeStyle {
        StrokeStyle {
            width: self.line_width,
            cap: self.cap,
            join: self.join,
            miter_limit: self.miter_limit,
            dash: self.dash.clone(),
        }
    }

    pub fn stroke(&mut self) {
        if !self.path.is_empty() {
            self.ops.push(PageOp::Stroke {
                path: std::mem::take(&mut self.path),
                color: self.color,
                style: self.stroke_style(),
            });
        }

        self.current = None;
        self.subpath_start = None;
    }

    pub fn fill(&mut self, rule: FillRule) {
        if !self.path.is_empty() {
            self.ops.push(PageOp::Fill {
                path: std::mem::take(&mut self.path),
                color: self.color,
                rule,
            });
        }

        self.current = None;
        self.subpath_start = None;
    }

    /// Intersects the clip region with the current path, consuming it
    pub fn clip(&mut self) {
        if !self.path.is_empty() {
            self.ops.push(PageOp::Clip {
                path: std::mem::take(&mut self.path),
                rule: FillRule::Winding,
            });
        }

        self.current = None;
        self.subpath_start = None;
    }

    /// Like [Canvas::clip], but the path survives for further use
    pub fn clip_preserve(&mut self) {
        if !self.path.is_empty() {
            self.ops.push(PageOp::Clip {
                path: self.path.clone(),
                rule: FillRule::Winding,
            });
        }
    }

    pub fn paint(&mut self) {
        self.ops.push(PageOp::Paint { color: self.color });
    }

    pub fn save(&mut self) {
        self.saved.push(CanvasState {
            matrix: self.matrix,
            color: self.color,
            line_width: self.line_width,
            cap: self.cap,
            join: self.join,
            miter_limit: self.miter_limit,
            tolerance: self.tolerance,
            dash: self.dash.clone(),
            font_family: self.font_family,
            font_slant: self.font_slant,
            font_bold: self.font_bold,
            font_size: self.font_size,
        });
        self.ops.push(PageOp::Save);
    }

    pub fn restore(&mut self) {
        if let Some(state) = self.saved.pop() {
            self.matrix = state.matrix;
            self.color = state.color;
            self.line_width = state.line_width;
            self.cap = state.cap;
            self.join = state.join;
            self.miter_limit = state.miter_limit;
            self.tolerance = state.tolerance;
            self.dash = state.dash;
            self.font_family = state.font_family;
            self.font_slant = state.font_slant;
            self.font_bold = state.font_bold;
            self.font_size = state.font_size;

            self.ops.push(PageOp::Restore);
        }
    }

    pub fn select_font_face(&mut self, family: &'static str, slant: Slant, bold: bool) {
        self.font_family = family;
        self.font_slant = slant;
        self.font_bold = bold;
    }

    pub fn set_font_size(&mut self, size: f64) {
        self.font_size = size;
    }

    /// Per-family average advance width, as a fraction of the point size.
    /// Text metrics are approximate: font programs are never parsed.
    fn advance_factor(&self) -> f64 {
        match self.font_family {
            "Courier New" => 0.6,
            "Arial" => 0.52,
            "Symbol" => 0.55,
            _ => 0.5,
        }
    }

    pub fn text_extents(&self, text: &[u8]) -> TextExtents {
        TextExtents {
            x_advance: text.len() as f64 * self.advance_factor() * self.font_size,
            y_advance: 0.0,
        }
    }

    pub fn show_text(&mut self, text: &[u8]) {
        if text.is_empty() {
            return;
        }

        let origin = self.current.unwrap_or_default();

        self.ops.push(PageOp::Text(TextRun {
            origin,
            matrix: self.matrix,
            color: self.color,
            family: self.font_family,
            slant: self.font_slant,
            bold: self.font_bold,
            size: self.font_size,
            text: text.to_vec(),
        }));

        // the pen advances past the drawn text
        let extents = self.text_extents(text);
        let (dx, dy) = self
            .matrix
            .transform_distance(extents.x_advance, extents.y_advance);
        if let Some(p) = self.current.as_mut() {
            p.x += dx;
            p.y += dy;
        }
    }

    /// Appends an outline standing in for the text to the current path.
    /// Glyph outlines are unavailable without font data, so the shape is
    /// the advance box of the run.
    pub fn text_path(&mut self, text: &[u8]) {
        if text.is_empty() {
            return;
        }

        let origin = self.current.unwrap_or_default();
        let extents = self.text_extents(text);
        let (wx, wy) = self.matrix.transform_distance(extents.x_advance, 0.0);
        let (hx, hy) = self.matrix.transform_distance(0.0, self.font_size);

        let corner1 = Point::new(origin.x + wx, origin.y + wy);
        let corner2 = Point::new(origin.x + wx + hx, origin.y + wy + hy);
        let corner3 = Point::new(origin.x + hx, origin.y + hy);

        self.path.elements.push(PathElement::MoveTo(origin));
        self.path.elements.push(PathElement::LineTo(corner1));
        self.path.elements.push(PathElement::LineTo(corner2));
        self.path.elements.push(PathElement::LineTo(corner3));
        self.path.elements.push(PathElement::Close);

        self.current = Some(Point::new(origin.x + wx, origin.y + wy));
        self.subpath_start = Some(origin);
    }

    /// Seals the pending operations into a finished page
    pub fn show_page(&mut self) {
        let ops = std::mem::take(&mut self.ops);
        self.pages.push(ops);

        log::debug!("page {} recorded", self.pages.len());
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn has_pending_ops(&self) -> bool {
        !self.ops.is_empty()
    }

    pub fn surface_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// All finished pages; residual operations recorded after the last
    /// `show_page` become a final page so that a program which never
    /// invoked `showpage` still produces output
    pub fn take_pages(&mut self) -> Vec<Vec<PageOp>> {
        if !self.ops.is_empty() {
            let ops = std::mem::take(&mut self.ops);
            self.pages.push(ops);
        }

        std::mem::take(&mut self.pages)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn canvas() -> Canvas {
        Canvas::new(816.0, 1056.0, Matrix::identity())
    }

    #[test]
    fn paths_are_recorded_in_device_space() {
        let mut c = Canvas::new(816.0, 1056.0, Matrix::scaling(2.0, 2.0));

        c.move_to(10.0, 20.0);
        c.line_to(30.0, 40.0);
        c.stroke();

        let pages = c.take_pages();
        assert_eq!(pages.len(), 1);

        match &pages[0][0] {
            PageOp::Stroke { path, .. } => {
                assert_eq!(
                    path.elements,
                    vec![
                        PathElement::MoveTo(Point::new(20.0, 40.0)),
                        PathElement::LineTo(Point::new(60.0, 80.0)),
                    ]
                );
            }
            other => panic!("expected a stroke, found {:?}", other),
        }
    }

    #[test]
    fn relative_moves_are_user_space_deltas() {
        let mut c = Canvas::new(816.0, 1056.0, Matrix::scaling(2.0, 2.0));

        c.move_to(10.0, 10.0);
        c.rel_line_to(5.0, 0.0);
        c.fill(FillRule::Winding);

        let pages = c.take_pages();
        match &pages[0][0] {
            PageOp::Fill { path, .. } => {
                assert_eq!(
                    path.elements[1],
                    PathElement::LineTo(Point::new(30.0, 20.0))
                );
            }
            other => panic!("expected a fill, found {:?}", other),
        }
    }

    #[test]
    fn close_path_returns_to_subpath_start() {
        let mut c = canvas();

        c.move_to(1.0, 2.0);
        c.line_to(5.0, 2.0);
        c.close_path();

        assert_eq!(c.current, Some(Point::new(1.0, 2.0)));
    }

    #[test]
    fn arc_emits_connected_curves() {
        let mut c = canvas();

        c.arc(0.0, 0.0, 10.0, 0.0, std::f64::consts::PI);
        let path = c.copy_path();

        assert!(matches!(path.elements[0], PathElement::MoveTo(..)));
        // half circle splits into two quarter segments
        assert_eq!(
            path.elements
                .iter()
                .filter(|e| matches!(e, PathElement::CurveTo(..)))
                .count(),
            2
        );

        let (end, _) = path.end_state();
        let end = end.unwrap();
        assert!((end.x - -10.0).abs() < 1e-6);
        assert!(end.y.abs() < 1e-6);
    }

    #[test]
    fn save_restore_roundtrips_style() {
        let mut c = canvas();

        c.set_line_width(4.0);
        c.save();
        c.set_line_width(9.0);
        c.scale(3.0, 3.0);
        c.restore();

        assert_eq!(c.line_width(), 4.0);
        assert_eq!(c.matrix(), Matrix::identity());
    }

    #[test]
    fn show_page_seals_ops() {
        let mut c = canvas();

        c.move_to(0.0, 0.0);
        c.line_to(1.0, 1.0);
        c.stroke();
        c.show_page();

        assert_eq!(c.page_count(), 1);
        assert!(!c.has_pending_ops());
    }

    #[test]
    fn residual_ops_become_a_final_page() {
        let mut c = canvas();

        c.move_to(0.0, 0.0);
        c.line_to(1.0, 1.0);
        c.stroke();

        let pages = c.take_pages();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn text_advances_the_pen() {
        let mut c = canvas();

        c.set_font_size(10.0);
        c.move_to(0.0, 0.0);
        c.show_text(b"ab");

        let p = c.current.unwrap();
        assert!(p.x > 0.0);
    }

    #[test]
    fn clip_preserve_keeps_the_path() {
        let mut c = canvas();

        c.rectangle(0.0, 0.0, 10.0, 10.0);
        c.clip_preserve();

        assert!(!c.copy_path().is_empty());

        c.clip();
        assert!(c.copy_path().is_empty());
    }
}
