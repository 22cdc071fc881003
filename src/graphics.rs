use std::{io, path::Path as FsPath};

use crate::{
    error::{ErrorKind, PostScriptError, PostScriptResult},
    font::Slant,
    matrix::Matrix,
    render::{self, Canvas, FillRule, LineCap, LineJoin, Path, Point, TextExtents},
};

/// Device units per point: interpretation happens at 96 dpi against
/// 72-per-inch user coordinates
pub(crate) const PAGE_SCALE: f64 = 96.0 / 72.0;

fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

fn deg_to_rad(v: f64) -> f64 {
    v.to_radians()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
}

/// The current color in whichever model it was last set. Gray levels are
/// stored with all three RGB channels equal; readbacks in a different
/// model convert on the fly.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Color {
    pub model: ColorModel,
    v: [f64; 4],
}

impl Color {
    fn gray(level: f64) -> Self {
        Self {
            model: ColorModel::Gray,
            v: [level, level, level, 0.0],
        }
    }

    fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self {
            model: ColorModel::Rgb,
            v: [r, g, b, 0.0],
        }
    }

    fn cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        Self {
            model: ColorModel::Cmyk,
            v: [c, m, y, k],
        }
    }

    pub fn to_rgb(self) -> (f64, f64, f64) {
        match self.model {
            ColorModel::Gray | ColorModel::Rgb => (self.v[0], self.v[1], self.v[2]),
            ColorModel::Cmyk => {
                let [c, m, y, k] = self.v;

                (
                    1.0 - (c + k).min(1.0),
                    1.0 - (m + k).min(1.0),
                    1.0 - (y + k).min(1.0),
                )
            }
        }
    }

    pub fn to_cmyk(self) -> (f64, f64, f64, f64) {
        match self.model {
            ColorModel::Cmyk => (self.v[0], self.v[1], self.v[2], self.v[3]),
            ColorModel::Rgb => (1.0 - self.v[0], 1.0 - self.v[1], 1.0 - self.v[2], 0.0),
            ColorModel::Gray => (0.0, 0.0, 0.0, 1.0 - self.v[0]),
        }
    }

    pub fn to_gray(self) -> f64 {
        match self.model {
            ColorModel::Gray => self.v[0],
            ColorModel::Rgb => 0.3 * self.v[0] + 0.59 * self.v[1] + 0.11 * self.v[2],
            ColorModel::Cmyk => {
                let [c, m, y, k] = self.v;

                1.0 - (0.3 * c + 0.59 * m + 0.11 * y + k).min(1.0)
            }
        }
    }
}

/// One level of the `gsave` stack
#[derive(Debug)]
struct GState {
    ctm: Matrix,
    color: Color,
    current_point: Point,
    has_current_point: bool,
    path: Option<Path>,
}

/// The graphics state: everything between the interpreter and the
/// recording canvas. Coordinates arriving from operators are user-space
/// points; the canvas applies the CTM.
#[derive(Debug)]
pub(crate) struct GraphicsContext {
    canvas: Canvas,
    ctm: Matrix,
    current_point: Point,
    last_moveto: Point,
    has_current_point: bool,
    color: Color,
    gstates: Vec<GState>,
    width: f64,
    height: f64,
}

impl GraphicsContext {
    pub fn new(width: f64, height: f64) -> Self {
        let matrix = Matrix::scaling(PAGE_SCALE, PAGE_SCALE);

        Self {
            canvas: Canvas::new(width * PAGE_SCALE, height * PAGE_SCALE, matrix),
            ctm: matrix,
            current_point: Point::default(),
            last_moveto: Point::default(),
            has_current_point: false,
            color: Color::gray(0.0),
            gstates: Vec::new(),
            width,
            height,
        }
    }

    pub fn has_current_point(&self) -> bool {
        self.has_current_point
    }

    fn require_current_point(&self, operator: &'static str) -> PostScriptResult<()> {
        if self.has_current_point {
            Ok(())
        } else {
            anyhow::bail!(PostScriptError::new(ErrorKind::NoCurrentPoint, operator))
        }
    }

    fn clear_current_point(&mut self) {
        self.current_point = Point::default();
        self.last_moveto = Point::default();
        self.has_current_point = false;
    }

    pub fn page_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    pub fn set_page_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    // path construction

    pub fn newpath(&mut self) {
        self.canvas.new_path();
        self.clear_current_point();
    }

    pub fn moveto(&mut self, x: f64, y: f64) {
        self.canvas.move_to(x, y);
        self.current_point = Point::new(x, y);
        self.last_moveto = self.current_point;
        self.has_current_point = true;
    }

    pub fn lineto(&mut self, x: f64, y: f64) -> PostScriptResult<()> {
        self.require_current_point("lineto")?;

        self.canvas.line_to(x, y);
        self.current_point = Point::new(x, y);

        Ok(())
    }

    pub fn curveto(
        &mut self,
        x1: f64,
        y1: f64,
        x2: f64,
        y2: f64,
        x3: f64,
        y3: f64,
    ) -> PostScriptResult<()> {
        self.require_current_point("curveto")?;

        self.canvas.curve_to(x1, y1, x2, y2, x3, y3);
        self.current_point = Point::new(x3, y3);

        Ok(())
    }

    pub fn closepath(&mut self) {
        self.canvas.close_path();
        self.current_point = self.last_moveto;
    }

    pub fn rmoveto(&mut self, dx: f64, dy: f64) -> PostScriptResult<()> {
        self.require_current_point("rmoveto")?;

        self.canvas.rel_move_to(dx, dy);
        self.current_point.x += dx;
        self.current_point.y += dy;
        self.last_moveto = self.current_point;

        Ok(())
    }

    pub fn rlineto(&mut self, dx: f64, dy: f64) -> PostScriptResult<()> {
        self.require_current_point("rlineto")?;

        self.canvas.rel_line_to(dx, dy);
        self.current_point.x += dx;
        self.current_point.y += dy;

        Ok(())
    }

    pub fn rcurveto(
        &mut self,
        dx1: f64,
        dy1: f64,
        dx2: f64,
        dy2: f64,
        dx3: f64,
        dy3: f64,
    ) -> PostScriptResult<()> {
        self.require_current_point("rcurveto")?;

        self.canvas.rel_curve_to(dx1, dy1, dx2, dy2, dx3, dy3);
        self.current_point.x += dx3;
        self.current_point.y += dy3;

        Ok(())
    }

    pub fn currentpoint(&self) -> PostScriptResult<(f64, f64)> {
        self.require_current_point("currentpoint")?;

        Ok((self.current_point.x, self.current_point.y))
    }

    /// Angles in degrees, sweeping counterclockwise
    pub fn arc(&mut self, xc: f64, yc: f64, radius: f64, a1: f64, a2: f64) {
        self.canvas
            .arc(xc, yc, radius, deg_to_rad(a1), deg_to_rad(a2));
    }

    pub fn arcn(&mut self, xc: f64, yc: f64, radius: f64, a1: f64, a2: f64) {
        self.canvas
            .arc_negative(xc, yc, radius, deg_to_rad(a1), deg_to_rad(a2));
    }

    pub fn stroke(&mut self) {
        self.canvas.stroke();
        self.clear_current_point();
    }

    pub fn fill(&mut self) {
        self.canvas.fill(FillRule::Winding);
        self.clear_current_point();
    }

    pub fn eofill(&mut self) {
        self.canvas.fill(FillRule::EvenOdd);
        self.clear_current_point();
    }

    pub fn rectfill(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.gsave();
        self.canvas.rectangle(x, y, width, height);
        self.canvas.fill(FillRule::Winding);
        self.grestore();
    }

    pub fn rectstroke(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.gsave();
        self.canvas.rectangle(x, y, width, height);
        self.canvas.stroke();
        self.grestore();
    }

    pub fn clip(&mut self) {
        self.canvas.clip();
    }

    /// With no path in progress the clip boundary defaults to the page
    pub fn clippath(&mut self) {
        if !self.canvas.has_current_point() {
            self.canvas.move_to(0.0, 0.0);
            self.canvas.rel_line_to(self.width, 0.0);
            self.canvas.rel_line_to(0.0, self.height);
            self.canvas.rel_line_to(-self.width, 0.0);
            self.canvas.close_path();
        }

        self.canvas.clip_preserve();
    }

    pub fn erasepage(&mut self) {
        self.canvas.save();
        self.canvas.set_source_rgb(1.0, 1.0, 1.0);
        self.canvas.paint();
        self.canvas.restore();
    }

    /// Recorded paths are already flat enough for the backend, so this
    /// only rebuilds the path in place
    pub fn flattenpath(&mut self) {
        if self.has_current_point {
            let path = self.canvas.copy_path();
            self.canvas.new_path();
            self.canvas.append_path(path);
        }
    }

    pub fn gsave(&mut self) {
        let path = if self.has_current_point {
            Some(self.canvas.copy_path())
        } else {
            None
        };

        self.gstates.push(GState {
            ctm: self.ctm,
            color: self.color,
            current_point: self.current_point,
            has_current_point: self.has_current_point,
            path,
        });

        self.canvas.save();
    }

    pub fn grestore(&mut self) {
        let Some(state) = self.gstates.pop() else {
            self.canvas.restore();
            return;
        };

        self.ctm = state.ctm;
        self.color = state.color;
        self.current_point = state.current_point;
        self.has_current_point = state.has_current_point;

        self.canvas.restore();
        self.canvas.new_path();

        if self.has_current_point {
            self.canvas
                .move_to(self.current_point.x, self.current_point.y);
        }

        if let Some(path) = state.path {
            self.canvas.append_path(path);
        }
    }

    pub fn showpage(&mut self) {
        self.canvas.show_page();
    }

    // state parameters

    pub fn set_line_width(&mut self, width: f64) {
        // negative widths are silently ignored
        if width >= 0.0 {
            self.canvas.set_line_width(width);
        }
    }

    pub fn line_width(&self) -> f64 {
        self.canvas.line_width()
    }

    pub fn set_line_cap(&mut self, cap: i32) -> PostScriptResult<()> {
        let cap = match cap {
            0 => LineCap::Butt,
            1 => LineCap::Round,
            2 => LineCap::Square,
            _ => anyhow::bail!(PostScriptError::new(ErrorKind::RangeCheck, "setlinecap")),
        };

        self.canvas.set_line_cap(cap);

        Ok(())
    }

    pub fn line_cap(&self) -> i32 {
        match self.canvas.line_cap() {
            LineCap::Butt => 0,
            LineCap::Round => 1,
            LineCap::Square => 2,
        }
    }

    pub fn set_line_join(&mut self, join: i32) -> PostScriptResult<()> {
        let join = match join {
            0 => LineJoin::Miter,
            1 => LineJoin::Round,
            2 => LineJoin::Bevel,
            _ => anyhow::bail!(PostScriptError::new(ErrorKind::RangeCheck, "setlinejoin")),
        };

        self.canvas.set_line_join(join);

        Ok(())
    }

    pub fn line_join(&self) -> i32 {
        match self.canvas.line_join() {
            LineJoin::Miter => 0,
            LineJoin::Round => 1,
            LineJoin::Bevel => 2,
        }
    }

    pub fn set_miter_limit(&mut self, limit: f64) -> PostScriptResult<()> {
        if limit < 1.0 {
            anyhow::bail!(PostScriptError::new(ErrorKind::RangeCheck, "setmiterlimit"));
        }

        self.canvas.set_miter_limit(limit);

        Ok(())
    }

    pub fn miter_limit(&self) -> f64 {
        self.canvas.miter_limit()
    }

    pub fn set_flat(&mut self, tolerance: f64) {
        self.canvas
            .set_tolerance(if tolerance > 0.0 { tolerance } else { 0.1 });
    }

    pub fn flat(&self) -> f64 {
        self.canvas.tolerance()
    }

    pub fn set_dash(&mut self, dashes: Vec<f64>, offset: f64) {
        self.canvas.set_dash(dashes, offset);
    }

    pub fn set_gray(&mut self, level: f64) {
        let level = clamp01(level);

        self.color = Color::gray(level);
        self.canvas.set_source_rgb(level, level, level);
    }

    pub fn set_rgb(&mut self, r: f64, g: f64, b: f64) {
        let (r, g, b) = (clamp01(r), clamp01(g), clamp01(b));

        self.color = Color::rgb(r, g, b);
        self.canvas.set_source_rgb(r, g, b);
    }

    pub fn set_cmyk(&mut self, c: f64, m: f64, y: f64, k: f64) {
        let (c, m, y, k) = (clamp01(c), clamp01(m), clamp01(y), clamp01(k));

        self.color = Color::cmyk(c, m, y, k);

        let (r, g, b) = self.color.to_rgb();
        self.canvas.set_source_rgb(r, g, b);
    }

    pub fn color(&self) -> Color {
        self.color
    }

    // transformation matrix

    pub fn ctm(&self) -> Matrix {
        self.ctm
    }

    pub fn default_matrix(&self) -> Matrix {
        Matrix::scaling(PAGE_SCALE, PAGE_SCALE)
    }

    pub fn set_ctm(&mut self, matrix: Matrix) {
        self.ctm = matrix;
        self.canvas.set_matrix(matrix);
    }

    pub fn init_matrix(&mut self) {
        self.set_ctm(self.default_matrix());
    }

    pub fn concat(&mut self, matrix: &Matrix) {
        self.set_ctm(Matrix::multiply(matrix, &self.ctm));
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.canvas.scale(sx, sy);
        self.ctm.scale(sx, sy);
    }

    /// `degrees`, matching the operator
    pub fn rotate(&mut self, degrees: f64) {
        let radians = deg_to_rad(degrees);

        self.canvas.rotate(radians);
        self.ctm.rotate(radians);
    }

    pub fn translate(&mut self, tx: f64, ty: f64) {
        self.canvas.translate(tx, ty);
        self.ctm.translate(tx, ty);
    }

    // text

    pub fn set_font(&mut self, family: &'static str, slant: Slant, bold: bool, size: f64) {
        self.canvas.select_font_face(family, slant, bold);
        self.canvas.set_font_size(size);
    }

    /// Glyphs are drawn under a temporary vertical flip so they read
    /// upright after the final page flip
    pub fn show(&mut self, text: &[u8]) -> PostScriptResult<()> {
        self.require_current_point("show")?;

        let saved = self.canvas.matrix();
        self.canvas.scale(1.0, -1.0);
        self.canvas.show_text(text);
        self.canvas.set_matrix(saved);

        Ok(())
    }

    pub fn charpath(&mut self, text: &[u8]) -> PostScriptResult<()> {
        self.require_current_point("charpath")?;

        let saved = self.canvas.matrix();
        self.canvas.scale(1.0, -1.0);
        self.canvas.text_path(text);
        self.canvas.set_matrix(saved);

        Ok(())
    }

    pub fn string_width(&self, text: &[u8]) -> TextExtents {
        self.canvas.text_extents(text)
    }

    // output

    pub fn page_count(&self) -> usize {
        self.canvas.page_count()
    }

    pub fn save_file(&mut self, path: &FsPath) -> io::Result<()> {
        if self.canvas.has_pending_ops() {
            log::debug!("flushing operations recorded after the last showpage");
        }

        let surface = self.canvas.surface_size();
        let pages = self.canvas.take_pages();

        log::debug!(
            "writing {} page(s) at {} x {} pt to {}",
            pages.len().max(1),
            self.width,
            self.height,
            path.display()
        );

        render::pdf::write_pdf(path, &pages, self.width, self.height, surface)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn ctx() -> GraphicsContext {
        GraphicsContext::new(612.0, 792.0)
    }

    #[test]
    fn initial_ctm_is_scaled() {
        let g = ctx();

        assert_eq!(g.ctm(), Matrix::scaling(PAGE_SCALE, PAGE_SCALE));
    }

    #[test]
    fn lineto_requires_a_current_point() {
        let mut g = ctx();

        assert!(g.lineto(1.0, 1.0).is_err());

        g.moveto(0.0, 0.0);
        assert!(g.lineto(1.0, 1.0).is_ok());
        assert_eq!(g.currentpoint().unwrap(), (1.0, 1.0));
    }

    #[test]
    fn relative_moves_update_the_current_point() {
        let mut g = ctx();

        g.moveto(10.0, 10.0);
        g.rlineto(5.0, -3.0).unwrap();

        assert_eq!(g.currentpoint().unwrap(), (15.0, 7.0));
    }

    #[test]
    fn closepath_returns_to_last_moveto() {
        let mut g = ctx();

        g.moveto(2.0, 3.0);
        g.lineto(10.0, 3.0).unwrap();
        g.closepath();

        assert_eq!(g.currentpoint().unwrap(), (2.0, 3.0));
    }

    #[test]
    fn gsave_grestore_roundtrips_state() {
        let mut g = ctx();

        g.set_rgb(1.0, 0.0, 0.0);
        g.moveto(5.0, 5.0);
        g.gsave();

        g.set_gray(0.5);
        g.translate(100.0, 100.0);
        g.newpath();

        g.grestore();

        assert_eq!(g.color().model, ColorModel::Rgb);
        assert_eq!(g.ctm(), Matrix::scaling(PAGE_SCALE, PAGE_SCALE));
        assert!(g.has_current_point());
        assert_eq!(g.currentpoint().unwrap(), (5.0, 5.0));
    }

    #[test]
    fn grestore_without_gsave_is_harmless() {
        let mut g = ctx();

        g.grestore();

        assert!(!g.has_current_point());
    }

    #[test]
    fn cmyk_to_rgb_conversion() {
        let mut g = ctx();

        g.set_cmyk(1.0, 0.0, 0.0, 0.0);
        let (r, g_, b) = g.color().to_rgb();

        assert_eq!((r, g_, b), (0.0, 1.0, 1.0));
    }

    #[test]
    fn rgb_to_gray_conversion() {
        let mut g = ctx();

        g.set_rgb(1.0, 1.0, 1.0);
        assert!((g.color().to_gray() - 1.0).abs() < 1e-9);

        g.set_rgb(0.0, 1.0, 0.0);
        assert!((g.color().to_gray() - 0.59).abs() < 1e-9);
    }

    #[test]
    fn color_values_clamp() {
        let mut g = ctx();

        g.set_rgb(2.0, -1.0, 0.5);

        assert_eq!(g.color().to_rgb(), (1.0, 0.0, 0.5));
    }

    #[test]
    fn line_cap_range() {
        let mut g = ctx();

        assert!(g.set_line_cap(2).is_ok());
        assert_eq!(g.line_cap(), 2);
        assert!(g.set_line_cap(3).is_err());
        assert!(g.set_line_join(-1).is_err());
    }

    #[test]
    fn negative_line_width_is_ignored() {
        let mut g = ctx();

        g.set_line_width(4.0);
        g.set_line_width(-1.0);

        assert_eq!(g.line_width(), 4.0);
    }

    #[test]
    fn stroke_clears_the_current_point() {
        let mut g = ctx();

        g.moveto(0.0, 0.0);
        g.lineto(10.0, 0.0).unwrap();
        g.stroke();

        assert!(!g.has_current_point());
    }

    #[test]
    fn showpage_seals_a_page() {
        let mut g = ctx();

        g.moveto(0.0, 0.0);
        g.lineto(10.0, 0.0).unwrap();
        g.stroke();
        g.showpage();

        assert_eq!(g.page_count(), 1);
    }

    #[test]
    fn setpagedevice_resizes() {
        let mut g = ctx();

        g.set_page_size(100.0, 200.0);

        assert_eq!(g.page_size(), (100.0, 200.0));
    }
}
