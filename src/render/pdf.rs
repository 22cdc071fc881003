//! PDF generation.
//!
//! [PdfFile] handles the lowest level of PDF syntax: the header, indirect
//! objects, the cross-reference table, and the trailer. [write_pdf] builds
//! a document from recorded pages, replaying each display list into an
//! uncompressed content stream under the final Y-flip.

use std::{
    collections::BTreeMap,
    fmt::Write as _,
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::{
    font::Slant,
    render::{FillRule, LineCap, LineJoin, PageOp, Path as DevicePath, PathElement, Rgb},
};

/// An abstraction over the PDF file structure: create the file (writes
/// the header), reserve object identifiers, write each indirect object,
/// then finish with the document catalog (writes the cross-reference
/// table and trailer).
pub(crate) struct PdfFile<W: Write> {
    output: CountingWriter<W>,

    /// Indexed by object number; object zero is reserved. `None` marks an
    /// id that was assigned but not written yet.
    object_positions: Vec<Option<u64>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ObjectId(usize);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} 0 R", self.0)
    }
}

impl<W: Write> PdfFile<W> {
    pub fn new(output: W) -> io::Result<Self> {
        let mut output = CountingWriter {
            inner: output,
            bytes_written: 0,
        };
        output.write_all(b"%PDF-1.7\n%\xB5\xED\xAE\xFB\n")?;

        Ok(Self {
            output,
            object_positions: vec![None],
        })
    }

    /// Reserve an object number so it can be referenced before being
    /// written
    pub fn assign_object_id(&mut self) -> ObjectId {
        self.object_positions.push(None);

        ObjectId(self.object_positions.len() - 1)
    }

    pub fn write_object(&mut self, id: ObjectId, content: &[u8]) -> io::Result<()> {
        assert!(
            self.object_positions[id.0].is_none(),
            "object {} written twice",
            id.0
        );
        self.object_positions[id.0] = Some(self.output.position());

        write!(self.output, "{} 0 obj\n", id.0)?;
        self.output.write_all(content)?;
        write!(self.output, "endobj\n")?;

        Ok(())
    }

    /// Writes the cross-reference table and trailer
    pub fn finish(mut self, catalog: ObjectId) -> io::Result<W> {
        let startxref = self.output.position();

        write!(self.output, "xref\n0 {}\n", self.object_positions.len())?;
        write!(self.output, "0000000000 65535 f \n")?;
        for position in &self.object_positions[1..] {
            let bytes = position.expect("an object was assigned but never written");
            write!(self.output, "{:010} 00000 n \n", bytes)?;
        }

        write!(
            self.output,
            "trailer\n<< /Size {} /Root {} >>\nstartxref\n{}\n%%EOF\n",
            self.object_positions.len(),
            catalog,
            startxref
        )?;

        Ok(self.output.inner)
    }
}

struct CountingWriter<W: Write> {
    inner: W,
    bytes_written: u64,
}

impl<W: Write> CountingWriter<W> {
    fn position(&self) -> u64 {
        self.bytes_written
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buffer)?;
        self.bytes_written += written as u64;

        Ok(written)
    }

    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()> {
        self.inner.write_all(buffer)?;
        self.bytes_written += buffer.len() as u64;

        Ok(())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Base-14 font backing a backend face selection
fn base14_name(family: &str, slant: Slant, bold: bool) -> &'static str {
    let italic = slant != Slant::Normal;

    match family {
        "Arial" => match (bold, italic) {
            (false, false) => "Helvetica",
            (true, false) => "Helvetica-Bold",
            (false, true) => "Helvetica-Oblique",
            (true, true) => "Helvetica-BoldOblique",
        },
        "Courier New" => match (bold, italic) {
            (false, false) => "Courier",
            (true, false) => "Courier-Bold",
            (false, true) => "Courier-Oblique",
            (true, true) => "Courier-BoldOblique",
        },
        "Symbol" => "Symbol",
        _ => match (bold, italic) {
            (false, false) => "Times-Roman",
            (true, false) => "Times-Bold",
            (false, true) => "Times-Italic",
            (true, true) => "Times-BoldItalic",
        },
    }
}

/// Content-stream number formatting: integers stay integral, reals keep
/// four decimals with trailing zeros removed
fn fmt_num(v: f64) -> String {
    if v == v.trunc() && v.abs() < 1e12 {
        return format!("{}", v as i64);
    }

    let mut s = format!("{:.4}", v);
    while s.ends_with('0') {
        s.pop();
    }
    if s.ends_with('.') {
        s.pop();
    }

    s
}

fn push_color(out: &mut String, color: Rgb, stroking: bool) {
    let op = if stroking { "RG" } else { "rg" };

    let _ = writeln!(
        out,
        "{} {} {} {}",
        fmt_num(color.r),
        fmt_num(color.g),
        fmt_num(color.b),
        op
    );
}

fn push_path(out: &mut String, path: &DevicePath) {
    for element in &path.elements {
        match element {
            PathElement::MoveTo(p) => {
                let _ = writeln!(out, "{} {} m", fmt_num(p.x), fmt_num(p.y));
            }
            PathElement::LineTo(p) => {
                let _ = writeln!(out, "{} {} l", fmt_num(p.x), fmt_num(p.y));
            }
            PathElement::CurveTo(c1, c2, end) => {
                let _ = writeln!(
                    out,
                    "{} {} {} {} {} {} c",
                    fmt_num(c1.x),
                    fmt_num(c1.y),
                    fmt_num(c2.x),
                    fmt_num(c2.y),
                    fmt_num(end.x),
                    fmt_num(end.y)
                );
            }
            PathElement::Close => out.push_str("h\n"),
        }
    }
}

fn escape_text(text: &[u8]) -> String {
    let mut out = String::new();

    for &b in text {
        match b {
            b'(' | b')' | b'\\' => {
                out.push('\\');
                out.push(b as char);
            }
            0x20..=0x7e => out.push(b as char),
            _ => {
                let _ = write!(out, "\\{:03o}", b);
            }
        }
    }

    out
}

/// Font resources used by a set of pages, keyed by base font name
fn collect_fonts(pages: &[Vec<PageOp>]) -> BTreeMap<&'static str, String> {
    let mut fonts = BTreeMap::new();

    for op in pages.iter().flatten() {
        if let PageOp::Text(run) = op {
            let base = base14_name(run.family, run.slant, run.bold);
            let next = fonts.len() + 1;
            fonts.entry(base).or_insert_with(|| format!("F{}", next));
        }
    }

    fonts
}

fn content_stream(
    ops: &[PageOp],
    page_height: f64,
    surface: (f64, f64),
    fonts: &BTreeMap<&'static str, String>,
) -> Vec<u8> {
    let mut out = String::new();

    // replay the recording under a vertical flip
    let _ = writeln!(out, "1 0 0 -1 0 {} cm", fmt_num(page_height));

    for op in ops {
        match op {
            PageOp::Save => out.push_str("q\n"),
            PageOp::Restore => out.push_str("Q\n"),
            PageOp::Stroke { path, color, style } => {
                push_color(&mut out, *color, true);
                let _ = writeln!(out, "{} w", fmt_num(style.width));
                let cap = match style.cap {
                    LineCap::Butt => 0,
                    LineCap::Round => 1,
                    LineCap::Square => 2,
                };
                let join = match style.join {
                    LineJoin::Miter => 0,
                    LineJoin::Round => 1,
                    LineJoin::Bevel => 2,
                };
                let _ = writeln!(out, "{} J", cap);
                let _ = writeln!(out, "{} j", join);
                let _ = writeln!(out, "{} M", fmt_num(style.miter_limit));
                match &style.dash {
                    Some((dashes, offset)) => {
                        let parts: Vec<String> = dashes.iter().copied().map(fmt_num).collect();
                        let _ = writeln!(out, "[{}] {} d", parts.join(" "), fmt_num(*offset));
                    }
                    None => out.push_str("[] 0 d\n"),
                }
                push_path(&mut out, path);
                out.push_str("S\n");
            }
            PageOp::Fill { path, color, rule } => {
                push_color(&mut out, *color, false);
                push_path(&mut out, path);
                out.push_str(match rule {
                    FillRule::Winding => "f\n",
                    FillRule::EvenOdd => "f*\n",
                });
            }
            PageOp::Clip { path, rule } => {
                push_path(&mut out, path);
                out.push_str(match rule {
                    FillRule::Winding => "W n\n",
                    FillRule::EvenOdd => "W* n\n",
                });
            }
            PageOp::Paint { color } => {
                out.push_str("q\n");
                push_color(&mut out, *color, false);
                let _ = writeln!(
                    out,
                    "0 0 {} {} re\nf",
                    fmt_num(surface.0),
                    fmt_num(surface.1)
                );
                out.push_str("Q\n");
            }
            PageOp::Text(run) => {
                let base = base14_name(run.family, run.slant, run.bold);
                let resource = &fonts[base];

                out.push_str("BT\n");
                push_color(&mut out, run.color, false);
                let _ = writeln!(out, "/{} {} Tf", resource, fmt_num(run.size));
                let _ = writeln!(
                    out,
                    "{} {} {} {} {} {} Tm",
                    fmt_num(run.matrix.xx),
                    fmt_num(run.matrix.yx),
                    fmt_num(run.matrix.xy),
                    fmt_num(run.matrix.yy),
                    fmt_num(run.origin.x),
                    fmt_num(run.origin.y)
                );
                let _ = writeln!(out, "({}) Tj", escape_text(&run.text));
                out.push_str("ET\n");
            }
        }
    }

    out.into_bytes()
}

/// Writes the recorded pages as a PDF document with pages of
/// `width` x `height` points. A document with no recorded pages still
/// gets one empty page.
pub(crate) fn write_pdf(
    path: &Path,
    pages: &[Vec<PageOp>],
    width: f64,
    height: f64,
    surface: (f64, f64),
) -> io::Result<()> {
    let empty_page: Vec<Vec<PageOp>>;
    let pages = if pages.is_empty() {
        empty_page = vec![Vec::new()];
        &empty_page
    } else {
        pages
    };

    let file = BufWriter::new(File::create(path)?);
    let mut pdf = PdfFile::new(file)?;

    let catalog_id = pdf.assign_object_id();
    let pages_id = pdf.assign_object_id();

    let fonts = collect_fonts(pages);
    let font_ids: BTreeMap<&'static str, ObjectId> = fonts
        .keys()
        .map(|&base| (base, pdf.assign_object_id()))
        .collect();

    let mut font_resources = String::new();
    for (base, resource) in &fonts {
        let _ = write!(font_resources, "/{} {} ", resource, font_ids[base]);
    }

    let mut kids = Vec::new();

    for ops in pages {
        let content_id = pdf.assign_object_id();
        let page_id = pdf.assign_object_id();

        let content = content_stream(ops, height, surface, &fonts);
        let mut body = format!("<< /Length {} >>\nstream\n", content.len());
        body.push_str(std::str::from_utf8(&content).unwrap_or(""));
        body.push_str("endstream\n");
        pdf.write_object(content_id, body.as_bytes())?;

        let page = format!(
            "<< /Type /Page /Parent {} /MediaBox [0 0 {} {}] \
             /Resources << /Font << {}>> >> /Contents {} >>\n",
            pages_id,
            fmt_num(width),
            fmt_num(height),
            font_resources,
            content_id
        );
        pdf.write_object(page_id, page.as_bytes())?;

        kids.push(page_id);
    }

    for (base, id) in &font_ids {
        let font = format!(
            "<< /Type /Font /Subtype /Type1 /BaseFont /{} >>\n",
            base
        );
        pdf.write_object(*id, font.as_bytes())?;
    }

    let kid_refs: Vec<String> = kids.iter().map(|id| id.to_string()).collect();
    let page_tree = format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>\n",
        kid_refs.join(" "),
        kids.len()
    );
    pdf.write_object(pages_id, page_tree.as_bytes())?;

    let catalog = format!("<< /Type /Catalog /Pages {} >>\n", pages_id);
    pdf.write_object(catalog_id, catalog.as_bytes())?;

    let mut file = pdf.finish(catalog_id)?;
    file.flush()?;

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        matrix::Matrix,
        render::{Point, StrokeStyle, TextRun},
    };

    fn stroke_op() -> PageOp {
        PageOp::Stroke {
            path: DevicePath {
                elements: vec![
                    PathElement::MoveTo(Point::new(0.0, 0.0)),
                    PathElement::LineTo(Point::new(100.0, 100.0)),
                ],
            },
            color: Rgb::black(),
            style: StrokeStyle {
                width: 2.0,
                cap: LineCap::Butt,
                join: LineJoin::Miter,
                miter_limit: 10.0,
                dash: None,
            },
        }
    }

    #[test]
    fn number_formatting() {
        assert_eq!(fmt_num(3.0), "3");
        assert_eq!(fmt_num(-2.0), "-2");
        assert_eq!(fmt_num(2.5), "2.5");
        assert_eq!(fmt_num(0.1234), "0.1234");
    }

    #[test]
    fn text_escaping() {
        assert_eq!(escape_text(b"a(b)c\\"), "a\\(b\\)c\\\\");
        assert_eq!(escape_text(&[0x07]), "\\007");
    }

    #[test]
    fn base14_mapping() {
        assert_eq!(base14_name("Arial", Slant::Oblique, true), "Helvetica-BoldOblique");
        assert_eq!(base14_name("Courier New", Slant::Normal, false), "Courier");
        assert_eq!(base14_name("Times New Roman", Slant::Italic, false), "Times-Italic");
        assert_eq!(base14_name("Symbol", Slant::Normal, true), "Symbol");
    }

    #[test]
    fn content_stream_flips_y() {
        let fonts = BTreeMap::new();
        let content = content_stream(&[stroke_op()], 200.0, (816.0, 1056.0), &fonts);
        let text = String::from_utf8(content).unwrap();

        assert!(text.starts_with("1 0 0 -1 0 200 cm\n"));
        assert!(text.contains("0 0 m\n100 100 l\nS\n"));
    }

    #[test]
    fn writes_a_complete_document() {
        let path = std::env::temp_dir().join("eps2pdf_writer_test.pdf");
        let pages = vec![vec![stroke_op()]];

        write_pdf(&path, &pages, 100.0, 200.0, (133.0, 266.0)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(text.contains("/MediaBox [0 0 100 200]"));
        assert!(text.contains("xref"));
        assert!(text.contains("trailer"));
        assert!(text.ends_with("%%EOF\n"));
    }

    #[test]
    fn empty_documents_get_one_page() {
        let path = std::env::temp_dir().join("eps2pdf_writer_empty_test.pdf");

        write_pdf(&path, &[], 612.0, 792.0, (816.0, 1056.0)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 1"));
    }

    #[test]
    fn text_runs_reference_font_resources() {
        let path = std::env::temp_dir().join("eps2pdf_writer_text_test.pdf");
        let run = PageOp::Text(TextRun {
            origin: Point::new(10.0, 20.0),
            matrix: Matrix::identity(),
            color: Rgb::black(),
            family: "Courier New",
            slant: Slant::Normal,
            bold: false,
            size: 12.0,
            text: b"hi (there)".to_vec(),
        });

        write_pdf(&path, &[vec![run]], 612.0, 792.0, (816.0, 1056.0)).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/BaseFont /Courier"));
        assert!(text.contains("(hi \\(there\\)) Tj"));
    }
}
