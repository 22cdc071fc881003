use std::path::{Path, PathBuf};

use crate::{
    error::PostScriptResult,
    interpreter::Interpreter,
    scanner::Scanner,
    DEFAULT_HEIGHT, DEFAULT_WIDTH,
};

/// The conversion driver: derives the output name, loads the input,
/// pumps tokens through the interpreter, and writes the PDF.
pub struct Application;

impl Application {
    /// Converts `input` (or interactive stdin when `None`) into a PDF at
    /// the derived output path, which is returned on success.
    pub fn convert(input: Option<&Path>, output: Option<&Path>) -> anyhow::Result<PathBuf> {
        let output_file = output_filename(input, output)?;

        let (mut scanner, width, height) = match input {
            Some(path) => {
                let scanner = Scanner::load_file(path).map_err(|err| anyhow::anyhow!("{}", err))?;

                log::debug!(
                    "loaded {} ({})",
                    path.display(),
                    if scanner.is_eps() {
                        "EPS with a bounding box"
                    } else {
                        "plain PostScript"
                    }
                );

                let (width, height) = match scanner.page_size() {
                    Some((w, h)) if w > 0.0 && h > 0.0 => (w, h),
                    _ => (DEFAULT_WIDTH, DEFAULT_HEIGHT),
                };

                (scanner, width, height)
            }
            None => (Scanner::interactive(), DEFAULT_WIDTH, DEFAULT_HEIGHT),
        };

        let mut interpreter = Interpreter::new(width, height);

        let result = run_loop(&mut scanner, &mut interpreter);

        // the page is written even when a batch run aborted part-way
        interpreter.save_file(&output_file)?;

        result.map(|_| output_file)
    }
}

/// An explicit output must be a `.pdf` path; otherwise the input stem
/// gains a `.pdf` extension, and interactive sessions land in
/// `./test.pdf`.
fn output_filename(input: Option<&Path>, output: Option<&Path>) -> anyhow::Result<PathBuf> {
    if let Some(output) = output {
        let is_pdf = output
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if !is_pdf {
            anyhow::bail!(
                "Unknown or unsupported output file type. \
                 Output file extension must be '.pdf'"
            );
        }

        return Ok(output.to_path_buf());
    }

    match input {
        Some(input) => Ok(input.with_extension("pdf")),
        None => Ok(PathBuf::from("./test.pdf")),
    }
}

/// The token pump. Interactive sessions report errors and keep going;
/// batch conversions abort on the first error.
fn run_loop(scanner: &mut Scanner, interpreter: &mut Interpreter) -> PostScriptResult<()> {
    let interactive = scanner.is_interactive();

    loop {
        if scanner.is_eof() {
            break;
        }

        match scanner.get_token() {
            Ok(Some(token)) => {
                if let Err(err) = interpreter.process_token(scanner, token) {
                    if interactive {
                        println!("{}", err);

                        interpreter.reset_after_error();
                        scanner.clear_input();

                        continue;
                    }

                    return Err(err);
                }

                if interpreter.quit_requested() {
                    break;
                }
            }
            Ok(None) => break,
            Err(err) => {
                println!("{}", err);

                if interactive {
                    continue;
                }

                anyhow::bail!("{}", err);
            }
        }
    }

    if let Some(bbox) = interpreter.bounding_box() {
        log::debug!(
            "document declared a {} x {} bounding box",
            bbox.width,
            bbox.height
        );
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(name)
    }

    #[test]
    fn output_name_derives_from_input() {
        let name = output_filename(Some(Path::new("art/figure.eps")), None).unwrap();
        assert_eq!(name, PathBuf::from("art/figure.pdf"));

        let name = output_filename(None, None).unwrap();
        assert_eq!(name, PathBuf::from("./test.pdf"));
    }

    #[test]
    fn explicit_output_must_be_pdf() {
        assert!(output_filename(None, Some(Path::new("out.svg"))).is_err());
        assert!(output_filename(None, Some(Path::new("out.pdf"))).is_ok());
        assert!(output_filename(None, Some(Path::new("OUT.PDF"))).is_ok());
    }

    #[test]
    fn converts_a_bounded_page() {
        let input = temp_path("eps2pdf_convert_bbox.eps");
        let output = temp_path("eps2pdf_convert_bbox.pdf");
        fs::write(
            &input,
            b"%!PS\n%%BoundingBox: 0 0 100 200\n100 200 moveto showpage\n",
        )
        .unwrap();

        let written = Application::convert(Some(&input), Some(&output)).unwrap();

        let bytes = fs::read(&written).unwrap();
        let text = String::from_utf8_lossy(&bytes);

        assert!(bytes.starts_with(b"%PDF-"));
        assert!(text.contains("/MediaBox [0 0 100 200]"));
    }

    #[test]
    fn missing_bounding_box_falls_back_to_letter() {
        let input = temp_path("eps2pdf_convert_plain.ps");
        let output = temp_path("eps2pdf_convert_plain.pdf");
        fs::write(&input, b"%!PS\n10 10 moveto 50 50 lineto stroke showpage\n").unwrap();

        Application::convert(Some(&input), Some(&output)).unwrap();

        let bytes = fs::read(&output).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/MediaBox [0 0 612 792]"));
    }

    #[test]
    fn batch_errors_abort_but_still_write() {
        let input = temp_path("eps2pdf_convert_bad.ps");
        let output = temp_path("eps2pdf_convert_bad.pdf");
        fs::write(&input, b"%!PS\n1 2 add florp\n").unwrap();

        let err = Application::convert(Some(&input), Some(&output)).unwrap_err();

        assert!(err.to_string().contains("undefined in --florp--"));
        assert!(fs::read(&output).unwrap().starts_with(b"%PDF-"));
    }

    #[test]
    fn quit_stops_interpretation_cleanly() {
        let input = temp_path("eps2pdf_convert_quit.ps");
        let output = temp_path("eps2pdf_convert_quit.pdf");
        fs::write(&input, b"%!PS\n1 quit florp\n").unwrap();

        // quit stops before the undefined name is ever seen
        Application::convert(Some(&input), Some(&output)).unwrap();
    }

    #[test]
    fn rejects_non_postscript_input() {
        let input = temp_path("eps2pdf_convert_notps.txt");
        fs::write(&input, b"hello\n").unwrap();

        let err = Application::convert(Some(&input), None).unwrap_err();

        assert!(err
            .to_string()
            .contains("neither a PostScript nor an EPS file"));
    }
}
