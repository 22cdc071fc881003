use std::{env, path::Path, process::ExitCode};

use eps2pdf::Application;

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: eps2pdf input_file [output_file.pdf]");
        eprintln!();
        eprintln!(
            "       Where 'input_file' is a PostScript or EPS file \
             regardless of file extension (i.e., .EPS or .PS)."
        );

        return ExitCode::FAILURE;
    }

    let input = Path::new(&args[1]);
    let output = args.get(2).map(Path::new);

    match Application::convert(Some(input), output) {
        Ok(written) => {
            println!("Success ({})", written.display());

            ExitCode::SUCCESS
        }
        Err(err) => {
            println!("{}", err);

            ExitCode::FAILURE
        }
    }
}
