use std::io::{self, Write};
use std::path::Path;
use std::process::ExitCode;

use sift_cli::run_compare;
use sift_match::MatchConfig;

fn usage(name: &str) {
    eprintln!("Usage: {} <descriptorfile> <descriptorfile>", name);
    eprintln!("       compute the L2 distance between the descriptors of");
    eprintln!("       every keypoint in the first file and every keypoint");
    eprintln!("       in the second, flagging the closest match per query.");
    eprintln!();
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 3 {
        usage(&args[0]);
        // The original tool exited 0 here; that hid scripting mistakes
        return ExitCode::from(2);
    }

    let stdout = io::stdout();
    let stderr = io::stderr();
    let mut out = stdout.lock();
    let mut diag = stderr.lock();

    let result = run_compare(
        Path::new(&args[1]),
        Path::new(&args[2]),
        &MatchConfig::default(),
        &mut out,
        &mut diag,
    );

    if let Err(error) = result {
        let _ = writeln!(diag, "{}", error);
        return ExitCode::FAILURE;
    }

    ExitCode::SUCCESS
}
