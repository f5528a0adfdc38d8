//! Standalone archive text dumper.
//!
//! Prints the visible text of a saved page, one text run per line, to help
//! diagnose pages whose holdings table is not recognized.
//!
//! Usage: archive_text <path_to_archive>
//! Output: Extracted text on stdout, errors on stderr
//! Exit codes:
//!   0 - Success
//!   1 - Invalid arguments
//!   2 - Read error
//!   3 - Write error
//!   4 - Decode error

use std::env;
use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();

    if args.len() != 2 {
        eprintln!("Usage: archive_text <path_to_archive>");
        return ExitCode::from(1);
    }

    let path = &args[1];

    let bytes = match fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("READ_ERROR:{}", e);
            return ExitCode::from(2);
        }
    };

    let archive = match empower_holdings::archive::read_archive(&bytes) {
        Ok(archive) => archive,
        Err(e) => {
            eprintln!("DECODE_ERROR:{}", e);
            return ExitCode::from(4);
        }
    };

    eprintln!(
        "{} {} ({} lines)",
        archive.format,
        archive.url.as_deref().unwrap_or("<no url>"),
        archive.text.len()
    );

    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for line in archive.text.lines() {
        if let Err(e) = writeln!(handle, "{}", line) {
            eprintln!("WRITE_ERROR:{}", e);
            return ExitCode::from(3);
        }
    }

    ExitCode::SUCCESS
}
