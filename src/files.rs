//! Archive discovery and interactive selection.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

/// File extensions accepted as page captures
pub const ARCHIVE_EXTENSIONS: &[&str] = &["webarchive", "mhtml", "mht"];

/// Whether the path has a capture extension (case-insensitive)
pub fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            ARCHIVE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false)
}

/// List capture files in the given directories, sorted by name per directory.
///
/// Missing or unreadable directories are skipped. A directory listed twice
/// is only scanned once.
pub fn list_archive_files(dirs: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen: Vec<PathBuf> = Vec::new();
    let mut files = Vec::new();

    for dir in dirs {
        let key = dir.canonicalize().unwrap_or_else(|_| dir.clone());
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);

        let entries = match std::fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::debug!("Skipping {}: {}", dir.display(), e);
                continue;
            }
        };

        let mut found: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && is_archive_path(path))
            .collect();
        found.sort();
        files.extend(found);
    }

    files
}

/// Searched directories for messages, e.g. `., /srv/captures`
pub fn describe_dirs(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|dir| dir.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Prompt for one of `files` by number. `q` quits and returns `None`.
///
/// Invalid answers are re-prompted; end of input counts as quitting.
pub fn choose_file<R: BufRead, W: Write>(
    files: &[PathBuf],
    mut input: R,
    mut output: W,
) -> io::Result<Option<PathBuf>> {
    writeln!(output, "Available archive files:")?;
    for (i, file) in files.iter().enumerate() {
        writeln!(output, "{}. {}", i + 1, file.display())?;
    }

    loop {
        write!(output, "\nEnter the number of the file to process (or 'q' to quit): ")?;
        output.flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            return Ok(None);
        }
        let answer = answer.trim();

        if answer.eq_ignore_ascii_case("q") {
            return Ok(None);
        }

        match answer.parse::<usize>() {
            Ok(n) if (1..=files.len()).contains(&n) => return Ok(Some(files[n - 1].clone())),
            Ok(_) => writeln!(output, "Please enter a number between 1 and {}", files.len())?,
            Err(_) => writeln!(output, "Please enter a valid number")?,
        }
    }
}

/// Output path for an export: `<base>.<extension>`
pub fn output_path(base: &Path, extension: &str) -> PathBuf {
    base.with_extension(extension)
}
