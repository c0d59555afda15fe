//! Main entry point for the respack CLI application.
//!
//! Lists and extracts files from any data source: directories, DAT
//! archives, ZIP packs, the embedded image or the asset bundle.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use respack::{Cli, DataSource};

/// Application entry point.
///
/// Parses command-line arguments, opens the data source and dispatches to
/// listing or extraction.
fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let source = DataSource::new(&cli.source, cli.mode())
        .with_context(|| format!("Can't open data source '{}'", cli.source))?;

    process_source(&source, &cli)
}

/// Process a data source based on CLI options.
///
/// - List mode (`-l` or `-v`): Display the selected file names
/// - Extract mode: Write the selected files to disk or stdout
fn process_source(source: &DataSource, cli: &Cli) -> Result<()> {
    let names = source.list_files(&cli.prefix, !cli.no_subdirs, &cli.ext);

    // Apply filters to determine which files to touch:
    // 1. If specific files are requested, only include matching names
    // 2. Exclude files matching the exclusion patterns
    let selected: Vec<&String> = names
        .iter()
        .filter(|name| {
            let name = name.as_str();
            if !cli.files.is_empty() {
                let matches = cli.files.iter().any(|f| {
                    if has_glob_chars(f) {
                        glob_match(&f.to_lowercase(), &name.to_lowercase())
                    } else {
                        // No wildcards: case-insensitive match on full path or base name
                        let basename = name.rsplit('/').next().unwrap_or(name);
                        name.eq_ignore_ascii_case(f) || basename.eq_ignore_ascii_case(f)
                    }
                });
                if !matches {
                    return false;
                }
            }

            !cli.exclude
                .iter()
                .any(|x| name.contains(x.as_str()) || glob_match(x, name))
        })
        .collect();

    if cli.list || cli.verbose {
        return list_files(source, &selected, cli.verbose);
    }

    let multiple_files = cli.pipe && selected.len() > 1;
    for name in selected {
        extract_file(source, name, cli, multiple_files)?;
    }

    Ok(())
}

/// List the selected files.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Size and write time table with a totals line
fn list_files(source: &DataSource, names: &[&String], verbose: bool) -> Result<()> {
    if verbose {
        println!("Source: {} ({:?})", source.identifier(), source.kind());
        println!("{:>10}  {:>10}  {:>5}  Name", "Length", "Date", "Time");
        println!("{}", "-".repeat(50));
    }

    let mut total_size = 0u64;
    let mut file_count = 0usize;

    for name in names {
        if !verbose {
            println!("{}", name);
            continue;
        }

        let Some(info) = source.stat(name) else {
            // Live directories can lose files between listing and stat
            continue;
        };

        println!("{:>10}  {}  {}", info.size, format_time(info.write_time), name);

        total_size += info.size;
        file_count += 1;
    }

    if verbose {
        println!("{}", "-".repeat(50));
        println!(
            "{:>10}  {:>17}  {} files ({})",
            total_size,
            "",
            file_count,
            format_size(total_size)
        );
    }

    Ok(())
}

/// Extract a single file from the data source.
///
/// Handles various extraction options:
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Custom output directory (`-d`): Extract to specified directory
/// - Junk paths (`-j`): Ignore directory structure
/// - Overwrite control (`-n`, `-o`): Handle existing files
fn extract_file(source: &DataSource, name: &str, cli: &Cli, show_filename: bool) -> Result<()> {
    let Some(file) = source
        .read(name)
        .with_context(|| format!("Can't read '{}' from '{}'", name, source.identifier()))?
    else {
        if !cli.is_very_quiet() {
            eprintln!("Missing: {} (vanished from the source)", name);
        }
        return Ok(());
    };

    if cli.pipe {
        let mut stdout = std::io::stdout().lock();
        if show_filename {
            writeln!(stdout, "--- {} ---", name)?;
        }
        stdout.write_all(file.as_bytes())?;
        return Ok(());
    }

    let file_name = if cli.junk_paths {
        name.rsplit('/').next().unwrap_or(name)
    } else {
        name
    };
    let output_path = match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(file_name),
        None => PathBuf::from(file_name),
    };

    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (file exists)", name);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", name);
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", name);
    }

    write_output(&output_path, file.as_bytes())
}

fn write_output(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Can't create '{}'", parent.display()))?;
        }
    }
    fs::write(path, data).with_context(|| format!("Can't write '{}'", path.display()))
}

/// Check if a pattern contains glob wildcard characters.
fn has_glob_chars(pattern: &str) -> bool {
    pattern.contains('*') || pattern.contains('?')
}

/// Simple glob pattern matching supporting `*` and `?` wildcards.
///
/// - `*` matches zero or more characters
/// - `?` matches exactly one character
///
/// ```ignore
/// assert!(glob_match("*.frm", "art/critters/hmjmpsaa.frm"));
/// assert!(glob_match("proto/items/0000000?.pro", "proto/items/00000001.pro"));
/// assert!(!glob_match("*.msg", "readme.txt"));
/// ```
fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern_chars: Vec<char> = pattern.chars().collect();
    let text_chars: Vec<char> = text.chars().collect();

    fn do_match(pattern: &[char], text: &[char]) -> bool {
        match (pattern.first(), text.first()) {
            (None, None) => true,
            // Star matches zero characters, or one and stays for more
            (Some('*'), _) => {
                do_match(&pattern[1..], text) || (!text.is_empty() && do_match(pattern, &text[1..]))
            }
            (Some('?'), Some(_)) => do_match(&pattern[1..], &text[1..]),
            (Some(p), Some(t)) if *p == *t => do_match(&pattern[1..], &text[1..]),
            _ => false,
        }
    }

    do_match(&pattern_chars, &text_chars)
}

/// Format Unix seconds as a UTC `date  time` column.
fn format_time(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|t| t.format("%Y-%m-%d  %H:%M").to_string())
        .unwrap_or_else(|| format!("{:>17}", "-"))
}

/// Format a byte size into a human-readable string.
fn format_size(size: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if size >= GB {
        format!("{:.2} GB", size as f64 / GB as f64)
    } else if size >= MB {
        format!("{:.2} MB", size as f64 / MB as f64)
    } else if size >= KB {
        format!("{:.2} KB", size as f64 / KB as f64)
    } else {
        format!("{} bytes", size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_patterns() {
        assert!(glob_match("*.frm", "art/critters/hmjmpsaa.frm"));
        assert!(glob_match("proto/items/0000000?.pro", "proto/items/00000001.pro"));
        assert!(!glob_match("*.msg", "readme.txt"));
        assert!(has_glob_chars("a*"));
        assert!(!has_glob_chars("plain.txt"));
    }

    #[test]
    fn time_column() {
        assert_eq!(format_time(0), "1970-01-01  00:00");
        // 2000-02-29 12:34 UTC
        assert_eq!(format_time(951_827_640), "2000-02-29  12:34");
        assert_eq!(format_time(u64::MAX).trim(), "-");
    }

    #[test]
    fn sizes() {
        assert_eq!(format_size(500), "500 bytes");
        assert_eq!(format_size(1536), "1.50 KB");
        assert_eq!(format_size(1048576), "1.00 MB");
    }
}
