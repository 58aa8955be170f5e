//! Main entry point for the runzip CLI application.
//!
//! This binary provides a command-line interface for listing, testing and
//! extracting ZIP files from both local filesystem and remote HTTP URLs.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use runzip::{
    Cli, HttpRangeReader, LocalFileReader, ReadAt, ZipArchive, ZipExtractor, ZipFileEntry,
};

/// Application entry point.
///
/// Parses command-line arguments and dispatches to the appropriate handler
/// based on whether the input is a local file or HTTP URL.
fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.is_http_url() {
        // Handle remote ZIP file via HTTP Range requests
        let reader = Arc::new(HttpRangeReader::new(cli.file.clone())?);
        let transferred_before = reader.transferred_bytes();

        process_zip(reader.clone(), &cli)?;

        // Display network transfer statistics for HTTP sources
        if !cli.is_quiet() {
            let transferred = reader.transferred_bytes() - transferred_before;
            eprintln!("\nTotal bytes transferred: {}", format_size(transferred));
        }
    } else {
        let reader = LocalFileReader::new(Path::new(&cli.file))
            .with_context(|| format!("cannot open {}", cli.file))?;
        process_zip(Arc::new(reader), &cli)?;
    }

    Ok(())
}

/// Process a ZIP archive based on CLI options.
///
/// - List mode (`-l` or `-v`): Display archive contents
/// - Test mode (`-t`): Decompress and verify selected entries
/// - Extract mode: Extract files matching the specified filters
fn process_zip<R: ReadAt>(reader: Arc<R>, cli: &Cli) -> Result<()> {
    let archive = ZipArchive::with_window_size(reader, cli.window_size)
        .with_context(|| format!("cannot read {}", cli.file))?;
    let mut extractor = ZipExtractor::with_archive(archive);

    // List mode: display archive contents and exit
    if cli.list || cli.verbose {
        return list_files(&mut extractor, cli.verbose);
    }

    let entries = extractor.list_files()?;
    let selected = select_entries(&entries, cli);

    if cli.test {
        return test_files(&mut extractor, &selected, cli);
    }

    let multiple_files = cli.pipe && selected.len() > 1;
    for entry in selected {
        extract_file(&mut extractor, entry, cli, multiple_files)?;
    }

    Ok(())
}

/// Files passing the CLI filters; directories are created on demand during extraction.
fn select_entries<'a>(entries: &'a [ZipFileEntry], cli: &Cli) -> Vec<&'a ZipFileEntry> {
    entries
        .iter()
        .filter(|e| !e.is_directory && cli.selects(&e.file_name))
        .collect()
}

/// List files in the ZIP archive.
///
/// Supports two output formats:
/// - Simple format (`-l`): Just file names, one per line
/// - Verbose format (`-v`): Detailed table with size, compression ratio, and timestamps
fn list_files<R: ReadAt>(extractor: &mut ZipExtractor<R>, verbose: bool) -> Result<()> {
    let entries = extractor.list_files()?;

    if verbose {
        let comment = extractor.archive().comment();
        if !comment.is_empty() {
            println!("{}", String::from_utf8_lossy(comment));
        }
        println!(
            "{:>10}  {:>10}  {:>5}  {:>10}  {:>5}  Name",
            "Length", "Size", "Cmpr", "Date", "Time"
        );
        println!("{}", "-".repeat(70));
    }

    let mut total_uncompressed = 0u64;
    let mut total_compressed = 0u64;
    let mut file_count = 0usize;

    for entry in &entries {
        if verbose {
            let (year, month, day) = entry.mod_date();
            let (hour, minute, _second) = entry.mod_time();

            println!(
                "{:>10}  {:>10}  {}  {:04}-{:02}-{:02}  {:02}:{:02}  {}",
                entry.uncompressed_size,
                entry.compressed_size,
                ratio(entry.compressed_size, entry.uncompressed_size),
                year,
                month,
                day,
                hour,
                minute,
                entry.file_name
            );

            if !entry.is_directory {
                total_uncompressed += entry.uncompressed_size;
                total_compressed += entry.compressed_size;
                file_count += 1;
            }
        } else {
            println!("{}", entry.file_name);
        }
    }

    if verbose {
        println!("{}", "-".repeat(70));
        println!(
            "{:>10}  {:>10}  {}  {:>21}  {} files",
            total_uncompressed,
            total_compressed,
            ratio(total_compressed, total_uncompressed),
            "",
            file_count
        );
    }

    Ok(())
}

/// Compression ratio as percentage saved.
fn ratio(compressed: u64, uncompressed: u64) -> String {
    if uncompressed > 0 {
        format!(
            "{:>4}%",
            100i64 - (compressed * 100 / uncompressed) as i64
        )
    } else {
        "  0%".to_string()
    }
}

/// Decompress every selected entry and compare it with its recorded CRC-32.
fn test_files<R: ReadAt>(
    extractor: &mut ZipExtractor<R>,
    entries: &[&ZipFileEntry],
    cli: &Cli,
) -> Result<()> {
    let mut failures = 0usize;
    for entry in entries {
        match extractor.test_entry(entry) {
            Ok(()) => {
                if !cli.is_quiet() {
                    println!("    testing: {:<40} OK", entry.file_name);
                }
            }
            Err(e) => {
                failures += 1;
                if !cli.is_very_quiet() {
                    println!("    testing: {:<40} FAILED ({e})", entry.file_name);
                }
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} entries failed the integrity test", entries.len());
    }
    if !cli.is_very_quiet() {
        println!("No errors detected in {}.", cli.file);
    }
    Ok(())
}

/// Extract a single file from the archive.
///
/// Handles various extraction options:
/// - Pipe mode (`-p`): Write to stdout instead of file
/// - Custom output directory (`-d`): Extract to specified directory
/// - Junk paths (`-j`): Ignore directory structure in archive
/// - Overwrite control (`-n`, `-o`): Handle existing files
fn extract_file<R: ReadAt>(
    extractor: &mut ZipExtractor<R>,
    entry: &ZipFileEntry,
    cli: &Cli,
    show_filename: bool,
) -> Result<()> {
    if cli.pipe {
        if show_filename {
            let mut stdout = std::io::stdout();
            stdout.write_all(format!("--- {} ---\n", entry.file_name).as_bytes())?;
        }
        extractor.extract_to_stdout(entry)?;
        return Ok(());
    }

    let Some(output_path) = output_path(entry, cli) else {
        if !cli.is_very_quiet() {
            eprintln!("Skipping: {} (unsafe path)", entry.file_name);
        }
        return Ok(());
    };

    if output_path.exists() {
        if cli.never_overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (file exists)", entry.file_name);
            }
            return Ok(());
        }

        if !cli.overwrite {
            if !cli.is_quiet() {
                eprintln!("Skipping: {} (use -o to overwrite)", entry.file_name);
            }
            return Ok(());
        }
    }

    if !cli.is_quiet() {
        println!("  extracting: {}", entry.file_name);
    }

    extractor
        .extract_to_file(entry, &output_path)
        .with_context(|| format!("failed to extract {}", entry.file_name))?;

    Ok(())
}

/// Where `entry` lands on disk, or `None` when its name would leave the target directory.
fn output_path(entry: &ZipFileEntry, cli: &Cli) -> Option<PathBuf> {
    let mut relative = entry.enclosed_name()?;
    if cli.junk_paths {
        relative = PathBuf::from(relative.file_name()?);
    }
    Some(match cli.extract_dir {
        Some(ref dir) => PathBuf::from(dir).join(relative),
        None => relative,
    })
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
