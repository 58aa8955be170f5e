use std::fs;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use crate::checksum::Crc32Reader;
use crate::error::{Result, from_io};
use crate::io::ReadAt;

use super::archive::ZipArchive;
use super::structures::ZipFileEntry;

/// ZIP file extractor
///
/// Every extraction is checked against the CRC-32 recorded in the central
/// directory; a mismatch surfaces as [`Error::ChecksumMismatch`](crate::Error::ChecksumMismatch).
#[derive(Debug)]
pub struct ZipExtractor<R: ReadAt> {
    archive: ZipArchive<R>,
}

impl<R: ReadAt> ZipExtractor<R> {
    pub fn new(reader: Arc<R>) -> Result<Self> {
        Ok(Self {
            archive: ZipArchive::new(reader)?,
        })
    }

    pub fn with_archive(archive: ZipArchive<R>) -> Self {
        Self { archive }
    }

    pub fn archive(&mut self) -> &mut ZipArchive<R> {
        &mut self.archive
    }

    /// List all files in the archive
    pub fn list_files(&mut self) -> Result<Vec<ZipFileEntry>> {
        self.archive.list_files()
    }

    /// Stream the verified content of `entry` into `out`, returning the byte count.
    pub fn extract_to_writer<W: Write + ?Sized>(
        &mut self,
        entry: &ZipFileEntry,
        out: &mut W,
    ) -> Result<u64> {
        let reader = self.archive.open_at(entry.cd_offset)?;
        let mut reader = Crc32Reader::new(reader, entry.crc32);
        io::copy(&mut reader, out).map_err(from_io)
    }

    /// Extract file data to memory
    pub fn extract_to_memory(&mut self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let mut buf = Vec::with_capacity(entry.uncompressed_size.min(1 << 24) as usize);
        self.extract_to_writer(entry, &mut buf)?;
        Ok(buf)
    }

    /// Extract file to disk
    pub fn extract_to_file(&mut self, entry: &ZipFileEntry, output_path: &Path) -> Result<()> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = io::BufWriter::new(fs::File::create(output_path)?);
        self.extract_to_writer(entry, &mut file)?;
        file.flush()?;
        Ok(())
    }

    /// Extract file to stdout
    pub fn extract_to_stdout(&mut self, entry: &ZipFileEntry) -> Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        self.extract_to_writer(entry, &mut lock)?;
        lock.flush()?;
        Ok(())
    }

    /// Decompress `entry` and check it against its recorded CRC-32 without keeping the data.
    pub fn test_entry(&mut self, entry: &ZipFileEntry) -> Result<()> {
        self.extract_to_writer(entry, &mut io::sink())?;
        Ok(())
    }
}
