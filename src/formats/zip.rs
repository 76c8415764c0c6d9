use std::io::{self, Read, Seek};
use std::ops::ControlFlow;

use ::zip::read::{ZipFile, read_zipfile_from_stream};
use ::zip::result::ZipError;
use ::zip::ZipArchive;
use tempfile::SpooledTempFile;

use super::{ArchiveEntry, ArchiveFormat, EntryKind, EntryVisitor};

const LOCAL_HEADER: &[u8] = b"PK\x03\x04";

/// Archives up to this size are spooled in memory, larger ones to a temp file.
const SPOOL_IN_MEMORY: usize = 8 * 1024 * 1024;

/// Zip archives.
///
/// The stream is spooled first so entries can be located through the central
/// directory, which is the only reliable source of sizes for entries written
/// with a trailing data descriptor. Without a readable central directory
/// (a truncated archive) entries are read from their local headers until the
/// damage is reached. An entry that cannot be decoded, such as an encrypted
/// one, is still visited; reading it fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZipFormat;

impl ArchiveFormat for ZipFormat {
    fn name(&self) -> &'static str {
        "zip"
    }

    fn matches(&self, signature: &[u8]) -> bool {
        signature.starts_with(LOCAL_HEADER)
    }

    fn for_each_entry(&self, stream: &mut dyn Read, visit: &mut EntryVisitor<'_>) -> io::Result<()> {
        let mut spool = SpooledTempFile::new(SPOOL_IN_MEMORY);
        io::copy(stream, &mut spool)?;
        spool.rewind()?;

        match ZipArchive::new(&mut spool) {
            Ok(archive) => return visit_central_directory(archive, visit),
            Err(error) => tracing::debug!("No usable central directory ({}), reading local headers", error),
        }
        spool.rewind()?;
        visit_local_headers(&mut spool, visit)
    }
}

fn visit_central_directory<R: Read + Seek>(
    mut archive: ZipArchive<R>,
    visit: &mut EntryVisitor<'_>,
) -> io::Result<()> {
    for index in 0..archive.len() {
        let (name, kind, size, checksum) = {
            let raw = archive.by_index_raw(index).map_err(into_io)?;
            (raw.name().to_string(), kind_of(&raw), raw.size(), raw.crc32())
        };

        let flow = match archive.by_index(index) {
            Ok(mut file) => visit(ArchiveEntry {
                name,
                kind,
                size: Some(size),
                last_modified: None,
                checksum: Some(checksum),
                reader: &mut file,
            })?,
            Err(ZipError::UnsupportedArchive(reason)) => visit(ArchiveEntry {
                name,
                kind,
                size: Some(size),
                last_modified: None,
                checksum: Some(checksum),
                reader: &mut Undecodable(reason),
            })?,
            Err(error) => return Err(into_io(error)),
        };
        if flow.is_break() {
            break;
        }
    }
    Ok(())
}

fn visit_local_headers(stream: &mut dyn Read, visit: &mut EntryVisitor<'_>) -> io::Result<()> {
    let mut stream = stream;
    while let Some(mut file) = read_zipfile_from_stream(&mut stream).map_err(into_io)? {
        let entry = ArchiveEntry {
            name: file.name().to_string(),
            kind: kind_of(&file),
            size: Some(file.size()),
            last_modified: None,
            checksum: Some(file.crc32()),
            reader: &mut file,
        };
        if visit(entry)?.is_break() {
            break;
        }
    }
    Ok(())
}

fn kind_of(file: &ZipFile<'_>) -> EntryKind {
    if file.is_dir() {
        EntryKind::Directory
    } else if file.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

/// Reader for an entry the zip crate cannot decode.
struct Undecodable(&'static str);

impl Read for Undecodable {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::Unsupported, self.0))
    }
}

fn into_io(error: ZipError) -> io::Error {
    match error {
        ZipError::Io(error) => error,
        other => io::Error::new(io::ErrorKind::InvalidData, other),
    }
}
