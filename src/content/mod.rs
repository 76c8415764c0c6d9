//! Units of content and the visitor contracts that consume them.
//!
//! A unit is a plain file, an archive entry, or the decompressed body of a
//! compressed stream. Each one reaches a [`ContentsProcessor`] as a
//! [`ContentHandle`] carrying its synthetic path, a forward-only stream and a
//! [`Reopener`] for obtaining the same bytes again.

pub mod dispatch;

use std::fmt;
use std::fs::File;
use std::io::{self, Cursor, Read};
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::WalkError;
use crate::formats::{ArchiveFormat, CompressionFormat};

pub use dispatch::{ContentDispatcher, ContentHandler, SIGNATURE_LEN, Sniffed};

type OpenFn = dyn Fn() -> io::Result<Box<dyn Read>> + Send + Sync;

/// Shareable factory producing a fresh, independent stream over the same
/// content.
///
/// Reopening a file or a decompressed stream costs as much as reading it
/// again from the start. Reopening an archive entry reopens the whole
/// archive and skips every entry in front of it, so the cost grows with the
/// entry's position; the entry itself is then buffered in memory.
#[derive(Clone)]
pub struct Reopener(Arc<OpenFn>);

impl Reopener {
    pub fn new<F>(open: F) -> Self
    where
        F: Fn() -> io::Result<Box<dyn Read>> + Send + Sync + 'static,
    {
        Reopener(Arc::new(open))
    }

    pub fn for_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::new(move || Ok(Box::new(File::open(&path)?) as Box<dyn Read>))
    }

    /// Reopener for content that has no bytes.
    pub fn empty() -> Self {
        Self::new(|| Ok(Box::new(io::empty()) as Box<dyn Read>))
    }

    /// Reopen the archive through `archive`, then walk forward to the entry
    /// at `ordinal` and buffer it.
    pub(crate) fn entry(archive: Reopener, format: Arc<dyn ArchiveFormat>, ordinal: usize) -> Self {
        Self::new(move || {
            let mut stream = archive.reopen()?;
            let mut position = 0usize;
            let mut buffered = None;

            format.for_each_entry(&mut stream, &mut |entry| {
                if position < ordinal {
                    position += 1;
                    return Ok(ControlFlow::Continue(()));
                }
                let mut bytes = Vec::new();
                entry.reader.read_to_end(&mut bytes)?;
                buffered = Some(bytes);
                Ok(ControlFlow::Break(()))
            })?;

            match buffered {
                Some(bytes) => Ok(Box::new(Cursor::new(bytes)) as Box<dyn Read>),
                None => Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("archive entry #{ordinal} is no longer present"),
                )),
            }
        })
    }

    /// Reopen the compressed parent through `parent` and decompress it again.
    pub(crate) fn decompressed(parent: Reopener, format: Arc<dyn CompressionFormat>) -> Self {
        Self::new(move || format.decompress(parent.reopen()?))
    }

    pub fn reopen(&self) -> io::Result<Box<dyn Read>> {
        (self.0)()
    }
}

impl fmt::Debug for Reopener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Reopener")
    }
}

/// One unit of content handed to a [`ContentsProcessor`].
pub struct ContentHandle<'a> {
    path: String,
    stream: Box<dyn Read + 'a>,
    last_modified: Option<SystemTime>,
    size: Option<u64>,
    checksum: Option<u32>,
    reopener: Reopener,
}

impl<'a> ContentHandle<'a> {
    pub fn new(path: impl Into<String>, stream: Box<dyn Read + 'a>, reopener: Reopener) -> Self {
        Self {
            path: path.into(),
            stream,
            last_modified: None,
            size: None,
            checksum: None,
            reopener,
        }
    }

    pub fn with_last_modified(mut self, last_modified: Option<SystemTime>) -> Self {
        self.last_modified = last_modified;
        self
    }

    pub fn with_size(mut self, size: Option<u64>) -> Self {
        self.size = size;
        self
    }

    pub fn with_checksum(mut self, checksum: Option<u32>) -> Self {
        self.checksum = checksum;
        self
    }

    /// Same metadata, different bytes.
    pub fn with_stream<'b>(self, stream: Box<dyn Read + 'b>) -> ContentHandle<'b> {
        ContentHandle {
            path: self.path,
            stream,
            last_modified: self.last_modified,
            size: self.size,
            checksum: self.checksum,
            reopener: self.reopener,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// The content bytes. Read at most once; use [`reopen`](Self::reopen)
    /// for a second pass.
    pub fn stream(&mut self) -> &mut (dyn Read + 'a) {
        &mut *self.stream
    }

    pub fn into_stream(self) -> Box<dyn Read + 'a> {
        self.stream
    }

    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn checksum(&self) -> Option<u32> {
        self.checksum
    }

    pub fn reopener(&self) -> &Reopener {
        &self.reopener
    }

    pub fn reopen(&self) -> io::Result<Box<dyn Read>> {
        self.reopener.reopen()
    }

    /// Split into the stream and a handle whose stream is empty.
    pub(crate) fn take_stream(self) -> (Box<dyn Read + 'a>, ContentHandle<'static>) {
        let stream = self.stream;
        let rest = ContentHandle {
            path: self.path,
            stream: Box::new(io::empty()),
            last_modified: self.last_modified,
            size: self.size,
            checksum: self.checksum,
            reopener: self.reopener,
        };
        (stream, rest)
    }
}

impl fmt::Debug for ContentHandle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentHandle")
            .field("path", &self.path)
            .field("last_modified", &self.last_modified)
            .field("size", &self.size)
            .field("checksum", &self.checksum)
            .finish_non_exhaustive()
    }
}

/// Leaf visitor, called once per unit of content.
///
/// Returning `Ok(None)` means the unit intentionally produced nothing.
pub trait ContentsProcessor<T>: Send + Sync {
    fn process(&self, content: ContentHandle<'_>) -> io::Result<Option<T>>;
}

impl<T, F> ContentsProcessor<T> for F
where
    F: Fn(ContentHandle<'_>) -> io::Result<Option<T>> + Send + Sync,
{
    fn process(&self, content: ContentHandle<'_>) -> io::Result<Option<T>> {
        self(content)
    }
}

/// File-level visitor, called once per filesystem path.
///
/// `path` is the identifier reported to predicates and combiners; `file` is
/// where the bytes live.
pub trait FileProcessor<T>: Send + Sync {
    fn process(&self, path: &str, file: &Path) -> Result<Option<T>, WalkError>;
}

impl<T, F> FileProcessor<T> for F
where
    F: Fn(&str, &Path) -> Result<Option<T>, WalkError> + Send + Sync,
{
    fn process(&self, path: &str, file: &Path) -> Result<Option<T>, WalkError> {
        self(path, file)
    }
}
