//! Format sniffing and routing of content units to a [`ContentHandler`].

use std::io::{self, Cursor, Read};
use std::sync::Arc;

use crate::formats::{ArchiveFormat, CompressionFormat, Format, FormatRegistry};
use crate::shared::predicate::PathPredicate;

use super::ContentHandle;

/// Bytes inspected before deciding how to open a stream. Covers the ustar
/// magic at offset 257.
pub const SIGNATURE_LEN: usize = 512;

/// Outcome of sniffing one stream.
///
/// Every variant carries a stream that starts at the first byte of the
/// original content; the signature prefix is never lost.
pub enum Sniffed<'a> {
    Archive {
        format: Arc<dyn ArchiveFormat>,
        stream: Box<dyn Read + 'a>,
    },
    /// `stream` yields the decompressed bytes.
    Compressed {
        format: Arc<dyn CompressionFormat>,
        stream: Box<dyn Read + 'a>,
    },
    Normal {
        stream: Box<dyn Read + 'a>,
    },
}

impl Sniffed<'_> {
    pub fn kind(&self) -> &'static str {
        match self {
            Sniffed::Archive { .. } => "archive",
            Sniffed::Compressed { .. } => "compressed",
            Sniffed::Normal { .. } => "normal",
        }
    }
}

/// The three routes a unit of content can take after sniffing.
pub trait ContentHandler<T> {
    /// `content` streams the raw archive bytes.
    fn archive(&self, format: Arc<dyn ArchiveFormat>, content: ContentHandle<'_>) -> io::Result<Option<T>>;

    /// `content` keeps the compressed unit's path and metadata but streams
    /// the decompressed bytes.
    fn compressed(
        &self,
        format: Arc<dyn CompressionFormat>,
        content: ContentHandle<'_>,
    ) -> io::Result<Option<T>>;

    fn normal(&self, content: ContentHandle<'_>) -> io::Result<Option<T>>;
}

/// Signature sniffing gated by a look-into predicate.
///
/// A detected container is only opened when the predicate accepts
/// `"<format>:<path>"`; otherwise it is handed on as ordinary content.
#[derive(Debug, Clone)]
pub struct ContentDispatcher {
    registry: Arc<FormatRegistry>,
    look_into: PathPredicate,
}

impl ContentDispatcher {
    pub fn new(registry: Arc<FormatRegistry>, look_into: PathPredicate) -> Self {
        Self { registry, look_into }
    }

    pub fn sniff<'a>(&self, path: &str, mut stream: Box<dyn Read + 'a>) -> io::Result<Sniffed<'a>> {
        let mut signature = Vec::with_capacity(SIGNATURE_LEN);
        stream
            .by_ref()
            .take(SIGNATURE_LEN as u64)
            .read_to_end(&mut signature)?;

        let detected = self
            .registry
            .detect(&signature)
            .filter(|format| self.look_into.test(&format!("{}:{}", format.name(), path)));
        let replay: Box<dyn Read + 'a> = Box::new(Cursor::new(signature).chain(stream));

        let sniffed = match detected {
            Some(Format::Archive(format)) => Sniffed::Archive {
                format,
                stream: replay,
            },
            Some(Format::Compression(format)) => {
                let stream = format.decompress(replay)?;
                Sniffed::Compressed { format, stream }
            }
            None => Sniffed::Normal { stream: replay },
        };
        tracing::debug!("Dispatching {} as {}", path, sniffed.kind());
        Ok(sniffed)
    }

    /// Sniff `content` and route it to the matching arm of `handler`.
    pub fn dispatch<T>(
        &self,
        content: ContentHandle<'_>,
        handler: &dyn ContentHandler<T>,
    ) -> io::Result<Option<T>> {
        let (stream, rest) = content.take_stream();
        match self.sniff(rest.path(), stream)? {
            Sniffed::Archive { format, stream } => handler.archive(format, rest.with_stream(stream)),
            Sniffed::Compressed { format, stream } => {
                handler.compressed(format, rest.with_stream(stream))
            }
            Sniffed::Normal { stream } => handler.normal(rest.with_stream(stream)),
        }
    }
}
