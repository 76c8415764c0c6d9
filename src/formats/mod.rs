//! Container format providers
//!
//! A format is recognised from a bounded signature prefix and opened
//! forward-only. Archive formats yield a sequence of entries; compression
//! formats yield a single decompressed stream.
//!
//! # Built-in providers
//! - `zip`: central directory of a spooled copy, local headers as fallback (`zip` crate)
//! - `tar`: ustar archives (`tar` crate)
//! - `gzip`: multi-member gzip (`flate2`)
//! - `zstd`: zstandard frames (`zstd`)
//! - `lz4`: lz4 frame format (`lz4_flex`)

mod gzip;
mod lz4;
mod tar;
mod zip;
mod zstd;

use std::fmt;
use std::io::{self, Read};
use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::SystemTime;

pub use self::gzip::GzipFormat;
pub use self::lz4::Lz4Format;
pub use self::tar::TarFormat;
pub use self::zip::ZipFormat;
pub use self::zstd::ZstdFormat;

/// Identifiers accepted by [`FormatRegistry::from_names`].
pub const BUILTIN_FORMATS: &[&str] = &["zip", "tar", "gzip", "zstd", "lz4"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    /// Links, devices and other non-content entries
    Other,
}

/// One member of an archive, valid only inside the visitor call.
pub struct ArchiveEntry<'e> {
    pub name: String,
    pub kind: EntryKind,
    pub size: Option<u64>,
    pub last_modified: Option<SystemTime>,
    pub checksum: Option<u32>,
    pub reader: &'e mut dyn Read,
}

impl fmt::Debug for ArchiveEntry<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveEntry")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("size", &self.size)
            .field("last_modified", &self.last_modified)
            .field("checksum", &self.checksum)
            .finish_non_exhaustive()
    }
}

/// Visitor invoked once per archive entry, in archive order.
pub type EntryVisitor<'v> = dyn FnMut(ArchiveEntry<'_>) -> io::Result<ControlFlow<()>> + 'v;

pub trait ArchiveFormat: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn matches(&self, signature: &[u8]) -> bool;

    /// Read `stream` front to back, handing every entry to `visit`.
    ///
    /// An `Err` from the visitor stops iteration and is returned unchanged.
    /// Any other `Err` means the archive structure itself could not be read.
    fn for_each_entry(&self, stream: &mut dyn Read, visit: &mut EntryVisitor<'_>) -> io::Result<()>;
}

pub trait CompressionFormat: Send + Sync + fmt::Debug {
    fn name(&self) -> &'static str;

    fn matches(&self, signature: &[u8]) -> bool;

    fn decompress<'a>(&self, stream: Box<dyn Read + 'a>) -> io::Result<Box<dyn Read + 'a>>;
}

/// A recognised container format.
#[derive(Debug, Clone)]
pub enum Format {
    Archive(Arc<dyn ArchiveFormat>),
    Compression(Arc<dyn CompressionFormat>),
}

impl Format {
    pub fn name(&self) -> &'static str {
        match self {
            Format::Archive(format) => format.name(),
            Format::Compression(format) => format.name(),
        }
    }

    /// Resolve a built-in provider by identifier.
    pub fn builtin(name: &str) -> Option<Format> {
        let format = match name {
            "zip" => Format::Archive(Arc::new(ZipFormat)),
            "tar" => Format::Archive(Arc::new(TarFormat)),
            "gzip" | "gz" => Format::Compression(Arc::new(GzipFormat)),
            "zstd" | "zst" => Format::Compression(Arc::new(ZstdFormat)),
            "lz4" => Format::Compression(Arc::new(Lz4Format)),
            _ => return None,
        };
        Some(format)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("unknown format '{name}' (known formats: {known})")]
    Unknown { name: String, known: String },
}

/// Signature sniffing over a fixed set of providers.
///
/// Archives are tried before compressions, each in registration order.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    archives: Vec<Arc<dyn ArchiveFormat>>,
    compressions: Vec<Arc<dyn CompressionFormat>>,
}

impl FormatRegistry {
    /// A registry that recognises nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        for name in BUILTIN_FORMATS {
            if let Some(format) = Format::builtin(name) {
                registry.register(format);
            }
        }
        registry
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Result<Self, FormatError> {
        let mut registry = Self::empty();
        for name in names {
            let name = name.as_ref();
            let format = Format::builtin(name).ok_or_else(|| FormatError::Unknown {
                name: name.to_string(),
                known: BUILTIN_FORMATS.join(", "),
            })?;
            registry.register(format);
        }
        tracing::debug!("Enabled formats: {}", registry.names().join(", "));
        Ok(registry)
    }

    pub fn register(&mut self, format: Format) -> &mut Self {
        if self.names().contains(&format.name()) {
            return self;
        }
        match format {
            Format::Archive(format) => self.archives.push(format),
            Format::Compression(format) => self.compressions.push(format),
        }
        self
    }

    pub fn register_archive(&mut self, format: Arc<dyn ArchiveFormat>) -> &mut Self {
        self.register(Format::Archive(format))
    }

    pub fn register_compression(&mut self, format: Arc<dyn CompressionFormat>) -> &mut Self {
        self.register(Format::Compression(format))
    }

    pub fn detect(&self, signature: &[u8]) -> Option<Format> {
        if let Some(archive) = self.archives.iter().find(|f| f.matches(signature)) {
            return Some(Format::Archive(archive.clone()));
        }
        self.compressions
            .iter()
            .find(|f| f.matches(signature))
            .map(|f| Format::Compression(f.clone()))
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.archives
            .iter()
            .map(|f| f.name())
            .chain(self.compressions.iter().map(|f| f.name()))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.archives.is_empty() && self.compressions.is_empty()
    }
}
