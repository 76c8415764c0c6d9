//! A ready-made result type: one record per leaf, with container counts.
//!
//! Used by the command line, and a compact example of wiring a leaf
//! processor and combiners into a [`WalkBuilder`].

use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

use serde::Serialize;

use crate::content::{ContentHandle, ContentsProcessor};
use crate::walk::{ArchiveCombiner, CompressionCombiner, DirectoryCombiner, WalkBuilder};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeafRecord {
    /// Full nesting path, e.g. `/d/a.zip!b.tar.gz%!c.txt`.
    pub path: String,
    pub bytes: u64,
    /// Seconds since the Unix epoch, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checksum: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Manifest {
    pub leaves: Vec<LeafRecord>,
    pub directories: usize,
    pub archives: usize,
    pub compressed: usize,
}

impl Manifest {
    pub fn leaf(record: LeafRecord) -> Self {
        Self {
            leaves: vec![record],
            ..Self::default()
        }
    }

    pub fn total_bytes(&self) -> u64 {
        self.leaves.iter().map(|leaf| leaf.bytes).sum()
    }

    /// Append `other` after the leaves already collected.
    pub fn merge(&mut self, other: Manifest) {
        self.leaves.extend(other.leaves);
        self.directories += other.directories;
        self.archives += other.archives;
        self.compressed += other.compressed;
    }

    fn concat(children: Vec<Option<Manifest>>) -> Self {
        children
            .into_iter()
            .flatten()
            .fold(Manifest::default(), |mut acc, child| {
                acc.merge(child);
                acc
            })
    }
}

/// Leaf processor that drains each unit and records its length.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByteCounter;

impl ContentsProcessor<Manifest> for ByteCounter {
    fn process(&self, mut content: ContentHandle<'_>) -> io::Result<Option<Manifest>> {
        let bytes = io::copy(content.stream(), &mut io::sink())?;
        tracing::trace!("{}: {} bytes", content.path(), bytes);
        let modified = content
            .last_modified()
            .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
            .map(|age| age.as_secs());
        Ok(Some(Manifest::leaf(LeafRecord {
            path: content.path().to_string(),
            bytes,
            modified,
            checksum: content.checksum(),
        })))
    }
}

/// Concatenates child manifests in order and counts each container opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestCombiner;

impl ArchiveCombiner<Manifest> for ManifestCombiner {
    fn combine(&self, _archive_path: &str, results: Vec<Option<Manifest>>) -> Option<Manifest> {
        let mut manifest = Manifest::concat(results);
        manifest.archives += 1;
        Some(manifest)
    }
}

impl CompressionCombiner<Manifest> for ManifestCombiner {
    fn combine(&self, _path: &str, result: Option<Manifest>) -> Option<Manifest> {
        let mut manifest = result.unwrap_or_default();
        manifest.compressed += 1;
        Some(manifest)
    }
}

impl DirectoryCombiner<Manifest> for ManifestCombiner {
    fn combine(
        &self,
        _path: &str,
        _directory: &Path,
        results: Vec<Option<Manifest>>,
    ) -> Option<Manifest> {
        let mut manifest = Manifest::concat(results);
        manifest.directories += 1;
        Some(manifest)
    }
}

/// A [`WalkBuilder`] producing a [`Manifest`].
pub fn builder() -> WalkBuilder<Manifest> {
    WalkBuilder::new(ByteCounter).combiner(ManifestCombiner)
}
