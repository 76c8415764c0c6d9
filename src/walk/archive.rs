//! Sequential traversal of one archive.

use std::io::{self, Read};
use std::ops::ControlFlow;
use std::sync::Arc;

use crate::content::{ContentHandle, ContentsProcessor, Reopener};
use crate::formats::{ArchiveFormat, EntryKind};

use super::combine::ArchiveCombiner;
use super::handler::{ExceptionHandler, contain};

/// Feed every file entry of an archive to `contents` and fold the results.
///
/// Entries are visited strictly in archive order and are addressed as
/// `archive_path + "!" + entry name`. Directory and link entries contribute
/// no result. A failed entry is decided by `handler`: suppressed entries
/// contribute `None`, an abort stops the archive and is returned.
///
/// When the next entry header cannot be read the failure is reported
/// against `archive_path`. If it is suppressed, the entries collected so far
/// are still combined.
///
/// Each entry handle reopens through `archive_reopener`, re-reading the
/// archive up to that entry: the cost is proportional to the entry's
/// position, not its size.
#[allow(clippy::too_many_arguments)]
pub fn process_archive<T>(
    archive_path: &str,
    archive_stream: &mut dyn Read,
    format: &Arc<dyn ArchiveFormat>,
    contents: &dyn ContentsProcessor<T>,
    combiner: &dyn ArchiveCombiner<T>,
    archive_reopener: &Reopener,
    handler: &dyn ExceptionHandler,
) -> io::Result<Option<T>> {
    let mut results = Vec::new();
    let mut ordinal = 0usize;
    let mut aborted = None;

    let iteration = format.for_each_entry(archive_stream, &mut |entry| {
        let position = ordinal;
        ordinal += 1;
        if entry.kind != EntryKind::File {
            tracing::trace!("Skipping {:?} entry {}!{}", entry.kind, archive_path, entry.name);
            return Ok(ControlFlow::Continue(()));
        }

        let entry_path = format!("{}!{}", archive_path, entry.name);
        tracing::trace!("Visiting entry {}", entry_path);
        let reopener = Reopener::entry(archive_reopener.clone(), format.clone(), position);
        let handle = ContentHandle::new(entry_path.clone(), Box::new(entry.reader), reopener)
            .with_size(entry.size)
            .with_last_modified(entry.last_modified)
            .with_checksum(entry.checksum);

        match contents.process(handle) {
            Ok(result) => results.push(result),
            Err(error) => match contain(handler, &entry_path, error) {
                Ok(()) => results.push(None),
                Err(error) => {
                    aborted = Some(error);
                    return Ok(ControlFlow::Break(()));
                }
            },
        }
        Ok(ControlFlow::Continue(()))
    });

    if let Some(error) = aborted {
        return Err(error);
    }
    if let Err(error) = iteration {
        contain(handler, archive_path, error)?;
        tracing::debug!(
            "Combining {} entries of damaged archive {}",
            results.len(),
            archive_path
        );
    }
    Ok(combiner.combine(archive_path, results))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::ZipFormat;
    use crate::walk::handler::{CollectingHandler, FailFast, LogAndSuppress, is_aborted};
    use std::io::{Cursor, Write};

    #[derive(Debug, PartialEq)]
    enum Node {
        Leaf(String, u64),
        Archive(Vec<Option<Node>>),
    }

    fn build_zip(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = ::zip::write::FileOptions::default()
            .compression_method(::zip::CompressionMethod::Stored);
        for (name, data) in entries {
            if name.ends_with('/') {
                writer.add_directory(*name, options).unwrap();
            } else {
                writer.start_file(*name, options).unwrap();
                writer.write_all(data.as_bytes()).unwrap();
            }
        }
        writer.finish().unwrap().into_inner()
    }

    fn leaf(mut content: ContentHandle<'_>) -> io::Result<Option<Node>> {
        let bytes = io::copy(content.stream(), &mut io::sink())?;
        Ok(Some(Node::Leaf(content.path().to_string(), bytes)))
    }

    fn archive(_: &str, results: Vec<Option<Node>>) -> Option<Node> {
        Some(Node::Archive(results))
    }

    fn run(bytes: Vec<u8>, handler: &dyn ExceptionHandler) -> io::Result<Vec<Option<Node>>> {
        let format: Arc<dyn ArchiveFormat> = Arc::new(ZipFormat);
        let result = process_archive::<Node>(
            "/d/b.zip",
            &mut Cursor::new(bytes),
            &format,
            &leaf,
            &archive,
            &Reopener::empty(),
            handler,
        )?;
        match result {
            Some(Node::Archive(children)) => Ok(children),
            other => panic!("unexpected archive result {other:?}"),
        }
    }

    fn corrupt(mut bytes: Vec<u8>, marker: &[u8]) -> Vec<u8> {
        let at = bytes
            .windows(marker.len())
            .position(|w| w == marker)
            .unwrap();
        bytes[at] ^= 0xff;
        bytes
    }

    fn leaf_at(path: &str, bytes: u64) -> Option<Node> {
        Some(Node::Leaf(path.to_string(), bytes))
    }

    #[test]
    fn test_entries_in_order_skipping_directories() {
        let bytes = build_zip(&[("x.txt", "xx"), ("sub/", ""), ("sub/y.txt", "yyy")]);
        let results = run(bytes, &LogAndSuppress).unwrap();

        assert_eq!(
            results,
            vec![leaf_at("/d/b.zip!x.txt", 2), leaf_at("/d/b.zip!sub/y.txt", 3)]
        );
    }

    #[test]
    fn test_corrupted_entry_becomes_gap() {
        let bytes = build_zip(&[("a.txt", "first"), ("b.txt", "CORRUPTME"), ("c.txt", "third")]);
        let bytes = corrupt(bytes, b"CORRUPTME");
        let handler = CollectingHandler::new();

        let results = run(bytes, &handler).unwrap();

        assert_eq!(
            results,
            vec![leaf_at("/d/b.zip!a.txt", 5), None, leaf_at("/d/b.zip!c.txt", 5)]
        );
        let failures = handler.failures();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].path, "/d/b.zip!b.txt");
    }

    #[test]
    fn test_fail_fast_aborts_archive() {
        let bytes = build_zip(&[("a.txt", "first"), ("b.txt", "CORRUPTME"), ("c.txt", "third")]);
        let bytes = corrupt(bytes, b"CORRUPTME");

        let error = run(bytes, &FailFast).unwrap_err();
        assert!(is_aborted(&error));
    }

    #[test]
    fn test_truncated_archive_keeps_earlier_entries() {
        let bytes = build_zip(&[("a.txt", "first"), ("b.txt", "second-entry-data")]);
        let cut = bytes.windows(5).position(|w| w == b"b.txt").unwrap();
        let handler = CollectingHandler::new();

        let results = run(bytes[..cut + 8].to_vec(), &handler).unwrap();

        assert_eq!(results.first(), Some(&leaf_at("/d/b.zip!a.txt", 5)));
        assert!(!handler.is_empty());
    }
}
