//! Content processing that descends into nested containers.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::Path;
use std::sync::Arc;

use crate::content::{
    ContentDispatcher, ContentHandle, ContentHandler, ContentsProcessor, FileProcessor, Reopener,
};
use crate::error::WalkError;
use crate::formats::{ArchiveFormat, CompressionFormat};

use super::archive::process_archive;
use super::combine::{ArchiveCombiner, CompressionCombiner};
use super::handler::{ExceptionHandler, contain};

/// A [`ContentsProcessor`] that opens every container the dispatcher lets
/// through and feeds its contents back to itself, one level deeper each
/// time. Plain units go to the leaf processor.
///
/// Decompressed streams are addressed as `path + "%"`; archive entries as
/// `archive + "!" + name`. A unit nested three levels deep therefore reads
/// like `/d/outer.zip!inner.tar.gz%!file.txt`.
pub struct RecursiveContentProcessor<T> {
    dispatcher: ContentDispatcher,
    leaf: Arc<dyn ContentsProcessor<T>>,
    archive_combiner: Arc<dyn ArchiveCombiner<T>>,
    compression_combiner: Arc<dyn CompressionCombiner<T>>,
    handler: Arc<dyn ExceptionHandler>,
}

impl<T> RecursiveContentProcessor<T> {
    pub fn new(
        dispatcher: ContentDispatcher,
        leaf: Arc<dyn ContentsProcessor<T>>,
        archive_combiner: Arc<dyn ArchiveCombiner<T>>,
        compression_combiner: Arc<dyn CompressionCombiner<T>>,
        handler: Arc<dyn ExceptionHandler>,
    ) -> Self {
        Self {
            dispatcher,
            leaf,
            archive_combiner,
            compression_combiner,
            handler,
        }
    }
}

impl<T> ContentsProcessor<T> for RecursiveContentProcessor<T> {
    fn process(&self, content: ContentHandle<'_>) -> io::Result<Option<T>> {
        self.dispatcher.dispatch(content, self)
    }
}

impl<T> ContentHandler<T> for RecursiveContentProcessor<T> {
    fn archive(&self, format: Arc<dyn ArchiveFormat>, mut content: ContentHandle<'_>) -> io::Result<Option<T>> {
        let path = content.path().to_string();
        let reopener = content.reopener().clone();
        process_archive(
            &path,
            content.stream(),
            &format,
            self,
            self.archive_combiner.as_ref(),
            &reopener,
            self.handler.as_ref(),
        )
    }

    fn compressed(
        &self,
        format: Arc<dyn CompressionFormat>,
        content: ContentHandle<'_>,
    ) -> io::Result<Option<T>> {
        let path = content.path().to_string();
        let inner_path = format!("{path}%");
        let reopener = Reopener::decompressed(content.reopener().clone(), format);
        let last_modified = content.last_modified();

        let inner = ContentHandle::new(inner_path.clone(), content.into_stream(), reopener)
            .with_last_modified(last_modified);
        let result = match self.process(inner) {
            Ok(result) => result,
            Err(error) => {
                contain(self.handler.as_ref(), &inner_path, error)?;
                None
            }
        };
        Ok(self.compression_combiner.combine(&path, result))
    }

    fn normal(&self, content: ContentHandle<'_>) -> io::Result<Option<T>> {
        self.leaf.process(content)
    }
}

/// [`FileProcessor`] that opens one filesystem entry and hands it to a
/// [`ContentsProcessor`].
///
/// A directory handed to it (include-dirs mode) becomes an empty unit at
/// `path + "/"`.
pub struct ContentFileProcessor<T> {
    contents: Arc<dyn ContentsProcessor<T>>,
}

impl<T> ContentFileProcessor<T> {
    pub fn new(contents: Arc<dyn ContentsProcessor<T>>) -> Self {
        Self { contents }
    }
}

impl<T> FileProcessor<T> for ContentFileProcessor<T> {
    fn process(&self, path: &str, file: &Path) -> Result<Option<T>, WalkError> {
        let metadata = fs::metadata(file).map_err(|e| WalkError::io(path, e))?;
        let last_modified = metadata.modified().ok();

        let handle = if metadata.is_dir() {
            ContentHandle::new(with_trailing_slash(path), Box::new(io::empty()), Reopener::empty())
        } else {
            let stream = File::open(file).map_err(|e| WalkError::io(path, e))?;
            ContentHandle::new(path, Box::new(BufReader::new(stream)), Reopener::for_file(file))
                .with_size(Some(metadata.len()))
        };

        self.contents
            .process(handle.with_last_modified(last_modified))
            .map_err(|e| WalkError::io(path, e))
    }
}

pub(crate) fn with_trailing_slash(path: &str) -> String {
    if path.ends_with('/') {
        path.to_string()
    } else {
        format!("{path}/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formats::FormatRegistry;
    use crate::shared::predicate::PathPredicate;
    use crate::walk::combine::PassThrough;
    use crate::walk::handler::LogAndSuppress;
    use std::io::{Cursor, Read, Write};

    #[derive(Debug, PartialEq)]
    enum Node {
        Leaf(String, Vec<u8>),
        Archive(String, Vec<Option<Node>>),
    }

    fn leaf(mut content: ContentHandle<'_>) -> io::Result<Option<Node>> {
        let mut bytes = Vec::new();
        content.stream().read_to_end(&mut bytes)?;
        Ok(Some(Node::Leaf(content.path().to_string(), bytes)))
    }

    fn archive(path: &str, results: Vec<Option<Node>>) -> Option<Node> {
        Some(Node::Archive(path.to_string(), results))
    }

    fn processor(look_into: PathPredicate) -> RecursiveContentProcessor<Node> {
        RecursiveContentProcessor::new(
            ContentDispatcher::new(Arc::new(FormatRegistry::with_defaults()), look_into),
            Arc::new(leaf),
            Arc::new(archive),
            Arc::new(PassThrough),
            Arc::new(LogAndSuppress),
        )
    }

    fn zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut writer = ::zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            writer
                .start_file(*name, ::zip::write::FileOptions::default())
                .unwrap();
            writer.write_all(data).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    fn gzip(data: &[u8]) -> Vec<u8> {
        let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    fn unit(path: &str, bytes: Vec<u8>) -> ContentHandle<'static> {
        ContentHandle::new(path, Box::new(Cursor::new(bytes)), Reopener::empty())
    }

    #[test]
    fn test_compressed_archive_inside_archive() {
        let inner = gzip(&zip(&[("deep.txt", b"deep")]));
        let outer = zip(&[("top.txt", b"top"), ("inner.zip.gz", &inner)]);

        let result = processor(PathPredicate::always())
            .process(unit("/d/outer.zip", outer))
            .unwrap();

        assert_eq!(
            result,
            Some(Node::Archive(
                "/d/outer.zip".to_string(),
                vec![
                    Some(Node::Leaf("/d/outer.zip!top.txt".to_string(), b"top".to_vec())),
                    Some(Node::Archive(
                        "/d/outer.zip!inner.zip.gz%".to_string(),
                        vec![Some(Node::Leaf(
                            "/d/outer.zip!inner.zip.gz%!deep.txt".to_string(),
                            b"deep".to_vec()
                        ))]
                    )),
                ]
            ))
        );
    }

    #[test]
    fn test_look_into_keeps_container_opaque() {
        let outer = zip(&[("top.txt", b"top")]);
        let result = processor(PathPredicate::never())
            .process(unit("/d/outer.zip", outer.clone()))
            .unwrap();

        assert_eq!(result, Some(Node::Leaf("/d/outer.zip".to_string(), outer)));
    }

    #[test]
    fn test_corrupt_compressed_stream_is_suppressed() {
        let mut broken = gzip(b"payload that will not inflate");
        let len = broken.len();
        broken.truncate(len / 2);

        let result = processor(PathPredicate::always())
            .process(unit("/d/c.gz", broken))
            .unwrap();
        assert_eq!(result, None);
    }

    #[test]
    fn test_file_processor_reads_files_and_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("a.txt");
        std::fs::write(&file, b"alpha").unwrap();

        let files = ContentFileProcessor::new(Arc::new(leaf) as Arc<dyn ContentsProcessor<Node>>);
        assert_eq!(
            files.process("/d/a.txt", &file).unwrap(),
            Some(Node::Leaf("/d/a.txt".to_string(), b"alpha".to_vec()))
        );
        assert_eq!(
            files.process("/d", dir.path()).unwrap(),
            Some(Node::Leaf("/d/".to_string(), Vec::new()))
        );

        let missing = files.process("/d/gone", &dir.path().join("gone")).unwrap_err();
        assert!(matches!(missing, WalkError::Io { .. }));
    }

    #[test]
    fn test_trailing_slash_is_not_doubled() {
        assert_eq!(with_trailing_slash("/d"), "/d/");
        assert_eq!(with_trailing_slash("/d/"), "/d/");
    }
}
