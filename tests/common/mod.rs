//! Fixture builders shared by the integration tests.
#![allow(dead_code)]

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;

pub fn zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, zip::write::FileOptions::default())
                .unwrap();
            continue;
        }
        writer
            .start_file(*name, zip::write::FileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn tar(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut builder = tar::Builder::new(Vec::new());
    for (name, data) in entries {
        let mut header = tar::Header::new_ustar();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_mtime(1_700_000_000);
        header.set_cksum();
        builder.append_data(&mut header, name, *data).unwrap();
    }
    builder.into_inner().unwrap()
}

pub fn gzip(data: &[u8]) -> Vec<u8> {
    let mut encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

pub fn zstd(data: &[u8]) -> Vec<u8> {
    zstd::encode_all(data, 3).unwrap()
}

pub fn lz4(data: &[u8]) -> Vec<u8> {
    let mut encoder = lz4_flex::frame::FrameEncoder::new(Vec::new());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

/// Gzip stream cut in half: the header sniffs fine, inflating fails.
pub fn broken_gzip() -> Vec<u8> {
    let mut bytes = gzip(b"this payload is cut short before the trailer");
    let len = bytes.len();
    bytes.truncate(len / 2);
    bytes
}

/// A scratch directory tree.
pub struct Tree {
    pub dir: TempDir,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Root as the walker addresses it.
    pub fn root_str(&self) -> String {
        self.root().to_string_lossy().into_owned()
    }

    pub fn file(&self, relative: &str, data: &[u8]) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, data).unwrap();
        path
    }

    pub fn dir(&self, relative: &str) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(&path).unwrap();
        path
    }

    /// Mixed tree used by most tests:
    ///
    /// ```text
    /// a.txt
    /// docs/readme.md
    /// docs/bundle.zip      { x.txt, sub/, sub/y.txt, z.txt.gz }
    /// logs/app.log.zst
    /// data.tar.gz          { one.txt, inner.zip { deep.txt } }
    /// ```
    pub fn mixed() -> Self {
        let tree = Self::new();
        tree.file("a.txt", b"alpha");
        tree.file("docs/readme.md", b"# readme");
        tree.file(
            "docs/bundle.zip",
            &zip(&[
                ("x.txt", b"xx"),
                ("sub/", b""),
                ("sub/y.txt", b"yyy"),
                ("z.txt.gz", &gzip(b"zzzz")),
            ]),
        );
        tree.file("logs/app.log.zst", &zstd(b"log line\n"));
        let inner = zip(&[("deep.txt", b"deep")]);
        tree.file(
            "data.tar.gz",
            &gzip(&tar(&[("one.txt", b"1"), ("inner.zip", &inner)])),
        );
        tree
    }
}
