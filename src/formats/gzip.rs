use std::io::{self, Read};

use flate2::read::MultiGzDecoder;

use super::CompressionFormat;

const MAGIC: &[u8] = &[0x1f, 0x8b];

/// Gzip streams, including concatenated members.
#[derive(Debug, Default, Clone, Copy)]
pub struct GzipFormat;

impl CompressionFormat for GzipFormat {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn matches(&self, signature: &[u8]) -> bool {
        signature.starts_with(MAGIC)
    }

    fn decompress<'a>(&self, stream: Box<dyn Read + 'a>) -> io::Result<Box<dyn Read + 'a>> {
        Ok(Box::new(MultiGzDecoder::new(stream)))
    }
}
