use std::io::{self, Read};

use super::CompressionFormat;

const MAGIC: &[u8] = &[0x28, 0xb5, 0x2f, 0xfd];

#[derive(Debug, Default, Clone, Copy)]
pub struct ZstdFormat;

impl CompressionFormat for ZstdFormat {
    fn name(&self) -> &'static str {
        "zstd"
    }

    fn matches(&self, signature: &[u8]) -> bool {
        signature.starts_with(MAGIC)
    }

    fn decompress<'a>(&self, stream: Box<dyn Read + 'a>) -> io::Result<Box<dyn Read + 'a>> {
        Ok(Box::new(::zstd::stream::read::Decoder::new(stream)?))
    }
}
