use std::io::{self, Read};

use lz4_flex::frame::FrameDecoder;

use super::CompressionFormat;

const FRAME_MAGIC: &[u8] = &[0x04, 0x22, 0x4d, 0x18];

/// LZ4 frame format. Raw block streams carry no signature and are not
/// recognised.
#[derive(Debug, Default, Clone, Copy)]
pub struct Lz4Format;

impl CompressionFormat for Lz4Format {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn matches(&self, signature: &[u8]) -> bool {
        signature.starts_with(FRAME_MAGIC)
    }

    fn decompress<'a>(&self, stream: Box<dyn Read + 'a>) -> io::Result<Box<dyn Read + 'a>> {
        Ok(Box::new(FrameDecoder::new(stream)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lz4_flex::frame::FrameEncoder;
    use std::io::Write;

    #[test]
    fn test_frame_round_trip() {
        let mut encoder = FrameEncoder::new(Vec::new());
        encoder.write_all(b"lz4 frame payload").unwrap();
        let bytes = encoder.finish().unwrap();
        assert!(Lz4Format.matches(&bytes));

        let mut decoded = Vec::new();
        Lz4Format
            .decompress(Box::new(io::Cursor::new(bytes)))
            .unwrap()
            .read_to_end(&mut decoded)
            .unwrap();
        assert_eq!(decoded, b"lz4 frame payload");
    }
}
