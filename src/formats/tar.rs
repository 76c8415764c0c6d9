use std::io::{self, Read};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use super::{ArchiveEntry, ArchiveFormat, EntryKind, EntryVisitor};

const USTAR_MAGIC: &[u8] = b"ustar";
const MAGIC_OFFSET: usize = 257;

/// POSIX ustar and GNU tar archives.
#[derive(Debug, Default, Clone, Copy)]
pub struct TarFormat;

impl ArchiveFormat for TarFormat {
    fn name(&self) -> &'static str {
        "tar"
    }

    fn matches(&self, signature: &[u8]) -> bool {
        signature
            .get(MAGIC_OFFSET..MAGIC_OFFSET + USTAR_MAGIC.len())
            .is_some_and(|magic| magic == USTAR_MAGIC)
    }

    fn for_each_entry(&self, stream: &mut dyn Read, visit: &mut EntryVisitor<'_>) -> io::Result<()> {
        let mut archive = ::tar::Archive::new(stream);
        for entry in archive.entries()? {
            let mut entry = entry?;
            let header = entry.header();
            let entry_type = header.entry_type();
            let kind = if entry_type.is_file() {
                EntryKind::File
            } else if entry_type.is_dir() {
                EntryKind::Directory
            } else {
                EntryKind::Other
            };
            let last_modified = header.mtime().ok().map(modified_at);
            let size = entry.size();
            let name = entry.path()?.to_string_lossy().into_owned();

            let visited = ArchiveEntry {
                name,
                kind,
                size: Some(size),
                last_modified,
                checksum: None,
                reader: &mut entry,
            };
            if visit(visited)?.is_break() {
                break;
            }
        }
        Ok(())
    }
}

fn modified_at(seconds: u64) -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(seconds)
}
