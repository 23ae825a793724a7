use anyhow::{Context, Result};
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Largest buffer reserved up front for a member, whatever size it declares.
const MAX_PREALLOC: u64 = 1 << 26;

/// Bytes to reserve before reading a member that claims `declared` bytes.
fn initial_capacity(declared: u64) -> usize {
    declared.min(MAX_PREALLOC) as usize
}

/// A fully buffered zip archive.
///
/// Owns the downloaded bytes for the duration of a run; members are read
/// by name and decompressed on demand.
pub struct ArchiveReader {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl ArchiveReader {
    /// Wrap raw archive bytes. Fails if the bytes are not a readable zip.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        let size = bytes.len();
        let archive = ZipArchive::new(Cursor::new(bytes))
            .with_context(|| format!("reading zip archive ({} bytes)", size))?;
        Ok(Self { archive })
    }

    /// Member names in central-directory order, directories included.
    pub fn file_names(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    pub fn len(&self) -> usize {
        self.archive.len()
    }

    pub fn is_empty(&self) -> bool {
        self.archive.len() == 0
    }

    /// Decompress a named member fully into memory.
    pub fn read_member(&mut self, name: &str) -> Result<Vec<u8>> {
        let mut entry = self
            .archive
            .by_name(name)
            .with_context(|| format!("opening archive member {}", name))?;
        let mut buf = Vec::with_capacity(initial_capacity(entry.size()));
        entry
            .read_to_end(&mut buf)
            .with_context(|| format!("Failed to read {} into memory", name))?;
        Ok(buf)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::FileOptions;
    use zip::CompressionMethod;

    /// Build an in-memory zip from `(name, content)` pairs, in the given order.
    pub(crate) fn build_zip(members: &[(&str, &str)]) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            let options: FileOptions<'_, ()> =
                FileOptions::default().compression_method(CompressionMethod::Deflated);
            for (name, content) in members {
                zip.start_file(*name, options)?;
                zip.write_all(content.as_bytes())?;
            }
            zip.finish()?;
        }
        Ok(buf)
    }

    #[test]
    fn lists_members_in_archive_order() -> Result<()> {
        let bytes = build_zip(&[
            ("zeta.csv", "a\n1\n"),
            ("alpha.txt", "notes"),
            ("mid/registryupload1.csv", "a\n2\n"),
        ])?;
        let archive = ArchiveReader::from_bytes(bytes)?;

        assert_eq!(archive.len(), 3);
        assert_eq!(
            archive.file_names(),
            vec!["zeta.csv", "alpha.txt", "mid/registryupload1.csv"]
        );
        Ok(())
    }

    #[test]
    fn reads_member_bytes() -> Result<()> {
        let bytes = build_zip(&[("one.csv", "id,value\n1,10\n")])?;
        let mut archive = ArchiveReader::from_bytes(bytes)?;

        assert_eq!(archive.read_member("one.csv")?, b"id,value\n1,10\n");
        assert!(archive.read_member("missing.csv").is_err());
        Ok(())
    }

    #[test]
    fn declared_size_does_not_drive_allocation() {
        assert_eq!(initial_capacity(0), 0);
        assert_eq!(initial_capacity(4096), 4096);
        assert_eq!(initial_capacity(u64::MAX), MAX_PREALLOC as usize);
    }

    #[test]
    fn reads_member_larger_than_reservation() -> Result<()> {
        let content = "id,value\n".to_string() + &"1,10\n".repeat(50_000);
        let bytes = build_zip(&[("big.csv", content.as_str())])?;
        let mut archive = ArchiveReader::from_bytes(bytes)?;

        assert_eq!(archive.read_member("big.csv")?, content.as_bytes());
        Ok(())
    }

    #[test]
    fn rejects_non_zip_bytes() {
        let err = ArchiveReader::from_bytes(b"<html>Not Found</html>".to_vec())
            .err()
            .expect("garbage should not open as a zip");
        assert!(format!("{:#}", err).contains("reading zip archive"));
    }
}
