//! Core I/O traits

use std::io::{Read, Seek, Write};

/// Trait for readers that support both reading and seeking operations
///
/// This trait combines [`Read`] and [`Seek`] to provide a unified interface
/// for file-based I/O operations. It is automatically implemented for any type
/// that implements both traits along with [`Send`] and [`Sync`].
pub trait SeekableReader: Read + Seek + Send + Sync {}

impl<T: Read + Seek + Send + Sync> SeekableReader for T {}

/// Trait for writers that can also reposition, used to patch offsets
/// after data has been appended.
pub trait SeekableWriter: Write + Seek + Send {}

impl<T: Write + Seek + Send> SeekableWriter for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, SeekFrom};

    #[test]
    fn test_cursor_implements_seekable_reader() {
        let data = vec![1u8, 2, 3, 4];
        let cursor = Cursor::new(data);

        fn accepts_seekable<R: SeekableReader>(_r: R) {}
        accepts_seekable(cursor);
    }

    #[test]
    fn test_seek_operations() {
        let data = vec![0x10u8, 0x20, 0x30, 0x40];
        let mut reader: Box<dyn SeekableReader> = Box::new(Cursor::new(data));

        reader.seek(SeekFrom::Start(2)).unwrap();

        let mut buf = [0u8; 1];
        reader.read_exact(&mut buf).unwrap();
        assert_eq!(buf[0], 0x30);
    }

    #[test]
    fn test_writer_patch_in_place() {
        fn patch<W: SeekableWriter>(writer: &mut W) {
            writer.write_all(&[0, 0, 0, 0, 9, 9]).unwrap();
            writer.seek(SeekFrom::Start(1)).unwrap();
            writer.write_all(&[7, 7]).unwrap();
            writer.seek(SeekFrom::End(0)).unwrap();
            writer.write_all(&[5]).unwrap();
            writer.flush().unwrap();
        }

        let mut cursor = Cursor::new(Vec::new());
        patch(&mut cursor);
        assert_eq!(cursor.into_inner(), vec![0, 7, 7, 0, 9, 9, 5]);
    }
}
