//! Byte-for-byte content comparison

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

const CHUNK_SIZE: usize = 64 * 1024;

/// Check whether two files hold exactly the same bytes
///
/// Sizes are compared first; equal-sized files are streamed side by side in
/// 64KB chunks. There is no checksum cache, so every call is O(file size).
///
/// # Example
/// ```no_run
/// use syncplan::content::files_identical;
/// use std::path::Path;
///
/// let same = files_identical(Path::new("a.txt"), Path::new("b.txt"))?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn files_identical(left: &Path, right: &Path) -> io::Result<bool> {
    let mut left_file = File::open(left)?;
    let mut right_file = File::open(right)?;

    if left_file.metadata()?.len() != right_file.metadata()?.len() {
        return Ok(false);
    }

    let mut left_buf = vec![0u8; CHUNK_SIZE];
    let mut right_buf = vec![0u8; CHUNK_SIZE];

    loop {
        let left_read = read_chunk(&mut left_file, &mut left_buf)?;
        let right_read = read_chunk(&mut right_file, &mut right_buf)?;

        if left_read != right_read || left_buf[..left_read] != right_buf[..right_read] {
            return Ok(false);
        }
        if left_read == 0 {
            return Ok(true);
        }
    }
}

/// Fill `buf` as far as the reader allows, returning bytes read (0 at EOF)
fn read_chunk(reader: &mut impl Read, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
