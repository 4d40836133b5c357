//! Fixtures shared by the unit tests.

use filetime::{FileTime, set_file_mtime};
use std::fs;
use std::path::Path;

/// Modification time stamped onto every fixture file.
pub(crate) fn fixture_mtime() -> FileTime {
    FileTime::from_unix_time(1_262_304_000, 123_456_000)
}

/// Pseudo-random bytes standing in for a photo.
pub(crate) fn jpeg_bytes(len: usize) -> Vec<u8> {
    let mut state: u32 = 0x1234_5678;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            (state & 0xff) as u8
        })
        .collect()
}

/// Build the sample tree:
///
/// ```text
/// root/file1.txt            "1"
/// root/P1010022.JPG         300 KiB of bytes
/// root/subfolder/file2.txt
/// root/subfolder/subfolder/file3.txt
/// root/subfolder/subfolder/file4.txt
/// ```
pub(crate) fn create_sample_tree(root: &Path) {
    fs::create_dir_all(root.join("subfolder/subfolder")).unwrap();
    fs::write(root.join("file1.txt"), "1").unwrap();
    fs::write(root.join("P1010022.JPG"), jpeg_bytes(300 * 1024)).unwrap();
    fs::write(root.join("subfolder/file2.txt"), "second file, a bit longer").unwrap();
    fs::write(root.join("subfolder/subfolder/file3.txt"), "third").unwrap();
    fs::write(root.join("subfolder/subfolder/file4.txt"), "fourth").unwrap();

    for file in [
        "file1.txt",
        "P1010022.JPG",
        "subfolder/file2.txt",
        "subfolder/subfolder/file3.txt",
        "subfolder/subfolder/file4.txt",
    ] {
        set_file_mtime(root.join(file), fixture_mtime()).unwrap();
    }
}
