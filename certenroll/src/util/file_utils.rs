//! The file_utils module contains utility functions related to interactions with the filesystem.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::util::error::*;

/// `get_file_as_byte_vec` takes a Path containing a file name and returns a vector of bytes containing
/// the contents of that file or an [Error::StdIoError].
pub fn get_file_as_byte_vec(filename: &Path) -> Result<Vec<u8>> {
    let mut f = File::open(filename)?;
    let mut buffer = vec![];
    f.read_to_end(&mut buffer)?;
    Ok(buffer)
}

#[test]
fn missing_file_test() {
    let r = get_file_as_byte_vec(Path::new("/this/path/does/not/exist.der"));
    assert_eq!(
        Err(Error::StdIoError(std::io::ErrorKind::NotFound)),
        r
    );
}
