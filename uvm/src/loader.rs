//! Program image loading
//!
//! A program image is a flat sequence of big-endian 32-bit platters with no
//! header. The decoded words become the initial contents of array 0.

use std::fs;
use std::path::Path;
use log::info;
use crate::constants::PLATTER_BYTES;
use crate::error::LoadError;

/// Decode a program image into platters
pub fn load_program(bytes: &[u8]) -> Result<Vec<u32>, LoadError> {
    if bytes.len() % PLATTER_BYTES != 0 {
        return Err(LoadError::TruncatedWord { len: bytes.len() });
    }

    Ok(bytes
        .chunks_exact(PLATTER_BYTES)
        .map(|chunk| u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Read and decode a program image from disk
pub fn load_program_file(path: &Path) -> Result<Vec<u32>, LoadError> {
    let bytes = fs::read(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let program = load_program(&bytes)?;
    info!("read {} ({} bytes, {} platters)", path.display(), bytes.len(), program.len());
    Ok(program)
}

/// Encode platters back into an image, the inverse of `load_program`
pub fn encode_program(program: &[u32]) -> Vec<u8> {
    program.iter().flat_map(|platter| platter.to_be_bytes()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn words_are_big_endian() {
        let program = load_program(&[0x70, 0x00, 0x00, 0x00, 0xD0, 0x00, 0x00, 0x48]).unwrap();
        assert_eq!(program, vec![0x7000_0000, 0xD000_0048]);
    }

    #[test]
    fn empty_image_is_an_empty_program() {
        assert_eq!(load_program(&[]).unwrap(), Vec::<u32>::new());
    }

    #[test]
    fn partial_trailing_word_is_rejected() {
        match load_program(&[0x70, 0x00, 0x00, 0x00, 0x01]) {
            Err(LoadError::TruncatedWord { len }) => assert_eq!(len, 5),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn encode_program_is_inverse() {
        let image = encode_program(&[0xDEAD_BEEF, 1]);
        assert_eq!(image, vec![0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 1]);
        assert_eq!(load_program(&image).unwrap(), vec![0xDEAD_BEEF, 1]);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_program_file(Path::new("/nonexistent/uvm/program.um")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/uvm/program.um"));
    }
}
