use std::fs;
use std::io;
use std::path::Path;
use thiserror::Error;

/// A build script read into memory
#[derive(Debug, Clone)]
pub struct FileContent {
    pub path: String,
    /// File content as valid UTF-8 string
    pub content: String,
    /// BLAKE3 hash of the content (hex-encoded)
    pub checksum: String,
}

#[derive(Debug, Error)]
pub enum FileError {
    #[error("File not found: {0}")]
    NotFound(String),
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Invalid UTF-8 in file: {0}")]
    InvalidUtf8(String),
}

/// Hex-encoded BLAKE3 hash of `content`
pub fn checksum(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_hex().to_string()
}

/// Read a file from disk with UTF-8 validation
pub fn read_file<P: AsRef<Path>>(path: P) -> Result<FileContent, FileError> {
    let path_ref = path.as_ref();

    if !path_ref.exists() {
        return Err(FileError::NotFound(path_ref.display().to_string()));
    }

    let bytes = fs::read(path_ref)?;
    let content = String::from_utf8(bytes)
        .map_err(|_| FileError::InvalidUtf8(path_ref.display().to_string()))?;

    Ok(FileContent {
        path: path_ref.display().to_string(),
        checksum: checksum(&content),
        content,
    })
}

/// Replace the file at `path` with `content`, returning the new checksum
pub fn write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<String, FileError> {
    fs::write(path, content)?;
    Ok(checksum(content))
}
