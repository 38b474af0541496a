//! Write a file via a temporary sibling path plus rename, so that
//! readers never see a partially written file.

use std::{
    fs::rename,
    path::{Path, PathBuf},
};

use nix::unistd::getpid;

#[derive(Debug, thiserror::Error)]
pub enum WriteAtomicallyError {
    #[error("path is missing file name part: {0:?}")]
    MissingFileName(PathBuf),
    #[error("IO error while {0} {1:?}: {2:#}")]
    IOError(&'static str, PathBuf, std::io::Error),
}

/// Append a suffix `.tmp~$pid` to the file name of `target_path`.
pub fn temp_path(target_path: &Path) -> Result<PathBuf, WriteAtomicallyError> {
    let file_name = target_path
        .file_name()
        .ok_or_else(|| WriteAtomicallyError::MissingFileName(target_path.to_owned()))?;
    let mut file_name = file_name.to_os_string();
    file_name.push(format!(".tmp~{}", getpid()));
    Ok(target_path.with_file_name(file_name))
}

pub fn write_atomically(
    target_path: &Path,
    contents: impl AsRef<[u8]>,
) -> Result<(), WriteAtomicallyError> {
    let tmp = temp_path(target_path)?;
    std::fs::write(&tmp, contents)
        .map_err(|e| WriteAtomicallyError::IOError("writing", tmp.clone(), e))?;
    rename(&tmp, target_path).map_err(|e| {
        // Best effort, the rename error is what matters
        let _ = std::fs::remove_file(&tmp);
        WriteAtomicallyError::IOError("renaming into place", tmp, e)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn t_temp_path() {
        let p = temp_path(Path::new("out/tcp_tests.json")).unwrap();
        assert_eq!(p.parent(), Some(Path::new("out")));
        let name = p.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("tcp_tests.json.tmp~"), "{name}");
        assert!(temp_path(Path::new("/")).is_err());
    }
}
