//! Writing compiled feature code to disk.

use std::{fs, path::Path};

use crate::error::Error;

/// Write `features` to `path`, creating missing parent directories.
pub fn write_features(path: &Path, features: &str) -> Result<(), Error> {
    let io_err = |source| Error::FileIo {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    log::debug!("writing {} bytes to {}", features.len(), path.display());
    fs::write(path, features).map_err(io_err)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn creates_parent_dirs() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("build/features/ccmp.fea");
        write_features(&path, "feature ccmp {\n} ccmp;\n").unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "feature ccmp {\n} ccmp;\n"
        );
    }

    #[test]
    fn reports_the_failing_path() {
        let temp_dir = tempdir().unwrap();
        let blocker = temp_dir.path().join("file");
        fs::write(&blocker, "").unwrap();
        let path = blocker.join("ccmp.fea");
        let err = write_features(&path, "").unwrap_err();
        assert!(matches!(&err, Error::FileIo { path: p, .. } if p == &path), "{err}");
    }
}
