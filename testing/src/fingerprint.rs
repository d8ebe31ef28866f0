//! Content Fingerprinter
//!
//! Byte-level SHA-256 digests of source artifacts. Semantics-blind: any
//! edit to a tracked file, comments included, changes its digest and
//! requires re-approving the baseline.

use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use trellis_core::{CharacterizeError, CharacterizeResult, Fingerprint};

/// Lowercase hex SHA-256 of `bytes` (64 chars).
pub fn digest_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Digest of one file's raw content.
pub fn fingerprint_file(path: impl AsRef<Path>) -> CharacterizeResult<String> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|e| CharacterizeError::read(path, e))?;
    Ok(digest_bytes(&bytes))
}

/// Fingerprint every artifact, in the given order.
///
/// File artifacts keep the path as given. Directory artifacts expand to every
/// regular file beneath them, depth-first with entries sorted by name, and
/// record `/`-separated paths relative to the directory. When more than one
/// directory is given, each relative path is prefixed with its directory as
/// given, so `a/index.js` and `b/index.js` stay distinct.
///
/// Anything that is neither a regular file nor a directory (FIFOs, devices)
/// is a `ReadError`.
pub fn fingerprint<P: AsRef<Path>>(artifacts: &[P]) -> CharacterizeResult<Vec<Fingerprint>> {
    let resolved = artifacts
        .iter()
        .map(|artifact| {
            let artifact = artifact.as_ref();
            fs::metadata(artifact)
                .map(|meta| (artifact, meta))
                .map_err(|e| match e.kind() {
                    ErrorKind::NotFound => CharacterizeError::NotFound {
                        path: artifact.to_path_buf(),
                    },
                    _ => CharacterizeError::read(artifact, e),
                })
        })
        .collect::<CharacterizeResult<Vec<_>>>()?;
    let qualify = resolved.iter().filter(|(_, meta)| meta.is_dir()).count() > 1;

    let mut out = Vec::new();
    for (artifact, meta) in resolved {
        if meta.is_dir() {
            let mut files = Vec::new();
            collect_files(artifact, &mut Vec::new(), &mut files)?;
            tracing::debug!(
                root = %artifact.display(),
                files = files.len(),
                "Expanded directory artifact"
            );
            let root = artifact.to_string_lossy();
            let root = root.trim_end_matches('/');
            for (relative, full) in files {
                let path = if qualify {
                    format!("{root}/{relative}")
                } else {
                    relative
                };
                out.push(Fingerprint::new(path, fingerprint_file(&full)?));
            }
        } else if meta.is_file() {
            let digest = fingerprint_file(artifact)?;
            tracing::debug!(path = %artifact.display(), %digest, "Fingerprinted file");
            out.push(Fingerprint::new(
                artifact.to_string_lossy().into_owned(),
                digest,
            ));
        } else {
            return Err(CharacterizeError::read(
                artifact,
                std::io::Error::new(ErrorKind::InvalidInput, "not a regular file"),
            ));
        }
    }

    Ok(out)
}

/// Depth-first walk collecting `(relative, full)` pairs of regular files.
/// Symlinks are neither followed nor reported.
fn collect_files(
    dir: &Path,
    segments: &mut Vec<String>,
    out: &mut Vec<(String, PathBuf)>,
) -> CharacterizeResult<()> {
    let mut entries = fs::read_dir(dir)
        .map_err(|e| CharacterizeError::read(dir, e))?
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| CharacterizeError::read(dir, e))?;
    entries.sort_by_key(|entry| entry.file_name());

    for entry in entries {
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| CharacterizeError::read(&path, e))?;

        segments.push(entry.file_name().to_string_lossy().into_owned());
        if file_type.is_dir() {
            collect_files(&path, segments, out)?;
        } else if file_type.is_file() {
            out.push((segments.join("/"), path));
        }
        segments.pop();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempfile::tempdir;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_digest_is_lowercase_hex_sha256() {
        assert_eq!(digest_bytes(b""), EMPTY_SHA256);
        assert_eq!(
            digest_bytes(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_identical_content_identical_digest() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a.js");
        let b = dir.path().join("b.js");
        fs::write(&a, "module.exports = router;\n").unwrap();
        fs::write(&b, "module.exports = router;\n").unwrap();

        let prints = fingerprint(&[&a, &b]).unwrap();
        assert_eq!(prints.len(), 2);
        assert_eq!(prints[0].digest, prints[1].digest);
        assert_eq!(prints[0].path, a.to_string_lossy());
    }

    #[test]
    fn test_appending_one_character_changes_digest() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("routes.js");
        fs::write(&file, "router.get('/products')").unwrap();
        let before = fingerprint_file(&file).unwrap();

        fs::write(&file, "router.get('/products');").unwrap();
        let after = fingerprint_file(&file).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_directory_expansion_is_sorted_recursive_and_complete() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::create_dir_all(root.join("b/nested")).unwrap();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("z.txt"), "z").unwrap();
        fs::write(root.join("b/nested/deep.txt"), "deep").unwrap();
        fs::write(root.join("b/file.txt"), "b").unwrap();
        fs::write(root.join("a/one.txt"), "1").unwrap();
        fs::create_dir_all(root.join("empty")).unwrap();

        let prints = fingerprint(&[root]).unwrap();
        let paths: Vec<_> = prints.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(
            paths,
            vec!["a/one.txt", "b/file.txt", "b/nested/deep.txt", "z.txt"]
        );

        let unique: HashSet<_> = paths.iter().collect();
        assert_eq!(unique.len(), paths.len());
    }

    #[test]
    fn test_repeated_runs_are_identical() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/app.js"), "app").unwrap();
        fs::write(dir.path().join("src/routes.js"), "routes").unwrap();

        let first = fingerprint(&[dir.path()]).unwrap();
        let second = fingerprint(&[dir.path()]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_missing_artifact_is_not_found() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("gone.js");
        match fingerprint(&[&missing]) {
            Err(CharacterizeError::NotFound { path }) => assert_eq!(path, missing),
            other => panic!("expected NotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_unreadable_file_is_read_error() {
        let dir = tempdir().unwrap();
        let err = fingerprint_file(dir.path()).unwrap_err();
        assert!(matches!(err, CharacterizeError::ReadError { .. }));
    }

    #[test]
    fn test_same_file_name_in_two_directories_stays_distinct() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::create_dir_all(&a).unwrap();
        fs::create_dir_all(&b).unwrap();
        fs::write(a.join("index.js"), "module.exports = a;").unwrap();
        fs::write(b.join("index.js"), "module.exports = b;").unwrap();

        let prints = fingerprint(&[&a, &b]).unwrap();
        let paths: Vec<_> = prints.iter().map(|p| p.path.clone()).collect();
        assert_eq!(
            paths,
            vec![
                format!("{}/index.js", a.to_string_lossy()),
                format!("{}/index.js", b.to_string_lossy()),
            ]
        );
        assert_ne!(prints[0].digest, prints[1].digest);
    }

    #[test]
    fn test_single_directory_keeps_relative_paths_next_to_files() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("routes.js"), "routes").unwrap();
        let app = dir.path().join("app.js");
        fs::write(&app, "app").unwrap();

        let prints = fingerprint(&[&app, &src]).unwrap();
        assert_eq!(prints[0].path, app.to_string_lossy());
        assert_eq!(prints[1].path, "routes.js");
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_neither_followed_nor_listed() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        let root = dir.path().join("legacy");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("real.js"), "real").unwrap();
        symlink(root.join("real.js"), root.join("alias.js")).unwrap();
        symlink(&root, root.join("loop")).unwrap();

        let prints = fingerprint(&[&root]).unwrap();
        let paths: Vec<_> = prints.iter().map(|p| p.path.as_str()).collect();
        assert_eq!(paths, vec!["real.js"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_device_artifact_is_read_error() {
        match fingerprint(&["/dev/null"]) {
            Err(CharacterizeError::ReadError { path, .. }) => {
                assert_eq!(path, Path::new("/dev/null"))
            }
            other => panic!("expected ReadError, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdirectory_is_read_error() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let locked = dir.path().join("locked");
        fs::create_dir_all(&locked).unwrap();
        fs::write(locked.join("secret.js"), "secret").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Permission bits do not bind a privileged user.
        let readable = fs::read_dir(&locked).is_ok();
        let result = fingerprint(&[dir.path()]);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        if readable {
            return;
        }

        match result {
            Err(CharacterizeError::ReadError { path, .. }) => assert_eq!(path, locked),
            other => panic!("expected ReadError, got {other:?}"),
        }
    }
}
