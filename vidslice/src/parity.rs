/*!
    Output-tree parity checking.

    Two output directory trees are equal iff they contain the same relative
    file paths and every same-path pair has identical content, judged by
    SHA-256 digest, never by size or mtime.
*/

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use walkdir::WalkDir;

use media_types::{Error, Result};

/**
    Compare two directory trees for byte-identical content.

    Any listing or content divergence is a [`Error::Mismatch`] naming the
    offending path.
*/
pub fn compare_trees(left_root: &Path, right_root: &Path) -> Result<()> {
    let left = digest_tree(left_root)?;
    let right = digest_tree(right_root)?;

    for path in left.keys() {
        if !right.contains_key(path) {
            return Err(Error::mismatch(format!(
                "{} missing from {}",
                path.display(),
                right_root.display()
            )));
        }
    }
    for path in right.keys() {
        if !left.contains_key(path) {
            return Err(Error::mismatch(format!(
                "{} missing from {}",
                path.display(),
                left_root.display()
            )));
        }
    }

    for (path, digest) in &left {
        if &right[path] != digest {
            return Err(Error::mismatch(format!(
                "content differs for {}",
                path.display()
            )));
        }
    }

    Ok(())
}

/// Relative paths and digests of every file under `root`, order-independent.
fn digest_tree(root: &Path) -> Result<BTreeMap<PathBuf, [u8; 32]>> {
    let mut files = BTreeMap::new();

    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|e| Error::io(format!("walk {}: {}", root.display(), e)))?;
        if !entry.file_type().is_file() {
            continue;
        }

        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| Error::io(format!("strip {}: {}", entry.path().display(), e)))?
            .to_path_buf();

        files.insert(rel, sha256_file(entry.path())?);
    }

    Ok(files)
}

fn sha256_file(path: &Path) -> Result<[u8; 32]> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 16384];

    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher.finalize().into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(root: &Path, rel: &str, contents: &[u8]) {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("mkdir");
        }
        fs::write(path, contents).expect("write");
    }

    #[test]
    fn identical_trees_match() {
        let a = tempfile::tempdir().expect("a");
        let b = tempfile::tempdir().expect("b");
        for root in [a.path(), b.path()] {
            write(root, "out.m3u8", b"#EXTM3U\n");
            write(root, "init.mp4", b"ftyp");
            write(root, "seg_00000.m4s", &[1, 2, 3]);
            write(root, "nested/seg_00001.m4s", &[4, 5, 6]);
        }

        compare_trees(a.path(), b.path()).expect("trees match");
    }

    #[test]
    fn content_divergence_is_a_mismatch() {
        let a = tempfile::tempdir().expect("a");
        let b = tempfile::tempdir().expect("b");
        write(a.path(), "seg_00000.m4s", &[1, 2, 3]);
        write(b.path(), "seg_00000.m4s", &[1, 2, 4]);

        let err = compare_trees(a.path(), b.path()).expect_err("must mismatch");
        assert!(matches!(err, Error::Mismatch(_)));
        assert!(err.to_string().contains("seg_00000.m4s"));
    }

    #[test]
    fn same_size_different_bytes_is_a_mismatch() {
        let a = tempfile::tempdir().expect("a");
        let b = tempfile::tempdir().expect("b");
        write(a.path(), "init.mp4", b"aaaa");
        write(b.path(), "init.mp4", b"bbbb");

        assert!(compare_trees(a.path(), b.path()).is_err());
    }

    #[test]
    fn listing_divergence_is_a_mismatch_both_ways() {
        let a = tempfile::tempdir().expect("a");
        let b = tempfile::tempdir().expect("b");
        write(a.path(), "out.m3u8", b"#EXTM3U\n");
        write(b.path(), "out.m3u8", b"#EXTM3U\n");
        write(a.path(), "seg_00000.m4s", &[0]);

        assert!(compare_trees(a.path(), b.path()).is_err());
        assert!(compare_trees(b.path(), a.path()).is_err());
    }

    #[test]
    fn empty_trees_match() {
        let a = tempfile::tempdir().expect("a");
        let b = tempfile::tempdir().expect("b");
        compare_trees(a.path(), b.path()).expect("both empty");
    }
}
