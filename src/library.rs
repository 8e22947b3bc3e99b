//! Episode discovery in an input folder.

use anyhow::{Context, Result};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

/// List episode files directly inside `folder`, in natural file-name order.
///
/// Only regular files whose extension matches one of `extensions`
/// (case-insensitive) are returned. Subfolders are not descended into.
pub fn list_episodes(folder: &Path, extensions: &[String]) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        anyhow::bail!("Input folder does not exist or is not a directory: {:?}", folder);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(folder).min_depth(1).max_depth(1) {
        let entry = entry.with_context(|| format!("Failed to read folder {:?}", folder))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        if has_extension(&path, extensions) {
            files.push(path);
        } else {
            debug!("Ignoring non-episode file {:?}", path);
        }
    }

    files.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy();
            extensions
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(&ext))
        })
        .unwrap_or(false)
}

/// Compare strings treating runs of digits as numbers, so `ep2` sorts
/// before `ep10`. Equal numbers with different zero padding fall through to
/// the rest of the string; names that still tie are ordered bytewise, so
/// only identical names compare equal.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    numeric_aware_cmp(a.as_bytes(), b.as_bytes()).then_with(|| a.cmp(b))
}

fn numeric_aware_cmp(a: &[u8], b: &[u8]) -> Ordering {
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        if a[i].is_ascii_digit() && b[j].is_ascii_digit() {
            let (si, sj) = (i, j);
            while i < a.len() && a[i].is_ascii_digit() {
                i += 1;
            }
            while j < b.len() && b[j].is_ascii_digit() {
                j += 1;
            }
            let na = trim_zeros(&a[si..i]);
            let nb = trim_zeros(&b[sj..j]);
            let ord = na.len().cmp(&nb.len()).then_with(|| na.cmp(nb));
            if ord != Ordering::Equal {
                return ord;
            }
            continue;
        }

        if a[i] != b[j] {
            return a[i].cmp(&b[j]);
        }
        i += 1;
        j += 1;
    }

    (a.len() - i).cmp(&(b.len() - j))
}

fn trim_zeros(digits: &[u8]) -> &[u8] {
    let start = digits.iter().position(|&d| d != b'0').unwrap_or(digits.len());
    &digits[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_natural_cmp() {
        let mut names = vec!["ep10.mkv", "ep2.mkv", "ep1.mkv", "ep02b.mkv"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(names, vec!["ep1.mkv", "ep2.mkv", "ep02b.mkv", "ep10.mkv"]);
    }

    #[test]
    fn test_natural_cmp_zero_padding_is_not_a_tie() {
        assert_eq!(natural_cmp("ep01.mkv", "ep1.mkv"), Ordering::Less);
        assert_eq!(natural_cmp("ep1.mkv", "ep01.mkv"), Ordering::Greater);
        assert_eq!(natural_cmp("ep01.mkv", "ep01.mkv"), Ordering::Equal);

        // Same set in either starting order sorts the same way.
        let mut forward = vec!["ep1.mkv", "ep01.mkv", "ep001.mkv", "ep2.mkv"];
        let mut backward = forward.clone();
        backward.reverse();
        forward.sort_by(|a, b| natural_cmp(a, b));
        backward.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(forward, vec!["ep001.mkv", "ep01.mkv", "ep1.mkv", "ep2.mkv"]);
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_natural_cmp_plain_text() {
        assert_eq!(natural_cmp("abc", "abd"), Ordering::Less);
        assert_eq!(natural_cmp("abc", "abc"), Ordering::Equal);
        assert_eq!(natural_cmp("ab", "abc"), Ordering::Less);
    }

    #[test]
    fn test_list_episodes_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["Show 10.mkv", "Show 2.MKV", "Show 1.mkv", "notes.txt"] {
            std::fs::write(dir.path().join(name), "").unwrap();
        }
        std::fs::create_dir(dir.path().join("extras.mkv")).unwrap();

        let files = list_episodes(dir.path(), &["mkv".to_string()]).unwrap();
        let names: Vec<String> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["Show 1.mkv", "Show 2.MKV", "Show 10.mkv"]);
    }

    #[test]
    fn test_list_episodes_missing_folder() {
        assert!(list_episodes(Path::new("/no/such/folder"), &["mkv".to_string()]).is_err());
    }
}
