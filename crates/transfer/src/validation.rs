use std::path::{Component, Path};

use crate::TransferError;

/// Turns a client-supplied filename into a single safe remote path component.
///
/// Whitespace, control characters and both path separators become `_`, so a
/// name can never introduce a subdirectory or climb out of the batch
/// directory. The reserved names `""`, `.` and `..` are mapped to fixed
/// replacements. Applying the function twice yields the same result.
pub fn sanitize_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c.is_whitespace() || c.is_control() || c == '/' || c == '\\' {
                '_'
            } else {
                c
            }
        })
        .collect();

    match replaced.as_str() {
        "" => "unnamed".to_string(),
        "." => "_".to_string(),
        ".." => "__".to_string(),
        _ => replaced,
    }
}

/// Validates that a relative file path does not escape its base directory.
///
/// Rejects:
/// - Empty paths
/// - Absolute paths (Unix `/` or Windows `C:\`)
/// - Parent directory traversal (`..`)
/// - Windows prefix components (`C:`, `\\server`)
pub fn validate_upload_path(file_path: &str) -> Result<(), TransferError> {
    if file_path.is_empty() {
        return Err(TransferError::InvalidPath("empty path".into()));
    }

    let path = Path::new(file_path);

    if path.is_absolute() {
        return Err(TransferError::InvalidPath(format!(
            "absolute path not allowed: {file_path}"
        )));
    }

    for component in path.components() {
        match component {
            Component::ParentDir => {
                return Err(TransferError::InvalidPath(format!(
                    "parent directory traversal not allowed: {file_path}"
                )));
            }
            Component::Prefix(_) | Component::RootDir => {
                return Err(TransferError::InvalidPath(format!(
                    "absolute path not allowed: {file_path}"
                )));
            }
            Component::CurDir | Component::Normal(_) => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_replaces_spaces() {
        assert_eq!(sanitize_filename("visit 01 final.csv"), "visit_01_final.csv");
    }

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize_filename("../../etc/passwd"), ".._.._etc_passwd");
        assert_eq!(sanitize_filename("dir\\file.csv"), "dir_file.csv");
    }

    #[test]
    fn sanitize_replaces_tabs_and_newlines() {
        assert_eq!(sanitize_filename("a\tb\nc.csv"), "a_b_c.csv");
    }

    #[test]
    fn sanitize_reserved_names() {
        assert_eq!(sanitize_filename(""), "unnamed");
        assert_eq!(sanitize_filename("."), "_");
        assert_eq!(sanitize_filename(".."), "__");
    }

    #[test]
    fn sanitize_keeps_unicode() {
        assert_eq!(sanitize_filename("bioimpedância_ç.csv"), "bioimpedância_ç.csv");
    }

    #[test]
    fn sanitize_is_idempotent() {
        let inputs = [
            "",
            ".",
            "..",
            "/",
            "a b/c\\d",
            " leading and trailing ",
            "ring\u{0}data.bin",
            "relógio 2024/03 .csv",
            "__",
            "unnamed",
        ];
        for input in inputs {
            let once = sanitize_filename(input);
            let twice = sanitize_filename(&once);
            assert_eq!(once, twice, "not idempotent for {input:?}");
            assert!(!once.contains('/'));
            assert!(!once.contains('\\'));
            assert!(!once.chars().any(char::is_whitespace));
            assert!(validate_upload_path(&once).is_ok(), "unsafe result {once:?}");
        }
    }

    #[test]
    fn rejects_empty_path() {
        assert!(validate_upload_path("").is_err());
    }

    #[test]
    fn rejects_parent_dir_traversal() {
        assert!(validate_upload_path("../../../etc/passwd").is_err());
    }

    #[test]
    fn rejects_nested_parent_dir_traversal() {
        assert!(validate_upload_path("sub/../../../escape").is_err());
    }

    #[test]
    fn rejects_absolute_unix_path() {
        assert!(validate_upload_path("/tmp/malicious").is_err());
    }

    #[test]
    fn accepts_nested_relative_path() {
        assert!(validate_upload_path("landing/dados_anel/2024/03/a.csv").is_ok());
    }

    #[test]
    fn accepts_current_dir_prefix() {
        assert!(validate_upload_path("./a.csv").is_ok());
    }
}
