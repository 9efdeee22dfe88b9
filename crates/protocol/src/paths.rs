/// Separator between package segments in an element path (`model::domain::Person`).
pub const ELEMENT_PATH_DELIMITER: &str = "::";

/// Workspace paths travel to the server without their leading slash.
pub fn trim_path_leading_slash(path: &str) -> &str {
    path.trim_start_matches('/')
}

/// Canonicalizes `\r\n` line endings to `\n`; the server would otherwise duplicate newlines.
pub fn normalize_line_endings(content: &str) -> String {
    content.replace("\r\n", "\n")
}

/// True when `path` is `root` itself or lives underneath it.
///
/// Both sides are compared with their leading/trailing slashes stripped, and a
/// match must end on a segment boundary, so `/core/a` is not under `/core/ab`.
pub fn is_under_path(root: &str, path: &str) -> bool {
    let root = normalize_workspace_path(root);
    let path = normalize_workspace_path(path);
    if root.is_empty() {
        return true;
    }
    if path == root {
        return true;
    }
    if !path.starts_with(root) {
        return false;
    }
    path.as_bytes().get(root.len()) == Some(&b'/')
}

/// Joins a package path and an element name into a full element path.
pub fn join_element_path(package: &str, name: &str) -> String {
    if package.is_empty() {
        name.to_string()
    } else {
        format!("{package}{ELEMENT_PATH_DELIMITER}{name}")
    }
}

/// Splits a full element path into `(package path, element name)`.
pub fn split_element_path(path: &str) -> (&str, &str) {
    match path.rfind(ELEMENT_PATH_DELIMITER) {
        Some(idx) => (&path[..idx], &path[idx + ELEMENT_PATH_DELIMITER.len()..]),
        None => ("", path),
    }
}

fn normalize_workspace_path(raw: &str) -> &str {
    raw.trim().trim_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leading_slashes_are_trimmed() {
        assert_eq!(trim_path_leading_slash("/core/welcome.pure"), "core/welcome.pure");
        assert_eq!(trim_path_leading_slash("core"), "core");
    }

    #[test]
    fn crlf_is_canonicalized() {
        assert_eq!(normalize_line_endings("a\r\nb\nc\r\n"), "a\nb\nc\n");
    }

    #[test]
    fn under_path_respects_segment_boundary() {
        assert!(is_under_path("/core", "/core/a.pure"));
        assert!(is_under_path("/core/", "core"));
        assert!(!is_under_path("/core/a", "/core/ab.pure"));
        assert!(!is_under_path("/platform", "/core/a.pure"));
        assert!(is_under_path("/", "/anything.pure"));
    }

    #[test]
    fn element_paths_split_and_join() {
        assert_eq!(split_element_path("model::domain::Person"), ("model::domain", "Person"));
        assert_eq!(split_element_path("Person"), ("", "Person"));
        assert_eq!(join_element_path("model::domain", "Person"), "model::domain::Person");
        assert_eq!(join_element_path("", "Person"), "Person");
    }
}
