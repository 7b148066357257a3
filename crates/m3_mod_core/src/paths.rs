//! Path helpers for in-archive and mod-relative paths.
//!
//! Mod-relative and in-archive paths always use `\` as separator, mirroring the
//! way mods are authored. Comparisons are ASCII case-insensitive because the
//! games run on case-insensitive filesystems.

/// Separator used in mod-relative and in-archive paths.
pub const SEPARATOR: char = '\\';

const REMOVED_CHARACTERS: [char; 11] = ['<', '>', ':', '"', '/', '\\', '|', '?', '!', '*', '%'];

/// Remove characters that are not allowed in an archive folder name.
///
/// Line breaks become spaces, reserved characters and periods are dropped, a
/// doubled space is removed and a few accented letters are folded to ASCII.
/// Any remaining control characters are stripped last.
pub fn sanitize_name(name: &str) -> String {
    let mut s = name.replace(&['\n', '\r'][..], " ");
    s.retain(|c| !REMOVED_CHARACTERS.contains(&c) && c != '.');
    let s = s
        .replace("  ", "")
        .replace('ê', "e")
        .replace('ë', "e")
        .replace('ï', "i")
        .replace('œ', "oe");

    if s.chars().any(char::is_control) {
        s.chars().filter(|c| !c.is_control()).collect()
    } else {
        s
    }
}

/// Convert `/` separators to `\` and strip leading separators.
pub fn normalize_separators(path: &str) -> String {
    path.replace('/', "\\").trim_start_matches(SEPARATOR).to_string()
}

/// Join two backslash paths. Either side may be empty.
pub fn join(prefix: &str, rest: &str) -> String {
    match (prefix.is_empty(), rest.is_empty()) {
        (true, _) => rest.to_string(),
        (_, true) => prefix.to_string(),
        _ => format!("{prefix}{SEPARATOR}{rest}"),
    }
}

/// First path segment (`a` for `a\b\c`).
pub fn first_segment(path: &str) -> &str {
    path.split(SEPARATOR).next().unwrap_or(path)
}

/// Every ancestor directory of `path`, outermost first (`a`, `a\b` for `a\b\c`).
pub fn ancestor_dirs(path: &str) -> Vec<String> {
    let segments: Vec<&str> = path.split(SEPARATOR).filter(|s| !s.is_empty()).collect();
    let mut ancestors = Vec::with_capacity(segments.len().saturating_sub(1));
    let mut current = String::new();
    for segment in segments.iter().take(segments.len().saturating_sub(1)) {
        if !current.is_empty() {
            current.push(SEPARATOR);
        }
        current.push_str(segment);
        ancestors.push(current.clone());
    }
    ancestors
}

/// ASCII case-insensitive prefix test.
pub fn starts_with_ignore_case(path: &str, prefix: &str) -> bool {
    path.len() >= prefix.len()
        && path.is_char_boundary(prefix.len())
        && path[..prefix.len()].eq_ignore_ascii_case(prefix)
}

/// Lower-cased extension including the dot (`.pcc`), if the file name has one.
pub fn extension_lower(path: &str) -> Option<String> {
    let file_name = path.rsplit(SEPARATOR).next().unwrap_or(path);
    file_name
        .rfind('.')
        .filter(|&idx| idx > 0)
        .map(|idx| file_name[idx..].to_ascii_lowercase())
}

/// Key used for case-insensitive path identity.
pub fn path_key(path: &str) -> String {
    path.to_ascii_lowercase()
}
