use std::path::{Component, Path, PathBuf};

pub fn quote(text: &str) -> String {
    serde_json::to_string(text).unwrap_or_else(|_| format!("\"{}\"", text))
}

/// Resolves `target` against the directory holding `importer` and folds `.`
/// and `..` without touching the file system.
pub fn import_path(importer: &Path, target: &str) -> PathBuf {
    let base = importer.parent().unwrap_or_else(|| Path::new(""));
    normalize_path(&base.join(target))
}

pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let last_is_normal = matches!(out.components().next_back(), Some(Component::Normal(_)));
                if last_is_normal {
                    out.pop();
                } else if !out.has_root() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Returns the line holding byte `offset`, clipped to `window` characters on
/// each side of the offending character, followed by a caret line.
pub fn source_context(text: &str, offset: usize, window: usize) -> String {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    let line_end   = text[offset..].find('\n').map_or(text.len(), |i| offset + i);

    let before: Vec<char> = text[line_start..offset].chars().collect();
    let after: Vec<char>  = text[offset..line_end].chars().collect();

    let skip = before.len().saturating_sub(window);
    let shown_before: String = before[skip..].iter().collect();
    let shown_after: String  = after.iter().take(window + 1).collect();

    format!(
        "{}{}\n{}^",
        shown_before,
        shown_after,
        " ".repeat(shown_before.chars().count())
    )
}
