use crate::types::{FileSplit, LargeFileCheck};

pub const MAX_LINES: usize = 500;
pub const MAX_CHARS: usize = 8000;

/// Split `content` into bounded parts, never breaking a line in two.
///
/// A chunk is flushed when appending the next line would push its line count
/// to `max_lines` or its char count above `max_chars`. If only one chunk
/// results, the single descriptor keeps the original path. Otherwise each
/// part gets a `{basename}_part{k}{ext}` path next to the original, and
/// `total_parts` is stamped on every descriptor after the pass.
pub fn split(content: &str, path: &str, max_lines: usize, max_chars: usize) -> Vec<FileSplit> {
    let mut chunks: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_lines = 0usize;

    for line in content.split_inclusive('\n') {
        if !current.is_empty()
            && (current_lines + 1 >= max_lines || current.len() + line.len() > max_chars)
        {
            chunks.push(std::mem::take(&mut current));
            current_lines = 0;
        }
        current.push_str(line);
        current_lines += 1;
    }
    if !current.is_empty() || chunks.is_empty() {
        chunks.push(current);
    }

    let total_parts = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, chunk)| FileSplit {
            path: if total_parts == 1 {
                path.to_string()
            } else {
                part_path(path, i + 1)
            },
            content: chunk,
            part: i + 1,
            total_parts,
        })
        .collect()
}

/// Index document written back at the original path when a split occurred.
/// Empty when there is nothing to index.
pub fn build_index(path: &str, parts: &[FileSplit]) -> String {
    if parts.len() <= 1 {
        return String::new();
    }

    let mut index = format!(
        "# {}\n\nThis document was too large and was split into {} parts:\n\n",
        file_name(path),
        parts.len()
    );
    for part in parts {
        index.push_str(&format!(
            "- `{}` ({} lines)\n",
            file_name(&part.path),
            part.content.lines().count()
        ));
    }
    index
}

/// Cheap line-count pre-check used to warn callers before splitting. Not the
/// authority on whether a split happens: `split` also enforces a char limit.
/// The message describes the splitting policy rather than a completed split,
/// so it reads correctly both before and after a write.
pub fn detect_large(content: &str, max_lines: usize) -> LargeFileCheck {
    let line_count = content.lines().count();
    let is_large = line_count > max_lines;
    let message = if is_large {
        format!(
            "Note: the document is {} lines long, exceeding the {} line limit. \
             Content over the limit is split into multiple parts with an index \
             at the original path.",
            line_count, max_lines
        )
    } else {
        format!("Document is {} lines long.", line_count)
    };
    LargeFileCheck {
        is_large,
        line_count,
        message,
    }
}

/// Derive `{dir}/{basename}_part{k}{ext}` from the original path
fn part_path(path: &str, part: usize) -> String {
    let (dir, name) = match path.rfind('/') {
        Some(idx) => (&path[..idx + 1], &path[idx + 1..]),
        None => ("", path),
    };
    let (base, ext) = match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], &name[idx..]),
        _ => (name, ""),
    };
    format!("{}{}_part{}{}", dir, base, part, ext)
}

fn file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) => &path[idx + 1..],
        None => path,
    }
}
