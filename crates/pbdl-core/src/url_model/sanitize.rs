//! Filesystem-safe file names.

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Make `name` safe to create inside the output directory.
///
/// Separators, NUL, control characters and whitespace become `_` (runs
/// collapse to one); leading/trailing dots and underscores are trimmed and
/// the result is cut to 255 bytes on a char boundary. May return an empty
/// string, which callers treat as "no usable name".
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        let unsafe_char = c == '/' || c == '\\' || c == '\0' || c.is_control() || c.is_whitespace();
        if unsafe_char {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else {
            out.push(c);
        }
    }

    let trimmed = out.trim_matches(|c| c == '.' || c == '_');
    let mut end = trimmed.len().min(NAME_MAX);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_string()
}
