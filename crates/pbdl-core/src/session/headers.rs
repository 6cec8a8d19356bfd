//! Parse HTTP response header lines into a `ResponseHead`.

/// Status line and the headers the downloader cares about, taken from the
/// last response in a redirect chain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    /// HTTP status code (0 if no status line was seen).
    pub status: u32,
    /// `Content-Type` value if present.
    pub content_type: Option<String>,
    /// Declared body size, if `Content-Length` is present and parseable.
    pub content_length: Option<u64>,
    /// `Location` value if present.
    pub location: Option<String>,
}

impl ResponseHead {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Lowercased content type, or empty when absent.
    pub fn content_type_lower(&self) -> String {
        self.content_type
            .as_deref()
            .map(str::to_ascii_lowercase)
            .unwrap_or_default()
    }
}

/// Parse collected header lines into a `ResponseHead`.
///
/// libcurl hands us the headers of every response it saw while following
/// redirects; a new status line starts a new block, so only the final
/// response's values survive.
pub(crate) fn parse_head(lines: &[String]) -> ResponseHead {
    let mut head = ResponseHead::default();

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            head = ResponseHead {
                status: parse_status_line(line).unwrap_or(0),
                ..ResponseHead::default()
            };
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            let name = name.trim();
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-type") {
                head.content_type = Some(value.to_string());
            } else if name.eq_ignore_ascii_case("content-length") {
                head.content_length = value.parse::<u64>().ok();
            } else if name.eq_ignore_ascii_case("location") {
                head.location = Some(value.to_string());
            }
        }
    }

    head
}

fn parse_status_line(line: &str) -> Option<u32> {
    line.split_whitespace().nth(1)?.parse().ok()
}
