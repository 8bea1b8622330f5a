//! Parse raw HTTP response header lines collected by curl.

/// Status code and headers of the final response in a (possibly redirected) exchange.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ParsedHead {
    pub status: Option<u32>,
    pub headers: Vec<(String, String)>,
}

/// Parse collected header lines. Each `HTTP/` status line starts a new block,
/// so only the last block (the response whose body was received) is kept.
pub(crate) fn parse_head(lines: &[String]) -> ParsedHead {
    let mut head = ParsedHead::default();

    for line in lines {
        let line = line.trim_end();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("HTTP/") {
            head.status = line
                .split_whitespace()
                .nth(1)
                .and_then(|code| code.parse::<u32>().ok());
            head.headers.clear();
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            head.headers
                .push((name.trim().to_string(), value.trim().to_string()));
        }
    }

    head
}
