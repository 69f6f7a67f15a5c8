//! HTML to plain text extraction and chunking.
//!
//! Hand-rolled tag stripping is enough here: the input is Google's HTML
//! export, and the output only feeds summarization and chunk storage.

/// Strip tags and decode common entities, yielding readable plain text.
///
/// Script and style blocks are dropped entirely. Block-level closing tags
/// become newlines so sentence boundaries survive.
pub fn html_to_text(html: &str) -> String {
    let mut out = String::with_capacity(html.len() / 2);
    let mut rest = html;

    while let Some(open) = rest.find('<') {
        out.push_str(&rest[..open]);
        rest = &rest[open..];

        let tag_end = match rest.find('>') {
            Some(i) => i,
            None => {
                // Dangling '<': drop the malformed remainder.
                rest = "";
                break;
            }
        };
        let tag = rest[1..tag_end].to_ascii_lowercase();

        // Drop script/style blocks including their content.
        if tag.starts_with("script") || tag.starts_with("style") {
            let name = if tag.starts_with("script") { "script" } else { "style" };
            let close = format!("</{}", name);
            match rest.to_ascii_lowercase().find(&close) {
                Some(pos) => {
                    let after = &rest[pos..];
                    match after.find('>') {
                        Some(end) => rest = &rest[pos + end + 1..],
                        None => {
                            rest = "";
                            break;
                        }
                    }
                }
                None => {
                    rest = "";
                    break;
                }
            }
            continue;
        }

        if is_block_boundary(&tag) {
            out.push('\n');
        }
        rest = &rest[tag_end + 1..];
    }
    out.push_str(rest);

    normalize_whitespace(&decode_entities(&out))
}

fn is_block_boundary(tag: &str) -> bool {
    let name = tag
        .trim_start_matches('/')
        .split([' ', '/'])
        .next()
        .unwrap_or("");
    matches!(
        name,
        "p" | "br" | "div" | "li" | "tr" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6"
    )
}

fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Collapse whitespace runs; newline runs become one newline.
fn normalize_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_newline = false;
    let mut pending_space = false;

    for c in text.chars() {
        if c == '\n' {
            pending_newline = true;
        } else if c.is_whitespace() {
            pending_space = true;
        } else {
            if pending_newline && !out.is_empty() {
                out.push('\n');
            } else if pending_space && !out.is_empty() {
                out.push(' ');
            }
            pending_newline = false;
            pending_space = false;
            out.push(c);
        }
    }
    out
}

/// Split text into chunks of roughly `chunk_chars` characters, breaking at
/// sentence boundaries where possible.
pub fn chunk_text(text: &str, chunk_chars: usize) -> Vec<String> {
    let chunk_chars = chunk_chars.max(1);
    let mut chunks = Vec::new();
    let mut current = String::new();

    for sentence in split_sentences(text) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }
        if !current.is_empty() && current.chars().count() + sentence.chars().count() > chunk_chars {
            chunks.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(sentence);

        // A single oversized sentence still becomes its own chunk.
        if current.chars().count() >= chunk_chars {
            chunks.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split on sentence punctuation and newlines, keeping the punctuation.
pub(crate) fn split_sentences(text: &str) -> Vec<&str> {
    let mut result = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if c == '\n' {
            result.push(&text[start..i]);
            start = i + 1;
        } else if (c == '.' || c == '!' || c == '?') && i + 1 >= text.len() {
            result.push(&text[start..]);
            start = text.len();
        } else if c == '.' || c == '!' || c == '?' {
            let next = text.as_bytes().get(i + 1).copied().unwrap_or(0);
            if next == b' ' || next == b'\n' {
                result.push(&text[start..=i]);
                start = i + 1;
            }
        }
    }
    if start < text.len() {
        result.push(&text[start..]);
    }
    result
}
