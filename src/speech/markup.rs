//! Removal of formatting markup before narration
//!
//! The medium's replies arrive as light markdown. Emphasis stars, heading
//! hashes and list bullets must not be read aloud.

/// Strip markdown glyphs and collapse whitespace
pub fn sanitize_markup(text: &str) -> String {
    let mut result = String::with_capacity(text.len());

    for line in text.lines() {
        let stripped = strip_line(line);
        let stripped = stripped.trim();
        if stripped.is_empty() {
            continue;
        }
        if !result.is_empty() {
            result.push(' ');
        }
        result.push_str(stripped);
    }

    collapse_whitespace(&result)
}

fn strip_line(line: &str) -> String {
    let mut s = line.trim_start();

    while let Some(rest) = s.strip_prefix('>') {
        s = rest.trim_start();
    }

    // Heading markers
    s = s.trim_start_matches('#').trim_start();

    // Bullet list markers
    if let Some(rest) = s
        .strip_prefix("- ")
        .or_else(|| s.strip_prefix("* "))
        .or_else(|| s.strip_prefix("+ "))
    {
        s = rest;
    }

    let unlinked = strip_links(s);
    strip_glyphs(&unlinked)
}

/// `[text](url)` → `text`, `![alt](url)` → `alt`
fn strip_links(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find("](").map(|i| open + i) else {
            break;
        };
        let Some(end) = rest[close..].find(')').map(|i| close + i) else {
            break;
        };

        let before = &rest[..open];
        result.push_str(before.strip_suffix('!').unwrap_or(before));
        result.push_str(&rest[open + 1..close]);
        rest = &rest[end + 1..];
    }

    result.push_str(rest);
    result
}

/// Drop emphasis, code and heading glyphs
///
/// Underscores between two alphanumerics (`snake_case`) are kept.
fn strip_glyphs(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut result = String::with_capacity(text.len());

    for (i, &c) in chars.iter().enumerate() {
        match c {
            '*' | '`' | '~' | '#' => {}
            '_' => {
                let inner = i > 0
                    && i + 1 < chars.len()
                    && chars[i - 1].is_alphanumeric()
                    && chars[i + 1].is_alphanumeric();
                if inner {
                    result.push(c);
                }
            }
            _ => result.push(c),
        }
    }

    result
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
