//! Character classification shared by the table and key/value scanners.

/// Space or tab. Newlines are classified separately.
pub fn is_whitespace(b: u8) -> bool {
    b == b' ' || b == b'\t'
}

pub fn is_newline(b: u8) -> bool {
    b == b'\n' || b == b'\r'
}

pub fn is_comma(b: u8) -> bool {
    b == b','
}

pub fn is_comment(b: u8) -> bool {
    b == b'#'
}

pub fn is_quote(b: u8) -> bool {
    b == b'"' || b == b'\''
}

/// Returns true if `bytes[at..]` starts with a `true` or `false` literal
/// that is not the prefix of a longer bare word.
pub fn starts_boolean(bytes: &[u8], at: usize) -> bool {
    let rest = &bytes[at.min(bytes.len())..];
    let len = if rest.starts_with(b"true") {
        4
    } else if rest.starts_with(b"false") {
        5
    } else {
        return false;
    };
    rest.get(len).map_or(true, |b| !is_bare_key_char(*b))
}

/// Returns true if `bytes[at..]` starts like a TOML number (including
/// `inf`/`nan` with an optional sign).
pub fn starts_number(bytes: &[u8], at: usize) -> bool {
    let Some(&first) = bytes.get(at) else {
        return false;
    };
    let rest = if first == b'+' || first == b'-' {
        &bytes[at + 1..]
    } else {
        &bytes[at..]
    };
    match rest.first() {
        Some(b) if b.is_ascii_digit() => true,
        _ => rest.starts_with(b"inf") || rest.starts_with(b"nan"),
    }
}

/// Characters that may appear in an atomic scalar token (numbers, booleans,
/// and the opaque date-like tokens we do not interpret).
pub fn is_token_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.' | b'_' | b':')
}

pub fn is_bare_key_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Version-control merge-conflict marker lines.
pub fn is_conflict_marker(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with("<<<<<<<") || line.starts_with("=======") || line.starts_with(">>>>>>>")
}

/// A line opted out of version checking with a `# crates: disable-check` comment.
pub fn is_disabled_line(line: &str) -> bool {
    match line.find('#') {
        Some(idx) => {
            let comment = &line[idx..];
            comment.contains("crates:") && comment.contains("disable-check")
        }
        None => false,
    }
}

/// Lines the key/value scanner treats as blank.
pub fn is_ignored_line(line: &str) -> bool {
    is_conflict_marker(line) || is_disabled_line(line)
}
