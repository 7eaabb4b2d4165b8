//! Splits SQL text into code, quoted text and comments.

/// A contiguous slice of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlSegment<'a> {
    /// Plain statement text: keywords, identifiers, operators, placeholders.
    Code(&'a str),
    /// A `'...'` literal or a `"..."` identifier, quotes included.
    Quoted(&'a str),
    /// A `-- ...` line comment or a `/* ... */` block comment.
    Comment(&'a str),
}

/// Splits `sql` into segments that concatenate back to the input.
///
/// A doubled quote inside a quoted run is an escaped quote. Unterminated
/// quotes and block comments extend to the end of the text.
pub fn split_segments(sql: &str) -> Vec<SqlSegment<'_>> {
    let bytes = sql.as_bytes();
    let mut segments = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let special = match (bytes[i], bytes.get(i + 1)) {
            (b'\'', _) | (b'"', _) => Some((closing_quote(bytes, i), false)),
            (b'-', Some(b'-')) => Some((line_end(bytes, i), true)),
            (b'/', Some(b'*')) => Some((block_end(bytes, i), true)),
            _ => None,
        };
        let Some((end, is_comment)) = special else {
            i += 1;
            continue;
        };

        if start < i {
            segments.push(SqlSegment::Code(&sql[start..i]));
        }
        let text = &sql[i..end];
        segments.push(if is_comment {
            SqlSegment::Comment(text)
        } else {
            SqlSegment::Quoted(text)
        });
        i = end;
        start = end;
    }

    if start < bytes.len() {
        segments.push(SqlSegment::Code(&sql[start..]));
    }
    segments
}

/// The code segments of `sql` joined by single spaces.
pub fn code_only(sql: &str) -> String {
    split_segments(sql)
        .into_iter()
        .filter_map(|segment| match segment {
            SqlSegment::Code(code) => Some(code),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn closing_quote(bytes: &[u8], open: usize) -> usize {
    let quote = bytes[open];
    let mut j = open + 1;
    while j < bytes.len() {
        if bytes[j] == quote {
            if bytes.get(j + 1) == Some(&quote) {
                j += 2;
                continue;
            }
            return j + 1;
        }
        j += 1;
    }
    bytes.len()
}

fn line_end(bytes: &[u8], start: usize) -> usize {
    bytes[start..]
        .iter()
        .position(|&b| b == b'\n')
        .map_or(bytes.len(), |offset| start + offset)
}

fn block_end(bytes: &[u8], start: usize) -> usize {
    bytes[start + 2..]
        .windows(2)
        .position(|pair| pair == b"*/")
        .map_or(bytes.len(), |offset| start + 2 + offset + 2)
}
