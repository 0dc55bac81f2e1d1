//! Textual expression parser.
//!
//! Drives an [`ExpressionOps`](crate::ExpressionOps) builder from the
//! surface syntax:
//!
//! ```text
//! (  )   open / close a group ('^' is a historical synonym for ')')
//! * + ?  postfix repetition
//! ,      concatenation        |  alternation        &  interleave
//! [m,n]  counted range; n may be '*' for an unbounded maximum
//! ```
//!
//! Whitespace between tokens is ignored. Any other run of characters is a
//! symbol, terminated by the next special character. A `[m,n]` token is a
//! postfix quantifier on the operand just before it.

use crate::{ContentModelError, ExpressionOps};

fn is_special(c: char) -> bool {
    matches!(
        c,
        '(' | ')' | '^' | '*' | '+' | '?' | ',' | '|' | '&' | '[' | ' ' | '\t' | '\n' | '\r'
    )
}

/// Feed `text` to the builder, one operation per surface token.
pub(crate) fn parse_into<B: ExpressionOps>(
    builder: &mut B,
    text: &str,
) -> Result<(), ContentModelError> {
    let mut i = 0;
    while i < text.len() {
        let c = text[i..].chars().next().unwrap();
        match c {
            '(' => builder.push(),
            ')' | '^' => builder.pop(),
            '*' => builder.star(),
            '+' => builder.plus(),
            '?' => builder.opt(),
            ',' => builder.and(),
            '|' => builder.or(),
            '&' => builder.all(),
            ' ' | '\t' | '\n' | '\r' => {}
            '[' => {
                let (min, max, end) = scan_range(text, i + 1)?;
                builder.range(min, max)?;
                i = end;
                continue;
            }
            _ => {
                let start = i;
                while i < text.len() {
                    let c = text[i..].chars().next().unwrap();
                    if is_special(c) {
                        break;
                    }
                    i += c.len_utf8();
                }
                builder.symbol(&text[start..i]);
                continue;
            }
        }
        i += c.len_utf8();
    }
    Ok(())
}

/// Scan `min,max]` starting at `start`. Returns the bounds and the index
/// just past the closing bracket. `*` as the maximum means unbounded.
fn scan_range(
    text: &str,
    start: usize,
) -> Result<(u32, Option<u32>, usize), ContentModelError> {
    let malformed = || ContentModelError::MalformedTree("malformed range quantifier".into());

    let comma = text[start..].find(',').map(|o| start + o).ok_or_else(malformed)?;
    let close = text[comma + 1..]
        .find(']')
        .map(|o| comma + 1 + o)
        .ok_or_else(malformed)?;

    let min: i64 = text[start..comma].parse().map_err(|_| malformed())?;
    let max_text = &text[comma + 1..close];
    let max: Option<i64> = if max_text == "*" {
        None
    } else {
        Some(max_text.parse().map_err(|_| malformed())?)
    };

    if min < 0 || max.is_some_and(|m| m < 0) {
        return Err(ContentModelError::BadLimits { min, max });
    }
    Ok((min as u32, max.map(|m| m as u32), close + 1))
}
