//! Content-stream rewriting: literal removal and fill overlays.

use lopdf::content::{Content, Operation};
use lopdf::Object;

use crate::error::{Error, Result};
use crate::model::{Rect, Rgb};

/// Remove every occurrence of `literals` from the string operands of
/// text-showing operators (`Tj`, `TJ`, `'`, `"`).
///
/// Returns the re-encoded stream and the number of removals. When nothing
/// was removed the input is returned unchanged. Only ASCII literals are
/// matched, since operand bytes are compared directly.
pub fn strip_literals(content: &[u8], literals: &[&str]) -> Result<(Vec<u8>, usize)> {
    let needles: Vec<&[u8]> = literals
        .iter()
        .filter(|l| !l.is_empty() && l.is_ascii())
        .map(|l| l.as_bytes())
        .collect();
    if needles.is_empty() {
        return Ok((content.to_vec(), 0));
    }

    let mut decoded =
        Content::decode(content).map_err(|e| Error::ContentStream(e.to_string()))?;

    let mut removed = 0;
    for op in decoded.operations.iter_mut() {
        let index = match op.operator.as_str() {
            "Tj" | "'" | "TJ" => 0,
            "\"" => 2,
            _ => continue,
        };
        match op.operands.get_mut(index) {
            Some(Object::String(bytes, _)) => {
                removed += remove_needles(bytes, &needles);
            }
            Some(Object::Array(items)) => {
                for item in items.iter_mut() {
                    if let Object::String(bytes, _) = item {
                        removed += remove_needles(bytes, &needles);
                    }
                }
            }
            _ => {}
        }
    }

    if removed == 0 {
        return Ok((content.to_vec(), 0));
    }

    let encoded = decoded
        .encode()
        .map_err(|e| Error::ContentStream(e.to_string()))?;
    Ok((encoded, removed))
}

fn remove_needles(bytes: &mut Vec<u8>, needles: &[&[u8]]) -> usize {
    needles.iter().map(|n| remove_all(bytes, n)).sum()
}

fn remove_all(haystack: &mut Vec<u8>, needle: &[u8]) -> usize {
    if haystack.len() < needle.len() {
        return 0;
    }

    let mut out = Vec::with_capacity(haystack.len());
    let mut count = 0;
    let mut i = 0;
    while i < haystack.len() {
        if haystack[i..].starts_with(needle) {
            count += 1;
            i += needle.len();
        } else {
            out.push(haystack[i]);
            i += 1;
        }
    }

    if count > 0 {
        *haystack = out;
    }
    count
}

/// Stream opening the isolation group around the original content.
pub(crate) const SAVE_STATE: &[u8] = b"q\n";

/// Number of `q` operators left open at the end of `content`.
pub(crate) fn open_states(content: &[u8]) -> Result<usize> {
    let decoded = Content::decode(content).map_err(|e| Error::ContentStream(e.to_string()))?;
    let depth = decoded
        .operations
        .iter()
        .fold(0usize, |depth, op| match op.operator.as_str() {
            "q" => depth + 1,
            "Q" => depth.saturating_sub(1),
            _ => depth,
        });
    Ok(depth)
}

/// Build the overlay stream: close the `open` states the original content
/// left behind plus the isolation group, then paint each rectangle with
/// `color` in a fresh state.
pub(crate) fn overlay_content(rects: &[Rect], color: Rgb, open: usize) -> Result<Vec<u8>> {
    let mut operations: Vec<Operation> =
        (0..=open).map(|_| Operation::new("Q", vec![])).collect();
    operations.push(Operation::new("q", vec![]));
    operations.push(Operation::new(
        "rg",
        vec![color.r.into(), color.g.into(), color.b.into()],
    ));
    for rect in rects {
        operations.push(Operation::new(
            "re",
            vec![
                rect.x.into(),
                rect.y.into(),
                rect.width.into(),
                rect.height.into(),
            ],
        ));
        operations.push(Operation::new("f", vec![]));
    }
    operations.push(Operation::new("Q", vec![]));

    Content { operations }
        .encode()
        .map_err(|e| Error::Redaction(e.to_string()))
}
