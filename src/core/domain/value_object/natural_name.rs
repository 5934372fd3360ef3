//! Natural ("human") ordering of component names.
//!
//! Interface and disk names mix text and numbers (`eth2`, `eth10`,
//! `GigabitEthernet1/0/12`), and plain lexicographic ordering puts `eth10`
//! before `eth2`. Names are split into runs of digits and non-digits; digit
//! runs compare by numeric value and text runs compare case-insensitively.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(name: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut in_digits = None;

    for (idx, c) in name.char_indices() {
        let is_digit = c.is_ascii_digit();
        match in_digits {
            Some(prev) if prev != is_digit => {
                let part = &name[start..idx];
                out.push(if prev {
                    Chunk::Digits(part)
                } else {
                    Chunk::Text(part)
                });
                start = idx;
            }
            _ => {}
        }
        in_digits = Some(is_digit);
    }

    if let Some(prev) = in_digits {
        let part = &name[start..];
        out.push(if prev {
            Chunk::Digits(part)
        } else {
            Chunk::Text(part)
        });
    }
    out
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_trimmed = a.trim_start_matches('0');
    let b_trimmed = b.trim_start_matches('0');
    a_trimmed
        .len()
        .cmp(&b_trimmed.len())
        .then_with(|| a_trimmed.cmp(b_trimmed))
        .then_with(|| a.len().cmp(&b.len()))
}

fn cmp_text(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

/// Compares two names in natural order.
///
/// Ties under case folding fall back to a byte-wise comparison so the ordering
/// is total and deterministic.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let left = chunks(a);
    let right = chunks(b);

    for (l, r) in left.iter().zip(right.iter()) {
        let ord = match (l, r) {
            (Chunk::Digits(l), Chunk::Digits(r)) => cmp_digits(l, r),
            (Chunk::Text(l), Chunk::Text(r)) => cmp_text(l, r),
            // Numbers sort ahead of text at the same position
            (Chunk::Digits(_), Chunk::Text(_)) => Ordering::Less,
            (Chunk::Text(_), Chunk::Digits(_)) => Ordering::Greater,
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }

    left.len().cmp(&right.len()).then_with(|| a.cmp(b))
}
