//! Run-length text codecs for stored draft records.
//!
//! `Legacy` reads records written in the older `c*N` layout, which cannot
//! tell a literal `*` followed by digits from a run token. `Escaped` makes every
//! `*` in its output the start of a `*<char><count>;` token, so any input
//! round-trips.

use lazy_static::lazy_static;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Runs longer than this are replaced by a token.
pub const MIN_RUN: usize = 4;
const MARKER: char = '*';
const TERMINATOR: char = ';';
/// Upper bound on decoded text; stored drafts never come close.
pub const MAX_DECODED_LEN: usize = 32 * 1024 * 1024;

lazy_static! {
    static ref LEGACY_TOKEN: Regex = Regex::new(r"(.)\*(\d+)").expect("legacy token pattern");
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("truncated run token at byte {0}")]
    Truncated(usize),

    #[error("invalid run length at byte {0}")]
    InvalidCount(usize),

    #[error("decoded text would exceed {0} bytes")]
    TooLong(usize),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Codec {
    #[serde(rename = "rle")]
    Legacy,
    #[default]
    #[serde(rename = "rle-escaped")]
    Escaped,
}

impl Codec {
    pub fn compress(self, input: &str) -> String {
        match self {
            Codec::Legacy => legacy_compress(input),
            Codec::Escaped => escaped_compress(input),
        }
    }

    pub fn decompress(self, input: &str) -> Result<String, CodecError> {
        self.decompress_within(input, MAX_DECODED_LEN)
    }

    /// Like [`Codec::decompress`], failing once the output would pass `limit` bytes.
    pub fn decompress_within(self, input: &str, limit: usize) -> Result<String, CodecError> {
        match self {
            Codec::Legacy => legacy_decompress(input, limit),
            Codec::Escaped => escaped_decompress(input, limit),
        }
    }
}

/// Groups `input` into maximal runs of one character.
fn runs(input: &str) -> impl Iterator<Item = (char, usize)> + '_ {
    let mut chars = input.chars().peekable();
    std::iter::from_fn(move || {
        let c = chars.next()?;
        let mut len = 1;
        while chars.next_if_eq(&c).is_some() {
            len += 1;
        }
        Some((c, len))
    })
}

fn legacy_compress(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (c, len) in runs(input) {
        // line breaks were never folded
        if len >= MIN_RUN && c != '\n' {
            out.push(c);
            out.push(MARKER);
            out.push_str(&len.to_string());
        } else {
            out.extend(std::iter::repeat(c).take(len));
        }
    }
    out
}

fn legacy_decompress(input: &str, limit: usize) -> Result<String, CodecError> {
    // counts that do not fit a usize stay literal, as the old reader left them
    let mut expanded = input.len();
    for caps in LEGACY_TOKEN.captures_iter(input) {
        if let Ok(n) = caps[2].parse::<usize>() {
            expanded = expanded.saturating_add(caps[1].len().saturating_mul(n));
            if expanded > limit {
                return Err(CodecError::TooLong(limit));
            }
        }
    }
    Ok(LEGACY_TOKEN
        .replace_all(input, |caps: &Captures| match caps[2].parse::<usize>() {
            Ok(n) => caps[1].repeat(n),
            Err(_) => caps[0].to_string(),
        })
        .into_owned())
}

fn escaped_compress(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for (c, len) in runs(input) {
        if len >= MIN_RUN || c == MARKER {
            out.push(MARKER);
            out.push(c);
            out.push_str(&len.to_string());
            out.push(TERMINATOR);
        } else {
            out.extend(std::iter::repeat(c).take(len));
        }
    }
    out
}

fn escaped_decompress(input: &str, limit: usize) -> Result<String, CodecError> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.char_indices();
    while let Some((at, c)) = chars.next() {
        if c != MARKER {
            out.push(c);
            continue;
        }
        let (_, run_char) = chars.next().ok_or(CodecError::Truncated(at))?;
        let mut count = String::new();
        loop {
            match chars.next() {
                Some((_, TERMINATOR)) => break,
                Some((_, d)) if d.is_ascii_digit() => count.push(d),
                Some(_) => return Err(CodecError::InvalidCount(at)),
                None => return Err(CodecError::Truncated(at)),
            }
        }
        let n: usize = count.parse().map_err(|_| CodecError::InvalidCount(at))?;
        if out.len().saturating_add(run_char.len_utf8().saturating_mul(n)) > limit {
            return Err(CodecError::TooLong(limit));
        }
        out.extend(std::iter::repeat(run_char).take(n));
    }
    Ok(out)
}
