//! Structured string patterns: a number embedded between a fixed prefix
//! and suffix, where the number is a decimal digit run, a roman numeral or
//! a CJK numeral.

use super::numerals::{self, CjkStyle};

/// How the embedded number is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeral {
    /// Decimal digits, zero-padded to `width`.
    Digits { width: usize },
    Roman { lower: bool },
    Cjk(CjkStyle),
}

impl Numeral {
    /// `None` once `n` leaves the numeral's range.
    pub fn format(self, n: i64) -> Option<String> {
        match self {
            Numeral::Digits { width } => (n >= 0).then(|| format!("{n:0width$}")),
            Numeral::Roman { lower } => {
                let s = numerals::format_roman(n)?;
                Some(if lower { s.to_ascii_lowercase() } else { s })
            }
            Numeral::Cjk(style) => numerals::format_cjk(n, style),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AffixMatch {
    pub prefix: String,
    pub suffix: String,
    pub last: i64,
    pub step: i64,
    pub numeral: Numeral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumeralSystem {
    Roman,
    Cjk,
}

/// Split around the single run of ASCII digits. Tokens with zero or
/// several runs do not split.
fn split_digit_run(token: &str) -> Option<(&str, &str, &str)> {
    let start = token.find(|c: char| c.is_ascii_digit())?;
    let len = token[start..]
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(token.len() - start);
    let end = start + len;
    if token[end..].contains(|c: char| c.is_ascii_digit()) {
        return None;
    }
    Some((&token[..start], &token[start..end], &token[end..]))
}

fn constant_step(values: &[i64]) -> Option<i64> {
    let step = values.get(1)? - values.first()?;
    values.windows(2).all(|w| w[1] - w[0] == step).then_some(step)
}

/// `Item 9`, `Item 10` → `Item 11`. The last token's zero padding is kept.
pub fn match_digit_run(seed: &[&str]) -> Option<AffixMatch> {
    let parts: Vec<(&str, &str, &str)> = seed.iter().map(|t| split_digit_run(t)).collect::<Option<_>>()?;
    let (prefix, _, suffix) = *parts.first()?;
    if parts.iter().any(|(p, _, s)| *p != prefix || *s != suffix) {
        return None;
    }
    // i64 holds 18 digits safely.
    if parts.iter().any(|(_, d, _)| d.len() > 18) {
        return None;
    }
    let values: Vec<i64> = parts.iter().map(|(_, d, _)| d.parse().ok()).collect::<Option<_>>()?;
    let step = constant_step(&values)?;

    let (_, last_digits, _) = *parts.last()?;
    let width = if last_digits.len() > 1 && last_digits.starts_with('0') {
        last_digits.len()
    } else {
        1
    };

    Some(AffixMatch {
        prefix: prefix.to_string(),
        suffix: suffix.to_string(),
        last: *values.last()?,
        step,
        numeral: Numeral::Digits { width },
    })
}

/// Roman or CJK numerals, either as whole tokens or (with `allow_affixes`)
/// inside a literal prefix/suffix shared by every token.
pub fn match_numeral(seed: &[&str], system: NumeralSystem, allow_affixes: bool) -> Option<AffixMatch> {
    let is_numeral_char: fn(char) -> bool = match system {
        NumeralSystem::Roman => numerals::is_roman_char,
        NumeralSystem::Cjk => numerals::is_cjk_numeral_char,
    };

    let (prefix, suffix) = if allow_affixes {
        common_affixes(seed, is_numeral_char)
    } else {
        (String::new(), String::new())
    };
    if allow_affixes && prefix.is_empty() && suffix.is_empty() {
        // Whole-token matching already covered this seed.
        return None;
    }

    let middles: Vec<&str> = seed
        .iter()
        .map(|t| t.strip_prefix(prefix.as_str())?.strip_suffix(suffix.as_str()))
        .collect::<Option<_>>()?;

    let (values, numeral) = match system {
        NumeralSystem::Roman => {
            let parsed: Vec<(i64, bool)> =
                middles.iter().map(|m| numerals::parse_roman(m)).collect::<Option<_>>()?;
            let lower = parsed.last()?.1;
            (parsed.iter().map(|(n, _)| *n).collect::<Vec<_>>(), Numeral::Roman { lower })
        }
        NumeralSystem::Cjk => {
            let parsed: Vec<(i64, CjkStyle)> =
                middles.iter().map(|m| numerals::parse_cjk(m)).collect::<Option<_>>()?;
            let style = parsed.first()?.1;
            if parsed.iter().any(|(_, s)| *s != style) {
                return None;
            }
            (parsed.iter().map(|(n, _)| *n).collect::<Vec<_>>(), Numeral::Cjk(style))
        }
    };

    let step = constant_step(&values)?;
    Some(AffixMatch { prefix, suffix, last: *values.last()?, step, numeral })
}

/// Longest shared prefix and suffix, each shrunk so it neither ends nor
/// starts with a numeral character.
fn common_affixes(seed: &[&str], is_numeral_char: fn(char) -> bool) -> (String, String) {
    let Some(first) = seed.first() else {
        return (String::new(), String::new());
    };

    let mut prefix: Vec<char> = first.chars().collect();
    for token in &seed[1..] {
        let shared = prefix.iter().zip(token.chars()).take_while(|(a, b)| **a == *b).count();
        prefix.truncate(shared);
    }
    while prefix.last().is_some_and(|c| is_numeral_char(*c)) {
        prefix.pop();
    }

    let rests: Vec<Vec<char>> = seed.iter().map(|t| t.chars().skip(prefix.len()).collect()).collect();
    let mut suffix: Vec<char> = rests[0].iter().rev().copied().collect();
    for rest in &rests[1..] {
        let shared = suffix
            .iter()
            .zip(rest.iter().rev())
            .take_while(|(a, b)| *a == *b)
            .count();
        suffix.truncate(shared);
    }
    while suffix.last().is_some_and(|c| is_numeral_char(*c)) {
        suffix.pop();
    }
    suffix.reverse();

    (prefix.into_iter().collect(), suffix.into_iter().collect())
}
