//! Sequence inference for fill-handle autocomplete.
//!
//! `infer_sequence` maps a seed of same-kind values to a lazy `Sequence` of
//! the values that follow it. The first rule that matches wins, in this
//! order:
//!
//! 1. Empty seed → empty; single value → repeat it forever
//! 2. Text: registered lists and custom matchers, best score wins
//! 3. Text: structured patterns (digit run, roman, CJK, then roman/CJK
//!    inside a literal prefix/suffix)
//! 4. Numbers: arithmetic, then geometric
//! 5. Dates: constant millisecond delta
//! 6. Otherwise: cycle through the seed
//!
//! Changing this order changes which continuation ambiguous seeds produce.

mod lists;
mod numerals;
mod pattern;

use std::fmt;

use cellgrid_core::CellValue;
use chrono::{DateTime, TimeZone, Utc};

pub use lists::{builtin_lists, CaseMode, SequenceList};
pub use numerals::{format_cjk, format_roman, parse_cjk, parse_roman, CjkStyle};
pub use pattern::{AffixMatch, Numeral};

use pattern::NumeralSystem;

/// Relative tolerance for numeric step and ratio comparison.
pub const EPSILON: f64 = 1e-9;

// ============================================================================
// Sequence
// ============================================================================

/// Values following a seed. Some sequences end (finite lists, numerals
/// leaving their range); most are infinite.
pub struct Sequence {
    state: State,
}

enum State {
    Done,
    Repeat(CellValue),
    Cycle {
        values: Vec<CellValue>,
        pos: usize,
    },
    List {
        items: Vec<String>,
        next: i64,
        step: i64,
        cyclic: bool,
        case: CaseMode,
    },
    Affixed {
        prefix: String,
        suffix: String,
        next: i64,
        step: i64,
        numeral: Numeral,
    },
    Arithmetic {
        last: f64,
        step: f64,
        k: u32,
    },
    Geometric {
        last: f64,
        ratio: f64,
        k: i32,
    },
    Dates {
        last_ms: i64,
        step_ms: i64,
        k: i64,
    },
    Custom(Box<dyn Iterator<Item = CellValue>>),
}

impl Sequence {
    pub fn empty() -> Self {
        Self { state: State::Done }
    }

    pub fn repeat(value: CellValue) -> Self {
        Self { state: State::Repeat(value) }
    }

    /// Cycle through `values` starting from the first.
    pub fn cycle(values: Vec<CellValue>) -> Self {
        if values.is_empty() {
            return Self::empty();
        }
        Self { state: State::Cycle { values, pos: 0 } }
    }

    /// Wrap an arbitrary iterator, for custom matchers.
    pub fn custom(iter: impl Iterator<Item = CellValue> + 'static) -> Self {
        Self { state: State::Custom(Box::new(iter)) }
    }

    fn list(list: &SequenceList, next: i64, step: i64, case: CaseMode) -> Self {
        Self {
            state: State::List {
                items: list.items.clone(),
                next,
                step,
                cyclic: list.cyclic,
                case,
            },
        }
    }

    fn affixed(m: AffixMatch) -> Self {
        Self {
            state: State::Affixed {
                prefix: m.prefix,
                suffix: m.suffix,
                next: m.last + m.step,
                step: m.step,
                numeral: m.numeral,
            },
        }
    }

    /// Whether the sequence may end. Custom sequences report `false`.
    pub fn is_finite_hint(&self) -> bool {
        match &self.state {
            State::Done => true,
            State::List { cyclic, .. } => !cyclic,
            State::Affixed { numeral, step, .. } => match numeral {
                Numeral::Digits { .. } => *step < 0,
                Numeral::Roman { .. } | Numeral::Cjk(_) => *step != 0,
            },
            _ => false,
        }
    }
}

impl Iterator for Sequence {
    type Item = CellValue;

    fn next(&mut self) -> Option<CellValue> {
        let value = match &mut self.state {
            State::Done => None,
            State::Repeat(v) => Some(v.clone()),
            State::Cycle { values, pos } => {
                let v = values.get(*pos % values.len().max(1)).cloned();
                *pos += 1;
                v
            }
            State::List { items, next, step, cyclic, case } => {
                let idx = if *cyclic { next.rem_euclid(items.len().max(1) as i64) } else { *next };
                let item = usize::try_from(idx).ok().and_then(|i| items.get(i));
                let v = item.map(|s| CellValue::Text(case.apply(s)));
                *next += *step;
                v
            }
            State::Affixed { prefix, suffix, next, step, numeral } => {
                let v = numeral.format(*next).map(|n| CellValue::Text(format!("{prefix}{n}{suffix}")));
                *next += *step;
                v
            }
            State::Arithmetic { last, step, k } => {
                *k += 1;
                Some(CellValue::Number(*last + *step * f64::from(*k)))
            }
            State::Geometric { last, ratio, k } => {
                *k += 1;
                let v = *last * ratio.powi(*k);
                v.is_finite().then_some(CellValue::Number(v))
            }
            State::Dates { last_ms, step_ms, k } => {
                *k += 1;
                step_ms
                    .checked_mul(*k)
                    .and_then(|d| last_ms.checked_add(d))
                    .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                    .map(CellValue::Date)
            }
            State::Custom(iter) => iter.next(),
        };
        if value.is_none() {
            self.state = State::Done;
        }
        value
    }
}

impl fmt::Debug for Sequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.state {
            State::Done => "Done",
            State::Repeat(_) => "Repeat",
            State::Cycle { .. } => "Cycle",
            State::List { .. } => "List",
            State::Affixed { .. } => "Affixed",
            State::Arithmetic { .. } => "Arithmetic",
            State::Geometric { .. } => "Geometric",
            State::Dates { .. } => "Dates",
            State::Custom(_) => "Custom",
        };
        write!(f, "Sequence({kind})")
    }
}

// ============================================================================
// Registry
// ============================================================================

/// A pluggable text matcher. Returns a score and the continuation, or
/// `None` when the seed does not match. A matcher beats a list only with a
/// strictly higher score.
pub trait SequenceMatcher {
    fn name(&self) -> &str;
    fn match_seed(&self, seed: &[&str]) -> Option<(f64, Sequence)>;
}

/// Lists and matchers consulted for text seeds, plus the language
/// preference used to rank lists.
pub struct SequenceRegistry {
    lists: Vec<SequenceList>,
    matchers: Vec<Box<dyn SequenceMatcher>>,
    languages: Vec<String>,
}

impl Default for SequenceRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl SequenceRegistry {
    pub fn empty() -> Self {
        Self {
            lists: Vec::new(),
            matchers: Vec::new(),
            languages: vec!["en".to_string()],
        }
    }

    pub fn builtin() -> Self {
        Self { lists: builtin_lists(), ..Self::empty() }
    }

    /// Preferred languages, most preferred first.
    pub fn with_languages<S: Into<String>>(mut self, languages: impl IntoIterator<Item = S>) -> Self {
        self.languages = languages.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_list(mut self, list: SequenceList) -> Self {
        self.lists.push(list);
        self
    }

    pub fn with_matcher(mut self, matcher: impl SequenceMatcher + 'static) -> Self {
        self.matchers.push(Box::new(matcher));
        self
    }

    pub fn lists(&self) -> &[SequenceList] {
        &self.lists
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    /// Preferred languages score above language-neutral lists, which score
    /// above lists in other languages.
    fn list_score(&self, list: &SequenceList) -> f64 {
        match &list.lang {
            None => 1.0,
            Some(lang) => match self.languages.iter().position(|l| l == lang) {
                Some(p) => (self.languages.len() - p) as f64 + 1.0,
                None => 0.5,
            },
        }
    }

    fn best_match(&self, seed: &[&str]) -> Option<Sequence> {
        let case = CaseMode::detect(seed.last()?);
        let mut best: Option<(f64, Sequence)> = None;

        for list in &self.lists {
            let Some((last, step)) = list.match_seed(seed) else {
                continue;
            };
            let score = self.list_score(list);
            if best.as_ref().is_some_and(|(s, _)| *s >= score) {
                continue;
            }
            best = Some((score, Sequence::list(list, last + step, step, case)));
        }

        for matcher in &self.matchers {
            let Some((score, seq)) = matcher.match_seed(seed) else {
                continue;
            };
            if best.as_ref().is_some_and(|(s, _)| *s >= score) {
                continue;
            }
            log::debug!("sequence matcher '{}' matched with score {score}", matcher.name());
            best = Some((score, seq));
        }

        best.map(|(_, seq)| seq)
    }
}

impl fmt::Debug for SequenceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceRegistry")
            .field("lists", &self.lists.len())
            .field("matchers", &self.matchers.len())
            .field("languages", &self.languages)
            .finish()
    }
}

// ============================================================================
// Inference
// ============================================================================

/// Infer the continuation of `seed`. Never fails: unrecognized seeds cycle.
pub fn infer_sequence(seed: &[CellValue], registry: &SequenceRegistry) -> Sequence {
    match seed {
        [] => return Sequence::empty(),
        [only] => return Sequence::repeat(only.clone()),
        _ => {}
    }

    if let Some(texts) = as_texts(seed) {
        if let Some(seq) = registry.best_match(&texts).or_else(|| match_structured(&texts)) {
            return seq;
        }
    } else if let Some(numbers) = as_numbers(seed) {
        if let Some(seq) = arithmetic(&numbers).or_else(|| geometric(&numbers)) {
            return seq;
        }
    } else if let Some(millis) = as_date_millis(seed) {
        if let Some(seq) = date_steps(&millis) {
            return seq;
        }
    }

    Sequence::cycle(seed.to_vec())
}

fn as_texts(seed: &[CellValue]) -> Option<Vec<&str>> {
    seed.iter().map(CellValue::as_text).collect()
}

fn as_numbers(seed: &[CellValue]) -> Option<Vec<f64>> {
    seed.iter().map(CellValue::as_number).collect()
}

fn as_date_millis(seed: &[CellValue]) -> Option<Vec<i64>> {
    seed.iter()
        .map(|v| v.as_date().map(|d: DateTime<Utc>| d.timestamp_millis()))
        .collect()
}

fn match_structured(seed: &[&str]) -> Option<Sequence> {
    pattern::match_digit_run(seed)
        .or_else(|| pattern::match_numeral(seed, NumeralSystem::Roman, false))
        .or_else(|| pattern::match_numeral(seed, NumeralSystem::Cjk, false))
        .or_else(|| pattern::match_numeral(seed, NumeralSystem::Roman, true))
        .or_else(|| pattern::match_numeral(seed, NumeralSystem::Cjk, true))
        .map(Sequence::affixed)
}

fn close(a: f64, b: f64, scale: f64) -> bool {
    (a - b).abs() <= EPSILON * scale.abs().max(1.0)
}

fn arithmetic(values: &[f64]) -> Option<Sequence> {
    let step = values.get(1)? - values.first()?;
    if !values.windows(2).all(|w| close(w[1] - w[0], step, step)) {
        return None;
    }
    Some(Sequence {
        state: State::Arithmetic { last: *values.last()?, step, k: 0 },
    })
}

fn geometric(values: &[f64]) -> Option<Sequence> {
    let first = *values.first()?;
    if first == 0.0 {
        return None;
    }
    let ratio = values.get(1)? / first;
    let consistent = values
        .windows(2)
        .all(|w| w[0] != 0.0 && close(w[1] / w[0], ratio, ratio));
    if !consistent {
        return None;
    }
    Some(Sequence {
        state: State::Geometric { last: *values.last()?, ratio, k: 0 },
    })
}

fn date_steps(millis: &[i64]) -> Option<Sequence> {
    let step_ms = millis.get(1)? - millis.first()?;
    if !millis.windows(2).all(|w| w[1] - w[0] == step_ms) {
        return None;
    }
    Some(Sequence {
        state: State::Dates { last_ms: *millis.last()?, step_ms, k: 0 },
    })
}
