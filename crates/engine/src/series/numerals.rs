//! Roman and CJK numeral conversion.
//!
//! Parsers are strict: a token is accepted only if formatting its value
//! reproduces the token, so non-canonical spellings ("IIII", "一十") fail.

pub const ROMAN_MAX: i64 = 100;
pub const CJK_MAX: i64 = 10_000;

const ROMAN_TABLE: [(i64, &str); 9] = [
    (100, "C"),
    (90, "XC"),
    (50, "L"),
    (40, "XL"),
    (10, "X"),
    (9, "IX"),
    (5, "V"),
    (4, "IV"),
    (1, "I"),
];

/// Uppercase roman numeral for 1..=100.
pub fn format_roman(n: i64) -> Option<String> {
    if !(1..=ROMAN_MAX).contains(&n) {
        return None;
    }
    let mut n = n;
    let mut out = String::new();
    for (value, glyph) in ROMAN_TABLE {
        while n >= value {
            out.push_str(glyph);
            n -= value;
        }
    }
    Some(out)
}

/// Parse a roman numeral in either case. Returns the value and whether the
/// token was lowercase. Mixed case is rejected.
pub fn parse_roman(token: &str) -> Option<(i64, bool)> {
    if token.is_empty() {
        return None;
    }
    let lower = token.chars().all(|c| c.is_ascii_lowercase());
    let upper = token.chars().all(|c| c.is_ascii_uppercase());
    if !lower && !upper {
        return None;
    }
    let canonical = token.to_ascii_uppercase();
    let mut total = 0i64;
    let mut prev = 0i64;
    for c in canonical.chars().rev() {
        let v = match c {
            'I' => 1,
            'V' => 5,
            'X' => 10,
            'L' => 50,
            'C' => 100,
            _ => return None,
        };
        if v < prev {
            total -= v;
        } else {
            total += v;
            prev = v;
        }
    }
    (format_roman(total)? == canonical).then_some((total, lower))
}

pub fn is_roman_char(c: char) -> bool {
    matches!(c.to_ascii_uppercase(), 'I' | 'V' | 'X' | 'L' | 'C' | 'D' | 'M')
}

/// One of the two CJK digit sets. Tokens never mix them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CjkStyle {
    /// 一二三 … 十百千万
    Modern,
    /// 壹贰叁 … 拾佰仟萬
    Traditional,
}

impl CjkStyle {
    fn digits(self) -> [char; 10] {
        match self {
            CjkStyle::Modern => ['零', '一', '二', '三', '四', '五', '六', '七', '八', '九'],
            CjkStyle::Traditional => ['零', '壹', '贰', '叁', '肆', '伍', '陆', '柒', '捌', '玖'],
        }
    }

    /// Units for 10, 100, 1000, 10000.
    fn units(self) -> [char; 4] {
        match self {
            CjkStyle::Modern => ['十', '百', '千', '万'],
            CjkStyle::Traditional => ['拾', '佰', '仟', '萬'],
        }
    }

    fn digit_value(self, c: char) -> Option<i64> {
        self.digits().iter().position(|d| *d == c).map(|i| i as i64)
    }

    fn unit_value(self, c: char) -> Option<i64> {
        let pos = self.units().iter().position(|u| *u == c)?;
        Some(10i64.pow(pos as u32 + 1))
    }
}

/// CJK numeral for 1..=10000.
pub fn format_cjk(n: i64, style: CjkStyle) -> Option<String> {
    if !(1..=CJK_MAX).contains(&n) {
        return None;
    }
    let digits = style.digits();
    let units = style.units();
    if n == CJK_MAX {
        return Some(format!("{}{}", digits[1], units[3]));
    }

    let mut out = String::new();
    let mut zero_pending = false;
    for (place, unit) in [(1000, Some(units[2])), (100, Some(units[1])), (10, Some(units[0])), (1, None)] {
        let d = (n / place) % 10;
        if d == 0 {
            if !out.is_empty() {
                zero_pending = true;
            }
            continue;
        }
        if zero_pending {
            out.push(digits[0]);
            zero_pending = false;
        }
        // 十一, not 一十一
        let bare_ten = place == 10 && d == 1 && out.is_empty();
        if !bare_ten {
            out.push(digits[d as usize]);
        }
        if let Some(unit) = unit {
            out.push(unit);
        }
    }
    Some(out)
}

/// Parse a CJK numeral written entirely in one style.
pub fn parse_cjk(token: &str) -> Option<(i64, CjkStyle)> {
    [CjkStyle::Modern, CjkStyle::Traditional]
        .into_iter()
        .find_map(|style| parse_cjk_in(token, style).map(|n| (n, style)))
}

fn parse_cjk_in(token: &str, style: CjkStyle) -> Option<i64> {
    if token.is_empty() {
        return None;
    }
    let mut total = 0i64;
    let mut section = 0i64;
    let mut number = 0i64;
    for c in token.chars() {
        if let Some(d) = style.digit_value(c) {
            number = d;
        } else if let Some(unit) = style.unit_value(c) {
            if unit == CJK_MAX {
                total = (section + number).max(1) * unit;
                section = 0;
            } else {
                section += number.max(1) * unit;
            }
            number = 0;
        } else {
            return None;
        }
    }
    let value = total + section + number;
    (format_cjk(value, style)? == token).then_some(value)
}

pub fn is_cjk_numeral_char(c: char) -> bool {
    [CjkStyle::Modern, CjkStyle::Traditional]
        .into_iter()
        .any(|s| s.digit_value(c).is_some() || s.unit_value(c).is_some())
}
