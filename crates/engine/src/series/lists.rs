//! Named value lists for sequence fill (months, weekdays, quarters, ...).

/// Case of the seed, re-applied to generated list items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseMode {
    Upper, // JAN → FEB
    Lower, // jan → feb
    Title, // Jan → Feb
}

impl CaseMode {
    pub fn detect(text: &str) -> CaseMode {
        let text = text.trim();
        if text.chars().all(|c| c.is_uppercase() || !c.is_alphabetic()) {
            CaseMode::Upper
        } else if text.chars().all(|c| c.is_lowercase() || !c.is_alphabetic()) {
            CaseMode::Lower
        } else {
            CaseMode::Title
        }
    }

    pub fn apply(self, text: &str) -> String {
        match self {
            CaseMode::Upper => text.to_uppercase(),
            CaseMode::Lower => text.to_lowercase(),
            CaseMode::Title => {
                let mut chars = text.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(|c| c.to_lowercase()))
                        .collect(),
                }
            }
        }
    }
}

/// An ordered list of tokens. Cyclic lists wrap (December → January);
/// finite lists end after their last item.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceList {
    pub name: String,
    /// Language tag used for preference ranking. `None` means the list is
    /// language-neutral.
    pub lang: Option<String>,
    pub items: Vec<String>,
    /// Alternate spellings mapped to an item index.
    pub aliases: Vec<(String, usize)>,
    pub cyclic: bool,
}

impl SequenceList {
    pub fn cyclic<S: Into<String>>(name: &str, lang: Option<&str>, items: impl IntoIterator<Item = S>) -> Self {
        Self {
            name: name.to_string(),
            lang: lang.map(str::to_string),
            items: items.into_iter().map(Into::into).collect(),
            aliases: Vec::new(),
            cyclic: true,
        }
    }

    pub fn finite<S: Into<String>>(name: &str, lang: Option<&str>, items: impl IntoIterator<Item = S>) -> Self {
        Self { cyclic: false, ..Self::cyclic(name, lang, items) }
    }

    pub fn with_alias(mut self, alias: &str, index: usize) -> Self {
        if index < self.items.len() {
            self.aliases.push((alias.to_string(), index));
        }
        self
    }

    /// Index of `token`: direct case-insensitive match first, then aliases.
    pub fn lookup(&self, token: &str) -> Option<usize> {
        let lower = token.trim().to_lowercase();
        self.items
            .iter()
            .position(|item| item.to_lowercase() == lower)
            .or_else(|| {
                self.aliases
                    .iter()
                    .find(|(alias, _)| alias.to_lowercase() == lower)
                    .map(|(_, i)| *i)
            })
    }

    /// Resolve every token and check for one consistent step. Returns the
    /// last index and the step.
    pub fn match_seed(&self, seed: &[&str]) -> Option<(i64, i64)> {
        let len = self.items.len() as i64;
        if len == 0 || seed.len() < 2 {
            return None;
        }
        let indices: Vec<i64> = seed
            .iter()
            .map(|t| self.lookup(t).map(|i| i as i64))
            .collect::<Option<_>>()?;

        let step = indices[1] - indices[0];
        let consistent = indices.windows(2).all(|w| {
            let d = w[1] - w[0];
            if self.cyclic {
                d.rem_euclid(len) == step.rem_euclid(len)
            } else {
                d == step
            }
        });
        if !consistent {
            return None;
        }

        let last = *indices.last()?;
        if self.cyclic {
            Some((last, step.rem_euclid(len)))
        } else if step >= 0 {
            Some((last, step))
        } else {
            None
        }
    }
}

// ============================================================================
// Built-in Lists
// ============================================================================

const MONTHS_SHORT: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun",
    "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

const MONTHS_LONG: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

const WEEKDAYS_SHORT: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];

const WEEKDAYS_LONG: [&str; 7] = [
    "Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday",
];

const QUARTERS: [&str; 4] = ["Q1", "Q2", "Q3", "Q4"];

const ZH_WEEKDAYS: [&str; 7] = ["星期一", "星期二", "星期三", "星期四", "星期五", "星期六", "星期日"];

const ZH_WEEKDAYS_SHORT: [&str; 7] = ["周一", "周二", "周三", "周四", "周五", "周六", "周日"];

const JA_WEEKDAYS: [&str; 7] = ["月曜日", "火曜日", "水曜日", "木曜日", "金曜日", "土曜日", "日曜日"];

const ZH_MONTHS: [&str; 12] = [
    "一月", "二月", "三月", "四月", "五月", "六月",
    "七月", "八月", "九月", "十月", "十一月", "十二月",
];

const HEAVENLY_STEMS: [&str; 10] = ["甲", "乙", "丙", "丁", "戊", "己", "庚", "辛", "壬", "癸"];

const EARTHLY_BRANCHES: [&str; 12] = [
    "子", "丑", "寅", "卯", "辰", "巳", "午", "未", "申", "酉", "戌", "亥",
];

/// Lists registered by default, in tie-break order.
pub fn builtin_lists() -> Vec<SequenceList> {
    let mut zh_weekdays = SequenceList::cyclic("zh-weekdays", Some("zh"), ZH_WEEKDAYS)
        .with_alias("星期天", 6);
    for (i, short) in ZH_WEEKDAYS_SHORT.iter().enumerate() {
        zh_weekdays = zh_weekdays.with_alias(short, i);
    }

    vec![
        SequenceList::cyclic("months-short", Some("en"), MONTHS_SHORT).with_alias("Sept", 8),
        SequenceList::cyclic("months-long", Some("en"), MONTHS_LONG),
        SequenceList::cyclic("weekdays-short", Some("en"), WEEKDAYS_SHORT)
            .with_alias("Tues", 1)
            .with_alias("Weds", 2)
            .with_alias("Thur", 3)
            .with_alias("Thurs", 3),
        SequenceList::cyclic("weekdays-long", Some("en"), WEEKDAYS_LONG),
        SequenceList::cyclic("quarters", None, QUARTERS),
        zh_weekdays,
        SequenceList::cyclic("ja-weekdays", Some("ja"), JA_WEEKDAYS),
        SequenceList::cyclic("zh-months", Some("zh"), ZH_MONTHS),
        SequenceList::cyclic("heavenly-stems", Some("zh"), HEAVENLY_STEMS),
        SequenceList::cyclic("earthly-branches", Some("zh"), EARTHLY_BRANCHES),
        SequenceList::finite("alphabet", None, ('A'..='Z').map(String::from)),
    ]
}
