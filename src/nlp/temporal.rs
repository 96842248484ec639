//! Rule-based temporal expression tagger.
//!
//! Detects time expressions common in health self-reports and normalizes them
//! to TIMEX3-style values relative to a reference date:
//!
//! - **Dates**: "March 2019" → `2019-03`, "3/14/2016" → `2016-03-14`,
//!   "summer of 2016" → `2016-SU`, "the 1990s" → `199X`, "2015" → `2015`
//! - **Relative dates**: "last year", "two months ago", "yesterday"
//! - **Times**: "5pm", "last night"
//! - **Durations**: "for three years" → `P3Y`, "a few months" → `PXM`
//! - **Sets**: "every day", "weekly", "twice a month"
//!
//! Rules are tried in declaration order; a match overlapping an already
//! accepted span is dropped. Without a reference date, relative expressions
//! normalize to `PAST_REF` / `PRESENT_REF` / `FUTURE_REF`.

use std::sync::LazyLock;

use chrono::{Datelike, Days, Months, NaiveDate};
use regex::{Captures, Regex};

use crate::models::TemporalType;
use crate::pipeline::diagnosis_time::{DiagnosisTimeError, TemporalExpression, TemporalTagger};

const NUM: &str = r"\d+|an?|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|thirteen|fourteen|fifteen|sixteen|seventeen|eighteen|nineteen|twenty|a\s+few|few|several|a\s+couple\s+of|a\s+couple|couple\s+of";

const MONTH: &str = r"jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sept?(?:ember)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

const MONTH_FULL: &str =
    r"january|february|march|april|may|june|july|august|september|october|november|december";

const UNIT: &str = r"day|week|month|year|decade";

const YEAR: &str = r"(?:19|20)\d{2}";

type Normalized = Option<(TemporalType, String)>;

/// A compiled rule: the regex finds the expression, `normalize` turns the
/// captures into a type and value (or rejects the match with `None`).
/// The span is the named group `t` when present, else the whole match.
struct TemporalRule {
    regex: Regex,
    normalize: fn(&Captures<'_>, Option<NaiveDate>) -> Normalized,
}

fn rule(regex_str: &str, normalize: fn(&Captures<'_>, Option<NaiveDate>) -> Normalized) -> TemporalRule {
    TemporalRule {
        regex: Regex::new(regex_str).expect("Invalid temporal regex pattern"),
        normalize,
    }
}

static TEMPORAL_RULES: LazyLock<Vec<TemporalRule>> = LazyLock::new(|| {
    vec![
        // ── Sets (first, so "every two years" is not a duration) ──
        rule(
            &format!(
                r"(?i)\b(?:every|each)\s+(?:other\s+)?(?:(?P<n>{NUM})\s+)?(?P<u>day|night|morning|evening|week|weekend|month|year|monday|tuesday|wednesday|thursday|friday|saturday|sunday)s?\b"
            ),
            normalize_every,
        ),
        rule(
            r"(?i)\b(?P<w>daily|nightly|weekly|monthly|yearly|annually)\b",
            normalize_frequency_adverb,
        ),
        rule(
            r"(?i)\b(?:once|twice|thrice|(?:\d+|two|three|four|five|six)\s+times)\s+(?:a|an|per|every)\s+(?P<u>day|week|month|year)\b",
            normalize_times_per,
        ),
        // ── Explicit dates ──
        rule(
            &format!(r"\b(?P<y>{YEAR})-(?P<m>\d{{1,2}})-(?P<d>\d{{1,2}})\b"),
            normalize_ymd,
        ),
        rule(
            r"\b(?P<m>\d{1,2})/(?P<d>\d{1,2})/(?P<y>\d{4}|\d{2})\b",
            normalize_ymd,
        ),
        rule(
            &format!(
                r"(?i)\b(?P<mn>{MONTH})\.?\s+(?P<d>\d{{1,2}})(?:st|nd|rd|th)?,?\s+(?P<y>{YEAR})\b"
            ),
            normalize_ymd,
        ),
        rule(
            &format!(
                r"(?i)\b(?P<d>\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?(?P<mn>{MONTH})\.?,?\s+(?P<y>{YEAR})\b"
            ),
            normalize_ymd,
        ),
        rule(
            &format!(r"(?i)\b(?P<mn>{MONTH})\.?,?\s+(?:of\s+)?(?P<y>{YEAR})\b"),
            normalize_year_month,
        ),
        rule(
            &format!(r"(?i)\b(?P<mn>{MONTH})\.?\s+'(?P<y>\d{{2}})\b"),
            normalize_year_month,
        ),
        rule(
            &format!(r"\b(?P<m>\d{{1,2}})/(?P<y>{YEAR})\b"),
            normalize_year_month,
        ),
        rule(
            &format!(r"(?i)\b(?P<mn>{MONTH})\.?\s+(?P<d>\d{{1,2}})(?:st|nd|rd|th)?\b"),
            normalize_month_day,
        ),
        rule(
            &format!(r"(?i)\b(?P<d>\d{{1,2}})(?:st|nd|rd|th)?\s+of\s+(?P<mn>{MONTH})\b"),
            normalize_month_day,
        ),
        // ── Seasons and decades ──
        rule(
            &format!(
                r"(?i)\b(?P<s>spring|summer|fall|autumn|winter)\s+(?:of\s+)?(?P<y>{YEAR})\b"
            ),
            normalize_season_year,
        ),
        rule(
            r"(?i)\b(?P<rel>last|this|next)\s+(?P<s>spring|summer|fall|autumn|winter)\b",
            normalize_relative_season,
        ),
        rule(
            r"(?i)\b(?:the\s+)?(?P<t>(?P<dec>(?:19|20)\d)0'?s)\b",
            normalize_decade,
        ),
        // ── Relative dates and times ──
        rule(
            &format!(r"(?i)\b(?P<n>{NUM})\s+(?P<u>{UNIT})s?\s+ago\b"),
            normalize_ago,
        ),
        rule(
            &format!(
                r"(?i)\b(?P<the>the\s+)?(?P<rel>past|last|this|next|previous|coming)\s+(?:(?P<n>{NUM})\s+)?(?P<u>{UNIT})s?\b"
            ),
            normalize_relative_unit,
        ),
        rule(
            r"(?i)\b(?P<rel>this|last|yesterday|tomorrow)\s+(?P<p>morning|afternoon|evening|night)\b",
            normalize_part_of_day,
        ),
        rule(
            r"(?i)\b(?P<w>yesterday|today|tomorrow|tonight)\b",
            normalize_deictic_day,
        ),
        rule(
            r"(?i)\b(?P<h>\d{1,2})(?::(?P<min>\d{2}))?\s*(?P<ap>[ap])\.?m\b\.?",
            normalize_clock,
        ),
        rule(
            r"(?i)\b(?P<w>recently|lately|nowadays|right\s+now|now|currently)\b",
            normalize_vague_ref,
        ),
        // ── Bare years and months ──
        rule(&format!(r"\b(?P<y>{YEAR})\b"), normalize_year),
        rule(
            &format!(
                r"(?i)\b(?:in|since|during|around|by|until|till|from|of|early|late|mid)[\s-]+(?P<t>(?P<mn>{MONTH_FULL}))\b"
            ),
            normalize_bare_month,
        ),
        // ── Durations ──
        rule(
            &format!(r"(?i)\b(?P<n>{NUM})[\s-]+(?P<u>{UNIT})s?\b"),
            normalize_duration,
        ),
        rule(
            r"(?i)\b(?P<u>day|week|month|year|decade)s\b",
            normalize_bare_duration,
        ),
    ]
});

// ═══════════════════════════════════════════
// Tagger
// ═══════════════════════════════════════════

/// Regex-driven temporal tagger. Stateless; rules are compiled once per process.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleTemporalTagger;

impl RuleTemporalTagger {
    pub fn new() -> Self {
        Self
    }
}

impl TemporalTagger for RuleTemporalTagger {
    fn tag(
        &self,
        text: &str,
        reference: Option<NaiveDate>,
    ) -> Result<Vec<TemporalExpression>, DiagnosisTimeError> {
        let mut found: Vec<TemporalExpression> = Vec::new();

        for rule in TEMPORAL_RULES.iter() {
            for caps in rule.regex.captures_iter(text) {
                let Some(m) = caps.name("t").or_else(|| caps.get(0)) else {
                    continue;
                };
                let (start, end) = (m.start(), m.end());
                if found.iter().any(|e| start < e.end && e.start < end) {
                    continue;
                }
                if let Some((temporal_type, value)) = (rule.normalize)(&caps, reference) {
                    found.push(TemporalExpression {
                        text: m.as_str().to_string(),
                        value,
                        start,
                        end,
                        temporal_type,
                    });
                }
            }
        }

        found.sort_by_key(|e| e.start);
        Ok(found)
    }
}

// ═══════════════════════════════════════════
// Units and quantities
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Day,
    Week,
    Month,
    Year,
    Decade,
}

impl Unit {
    fn parse(word: &str) -> Option<Self> {
        match word.to_lowercase().trim_end_matches('s') {
            "day" => Some(Self::Day),
            "week" => Some(Self::Week),
            "month" => Some(Self::Month),
            "year" => Some(Self::Year),
            "decade" => Some(Self::Decade),
            _ => None,
        }
    }

    /// ISO 8601 duration for `n` units, `PX?` when the quantity is vague.
    /// `None` when the scaled quantity does not fit.
    fn duration(self, n: Option<u32>) -> Option<String> {
        let (scale, letter) = match self {
            Self::Day => (1, 'D'),
            Self::Week => (1, 'W'),
            Self::Month => (1, 'M'),
            Self::Year => (1, 'Y'),
            Self::Decade => (10, 'Y'),
        };
        match n {
            Some(n) => Some(format!("P{}{letter}", n.checked_mul(scale)?)),
            None => Some(format!("PX{letter}")),
        }
    }

    fn shift(self, date: NaiveDate, n: i64) -> Option<NaiveDate> {
        let months = |m: i64| {
            let count = Months::new(u32::try_from(m.unsigned_abs()).ok()?);
            if m >= 0 {
                date.checked_add_months(count)
            } else {
                date.checked_sub_months(count)
            }
        };
        let days = |d: i64| {
            let count = Days::new(d.unsigned_abs());
            if d >= 0 {
                date.checked_add_days(count)
            } else {
                date.checked_sub_days(count)
            }
        };
        match self {
            Self::Day => days(n),
            Self::Week => days(n.checked_mul(7)?),
            Self::Month => months(n),
            Self::Year => months(n.checked_mul(12)?),
            Self::Decade => months(n.checked_mul(120)?),
        }
    }

    /// Render a date at this unit's granularity.
    fn format(self, date: NaiveDate) -> String {
        match self {
            Self::Day => date.format("%Y-%m-%d").to_string(),
            Self::Week => date.format("%G-W%V").to_string(),
            Self::Month => date.format("%Y-%m").to_string(),
            Self::Year => date.format("%Y").to_string(),
            Self::Decade => format!("{}X", date.year() / 10),
        }
    }
}

/// Numeric value of a quantity word; `None` for vague quantities ("a few").
fn quantity(word: &str) -> Option<u32> {
    let normalized = word
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if let Ok(n) = normalized.parse() {
        return Some(n);
    }
    let n = match normalized.as_str() {
        "a" | "an" | "one" => 1,
        "two" | "a couple" | "a couple of" | "couple of" => 2,
        "three" => 3,
        "four" => 4,
        "five" => 5,
        "six" => 6,
        "seven" => 7,
        "eight" => 8,
        "nine" => 9,
        "ten" => 10,
        "eleven" => 11,
        "twelve" => 12,
        "thirteen" => 13,
        "fourteen" => 14,
        "fifteen" => 15,
        "sixteen" => 16,
        "seventeen" => 17,
        "eighteen" => 18,
        "nineteen" => 19,
        "twenty" => 20,
        _ => return None,
    };
    Some(n)
}

fn month_number(name: &str) -> Option<u32> {
    let lower = name.to_lowercase();
    let prefix = lower.get(..3)?;
    let month = match prefix {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn expand_year(raw: &str) -> Option<i32> {
    let year: i32 = raw.parse().ok()?;
    match raw.len() {
        2 if year < 50 => Some(2000 + year),
        2 => Some(1900 + year),
        4 => Some(year),
        _ => None,
    }
}

fn captured_month(caps: &Captures<'_>) -> Option<u32> {
    if let Some(name) = caps.name("mn") {
        return month_number(name.as_str());
    }
    let m: u32 = caps.name("m")?.as_str().parse().ok()?;
    (1..=12).contains(&m).then_some(m)
}

fn season_code(season: &str) -> &'static str {
    match season.to_lowercase().as_str() {
        "spring" => "SP",
        "summer" => "SU",
        "fall" | "autumn" => "FA",
        _ => "WI",
    }
}

fn vague_ref(direction: i64) -> String {
    match direction {
        d if d < 0 => "PAST_REF".to_string(),
        0 => "PRESENT_REF".to_string(),
        _ => "FUTURE_REF".to_string(),
    }
}

// ═══════════════════════════════════════════
// Normalizers
// ═══════════════════════════════════════════

fn normalize_every(caps: &Captures<'_>, _reference: Option<NaiveDate>) -> Normalized {
    let unit_word = caps.name("u")?.as_str().to_lowercase();
    let n = caps.name("n").and_then(|n| quantity(n.as_str())).unwrap_or(1);
    let value = match unit_word.as_str() {
        "day" | "night" | "morning" | "evening" => format!("P{n}D"),
        "week" | "weekend" => format!("P{n}W"),
        "month" => format!("P{n}M"),
        "year" => format!("P{n}Y"),
        weekday => {
            let idx = [
                "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
            ]
            .iter()
            .position(|d| *d == weekday)?;
            format!("XXXX-WXX-{}", idx + 1)
        }
    };
    Some((TemporalType::Set, value))
}

fn normalize_frequency_adverb(caps: &Captures<'_>, _reference: Option<NaiveDate>) -> Normalized {
    let value = match caps.name("w")?.as_str().to_lowercase().as_str() {
        "daily" | "nightly" => "P1D",
        "weekly" => "P1W",
        "monthly" => "P1M",
        _ => "P1Y",
    };
    Some((TemporalType::Set, value.to_string()))
}

fn normalize_times_per(caps: &Captures<'_>, _reference: Option<NaiveDate>) -> Normalized {
    let unit = Unit::parse(caps.name("u")?.as_str())?;
    Some((TemporalType::Set, unit.duration(Some(1))?))
}

fn normalize_ymd(caps: &Captures<'_>, _reference: Option<NaiveDate>) -> Normalized {
    let year = expand_year(caps.name("y")?.as_str())?;
    let month = captured_month(caps)?;
    let day: u32 = caps.name("d")?.as_str().parse().ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some((TemporalType::Date, date.format("%Y-%m-%d").to_string()))
}

fn normalize_year_month(caps: &Captures<'_>, _reference: Option<NaiveDate>) -> Normalized {
    let year = expand_year(caps.name("y")?.as_str())?;
    let month = captured_month(caps)?;
    Some((TemporalType::Date, format!("{year:04}-{month:02}")))
}

fn normalize_month_day(caps: &Captures<'_>, reference: Option<NaiveDate>) -> Normalized {
    let month = captured_month(caps)?;
    let day: u32 = caps.name("d")?.as_str().parse().ok()?;
    let value = match reference {
        Some(r) => NaiveDate::from_ymd_opt(r.year(), month, day)?
            .format("%Y-%m-%d")
            .to_string(),
        None => {
            // Validate against a leap year so Feb 29 is accepted.
            NaiveDate::from_ymd_opt(2000, month, day)?;
            format!("XXXX-{month:02}-{day:02}")
        }
    };
    Some((TemporalType::Date, value))
}

fn normalize_season_year(caps: &Captures<'_>, _reference: Option<NaiveDate>) -> Normalized {
    let year = caps.name("y")?.as_str();
    let season = season_code(caps.name("s")?.as_str());
    Some((TemporalType::Date, format!("{year}-{season}")))
}

fn normalize_relative_season(caps: &Captures<'_>, reference: Option<NaiveDate>) -> Normalized {
    let code = season_code(caps.name("s")?.as_str());
    let rel = caps.name("rel")?.as_str().to_lowercase();
    let Some(r) = reference else {
        let direction = match rel.as_str() {
            "last" => -1,
            "this" => 0,
            _ => 1,
        };
        return Some((TemporalType::Date, vague_ref(direction)));
    };

    // Middle month of each season decides which year "last"/"next" lands in.
    let mid = match code {
        "SP" => 4,
        "SU" => 7,
        "FA" => 10,
        _ => 1,
    };
    let year = match rel.as_str() {
        "last" if mid < r.month() => r.year(),
        "last" => r.year() - 1,
        "next" if mid > r.month() => r.year(),
        "next" => r.year() + 1,
        _ => r.year(),
    };
    Some((TemporalType::Date, format!("{year}-{code}")))
}

fn normalize_decade(caps: &Captures<'_>, _reference: Option<NaiveDate>) -> Normalized {
    let decade = caps.name("dec")?.as_str();
    Some((TemporalType::Date, format!("{decade}X")))
}

fn normalize_ago(caps: &Captures<'_>, reference: Option<NaiveDate>) -> Normalized {
    let unit = Unit::parse(caps.name("u")?.as_str())?;
    let n = quantity(caps.name("n")?.as_str());
    let value = match (reference, n) {
        (Some(r), Some(n)) => unit.format(unit.shift(r, -i64::from(n))?),
        _ => vague_ref(-1),
    };
    Some((TemporalType::Date, value))
}

fn normalize_relative_unit(caps: &Captures<'_>, reference: Option<NaiveDate>) -> Normalized {
    let unit = Unit::parse(caps.name("u")?.as_str())?;
    let rel = caps.name("rel")?.as_str().to_lowercase();
    let has_the = caps.name("the").is_some();

    // "the past two years", "the last year", "next three months" are spans of time
    if let Some(n) = caps.name("n") {
        return Some((TemporalType::Duration, unit.duration(quantity(n.as_str()))?));
    }
    if has_the && rel != "this" {
        return Some((TemporalType::Duration, unit.duration(Some(1))?));
    }

    let direction = match rel.as_str() {
        "last" | "past" | "previous" => -1,
        "this" => 0,
        _ => 1,
    };
    let value = match reference {
        Some(r) => unit.format(unit.shift(r, direction)?),
        None => vague_ref(direction),
    };
    Some((TemporalType::Date, value))
}

fn normalize_part_of_day(caps: &Captures<'_>, reference: Option<NaiveDate>) -> Normalized {
    let part = match caps.name("p")?.as_str().to_lowercase().as_str() {
        "morning" => "MO",
        "afternoon" => "AF",
        "evening" => "EV",
        _ => "NI",
    };
    let offset = match caps.name("rel")?.as_str().to_lowercase().as_str() {
        "last" | "yesterday" => -1,
        "tomorrow" => 1,
        _ => 0,
    };
    let value = match reference {
        Some(r) => format!("{}T{part}", Unit::Day.format(Unit::Day.shift(r, offset)?)),
        None => format!("XXXX-XX-XXT{part}"),
    };
    Some((TemporalType::Time, value))
}

fn normalize_deictic_day(caps: &Captures<'_>, reference: Option<NaiveDate>) -> Normalized {
    let word = caps.name("w")?.as_str().to_lowercase();
    let offset = match word.as_str() {
        "yesterday" => -1,
        "tomorrow" => 1,
        _ => 0,
    };
    let date = match reference {
        Some(r) => Unit::Day.format(Unit::Day.shift(r, offset)?),
        None => vague_ref(offset),
    };
    if word == "tonight" {
        let value = match reference {
            Some(_) => format!("{date}TNI"),
            None => "XXXX-XX-XXTNI".to_string(),
        };
        return Some((TemporalType::Time, value));
    }
    Some((TemporalType::Date, date))
}

fn normalize_clock(caps: &Captures<'_>, reference: Option<NaiveDate>) -> Normalized {
    let hour: u32 = caps.name("h")?.as_str().parse().ok()?;
    let minute: u32 = match caps.name("min") {
        Some(m) => m.as_str().parse().ok()?,
        None => 0,
    };
    if !(1..=12).contains(&hour) || minute > 59 {
        return None;
    }
    let pm = caps.name("ap")?.as_str().eq_ignore_ascii_case("p");
    let hour24 = match (hour, pm) {
        (12, false) => 0,
        (12, true) => 12,
        (h, true) => h + 12,
        (h, false) => h,
    };
    let clock = format!("T{hour24:02}:{minute:02}");
    let value = match reference {
        Some(r) => format!("{}{clock}", r.format("%Y-%m-%d")),
        None => clock,
    };
    Some((TemporalType::Time, value))
}

fn normalize_vague_ref(caps: &Captures<'_>, _reference: Option<NaiveDate>) -> Normalized {
    let word = caps.name("w")?.as_str().to_lowercase();
    let direction = if word == "recently" || word == "lately" { -1 } else { 0 };
    Some((TemporalType::Date, vague_ref(direction)))
}

fn normalize_year(caps: &Captures<'_>, _reference: Option<NaiveDate>) -> Normalized {
    Some((TemporalType::Date, caps.name("y")?.as_str().to_string()))
}

fn normalize_bare_month(caps: &Captures<'_>, reference: Option<NaiveDate>) -> Normalized {
    let month = captured_month(caps)?;
    let value = match reference {
        Some(r) => format!("{:04}-{month:02}", r.year()),
        None => format!("XXXX-{month:02}"),
    };
    Some((TemporalType::Date, value))
}

fn normalize_duration(caps: &Captures<'_>, _reference: Option<NaiveDate>) -> Normalized {
    let unit = Unit::parse(caps.name("u")?.as_str())?;
    let n = quantity(caps.name("n")?.as_str());
    Some((TemporalType::Duration, unit.duration(n)?))
}

fn normalize_bare_duration(caps: &Captures<'_>, _reference: Option<NaiveDate>) -> Normalized {
    let unit = Unit::parse(caps.name("u")?.as_str())?;
    Some((TemporalType::Duration, unit.duration(None)?))
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
