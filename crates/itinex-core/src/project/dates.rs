//! Locale-aware date parsing.

use std::collections::HashMap;

use chrono::format::ParseErrorKind;
use chrono::{Datelike, NaiveDate, NaiveDateTime, ParseError};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

/// Month names of one language, mapped to month numbers.
#[derive(Debug)]
pub struct Locale {
    code: &'static str,
    months: HashMap<String, u32>,
    names: Regex,
}

const EN: &[(&str, u32)] = &[
    ("january", 1), ("jan", 1), ("february", 2), ("feb", 2), ("march", 3), ("mar", 3),
    ("april", 4), ("apr", 4), ("may", 5), ("june", 6), ("jun", 6), ("july", 7), ("jul", 7),
    ("august", 8), ("aug", 8), ("september", 9), ("sept", 9), ("sep", 9),
    ("october", 10), ("oct", 10), ("november", 11), ("nov", 11), ("december", 12), ("dec", 12),
];

const DE: &[(&str, u32)] = &[
    ("januar", 1), ("jänner", 1), ("jan", 1), ("februar", 2), ("feb", 2), ("märz", 3),
    ("mär", 3), ("mrz", 3), ("april", 4), ("apr", 4), ("mai", 5), ("juni", 6), ("jun", 6),
    ("juli", 7), ("jul", 7), ("august", 8), ("aug", 8), ("september", 9), ("sept", 9),
    ("sep", 9), ("oktober", 10), ("okt", 10), ("november", 11), ("nov", 11),
    ("dezember", 12), ("dez", 12),
];

const FR: &[(&str, u32)] = &[
    ("janvier", 1), ("janv", 1), ("février", 2), ("févr", 2), ("fév", 2), ("mars", 3),
    ("avril", 4), ("avr", 4), ("mai", 5), ("juin", 6), ("juillet", 7), ("juil", 7),
    ("août", 8), ("septembre", 9), ("sept", 9), ("octobre", 10), ("oct", 10),
    ("novembre", 11), ("nov", 11), ("décembre", 12), ("déc", 12),
];

// Nominative and genitive forms.
const CS: &[(&str, u32)] = &[
    ("leden", 1), ("ledna", 1), ("únor", 2), ("února", 2), ("březen", 3), ("března", 3),
    ("duben", 4), ("dubna", 4), ("květen", 5), ("května", 5), ("červen", 6), ("června", 6),
    ("červenec", 7), ("července", 7), ("srpen", 8), ("srpna", 8), ("září", 9),
    ("říjen", 10), ("října", 10), ("listopad", 11), ("listopadu", 11),
    ("prosinec", 12), ("prosince", 12),
];

const PL: &[(&str, u32)] = &[
    ("styczeń", 1), ("stycznia", 1), ("sty", 1), ("luty", 2), ("lutego", 2), ("lut", 2),
    ("marzec", 3), ("marca", 3), ("mar", 3), ("kwiecień", 4), ("kwietnia", 4), ("kwi", 4),
    ("maj", 5), ("maja", 5), ("czerwiec", 6), ("czerwca", 6), ("cze", 6),
    ("lipiec", 7), ("lipca", 7), ("lip", 7), ("sierpień", 8), ("sierpnia", 8), ("sie", 8),
    ("wrzesień", 9), ("września", 9), ("wrz", 9), ("październik", 10), ("października", 10),
    ("paź", 10), ("listopad", 11), ("listopada", 11), ("lis", 11), ("grudzień", 12),
    ("grudnia", 12), ("gru", 12),
];

const ES: &[(&str, u32)] = &[
    ("enero", 1), ("ene", 1), ("febrero", 2), ("feb", 2), ("marzo", 3), ("mar", 3),
    ("abril", 4), ("abr", 4), ("mayo", 5), ("may", 5), ("junio", 6), ("jun", 6),
    ("julio", 7), ("jul", 7), ("agosto", 8), ("ago", 8), ("septiembre", 9),
    ("setiembre", 9), ("sept", 9), ("sep", 9), ("octubre", 10), ("oct", 10),
    ("noviembre", 11), ("nov", 11), ("diciembre", 12), ("dic", 12),
];

const IT: &[(&str, u32)] = &[
    ("gennaio", 1), ("gen", 1), ("febbraio", 2), ("feb", 2), ("marzo", 3), ("mar", 3),
    ("aprile", 4), ("apr", 4), ("maggio", 5), ("mag", 5), ("giugno", 6), ("giu", 6),
    ("luglio", 7), ("lug", 7), ("agosto", 8), ("ago", 8), ("settembre", 9), ("set", 9),
    ("ottobre", 10), ("ott", 10), ("novembre", 11), ("nov", 11), ("dicembre", 12), ("dic", 12),
];

const NL: &[(&str, u32)] = &[
    ("januari", 1), ("jan", 1), ("februari", 2), ("feb", 2), ("maart", 3), ("mrt", 3),
    ("april", 4), ("apr", 4), ("mei", 5), ("juni", 6), ("jun", 6), ("juli", 7), ("jul", 7),
    ("augustus", 8), ("aug", 8), ("september", 9), ("sep", 9), ("oktober", 10), ("okt", 10),
    ("november", 11), ("nov", 11), ("december", 12), ("dec", 12),
];

lazy_static! {
    static ref LOCALES: Vec<Locale> = vec![
        Locale::build("en", EN),
        Locale::build("de", DE),
        Locale::build("fr", FR),
        Locale::build("cs", CS),
        Locale::build("pl", PL),
        Locale::build("es", ES),
        Locale::build("it", IT),
        Locale::build("nl", NL),
    ];
}

impl Locale {
    fn build(code: &'static str, table: &[(&str, u32)]) -> Self {
        let months: HashMap<String, u32> = table
            .iter()
            .map(|(name, month)| (name.to_string(), *month))
            .collect();

        // Longest first so "červenec" wins over "červen".
        let mut names: Vec<&str> = table.iter().map(|(name, _)| *name).collect();
        names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
        let alternation = names
            .iter()
            .map(|n| regex::escape(n))
            .collect::<Vec<_>>()
            .join("|");

        Self {
            code,
            months,
            // Built from escaped literals only.
            names: Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).unwrap(),
        }
    }

    /// Look up a built-in locale by code (`en`, `de`, ...). Region suffixes
    /// such as `de-AT` resolve to the language.
    pub fn get(code: &str) -> Option<&'static Locale> {
        let lang = code.split(['-', '_']).next().unwrap_or(code).to_lowercase();
        LOCALES.iter().find(|l| l.code == lang)
    }

    /// English, used when a profile names no locale.
    pub fn english() -> &'static Locale {
        &LOCALES[0]
    }

    /// Codes of all built-in locales.
    pub fn supported() -> Vec<&'static str> {
        LOCALES.iter().map(|l| l.code).collect()
    }

    pub fn code(&self) -> &'static str {
        self.code
    }

    /// Month number for a (case-insensitive) month name.
    pub fn month(&self, name: &str) -> Option<u32> {
        self.months.get(&name.to_lowercase()).copied()
    }

    /// Replace every month name in `input` by its two-digit number.
    pub fn replace_months(&self, input: &str) -> String {
        self.names
            .replace_all(input, |caps: &Captures| match self.month(&caps[0]) {
                Some(m) => format!("{m:02}"),
                None => caps[0].to_string(),
            })
            .into_owned()
    }
}

/// Parse `input` with a chrono `format`, translating month names first.
///
/// `%b` and `%B` in the format are read as month numbers once the names
/// have been replaced. A format without time fields yields midnight.
pub fn parse_datetime(input: &str, format: &str, locale: &Locale) -> Result<NaiveDateTime, ParseError> {
    let input = locale.replace_months(input.trim());
    let format = numeric_month_format(format);

    match NaiveDateTime::parse_from_str(&input, &format) {
        Ok(dt) => Ok(dt),
        Err(e) if e.kind() == ParseErrorKind::NotEnough => NaiveDate::parse_from_str(&input, &format)
            .map(|d| d.and_time(chrono::NaiveTime::MIN))
            .map_err(|_| e),
        Err(e) => Err(e),
    }
}

/// Date-only variant of [`parse_datetime`].
pub fn parse_date(input: &str, format: &str, locale: &Locale) -> Result<NaiveDate, ParseError> {
    let input = locale.replace_months(input.trim());
    NaiveDate::parse_from_str(&input, &numeric_month_format(format))
}

fn numeric_month_format(format: &str) -> String {
    format.replace("%B", "%m").replace("%b", "%m").replace("%h", "%m")
}

/// Year of the first occurrence of `day`.`month` on or after `reference`.
///
/// Used for tickets that print the travel date without a year: the trip
/// happens in the purchase year unless that date already lies in the past,
/// in which case it is next year's.
pub fn infer_year(day: u32, month: u32, reference: NaiveDate) -> i32 {
    if reference.month() < month || (reference.month() == month && reference.day() <= day) {
        reference.year()
    } else {
        reference.year() + 1
    }
}

/// Expand a two-digit year: 00-50 are 2000s, 51-99 are 1900s.
pub fn parse_year(s: &str) -> Option<i32> {
    let year: i32 = s.trim().parse().ok()?;
    Some(match year {
        0..=50 => 2000 + year,
        51..=99 => 1900 + year,
        _ => year,
    })
}
