//! Price detection in unstructured text.
//!
//! Finds amounts with a leading or trailing currency (ISO 4217 code or
//! symbol), e.g. `EUR 244.55`, `123,34 €` or `Total:GBP375.14`.

use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::models::reservation::Reservation;

lazy_static! {
    static ref PRICE: Regex = Regex::new(
        r"(?:^|[\s\p{P}])([^\d\s]{1,4})? *(\d(?:[\d,. \u{00a0}\u{202f}]*\d)?) *([^\d\s]{1,4})?(?:[\s\p{P}]|$)"
    ).unwrap();

    static ref BOUNDARY: Regex = Regex::new(r"^[\s\p{P}\p{S}]$").unwrap();
}

/// Circulating ISO 4217 codes recognized as currencies.
const ISO_CODES: &[&str] = &[
    "AED", "ARS", "AUD", "BAM", "BGN", "BHD", "BRL", "CAD", "CHF", "CLP", "CNY", "COP", "CZK",
    "DKK", "EGP", "EUR", "GBP", "GEL", "HKD", "HRK", "HUF", "IDR", "ILS", "INR", "IQD", "IRR",
    "ISK", "JOD", "JPY", "KES", "KRW", "KWD", "KZT", "LYD", "MAD", "MGA", "MKD", "MRU", "MXN",
    "MYR", "NGN", "NOK", "NZD", "OMR", "PEN", "PHP", "PKR", "PLN", "QAR", "RON", "RSD", "RUB",
    "SAR", "SEK", "SGD", "THB", "TND", "TRY", "TWD", "UAH", "USD", "VND", "ZAR",
];

/// Unambiguous currency symbols. `$`, `kr`, `¥` and single letters are
/// shared by several currencies and deliberately absent.
const SYMBOLS: &[(&str, &str)] = &[
    ("€", "EUR"),
    ("£", "GBP"),
    ("円", "JPY"),
    ("Kč", "CZK"),
    ("Kc", "CZK"),
    ("zł", "PLN"),
    ("Ft", "HUF"),
    ("лв", "BGN"),
    ("lei", "RON"),
    ("₹", "INR"),
    ("₽", "RUB"),
    ("₺", "TRY"),
    ("₩", "KRW"),
    ("₴", "UAH"),
    ("₪", "ILS"),
    ("฿", "THB"),
    ("₫", "VND"),
    ("₱", "PHP"),
    ("₦", "NGN"),
    ("₸", "KZT"),
    ("₾", "GEL"),
];

/// Currencies whose subdivision is not 1/100.
const DECIMALS: &[(&str, usize)] = &[
    ("BHD", 3),
    ("CNY", 1),
    ("IQD", 3),
    ("IRR", 0),
    ("KWD", 3),
    ("LYD", 3),
    ("MGA", 1),
    ("MRU", 1),
    ("OMR", 3),
    ("TND", 3),
    ("VND", 1),
];

/// One price found in a text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceMatch {
    /// Byte range of the amount including its currency.
    pub start: usize,
    pub end: usize,
    /// ISO 4217 code.
    pub currency: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CurrencyPosition {
    Prefix,
    Suffix,
}

/// Finds prices in text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PriceFinder;

impl PriceFinder {
    pub fn new() -> Self {
        Self
    }

    /// All prices in `text`, in document order.
    ///
    /// Returns nothing when two candidates overlap, since the text then
    /// cannot be split into prices unambiguously.
    pub fn find_all(&self, text: &str) -> Vec<PriceMatch> {
        let mut results: Vec<PriceMatch> = Vec::new();
        let mut offset = 0;

        while offset <= text.len() {
            let Some(caps) = PRICE.captures_at(text, offset) else {
                break;
            };
            let Some(amount) = caps.get(2) else {
                break;
            };
            // The amount is never empty, so this always moves forward.
            offset = amount.end();

            let leading = caps.get(1).and_then(|m| parse_currency(m.as_str(), CurrencyPosition::Prefix));
            let trailing = caps.get(3).and_then(|m| parse_currency(m.as_str(), CurrencyPosition::Suffix));

            let currency = match (&leading, &trailing) {
                (None, None) => continue,
                (Some(l), Some(t)) if l != t => continue,
                (Some(c), _) | (None, Some(c)) => c.clone(),
            };

            if leading.is_none() {
                let before = text[..amount.start()].chars().next_back();
                if before.is_some_and(|c| !is_boundary_char(c)) {
                    continue;
                }
            }
            if trailing.is_none() {
                let after = text[amount.end()..].chars().next();
                if after.is_some_and(|c| !is_boundary_char(c)) {
                    continue;
                }
            }

            let Some(value) = parse_value(amount.as_str(), &currency) else {
                continue;
            };

            let start = match (&leading, caps.get(1)) {
                (Some(_), Some(m)) => m.start(),
                _ => amount.start(),
            };
            let end = match (&trailing, caps.get(3)) {
                (Some(_), Some(m)) => m.end(),
                _ => amount.end(),
            };

            results.push(PriceMatch {
                start,
                end,
                currency,
                value,
            });
        }

        if results.windows(2).any(|w| w[0].end >= w[1].start) {
            debug!("Overlapping price candidates, discarding {} results", results.len());
            return Vec::new();
        }

        results
    }

    /// The largest price, provided all prices share one currency.
    pub fn find_highest(&self, text: &str) -> Option<PriceMatch> {
        highest(&self.find_all(text))
    }
}

/// True if all results use the same currency. False for no results.
pub fn is_single_currency(results: &[PriceMatch]) -> bool {
    match results.first() {
        Some(first) => results.iter().all(|r| r.currency == first.currency),
        None => false,
    }
}

/// The largest of `results`, or `None` if they mix currencies.
pub fn highest(results: &[PriceMatch]) -> Option<PriceMatch> {
    if !is_single_currency(results) {
        return None;
    }
    results.iter().max_by(|a, b| a.value.cmp(&b.value)).cloned()
}

/// Attach the document's total price to `reservations`.
///
/// Skipped when the attribution is ambiguous: several reservations and
/// several prices. Returns whether a price was applied.
pub fn apply_price(reservations: &mut [Reservation], text: &str) -> bool {
    if reservations.is_empty() {
        return false;
    }

    let prices = PriceFinder::new().find_all(text);
    if reservations.len() > 1 && prices.len() > 1 {
        debug!(
            "Not assigning price: {} reservations, {} prices",
            reservations.len(),
            prices.len()
        );
        return false;
    }

    let Some(price) = highest(&prices) else {
        return false;
    };
    for reservation in reservations.iter_mut() {
        reservation.set_price(price.value, price.currency.clone());
    }
    true
}

fn is_boundary_char(c: char) -> bool {
    if c == '-' {
        return false;
    }
    let mut buf = [0u8; 4];
    c.is_whitespace() || BOUNDARY.is_match(c.encode_utf8(&mut buf))
}

/// Map fullwidth forms (`￡`, `ＥＵＲ`) to their normal counterparts.
fn normalize_symbol(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '\u{ffe1}' => '£',
            '\u{ffe5}' => '¥',
            '\u{ff01}'..='\u{ff5e}' => char::from_u32(c as u32 - 0xfee0).unwrap_or(c),
            _ => c,
        })
        .collect()
}

fn parse_currency(s: &str, position: CurrencyPosition) -> Option<String> {
    let iso = s.trim_matches(is_boundary_char);
    if iso.chars().count() == 3 && ISO_CODES.contains(&iso) {
        return Some(iso.to_string());
    }

    let symbol = normalize_symbol(s);
    if let Some((_, code)) = SYMBOLS.iter().find(|(sym, _)| *sym == symbol) {
        return Some(code.to_string());
    }

    // The symbol may be glued to punctuation, e.g. "*£95.90". Accept that
    // only if exactly one currency fits.
    let mut found: Option<&str> = None;
    for (sym, code) in SYMBOLS {
        let rest = match position {
            CurrencyPosition::Prefix => symbol.strip_suffix(sym).and_then(|r| r.chars().next_back()),
            CurrencyPosition::Suffix => symbol.strip_prefix(sym).and_then(|r| r.chars().next()),
        };
        if !rest.is_some_and(is_boundary_char) {
            continue;
        }
        match found {
            Some(existing) if existing != *code => return None,
            _ => found = Some(*code),
        }
    }
    found.map(str::to_string)
}

fn decimals_for(currency: &str) -> usize {
    DECIMALS
        .iter()
        .find(|(code, _)| *code == currency)
        .map_or(2, |(_, d)| *d)
}

/// Parse an amount such as `1.234,56` or `12 345.67`, validating the
/// separators against each other and the currency's subdivision.
fn parse_value(s: &str, currency: &str) -> Option<Decimal> {
    let chars: Vec<char> = s.chars().collect();
    let (first, last) = (chars.first()?, chars.last()?);
    if !first.is_ascii_digit() || !last.is_ascii_digit() {
        return None;
    }

    // Last non-digit, if it is not a space, may be the decimal separator.
    let mut decimal: Option<(char, usize)> = None;
    for i in (1..chars.len()).rev() {
        if chars[i].is_ascii_digit() {
            continue;
        }
        if !chars[i].is_whitespace() {
            decimal = Some((chars[i], i));
        }
        break;
    }

    let mut group: Option<char> = None;
    let mut last_group: Option<usize> = None;
    for (i, &c) in chars.iter().enumerate() {
        if c.is_ascii_digit() {
            continue;
        }
        if last_group.is_some_and(|g| i - g != 4) {
            return None;
        }
        if decimal.is_some_and(|(_, idx)| idx == i) {
            break;
        }
        if group.is_some_and(|g| g != c) {
            return None;
        }
        last_group = Some(i);
        group = Some(c);
    }

    // Same character as both: it has to be a group separator.
    if let (Some((d, idx)), Some(g)) = (decimal, group) {
        if d == g {
            if chars.len() - idx != 4 {
                return None;
            }
            decimal = None;
        }
    }

    if let Some((d, idx)) = decimal {
        let count = chars.len() - idx - 1;
        let expected = decimals_for(currency);

        if count == expected && count == 3 && group.is_none() {
            // x1000 subdivisions are ambiguous without a group separator
            return None;
        } else if count != expected && count == 3 {
            if group.is_some() {
                return None;
            }
            group = Some(d);
            decimal = None;
        } else if count > expected {
            return None;
        }
    }

    let normalized: String = chars
        .iter()
        .filter(|c| Some(**c) != group)
        .map(|&c| match decimal {
            Some((d, _)) if c == d => '.',
            _ => c,
        })
        .collect();
    normalized.parse().ok()
}
