//! moment-style date formats
//!
//! Scraper configs describe dates with moment tokens (`DD.MM.YYYY`,
//! `dddd, D. MMMM`, `HH:mm`). A [`DateFormat`] compiles such a string once
//! and can then parse input strictly or render a `NaiveDateTime` back out.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Year4,
    Year2,
    MonthName,
    MonthShort,
    Month2,
    Month,
    DayOrdinal,
    Day2,
    Day,
    WeekdayName,
    WeekdayShort,
    WeekdayMin,
    Hour24Padded,
    Hour24,
    Hour12Padded,
    Hour12,
    MinutePadded,
    Minute,
    SecondPadded,
    Second,
    MeridiemUpper,
    MeridiemLower,
}

// Longest tokens first so `YYYY` wins over `YY`
const TOKENS: &[(&str, Token)] = &[
    ("YYYY", Token::Year4),
    ("MMMM", Token::MonthName),
    ("dddd", Token::WeekdayName),
    ("MMM", Token::MonthShort),
    ("ddd", Token::WeekdayShort),
    ("YY", Token::Year2),
    ("MM", Token::Month2),
    ("Do", Token::DayOrdinal),
    ("DD", Token::Day2),
    ("dd", Token::WeekdayMin),
    ("HH", Token::Hour24Padded),
    ("hh", Token::Hour12Padded),
    ("mm", Token::MinutePadded),
    ("ss", Token::SecondPadded),
    ("M", Token::Month),
    ("D", Token::Day),
    ("H", Token::Hour24),
    ("h", Token::Hour12),
    ("m", Token::Minute),
    ("s", Token::Second),
    ("A", Token::MeridiemUpper),
    ("a", Token::MeridiemLower),
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Token(Token),
    Literal(String),
}

/// Month and weekday names of one language
#[derive(Debug)]
pub struct Locale {
    pub code: &'static str,
    months: [&'static str; 12],
    months_genitive: Option<[&'static str; 12]>,
    months_short: [&'static str; 12],
    /// Monday first
    weekdays: [&'static str; 7],
    weekdays_short: [&'static str; 7],
    ordinal: fn(u32) -> String,
}

fn ordinal_english(day: u32) -> String {
    let suffix = match (day % 10, day % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{day}{suffix}")
}

fn ordinal_dot(day: u32) -> String {
    format!("{day}.")
}

fn ordinal_french(day: u32) -> String {
    if day == 1 { "1er".to_string() } else { day.to_string() }
}

fn ordinal_masculine(day: u32) -> String {
    format!("{day}º")
}

fn ordinal_plain(day: u32) -> String {
    day.to_string()
}

static LOCALES: &[Locale] = &[
    Locale {
        code: "en",
        months: [
            "January", "February", "March", "April", "May", "June", "July", "August", "September", "October",
            "November", "December",
        ],
        months_genitive: None,
        months_short: ["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"],
        weekdays: ["Monday", "Tuesday", "Wednesday", "Thursday", "Friday", "Saturday", "Sunday"],
        weekdays_short: ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"],
        ordinal: ordinal_english,
    },
    Locale {
        code: "de",
        months: [
            "Januar", "Februar", "März", "April", "Mai", "Juni", "Juli", "August", "September", "Oktober",
            "November", "Dezember",
        ],
        months_genitive: None,
        months_short: ["Jan", "Feb", "Mär", "Apr", "Mai", "Jun", "Jul", "Aug", "Sep", "Okt", "Nov", "Dez"],
        weekdays: ["Montag", "Dienstag", "Mittwoch", "Donnerstag", "Freitag", "Samstag", "Sonntag"],
        weekdays_short: ["Mo", "Di", "Mi", "Do", "Fr", "Sa", "So"],
        ordinal: ordinal_dot,
    },
    Locale {
        code: "fr",
        months: [
            "janvier", "février", "mars", "avril", "mai", "juin", "juillet", "août", "septembre", "octobre",
            "novembre", "décembre",
        ],
        months_genitive: None,
        months_short: [
            "janv", "févr", "mars", "avr", "mai", "juin", "juil", "août", "sept", "oct", "nov", "déc",
        ],
        weekdays: ["lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche"],
        weekdays_short: ["lun", "mar", "mer", "jeu", "ven", "sam", "dim"],
        ordinal: ordinal_french,
    },
    Locale {
        code: "es",
        months: [
            "enero", "febrero", "marzo", "abril", "mayo", "junio", "julio", "agosto", "septiembre", "octubre",
            "noviembre", "diciembre",
        ],
        months_genitive: None,
        months_short: ["ene", "feb", "mar", "abr", "may", "jun", "jul", "ago", "sep", "oct", "nov", "dic"],
        weekdays: ["lunes", "martes", "miércoles", "jueves", "viernes", "sábado", "domingo"],
        weekdays_short: ["lun", "mar", "mié", "jue", "vie", "sáb", "dom"],
        ordinal: ordinal_masculine,
    },
    Locale {
        code: "it",
        months: [
            "gennaio", "febbraio", "marzo", "aprile", "maggio", "giugno", "luglio", "agosto", "settembre",
            "ottobre", "novembre", "dicembre",
        ],
        months_genitive: None,
        months_short: ["gen", "feb", "mar", "apr", "mag", "giu", "lug", "ago", "set", "ott", "nov", "dic"],
        weekdays: ["lunedì", "martedì", "mercoledì", "giovedì", "venerdì", "sabato", "domenica"],
        weekdays_short: ["lun", "mar", "mer", "gio", "ven", "sab", "dom"],
        ordinal: ordinal_masculine,
    },
    Locale {
        code: "nl",
        months: [
            "januari", "februari", "maart", "april", "mei", "juni", "juli", "augustus", "september", "oktober",
            "november", "december",
        ],
        months_genitive: None,
        months_short: ["jan", "feb", "mrt", "apr", "mei", "jun", "jul", "aug", "sep", "okt", "nov", "dec"],
        weekdays: ["maandag", "dinsdag", "woensdag", "donderdag", "vrijdag", "zaterdag", "zondag"],
        weekdays_short: ["ma", "di", "wo", "do", "vr", "za", "zo"],
        ordinal: ordinal_plain,
    },
    Locale {
        code: "pt",
        months: [
            "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro", "outubro",
            "novembro", "dezembro",
        ],
        months_genitive: None,
        months_short: ["jan", "fev", "mar", "abr", "mai", "jun", "jul", "ago", "set", "out", "nov", "dez"],
        weekdays: [
            "segunda-feira", "terça-feira", "quarta-feira", "quinta-feira", "sexta-feira", "sábado", "domingo",
        ],
        weekdays_short: ["seg", "ter", "qua", "qui", "sex", "sáb", "dom"],
        ordinal: ordinal_masculine,
    },
    Locale {
        code: "pl",
        months: [
            "styczeń", "luty", "marzec", "kwiecień", "maj", "czerwiec", "lipiec", "sierpień", "wrzesień",
            "październik", "listopad", "grudzień",
        ],
        months_genitive: Some([
            "stycznia", "lutego", "marca", "kwietnia", "maja", "czerwca", "lipca", "sierpnia", "września",
            "października", "listopada", "grudnia",
        ]),
        months_short: ["sty", "lut", "mar", "kwi", "maj", "cze", "lip", "sie", "wrz", "paź", "lis", "gru"],
        weekdays: ["poniedziałek", "wtorek", "środa", "czwartek", "piątek", "sobota", "niedziela"],
        weekdays_short: ["pon", "wt", "śr", "czw", "pt", "sob", "nd"],
        ordinal: ordinal_dot,
    },
    Locale {
        code: "cs",
        months: [
            "leden", "únor", "březen", "duben", "květen", "červen", "červenec", "srpen", "září", "říjen",
            "listopad", "prosinec",
        ],
        months_genitive: Some([
            "ledna", "února", "března", "dubna", "května", "června", "července", "srpna", "září", "října",
            "listopadu", "prosince",
        ]),
        months_short: ["led", "úno", "bře", "dub", "kvě", "čvn", "čvc", "srp", "zář", "říj", "lis", "pro"],
        weekdays: ["pondělí", "úterý", "středa", "čtvrtek", "pátek", "sobota", "neděle"],
        weekdays_short: ["po", "út", "st", "čt", "pá", "so", "ne"],
        ordinal: ordinal_dot,
    },
    Locale {
        code: "sv",
        months: [
            "januari", "februari", "mars", "april", "maj", "juni", "juli", "augusti", "september", "oktober",
            "november", "december",
        ],
        months_genitive: None,
        months_short: ["jan", "feb", "mar", "apr", "maj", "jun", "jul", "aug", "sep", "okt", "nov", "dec"],
        weekdays: ["måndag", "tisdag", "onsdag", "torsdag", "fredag", "lördag", "söndag"],
        weekdays_short: ["mån", "tis", "ons", "tor", "fre", "lör", "sön"],
        ordinal: ordinal_dot,
    },
];

/// Look up a locale by code, matching on the language part (`de-AT` -> `de`)
pub fn locale(code: &str) -> &'static Locale {
    let language = code.split(['-', '_']).next().unwrap_or_default().to_lowercase();
    LOCALES.iter().find(|l| l.code == language).unwrap_or_else(|| {
        debug!("Unknown date locale '{}', falling back to en", code);
        &LOCALES[0]
    })
}

impl Locale {
    /// Longest month name (any form) at the start of `input`, as a 1-based month
    fn match_month(&self, input: &str) -> Option<(u32, usize)> {
        let forms = [Some(&self.months), self.months_genitive.as_ref(), Some(&self.months_short)];
        forms
            .into_iter()
            .flatten()
            .flat_map(|names| names.iter().enumerate())
            .filter(|(_, name)| starts_with_ignore_case(input, name))
            .max_by_key(|(_, name)| name.len())
            .map(|(index, name)| (index as u32 + 1, name.len()))
    }
}

fn starts_with_ignore_case(input: &str, prefix: &str) -> bool {
    input
        .get(..prefix.len())
        .is_some_and(|head| head.to_lowercase() == prefix.to_lowercase())
}

#[derive(Debug, Default)]
struct Fields {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    minute: Option<u32>,
    second: Option<u32>,
    pm: Option<bool>,
}

/// A compiled moment-style format string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateFormat {
    source: String,
    parts: Vec<Part>,
}

impl DateFormat {
    pub fn compile(format: &str) -> Self {
        let mut parts: Vec<Part> = Vec::new();
        let mut rest = format;

        while let Some(ch) = rest.chars().next() {
            if ch == '[' {
                if let Some(close) = rest.find(']') {
                    push_literal(&mut parts, &rest[1..close]);
                    rest = &rest[close + 1..];
                    continue;
                }
            }
            if let Some((pattern, token)) = TOKENS.iter().find(|(pattern, _)| rest.starts_with(pattern)) {
                parts.push(Part::Token(*token));
                rest = &rest[pattern.len()..];
            } else {
                push_literal(&mut parts, &rest[..ch.len_utf8()]);
                rest = &rest[ch.len_utf8()..];
            }
        }

        Self {
            source: format.to_string(),
            parts,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether the format carries a year token
    pub fn has_year(&self) -> bool {
        self.parts
            .iter()
            .any(|p| matches!(p, Part::Token(Token::Year4 | Token::Year2)))
    }

    /// Parse `input` against this format.
    ///
    /// Units missing from the format are taken from `now` the way moment
    /// does: a day alone defaults month and year, a month alone defaults the
    /// year and uses the 1st. Trailing non-whitespace input fails the parse.
    pub fn parse(&self, input: &str, locale: &Locale, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut fields = Fields::default();
        let mut pos = 0;

        for (i, part) in self.parts.iter().enumerate() {
            let next_literal = match self.parts.get(i + 1) {
                Some(Part::Literal(text)) => text.chars().next(),
                _ => None,
            };
            pos = match part {
                Part::Literal(text) => match_literal(input, pos, text)?,
                Part::Token(token) => {
                    let start = skip_ws(input, pos);
                    parse_token(*token, input, start, locale, &mut fields, next_literal)?
                }
            };
        }

        if skip_ws(input, pos) != input.len() {
            return None;
        }

        let today = now.date();
        let (year, month, day) = match (fields.year, fields.month, fields.day) {
            (None, None, None) => (today.year(), today.month(), today.day()),
            (year, None, Some(day)) => (year.unwrap_or(today.year()), today.month(), day),
            (year, month, day) => (year.unwrap_or(today.year()), month.unwrap_or(1), day.unwrap_or(1)),
        };

        let mut hour = fields.hour.unwrap_or(0);
        match fields.pm {
            Some(true) if hour < 12 => hour += 12,
            Some(false) if hour == 12 => hour = 0,
            _ => {}
        }

        let date = NaiveDate::from_ymd_opt(year, month, day)?;
        let time = NaiveTime::from_hms_opt(hour, fields.minute.unwrap_or(0), fields.second.unwrap_or(0))?;
        Some(date.and_time(time))
    }

    /// Render `value` with this format
    pub fn format(&self, value: &NaiveDateTime, locale: &Locale) -> String {
        let mut out = String::new();
        for part in &self.parts {
            match part {
                Part::Literal(text) => out.push_str(text),
                Part::Token(token) => out.push_str(&render_token(*token, value, locale)),
            }
        }
        out
    }
}

fn push_literal(parts: &mut Vec<Part>, text: &str) {
    if let Some(Part::Literal(existing)) = parts.last_mut() {
        existing.push_str(text);
    } else {
        parts.push(Part::Literal(text.to_string()));
    }
}

fn skip_ws(input: &str, pos: usize) -> usize {
    input[pos..]
        .char_indices()
        .find(|(_, c)| !c.is_whitespace())
        .map_or(input.len(), |(offset, _)| pos + offset)
}

fn match_literal(input: &str, mut pos: usize, literal: &str) -> Option<usize> {
    for expected in literal.chars() {
        pos = skip_ws(input, pos);
        if expected.is_whitespace() {
            continue;
        }
        let actual = input[pos..].chars().next()?;
        if !actual.to_lowercase().eq(expected.to_lowercase()) {
            return None;
        }
        pos += actual.len_utf8();
    }
    Some(pos)
}

fn read_number(input: &str, pos: usize, max_digits: usize) -> Option<(u32, usize, usize)> {
    let digits = input[pos..]
        .bytes()
        .take(max_digits)
        .take_while(u8::is_ascii_digit)
        .count();
    if digits == 0 {
        return None;
    }
    let value = input[pos..pos + digits].parse().ok()?;
    Some((value, digits, pos + digits))
}

fn two_digit_year(year: u32) -> i32 {
    let year = year as i32;
    if year < 69 { 2000 + year } else { 1900 + year }
}

/// Consume an abbreviation dot unless the format itself expects one next
fn skip_abbreviation_dot(input: &str, pos: usize, next_literal: Option<char>) -> usize {
    if next_literal != Some('.') && input[pos..].starts_with('.') {
        pos + 1
    } else {
        pos
    }
}

fn parse_token(
    token: Token,
    input: &str,
    pos: usize,
    locale: &Locale,
    fields: &mut Fields,
    next_literal: Option<char>,
) -> Option<usize> {
    match token {
        Token::Year4 => {
            let (value, digits, end) = read_number(input, pos, 4)?;
            fields.year = Some(if digits <= 2 { two_digit_year(value) } else { value as i32 });
            Some(end)
        }
        Token::Year2 => {
            let (value, _, end) = read_number(input, pos, 2)?;
            fields.year = Some(two_digit_year(value));
            Some(end)
        }
        Token::Month2 | Token::Month => {
            let (value, _, end) = read_number(input, pos, 2)?;
            fields.month = Some(value);
            Some(end)
        }
        Token::MonthName | Token::MonthShort => {
            let (month, len) = locale.match_month(&input[pos..])?;
            fields.month = Some(month);
            Some(skip_abbreviation_dot(input, pos + len, next_literal))
        }
        Token::Day2 | Token::Day => {
            let (value, _, end) = read_number(input, pos, 2)?;
            fields.day = Some(value);
            Some(end)
        }
        Token::DayOrdinal => {
            let (value, _, end) = read_number(input, pos, 2)?;
            fields.day = Some(value);
            let suffix = input[end..]
                .char_indices()
                .find(|(_, c)| !(c.is_alphabetic() || *c == 'º'))
                .map_or(input.len() - end, |(offset, _)| offset);
            Some(end + suffix)
        }
        Token::WeekdayName | Token::WeekdayShort | Token::WeekdayMin => {
            let len = input[pos..]
                .char_indices()
                .find(|(_, c)| !(c.is_alphabetic() || *c == '-'))
                .map_or(input.len() - pos, |(offset, _)| offset);
            if len == 0 {
                return None;
            }
            Some(skip_abbreviation_dot(input, pos + len, next_literal))
        }
        Token::Hour24Padded | Token::Hour24 | Token::Hour12Padded | Token::Hour12 => {
            let (value, _, end) = read_number(input, pos, 2)?;
            fields.hour = Some(value);
            Some(end)
        }
        Token::MinutePadded | Token::Minute => {
            let (value, _, end) = read_number(input, pos, 2)?;
            fields.minute = Some(value);
            Some(end)
        }
        Token::SecondPadded | Token::Second => {
            let (value, _, end) = read_number(input, pos, 2)?;
            fields.second = Some(value);
            Some(end)
        }
        Token::MeridiemUpper | Token::MeridiemLower => {
            for (marker, pm) in [("a.m.", false), ("p.m.", true), ("am", false), ("pm", true)] {
                if starts_with_ignore_case(&input[pos..], marker) {
                    fields.pm = Some(pm);
                    return Some(pos + marker.len());
                }
            }
            None
        }
    }
}

fn render_token(token: Token, value: &NaiveDateTime, locale: &Locale) -> String {
    let month_index = value.month0() as usize;
    let weekday_index = value.weekday().num_days_from_monday() as usize;
    let hour12 = match value.hour() % 12 {
        0 => 12,
        h => h,
    };
    match token {
        Token::Year4 => format!("{:04}", value.year()),
        Token::Year2 => format!("{:02}", value.year().rem_euclid(100)),
        Token::MonthName => locale.months[month_index].to_string(),
        Token::MonthShort => locale.months_short[month_index].to_string(),
        Token::Month2 => format!("{:02}", value.month()),
        Token::Month => value.month().to_string(),
        Token::DayOrdinal => (locale.ordinal)(value.day()),
        Token::Day2 => format!("{:02}", value.day()),
        Token::Day => value.day().to_string(),
        Token::WeekdayName => locale.weekdays[weekday_index].to_string(),
        Token::WeekdayShort | Token::WeekdayMin => locale.weekdays_short[weekday_index].to_string(),
        Token::Hour24Padded => format!("{:02}", value.hour()),
        Token::Hour24 => value.hour().to_string(),
        Token::Hour12Padded => format!("{hour12:02}"),
        Token::Hour12 => hour12.to_string(),
        Token::MinutePadded => format!("{:02}", value.minute()),
        Token::Minute => value.minute().to_string(),
        Token::SecondPadded => format!("{:02}", value.second()),
        Token::Second => value.second().to_string(),
        Token::MeridiemUpper => (if value.hour() < 12 { "AM" } else { "PM" }).to_string(),
        Token::MeridiemLower => (if value.hour() < 12 { "am" } else { "pm" }).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 11, 15)
            .and_then(|d| d.and_hms_opt(14, 30, 0))
            .unwrap()
    }

    fn ymd_hm(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d).and_then(|d| d.and_hms_opt(h, min, 0)).unwrap()
    }

    #[rstest]
    #[case("DD.MM.YYYY", "en", "24.12.2026", ymd_hm(2026, 12, 24, 0, 0))]
    #[case("DD.MM.YY", "en", "01.02.27", ymd_hm(2027, 2, 1, 0, 0))]
    #[case("D. MMMM YYYY", "de", "3. März 2027", ymd_hm(2027, 3, 3, 0, 0))]
    #[case("dddd, D. MMM YYYY", "de", "Freitag, 4. Dez. 2026", ymd_hm(2026, 12, 4, 0, 0))]
    #[case("D MMMM YYYY HH:mm", "pl", "5 grudnia 2026 20:15", ymd_hm(2026, 12, 5, 20, 15))]
    #[case("D MMMM YYYY", "cs", "1 července 2027", ymd_hm(2027, 7, 1, 0, 0))]
    #[case("MMMM Do YYYY h:mm a", "en", "June 2nd 2027 7:05 pm", ymd_hm(2027, 6, 2, 19, 5))]
    #[case("YYYY-MM-DD[T]HH:mm", "en", "2026-11-20T09:00", ymd_hm(2026, 11, 20, 9, 0))]
    fn test_parse(#[case] format: &str, #[case] code: &str, #[case] input: &str, #[case] expected: NaiveDateTime) {
        let parsed = DateFormat::compile(format).parse(input, locale(code), now());
        assert_eq!(parsed, Some(expected));
    }

    #[rstest]
    #[case("DD.MM", "Today")]
    #[case("DD.MM.YYYY", "31.02.2026")]
    #[case("DD.MM", "25.12 extra")]
    #[case("HH:mm", "25:00")]
    fn test_parse_rejects(#[case] format: &str, #[case] input: &str) {
        assert_eq!(DateFormat::compile(format).parse(input, locale("en"), now()), None);
    }

    #[test]
    fn test_missing_units_default_from_now() {
        let day_only = DateFormat::compile("D").parse("3", locale("en"), now());
        assert_eq!(day_only, Some(ymd_hm(2026, 11, 3, 0, 0)));

        let month_only = DateFormat::compile("MMMM").parse("March", locale("en"), now());
        assert_eq!(month_only, Some(ymd_hm(2026, 3, 1, 0, 0)));

        let time_only = DateFormat::compile("HH:mm").parse("18:45", locale("en"), now());
        assert_eq!(time_only, Some(ymd_hm(2026, 11, 15, 18, 45)));
    }

    #[test]
    fn test_has_year() {
        assert!(DateFormat::compile("DD.MM.YYYY").has_year());
        assert!(DateFormat::compile("DD/MM/YY").has_year());
        assert!(!DateFormat::compile("DD.MM").has_year());
        assert!(!DateFormat::compile("[Year] DD.MM").has_year());
    }

    #[test]
    fn test_format() {
        let value = ymd_hm(2026, 12, 25, 20, 5);
        assert_eq!(DateFormat::compile("YYYY-MM-DD").format(&value, locale("en")), "2026-12-25");
        assert_eq!(
            DateFormat::compile("dddd, Do MMMM").format(&value, locale("en")),
            "Friday, 25th December"
        );
        assert_eq!(DateFormat::compile("ddd D. MMM").format(&value, locale("de-AT")), "Fr 25. Dez");
        assert_eq!(DateFormat::compile("hh:mm A").format(&value, locale("en")), "08:05 PM");
    }

    #[test]
    fn test_unknown_locale_falls_back_to_english() {
        assert_eq!(locale("tlh").code, "en");
        assert_eq!(locale("fr_CH").code, "fr");
    }
}
