//! Relative day words used when a date string does not match its format
//!
//! Cinema sites love labelling the first tabs "Heute", "Demain" or "Pojutrze"
//! instead of printing a date. The lists below cover the languages we have
//! seen in the wild; matching is case-insensitive, first on the whole
//! trimmed string and then on word boundaries.

use once_cell::sync::Lazy;
use regex::Regex;

pub const TODAY: &[&str] = &[
    "today", "heute", "aujourd'hui", "aujourd’hui", "hoy", "oggi", "vandaag", "hoje", "dzisiaj", "dziś",
    "dnes", "idag", "i dag", "tänään", "astăzi", "azi", "danes", "danas", "данас", "днес", "сегодня",
    "сьогодні", "σήμερα", "bugün", "šiandien", "šodien", "täna", "tonight", "ce soir", "heute abend",
    "vanavond", "stasera", "esta noche", "hoje à noite", "dzisiaj wieczorem", "i kväll", "i aften", "tänä iltana",
    "היום", "اليوم", "आज", "hôm nay", "วันนี้", "今日", "今天", "오늘", "hari ini",
];

pub const TOMORROW: &[&str] = &[
    "tomorrow", "morgen", "demain", "mañana", "domani", "amanhã", "jutro", "zítra", "zajtra", "imorgon",
    "i morgen", "huomenna", "holnap", "mâine", "jutri", "sutra", "сутра", "утре", "завтра",
    "αύριο", "yarın", "rytoj", "rīt", "מחר", "غدا", "غداً", "कल", "ngày mai", "พรุ่งนี้",
    "明日", "明天", "내일", "besok", "bukas", "kesho",
];

pub const DAY_AFTER_TOMORROW: &[&str] = &[
    "day after tomorrow", "the day after tomorrow", "übermorgen", "après-demain", "après demain",
    "pasado mañana", "dopodomani", "overmorgen", "depois de amanhã", "pojutrze", "pozítří", "pozajtra",
    "i övermorgon", "i overmorgen", "ylihuomenna", "holnapután", "poimâine", "poimaine", "pojutrišnjem",
    "prekosutra", "прекосутра", "вдругиден", "послезавтра", "післязавтра", "μεθαύριο", "öbür gün",
    "yarından sonra", "poryt", "parīt", "ülehomme", "מחרתיים", "بعد غد", "परसों", "ngày kia", "มะรืนนี้",
    "明後日", "あさって", "后天", "後天", "모레", "lusa", "kesho kutwa",
];

/// Compiled matcher for one word list
pub struct RelativeWords {
    words: Vec<String>,
    pattern: Option<Regex>,
}

impl RelativeWords {
    pub fn new(words: &[&str]) -> Self {
        let words: Vec<String> = words.iter().map(|w| w.to_lowercase()).collect();
        let alternation = words.iter().map(|w| regex::escape(w)).collect::<Vec<_>>().join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).ok();
        Self { words, pattern }
    }

    /// Exact trimmed equality first, then a word-boundary search
    pub fn matches(&self, raw: &str) -> bool {
        let normalized = raw.trim().to_lowercase();
        if self.words.iter().any(|w| *w == normalized) {
            return true;
        }
        self.pattern.as_ref().is_some_and(|p| p.is_match(raw))
    }
}

pub static TODAY_WORDS: Lazy<RelativeWords> = Lazy::new(|| RelativeWords::new(TODAY));
pub static TOMORROW_WORDS: Lazy<RelativeWords> = Lazy::new(|| RelativeWords::new(TOMORROW));
pub static DAY_AFTER_TOMORROW_WORDS: Lazy<RelativeWords> = Lazy::new(|| RelativeWords::new(DAY_AFTER_TOMORROW));
