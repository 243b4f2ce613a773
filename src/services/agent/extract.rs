//! Regex-based slot extraction.
//!
//! Every turn runs the same ordered rule table over the utterance. A rule that
//! matches blanks out the text it consumed in a working copy, so later rules
//! never see it again: a phone number cannot turn into a budget and "in the
//! morning" cannot turn into a location.

use std::ops::Range;
use std::sync::OnceLock;

use regex::Regex;

use crate::models::{AgentStep, DraftField};

/// A value pulled out of an utterance for one draft field.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub field: DraftField,
    pub value: String,
}

struct Hit {
    value: String,
    spans: Vec<Range<usize>>,
}

type Matcher = fn(&Patterns, &str) -> Option<Hit>;

/// Evaluated top to bottom; earlier rules win contested text.
const RULES: &[(DraftField, Matcher)] = &[
    (DraftField::ContactChannel, match_contact),
    (DraftField::Budget, match_budget),
    (DraftField::PreferredDate, match_date),
    (DraftField::PreferredTime, match_time),
    (DraftField::PropertyType, match_property),
    (DraftField::Location, match_location),
    (DraftField::ProspectName, match_name),
];

const WEEKDAYS: &[&str] = &[
    "monday",
    "tuesday",
    "wednesday",
    "thursday",
    "friday",
    "saturday",
    "sunday",
];

const MONTHS: &[&str] = &[
    "jan", "january", "feb", "february", "mar", "march", "apr", "april", "may", "jun", "june",
    "jul", "july", "aug", "august", "sep", "sept", "september", "oct", "october", "nov",
    "november", "dec", "december",
];

/// Words that carry no slot content on their own.
const FILLER_WORDS: &[&str] = &[
    "hi", "hello", "hey", "um", "uh", "er", "hmm", "well", "so", "yes", "yeah", "yep", "sure",
    "ok", "okay", "it's", "its", "i'm", "im", "i", "am", "my", "name", "is", "name's", "this",
    "thanks", "thank", "you", "please", "just", "there", "oh", "cool", "great", "alright",
    "right", "good", "perfect", "awesome", "nice",
];

/// Words that end a name or show the phrase after "I'm" is not a name.
const NOT_NAME_WORDS: &[&str] = &[
    "and", "but", "or", "so", "with", "from", "here", "i", "i'm", "im", "a", "an", "the", "in",
    "at", "on", "for", "about", "to", "by", "of", "looking", "interested", "searching",
    "hoping", "trying", "just", "calling", "wondering", "thinking", "not", "very", "really",
    "good", "great", "fine", "ok", "okay", "available", "free", "busy", "new", "ready", "after",
    "also", "still", "currently", "planning", "going", "moving", "selling", "buying",
    "relocating", "there", "sure", "glad", "happy", "excited", "back", "done", "that", "it",
    "what", "me", "my", "your", "reaching", "please", "need", "want", "wanting", "hi", "hello",
    "hey", "yes", "yeah", "no", "thanks", "thank", "you", "is", "was", "be", "tomorrow", "today",
    "um", "uh", "er", "hmm", "well", "oh", "like", "actually",
];

/// Words that close a location phrase.
const LOCATION_STOP_WORDS: &[&str] = &[
    "and", "but", "or", "with", "for", "at", "on", "from", "to", "under", "below", "between",
    "around", "near", "in", "by", "budget", "please", "next", "this", "today", "tomorrow",
    "tonight", "because", "so", "if", "which", "where", "that", "i", "i'm", "we", "my", "me",
    "maybe", "ideally", "preferably", "somewhere", "is", "would", "could", "should",
];

/// Words a place name never starts with.
const NOT_PLACE_WORDS: &[&str] = &[
    "me", "my", "it", "its", "it's", "that", "this", "there", "here", "touch", "person", "mind",
    "general", "particular", "fact", "case", "order", "interested", "looking", "time",
    "advance", "total", "cash", "terms", "you", "your", "us", "our", "about", "then", "now",
    "one", "two", "three", "half", "week", "weeks", "days", "day", "minutes", "hours",
    "morning", "afternoon", "evening", "budget", "phone", "text", "email", "any", "some",
    "all", "which", "what", "whatever", "anywhere", "few", "couple", "several", "bit", "while",
    "moment", "month", "months", "year", "years", "myself", "ourselves", "yourself", "end",
    "beginning", "start", "middle",
];

/// Activities that follow "in" without naming a place.
const NOT_PLACE_VERBS: &[&str] = &[
    "buying", "selling", "renting", "leasing", "moving", "seeing", "viewing", "visiting",
    "touring", "investing", "relocating", "downsizing", "upgrading", "getting", "finding",
    "having", "looking", "checking", "purchasing", "owning",
];

/// A place phrase never contains one of these.
const DURATION_WORDS: &[&str] = &[
    "minute", "minutes", "hour", "hours", "day", "days", "week", "weeks", "fortnight", "month",
    "months", "year", "years", "while", "moment",
];

/// Words a bare answer at the location step never contains.
const NOT_BARE_LOCATION_WORDS: &[&str] = &[
    "i", "i'm", "im", "me", "my", "we", "you", "it", "it's", "also", "need", "needs", "want",
    "like", "is", "are", "be", "not", "no", "yes", "maybe", "don't", "dont", "know", "sure",
    "what", "why", "how", "who", "can", "could", "would", "should", "hmm", "um", "uh",
];

const ARTICLES: &[&str] = &["a", "an", "the"];

/// Framing around a slot value that does not make a remark on its own.
const REMARK_NOISE_WORDS: &[&str] = &[
    "looking", "want", "wants", "like", "would", "i'd", "we'd", "we're", "we", "us", "our",
    "work", "works", "be", "of", "to", "are", "say", "let's", "lets", "how", "does", "do", "can",
    "will", "see", "view", "viewing", "visit", "book", "schedule", "have", "got", "max",
    "maximum", "up", "price", "range", "over", "reach", "contact", "via", "number", "make",
    "change", "instead", "something", "sounds", "prefer", "best", "day", "date", "time", "more",
    "less", "than", "roughly", "approximately", "place", "area", "neighborhood",
    "neighbourhood", "type", "property", "spend", "afford", "go", "come", "coming", "get",
    "know", "either", "probably",
];

struct Patterns {
    email: Regex,
    phone: Regex,
    channel: Regex,
    budget: Regex,
    dates: Vec<Regex>,
    clock_times: Vec<Regex>,
    at_hour: Regex,
    coarse_times: Vec<Regex>,
    property: Regex,
    location_cue: Regex,
    name: Regex,
    acknowledgement: Regex,
    negation: Regex,
}

impl Patterns {
    fn new() -> Self {
        let compile = |pat: &str| Regex::new(pat).expect("Invalid extraction regex");

        let weekday = WEEKDAYS.join("|");
        let month = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";
        let amount = r"\d{1,3}(?:,\d{3})+|\d+(?:\.\d+)?";
        let unit = "thousand|million|grand|mm|k|m";

        Self {
            email: compile(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9-]+(?:\.[A-Za-z0-9-]+)+"),
            phone: compile(r"(?:\+?\d{1,2}[\s.-]?)?\(?\d{3}\)?[\s.-]?\d{3}[\s.-]?\d{4}\b"),
            channel: compile(r"(?i)\b(e-?mail|phone|cell|mobile|call|text|sms|whatsapp)\b"),
            budget: compile(&format!(
                r"(?i)(?P<cur>[$€£])?\s?(?P<num>{amount})\s?(?P<unit>{unit})?\b(?:\s?(?:-|–|to)\s?[$€£]?\s?(?P<num2>{amount})\s?(?P<unit2>{unit})?\b)?"
            )),
            dates: vec![
                compile(r"(?i)\bday after tomorrow\b"),
                compile(&format!(
                    r"(?i)\b(?:next|this|coming)\s+(?:{weekday}|week|weekend)\b"
                )),
                compile(r"(?i)\b(?:today|tomorrow)\b"),
                compile(&format!(r"(?i)\b(?:{weekday}|weekend)\b")),
                compile(&format!(
                    r"(?i)\b(?:{month})\.?\s+\d{{1,2}}(?:st|nd|rd|th)?\b"
                )),
                compile(&format!(
                    r"(?i)\b\d{{1,2}}(?:st|nd|rd|th)?\s+(?:of\s+)?(?:{month})\b"
                )),
                compile(r"\b\d{4}-\d{2}-\d{2}\b"),
                compile(r"\b\d{1,2}[/-]\d{1,2}(?:[/-]\d{2,4})?\b"),
            ],
            clock_times: vec![
                compile(r"(?i)\b\d{1,2}(?::\d{2})?\s?(?:a\.m\.|p\.m\.|(?:am|pm)\b)"),
                compile(r"\b(?:[01]?\d|2[0-3]):[0-5]\d\b"),
                compile(r"(?i)\b(?:noon|midday|midnight)\b"),
            ],
            at_hour: compile(r"(?i)\bat\s+(\d{1,2}(?:\s?o'?clock)?)\b"),
            coarse_times: vec![
                compile(r"(?i)\b(?:(?:early|late|mid)[\s-]?)?(?:morning|afternoon|evening)\b"),
                compile(r"(?i)\btonight\b"),
            ],
            property: compile(
                r"(?i)\b(town\s?houses?|town\s?homes?|condominiums?|condos?|apartments?|flats?|studios?|villas?|duplex(?:es)?|lofts?|penthouses?|bungalows?|cottages?|houses?|homes?|land|plots?|lots?)\b",
            ),
            location_cue: compile(
                r"(?i)\b(?:close to|next to|located in|somewhere (?:in|near|around)|in|near|around|by)\s+",
            ),
            name: compile(
                r"(?i)\b(?:my name is|my name['’]s|name is|name['’]s|this is|i am|i['’]m|im|it['’]s)\s+(\p{L}[\p{L}'\-]*(?:\s+\p{L}[\p{L}'\-]*){0,2})",
            ),
            acknowledgement: compile(
                r"(?i)\b(?:yes|yeah|yep|yup|sure|correct|confirm(?:ed)?|sounds good|looks good|that['’]s right|perfect|ok(?:ay)?|go ahead|book it)\b",
            ),
            negation: compile(r"(?i)\b(?:no|nope|not|don['’]t|dont|wrong|change|wait)\b"),
        }
    }
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(Patterns::new)
}

/// Everything one pass over an utterance produced.
#[derive(Debug, Clone, Default)]
pub struct Extracted {
    pub found: Vec<Extraction>,
    /// The utterance with every consumed span blanked out.
    pub leftover: String,
}

/// Runs the rule table over `utterance`. `step` only scopes the bare-answer
/// fallbacks, which apply when no rule matched anything.
pub fn extract_turn(utterance: &str, step: AgentStep) -> Extracted {
    let p = patterns();
    let mut working = utterance.to_string();
    let mut found = Vec::new();

    for (field, matcher) in RULES {
        if let Some(hit) = matcher(p, &working) {
            for span in &hit.spans {
                blank(&mut working, span);
            }
            found.push(Extraction {
                field: *field,
                value: hit.value,
            });
        }
    }

    if found.is_empty() {
        let fallback = match step {
            AgentStep::Greeting => bare_name(utterance).map(|v| (DraftField::ProspectName, v)),
            AgentStep::CollectLocation => {
                bare_location(utterance).map(|v| (DraftField::Location, v))
            }
            _ => None,
        };
        if let Some((field, value)) = fallback {
            found.push(Extraction { field, value });
            working.clear();
        }
    }

    Extracted {
        found,
        leftover: working,
    }
}

pub fn extract(utterance: &str, step: AgentStep) -> Vec<Extraction> {
    extract_turn(utterance, step).found
}

/// Whether text the rules did not consume still says something, i.e. has at
/// least two words beyond connectives and booking small talk.
pub fn is_remark(leftover: &str) -> bool {
    words(leftover)
        .iter()
        .filter(|w| {
            let w = w.as_str();
            !FILLER_WORDS.contains(&w)
                && !NOT_NAME_WORDS.contains(&w)
                && !LOCATION_STOP_WORDS.contains(&w)
                && !ARTICLES.contains(&w)
                && !REMARK_NOISE_WORDS.contains(&w)
        })
        .count()
        >= 2
}

/// True when the utterance is only greetings, thanks or hesitation.
pub fn is_filler(utterance: &str) -> bool {
    words(utterance).iter().all(|w| FILLER_WORDS.contains(&w.as_str()))
}

/// A plain yes with no negation in it.
pub fn is_acknowledgement(utterance: &str) -> bool {
    let p = patterns();
    p.acknowledgement.is_match(utterance) && !p.negation.is_match(utterance)
}

// ── Matchers ──

fn match_contact(p: &Patterns, text: &str) -> Option<Hit> {
    let mut working = text.to_string();
    let mut spans = Vec::new();

    let value = if let Some(m) = p.email.find(text) {
        Some(("email", m.as_str().to_string(), m.range()))
    } else {
        p.phone
            .find(text)
            .map(|m| ("phone", m.as_str().trim().to_string(), m.range()))
    };
    if let Some((_, _, span)) = &value {
        blank(&mut working, span);
        spans.push(span.clone());
    }

    let keyword = p.channel.captures(&working).and_then(|caps| {
        let m = caps.get(1)?;
        spans.push(m.range());
        Some(canonical_channel(m.as_str()))
    });

    let channel = keyword.or(value.as_ref().map(|(implied, _, _)| *implied))?;
    let value = match value {
        Some((_, v, _)) => format!("{channel}: {v}"),
        None => channel.to_string(),
    };
    Some(Hit { value, spans })
}

fn canonical_channel(keyword: &str) -> &'static str {
    match keyword.to_lowercase().as_str() {
        "email" | "e-mail" => "email",
        "text" | "sms" => "text",
        "whatsapp" => "WhatsApp",
        _ => "phone",
    }
}

fn match_budget(p: &Patterns, text: &str) -> Option<Hit> {
    for caps in p.budget.captures_iter(text) {
        let Some(whole) = caps.get(0) else { continue };
        let has_currency = caps.name("cur").is_some();
        let has_unit = caps.name("unit").is_some() || caps.name("unit2").is_some();

        let accepted = if has_currency || has_unit {
            true
        } else {
            let big_enough = [caps.name("num"), caps.name("num2")]
                .into_iter()
                .flatten()
                .any(|m| is_plausible_price(m.as_str()));
            big_enough && !is_measurement(&text[whole.end()..])
        };

        if accepted {
            let value = whole.as_str().trim();
            if value.is_empty() {
                continue;
            }
            return Some(Hit {
                value: value.to_string(),
                spans: vec![whole.range()],
            });
        }
    }
    None
}

/// A unit-less number reads as a price only from 1000 up, and never when it
/// looks like a year.
fn is_plausible_price(raw: &str) -> bool {
    let digits: String = raw.chars().filter(|c| *c != ',').collect();
    let Ok(amount) = digits.parse::<f64>() else {
        return false;
    };
    let year_like = !raw.contains(',')
        && raw.len() == 4
        && (1900.0..=2099.0).contains(&amount);
    amount >= 1000.0 && !year_like
}

fn is_measurement(rest: &str) -> bool {
    let rest = rest.trim_start().to_lowercase();
    ["sq", "square", "bed", "bath", "br ", "feet", "ft"]
        .iter()
        .any(|unit| rest.starts_with(unit))
}

fn match_date(p: &Patterns, text: &str) -> Option<Hit> {
    let m = leftmost(&p.dates, text)?;
    Some(Hit {
        value: normalize_date(m.as_str()),
        spans: vec![m.range()],
    })
}

fn normalize_date(raw: &str) -> String {
    raw.split_whitespace()
        .map(|w| {
            let lower = w.to_lowercase();
            let bare = lower.trim_end_matches('.');
            if WEEKDAYS.contains(&bare) || MONTHS.contains(&bare) {
                capitalize(&lower)
            } else {
                lower
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn match_time(p: &Patterns, text: &str) -> Option<Hit> {
    if let Some(m) = leftmost(&p.clock_times, text) {
        let value: String = m
            .as_str()
            .to_lowercase()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '.')
            .collect();
        return Some(Hit {
            value,
            spans: vec![m.range()],
        });
    }

    if let Some(caps) = p.at_hour.captures(text) {
        if let (Some(whole), Some(hour)) = (caps.get(0), caps.get(1)) {
            return Some(Hit {
                value: hour.as_str().to_lowercase(),
                spans: vec![whole.range()],
            });
        }
    }

    let m = leftmost(&p.coarse_times, text)?;
    Some(Hit {
        value: m.as_str().to_lowercase(),
        spans: vec![m.range()],
    })
}

fn match_property(p: &Patterns, text: &str) -> Option<Hit> {
    for caps in p.property.captures_iter(text) {
        let Some(m) = caps.get(1) else { continue };
        let word = m.as_str().to_lowercase();
        if word.starts_with("lot") && text[m.end()..].trim_start().to_lowercase().starts_with("of")
        {
            continue;
        }
        return Some(Hit {
            value: canonical_property(&word).to_string(),
            spans: vec![m.range()],
        });
    }
    None
}

fn canonical_property(word: &str) -> &'static str {
    let compact: String = word.chars().filter(|c| !c.is_whitespace()).collect();
    let singular = compact.strip_suffix("es").filter(|s| s.ends_with('x'));
    let singular = singular.unwrap_or_else(|| compact.strip_suffix('s').unwrap_or(&compact));
    match singular {
        "townhouse" | "townhome" => "townhouse",
        "condo" | "condominium" => "condo",
        "apartment" | "flat" => "apartment",
        "studio" => "studio",
        "villa" => "villa",
        "duplex" => "duplex",
        "loft" => "loft",
        "penthouse" => "penthouse",
        "bungalow" => "bungalow",
        "cottage" => "cottage",
        "land" | "plot" => "land",
        "lot" => "lot",
        _ => "house",
    }
}

fn match_location(p: &Patterns, text: &str) -> Option<Hit> {
    for cue in p.location_cue.find_iter(text) {
        let tail = &text[cue.end()..];
        let segment_end = tail
            .find(|c: char| matches!(c, ',' | '.' | ';' | '!' | '?' | '\n'))
            .unwrap_or(tail.len());
        let segment_end = tail[..segment_end].find("  ").unwrap_or(segment_end);
        let segment = &tail[..segment_end];

        let mut taken: Vec<(usize, &str)> = Vec::new();
        for (offset, word) in word_spans(segment) {
            let lower = word.to_lowercase();
            if taken.len() == 5 || LOCATION_STOP_WORDS.contains(&lower.as_str()) {
                break;
            }
            taken.push((offset, word));
        }

        let start = taken
            .iter()
            .position(|(_, w)| !matches!(w.to_lowercase().as_str(), "a" | "an"))
            .unwrap_or(taken.len());
        let mut phrase = &taken[start..];
        while let Some(((_, last), rest)) = phrase.split_last() {
            if !matches!(last.to_lowercase().as_str(), "a" | "an" | "the" | "of") {
                break;
            }
            phrase = rest;
        }
        let Some(&(_, first)) = phrase.first() else {
            continue;
        };
        if first.starts_with(|c: char| c.is_ascii_digit())
            || !is_place_phrase(phrase.iter().map(|(_, w)| *w))
        {
            continue;
        }

        let first_offset = phrase[0].0;
        let (last_offset, last) = phrase[phrase.len() - 1];
        let value_range = cue.end() + first_offset..cue.end() + last_offset + last.len();
        return Some(Hit {
            value: text[value_range.clone()].to_string(),
            spans: vec![cue.start()..value_range.end],
        });
    }
    None
}

fn is_place_phrase<'a>(words: impl Iterator<Item = &'a str>) -> bool {
    let words: Vec<&str> = words.collect();
    let Some(first) = words
        .iter()
        .find(|w| !ARTICLES.contains(&w.to_lowercase().as_str()))
    else {
        return false;
    };
    let lower = first.to_lowercase();
    if NOT_PLACE_WORDS.contains(&lower.as_str())
        || NOT_PLACE_VERBS.contains(&lower.as_str())
        || WEEKDAYS.contains(&lower.as_str())
        || MONTHS.contains(&lower.as_str())
    {
        return false;
    }
    // "in buying", "in renting"; a capitalised word like "Reading" may be a town.
    let lowercase_gerund = lower.len() > 4
        && lower.ends_with("ing")
        && !first.starts_with(|c: char| c.is_uppercase());
    if lowercase_gerund {
        return false;
    }
    !words
        .iter()
        .any(|w| DURATION_WORDS.contains(&w.to_lowercase().as_str()))
}

fn match_name(p: &Patterns, text: &str) -> Option<Hit> {
    for caps in p.name.captures_iter(text) {
        let (Some(whole), Some(cap)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let mut end = cap.start();
        let mut parts = Vec::new();
        for (offset, word) in word_spans(cap.as_str()) {
            if NOT_NAME_WORDS.contains(&word.to_lowercase().as_str()) {
                break;
            }
            parts.push(capitalize(word));
            end = cap.start() + offset + word.len();
        }
        if parts.is_empty() {
            continue;
        }
        return Some(Hit {
            value: parts.join(" "),
            spans: vec![whole.start()..end],
        });
    }
    None
}

// ── Bare-answer fallbacks ──

fn bare_name(utterance: &str) -> Option<String> {
    let parts: Vec<String> = words(utterance)
        .into_iter()
        .filter(|w| !FILLER_WORDS.contains(&w.as_str()))
        .collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }
    let alphabetic = parts
        .iter()
        .all(|w| w.chars().all(|c| c.is_alphabetic() || c == '\'' || c == '-'));
    if !alphabetic || NOT_NAME_WORDS.contains(&parts[0].as_str()) {
        return None;
    }
    Some(
        parts
            .iter()
            .map(|w| capitalize(w))
            .collect::<Vec<_>>()
            .join(" "),
    )
}

fn bare_location(utterance: &str) -> Option<String> {
    let ws = words(utterance);
    if ws.is_empty() || ws.len() > 3 || is_filler(utterance) {
        return None;
    }
    if ws
        .iter()
        .any(|w| NOT_BARE_LOCATION_WORDS.contains(&w.as_str()))
    {
        return None;
    }
    if !is_place_phrase(ws.iter().map(String::as_str)) {
        return None;
    }
    let value = utterance
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation());
    if value.starts_with(|c: char| c.is_alphabetic()) {
        Some(value.to_string())
    } else {
        None
    }
}

// ── Helpers ──

fn leftmost<'t>(regexes: &[Regex], text: &'t str) -> Option<regex::Match<'t>> {
    regexes
        .iter()
        .filter_map(|re| re.find(text))
        .min_by_key(|m| m.start())
}

fn blank(text: &mut String, span: &Range<usize>) {
    let filler = " ".repeat(span.len());
    text.replace_range(span.clone(), &filler);
}

/// Lower-cased words with surrounding punctuation stripped.
fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| c.is_ascii_punctuation() && c != '\'')
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

/// Whitespace-separated words with their byte offsets.
fn word_spans(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push((s, &text[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((s, &text[s..]));
    }
    out
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
