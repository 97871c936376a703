use std::collections::HashMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use crate::models::intent::ParsedIntent;

/// Default conversational room type aliases, seeded for properties that
/// have not configured their own, grounded on
/// `original_source/domain/parsing.py::DEFAULT_ROOM_TYPE_ALIASES`.
/// Properties override or extend this via `room_type_aliases`; see
/// [`crate::repository::rooms::list_room_type_aliases`].
pub const DEFAULT_ALIAS_WORDS: &[(&str, &str)] = &[
    ("casal", "casal"),
    ("duplo", "casal"),
    ("double", "casal"),
    ("suite", "suite"),
    ("suíte", "suite"),
    ("familia", "familia"),
    ("família", "familia"),
    ("family", "familia"),
    ("single", "single"),
    ("solteiro", "single"),
    ("simples", "single"),
    ("triplo", "triplo"),
    ("triple", "triplo"),
    ("luxo", "luxo"),
    ("luxury", "luxo"),
    ("standard", "standard"),
    ("padrão", "standard"),
    ("padrao", "standard"),
];

static DATE_PARTS: &str = r"(\d{1,2})[/\-](\d{1,2})(?:[/\-](\d{4}))?";

static DATE_RANGE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"{DATE_PARTS}\s*(?:a|até|ate|-)\s*{DATE_PARTS}")).unwrap()
});
static DATE_PARTS_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(DATE_PARTS).unwrap());

static GUEST_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(\d+)\s*(?:hóspedes?|hospedes?|pessoas?|pax|adultos?)").unwrap(),
        Regex::new(r"para\s+(\d+)\s*(?:pessoas?|hóspedes?|hospedes?|pax|adultos?)?").unwrap(),
    ]
});

static ADULT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    vec![
        Regex::new(r"(\d+)\s*(?:adultos?|adts?)").unwrap(),
        Regex::new(r"para\s+(\d+)\s*(?:adultos?|adts?)").unwrap(),
    ]
});

static CHILD_COUNT_PATTERNS: Lazy<Vec<Regex>> =
    Lazy::new(|| vec![Regex::new(r"(\d+)\s*(?:crianças?|criancas?|kids?|chd)").unwrap()]);

static CHILDREN_AGES_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:crianças?|criancas?|kids?|chd)\s*(?:de\s+)?(\d{1,2}(?:\s*(?:e|,|\s)\s*\d{1,2})*)\s*(?:anos?)?").unwrap()
});

static STANDALONE_AGES_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(\d{1,2}(?:\s*(?:e|,)\s*\d{1,2})+)\s*(?:anos?)?$").unwrap()
});

static AGE_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*[e,]\s*").unwrap());

fn parse_date(day: &str, month: &str, year: Option<&str>, reference_year: i32) -> Option<NaiveDate> {
    let d: u32 = day.parse().ok()?;
    let m: u32 = month.parse().ok()?;
    let y: i32 = match year {
        Some(y) => y.parse().ok()?,
        None => reference_year,
    };
    if !(1..=31).contains(&d) || !(1..=12).contains(&m) {
        return None;
    }
    NaiveDate::from_ymd_opt(y, m, d)
}

fn extract_dates(text_lower: &str, reference_year: i32) -> (Option<NaiveDate>, Option<NaiveDate>) {
    if let Some(caps) = DATE_RANGE_PATTERN.captures(text_lower) {
        let checkin = parse_date(&caps[1], &caps[2], caps.get(3).map(|m| m.as_str()), reference_year);
        let checkout = parse_date(&caps[4], &caps[5], caps.get(6).map(|m| m.as_str()), reference_year);
        if let (Some(checkin), Some(checkout)) = (checkin, checkout) {
            return (Some(checkin), Some(checkout));
        }
    }

    let matches: Vec<_> = DATE_PARTS_PATTERN.captures_iter(text_lower).collect();
    match matches.len() {
        0 => (None, None),
        1 => {
            let m = &matches[0];
            (parse_date(&m[1], &m[2], m.get(3).map(|x| x.as_str()), reference_year), None)
        }
        _ => {
            let m1 = &matches[0];
            let m2 = &matches[1];
            (
                parse_date(&m1[1], &m1[2], m1.get(3).map(|x| x.as_str()), reference_year),
                parse_date(&m2[1], &m2[2], m2.get(3).map(|x| x.as_str()), reference_year),
            )
        }
    }
}

fn extract_count(text_lower: &str, patterns: &[Regex], max: i32) -> Option<i16> {
    for pattern in patterns {
        if let Some(caps) = pattern.captures(text_lower) {
            if let Ok(count) = caps[1].parse::<i32>() {
                if (1..=max).contains(&count) {
                    return Some(count as i16);
                }
            }
        }
    }
    None
}

fn extract_room_type<'a>(text_lower: &str, aliases: &'a HashMap<String, Uuid>) -> Option<&'a Uuid> {
    let mut keys: Vec<&String> = aliases.keys().collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));
    for alias in keys {
        let pattern = format!(r"\b{}\b", regex::escape(alias));
        if Regex::new(&pattern).ok()?.is_match(text_lower) {
            return aliases.get(alias);
        }
    }
    None
}

fn parse_age_list(raw: &str) -> Option<Vec<i16>> {
    let normalized = AGE_SEPARATOR.replace_all(raw.trim(), " ");
    let mut ages = Vec::new();
    for part in normalized.split_whitespace() {
        let age: i16 = part.parse().ok()?;
        if !(0..=17).contains(&age) {
            return None;
        }
        ages.push(age);
    }
    if ages.is_empty() {
        None
    } else {
        Some(ages)
    }
}

fn extract_children(text: &str) -> (Option<i32>, Option<Vec<i16>>) {
    let text_lower = text.to_lowercase();

    if let Some(caps) = CHILDREN_AGES_PATTERN.captures(&text_lower) {
        if let Some(ages) = parse_age_list(&caps[1]) {
            return (Some(ages.len() as i32), Some(ages));
        }
    }

    if let Some(caps) = STANDALONE_AGES_PATTERN.captures(text.trim()) {
        if let Some(ages) = parse_age_list(&caps[1]) {
            return (Some(ages.len() as i32), Some(ages));
        }
    }

    for pattern in CHILD_COUNT_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(&text_lower) {
            if let Ok(count) = caps[1].parse::<i32>() {
                if (1..=10).contains(&count) {
                    return (Some(count), None);
                }
            }
        }
    }

    (None, None)
}

/// Extracts booking entities from one inbound message. Pure and
/// deterministic: no LLM, no network call, and `text` itself is never
/// retained in the returned value or logged by any caller.
///
/// `room_type_aliases` maps a lowercased alias word to the property's
/// room type id; build it from the property's configured aliases,
/// falling back to [`DEFAULT_ALIAS_WORDS`]'s symbolic keys if the
/// property has not configured its own wording.
pub fn parse_intent(
    text: &str,
    room_type_aliases: &HashMap<String, Uuid>,
    reference_date: NaiveDate,
) -> ParsedIntent {
    let text_lower = text.to_lowercase();

    let (mut checkin, mut checkout) = extract_dates(&text_lower, reference_date.year());
    if let (Some(ci), Some(co)) = (checkin, checkout) {
        if ci >= co {
            checkin = None;
            checkout = None;
        }
    }

    let guest_count = extract_count(&text_lower, &GUEST_PATTERNS, 20);
    let room_type_id = extract_room_type(&text_lower, room_type_aliases).copied();

    let mut adult_count = extract_count(&text_lower, &ADULT_PATTERNS, 20);
    let (child_count_parsed, mut children_ages) = extract_children(text);

    if adult_count.is_none() && guest_count.is_some() && child_count_parsed.is_none() {
        adult_count = guest_count;
    }

    if let (Some(count), Some(ages)) = (child_count_parsed, &children_ages) {
        if ages.len() as i32 != count {
            children_ages = None;
        }
    }

    ParsedIntent {
        checkin,
        checkout,
        room_type_id,
        adult_count,
        children_ages,
    }
}

use chrono::Datelike;

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn aliases() -> HashMap<String, Uuid> {
        let mut map = HashMap::new();
        map.insert("casal".to_string(), Uuid::nil());
        map
    }

    #[test]
    fn parses_a_date_range() {
        let intent = parse_intent("quero do dia 10/02 a 12/02 para 2 adultos", &aliases(), date(2026, 1, 1));
        assert_eq!(intent.checkin, Some(date(2026, 2, 10)));
        assert_eq!(intent.checkout, Some(date(2026, 2, 12)));
        assert_eq!(intent.adult_count, Some(2));
    }

    #[test]
    fn invalid_range_resets_both_dates() {
        let intent = parse_intent("12/02 a 10/02", &aliases(), date(2026, 1, 1));
        assert_eq!(intent.checkin, None);
        assert_eq!(intent.checkout, None);
    }

    #[test]
    fn resolves_room_type_alias_by_word_boundary() {
        let intent = parse_intent("quarto casal por favor", &aliases(), date(2026, 1, 1));
        assert_eq!(intent.room_type_id, Some(Uuid::nil()));
    }

    #[test]
    fn parses_standalone_children_ages() {
        let intent = parse_intent("3 e 7 anos", &aliases(), date(2026, 1, 1));
        assert_eq!(intent.children_ages, Some(vec![3, 7]));
    }

    #[test]
    fn mismatched_child_count_and_ages_forces_reprompt() {
        // "2 criancas" parses a bare count with no ages attached.
        let intent = parse_intent("2 criancas, hospede extra", &aliases(), date(2026, 1, 1));
        assert_eq!(intent.children_ages, None);
    }

    #[test]
    fn guest_count_falls_back_to_adult_count_without_explicit_adults() {
        let intent = parse_intent("somos 3 pessoas", &aliases(), date(2026, 1, 1));
        assert_eq!(intent.adult_count, Some(3));
    }
}
