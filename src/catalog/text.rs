//! Value normalization and collation for catalog attributes.

use std::cmp::Ordering;

/// Characters separating the values of a multi-valued field.
const VALUE_DELIMITERS: [char; 9] = ['/', '|', '·', '•', '，', '、', '・', '／', ','];

/// Division rules, checked in order; the first substring hit wins.
/// "번역" must precede "국내"/"국외" since free text often carries both.
const DIVISION_RULES: [(&[&str], &str); 4] = [
	(&["번역"], "번역서"),
	(&["원서"], "원서"),
	(&["국외", "해외"], "국외서"),
	(&["국내"], "국내서"),
];

/// Trimmed value, or `None` when blank.
pub fn clean(value: Option<&str>) -> Option<&str> {
	value.map(str::trim).filter(|v| !v.is_empty())
}

/// Split a multi-valued field into trimmed, non-empty tokens.
///
/// Tokens keep their input order and are not deduplicated here.
pub fn split_values(raw: &str) -> Vec<&str> {
	raw.split(|c: char| VALUE_DELIMITERS.contains(&c))
		.map(str::trim)
		.filter(|t| !t.is_empty())
		.collect()
}

/// Map a free-text division onto the closed edition vocabulary.
pub fn normalize_division(raw: &str) -> Option<String> {
	let raw = raw.trim();
	if raw.is_empty() {
		return None;
	}
	let normalized = DIVISION_RULES
		.iter()
		.find(|(needles, _)| needles.iter().any(|n| raw.contains(n)))
		.map(|(_, label)| *label)
		.unwrap_or(raw);
	Some(normalized.to_string())
}

/// Primary weight of one collation element.
///
/// Variant order is the script order of Korean collation: spacing and
/// punctuation, then numbers, Hangul, Hanja, Latin, and everything else.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum Weight {
	Space(char),
	Symbol(char),
	/// Digit run by magnitude: significant digit count, then the digits.
	Number(usize, String),
	Hangul(char),
	Han(char),
	Latin(char),
	Other(char),
}

fn is_hangul(c: char) -> bool {
	matches!(c, '\u{AC00}'..='\u{D7A3}' | '\u{1100}'..='\u{11FF}' | '\u{3130}'..='\u{318F}')
}

fn is_han(c: char) -> bool {
	matches!(c, '\u{4E00}'..='\u{9FFF}' | '\u{3400}'..='\u{4DBF}' | '\u{F900}'..='\u{FAFF}')
}

fn weight(c: char) -> Weight {
	if c.is_whitespace() {
		Weight::Space(' ')
	} else if is_hangul(c) {
		Weight::Hangul(c)
	} else if is_han(c) {
		Weight::Han(c)
	} else if c.is_alphabetic() && (c.is_ascii() || ('\u{00C0}'..='\u{024F}').contains(&c)) {
		Weight::Latin(fold(c))
	} else if c.is_alphanumeric() {
		Weight::Other(fold(c))
	} else {
		Weight::Symbol(c)
	}
}

fn primary_key(s: &str) -> Vec<Weight> {
	let mut key = Vec::new();
	let mut chars = s.chars().peekable();
	while let Some(&c) = chars.peek() {
		if c.is_ascii_digit() {
			let mut run = String::new();
			while let Some(d) = chars.next_if(char::is_ascii_digit) {
				run.push(d);
			}
			let digits = run.trim_start_matches('0').to_string();
			key.push(Weight::Number(digits.len(), digits));
		} else {
			key.push(weight(c));
			chars.next();
		}
	}
	key
}

/// Case of each letter: lowercase first.
fn case_key(s: &str) -> Vec<bool> {
	s.chars().filter(|c| c.is_alphabetic()).map(char::is_uppercase).collect()
}

/// Korean, numeric-aware ordering for facet values.
///
/// Compared level by level: script and letter (Hangul before Latin, digit
/// runs by value so "2단계" precedes "10단계", spacing before letters), then
/// letter case with lowercase first, then raw code points so that distinct
/// strings never compare equal.
pub fn collate(a: &str, b: &str) -> Ordering {
	primary_key(a)
		.cmp(&primary_key(b))
		.then_with(|| case_key(a).cmp(&case_key(b)))
		.then_with(|| a.cmp(b))
}

fn fold(c: char) -> char {
	c.to_lowercase().next().unwrap_or(c)
}
