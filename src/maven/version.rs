use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

use crate::error::Result;

const SNAPSHOT: &str = "SNAPSHOT";

/// A Maven-style version: dot separated numeric components, optionally followed by a
///  qualifier (`1.4-SNAPSHOT`, `2.0.0-beta`, `1.0.RC1`).
///
/// Ordering compares numeric components first (missing trailing components count as zero, so
///  `2.3` equals `2.3.0`). If those are equal, a release is higher than any qualified version,
///  and two qualifiers are compared token by token.
#[derive(Clone, Debug)]
pub struct Version {
    raw: String,
    numeric: Vec<u64>,
    qualifier: Option<String>,
}

impl Version {
    pub fn parse(version: &str) -> Version {
        let raw = version.trim();

        let (numeric_part, dash_qualifier) = match raw.find('-') {
            Some(idx) => (&raw[..idx], Some(&raw[idx+1..])),
            None => (raw, None),
        };

        let mut numeric = Vec::new();
        let mut leftover: Option<String> = None;

        let components: Vec<&str> = if numeric_part.is_empty() { vec![] } else { numeric_part.split('.').collect() };
        for (idx, component) in components.iter().enumerate() {
            let digits_len = component.chars().take_while(|c| c.is_ascii_digit()).count();
            if digits_len == component.len() && digits_len > 0 {
                if let Ok(n) = component.parse::<u64>() {
                    numeric.push(n);
                    continue;
                }
            }
            else if digits_len > 0 {
                // e.g. '0alpha'
                if let Ok(n) = component[..digits_len].parse::<u64>() {
                    numeric.push(n);
                    let mut rest = vec![&component[digits_len..]];
                    rest.extend_from_slice(&components[idx+1..]);
                    leftover = Some(rest.join("."));
                    break;
                }
            }
            leftover = Some(components[idx..].join("."));
            break;
        }

        let qualifier = match (leftover, dash_qualifier) {
            (None, None) => None,
            (Some(l), None) => Some(l),
            (None, Some(q)) => Some(q.to_string()),
            (Some(l), Some(q)) => Some(format!("{}-{}", l, q)),
        };

        Version {
            raw: raw.to_string(),
            numeric,
            qualifier: qualifier.filter(|q| !q.is_empty()),
        }
    }

    /// Extracts the version part from an artifact file name like `appui-1.2.omod` or
    ///  `appui-1.3-SNAPSHOT.omod`.
    pub fn parse_version_from_file(file_name: &str) -> Result<String> {
        crate::maven::paths::version_from_file_name(file_name)
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn qualifier(&self) -> Option<&str> {
        self.qualifier.as_deref()
    }

    pub fn major(&self) -> u64 {
        self.numeric.first().copied().unwrap_or(0)
    }

    pub fn minor(&self) -> u64 {
        self.numeric.get(1).copied().unwrap_or(0)
    }

    pub fn incremental(&self) -> u64 {
        self.numeric.get(2).copied().unwrap_or(0)
    }

    pub fn is_snapshot(&self) -> bool {
        self.qualifier.as_deref().map(|q| q.contains(SNAPSHOT)).unwrap_or(false)
    }

    pub fn is_alpha(&self) -> bool {
        self.qualifier.as_deref().map(|q| q.to_lowercase().contains("alpha")).unwrap_or(false)
    }

    pub fn is_beta(&self) -> bool {
        self.qualifier.as_deref().map(|q| q.to_lowercase().contains("beta")).unwrap_or(false)
    }

    pub fn lower(&self, that: &Version) -> bool {
        self.cmp(that) == Ordering::Less
    }

    pub fn equal(&self, that: &Version) -> bool {
        self.cmp(that) == Ordering::Equal
    }

    pub fn higher(&self, that: &Version) -> bool {
        self.cmp(that) == Ordering::Greater
    }

    fn compare_numeric(&self, other: &Version) -> Ordering {
        let len = self.numeric.len().max(other.numeric.len());
        for i in 0..len {
            let a = self.numeric.get(i).copied().unwrap_or(0);
            let b = other.numeric.get(i).copied().unwrap_or(0);
            match a.cmp(&b) {
                Ordering::Equal => {}
                unequal => return unequal,
            }
        }
        Ordering::Equal
    }
}

#[derive(Debug, PartialEq, Eq)]
enum QualifierToken {
    Number(u64),
    Word(String),
}

impl QualifierToken {
    /// well-known pre-release markers in ascending order, anything else sorts after them
    fn word_rank(word: &str) -> u8 {
        match word {
            "alpha" | "a" => 0,
            "beta" | "b" => 1,
            "milestone" | "m" => 2,
            "rc" | "cr" => 3,
            "snapshot" => 4,
            _ => 5,
        }
    }
}

impl Ord for QualifierToken {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (QualifierToken::Number(a), QualifierToken::Number(b)) => a.cmp(b),
            (QualifierToken::Number(_), QualifierToken::Word(_)) => Ordering::Greater,
            (QualifierToken::Word(_), QualifierToken::Number(_)) => Ordering::Less,
            (QualifierToken::Word(a), QualifierToken::Word(b)) => {
                QualifierToken::word_rank(a).cmp(&QualifierToken::word_rank(b))
                    .then_with(|| a.cmp(b))
            }
        }
    }
}
impl PartialOrd for QualifierToken {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

fn flush_token(current: &mut String, is_digit: bool, result: &mut Vec<QualifierToken>) {
    if current.is_empty() {
        return;
    }
    let token = if is_digit {
        match current.parse::<u64>() {
            Ok(n) => QualifierToken::Number(n),
            Err(_) => QualifierToken::Word(current.clone()),
        }
    }
    else {
        QualifierToken::Word(current.to_lowercase())
    };
    result.push(token);
    current.clear();
}

/// splits on '.' and '-' as well as on transitions between digits and letters ('RC1' -> rc, 1)
fn tokenize_qualifier(qualifier: &str) -> Vec<QualifierToken> {
    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_is_digit = false;

    for c in qualifier.chars() {
        if c == '.' || c == '-' {
            flush_token(&mut current, current_is_digit, &mut result);
            continue;
        }
        let is_digit = c.is_ascii_digit();
        if !current.is_empty() && is_digit != current_is_digit {
            flush_token(&mut current, current_is_digit, &mut result);
        }
        current_is_digit = is_digit;
        current.push(c);
    }
    flush_token(&mut current, current_is_digit, &mut result);
    result
}

fn compare_qualifiers(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => tokenize_qualifier(a).cmp(&tokenize_qualifier(b)),
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare_numeric(other)
            .then_with(|| compare_qualifiers(self.qualifier(), other.qualifier()))
    }
}
impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Version {}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Version {
    fn from(value: &str) -> Self {
        Version::parse(value)
    }
}

#[cfg(test)]
mod test {
    use rstest::*;
    use super::*;

    #[rstest]
    #[case::plain("2.3.1", vec![2, 3, 1], None)]
    #[case::snapshot("1.4-SNAPSHOT", vec![1, 4], Some("SNAPSHOT"))]
    #[case::dotted_qualifier("1.0.RC1", vec![1, 0], Some("RC1"))]
    #[case::glued_qualifier("2.0alpha", vec![2, 0], Some("alpha"))]
    #[case::multi_dash("2.0.0-beta-2", vec![2, 0, 0], Some("beta-2"))]
    #[case::no_numbers("next", vec![], Some("next"))]
    #[case::whitespace(" 1.2 ", vec![1, 2], None)]
    fn test_parse(#[case] raw: &str, #[case] numeric: Vec<u64>, #[case] qualifier: Option<&str>) {
        let version = Version::parse(raw);
        assert_eq!(version.numeric, numeric);
        assert_eq!(version.qualifier(), qualifier);
    }

    #[rstest]
    #[case::snapshot_below_release("1.4-SNAPSHOT", "1.4", Ordering::Less)]
    #[case::more_components("2.3.1", "2.3", Ordering::Greater)]
    #[case::trailing_zero("2.3", "2.3.0", Ordering::Equal)]
    #[case::numeric_not_lexicographic("1.10", "1.9", Ordering::Greater)]
    #[case::numeric_dominates_qualifier("1.5-SNAPSHOT", "1.4", Ordering::Greater)]
    #[case::alpha_below_beta("2.0.0-alpha", "2.0.0-beta", Ordering::Less)]
    #[case::beta_below_rc("2.0.0-beta", "2.0.0-rc1", Ordering::Less)]
    #[case::rc_below_snapshot("2.0.0-RC1", "2.0.0-SNAPSHOT", Ordering::Less)]
    #[case::beta_numbers("2.0.0-beta-2", "2.0.0-beta-10", Ordering::Less)]
    #[case::release_above_beta("2.0.0", "2.0.0-beta", Ordering::Greater)]
    #[case::same_snapshot("0.1-SNAPSHOT", "0.1-SNAPSHOT", Ordering::Equal)]
    #[case::unknown_words("1.0-foo", "1.0-bar", Ordering::Greater)]
    fn test_compare(#[case] a: &str, #[case] b: &str, #[case] expected: Ordering) {
        let a = Version::parse(a);
        let b = Version::parse(b);
        assert_eq!(a.cmp(&b), expected);
        assert_eq!(b.cmp(&a), expected.reverse());
    }

    #[test]
    fn test_exactly_one_relation_holds() {
        let versions = ["1.4-SNAPSHOT", "1.4", "2.3", "2.3.0", "2.3.1", "1.0.RC1", "1.0-beta", "0.1", "next", "10.7"];
        for a in versions {
            for b in versions {
                let a = Version::parse(a);
                let b = Version::parse(b);
                let relations = [a.lower(&b), a.equal(&b), a.higher(&b)];
                assert_eq!(relations.iter().filter(|r| **r).count(), 1, "{} vs {}", a, b);
                assert_eq!(a.equal(&b), a == b);
            }
        }
    }

    #[test]
    fn test_ordering_is_transitive() {
        let mut versions: Vec<Version> = ["2.3.1", "1.4", "1.4-SNAPSHOT", "2.3", "1.0.RC1", "1.0-beta", "1.0", "0.9.9"]
            .iter()
            .map(|v| Version::parse(v))
            .collect();
        versions.sort();
        let sorted: Vec<&str> = versions.iter().map(|v| v.as_str()).collect();
        assert_eq!(sorted, vec!["0.9.9", "1.0-beta", "1.0.RC1", "1.0", "1.4-SNAPSHOT", "1.4", "2.3", "2.3.1"]);
        for window in versions.windows(3) {
            assert!(window[0] <= window[2]);
        }
    }

    #[rstest]
    #[case::snapshot("1.4-SNAPSHOT", true)]
    #[case::timestamped_like("1.4-SNAPSHOT-1", true)]
    #[case::lowercase("1.4-snapshot", false)]
    #[case::release("1.4", false)]
    fn test_is_snapshot(#[case] raw: &str, #[case] expected: bool) {
        assert_eq!(Version::parse(raw).is_snapshot(), expected);
    }

    #[test]
    fn test_alpha_beta_and_components() {
        let v = Version::parse("3.0.0-Alpha");
        assert!(v.is_alpha());
        assert!(!v.is_beta());
        assert_eq!((v.major(), v.minor(), v.incremental()), (3, 0, 0));

        let v = Version::parse("2.1-beta.4");
        assert!(v.is_beta());
        assert_eq!(v.major(), 2);
        assert_eq!(v.minor(), 1);
        assert_eq!(v.incremental(), 0);
    }
}
