use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use tracing::trace;

use crate::error::{Result, SdkError};
use crate::properties::property_set::PropertySet;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\$\{([^}]*)\}").unwrap();
}

/// Where the values for `${name}` placeholders come from, typically the property set of the
///  project that builds a distro.
pub trait PlaceholderSource {
    /// `Ok(None)` if there is no value for `key`, an error if there is a value that can not be
    ///  used as a string
    fn lookup(&self, key: &str) -> Result<Option<Cow<'_, str>>>;
}

impl PlaceholderSource for PropertySet {
    fn lookup(&self, key: &str) -> Result<Option<Cow<'_, str>>> {
        Ok(self.get(key).map(Cow::Borrowed))
    }
}

impl PlaceholderSource for BTreeMap<String, String> {
    fn lookup(&self, key: &str) -> Result<Option<Cow<'_, str>>> {
        Ok(self.get(key).map(|v| Cow::Borrowed(v.as_str())))
    }
}

impl<S: BuildHasher> PlaceholderSource for HashMap<String, String, S> {
    fn lookup(&self, key: &str) -> Result<Option<Cow<'_, str>>> {
        Ok(self.get(key).map(|v| Cow::Borrowed(v.as_str())))
    }
}

impl PlaceholderSource for serde_json::Map<String, Value> {
    fn lookup(&self, key: &str) -> Result<Option<Cow<'_, str>>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(Cow::Borrowed(s.as_str()))),
            Some(other) => Err(SdkError::config(format!("placeholder {} refers to a non-string value {}", key, other))),
        }
    }
}

pub fn has_placeholder(value: &str) -> bool {
    value.contains("${")
}

/// Replaces every `${name}` in `value` with the looked-up value. Substituted text is not scanned
///  again. `property` is the key the value belongs to and only used for error reporting.
pub fn resolve_value(property: &str, value: &str, source: &dyn PlaceholderSource) -> Result<String> {
    let mut result = String::with_capacity(value.len());
    let mut last_end = 0;

    for captures in PLACEHOLDER.captures_iter(value) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        let key = name.as_str().trim();
        if key.is_empty() {
            return Err(SdkError::config(format!("empty placeholder in property {}", property)));
        }

        let replacement = source.lookup(key)?
            .ok_or_else(|| SdkError::MissingReference { key: key.to_string(), property: property.to_string() })?;

        let literal = &value[last_end..whole.start()];
        if literal.contains("${") {
            return Err(unterminated(property, value));
        }
        result.push_str(literal);
        result.push_str(&replacement);
        last_end = whole.end();
    }

    let tail = &value[last_end..];
    if tail.contains("${") {
        return Err(unterminated(property, value));
    }
    result.push_str(tail);
    Ok(result)
}

fn unterminated(property: &str, value: &str) -> SdkError {
    SdkError::config(format!("unterminated placeholder in property {}: {:?}", property, value))
}

/// Resolves all placeholders in `properties`. Nothing is modified if any of them fails.
pub fn resolve_all(properties: &mut PropertySet, source: &dyn PlaceholderSource) -> Result<()> {
    let mut resolved = Vec::new();
    for (key, value) in properties.iter() {
        if has_placeholder(value) {
            let new_value = resolve_value(key, value, source)?;
            trace!("resolved {} = {:?} to {:?}", key, value, new_value);
            resolved.push((key.to_string(), new_value));
        }
    }

    for (key, value) in resolved {
        properties.set(key, value);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use rstest::*;
    use serde_json::json;
    use super::*;

    fn project_properties() -> PropertySet {
        vec![
            ("appuiVersion", "1.6.7"),
            ("metadatamappingVersion", "1.5.6"),
            ("project.version", "222"),
            ("loop", "${loop}"),
        ].into_iter().collect()
    }

    #[rstest]
    #[case::whole_value("${appuiVersion}", "1.6.7")]
    #[case::embedded("v${appuiVersion}-final", "v1.6.7-final")]
    #[case::two_placeholders("${appuiVersion}/${project.version}", "1.6.7/222")]
    #[case::no_placeholder("1.2", "1.2")]
    #[case::single_pass("${loop}", "${loop}")]
    #[case::braces_without_dollar("{x}", "{x}")]
    fn test_resolve_value(#[case] value: &str, #[case] expected: &str) {
        assert_eq!(resolve_value("omod.appui", value, &project_properties()).unwrap(), expected);
    }

    #[test]
    fn test_missing_reference_names_key() {
        match resolve_value("omod.fails", "${failsVersion}", &project_properties()) {
            Err(SdkError::MissingReference { key, property }) => {
                assert_eq!(key, "failsVersion");
                assert_eq!(property, "omod.fails");
            }
            other => panic!("expected missing reference, got {:?}", other),
        }
    }

    #[rstest]
    #[case::unterminated("${appuiVersion")]
    #[case::unterminated_after_valid("${appuiVersion}${x")]
    #[case::empty("${}")]
    fn test_malformed(#[case] value: &str) {
        assert!(matches!(resolve_value("omod.appui", value, &project_properties()), Err(SdkError::Configuration(_))));
    }

    #[test]
    fn test_json_source() {
        let source = json!({"appuiVersion": "1.6.7", "count": 3});
        let source = source.as_object().unwrap();

        assert_eq!(resolve_value("omod.appui", "${appuiVersion}", source).unwrap(), "1.6.7");
        assert!(matches!(resolve_value("omod.appui", "${count}", source), Err(SdkError::Configuration(_))));
    }

    #[test]
    fn test_resolve_all_is_all_or_nothing() {
        let mut props: PropertySet = vec![
            ("omod.appui", "${appuiVersion}"),
            ("omod.fails", "${failsVersion}"),
        ].into_iter().collect();
        let before = props.clone();

        assert!(resolve_all(&mut props, &project_properties()).is_err());
        assert_eq!(props, before);

        props.remove("omod.fails");
        resolve_all(&mut props, &project_properties()).unwrap();
        assert_eq!(props.get("omod.appui"), Some("1.6.7"));
    }
}
