use std::fmt;

use arbor_core::PropValue;
use regex::Regex;

/// Name filter used by `include` and `exclude`.
#[derive(Clone, Default)]
pub enum Matcher {
    #[default]
    Unset,
    List(Vec<String>),
    Pattern(Regex),
}

impl Matcher {
    /// Text values are split on commas without trimming, so `"a, b"` matches
    /// `"a"` and `" b"`. Empty text leaves the matcher unset.
    pub fn from_prop(value: Option<&PropValue>) -> Self {
        match value {
            Some(PropValue::Text(text)) if text.is_empty() => Matcher::Unset,
            Some(PropValue::Text(text)) => {
                Matcher::List(text.split(',').map(str::to_owned).collect())
            }
            Some(PropValue::List(names)) => Matcher::List(names.clone()),
            Some(PropValue::Pattern(pattern)) => Matcher::Pattern(pattern.clone()),
            _ => Matcher::Unset,
        }
    }

    pub fn list<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Matcher::List(names.into_iter().map(Into::into).collect())
    }

    pub fn is_set(&self) -> bool {
        !matches!(self, Matcher::Unset)
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            Matcher::Unset => false,
            Matcher::List(names) => names.iter().any(|candidate| candidate == name),
            Matcher::Pattern(pattern) => pattern.is_match(name),
        }
    }

    pub fn to_prop(&self) -> Option<PropValue> {
        match self {
            Matcher::Unset => None,
            Matcher::List(names) => Some(PropValue::List(names.clone())),
            Matcher::Pattern(pattern) => Some(PropValue::Pattern(pattern.clone())),
        }
    }
}

impl PartialEq for Matcher {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Matcher::Unset, Matcher::Unset) => true,
            (Matcher::List(a), Matcher::List(b)) => a == b,
            (Matcher::Pattern(a), Matcher::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Unset => f.write_str("Unset"),
            Matcher::List(names) => f.debug_tuple("List").field(names).finish(),
            Matcher::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
        }
    }
}

impl From<&str> for Matcher {
    fn from(value: &str) -> Self {
        Matcher::from_prop(Some(&PropValue::from(value)))
    }
}

impl From<Regex> for Matcher {
    fn from(value: Regex) -> Self {
        Matcher::Pattern(value)
    }
}
