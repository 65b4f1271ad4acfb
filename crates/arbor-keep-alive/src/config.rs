use arbor_core::{PropValue, Props};

use crate::matcher::Matcher;

/// Options read from the container's `include`, `exclude` and `max` props.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeepAliveConfig {
    pub include: Matcher,
    pub exclude: Matcher,
    /// `None` leaves the cache unbounded.
    pub max: Option<usize>,
}

impl KeepAliveConfig {
    pub fn from_props(props: Option<&Props>) -> Self {
        let get = |name: &str| props.and_then(|props| props.get(name));
        Self {
            include: Matcher::from_prop(get("include")),
            exclude: Matcher::from_prop(get("exclude")),
            max: get("max").and_then(parse_max),
        }
    }

    pub fn with_include(mut self, include: impl Into<Matcher>) -> Self {
        self.include = include.into();
        self
    }

    pub fn with_exclude(mut self, exclude: impl Into<Matcher>) -> Self {
        self.exclude = exclude.into();
        self
    }

    pub fn with_max(mut self, max: usize) -> Self {
        self.max = (max > 0).then_some(max);
        self
    }

    pub fn to_props(&self) -> Props {
        let mut props = Props::new();
        if let Some(include) = self.include.to_prop() {
            props.insert("include".to_owned(), include);
        }
        if let Some(exclude) = self.exclude.to_prop() {
            props.insert("exclude".to_owned(), exclude);
        }
        if let Some(max) = self.max {
            props.insert("max".to_owned(), PropValue::Number(max as i64));
        }
        props
    }

    /// Whether `name` passes the filters. Nodes without a name only pass
    /// when no `include` is configured; an `exclude` on its own cannot match
    /// them, so they are still cached.
    pub fn admits(&self, name: Option<&str>) -> bool {
        if self.include.is_set() && !name.is_some_and(|name| self.include.matches(name)) {
            return false;
        }
        if self.exclude.is_set() && name.is_some_and(|name| self.exclude.matches(name)) {
            return false;
        }
        true
    }
}

/// Reads `max` the way a permissive integer parse would: leading whitespace,
/// an optional sign and a digit prefix. Anything that does not yield a
/// positive count leaves the cache unbounded.
fn parse_max(value: &PropValue) -> Option<usize> {
    let parsed = match value {
        PropValue::Number(number) => *number,
        PropValue::Text(text) => parse_int_prefix(text)?,
        _ => return None,
    };
    usize::try_from(parsed).ok().filter(|max| *max > 0)
}

fn parse_int_prefix(text: &str) -> Option<i64> {
    let trimmed = text.trim_start();
    let (negative, rest) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value = rest[..digits].parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -value } else { value })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(entries: &[(&str, PropValue)]) -> Props {
        entries
            .iter()
            .map(|(name, value)| ((*name).to_owned(), value.clone()))
            .collect()
    }

    #[test]
    fn max_is_parsed_permissively() {
        let read = |value: PropValue| KeepAliveConfig::from_props(Some(&props(&[("max", value)]))).max;
        assert_eq!(read(PropValue::Number(3)), Some(3));
        assert_eq!(read(PropValue::from("10")), Some(10));
        assert_eq!(read(PropValue::from("  4 pages")), Some(4));
        assert_eq!(read(PropValue::from("many")), None);
        assert_eq!(read(PropValue::from("0")), None);
        assert_eq!(read(PropValue::from("-2")), None);
        assert_eq!(read(PropValue::Number(-1)), None);
    }

    #[test]
    fn filters_follow_include_then_exclude() {
        let config = KeepAliveConfig::default()
            .with_include("home,pageA")
            .with_exclude("pageA");
        assert!(config.admits(Some("home")));
        assert!(!config.admits(Some("pageA")));
        assert!(!config.admits(Some("other")));
        assert!(!config.admits(None));

        let open = KeepAliveConfig::default().with_exclude("pageA");
        assert!(open.admits(None));
        assert!(open.admits(Some("home")));
    }

    #[test]
    fn config_survives_a_trip_through_props() {
        let config = KeepAliveConfig::default().with_include("home").with_max(2);
        assert_eq!(KeepAliveConfig::from_props(Some(&config.to_props())), config);
    }
}
