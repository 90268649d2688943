//! `?ordering=` parsing (`name`, `-created_at`, ...)

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

/// A validated sort key. `field` is always one of the caller's allowed names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec<'a> {
    pub field: &'a str,
    pub direction: SortDirection,
}

impl<'a> SortSpec<'a> {
    /// Parse `raw` against an allow-list, falling back to `default`
    /// (which uses the same `-field` syntax) for missing or unknown keys.
    pub fn parse(raw: Option<&str>, allowed: &[&'a str], default: &'a str) -> Self {
        raw.and_then(|r| Self::lookup(r.trim(), allowed))
            .or_else(|| Self::lookup(default, allowed))
            .unwrap_or(SortSpec {
                field: default.trim_start_matches('-'),
                direction: SortDirection::Asc,
            })
    }

    fn lookup(raw: &str, allowed: &[&'a str]) -> Option<Self> {
        let (name, direction) = match raw.strip_prefix('-') {
            Some(rest) => (rest, SortDirection::Desc),
            None => (raw, SortDirection::Asc),
        };
        allowed
            .iter()
            .find(|candidate| **candidate == name)
            .map(|field| SortSpec { field, direction })
    }

    pub fn is_desc(&self) -> bool {
        self.direction == SortDirection::Desc
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIELDS: &[&str] = &["name", "rating", "created_at"];

    #[test]
    fn parses_descending_prefix() {
        let spec = SortSpec::parse(Some("-rating"), FIELDS, "name");
        assert_eq!(spec.field, "rating");
        assert!(spec.is_desc());
    }

    #[test]
    fn unknown_field_falls_back_to_default() {
        let spec = SortSpec::parse(Some("password_hash"), FIELDS, "-created_at");
        assert_eq!(spec.field, "created_at");
        assert_eq!(spec.direction, SortDirection::Desc);
    }

    #[test]
    fn missing_value_uses_default() {
        let spec = SortSpec::parse(None, FIELDS, "name");
        assert_eq!(spec, SortSpec { field: "name", direction: SortDirection::Asc });
    }
}
