//! Sender allow-list for host messages.

use std::collections::BTreeSet;

/// Environment variable holding a comma separated origin allow-list.
pub const ALLOWED_ORIGINS_ENV: &str = "GENOGRAM_ALLOWED_ORIGINS";

/// Exact-match origin allow-list; empty means deny everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OriginPolicy {
    allowed: BTreeSet<String>,
}

impl OriginPolicy {
    /// Builds a policy from origins; wildcards and opaque origins are ignored.
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let allowed = origins
            .into_iter()
            .filter_map(|origin| normalize_origin(origin.as_ref()))
            .collect();
        Self { allowed }
    }

    pub fn deny_all() -> Self {
        Self::default()
    }

    /// Parses a comma separated list such as `a.example, b.example`.
    pub fn parse_list(value: &str) -> Self {
        Self::new(value.split(','))
    }

    /// Reads `GENOGRAM_ALLOWED_ORIGINS`; unset means deny everything.
    pub fn from_env() -> Self {
        std::env::var(ALLOWED_ORIGINS_ENV)
            .map(|value| Self::parse_list(&value))
            .unwrap_or_default()
    }

    pub fn allows(&self, origin: &str) -> bool {
        normalize_origin(origin).is_some_and(|origin| self.allowed.contains(&origin))
    }

    pub fn is_deny_all(&self) -> bool {
        self.allowed.is_empty()
    }

    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }
}

fn normalize_origin(value: &str) -> Option<String> {
    let normalized = value.trim().trim_end_matches('/').to_ascii_lowercase();
    match normalized.as_str() {
        "" | "*" | "null" => None,
        _ => Some(normalized),
    }
}

#[cfg(test)]
mod tests {
    use super::OriginPolicy;

    #[test]
    fn default_policy_denies_everything() {
        let policy = OriginPolicy::deny_all();
        assert!(policy.is_deny_all());
        assert!(!policy.allows("https://case.example.org"));
    }

    #[test]
    fn origins_match_after_normalization_only() {
        let policy = OriginPolicy::parse_list(" https://Case.Example.org/ ,https://b.example");
        assert!(policy.allows("https://case.example.org"));
        assert!(policy.allows("HTTPS://CASE.EXAMPLE.ORG/"));
        assert!(policy.allows("https://b.example"));
        assert!(!policy.allows("https://case.example.org.evil"));
        assert!(!policy.allows("http://case.example.org"));
    }

    #[test]
    fn wildcards_and_opaque_origins_are_never_listed() {
        let policy = OriginPolicy::new(["*", "null", "  "]);
        assert!(policy.is_deny_all());
        assert!(!policy.allows("null"));
    }
}
