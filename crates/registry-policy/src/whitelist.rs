use itertools::Itertools;
use std::fmt;

use crate::errors::WhitelistError;

/// Ordered set of registry prefixes an image reference must start with.
///
/// Matching is a literal string prefix test: no wildcards, no registry
/// normalization and no case folding. An empty whitelist matches nothing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryWhitelist {
    prefixes: Vec<String>,
}

impl RegistryWhitelist {
    /// Build a whitelist, keeping the first occurrence of duplicated entries.
    pub fn new<I, S>(prefixes: I) -> Result<Self, WhitelistError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let prefixes: Vec<String> = prefixes.into_iter().map(Into::into).unique().collect();
        if let Some(position) = prefixes.iter().position(|prefix| prefix.is_empty()) {
            return Err(WhitelistError::EmptyPrefix(position));
        }

        Ok(RegistryWhitelist { prefixes })
    }

    pub fn prefixes(&self) -> &[String] {
        &self.prefixes
    }

    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Return the first prefix `image` starts with.
    pub fn matching_prefix(&self, image: &str) -> Option<&str> {
        self.prefixes
            .iter()
            .map(String::as_str)
            .find(|prefix| image.starts_with(prefix))
    }

    pub fn allows(&self, image: &str) -> bool {
        self.matching_prefix(image).is_some()
    }
}

impl fmt::Display for RegistryWhitelist {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.prefixes.iter().join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn whitelist() -> RegistryWhitelist {
        RegistryWhitelist::new(["docker.io/library/", "gcr.io/myorg/"]).unwrap()
    }

    #[rstest]
    #[case::first_prefix("docker.io/library/nginx:1.21", Some("docker.io/library/"))]
    #[case::second_prefix("gcr.io/myorg/app:v2", Some("gcr.io/myorg/"))]
    #[case::other_registry("evil.com/malware:latest", None)]
    #[case::no_case_folding("GCR.IO/myorg/app:v2", None)]
    #[case::no_normalization("nginx:1.21", None)]
    #[case::sibling_org("gcr.io/myorganization/app", None)]
    #[case::empty_image("", None)]
    fn match_prefix(#[case] image: &str, #[case] expected: Option<&str>) {
        assert_eq!(whitelist().matching_prefix(image), expected);
        assert_eq!(whitelist().allows(image), expected.is_some());
    }

    #[test]
    fn empty_whitelist_matches_nothing() {
        let whitelist = RegistryWhitelist::new(Vec::<String>::new()).unwrap();

        assert!(whitelist.is_empty());
        assert!(!whitelist.allows("docker.io/library/nginx"));
        assert!(!whitelist.allows(""));
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let err = RegistryWhitelist::new(["docker.io/", ""]).unwrap_err();

        assert_eq!(err, WhitelistError::EmptyPrefix(1));
    }

    #[test]
    fn duplicates_are_dropped_keeping_order() {
        let whitelist =
            RegistryWhitelist::new(["quay.io/", "docker.io/", "quay.io/"]).unwrap();

        assert_eq!(whitelist.prefixes(), ["quay.io/", "docker.io/"]);
    }

    #[test]
    fn display_lists_every_prefix() {
        assert_eq!(
            whitelist().to_string(),
            "[docker.io/library/ gcr.io/myorg/]"
        );
    }
}
