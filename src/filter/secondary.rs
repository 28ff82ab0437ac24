//! Secondary, composable filter operators applied after the primary selection
//! criterion: exclude-by-name, prefix/suffix, glob, and dedup.

use crate::filter::tag::TagMetadata;
use regex::Regex;
use std::collections::HashSet;

pub fn exclude(tags: Vec<TagMetadata>, excluded: &HashSet<String>) -> Vec<TagMetadata> {
    tags.into_iter().filter(|t| !excluded.contains(&t.name)).collect()
}

pub fn prefix(tags: Vec<TagMetadata>, prefix: &str) -> Vec<TagMetadata> {
    tags.into_iter().filter(|t| t.name.starts_with(prefix)).collect()
}

pub fn suffix(tags: Vec<TagMetadata>, suffix: &str) -> Vec<TagMetadata> {
    tags.into_iter().filter(|t| t.name.ends_with(suffix)).collect()
}

/// Translate a shell-style glob (`*` → `.*`, `?` → `.`) into an anchored regex and
/// filter by full-string match.
pub fn glob(tags: Vec<TagMetadata>, pattern: &str) -> Vec<TagMetadata> {
    let mut regex_str = String::with_capacity(pattern.len() * 2 + 2);
    regex_str.push('^');
    for ch in pattern.chars() {
        match ch {
            '*' => regex_str.push_str(".*"),
            '?' => regex_str.push('.'),
            other => regex_str.push_str(&regex::escape(&other.to_string())),
        }
    }
    regex_str.push('$');

    let Ok(re) = Regex::new(&regex_str) else {
        return Vec::new();
    };
    tags.into_iter().filter(|t| re.is_match(&t.name)).collect()
}

/// Deduplicate by tag name, preserving first occurrence.
pub fn dedup(tags: Vec<TagMetadata>) -> Vec<TagMetadata> {
    let mut seen = HashSet::new();
    tags.into_iter().filter(|t| seen.insert(t.name.clone())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(name: &str) -> TagMetadata {
        TagMetadata::named(name)
    }

    #[test]
    fn exclude_removes_listed_names() {
        let tags = vec![tag("a"), tag("b"), tag("c")];
        let excluded: HashSet<String> = ["b".to_string()].into_iter().collect();
        let kept: Vec<_> = exclude(tags, &excluded).into_iter().map(|t| t.name).collect();
        assert_eq!(kept, vec!["a", "c"]);
    }

    #[test]
    fn prefix_and_suffix_filter() {
        let tags = vec![tag("v1.0-rc1"), tag("v1.0"), tag("2.0-rc1")];
        let by_prefix: Vec<_> = prefix(tags.clone(), "v1.0").into_iter().map(|t| t.name).collect();
        assert_eq!(by_prefix, vec!["v1.0-rc1", "v1.0"]);
        let by_suffix: Vec<_> = suffix(tags, "-rc1").into_iter().map(|t| t.name).collect();
        assert_eq!(by_suffix, vec!["v1.0-rc1", "2.0-rc1"]);
    }

    #[test]
    fn glob_translates_wildcards_and_anchors_full_string() {
        let tags = vec![tag("v1.0.0"), tag("v1.0.0-rc1"), tag("2.0.0")];
        let kept: Vec<_> = glob(tags, "v1.0.*").into_iter().map(|t| t.name).collect();
        assert_eq!(kept, vec!["v1.0.0", "v1.0.0-rc1"]);
    }

    #[test]
    fn glob_question_mark_matches_single_char() {
        let tags = vec![tag("v1"), tag("v12"), tag("va")];
        let kept: Vec<_> = glob(tags, "v?").into_iter().map(|t| t.name).collect();
        assert_eq!(kept, vec!["v1", "va"]);
    }

    #[test]
    fn dedup_preserves_first_occurrence_and_is_idempotent() {
        let tags = vec![tag("a"), tag("b"), tag("a"), tag("c"), tag("b")];
        let once: Vec<_> = dedup(tags.clone()).into_iter().map(|t| t.name).collect();
        assert_eq!(once, vec!["a", "b", "c"]);

        let twice: Vec<_> = dedup(dedup(tags)).into_iter().map(|t| t.name).collect();
        assert_eq!(twice, once);
    }

    #[test]
    fn double_exclude_equals_single_exclude() {
        let tags = vec![tag("a"), tag("b"), tag("c")];
        let excluded: HashSet<String> = ["b".to_string()].into_iter().collect();
        let once = exclude(tags.clone(), &excluded);
        let twice = exclude(once.clone(), &excluded);
        assert_eq!(once, twice);
    }
}
