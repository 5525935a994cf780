use git2::Repository;
use std::path::Path;

/// Resolve the `owner/repo` slug from the project's `origin` remote, when the
/// analyzed path lives inside a git checkout.
pub fn discover_slug(root: &Path) -> Option<String> {
    let repo = Repository::discover(root).ok()?;
    let remote = repo.find_remote("origin").ok()?;
    parse_slug(remote.url()?)
}

/// Extract `owner/repo` from the remote URL forms GitHub hands out.
pub fn parse_slug(url: &str) -> Option<String> {
    let rest = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
        .or_else(|| url.strip_prefix("git@github.com:"))
        .or_else(|| url.strip_prefix("ssh://git@github.com/"))?;

    let slug = rest.trim_end_matches('/').trim_end_matches(".git");

    if slug.split('/').filter(|s| !s.is_empty()).count() == 2 {
        Some(slug.to_string())
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_and_ssh_remote_urls() {
        assert_eq!(
            parse_slug("https://github.com/owner/repo.git").as_deref(),
            Some("owner/repo")
        );
        assert_eq!(
            parse_slug("https://github.com/owner/repo").as_deref(),
            Some("owner/repo")
        );
        assert_eq!(
            parse_slug("git@github.com:owner/repo.git").as_deref(),
            Some("owner/repo")
        );
        assert_eq!(
            parse_slug("ssh://git@github.com/owner/repo").as_deref(),
            Some("owner/repo")
        );
    }

    #[test]
    fn rejects_non_github_and_malformed_urls() {
        assert_eq!(parse_slug("https://gitlab.com/owner/repo.git"), None);
        assert_eq!(parse_slug("https://github.com/only-owner"), None);
        assert_eq!(parse_slug(""), None);
    }

    #[test]
    fn discovery_outside_a_checkout_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_slug(dir.path()).is_none());
    }
}
