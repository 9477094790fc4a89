//! GitHub token injection
//!
//! `https://github.com/acme/widget.git` + `abc123` becomes
//! `https://abc123@github.com/acme/widget.git`. Every other URL passes
//! through untouched.

use url::Url;

const GITHUB_HOST: &str = "github.com";

/// Whether `url` is an HTTPS URL whose host is exactly `github.com`
pub fn is_github_https(url: &str) -> bool {
    Url::parse(url)
        .map(|u| u.scheme() == "https" && u.host_str() == Some(GITHUB_HOST))
        .unwrap_or(false)
}

/// Embed `token` as the userinfo of a GitHub HTTPS URL.
///
/// The result is the input with `token@` spliced in after `://`; nothing
/// else is re-encoded. URLs that already carry userinfo are returned
/// unchanged, so injecting twice yields the same URL as injecting once.
pub fn inject_token(url: &str, token: &str) -> String {
    if token.is_empty() || !is_github_https(url) {
        return url.to_string();
    }

    let Some((scheme, rest)) = url.split_once("://") else {
        return url.to_string();
    };
    // Splice only when the authority is the bare host, with no userinfo
    let authority = &rest[..rest.find(['/', '?', '#']).unwrap_or(rest.len())];
    let host = authority.split_once(':').map_or(authority, |(host, _port)| host);
    if !host.eq_ignore_ascii_case(GITHUB_HOST) {
        return url.to_string();
    }

    format!("{scheme}://{token}@{rest}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_injects_into_github_https() {
        assert_eq!(
            inject_token("https://github.com/acme/widget.git", "abc123"),
            "https://abc123@github.com/acme/widget.git"
        );
    }

    #[test]
    fn test_other_hosts_and_schemes_unchanged() {
        for url in [
            "https://gitlab.com/acme/widget.git",
            "http://github.com/acme/widget.git",
            "git@github.com:acme/widget.git",
            "ssh://git@github.com/acme/widget.git",
            "https://github.com.evil.example/acme/widget.git",
            "https://api.github.com/repos/acme/widget",
            "not a url",
        ] {
            assert_eq!(inject_token(url, "abc123"), url, "{url}");
        }
    }

    #[test]
    fn test_existing_credentials_are_kept() {
        let url = "https://old@github.com/acme/widget.git";
        assert_eq!(inject_token(url, "abc123"), url);
    }

    #[test]
    fn test_double_injection_is_guarded() {
        let once = inject_token("https://github.com/acme/widget.git", "abc123");
        assert_eq!(inject_token(&once, "abc123"), once);
    }

    #[test]
    fn test_rest_of_url_is_kept_verbatim() {
        assert_eq!(
            inject_token("https://github.com", "abc123"),
            "https://abc123@github.com"
        );
        assert_eq!(
            inject_token("https://github.com/acme/my repo.git", "abc123"),
            "https://abc123@github.com/acme/my repo.git"
        );
        assert_eq!(
            inject_token("https://GITHUB.com/Acme/Widget.git", "abc123"),
            "https://abc123@GITHUB.com/Acme/Widget.git"
        );
    }

    #[test]
    fn test_empty_userinfo_is_not_doubled() {
        let url = "https://@github.com/acme/widget.git";
        assert_eq!(inject_token(url, "abc123"), url);
    }

    #[test]
    fn test_empty_token_is_noop() {
        let url = "https://github.com/acme/widget.git";
        assert_eq!(inject_token(url, ""), url);
    }

    #[test]
    fn test_is_github_https() {
        assert!(is_github_https("https://github.com/acme/widget.git"));
        assert!(!is_github_https("https://gitlab.com/acme/widget.git"));
        assert!(!is_github_https("git@github.com:acme/widget.git"));
    }

    proptest! {
        #[test]
        fn injection_is_idempotent(url in ".*", token in "[A-Za-z0-9_]{1,40}") {
            let once = inject_token(&url, &token);
            prop_assert_eq!(inject_token(&once, &token), once);
        }

        #[test]
        fn non_github_hosts_pass_through(
            host in "[a-z]{1,12}\\.(com|org|io)",
            repo in "[a-z]{1,12}/[a-z]{1,12}\\.git",
        ) {
            prop_assume!(host != "github.com");
            let url = format!("https://{host}/{repo}");
            prop_assert_eq!(inject_token(&url, "abc123"), url);
        }
    }
}
