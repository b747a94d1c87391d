//! Ordered tenant hint extractors for global administrator requests.
//!
//! A global administrator's token carries no fixed family, so the family
//! context is re-derived on every request from the request's shape. Each
//! extractor is a pure function returning a candidate slug; candidates are
//! tried in order and a candidate that does not resolve to an existing
//! family falls through to the next source. This is a heuristic, not a
//! guarantee.

use super::resolver::RequestAuth;

/// Query parameter naming the family slug explicitly.
pub const FAMILY_QUERY_PARAM: &str = "family";

/// Path prefixes that can never be family slugs: the API namespace, the
/// cross-family management UI, and the setup wizard.
pub const RESERVED_PREFIXES: &[&str] = &["api", "admin", "setup"];

/// All candidate slugs for a request, in resolution order.
pub fn candidates(request: &RequestAuth) -> Vec<String> {
    [from_query(request), from_path(request), from_referer(request)]
        .into_iter()
        .flatten()
        .collect()
}

/// (a) Explicit `?family=slug` query parameter.
pub fn from_query(request: &RequestAuth) -> Option<String> {
    let query = request.query.as_deref()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == FAMILY_QUERY_PARAM)
        .map(|(_, value)| value.into_owned())
        .filter(|slug| !slug.is_empty())
}

/// (b) First path segment of the request URL, unless reserved.
pub fn from_path(request: &RequestAuth) -> Option<String> {
    first_segment(&request.path)
}

/// (c) First path segment of the `Referer` URL, for calls made by scripts
/// running on a family page.
pub fn from_referer(request: &RequestAuth) -> Option<String> {
    let referer = request.referer.as_deref()?;
    let url = url::Url::parse(referer).ok()?;
    first_segment(url.path())
}

fn first_segment(path: &str) -> Option<String> {
    let segment = path.split('/').find(|s| !s.is_empty())?;
    if RESERVED_PREFIXES.contains(&segment) {
        return None;
    }
    Some(segment.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(path: &str, query: Option<&str>, referer: Option<&str>) -> RequestAuth {
        RequestAuth {
            bearer: None,
            legacy_session: None,
            path: path.to_string(),
            query: query.map(String::from),
            referer: referer.map(String::from),
        }
    }

    #[test]
    fn query_param_wins() {
        let req = request("/smiths/log", Some("family=acme"), Some("https://x.test/jones"));
        assert_eq!(candidates(&req), vec!["acme", "smiths", "jones"]);
    }

    #[test]
    fn reserved_path_prefixes_are_skipped() {
        let req = request("/api/activities", None, None);
        assert!(from_path(&req).is_none());
        let req = request("/admin/families", None, None);
        assert!(from_path(&req).is_none());
        let req = request("/setup", None, None);
        assert!(from_path(&req).is_none());
    }

    #[test]
    fn referer_follows_the_same_rule() {
        let req = request("/api/activities", None, Some("https://tracker.test/acme/sleep"));
        assert_eq!(from_referer(&req).as_deref(), Some("acme"));

        let req = request("/api/activities", None, Some("https://tracker.test/admin/x"));
        assert!(from_referer(&req).is_none());
    }

    #[test]
    fn malformed_referer_is_ignored() {
        let req = request("/api/x", None, Some("not a url"));
        assert!(from_referer(&req).is_none());
    }

    #[test]
    fn empty_query_value_is_not_a_candidate() {
        let req = request("/api/x", Some("family="), None);
        assert!(from_query(&req).is_none());
    }
}
