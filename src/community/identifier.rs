use crate::community::OwnerId;
use url::Url;

/// Host markers recognised in links written without a scheme
const HOST_MARKERS: &[&str] = &["vk.com", "vk.ru"];

/// Prefixes of numeric community addresses: `club123`, `public123`, `event123`
const COMMUNITY_PREFIXES: &[&str] = &["club", "public", "event"];

/// Prefix of numeric user page addresses: `id123`
const USER_PREFIX: &str = "id";

/// What a raw identifier turned out to be after local parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identifier {
    /// Numeric form; no lookup needed
    Owner(OwnerId),
    /// Short name that needs a remote lookup
    ScreenName(String),
    /// Nothing left after stripping
    Empty,
}

/// Parses a free-form identifier without any remote calls
///
/// # Parsing Steps
///
/// 1. Trim whitespace
/// 2. Links containing a host marker: take the last path segment
/// 3. Other absolute URLs: take the path
/// 4. Anything else is used verbatim
/// 5. `club`/`public`/`event` + digits is a community, `id` + digits a user
/// 6. Whatever remains is a screen name
///
/// # Examples
///
/// ```
/// use vk_relink::community::{parse_identifier, Identifier};
/// use vk_relink::OwnerId;
///
/// assert_eq!(
///     parse_identifier("https://vk.com/public123456"),
///     Identifier::Owner(OwnerId::new(-123456))
/// );
/// assert_eq!(
///     parse_identifier("my_public_name"),
///     Identifier::ScreenName("my_public_name".to_string())
/// );
/// ```
pub fn parse_identifier(raw: &str) -> Identifier {
    let candidate = extract_candidate(raw.trim());
    if candidate.is_empty() {
        return Identifier::Empty;
    }

    for prefix in COMMUNITY_PREFIXES {
        if let Some(id) = numeric_suffix(&candidate, prefix) {
            return Identifier::Owner(OwnerId::community(id));
        }
    }

    if let Some(id) = numeric_suffix(&candidate, USER_PREFIX) {
        return Identifier::Owner(OwnerId::user(id));
    }

    Identifier::ScreenName(candidate)
}

/// Pulls the name part out of a link, or returns the input unchanged
fn extract_candidate(trimmed: &str) -> String {
    if trimmed.contains('/') && HOST_MARKERS.iter().any(|host| trimmed.contains(host)) {
        let without_query = trimmed
            .split(['?', '#'])
            .next()
            .unwrap_or(trimmed)
            .trim_end_matches('/');
        let last = without_query.rsplit('/').next().unwrap_or(without_query);
        // Bare host with no path
        if HOST_MARKERS.iter().any(|host| last.ends_with(host)) {
            return String::new();
        }
        return last.to_string();
    }

    match Url::parse(trimmed) {
        Ok(url) if url.has_host() => url.path().trim_matches('/').to_string(),
        _ => trimmed.to_string(),
    }
}

/// `prefix` followed by one or more ASCII digits and nothing else
fn numeric_suffix(candidate: &str, prefix: &str) -> Option<i64> {
    let digits = candidate.strip_prefix(prefix)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
