//! Exchange of a security token for SharePoint session cookies.

use reqwest::{Client, header};
use spfed_core::{Error, SessionCookies};
use tracing::instrument;

use crate::site::TargetSite;

/// Cookie carrying the tenant-wide sign-in.
pub const RTFA: &str = "rtFa";

/// Cookie carrying the site session.
pub const FEDAUTH: &str = "FedAuth";

/// Cookies the sign-in must yield, in header order.
pub const SESSION_COOKIE_NAMES: [&str; 2] = [RTFA, FEDAUTH];

const SET_COOKIE_PREFIX: &str = "set-cookie:";

/// `name=value` part of a `Set-Cookie` line if the cookie is called `name`.
///
/// Accepts the header value alone or a full `Set-Cookie: ...` line.
fn cookie_pair(line: &str, name: &str) -> Option<String> {
    let line = line.trim();
    let line = match line.get(..SET_COOKIE_PREFIX.len()) {
        Some(prefix) if prefix.eq_ignore_ascii_case(SET_COOKIE_PREFIX) => &line[SET_COOKIE_PREFIX.len()..],
        _ => line,
    };

    let pair = line.split(';').next()?.trim();
    let (cookie_name, _) = pair.split_once('=')?;
    (cookie_name.trim() == name).then(|| pair.to_string())
}

/// Pick the cookies called `names` out of `Set-Cookie` lines.
///
/// The first line per name wins; attributes after the first `;` are dropped.
/// Names with no matching line are left out.
pub fn extract_cookies<'a>(lines: impl IntoIterator<Item = &'a str>, names: &[&str]) -> SessionCookies {
    let lines: Vec<&str> = lines.into_iter().collect();
    let mut cookies = SessionCookies::new();

    for name in names {
        if let Some(pair) = lines.iter().find_map(|line| cookie_pair(line, name)) {
            cookies.insert(*name, pair);
        }
    }

    cookies
}

/// Post `token` to the sign-in endpoint and collect the session cookies.
///
/// The HTTP client must not follow redirects: the cookies arrive on the 302.
/// Missing cookies are logged, not treated as failures here.
///
/// # Errors
///
/// Returns `Error::Network` on transport failure.
#[instrument(skip(http, token), fields(site = %site))]
pub async fn exchange_token(http: &Client, site: &TargetSite, token: &str) -> Result<SessionCookies, Error> {
    let response = http
        .post(site.signin_url())
        .header(header::HOST, site.host())
        .header(header::CONTENT_LENGTH, token.len())
        .body(token.to_owned())
        .send()
        .await
        .map_err(|e| Error::Network(format!("sign-in request failed: {e}")))?;

    let status = response.status();
    let lines = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok());
    let cookies = extract_cookies(lines, &SESSION_COOKIE_NAMES);

    tracing::debug!(status = status.as_u16(), cookies = ?cookies, "sign-in responded");

    if !cookies.contains_all(&SESSION_COOKIE_NAMES) {
        let missing = missing_cookies(&cookies, &SESSION_COOKIE_NAMES);
        tracing::warn!(
            status = status.as_u16(),
            found = ?cookies,
            "sign-in returned HTTP {} without {}",
            status.as_u16(),
            missing.join(", ")
        );
    }

    Ok(cookies)
}

/// Names from `names` that `cookies` does not carry, in the given order.
fn missing_cookies<'a>(cookies: &SessionCookies, names: &[&'a str]) -> Vec<&'a str> {
    names.iter().copied().filter(|name| !cookies.contains(name)).collect()
}
