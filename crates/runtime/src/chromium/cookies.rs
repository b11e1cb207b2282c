//! Conversions between stored cookies and CDP cookie records.

use chromiumoxide::cdp::browser_protocol::network::{Cookie as CdpCookie, CookieParam, CookieSameSite, TimeSinceEpoch};
use jobpilot_protocol::{Cookie, SameSite};

pub(super) fn from_cdp(cookie: CdpCookie) -> Cookie {
	Cookie {
		name: cookie.name,
		value: cookie.value,
		domain: Some(cookie.domain),
		path: Some(cookie.path),
		expires: (!cookie.session).then_some(cookie.expires),
		http_only: Some(cookie.http_only),
		secure: Some(cookie.secure),
		same_site: cookie.same_site.map(|same_site| match same_site {
			CookieSameSite::Strict => SameSite::Strict,
			CookieSameSite::Lax => SameSite::Lax,
			CookieSameSite::None => SameSite::None,
		}),
	}
}

/// Builds a `setCookies` parameter; cookies without a domain cannot be scoped and yield `None`.
pub(super) fn to_param(cookie: &Cookie) -> Option<CookieParam> {
	let domain = cookie.domain.as_deref().filter(|d| !d.is_empty())?;
	let path = cookie.path.clone().unwrap_or_else(|| "/".to_string());
	let scheme = if cookie.secure.unwrap_or(false) { "https" } else { "http" };

	let mut param = CookieParam::new(cookie.name.clone(), cookie.value.clone());
	param.url = Some(format!("{scheme}://{}{path}", domain.trim_start_matches('.')));
	param.domain = Some(domain.to_string());
	param.path = Some(path);
	param.secure = cookie.secure;
	param.http_only = cookie.http_only;
	param.expires = cookie.expires.filter(|ts| *ts >= 0.0).map(TimeSinceEpoch::new);
	param.same_site = cookie.same_site.map(|same_site| match same_site {
		SameSite::Strict => CookieSameSite::Strict,
		SameSite::Lax => CookieSameSite::Lax,
		SameSite::None => CookieSameSite::None,
	});
	Some(param)
}
