//! Request URLs for the helper.
//!
//! Every URL gets a fresh random subdomain so no caching layer keyed on the
//! hostname ever serves a stale control response.

use crate::endpoints::HelperEndpoints;
use rand::Rng;
use url::Url;

const LABEL_LEN: usize = 9;
const BASE36: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Session credentials appended to every bootstrapped request.
#[derive(Debug, Clone, Copy)]
pub struct Tokens<'a> {
    pub csrf: &'a str,
    pub oauth: &'a str,
}

/// 9 lowercase base36 characters.
pub fn random_label() -> String {
    let mut rng = rand::thread_rng();
    (0..LABEL_LEN)
        .map(|_| BASE36[rng.gen_range(0..BASE36.len())] as char)
        .collect()
}

/// `{scheme}://{label}.{suffix}:{port}{path}?csrf=..&oauth=..&k=v`.
///
/// Tokens are only added when supplied; params keep caller order. `path` is
/// always taken as a path on the helper host, never as a relative reference.
pub fn compose_url(
    endpoints: &HelperEndpoints,
    port: u16,
    tokens: Option<Tokens<'_>>,
    path: &str,
    params: &[(&str, &str)],
) -> Result<Url, url::ParseError> {
    let base = format!(
        "{}://{}.{}:{}",
        endpoints.scheme,
        random_label(),
        endpoints.host_suffix,
        port
    );
    let mut url = Url::parse(&base)?;
    url.set_path(path);

    if tokens.is_some() || !params.is_empty() {
        let mut query = url.query_pairs_mut();
        if let Some(tokens) = tokens {
            query
                .append_pair("csrf", tokens.csrf)
                .append_pair("oauth", tokens.oauth);
        }
        for (key, value) in params {
            query.append_pair(key, value);
        }
    }

    Ok(url)
}
