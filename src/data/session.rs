//! Form login against the Enedis authentication endpoint.
//!
//! A successful login materializes as cookies (notably `iPlanetDirectoryPro`)
//! in the client's cookie store. Callers never inspect the cookies; they keep
//! reusing the same client for data requests, which makes the session an
//! opaque capability.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use tracing::{debug, info};

use crate::error::Error;

pub const LOGIN_URL: &str = "https://espace-client-connexion.enedis.fr/auth/UI/Login";

const SESSION_COOKIE: &str = "iPlanetDirectoryPro";
const USER_AGENT: &str = concat!("linky-exporter/", env!("CARGO_PKG_VERSION"));

/// Build the blocking HTTP client shared by login and data requests.
///
/// Redirects are handled manually: the portal's 302 responses are part of
/// the protocol, not something to follow blindly.
pub fn build_client() -> Result<Client, Error> {
    Ok(Client::builder()
        .user_agent(USER_AGENT)
        .cookie_store(true)
        .redirect(Policy::none())
        .build()?)
}

/// Authenticate and leave the session cookies in the client's store.
pub fn login(client: &Client, url: &str, username: &str, password: &str) -> Result<(), Error> {
    let realm = BASE64.encode("realm=particuliers");
    let payload = [
        ("IDToken1", username),
        ("IDToken2", password),
        ("SunQueryParamsString", realm.as_str()),
        ("encoded", "true"),
        ("gx_charset", "UTF-8"),
    ];

    info!(username, "sending login request");
    let resp = client.post(url).form(&payload).send()?;
    debug!(status = %resp.status(), "login response received");

    if !resp.cookies().any(|c| c.name() == SESSION_COOKIE) {
        return Err(Error::Login(
            "no session cookie in response; check your credentials".into(),
        ));
    }
    Ok(())
}
