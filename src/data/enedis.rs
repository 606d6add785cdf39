//! Raw consumption-curve retrieval from the consumption portlet.
//!
//! The portlet answers a Liferay resource request with a JSON envelope:
//!
//! ```text
//! { "etat": { "valeur": "termine" },
//!   "graphe": { "decalage": 0, "periode": {...}, "data": [...] } }
//! ```
//!
//! `etat.valeur` must be `"termine"` to proceed; everything else is a server
//! state failure. The `graphe` object is decoded into typed `RawSeries`
//! right here at the boundary rather than deep inside the transform logic.

use chrono::NaiveDate;
use reqwest::blocking::Client;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{RawSeries, Resource};
use crate::error::Error;

pub const DATA_URL: &str =
    "https://espace-client-particuliers.enedis.fr/group/espace-particuliers/suivi-de-consommation";

const PORTLET_ID: &str = "lincspartdisplaycdc_WAR_lincspartcdcportlet";
const PROVIDER_DATE: &str = "%d/%m/%Y";
const STATE_DONE: &str = "termine";
const STATE_ERROR: &str = "erreur";

#[derive(Debug, Deserialize)]
struct DataResponse {
    etat: Etat,
    graphe: Option<RawSeries>,
}

#[derive(Debug, Deserialize)]
struct Etat {
    valeur: String,
    #[serde(rename = "erreurText")]
    erreur_text: Option<String>,
}

/// Consumption-portlet client, borrowing an authenticated session.
pub struct EnedisClient<'a> {
    client: &'a Client,
    url: String,
}

impl<'a> EnedisClient<'a> {
    pub fn new(client: &'a Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    /// Fetch the raw series for `[start, end]` (provider dates are inclusive
    /// civil dates).
    pub fn fetch_raw(
        &self,
        resource: Resource,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<RawSeries, Error> {
        let payload = [
            (
                format!("_{PORTLET_ID}_dateDebut"),
                start.format(PROVIDER_DATE).to_string(),
            ),
            (
                format!("_{PORTLET_ID}_dateFin"),
                end.format(PROVIDER_DATE).to_string(),
            ),
        ];
        let query = [
            ("p_p_id", PORTLET_ID),
            ("p_p_lifecycle", "2"),
            ("p_p_state", "normal"),
            ("p_p_mode", "view"),
            ("p_p_resource_id", resource.provider_id()),
            ("p_p_cacheability", "cacheLevelPage"),
            ("p_p_col_id", "column-1"),
            ("p_p_col_pos", "1"),
            ("p_p_col_count", "3"),
        ];

        info!(resource = resource.label(), %start, %end, "requesting consumption curve");
        let mut resp = self
            .client
            .post(&self.url)
            .query(&query)
            .form(&payload)
            .send()?;

        if resp.status().is_redirection() {
            // The portal frequently 302s a correct first request; one repost
            // settles it.
            debug!(status = %resp.status(), "re-posting after redirect");
            resp = self
                .client
                .post(&self.url)
                .query(&query)
                .form(&payload)
                .send()?;
        }

        let text = resp.text()?;
        decode_payload(&text)
    }
}

/// Decode and validate the portlet envelope.
fn decode_payload(text: &str) -> Result<RawSeries, Error> {
    let body: DataResponse = serde_json::from_str(text)
        .map_err(|e| Error::Parse(format!("invalid response body: {e}")))?;

    match body.etat.valeur.as_str() {
        STATE_DONE => body
            .graphe
            .ok_or_else(|| Error::Parse("payload is missing the 'graphe' object".into())),
        STATE_ERROR => Err(Error::ServerState(
            body.etat.erreur_text.unwrap_or_else(|| "n/a".into()),
        )),
        other => Err(Error::ServerState(format!(
            "unrecognized response state '{other}'"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DONE_PAYLOAD: &str = r#"{
        "etat": { "valeur": "termine" },
        "graphe": {
            "decalage": 0,
            "puissanceSouscrite": 9,
            "periode": { "dateDebut": "11/11/2019", "dateFin": "14/11/2019" },
            "data": [
                { "valeur": 4.154, "ordre": 1 },
                { "valeur": 4.508, "ordre": 2 },
                { "valeur": 4.210, "ordre": 3 },
                { "valeur": 4.322, "ordre": 4 },
                { "valeur": 4.382, "ordre": 5 }
            ]
        }
    }"#;

    #[test]
    fn complete_payload_decodes_into_a_raw_series() {
        let raw = decode_payload(DONE_PAYLOAD).unwrap();
        assert_eq!(raw.decalage, 0);
        assert_eq!(raw.periode.date_debut, "11/11/2019");
        assert_eq!(raw.data.len(), 5);
        assert_eq!(raw.data[0].ordre, 1);
        assert_eq!(raw.data[0].valeur, 4.154);
    }

    #[test]
    fn error_state_surfaces_the_server_message() {
        let payload = r#"{ "etat": { "valeur": "erreur", "erreurText": "bad period" } }"#;
        match decode_payload(payload) {
            Err(Error::ServerState(msg)) => assert_eq!(msg, "bad period"),
            other => panic!("expected ServerState, got {other:?}"),
        }

        let bare = r#"{ "etat": { "valeur": "erreur" } }"#;
        match decode_payload(bare) {
            Err(Error::ServerState(msg)) => assert_eq!(msg, "n/a"),
            other => panic!("expected ServerState, got {other:?}"),
        }
    }

    #[test]
    fn unknown_state_is_an_unrecognized_failure() {
        let payload = r#"{ "etat": { "valeur": "enCours" }, "graphe": null }"#;
        match decode_payload(payload) {
            Err(Error::ServerState(msg)) => assert!(msg.contains("enCours")),
            other => panic!("expected ServerState, got {other:?}"),
        }
    }

    #[test]
    fn missing_graphe_on_success_is_a_parse_error() {
        let payload = r#"{ "etat": { "valeur": "termine" } }"#;
        assert!(matches!(decode_payload(payload), Err(Error::Parse(_))));
    }
}
