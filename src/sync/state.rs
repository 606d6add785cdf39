//! Per-resource watermark persistence.
//!
//! The state file holds one entry per resource kind:
//!
//! ```json
//! { "sub-daily": { "last": "12/02/2020" } }
//! ```
//!
//! It is read once per run and rewritten wholesale after a committed cycle;
//! writing through a sibling temp file keeps a crash from truncating it.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::Resource;
use crate::error::Error;

/// Timestamp of the last committed record for one resource kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Watermark {
    #[serde(default, with = "provider_date_opt", skip_serializing_if = "Option::is_none")]
    pub last: Option<NaiveDate>,
}

/// The whole watermark store, keyed by resource kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SyncState {
    entries: BTreeMap<Resource, Watermark>,
}

impl SyncState {
    /// Load the state file; a missing file is an empty state, not an error.
    pub fn load(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            debug!(path = %path.display(), "no state file yet, starting empty");
            return Ok(Self::default());
        }
        let file = fs::File::open(path)?;
        serde_json::from_reader(file)
            .map_err(|e| Error::Parse(format!("invalid state file '{}': {e}", path.display())))
    }

    /// Rewrite the state file wholesale.
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let tmp = path.with_extension("tmp");
        let file = fs::File::create(&tmp)?;
        serde_json::to_writer_pretty(&file, self).map_err(io::Error::other)?;
        file.sync_all()?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn watermark(&self, resource: Resource) -> Watermark {
        self.entries.get(&resource).copied().unwrap_or_default()
    }

    pub fn advance(&mut self, resource: Resource, last: NaiveDate) {
        self.entries.insert(resource, Watermark { last: Some(last) });
    }
}

mod provider_date_opt {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer, de};

    const FORMAT: &str = "%d/%m/%Y";

    pub fn serialize<S: Serializer>(d: &Option<NaiveDate>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_str(&d.format(FORMAT).to_string()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(de)?;
        raw.map(|s| NaiveDate::parse_from_str(&s, FORMAT).map_err(de::Error::custom))
            .transpose()
    }
}
