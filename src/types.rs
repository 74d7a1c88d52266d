//! Core types for backup-uplink

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::{Error, Result};

/// Opaque identifier of the data source to export
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceId(String);

impl SourceId {
    /// Create a new SourceId
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Secret used to encrypt the backup artifact.
///
/// Debug output is redacted so the passphrase can never leak through
/// logging, even via `{:?}` on a containing struct.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Passphrase(String);

impl Passphrase {
    /// Wrap a passphrase string
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Access the secret value. Callers must not log the result.
    pub fn reveal(&self) -> &str {
        &self.0
    }

    /// Whether the passphrase is empty (invalid for export)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Passphrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Passphrase(<redacted>)")
    }
}

/// Encryption key material resolved from the environment at run time.
///
/// Like [`Passphrase`], Debug output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ExportSecret(Vec<u8>);

impl ExportSecret {
    /// Wrap raw key material
    pub fn new(material: impl Into<Vec<u8>>) -> Self {
        Self(material.into())
    }

    /// Access the key bytes. Callers must not log the result.
    pub fn reveal(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for ExportSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ExportSecret(<redacted>)")
    }
}

/// Where the finished artifact goes.
///
/// The destination reference (endpoint URL) exists exactly when the
/// destination is remote, so the "ref present iff remote" invariant holds by
/// construction instead of by validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "endpoint", rename_all = "snake_case")]
pub enum Destination {
    /// Upload to a remote resumable-upload endpoint
    Remote(Url),
    /// Leave the artifact on local disk as the deliverable
    Local,
}

impl Destination {
    /// Whether this destination requires the upload phase
    pub fn is_remote(&self) -> bool {
        matches!(self, Destination::Remote(_))
    }
}

/// Immutable configuration for one job instance.
///
/// Created at enqueue time and reconstructed from its persisted form on each
/// retry; the job never mutates it. The serialized form carries exactly the
/// four persisted fields: source identifier, passphrase, destination kind,
/// destination reference.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// What to export
    pub source_id: SourceId,
    /// Secret for artifact encryption. Never logged.
    pub passphrase: Passphrase,
    /// Where the artifact goes
    pub destination: Destination,
}

impl JobSpec {
    /// Create a spec and validate its required fields.
    ///
    /// An empty source id or passphrase is a configuration error the retry
    /// machinery classifies as permanent.
    pub fn new(
        source_id: impl Into<SourceId>,
        passphrase: Passphrase,
        destination: Destination,
    ) -> Result<Self> {
        let spec = Self {
            source_id: source_id.into(),
            passphrase,
            destination,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Validate required fields, as when reconstructing from persisted form.
    pub fn validate(&self) -> Result<()> {
        if self.source_id.as_str().is_empty() {
            return Err(Error::config("source id must not be empty", "source_id"));
        }
        if self.passphrase.is_empty() {
            return Err(Error::config("passphrase must not be empty", "passphrase"));
        }
        Ok(())
    }
}

impl From<String> for SourceId {
    fn from(id: String) -> Self {
        Self(id)
    }
}
