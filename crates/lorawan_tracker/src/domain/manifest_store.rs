use super::{
    connection_deveui, deep_merge, has_required_keys, schema_violations, LorawanConnection,
    Manifest,
};
use common::domain::{DomainError, DomainResult};
use serde::Serialize;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

/// Result of applying one candidate record to the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Merged,
    Appended,
    Rejected(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// Candidate carries a key the schema does not have at that position
    SchemaMismatch,
    /// Typed record could not be encoded as JSON
    InvalidValue,
    /// New record is missing one of the required keys
    MissingRequiredKeys,
}

/// Node manifest bound to its file
///
/// Loaded fresh for every event and written back after each accepted upsert.
#[derive(Debug)]
pub struct ManifestStore {
    path: PathBuf,
    manifest: Manifest,
}

impl ManifestStore {
    /// A missing file yields an empty manifest; any other read or parse
    /// failure is returned.
    pub fn load(path: impl Into<PathBuf>) -> DomainResult<Self> {
        let path = path.into();
        let manifest = match std::fs::read(&path) {
            Ok(bytes) => {
                serde_json::from_slice(&bytes).map_err(|source| DomainError::ManifestParse {
                    path: path.display().to_string(),
                    source,
                })?
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "manifest not found, starting empty");
                Manifest::default()
            }
            Err(source) => {
                return Err(DomainError::ManifestIo {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        Ok(Self { path, manifest })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn has_connections(&self) -> bool {
        self.manifest.has_connections()
    }

    pub fn find_device(&self, deveui: &str) -> bool {
        self.manifest.find_device(deveui)
    }

    /// Write the whole document. Failures are logged and the in-memory
    /// manifest is kept as is.
    pub fn save(&self) {
        if let Err(err) = self.write() {
            error!(path = %self.path.display(), error = %err, "failed to save manifest");
        }
    }

    fn write(&self) -> DomainResult<()> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"   ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        self.manifest
            .serialize(&mut serializer)
            .map_err(|source| DomainError::ManifestEncode {
                path: self.path.display().to_string(),
                source,
            })?;

        std::fs::write(&self.path, buf).map_err(|source| DomainError::ManifestIo {
            path: self.path.display().to_string(),
            source,
        })
    }

    pub fn upsert_connection(&mut self, record: &LorawanConnection) -> UpsertOutcome {
        match serde_json::to_value(record) {
            Ok(candidate) => self.upsert(&candidate),
            Err(err) => {
                error!(error = %err, "failed to encode manifest record");
                UpsertOutcome::Rejected(RejectReason::InvalidValue)
            }
        }
    }

    /// Merge `candidate` into the connection with the same `deveui`, or append
    /// it as a new connection. Rejected candidates leave the file untouched.
    pub fn upsert(&mut self, candidate: &Value) -> UpsertOutcome {
        let violations = schema_violations(candidate);
        if !violations.is_empty() {
            error!(
                candidate = %candidate,
                violations = ?violations,
                "manifest record does not match schema"
            );
            return UpsertOutcome::Rejected(RejectReason::SchemaMismatch);
        }

        let Some(incoming) = candidate.as_object() else {
            error!(candidate = %candidate, "manifest record is not an object");
            return UpsertOutcome::Rejected(RejectReason::SchemaMismatch);
        };

        let connections = self
            .manifest
            .lorawan_connections
            .get_or_insert_with(Vec::new);

        let position = connection_deveui(candidate).and_then(|deveui| {
            connections
                .iter()
                .position(|connection| connection_deveui(connection) == Some(deveui))
        });

        let outcome = match position {
            Some(index) => {
                if let Some(existing) = connections[index].as_object_mut() {
                    deep_merge(existing, incoming);
                }
                UpsertOutcome::Merged
            }
            None => {
                if !has_required_keys(candidate) {
                    error!(candidate = %candidate, "new manifest record is missing required keys");
                    return UpsertOutcome::Rejected(RejectReason::MissingRequiredKeys);
                }
                connections.push(candidate.clone());
                UpsertOutcome::Appended
            }
        };

        info!(path = %self.path.display(), outcome = ?outcome, "manifest updated");
        self.save();
        outcome
    }
}
