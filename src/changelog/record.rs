//! changelog::record
//!
//! Release record assembly and the persisted release document.
//!
//! The builder is deterministic: the same inputs always produce the same
//! record. Only [`ReleaseDocument::creation_timestamp`] varies between runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::assemble::AssembledCommits;
use super::deps::collapse;
use crate::core::types::{DependencyUpdate, IssueSummary, ReleaseRecord, RepositoryInfo};

/// API version written on release documents.
pub const API_VERSION: &str = "relnote.dev/v1";

/// Kind written on release documents.
pub const KIND: &str = "Release";

/// Combines assembled commits with release metadata.
#[derive(Debug, Clone)]
pub struct ReleaseRecordBuilder {
    name: String,
    version: String,
    repository: RepositoryInfo,
    extra_updates: Vec<DependencyUpdate>,
}

impl ReleaseRecordBuilder {
    /// Start a record for an application version.
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            repository: RepositoryInfo::default(),
            extra_updates: Vec::new(),
        }
    }

    /// Set the repository metadata.
    pub fn repository(mut self, repository: RepositoryInfo) -> Self {
        self.repository = repository;
        self
    }

    /// Add dependency updates supplied by the caller rather than found in
    /// commit messages. They are collapsed together with the rest.
    pub fn dependency_updates(mut self, updates: Vec<DependencyUpdate>) -> Self {
        self.extra_updates.extend(updates);
        self
    }

    /// Build the record.
    ///
    /// Issues and pull requests are de-duplicated by identifier (first one
    /// wins) and routed by their pull-request flag. Commit order is kept.
    pub fn build(self, assembled: AssembledCommits) -> ReleaseRecord {
        let mut issues: Vec<IssueSummary> = Vec::new();
        let mut pull_requests: Vec<IssueSummary> = Vec::new();

        for summary in assembled
            .issues
            .into_iter()
            .chain(assembled.pull_requests)
        {
            let exists = issues
                .iter()
                .chain(pull_requests.iter())
                .any(|seen| seen.id == summary.id);
            if exists {
                continue;
            }
            if summary.pull_request {
                pull_requests.push(summary);
            } else {
                issues.push(summary);
            }
        }

        let mut updates = assembled.dependency_updates;
        updates.extend(self.extra_updates);

        ReleaseRecord {
            name: self.name,
            version: self.version,
            repository: self.repository,
            commits: assembled.commits,
            issues,
            pull_requests,
            dependency_updates: collapse(updates),
            release_notes_url: String::new(),
        }
    }
}

/// Metadata block of a release document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentMetadata {
    /// `<repo>-<version>` with `+` replaced by `_`
    pub name: String,
    /// When the document was generated
    pub creation_timestamp: DateTime<Utc>,
}

/// The release record as a versioned YAML document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReleaseDocument {
    /// Always [`API_VERSION`]
    pub api_version: String,
    /// Always [`KIND`]
    pub kind: String,
    /// Name and creation time
    pub metadata: DocumentMetadata,
    /// The release record
    pub spec: ReleaseRecord,
}

impl ReleaseDocument {
    /// Wrap a record.
    pub fn new(record: ReleaseRecord, created: DateTime<Utc>) -> Self {
        let base = if record.repository.name.is_empty() {
            &record.name
        } else {
            &record.repository.name
        };
        let name = format!("{}-{}", base, record.version.replace('+', "_"));

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: DocumentMetadata {
                name,
                creation_timestamp: created,
            },
            spec: record,
        }
    }

    /// When the document was generated.
    pub fn creation_timestamp(&self) -> DateTime<Utc> {
        self.metadata.creation_timestamp
    }

    /// Serialize to YAML.
    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }

    /// Parse from YAML.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }
}

/// Schema definition for release documents, written next to them when
/// requested so cluster tooling can accept the `Release` kind.
pub const RELEASE_SCHEMA_YAML: &str = r#"apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: releases.relnote.dev
spec:
  group: relnote.dev
  names:
    kind: Release
    listKind: ReleaseList
    plural: releases
    singular: release
    shortNames:
      - rel
  scope: Namespaced
  versions:
    - name: v1
      served: true
      storage: true
      schema:
        openAPIV3Schema:
          type: object
          x-kubernetes-preserve-unknown-fields: true
      additionalPrinterColumns:
        - name: Name
          type: string
          jsonPath: .spec.name
        - name: Version
          type: string
          jsonPath: .spec.version
        - name: Git URL
          type: string
          jsonPath: .spec.gitHttpURL
"#;
