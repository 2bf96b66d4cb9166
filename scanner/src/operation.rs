//! Parsed operations and the tracked field set.

use repo_scanner_gate::GatedOperation;
use serde::{Deserialize, Serialize};

/// A sub-field of a repository scan whose start and end are observed by the
/// fan-out listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DetailField {
    /// Count of blobs in the repository tree.
    NumberOfFiles,
    /// Content of the first YAML file in the tree.
    ContentOfOneYamlFile,
    /// Webhooks with deliveries enabled.
    ActiveWebhooks,
}

impl DetailField {
    /// The full tracked set, in resolution order.
    pub const ALL: [Self; 3] = [
        Self::NumberOfFiles,
        Self::ContentOfOneYamlFile,
        Self::ActiveWebhooks,
    ];

    /// Wire name of the field.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NumberOfFiles => "numberOfFiles",
            Self::ContentOfOneYamlFile => "contentOfOneYamlFile",
            Self::ActiveWebhooks => "activeWebhooks",
        }
    }
}

/// A request's parsed top-level operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanOperation {
    /// List the token user's repositories. Runs ungated.
    ListRepositories,
    /// Scan one repository's details. Bounded by the scan gate.
    ScanRepository {
        /// Detail fields the client selected.
        selection: Vec<DetailField>,
    },
}

impl ScanOperation {
    /// Selected detail fields; empty for operations without a selection.
    #[must_use]
    pub fn selection(&self) -> &[DetailField] {
        match self {
            Self::ListRepositories => &[],
            Self::ScanRepository { selection } => selection,
        }
    }
}

impl GatedOperation for ScanOperation {
    fn requires_scan_slot(&self) -> bool {
        matches!(self, Self::ScanRepository { .. })
    }
}
