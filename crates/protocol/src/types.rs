use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Kind of research data being uploaded.
///
/// The wire value doubles as the remote subdirectory name, so it must
/// never change for an existing variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    #[serde(rename = "visita_01_redcap")]
    Visit1Redcap,
    #[serde(rename = "visita_02_redcap")]
    Visit2Redcap,
    #[serde(rename = "dados_relogios")]
    Watches,
    #[serde(rename = "dados_anel")]
    Ring,
    #[serde(rename = "dados_bioimpedancia")]
    Bioimpedance,
}

impl DataType {
    /// Every accepted category, in display order.
    pub const ALL: [DataType; 5] = [
        DataType::Visit1Redcap,
        DataType::Visit2Redcap,
        DataType::Watches,
        DataType::Ring,
        DataType::Bioimpedance,
    ];

    /// Returns the wire value, also used as the remote directory name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Visit1Redcap => "visita_01_redcap",
            DataType::Visit2Redcap => "visita_02_redcap",
            DataType::Watches => "dados_relogios",
            DataType::Ring => "dados_anel",
            DataType::Bioimpedance => "dados_bioimpedancia",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a category outside the closed set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown data type: {0}")]
pub struct UnknownDataType(pub String);

impl FromStr for DataType {
    type Err = UnknownDataType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DataType::ALL
            .into_iter()
            .find(|dt| dt.as_str() == s)
            .ok_or_else(|| UnknownDataType(s.to_string()))
    }
}

/// Terminal state of a single file within a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStatus {
    #[serde(rename = "uploaded")]
    Uploaded,
    #[serde(rename = "failed")]
    Failed,
}

impl UploadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadStatus::Uploaded => "uploaded",
            UploadStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
