// Copyright 2026 Layne Penney
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Transport contracts for resource reads.
//!
//! The SDK never talks to the network itself; a [`PromptApi`] or
//! [`DatasetApi`] implementation does, and reports failures as [`SdkError`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::cache::FetchResponse;
use crate::context::PromptModel;
use crate::error::SdkError;

/// Identifying fields of a prompt read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptRequest {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

/// One templated chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: String,
    pub content: String,
}

impl PromptMessage {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// A prompt as stored by the platform, placeholders unrendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptRecord {
    pub slug: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub model: PromptModel,
    #[serde(default)]
    pub messages: Vec<PromptMessage>,
    /// Provider parameters such as temperature, passed through untouched.
    #[serde(default)]
    pub parameters: Map<String, Value>,
}

/// A dataset and its rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rows: Vec<Map<String, Value>>,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Listing entry for a dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub row_count: usize,
}

/// Fetches prompts from the platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PromptApi: Send + Sync {
    async fn fetch_prompt(
        &self,
        request: PromptRequest,
    ) -> Result<FetchResponse<PromptRecord>, SdkError>;
}

/// Fetches datasets from the platform.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatasetApi: Send + Sync {
    async fn fetch_dataset(&self, slug: String) -> Result<FetchResponse<Dataset>, SdkError>;

    async fn list_datasets(&self) -> Result<Vec<DatasetSummary>, SdkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_record_deserialize_defaults() {
        let record: PromptRecord = serde_json::from_str(
            r#"{"slug":"welcome","messages":[{"role":"system","content":"Hi {{name}}"}]}"#,
        )
        .unwrap();
        assert_eq!(record.slug, "welcome");
        assert_eq!(record.model, PromptModel::default());
        assert_eq!(record.messages.len(), 1);
        assert!(record.parameters.is_empty());
    }

    #[test]
    fn test_dataset_summary_camel_case() {
        let summary: DatasetSummary =
            serde_json::from_str(r#"{"slug":"qa","name":"QA","rowCount":12}"#).unwrap();
        assert_eq!(summary.row_count, 12);
    }
}
