// prompt_engine/types.rs — Core types for the prompt planner

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of transformations the engine can request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformationKind {
    LanguageConversion,
    FormatConversion,
    Summarization,
    Explanation,
    Translation,
    Cleanup,
    Enhancement,
    Validation,
}

impl TransformationKind {
    pub const ALL: [TransformationKind; 8] = [
        TransformationKind::LanguageConversion,
        TransformationKind::FormatConversion,
        TransformationKind::Summarization,
        TransformationKind::Explanation,
        TransformationKind::Translation,
        TransformationKind::Cleanup,
        TransformationKind::Enhancement,
        TransformationKind::Validation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformationKind::LanguageConversion => "language_conversion",
            TransformationKind::FormatConversion => "format_conversion",
            TransformationKind::Summarization => "summarization",
            TransformationKind::Explanation => "explanation",
            TransformationKind::Translation => "translation",
            TransformationKind::Cleanup => "cleanup",
            TransformationKind::Enhancement => "enhancement",
            TransformationKind::Validation => "validation",
        }
    }
}

impl fmt::Display for TransformationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformationKind {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let label = s.trim().to_ascii_lowercase().replace('-', "_");
        TransformationKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == label)
            .ok_or(PlannerError::UnknownKind(label))
    }
}

/// Content label supplied by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    Code,
    Text,
    Email,
    Json,
    Url,
    Html,
    Markdown,
}

impl ContentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentCategory::Code => "code",
            ContentCategory::Text => "text",
            ContentCategory::Email => "email",
            ContentCategory::Json => "json",
            ContentCategory::Url => "url",
            ContentCategory::Html => "html",
            ContentCategory::Markdown => "markdown",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentCategory {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "code" => Ok(ContentCategory::Code),
            "text" => Ok(ContentCategory::Text),
            "email" => Ok(ContentCategory::Email),
            "json" => Ok(ContentCategory::Json),
            "url" => Ok(ContentCategory::Url),
            "html" => Ok(ContentCategory::Html),
            "markdown" => Ok(ContentCategory::Markdown),
            other => Err(PlannerError::UnknownCategory(other.to_string())),
        }
    }
}

/// One planned transformation request, prior to execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptSpec {
    pub kind: TransformationKind,
    pub title: String,
    pub description: String,
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    #[error("Unknown content category: {0}")]
    UnknownCategory(String),

    #[error("Unknown transformation: {0}")]
    UnknownKind(String),
}
