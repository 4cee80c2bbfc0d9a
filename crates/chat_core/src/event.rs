use serde::{Deserialize, Serialize};

/// Opaque key-value metadata attached to a source document.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// An excerpt the backend cites as evidence for the answer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SourceDocument {
    #[serde(alias = "page_content")]
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl SourceDocument {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}

/// One parsed unit of the answer stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    Token { text: String },
    Source { document: SourceDocument },
    Error { message: String },
}

impl StreamEvent {
    pub fn token(text: impl Into<String>) -> Self {
        Self::Token { text: text.into() }
    }

    pub fn source(document: SourceDocument) -> Self {
        Self::Source { document }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }
}
