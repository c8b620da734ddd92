//! Events delivered to a streaming client.

use serde::Serialize;

/// Body of the error event. Deliberately generic; details go to the logs.
pub const STREAM_ERROR_MESSAGE: &str = "Error fetching files";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePayload {
    pub file_name: String,
    /// `data:` URI of the file content.
    pub file_data: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    File(FilePayload),
    Error(ErrorPayload),
}

impl StreamEvent {
    pub fn file(file_name: impl Into<String>, file_data: impl Into<String>) -> Self {
        StreamEvent::File(FilePayload {
            file_name: file_name.into(),
            file_data: file_data.into(),
        })
    }

    pub fn error() -> Self {
        StreamEvent::Error(ErrorPayload {
            message: STREAM_ERROR_MESSAGE.to_string(),
        })
    }

    /// SSE event name; `None` for the default `message` event.
    pub fn event_name(&self) -> Option<&'static str> {
        match self {
            StreamEvent::File(_) => None,
            StreamEvent::Error(_) => Some("error"),
        }
    }

    /// JSON body of the `data:` line.
    pub fn data_json(&self) -> serde_json::Result<String> {
        match self {
            StreamEvent::File(payload) => serde_json::to_string(payload),
            StreamEvent::Error(payload) => serde_json::to_string(payload),
        }
    }
}
