use serde::{Deserialize, Serialize};

/// NeVA generation parameters used by the description flow.
pub const MAX_TOKENS: u32 = 1024;
pub const TEMPERATURE: f32 = 0.20;
pub const TOP_P: f32 = 0.70;
pub const SEED: u64 = 0;

/// A base64 image paired with a question about it.
#[derive(Debug, Clone)]
pub struct DescriptionQuery {
    pub image_base64: String,
    pub query: String,
}

impl DescriptionQuery {
    pub fn new(image_base64: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            image_base64: image_base64.into(),
            query: query.into(),
        }
    }

    /// NeVA expects the image inline in the message as an `<img>` tag.
    pub fn message_content(&self) -> String {
        format!(
            "{} <img src=\"data:image/png;base64,{}\" />",
            self.query, self.image_base64
        )
    }
}

#[derive(Debug, Serialize)]
pub struct DescribeRequest {
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
    pub seed: u64,
    pub stream: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl DescribeRequest {
    pub fn new(query: &DescriptionQuery, stream: bool) -> Self {
        Self {
            messages: vec![ChatMessage {
                role: "user",
                content: query.message_content(),
            }],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            top_p: TOP_P,
            seed: SEED,
            stream,
        }
    }
}

/// One server-sent chunk of a streamed completion.
#[derive(Debug, Deserialize)]
pub struct StreamChunk {
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub delta: Option<StreamDelta>,
}

#[derive(Debug, Deserialize)]
pub struct StreamDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl StreamChunk {
    /// `choices[0].delta.content`, if the chunk carries one.
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.as_ref())
            .and_then(|d| d.content.as_deref())
    }
}

/// Answer from the description endpoint.
///
/// Streaming responses are assembled into text; non-streaming responses are
/// handed back as the raw JSON document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Description {
    Accumulated { text: String },
    RawDocument { document: serde_json::Value },
}

impl Description {
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Accumulated { text } => Some(text),
            Self::RawDocument { .. } => None,
        }
    }
}
