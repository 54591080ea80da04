//! Message types for the `aiserver.v1` services.
//!
//! Only the fields this client reads or sets are declared. Field names follow
//! the protobuf JSON mapping (lowerCamelCase, enums as their value names).

use serde::{Deserialize, Serialize};

// ============================================================================
// AiService
// ============================================================================

/// `AvailableModels` request body (no fields)
#[derive(Debug, Clone, Default, Serialize)]
pub struct AvailableModelsRequest {}

/// `AvailableModels` response
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableModelsResponse {
    #[serde(default)]
    pub model_names: Vec<String>,
}

/// Model selection for chat requests
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

/// Author of a conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MessageType {
    #[serde(rename = "MESSAGE_TYPE_HUMAN")]
    Human,
    #[serde(rename = "MESSAGE_TYPE_AI")]
    Ai,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConversationMessage {
    pub text: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
}

/// `StreamChat` request
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetChatRequest {
    pub model_details: ModelDetails,
    pub conversation: Vec<ConversationMessage>,
}

impl GetChatRequest {
    /// Single-turn request for `prompt`, optionally pinned to a model.
    pub fn single_turn(prompt: impl Into<String>, model: Option<String>) -> Self {
        Self {
            model_details: ModelDetails { model_name: model },
            conversation: vec![ConversationMessage {
                text: prompt.into(),
                message_type: MessageType::Human,
            }],
        }
    }
}

/// One fragment of a `StreamChat` response
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct StreamChatResponse {
    #[serde(default)]
    pub text: String,
}

// ============================================================================
// RepositoryService (login flow, incomplete)
// ============================================================================

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoginRequest {}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(default)]
    pub login_url: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PollLoginRequest {}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PollLoginResponse {
    /// Status value name, left as a string since its enum is not known
    #[serde(default)]
    pub status: Option<String>,
}
