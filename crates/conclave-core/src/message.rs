use crate::error::ConclaveResult;
use crate::metadata::Metadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The work description handed to an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskContext {
    /// Kind of work, echoed into the message context.
    pub task_type: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
    /// Skills the work needs; each is routed independently.
    #[serde(default)]
    pub required_skills: Vec<String>,
    /// Delegated task this context was built for, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<Uuid>,
    /// Additional typed parameters.
    #[serde(default)]
    pub parameters: Metadata,
}

impl TaskContext {
    /// Creates a context with the given type and description.
    pub fn new(task_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            description: description.into(),
            required_skills: Vec::new(),
            task_id: None,
            parameters: Metadata::new(),
        }
    }

    /// Sets the required skills.
    pub fn with_skills<I, S>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_skills = skills.into_iter().map(Into::into).collect();
        self
    }

    /// Links the context to a delegated task.
    pub fn for_task(mut self, task_id: Uuid) -> Self {
        self.task_id = Some(task_id);
        self
    }
}

/// Kind of an inter-agent message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Asks the recipient to perform work.
    Request,
    /// Answer to a previous request.
    Response,
    /// Informational, no reply expected.
    Notification,
}

/// Routing context carried alongside the serialized payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContext {
    /// Mirrors [`TaskContext::task_type`].
    pub task_type: String,
}

/// A directed message between the orchestrator and an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentMessage {
    /// Unique identifier for this message.
    pub id: Uuid,
    /// Sender id.
    pub from: String,
    /// Recipient agent id.
    pub to: String,
    /// Serialized [`TaskContext`] (JSON).
    pub content: String,
    /// Message kind.
    #[serde(rename = "type")]
    pub message_type: MessageType,
    /// Routing context.
    pub context: MessageContext,
    /// UTC time the message was built.
    pub timestamp: DateTime<Utc>,
    /// Recipient credentials, when the agent card carries any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Metadata>,
}

impl AgentMessage {
    /// Builds a `request` message carrying `task` serialized as JSON.
    pub fn request(
        from: impl Into<String>,
        to: impl Into<String>,
        task: &TaskContext,
        credentials: Option<Metadata>,
    ) -> ConclaveResult<Self> {
        Ok(Self {
            id: Uuid::new_v4(),
            from: from.into(),
            to: to.into(),
            content: serde_json::to_string(task)?,
            message_type: MessageType::Request,
            context: MessageContext {
                task_type: task.task_type.clone(),
            },
            timestamp: Utc::now(),
            credentials,
        })
    }

    /// Parses the payload back into a [`TaskContext`].
    pub fn task_context(&self) -> ConclaveResult<TaskContext> {
        Ok(serde_json::from_str(&self.content)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::metadata::MetaValue;

    #[test]
    fn test_request_shape() {
        let ctx = TaskContext::new("review", "Review the release notes").with_skills(["proofread"]);
        let msg = AgentMessage::request("orchestrator", "agent-1", &ctx, None).unwrap();

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["from"], "orchestrator");
        assert_eq!(json["to"], "agent-1");
        assert_eq!(json["type"], "request");
        assert_eq!(json["context"]["taskType"], "review");
        assert!(json.get("credentials").is_none());
        assert_eq!(msg.task_context().unwrap(), ctx);
    }

    #[test]
    fn test_request_carries_credentials() {
        let mut creds = Metadata::new();
        creds.insert("apiKey".into(), MetaValue::from("secret"));
        let ctx = TaskContext::new("t", "d");
        let msg = AgentMessage::request("o", "a", &ctx, Some(creds.clone())).unwrap();
        assert_eq!(msg.credentials, Some(creds));
    }
}
