//! Identity lookup tool: `get_name_of_user`.

use async_trait::async_trait;
use serde_json::{json, Value};

use super::{Tool, ToolCallContent, ToolCallContext, ToolError, ToolSpec};

/// Tool name for the identity lookup.
pub const TOOL_GET_NAME_OF_USER: &str = "get_name_of_user";

/// Profile returned when none is configured.
pub const DEFAULT_USER_PROFILE: &str = "Name: Guest, Occupation: Unknown";

/// Returns the profile of the current user. The profile is fixed per agent
/// (`RAGENT_USER_PROFILE`); there is no session store behind it.
pub struct GetNameOfUserTool {
    profile: String,
}

impl GetNameOfUserTool {
    pub fn new(profile: impl Into<String>) -> Self {
        Self {
            profile: profile.into(),
        }
    }
}

impl Default for GetNameOfUserTool {
    fn default() -> Self {
        Self::new(DEFAULT_USER_PROFILE)
    }
}

#[async_trait]
impl Tool for GetNameOfUserTool {
    fn name(&self) -> &str {
        TOOL_GET_NAME_OF_USER
    }

    fn spec(&self) -> ToolSpec {
        ToolSpec {
            name: TOOL_GET_NAME_OF_USER.to_string(),
            description: Some("Get the name and occupation of the current user.".to_string()),
            input_schema: json!({ "type": "object", "properties": {} }),
        }
    }

    async fn call(
        &self,
        _args: Value,
        _ctx: Option<&ToolCallContext>,
    ) -> Result<ToolCallContent, ToolError> {
        Ok(ToolCallContent::text(self.profile.clone()))
    }
}
