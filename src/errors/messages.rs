//! User-facing error messages
//!
//! Known failure conditions arrive from the identity layer as opaque numeric
//! codes. They are mapped onto [`KnownCondition`] and given fixed, actionable
//! text. Everything else is described from its payload, falling back to the
//! error's display string.

use serde_json::Value;

use super::{CatalogError, SourceError};

/// Shown when neither the item lookup nor the workspace list yields a workspace.
pub const NO_WORKSPACE_MESSAGE: &str =
    "No workspace found. Make sure you have access to at least one workspace, then refresh.";

/// Shown when the resolved workspace has no lakehouse containers.
pub const NO_CONTAINERS_MESSAGE: &str = "No lakehouses found in this workspace. Create a lakehouse and upload files to its Files folder, then refresh.";

/// Shown, as a notice rather than an error, when every container listed but none holds files.
pub const NO_FILES_MESSAGE: &str =
    "No files found. Upload files to a lakehouse's Files folder, then refresh.";

/// Failure conditions the identity and hosting layers report by code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KnownCondition {
    /// Workspace resolution is not configured for this host
    WorkspaceConfigMissing,
    /// The user has to sign in interactively before the call can succeed
    InteractiveAuthRequired,
    /// An interactive sign-in was attempted and failed or was dismissed
    InteractiveAuthFailed,
    /// The hosting environment does not support the requested operation
    UnsupportedEnvironment,
}

impl KnownCondition {
    pub const ALL: [KnownCondition; 4] = [
        KnownCondition::WorkspaceConfigMissing,
        KnownCondition::InteractiveAuthRequired,
        KnownCondition::InteractiveAuthFailed,
        KnownCondition::UnsupportedEnvironment,
    ];

    /// Numeric code used on the wire.
    pub const fn code(self) -> u32 {
        match self {
            KnownCondition::WorkspaceConfigMissing => 1001,
            KnownCondition::InteractiveAuthRequired => 2001,
            KnownCondition::InteractiveAuthFailed => 2002,
            KnownCondition::UnsupportedEnvironment => 3001,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|condition| condition.code() == code)
    }

    pub const fn message(self) -> &'static str {
        match self {
            KnownCondition::WorkspaceConfigMissing => {
                "Workspace lookup is not configured for this item. Open the catalog from a workspace item or ask an administrator to enable workspace access."
            }
            KnownCondition::InteractiveAuthRequired => {
                "Sign-in is required to browse lakehouse files. Sign in and refresh."
            }
            KnownCondition::InteractiveAuthFailed => {
                "Sign-in did not complete. Allow the sign-in prompt and refresh to try again."
            }
            KnownCondition::UnsupportedEnvironment => {
                "This environment does not support browsing lakehouse files. Open the catalog inside a supported workspace host."
            }
        }
    }
}

/// Derive the text shown to a user for a failure.
///
/// Order: known condition codes, then object fields (`error`, `message`,
/// `statusCode`), then the error's display string.
pub fn user_message(error: &CatalogError) -> String {
    match error {
        CatalogError::Source(source) => source_message(source),
        CatalogError::Decode(e) => format!("The file content could not be decoded: {e}"),
        CatalogError::PreviewTooLarge { size, max_size } => format!(
            "This file is too large to preview ({size} bytes, limit {max_size} bytes). Download it instead."
        ),
        CatalogError::PreviewStore(e) => format!("The preview could not be prepared: {e}"),
        CatalogError::Configuration { .. } => error.to_string(),
    }
}

fn source_message(error: &SourceError) -> String {
    match error {
        SourceError::Condition { code, message } => match KnownCondition::from_code(*code) {
            Some(condition) => condition.message().to_string(),
            None if !message.is_empty() => message.clone(),
            None => error.to_string(),
        },
        SourceError::Http { status, message } => {
            if message.trim().is_empty() {
                format!("Request failed with status {status}")
            } else {
                message.clone()
            }
        }
        SourceError::Remote(value) => payload_message(value),
        other => other.to_string(),
    }
}

/// Inspect an object-shaped error payload.
fn payload_message(value: &Value) -> String {
    let Value::Object(fields) = value else {
        return coerce(value);
    };

    if let Some(code) = fields.get("code").and_then(Value::as_u64) {
        if let Some(condition) = u32::try_from(code).ok().and_then(KnownCondition::from_code) {
            return condition.message().to_string();
        }
    }

    match fields.get("error") {
        Some(Value::String(text)) if !text.is_empty() => return text.clone(),
        Some(nested @ Value::Object(inner)) if !inner.is_empty() => {
            return payload_message(nested);
        }
        _ => {}
    }

    if let Some(Value::String(text)) = fields.get("message") {
        if !text.is_empty() {
            return text.clone();
        }
    }

    if let Some(status) = fields.get("statusCode").filter(|v| !v.is_null()) {
        return format!("Request failed with status {}", coerce(status));
    }

    coerce(value)
}

/// String coercion: bare strings lose their JSON quotes.
fn coerce(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
