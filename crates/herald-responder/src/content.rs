//! Outbound reply payloads.
//!
//! The controller is agnostic to what a reply looks like: text plus a list
//! of opaque structured blocks that the gateway renders (embeds, button
//! rows, whatever the platform calls them). The queue treats persistence
//! payloads the same way; nothing in the core inspects either.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Content delivered through the gateway: a first reply, an edit, or a
/// follow-up message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyContent {
    /// Plain text body.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Structured blocks, opaque to the controller.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Value>,
}

impl ReplyContent {
    /// Creates text-only content.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            blocks: Vec::new(),
        }
    }

    /// Appends a structured block.
    #[must_use]
    pub fn with_block(mut self, block: Value) -> Self {
        self.blocks.push(block);
        self
    }

    /// Returns true if there is nothing to deliver.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.blocks.is_empty()
    }
}

/// Per-reply delivery options.
#[derive(Debug, Clone, Copy)]
pub struct ReplyOptions {
    /// Whether the reply is visible only to the requester.
    ///
    /// Defaults to `true`: a reply leaking to the whole channel is worse
    /// than one that is needlessly private.
    pub ephemeral: bool,
    /// Forces deferral regardless of elapsed time.
    pub force_defer: bool,
}

impl Default for ReplyOptions {
    fn default() -> Self {
        Self {
            ephemeral: true,
            force_defer: false,
        }
    }
}

impl ReplyOptions {
    /// Options for a reply visible to the whole channel.
    #[must_use]
    pub fn public() -> Self {
        Self {
            ephemeral: false,
            force_defer: false,
        }
    }

    /// Sets the force-defer flag.
    #[must_use]
    pub fn with_force_defer(mut self, force_defer: bool) -> Self {
        self.force_defer = force_defer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_content_is_not_empty() {
        let content = ReplyContent::text("done");
        assert!(!content.is_empty());
        assert_eq!(content.text.as_deref(), Some("done"));
    }

    #[test]
    fn default_content_is_empty() {
        assert!(ReplyContent::default().is_empty());
    }

    #[test]
    fn blocks_serialize_verbatim() {
        let content = ReplyContent::text("scores").with_block(json!({
            "title": "Weekly recruitment",
            "color": 0x57f287,
        }));
        let encoded = serde_json::to_value(&content).unwrap();
        assert_eq!(encoded["blocks"][0]["title"], "Weekly recruitment");
    }

    #[test]
    fn options_default_to_ephemeral() {
        let options = ReplyOptions::default();
        assert!(options.ephemeral);
        assert!(!options.force_defer);
        assert!(!ReplyOptions::public().ephemeral);
    }
}
