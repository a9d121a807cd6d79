// Outbound push message
//
// The transport protocol only carries string-valued metadata, so the data map
// is string-to-string by construction; callers coerce before insertion. The
// delivery target (topic or token) is passed to the Notifier separately.

use std::collections::HashMap;

/// A composed push message, ready for handoff to a Notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub title: String,
    pub body: String,
    pub data: HashMap<String, String>,
}

impl PushMessage {
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            data: HashMap::new(),
        }
    }

    /// Add a metadata entry, coercing the value to a string.
    pub fn with_data(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.data.insert(key.into(), value.to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_values_are_strings() {
        let message = PushMessage::new("Title", "Body")
            .with_data("count", 3)
            .with_data("eventId", "evt-1");

        assert_eq!(message.data.get("count"), Some(&"3".to_string()));
        assert_eq!(message.data.get("eventId"), Some(&"evt-1".to_string()));
    }
}
