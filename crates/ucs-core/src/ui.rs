#![forbid(unsafe_code)]

//! Message box surface.
//!
//! While a prompt is active the driver does not tick the scene; pending
//! actions still run so a [`ShowMessageAction`](crate::action::ShowMessageAction)
//! can notice when the prompt is dismissed.

pub trait Ui {
    fn show_message(&mut self, text: &str);

    /// Whether a message is waiting to be dismissed.
    fn prompt_active(&self) -> bool;
}

/// Headless message box that records everything it was asked to show.
#[derive(Debug, Clone, Default)]
pub struct MessageUi {
    current: Option<String>,
    history: Vec<String>,
}

impl MessageUi {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Every message shown so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Close the current message. Returns it, if there was one.
    pub fn dismiss(&mut self) -> Option<String> {
        self.current.take()
    }
}

impl Ui for MessageUi {
    fn show_message(&mut self, text: &str) {
        tracing::info!(message = text, "message shown");
        self.current = Some(text.to_string());
        self.history.push(text.to_string());
    }

    fn prompt_active(&self) -> bool {
        self.current.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_follows_message() {
        let mut ui = MessageUi::new();
        assert!(!ui.prompt_active());

        ui.show_message("hi");
        assert!(ui.prompt_active());
        assert_eq!(ui.current(), Some("hi"));

        assert_eq!(ui.dismiss().as_deref(), Some("hi"));
        assert!(!ui.prompt_active());
        assert_eq!(ui.history(), ["hi"]);
    }
}
