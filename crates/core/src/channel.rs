//! The outbound half of operator chat.
//!
//! Inbound chat arrives on the session's event queue as
//! [`WorldEvent::Chat`](crate::event::WorldEvent::Chat); this trait carries
//! the agent's replies back to the world.

use async_trait::async_trait;

use crate::error::WorldError;

#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Human-readable channel name (e.g., "sandbox", "server").
    fn name(&self) -> &str;

    /// Send a line of public chat.
    async fn send(&self, text: &str) -> std::result::Result<(), WorldError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingChat {
        lines: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ChatChannel for RecordingChat {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, text: &str) -> Result<(), WorldError> {
            self.lines.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn chat_channel_is_object_safe() {
        let chat: Box<dyn ChatChannel> = Box::new(RecordingChat {
            lines: Mutex::new(vec![]),
        });
        chat.send("hello").await.unwrap();
        assert_eq!(chat.name(), "recording");
    }
}
