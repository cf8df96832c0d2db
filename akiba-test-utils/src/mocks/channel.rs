//! Scripted UDP command channel

use akiba_core::protocol::error::Result;
use akiba_core::protocol::{Command, CommandChannel, ProtocolError, Response, SessionCipher};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Handle on the commands a [`ScriptedChannel`] has sent
///
/// The handle stays valid after the channel moved into a session.
#[derive(Debug, Clone, Default)]
pub struct SentCommands {
    lines: Arc<Mutex<Vec<String>>>,
}

impl SentCommands {
    /// Every encoded command line, session tag included
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().map(|l| l.clone()).unwrap_or_default()
    }

    /// The command names in sending order
    pub fn names(&self) -> Vec<String> {
        self.lines()
            .iter()
            .map(|line| line.split(' ').next().unwrap_or_default().to_string())
            .collect()
    }

    pub fn count(&self, name: &str) -> usize {
        self.names().iter().filter(|n| *n == name).count()
    }

    fn push(&self, line: String) {
        if let Ok(mut lines) = self.lines.lock() {
            lines.push(line);
        }
    }
}

/// Command channel answering from a queue of canned replies
///
/// Replies are consumed in order regardless of the command. Once the queue is
/// empty every command times out, which surfaces unexpected traffic in tests.
///
/// # Examples
///
/// ```rust
/// use akiba_test_utils::ScriptedChannel;
///
/// let channel = ScriptedChannel::new()
///     .reply(200, "sess LOGIN ACCEPTED")
///     .reply(320, "NO SUCH FILE");
/// let sent = channel.sent();
/// assert!(sent.lines().is_empty());
/// ```
#[derive(Debug, Default)]
pub struct ScriptedChannel {
    replies: VecDeque<Result<Response>>,
    sent: SentCommands,
    encrypted: bool,
}

impl ScriptedChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a reply without a data line
    pub fn reply(mut self, code: u16, message: &str) -> Self {
        self.replies.push_back(Ok(Response::new(code, message)));
        self
    }

    /// Queue a reply carrying one data line
    pub fn reply_fields(mut self, code: u16, message: &str, fields: Vec<String>) -> Self {
        self.replies
            .push_back(Ok(Response::new(code, message).with_fields(fields)));
        self
    }

    /// Queue a transport failure
    pub fn fail(mut self, error: ProtocolError) -> Self {
        self.replies.push_back(Err(error));
        self
    }

    /// Queue a successful login
    pub fn login(self) -> Self {
        self.reply(200, "test-session LOGIN ACCEPTED")
    }

    pub fn sent(&self) -> SentCommands {
        self.sent.clone()
    }

    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    pub fn remaining(&self) -> usize {
        self.replies.len()
    }
}

#[async_trait]
impl CommandChannel for ScriptedChannel {
    async fn send(&mut self, command: &Command, session: Option<&str>) -> Result<Response> {
        self.sent.push(command.with_session(session));
        self.replies
            .pop_front()
            .unwrap_or(Err(ProtocolError::Timeout(Duration::ZERO)))
    }

    fn set_cipher(&mut self, cipher: Option<SessionCipher>) {
        self.encrypted = cipher.is_some();
    }
}
