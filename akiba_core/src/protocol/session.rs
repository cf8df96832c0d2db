//! Authenticated AniDB session
//!
//! Wraps a [`CommandChannel`] with login state. Lookups connect on demand.
//! "No such file" and "no such entry" are absent results; every other
//! application error logs out first and is then returned unchanged, so the
//! caller can stop before a rate limit turns into a ban.

use crate::hashing::ContentFingerprint;
use crate::protocol::codec::SessionCipher;
use crate::protocol::error::{ProtocolError, ResponseCode, Result};
use crate::protocol::messages::{Command, FileRecord, MylistState, Response, parse_file_record};
use crate::protocol::secret::Secret;
use crate::protocol::transport::{ConnectionState, StateTransition};
use crate::protocol::{CommandChannel, ProtocolClient};
use log::{debug, info, warn};

/// Login data for a session
#[derive(Debug, Clone)]
pub struct SessionCredentials {
    pub client_name: String,
    pub client_version: String,
    pub username: String,
    pub password: Secret,
    /// Enables encryption when set
    pub api_key: Option<Secret>,
}

impl SessionCredentials {
    pub fn new(
        client_name: impl Into<String>,
        client_version: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<Secret>,
    ) -> Self {
        Self {
            client_name: client_name.into(),
            client_version: client_version.into(),
            username: username.into(),
            password: password.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<Secret>) -> Self {
        let api_key = api_key.into();
        self.api_key = (!api_key.is_empty()).then_some(api_key);
        self
    }
}

pub struct ProtocolSession<C: CommandChannel = ProtocolClient> {
    channel: C,
    credentials: SessionCredentials,
    state: ConnectionState,
}

impl<C: CommandChannel> ProtocolSession<C> {
    pub fn new(channel: C, credentials: SessionCredentials) -> Self {
        Self {
            channel,
            credentials,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Access the underlying channel
    pub fn channel(&self) -> &C {
        &self.channel
    }

    fn transition(&mut self, to: ConnectionState) {
        match StateTransition::new(&self.state, &to).validation_error() {
            None => {
                debug!("Session {} -> {to}", self.state);
                self.state = to;
            }
            Some(message) => debug!("{message}, keeping {}", self.state),
        }
    }

    /// Log in, enabling encryption first when an API key is configured
    ///
    /// A no-op while connected. On failure the session is back to
    /// `Disconnected` and the error is returned.
    pub async fn connect(&mut self) -> Result<()> {
        if self.state.is_connected() {
            return Ok(());
        }

        self.transition(ConnectionState::Connecting);
        match self.login().await {
            Ok(session) => {
                self.transition(ConnectionState::Connected { session });
                Ok(())
            }
            Err(e) => {
                warn!("Login to AniDB failed: {e}");
                self.channel.set_cipher(None);
                self.transition(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    async fn login(&mut self) -> Result<String> {
        if let Some(api_key) = self.credentials.api_key.clone() {
            let command = Command::encrypt(self.credentials.username.clone());
            let response = self.channel.send(&command, None).await?;
            if response.code != ResponseCode::ENCRYPTION_ENABLED {
                return Err(ProtocolError::authentication_failed(format!(
                    "encryption refused: {} {}",
                    response.code, response.message
                )));
            }
            let salt = response
                .first_token()
                .ok_or_else(|| ProtocolError::missing_field("salt"))?;
            self.channel
                .set_cipher(Some(SessionCipher::new(api_key.expose(), salt)));
        }

        let command = Command::auth(
            self.credentials.username.clone(),
            self.credentials.password.clone(),
            self.credentials.client_name.clone(),
            self.credentials.client_version.clone(),
        );
        let response = self.channel.send(&command, None).await?;
        match response.code {
            ResponseCode::LOGIN_ACCEPTED | ResponseCode::LOGIN_ACCEPTED_NEW_VERSION => {
                if response.code == ResponseCode::LOGIN_ACCEPTED_NEW_VERSION {
                    info!("A newer AniDB client version is available");
                }
                response
                    .first_token()
                    .map(str::to_string)
                    .ok_or_else(|| ProtocolError::missing_field("session"))
            }
            _ => Err(response.into_error()),
        }
    }

    /// Send a command on the current session; transport failures end it
    async fn request(&mut self, command: Command) -> Result<Response> {
        let session = self.state.session().map(str::to_string);
        match self.channel.send(&command, session.as_deref()).await {
            Ok(response) => Ok(response),
            Err(e) => {
                self.channel.set_cipher(None);
                self.transition(ConnectionState::Disconnected);
                Err(e)
            }
        }
    }

    /// Log out and turn an unexpected reply into an error
    async fn fail<T>(&mut self, response: Response) -> Result<T> {
        self.disconnect().await;
        Err(response.into_error())
    }

    /// Look up the metadata record of a file by size and digest
    pub async fn query(&mut self, fingerprint: &ContentFingerprint) -> Result<Option<FileRecord>> {
        self.connect().await?;

        let response = self
            .request(Command::file(fingerprint.size, fingerprint.hash.clone()))
            .await?;
        match response.code {
            ResponseCode::FILE => match parse_file_record(&response.fields) {
                Ok(record) => Ok(Some(record)),
                Err(e) => {
                    self.disconnect().await;
                    Err(e)
                }
            },
            ResponseCode::NO_SUCH_FILE => {
                debug!("No AniDB file for {}", fingerprint.hash);
                Ok(None)
            }
            _ => self.fail(response).await,
        }
    }

    /// Bring the list entry of a file to `state`
    ///
    /// The current entry is looked up first: a matching state is left alone,
    /// a missing entry is added and a different state is edited. Any other
    /// lookup reply ends the session with an error. Returns whether the list
    /// now holds the requested state.
    pub async fn mylist_update(
        &mut self,
        fingerprint: &ContentFingerprint,
        state: MylistState,
    ) -> Result<bool> {
        self.connect().await?;

        let lookup = self
            .request(Command::mylist(fingerprint.size, fingerprint.hash.clone()))
            .await?;
        let edit = match lookup.code {
            ResponseCode::MYLIST => {
                let current = MylistState::from_fields(&lookup.fields)?;
                if current == state {
                    debug!("MyList entry already {state}");
                    return Ok(true);
                }
                true
            }
            ResponseCode::NO_SUCH_ENTRY => false,
            _ => return self.fail(lookup).await,
        };

        let response = self
            .request(Command::mylist_add(
                fingerprint.size,
                fingerprint.hash.clone(),
                state,
                edit,
            ))
            .await?;
        match response.code {
            ResponseCode::MYLIST_ENTRY_ADDED | ResponseCode::MYLIST_ENTRY_EDITED => Ok(true),
            code if code.is_fatal() => self.fail(response).await,
            code => {
                warn!("MyList update answered {code} {}", response.message);
                Ok(false)
            }
        }
    }

    /// Log out; failures are only logged
    pub async fn disconnect(&mut self) {
        if let Some(session) = self.state.session().map(str::to_string) {
            match self.channel.send(&Command::logout(), Some(&session)).await {
                Ok(response) => debug!("Logout answered {}", response.code),
                Err(e) => warn!("Logout failed: {e}"),
            }
        }
        self.channel.set_cipher(None);
        self.transition(ConnectionState::Disconnected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::messages::file::tests::sample_fields;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    /// Channel answering from a fixed script and recording what was sent
    #[derive(Default)]
    struct ScriptedChannel {
        replies: VecDeque<Result<Response>>,
        sent: Vec<String>,
        encrypted: bool,
    }

    impl ScriptedChannel {
        fn reply(mut self, code: u16, message: &str) -> Self {
            self.replies.push_back(Ok(Response::new(code, message)));
            self
        }

        fn reply_fields(mut self, code: u16, message: &str, fields: Vec<String>) -> Self {
            self.replies
                .push_back(Ok(Response::new(code, message).with_fields(fields)));
            self
        }

        fn fail(mut self, error: ProtocolError) -> Self {
            self.replies.push_back(Err(error));
            self
        }

        fn names(&self) -> Vec<&str> {
            self.sent
                .iter()
                .map(|line| line.split(' ').next().unwrap_or_default())
                .collect()
        }
    }

    #[async_trait]
    impl CommandChannel for ScriptedChannel {
        async fn send(&mut self, command: &Command, session: Option<&str>) -> Result<Response> {
            self.sent.push(command.with_session(session));
            self.replies
                .pop_front()
                .unwrap_or_else(|| Err(ProtocolError::Timeout(std::time::Duration::ZERO)))
        }

        fn set_cipher(&mut self, cipher: Option<SessionCipher>) {
            self.encrypted = cipher.is_some();
        }
    }

    fn credentials() -> SessionCredentials {
        SessionCredentials::new("akiba", "1", "user", "pass")
    }

    fn fingerprint() -> ContentFingerprint {
        ContentFingerprint::new(std::path::Path::new("/x/a.mkv"), "ab".repeat(16), 100)
    }

    fn mylist_fields(state: u8) -> Vec<String> {
        format!("1|2|3|4|5|0|{state}|0|||")
            .split('|')
            .map(String::from)
            .collect()
    }

    #[tokio::test]
    async fn test_connect_is_idempotent() {
        let channel = ScriptedChannel::default().reply(200, "sess LOGIN ACCEPTED");
        let mut session = ProtocolSession::new(channel, credentials());

        session.connect().await.unwrap();
        session.connect().await.unwrap();

        assert_eq!(session.state().session(), Some("sess"));
        assert_eq!(session.channel().names(), vec!["AUTH"]);
    }

    #[tokio::test]
    async fn test_connect_with_encryption() {
        let channel = ScriptedChannel::default()
            .reply(209, "salty ENCRYPTION ENABLED")
            .reply(201, "sess LOGIN ACCEPTED - NEW VERSION AVAILABLE");
        let mut session =
            ProtocolSession::new(channel, credentials().with_api_key("key"));

        session.connect().await.unwrap();

        assert!(session.channel().encrypted);
        assert_eq!(session.channel().sent[0], "ENCRYPT user=user&type=1");
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_failed_login_returns_to_disconnected() {
        let channel = ScriptedChannel::default().reply(500, "LOGIN FAILED");
        let mut session = ProtocolSession::new(channel, credentials());

        let error = session.connect().await.unwrap_err();

        assert_eq!(error.code(), Some(ResponseCode::LOGIN_FAILED));
        assert_eq!(session.state(), &ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_query_found() {
        let channel = ScriptedChannel::default()
            .reply(200, "sess LOGIN ACCEPTED")
            .reply_fields(220, "FILE", sample_fields());
        let mut session = ProtocolSession::new(channel, credentials());

        let record = session.query(&fingerprint()).await.unwrap().unwrap();

        assert_eq!(record.aid, 23);
        assert!(session.channel().sent[1].ends_with("&s=sess"));
    }

    #[tokio::test]
    async fn test_query_no_such_file_is_absent() {
        let channel = ScriptedChannel::default()
            .reply(200, "sess LOGIN ACCEPTED")
            .reply(320, "NO SUCH FILE");
        let mut session = ProtocolSession::new(channel, credentials());

        assert!(session.query(&fingerprint()).await.unwrap().is_none());
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_query_server_error_disconnects() {
        let channel = ScriptedChannel::default()
            .reply(200, "sess LOGIN ACCEPTED")
            .reply(555, "BANNED")
            .reply(203, "LOGGED OUT");
        let mut session = ProtocolSession::new(channel, credentials());

        let error = session.query(&fingerprint()).await.unwrap_err();

        assert!(error.is_banned());
        assert!(!session.is_connected());
        assert_eq!(session.channel().names(), vec!["AUTH", "FILE", "LOGOUT"]);
    }

    #[tokio::test]
    async fn test_query_timeout_drops_session_without_logout() {
        let channel = ScriptedChannel::default()
            .reply(200, "sess LOGIN ACCEPTED")
            .fail(ProtocolError::Timeout(std::time::Duration::from_secs(30)));
        let mut session = ProtocolSession::new(channel, credentials());

        assert!(session.query(&fingerprint()).await.is_err());
        assert!(!session.is_connected());
        assert_eq!(session.channel().names(), vec!["AUTH", "FILE"]);
    }

    #[tokio::test]
    async fn test_mylist_same_state_is_noop() {
        let channel = ScriptedChannel::default()
            .reply(200, "sess LOGIN ACCEPTED")
            .reply_fields(221, "MYLIST", mylist_fields(1));
        let mut session = ProtocolSession::new(channel, credentials());

        let updated = session
            .mylist_update(&fingerprint(), MylistState::InternalStorage)
            .await
            .unwrap();

        assert!(updated);
        assert_eq!(session.channel().names(), vec!["AUTH", "MYLIST"]);
    }

    #[tokio::test]
    async fn test_mylist_absent_is_added() {
        let channel = ScriptedChannel::default()
            .reply(200, "sess LOGIN ACCEPTED")
            .reply(321, "NO SUCH ENTRY")
            .reply(210, "MYLIST ENTRY ADDED");
        let mut session = ProtocolSession::new(channel, credentials());

        let updated = session
            .mylist_update(&fingerprint(), MylistState::ExternalStorage)
            .await
            .unwrap();

        assert!(updated);
        assert!(session.channel().sent[2].contains("state=2&edit=0"));
    }

    #[tokio::test]
    async fn test_mylist_different_state_is_edited() {
        let channel = ScriptedChannel::default()
            .reply(200, "sess LOGIN ACCEPTED")
            .reply_fields(221, "MYLIST", mylist_fields(1))
            .reply(311, "MYLIST ENTRY EDITED");
        let mut session = ProtocolSession::new(channel, credentials());

        let updated = session
            .mylist_update(&fingerprint(), MylistState::Deleted)
            .await
            .unwrap();

        assert!(updated);
        assert!(session.channel().sent[2].contains("state=3&edit=1"));
    }

    #[tokio::test]
    async fn test_mylist_rejected_add_is_not_fatal() {
        let channel = ScriptedChannel::default()
            .reply(200, "sess LOGIN ACCEPTED")
            .reply(321, "NO SUCH ENTRY")
            .reply(320, "NO SUCH FILE");
        let mut session = ProtocolSession::new(channel, credentials());

        let updated = session
            .mylist_update(&fingerprint(), MylistState::InternalStorage)
            .await
            .unwrap();

        assert!(!updated);
        assert!(session.is_connected());
    }

    #[tokio::test]
    async fn test_mylist_unexpected_lookup_reply_is_an_error() {
        let channel = ScriptedChannel::default()
            .reply(200, "sess LOGIN ACCEPTED")
            .reply(320, "NO SUCH FILE")
            .reply(203, "LOGGED OUT");
        let mut session = ProtocolSession::new(channel, credentials());

        let error = session
            .mylist_update(&fingerprint(), MylistState::InternalStorage)
            .await
            .unwrap_err();

        assert_eq!(error.code(), Some(ResponseCode::NO_SUCH_FILE));
        assert!(!session.is_connected());
        assert_eq!(session.channel().sent.len(), 3);
        assert!(session.channel().sent[2].starts_with("LOGOUT"));
    }

    #[tokio::test]
    async fn test_disconnect_ignores_logout_failure() {
        let channel = ScriptedChannel::default().reply(200, "sess LOGIN ACCEPTED");
        let mut session = ProtocolSession::new(channel, credentials());
        session.connect().await.unwrap();

        session.disconnect().await;

        assert_eq!(session.state(), &ConnectionState::Disconnected);
        assert_eq!(session.channel().sent.last().unwrap(), "LOGOUT s=sess");
    }
}
