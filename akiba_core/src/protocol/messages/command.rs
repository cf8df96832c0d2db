//! Command type enumeration
//!
//! A single enum over every command the session sends, so channels can be
//! mocked without generics.

use crate::protocol::messages::{
    AniDBCommand,
    auth::{AuthCommand, EncryptCommand, LogoutCommand},
    file::FileCommand,
    mylist::{MyListAddCommand, MyListCommand, MylistState},
};
use crate::protocol::secret::Secret;

#[derive(Debug, Clone)]
pub enum Command {
    Encrypt(EncryptCommand),
    Auth(AuthCommand),
    Logout(LogoutCommand),
    File(FileCommand),
    MyList(MyListCommand),
    MyListAdd(MyListAddCommand),
}

impl Command {
    pub fn encrypt(user: impl Into<String>) -> Self {
        Command::Encrypt(EncryptCommand::new(user))
    }

    pub fn auth(
        user: impl Into<String>,
        pass: impl Into<Secret>,
        client: impl Into<String>,
        clientver: impl Into<String>,
    ) -> Self {
        Command::Auth(AuthCommand::new(user, pass, client, clientver))
    }

    pub fn logout() -> Self {
        Command::Logout(LogoutCommand)
    }

    pub fn file(size: u64, ed2k: impl Into<String>) -> Self {
        Command::File(FileCommand::by_hash(size, ed2k))
    }

    pub fn mylist(size: u64, ed2k: impl Into<String>) -> Self {
        Command::MyList(MyListCommand::by_hash(size, ed2k))
    }

    pub fn mylist_add(size: u64, ed2k: impl Into<String>, state: MylistState, edit: bool) -> Self {
        Command::MyListAdd(MyListAddCommand::by_hash(size, ed2k, state).with_edit(edit))
    }

    fn inner(&self) -> &dyn AniDBCommand {
        match self {
            Command::Encrypt(cmd) => cmd,
            Command::Auth(cmd) => cmd,
            Command::Logout(cmd) => cmd,
            Command::File(cmd) => cmd,
            Command::MyList(cmd) => cmd,
            Command::MyListAdd(cmd) => cmd,
        }
    }

    pub fn name(&self) -> &'static str {
        self.inner().name()
    }

    pub fn requires_auth(&self) -> bool {
        self.inner().requires_auth()
    }

    /// Encode the command without a session tag
    pub fn encode(&self) -> String {
        self.inner().encode()
    }

    /// Encode the command, appending `s={session}` when it requires auth
    pub fn with_session(&self, session: Option<&str>) -> String {
        append_session(self.encode(), self.requires_auth(), session)
    }

    /// Log-safe rendering with secrets and the session key masked
    pub fn masked(&self, session: Option<&str>) -> String {
        append_session(
            self.inner().masked(),
            self.requires_auth(),
            session.map(|_| "***"),
        )
    }
}

fn append_session(mut encoded: String, requires_auth: bool, session: Option<&str>) -> String {
    if let (true, Some(session)) = (requires_auth, session) {
        let separator = if encoded.contains(' ') { '&' } else { ' ' };
        encoded.push(separator);
        encoded.push_str("s=");
        encoded.push_str(session);
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_has_no_session() {
        let cmd = Command::auth("user", "pass", "akiba", "1");
        assert_eq!(cmd.name(), "AUTH");
        assert!(!cmd.requires_auth());
        assert!(!cmd.with_session(Some("abc")).contains("s=abc"));
    }

    #[test]
    fn test_session_appended() {
        let cmd = Command::file(10, "ab");
        assert_eq!(
            cmd.with_session(Some("abc")),
            "FILE size=10&ed2k=ab&fmask=79F8FFF100&amask=F2FCF0C0&s=abc"
        );
    }

    #[test]
    fn test_logout_session_uses_space() {
        assert_eq!(Command::logout().with_session(Some("abc")), "LOGOUT s=abc");
    }

    #[test]
    fn test_masked_hides_password_and_session() {
        let auth = Command::auth("user", "hunter2", "akiba", "1");
        assert!(!auth.masked(None).contains("hunter2"));

        let file = Command::file(10, "ab");
        let masked = file.masked(Some("abc"));
        assert!(masked.ends_with("s=***"));
        assert!(!masked.contains("abc"));
    }

    #[test]
    fn test_mylist_add_edit_flag() {
        let cmd = Command::mylist_add(10, "ab", MylistState::Deleted, true);
        assert_eq!(cmd.name(), "MYLISTADD");
        assert!(cmd.encode().contains("state=3&edit=1"));
    }
}
