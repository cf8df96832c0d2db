//! Session setup and teardown: ENCRYPT, AUTH and LOGOUT

use crate::protocol::PROTOCOL_VERSION;
use crate::protocol::messages::AniDBCommand;
use crate::protocol::secret::Secret;

/// Encryption type that derives the key from the API key and a salt
pub const ENCRYPTION_TYPE_API_KEY: u8 = 1;

/// ENCRYPT command, answered with `209 {salt} ENCRYPTION ENABLED`
#[derive(Debug, Clone)]
pub struct EncryptCommand {
    pub user: String,
    pub kind: u8,
}

impl EncryptCommand {
    pub fn new(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            kind: ENCRYPTION_TYPE_API_KEY,
        }
    }
}

impl AniDBCommand for EncryptCommand {
    fn name(&self) -> &'static str {
        "ENCRYPT"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![("user", self.user.clone()), ("type", self.kind.to_string())]
    }
}

/// AUTH command for authenticating with the AniDB server
#[derive(Debug, Clone)]
pub struct AuthCommand {
    pub user: String,
    pub pass: Secret,
    pub protover: String,
    pub client: String,
    pub clientver: String,
    pub enc: String,
}

impl AuthCommand {
    pub fn new(
        user: impl Into<String>,
        pass: impl Into<Secret>,
        client: impl Into<String>,
        clientver: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            pass: pass.into(),
            protover: PROTOCOL_VERSION.to_string(),
            client: client.into(),
            clientver: clientver.into(),
            enc: "utf8".to_string(),
        }
    }
}

impl AniDBCommand for AuthCommand {
    fn name(&self) -> &'static str {
        "AUTH"
    }

    // AUTH user={str}&pass={str}&protover={int}&client={str}&clientver={int}&enc={str}
    fn parameters(&self) -> Vec<(&'static str, String)> {
        vec![
            ("user", self.user.clone()),
            ("pass", self.pass.expose().to_string()),
            ("protover", self.protover.clone()),
            ("client", self.client.clone()),
            ("clientver", self.clientver.clone()),
            ("enc", self.enc.clone()),
        ]
    }

    fn secret_parameters(&self) -> &'static [&'static str] {
        &["pass"]
    }
}

/// LOGOUT command; the session tag is appended on send
#[derive(Debug, Clone, Default)]
pub struct LogoutCommand;

impl AniDBCommand for LogoutCommand {
    fn name(&self) -> &'static str {
        "LOGOUT"
    }

    fn parameters(&self) -> Vec<(&'static str, String)> {
        Vec::new()
    }
}
