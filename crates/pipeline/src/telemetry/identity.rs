//! Session/agent identity used to correlate usage records.

use std::sync::LazyLock;

use sha2::{Digest, Sha256};
use uuid::Uuid;

static PROCESS_IDENTITY: LazyLock<Identity> = LazyLock::new(|| Identity {
    session_id: Uuid::new_v4(),
    agent_id: Uuid::new_v4(),
});

/// A session/agent identifier pair. Purely for log correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub session_id: Uuid,
    pub agent_id: Uuid,
}

impl Identity {
    /// Derive a stable identity from a name: the SHA-256 digest is split
    /// into the session and agent halves.
    pub fn for_name(name: &str) -> Self {
        let digest = Sha256::digest(name.as_bytes());
        let mut session = [0u8; 16];
        let mut agent = [0u8; 16];
        session.copy_from_slice(&digest[..16]);
        agent.copy_from_slice(&digest[16..]);
        Self {
            session_id: uuid::Builder::from_random_bytes(session).into_uuid(),
            agent_id: uuid::Builder::from_random_bytes(agent).into_uuid(),
        }
    }

    /// Identity fixed for the lifetime of this process.
    pub fn process() -> Self {
        *PROCESS_IDENTITY
    }

    /// Named identity when a name is configured, process identity otherwise.
    pub fn resolve(name: Option<&str>) -> Self {
        match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => Self::for_name(name),
            None => Self::process(),
        }
    }
}
