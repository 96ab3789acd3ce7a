use serde::{Deserialize, Serialize};

/// The session token handed to every engine call.
///
/// The engine consumes `actor` only; authentication is the session
/// collaborator's concern. An absent session (`Option::None` at call
/// sites) is the anonymous viewer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// The principal this session acts as. Not validated by the engine.
    pub actor: String,
}

impl Session {
    /// Create a session for the given actor.
    pub fn new(actor: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
        }
    }
}

/// Returns the actor behind an optional session, if any.
pub fn session_actor(session: Option<&Session>) -> Option<&str> {
    session.map(|s| s.actor.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_actor_extraction() {
        let session = Session::new("alice");
        assert_eq!(session_actor(Some(&session)), Some("alice"));
        assert_eq!(session_actor(None), None);
    }
}
