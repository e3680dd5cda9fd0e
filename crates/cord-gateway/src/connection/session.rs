//! Resumable session state
//!
//! Survives reconnects; cleared when Discord invalidates the session.

use parking_lot::Mutex;

use crate::protocol::{ReadyPayload, ResumePayload};

#[derive(Debug, Default)]
struct Inner {
    session_id: Option<String>,
    resume_url: Option<String>,
    sequence: Option<u64>,
}

/// Session id, resume url and last sequence number
#[derive(Debug, Default)]
pub struct SessionState {
    inner: Mutex<Inner>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_id(&self) -> Option<String> {
        self.inner.lock().session_id.clone()
    }

    pub fn resume_url(&self) -> Option<String> {
        self.inner.lock().resume_url.clone()
    }

    pub fn sequence(&self) -> Option<u64> {
        self.inner.lock().sequence
    }

    /// Record the sequence of a dispatch
    pub fn set_sequence(&self, sequence: u64) {
        self.inner.lock().sequence = Some(sequence);
    }

    pub fn store_ready(&self, ready: ReadyPayload) {
        let mut inner = self.inner.lock();
        inner.session_id = Some(ready.session_id);
        inner.resume_url = ready.resume_gateway_url;
    }

    pub fn is_resumable(&self) -> bool {
        let inner = self.inner.lock();
        inner.session_id.is_some() && inner.sequence.is_some()
    }

    /// RESUME payload, if there is a session to resume
    pub fn resume_payload(&self, token: &str) -> Option<ResumePayload> {
        let inner = self.inner.lock();
        Some(ResumePayload {
            token: token.to_string(),
            session_id: inner.session_id.clone()?,
            seq: inner.sequence?,
        })
    }

    pub fn clear(&self) {
        *self.inner.lock() = Inner::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_requires_session_and_sequence() {
        let session = SessionState::new();
        assert!(session.resume_payload("t").is_none());

        session.store_ready(ReadyPayload {
            session_id: "abc".to_string(),
            resume_gateway_url: Some("wss://resume.discord.gg".to_string()),
        });
        assert!(!session.is_resumable());

        session.set_sequence(42);
        let payload = session.resume_payload("t").unwrap();
        assert_eq!(payload.session_id, "abc");
        assert_eq!(payload.seq, 42);
        assert_eq!(session.resume_url().as_deref(), Some("wss://resume.discord.gg"));

        session.clear();
        assert!(!session.is_resumable());
        assert!(session.resume_url().is_none());
    }
}
