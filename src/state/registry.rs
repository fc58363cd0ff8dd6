//! Connection registry: live sessions and the identity each one is logged in as

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::protocol::ServerMessage;
use crate::types::{SessionId, Username};

/// Frames a session may have queued before it is treated as stalled
pub const OUTBOX_CAPACITY: usize = 256;

/// Outbound queue of a single connection
pub type Outbox = mpsc::Sender<ServerMessage>;

struct SessionEntry {
    identity: Option<Username>,
    /// `None` once the queue overflowed; the connection loop then drains and exits
    outbox: Mutex<Option<Outbox>>,
    seq: u64,
}

impl SessionEntry {
    fn push(&self, session_id: &str, msg: ServerMessage) -> bool {
        let mut slot = match self.outbox.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(outbox) = slot.as_ref() else {
            return false;
        };

        match outbox.try_send(msg) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                tracing::warn!(session = %session_id, "Outbox full, dropping stalled session");
                *slot = None;
                false
            }
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// Maps each live session to its (optional) identity and outbound queue.
///
/// Several sessions may be bound to the same identity at once; nothing here
/// enforces one login per user.
#[derive(Default)]
pub struct ConnectionRegistry {
    sessions: HashMap<SessionId, SessionEntry>,
    /// Registration order, for stable iteration
    order: BTreeMap<u64, SessionId>,
    next_seq: u64,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a session with no identity. Re-registering an id replaces its outbox.
    pub fn register(&mut self, session_id: SessionId, outbox: Outbox) {
        self.unregister(&session_id);

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.insert(seq, session_id.clone());
        self.sessions.insert(
            session_id,
            SessionEntry {
                identity: None,
                outbox: Mutex::new(Some(outbox)),
                seq,
            },
        );
    }

    /// Set the identity of a session, overwriting any previous one.
    /// Returns false (and does nothing) if the session is unknown.
    pub fn bind(&mut self, session_id: &str, identity: Username) -> bool {
        match self.sessions.get_mut(session_id) {
            Some(entry) => {
                entry.identity = Some(identity);
                true
            }
            None => false,
        }
    }

    /// Remove a session, returning the identity it was bound to
    pub fn unregister(&mut self, session_id: &str) -> Option<Username> {
        let entry = self.sessions.remove(session_id)?;
        self.order.remove(&entry.seq);
        entry.identity
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn identity_of(&self, session_id: &str) -> Option<&Username> {
        self.sessions.get(session_id)?.identity.as_ref()
    }

    fn entries(&self) -> impl Iterator<Item = (&SessionId, &SessionEntry)> {
        self.order
            .values()
            .filter_map(|id| self.sessions.get(id).map(|entry| (id, entry)))
    }

    /// First session (in registration order) bound to `identity`
    pub fn lookup_session_for_identity(&self, identity: &str) -> Option<&SessionId> {
        self.entries()
            .find(|(_, entry)| entry.identity.as_deref() == Some(identity))
            .map(|(id, _)| id)
    }

    /// Identities of all logged-in sessions, in registration order.
    /// An identity logged in from several sessions appears once per session.
    pub fn snapshot_identities(&self) -> Vec<Username> {
        self.entries()
            .filter_map(|(_, entry)| entry.identity.clone())
            .collect()
    }

    /// Queue `msg` for one session. Returns false if the session is gone or stalled.
    pub fn deliver(&self, session_id: &str, msg: ServerMessage) -> bool {
        match self.sessions.get(session_id) {
            Some(entry) => entry.push(session_id, msg),
            None => false,
        }
    }

    /// Queue `msg` for every session, logged in or not. Returns the number reached.
    pub fn broadcast(&self, msg: &ServerMessage) -> usize {
        self.entries()
            .filter(|(id, entry)| entry.push(id, msg.clone()))
            .count()
    }
}
