use std::collections::BTreeMap;
use std::net::SocketAddr;

use bytes::Bytes;
use tokio::sync::{mpsc, watch};

/// Unique identifier for one client connection, assigned by the accept loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Connection-lifecycle states. Opcodes are registered against the set of
/// states in which they are legal; packets arriving outside that set are
/// dropped without closing the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Handshake,
    VersionOk,
    Authenticated,
    InWorld,
    ReturningToSelect,
    Closed,
}

impl SessionState {
    /// Rank used to detect regressions past InWorld (which clear the
    /// character binding).
    fn rank(self) -> u8 {
        match self {
            SessionState::Handshake => 0,
            SessionState::VersionOk => 1,
            SessionState::Authenticated => 2,
            SessionState::ReturningToSelect => 2,
            SessionState::InWorld => 3,
            SessionState::Closed => 0,
        }
    }
}

/// Why a session was asked to close. Carried for operator-visible logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    ReadError,
    WriteError,
    EgressOverflow,
    RateLimited,
    ClientQuit,
    ServerShutdown,
}

/// One client connection as seen by the tick thread.
///
/// All fields are owned and mutated by the tick thread only. The reader and
/// writer tasks communicate in via the ingress channel and out via `egress`.
#[derive(Debug)]
pub struct Session {
    pub id: SessionId,
    pub peer: SocketAddr,
    state: SessionState,
    /// Packets queued by `send` during phases 0-3, drained at Phase 4.
    output: Vec<Bytes>,
    /// Bounded handoff to the writer task.
    egress: mpsc::Sender<Bytes>,
    /// Close signal observed by the reader task.
    close_tx: watch::Sender<bool>,
    /// Account name once authenticated.
    pub account: Option<String>,
    /// Char id of the bound in-world character, if any.
    char_id: Option<i32>,
    close_reason: Option<CloseReason>,
}

impl Session {
    pub fn new(
        id: SessionId,
        peer: SocketAddr,
        egress: mpsc::Sender<Bytes>,
        close_tx: watch::Sender<bool>,
    ) -> Self {
        Self {
            id,
            peer,
            state: SessionState::Handshake,
            output: Vec::new(),
            egress,
            close_tx,
            account: None,
            char_id: None,
            close_reason: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Transition the state machine. Regressing past InWorld clears the
    /// character binding (a session binds at most one character at a time).
    pub fn set_state(&mut self, next: SessionState) {
        if self.state == SessionState::InWorld && next.rank() < SessionState::InWorld.rank() {
            self.char_id = None;
        }
        self.state = next;
    }

    pub fn bind_char(&mut self, char_id: i32) {
        debug_assert!(self.char_id.is_none(), "session already bound to a character");
        self.char_id = Some(char_id);
    }

    pub fn char_id(&self) -> Option<i32> {
        self.char_id
    }

    /// Queue one outgoing packet. Never blocks and never performs I/O;
    /// the Output system flushes the buffer once per tick.
    pub fn send(&mut self, packet: Vec<u8>) {
        self.output.push(Bytes::from(packet));
    }

    pub fn pending_output(&self) -> usize {
        self.output.len()
    }

    /// Move buffered output into the egress channel. A full egress means the
    /// client is consuming slower than the server produces; the session is
    /// marked for close instead of blocking the tick thread.
    pub fn flush_output(&mut self) -> Result<usize, CloseReason> {
        let mut flushed = 0;
        while flushed < self.output.len() {
            match self.egress.try_send(self.output[flushed].clone()) {
                Ok(()) => flushed += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    self.output.drain(..flushed);
                    return Err(CloseReason::EgressOverflow);
                }
                // The writer task dropped its receiver after a write error.
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    self.output.drain(..flushed);
                    return Err(CloseReason::WriteError);
                }
            }
        }
        self.output.clear();
        Ok(flushed)
    }

    /// Idempotent close request: signals the reader task to stop and records
    /// the reason. Actual teardown happens when the reader reports
    /// disconnection back through the ingress channel.
    pub fn close(&mut self, reason: CloseReason) {
        if self.close_reason.is_some() {
            return;
        }
        self.close_reason = Some(reason);
        self.set_state(SessionState::Closed);
        let _ = self.close_tx.send(true);
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.close_reason
    }

    pub fn is_closed(&self) -> bool {
        self.state == SessionState::Closed
    }
}

/// All live sessions, owned by the tick thread. No lock: the I/O tasks never
/// touch this store.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: BTreeMap<SessionId, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, session: Session) {
        self.sessions.insert(session.id, session);
    }

    pub fn remove(&mut self, id: SessionId) -> Option<Session> {
        self.sessions.remove(&id)
    }

    pub fn get(&self, id: SessionId) -> Option<&Session> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&mut self, id: SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Session ids in ascending order. Drain order is deterministic because
    /// the backing map is ordered.
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().copied().collect()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Session> {
        self.sessions.values_mut()
    }

    /// Queue a packet for a session if it is still live.
    pub fn send_to(&mut self, id: SessionId, packet: Vec<u8>) {
        if let Some(session) = self.sessions.get_mut(&id) {
            session.send(packet);
        }
    }
}
