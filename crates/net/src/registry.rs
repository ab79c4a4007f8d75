use std::collections::HashMap;
use std::sync::Arc;

use session::{SessionId, SessionState};

use crate::packet::PacketReader;

/// Handler for one opcode. Plain function values so the table can be frozen
/// after registration and shared without lifetimes.
pub type Handler<Ctx> = fn(&mut Ctx, SessionId, &mut PacketReader<'_>);

struct Entry<Ctx> {
    states: &'static [SessionState],
    handler: Handler<Ctx>,
}

/// Immutable-after-boot set of registered opcodes, shared with the reader
/// tasks so unknown opcodes are dropped before they reach the ingress
/// channel.
#[derive(Debug)]
pub struct OpcodeSet {
    known: [bool; 256],
}

impl OpcodeSet {
    pub fn contains(&self, opcode: u8) -> bool {
        self.known[opcode as usize]
    }
}

/// Opcode -> (allowed states, handler) routing table.
///
/// Dispatch runs on the tick thread: the session's current state gates the
/// handler, and a mismatch drops the packet with a debug log but never
/// closes the session (clients race state transitions).
pub struct Registry<Ctx> {
    entries: HashMap<u8, Entry<Ctx>>,
}

impl<Ctx> Default for Registry<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> Registry<Ctx> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register a handler. Duplicate registration is a boot-time programming
    /// error.
    pub fn register(
        &mut self,
        opcode: u8,
        states: &'static [SessionState],
        handler: Handler<Ctx>,
    ) {
        let prev = self.entries.insert(opcode, Entry { states, handler });
        assert!(prev.is_none(), "duplicate handler for opcode {opcode}");
    }

    pub fn opcode_set(&self) -> Arc<OpcodeSet> {
        let mut known = [false; 256];
        for &opcode in self.entries.keys() {
            known[opcode as usize] = true;
        }
        Arc::new(OpcodeSet { known })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dispatch one payload (opcode byte + fields). Returns true when a
    /// handler ran.
    pub fn dispatch(
        &self,
        ctx: &mut Ctx,
        session_id: SessionId,
        state: SessionState,
        payload: &[u8],
    ) -> bool {
        let Some(&opcode) = payload.first() else {
            return false;
        };
        let Some(entry) = self.entries.get(&opcode) else {
            tracing::debug!(%session_id, opcode, "dropping unknown opcode");
            return false;
        };
        if !entry.states.contains(&state) {
            tracing::debug!(%session_id, opcode, ?state, "dropping opcode outside allowed states");
            return false;
        }
        let mut reader = PacketReader::new(&payload[1..]);
        (entry.handler)(ctx, session_id, &mut reader);
        true
    }
}
