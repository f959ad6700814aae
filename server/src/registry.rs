//! Session lifecycle tracking for the multiplayer server
//!
//! This module owns the mapping from session identifiers to transport
//! addresses: creation on connect, removal on disconnect, activity-based
//! timeout detection, and capacity enforcement. A session id is stable for
//! the lifetime of one connection; a reconnecting client always receives a
//! fresh id (and therefore a fresh player entity in the world).

use log::info;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// One connected session: transport address plus liveness metadata.
#[derive(Debug)]
pub struct Session {
    /// Unique session identifier assigned by the server
    pub id: u32,
    /// Network address for sending responses
    pub addr: SocketAddr,
    /// Optional display name supplied at connect time
    pub name: Option<String>,
    /// Last time we received any packet from this session
    pub last_seen: Instant,
}

impl Session {
    pub fn new(id: u32, addr: SocketAddr, name: Option<String>) -> Self {
        Self {
            id,
            addr,
            name,
            last_seen: Instant::now(),
        }
    }

    /// Returns true if no packets have been received within the timeout.
    pub fn is_timed_out(&self, timeout: Duration) -> bool {
        self.last_seen.elapsed() > timeout
    }
}

/// Registry of all connected sessions.
///
/// Enforces the server capacity limit, hands out monotonically increasing
/// session ids, and supports address-based lookup for incoming datagrams.
pub struct SessionRegistry {
    sessions: HashMap<u32, Session>,
    next_session_id: u32,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            sessions: HashMap::new(),
            next_session_id: 1,
            max_sessions,
        }
    }

    /// Registers a new session for the given address.
    ///
    /// Returns Some(session_id) on success, None when the server is at
    /// capacity. Ids are never reused within a server run.
    pub fn add_session(&mut self, addr: SocketAddr, name: Option<String>) -> Option<u32> {
        if self.sessions.len() >= self.max_sessions {
            return None;
        }

        let session_id = self.next_session_id;
        self.next_session_id += 1;

        let session = Session::new(session_id, addr, name);
        info!("Session {} connected from {}", session_id, addr);
        self.sessions.insert(session_id, session);

        Some(session_id)
    }

    /// Removes a session. Returns true if it existed.
    pub fn remove_session(&mut self, session_id: &u32) -> bool {
        if let Some(session) = self.sessions.remove(session_id) {
            info!("Session {} disconnected", session.id);
            true
        } else {
            false
        }
    }

    /// Associates an incoming datagram with an existing session.
    pub fn find_by_addr(&self, addr: SocketAddr) -> Option<u32> {
        self.sessions
            .iter()
            .find(|(_, session)| session.addr == addr)
            .map(|(id, _)| *id)
    }

    /// Refreshes the activity timestamp for a session.
    pub fn touch(&mut self, session_id: u32) {
        if let Some(session) = self.sessions.get_mut(&session_id) {
            session.last_seen = Instant::now();
        }
    }

    /// Removes and returns all sessions that have gone silent.
    pub fn check_timeouts(&mut self, timeout: Duration) -> Vec<u32> {
        let timed_out: Vec<u32> = self
            .sessions
            .iter()
            .filter(|(_, session)| session.is_timed_out(timeout))
            .map(|(id, _)| *id)
            .collect();

        for session_id in &timed_out {
            self.remove_session(session_id);
        }

        timed_out
    }

    /// All session ids and addresses, for snapshot broadcast.
    pub fn addrs(&self) -> Vec<(u32, SocketAddr)> {
        self.sessions
            .iter()
            .map(|(id, session)| (*id, session.addr))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn test_addr() -> SocketAddr {
        "127.0.0.1:8080".parse().unwrap()
    }

    fn test_addr2() -> SocketAddr {
        "127.0.0.1:8081".parse().unwrap()
    }

    #[test]
    fn test_session_creation() {
        let addr = test_addr();
        let session = Session::new(1, addr, Some("alice".to_string()));

        assert_eq!(session.id, 1);
        assert_eq!(session.addr, addr);
        assert_eq!(session.name.as_deref(), Some("alice"));
    }

    #[test]
    fn test_session_timeout() {
        let mut session = Session::new(1, test_addr(), None);

        assert!(!session.is_timed_out(Duration::from_secs(1)));

        session.last_seen = Instant::now() - Duration::from_secs(2);

        assert!(session.is_timed_out(Duration::from_secs(1)));
    }

    #[test]
    fn test_registry_creation() {
        let registry = SessionRegistry::new(5);
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
    }

    #[test]
    fn test_add_session_assigns_fresh_ids() {
        let mut registry = SessionRegistry::new(3);

        let id1 = registry.add_session(test_addr(), None).unwrap();
        let id2 = registry.add_session(test_addr2(), None).unwrap();

        assert_eq!(id1, 1);
        assert_eq!(id2, 2);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_add_session_at_capacity() {
        let mut registry = SessionRegistry::new(1);

        assert!(registry.add_session(test_addr(), None).is_some());
        assert!(registry.add_session(test_addr2(), None).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_ids_not_reused_after_reconnect() {
        let mut registry = SessionRegistry::new(2);

        let id1 = registry.add_session(test_addr(), None).unwrap();
        registry.remove_session(&id1);

        // Same address reconnecting gets a brand-new session id.
        let id2 = registry.add_session(test_addr(), None).unwrap();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_remove_session() {
        let mut registry = SessionRegistry::new(2);
        let id = registry.add_session(test_addr(), None).unwrap();

        assert!(registry.remove_session(&id));
        assert!(registry.is_empty());
        assert!(!registry.remove_session(&id));
    }

    #[test]
    fn test_find_by_addr() {
        let mut registry = SessionRegistry::new(2);
        let id1 = registry.add_session(test_addr(), None).unwrap();
        let _id2 = registry.add_session(test_addr2(), None).unwrap();

        assert_eq!(registry.find_by_addr(test_addr()), Some(id1));

        let unknown: SocketAddr = "192.168.1.1:9999".parse().unwrap();
        assert_eq!(registry.find_by_addr(unknown), None);
    }

    #[test]
    fn test_check_timeouts_removes_silent_sessions() {
        let mut registry = SessionRegistry::new(3);
        let id1 = registry.add_session(test_addr(), None).unwrap();
        let id2 = registry.add_session(test_addr2(), None).unwrap();

        registry
            .sessions
            .get_mut(&id1)
            .unwrap()
            .last_seen = Instant::now() - Duration::from_secs(10);

        let removed = registry.check_timeouts(Duration::from_secs(5));
        assert_eq!(removed, vec![id1]);
        assert_eq!(registry.len(), 1);
        assert!(registry.find_by_addr(test_addr2()) == Some(id2));
    }

    #[test]
    fn test_touch_refreshes_activity() {
        let mut registry = SessionRegistry::new(2);
        let id = registry.add_session(test_addr(), None).unwrap();

        registry
            .sessions
            .get_mut(&id)
            .unwrap()
            .last_seen = Instant::now() - Duration::from_secs(10);
        registry.touch(id);

        let removed = registry.check_timeouts(Duration::from_secs(5));
        assert!(removed.is_empty());
    }

    #[test]
    fn test_addrs_lists_all_sessions() {
        let mut registry = SessionRegistry::new(3);
        let id1 = registry.add_session(test_addr(), None).unwrap();
        let id2 = registry.add_session(test_addr2(), None).unwrap();

        let mut addrs = registry.addrs();
        addrs.sort_by_key(|(id, _)| *id);
        assert_eq!(addrs, vec![(id1, test_addr()), (id2, test_addr2())]);
    }
}
