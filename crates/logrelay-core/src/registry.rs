//! Active storage node selection shared across consumers.

use std::sync::Mutex;

#[derive(Debug)]
struct Node {
    name: String,
    usable: bool,
}

#[derive(Debug)]
struct State {
    nodes: Vec<Node>,
    active: Option<usize>,
}

/// Shared record of which storage node consumers should currently prefer.
///
/// The registry only reacts to explicit signals from consumers; it is not a
/// health-check system. Once a node is marked inactive it stays that way
/// until the registry is rebuilt. Reads and writes are atomic per operation
/// but there is no cross-operation critical section: a consumer that reads
/// a stale active value simply fails over again on its next redelivery.
#[derive(Debug)]
pub struct ActiveStoreRegistry {
    state: Mutex<State>,
}

impl ActiveStoreRegistry {
    /// Build a registry over an ordered list of storage node names. The
    /// first node starts out active.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let nodes: Vec<Node> = names
            .into_iter()
            .map(|name| Node {
                name: name.into(),
                usable: true,
            })
            .collect();
        let active = if nodes.is_empty() { None } else { Some(0) };
        Self {
            state: Mutex::new(State { nodes, active }),
        }
    }

    /// Mark a node as not-to-be-used. When it was the active node,
    /// selection advances to the next usable one, or to none when every
    /// node is marked.
    pub fn set_inactive(&self, name: &str) {
        let mut state = self.lock();
        for node in &mut state.nodes {
            if node.name == name {
                node.usable = false;
            }
        }
        let active_unusable = match state.active {
            Some(idx) => !state.nodes[idx].usable,
            None => true,
        };
        if active_unusable {
            state.active = state.nodes.iter().position(|n| n.usable);
        }
    }

    /// The node a new redelivery should target, if any remains usable.
    pub fn current_active(&self) -> Option<String> {
        let state = self.lock();
        state.active.map(|idx| state.nodes[idx].name.clone())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means another consumer panicked mid-update;
        // the state itself is always consistent.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
