//! Input Events and Listener Registry
//!
//! The host delivers raw press/release events; only events with a live
//! subscription reach the engine. Subscriptions are guards owned by the
//! active challenge, so tearing the challenge down on any path releases
//! them.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use serde::{Serialize, Deserialize};
use tracing::{trace, warn};

use crate::qte::spec::InputHandle;

/// Press or release.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPhase {
    /// Input went down.
    Pressed,
    /// Input went up.
    Released,
}

/// Raw input event from the host.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    /// Input action.
    pub handle: InputHandle,
    /// Edge.
    pub phase: InputPhase,
}

impl InputEvent {
    /// Press of `handle`.
    pub fn pressed(handle: impl Into<InputHandle>) -> Self {
        Self {
            handle: handle.into(),
            phase: InputPhase::Pressed,
        }
    }

    /// Release of `handle`.
    pub fn released(handle: impl Into<InputHandle>) -> Self {
        Self {
            handle: handle.into(),
            phase: InputPhase::Released,
        }
    }
}

/// What a listener does with a matching event.
///
/// Ordered so prompt listeners run before the press that may tear the
/// prompt down.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ListenerRole {
    /// Swap the prompt between idle and pressed icons.
    Prompt,
    /// Feed the press into the challenge.
    KeyPress,
}

/// Subscription identifier.
pub type SubscriptionId = u64;

#[derive(Debug)]
struct Listener {
    handle: InputHandle,
    phase: InputPhase,
    role: ListenerRole,
}

#[derive(Debug, Default)]
struct Registry {
    next_id: SubscriptionId,
    listeners: BTreeMap<SubscriptionId, Listener>,
}

/// Single-threaded listener registry shared between the engine and the
/// subscription guards it hands out.
#[derive(Clone, Debug, Default)]
pub struct InputRouter {
    registry: Rc<RefCell<Registry>>,
}

impl InputRouter {
    /// Empty router.
    pub fn new() -> Self {
        Self::default()
    }

    /// Listen for `phase` edges of `handle`.
    pub fn subscribe(&self, handle: InputHandle, phase: InputPhase, role: ListenerRole) -> InputSubscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;

        trace!(id, %handle, ?phase, ?role, "input listener registered");
        registry.listeners.insert(id, Listener { handle, phase, role });

        InputSubscription {
            registry: Rc::downgrade(&self.registry),
            id: Some(id),
        }
    }

    /// Roles listening for this event, in registration order.
    pub fn listeners_for(&self, event: &InputEvent) -> Vec<ListenerRole> {
        self.registry
            .borrow()
            .listeners
            .values()
            .filter(|l| l.handle == event.handle && l.phase == event.phase)
            .map(|l| l.role)
            .collect()
    }

    /// Number of live subscriptions.
    pub fn active_count(&self) -> usize {
        self.registry.borrow().listeners.len()
    }
}

/// Live subscription. Released on drop or by [`release`](Self::release);
/// releasing twice is a no-op.
#[derive(Debug)]
pub struct InputSubscription {
    registry: Weak<RefCell<Registry>>,
    id: Option<SubscriptionId>,
}

impl InputSubscription {
    /// Still registered.
    pub fn is_active(&self) -> bool {
        self.id.is_some()
    }

    /// Deregister now.
    pub fn release(&mut self) {
        let Some(id) = self.id.take() else {
            return;
        };
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let borrowed = registry.try_borrow_mut();
        match borrowed {
            Ok(mut registry) => {
                registry.listeners.remove(&id);
                trace!(id, "input listener released");
            }
            Err(_) => warn!(id, "input registry busy, listener leaked"),
        }
    }
}

impl Drop for InputSubscription {
    fn drop(&mut self) {
        self.release();
    }
}
