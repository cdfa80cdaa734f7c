use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::document::NodeId;

/// Callback registered with [`Document::add_event_listener`](crate::Document::add_event_listener).
pub type Listener = Rc<dyn Fn(&Event)>;

/// Handle for removing a listener again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub(crate) u64);

/// A bubbling event. Flags use `Cell` so listeners can flip them through `&Event`.
pub struct Event {
    event_type: String,
    target: NodeId,
    current_target: Cell<NodeId>,
    propagation_stopped: Cell<bool>,
    default_prevented: Cell<bool>,
}

impl Event {
    pub fn new(event_type: impl Into<String>, target: NodeId) -> Self {
        Event {
            event_type: event_type.into(),
            target,
            current_target: Cell::new(target),
            propagation_stopped: Cell::new(false),
            default_prevented: Cell::new(false),
        }
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The element the event was dispatched on.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// The element whose listener is running.
    pub fn current_target(&self) -> NodeId {
        self.current_target.get()
    }

    pub(crate) fn set_current_target(&self, id: NodeId) {
        self.current_target.set(id);
    }

    /// Remaining listeners on the current element still run; ancestors don't.
    pub fn stop_propagation(&self) {
        self.propagation_stopped.set(true);
    }

    pub fn propagation_stopped(&self) -> bool {
        self.propagation_stopped.get()
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("type", &self.event_type)
            .field("target", &self.target)
            .field("current_target", &self.current_target.get())
            .field("propagation_stopped", &self.propagation_stopped.get())
            .field("default_prevented", &self.default_prevented.get())
            .finish()
    }
}
