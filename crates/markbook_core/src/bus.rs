//! In-process change-notification bus.
//!
//! # Responsibility
//! - Deliver typed change events to registered handlers, synchronously and
//!   in registration order.
//! - Receive advisory storage-level signals raised by other processes
//!   sharing the same physical store.
//!
//! # Invariants
//! - `emit` returns only after every matching handler ran.
//! - An event name already being dispatched on the current stack is never
//!   re-dispatched (cycle guard); the drop is logged.
//! - External signals carry only the physical key; receivers must re-pull
//!   authoritative state instead of trusting any payload.

use crate::model::exam::ExamId;
use crate::model::school::SchoolId;
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;

/// Typed payload of one change notification.
///
/// `name()` yields the stable wire name each external collaborator listens
/// for, including the legacy alias kept for older listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Active school switched (primary notification).
    SchoolChanged { school_id: SchoolId },
    /// Active school switched (legacy-alias notification).
    SchoolChangedLegacy { school_id: SchoolId },
    /// A namespaced logical key was written.
    KeyUpdated { key: String },
    /// An unscoped (global) logical key was written.
    GlobalKeyUpdated { key: String },
    /// Academic year catalog mutated.
    YearsChanged,
    /// Exam type catalog mutated.
    ExamTypesChanged,
    /// Exam catalog mutated.
    ExamsChanged,
    /// Dependent exam selectors were rebuilt; carries a suggested selection.
    ExamSelectionRefreshed { auto_select: Option<ExamId> },
    /// Advisory signal that another process touched a physical key.
    ExternalStorage { physical_key: String },
}

impl ChangeEvent {
    /// Stable wire name of this event.
    pub fn name(&self) -> String {
        match self {
            Self::SchoolChanged { .. } => "schoolChanged".to_string(),
            Self::SchoolChangedLegacy { .. } => "school-changed".to_string(),
            Self::KeyUpdated { key } => format!("storage-update-{key}"),
            Self::GlobalKeyUpdated { key } => format!("storage-update-global-{key}"),
            Self::YearsChanged => "yearChanged".to_string(),
            Self::ExamTypesChanged => "examTypeChanged".to_string(),
            Self::ExamsChanged => "examsUpdated".to_string(),
            Self::ExamSelectionRefreshed { .. } => "examSelectionRefreshed".to_string(),
            Self::ExternalStorage { .. } => "storage".to_string(),
        }
    }
}

type Handler = Rc<dyn Fn(&ChangeEvent)>;

struct Registration {
    event_name: String,
    handler: Handler,
}

/// Process-wide synchronous event bus.
///
/// Single-threaded by design; shared via `Rc` between the store and the
/// services built on it.
#[derive(Default)]
pub struct ChangeBus {
    registrations: RefCell<Vec<Registration>>,
    dispatching: RefCell<Vec<String>>,
}

impl ChangeBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler for one event name.
    ///
    /// Handlers run in registration order. Registering from inside a
    /// handler is allowed; the new handler only sees later events.
    pub fn on(&self, event_name: impl Into<String>, handler: impl Fn(&ChangeEvent) + 'static) {
        self.registrations.borrow_mut().push(Registration {
            event_name: event_name.into(),
            handler: Rc::new(handler),
        });
    }

    /// Dispatches one event to every handler registered for its name.
    ///
    /// Re-emission of a name already on the dispatch stack is dropped to
    /// stop listener-triggers-identical-mutation loops.
    pub fn emit(&self, event: &ChangeEvent) {
        let name = event.name();

        if self.dispatching.borrow().iter().any(|n| n == &name) {
            warn!(
                "event=bus_emit module=bus status=error error_code=reentrant_emit name={name}"
            );
            return;
        }

        // Snapshot matching handlers so handlers may register new ones
        // without holding the borrow across user code.
        let matching: Vec<Handler> = self
            .registrations
            .borrow()
            .iter()
            .filter(|r| r.event_name == name)
            .map(|r| Rc::clone(&r.handler))
            .collect();

        self.dispatching.borrow_mut().push(name);
        for handler in matching {
            handler(event);
        }
        self.dispatching.borrow_mut().pop();
    }

    /// Feeds an advisory cross-process storage signal into the bus.
    pub fn signal_external(&self, physical_key: impl Into<String>) {
        self.emit(&ChangeEvent::ExternalStorage {
            physical_key: physical_key.into(),
        });
    }

    /// Number of registered handlers, over all event names.
    pub fn handler_count(&self) -> usize {
        self.registrations.borrow().len()
    }
}

#[cfg(test)]
mod tests {
    use super::{ChangeBus, ChangeEvent};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn dispatches_in_registration_order() {
        let bus = ChangeBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let first = Rc::clone(&seen);
        bus.on("yearChanged", move |_| first.borrow_mut().push("first"));
        let second = Rc::clone(&seen);
        bus.on("yearChanged", move |_| second.borrow_mut().push("second"));

        bus.emit(&ChangeEvent::YearsChanged);
        assert_eq!(*seen.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn only_matching_event_name_is_delivered() {
        let bus = ChangeBus::new();
        let hits = Rc::new(RefCell::new(0));

        let counter = Rc::clone(&hits);
        bus.on("examTypeChanged", move |_| *counter.borrow_mut() += 1);

        bus.emit(&ChangeEvent::YearsChanged);
        assert_eq!(*hits.borrow(), 0);

        bus.emit(&ChangeEvent::ExamTypesChanged);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn keyed_update_names_include_the_logical_key() {
        let event = ChangeEvent::KeyUpdated {
            key: "exams".to_string(),
        };
        assert_eq!(event.name(), "storage-update-exams");

        let global = ChangeEvent::GlobalKeyUpdated {
            key: "school_list".to_string(),
        };
        assert_eq!(global.name(), "storage-update-global-school_list");
    }

    #[test]
    fn reentrant_emit_of_same_name_is_dropped() {
        let bus = Rc::new(ChangeBus::new());
        let hits = Rc::new(RefCell::new(0));

        let inner_bus = Rc::clone(&bus);
        let counter = Rc::clone(&hits);
        bus.on("yearChanged", move |_| {
            *counter.borrow_mut() += 1;
            // A naive listener echoing the same mutation must not loop.
            inner_bus.emit(&ChangeEvent::YearsChanged);
        });

        bus.emit(&ChangeEvent::YearsChanged);
        assert_eq!(*hits.borrow(), 1);
    }

    #[test]
    fn nested_emit_of_different_name_still_dispatches() {
        let bus = Rc::new(ChangeBus::new());
        let seen = Rc::new(RefCell::new(Vec::new()));

        let inner_bus = Rc::clone(&bus);
        let outer = Rc::clone(&seen);
        bus.on("examsUpdated", move |_| {
            outer.borrow_mut().push("exams");
            inner_bus.emit(&ChangeEvent::ExamSelectionRefreshed { auto_select: None });
        });
        let inner = Rc::clone(&seen);
        bus.on("examSelectionRefreshed", move |_| {
            inner.borrow_mut().push("selection");
        });

        bus.emit(&ChangeEvent::ExamsChanged);
        assert_eq!(*seen.borrow(), vec!["exams", "selection"]);
    }

    #[test]
    fn external_signal_reaches_storage_listeners() {
        let bus = ChangeBus::new();
        let keys = Rc::new(RefCell::new(Vec::new()));

        let sink = Rc::clone(&keys);
        bus.on("storage", move |event| {
            if let ChangeEvent::ExternalStorage { physical_key } = event {
                sink.borrow_mut().push(physical_key.clone());
            }
        });

        bus.signal_external("mhm_v2_exams");
        assert_eq!(*keys.borrow(), vec!["mhm_v2_exams".to_string()]);
    }
}
