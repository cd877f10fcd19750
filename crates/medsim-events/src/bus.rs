//! Synchronous, re-entrant publish/subscribe bus.
//!
//! Handlers run in subscription order, on the publisher's stack. A handler
//! may publish again; the nested dispatch completes before the outer one
//! moves to its next subscriber. Each publish works on a snapshot of the
//! subscriber list, so subscribing or unsubscribing mid-dispatch only
//! affects later publishes.

use std::cell::{Cell, RefCell};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use medsim_types::{AgentKind, EventKind, LogEntry, SimEvent};

use crate::context::AgentContext;
use crate::error::HandlerError;

/// Default limit on nested publishes.
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Something that reacts to published events.
pub trait EventHandler: Send + Sync {
    /// React to `event`. Errors are logged by the bus and never propagate.
    fn handle(&self, event: &SimEvent, cx: &mut AgentContext<'_>) -> Result<(), HandlerError>;
}

/// Adapter so plain closures can subscribe.
struct FnHandler<F>(F);

impl<F> EventHandler for FnHandler<F>
where
    F: Fn(&SimEvent, &mut AgentContext<'_>) -> Result<(), HandlerError> + Send + Sync,
{
    fn handle(&self, event: &SimEvent, cx: &mut AgentContext<'_>) -> Result<(), HandlerError> {
        (self.0)(event, cx)
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

/// Outcome of one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
    /// Whether the publish was dropped by the cascade depth guard.
    pub suppressed: bool,
}

struct Subscription {
    id: SubscriptionId,
    kind: EventKind,
    handler: Arc<dyn EventHandler>,
}

/// Decrements the dispatch depth when a publish unwinds or returns.
struct DepthGuard<'a>(&'a Cell<usize>);

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get().saturating_add(1));
        Self(depth)
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.0.set(self.0.get().saturating_sub(1));
    }
}

/// The event bus for one coordination domain.
///
/// The bus is single-threaded: it is owned by the orchestrator and reached
/// through `&EventBus` from inside handlers.
pub struct EventBus {
    subscriptions: RefCell<Vec<Subscription>>,
    next_id: Cell<u64>,
    depth: Cell<usize>,
    max_depth: usize,
}

impl EventBus {
    /// Create a bus with the default depth limit.
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DEPTH)
    }

    /// Create a bus that drops publishes nested `max_depth` deep or more.
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            subscriptions: RefCell::new(Vec::new()),
            next_id: Cell::new(0),
            depth: Cell::new(0),
            max_depth: max_depth.max(1),
        }
    }

    /// Register `handler` for events of `kind`.
    pub fn subscribe(&self, kind: EventKind, handler: Arc<dyn EventHandler>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(self.next_id.get().saturating_add(1));
        self.subscriptions.borrow_mut().push(Subscription { id, kind, handler });
        id
    }

    /// Register a closure for events of `kind`.
    pub fn subscribe_fn<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&SimEvent, &mut AgentContext<'_>) -> Result<(), HandlerError>
            + Send
            + Sync
            + 'static,
    {
        self.subscribe(kind, Arc::new(FnHandler(handler)))
    }

    /// Remove a subscription. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let before = subscriptions.len();
        subscriptions.retain(|sub| sub.id != id);
        subscriptions.len() != before
    }

    /// Number of handlers registered for `kind`.
    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscriptions
            .borrow()
            .iter()
            .filter(|sub| sub.kind == kind)
            .count()
    }

    /// Current nesting depth (0 outside any dispatch).
    pub fn depth(&self) -> usize {
        self.depth.get()
    }

    /// Deliver `event` to every subscriber of its kind.
    ///
    /// Prefer [`AgentContext::publish`], which calls this with the right
    /// context.
    pub fn dispatch(&self, event: &SimEvent, cx: &mut AgentContext<'_>) -> DispatchReport {
        let kind = event.kind();
        let mut report = DispatchReport::default();

        if self.depth.get() >= self.max_depth {
            report.suppressed = true;
            cx.log(
                LogEntry::new(
                    cx.now(),
                    AgentKind::System,
                    "CASCADE_DEPTH_EXCEEDED",
                    format!("Dropped {kind}: cascade depth limit {} reached", self.max_depth),
                )
                .field("event", kind.to_string())
                .field("zone", event.zone()),
            );
            return report;
        }

        let targets: Vec<Arc<dyn EventHandler>> = self
            .subscriptions
            .borrow()
            .iter()
            .filter(|sub| sub.kind == kind)
            .map(|sub| Arc::clone(&sub.handler))
            .collect();
        if targets.is_empty() {
            return report;
        }

        let _guard = DepthGuard::enter(&self.depth);
        for handler in targets {
            let outcome = catch_unwind(AssertUnwindSafe(|| handler.handle(event, cx)));
            let fault = match outcome {
                Ok(Ok(())) => {
                    report.delivered = report.delivered.saturating_add(1);
                    continue;
                }
                Ok(Err(err)) => err.to_string(),
                Err(panic) => panic_message(panic.as_ref()),
            };
            report.failed = report.failed.saturating_add(1);
            cx.log(
                LogEntry::new(
                    cx.now(),
                    AgentKind::System,
                    "HANDLER_FAULT",
                    format!("Handler for {kind} failed: {fault}"),
                )
                .field("event", kind.to_string())
                .field("error", fault),
            );
        }
        report
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.borrow().len())
            .field("depth", &self.depth.get())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Best-effort text of a caught panic payload.
fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return format!("panic: {message}");
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return format!("panic: {message}");
    }
    "panic".to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Utc;
    use medsim_types::{Disease, MedicineRequest, Urgency};
    use medsim_world::WorldState;

    use super::*;
    use crate::sink::LogBuffer;
    use crate::timer::TimerRequest;

    fn request(medicine: &str) -> SimEvent {
        SimEvent::MedicineRequest(MedicineRequest {
            hospital_id: "H1".to_owned(),
            zone: "Zone-1".to_owned(),
            disease: Disease::Dengue,
            medicine: medicine.to_owned(),
            urgency: Urgency::High,
        })
    }

    /// Run `f` with a fresh context over an empty world.
    fn with_context<R>(
        bus: &EventBus,
        sink: &LogBuffer,
        f: impl FnOnce(&mut AgentContext<'_>) -> R,
    ) -> R {
        let mut world = WorldState::default();
        let mut timers: Vec<TimerRequest> = Vec::new();
        let mut cx = AgentContext::new(&mut world, bus, sink, &mut timers, Utc::now());
        f(&mut cx)
    }

    #[test]
    fn publish_without_subscribers_is_a_no_op() {
        let bus = EventBus::new();
        let sink = LogBuffer::new(8);
        let report = with_context(&bus, &sink, |cx| cx.publish(request("ors")));
        assert_eq!(report, DispatchReport::default());
        assert!(sink.is_empty());
    }

    #[test]
    fn handlers_run_in_subscription_order() {
        let bus = EventBus::new();
        let sink = LogBuffer::new(8);
        let seen = Arc::new(Mutex::new(Vec::new()));
        for name in ["first", "second", "third"] {
            let seen = Arc::clone(&seen);
            bus.subscribe_fn(EventKind::MedicineRequest, move |_, _| {
                seen.lock().unwrap().push(name);
                Ok(())
            });
        }
        let report = with_context(&bus, &sink, |cx| cx.publish(request("ors")));
        assert_eq!(report.delivered, 3);
        assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn nested_publish_completes_before_next_subscriber() {
        let bus = EventBus::new();
        let sink = LogBuffer::new(8);
        let seen = Arc::new(Mutex::new(Vec::new()));

        let log = Arc::clone(&seen);
        bus.subscribe_fn(EventKind::MedicineRequest, move |event, cx| {
            log.lock().unwrap().push("outer-a");
            if let SimEvent::MedicineRequest(req) = event {
                if req.medicine == "ors" {
                    cx.publish(request("paracetamol"));
                }
            }
            Ok(())
        });
        let log = Arc::clone(&seen);
        bus.subscribe_fn(EventKind::MedicineRequest, move |event, _| {
            if let SimEvent::MedicineRequest(req) = event {
                log.lock().unwrap().push(if req.medicine == "ors" {
                    "outer-b"
                } else {
                    "inner-b"
                });
            }
            Ok(())
        });

        with_context(&bus, &sink, |cx| cx.publish(request("ors")));
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["outer-a", "outer-a", "inner-b", "outer-b"]
        );
        assert_eq!(bus.depth(), 0);
    }

    #[test]
    fn handlers_see_earlier_world_mutations() {
        let bus = EventBus::new();
        let sink = LogBuffer::new(8);
        bus.subscribe_fn(EventKind::MedicineRequest, |_, cx| {
            cx.world.city.stats_mut(Disease::Dengue).predicted_cases = 7;
            Ok(())
        });
        let observed = Arc::new(AtomicUsize::new(0));
        let out = Arc::clone(&observed);
        bus.subscribe_fn(EventKind::MedicineRequest, move |_, cx| {
            let cases = cx.world.city.stats_mut(Disease::Dengue).predicted_cases;
            out.store(usize::try_from(cases).unwrap(), Ordering::SeqCst);
            Ok(())
        });
        with_context(&bus, &sink, |cx| cx.publish(request("ors")));
        assert_eq!(observed.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn failing_and_panicking_handlers_are_isolated() {
        let bus = EventBus::new();
        let sink = LogBuffer::new(8);
        let reached = Arc::new(AtomicUsize::new(0));

        bus.subscribe_fn(EventKind::MedicineRequest, |_, _| {
            Err(HandlerError::Failed("stock ledger unavailable".to_owned()))
        });
        bus.subscribe_fn(EventKind::MedicineRequest, |_, _| panic!("boom"));
        let counter = Arc::clone(&reached);
        bus.subscribe_fn(EventKind::MedicineRequest, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let report = with_context(&bus, &sink, |cx| cx.publish(request("ors")));
        assert_eq!(report.failed, 2);
        assert_eq!(report.delivered, 1);
        assert_eq!(reached.load(Ordering::SeqCst), 1);
        let faults = sink
            .tail(8)
            .into_iter()
            .filter(|e| e.meta.event_type == "HANDLER_FAULT")
            .count();
        assert_eq!(faults, 2);
        assert_eq!(bus.depth(), 0);
    }

    #[test]
    fn runaway_cascade_is_cut_at_max_depth() {
        let bus = EventBus::with_max_depth(5);
        let sink = LogBuffer::new(8);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        bus.subscribe_fn(EventKind::MedicineRequest, move |event, cx| {
            counter.fetch_add(1, Ordering::SeqCst);
            cx.publish(event.clone());
            Ok(())
        });

        let report = with_context(&bus, &sink, |cx| cx.publish(request("ors")));
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert_eq!(report.delivered, 1);
        assert!(sink.contains_type("CASCADE_DEPTH_EXCEEDED"));
        assert_eq!(bus.depth(), 0);
    }

    #[test]
    fn unsubscribe_removes_handler() {
        let bus = EventBus::new();
        let sink = LogBuffer::new(8);
        let id = bus.subscribe_fn(EventKind::MedicineRequest, |_, _| Ok(()));
        assert_eq!(bus.subscriber_count(EventKind::MedicineRequest), 1);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        let report = with_context(&bus, &sink, |cx| cx.publish(request("ors")));
        assert_eq!(report.delivered, 0);
    }

    #[test]
    fn subscribing_mid_dispatch_applies_to_next_publish() {
        let bus = EventBus::new();
        let sink = LogBuffer::new(8);
        let late_calls = Arc::new(AtomicUsize::new(0));
        let registered = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&late_calls);
        bus.subscribe_fn(EventKind::MedicineRequest, move |_, cx| {
            if registered.fetch_add(1, Ordering::SeqCst) == 0 {
                let counter = Arc::clone(&counter);
                cx.bus().subscribe_fn(EventKind::MedicineRequest, move |_, _| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                });
            }
            Ok(())
        });

        let first = with_context(&bus, &sink, |cx| cx.publish(request("ors")));
        assert_eq!(first.delivered, 1);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);

        let second = with_context(&bus, &sink, |cx| cx.publish(request("ors")));
        assert_eq!(second.delivered, 2);
        assert_eq!(late_calls.load(Ordering::SeqCst), 1);
    }
}
