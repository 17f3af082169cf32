use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard};

use derive_more::Display;

use crate::common::{Freq, Power};
use crate::error::EmError;
use crate::platform::PlatformId;
use crate::radio::{Rcvr, RcvrFunction, Xmtr, XmtrFunction};

/// Index of a registered transmitter.
///
/// Back references between components are these indices, never pointers;
/// removal invalidates the index explicitly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display)]
#[display("xmtr#{}", _0)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct XmtrId(usize);

/// Index of a registered receiver.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Display)]
#[display("rcvr#{}", _0)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RcvrId(usize);

/// Whether an interaction event opens or closes.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EventPhase {
    /// The interaction begins.
    Begin,
    /// The interaction ends.
    End,
}

/// One interaction event handed to observers.
#[derive(Clone, Debug)]
pub struct InteractionEvent {
    /// Platform the event originates from.
    pub source: PlatformId,
    /// Platform on the far end, when there is one.
    pub target: Option<PlatformId>,
    /// Begin or end.
    pub phase: EventPhase,
    /// Event type tag; per-type timeouts key on it.
    pub kind: String,
    /// Unique id pairing the begin with its end.
    pub id: u64,
    /// Free-form auxiliary text.
    pub aux: String,
}

/// Host-side hooks the manager fans events out to.
///
/// Every method has an empty default so observers implement only what they
/// consume.
pub trait EmObserver: Send + Sync {
    /// An interaction event opened or closed.
    fn on_interaction_event(&self, event: &InteractionEvent) {
        let _ = event;
    }

    /// A line of system output (plot writers route through this).
    fn on_output_log_entry(&self, entry: &str) {
        let _ = entry;
    }

    /// An active transmitter's parameters changed; `listeners` are the
    /// receivers that registered interest.
    fn on_parameter_change(&self, xmtr: XmtrId, listeners: &[RcvrId]) {
        let _ = (xmtr, listeners);
    }
}

/// What a scheduled event does when its time comes.
#[derive(Clone, Debug)]
pub enum EventAction {
    /// The transmission window closes.
    TransmissionEnd,
    /// A queued frequency change finishes settling.
    FrequencySettled(Freq<f64>),
    /// An unterminated interaction event times out.
    InteractionTimeout(u64),
}

/// A queued event, ordered by `(time, transmitter id)` so draining is
/// deterministic across steps.
#[derive(Clone, Debug)]
pub struct ScheduledEvent {
    /// Simulation time the event fires \[s\].
    pub time: f64,
    /// Transmitter the event belongs to.
    pub xmtr: XmtrId,
    /// What happens.
    pub action: EventAction,
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for ScheduledEvent {}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.time
            .total_cmp(&other.time)
            .then_with(|| self.xmtr.cmp(&other.xmtr))
    }
}

#[derive(Debug)]
struct XmtrRecord {
    xmtr: Xmtr,
    active: bool,
    emit_listeners: Vec<RcvrId>,
    change_listeners: Vec<RcvrId>,
}

#[derive(Debug, Default)]
struct InteractorLists {
    comms: Vec<XmtrId>,
    sensors: Vec<XmtrId>,
    interferers: Vec<XmtrId>,
}

impl InteractorLists {
    fn of(&self, function: XmtrFunction) -> &[XmtrId] {
        match function {
            XmtrFunction::Comm => &self.comms,
            XmtrFunction::Sensor => &self.sensors,
            XmtrFunction::Interferer => &self.interferers,
        }
    }
}

#[derive(Debug)]
struct RcvrRecord {
    rcvr: Rcvr,
    active: bool,
    interactors: InteractorLists,
}

/// The registry every transmitter and receiver lives in.
///
/// Arena vectors behind `RwLock`s hold the components; indices are the only
/// back references. The manager also owns the observer registry, the
/// per-type event timeouts, and the step-boundary event queue. It is passed
/// explicitly, never a singleton.
pub struct EmManager {
    xmtrs: RwLock<Vec<Option<XmtrRecord>>>,
    rcvrs: RwLock<Vec<Option<RcvrRecord>>>,
    observers: RwLock<Vec<Arc<dyn EmObserver>>>,
    events: Mutex<BinaryHeap<Reverse<ScheduledEvent>>>,
    timeouts: RwLock<HashMap<String, f64>>,
    open_events: Mutex<HashMap<u64, InteractionEvent>>,
    next_event_id: AtomicU64,
}

impl EmManager {
    /// An empty manager.
    #[must_use]
    pub fn new() -> Self {
        Self {
            xmtrs: RwLock::new(Vec::new()),
            rcvrs: RwLock::new(Vec::new()),
            observers: RwLock::new(Vec::new()),
            events: Mutex::new(BinaryHeap::new()),
            timeouts: RwLock::new(HashMap::new()),
            open_events: Mutex::new(HashMap::new()),
            next_event_id: AtomicU64::new(1),
        }
    }

    /// Registers a transmitter, inactive until activated.
    pub fn register_xmtr(&self, xmtr: Xmtr) -> XmtrId {
        let mut guard = write(&self.xmtrs);
        let record = XmtrRecord {
            xmtr,
            active: false,
            emit_listeners: Vec::new(),
            change_listeners: Vec::new(),
        };
        let id = match guard.iter_mut().enumerate().find(|(_, slot)| slot.is_none()) {
            Some((i, slot)) => {
                *slot = Some(record);
                XmtrId(i)
            }
            None => {
                guard.push(Some(record));
                XmtrId(guard.len() - 1)
            }
        };
        drop(guard);
        self.rebuild_interactors();
        id
    }

    /// Registers a receiver, inactive until activated.
    pub fn register_rcvr(&self, rcvr: Rcvr) -> RcvrId {
        let mut guard = write(&self.rcvrs);
        let record = RcvrRecord {
            rcvr,
            active: false,
            interactors: InteractorLists::default(),
        };
        let id = match guard.iter_mut().enumerate().find(|(_, slot)| slot.is_none()) {
            Some((i, slot)) => {
                *slot = Some(record);
                RcvrId(i)
            }
            None => {
                guard.push(Some(record));
                RcvrId(guard.len() - 1)
            }
        };
        drop(guard);
        self.rebuild_interactors();
        id
    }

    /// Removes a transmitter, invalidating its id.
    pub fn remove_xmtr(&self, id: XmtrId) -> Result<Xmtr, EmError> {
        let removed = write(&self.xmtrs)
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(EmError::NotRegistered("transmitter"))?;
        self.rebuild_interactors();
        Ok(removed.xmtr)
    }

    /// Removes a receiver, invalidating its id.
    pub fn remove_rcvr(&self, id: RcvrId) -> Result<Rcvr, EmError> {
        let removed = write(&self.rcvrs)
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(EmError::NotRegistered("receiver"))?;
        self.rebuild_interactors();
        Ok(removed.rcvr)
    }

    /// Activates a transmitter. Idempotent.
    pub fn activate_xmtr(&self, id: XmtrId) -> Result<(), EmError> {
        self.set_xmtr_active(id, true)
    }

    /// Deactivates a transmitter. Idempotent; in-flight attempts complete.
    pub fn deactivate_xmtr(&self, id: XmtrId) -> Result<(), EmError> {
        self.set_xmtr_active(id, false)
    }

    fn set_xmtr_active(&self, id: XmtrId, active: bool) -> Result<(), EmError> {
        {
            let mut guard = write(&self.xmtrs);
            let record = guard
                .get_mut(id.0)
                .and_then(Option::as_mut)
                .ok_or(EmError::NotRegistered("transmitter"))?;
            if record.active == active {
                return Ok(());
            }
            record.active = active;
        }
        self.rebuild_interactors();
        Ok(())
    }

    /// Activates a receiver. Idempotent.
    pub fn activate_rcvr(&self, id: RcvrId) -> Result<(), EmError> {
        self.set_rcvr_active(id, true)
    }

    /// Deactivates a receiver. Idempotent.
    pub fn deactivate_rcvr(&self, id: RcvrId) -> Result<(), EmError> {
        self.set_rcvr_active(id, false)
    }

    fn set_rcvr_active(&self, id: RcvrId, active: bool) -> Result<(), EmError> {
        let mut guard = write(&self.rcvrs);
        let record = guard
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(EmError::NotRegistered("receiver"))?;
        record.active = active;
        Ok(())
    }

    // Interactor lists are rebuilt eagerly; registration and activation are
    // rare next to the per-step reads.
    fn rebuild_interactors(&self) {
        let xmtrs = read(&self.xmtrs);
        let mut comms = Vec::new();
        let mut sensors = Vec::new();
        let mut interferers = Vec::new();
        for (i, slot) in xmtrs.iter().enumerate() {
            let Some(record) = slot else { continue };
            if !record.active {
                continue;
            }
            match record.xmtr.function() {
                XmtrFunction::Comm => comms.push(XmtrId(i)),
                XmtrFunction::Sensor => sensors.push(XmtrId(i)),
                XmtrFunction::Interferer => interferers.push(XmtrId(i)),
            }
        }
        drop(xmtrs);
        let mut rcvrs = write(&self.rcvrs);
        for slot in rcvrs.iter_mut().filter_map(Option::as_mut) {
            slot.interactors = InteractorLists {
                comms: comms.clone(),
                sensors: sensors.clone(),
                interferers: interferers.clone(),
            };
        }
    }

    /// A read view over the registry for the duration of a step.
    #[must_use]
    pub fn view(&self) -> EmView<'_> {
        EmView {
            xmtrs: read(&self.xmtrs),
            rcvrs: read(&self.rcvrs),
        }
    }

    /// Subscribes a receiver to a transmitter's emissions.
    pub fn add_emit_listener(&self, xmtr: XmtrId, rcvr: RcvrId) -> Result<(), EmError> {
        let mut guard = write(&self.xmtrs);
        let record = guard
            .get_mut(xmtr.0)
            .and_then(Option::as_mut)
            .ok_or(EmError::NotRegistered("transmitter"))?;
        if !record.emit_listeners.contains(&rcvr) {
            record.emit_listeners.push(rcvr);
        }
        Ok(())
    }

    /// Subscribes a receiver to a transmitter's parameter changes.
    pub fn add_change_listener(&self, xmtr: XmtrId, rcvr: RcvrId) -> Result<(), EmError> {
        let mut guard = write(&self.xmtrs);
        let record = guard
            .get_mut(xmtr.0)
            .and_then(Option::as_mut)
            .ok_or(EmError::NotRegistered("transmitter"))?;
        if !record.change_listeners.contains(&rcvr) {
            record.change_listeners.push(rcvr);
        }
        Ok(())
    }

    /// Retunes a transmitter and fires its change listeners.
    pub fn retune_xmtr(&self, id: XmtrId, frequency: Freq<f64>) -> Result<(), EmError> {
        let listeners = {
            let mut guard = write(&self.xmtrs);
            let record = guard
                .get_mut(id.0)
                .and_then(Option::as_mut)
                .ok_or(EmError::NotRegistered("transmitter"))?;
            record.xmtr.set_frequency(frequency);
            record.change_listeners.clone()
        };
        self.notify_change(id, &listeners);
        Ok(())
    }

    /// Changes a transmitter's nominal power and fires its change listeners.
    pub fn set_xmtr_power(&self, id: XmtrId, power: Power) -> Result<(), EmError> {
        let listeners = {
            let mut guard = write(&self.xmtrs);
            let record = guard
                .get_mut(id.0)
                .and_then(Option::as_mut)
                .ok_or(EmError::NotRegistered("transmitter"))?;
            record.xmtr.set_power(power);
            record.change_listeners.clone()
        };
        self.notify_change(id, &listeners);
        Ok(())
    }

    /// Retunes a receiver.
    pub fn retune_rcvr(&self, id: RcvrId, frequency: Freq<f64>) -> Result<(), EmError> {
        let mut guard = write(&self.rcvrs);
        let record = guard
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(EmError::NotRegistered("receiver"))?;
        record.rcvr.set_frequency(frequency);
        Ok(())
    }

    /// Opens a transmission window ending at `now + duration`, with the end
    /// queued as a step-boundary event.
    pub fn begin_transmission(
        &self,
        id: XmtrId,
        now: f64,
        duration: f64,
    ) -> Result<(), EmError> {
        {
            let mut guard = write(&self.xmtrs);
            let record = guard
                .get_mut(id.0)
                .and_then(Option::as_mut)
                .ok_or(EmError::NotRegistered("transmitter"))?;
            record.xmtr.set_transmission_end_time(Some(now + duration));
        }
        self.schedule(ScheduledEvent {
            time: now + duration,
            xmtr: id,
            action: EventAction::TransmissionEnd,
        });
        Ok(())
    }

    /// Queues a frequency change that applies once the settling delay runs
    /// out. A later queued change simply supersedes at its own expiry.
    pub fn schedule_retune(&self, id: XmtrId, at: f64, frequency: Freq<f64>) {
        self.schedule(ScheduledEvent {
            time: at,
            xmtr: id,
            action: EventAction::FrequencySettled(frequency),
        });
    }

    fn schedule(&self, event: ScheduledEvent) {
        lock(&self.events).push(Reverse(event));
    }

    /// Drains every event due at or before `now`, in `(time, xmtr)` order.
    /// Called at step boundaries.
    pub fn dispatch_events(&self, now: f64) {
        loop {
            let event = {
                let mut queue = lock(&self.events);
                match queue.peek() {
                    Some(Reverse(ev)) if ev.time <= now => queue.pop().map(|Reverse(ev)| ev),
                    _ => None,
                }
            };
            let Some(event) = event else { break };
            match event.action {
                EventAction::TransmissionEnd => {
                    if let Some(record) = write(&self.xmtrs)
                        .get_mut(event.xmtr.0)
                        .and_then(Option::as_mut)
                    {
                        record.xmtr.set_transmission_end_time(None);
                    }
                }
                EventAction::FrequencySettled(frequency) => {
                    if self.retune_xmtr(event.xmtr, frequency).is_err() {
                        tracing::debug!(xmtr = %event.xmtr, "retune event for a removed transmitter");
                    }
                }
                EventAction::InteractionTimeout(id) => {
                    self.close_interaction_event(id);
                }
            }
        }
    }

    /// Registers an observer.
    pub fn add_observer(&self, observer: Arc<dyn EmObserver>) {
        write(&self.observers).push(observer);
    }

    /// Sets the timeout after which an unterminated interaction event of
    /// `kind` closes automatically.
    pub fn set_event_timeout(&self, kind: &str, seconds: f64) {
        write(&self.timeouts).insert(kind.to_owned(), seconds);
    }

    /// Emits the begin of an interaction event and returns its unique id.
    ///
    /// When the kind carries a timeout, a matching end is scheduled in case
    /// the caller never terminates explicitly.
    pub fn emit_interaction_begin(
        &self,
        xmtr: XmtrId,
        now: f64,
        source: PlatformId,
        target: Option<PlatformId>,
        kind: &str,
        aux: &str,
    ) -> u64 {
        let id = self.next_event_id.fetch_add(1, Ordering::Relaxed);
        let event = InteractionEvent {
            source,
            target,
            phase: EventPhase::Begin,
            kind: kind.to_owned(),
            id,
            aux: aux.to_owned(),
        };
        self.notify_event(&event);
        lock(&self.open_events).insert(id, event);
        if let Some(timeout) = read(&self.timeouts).get(kind).copied() {
            self.schedule(ScheduledEvent {
                time: now + timeout,
                xmtr,
                action: EventAction::InteractionTimeout(id),
            });
        }
        id
    }

    /// Explicitly terminates an interaction event. Unknown or already-closed
    /// ids are ignored, which is what lets the timeout and the explicit path
    /// coexist.
    pub fn emit_interaction_end(&self, id: u64) {
        self.close_interaction_event(id);
    }

    fn close_interaction_event(&self, id: u64) {
        let Some(mut event) = lock(&self.open_events).remove(&id) else {
            return;
        };
        event.phase = EventPhase::End;
        self.notify_event(&event);
    }

    /// Routes a line of system output to every observer.
    pub fn log_output(&self, entry: &str) {
        for observer in read(&self.observers).iter() {
            observer.on_output_log_entry(entry);
        }
    }

    fn notify_event(&self, event: &InteractionEvent) {
        for observer in read(&self.observers).iter() {
            observer.on_interaction_event(event);
        }
    }

    fn notify_change(&self, xmtr: XmtrId, listeners: &[RcvrId]) {
        for observer in read(&self.observers).iter() {
            observer.on_parameter_change(xmtr, listeners);
        }
    }
}

impl Default for EmManager {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for EmManager {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("EmManager")
            .field("xmtrs", &read(&self.xmtrs).iter().flatten().count())
            .field("rcvrs", &read(&self.rcvrs).iter().flatten().count())
            .field("queued_events", &lock(&self.events).len())
            .finish_non_exhaustive()
    }
}

/// Read access to the registry, held across one step's interactions.
pub struct EmView<'a> {
    xmtrs: RwLockReadGuard<'a, Vec<Option<XmtrRecord>>>,
    rcvrs: RwLockReadGuard<'a, Vec<Option<RcvrRecord>>>,
}

impl EmView<'_> {
    /// The registered transmitter.
    pub fn xmtr(&self, id: XmtrId) -> Result<&Xmtr, EmError> {
        self.xmtrs
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|r| &r.xmtr)
            .ok_or(EmError::NotRegistered("transmitter"))
    }

    /// The registered receiver.
    pub fn rcvr(&self, id: RcvrId) -> Result<&Rcvr, EmError> {
        self.rcvrs
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|r| &r.rcvr)
            .ok_or(EmError::NotRegistered("receiver"))
    }

    /// Whether the transmitter is active.
    pub fn xmtr_active(&self, id: XmtrId) -> Result<bool, EmError> {
        self.xmtrs
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|r| r.active)
            .ok_or(EmError::NotRegistered("transmitter"))
    }

    /// Whether the receiver is active.
    pub fn rcvr_active(&self, id: RcvrId) -> Result<bool, EmError> {
        self.rcvrs
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|r| r.active)
            .ok_or(EmError::NotRegistered("receiver"))
    }

    /// Active transmitters of `function` this receiver may interact with.
    pub fn interactors(
        &self,
        id: RcvrId,
        function: XmtrFunction,
    ) -> Result<&[XmtrId], EmError> {
        self.rcvrs
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|r| r.interactors.of(function))
            .ok_or(EmError::NotRegistered("receiver"))
    }

    /// Receivers subscribed to a transmitter's emissions.
    pub fn emit_listeners(&self, id: XmtrId) -> Result<&[RcvrId], EmError> {
        self.xmtrs
            .get(id.0)
            .and_then(Option::as_ref)
            .map(|r| r.emit_listeners.as_slice())
            .ok_or(EmError::NotRegistered("transmitter"))
    }

    /// Every registered receiver id of `function`, active ones only.
    pub fn active_rcvrs(&self, function: RcvrFunction) -> Vec<RcvrId> {
        self.rcvrs
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| {
                slot.as_ref()
                    .filter(|r| r.active && r.rcvr.function() == function)
                    .map(|_| RcvrId(i))
            })
            .collect()
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::antenna::Antenna;
    use crate::common::{deg, GHz, Hz, kW};
    use crate::geometry::{Geodetic, Vector3};
    use crate::pattern::Uniform;
    use crate::platform::tests::TestPlatform;
    use crate::platform::ArticulatedPart;

    fn antenna() -> Arc<Antenna> {
        let platform = Arc::new(TestPlatform::at(Geodetic::new(0.0 * deg, 0.0 * deg, 100.0)));
        Arc::new(Antenna::new(Arc::new(ArticulatedPart::new(
            platform,
            Vector3::zeros(),
        ))))
    }

    fn xmtr(function: XmtrFunction) -> Xmtr {
        Xmtr::new(
            function,
            antenna(),
            Arc::new(Uniform::isotropic()),
            3.0 * GHz,
            10.0 * kW,
        )
    }

    fn rcvr() -> Rcvr {
        Rcvr::new(
            RcvrFunction::Sensor,
            antenna(),
            Arc::new(Uniform::isotropic()),
            3.0 * GHz,
            1e6 * Hz,
        )
    }

    #[derive(Default)]
    struct Recorder {
        log: Mutex<Vec<String>>,
    }

    impl Recorder {
        fn entries(&self) -> Vec<String> {
            lock(&self.log).clone()
        }
    }

    impl EmObserver for Recorder {
        fn on_interaction_event(&self, event: &InteractionEvent) {
            lock(&self.log).push(format!("{:?}:{}:{}", event.phase, event.kind, event.id));
        }

        fn on_output_log_entry(&self, entry: &str) {
            lock(&self.log).push(format!("out:{entry}"));
        }

        fn on_parameter_change(&self, xmtr: XmtrId, listeners: &[RcvrId]) {
            lock(&self.log).push(format!("change:{xmtr}:{}", listeners.len()));
        }
    }

    #[test]
    fn interactor_lists_track_function_and_activity() {
        let mgr = EmManager::new();
        let r = mgr.register_rcvr(rcvr());
        mgr.activate_rcvr(r).unwrap();
        let jammer = mgr.register_xmtr(xmtr(XmtrFunction::Interferer));
        let radar = mgr.register_xmtr(xmtr(XmtrFunction::Sensor));

        // Inactive transmitters never appear.
        assert!(mgr.view().interactors(r, XmtrFunction::Interferer).unwrap().is_empty());
        mgr.activate_xmtr(jammer).unwrap();
        mgr.activate_xmtr(radar).unwrap();
        assert_eq!(
            mgr.view().interactors(r, XmtrFunction::Interferer).unwrap(),
            &[jammer]
        );
        assert_eq!(
            mgr.view().interactors(r, XmtrFunction::Sensor).unwrap(),
            &[radar]
        );
        mgr.deactivate_xmtr(jammer).unwrap();
        mgr.deactivate_xmtr(jammer).unwrap();
        assert!(mgr.view().interactors(r, XmtrFunction::Interferer).unwrap().is_empty());
    }

    #[test]
    fn removal_invalidates_the_id_and_recycles_the_slot() {
        let mgr = EmManager::new();
        let a = mgr.register_xmtr(xmtr(XmtrFunction::Sensor));
        let _ = mgr.remove_xmtr(a).unwrap();
        assert!(mgr.view().xmtr(a).is_err());
        assert!(mgr.remove_xmtr(a).is_err());
        let b = mgr.register_xmtr(xmtr(XmtrFunction::Sensor));
        assert_eq!(a, b);
    }

    #[test]
    fn transmission_end_fires_at_dispatch() {
        let mgr = EmManager::new();
        let id = mgr.register_xmtr(xmtr(XmtrFunction::Comm));
        mgr.begin_transmission(id, 10.0, 5.0).unwrap();
        assert_eq!(
            mgr.view().xmtr(id).unwrap().transmission_end_time(),
            Some(15.0)
        );
        mgr.dispatch_events(14.0);
        assert!(mgr.view().xmtr(id).unwrap().transmission_end_time().is_some());
        mgr.dispatch_events(15.0);
        assert!(mgr.view().xmtr(id).unwrap().transmission_end_time().is_none());
    }

    #[test]
    fn queued_retune_applies_at_expiry_and_fires_listeners() {
        let mgr = EmManager::new();
        let recorder = Arc::new(Recorder::default());
        mgr.add_observer(recorder.clone());
        let x = mgr.register_xmtr(xmtr(XmtrFunction::Sensor));
        let r = mgr.register_rcvr(rcvr());
        mgr.add_change_listener(x, r).unwrap();

        mgr.schedule_retune(x, 2.5, 3.3 * GHz);
        mgr.dispatch_events(2.0);
        approx::assert_abs_diff_eq!(mgr.view().xmtr(x).unwrap().frequency().hz(), 3.0e9);
        mgr.dispatch_events(2.5);
        approx::assert_abs_diff_eq!(mgr.view().xmtr(x).unwrap().frequency().hz(), 3.3e9);
        assert_eq!(recorder.entries(), vec!["change:xmtr#0:1".to_owned()]);
    }

    #[test]
    fn events_drain_in_time_then_id_order() {
        let mgr = EmManager::new();
        let a = mgr.register_xmtr(xmtr(XmtrFunction::Comm));
        let b = mgr.register_xmtr(xmtr(XmtrFunction::Comm));
        mgr.schedule_retune(b, 1.0, 1.0 * GHz);
        mgr.schedule_retune(a, 1.0, 2.0 * GHz);
        mgr.schedule_retune(a, 0.5, 3.0 * GHz);

        let order = {
            let mut queue = lock(&mgr.events);
            std::iter::from_fn(|| queue.pop().map(|Reverse(ev)| (ev.time, ev.xmtr)))
                .collect::<Vec<_>>()
        };
        assert_eq!(order, vec![(0.5, a), (1.0, a), (1.0, b)]);
    }

    #[test]
    fn unterminated_interaction_event_times_out() {
        let mgr = EmManager::new();
        let recorder = Arc::new(Recorder::default());
        mgr.add_observer(recorder.clone());
        mgr.set_event_timeout("emission", 3.0);
        let x = mgr.register_xmtr(xmtr(XmtrFunction::Comm));

        let id = mgr.emit_interaction_begin(x, 1.0, PlatformId(7), None, "emission", "");
        mgr.dispatch_events(4.0);
        assert_eq!(
            recorder.entries(),
            vec![format!("Begin:emission:{id}"), format!("End:emission:{id}")]
        );
        // A late explicit end is a no-op.
        mgr.emit_interaction_end(id);
        assert_eq!(recorder.entries().len(), 2);
    }

    #[test]
    fn explicit_end_cancels_the_timeout() {
        let mgr = EmManager::new();
        let recorder = Arc::new(Recorder::default());
        mgr.add_observer(recorder.clone());
        mgr.set_event_timeout("emission", 3.0);
        let x = mgr.register_xmtr(xmtr(XmtrFunction::Comm));

        let id = mgr.emit_interaction_begin(x, 1.0, PlatformId(7), Some(PlatformId(9)), "emission", "lock");
        mgr.emit_interaction_end(id);
        mgr.dispatch_events(10.0);
        assert_eq!(recorder.entries().len(), 2);
    }

    #[test]
    fn output_log_routes_to_observers() {
        let mgr = EmManager::new();
        let recorder = Arc::new(Recorder::default());
        mgr.add_observer(recorder.clone());
        mgr.log_output("plot written");
        assert_eq!(recorder.entries(), vec!["out:plot written".to_owned()]);
    }
}
