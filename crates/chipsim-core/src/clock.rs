//! The two-phase clock.
//!
//! The clock only tracks phase and cycle count and tells its listeners about
//! edges. Driving the clocked gates on an edge is the job of the
//! [`Circuit`](crate::Circuit) that owns the clock.

use std::fmt;

use serde::{Serialize, Serializer};
use tracing::trace;

/// Phase and completed-cycle count.
///
/// Printed as a signed number: `-n` before the rising edge of cycle `n`,
/// `+n` after it. The initial value is `-0`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ClockValue {
    pub cycle: u64,
    pub up: bool,
}

impl ClockValue {
    pub fn new(cycle: u64, up: bool) -> ClockValue {
        ClockValue { cycle, up }
    }

    pub fn is_up(self) -> bool {
        self.up
    }

    pub fn is_down(self) -> bool {
        !self.up
    }

    /// The signed encoding. `-0` and `+0` both map to `0`; use
    /// [`ClockValue::is_up`] to tell them apart.
    pub fn to_signed(self) -> i64 {
        let magnitude = i64::try_from(self.cycle).unwrap_or(i64::MAX);
        if self.up {
            magnitude
        } else {
            -magnitude
        }
    }
}

impl fmt::Display for ClockValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.up { '+' } else { '-' };
        write!(f, "{sign}{}", self.cycle)
    }
}

impl Serialize for ClockValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ClockEvent {
    /// The value was assigned directly.
    Change(ClockValue),
    /// Rising edge.
    Tick(ClockValue),
    /// Falling edge.
    Tock(ClockValue),
    /// A full cycle completed: two half-transitions since the last
    /// assignment or the previous `Cycle`.
    Cycle(ClockValue),
}

type Listener = Box<dyn FnMut(ClockEvent)>;

#[derive(Default)]
pub struct Clock {
    value: ClockValue,
    half_cycles: u8,
    listeners: Vec<Listener>,
}

impl fmt::Debug for Clock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Clock")
            .field("value", &self.value)
            .field("half_cycles", &self.half_cycles)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Clock {
    pub fn new() -> Clock {
        Clock::default()
    }

    pub fn value(&self) -> ClockValue {
        self.value
    }

    pub fn is_up(&self) -> bool {
        self.value.up
    }

    pub fn is_down(&self) -> bool {
        !self.value.up
    }

    pub fn subscribe(&mut self, listener: impl FnMut(ClockEvent) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Assign the value directly. Restarts the half-cycle count.
    pub fn set_value(&mut self, value: ClockValue) {
        self.value = value;
        self.half_cycles = 0;
        self.emit(ClockEvent::Change(value));
    }

    /// Back to `-0`.
    pub fn reset(&mut self) {
        self.set_value(ClockValue::default());
    }

    /// Rising edge: `-n` becomes `+n`. Returns false, and does nothing, when
    /// the clock is already up.
    pub fn tick(&mut self) -> bool {
        if self.value.up {
            return false;
        }
        self.value.up = true;
        trace!(clock = %self.value, "tick");
        self.emit(ClockEvent::Tick(self.value));
        self.half_step();
        true
    }

    /// Falling edge: `+n` becomes `-(n+1)`. Returns false, and does nothing,
    /// when the clock is already down.
    pub fn tock(&mut self) -> bool {
        if !self.value.up {
            return false;
        }
        self.value = ClockValue::new(self.value.cycle + 1, false);
        trace!(clock = %self.value, "tock");
        self.emit(ClockEvent::Tock(self.value));
        self.half_step();
        true
    }

    fn half_step(&mut self) {
        self.half_cycles += 1;
        if self.half_cycles == 2 {
            self.half_cycles = 0;
            self.emit(ClockEvent::Cycle(self.value));
        }
    }

    fn emit(&mut self, event: ClockEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recorder(clock: &mut Clock) -> Rc<RefCell<Vec<ClockEvent>>> {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&events);
        clock.subscribe(move |event| sink.borrow_mut().push(event));
        events
    }

    #[test]
    fn test_sequence() {
        let mut clock = Clock::new();
        let mut seen = vec![clock.value().to_string()];
        for _ in 0..2 {
            assert!(clock.tick());
            seen.push(clock.value().to_string());
            assert!(clock.tock());
            seen.push(clock.value().to_string());
        }
        assert_eq!(seen, ["-0", "+0", "-1", "+1", "-2"]);
        assert_eq!(clock.value().to_signed(), -2);
    }

    #[test]
    fn test_out_of_phase_edges_do_nothing() {
        let mut clock = Clock::new();
        let events = recorder(&mut clock);
        assert!(!clock.tock());
        assert!(clock.tick());
        assert!(!clock.tick());
        assert_eq!(clock.value(), ClockValue::new(0, true));
        assert_eq!(events.borrow().len(), 1);
    }

    #[test]
    fn test_cycle_event_every_second_edge() {
        let mut clock = Clock::new();
        let events = recorder(&mut clock);
        clock.tick();
        clock.tock();
        clock.tick();
        let cycles = |events: &[ClockEvent]| {
            events
                .iter()
                .filter(|e| matches!(e, ClockEvent::Cycle(_)))
                .count()
        };
        assert_eq!(cycles(&events.borrow()), 1);

        // Assignment restarts the count: one more edge is not a cycle.
        clock.set_value(ClockValue::new(5, true));
        clock.tock();
        assert_eq!(cycles(&events.borrow()), 1);
        clock.tick();
        assert_eq!(cycles(&events.borrow()), 2);
        assert_eq!(
            events.borrow().last(),
            Some(&ClockEvent::Cycle(ClockValue::new(6, true)))
        );
    }

    #[test]
    fn test_reset() {
        let mut clock = Clock::new();
        clock.tick();
        clock.tock();
        clock.reset();
        assert_eq!(clock.value(), ClockValue::default());
        assert!(clock.is_down());
    }

    #[test]
    fn test_serializes_as_signed_text() {
        let value = ClockValue::new(3, true);
        assert_eq!(serde_json::to_string(&value).unwrap(), "\"+3\"");
        assert_eq!(
            serde_json::to_string(&ClockValue::default()).unwrap(),
            "\"-0\""
        );
    }
}
