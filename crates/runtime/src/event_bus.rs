use std::collections::VecDeque;

/// Kinds of map events kept for diagnostics.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    Load,
    Zoom,
    Drill,
    Navigate,
    Notice,
    Discarded,
    Unresolved,
}

/// Minimal event record for traceability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub seq: u64,
    pub kind: EventKind,
    pub message: String,
}

/// Bounded in-memory event log.
///
/// Keeps the most recent `capacity` events; older ones are dropped.
#[derive(Debug)]
pub struct EventBus {
    next_seq: u64,
    capacity: usize,
    events: VecDeque<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(256)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_seq: 0,
            capacity: capacity.max(1),
            events: VecDeque::new(),
        }
    }

    pub fn emit(&mut self, kind: EventKind, message: impl Into<String>) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(Event {
            seq: self.next_seq,
            kind,
            message: message.into(),
        });
        self.next_seq += 1;
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn count(&self, kind: EventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::{EventBus, EventKind};

    #[test]
    fn records_events_in_order() {
        let mut bus = EventBus::new();
        bus.emit(EventKind::Zoom, "a");
        bus.emit(EventKind::Drill, "b");
        let msgs: Vec<_> = bus.events().map(|e| (e.seq, e.message.as_str())).collect();
        assert_eq!(msgs, vec![(0, "a"), (1, "b")]);
        assert_eq!(bus.count(EventKind::Zoom), 1);
    }

    #[test]
    fn drops_oldest_when_full() {
        let mut bus = EventBus::with_capacity(2);
        bus.emit(EventKind::Load, "1");
        bus.emit(EventKind::Load, "2");
        bus.emit(EventKind::Load, "3");
        let kept: Vec<_> = bus.events().map(|e| (e.seq, e.message.as_str())).collect();
        assert_eq!(kept, vec![(1, "2"), (2, "3")]);
    }
}
