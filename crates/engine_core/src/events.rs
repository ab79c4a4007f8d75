/// Double-buffered in-process event queue.
///
/// `publish` appends to the write buffer; at PreUpdate the dispatch system
/// calls `swap_buffers` then `take_read` and walks the previous tick's
/// events in publish order. Everything runs on the tick thread, so the swap
/// is a plain pointer exchange with no lock. Events published during
/// dispatch land in the new write buffer and surface next tick.
#[derive(Debug)]
pub struct EventBus<E> {
    write: Vec<E>,
    read: Vec<E>,
}

impl<E> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> EventBus<E> {
    pub fn new() -> Self {
        Self {
            write: Vec::new(),
            read: Vec::new(),
        }
    }

    pub fn publish(&mut self, event: E) {
        self.write.push(event);
    }

    /// Exchange buffers. Whatever was left unread is discarded; the
    /// previous write buffer becomes readable.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.write, &mut self.read);
        self.write.clear();
    }

    /// Take the readable events, leaving the read buffer empty.
    pub fn take_read(&mut self) -> Vec<E> {
        std::mem::take(&mut self.read)
    }

    pub fn pending(&self) -> usize {
        self.write.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_surface_after_swap() {
        let mut bus = EventBus::new();
        bus.publish("a");
        bus.publish("b");
        assert!(bus.take_read().is_empty());

        bus.swap_buffers();
        assert_eq!(bus.take_read(), vec!["a", "b"]);
    }

    #[test]
    fn publish_order_is_preserved() {
        let mut bus = EventBus::new();
        for i in 0..10 {
            bus.publish(i);
        }
        bus.swap_buffers();
        assert_eq!(bus.take_read(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn publishes_during_read_land_next_swap() {
        let mut bus = EventBus::new();
        bus.publish(1);
        bus.swap_buffers();

        let events = bus.take_read();
        assert_eq!(events, vec![1]);
        // A "subscriber" publishing while handling tick-N events.
        bus.publish(2);

        bus.swap_buffers();
        assert_eq!(bus.take_read(), vec![2]);
    }

    #[test]
    fn unread_events_are_discarded_on_next_swap() {
        let mut bus = EventBus::new();
        bus.publish(1);
        bus.swap_buffers();
        // Never read. Next swap replaces the read buffer.
        bus.publish(2);
        bus.swap_buffers();
        assert_eq!(bus.take_read(), vec![2]);
    }
}
