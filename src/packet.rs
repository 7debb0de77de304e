//! The packet: the unit of data carried from node to node through a pipe.

use std::mem;
use std::time::Instant;

/// A typed data carrier with an optional consumption time.
///
/// Packets are move-only while in transit: ownership is unique at rest,
/// either queued inside a pipe or in a consumer's hands. Cloning is
/// available for fan-out (see [`Tee`](crate::nodes::Tee)), but a clone is a
/// new packet, not a shared one.
///
/// The consumption time tells a consumer when the payload should be acted
/// on. A packet that arrives early ought to be held until its time; one
/// that arrives late may be discarded. `None` means "consume immediately".
#[derive(Debug, Clone)]
pub struct Packet<T> {
    data: T,
    consumption_time: Option<Instant>,
}

impl<T> Packet<T> {
    /// Create a packet with no consumption time.
    pub fn new(data: T) -> Self {
        Self {
            data,
            consumption_time: None,
        }
    }

    /// Create a packet to be consumed at a given time.
    pub fn with_consumption_time(data: T, at: Instant) -> Self {
        Self {
            data,
            consumption_time: Some(at),
        }
    }

    /// The number of bytes a packet of this element type weighs.
    ///
    /// The value is stable per type and is what pipes use for weight
    /// accounting.
    pub const fn size() -> usize {
        mem::size_of::<T>()
    }

    /// The data this packet is carrying.
    pub fn data(&self) -> &T {
        &self.data
    }

    /// Mutable access to the data this packet is carrying.
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }

    /// Consume the packet, yielding its data.
    pub fn into_data(self) -> T {
        self.data
    }

    /// The time at which this packet should be consumed, if set.
    pub fn consumption_time(&self) -> Option<Instant> {
        self.consumption_time
    }

    /// Mutable access to the consumption time.
    pub fn consumption_time_mut(&mut self) -> &mut Option<Instant> {
        &mut self.consumption_time
    }

    /// Set the time at which this packet should be consumed.
    pub fn set_consumption_time(&mut self, at: Instant) {
        self.consumption_time = Some(at);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_packet_carries_data() {
        let mut packet = Packet::new(41_u32);
        assert_eq!(*packet.data(), 41);

        *packet.data_mut() += 1;
        assert_eq!(packet.into_data(), 42);
    }

    #[test]
    fn test_size_is_per_element_type() {
        assert_eq!(Packet::<u8>::size(), 1);
        assert_eq!(Packet::<u32>::size(), 4);
        assert_eq!(Packet::<u64>::size(), 8);
    }

    #[test]
    fn test_consumption_time_unset_by_default() {
        let packet = Packet::new(0_i32);
        assert!(packet.consumption_time().is_none());
    }

    #[test]
    fn test_consumption_time_round_trip() {
        let at = Instant::now() + Duration::from_secs(1);
        let packet = Packet::with_consumption_time(0_i32, at);
        assert_eq!(packet.consumption_time(), Some(at));

        let mut packet = Packet::new(0_i32);
        packet.set_consumption_time(at);
        assert_eq!(packet.consumption_time(), Some(at));

        *packet.consumption_time_mut() = None;
        assert!(packet.consumption_time().is_none());
    }

    #[test]
    fn test_clone_copies_data_and_time() {
        let at = Instant::now();
        let packet = Packet::with_consumption_time("payload".to_string(), at);
        let copy = packet.clone();
        assert_eq!(copy.data(), packet.data());
        assert_eq!(copy.consumption_time(), Some(at));
    }
}
