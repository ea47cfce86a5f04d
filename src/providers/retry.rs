// Session retry gate
//
// Allows at most `max_in_flight` concurrent invalidate-and-retry cycles.
// A caller that finds the gate full gets `RetryTimeout`.

use std::sync::atomic::{AtomicUsize, Ordering};

use super::error::ProviderError;

pub struct SessionRetryGate {
    in_flight: AtomicUsize,
    max_in_flight: usize,
}

impl Default for SessionRetryGate {
    fn default() -> Self {
        Self::new(1)
    }
}

impl SessionRetryGate {
    pub fn new(max_in_flight: usize) -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            max_in_flight,
        }
    }

    pub fn try_acquire(&self) -> Result<RetryPermit<'_>, ProviderError> {
        let previous = self.in_flight.fetch_add(1, Ordering::SeqCst);
        if previous >= self.max_in_flight {
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            log::warn!("Session retry refused, {} already in flight", previous);
            return Err(ProviderError::RetryTimeout);
        }
        Ok(RetryPermit { gate: self })
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Releases its slot on drop
pub struct RetryPermit<'a> {
    gate: &'a SessionRetryGate,
}

impl Drop for RetryPermit<'_> {
    fn drop(&mut self) {
        self.gate.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_concurrent_retry_is_refused() {
        let gate = SessionRetryGate::default();
        let permit = gate.try_acquire().unwrap();
        assert_eq!(gate.try_acquire().err(), Some(ProviderError::RetryTimeout));
        assert_eq!(gate.in_flight(), 1);

        drop(permit);
        assert_eq!(gate.in_flight(), 0);
        assert!(gate.try_acquire().is_ok());
    }
}
