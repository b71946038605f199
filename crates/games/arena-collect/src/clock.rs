/// What a one-second clock tick produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockTick {
    /// Still counting; carries the seconds left.
    Running(u32),
    /// This tick moved the clock from 1 to 0. Reported exactly once.
    Expired,
    /// Already at zero; nothing happens.
    Holding,
}

/// Whole-second session countdown, driven by a one-second timer that runs
/// independently of the animation loop.
#[derive(Debug, Clone)]
pub struct SessionClock {
    remaining: u32,
}

impl SessionClock {
    pub fn new(seconds: u32) -> Self {
        Self { remaining: seconds }
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    #[cfg(test)]
    fn is_expired(&self) -> bool {
        self.remaining == 0
    }

    /// Count down one second. Finalization is triggered by the `Expired`
    /// edge, never by observing a zero level.
    pub fn tick(&mut self) -> ClockTick {
        match self.remaining {
            0 => ClockTick::Holding,
            1 => {
                self.remaining = 0;
                ClockTick::Expired
            },
            n => {
                self.remaining = n - 1;
                ClockTick::Running(self.remaining)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_down_then_expires_once() {
        let mut clock = SessionClock::new(3);
        assert_eq!(clock.tick(), ClockTick::Running(2));
        assert_eq!(clock.tick(), ClockTick::Running(1));
        assert_eq!(clock.tick(), ClockTick::Expired);
        assert!(clock.is_expired());
        for _ in 0..5 {
            assert_eq!(clock.tick(), ClockTick::Holding);
        }
        assert_eq!(clock.remaining(), 0);
    }

    #[test]
    fn zero_length_clock_never_expires_by_tick() {
        let mut clock = SessionClock::new(0);
        assert_eq!(clock.tick(), ClockTick::Holding);
    }

    #[test]
    fn sixty_second_session_expires_on_sixtieth_tick() {
        let mut clock = SessionClock::new(60);
        let expiries = (0..120)
            .map(|_| clock.tick())
            .enumerate()
            .filter(|(_, t)| *t == ClockTick::Expired)
            .map(|(i, _)| i + 1)
            .collect::<Vec<_>>();
        assert_eq!(expiries, vec![60]);
    }
}
