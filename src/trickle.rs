//! The Trickle timer from [RFC 6206], used to pace DODAG information object
//! broadcasts. The interval `I` starts at `i_min` and doubles on every
//! expiry until it reaches `i_min * exponent^max_doublings`. Within each
//! interval a transmission is considered once, at a random point `t` in the
//! second half of the interval, and suppressed when `k` or more messages
//! were already heard.
//!
//! Deviations from a straight reading of the RFC, shared with the sibling
//! implementations of this engine:
//!
//! - the first interval is `i_min` (optionally `i_min * exponent` when the
//!   timer starts warm), not a random pick from `[i_min, i_max]`, so a fresh
//!   network converges quickly;
//! - the first `skip_doublings` expiries keep the interval at `i_min`;
//! - a `fixed_interval` override pins the interval, for deployments that
//!   schedule DIOs at a constant rate.
//!
//! [RFC 6206]: https://datatracker.ietf.org/doc/html/rfc6206

use crate::rand::Rand;
use crate::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrickleTimer {
    running: bool,

    i_min: Duration,
    exponent: u32,
    max_doublings: u32,
    k: usize,
    skip_doublings: u32,
    fixed_interval: Option<Duration>,

    i: Duration,
    t: Duration,
    t_expiration: Instant,
    i_expiration: Instant,
    doublings: u32,
    skipped: u32,
    counter: usize,
}

impl Default for TrickleTimer {
    fn default() -> Self {
        Self::new(
            crate::config::DEFAULT_DIO_INTERVAL_MIN,
            crate::config::DEFAULT_TRICKLE_EXPONENT,
            crate::config::DEFAULT_DIO_INTERVAL_DOUBLINGS as u32,
            crate::config::DEFAULT_DIO_REDUNDANCY_CONSTANT,
        )
    }
}

impl TrickleTimer {
    /// Create a new Trickle timer. The timer does not run until
    /// [`start`](Self::start) is called.
    pub const fn new(i_min: Duration, exponent: u32, max_doublings: u32, k: usize) -> Self {
        Self {
            running: false,
            i_min,
            exponent,
            max_doublings,
            k,
            skip_doublings: 0,
            fixed_interval: None,
            i: Duration::ZERO,
            t: Duration::ZERO,
            t_expiration: Instant::ZERO,
            i_expiration: Instant::ZERO,
            doublings: 0,
            skipped: 0,
            counter: 0,
        }
    }

    /// Keep the interval at its minimum for the first `n` expiries.
    pub const fn with_skip_doublings(mut self, n: u32) -> Self {
        self.skip_doublings = n;
        self
    }

    /// Pin the interval to a constant value, disabling doubling.
    pub const fn with_fixed_interval(mut self, interval: Duration) -> Self {
        self.fixed_interval = Some(interval);
        self
    }

    /// Start the timer. With `warmup` the first interval is one doubling in
    /// already, which spaces out the very first broadcasts of a node that
    /// joined an established network.
    pub(crate) fn start(&mut self, now: Instant, rand: &mut Rand, warmup: bool) {
        if self.running {
            return;
        }

        self.doublings = if warmup && self.max_doublings > 0 { 1 } else { 0 };
        self.skipped = 0;
        self.rearm(now, rand);
        self.running = true;
    }

    /// Restore the interval to its minimum and re-arm both deadlines.
    /// Called on every event the protocol counts as an inconsistency.
    pub(crate) fn reset(&mut self, now: Instant, rand: &mut Rand) {
        self.doublings = 0;
        self.rearm(now, rand);
        self.running = true;
    }

    /// Stop the timer without touching counters. A stopped timer never fires
    /// and reports no deadline; stopping twice is a no-op.
    pub(crate) fn suspend(&mut self) {
        self.running = false;
    }

    /// Signal the timer that a control message was heard.
    #[inline]
    pub(crate) fn hear_message(&mut self) {
        self.counter += 1;
    }

    /// Check if the timer allows a transmission.
    #[inline]
    pub(crate) fn can_transmit(&self) -> bool {
        self.k != 0 && self.counter < self.k
    }

    /// Advance the timer. Returns whether a transmission is due.
    pub(crate) fn poll(&mut self, now: Instant, rand: &mut Rand) -> bool {
        if !self.running {
            return false;
        }

        let can_transmit = self.can_transmit() && self.t_expired(now);

        if can_transmit {
            self.set_t(now, rand);
        }

        if self.i_expired(now) {
            self.expire(now, rand);
        }

        can_transmit
    }

    /// Return the earliest armed deadline, `None` while stopped.
    pub(crate) fn poll_at(&self) -> Option<Instant> {
        self.running
            .then_some(self.t_expiration.min(self.i_expiration))
    }

    /// The largest interval this timer can reach.
    pub(crate) fn max_expiration(&self) -> Duration {
        match self.fixed_interval {
            Some(fixed) => fixed,
            None => self.i_min * self.exponent.pow(self.max_doublings),
        }
    }

    fn current_interval(&self) -> Duration {
        match self.fixed_interval {
            Some(fixed) => fixed,
            None => self.i_min * self.exponent.pow(self.doublings),
        }
    }

    fn expire(&mut self, now: Instant, rand: &mut Rand) {
        if self.fixed_interval.is_none() {
            if self.skipped < self.skip_doublings {
                self.skipped += 1;
            } else if self.doublings < self.max_doublings {
                self.doublings += 1;
            }
        }

        self.rearm(now, rand);
    }

    fn rearm(&mut self, now: Instant, rand: &mut Rand) {
        self.i = self.current_interval();
        self.i_expiration = now + self.i;
        self.counter = 0;
        self.set_t(now, rand);
    }

    /// Place the transmit deadline uniformly in the second half of the
    /// current interval.
    fn set_t(&mut self, now: Instant, rand: &mut Rand) {
        let half = self.i.total_micros() / 2;
        let t = Duration::from_micros(
            half + rand.rand_u32() as u64 % (self.i.total_micros() - half + 1),
        );

        self.t = t;
        self.t_expiration = now + t;
    }

    #[inline]
    fn t_expired(&self, now: Instant) -> bool {
        now >= self.t_expiration
    }

    #[inline]
    fn i_expired(&self, now: Instant) -> bool {
        now >= self.i_expiration
    }

    #[cfg(test)]
    pub(crate) fn get_i(&self) -> Duration {
        self.i
    }

    #[cfg(test)]
    pub(crate) fn get_counter(&self) -> usize {
        self.counter
    }

    #[cfg(test)]
    pub(crate) fn set_counter(&mut self, value: usize) {
        self.counter = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timer(k: usize) -> (TrickleTimer, Rand) {
        (
            TrickleTimer::new(Duration::from_millis(100), 2, 3, k),
            Rand::new(0x1111_2222_3333_4444),
        )
    }

    #[test]
    fn interval_doubles_until_capped() {
        let (mut timer, mut rand) = timer(1);
        timer.start(Instant::ZERO, &mut rand, false);
        assert_eq!(timer.get_i(), Duration::from_millis(100));

        for expected in [200, 400, 800, 800, 800] {
            let now = timer.i_expiration;
            timer.poll(now, &mut rand);
            assert_eq!(timer.get_i(), Duration::from_millis(expected));
        }
    }

    #[test]
    fn warmup_start_skips_one_doubling() {
        let (mut timer, mut rand) = timer(1);
        timer.start(Instant::ZERO, &mut rand, true);
        assert_eq!(timer.get_i(), Duration::from_millis(200));
    }

    #[test]
    fn skip_doublings_defers_growth() {
        let (timer, mut rand) = timer(1);
        let mut timer = timer.with_skip_doublings(2);
        timer.start(Instant::ZERO, &mut rand, false);

        for expected in [100, 100, 200, 400] {
            let now = timer.i_expiration;
            timer.poll(now, &mut rand);
            assert_eq!(timer.get_i(), Duration::from_millis(expected));
        }
    }

    #[test]
    fn fixed_interval_never_grows() {
        let (timer, mut rand) = timer(1);
        let mut timer = timer.with_fixed_interval(Duration::from_millis(250));
        timer.start(Instant::ZERO, &mut rand, false);

        for _ in 0..4 {
            assert_eq!(timer.get_i(), Duration::from_millis(250));
            let now = timer.i_expiration;
            timer.poll(now, &mut rand);
        }
    }

    #[test]
    fn redundancy_suppresses_transmission() {
        let (mut timer, mut rand) = timer(2);
        timer.start(Instant::ZERO, &mut rand, false);

        timer.hear_message();
        assert!(timer.can_transmit());
        timer.hear_message();
        assert!(!timer.can_transmit());

        // The transmit deadline fires but the redundancy constant gates it.
        assert!(!timer.poll(timer.t_expiration, &mut rand));

        // An interval expiry resets the heard counter.
        timer.poll(timer.i_expiration, &mut rand);
        assert_eq!(timer.get_counter(), 0);
        assert!(timer.can_transmit());
    }

    #[test]
    fn zero_redundancy_constant_disables_transmission() {
        let (mut timer, mut rand) = timer(0);
        timer.start(Instant::ZERO, &mut rand, false);
        assert!(!timer.can_transmit());
        assert!(!timer.poll(timer.t_expiration, &mut rand));
    }

    #[test]
    fn transmit_fires_within_interval() {
        let (mut timer, mut rand) = timer(1);
        timer.start(Instant::ZERO, &mut rand, false);

        // t lies in the second half of the interval.
        assert!(timer.t >= timer.get_i() / 2);
        assert!(timer.t <= timer.get_i());

        assert!(!timer.poll(Instant::ZERO, &mut rand));
        assert!(timer.poll(timer.t_expiration, &mut rand));
    }

    #[test]
    fn suspend_disarms_deadlines() {
        let (mut timer, mut rand) = timer(1);
        timer.start(Instant::ZERO, &mut rand, false);
        assert!(timer.poll_at().is_some());

        timer.suspend();
        timer.suspend();
        assert_eq!(timer.poll_at(), None);
        assert!(!timer.poll(timer.t_expiration, &mut rand));

        timer.reset(Instant::from_millis_const(1_000), &mut rand);
        assert!(timer.poll_at().is_some());
        assert_eq!(timer.get_i(), Duration::from_millis(100));
    }
}
