//! A small self-contained pseudo random number generator. The engine only
//! needs cheap jitter, for placing the trickle transmission inside an
//! interval and for spreading out acknowledgment deadlines, so a single
//! 64 bit multiplicative state is plenty. The seed comes from the caller,
//! which keeps simulation runs reproducible.

/// An sPCG32 generator.
///
/// See <https://www.pcg-random.org/paper.html> and
/// <https://nullprogram.com/blog/2017/09/21/>.
#[derive(Debug)]
pub(crate) struct Rand {
    state: u64,
}

impl Rand {
    pub(crate) const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub(crate) fn rand_u32(&mut self) -> u32 {
        const M: u64 = 0xbb2efcec3c39611d;
        const A: u64 = 0x7590ef39;

        let s = self.state.wrapping_mul(M).wrapping_add(A);
        self.state = s;

        // The output permutation is a shift by an amount the top bits of
        // the state select.
        let shift = 29 - (s >> 61);
        (s >> shift) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_seeds_give_equal_streams() {
        let mut a = Rand::new(0x0123_4567_89ab_cdef);
        let mut b = Rand::new(0x0123_4567_89ab_cdef);

        for _ in 0..32 {
            assert_eq!(a.rand_u32(), b.rand_u32());
        }
    }
}
