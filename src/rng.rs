//! Mulberry32 pseudo-random generator
//!
//! A 32-bit bit mixer whose output every client must reproduce bit for bit,
//! so all arithmetic is explicit wrapping `u32` math.

const INCREMENT: u32 = 0x6D2B_79F5;
const TWO_POW_32: f64 = 4_294_967_296.0;

/// Advance `state` once, returning the new state and the raw 32-bit output.
#[inline]
pub fn next_u32(state: u32) -> (u32, u32) {
    let state = state.wrapping_add(INCREMENT);
    let mut t = state;
    t = (t ^ (t >> 15)).wrapping_mul(t | 1);
    t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
    (state, t ^ (t >> 14))
}

/// Advance `state` once, returning the new state and a value in `[0, 1)`.
#[inline]
pub fn next(state: u32) -> (u32, f64) {
    let (state, raw) = next_u32(state);
    (state, raw as f64 / TWO_POW_32)
}

/// Stateful wrapper around [`next`]
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: u32) -> Self {
        Self { state: seed }
    }

    /// Seeds are stored as signed 32-bit integers; the bit pattern is what counts.
    pub fn from_seed(seed: i32) -> Self {
        Self::new(seed as u32)
    }

    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let (state, raw) = next_u32(self.state);
        self.state = state;
        raw
    }

    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        let (state, value) = next(self.state);
        self.state = state;
        value
    }
}
