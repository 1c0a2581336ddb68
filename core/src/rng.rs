//! Deterministic random number generation.
//!
//! RULE: Nothing in world or reward generation may call any platform RNG.
//! All randomness flows through a Mulberry32 stream seeded from the
//! player's identity hash and the tile index.
//!
//! Each concern (tile kind, loot, ticket description) draws from its own
//! sub-seed, derived as `seed + index * multiplier` with a distinct
//! multiplier per concern. This means:
//!   - The tile-kind draw and the loot draw for a tile are never the same value.
//!   - Any caller holding (seed, index) reproduces the same draw in isolation.

use crate::types::{Seed, TileIndex};
use rand::{RngCore, SeedableRng};

/// Mulberry32: a 32-bit multiply-xorshift generator.
///
/// Every instance is an independent stream; there is no global state.
#[derive(Debug, Clone)]
pub struct Mulberry32 {
    state: u32,
}

impl Mulberry32 {
    pub fn new(seed: Seed) -> Self {
        Self { state: seed }
    }

    /// Stream for one concern at one tile.
    pub fn for_tile(seed: Seed, index: TileIndex, stream: SeedStream) -> Self {
        Self::new(stream.derive(seed, index))
    }

    /// Roll a float in [0.0, 1.0).
    pub fn next_f64(&mut self) -> f64 {
        self.next_word() as f64 / 4_294_967_296.0
    }

    fn next_word(&mut self) -> u32 {
        self.state = self.state.wrapping_add(0x6D2B_79F5);
        let mut t = self.state;
        t = (t ^ (t >> 15)).wrapping_mul(t | 1);
        t ^= t.wrapping_add((t ^ (t >> 7)).wrapping_mul(t | 61));
        t ^ (t >> 14)
    }
}

impl RngCore for Mulberry32 {
    fn next_u32(&mut self) -> u32 {
        self.next_word()
    }

    fn next_u64(&mut self) -> u64 {
        let lo = u64::from(self.next_word());
        let hi = u64::from(self.next_word());
        (hi << 32) | lo
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(4) {
            let bytes = self.next_word().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl SeedableRng for Mulberry32 {
    type Seed = [u8; 4];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::new(u32::from_le_bytes(seed))
    }
}

/// Stable per-concern seed multipliers.
/// NEVER change a value: doing so reshuffles every player's world
/// and every reward not yet claimed. Only append.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u32)]
pub enum SeedStream {
    TileKind = 7919,
    Loot = 13397,
    TicketDescription = 17389,
}

impl SeedStream {
    pub fn multiplier(&self) -> u32 {
        *self as u32
    }

    /// `seed + index * multiplier`, wrapped to 32 bits.
    pub fn derive(&self, seed: Seed, index: TileIndex) -> Seed {
        let offset = index.wrapping_mul(i64::from(self.multiplier())) as u32;
        seed.wrapping_add(offset)
    }
}

/// Map a player identifier to its world seed.
///
/// FNV-1a over the UTF-8 bytes, finished with the murmur3 fmix32 avalanche
/// so that ids differing in one trailing character land far apart.
/// The layout is frozen: changing it reshuffles every player's world.
pub fn identity_hash(identifier: &str) -> Seed {
    const OFFSET: u32 = 0x811c_9dc5;
    const PRIME: u32 = 0x0100_0193;

    let mut hash = OFFSET;
    for &byte in identifier.as_bytes() {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(PRIME);
    }
    fmix32(hash)
}

fn fmix32(mut h: u32) -> u32 {
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}
