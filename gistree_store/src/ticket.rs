//! Deterministic NodeId generation.
//!
//! The corpus has no dependency that supplies a seeded, serializable
//! two-word xoroshiro stream, so the generator is hand-rolled here: a
//! public-domain xoroshiro128** step function seeded via splitmix64, the
//! same pairing used by the reference implementation of the algorithm.
//! State is small enough to store directly in the tree snapshot (the
//! `ticket` entry of §3) and thread through every mutation.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};

/// RNG state for generating internal-node ids. Stored as a snapshot entry
/// so it replicates alongside the tree and every peer's splits stay
/// locally reproducible from a fixed seed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    s0: u64,
    s1: u64,
}

impl Ticket {
    /// Seed a fresh ticket from a 64-bit seed via splitmix64, avoiding the
    /// all-zero xoroshiro state (which would generate only zeros).
    pub fn seeded(seed: u64) -> Self {
        let mut sm = seed;
        let s0 = splitmix64(&mut sm);
        let s1 = splitmix64(&mut sm);
        // xoroshiro128** requires a non-zero state.
        if s0 == 0 && s1 == 0 {
            Ticket { s0: 1, s1: 0 }
        } else {
            Ticket { s0, s1 }
        }
    }

    /// Advance the generator and return a fresh internal-node id together
    /// with the successor state. The top bit is reserved so a generated id
    /// never collides with a user-supplied integer key stored at the same
    /// width — belt-and-suspenders alongside the `Id` tagged union.
    pub fn fresh_id(self) -> (NodeId, Ticket) {
        let mut s0 = self.s0;
        let mut s1 = self.s1;
        let result = s0.wrapping_mul(5).rotate_left(7).wrapping_mul(9);

        s1 ^= s0;
        let new_s0 = s0.rotate_left(24) ^ s1 ^ (s1 << 16);
        let new_s1 = s1.rotate_left(37);
        s0 = new_s0;
        s1 = new_s1;

        let id = result | (1 << 63);
        (NodeId(id), Ticket { s0, s1 })
    }
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
