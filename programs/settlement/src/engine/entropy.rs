use anchor_lang::prelude::*;
use bytemuck::{Pod, Zeroable};

/// 256-bit xorshift state stored as four little-endian u64 limbs (limb 0 is least significant).
#[derive(
    AnchorSerialize, AnchorDeserialize, InitSpace, Clone, Copy, Debug, Default, PartialEq, Eq,
    Pod, Zeroable,
)]
#[repr(C)]
pub struct Entropy {
    pub limbs: [u64; 4],
}

impl Entropy {
    pub const fn from_u64(value: u64) -> Self {
        Self { limbs: [value, 0, 0, 0] }
    }

    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        let mut limbs = [0u64; 4];
        for (limb, chunk) in limbs.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *limb = u64::from_le_bytes(word);
        }
        Self { limbs }
    }

    pub fn to_bytes(&self) -> [u8; 32] {
        let mut out = [0u8; 32];
        for (chunk, limb) in out.chunks_exact_mut(8).zip(self.limbs.iter()) {
            chunk.copy_from_slice(&limb.to_le_bytes());
        }
        out
    }

    pub fn is_zero(&self) -> bool {
        self.limbs.iter().all(|l| *l == 0)
    }

    pub fn low_u64(&self) -> u64 {
        self.limbs[0]
    }

    /// `s ^= s << 7; s ^= s >> 9; s ^= s << 8` over the full 256 bits.
    pub fn step(self) -> Self {
        let mut s = self;
        s = s.xor(&s.shl(7));
        s = s.xor(&s.shr(9));
        s.xor(&s.shl(8))
    }

    /// Mixes `value` into one limb. Used to separate draws by index, category and tier.
    pub fn salted(self, value: u64, lane: usize) -> Self {
        let mut s = self;
        s.limbs[lane & 3] ^= value;
        s
    }

    /// Seed combined with the hash of a domain tag, then stepped once.
    pub fn derive(seed: &[u8; 32], tag: &[u8]) -> Self {
        let tag_hash = Self::from_bytes(blake3::hash(tag).as_bytes());
        let mixed = Self::from_bytes(seed).xor(&tag_hash).step();
        if mixed.is_zero() {
            tag_hash
        } else {
            mixed
        }
    }

    /// Independent value for draw `index` within `domain`: blake3 over (state, domain, index).
    /// Unlike `salted`, every output bit depends on the index.
    pub fn fork(&self, domain: &[u8], index: u64) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.to_bytes());
        hasher.update(domain);
        hasher.update(&index.to_le_bytes());
        Self::from_bytes(hasher.finalize().as_bytes())
    }

    /// Remainder of the full 256-bit value modulo `modulus`.
    pub fn bounded(&self, modulus: u64) -> Option<u64> {
        if modulus == 0 {
            return None;
        }
        let m = modulus as u128;
        let mut rem = 0u128;
        for limb in self.limbs.iter().rev() {
            rem = ((rem << 64) | *limb as u128) % m;
        }
        Some(rem as u64)
    }

    fn xor(&self, other: &Self) -> Self {
        let mut limbs = self.limbs;
        for (l, o) in limbs.iter_mut().zip(other.limbs.iter()) {
            *l ^= o;
        }
        Self { limbs }
    }

    // 0 < bits < 64
    fn shl(&self, bits: u32) -> Self {
        let l = self.limbs;
        Self {
            limbs: [
                l[0] << bits,
                (l[1] << bits) | (l[0] >> (64 - bits)),
                (l[2] << bits) | (l[1] >> (64 - bits)),
                (l[3] << bits) | (l[2] >> (64 - bits)),
            ],
        }
    }

    fn shr(&self, bits: u32) -> Self {
        let l = self.limbs;
        Self {
            limbs: [
                (l[0] >> bits) | (l[1] << (64 - bits)),
                (l[1] >> bits) | (l[2] << (64 - bits)),
                (l[2] >> bits) | (l[3] << (64 - bits)),
                l[3] >> bits,
            ],
        }
    }
}
