//! The 4-way set-associative, virtually-indexed cache (§3 "MMU state",
//! §4.B steps 3 and 8).
//!
//! 128 lines of 4 ways each, four 32-bit words per line: 8 KiB total,
//! matching `armmmu.h`'s `CACHE_SIZE`/`CACHE_BANKS`/`CACHE_LINES`.

use rand::Rng;

pub const CACHE_LINES: usize = 128;
pub const CACHE_WAYS: usize = 4;

const TAG_ADDR_MASK: u32 = 0xFFFF_FFF0;
const TAG_VALID_FLAG: u32 = 0x0000_0001;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Line {
    data: [u32; 4],
    tag: u32,
}

impl Line {
    const fn valid(self) -> bool {
        self.tag & TAG_VALID_FLAG != 0
    }
}

/// Set-associative cache. Each of `CACHE_LINES` sets holds `CACHE_WAYS`
/// independently tagged lines.
#[derive(Debug, Clone)]
pub struct Cache {
    sets: Box<[[Line; CACHE_WAYS]; CACHE_LINES]>,
}

impl Default for Cache {
    fn default() -> Self {
        Self::new()
    }
}

impl Cache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sets: Box::new([[Line::default(); CACHE_WAYS]; CACHE_LINES]),
        }
    }

    fn set_index(addr: u32) -> usize {
        ((addr >> 4) as usize) & (CACHE_LINES - 1)
    }

    /// Look up the word-aligned quadword containing `addr`. A line whose
    /// valid bit is clear is absent regardless of its tag (§3 invariant).
    #[must_use]
    pub fn lookup(&self, addr: u32) -> Option<u32> {
        let want = (addr & TAG_ADDR_MASK) | TAG_VALID_FLAG;
        let set = &self.sets[Self::set_index(addr)];
        set.iter()
            .find(|line| line.valid() && line.tag == want)
            .map(|line| line.data[((addr >> 2) & 3) as usize])
    }

    /// Overwrite the matching line's word in place, if present, without
    /// changing its tag (a cached write-through update, not an allocation).
    pub fn write_through(&mut self, addr: u32) -> Option<&mut u32> {
        let want = (addr & TAG_ADDR_MASK) | TAG_VALID_FLAG;
        let word_index = ((addr >> 2) & 3) as usize;
        let set = &mut self.sets[Self::set_index(addr)];
        set.iter_mut()
            .find(|line| line.valid() && line.tag == want)
            .map(|line| &mut line.data[word_index])
    }

    /// Pick a way to refill for `addr`: the first invalid way, or a
    /// uniformly random way if the set is full (§4.B step 8, confirmed
    /// against `armmmu.c: mmu_cache_alloc`'s `rand() % CACHE_BANKS`
    /// fallback).
    pub fn fill(&mut self, addr: u32, words: [u32; 4]) {
        let set = &mut self.sets[Self::set_index(addr)];
        let way = set
            .iter()
            .position(|line| !line.valid())
            .unwrap_or_else(|| rand::rng().random_range(0..CACHE_WAYS));
        set[way] = Line {
            data: words,
            tag: (addr & TAG_ADDR_MASK) | TAG_VALID_FLAG,
        };
    }

    pub fn invalidate_all(&mut self) {
        for set in self.sets.iter_mut() {
            for line in set.iter_mut() {
                line.tag = 0;
            }
        }
    }
}
