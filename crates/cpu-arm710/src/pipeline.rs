//! The three-slot fetch/decode/execute pipeline and its refill state
//! machine (§4.E).

use crate::bus::CycleKind;

/// What the next fetch should do, mirroring the bus cycle type it will
/// issue and whether `R15` needs to be advanced first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextFetch {
    /// Sequential fetch from the address following the last one issued.
    Seq,
    /// Non-sequential fetch: address doesn't follow the previous one
    /// (branch target, exception vector, pipeline restart).
    NonSeq,
    /// PC has just been incremented and the next fetch is sequential.
    PcIncedSeq,
    /// PC has just been incremented and the next fetch is non-sequential
    /// (used right after a pipeline flush where the new stream still
    /// needs one non-sequential cycle to prime the second slot).
    PcIncedNonSeq,
    /// Resume normal fetching after an exception entry sequence.
    Resume,
    /// Pipeline has just been flushed and is being primed with two fetches
    /// before the first instruction can execute.
    Primed,
}

/// One word in flight, carrying whether its own fetch aborted. The abort
/// rides along with the word through decode and only becomes visible once
/// the word reaches the execute slot (§4.I: a prefetch abort is latched
/// until the faulting instruction would actually execute).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub word: u32,
    pub aborted: bool,
}

/// Three pipeline slots: fetch, decode, execute. `decoded` holds the word
/// about to execute next cycle; `executing` is the word currently
/// retiring. All three may be empty right after a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pipeline {
    pub decoded: Option<Slot>,
    pub executing: Option<Slot>,
    next_fetch: NextFetch,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            decoded: None,
            executing: None,
            next_fetch: NextFetch::Primed,
        }
    }

    /// The bus cycle kind the upcoming fetch should be issued as (§4.E):
    /// sequential once the pipeline has settled into linear execution,
    /// non-sequential for the fetch right after a flush.
    #[must_use]
    pub const fn next_cycle_kind(&self) -> CycleKind {
        match self.next_fetch {
            NextFetch::Seq | NextFetch::PcIncedSeq => CycleKind::Sequential,
            NextFetch::NonSeq | NextFetch::PcIncedNonSeq | NextFetch::Resume | NextFetch::Primed => {
                CycleKind::NonSequential
            }
        }
    }

    /// Shift a newly fetched word into the pipeline, retiring whatever was
    /// in the execute slot. Returns the instruction now ready to execute,
    /// if any, along with whether *its* fetch aborted.
    pub fn advance(&mut self, fetched: u32, fetch_aborted: bool) -> Option<Slot> {
        let retiring = self.executing;
        self.executing = self.decoded;
        self.decoded = Some(Slot {
            word: fetched,
            aborted: fetch_aborted,
        });
        self.next_fetch = match self.next_fetch {
            // The fetch that just landed was the first one after a flush
            // (non-sequential); the next one continues from it on the bus,
            // but R15 already carries the reprime's two-ahead value rather
            // than an ordinary per-tick increment.
            NextFetch::Primed | NextFetch::Resume => NextFetch::PcIncedSeq,
            NextFetch::PcIncedSeq | NextFetch::Seq => NextFetch::Seq,
            NextFetch::NonSeq | NextFetch::PcIncedNonSeq => NextFetch::Seq,
        };
        retiring
    }

    /// Discard all in-flight state, e.g. on a taken branch. The caller
    /// must re-prime with two fetches before execution resumes.
    pub fn flush(&mut self) {
        *self = Self::new();
    }

    /// Re-prime after an exception vector dispatch. Distinct from
    /// [`flush`](Self::flush) only in the `NextFetch` state it leaves
    /// behind (`Resume` instead of `Primed`); both reload all three
    /// pipeline slots identically (§4.E).
    pub fn resume(&mut self) {
        *self = Self {
            next_fetch: NextFetch::Resume,
            ..Self::new()
        };
    }

    #[must_use]
    pub const fn is_primed(&self) -> bool {
        self.executing.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_then_two_fetches_settle_into_sequential() {
        let mut p = Pipeline::new();
        assert_eq!(p.next_cycle_kind(), CycleKind::NonSequential);
        assert!(!p.is_primed());

        p.advance(1, false);
        assert_eq!(p.next_cycle_kind(), CycleKind::Sequential);
        assert!(!p.is_primed());

        p.advance(2, false);
        assert_eq!(p.next_cycle_kind(), CycleKind::Sequential);
        assert!(p.is_primed(), "third fetch retires the first instruction");

        p.advance(3, false);
        assert_eq!(p.next_cycle_kind(), CycleKind::Sequential);
    }

    #[test]
    fn resume_after_exception_entry_is_non_sequential_then_settles() {
        let mut p = Pipeline::new();
        p.advance(1, false);
        p.advance(2, false);

        p.resume();
        assert_eq!(p.next_cycle_kind(), CycleKind::NonSequential);
        assert!(!p.is_primed());

        p.advance(0x18, false);
        assert_eq!(p.next_cycle_kind(), CycleKind::Sequential);
    }

    #[test]
    fn flush_discards_in_flight_slots() {
        let mut p = Pipeline::new();
        p.advance(1, false);
        p.advance(2, false);
        assert!(p.is_primed());

        p.flush();
        assert!(!p.is_primed());
        assert_eq!(p.decoded, None);
        assert_eq!(p.executing, None);
    }
}
