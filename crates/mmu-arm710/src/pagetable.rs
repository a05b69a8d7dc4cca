//! Two-level page-table walker (§4.B step 4).

use crate::bus::PhysicalMemory;
use crate::fault::Fault;
use crate::tlb::{Mapping, TlbEntry};

/// Walk the L1/L2 tables for `virt_addr`, returning a TLB entry ready to
/// insert (its tag/base already masked to the mapping granularity) or the
/// translation fault the walk hit.
pub fn walk(
    ttb: u32,
    virt_addr: u32,
    phys: &mut impl PhysicalMemory,
) -> Result<TlbEntry, Fault> {
    let l1_addr = ((ttb & 0xFFFF_C000) | (virt_addr >> 18)) & !3;
    let l1_desc = phys.read_phys_word(l1_addr);

    let mut entry = match l1_desc & 3 {
        0 | 3 => return Err(Fault::SectionTranslationFault),
        2 => TlbEntry {
            virt: virt_addr,
            phys: l1_desc,
            perms: l1_desc & 0x0000_0C0C,
            domain: ((l1_desc >> 5) & 0xF) as u8,
            mapping: Mapping::Section,
        },
        1 => {
            let domain = ((l1_desc >> 5) & 0xF) as u8;
            let l2_addr = ((l1_desc & 0xFFFF_FC00) | ((virt_addr & 0x000F_F000) >> 10)) & !3;
            let l2_desc = phys.read_phys_word(l2_addr);
            let mapping = match l2_desc & 3 {
                1 => Mapping::LargePage,
                2 => Mapping::SmallPage,
                _ => return Err(Fault::PageTranslationFault),
            };
            TlbEntry {
                virt: virt_addr,
                phys: l2_desc,
                perms: l2_desc & 0x0000_0FFC,
                domain,
                mapping,
            }
        }
        _ => unreachable!("2-bit field"),
    };

    let mask = entry.mapping.addr_mask();
    entry.virt &= mask;
    entry.phys &= mask;
    Ok(entry)
}
