//! Domain access and AP permission checks (§4.B steps 5-6).

use crate::control::Cp15Registers;
use crate::fault::Fault;
use crate::tlb::{Mapping, TlbEntry};

/// Table 8-2 "Interpreting AP bits": does this access pass under the given
/// AP value?
fn check_ap(regs: &Cp15Registers, ap: u32, user: bool, read: bool) -> bool {
    match ap {
        0 => read && ((regs.system() && !user) || regs.rom()),
        1 => !user,
        2 => read || !user,
        3 => true,
        _ => unreachable!("2-bit field"),
    }
}

/// Domain access control followed by, for client domains, the AP
/// permission check. `user` is true in USR/SYS mode.
pub fn check_access(
    regs: &mut Cp15Registers,
    virt_addr: u32,
    entry: TlbEntry,
    user: bool,
    read: bool,
) -> Result<(), Fault> {
    regs.last_domain = entry.domain;
    let access = (regs.domain_access_control >> (entry.domain * 2)) & 3;
    match access {
        0 | 2 => Err(Fault::SectionDomainFault),
        1 => {
            let ap = entry.ap_for(virt_addr);
            if check_ap(regs, ap, user, read) {
                Ok(())
            } else if entry.mapping == Mapping::Section {
                Err(Fault::SectionPermissionFault)
            } else {
                Err(Fault::SubpagePermissionFault)
            }
        }
        // Manager access: bypass the permission check entirely.
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpu_arm710::CpuVariant;

    fn entry(ap: u32, domain: u8, mapping: Mapping) -> TlbEntry {
        TlbEntry {
            virt: 0,
            phys: 0,
            perms: (ap << 4) | 0x08,
            domain,
            mapping,
        }
    }

    #[test]
    fn manager_domain_bypasses_permission_check() {
        let mut regs = Cp15Registers::new(CpuVariant::ArmV3);
        regs.domain_access_control = 0b11; // domain 0 = manager
        let e = entry(0, 0, Mapping::Section);
        assert!(check_access(&mut regs, 0, e, true, false).is_ok());
    }

    #[test]
    fn client_domain_enforces_ap0_user_read_only_denied() {
        let mut regs = Cp15Registers::new(CpuVariant::ArmV3);
        regs.domain_access_control = 0b01; // domain 0 = client
        let e = entry(0, 0, Mapping::Section);
        assert_eq!(
            check_access(&mut regs, 0, e, true, true),
            Err(Fault::SectionPermissionFault)
        );
    }

    #[test]
    fn no_access_domain_faults() {
        let mut regs = Cp15Registers::new(CpuVariant::ArmV3);
        regs.domain_access_control = 0b00;
        let e = entry(3, 0, Mapping::Section);
        assert_eq!(
            check_access(&mut regs, 0, e, false, false),
            Err(Fault::SectionDomainFault)
        );
    }
}
