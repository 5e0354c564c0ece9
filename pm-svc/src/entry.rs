//! Static front door for the external SMC dispatch and interrupt
//! frameworks.
//!
//! Those frameworks call plain functions; the firmware integration builds
//! its concrete [`crate::PmService`] once at boot and registers it here.

use lazyinit::LazyInit;
use pm_ipi::IpiMailbox;

use crate::{PmPlatform, PmService, SmcFlags, SmcReturn};

/// Object-safe view of a PM service for the registered entry points.
pub trait PmHandler: Sync {
    fn smc(&self, smc_fid: u32, x1: u64, x2: u64, x3: u64, x4: u64, flags: SmcFlags) -> SmcReturn;
    fn ipi_fiq(&self, irq: u32);
    fn cpu_idle(&self, irq: u32) -> !;
}

impl<M: IpiMailbox, P: PmPlatform> PmHandler for PmService<M, P> {
    fn smc(&self, smc_fid: u32, x1: u64, x2: u64, x3: u64, x4: u64, flags: SmcFlags) -> SmcReturn {
        self.handle_smc(smc_fid, x1, x2, x3, x4, flags)
    }

    fn ipi_fiq(&self, irq: u32) {
        self.ipi_callback(irq)
    }

    fn cpu_idle(&self, irq: u32) -> ! {
        self.cpu_idle_entry(irq)
    }
}

static PM_HANDLER: LazyInit<&'static dyn PmHandler> = LazyInit::new();

/// Registers the service instance behind the entry points. Call once during
/// firmware boot, after [`crate::PmService::setup`].
pub fn register_handler(handler: &'static dyn PmHandler) {
    PM_HANDLER.init_once(handler);
}

/// SMC entry registered with the secure-monitor dispatch framework.
pub fn pm_smc_handler(
    smc_fid: u32,
    x1: u64,
    x2: u64,
    x3: u64,
    x4: u64,
    flags: SmcFlags,
) -> SmcReturn {
    match PM_HANDLER.get() {
        Some(handler) => handler.smc(smc_fid, x1, x2, x3, x4, flags),
        None => SmcReturn::UNKNOWN,
    }
}

/// Doorbell FIQ entry registered with the interrupt framework.
pub fn pm_ipi_fiq_handler(irq: u32) {
    if let Some(handler) = PM_HANDLER.get() {
        handler.ipi_fiq(irq);
    }
}

/// Cpu-idle SGI entry. Parks the core even when no service is registered;
/// this interrupt only fires on a forced power-down, after which the core
/// must not keep running.
pub fn pm_cpu_idle_handler(irq: u32) -> ! {
    match PM_HANDLER.get() {
        Some(handler) => handler.cpu_idle(irq),
        None => loop {
            core::hint::spin_loop();
        },
    }
}
