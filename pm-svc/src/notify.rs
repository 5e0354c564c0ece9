//! Asynchronous notification front-end: PMC doorbell servicing, OS
//! re-signalling and the forced-power-down park path.

use pm_eemi::{EVENT_CPU_IDLE_FORCE_PWRDWN, PM_INIT_SUSPEND_CB, PM_NOTIFY_CB, PmError, PmResult};
use pm_ipi::IpiMailbox;

use crate::{CoreState, PmPlatform, PmService};

/// Largest SGI number the interrupt controller can deliver.
const MAX_SGI_TARGETS: u32 = 16;

impl<M: IpiMailbox, P: PmPlatform> PmService<M, P> {
    /// Doorbell FIQ entry: drains the PMC callback and dispatches on its
    /// class.
    ///
    /// - Suspend initiated by the PMC itself: re-signal the normal-world OS
    ///   with the registered SGI, leaving the doorbell pending so the OS
    ///   can fetch the callback payload. No SGI registered means the event
    ///   is dropped silently.
    /// - Notify with a forced subsystem power-down event: park the
    ///   requested cores, bypassing the OS entirely, and acknowledge.
    /// - Anything else is a protocol warning; the doorbell is cleared so
    ///   the channel stays live even against a misbehaving PMC.
    pub fn ipi_callback(&self, irq: u32) {
        trace!("received IPI FIQ from firmware");
        self.plat.ack_interrupt();

        let mut payload = [0u32; 4];
        self.get_callbackdata(&mut payload, false);
        match payload[0] {
            PM_INIT_SUSPEND_CB => self.notify_os(),
            PM_NOTIFY_CB => {
                if payload[2] == EVENT_CPU_IDLE_FORCE_PWRDWN {
                    self.request_cpu_idle(payload[1]);
                    self.channel.irq_clear();
                } else {
                    self.notify_os();
                }
            }
            other => {
                self.channel.irq_clear();
                warn!("invalid IPI callback class {other}");
            }
        }

        self.plat.end_of_interrupt(irq);
    }

    /// Signals the normal-world OS on the calling core, if an SGI has been
    /// registered.
    fn notify_os(&self) {
        if let Some(sgi) = self.ctx.lock().sgi {
            self.plat.raise_os_sgi(sgi);
        }
    }

    /// Raises the cpu-idle SGI on every core selected by `core_mask`.
    fn request_cpu_idle(&self, core_mask: u32) {
        trace!("CPU idle request for mask {core_mask:#x}");
        for core in 0..self.procs.len() {
            if core_mask & (1 << core) != 0 {
                self.plat.raise_idle_sgi(core);
            }
        }
    }

    /// Registers (or, with `reset` set, unregisters) the SGI used to
    /// notify the OS. Purely local; the PMC is not involved.
    ///
    /// Re-registering while an SGI is active is a duplicate request;
    /// numbers beyond the interrupt controller's SGI range are rejected.
    pub fn register_sgi(&self, sgi_num: u32, reset: u32) -> PmResult {
        let mut ctx = self.ctx.lock();
        if reset == 1 {
            ctx.sgi = None;
            return Ok(());
        }
        if ctx.sgi.is_some() {
            return Err(PmError::DoubleReq);
        }
        if sgi_num >= MAX_SGI_TARGETS {
            return Err(PmError::Args);
        }
        ctx.sgi = Some(sgi_num);
        Ok(())
    }

    /// Marks the calling core as parked and returns its power-down mask.
    ///
    /// Split out of [`PmService::cpu_idle_entry`] so the terminal
    /// transition is observable in tests without executing the park loop.
    pub fn prepare_park(&self, irq: u32) -> u32 {
        let core = self.plat.core_index();
        trace!("entering wfi on core {core}");
        self.plat.clear_interrupt_pending(irq);
        if let Some(state) = self.ctx.lock().cores.get_mut(core) {
            *state = CoreState::Parked;
        }
        match self.proc(core) {
            Some(proc) => proc.pwrdn_mask,
            None => {
                warn!("no processor descriptor for core {core}, parking without mask");
                0
            }
        }
    }

    /// Cpu-idle SGI entry: parks the calling core in its low-power wait
    /// loop. Never returns; the core comes back only through a PMC-driven
    /// reset.
    pub fn cpu_idle_entry(&self, irq: u32) -> ! {
        let mask = self.prepare_park(irq);
        self.plat.park(mask)
    }
}
