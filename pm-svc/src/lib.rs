//! Power-management SMC service.
//!
//! Mediates between the normal-world OS and the platform management
//! controller (PMC): secure-monitor calls are decoded, turned into EEMI
//! payloads and driven through the IPI transport; PMC-initiated callbacks
//! arrive over the doorbell interrupt and are forwarded to the OS with a
//! software-generated interrupt or turned into local core parking.
//!
//! All mutable service state lives in an explicitly constructed
//! [`PmService`]; the hardware mailbox and the platform interrupt/power
//! helpers are injected through the [`pm_ipi::IpiMailbox`] and
//! [`client::PmPlatform`] seams, so the whole protocol stack runs unchanged
//! against a simulated PMC in tests.

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate log;

use kspin::SpinNoIrq;
use pm_eemi::{PmError, PmResult, SHUTDOWN_SUBTYPE_RST_SYSTEM};
use pm_ipi::{IpiChannel, IpiMailbox};

mod api;
mod client;
mod entry;
mod notify;
mod smc;
#[cfg(test)]
mod tests;

pub use client::{CoreState, PmConfig, PmPlatform, Proc};
pub use entry::{PmHandler, pm_cpu_idle_handler, pm_ipi_fiq_handler, pm_smc_handler, register_handler};
pub use smc::{SMC_UNKNOWN, SmcFlags, SmcReturn};

/// Upper bound on cores eligible to initiate PM calls.
pub const MAX_CORES: usize = 8;

/// Sentinel-free replacement for the original "invalid SGI" global:
/// `None` means no OS notification SGI has been registered.
struct PmContext {
    /// Transport initialized; until set every SMC returns "unknown".
    ready: bool,
    /// Scope applied to subsequent shutdown/restart requests.
    shutdown_scope: u32,
    /// SGI used to re-signal the normal-world OS for async events.
    sgi: Option<u32>,
    /// Per-core lifecycle tags; `Parked` is terminal.
    cores: [CoreState; MAX_CORES],
}

impl PmContext {
    const fn new() -> Self {
        Self {
            ready: false,
            shutdown_scope: SHUTDOWN_SUBTYPE_RST_SYSTEM,
            sgi: None,
            cores: [CoreState::Running; MAX_CORES],
        }
    }
}

/// The PM service instance: one IPI channel to the PMC, the platform seam,
/// the processor descriptor table and the process-wide PM context.
pub struct PmService<M, P> {
    channel: IpiChannel<M>,
    plat: P,
    procs: &'static [Proc],
    primary: usize,
    ctx: SpinNoIrq<PmContext>,
}

impl<M: IpiMailbox, P: PmPlatform> PmService<M, P> {
    /// Builds a service over the given mailbox and platform.
    ///
    /// # Panics
    ///
    /// Panics on a malformed boot configuration (empty descriptor table,
    /// out-of-range primary index or more cores than [`MAX_CORES`]).
    pub fn new(mb: M, plat: P, config: PmConfig) -> Self {
        assert!(!config.procs.is_empty() && config.procs.len() <= MAX_CORES);
        assert!(config.primary < config.procs.len());
        Self {
            channel: IpiChannel::new(mb),
            plat,
            procs: config.procs,
            primary: config.primary,
            ctx: SpinNoIrq::new(PmContext::new()),
        }
    }

    /// Service bring-up, called once from the SMC framework setup path.
    ///
    /// Initializes the IPI channel, marks the service ready and registers
    /// the boot-time notifier for forced subsystem power-down events. A
    /// notifier failure is logged but does not fail setup; the OS-facing
    /// API stays usable without it.
    pub fn setup(&self) -> PmResult {
        if let Err(e) = self.channel.init() {
            info!("PM service init failed: {e}");
            return Err(e);
        }
        self.ctx.lock().ready = true;

        if let Err(e) = self.register_notifier(
            pm_eemi::DEV_ACPU_0,
            pm_eemi::EVENT_CPU_IDLE_FORCE_PWRDWN,
            0,
            1,
            pm_eemi::SecurityFlag::Secure,
        ) {
            warn!("registering idle-powerdown notifier failed: {e}");
        }
        Ok(())
    }

    /// Whether setup completed successfully.
    pub fn is_ready(&self) -> bool {
        self.ctx.lock().ready
    }

    /// Lifecycle tag of a core, or `None` for a core this service was not
    /// configured for.
    pub fn core_state(&self, core: usize) -> Option<CoreState> {
        (core < self.procs.len()).then(|| self.ctx.lock().cores[core])
    }

    /// Descriptor of the core at `index`, if one is configured.
    fn proc(&self, index: usize) -> Option<&Proc> {
        self.procs.get(index)
    }

    /// Descriptor used for all non-core-specific requests.
    fn primary_proc(&self) -> &Proc {
        &self.procs[self.primary]
    }

    /// Descriptor of the calling core, or an internal error when the
    /// platform reports a core this service was not configured for.
    fn own_proc(&self) -> PmResult<&Proc> {
        let core = self.plat.core_index();
        self.proc(core).ok_or_else(|| {
            warn!("no processor descriptor for core {core}");
            PmError::Internal
        })
    }
}
