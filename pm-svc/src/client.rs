/// One processor eligible to initiate PM calls.
///
/// Immutable after boot-time initialization; looked up by core index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Proc {
    /// Platform-specific device node identifier of the core.
    pub node_id: u32,
    /// Bit set in the power-control register to request core power-down.
    pub pwrdn_mask: u32,
}

/// Boot-time service configuration.
#[derive(Clone, Copy)]
pub struct PmConfig {
    /// Descriptor table, indexed by core position.
    pub procs: &'static [Proc],
    /// Index of the descriptor used for non-core-specific requests.
    pub primary: usize,
}

/// Per-core lifecycle tag. `Parked` is terminal: the core sits in its
/// low-power wait loop until the PMC resets it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreState {
    Running,
    Parked,
}

/// Platform collaborators of the PM service: client-side power-down state,
/// interrupt controller operations and the terminal idle park.
///
/// These are external to the protocol core (GIC driver, MMIO helpers, wfi
/// entry); firmware supplies the real implementations, tests a recording
/// mock.
pub trait PmPlatform: Send + Sync {
    /// Position of the calling core.
    fn core_index(&self) -> usize;

    /// Client-specific suspend side effect: arms the power-down request bit
    /// for `proc` so local hardware state is consistent even if the PMC
    /// response races the caller's own power-down.
    fn arm_powerdown(&self, proc: &Proc, state: u32);

    /// Undoes [`PmPlatform::arm_powerdown`] when a suspend is aborted.
    fn disarm_powerdown(&self);

    /// Signals the normal-world OS on the calling core with the registered
    /// software-generated interrupt.
    fn raise_os_sgi(&self, sgi: u32);

    /// Raises the firmware-level cpu-idle SGI on `core`.
    fn raise_idle_sgi(&self, core: usize);

    /// Acknowledges the pending interrupt at the interrupt controller.
    fn ack_interrupt(&self);

    /// Signals end-of-interrupt for `irq`.
    fn end_of_interrupt(&self, irq: u32);

    /// Clears a pending interrupt without handling it.
    fn clear_interrupt_pending(&self, irq: u32);

    /// Parks the calling core: masks local interrupts, writes `pwrdn_mask`
    /// to the power-control register and loops in wfi. Never returns; the
    /// core is resumed only by a PMC-driven reset.
    fn park(&self, pwrdn_mask: u32) -> !;
}
