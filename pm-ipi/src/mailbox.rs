use pm_eemi::{PAYLOAD_ARG_CNT, PmResult};

/// Hardware seam for one IPI mailbox channel to the PMC.
///
/// A fixed shared-memory region split into an outbound request slot and an
/// inbound response slot, guarded by a doorbell interrupt in each direction.
/// Implementations are MMIO drivers on real hardware and scripted mocks in
/// tests. All waiting is busy-polling with no timeout: the PMC is a trusted,
/// always-eventually-responsive peer.
pub trait IpiMailbox: Send + Sync {
    /// One-time channel bring-up. Failure leaves the PM service unusable
    /// (every SMC returns "unknown function").
    fn init(&self) -> PmResult;

    /// Copies a request payload into the outbound slot.
    fn write_request(&self, words: &[u32; PAYLOAD_ARG_CNT]);

    /// Rings the doorbell towards the PMC.
    fn ring(&self);

    /// Busy-polls until the outbound doorbell clears, i.e. the PMC has
    /// consumed the request and fully written its response.
    fn wait_idle(&self);

    /// Copies the inbound response slot. Word 0 is the PMC status word.
    fn read_response(&self, out: &mut [u32; PAYLOAD_ARG_CNT]);

    /// Copies the PMC-initiated callback payload from the inbound request
    /// slot. Does not acknowledge the doorbell.
    fn read_callback(&self, out: &mut [u32; PAYLOAD_ARG_CNT]);

    /// Whether the inbound doorbell from the PMC is currently asserted.
    /// Used to tell PMC callbacks apart from spurious interrupts.
    fn irq_status(&self) -> bool;

    /// Acknowledges the inbound doorbell.
    fn irq_clear(&self);

    /// Unmasks the inbound doorbell interrupt at the mailbox.
    fn irq_enable(&self);
}
