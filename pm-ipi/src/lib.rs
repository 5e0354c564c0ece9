//! IPI transport and synchronous call engine for PMC communication.
//!
//! One mailbox channel carries all PM traffic. The channel drives a simple
//! per-exchange state machine (Idle -> Sent -> Idle) and offers the three
//! call shapes of the protocol:
//!
//! - [`IpiChannel::send_sync`]: blocking request/response,
//! - [`IpiChannel::send`]: fire with completion wait, response discarded,
//! - [`IpiChannel::send_non_blocking`]: fire and return immediately.
//!
//! At most one exchange may be in flight per channel. A spinlock held for
//! the duration of an exchange serializes callers; a deferred non-blocking
//! send leaves the channel in `Sent` and the next caller drains it before
//! reusing the shared buffer.

#![cfg_attr(not(test), no_std)]

#[macro_use]
extern crate log;

use kspin::SpinNoIrq;
use pm_eemi::{PAYLOAD_ARG_CNT, Payload, PmResult, pm_result};

mod mailbox;

pub use mailbox::IpiMailbox;

/// Exchange state of an IPI channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelState {
    /// No request pending; the shared buffer may be reused.
    Idle,
    /// A request was rung but its completion has not been observed yet.
    Sent,
}

/// A single mailbox channel to the PMC plus its serialization lock.
pub struct IpiChannel<M> {
    mb: M,
    state: SpinNoIrq<ChannelState>,
}

impl<M: IpiMailbox> IpiChannel<M> {
    pub const fn new(mb: M) -> Self {
        Self {
            mb,
            state: SpinNoIrq::new(ChannelState::Idle),
        }
    }

    /// Brings the channel up and unmasks the callback doorbell.
    pub fn init(&self) -> PmResult {
        self.mb.init()?;
        self.mb.irq_enable();
        Ok(())
    }

    /// Current exchange state. Diagnostic only; the state may change as soon
    /// as the lock is released.
    pub fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    /// Drains a leftover non-blocking exchange so the buffer may be reused.
    fn drain(&self, state: &mut ChannelState) {
        if *state == ChannelState::Sent {
            self.mb.wait_idle();
            *state = ChannelState::Idle;
        }
    }

    /// Blocking request/response exchange, with the response status mapped
    /// to a [`PmResult`]. Result words `out` are only defined on `Ok`.
    pub fn send_sync(&self, payload: &Payload, out: &mut [u32]) -> PmResult {
        pm_result(self.exchange(payload, out))
    }

    /// Blocking exchange returning the raw PMC status word.
    ///
    /// Unlike [`IpiChannel::send_sync`] the result words are filled in
    /// regardless of the status; the query-data version shim needs them.
    /// Response values beyond the mailbox capacity read as zero.
    pub fn exchange(&self, payload: &Payload, out: &mut [u32]) -> u32 {
        let mut state = self.state.lock();
        self.drain(&mut state);

        self.mb.write_request(payload.words());
        self.mb.ring();
        *state = ChannelState::Sent;
        self.mb.wait_idle();
        *state = ChannelState::Idle;

        let mut resp = [0u32; PAYLOAD_ARG_CNT];
        self.mb.read_response(&mut resp);
        for (i, word) in out.iter_mut().enumerate() {
            *word = resp.get(i + 1).copied().unwrap_or(0);
        }
        resp[0]
    }

    /// Fires a request and waits for the PMC to consume it, without reading
    /// the response. The returned status reflects only the send.
    pub fn send(&self, payload: &Payload) -> PmResult {
        let mut state = self.state.lock();
        self.drain(&mut state);

        self.mb.write_request(payload.words());
        self.mb.ring();
        *state = ChannelState::Sent;
        self.mb.wait_idle();
        *state = ChannelState::Idle;
        Ok(())
    }

    /// Fires a request and returns immediately. The channel stays `Sent`
    /// until a later caller drains it.
    pub fn send_non_blocking(&self, payload: &Payload) -> PmResult {
        let mut state = self.state.lock();
        self.drain(&mut state);

        self.mb.write_request(payload.words());
        self.mb.ring();
        *state = ChannelState::Sent;
        Ok(())
    }

    /// Reads a PMC-initiated callback payload into `out`, optionally
    /// acknowledging the doorbell afterwards.
    ///
    /// Returns without touching `out` when the doorbell is not asserted,
    /// so spurious interrupts never surface stale buffer contents.
    pub fn read_callback(&self, out: &mut [u32], ack: bool) {
        if !self.mb.irq_status() {
            trace!("callback read with no doorbell pending");
            return;
        }
        let mut cb = [0u32; PAYLOAD_ARG_CNT];
        self.mb.read_callback(&mut cb);
        let n = out.len().min(PAYLOAD_ARG_CNT);
        out[..n].copy_from_slice(&cb[..n]);
        if ack {
            self.mb.irq_clear();
        }
    }

    /// Whether the callback doorbell from the PMC is asserted.
    pub fn irq_status(&self) -> bool {
        self.mb.irq_status()
    }

    /// Acknowledges the callback doorbell.
    pub fn irq_clear(&self) {
        self.mb.irq_clear();
    }
}
