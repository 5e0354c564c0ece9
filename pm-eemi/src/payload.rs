use crate::{ModuleId, SecurityFlag};

/// Capacity of the IPI request/response buffers in 32-bit words.
pub const PAYLOAD_ARG_CNT: usize = 8;

/// An EEMI request payload: a fixed array of 32-bit words.
///
/// Constructed fresh for every call via [`Payload::pack`]; never retained
/// across calls. Word 0 is always the bit-packed header word, words `1..N`
/// are raw arguments.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Payload([u32; PAYLOAD_ARG_CNT]);

impl Payload {
    /// Packs an argument list into a payload.
    ///
    /// `args[0]` contributes only its low byte to word 0:
    /// `word0 = (args[0] & 0xFF) | (module << 8) | (flag << 24)`.
    /// Higher bits of `args[0]` are truncated, matching the wire format;
    /// callers pass operation opcodes there, which always fit one byte.
    pub fn pack<const N: usize>(module: ModuleId, flag: SecurityFlag, args: [u32; N]) -> Self {
        const {
            assert!(N >= 1 && N <= PAYLOAD_ARG_CNT - 2);
        }
        let mut words = [0u32; PAYLOAD_ARG_CNT];
        words[0] = (args[0] & 0xFF) | ((module as u32) << 8) | ((flag as u32) << 24);
        words[1..N].copy_from_slice(&args[1..N]);
        Self(words)
    }

    /// Unpacks the header fields and argument list of a payload.
    ///
    /// Returns the raw module field, the origin flag and the argument array;
    /// `args[0]` is recovered as the low byte of word 0 only.
    pub fn unpack<const N: usize>(&self) -> (u8, SecurityFlag, [u32; N]) {
        const {
            assert!(N >= 1 && N <= PAYLOAD_ARG_CNT - 2);
        }
        let module = ((self.0[0] >> 8) & 0xFF) as u8;
        let flag = if (self.0[0] >> 24) & 1 == 0 {
            SecurityFlag::Secure
        } else {
            SecurityFlag::NonSecure
        };
        let mut args = [0u32; N];
        args[0] = self.0[0] & 0xFF;
        args[1..N].copy_from_slice(&self.0[1..N]);
        (module, flag, args)
    }

    /// Raw view of all payload words.
    pub fn words(&self) -> &[u32; PAYLOAD_ARG_CNT] {
        &self.0
    }
}

impl From<[u32; PAYLOAD_ARG_CNT]> for Payload {
    fn from(words: [u32; PAYLOAD_ARG_CNT]) -> Self {
        Self(words)
    }
}
