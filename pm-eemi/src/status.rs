use core::fmt;

/// Result type for PM operations.
pub type PmResult<T = ()> = Result<T, PmError>;

/// Error statuses returned by PM operations.
///
/// Wire codes match the PMC firmware convention. A non-success status means
/// any accompanying result words are undefined and must not be read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PmError {
    /// Invalid argument (bad ID, bad range).
    Args,
    /// Operation not supported (removed opcode or wrong firmware version).
    NotSupported,
    /// Requested node or feature is not enabled.
    NotEnabled,
    /// Local resource lookup failed.
    Internal,
    /// Conflicting requirement.
    Conflict,
    /// Access denied.
    Access,
    /// Invalid node ID.
    InvalidNode,
    /// Duplicate request, e.g. re-registering an already-registered
    /// notification channel.
    DoubleReq,
    /// Suspend procedure was aborted.
    AbortSuspend,
    /// Operation timed out on the PMC side.
    Timeout,
    /// Node is in use by another subsystem.
    NodeUsed,
    /// Status code not part of the known taxonomy.
    Unknown(u32),
}

impl PmError {
    /// Wire code for this error.
    pub fn code(self) -> u32 {
        match self {
            Self::Args => 1,
            Self::NotSupported => 4,
            Self::NotEnabled => 29,
            Self::Internal => 2000,
            Self::Conflict => 2001,
            Self::Access => 2002,
            Self::InvalidNode => 2003,
            Self::DoubleReq => 2004,
            Self::AbortSuspend => 2005,
            Self::Timeout => 2006,
            Self::NodeUsed => 2007,
            Self::Unknown(raw) => raw,
        }
    }
}

impl fmt::Display for PmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Args => write!(f, "invalid argument"),
            Self::NotSupported => write!(f, "operation not supported"),
            Self::NotEnabled => write!(f, "not enabled"),
            Self::Internal => write!(f, "internal error"),
            Self::Conflict => write!(f, "requirement conflict"),
            Self::Access => write!(f, "access denied"),
            Self::InvalidNode => write!(f, "invalid node"),
            Self::DoubleReq => write!(f, "duplicate request"),
            Self::AbortSuspend => write!(f, "suspend aborted"),
            Self::Timeout => write!(f, "timeout"),
            Self::NodeUsed => write!(f, "node in use"),
            Self::Unknown(raw) => write!(f, "unknown status {raw}"),
        }
    }
}

/// Maps a raw status word from the PMC into a [`PmResult`].
pub fn pm_result(code: u32) -> PmResult {
    match code {
        0 => Ok(()),
        1 => Err(PmError::Args),
        4 => Err(PmError::NotSupported),
        29 => Err(PmError::NotEnabled),
        2000 => Err(PmError::Internal),
        2001 => Err(PmError::Conflict),
        2002 => Err(PmError::Access),
        2003 => Err(PmError::InvalidNode),
        2004 => Err(PmError::DoubleReq),
        2005 => Err(PmError::AbortSuspend),
        2006 => Err(PmError::Timeout),
        2007 => Err(PmError::NodeUsed),
        raw => Err(PmError::Unknown(raw)),
    }
}

/// Status word placed in the low 32 bits of the first SMC return register.
pub fn wire_code<T>(result: &PmResult<T>) -> u32 {
    match result {
        Ok(_) => 0,
        Err(e) => e.code(),
    }
}
