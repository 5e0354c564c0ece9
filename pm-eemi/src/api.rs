use strum::FromRepr;

/// PM API identifiers, as carried in the low bits of the SMC function ID.
///
/// A closed, versioned command set. Values match the PMC firmware call
/// convention and must never be renumbered; new operations may only be
/// appended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromRepr)]
#[repr(u32)]
pub enum ApiId {
    GetApiVersion = 1,
    GetDeviceStatus = 3,
    GetOpCharacteristic = 4,
    RegisterNotifier = 5,
    ReqSuspend = 6,
    SelfSuspend = 7,
    ForcePowerdown = 8,
    AbortSuspend = 9,
    ReqWakeup = 10,
    SetWakeupSource = 11,
    SystemShutdown = 12,
    RequestDevice = 13,
    ReleaseDevice = 14,
    SetRequirement = 15,
    SetMaxLatency = 16,
    ResetAssert = 17,
    ResetGetStatus = 18,
    InitFinalize = 21,
    GetCallbackData = 22,
    GetChipid = 24,
    PinctrlRequest = 28,
    PinctrlRelease = 29,
    PinctrlGetFunction = 30,
    PinctrlSetFunction = 31,
    PinctrlConfigParamGet = 32,
    PinctrlConfigParamSet = 33,
    Ioctl = 34,
    QueryData = 35,
    ClockEnable = 36,
    ClockDisable = 37,
    ClockGetState = 38,
    ClockSetDivider = 39,
    ClockGetDivider = 40,
    ClockSetParent = 43,
    ClockGetParent = 44,
    ClockGetRate = 42,
    PllSetParameter = 48,
    PllGetParameter = 49,
    PllSetMode = 50,
    PllGetMode = 51,
    FeatureCheck = 63,
    LoadPdi = 0x701,
    GetTrustzoneVersion = 2000,
}

/// Acknowledge value requesting a blocking exchange; anything else means
/// fire-and-forget for the operations that take an ack preference.
pub const IPI_BLOCKING: u32 = 1;

/// Version family reported locally for most PM APIs (high half-word of the
/// composite feature-check result).
pub const PM_API_BASE_VERSION: u32 = 1;
/// Version family for the query-data group of APIs.
pub const PM_API_QUERY_DATA_VERSION: u32 = 2;

/// Trustzone version reported by [`ApiId::GetTrustzoneVersion`]: major 1,
/// minor 0. Served locally, never forwarded to the PMC.
pub const TZ_VERSION: u32 = 1 << 16;

/// Shutdown/restart request types.
pub const SHUTDOWN_TYPE_SHUTDOWN: u32 = 0;
pub const SHUTDOWN_TYPE_RESET: u32 = 1;
/// Pseudo-type: only records the scope for subsequent requests, no PMC call.
pub const SHUTDOWN_TYPE_SETSCOPE_ONLY: u32 = 2;

/// Shutdown/restart scope subtypes.
pub const SHUTDOWN_SUBTYPE_RST_SUBSYSTEM: u32 = 0;
pub const SHUTDOWN_SUBTYPE_RST_PS_ONLY: u32 = 1;
pub const SHUTDOWN_SUBTYPE_RST_SYSTEM: u32 = 2;

/// Callback classes found in word 0 of a PMC-initiated callback payload.
pub const PM_INIT_SUSPEND_CB: u32 = 30;
pub const PM_NOTIFY_CB: u32 = 32;

/// Notifier event: a subsystem was forcefully powered down and its cores
/// must be parked.
pub const EVENT_CPU_IDLE_FORCE_PWRDWN: u32 = 0x4000;

/// Device ID of the first APU core, used for the boot-time idle-powerdown
/// notifier registration.
pub const DEV_ACPU_0: u32 = 0x1810_C0AF;

/// Query identifiers for [`ApiId::QueryData`] affected by the firmware v2
/// response layout (an extra leading status word).
pub const QID_CLOCK_GET_NAME: u32 = 1;
pub const QID_PINCTRL_GET_FUNCTION_NAME: u32 = 9;

/// IOCTL sub-identifiers handled by the secure firmware.
pub const IOCTL_SET_PLL_FRAC_MODE: u32 = 8;
pub const IOCTL_GET_PLL_FRAC_MODE: u32 = 9;
pub const IOCTL_SET_PLL_FRAC_DATA: u32 = 10;
pub const IOCTL_GET_PLL_FRAC_DATA: u32 = 11;
/// Registers the SGI used to notify the normal-world OS; purely local.
pub const IOCTL_SET_SGI: u32 = 25;

/// PLL parameter ID addressed by the fractional-data IOCTLs.
pub const PLL_PARAM_DATA: u32 = 2;

/// Abort-suspend reason: an interrupt arrived before power-down completed.
pub const ABORT_REASON_PU_BUSY: u32 = 1;
