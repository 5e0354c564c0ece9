//! Top-level SMC handler: function-ID decode, readiness gate and
//! return-register packing.

use bitflags::bitflags;
use pm_eemi::{ApiId, PmResult, SecurityFlag, TZ_VERSION, wire_code};
use pm_ipi::IpiMailbox;

use crate::{PmPlatform, PmService};

/// Numeric field of the SMC function ID selecting the PM operation.
pub const FUNCID_NUM_MASK: u32 = 0xFFFF;

/// "Unknown SMC function" return value, shared by unimplemented opcodes and
/// a service that never became ready. A probing OS sees a uniform "absent"
/// signal either way.
pub const SMC_UNKNOWN: u64 = u64::MAX;

bitflags! {
    /// Flags passed along by the SMC dispatch framework.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SmcFlags: u64 {
        /// The trap originated in the normal world.
        const NON_SECURE = 1 << 0;
    }
}

/// Values for the one or two 64-bit return registers of a PM SMC.
///
/// The status word always occupies the low 32 bits of `x0`; single result
/// values ride in the high half, larger results spill into `x1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SmcReturn {
    pub x0: u64,
    pub x1: u64,
}

impl SmcReturn {
    pub const UNKNOWN: Self = Self::one(SMC_UNKNOWN);

    pub const fn one(x0: u64) -> Self {
        Self { x0, x1: 0 }
    }

    pub const fn two(x0: u64, x1: u64) -> Self {
        Self { x0, x1 }
    }
}

/// Status-only return.
fn ret_status(result: PmResult) -> SmcReturn {
    SmcReturn::one(wire_code(&result) as u64)
}

/// Status plus one result word in the high half of x0.
fn ret_value(result: PmResult<u32>) -> SmcReturn {
    match result {
        Ok(value) => SmcReturn::one((value as u64) << 32),
        Err(e) => SmcReturn::one(e.code() as u64),
    }
}

impl<M: IpiMailbox, P: PmPlatform> PmService<M, P> {
    /// Handles one PM SMC from EL1/EL2.
    ///
    /// Arguments arrive as 64-bit registers and are split into the four
    /// 32-bit payload words of the call convention. A service that never
    /// initialized answers every call with [`SMC_UNKNOWN`] and touches no
    /// state.
    pub fn handle_smc(
        &self,
        smc_fid: u32,
        x1: u64,
        x2: u64,
        _x3: u64,
        _x4: u64,
        flags: SmcFlags,
    ) -> SmcReturn {
        if !self.is_ready() {
            return SmcReturn::UNKNOWN;
        }

        let arg = [x1 as u32, (x1 >> 32) as u32, x2 as u32, (x2 >> 32) as u32];
        let flag = if flags.contains(SmcFlags::NON_SECURE) {
            SecurityFlag::NonSecure
        } else {
            SecurityFlag::Secure
        };

        let Some(api) = ApiId::from_repr(smc_fid & FUNCID_NUM_MASK) else {
            warn!("unimplemented PM service call: {smc_fid:#x}");
            return SmcReturn::UNKNOWN;
        };

        match api {
            ApiId::SelfSuspend => {
                ret_status(self.self_suspend(arg[1], arg[2], arg[3] as u64, flag))
            }
            ApiId::ForcePowerdown => ret_status(self.force_powerdown(arg[0], arg[1], flag)),
            ApiId::ReqSuspend => {
                ret_status(self.req_suspend(arg[0], arg[1], arg[2], arg[3], flag))
            }
            ApiId::AbortSuspend => ret_status(self.abort_suspend(arg[0], flag)),
            ApiId::SystemShutdown => ret_status(self.system_shutdown(arg[0], arg[1], flag)),
            ApiId::ReqWakeup => {
                ret_status(self.req_wakeup(arg[0], arg[1], arg[2], arg[3], flag))
            }
            ApiId::SetWakeupSource => {
                ret_status(self.set_wakeup_source(arg[0], arg[1], arg[2], flag))
            }
            ApiId::RequestDevice => {
                ret_status(self.request_device(arg[0], arg[1], arg[2], arg[3], flag))
            }
            ApiId::ReleaseDevice => ret_status(self.release_device(arg[0], flag)),
            ApiId::SetRequirement => {
                ret_status(self.set_requirement(arg[0], arg[1], arg[2], arg[3], flag))
            }
            ApiId::SetMaxLatency => ret_status(self.set_max_latency(arg[0], arg[1], flag)),
            ApiId::GetApiVersion => ret_value(self.get_api_version(flag)),
            ApiId::GetDeviceStatus => match self.get_device_status(arg[0], flag) {
                Ok(buf) => SmcReturn::two(
                    (buf[0] as u64) << 32,
                    buf[1] as u64 | ((buf[2] as u64) << 32),
                ),
                Err(e) => SmcReturn::one(e.code() as u64),
            },
            ApiId::GetOpCharacteristic => {
                ret_value(self.get_op_characteristic(arg[0], arg[1], flag))
            }
            ApiId::ResetAssert => ret_status(self.reset_assert(arg[0], arg[1], flag)),
            ApiId::ResetGetStatus => ret_value(self.reset_get_status(arg[0], flag)),
            ApiId::InitFinalize => ret_status(self.init_finalize(flag)),
            ApiId::GetCallbackData => {
                let mut data = [0u32; 4];
                self.get_callbackdata(&mut data, true);
                SmcReturn::two(
                    data[0] as u64 | ((data[1] as u64) << 32),
                    data[2] as u64 | ((data[3] as u64) << 32),
                )
            }
            ApiId::GetChipid => match self.get_chipid(flag) {
                Ok(id) => SmcReturn::two((id[0] as u64) << 32, id[1] as u64),
                Err(e) => SmcReturn::one(e.code() as u64),
            },
            ApiId::PinctrlRequest => ret_status(self.pinctrl_request(arg[0], flag)),
            ApiId::PinctrlRelease => ret_status(self.pinctrl_release(arg[0], flag)),
            ApiId::PinctrlGetFunction => ret_value(self.pinctrl_get_function(arg[0], flag)),
            ApiId::PinctrlSetFunction => {
                ret_status(self.pinctrl_set_function(arg[0], arg[1], flag))
            }
            ApiId::PinctrlConfigParamGet => {
                ret_value(self.pinctrl_get_pin_param(arg[0], arg[1], flag))
            }
            ApiId::PinctrlConfigParamSet => {
                ret_status(self.pinctrl_set_pin_param(arg[0], arg[1], arg[2], flag))
            }
            ApiId::Ioctl => ret_value(self.ioctl(arg[0], arg[1], arg[2], arg[3], 0, flag)),
            ApiId::QueryData => {
                let mut data = [0u32; pm_eemi::PAYLOAD_ARG_CNT];
                let result = self.query_data(arg[0], arg[1], arg[2], arg[3], &mut data, flag);
                SmcReturn::two(
                    wire_code(&result) as u64 | ((data[0] as u64) << 32),
                    data[1] as u64 | ((data[2] as u64) << 32),
                )
            }
            ApiId::ClockEnable => ret_status(self.clock_gate(arg[0], true, flag)),
            ApiId::ClockDisable => ret_status(self.clock_gate(arg[0], false, flag)),
            ApiId::ClockGetState => ret_value(self.clock_get_state(arg[0], flag)),
            ApiId::ClockSetDivider => ret_status(self.clock_set_divider(arg[0], arg[1], flag)),
            ApiId::ClockGetDivider => ret_value(self.clock_get_divider(arg[0], flag)),
            ApiId::ClockSetParent => ret_status(self.clock_set_parent(arg[0], arg[1], flag)),
            ApiId::ClockGetParent => ret_value(self.clock_get_parent(arg[0], flag)),
            ApiId::ClockGetRate => match self.clock_get_rate(arg[0], flag) {
                Ok(rate) => SmcReturn::two((rate[0] as u64) << 32, rate[1] as u64),
                Err(e) => SmcReturn::one(e.code() as u64),
            },
            ApiId::PllSetParameter => {
                ret_status(self.pll_set_param(arg[0], arg[1], arg[2], flag))
            }
            ApiId::PllGetParameter => ret_value(self.pll_get_param(arg[0], arg[1], flag)),
            ApiId::PllSetMode => ret_status(self.pll_set_mode(arg[0], arg[1], flag)),
            ApiId::PllGetMode => ret_value(self.pll_get_mode(arg[0], flag)),
            ApiId::GetTrustzoneVersion => SmcReturn::one((TZ_VERSION as u64) << 32),
            ApiId::FeatureCheck => ret_value(self.feature_check(arg[0], flag)),
            ApiId::LoadPdi => ret_status(self.load_pdi(arg[0], arg[1], arg[2], flag)),
            ApiId::RegisterNotifier => {
                ret_status(self.register_notifier(arg[0], arg[1], arg[2], arg[3], flag))
            }
        }
    }
}
