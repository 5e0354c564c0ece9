//! PM API surface: one function per power-management operation.
//!
//! Every function builds an EEMI payload with the operation's fixed opcode
//! and arguments, drives the call engine with the operation's call shape
//! and returns the status plus any response words. Which operations block
//! and which fire-and-forget is a fixed per-operation contract; only the
//! suspend/power-down request family honours a caller-supplied `ack`
//! preference.

use pm_eemi::{
    ApiId, IPI_BLOCKING, IOCTL_GET_PLL_FRAC_DATA, IOCTL_GET_PLL_FRAC_MODE, IOCTL_SET_PLL_FRAC_DATA,
    IOCTL_SET_PLL_FRAC_MODE, IOCTL_SET_SGI, ModuleId, PAYLOAD_ARG_CNT, PLL_PARAM_DATA, Payload,
    PmError, PmResult, PM_API_BASE_VERSION, PM_API_QUERY_DATA_VERSION, QID_CLOCK_GET_NAME,
    QID_PINCTRL_GET_FUNCTION_NAME, SHUTDOWN_TYPE_SETSCOPE_ONLY, SecurityFlag, module_of,
};
use pm_ipi::IpiMailbox;

use crate::{PmPlatform, PmService};

fn pack<const N: usize>(flag: SecurityFlag, args: [u32; N]) -> Payload {
    Payload::pack(ModuleId::Libpm, flag, args)
}

impl<M: IpiMailbox, P: PmPlatform> PmService<M, P> {
    /// Suspends the calling core. Blocking; the PMC sets the resume address
    /// on wake-up.
    ///
    /// The client-side power-down request bit is armed *before* the request
    /// is sent, so the core is ready to go down even if the PMC response
    /// races its own power-down sequence.
    pub fn self_suspend(
        &self,
        latency: u32,
        state: u32,
        address: u64,
        flag: SecurityFlag,
    ) -> PmResult {
        let proc = self.own_proc()?;
        self.plat.arm_powerdown(proc, state);

        let payload = pack(
            flag,
            [
                ApiId::SelfSuspend as u32,
                proc.node_id,
                latency,
                state,
                address as u32,
                (address >> 32) as u32,
            ],
        );
        self.channel.send_sync(&payload, &mut [])
    }

    /// Announces that a prior self-suspend is to be aborted.
    pub fn abort_suspend(&self, reason: u32, flag: SecurityFlag) -> PmResult {
        self.plat.disarm_powerdown();
        let payload = pack(
            flag,
            [
                ApiId::AbortSuspend as u32,
                reason,
                self.primary_proc().node_id,
            ],
        );
        self.channel.send_sync(&payload, &mut [])
    }

    /// Requests graceful suspend of another subsystem. Waits for the PMC
    /// only when the caller asks for a blocking acknowledge.
    pub fn req_suspend(
        &self,
        target: u32,
        ack: u32,
        latency: u32,
        state: u32,
        flag: SecurityFlag,
    ) -> PmResult {
        let payload = pack(flag, [ApiId::ReqSuspend as u32, target, latency, state]);
        if ack == IPI_BLOCKING {
            self.channel.send_sync(&payload, &mut [])
        } else {
            self.channel.send(&payload)
        }
    }

    /// Wakes another processor or subsystem. Always blocking; the PMC sets
    /// the target's resume address.
    pub fn req_wakeup(
        &self,
        target: u32,
        set_address: u32,
        address: u32,
        ack: u32,
        flag: SecurityFlag,
    ) -> PmResult {
        let payload = pack(
            flag,
            [ApiId::ReqWakeup as u32, target, set_address, address, ack],
        );
        self.channel.send_sync(&payload, &mut [])
    }

    /// Forcefully powers down another subsystem. Call shape follows the
    /// caller's acknowledge preference, like [`PmService::req_suspend`].
    pub fn force_powerdown(&self, target: u32, ack: u32, flag: SecurityFlag) -> PmResult {
        let payload = pack(flag, [ApiId::ForcePowerdown as u32, target, ack]);
        if ack == IPI_BLOCKING {
            self.channel.send_sync(&payload, &mut [])
        } else {
            self.channel.send(&payload)
        }
    }

    /// Requests system shutdown or restart, or just records the scope for
    /// later requests.
    ///
    /// `SETSCOPE_ONLY` mutates the stored scope and returns without any PMC
    /// traffic. Real requests always fire without waiting and carry the
    /// currently stored scope as subtype.
    pub fn system_shutdown(&self, kind: u32, subtype: u32, flag: SecurityFlag) -> PmResult {
        if kind == SHUTDOWN_TYPE_SETSCOPE_ONLY {
            self.ctx.lock().shutdown_scope = subtype;
            return Ok(());
        }
        let scope = self.ctx.lock().shutdown_scope;
        let payload = pack(flag, [ApiId::SystemShutdown as u32, kind, scope]);
        self.channel.send_non_blocking(&payload)
    }

    /// Specifies a wake-up source for a suspended subsystem.
    pub fn set_wakeup_source(
        &self,
        target: u32,
        wkup_device: u32,
        enable: u32,
        flag: SecurityFlag,
    ) -> PmResult {
        let payload = pack(
            flag,
            [ApiId::SetWakeupSource as u32, target, wkup_device, enable],
        );
        self.channel.send_sync(&payload, &mut [])
    }

    /// Requests ownership of a device.
    pub fn request_device(
        &self,
        device: u32,
        capabilities: u32,
        qos: u32,
        ack: u32,
        flag: SecurityFlag,
    ) -> PmResult {
        let payload = pack(
            flag,
            [ApiId::RequestDevice as u32, device, capabilities, qos, ack],
        );
        self.channel.send_sync(&payload, &mut [])
    }

    /// Releases a previously requested device.
    pub fn release_device(&self, device: u32, flag: SecurityFlag) -> PmResult {
        let payload = pack(flag, [ApiId::ReleaseDevice as u32, device]);
        self.channel.send_sync(&payload, &mut [])
    }

    /// Updates the requirement on an owned device.
    pub fn set_requirement(
        &self,
        device: u32,
        capabilities: u32,
        qos: u32,
        ack: u32,
        flag: SecurityFlag,
    ) -> PmResult {
        let payload = pack(
            flag,
            [ApiId::SetRequirement as u32, device, capabilities, qos, ack],
        );
        self.channel.send_sync(&payload, &mut [])
    }

    /// Sets the maximum wake-up latency requirement for a device.
    pub fn set_max_latency(&self, device: u32, latency: u32, flag: SecurityFlag) -> PmResult {
        let payload = pack(flag, [ApiId::SetMaxLatency as u32, device, latency]);
        self.channel.send_sync(&payload, &mut [])
    }

    /// PMC firmware API version.
    pub fn get_api_version(&self, flag: SecurityFlag) -> PmResult<u32> {
        let payload = pack(flag, [ApiId::GetApiVersion as u32]);
        let mut version = [0u32; 1];
        self.channel.send_sync(&payload, &mut version)?;
        Ok(version[0])
    }

    /// Chip ID code and version.
    pub fn get_chipid(&self, flag: SecurityFlag) -> PmResult<[u32; 2]> {
        let payload = pack(flag, [ApiId::GetChipid as u32]);
        let mut id = [0u32; 2];
        self.channel.send_sync(&payload, &mut id)?;
        Ok(id)
    }

    /// Status, requirement and usage information for a device.
    pub fn get_device_status(&self, device: u32, flag: SecurityFlag) -> PmResult<[u32; 3]> {
        let payload = pack(flag, [ApiId::GetDeviceStatus as u32, device]);
        let mut status = [0u32; 3];
        self.channel.send_sync(&payload, &mut status)?;
        Ok(status)
    }

    /// Operating characteristic (power, latency or temperature) of a device.
    pub fn get_op_characteristic(
        &self,
        device: u32,
        kind: u32,
        flag: SecurityFlag,
    ) -> PmResult<u32> {
        let payload = pack(flag, [ApiId::GetOpCharacteristic as u32, device, kind]);
        let mut value = [0u32; 1];
        self.channel.send_sync(&payload, &mut value)?;
        Ok(value[0])
    }

    /// Asserts, releases or pulses a reset line.
    pub fn reset_assert(&self, reset: u32, action: u32, flag: SecurityFlag) -> PmResult {
        let payload = pack(flag, [ApiId::ResetAssert as u32, reset, action]);
        self.channel.send_sync(&payload, &mut [])
    }

    /// Current state of a reset line.
    pub fn reset_get_status(&self, reset: u32, flag: SecurityFlag) -> PmResult<u32> {
        let payload = pack(flag, [ApiId::ResetGetStatus as u32, reset]);
        let mut status = [0u32; 1];
        self.channel.send_sync(&payload, &mut status)?;
        Ok(status[0])
    }

    /// Announces that the OS has finished its PM initialization.
    pub fn init_finalize(&self, flag: SecurityFlag) -> PmResult {
        let payload = pack(flag, [ApiId::InitFinalize as u32]);
        self.channel.send_sync(&payload, &mut [])
    }

    /// Drains the PMC callback payload into `data`.
    ///
    /// Returns silently when the doorbell is not asserted, so a spurious
    /// interrupt never surfaces stale data. The doorbell is acknowledged
    /// only when `ack` is set; the FIQ path leaves it pending so the OS can
    /// fetch the payload itself via the get-callback-data operation.
    pub fn get_callbackdata(&self, data: &mut [u32], ack: bool) {
        self.channel.read_callback(data, ack);
    }

    /// Requests exclusive pin control.
    pub fn pinctrl_request(&self, pin: u32, flag: SecurityFlag) -> PmResult {
        let payload = pack(flag, [ApiId::PinctrlRequest as u32, pin]);
        self.channel.send_sync(&payload, &mut [])
    }

    /// Releases pin control.
    pub fn pinctrl_release(&self, pin: u32, flag: SecurityFlag) -> PmResult {
        let payload = pack(flag, [ApiId::PinctrlRelease as u32, pin]);
        self.channel.send_sync(&payload, &mut [])
    }

    /// Function currently muxed onto a pin.
    pub fn pinctrl_get_function(&self, pin: u32, flag: SecurityFlag) -> PmResult<u32> {
        let payload = pack(flag, [ApiId::PinctrlGetFunction as u32, pin]);
        let mut function = [0u32; 1];
        self.channel.send_sync(&payload, &mut function)?;
        Ok(function[0])
    }

    /// Muxes a function onto a pin.
    pub fn pinctrl_set_function(&self, pin: u32, function: u32, flag: SecurityFlag) -> PmResult {
        let payload = pack(flag, [ApiId::PinctrlSetFunction as u32, pin, function]);
        self.channel.send_sync(&payload, &mut [])
    }

    /// Value of a pin configuration parameter.
    pub fn pinctrl_get_pin_param(&self, pin: u32, param: u32, flag: SecurityFlag) -> PmResult<u32> {
        let payload = pack(flag, [ApiId::PinctrlConfigParamGet as u32, pin, param]);
        let mut value = [0u32; 1];
        self.channel.send_sync(&payload, &mut value)?;
        Ok(value[0])
    }

    /// Sets a pin configuration parameter.
    pub fn pinctrl_set_pin_param(
        &self,
        pin: u32,
        param: u32,
        value: u32,
        flag: SecurityFlag,
    ) -> PmResult {
        let payload = pack(
            flag,
            [ApiId::PinctrlConfigParamSet as u32, pin, param, value],
        );
        self.channel.send_sync(&payload, &mut [])
    }

    /// Gates a clock on or off. Shared handler for the enable and disable
    /// opcodes.
    pub fn clock_gate(&self, clock: u32, enable: bool, flag: SecurityFlag) -> PmResult {
        let api = if enable {
            ApiId::ClockEnable
        } else {
            ApiId::ClockDisable
        };
        let payload = pack(flag, [api as u32, clock]);
        self.channel.send_sync(&payload, &mut [])
    }

    /// Gate state of a clock.
    pub fn clock_get_state(&self, clock: u32, flag: SecurityFlag) -> PmResult<u32> {
        let payload = pack(flag, [ApiId::ClockGetState as u32, clock]);
        let mut state = [0u32; 1];
        self.channel.send_sync(&payload, &mut state)?;
        Ok(state[0])
    }

    /// Sets a clock divider.
    pub fn clock_set_divider(&self, clock: u32, divider: u32, flag: SecurityFlag) -> PmResult {
        let payload = pack(flag, [ApiId::ClockSetDivider as u32, clock, divider]);
        self.channel.send_sync(&payload, &mut [])
    }

    /// Current divider of a clock.
    pub fn clock_get_divider(&self, clock: u32, flag: SecurityFlag) -> PmResult<u32> {
        let payload = pack(flag, [ApiId::ClockGetDivider as u32, clock]);
        let mut divider = [0u32; 1];
        self.channel.send_sync(&payload, &mut divider)?;
        Ok(divider[0])
    }

    /// Selects a clock parent.
    pub fn clock_set_parent(&self, clock: u32, parent: u32, flag: SecurityFlag) -> PmResult {
        let payload = pack(flag, [ApiId::ClockSetParent as u32, clock, parent]);
        self.channel.send_sync(&payload, &mut [])
    }

    /// Currently selected clock parent.
    pub fn clock_get_parent(&self, clock: u32, flag: SecurityFlag) -> PmResult<u32> {
        let payload = pack(flag, [ApiId::ClockGetParent as u32, clock]);
        let mut parent = [0u32; 1];
        self.channel.send_sync(&payload, &mut parent)?;
        Ok(parent[0])
    }

    /// Clock rate in Hz, as a low/high word pair.
    pub fn clock_get_rate(&self, clock: u32, flag: SecurityFlag) -> PmResult<[u32; 2]> {
        let payload = pack(flag, [ApiId::ClockGetRate as u32, clock]);
        let mut rate = [0u32; 2];
        self.channel.send_sync(&payload, &mut rate)?;
        Ok(rate)
    }

    /// Sets a PLL parameter.
    pub fn pll_set_param(
        &self,
        clock: u32,
        param: u32,
        value: u32,
        flag: SecurityFlag,
    ) -> PmResult {
        let payload = pack(flag, [ApiId::PllSetParameter as u32, clock, param, value]);
        self.channel.send_sync(&payload, &mut [])
    }

    /// Value of a PLL parameter.
    pub fn pll_get_param(&self, clock: u32, param: u32, flag: SecurityFlag) -> PmResult<u32> {
        let payload = pack(flag, [ApiId::PllGetParameter as u32, clock, param]);
        let mut value = [0u32; 1];
        self.channel.send_sync(&payload, &mut value)?;
        Ok(value[0])
    }

    /// Sets the mode of a PLL.
    pub fn pll_set_mode(&self, clock: u32, mode: u32, flag: SecurityFlag) -> PmResult {
        let payload = pack(flag, [ApiId::PllSetMode as u32, clock, mode]);
        self.channel.send_sync(&payload, &mut [])
    }

    /// Current mode of a PLL.
    pub fn pll_get_mode(&self, clock: u32, flag: SecurityFlag) -> PmResult<u32> {
        let payload = pack(flag, [ApiId::PllGetMode as u32, clock]);
        let mut mode = [0u32; 1];
        self.channel.send_sync(&payload, &mut mode)?;
        Ok(mode[0])
    }

    /// Nested IOCTL dispatch for device control and configuration.
    ///
    /// PLL fractional-mode and fractional-data sub-calls delegate to the
    /// generic PLL operations; SGI registration never touches the PMC.
    /// Getters return the fetched value, setters return zero.
    pub fn ioctl(
        &self,
        _device: u32,
        ioctl_id: u32,
        arg1: u32,
        arg2: u32,
        _arg3: u32,
        flag: SecurityFlag,
    ) -> PmResult<u32> {
        match ioctl_id {
            IOCTL_SET_PLL_FRAC_MODE => self.pll_set_mode(arg1, arg2, flag).map(|_| 0),
            IOCTL_GET_PLL_FRAC_MODE => self.pll_get_mode(arg1, flag),
            IOCTL_SET_PLL_FRAC_DATA => {
                self.pll_set_param(arg1, PLL_PARAM_DATA, arg2, flag).map(|_| 0)
            }
            IOCTL_GET_PLL_FRAC_DATA => self.pll_get_param(arg1, PLL_PARAM_DATA, flag),
            IOCTL_SET_SGI => self.register_sgi(arg1, arg2).map(|_| 0),
            _ => Err(PmError::NotSupported),
        }
    }

    /// Queries firmware data, shimming over PMC firmware protocol versions.
    ///
    /// The supported version for the query-data opcode is discovered with a
    /// feature-check sub-call first. Version 3 firmware no longer serves
    /// queries through this path; version 2 firmware prepends an extra
    /// status word to the two name queries, so the response window shifts
    /// down by one word. On a non-success status the contents of `data`
    /// are undefined.
    pub fn query_data(
        &self,
        qid: u32,
        arg1: u32,
        arg2: u32,
        arg3: u32,
        data: &mut [u32; PAYLOAD_ARG_CNT],
        flag: SecurityFlag,
    ) -> PmResult {
        let version = self.feature_check(ApiId::QueryData as u32, flag)?;
        let fw_version = version & 0xFFFF;
        if fw_version == 3 {
            return Err(PmError::NotSupported);
        }

        let payload = pack(flag, [ApiId::QueryData as u32, qid, arg1, arg2, arg3]);
        if fw_version == 2 && (qid == QID_CLOCK_GET_NAME || qid == QID_PINCTRL_GET_FUNCTION_NAME) {
            // The v2 response carries its own status in the first data
            // word; it replaces the transport status and the window shifts
            // down. The two fields are conflated when data[0] doubles as a
            // value; that ambiguity is inherited from the wire protocol.
            let _ = self.channel.exchange(&payload, data);
            let status = data[0];
            data.copy_within(1..4, 0);
            pm_eemi::pm_result(status)
        } else {
            self.channel.send_sync(&payload, &mut data[..4])
        }
    }

    /// Composite supported-version word for an API: the locally implemented
    /// version family in the high half, the PMC-reported version in the low
    /// half.
    ///
    /// Opcodes addressed to modules other than the power-management module
    /// are always considered supported and are not forwarded.
    pub fn feature_check(&self, api_id: u32, flag: SecurityFlag) -> PmResult<u32> {
        if module_of(api_id) != ModuleId::Libpm as u32 {
            return Ok(0);
        }

        let local = match ApiId::from_repr(api_id) {
            Some(ApiId::GetCallbackData | ApiId::GetTrustzoneVersion | ApiId::QueryData) => {
                PM_API_QUERY_DATA_VERSION
            }
            _ => PM_API_BASE_VERSION,
        };

        let payload = pack(flag, [ApiId::FeatureCheck as u32, api_id]);
        let mut fw_version = [0u32; 1];
        self.channel.send_sync(&payload, &mut fw_version)?;
        Ok((local << 16) | fw_version[0])
    }

    /// Loads a programmable device image through the PMC loader module.
    pub fn load_pdi(
        &self,
        src: u32,
        address_low: u32,
        address_high: u32,
        flag: SecurityFlag,
    ) -> PmResult {
        let payload = Payload::pack(
            ModuleId::Loader,
            flag,
            [ApiId::LoadPdi as u32, src, address_high, address_low],
        );
        self.channel.send_sync(&payload, &mut [])
    }

    /// Registers a subsystem to be notified about a device event.
    pub fn register_notifier(
        &self,
        device: u32,
        event: u32,
        wake: u32,
        enable: u32,
        flag: SecurityFlag,
    ) -> PmResult {
        let payload = pack(
            flag,
            [ApiId::RegisterNotifier as u32, device, event, wake, enable],
        );
        self.channel.send_sync(&payload, &mut [])
    }
}
