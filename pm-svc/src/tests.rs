#![cfg(test)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use pm_eemi::{
    ApiId, DEV_ACPU_0, EVENT_CPU_IDLE_FORCE_PWRDWN, IOCTL_SET_SGI, IPI_BLOCKING,
    PAYLOAD_ARG_CNT, PM_INIT_SUSPEND_CB, PM_NOTIFY_CB, PmError, PmResult,
    QID_CLOCK_GET_NAME, SHUTDOWN_TYPE_RESET, SHUTDOWN_TYPE_SETSCOPE_ONLY, SecurityFlag,
    TZ_VERSION,
};
use pm_ipi::IpiMailbox;

use super::*;

static PROCS: [Proc; 2] = [
    Proc {
        node_id: 0x1810_C0AF,
        pwrdn_mask: 0x1,
    },
    Proc {
        node_id: 0x1810_C0B0,
        pwrdn_mask: 0x2,
    },
];

type Chronology = Arc<Mutex<Vec<&'static str>>>;

#[derive(Default)]
struct PmcState {
    requests: Vec<[u32; PAYLOAD_ARG_CNT]>,
    responses: VecDeque<[u32; PAYLOAD_ARG_CNT]>,
    response_reads: usize,
    callback: [u32; PAYLOAD_ARG_CNT],
    irq: bool,
    irq_clears: usize,
    init_fail: bool,
}

/// Simulated PMC: scripted responses, recorded requests, instant completion.
#[derive(Clone, Default)]
struct MockPmc {
    state: Arc<Mutex<PmcState>>,
    order: Chronology,
}

impl MockPmc {
    fn push_response(&self, words: [u32; PAYLOAD_ARG_CNT]) {
        self.state.lock().unwrap().responses.push_back(words);
    }

    fn set_callback(&self, words: [u32; PAYLOAD_ARG_CNT]) {
        let mut st = self.state.lock().unwrap();
        st.callback = words;
        st.irq = true;
    }

    fn requests(&self) -> Vec<[u32; PAYLOAD_ARG_CNT]> {
        self.state.lock().unwrap().requests.clone()
    }

    fn response_reads(&self) -> usize {
        self.state.lock().unwrap().response_reads
    }

    fn irq_clears(&self) -> usize {
        self.state.lock().unwrap().irq_clears
    }

    fn irq_pending(&self) -> bool {
        self.state.lock().unwrap().irq
    }

    fn clear_log(&self) {
        let mut st = self.state.lock().unwrap();
        st.requests.clear();
        st.response_reads = 0;
        self.order.lock().unwrap().clear();
    }
}

impl IpiMailbox for MockPmc {
    fn init(&self) -> PmResult {
        if self.state.lock().unwrap().init_fail {
            Err(PmError::Internal)
        } else {
            Ok(())
        }
    }

    fn write_request(&self, words: &[u32; PAYLOAD_ARG_CNT]) {
        self.state.lock().unwrap().requests.push(*words);
    }

    fn ring(&self) {
        self.order.lock().unwrap().push("ring");
    }

    fn wait_idle(&self) {}

    fn read_response(&self, out: &mut [u32; PAYLOAD_ARG_CNT]) {
        let mut st = self.state.lock().unwrap();
        st.response_reads += 1;
        *out = st.responses.pop_front().unwrap_or_default();
    }

    fn read_callback(&self, out: &mut [u32; PAYLOAD_ARG_CNT]) {
        *out = self.state.lock().unwrap().callback;
    }

    fn irq_status(&self) -> bool {
        self.state.lock().unwrap().irq
    }

    fn irq_clear(&self) {
        let mut st = self.state.lock().unwrap();
        st.irq = false;
        st.irq_clears += 1;
    }

    fn irq_enable(&self) {}
}

#[derive(Default)]
struct PlatState {
    core: usize,
    os_sgis: Vec<u32>,
    idle_sgis: Vec<usize>,
    armed: Vec<(u32, u32)>,
    disarms: usize,
    acks: usize,
    eois: Vec<u32>,
    cleared: Vec<u32>,
}

#[derive(Clone, Default)]
struct MockPlat {
    state: Arc<Mutex<PlatState>>,
    order: Chronology,
}

impl MockPlat {
    fn set_core(&self, core: usize) {
        self.state.lock().unwrap().core = core;
    }
}

impl PmPlatform for MockPlat {
    fn core_index(&self) -> usize {
        self.state.lock().unwrap().core
    }

    fn arm_powerdown(&self, proc: &Proc, state: u32) {
        self.order.lock().unwrap().push("arm");
        self.state.lock().unwrap().armed.push((proc.node_id, state));
    }

    fn disarm_powerdown(&self) {
        self.state.lock().unwrap().disarms += 1;
    }

    fn raise_os_sgi(&self, sgi: u32) {
        self.state.lock().unwrap().os_sgis.push(sgi);
    }

    fn raise_idle_sgi(&self, core: usize) {
        self.state.lock().unwrap().idle_sgis.push(core);
    }

    fn ack_interrupt(&self) {
        self.state.lock().unwrap().acks += 1;
    }

    fn end_of_interrupt(&self, irq: u32) {
        self.state.lock().unwrap().eois.push(irq);
    }

    fn clear_interrupt_pending(&self, irq: u32) {
        self.state.lock().unwrap().cleared.push(irq);
    }

    fn park(&self, _pwrdn_mask: u32) -> ! {
        unreachable!("park is terminal and never exercised in tests")
    }
}

fn service() -> (PmService<MockPmc, MockPlat>, MockPmc, MockPlat) {
    let order = Chronology::default();
    let pmc = MockPmc {
        order: order.clone(),
        ..Default::default()
    };
    let plat = MockPlat {
        order,
        ..Default::default()
    };
    let svc = PmService::new(
        pmc.clone(),
        plat.clone(),
        PmConfig {
            procs: &PROCS,
            primary: 0,
        },
    );
    (svc, pmc, plat)
}

fn ready_service() -> (PmService<MockPmc, MockPlat>, MockPmc, MockPlat) {
    let (svc, pmc, plat) = service();
    svc.setup().unwrap();
    pmc.clear_log();
    (svc, pmc, plat)
}

const SECURE: SecurityFlag = SecurityFlag::Secure;

fn opcode(request: &[u32; PAYLOAD_ARG_CNT]) -> u32 {
    request[0] & 0xFF
}

#[test]
fn not_ready_dispatch_is_unknown_with_no_transport_activity() {
    let (svc, pmc, _) = service();
    for fid in [
        ApiId::SelfSuspend as u32,
        ApiId::SystemShutdown as u32,
        ApiId::GetApiVersion as u32,
        ApiId::QueryData as u32,
    ] {
        let ret = svc.handle_smc(fid, 0, 0, 0, 0, SmcFlags::NON_SECURE);
        assert_eq!(ret, SmcReturn::UNKNOWN);
    }
    assert!(pmc.requests().is_empty());
}

#[test]
fn setup_failure_keeps_service_not_ready() {
    let (svc, pmc, _) = service();
    pmc.state.lock().unwrap().init_fail = true;
    assert_eq!(svc.setup(), Err(PmError::Internal));
    assert!(!svc.is_ready());
}

#[test]
fn setup_registers_idle_powerdown_notifier() {
    let (svc, pmc, _) = service();
    svc.setup().unwrap();
    assert!(svc.is_ready());
    let requests = pmc.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(opcode(&requests[0]), ApiId::RegisterNotifier as u32);
    assert_eq!(
        &requests[0][1..5],
        &[DEV_ACPU_0, EVENT_CPU_IDLE_FORCE_PWRDWN, 0, 1]
    );
}

#[test]
fn unimplemented_opcode_is_unknown() {
    let (svc, pmc, _) = ready_service();
    let ret = svc.handle_smc(19, 0, 0, 0, 0, SmcFlags::empty());
    assert_eq!(ret, SmcReturn::UNKNOWN);
    assert!(pmc.requests().is_empty());
}

#[test]
fn shutdown_scope_persists_and_becomes_subtype() {
    for scope in [0u32, 1, 2] {
        let (svc, pmc, _) = ready_service();

        let x1 = SHUTDOWN_TYPE_SETSCOPE_ONLY as u64 | ((scope as u64) << 32);
        let ret = svc.handle_smc(ApiId::SystemShutdown as u32, x1, 0, 0, 0, SmcFlags::NON_SECURE);
        assert_eq!(ret, SmcReturn::one(0));
        assert!(pmc.requests().is_empty(), "set-scope must not contact the PMC");

        // The subtype argument of the real request is ignored in favour of
        // the stored scope.
        let x1 = SHUTDOWN_TYPE_RESET as u64 | (7u64 << 32);
        svc.handle_smc(ApiId::SystemShutdown as u32, x1, 0, 0, 0, SmcFlags::NON_SECURE);
        let requests = pmc.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(opcode(&requests[0]), ApiId::SystemShutdown as u32);
        assert_eq!(requests[0][1], SHUTDOWN_TYPE_RESET);
        assert_eq!(requests[0][2], scope);
        assert_eq!((requests[0][0] >> 24) & 1, 1, "non-secure origin flag");
    }
}

#[test]
fn query_data_v2_shifts_the_response_window() {
    let (svc, pmc, _) = ready_service();
    // Feature check reports firmware version 2.
    pmc.push_response([0, 2, 0, 0, 0, 0, 0, 0]);
    // Query response: transport status, then the v2 payload whose first
    // word is the real status.
    pmc.push_response([0, 0, 0xAAA, 0xBBB, 0xCCC, 0, 0, 0]);

    let mut data = [0u32; PAYLOAD_ARG_CNT];
    svc.query_data(QID_CLOCK_GET_NAME, 0, 0, 0, &mut data, SECURE)
        .unwrap();
    assert_eq!(&data[..3], &[0xAAA, 0xBBB, 0xCCC]);

    let requests = pmc.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(opcode(&requests[0]), ApiId::FeatureCheck as u32);
    assert_eq!(opcode(&requests[1]), ApiId::QueryData as u32);
    assert_eq!(requests[1][1], QID_CLOCK_GET_NAME);
}

#[test]
fn query_data_v2_shift_surfaces_embedded_status() {
    let (svc, pmc, _) = ready_service();
    pmc.push_response([0, 2, 0, 0, 0, 0, 0, 0]);
    // Transport status is success but the embedded v2 status word is an
    // argument error; the embedded one wins.
    pmc.push_response([0, 1, 0, 0, 0, 0, 0, 0]);

    let mut data = [0u32; PAYLOAD_ARG_CNT];
    let err = svc
        .query_data(QID_CLOCK_GET_NAME, 0, 0, 0, &mut data, SECURE)
        .unwrap_err();
    assert_eq!(err, PmError::Args);
}

#[test]
fn query_data_v2_plain_query_is_not_shifted() {
    let (svc, pmc, _) = ready_service();
    pmc.push_response([0, 2, 0, 0, 0, 0, 0, 0]);
    pmc.push_response([0, 4, 5, 6, 7, 0, 0, 0]);

    let mut data = [0u32; PAYLOAD_ARG_CNT];
    // Query id 12 is not one of the two name queries.
    svc.query_data(12, 0, 0, 0, &mut data, SECURE).unwrap();
    assert_eq!(&data[..4], &[4, 5, 6, 7]);
}

#[test]
fn query_data_v3_is_rejected_without_querying() {
    let (svc, pmc, _) = ready_service();
    pmc.push_response([0, 3, 0, 0, 0, 0, 0, 0]);

    let mut data = [0u32; PAYLOAD_ARG_CNT];
    let err = svc
        .query_data(QID_CLOCK_GET_NAME, 0, 0, 0, &mut data, SECURE)
        .unwrap_err();
    assert_eq!(err, PmError::NotSupported);
    // Only the feature check went out.
    assert_eq!(pmc.requests().len(), 1);
}

#[test]
fn force_powerdown_blocking_returns_pmc_status() {
    let (svc, pmc, _) = ready_service();
    pmc.push_response([2002, 0, 0, 0, 0, 0, 0, 0]);
    let err = svc
        .force_powerdown(0x123, IPI_BLOCKING, SECURE)
        .unwrap_err();
    assert_eq!(err, PmError::Access);
    assert_eq!(pmc.response_reads(), 1);
}

#[test]
fn force_powerdown_non_blocking_reports_only_the_send() {
    let (svc, pmc, _) = ready_service();
    pmc.push_response([2002, 0, 0, 0, 0, 0, 0, 0]);
    svc.force_powerdown(0x123, 0, SECURE).unwrap();
    assert_eq!(pmc.response_reads(), 0, "response must never be read");
    let requests = pmc.requests();
    assert_eq!(opcode(&requests[0]), ApiId::ForcePowerdown as u32);
    assert_eq!(&requests[0][1..3], &[0x123, 0]);
}

#[test]
fn feature_check_composes_local_and_firmware_versions() {
    let (svc, pmc, _) = ready_service();
    pmc.push_response([0, 7, 0, 0, 0, 0, 0, 0]);
    let version = svc.feature_check(ApiId::QueryData as u32, SECURE).unwrap();
    assert_eq!(version, (2 << 16) | 7);

    pmc.push_response([0, 3, 0, 0, 0, 0, 0, 0]);
    let version = svc.feature_check(ApiId::SelfSuspend as u32, SECURE).unwrap();
    assert_eq!(version, (1 << 16) | 3);
}

#[test]
fn feature_check_short_circuits_foreign_modules() {
    let (svc, pmc, _) = ready_service();
    let version = svc.feature_check(ApiId::LoadPdi as u32, SECURE).unwrap();
    assert_eq!(version, 0);
    assert!(pmc.requests().is_empty());
}

#[test]
fn sgi_registration_is_local_and_guards_reuse() {
    let (svc, pmc, _) = ready_service();
    assert_eq!(svc.ioctl(0, IOCTL_SET_SGI, 5, 0, 0, SECURE), Ok(0));
    assert!(pmc.requests().is_empty(), "SGI registration is purely local");

    assert_eq!(
        svc.ioctl(0, IOCTL_SET_SGI, 6, 0, 0, SECURE),
        Err(PmError::DoubleReq)
    );

    // Reset frees the slot for a new number.
    assert_eq!(svc.register_sgi(0, 1), Ok(()));
    assert_eq!(svc.register_sgi(16, 0), Err(PmError::Args));
    assert_eq!(svc.register_sgi(9, 0), Ok(()));
}

#[test]
fn unknown_ioctl_is_not_supported() {
    let (svc, _, _) = ready_service();
    assert_eq!(svc.ioctl(0, 0xFFFF, 0, 0, 0, SECURE), Err(PmError::NotSupported));
}

#[test]
fn init_suspend_callback_signals_registered_sgi_once() {
    let (svc, pmc, plat) = ready_service();
    svc.register_sgi(5, 0).unwrap();
    pmc.set_callback([PM_INIT_SUSPEND_CB, 0, 0, 0, 0, 0, 0, 0]);

    svc.ipi_callback(33);
    let st = plat.state.lock().unwrap();
    assert_eq!(st.os_sgis, vec![5]);
    assert_eq!(st.acks, 1);
    assert_eq!(st.eois, vec![33]);
    drop(st);
    // The doorbell stays pending; the OS fetches the payload itself.
    assert_eq!(pmc.irq_clears(), 0);
    assert!(pmc.irq_pending());
}

#[test]
fn init_suspend_callback_without_sgi_is_silent() {
    let (svc, pmc, plat) = ready_service();
    pmc.set_callback([PM_INIT_SUSPEND_CB, 0, 0, 0, 0, 0, 0, 0]);

    svc.ipi_callback(33);
    assert!(plat.state.lock().unwrap().os_sgis.is_empty());
    assert_eq!(pmc.irq_clears(), 0);
}

#[test]
fn forced_powerdown_callback_parks_masked_cores() {
    let (svc, pmc, plat) = ready_service();
    pmc.set_callback([PM_NOTIFY_CB, 0b10, EVENT_CPU_IDLE_FORCE_PWRDWN, 0, 0, 0, 0, 0]);

    svc.ipi_callback(33);
    assert_eq!(plat.state.lock().unwrap().idle_sgis, vec![1]);
    assert_eq!(pmc.irq_clears(), 1, "powerdown path acknowledges directly");
    assert!(plat.state.lock().unwrap().os_sgis.is_empty());
}

#[test]
fn other_notify_callback_goes_to_the_os() {
    let (svc, pmc, plat) = ready_service();
    svc.register_sgi(7, 0).unwrap();
    pmc.set_callback([PM_NOTIFY_CB, 0, 0x1234, 0, 0, 0, 0, 0]);

    svc.ipi_callback(33);
    assert_eq!(plat.state.lock().unwrap().os_sgis, vec![7]);
    assert_eq!(pmc.irq_clears(), 0);
}

#[test]
fn unknown_callback_class_is_cleared_defensively() {
    let (svc, pmc, plat) = ready_service();
    pmc.set_callback([99, 0, 0, 0, 0, 0, 0, 0]);

    svc.ipi_callback(33);
    assert_eq!(pmc.irq_clears(), 1);
    let st = plat.state.lock().unwrap();
    assert!(st.os_sgis.is_empty());
    assert!(st.idle_sgis.is_empty());
    assert_eq!(st.eois, vec![33], "handler stays live after a bad payload");
}

#[test]
fn self_suspend_arms_powerdown_before_sending() {
    let (svc, pmc, plat) = ready_service();
    svc.self_suspend(100, 3, 0xFFFF_0000_1000, SECURE).unwrap();

    assert_eq!(plat.state.lock().unwrap().armed, vec![(PROCS[0].node_id, 3)]);
    assert_eq!(*plat.order.lock().unwrap(), vec!["arm", "ring"]);

    let requests = pmc.requests();
    assert_eq!(opcode(&requests[0]), ApiId::SelfSuspend as u32);
    assert_eq!(
        &requests[0][1..6],
        &[PROCS[0].node_id, 100, 3, 0x0000_1000, 0xFFFF]
    );
}

#[test]
fn self_suspend_without_descriptor_is_internal_error() {
    let (svc, pmc, plat) = ready_service();
    plat.set_core(5);
    assert_eq!(svc.self_suspend(0, 0, 0, SECURE), Err(PmError::Internal));
    assert!(pmc.requests().is_empty());
    assert!(plat.state.lock().unwrap().armed.is_empty());
}

#[test]
fn abort_suspend_disarms_and_names_the_primary() {
    let (svc, pmc, plat) = ready_service();
    svc.abort_suspend(pm_eemi::ABORT_REASON_PU_BUSY, SECURE).unwrap();
    assert_eq!(plat.state.lock().unwrap().disarms, 1);

    let requests = pmc.requests();
    assert_eq!(opcode(&requests[0]), ApiId::AbortSuspend as u32);
    assert_eq!(
        &requests[0][1..3],
        &[pm_eemi::ABORT_REASON_PU_BUSY, PROCS[0].node_id]
    );
}

#[test]
fn load_pdi_targets_the_loader_module() {
    let (svc, pmc, _) = ready_service();
    svc.load_pdi(2, 0x1000_0000, 0x8, SECURE).unwrap();

    let requests = pmc.requests();
    let w0 = requests[0][0];
    assert_eq!(w0 & 0xFF, ApiId::LoadPdi as u32 & 0xFF);
    assert_eq!((w0 >> 8) & 0xFF, 0x7);
    // Address words travel high-before-low.
    assert_eq!(&requests[0][1..4], &[2, 0x8, 0x1000_0000]);
}

#[test]
fn smc_single_value_packing() {
    let (svc, pmc, _) = ready_service();
    pmc.push_response([0, 3, 0, 0, 0, 0, 0, 0]);
    let ret = svc.handle_smc(ApiId::PllGetMode as u32, 1, 0, 0, 0, SmcFlags::empty());
    assert_eq!(ret, SmcReturn::one(3u64 << 32));

    pmc.push_response([4, 0, 0, 0, 0, 0, 0, 0]);
    let ret = svc.handle_smc(ApiId::PllGetMode as u32, 1, 0, 0, 0, SmcFlags::empty());
    assert_eq!(ret, SmcReturn::one(4));
}

#[test]
fn smc_device_status_spans_both_registers() {
    let (svc, pmc, _) = ready_service();
    pmc.push_response([0, 10, 20, 30, 0, 0, 0, 0]);
    let ret = svc.handle_smc(ApiId::GetDeviceStatus as u32, 0xD, 0, 0, 0, SmcFlags::empty());
    assert_eq!(ret, SmcReturn::two(10u64 << 32, 20 | (30u64 << 32)));
}

#[test]
fn smc_callback_data_acks_the_doorbell() {
    let (svc, pmc, _) = ready_service();
    pmc.set_callback([PM_INIT_SUSPEND_CB, 1, 2, 3, 0, 0, 0, 0]);
    let ret = svc.handle_smc(ApiId::GetCallbackData as u32, 0, 0, 0, 0, SmcFlags::NON_SECURE);
    assert_eq!(
        ret,
        SmcReturn::two(
            PM_INIT_SUSPEND_CB as u64 | (1u64 << 32),
            2 | (3u64 << 32)
        )
    );
    assert_eq!(pmc.irq_clears(), 1);
}

#[test]
fn trustzone_version_is_served_locally() {
    let (svc, pmc, _) = ready_service();
    let ret = svc.handle_smc(ApiId::GetTrustzoneVersion as u32, 0, 0, 0, 0, SmcFlags::empty());
    assert_eq!(ret, SmcReturn::one((TZ_VERSION as u64) << 32));
    assert!(pmc.requests().is_empty());
}

#[test]
fn park_transition_is_terminal() {
    let (svc, _, plat) = ready_service();
    plat.set_core(1);
    let mask = svc.prepare_park(65);
    assert_eq!(mask, PROCS[1].pwrdn_mask);
    assert_eq!(svc.core_state(1), Some(CoreState::Parked));
    assert_eq!(plat.state.lock().unwrap().cleared, vec![65]);
    // No transition out of Parked exists.
    assert_eq!(svc.core_state(1), Some(CoreState::Parked));
    assert_eq!(svc.core_state(0), Some(CoreState::Running));
}

#[test]
fn park_from_unconfigured_core_degrades_to_a_zero_mask() {
    let (svc, _, plat) = ready_service();
    plat.set_core(MAX_CORES);
    let mask = svc.prepare_park(65);
    assert_eq!(mask, 0);
    assert_eq!(plat.state.lock().unwrap().cleared, vec![65]);
    assert_eq!(svc.core_state(MAX_CORES), None);
    // Configured cores are untouched.
    assert_eq!(svc.core_state(0), Some(CoreState::Running));
    assert_eq!(svc.core_state(1), Some(CoreState::Running));
}

#[test]
fn entry_points_route_through_the_registered_handler() {
    // Nothing registered yet: uniform unknown.
    let ret = pm_smc_handler(ApiId::GetApiVersion as u32, 0, 0, 0, 0, SmcFlags::empty());
    assert_eq!(ret, SmcReturn::UNKNOWN);
    pm_ipi_fiq_handler(33);

    let (svc, pmc, _) = ready_service();
    pmc.push_response([0, 0x10001, 0, 0, 0, 0, 0, 0]);
    register_handler(Box::leak(Box::new(svc)));
    let ret = pm_smc_handler(ApiId::GetApiVersion as u32, 0, 0, 0, 0, SmcFlags::empty());
    assert_eq!(ret, SmcReturn::one(0x10001u64 << 32));
}
