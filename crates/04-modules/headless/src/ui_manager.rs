use log::trace;
use module_abi::{BridgeHandle, BridgeModule, BridgeSignal, MethodTable};

/// Tracks render tick requests raised while native calls are pending.
pub struct UiManager {
    _bridge: BridgeHandle,
    tick_requested: bool,
    tick_requests: u64,
}

impl UiManager {
    pub fn request_tick(&mut self) {
        trace!("tick requested");
        self.tick_requested = true;
        self.tick_requests += 1;
    }

    pub fn tick_requested(&self) -> bool {
        self.tick_requested
    }

    /// Clears and returns the pending tick request.
    pub fn take_tick_request(&mut self) -> bool {
        std::mem::take(&mut self.tick_requested)
    }

    /// Total requests seen, coalesced or not.
    pub fn tick_requests(&self) -> u64 {
        self.tick_requests
    }
}

impl BridgeModule for UiManager {
    const CLASS_NAME: &'static str = "RCTUIManager";

    fn new(bridge: BridgeHandle) -> Self {
        Self {
            _bridge: bridge,
            tick_requested: false,
            tick_requests: 0,
        }
    }

    fn methods() -> MethodTable<Self> {
        MethodTable::new()
    }

    fn handle_signal(&mut self, signal: &BridgeSignal) {
        if let BridgeSignal::RequestTick = signal {
            self.request_tick();
        }
    }

    fn wants_frame(&self) -> bool {
        self.tick_requested
    }
}
