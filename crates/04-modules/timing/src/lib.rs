//! Worker timers driven by the host frame clock.
//!
//! The worker registers timers with `createTimer`; each frame the module fires
//! every due timer in a single `JSTimers.callTimers` call so that many timers
//! cost one message. Idle callbacks are offered when enough of the frame
//! budget remains.

use std::collections::BTreeMap;

use log::trace;
use module_abi::{Args, BridgeHandle, BridgeModule, BridgeSignal, MethodTable, ModuleResult};
use serde_json::json;
use smallvec::SmallVec;

const JS_TIMERS: &str = "JSTimers";

/// Target frame duration at 60 fps.
pub const TARGET_FRAME_DURATION_MS: f64 = 1000.0 / 60.0;

/// Minimum idle time left in a frame before idle callbacks are sent.
pub const IDLE_CALLBACK_THRESHOLD_MS: f64 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timer {
    pub callback_id: u64,
    pub duration_ms: f64,
    pub target_time_ms: f64,
    pub repeats: bool,
}

pub struct Timing {
    bridge: BridgeHandle,
    timers: BTreeMap<u64, Timer>,
    send_idle_events: bool,
}

impl Timing {
    pub fn timer(&self, callback_id: u64) -> Option<&Timer> {
        self.timers.get(&callback_id)
    }

    pub fn timer_count(&self) -> usize {
        self.timers.len()
    }

    pub fn sends_idle_events(&self) -> bool {
        self.send_idle_events
    }

    /// `createTimer(callbackId, duration, jsSchedulingTime, repeats)`.
    pub fn create_timer(
        &mut self,
        callback_id: u64,
        duration_ms: f64,
        js_scheduling_time_ms: f64,
        repeats: bool,
    ) {
        let now = self.bridge.now_ms();
        // The worker's clock reading is assumed to be one frame old.
        let worker_now = js_scheduling_time_ms + TARGET_FRAME_DURATION_MS;
        let adjusted = (js_scheduling_time_ms - worker_now + duration_ms).max(0.0);
        let mut timer = Timer {
            callback_id,
            duration_ms,
            target_time_ms: now + adjusted,
            repeats,
        };

        if adjusted == 0.0 {
            if timer.repeats {
                timer.target_time_ms += timer.duration_ms;
                self.timers.insert(callback_id, timer);
            }
            self.bridge
                .enqueue_js_call(JS_TIMERS, "callTimers", vec![json!([callback_id])]);
        } else {
            self.timers.insert(callback_id, timer);
        }
    }

    pub fn delete_timer(&mut self, callback_id: u64) {
        self.timers.remove(&callback_id);
    }

    pub fn set_send_idle_events(&mut self, send_idle: bool) {
        self.send_idle_events = send_idle;
    }

    /// Fires every timer due at `now_ms`; returns the fired callback ids.
    pub fn fire_due_timers(&mut self, now_ms: f64) -> SmallVec<[u64; 8]> {
        let mut fired = SmallVec::<[u64; 8]>::new();
        self.timers.retain(|_, timer| {
            if timer.target_time_ms > now_ms {
                return true;
            }
            fired.push(timer.callback_id);
            if timer.repeats {
                timer.target_time_ms += timer.duration_ms;
                true
            } else {
                false
            }
        });

        if !fired.is_empty() {
            trace!("firing {} timer(s)", fired.len());
            self.bridge
                .enqueue_js_call(JS_TIMERS, "callTimers", vec![json!(fired.as_slice())]);
        }
        fired
    }

    /// Offers idle callbacks when at least the idle threshold of the frame
    /// budget remains; returns whether a call was sent.
    pub fn idle(&mut self, frame_start_ms: f64, now_ms: f64) -> bool {
        if !self.send_idle_events {
            return false;
        }
        let frame_elapsed = now_ms - frame_start_ms;
        if TARGET_FRAME_DURATION_MS - frame_elapsed < IDLE_CALLBACK_THRESHOLD_MS {
            return false;
        }
        self.bridge.enqueue_js_call(
            JS_TIMERS,
            "callIdleCallbacks",
            vec![json!(self.bridge.now_ms() - frame_elapsed)],
        );
        true
    }
}

impl BridgeModule for Timing {
    const CLASS_NAME: &'static str = "RCTTiming";

    fn new(bridge: BridgeHandle) -> Self {
        Self {
            bridge,
            timers: BTreeMap::new(),
            send_idle_events: false,
        }
    }

    fn methods() -> MethodTable<Self> {
        MethodTable::new()
            .method("createTimer", create_timer)
            .method("deleteTimer", |timing, args| {
                timing.delete_timer(args.get(0)?);
                Ok(())
            })
            .method("setSendIdleEvents", |timing, args| {
                timing.set_send_idle_events(args.get(0)?);
                Ok(())
            })
    }

    fn handle_signal(&mut self, signal: &BridgeSignal) {
        match *signal {
            BridgeSignal::Frame { now_ms } => {
                self.fire_due_timers(now_ms);
            }
            BridgeSignal::Idle {
                frame_start_ms,
                now_ms,
            } => {
                self.idle(frame_start_ms, now_ms);
            }
            _ => {}
        }
    }

    fn wants_frame(&self) -> bool {
        !self.timers.is_empty()
    }
}

fn create_timer(timing: &mut Timing, args: Args) -> ModuleResult<()> {
    timing.create_timer(args.get(0)?, args.get(1)?, args.get(2)?, args.get(3)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_channel::{pair, Envelope, HostMessage, WorkerPort};
    use module_abi::{ManualClock, NotificationCenter};
    use serde_json::Value;
    use std::sync::Arc;

    fn timing(start_ms: f64) -> (Timing, ManualClock, WorkerPort) {
        let (host, worker) = pair();
        let clock = ManualClock::new(start_ms);
        let bridge = BridgeHandle::new(
            host.outbound(),
            NotificationCenter::new(),
            Arc::new(clock.clone()),
        );
        (Timing::new(bridge), clock, worker)
    }

    fn next_call(worker: &WorkerPort) -> (String, String, Vec<Value>) {
        let frame = worker.try_recv().expect("open").expect("frame");
        match HostMessage::from_envelope(Envelope::decode(&frame).expect("decode")) {
            Ok(HostMessage::CallFunction {
                module,
                method,
                args,
            }) => (module, method, args),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn short_timer_fires_immediately() {
        let (mut timing, _clock, worker) = timing(1_000.0);
        timing.create_timer(7, 10.0, 990.0, false);
        assert_eq!(timing.timer_count(), 0);
        assert_eq!(
            next_call(&worker),
            ("JSTimers".into(), "callTimers".into(), vec![json!([7])])
        );
    }

    #[test]
    fn short_repeating_timer_is_rescheduled() {
        let (mut timing, _clock, worker) = timing(1_000.0);
        timing.create_timer(3, 5.0, 990.0, true);
        let timer = timing.timer(3).expect("kept");
        assert_eq!(timer.target_time_ms, 1_005.0);
        assert!(timing.wants_frame());
        next_call(&worker);
    }

    #[test]
    fn due_timers_fire_in_one_batch() {
        let (mut timing, clock, worker) = timing(0.0);
        timing.create_timer(1, 100.0, 0.0, false);
        timing.create_timer(2, 200.0, 0.0, true);
        timing.create_timer(3, 500.0, 0.0, false);
        assert!(matches!(worker.try_recv(), Ok(None)));

        clock.set(250.0);
        timing.handle_signal(&BridgeSignal::Frame { now_ms: 250.0 });
        assert_eq!(
            next_call(&worker),
            ("JSTimers".into(), "callTimers".into(), vec![json!([1, 2])])
        );
        assert!(timing.timer(1).is_none());
        assert!(timing.timer(2).is_some());

        timing.delete_timer(2);
        timing.delete_timer(3);
        assert!(!timing.wants_frame());
        assert!(timing.fire_due_timers(10_000.0).is_empty());
        assert!(matches!(worker.try_recv(), Ok(None)));
    }

    #[test]
    fn idle_callbacks_respect_budget() {
        let (mut timing, _clock, worker) = timing(100.0);
        assert!(!timing.idle(90.0, 91.0));

        timing.set_send_idle_events(true);
        assert!(!timing.idle(90.0, 105.0));
        assert!(timing.idle(90.0, 92.0));
        assert_eq!(
            next_call(&worker),
            (
                "JSTimers".into(),
                "callIdleCallbacks".into(),
                vec![json!(98.0)]
            )
        );
    }
}
