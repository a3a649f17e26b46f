use log::debug;
use module_abi::{Args, BridgeHandle, BridgeModule, MethodTable, ModuleResult};
use serde_json::json;

/// Rejection code used for every prefetch.
pub const E_UNSUPPORTED: &str = "E_UNSUPPORTED";

/// Image loader without a network backend: prefetches always reject.
pub struct ImageLoader {
    bridge: BridgeHandle,
    rejected: u64,
}

impl ImageLoader {
    pub fn rejected(&self) -> u64 {
        self.rejected
    }
}

impl BridgeModule for ImageLoader {
    const CLASS_NAME: &'static str = "RCTImageLoader";

    fn new(bridge: BridgeHandle) -> Self {
        Self {
            bridge,
            rejected: 0,
        }
    }

    fn methods() -> MethodTable<Self> {
        MethodTable::new().exported("$prefetchImage", prefetch_image)
    }
}

// Promise methods receive `resolve` and `reject` callback ids after their
// own arguments.
fn prefetch_image(loader: &mut ImageLoader, args: Args) -> ModuleResult<()> {
    let uri: String = args.get(0)?;
    let reject: u64 = args.get(2)?;
    debug!("rejecting prefetch of {uri}");
    loader.rejected += 1;
    loader.bridge.callback_from_id(reject).invoke(vec![json!({
        "code": E_UNSUPPORTED,
        "message": format!("image loading is unavailable: {uri}"),
    })]);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{module, next_message};
    use bridge_channel::HostMessage;
    use module_abi::{ModuleError, ModuleInstance, NativeModule};

    #[test]
    fn prefetch_is_a_promise_method() {
        let (loader, _worker) = module::<ImageLoader>();
        let table = ImageLoader::methods();
        let config = table.describe("ImageLoader", loader.constants_to_export());
        assert_eq!(config.methods, vec!["prefetchImage".to_string()]);
        assert_eq!(config.promise_methods, vec![0]);
    }

    #[test]
    fn prefetch_rejects_through_the_reject_callback() {
        let (mut loader, worker) = module::<ImageLoader>();
        prefetch_image(
            &mut loader,
            Args::new(vec![json!("https://x/y.png"), json!(4), json!(5)]),
        )
        .expect("dispatch");

        match next_message(&worker) {
            Some(HostMessage::InvokeCallback { callback_id, args }) => {
                assert_eq!(callback_id, 5);
                assert_eq!(args[0]["code"], json!(E_UNSUPPORTED));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(loader.rejected(), 1);
    }

    #[test]
    fn prefetch_without_callbacks_fails() {
        let (host, _worker) = bridge_channel::pair();
        let bridge = BridgeHandle::new(
            host.outbound(),
            module_abi::NotificationCenter::new(),
            std::sync::Arc::new(module_abi::SystemClock),
        );
        let mut instance = ModuleInstance::<ImageLoader>::new(bridge).expect("valid");
        let err = instance
            .invoke(0, vec![json!("a.png")])
            .expect_err("missing reject id");
        assert!(matches!(err, ModuleError::MissingArgument { index: 2 }));
    }
}
