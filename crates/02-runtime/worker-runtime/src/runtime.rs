use bridge_channel::{
    ChannelError, Envelope, HostMessage, LoadBridgeConfig, WorkerMessage, WorkerPort,
};
use log::{debug, error, info, warn};

use crate::bundle::BundleRegistry;
use crate::context::JsContext;
use crate::error::{WorkerError, WorkerResult};

/// Message loop for one worker.
pub struct WorkerRuntime {
    port: WorkerPort,
    bundles: BundleRegistry,
    ctx: JsContext,
    loaded: bool,
}

impl WorkerRuntime {
    pub fn new(port: WorkerPort, bundles: BundleRegistry) -> Self {
        Self {
            port,
            bundles,
            ctx: JsContext::new(),
            loaded: false,
        }
    }

    pub fn context(&self) -> &JsContext {
        &self.ctx
    }

    pub fn context_mut(&mut self) -> &mut JsContext {
        &mut self.ctx
    }

    /// Handles frames until the host drops its end of the channel.
    pub fn run(mut self) -> WorkerResult<()> {
        loop {
            let frame = match self.port.recv() {
                Ok(frame) => frame,
                Err(ChannelError::Closed) => {
                    debug!("host closed the channel; worker exiting");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };
            match self.handle_frame(&frame) {
                Ok(()) => {}
                Err(WorkerError::Channel(ChannelError::Closed)) => {
                    debug!("host closed the channel mid-reply; worker exiting");
                    return Ok(());
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Handles one host frame. Undecodable frames and failing worker calls
    /// are logged; only channel failures are returned.
    pub fn handle_frame(&mut self, frame: &str) -> WorkerResult<()> {
        let message = match Envelope::decode(frame)
            .and_then(|envelope| HostMessage::from_envelope(envelope).map_err(ChannelError::from))
        {
            Ok(message) => message,
            Err(err) => {
                warn!("worker dropping frame: {err}");
                return Ok(());
            }
        };

        match message {
            HostMessage::LoadBridgeConfig(payload) => return self.load(payload),
            HostMessage::CallFunction {
                module,
                method,
                args,
            } => {
                if let Err(err) = self.ctx.call_function(&module, &method, args) {
                    error!("{module}.{method} failed: {err}");
                }
            }
            HostMessage::InvokeCallback { callback_id, args } => {
                if let Err(err) = self.ctx.invoke_callback(callback_id, args) {
                    warn!("callback {callback_id}: {err}");
                }
            }
            HostMessage::Flush => {}
        }
        self.flush()
    }

    fn load(&mut self, payload: LoadBridgeConfig) -> WorkerResult<()> {
        if self.loaded {
            warn!("bridge config received twice; ignoring");
            return Ok(());
        }
        self.ctx.load_config(payload.config);

        let Some(bundle) = self.bundles.get(&payload.bundle) else {
            error!("no bundle at {}", payload.bundle);
            return Ok(());
        };
        if let Err(err) = bundle.evaluate(&mut self.ctx) {
            error!("evaluating {} failed: {err}", payload.bundle);
            return self.flush();
        }
        self.loaded = true;
        info!("bundle {} evaluated", payload.bundle);

        self.send_progress()?;
        self.port.send(&WorkerMessage::BundleFinishedLoading)?;
        self.flush()
    }

    fn send_progress(&mut self) -> WorkerResult<()> {
        for progress in self.ctx.take_progress() {
            self.port.send(&WorkerMessage::UpdateProgress(progress))?;
        }
        Ok(())
    }

    /// Sends pending progress and buffered calls, if any.
    pub fn flush(&mut self) -> WorkerResult<()> {
        self.send_progress()?;
        if let Some(batch) = self.ctx.take_batch() {
            self.port.send(&WorkerMessage::FlushedQueue(batch))?;
        }
        Ok(())
    }
}
