// slideshow_core: memento slideshow Rust/WASM engine.
// All timing lives here; JS owns the <img>/<audio> elements and forwards clock, clicks and load events.

mod audio;
mod engine;
mod error;
mod projection;
mod scheduler;
mod slides;
mod types;

use std::cell::RefCell;
use std::rc::Rc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

pub use audio::{AudioCommand, AudioSink, CommandQueue, FadeStep, VolumeFade};
pub use engine::SlideshowEngine;
pub use error::SlideshowError;
pub use projection::{project, Captions, Frame, SlideLayer};
pub use scheduler::{Fired, Scheduler, TimerId, TimerKind, VirtualScheduler};
pub use slides::{ImageOutcomes, SlideDescriptor, SlideSet};
pub use types::*;

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

fn js_error(err: SlideshowError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Slideshow interface exposed to JavaScript.
/// Timestamps are the host clock in microseconds (e.g. `performance.now() * 1000`).
#[wasm_bindgen]
pub struct Slideshow {
    engine: SlideshowEngine,
    slides: SlideSet,
    config: SlideshowConfig,
    // Rejections from watched play() promises, applied on the next tick.
    audio_failures: Rc<RefCell<Vec<String>>>,
}

#[wasm_bindgen]
impl Slideshow {
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: &str) -> Result<Slideshow, JsValue> {
        let config = SlideshowConfig::from_json(config_json).map_err(js_error)?;

        Ok(Slideshow {
            engine: SlideshowEngine::with_defaults(config.timing.clone()),
            slides: SlideSet::from_assets(&config.assets),
            config,
            audio_failures: Rc::new(RefCell::new(Vec::new())),
        })
    }

    /// The user pressed "View Slideshow". Rejected if called twice.
    pub fn start(&mut self, now_us: u64) -> Result<(), JsValue> {
        self.engine.advance_to(Timestamp::from_micros(now_us));
        self.engine.start().map_err(js_error)
    }

    /// Advance to the host clock. Returns whether anything was dispatched,
    /// so the host can skip re-rendering on quiet frames.
    pub fn tick(&mut self, now_us: u64) -> bool {
        let failures: Vec<String> = self.audio_failures.borrow_mut().drain(..).collect();
        let had_failures = !failures.is_empty();
        for message in failures {
            self.engine.report_audio_failure(&message);
        }
        let fired = self.engine.advance_to(Timestamp::from_micros(now_us));
        fired > 0 || had_failures
    }

    /// Returns the new muted flag.
    pub fn toggle_mute(&mut self) -> bool {
        self.engine.toggle_mute()
    }

    pub fn report_image_loaded(&mut self, slide_id: u32) -> Result<bool, JsValue> {
        self.engine
            .report_image_outcome(slide_id, ImageOutcome::Loaded)
            .map_err(js_error)
    }

    pub fn report_image_failed(&mut self, slide_id: u32) -> Result<bool, JsValue> {
        self.engine
            .report_image_outcome(slide_id, ImageOutcome::Failed)
            .map_err(js_error)
    }

    pub fn report_audio_failure(&mut self, message: &str) {
        self.engine.report_audio_failure(message);
    }

    /// Watch the promise returned by `HTMLMediaElement.play()`.
    /// A rejection is recorded as an audio failure on the next tick.
    pub fn watch_play(&self, promise: js_sys::Promise) {
        let inbox = Rc::clone(&self.audio_failures);
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                let message = err
                    .as_string()
                    .unwrap_or_else(|| "play() rejected".to_string());
                inbox.borrow_mut().push(message);
            }
        });
    }

    /// Current playback state as JSON.
    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&self.engine.snapshot())
            .map_err(|e| js_error(SlideshowError::from(e)))
    }

    /// What to draw right now as JSON: slide layers, captions, progress, blackout.
    pub fn frame_json(&self) -> Result<String, JsValue> {
        let frame = project(
            &self.engine.snapshot(),
            &self.slides,
            &self.config.captions,
        );
        serde_json::to_string(&frame).map_err(|e| js_error(SlideshowError::from(e)))
    }

    /// Audio commands recorded since the last call, as a JSON array.
    pub fn drain_audio_commands(&mut self) -> Result<String, JsValue> {
        let commands = self.engine.audio_mut().drain();
        serde_json::to_string(&commands).map_err(|e| js_error(SlideshowError::from(e)))
    }

    pub fn audio_src(&self) -> String {
        self.config.assets.audio_src.clone()
    }

    pub fn audio_loop(&self) -> bool {
        self.config.assets.audio_loop
    }

    pub fn slide_count() -> usize {
        SLIDE_COUNT
    }

    /// Leaving the play view: cancel every pending timer.
    pub fn teardown(&mut self) {
        self.engine.teardown();
    }
}
