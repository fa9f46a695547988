// Slideshow timing/state engine.
// Owns playback state, arms its own timers on an injected Scheduler, and exposes immutable snapshots.
// Every handler is an idempotent field set, so the advance and intro timers may fire in either order.

use tracing::{debug, info, warn};

use crate::audio::{AudioSink, CommandQueue, FadeStep, VolumeFade};
use crate::error::SlideshowError;
use crate::scheduler::{Fired, Scheduler, TimerId, TimerKind, VirtualScheduler};
use crate::slides::ImageOutcomes;
use crate::types::*;

const LAST_SLIDE: usize = SLIDE_COUNT - 1;

/// The slideshow core. Single-threaded; all mutation happens in `start`, the user
/// inputs, or timer dispatch inside `advance_to`.
pub struct SlideshowEngine<S = VirtualScheduler, A = CommandQueue>
where
    S: Scheduler,
    A: AudioSink,
{
    timing: TimingSettings,
    scheduler: S,
    audio: A,

    phase: Phase,
    current_slide_index: usize,
    intro_visible: bool,
    is_ending: bool,
    muted: bool,
    fade: VolumeFade,
    audio_should_play: bool,
    audio_blocked: bool,
    outcomes: ImageOutcomes,

    advance_timer: Option<TimerId>,
    intro_timer: Option<TimerId>,
    fade_timer: Option<TimerId>,
    torn_down: bool,
}

impl<S: Scheduler, A: AudioSink> SlideshowEngine<S, A> {
    pub fn new(timing: TimingSettings, scheduler: S, audio: A) -> Self {
        let fade = VolumeFade::new(timing.fade_step);
        SlideshowEngine {
            timing,
            scheduler,
            audio,
            phase: Phase::Idle,
            current_slide_index: 0,
            intro_visible: false,
            is_ending: false,
            muted: false,
            fade,
            audio_should_play: false,
            audio_blocked: false,
            outcomes: ImageOutcomes::new(),
            advance_timer: None,
            intro_timer: None,
            fade_timer: None,
            torn_down: false,
        }
    }

    /// Begin the show. Single-shot: a second call is rejected and arms nothing.
    pub fn start(&mut self) -> Result<(), SlideshowError> {
        if self.torn_down {
            warn!("start ignored: slideshow torn down");
            return Err(SlideshowError::TornDown);
        }
        if self.phase == Phase::Playing {
            warn!("start ignored: slideshow already playing");
            return Err(SlideshowError::AlreadyStarted);
        }

        self.phase = Phase::Playing;
        self.intro_visible = true;
        self.advance_timer = Some(
            self.scheduler
                .schedule_repeating(TimerKind::SlideAdvance, self.timing.slide_duration_us),
        );
        self.intro_timer = Some(
            self.scheduler
                .schedule_once(TimerKind::IntroHide, self.timing.intro_window_us()),
        );
        info!(at_us = self.scheduler.now().as_micros(), "slideshow started");

        self.audio.set_volume(1.0);
        self.audio_should_play = true;
        if let Err(err) = self.audio.play() {
            self.record_audio_failure(&err.to_string());
        }
        Ok(())
    }

    /// Move virtual time forward to `now`, dispatching every timer due on the way.
    /// Returns the number of timer firings handled.
    pub fn advance_to(&mut self, now: Timestamp) -> usize {
        if self.torn_down {
            return 0;
        }
        let mut fired = 0;
        while let Some(firing) = self.scheduler.next_due(now) {
            self.dispatch(firing);
            fired += 1;
        }
        fired
    }

    pub fn advance_by(&mut self, us: u64) -> usize {
        let target = self.scheduler.now().after(us);
        self.advance_to(target)
    }

    fn dispatch(&mut self, firing: Fired) {
        match firing.kind {
            TimerKind::SlideAdvance => self.on_advance_tick(),
            TimerKind::IntroHide => self.on_intro_elapsed(),
            TimerKind::VolumeFade => self.on_fade_tick(),
        }
    }

    fn on_advance_tick(&mut self) {
        if self.is_ending {
            return;
        }
        if self.current_slide_index < LAST_SLIDE {
            self.current_slide_index += 1;
            self.intro_visible = false;
            debug!(slide = self.current_slide_index, "advanced slide");
            return;
        }

        // The last slide has now been shown for a full duration.
        self.is_ending = true;
        if let Some(id) = self.advance_timer.take() {
            self.scheduler.cancel(id);
        }
        self.fade_timer = Some(
            self.scheduler
                .schedule_repeating(TimerKind::VolumeFade, self.timing.fade_interval_us),
        );
        info!("slideshow ending, fading audio");
    }

    fn on_intro_elapsed(&mut self) {
        self.intro_visible = false;
        self.intro_timer = None;
    }

    fn on_fade_tick(&mut self) {
        match self.fade.step() {
            FadeStep::Lowered(volume) => self.audio.set_volume(volume),
            FadeStep::Silenced => {
                if self.audio_should_play {
                    self.audio.set_volume(0.0);
                    self.audio.pause();
                    self.audio_should_play = false;
                    info!("audio faded to silence");
                }
                if let Some(id) = self.fade_timer.take() {
                    self.scheduler.cancel(id);
                }
            }
        }
    }

    /// Flip the mute flag. Leaves the fade schedule alone.
    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.audio.set_muted(self.muted);
        self.muted
    }

    /// Record an image load report for slide `slide_id` (1-based).
    /// Returns whether the stored outcome changed.
    pub fn report_image_outcome(
        &mut self,
        slide_id: u32,
        outcome: ImageOutcome,
    ) -> Result<bool, SlideshowError> {
        let id = SlideId::new(slide_id).inspect_err(|_| {
            warn!(slide_id, "image outcome for unknown slide");
        })?;
        let changed = self.outcomes.record(id, outcome);
        if changed && outcome == ImageOutcome::Failed {
            warn!(slide_id, "image failed to load, using fallback");
        }
        Ok(changed)
    }

    /// The host could not start playback (e.g. autoplay blocked). Slides keep advancing.
    pub fn report_audio_failure(&mut self, message: &str) {
        self.record_audio_failure(message);
    }

    fn record_audio_failure(&mut self, message: &str) {
        warn!(error = message, "audio playback failed");
        self.audio_blocked = true;
    }

    /// Cancel every outstanding timer. Further time advancement is ignored.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.scheduler.cancel_all();
        self.advance_timer = None;
        self.intro_timer = None;
        self.fade_timer = None;
        if self.audio_should_play {
            self.audio.pause();
            self.audio_should_play = false;
        }
        self.torn_down = true;
        debug!("slideshow torn down");
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            phase: self.phase,
            current_slide_index: self.current_slide_index,
            intro_visible: self.intro_visible,
            is_ending: self.is_ending,
            muted: self.muted,
            audio_volume: self.fade.volume(),
            audio_should_play: self.audio_should_play,
            audio_blocked: self.audio_blocked,
            slide_outcomes: self.outcomes.as_array(),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.scheduler.now()
    }

    pub fn pending_timers(&self) -> usize {
        self.scheduler.pending()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn timing(&self) -> &TimingSettings {
        &self.timing
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }
}

impl SlideshowEngine<VirtualScheduler, CommandQueue> {
    /// Engine over virtual time with a command-recording audio sink.
    pub fn with_defaults(timing: TimingSettings) -> Self {
        SlideshowEngine::new(timing, VirtualScheduler::new(), CommandQueue::new())
    }
}

impl<S: Scheduler, A: AudioSink> Drop for SlideshowEngine<S, A> {
    fn drop(&mut self) {
        self.teardown();
    }
}
