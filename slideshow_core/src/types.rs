// Strong typing over strings. Newtypes for timestamps and slide ids, serde config passed from JS.

use serde::{Deserialize, Serialize};

use crate::error::SlideshowError;

/// Number of slides in a session. Fixed at compile time; never configurable.
pub const SLIDE_COUNT: usize = 8;

/// Placeholder substituted with the slide id in locator patterns.
pub const ID_PLACEHOLDER: &str = "{id}";

/// Timestamp in microseconds. Newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Timestamp(u64);

impl Timestamp {
    pub fn from_micros(us: u64) -> Self {
        Timestamp(us)
    }

    pub fn from_millis(ms: u64) -> Self {
        Timestamp(ms.saturating_mul(1000))
    }

    pub fn as_micros(&self) -> u64 {
        self.0
    }

    pub fn as_millis(&self) -> f64 {
        self.0 as f64 / 1000.0
    }

    /// Timestamp `us` microseconds later, saturating at `u64::MAX`.
    pub fn after(&self, us: u64) -> Self {
        Timestamp(self.0.saturating_add(us))
    }
}

/// Slide identifier, 1-based (1..=SLIDE_COUNT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlideId(u32);

impl SlideId {
    /// Validates the id against the fixed slide count.
    pub fn new(id: u32) -> Result<Self, SlideshowError> {
        if id == 0 || id as usize > SLIDE_COUNT {
            return Err(SlideshowError::UnknownSlide(id));
        }
        Ok(SlideId(id))
    }

    /// Id of the slide at a 0-based position. Caller guarantees `index < SLIDE_COUNT`.
    pub(crate) fn from_index(index: usize) -> Self {
        SlideId(index as u32 + 1)
    }

    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// 0-based position in the slide set.
    pub fn index(&self) -> usize {
        self.0 as usize - 1
    }
}

/// Coarse lifecycle stage of playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Phase {
    /// Waiting for the user to start the show.
    #[default]
    Idle,
    /// Entered once on start, never left.
    Playing,
}

/// What the renderer reported about a slide's primary image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ImageOutcome {
    #[default]
    Unknown,
    Loaded,
    /// Sticky: the fallback locator is used for the rest of the session.
    Failed,
}

/// Engine configuration passed from JS. `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SlideshowConfig {
    #[serde(default)]
    pub timing: TimingSettings,
    #[serde(default)]
    pub assets: AssetSettings,
    #[serde(default)]
    pub captions: CaptionSettings,
}

impl SlideshowConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, SlideshowError> {
        let config: SlideshowConfig = serde_json::from_str(json)
            .map_err(|e| SlideshowError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SlideshowError> {
        let timing = &self.timing;
        if timing.slide_duration_us == 0 {
            return Err(SlideshowError::InvalidConfig(
                "slide_duration_us must be non-zero".to_string(),
            ));
        }
        if timing.intro_lead_us >= timing.slide_duration_us {
            return Err(SlideshowError::InvalidConfig(format!(
                "intro_lead_us ({}) must be shorter than slide_duration_us ({})",
                timing.intro_lead_us, timing.slide_duration_us
            )));
        }
        if timing.fade_interval_us == 0 {
            return Err(SlideshowError::InvalidConfig(
                "fade_interval_us must be non-zero".to_string(),
            ));
        }
        if !(timing.fade_step > 0.0 && timing.fade_step <= 1.0) {
            return Err(SlideshowError::InvalidConfig(format!(
                "fade_step must be in (0, 1], got {}",
                timing.fade_step
            )));
        }
        for (name, pattern) in [
            ("image_pattern", &self.assets.image_pattern),
            ("fallback_pattern", &self.assets.fallback_pattern),
        ] {
            if !pattern.contains(ID_PLACEHOLDER) {
                return Err(SlideshowError::InvalidConfig(format!(
                    "{} must contain {}",
                    name, ID_PLACEHOLDER
                )));
            }
        }
        Ok(())
    }
}

/// Slide and fade timing. Defaults are the production values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimingSettings {
    /// How long each slide is shown before the advance tick (microseconds).
    #[serde(default = "default_slide_duration")]
    pub slide_duration_us: u64,
    /// The intro caption hides this long before the first advance tick.
    #[serde(default = "default_intro_lead")]
    pub intro_lead_us: u64,
    /// Interval between fade ticks once the show is ending.
    #[serde(default = "default_fade_interval")]
    pub fade_interval_us: u64,
    /// Volume removed per fade tick.
    #[serde(default = "default_fade_step")]
    pub fade_step: f32,
}

impl TimingSettings {
    /// Delay from start until the intro caption hides.
    pub fn intro_window_us(&self) -> u64 {
        self.slide_duration_us.saturating_sub(self.intro_lead_us)
    }
}

impl Default for TimingSettings {
    fn default() -> Self {
        TimingSettings {
            slide_duration_us: default_slide_duration(),
            intro_lead_us: default_intro_lead(),
            fade_interval_us: default_fade_interval(),
            fade_step: default_fade_step(),
        }
    }
}

fn default_slide_duration() -> u64 {
    5_000_000 // 5s
}

fn default_intro_lead() -> u64 {
    1_000_000 // 1s
}

fn default_fade_interval() -> u64 {
    200_000 // 200ms
}

fn default_fade_step() -> f32 {
    0.05
}

/// Where images and music come from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetSettings {
    #[serde(default = "default_image_pattern")]
    pub image_pattern: String,
    #[serde(default = "default_fallback_pattern")]
    pub fallback_pattern: String,
    #[serde(default = "default_audio_src")]
    pub audio_src: String,
    #[serde(default = "default_true")]
    pub audio_loop: bool,
}

impl Default for AssetSettings {
    fn default() -> Self {
        AssetSettings {
            image_pattern: default_image_pattern(),
            fallback_pattern: default_fallback_pattern(),
            audio_src: default_audio_src(),
            audio_loop: true,
        }
    }
}

fn default_image_pattern() -> String {
    "images/{id}.jpg".to_string()
}

fn default_fallback_pattern() -> String {
    "https://placehold.co/1920x1080/f3f4f6/db2777?text=Wedding+Photo+{id}".to_string()
}

fn default_audio_src() -> String {
    "music/music.mp3".to_string()
}

fn default_true() -> bool {
    true
}

/// Overlay text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionSettings {
    #[serde(default = "default_intro_caption")]
    pub intro: String,
    #[serde(default = "default_outro_title")]
    pub outro_title: String,
    #[serde(default = "default_outro_subtitle")]
    pub outro_subtitle: String,
}

impl Default for CaptionSettings {
    fn default() -> Self {
        CaptionSettings {
            intro: default_intro_caption(),
            outro_title: default_outro_title(),
            outro_subtitle: default_outro_subtitle(),
        }
    }
}

fn default_intro_caption() -> String {
    "A wedding to remember".to_string()
}

fn default_outro_title() -> String {
    "Congratulations".to_string()
}

fn default_outro_subtitle() -> String {
    "Chloe & Brandon".to_string()
}

/// Immutable view of playback state handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub current_slide_index: usize,
    pub intro_visible: bool,
    pub is_ending: bool,
    pub muted: bool,
    pub audio_volume: f32,
    pub audio_should_play: bool,
    /// Set when the host reported that playback could not start (e.g. autoplay blocked).
    pub audio_blocked: bool,
    pub slide_outcomes: [ImageOutcome; SLIDE_COUNT],
}

impl Snapshot {
    pub fn outcome(&self, id: SlideId) -> ImageOutcome {
        self.slide_outcomes[id.index()]
    }

    /// The last slide carries the outro captions.
    pub fn outro_visible(&self) -> bool {
        self.phase == Phase::Playing && self.current_slide_index == SLIDE_COUNT - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_conversions() {
        let ts = Timestamp::from_millis(1_500);
        assert_eq!(ts.as_micros(), 1_500_000);
        assert!((ts.as_millis() - 1500.0).abs() < 0.0001);
        assert_eq!(ts.after(500).as_micros(), 1_500_500);
        assert_eq!(Timestamp::from_micros(u64::MAX).after(1).as_micros(), u64::MAX);
    }

    #[test]
    fn slide_id_bounds() {
        assert!(SlideId::new(0).is_err());
        assert!(SlideId::new(SLIDE_COUNT as u32 + 1).is_err());
        let id = SlideId::new(3).unwrap();
        assert_eq!(id.index(), 2);
        assert_eq!(SlideId::from_index(2), id);
    }

    #[test]
    fn empty_config_uses_defaults() {
        let config = SlideshowConfig::from_json("{}").unwrap();
        assert_eq!(config.timing.slide_duration_us, 5_000_000);
        assert_eq!(config.timing.intro_window_us(), 4_000_000);
        assert_eq!(config.timing.fade_interval_us, 200_000);
        assert_eq!(config.assets.audio_src, "music/music.mp3");
        assert_eq!(config.captions.intro, "A wedding to remember");
    }

    #[test]
    fn partial_timing_config_keeps_other_defaults() {
        let config =
            SlideshowConfig::from_json(r#"{"timing":{"slide_duration_us":3000000}}"#).unwrap();
        assert_eq!(config.timing.slide_duration_us, 3_000_000);
        assert_eq!(config.timing.intro_lead_us, 1_000_000);
    }

    #[test]
    fn invalid_configs_are_rejected() {
        let cases = [
            r#"{"timing":{"slide_duration_us":0}}"#,
            r#"{"timing":{"slide_duration_us":1000,"intro_lead_us":1000}}"#,
            r#"{"timing":{"fade_interval_us":0}}"#,
            r#"{"timing":{"fade_step":0.0}}"#,
            r#"{"timing":{"fade_step":1.5}}"#,
            r#"{"assets":{"image_pattern":"images/photo.jpg"}}"#,
            r#"{"timing":"fast"}"#,
        ];
        for json in cases {
            let err = SlideshowConfig::from_json(json).unwrap_err();
            assert!(
                matches!(err, SlideshowError::InvalidConfig(_)),
                "expected InvalidConfig for {}",
                json
            );
        }
    }

    #[test]
    fn snapshot_serializes_with_outcomes() {
        let snapshot = Snapshot {
            phase: Phase::Playing,
            current_slide_index: SLIDE_COUNT - 1,
            intro_visible: false,
            is_ending: false,
            muted: false,
            audio_volume: 1.0,
            audio_should_play: true,
            audio_blocked: false,
            slide_outcomes: [ImageOutcome::Unknown; SLIDE_COUNT],
        };
        assert!(snapshot.outro_visible());
        let json = serde_json::to_string(&snapshot).unwrap();
        assert!(json.contains(r#""phase":"Playing""#));
        assert!(json.contains(r#""slide_outcomes":["Unknown""#));
    }
}
