// Projects a snapshot onto what the rendering surface should show.
// Pure: same snapshot in, same frame out. The renderer never mutates engine state.

use serde::{Deserialize, Serialize};

use crate::slides::SlideSet;
use crate::types::*;

/// One slide layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideLayer {
    pub id: SlideId,
    /// Primary locator, or the fallback once the slide has failed.
    pub src: String,
    pub alt: String,
    /// Fully opaque and on top.
    pub active: bool,
    /// Slow push-in applies to the current and every earlier slide.
    pub zoomed: bool,
}

/// Caption overlay text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Captions {
    pub intro: Option<String>,
    pub outro_title: Option<String>,
    pub outro_subtitle: Option<String>,
}

/// Everything the renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Show the "View Slideshow" start screen instead of the slides.
    pub show_start_screen: bool,
    pub slides: Vec<SlideLayer>,
    pub captions: Captions,
    /// Progress bar fill in (0, 1].
    pub progress: f32,
    /// Fade-to-black overlay.
    pub blackout: bool,
    pub muted: bool,
}

pub fn project(snapshot: &Snapshot, slides: &SlideSet, captions: &CaptionSettings) -> Frame {
    let current = snapshot.current_slide_index;

    let layers = slides
        .iter()
        .enumerate()
        .map(|(index, slide)| SlideLayer {
            id: slide.id,
            src: slides
                .locator_for(slide.id, snapshot.outcome(slide.id))
                .to_string(),
            alt: format!("Wedding Slide {}", slide.id.as_u32()),
            active: index == current,
            zoomed: snapshot.phase == Phase::Playing && index <= current,
        })
        .collect();

    let intro = (snapshot.intro_visible && current == 0).then(|| captions.intro.clone());
    let outro = snapshot.outro_visible();

    Frame {
        show_start_screen: snapshot.phase == Phase::Idle,
        slides: layers,
        captions: Captions {
            intro,
            outro_title: outro.then(|| captions.outro_title.clone()),
            outro_subtitle: outro.then(|| captions.outro_subtitle.clone()),
        },
        progress: (current + 1) as f32 / SLIDE_COUNT as f32,
        blackout: snapshot.is_ending,
        muted: snapshot.muted,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(index: usize) -> Snapshot {
        Snapshot {
            phase: Phase::Playing,
            current_slide_index: index,
            intro_visible: index == 0,
            is_ending: false,
            muted: false,
            audio_volume: 1.0,
            audio_should_play: true,
            audio_blocked: false,
            slide_outcomes: [ImageOutcome::Unknown; SLIDE_COUNT],
        }
    }

    #[test]
    fn idle_shows_start_screen() {
        let mut snap = snapshot(0);
        snap.phase = Phase::Idle;
        snap.intro_visible = false;
        let frame = project(&snap, &SlideSet::default(), &CaptionSettings::default());
        assert!(frame.show_start_screen);
        assert!(frame.slides.iter().all(|s| !s.zoomed));
        assert!(frame.captions.intro.is_none());
    }

    #[test]
    fn first_slide_shows_intro_caption() {
        let frame = project(&snapshot(0), &SlideSet::default(), &CaptionSettings::default());
        assert_eq!(frame.captions.intro.as_deref(), Some("A wedding to remember"));
        assert!(frame.captions.outro_title.is_none());
        assert!(frame.slides[0].active);
        assert_eq!(frame.slides[0].alt, "Wedding Slide 1");
        assert!((frame.progress - 0.125).abs() < f32::EPSILON);
    }

    #[test]
    fn last_slide_shows_outro() {
        let mut snap = snapshot(SLIDE_COUNT - 1);
        snap.is_ending = true;
        let frame = project(&snap, &SlideSet::default(), &CaptionSettings::default());
        assert_eq!(frame.captions.outro_title.as_deref(), Some("Congratulations"));
        assert_eq!(frame.captions.outro_subtitle.as_deref(), Some("Chloe & Brandon"));
        assert!(frame.blackout);
        assert_eq!(frame.progress, 1.0);
        assert!(frame.slides.iter().all(|s| s.zoomed));
    }

    #[test]
    fn only_current_slide_is_active() {
        let frame = project(&snapshot(3), &SlideSet::default(), &CaptionSettings::default());
        let active: Vec<usize> = frame
            .slides
            .iter()
            .enumerate()
            .filter(|(_, s)| s.active)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(active, vec![3]);
        assert!(frame.slides[3].zoomed);
        assert!(!frame.slides[4].zoomed);
    }

    #[test]
    fn failed_slide_renders_fallback() {
        let mut snap = snapshot(2);
        snap.slide_outcomes[2] = ImageOutcome::Failed;
        snap.slide_outcomes[1] = ImageOutcome::Loaded;
        let frame = project(&snap, &SlideSet::default(), &CaptionSettings::default());
        assert!(frame.slides[2].src.contains("placehold.co"));
        assert_eq!(frame.slides[1].src, "images/2.jpg");
        assert_eq!(frame.slides[3].src, "images/4.jpg");
    }
}
