// Fixed slide set and per-slide image outcomes.
// Locators are derived from the configured patterns; the fallback is addressed by slide id.

use serde::{Deserialize, Serialize};

use crate::types::*;

/// One slide: id plus where to find its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlideDescriptor {
    pub id: SlideId,
    pub primary: String,
    pub fallback: String,
}

/// The ordered, immutable slides of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlideSet {
    slides: [SlideDescriptor; SLIDE_COUNT],
}

impl SlideSet {
    pub fn from_assets(assets: &AssetSettings) -> Self {
        let slides = std::array::from_fn(|index| {
            let id = SlideId::from_index(index);
            SlideDescriptor {
                id,
                primary: expand_pattern(&assets.image_pattern, id),
                fallback: expand_pattern(&assets.fallback_pattern, id),
            }
        });
        SlideSet { slides }
    }

    pub fn get(&self, id: SlideId) -> &SlideDescriptor {
        &self.slides[id.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlideDescriptor> {
        self.slides.iter()
    }

    /// Locator the renderer should use given what it reported so far.
    pub fn locator_for(&self, id: SlideId, outcome: ImageOutcome) -> &str {
        let slide = self.get(id);
        match outcome {
            ImageOutcome::Failed => &slide.fallback,
            ImageOutcome::Unknown | ImageOutcome::Loaded => &slide.primary,
        }
    }
}

impl Default for SlideSet {
    fn default() -> Self {
        SlideSet::from_assets(&AssetSettings::default())
    }
}

fn expand_pattern(pattern: &str, id: SlideId) -> String {
    pattern.replace(ID_PLACEHOLDER, &id.as_u32().to_string())
}

/// Load outcome per slide position. `Unknown` until the renderer reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ImageOutcomes {
    outcomes: [ImageOutcome; SLIDE_COUNT],
}

impl ImageOutcomes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: SlideId) -> ImageOutcome {
        self.outcomes[id.index()]
    }

    /// Record a report. Returns whether the stored outcome changed.
    ///
    /// `Failed` is sticky: later `Loaded` reports for the same slide are ignored.
    /// Reporting `Unknown` never changes anything.
    pub fn record(&mut self, id: SlideId, outcome: ImageOutcome) -> bool {
        let slot = &mut self.outcomes[id.index()];
        let next = match (*slot, outcome) {
            (ImageOutcome::Failed, _) | (_, ImageOutcome::Unknown) => *slot,
            (_, reported) => reported,
        };
        let changed = next != *slot;
        *slot = next;
        changed
    }

    pub fn as_array(&self) -> [ImageOutcome; SLIDE_COUNT] {
        self.outcomes
    }
}
