//! The previewer: one mounted template preview.
//!
//! A [`Previewer`] owns its definition, customization, resolved
//! composition, playhead, scale mapper and visibility tracker. Nothing is
//! shared between previewers. Inputs arrive as explicit events:
//!
//! - customization changes re-resolve synchronously, before the next frame
//! - `on_resize` recomputes the display scale
//! - frame ticks from a [`FrameLoop`] advance the playhead and compose
//! - `unmount` drops the frame subscription; later events are ignored

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use karo_common::config::PreviewDefaults;
use karo_common::{Clock, KaroError};
use karo_composition_core::animation::AnimationSelector;
use karo_composition_core::resolve::{duration_bounds, resolve_composition, ResolvedComposition};
use karo_composition_core::scale::{ScaleError, ScaleMapper};
use karo_composition_core::timeline::{VisibilityChange, VisibilityTracker};
use karo_template_model::customization::{Customization, DurationBounds};
use karo_template_model::template::{TemplateDefinition, TemplateError};

use crate::compositor::{compose_frame, Frame};
use crate::frame_loop::{FrameLoop, FrameSubscription, FrameTick};
use crate::playhead::{PlaybackState, Playhead};

/// Errors surfaced to the host of a previewer.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("Failed to load template: {0}")]
    Load(#[from] TemplateError),

    #[error(transparent)]
    Scale(#[from] ScaleError),
}

impl From<PreviewError> for KaroError {
    fn from(err: PreviewError) -> Self {
        match err {
            PreviewError::Load(inner) => inner.into(),
            PreviewError::Scale(inner) => inner.into(),
        }
    }
}

/// Previewer settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PreviewOptions {
    pub loop_playback: bool,
    pub bounds: DurationBounds,
    pub selector: AnimationSelector,
    /// Initial container width; `None` starts at 1:1.
    pub container_width: Option<f64>,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self::from(&PreviewDefaults::default())
    }
}

impl From<&PreviewDefaults> for PreviewOptions {
    fn from(defaults: &PreviewDefaults) -> Self {
        Self {
            loop_playback: defaults.loop_playback,
            bounds: duration_bounds(defaults),
            selector: AnimationSelector::from(defaults),
            container_width: None,
        }
    }
}

struct PreviewState {
    definition: TemplateDefinition,
    customization: Customization,
    options: PreviewOptions,
    composition: ResolvedComposition,
    playhead: Playhead,
    scale: ScaleMapper,
    tracker: VisibilityTracker,
    last_frame: Option<Frame>,
    frames_composed: u64,
}

impl PreviewState {
    fn resolve(&mut self, now: f64) {
        self.composition =
            resolve_composition(&self.definition, &self.customization, &self.options.bounds);
        self.playhead
            .set_duration(self.composition.duration_secs, now);
        self.tracker.reset();
    }

    fn compose(&mut self, t: f64) -> Frame {
        let frame = compose_frame(
            &self.composition,
            t,
            self.scale.scale(),
            &self.options.selector,
        );
        let duration = self.composition.duration_secs;
        for layer in &self.composition.layers {
            match self.tracker.observe(layer, t, duration) {
                VisibilityChange::Entered => {
                    tracing::trace!(layer = %layer.id, t, "Layer entered")
                }
                VisibilityChange::Exited => {
                    tracing::trace!(layer = %layer.id, t, "Layer exited")
                }
                VisibilityChange::Steady | VisibilityChange::Hidden => {}
            }
        }
        self.frames_composed += 1;
        self.last_frame = Some(frame.clone());
        frame
    }

    fn on_frame(&mut self, tick: FrameTick) {
        let t = self.playhead.advance(tick.now_secs);
        self.compose(t);
    }
}

/// A mounted template preview.
pub struct Previewer {
    state: Rc<RefCell<PreviewState>>,
    clock: Box<dyn Clock>,
    subscription: Option<FrameSubscription>,
}

impl std::fmt::Debug for Previewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Previewer")
            .field("template", &state.definition.id)
            .field("playback", &state.playhead.state())
            .field("scale", &state.scale.scale())
            .field("mounted", &self.subscription.is_some())
            .finish()
    }
}

impl Previewer {
    /// Mount a preview of `definition` on `frame_loop`.
    pub fn mount(
        definition: TemplateDefinition,
        customization: Customization,
        options: PreviewOptions,
        frame_loop: &FrameLoop,
        clock: Box<dyn Clock>,
    ) -> Result<Self, PreviewError> {
        let composition = resolve_composition(&definition, &customization, &options.bounds);
        let mut scale = ScaleMapper::new(definition.canvas())?;
        if let Some(width) = options.container_width {
            scale.resize(width)?;
        }
        let playhead =
            Playhead::new(composition.duration_secs).with_loop(options.loop_playback);

        tracing::info!(
            template = %definition.id,
            duration_secs = composition.duration_secs,
            theme = ?composition.theme_id,
            layers = composition.layers.len(),
            "Mounted previewer"
        );

        let state = Rc::new(RefCell::new(PreviewState {
            definition,
            customization,
            options,
            composition,
            playhead,
            scale,
            tracker: VisibilityTracker::new(),
            last_frame: None,
            frames_composed: 0,
        }));

        let frame_state = Rc::clone(&state);
        let subscription = frame_loop.subscribe(move |tick| {
            // A host call in progress holds the state; skip this frame.
            if let Ok(mut state) = frame_state.try_borrow_mut() {
                state.on_frame(tick);
            }
        });

        Ok(Self {
            state,
            clock,
            subscription: Some(subscription),
        })
    }

    /// Load a definition from disk and mount it. A missing or malformed
    /// file fails only this previewer.
    pub fn load(
        path: impl AsRef<Path>,
        customization: Customization,
        options: PreviewOptions,
        frame_loop: &FrameLoop,
        clock: Box<dyn Clock>,
    ) -> Result<Self, PreviewError> {
        let definition = TemplateDefinition::load(path)?;
        Self::mount(definition, customization, options, frame_loop, clock)
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    /// Stop frame callbacks and resize handling. Idempotent.
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.cancel();
            let state = self.state.borrow();
            tracing::info!(
                template = %state.definition.id,
                frames = state.frames_composed,
                "Unmounted previewer"
            );
        }
    }

    // --- customization events -------------------------------------------

    /// Replace the whole customization and re-resolve.
    pub fn set_customization(&mut self, customization: Customization) {
        self.update(|c| *c = customization);
    }

    pub fn set_theme(&mut self, theme_id: impl Into<String>) {
        let theme_id = theme_id.into();
        self.update(|c| c.theme_id = Some(theme_id));
    }

    pub fn set_duration(&mut self, secs: f64) {
        self.update(|c| c.duration_seconds = Some(secs));
    }

    pub fn set_placeholder(&mut self, id: impl Into<String>, value: impl Into<String>) {
        let (id, value) = (id.into(), value.into());
        self.update(|c| c.set(id, value));
    }

    fn update(&mut self, change: impl FnOnce(&mut Customization)) {
        let now = self.clock.now_secs();
        let mut state = self.state.borrow_mut();
        change(&mut state.customization);
        state.resolve(now);
    }

    // --- resize ------------------------------------------------------------

    /// Container width changed. Returns whether the scale changed. After
    /// unmount this does nothing.
    pub fn on_resize(&mut self, container_width: f64) -> Result<bool, PreviewError> {
        if !self.is_mounted() {
            return Ok(false);
        }
        Ok(self.state.borrow_mut().scale.resize(container_width)?)
    }

    // --- transport -----------------------------------------------------------

    pub fn play(&mut self) {
        let now = self.clock.now_secs();
        self.state.borrow_mut().playhead.play(now);
    }

    pub fn pause(&mut self) {
        let now = self.clock.now_secs();
        self.state.borrow_mut().playhead.pause(now);
    }

    pub fn toggle(&mut self) {
        let now = self.clock.now_secs();
        self.state.borrow_mut().playhead.toggle(now);
    }

    /// Jump to `t` and compose that frame immediately.
    pub fn scrub_to(&mut self, t: f64) -> Frame {
        let now = self.clock.now_secs();
        let mut state = self.state.borrow_mut();
        let t = state.playhead.scrub_to(t, now);
        state.compose(t)
    }

    pub fn begin_scrub(&mut self) {
        let now = self.clock.now_secs();
        self.state.borrow_mut().playhead.begin_scrub(now);
    }

    pub fn end_scrub(&mut self) {
        let now = self.clock.now_secs();
        self.state.borrow_mut().playhead.end_scrub(now);
    }

    // --- queries -------------------------------------------------------------

    pub fn playback(&self) -> PlaybackState {
        self.state.borrow().playhead.state()
    }

    pub fn current_time(&self) -> f64 {
        self.state.borrow().playhead.current_time()
    }

    pub fn scale(&self) -> f64 {
        self.state.borrow().scale.scale()
    }

    /// The most recently composed frame.
    pub fn last_frame(&self) -> Option<Frame> {
        self.state.borrow().last_frame.clone()
    }

    /// Compose the frame at the current time without advancing.
    pub fn frame(&self) -> Frame {
        let mut state = self.state.borrow_mut();
        let t = state.playhead.current_time();
        state.compose(t)
    }

    /// A copy of the current resolved composition.
    pub fn composition(&self) -> ResolvedComposition {
        self.state.borrow().composition.clone()
    }

    pub fn customization(&self) -> Customization {
        self.state.borrow().customization.clone()
    }

    pub fn frames_composed(&self) -> u64 {
        self.state.borrow().frames_composed
    }
}

impl Drop for Previewer {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karo_common::ManualClock;

    fn mount(frame_loop: &FrameLoop, clock: &ManualClock) -> Previewer {
        Previewer::mount(
            TemplateDefinition::starter("starter", "Starter"),
            Customization::new().with_value("headline", "Hi"),
            PreviewOptions::default(),
            frame_loop,
            Box::new(clock.clone()),
        )
        .unwrap()
    }

    #[test]
    fn test_frames_advance_while_playing() {
        let frame_loop = FrameLoop::new();
        let clock = ManualClock::new();
        let mut previewer = mount(&frame_loop, &clock);

        previewer.play();
        clock.advance(1.0);
        frame_loop.tick(clock.now_secs());

        assert!((previewer.current_time() - 1.0).abs() < 1e-9);
        let frame = previewer.last_frame().unwrap();
        assert_eq!(frame.layer_ids(), vec!["bg", "logo", "headline"]);
    }

    #[test]
    fn test_customization_change_applies_before_next_frame() {
        let frame_loop = FrameLoop::new();
        let clock = ManualClock::new();
        let mut previewer = mount(&frame_loop, &clock);

        previewer.scrub_to(2.0);
        previewer.set_placeholder("headline", "Changed");
        previewer.set_theme("gold");
        frame_loop.tick(clock.now_secs());

        let frame = previewer.last_frame().unwrap();
        let headline = frame.layer("headline").unwrap();
        assert_eq!(headline.text.as_deref(), Some("Changed"));
        assert_eq!(headline.style["color"], serde_json::json!("#FFD700"));
    }

    #[test]
    fn test_duration_change_clamps_playhead() {
        let frame_loop = FrameLoop::new();
        let clock = ManualClock::new();
        let mut previewer = mount(&frame_loop, &clock);

        previewer.set_duration(30.0);
        previewer.scrub_to(25.0);
        previewer.set_duration(15.0);
        assert_eq!(previewer.playback().duration_secs, 15.0);
        assert_eq!(previewer.current_time(), 15.0);
    }

    #[test]
    fn test_resize_scales_frames_and_rejects_bad_widths() {
        let frame_loop = FrameLoop::new();
        let clock = ManualClock::new();
        let mut previewer = mount(&frame_loop, &clock);

        assert!(previewer.on_resize(540.0).unwrap());
        assert!(previewer.on_resize(-1.0).is_err());
        assert_eq!(previewer.scale(), 0.5);
        assert_eq!(previewer.frame().container.width, 540.0);
    }

    #[test]
    fn test_unmount_stops_callbacks_and_resizes() {
        let frame_loop = FrameLoop::new();
        let clock = ManualClock::new();
        let mut previewer = mount(&frame_loop, &clock);
        previewer.play();

        frame_loop.tick(clock.now_secs());
        assert_eq!(previewer.frames_composed(), 1);

        previewer.unmount();
        assert_eq!(frame_loop.subscriber_count(), 0);
        clock.advance(1.0);
        frame_loop.tick(clock.now_secs());
        assert_eq!(previewer.frames_composed(), 1);

        assert!(!previewer.on_resize(540.0).unwrap());
        assert_eq!(previewer.scale(), 1.0);
        previewer.unmount();
    }

    #[test]
    fn test_previewers_are_independent() {
        let frame_loop = FrameLoop::new();
        let clock = ManualClock::new();
        let mut a = mount(&frame_loop, &clock);
        let b = mount(&frame_loop, &clock);

        a.play();
        clock.advance(2.0);
        frame_loop.tick(clock.now_secs());

        assert!((a.current_time() - 2.0).abs() < 1e-9);
        assert_eq!(b.current_time(), 0.0);
        drop(a);
        assert_eq!(frame_loop.subscriber_count(), 1);
    }

    #[test]
    fn test_missing_file_is_a_load_error() {
        let frame_loop = FrameLoop::new();
        let err = Previewer::load(
            "/nonexistent/karo/template.json",
            Customization::new(),
            PreviewOptions::default(),
            &frame_loop,
            Box::new(ManualClock::new()),
        )
        .unwrap_err();
        assert!(matches!(err, PreviewError::Load(_)));
        assert_eq!(frame_loop.subscriber_count(), 0);
    }
}
