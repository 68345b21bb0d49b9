//! Full-screen loading panel shown until every asset has resolved.

use planetarium_assets::LoadingEvent;

/// Seconds the panel takes to fade out.
pub const FADE_OUT_SECONDS: f32 = 0.5;

#[derive(Clone, Copy, Debug, PartialEq)]
enum OverlayPhase {
    Visible,
    FadingOut { elapsed: f32 },
    Hidden,
}

/// Loading panel state driven by [`LoadingEvent`]s.
#[derive(Clone, Debug)]
pub struct LoadingOverlay {
    phase: OverlayPhase,
    loaded: usize,
    total: usize,
    label_dirty: bool,
}

impl LoadingOverlay {
    /// Returns a visible overlay with no progress yet.
    pub fn new() -> Self {
        Self {
            phase: OverlayPhase::Visible,
            loaded: 0,
            total: 0,
            label_dirty: true,
        }
    }

    /// Updates progress from a tracker event. `Loaded` starts the fade.
    pub fn on_event(&mut self, event: &LoadingEvent) {
        match event {
            LoadingEvent::Started { loaded, total, .. } | LoadingEvent::Progress { loaded, total, .. } => {
                if (self.loaded, self.total) != (*loaded, *total) {
                    self.loaded = *loaded;
                    self.total = *total;
                    self.label_dirty = true;
                }
            }
            LoadingEvent::Error { .. } => {}
            LoadingEvent::Loaded => {
                if self.phase == OverlayPhase::Visible {
                    tracing::debug!("loading overlay fading out");
                    self.phase = OverlayPhase::FadingOut { elapsed: 0.0 };
                }
            }
        }
    }

    /// Advance the fade.
    pub fn update(&mut self, dt: f32) {
        if let OverlayPhase::FadingOut { elapsed } = self.phase {
            let elapsed = elapsed + dt.max(0.0);
            self.phase = if elapsed >= FADE_OUT_SECONDS {
                OverlayPhase::Hidden
            } else {
                OverlayPhase::FadingOut { elapsed }
            };
        }
    }

    /// Panel opacity in `0.0..=1.0`.
    pub fn opacity(&self) -> f32 {
        match self.phase {
            OverlayPhase::Visible => 1.0,
            OverlayPhase::FadingOut { elapsed } => 1.0 - elapsed / FADE_OUT_SECONDS,
            OverlayPhase::Hidden => 0.0,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.phase != OverlayPhase::Hidden
    }

    /// Progress line shown on the panel.
    pub fn label(&self) -> String {
        if self.total == 0 {
            "LOADING".to_string()
        } else {
            format!("LOADING {}/{}", self.loaded, self.total)
        }
    }

    /// Whether the label changed since the last call.
    pub fn take_label_dirty(&mut self) -> bool {
        std::mem::take(&mut self.label_dirty)
    }
}

impl Default for LoadingOverlay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress(loaded: usize, total: usize) -> LoadingEvent {
        LoadingEvent::Progress {
            label: "stars.jpg".into(),
            loaded,
            total,
        }
    }

    #[test]
    fn test_starts_visible_with_generic_label() {
        let mut overlay = LoadingOverlay::new();
        assert!(overlay.is_visible());
        assert_eq!(overlay.opacity(), 1.0);
        assert_eq!(overlay.label(), "LOADING");
        assert!(overlay.take_label_dirty());
        assert!(!overlay.take_label_dirty());
    }

    #[test]
    fn test_progress_updates_label() {
        let mut overlay = LoadingOverlay::new();
        overlay.take_label_dirty();
        overlay.on_event(&progress(2, 6));
        assert_eq!(overlay.label(), "LOADING 2/6");
        assert!(overlay.take_label_dirty());
        overlay.on_event(&progress(2, 6));
        assert!(!overlay.take_label_dirty());
    }

    #[test]
    fn test_fades_out_after_loaded() {
        let mut overlay = LoadingOverlay::new();
        overlay.update(1.0);
        assert_eq!(overlay.phase, OverlayPhase::Visible);

        overlay.on_event(&LoadingEvent::Loaded);
        overlay.update(0.25);
        assert!((overlay.opacity() - 0.5).abs() < 1e-6);
        assert!(overlay.is_visible());

        overlay.update(0.25);
        assert_eq!(overlay.phase, OverlayPhase::Hidden);
        assert_eq!(overlay.opacity(), 0.0);
    }

    #[test]
    fn test_errors_do_not_hide_the_panel() {
        let mut overlay = LoadingOverlay::new();
        overlay.on_event(&LoadingEvent::Error {
            label: "earth/map.jpg".into(),
        });
        overlay.update(1.0);
        assert!(overlay.is_visible());
    }
}
