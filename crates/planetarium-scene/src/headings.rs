//! Heading labels that slide vertically in step with the orbit.
//!
//! Headings are stacked in a column, one heading height apart, and viewed
//! through a band one heading tall. Every heading carries its own vertical
//! offset in percent of the heading height; the carousel moves them together.

use planetarium_config::HeadingsConfig;
use planetarium_render::ScreenRect;

/// Where one heading is drawn this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HeadingLayout {
    pub index: usize,
    pub rect: ScreenRect,
    /// The band the heading is visible through.
    pub clip: ScreenRect,
}

/// Ordered heading labels and their offsets.
#[derive(Clone, Debug)]
pub struct HeadingSet {
    labels: Vec<String>,
    offsets: Vec<f32>,
    top_margin: f32,
}

impl HeadingSet {
    /// Creates a heading set with every offset at zero.
    pub fn new(labels: Vec<String>, top_margin: f32) -> Self {
        let offsets = vec![0.0; labels.len()];
        Self {
            labels,
            offsets,
            top_margin,
        }
    }

    /// Creates the heading set described by `config`.
    pub fn from_config(config: &HeadingsConfig) -> Self {
        Self::new(config.labels.clone(), config.top_margin)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Returns the labels in display order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Offset of heading `index`, percent.
    pub fn offset(&self, index: usize) -> Option<f32> {
        self.offsets.get(index).copied()
    }

    /// Returns every heading offset, percent.
    pub fn offsets(&self) -> &[f32] {
        &self.offsets
    }

    /// Sets heading `index`'s offset. Out-of-range indices are ignored.
    pub fn set_offset(&mut self, index: usize, percent: f32) {
        if let Some(offset) = self.offsets.get_mut(index) {
            *offset = percent;
        }
    }

    /// Heading whose slot is closest to the band, by its own offset.
    pub fn front_index(&self) -> Option<usize> {
        self.offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| (i, (i as f32 * 100.0 + offset).abs()))
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(i, _)| i)
    }

    /// Screen rectangles for a `viewport`-sized surface, given each label's
    /// rasterized size in physical pixels.
    ///
    /// The top margin is in logical pixels. Headings are centred
    /// horizontally and the band is as tall as the tallest label. Headings
    /// entirely outside the band are omitted.
    pub fn layout(
        &self,
        viewport: (u32, u32),
        scale_factor: f32,
        label_sizes: &[(u32, u32)],
    ) -> Vec<HeadingLayout> {
        let band_height = label_sizes.iter().map(|s| s.1).max().unwrap_or(0) as f32;
        if band_height <= 0.0 {
            return Vec::new();
        }
        let band = ScreenRect::new(0.0, self.top_margin * scale_factor, viewport.0 as f32, band_height);

        self.offsets
            .iter()
            .zip(label_sizes)
            .enumerate()
            .filter_map(|(index, (offset, &(width, height)))| {
                let slot = index as f32 * 100.0 + offset;
                let y = band.y + slot / 100.0 * band_height + (band_height - height as f32) / 2.0;
                let x = (viewport.0 as f32 - width as f32) / 2.0;
                let rect = ScreenRect::new(x, y, width as f32, height as f32);
                rect.intersect(&band).map(|_| HeadingLayout {
                    index,
                    rect,
                    clip: band,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set() -> HeadingSet {
        HeadingSet::new(
            ["CSILLA", "EARTH", "VENUS", "VOLCANIC"].map(String::from).to_vec(),
            48.0,
        )
    }

    fn sizes() -> Vec<(u32, u32)> {
        vec![(384, 64), (320, 64), (320, 64), (512, 64)]
    }

    fn set_all(headings: &mut HeadingSet, percent: f32) {
        for i in 0..headings.len() {
            headings.set_offset(i, percent);
        }
    }

    #[test]
    fn test_initially_first_heading_in_band() {
        let headings = set();
        let layout = headings.layout((1280, 720), 1.0, &sizes());
        assert_eq!(layout.len(), 1);
        assert_eq!(layout[0].index, 0);
        assert_eq!(layout[0].rect, ScreenRect::new(448.0, 48.0, 384.0, 64.0));
        assert_eq!(headings.front_index(), Some(0));
    }

    #[test]
    fn test_offset_minus_100_shows_second_heading() {
        let mut headings = set();
        set_all(&mut headings, -100.0);
        let layout = headings.layout((1280, 720), 1.0, &sizes());
        assert_eq!(layout.iter().map(|l| l.index).collect::<Vec<_>>(), vec![1]);
        assert_eq!(headings.front_index(), Some(1));
    }

    #[test]
    fn test_mid_slide_shows_two_headings_clipped_to_band() {
        let mut headings = set();
        set_all(&mut headings, -50.0);
        let layout = headings.layout((1280, 720), 1.0, &sizes());
        assert_eq!(layout.iter().map(|l| l.index).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(layout[0].rect.y, 48.0 - 32.0);
        assert!(layout.iter().all(|l| l.clip == ScreenRect::new(0.0, 48.0, 1280.0, 64.0)));
    }

    #[test]
    fn test_wrap_offsets_show_expected_heading() {
        let mut headings = set();
        set_all(&mut headings, -300.0);
        let layout = headings.layout((1280, 720), 1.0, &sizes());
        assert_eq!(layout.iter().map(|l| l.index).collect::<Vec<_>>(), vec![3]);

        // Past the last heading nothing is in the band until the snap.
        set_all(&mut headings, -400.0);
        assert!(headings.layout((1280, 720), 1.0, &sizes()).is_empty());
    }

    #[test]
    fn test_margin_scales_with_dpi() {
        let layout = set().layout((2560, 1440), 2.0, &sizes());
        assert_eq!(layout[0].clip.y, 96.0);
    }

    #[test]
    fn test_no_sizes_no_layout() {
        assert!(set().layout((1280, 720), 1.0, &[]).is_empty());
    }

    #[test]
    fn test_set_offset_out_of_range_is_ignored() {
        let mut headings = set();
        headings.set_offset(7, -100.0);
        assert_eq!(headings.offsets(), &[0.0; 4]);
        assert_eq!(headings.offset(7), None);
    }
}
