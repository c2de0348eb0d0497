//! The scrolling page the scene sits behind. A full-height hero area keeps the
//! computer in view while the zoom stages play out, then the about section
//! slides up over it.

/// About section top, in viewport heights from the top of the page.
pub const ABOUT_TOP_VIEWPORTS: f32 = 3.4;
pub const ABOUT_HEIGHT_VIEWPORTS: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Section {
    top: f32,
    height: f32,
}

#[derive(Debug, Clone)]
pub struct PageModel {
    viewport_height: f32,
    scroll: f32,
    has_about: bool,
    about: Option<Section>,
}

impl PageModel {
    pub fn new(viewport_height: f32) -> Self {
        let mut page = Self {
            viewport_height: 1.0,
            scroll: 0.0,
            has_about: true,
            about: None,
        };
        page.resize(viewport_height);
        page
    }

    /// Page with only the hero area, as if the about markup were missing.
    pub fn without_about(viewport_height: f32) -> Self {
        let mut page = Self {
            viewport_height: 1.0,
            scroll: 0.0,
            has_about: false,
            about: None,
        };
        page.resize(viewport_height);
        page
    }

    /// Lays the sections out for a new viewport height, keeping the scroll
    /// offset where the page allows it.
    pub fn resize(&mut self, viewport_height: f32) {
        let height = viewport_height.max(1.0);
        self.viewport_height = height;
        self.about = self.has_about.then(|| Section {
            top: ABOUT_TOP_VIEWPORTS * height,
            height: ABOUT_HEIGHT_VIEWPORTS * height,
        });
        self.scroll = self.scroll.clamp(0.0, self.max_scroll());
    }

    pub fn document_height(&self) -> f32 {
        match self.about {
            Some(section) => section.top + section.height,
            None => self.viewport_height,
        }
    }

    pub fn max_scroll(&self) -> f32 {
        (self.document_height() - self.viewport_height).max(0.0)
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    /// Returns `true` when the offset actually moved.
    pub fn scroll_to(&mut self, offset: f32) -> bool {
        let clamped = if offset.is_finite() {
            offset.clamp(0.0, self.max_scroll())
        } else {
            self.scroll
        };
        let moved = clamped != self.scroll;
        self.scroll = clamped;
        moved
    }

    pub fn scroll_by(&mut self, delta: f32) -> bool {
        self.scroll_to(self.scroll + delta)
    }

    /// Top edge of the about section relative to the viewport.
    pub fn about_section_top(&self) -> Option<f32> {
        self.about.map(|section| section.top - self.scroll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_clamps_to_document() {
        let mut page = PageModel::new(1000.0);
        assert_eq!(page.max_scroll(), 3900.0);
        assert!(!page.scroll_by(-50.0));
        assert!(page.scroll_to(10_000.0));
        assert_eq!(page.scroll(), 3900.0);
        assert!(!page.scroll_to(f32::NAN));
    }

    #[test]
    fn about_top_tracks_scroll() {
        let mut page = PageModel::new(800.0);
        assert_eq!(page.about_section_top(), Some(2720.0));
        page.scroll_to(2400.0);
        assert_eq!(page.about_section_top(), Some(320.0));
    }

    #[test]
    fn resize_keeps_scroll_within_new_bounds() {
        let mut page = PageModel::new(1000.0);
        page.scroll_to(3900.0);
        page.resize(500.0);
        assert_eq!(page.scroll(), 1950.0);
    }

    #[test]
    fn page_without_about_has_no_section() {
        let mut page = PageModel::without_about(700.0);
        assert_eq!(page.about_section_top(), None);
        assert!(!page.scroll_by(100.0));
        page.resize(900.0);
        assert_eq!(page.about_section_top(), None);
    }
}
