//! Viewport state machine: current page and zoom scale

use serde::Serialize;

use crate::content::PageDomain;

/// Current page and zoom scale of the interactive view
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ViewportState {
    /// Current page number, `None` while no pages are loaded
    pub current_page: Option<u32>,
    /// Zoom scale, always within `[MIN_SCALE, MAX_SCALE]`
    pub scale: f32,
}

impl Default for ViewportState {
    fn default() -> Self {
        Self {
            current_page: None,
            scale: Self::DEFAULT_SCALE,
        }
    }
}

impl ViewportState {
    /// Lower zoom bound
    pub const MIN_SCALE: f32 = 0.5;
    /// Upper zoom bound
    pub const MAX_SCALE: f32 = 3.0;
    /// Additive zoom step
    pub const ZOOM_STEP: f32 = 0.25;
    /// Product default working scale, restored by `ResetZoom`
    pub const DEFAULT_SCALE: f32 = 1.5;

    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Zoom as a whole percentage
    #[must_use]
    pub fn zoom_percent(&self) -> u32 {
        (self.scale * 100.0).round() as u32
    }

    #[must_use]
    pub fn can_zoom_in(&self) -> bool {
        self.scale < Self::MAX_SCALE
    }

    #[must_use]
    pub fn can_zoom_out(&self) -> bool {
        self.scale > Self::MIN_SCALE
    }

    /// Clamp to the zoom bounds, handling NaN/Inf
    #[must_use]
    pub fn clamp_scale(scale: f32) -> f32 {
        if scale.is_finite() {
            scale.clamp(Self::MIN_SCALE, Self::MAX_SCALE)
        } else {
            Self::DEFAULT_SCALE
        }
    }

    /// Apply a command and return resulting effects
    #[must_use]
    pub fn apply<D>(&mut self, cmd: Command, domain: &D) -> Vec<Effect>
    where
        D: PageDomain + ?Sized,
    {
        match cmd {
            Command::GoToPage(page) => self.go_to_page(page, domain),

            Command::NextPage => match self.current_page.and_then(|p| domain.next_page_after(p)) {
                Some(next) => self.go_to_page(next, domain),
                None => vec![],
            },

            Command::PrevPage => match self.current_page.and_then(|p| domain.prev_page_before(p)) {
                Some(prev) => self.go_to_page(prev, domain),
                None => vec![],
            },

            Command::ZoomIn => self.set_scale(self.scale + Self::ZOOM_STEP),
            Command::ZoomOut => self.set_scale(self.scale - Self::ZOOM_STEP),
            Command::ResetZoom => self.set_scale(Self::DEFAULT_SCALE),
            Command::SetScale(scale) => self.set_scale(scale),

            Command::PagesReplaced => {
                self.current_page = domain.first_page();
                let mut effects = vec![Effect::ClearSelection, Effect::ClearPageError];
                if self.current_page.is_some() {
                    effects.push(Effect::RenderCurrentPage);
                }
                effects
            }

            Command::Reset => {
                *self = Self::default();
                vec![Effect::ClearSelection, Effect::ClearPageError]
            }
        }
    }

    fn go_to_page<D>(&mut self, page: u32, domain: &D) -> Vec<Effect>
    where
        D: PageDomain + ?Sized,
    {
        if !domain.contains_page(page) || self.current_page == Some(page) {
            return vec![];
        }

        self.current_page = Some(page);
        vec![
            Effect::ClearSelection,
            Effect::ClearPageError,
            Effect::RenderCurrentPage,
        ]
    }

    fn set_scale(&mut self, scale: f32) -> Vec<Effect> {
        let clamped = Self::clamp_scale(scale);
        if (self.scale - clamped).abs() > f32::EPSILON {
            self.scale = clamped;
            vec![Effect::RenderCurrentPage]
        } else {
            vec![]
        }
    }
}

/// Commands that modify viewport state
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Navigate to a page number; ignored unless it is in the page domain
    GoToPage(u32),
    /// Step to the next page number in the domain
    NextPage,
    /// Step to the previous page number in the domain
    PrevPage,
    ZoomIn,
    ZoomOut,
    ResetZoom,
    SetScale(f32),
    /// The page list was replaced; jump to its first page
    PagesReplaced,
    /// The source document changed; return to defaults
    Reset,
}

/// Effects produced by state changes
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    /// Drop the current selection and any open edit
    ClearSelection,
    /// Dismiss a page-scoped error
    ClearPageError,
    /// Render the current page at the current scale
    RenderCurrentPage,
}
