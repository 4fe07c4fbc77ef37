//! Page-change protocol for the gallery.
//!
//! `Idle -> Exiting -> Loading -> Entering -> Idle`. Only one change can be
//! in flight; requests arriving meanwhile are dropped. Every load carries
//! the generation it was started for, and a completion from an older
//! generation is discarded.

use crate::gallery_layout::total_pages;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PagePhase {
    Idle,
    /// Waiting for `pending` exit animations.
    Exiting { pending: usize },
    /// Images for the current page are loading. `animate` is false for the
    /// first page and for jumps that had nothing on screen.
    Loading { animate: bool },
    /// Waiting for `pending` entry animations.
    Entering { pending: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadRequest {
    pub page: usize,
    pub generation: u64,
    pub animate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextPage {
    /// A change is already running.
    Ignored,
    /// Start exit animations on every displayed item.
    Exit,
    /// Nothing was displayed; load the new page straight away.
    Load(LoadRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Result of an older generation, drop it.
    Stale,
    /// Show the items at their final pose.
    Show,
    /// Show the items raised and hidden, then animate them in.
    Enter,
    /// Nothing to show.
    Empty,
}

#[derive(Debug, Clone)]
pub struct Pager {
    page: usize,
    page_size: usize,
    item_count: usize,
    generation: u64,
    phase: PagePhase,
}

impl Pager {
    pub fn new(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size: page_size.max(1),
            item_count: 0,
            generation: 0,
            phase: PagePhase::Idle,
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_pages(&self) -> usize {
        total_pages(self.item_count, self.page_size)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> PagePhase {
        self.phase
    }

    pub fn is_transitioning(&self) -> bool {
        self.phase != PagePhase::Idle
    }

    /// New content arrived: go back to page 0 and load it.
    pub fn reset(&mut self, item_count: usize) -> LoadRequest {
        self.item_count = item_count;
        self.page = 0;
        self.start_load(false)
    }

    fn start_load(&mut self, animate: bool) -> LoadRequest {
        self.generation += 1;
        self.phase = PagePhase::Loading { animate };
        LoadRequest {
            page: self.page,
            generation: self.generation,
            animate,
        }
    }

    fn advance(&mut self) {
        let total = self.total_pages();
        self.page = if total == 0 { 0 } else { (self.page + 1) % total };
    }

    pub fn request_next(&mut self, displayed: usize) -> NextPage {
        if self.is_transitioning() {
            log::debug!("Page change ignored, {:?} in progress", self.phase);
            return NextPage::Ignored;
        }
        if displayed == 0 {
            self.advance();
            log::info!("Page -> {} / {}", self.page + 1, self.total_pages().max(1));
            return NextPage::Load(self.start_load(false));
        }
        self.phase = PagePhase::Exiting { pending: displayed };
        NextPage::Exit
    }

    /// One exit animation finished. Once all are done the page advances and
    /// the returned request must be loaded; displayed items are dropped.
    pub fn exit_finished(&mut self) -> Option<LoadRequest> {
        let PagePhase::Exiting { pending } = self.phase else {
            return None;
        };
        if pending > 1 {
            self.phase = PagePhase::Exiting {
                pending: pending - 1,
            };
            return None;
        }
        self.advance();
        log::info!("Page -> {} / {}", self.page + 1, self.total_pages().max(1));
        Some(self.start_load(true))
    }

    pub fn page_loaded(&mut self, generation: u64, item_count: usize) -> LoadOutcome {
        let PagePhase::Loading { animate } = self.phase else {
            return LoadOutcome::Stale;
        };
        if generation != self.generation {
            return LoadOutcome::Stale;
        }
        if item_count == 0 {
            self.phase = PagePhase::Idle;
            return LoadOutcome::Empty;
        }
        if animate {
            self.phase = PagePhase::Entering {
                pending: item_count,
            };
            LoadOutcome::Enter
        } else {
            self.phase = PagePhase::Idle;
            LoadOutcome::Show
        }
    }

    /// A load failed; the page stays empty. Returns false for stale results.
    pub fn load_failed(&mut self, generation: u64) -> bool {
        if generation != self.generation || !matches!(self.phase, PagePhase::Loading { .. }) {
            return false;
        }
        self.phase = PagePhase::Idle;
        true
    }

    /// One entry animation finished. Returns true when the change is over.
    pub fn entry_finished(&mut self) -> bool {
        let PagePhase::Entering { pending } = self.phase else {
            return false;
        };
        if pending > 1 {
            self.phase = PagePhase::Entering {
                pending: pending - 1,
            };
            false
        } else {
            self.phase = PagePhase::Idle;
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loaded(pager: &mut Pager, count: usize) {
        let req = pager.reset(count);
        let on_page = count.min(pager.page_size());
        assert_eq!(pager.page_loaded(req.generation, on_page), LoadOutcome::Show);
    }

    #[test]
    fn first_load_is_not_animated() {
        let mut pager = Pager::new(8);
        let req = pager.reset(16);
        assert_eq!(req.page, 0);
        assert!(!req.animate);
        assert!(pager.is_transitioning());
        assert_eq!(pager.page_loaded(req.generation, 8), LoadOutcome::Show);
        assert_eq!(pager.phase(), PagePhase::Idle);
        assert_eq!(pager.total_pages(), 2);
    }

    #[test]
    fn full_cycle_with_animations() {
        let mut pager = Pager::new(8);
        loaded(&mut pager, 16);

        assert_eq!(pager.request_next(8), NextPage::Exit);
        for _ in 0..7 {
            assert_eq!(pager.exit_finished(), None);
        }
        let req = pager.exit_finished().expect("barrier released");
        assert_eq!(req.page, 1);
        assert!(req.animate);

        assert_eq!(pager.page_loaded(req.generation, 8), LoadOutcome::Enter);
        for _ in 0..7 {
            assert!(!pager.entry_finished());
        }
        assert!(pager.entry_finished());
        assert_eq!(pager.phase(), PagePhase::Idle);
        assert_eq!(pager.page(), 1);
    }

    #[test]
    fn second_request_during_change_is_ignored() {
        let mut pager = Pager::new(8);
        loaded(&mut pager, 16);
        assert_eq!(pager.request_next(8), NextPage::Exit);
        assert_eq!(pager.request_next(8), NextPage::Ignored);
        assert_eq!(pager.page(), 0);
        assert_eq!(pager.phase(), PagePhase::Exiting { pending: 8 });
    }

    #[test]
    fn page_wraps_around() {
        let mut pager = Pager::new(8);
        loaded(&mut pager, 9);
        pager.request_next(8);
        for _ in 0..8 {
            pager.exit_finished();
        }
        assert_eq!(pager.page(), 1);
        let gen = pager.generation();
        assert_eq!(pager.page_loaded(gen, 1), LoadOutcome::Enter);
        assert!(pager.entry_finished());

        pager.request_next(1);
        let req = pager.exit_finished().expect("single item barrier");
        assert_eq!(req.page, 0);
    }

    #[test]
    fn nothing_displayed_skips_exit() {
        let mut pager = Pager::new(8);
        let first = pager.reset(16);
        assert!(pager.load_failed(first.generation));
        match pager.request_next(0) {
            NextPage::Load(req) => {
                assert_eq!(req.page, 1);
                assert!(!req.animate);
                assert!(req.generation > first.generation);
            }
            other => panic!("expected direct load, got {other:?}"),
        }
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut pager = Pager::new(8);
        let old = pager.reset(16);
        let new = pager.reset(16);
        assert_eq!(pager.page_loaded(old.generation, 8), LoadOutcome::Stale);
        assert!(!pager.load_failed(old.generation));
        assert!(pager.is_transitioning());
        assert_eq!(pager.page_loaded(new.generation, 8), LoadOutcome::Show);
    }

    #[test]
    fn empty_page_returns_to_idle() {
        let mut pager = Pager::new(8);
        let req = pager.reset(0);
        assert_eq!(pager.page_loaded(req.generation, 0), LoadOutcome::Empty);
        assert_eq!(pager.phase(), PagePhase::Idle);
        assert_eq!(pager.total_pages(), 0);
        // No pages: advancing stays on page 0.
        assert!(matches!(pager.request_next(0), NextPage::Load(r) if r.page == 0));
    }

    #[test]
    fn stray_barrier_signals_are_ignored() {
        let mut pager = Pager::new(8);
        assert_eq!(pager.exit_finished(), None);
        assert!(!pager.entry_finished());
        assert_eq!(pager.phase(), PagePhase::Idle);
    }
}
