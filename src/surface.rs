//! The presentation port. The session drives a [`Surface`] without knowing
//! whether it is a terminal, a window or a test double.

use crate::presenter::Banner;
use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::trace;

pub trait Surface {
    fn set_status(&mut self, text: &str);
    /// Shows the progress indicator filled to `percent` (0-100).
    fn show_progress(&mut self, percent: f64);
    /// Hides the progress indicator and resets its fill to 0%.
    fn hide_progress(&mut self);
    fn show_banner(&mut self, banner: &Banner);
    fn clear_banner(&mut self);
    fn set_drag_active(&mut self, active: bool);
}

/// Renders to the terminal: status lines on stderr, an indicatif bar for the
/// fill, and the banner on stdout.
pub struct TerminalSurface {
    bar: Option<ProgressBar>,
    style: ProgressStyle,
    print_banner: bool,
}

impl TerminalSurface {
    pub fn new(print_banner: bool) -> Result<Self> {
        let style = ProgressStyle::default_bar()
            .template("{bar:40} {pos:>3}%")?
            .progress_chars("=>-");
        Ok(Self {
            bar: None,
            style,
            print_banner,
        })
    }

    fn print(&self, line: impl FnOnce()) {
        match &self.bar {
            Some(bar) => bar.suspend(line),
            None => line(),
        }
    }
}

impl Surface for TerminalSurface {
    fn set_status(&mut self, text: &str) {
        self.print(|| eprintln!("{text}"));
    }

    fn show_progress(&mut self, percent: f64) {
        let style = &self.style;
        let bar = self.bar.get_or_insert_with(|| {
            let bar = ProgressBar::new(100);
            bar.set_style(style.clone());
            bar
        });
        bar.set_position(percent.clamp(0.0, 100.0).round() as u64);
    }

    fn hide_progress(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }

    fn show_banner(&mut self, banner: &Banner) {
        if self.print_banner {
            self.print(|| println!("{banner}"));
        }
    }

    fn clear_banner(&mut self) {}

    fn set_drag_active(&mut self, active: bool) {
        trace!(active, "drag indicator");
    }
}

/// Headless surface that remembers everything pushed into it.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    pub status: String,
    pub status_history: Vec<String>,
    pub progress_visible: bool,
    pub progress_percent: f64,
    /// Every fill value shown, in order.
    pub progress_history: Vec<f64>,
    pub banner: Option<Banner>,
    pub drag_active: bool,
}

impl Surface for RecordingSurface {
    fn set_status(&mut self, text: &str) {
        self.status = text.to_string();
        self.status_history.push(text.to_string());
    }

    fn show_progress(&mut self, percent: f64) {
        self.progress_visible = true;
        self.progress_percent = percent;
        self.progress_history.push(percent);
    }

    fn hide_progress(&mut self) {
        self.progress_visible = false;
        self.progress_percent = 0.0;
    }

    fn show_banner(&mut self, banner: &Banner) {
        self.banner = Some(banner.clone());
    }

    fn clear_banner(&mut self) {
        self.banner = None;
    }

    fn set_drag_active(&mut self, active: bool) {
        self.drag_active = active;
    }
}
