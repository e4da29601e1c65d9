//! Presentation Hooks
//!
//! Prompt life-cycle calls the engine makes directly. Everything else the UI
//! needs (animations, tier feedback) is carried by [`QteEvent`](crate::qte::events::QteEvent)s.

use tracing::debug;

use crate::qte::spec::{InputBinding, PromptIcon};

/// Prompt renderer.
pub trait Presentation {
    /// Show the prompt for the target input.
    fn show_prompt(&mut self, target: &InputBinding, icon: Option<&PromptIcon>);

    /// Switch the prompt between its idle and pressed icon.
    fn set_prompt_pressed(&mut self, pressed: bool);

    /// Remove the prompt.
    fn hide_prompt(&mut self);
}

/// Headless presentation that only logs.
#[derive(Debug, Default)]
pub struct LogPresentation {
    visible: Option<String>,
}

impl LogPresentation {
    /// Handle of the visible prompt.
    pub fn visible(&self) -> Option<&str> {
        self.visible.as_deref()
    }
}

impl Presentation for LogPresentation {
    fn show_prompt(&mut self, target: &InputBinding, icon: Option<&PromptIcon>) {
        debug!(input = %target.handle, icon = icon.map(|i| i.idle.as_str()), "prompt shown");
        self.visible = Some(target.handle.to_string());
    }

    fn set_prompt_pressed(&mut self, pressed: bool) {
        debug!(pressed, "prompt icon changed");
    }

    fn hide_prompt(&mut self) {
        if let Some(handle) = self.visible.take() {
            debug!(input = %handle, "prompt hidden");
        }
    }
}
