use crate::widget::ChatWidget;

/// Top-level application state: the studio info screen plus the chat
/// widget overlay. All mutation happens on the event loop.
pub struct App {
    pub should_quit: bool,
    pub widget: ChatWidget,
}

impl App {
    pub fn new(widget: ChatWidget) -> Self {
        Self {
            should_quit: false,
            widget,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
