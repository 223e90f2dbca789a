//! `WindowEvent`: the tagged payload produced by window backends and
//! consumed by routines/nodes awaiting input.
//!
//! Twelve event kinds, five payload shapes, a timestamp on every event. A
//! closed payload enum per event family, rather than one flat struct with
//! optional fields for every variant's data.

use crate::key::Key;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResizeData {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyData {
    pub key: Key,
    pub scancode: i32,
    pub mods: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MousePosData {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MouseButtonData {
    pub button: u32,
    pub mods: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollData {
    pub x_offset: f64,
    pub y_offset: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowEventKind {
    WindowResized(ResizeData),
    WindowClosed,
    WindowFocusGained,
    WindowFocusLost,
    FramebufferResized(ResizeData),
    KeyPressed(KeyData),
    KeyReleased(KeyData),
    KeyRepeat(KeyData),
    MouseMoved(MousePosData),
    MouseButtonPressed(MouseButtonData),
    MouseButtonReleased(MouseButtonData),
    MouseScrolled(ScrollData),
}

/// A timestamped `WindowEvent`, as it sits in `WindowManager`'s queue.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowEvent {
    pub kind: WindowEventKind,
    /// Seconds since an arbitrary epoch fixed at `WindowManager` creation;
    /// never derived from the wall clock inside this crate so the type
    /// stays deterministic and test-friendly.
    pub timestamp: f64,
}

impl WindowEvent {
    pub fn new(kind: WindowEventKind, timestamp: f64) -> Self {
        Self { kind, timestamp }
    }

    /// The `EventSource` name this event's kind signals under, for
    /// routines awaiting a specific input channel by name rather than
    /// polling `WindowManager`'s queue directly.
    pub fn event_name(&self) -> &'static str {
        match self.kind {
            WindowEventKind::WindowResized(_) => "window.resized",
            WindowEventKind::WindowClosed => "window.closed",
            WindowEventKind::WindowFocusGained => "window.focus_gained",
            WindowEventKind::WindowFocusLost => "window.focus_lost",
            WindowEventKind::FramebufferResized(_) => "window.framebuffer_resized",
            WindowEventKind::KeyPressed(_) => "key.pressed",
            WindowEventKind::KeyReleased(_) => "key.released",
            WindowEventKind::KeyRepeat(_) => "key.repeat",
            WindowEventKind::MouseMoved(_) => "mouse.moved",
            WindowEventKind::MouseButtonPressed(_) => "mouse.button_pressed",
            WindowEventKind::MouseButtonReleased(_) => "mouse.button_released",
            WindowEventKind::MouseScrolled(_) => "mouse.scrolled",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_name_is_stable_per_kind() {
        let e = WindowEvent::new(WindowEventKind::KeyPressed(KeyData { key: Key::SPACE, scancode: 57, mods: 0 }), 0.0);
        assert_eq!(e.event_name(), "key.pressed");
    }
}
