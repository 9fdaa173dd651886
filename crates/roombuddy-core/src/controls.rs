//! Button-driven LED control
//!
//! The board has two push buttons and two RGB LEDs. The main LED is driven by
//! the buttons, the info LED mirrors the current [`QualityLevel`]. Which action
//! a press triggers depends only on the current state, so there is no handler
//! table to swap at runtime.

use log::debug;

use crate::metrics::{LedColor, QualityLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    Red,
    Black,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MainLed {
    #[default]
    Off,
    Red,
}

impl MainLed {
    pub const fn color(self) -> LedColor {
        match self {
            Self::Off => LedColor::OFF,
            Self::Red => LedColor::RED,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LedController {
    main: MainLed,
    info: LedColor,
}

impl LedController {
    pub const fn new() -> Self {
        Self {
            main: MainLed::Off,
            info: LedColor::OFF,
        }
    }

    /// Apply a button press and return the new main LED state.
    ///
    /// Red toggles between off and red, black always turns the LED off.
    pub fn press(&mut self, button: Button) -> MainLed {
        self.main = match (self.main, button) {
            (MainLed::Off, Button::Red) => MainLed::Red,
            (MainLed::Red, Button::Red) | (_, Button::Black) => MainLed::Off,
        };
        debug!("{:?} button pressed, main LED {:?}", button, self.main);
        self.main
    }

    /// Show `quality` on the info LED, or switch it off when unknown.
    pub fn show_quality(&mut self, quality: Option<QualityLevel>) -> LedColor {
        self.info = quality.map_or(LedColor::OFF, QualityLevel::led_color);
        self.info
    }

    pub fn main(&self) -> MainLed {
        self.main
    }

    pub fn info(&self) -> LedColor {
        self.info
    }
}
