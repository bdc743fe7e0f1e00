//! Attribute parser for the line protocol
//!
//! A command line is a list of space separated `key:value` tokens, e.g.
//! `x:10 y:20 w:300 h:200 r:0 g:0.5 b:1 s:2`. Tokens that do not parse are
//! dropped and the rest of the command proceeds with defaults.

use crate::style::{BorderStyle, Rgba};

/// Stroke width used when a command names none
pub const DEFAULT_STROKE: f64 = 4.0;

/// Extra corner radius on top of the stroke width when `rad` is not given
pub const RADIUS_PADDING: f64 = 4.0;

/// Node frame as given by the caller (origin top-left, y-down)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameAttrs {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

/// Stroke attributes after defaulting
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeAttrs {
    pub size: f64,
    pub rad: f64,
}

/// Everything one command line describes
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttributeBundle {
    pub frame: FrameAttrs,
    pub color: Rgba,
    pub stroke: StrokeAttrs,
}

impl Default for AttributeBundle {
    fn default() -> Self {
        Self::parse_tokens(std::iter::empty::<&str>())
    }
}

impl AttributeBundle {
    /// Parse a whole command line.
    ///
    /// The line is split on single spaces only, so runs of spaces yield empty
    /// tokens, which are ignored like any other token without a colon.
    pub fn parse_line(line: &str) -> Self {
        Self::parse_tokens(line.split(' '))
    }

    /// Parse an already tokenized command
    pub fn parse_tokens<'a, I>(tokens: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut frame = FrameAttrs::default();
        let mut color = Rgba::RED;
        let mut size = DEFAULT_STROKE;
        let mut rad = None;

        for (key, value) in tokens.into_iter().filter_map(split_token) {
            match key {
                "x" => frame.x = value,
                "y" => frame.y = value,
                "w" | "width" => frame.w = value,
                "h" | "height" => frame.h = value,
                "r" | "red" => color.r = value,
                "g" | "green" => color.g = value,
                "b" | "blue" => color.b = value,
                "a" | "alpha" => color.a = value,
                "s" | "stroke" => size = value,
                "rad" => rad = Some(value),
                _ => {}
            }
        }

        Self {
            frame,
            color,
            stroke: StrokeAttrs {
                size,
                rad: rad.unwrap_or(size + RADIUS_PADDING),
            },
        }
    }

    pub fn style(&self) -> BorderStyle {
        BorderStyle::new(self.color, self.stroke.size, self.stroke.rad)
    }
}

/// Split `key:value` at the first colon and parse the trimmed value.
fn split_token(token: &str) -> Option<(&str, f64)> {
    let (key, value) = token.split_once(':')?;
    let value = value.trim().parse::<f64>().ok()?;
    Some((key, value))
}
