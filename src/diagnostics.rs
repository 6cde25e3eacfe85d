// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Ordered diagnostic collection
//!
//! Messages are logged with `tracing::warn!` when produced and kept in
//! frames so an operator node can capture everything its subtree emitted
//! and store it next to the cached result.

use tracing::warn;

#[derive(Debug, Clone)]
pub struct Diagnostics {
    frames: Vec<Vec<String>>,
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::new()
    }
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            frames: vec![Vec::new()],
        }
    }

    /// Log a message and record it in the current frame
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.record(message);
    }

    fn record(&mut self, message: String) {
        if let Some(frame) = self.frames.last_mut() {
            frame.push(message);
        }
    }

    /// Start capturing messages for a subtree
    pub fn push_frame(&mut self) {
        self.frames.push(Vec::new());
    }

    /// Close the innermost frame.
    ///
    /// Its messages are kept in the enclosing frame as well and returned to
    /// the caller. The root frame is never popped.
    pub fn pop_frame(&mut self) -> Vec<String> {
        if self.frames.len() < 2 {
            return Vec::new();
        }
        let frame = self.frames.pop().unwrap_or_default();
        if let Some(parent) = self.frames.last_mut() {
            parent.extend(frame.iter().cloned());
        }
        frame
    }

    /// Record stored messages again, optionally re-emitting them to the log
    pub fn replay(&mut self, messages: &[String], emit: bool) {
        for message in messages {
            if emit {
                warn!("{}", message);
            }
            self.record(message.clone());
        }
    }

    /// Messages recorded so far in the current frame
    pub fn messages(&self) -> &[String] {
        self.frames.last().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.frames.iter().all(Vec::is_empty)
    }

    /// All messages in emission order, closing any open frames
    pub fn into_messages(mut self) -> Vec<String> {
        while self.frames.len() > 1 {
            self.pop_frame();
        }
        self.frames.pop().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_flow_into_parent() {
        let mut diag = Diagnostics::new();
        diag.warn("outer");
        diag.push_frame();
        diag.warn("inner");
        assert_eq!(diag.messages(), ["inner".to_string()]);

        let captured = diag.pop_frame();
        assert_eq!(captured, vec!["inner".to_string()]);
        assert_eq!(diag.into_messages(), vec!["outer".to_string(), "inner".to_string()]);
    }

    #[test]
    fn test_root_frame_survives_pop() {
        let mut diag = Diagnostics::new();
        diag.warn("kept");
        assert!(diag.pop_frame().is_empty());
        assert_eq!(diag.messages().len(), 1);
    }

    #[test]
    fn test_replay_appends() {
        let mut diag = Diagnostics::new();
        diag.replay(&["a".to_string(), "b".to_string()], false);
        assert_eq!(diag.into_messages(), vec!["a".to_string(), "b".to_string()]);
    }
}
