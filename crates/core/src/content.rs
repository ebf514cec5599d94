// SPDX-License-Identifier: MIT

//! Content cursors and playlist link construction

use crate::rule::Subject;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-subject progress through a content playlist
///
/// `delivered` is the 0-based count of items already delivered; it only
/// ever moves forward, by exactly one per committed batch inclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentCursor {
    pub subject: Subject,
    pub delivered: u32,
}

impl ContentCursor {
    pub fn new(subject: impl Into<Subject>) -> Self {
        Self {
            subject: subject.into(),
            delivered: 0,
        }
    }

    pub fn at(subject: impl Into<Subject>, delivered: u32) -> Self {
        Self {
            subject: subject.into(),
            delivered,
        }
    }

    /// 0-based index of the next item to deliver
    pub fn next_index(&self) -> u32 {
        self.delivered
    }

    pub fn advance(&mut self) {
        self.delivered += 1;
    }
}

/// Subject-to-playlist mapping used to turn a batch entry into a link
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentLibrary {
    playlists: BTreeMap<Subject, String>,
}

impl ContentLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_playlist(&mut self, subject: impl Into<Subject>, url: impl Into<String>) {
        self.playlists.insert(subject.into(), url.into());
    }

    pub fn playlist(&self, subject: &Subject) -> Option<&str> {
        self.playlists.get(subject).map(String::as_str)
    }

    /// Link for an item by its 0-based index
    ///
    /// Playlist positions are 1-based on the wire. Without a configured (or
    /// parseable) playlist the link degrades to a numbered placeholder.
    pub fn item_link(&self, subject: &Subject, item_index: u32) -> String {
        let number = item_index + 1;
        if let Some(id) = self.playlist(subject).and_then(playlist_id) {
            format!(
                "https://www.youtube.com/playlist?list={}&index={}",
                id, number
            )
        } else {
            format!("Video #{}", number)
        }
    }
}

/// Extract the `list=` id from a playlist URL
fn playlist_id(url: &str) -> Option<&str> {
    let start = url.find("list=")? + "list=".len();
    let rest = &url[start..];
    let end = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '-'))
        .unwrap_or(rest.len());
    if end == 0 {
        None
    } else {
        Some(&rest[..end])
    }
}

#[cfg(test)]
#[path = "content_tests.rs"]
mod tests;
