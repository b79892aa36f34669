// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
use chrono::{DateTime, Utc};

/// Clock-based id source for entities created before the store assigns ids.
///
/// Ids are the creation time in milliseconds, bumped by one whenever two ids
/// would otherwise collide, so they are strictly increasing.
#[derive(Debug, Clone, Default)]
pub struct LocalIds {
    last: i64,
}

impl LocalIds {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&mut self, now: DateTime<Utc>) -> i64 {
        self.last = now.timestamp_millis().max(self.last + 1);
        self.last
    }
}
