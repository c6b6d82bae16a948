// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Read options and the per-unit record filter they produce.

use std::fmt;
use std::sync::Arc;

use crate::core::Time;
use crate::io::metadata::ChannelDefinition;

/// Filter pushed down to each storage unit.
///
/// `start_time` is inclusive, `end_time` exclusive. `topics: Some(vec![])`
/// selects nothing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordFilter {
    pub topics: Option<Vec<String>>,
    pub start_time: Option<Time>,
    pub end_time: Option<Time>,
}

impl RecordFilter {
    pub fn accepts_topic(&self, topic: &str) -> bool {
        self.topics
            .as_ref()
            .map_or(true, |topics| topics.iter().any(|t| t == topic))
    }

    pub fn accepts_time(&self, timestamp: Time) -> bool {
        self.start_time.map_or(true, |start| timestamp >= start)
            && self.end_time.map_or(true, |end| timestamp < end)
    }

    pub fn accepts(&self, topic: &str, timestamp: Time) -> bool {
        self.accepts_topic(topic) && self.accepts_time(timestamp)
    }
}

/// Options for [`Bag::read_messages`](crate::Bag::read_messages).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadOptions {
    /// Allow-list of topic names; `None` reads every topic
    pub topics: Option<Vec<String>>,
    /// Inclusive lower bound
    pub start_time: Option<Time>,
    /// Exclusive upper bound
    pub end_time: Option<Time>,
    /// Skip decoding and yield payload bytes only
    pub raw_messages: bool,
}

impl ReadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.topics = Some(topics.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_start_time(mut self, start: Time) -> Self {
        self.start_time = Some(start);
        self
    }

    pub fn with_end_time(mut self, end: Time) -> Self {
        self.end_time = Some(end);
        self
    }

    pub fn with_raw_messages(mut self, raw: bool) -> Self {
        self.raw_messages = raw;
        self
    }

    pub fn record_filter(&self) -> RecordFilter {
        RecordFilter {
            topics: self.topics.clone(),
            start_time: self.start_time,
            end_time: self.end_time,
        }
    }
}

/// Topic selection by name or pattern, resolved against a bag's channels
/// into a [`ReadOptions`] allow-list.
#[derive(Clone, Default)]
pub enum TopicFilter {
    /// Read all topics (no filtering)
    #[default]
    All,
    /// Read only specific topics
    Include(Vec<String>),
    /// Exclude specific topics
    Exclude(Vec<String>),
    /// Include topics matching regex pattern
    RegexInclude(Arc<regex::Regex>),
}

impl fmt::Debug for TopicFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.debug_tuple("All").finish(),
            Self::Include(v) => f.debug_tuple("Include").field(v).finish(),
            Self::Exclude(v) => f.debug_tuple("Exclude").field(v).finish(),
            Self::RegexInclude(re) => f.debug_tuple("RegexInclude").field(&re.as_str()).finish(),
        }
    }
}

impl TopicFilter {
    /// Create a regex include filter.
    pub fn regex_include(pattern: &str) -> Result<Self, regex::Error> {
        regex::Regex::new(pattern).map(|re| Self::RegexInclude(Arc::new(re)))
    }

    /// Check if a topic should be included.
    pub fn should_include(&self, topic: &str) -> bool {
        match self {
            TopicFilter::All => true,
            TopicFilter::Include(topics) => topics.iter().any(|t| t == topic),
            TopicFilter::Exclude(topics) => !topics.iter().any(|t| t == topic),
            TopicFilter::RegexInclude(re) => re.is_match(topic),
        }
    }

    /// Resolve to an explicit allow-list, or `None` for "everything".
    pub fn resolve(&self, channels: &[ChannelDefinition]) -> Option<Vec<String>> {
        match self {
            TopicFilter::All => None,
            TopicFilter::Include(topics) => Some(topics.clone()),
            _ => Some(
                channels
                    .iter()
                    .filter(|c| self.should_include(&c.name))
                    .map(|c| c.name.clone())
                    .collect(),
            ),
        }
    }
}
