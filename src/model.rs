//! Data models for swarm campaign records.
//!
//! A swarm is one campaign tweet tracked at two points in time. Every value is
//! kept as the text the user typed; numeric interpretation happens in
//! [`crate::magnitude`] at the point of use.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SwarmError};

/// Number of columns in a swarm table.
pub const COLUMN_COUNT: usize = 17;

/// Engagement counts captured at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Engagement {
    pub views: String,
    pub retweets: String,
    pub quotes: String,
    pub likes: String,
    pub bookmarks: String,
}

impl Engagement {
    /// Raw text for one metric.
    #[must_use]
    pub fn get(&self, metric: Metric) -> &str {
        match metric {
            Metric::Views => &self.views,
            Metric::Retweets => &self.retweets,
            Metric::Quotes => &self.quotes,
            Metric::Likes => &self.likes,
            Metric::Bookmarks => &self.bookmarks,
        }
    }

    fn slot(&mut self, metric: Metric) -> &mut String {
        match metric {
            Metric::Views => &mut self.views,
            Metric::Retweets => &mut self.retweets,
            Metric::Quotes => &mut self.quotes,
            Metric::Likes => &mut self.likes,
            Metric::Bookmarks => &mut self.bookmarks,
        }
    }
}

/// One row of the swarm table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwarmRecord {
    pub id: String,
    pub week: String,
    pub number: String,
    pub url: String,
    pub tweet_content: String,
    pub tweet_image: String,
    pub starting: Engagement,
    pub comments: String,
    pub ending: Engagement,
}

impl SwarmRecord {
    /// Raw text stored in a column.
    #[must_use]
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Id => &self.id,
            Field::Week => &self.week,
            Field::Number => &self.number,
            Field::Url => &self.url,
            Field::TweetContent => &self.tweet_content,
            Field::TweetImage => &self.tweet_image,
            Field::Comments => &self.comments,
            Field::Starting(metric) => self.starting.get(metric),
            Field::Ending(metric) => self.ending.get(metric),
        }
    }

    /// Replace the text stored in a column.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Id => &mut self.id,
            Field::Week => &mut self.week,
            Field::Number => &mut self.number,
            Field::Url => &mut self.url,
            Field::TweetContent => &mut self.tweet_content,
            Field::TweetImage => &mut self.tweet_image,
            Field::Comments => &mut self.comments,
            Field::Starting(metric) => self.starting.slot(metric),
            Field::Ending(metric) => self.ending.slot(metric),
        };
        *slot = value.into();
    }

    /// Build a record from a row in column order.
    ///
    /// Returns `None` unless the row has exactly [`COLUMN_COUNT`] values.
    #[must_use]
    pub fn from_row<'a, I>(row: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let values: Vec<&str> = row.into_iter().collect();
        if values.len() != COLUMN_COUNT {
            return None;
        }
        let mut record = Self::default();
        for (field, value) in Field::ALL.iter().zip(values) {
            record.set(*field, value);
        }
        Some(record)
    }

    /// Values in column order.
    #[must_use]
    pub fn to_row(&self) -> Vec<&str> {
        Field::ALL.iter().map(|field| self.get(*field)).collect()
    }

    /// Week this swarm belongs to.
    #[must_use]
    pub fn week_key(&self) -> Week {
        Week::new(&self.week)
    }

    /// Identifier this record would get if it were created today.
    #[must_use]
    pub fn derived_id(&self) -> String {
        swarm_id(&self.week, &self.number)
    }
}

/// Build a swarm identifier from its week and number, ignoring surrounding
/// whitespace.
#[must_use]
pub fn swarm_id(week: &str, number: &str) -> String {
    format!("SW-{}-{}", week.trim(), number.trim())
}

/// A new swarm as submitted by the user, before it has an identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwarmDraft {
    pub week: String,
    pub number: String,
    pub url: String,
    pub tweet_content: String,
    pub tweet_image: String,
    pub starting: Engagement,
    pub comments: String,
    pub ending: Engagement,
}

impl SwarmDraft {
    /// Validate the draft and assign its identifier.
    ///
    /// # Errors
    ///
    /// Returns [`SwarmError::Validation`] when the week or number is blank.
    pub fn into_record(self) -> Result<SwarmRecord> {
        if self.week.trim().is_empty() {
            return Err(SwarmError::validation("swarm week is required"));
        }
        if self.number.trim().is_empty() {
            return Err(SwarmError::validation("swarm number is required"));
        }

        Ok(SwarmRecord {
            id: swarm_id(&self.week, &self.number),
            week: self.week,
            number: self.number,
            url: self.url,
            tweet_content: self.tweet_content,
            tweet_image: self.tweet_image,
            starting: self.starting,
            comments: self.comments,
            ending: self.ending,
        })
    }

    /// Set one of the editable fields by its typed name.
    ///
    /// The identifier is not part of a draft; setting it is ignored.
    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Id => {}
            Field::Week => self.week = value,
            Field::Number => self.number = value,
            Field::Url => self.url = value,
            Field::TweetContent => self.tweet_content = value,
            Field::TweetImage => self.tweet_image = value,
            Field::Comments => self.comments = value,
            Field::Starting(metric) => *self.starting.slot(metric) = value,
            Field::Ending(metric) => *self.ending.slot(metric) = value,
        }
    }
}

/// Engagement metric tracked at the start and end of a swarm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Views,
    Retweets,
    Quotes,
    Likes,
    Bookmarks,
}

impl Metric {
    pub const ALL: [Self; 5] = [
        Self::Views,
        Self::Retweets,
        Self::Quotes,
        Self::Likes,
        Self::Bookmarks,
    ];

    /// Display label, also the starting column header.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Views => "Views",
            Self::Retweets => "Retweets",
            Self::Quotes => "Quotes",
            Self::Likes => "Likes",
            Self::Bookmarks => "Bookmarks",
        }
    }

    /// Ending column header.
    #[must_use]
    pub const fn ending_label(self) -> &'static str {
        match self {
            Self::Views => "Ending Views",
            Self::Retweets => "Ending Retweets",
            Self::Quotes => "Ending Quotes",
            Self::Likes => "Ending Likes",
            Self::Bookmarks => "Ending Bookmarks",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A column of the swarm table.
///
/// Replaces positional column indexes: each variant knows its header text,
/// its position, and its short name on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Id,
    Week,
    Number,
    Url,
    TweetContent,
    TweetImage,
    Starting(Metric),
    Comments,
    Ending(Metric),
}

impl Field {
    /// All columns in table order.
    pub const ALL: [Self; COLUMN_COUNT] = [
        Self::Id,
        Self::Week,
        Self::Number,
        Self::Url,
        Self::TweetContent,
        Self::TweetImage,
        Self::Starting(Metric::Views),
        Self::Starting(Metric::Retweets),
        Self::Starting(Metric::Quotes),
        Self::Starting(Metric::Likes),
        Self::Starting(Metric::Bookmarks),
        Self::Comments,
        Self::Ending(Metric::Views),
        Self::Ending(Metric::Retweets),
        Self::Ending(Metric::Quotes),
        Self::Ending(Metric::Likes),
        Self::Ending(Metric::Bookmarks),
    ];

    /// Header row of a swarm table.
    #[must_use]
    pub fn header() -> [&'static str; COLUMN_COUNT] {
        Self::ALL.map(Self::header_name)
    }

    /// Columns a user may edit (everything but the identifier).
    #[must_use]
    pub fn editable() -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(|field| field.is_editable())
    }

    #[must_use]
    pub const fn is_editable(self) -> bool {
        !matches!(self, Self::Id)
    }

    /// Zero-based column position.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Id => 0,
            Self::Week => 1,
            Self::Number => 2,
            Self::Url => 3,
            Self::TweetContent => 4,
            Self::TweetImage => 5,
            Self::Starting(metric) => 6 + metric as usize,
            Self::Comments => 11,
            Self::Ending(metric) => 12 + metric as usize,
        }
    }

    /// Column header text.
    #[must_use]
    pub const fn header_name(self) -> &'static str {
        match self {
            Self::Id => "Swarm ID",
            Self::Week => "Swarm Week",
            Self::Number => "Swarm Number",
            Self::Url => "Swarm URL",
            Self::TweetContent => "Tweet Content",
            Self::TweetImage => "Tweet Image File Name",
            Self::Starting(metric) => metric.label(),
            Self::Comments => "Comments",
            Self::Ending(metric) => metric.ending_label(),
        }
    }

    /// Short name used on the command line and in the dashboard.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Week => "week",
            Self::Number => "number",
            Self::Url => "url",
            Self::TweetContent => "content",
            Self::TweetImage => "image",
            Self::Comments => "comments",
            Self::Starting(Metric::Views) => "views",
            Self::Starting(Metric::Retweets) => "retweets",
            Self::Starting(Metric::Quotes) => "quotes",
            Self::Starting(Metric::Likes) => "likes",
            Self::Starting(Metric::Bookmarks) => "bookmarks",
            Self::Ending(Metric::Views) => "ending-views",
            Self::Ending(Metric::Retweets) => "ending-retweets",
            Self::Ending(Metric::Quotes) => "ending-quotes",
            Self::Ending(Metric::Likes) => "ending-likes",
            Self::Ending(Metric::Bookmarks) => "ending-bookmarks",
        }
    }

    /// Short names of every column, for hints.
    #[must_use]
    pub fn keys() -> Vec<&'static str> {
        Self::ALL.iter().map(|field| field.key()).collect()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header_name())
    }
}

impl FromStr for Field {
    type Err = SwarmError;

    /// Accepts the short key (`ending-likes`), the header text
    /// (`Ending Likes`, case-insensitive), or underscores for hyphens.
    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|field| {
                field.key() == wanted || field.header_name().to_lowercase() == s.trim().to_lowercase()
            })
            .ok_or_else(|| {
                SwarmError::invalid_argument(crate::error::format_unknown_value_error(
                    "field",
                    s,
                    &Self::keys(),
                ))
            })
    }
}

/// A week value as stored in the table.
///
/// Weeks order numerically when both parse as numbers and lexically
/// otherwise; numeric weeks sort before non-numeric ones.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Week(String);

impl Week {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn numeric(&self) -> Option<f64> {
        self.0.trim().parse::<f64>().ok().filter(|v| v.is_finite())
    }
}

impl Ord for Week {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.numeric(), other.numeric()) {
            (Some(a), Some(b)) => a.total_cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for Week {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for Week {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which weeks a report covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekFilter {
    All,
    Week(Week),
}

impl WeekFilter {
    /// Parse user input: `all` (any case) or a literal week value.
    #[must_use]
    pub fn parse(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            Self::All
        } else {
            Self::Week(Week::new(trimmed))
        }
    }

    #[must_use]
    pub fn matches(&self, record: &SwarmRecord) -> bool {
        match self {
            Self::All => true,
            Self::Week(week) => record.week == week.as_str(),
        }
    }

    /// Records selected by this filter, in source order.
    #[must_use]
    pub fn apply<'a>(&self, records: &'a [SwarmRecord]) -> Vec<&'a SwarmRecord> {
        records.iter().filter(|record| self.matches(record)).collect()
    }
}

impl fmt::Display for WeekFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Week(week) => fmt::Display::fmt(week, f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SwarmRecord {
        SwarmDraft {
            week: "3".into(),
            number: "7".into(),
            url: "https://x.com/a/status/1".into(),
            tweet_content: "hello, world".into(),
            tweet_image: "img.png".into(),
            starting: Engagement {
                views: "1k".into(),
                retweets: "2".into(),
                quotes: "3".into(),
                likes: "4".into(),
                bookmarks: "5".into(),
            },
            comments: "first\nsecond".into(),
            ending: Engagement {
                views: "2k".into(),
                retweets: "12".into(),
                quotes: "13".into(),
                likes: "14".into(),
                bookmarks: "15".into(),
            },
        }
        .into_record()
        .unwrap()
    }

    #[test]
    fn draft_assigns_identifier() {
        let record = sample();
        assert_eq!(record.id, "SW-3-7");
        assert_eq!(record.derived_id(), "SW-3-7");
    }

    #[test]
    fn draft_keeps_padded_values() {
        let record = SwarmDraft {
            week: " 3 ".into(),
            number: "7\t".into(),
            ..SwarmDraft::default()
        }
        .into_record()
        .unwrap();
        assert_eq!(record.id, "SW-3-7");
        assert_eq!(record.week, " 3 ");
        assert_eq!(record.number, "7\t");
        assert_eq!(record.derived_id(), record.id);
    }

    #[test]
    fn draft_requires_week_and_number() {
        let err = SwarmDraft {
            number: "1".into(),
            ..SwarmDraft::default()
        }
        .into_record()
        .unwrap_err();
        assert!(matches!(err, SwarmError::Validation { .. }));

        let err = SwarmDraft {
            week: "1".into(),
            number: "   ".into(),
            ..SwarmDraft::default()
        }
        .into_record()
        .unwrap_err();
        assert!(matches!(err, SwarmError::Validation { .. }));
    }

    #[test]
    fn field_positions_match_header() {
        for (idx, field) in Field::ALL.iter().enumerate() {
            assert_eq!(field.index(), idx, "{field:?}");
        }
        let header = Field::header();
        assert_eq!(header[0], "Swarm ID");
        assert_eq!(header[11], "Comments");
        assert_eq!(header[16], "Ending Bookmarks");
    }

    #[test]
    fn row_conversion_preserves_values() {
        let record = sample();
        let row = record.to_row();
        assert_eq!(row.len(), COLUMN_COUNT);
        assert_eq!(row[6], "1k");
        assert_eq!(row[12], "2k");
        assert_eq!(SwarmRecord::from_row(row), Some(record));
        assert_eq!(SwarmRecord::from_row(["too", "short"]), None);
    }

    #[test]
    fn field_parses_keys_and_headers() {
        assert_eq!("views".parse::<Field>().unwrap(), Field::Starting(Metric::Views));
        assert_eq!(
            "Ending Likes".parse::<Field>().unwrap(),
            Field::Ending(Metric::Likes)
        );
        assert_eq!(
            "ending_bookmarks".parse::<Field>().unwrap(),
            Field::Ending(Metric::Bookmarks)
        );
        assert!("lieks".parse::<Field>().is_err());
    }

    #[test]
    fn identifier_is_not_editable() {
        assert!(!Field::Id.is_editable());
        assert_eq!(Field::editable().count(), 16);
    }

    #[test]
    fn weeks_sort_numerically() {
        let mut weeks = vec![Week::new("10"), Week::new("2"), Week::new("b"), Week::new("1")];
        weeks.sort();
        let sorted: Vec<&str> = weeks.iter().map(Week::as_str).collect();
        assert_eq!(sorted, ["1", "2", "10", "b"]);
    }

    #[test]
    fn week_filter_parses_all_case_insensitively() {
        assert_eq!(WeekFilter::parse(" ALL "), WeekFilter::All);
        assert_eq!(WeekFilter::parse("2"), WeekFilter::Week(Week::new("2")));
        assert!(WeekFilter::parse("3").matches(&sample()));
        assert!(!WeekFilter::parse("4").matches(&sample()));
    }
}
