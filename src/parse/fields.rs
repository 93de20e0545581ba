//! Logical report fields and tolerant header resolution.
//!
//! Exporters disagree on column names ("Domain rating", "DR", "Authority
//! Score"...). Each logical [`Field`] carries an ordered alias list; a row
//! value is resolved by trying each alias as an exact header first, then as a
//! whitespace-insensitive, case-insensitive match.

/// A logical column of a backlink report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    SourcePageUrl,
    TargetUrl,
    FirstSeen,
    LastSeen,
    AuthorityScore,
    UrlRating,
    DomainTraffic,
    PageTraffic,
    Anchor,
    Nofollow,
    Ugc,
    Sponsored,
    ExternalLinks,
    Language,
}

impl Field {
    /// Header aliases in lookup order.
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            Field::SourcePageUrl => &[
                "Referring page URL",
                "Referrer URL",
                "Source url",
                "Source URL",
            ],
            Field::TargetUrl => &["Target URL", "Target url"],
            Field::FirstSeen => &["First seen", "First found"],
            Field::LastSeen => &["Last seen", "Last found"],
            Field::AuthorityScore => &[
                "Domain rating",
                "DR",
                "DomainRating",
                "Authority Score",
                "Domain ascore",
            ],
            Field::UrlRating => &["UR", "URL rating", "Page ascore"],
            Field::DomainTraffic => &["Domain traffic", "Traffic"],
            Field::PageTraffic => &["Page traffic"],
            Field::Anchor => &["Anchor", "Anchor text"],
            Field::Nofollow => &["Nofollow"],
            Field::Ugc => &["UGC"],
            Field::Sponsored => &["Sponsored"],
            Field::ExternalLinks => &["External links", "External links count"],
            Field::Language => &["Language"],
        }
    }
}

/// One data row viewed through its header names.
#[derive(Debug, Clone, Copy)]
pub struct RawRow<'a> {
    headers: &'a [String],
    values: &'a [String],
}

impl<'a> RawRow<'a> {
    pub fn new(headers: &'a [String], values: &'a [String]) -> Self {
        Self { headers, values }
    }

    /// Resolves a logical field to the first matching cell.
    pub fn field(&self, field: Field) -> Option<&'a str> {
        self.lookup(field.aliases())
    }

    /// Tries each alias in order: exact header match first, then a match
    /// ignoring whitespace and case. Headers without a cell in this row
    /// (ragged rows) never match.
    pub fn lookup(&self, aliases: &[&str]) -> Option<&'a str> {
        for alias in aliases {
            if let Some(value) = self
                .headers
                .iter()
                .position(|h| h == alias)
                .and_then(|i| self.values.get(i))
            {
                return Some(value.as_str());
            }

            let wanted = squash(alias);
            if let Some(value) = self
                .headers
                .iter()
                .enumerate()
                .filter(|(i, _)| *i < self.values.len())
                .find(|(_, h)| squash(h) == wanted)
                .map(|(i, _)| &self.values[i])
            {
                return Some(value.as_str());
            }
        }
        None
    }
}

fn squash(header: &str) -> String {
    header
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
