//! Accept header negotiation
//!
//! Parses `Accept` headers into [`MediaRange`]s and picks the best offer
//! among a set of candidates.
//!
//! ## Rules
//! - `type/subtype; q=value` entries, comma separated, wildcards allowed
//! - Quality values are kept in thousandths (`q=0.125` -> `125`)
//! - An offer is scored with the quality of the most specific range that
//!   matches one of its media types
//! - Highest quality wins, then the earliest range in the header, then the
//!   earliest offer
//! - `q=0` means "not acceptable"

use std::cmp::Ordering;
use std::fmt;

/// Maximum quality, `q=1`
pub const MAX_QUALITY: u16 = 1000;

/// Error when parsing an Accept header or a media type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AcceptError {
    #[error("Invalid media range: {0}")]
    InvalidMediaRange(String),

    #[error("Invalid quality value: {0}")]
    InvalidQuality(String),
}

/// Concrete media type declared by an offer (e.g. `application/json`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    kind: String,
    subtype: String,
}

impl MediaType {
    /// Parse `type/subtype`. Parameters are ignored, wildcards rejected.
    pub fn parse(value: &str) -> Result<Self, AcceptError> {
        let essence = value.split(';').next().unwrap_or_default().trim();
        let (kind, subtype) = split_essence(essence)?;
        if kind == "*" || subtype == "*" {
            return Err(AcceptError::InvalidMediaRange(value.to_string()));
        }
        Ok(Self { kind, subtype })
    }

    /// `application/json` etc. Intended for constants known to be valid.
    pub fn from_static(kind: &'static str, subtype: &'static str) -> Self {
        Self {
            kind: kind.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.subtype)
    }
}

/// One entry of an Accept header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRange {
    kind: String,
    subtype: String,
    params: Vec<(String, String)>,
    quality: u16,
    position: usize,
}

impl MediaRange {
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// Quality in thousandths
    pub fn quality(&self) -> u16 {
        self.quality
    }

    /// Zero-based index of this entry in the header
    pub fn position(&self) -> usize {
        self.position
    }

    /// `*/*` = 0, `type/*` = 1, `type/subtype` = 2, with parameters = 3
    pub fn specificity(&self) -> u8 {
        match (self.kind.as_str(), self.subtype.as_str()) {
            ("*", _) => 0,
            (_, "*") => 1,
            _ if self.params.is_empty() => 2,
            _ => 3,
        }
    }

    /// Whether this range covers the given media type
    pub fn matches(&self, media_type: &MediaType) -> bool {
        (self.kind == "*" || self.kind == media_type.kind)
            && (self.subtype == "*" || self.subtype == media_type.subtype)
    }
}

/// Score of an offer against an Accept header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preference {
    pub quality: u16,
    pub position: usize,
}

impl Preference {
    /// Ordering where "greater" means "preferred"
    fn cmp_preference(&self, other: &Self) -> Ordering {
        self.quality
            .cmp(&other.quality)
            .then_with(|| other.position.cmp(&self.position))
    }
}

/// Parse an Accept header value
///
/// Empty elements are skipped. Any malformed element fails the whole
/// header so that callers can fall back to their default.
pub fn parse_accept(header: &str) -> Result<Vec<MediaRange>, AcceptError> {
    let mut ranges = Vec::new();

    for element in header.split(',') {
        let element = element.trim();
        if element.is_empty() {
            continue;
        }

        let mut parts = element.split(';');
        let essence = parts.next().unwrap_or_default().trim();
        let (kind, subtype) = if essence == "*" {
            ("*".to_string(), "*".to_string())
        } else {
            split_essence(essence)?
        };
        if kind == "*" && subtype != "*" {
            return Err(AcceptError::InvalidMediaRange(element.to_string()));
        }

        let mut quality = MAX_QUALITY;
        let mut params = Vec::new();
        for param in parts {
            let param = param.trim();
            if param.is_empty() {
                continue;
            }
            let (name, value) = param
                .split_once('=')
                .ok_or_else(|| AcceptError::InvalidMediaRange(element.to_string()))?;
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().trim_matches('"');
            if name == "q" {
                quality = parse_quality(value)?;
            } else {
                params.push((name, value.to_string()));
            }
        }

        ranges.push(MediaRange {
            kind,
            subtype,
            params,
            quality,
            position: ranges.len(),
        });
    }

    Ok(ranges)
}

/// Score one offer (a set of media types) against parsed ranges
///
/// For every media type the most specific matching range decides its
/// quality; the offer keeps its best-scoring media type. `None` when no
/// range matches.
pub fn preference(ranges: &[MediaRange], offer: &[MediaType]) -> Option<Preference> {
    best_scored(ranges, offer).map(|(_, pref)| pref)
}

/// The media type of `offer` that decides its preference
///
/// Ties go to the media type listed first.
pub fn preferred_media_type<'a>(
    ranges: &[MediaRange],
    offer: &'a [MediaType],
) -> Option<&'a MediaType> {
    best_scored(ranges, offer).map(|(media_type, _)| media_type)
}

fn best_scored<'a>(
    ranges: &[MediaRange],
    offer: &'a [MediaType],
) -> Option<(&'a MediaType, Preference)> {
    offer
        .iter()
        .filter_map(|media_type| {
            ranges
                .iter()
                .filter(|range| range.matches(media_type))
                .max_by(|a, b| {
                    a.specificity()
                        .cmp(&b.specificity())
                        .then_with(|| b.position.cmp(&a.position))
                })
                .map(|range| {
                    let pref = Preference {
                        quality: range.quality,
                        position: range.position,
                    };
                    (media_type, pref)
                })
        })
        .rev()
        .max_by(|(_, a), (_, b)| a.cmp_preference(b))
}

/// Pick the index of the preferred offer, if any is acceptable
///
/// Offers are compared by quality, then by the position of the deciding
/// range in the header; remaining ties go to the earliest offer.
pub fn negotiate<O>(ranges: &[MediaRange], offers: &[O]) -> Option<usize>
where
    O: AsRef<[MediaType]>,
{
    let mut best: Option<(usize, Preference)> = None;

    for (index, offer) in offers.iter().enumerate() {
        let Some(pref) = preference(ranges, offer.as_ref()) else {
            continue;
        };
        if pref.quality == 0 {
            continue;
        }
        let better = match &best {
            None => true,
            Some((_, current)) => pref.cmp_preference(current) == Ordering::Greater,
        };
        if better {
            best = Some((index, pref));
        }
    }

    best.map(|(index, _)| index)
}

fn split_essence(essence: &str) -> Result<(String, String), AcceptError> {
    let (kind, subtype) = essence
        .split_once('/')
        .ok_or_else(|| AcceptError::InvalidMediaRange(essence.to_string()))?;
    let kind = kind.trim();
    let subtype = subtype.trim();
    if kind.is_empty() || subtype.is_empty() || subtype.contains('/') {
        return Err(AcceptError::InvalidMediaRange(essence.to_string()));
    }
    Ok((kind.to_ascii_lowercase(), subtype.to_ascii_lowercase()))
}

fn parse_quality(value: &str) -> Result<u16, AcceptError> {
    let invalid = || AcceptError::InvalidQuality(value.to_string());

    let (whole, fraction) = value.split_once('.').unwrap_or((value, ""));
    if fraction.len() > 3 || !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let whole: u16 = match whole {
        "0" => 0,
        "1" => 1,
        _ => return Err(invalid()),
    };

    let mut thousandths: u16 = 0;
    for (i, digit) in fraction.chars().enumerate() {
        let digit = digit.to_digit(10).ok_or_else(invalid)? as u16;
        thousandths += digit * 10u16.pow(2 - i as u32);
    }

    let quality = whole * MAX_QUALITY + thousandths;
    if quality > MAX_QUALITY {
        return Err(invalid());
    }
    Ok(quality)
}
