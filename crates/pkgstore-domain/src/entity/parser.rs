//! Reference grammar.

use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::{char, satisfy},
    combinator::{all_consuming, peek, recognize, verify},
    multi::separated_list1,
    sequence::{pair, preceded},
    IResult,
};

use super::{EntityRef, SCHEME};
use crate::error::{DomainError, DomainResult};

/// Parses `[cs:][~owner/][series/]name[-revision]`.
///
/// A trailing `-<digits>` on the name segment is always a revision, which
/// the name grammar guarantees by rejecting all-digit name parts.
///
/// # Examples
///
/// ```
/// use pkgstore_domain::parse_reference;
///
/// let id = parse_reference("~joe/precise/wordpress-34").unwrap();
/// assert_eq!(id.owner(), Some("joe"));
/// assert_eq!(id.series(), Some("precise"));
/// assert_eq!(id.name(), "wordpress");
/// assert_eq!(id.revision(), Some(34));
///
/// assert!(parse_reference("").is_err());
/// ```
pub fn parse_reference(reference: &str) -> DomainResult<EntityRef> {
    let path = reference.strip_prefix(SCHEME).unwrap_or(reference);
    let mut parts: Vec<&str> = path.split('/').collect();

    let owner = match parts.first() {
        Some(first) if first.starts_with('~') => {
            let owner = &first[1..];
            if !is_valid_user(owner) {
                return Err(DomainError::InvalidUser {
                    reference: reference.to_string(),
                });
            }
            parts.remove(0);
            Some(owner.to_string())
        }
        _ => None,
    };

    let (series, name_segment) = match parts.as_slice() {
        [name] => (None, *name),
        [series, name] => (Some(*series), *name),
        _ => {
            return Err(DomainError::MalformedReference {
                reference: reference.to_string(),
            })
        }
    };

    let (name, revision) = split_revision(name_segment, reference)?;
    if !is_valid_name(name) {
        return Err(DomainError::InvalidName {
            name: name.to_string(),
        });
    }
    if let Some(series) = series {
        if !is_valid_series(series) {
            return Err(DomainError::InvalidSeries {
                series: series.to_string(),
            });
        }
    }

    Ok(EntityRef {
        owner,
        series: series.map(str::to_string),
        name: name.to_string(),
        revision,
    })
}

fn split_revision<'a>(segment: &'a str, reference: &str) -> DomainResult<(&'a str, Option<u32>)> {
    match segment.rsplit_once('-') {
        Some((name, digits)) if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) => {
            let revision = digits
                .parse::<u32>()
                .map_err(|_| DomainError::InvalidRevision {
                    reference: reference.to_string(),
                })?;
            Ok((name, Some(revision)))
        }
        _ => Ok((segment, None)),
    }
}

fn lower_or_digit(c: char) -> bool {
    c.is_ascii_lowercase() || c.is_ascii_digit()
}

/// One hyphen-separated name part; it must contain a letter.
fn name_part(input: &str) -> IResult<&str, &str> {
    verify(take_while1(lower_or_digit), |part: &str| {
        part.chars().any(|c| c.is_ascii_lowercase())
    })(input)
}

fn name(input: &str) -> IResult<&str, &str> {
    preceded(
        peek(satisfy(|c| c.is_ascii_lowercase())),
        recognize(separated_list1(char('-'), name_part)),
    )(input)
}

fn user(input: &str) -> IResult<&str, &str> {
    verify(
        recognize(pair(
            satisfy(lower_or_digit),
            take_while(|c: char| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-')),
        )),
        |user: &str| user.ends_with(|c: char| c.is_ascii_alphanumeric()),
    )(input)
}

fn series(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_ascii_lowercase()),
        take_while(lower_or_digit),
    ))(input)
}

/// Name grammar: hyphen-separated parts of `[a-z0-9]`, first character a
/// letter, and every part containing at least one letter.
pub fn is_valid_name(input: &str) -> bool {
    all_consuming(name)(input).is_ok()
}

/// User grammar: `[a-z0-9][a-zA-Z0-9+.-]*`, ending in a letter or digit.
pub fn is_valid_user(input: &str) -> bool {
    all_consuming(user)(input).is_ok()
}

/// Series grammar: a lower-case letter followed by lower-case letters or digits.
pub fn is_valid_series(input: &str) -> bool {
    all_consuming(series)(input).is_ok()
}
