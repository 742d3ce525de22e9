//! Build-tool floor check.
//!
//! Extensions are built with `create-foxglove-extension` (formerly
//! published as `@foxglove/fox`). The version range an extension declares
//! in `devDependencies` is reduced to the lowest version it admits, and
//! that version must reach the configured floor unless the archive digest
//! is on the exemption list.

use crate::exemptions::ExemptionList;
use crate::manifest::PackageManifest;
use semver::{Prerelease, Version};
use std::fmt;

/// Build-tool package names, in lookup order.
pub const BUILD_TOOL_PACKAGES: [&str; 2] = ["create-foxglove-extension", "@foxglove/fox"];

/// The floor applied when configuration does not override it.
pub const DEFAULT_FLOOR_VERSION: Version = Version::new(1, 0, 0);

/// Characters that may make up a comparison operator.
const OPERATOR_CHARS: [char; 5] = ['<', '>', '=', '^', '~'];

/// Errors that stop validation of an extension.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildToolError {
    /// Neither build-tool package is declared.
    #[error("missing required devDependency on {}", BUILD_TOOL_PACKAGES.join(" or "))]
    MissingDeclaration,

    /// The declared range has no computable minimum.
    #[error("cannot determine minimum version of {package} from range \"{range}\"")]
    UnresolvableRange {
        /// The build-tool package that was found.
        package: &'static str,
        /// The declared range.
        range: String,
    },

    /// The minimum is below the floor and the digest is not exempt.
    #[error(
        "must upgrade {package} to at least {floor} (range \"{range}\" allows {minimum})"
    )]
    BelowFloor {
        /// The build-tool package that was found.
        package: &'static str,
        /// The declared range.
        range: String,
        /// The minimum version the range admits.
        minimum: Version,
        /// The required floor.
        floor: Version,
    },
}

/// An exempt extension that already meets the floor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error(
    "{package} minimum version {minimum} satisfies {floor}; digest {digest} should be removed from the exemption list"
)]
pub struct StaleExemption {
    /// The build-tool package that was found.
    pub package: &'static str,
    /// The minimum version the range admits.
    pub minimum: Version,
    /// The required floor.
    pub floor: Version,
    /// The exempt archive digest.
    pub digest: String,
}

/// Outcome of a floor check that does not stop validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FloorVerdict {
    /// The minimum meets the floor and no exemption is recorded.
    Satisfied {
        /// The build-tool package that was found.
        package: &'static str,
        /// The minimum version the range admits.
        minimum: Version,
    },
    /// The minimum is below the floor but the digest is exempt.
    Grandfathered {
        /// The build-tool package that was found.
        package: &'static str,
        /// The minimum version the range admits.
        minimum: Version,
        /// The required floor.
        floor: Version,
    },
    /// The minimum meets the floor yet the digest is still exempt.
    ExemptionNotNeeded(StaleExemption),
}

impl fmt::Display for FloorVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Satisfied { package, minimum } => {
                write!(f, "{package} minimum version {minimum} meets the floor")
            }
            Self::Grandfathered {
                package,
                minimum,
                floor,
            } => write!(
                f,
                "{package} minimum version {minimum} is below {floor}; allowed by the exemption list"
            ),
            Self::ExemptionNotNeeded(stale) => write!(f, "{stale}"),
        }
    }
}

/// Check the manifest's build-tool declaration against `floor`.
///
/// # Errors
///
/// Returns [`BuildToolError`] when the declaration is missing, its range
/// cannot be resolved, or its minimum is below `floor` without an
/// exemption for `digest`.
pub fn check_build_tool(
    manifest: &PackageManifest,
    digest: &str,
    floor: &Version,
    exemptions: &ExemptionList,
) -> Result<FloorVerdict, BuildToolError> {
    let (package, range) = BUILD_TOOL_PACKAGES
        .iter()
        .find_map(|package| {
            manifest
                .dev_dependencies
                .get(*package)
                .map(|range| (*package, range))
        })
        .ok_or(BuildToolError::MissingDeclaration)?;
    let minimum =
        minimum_version(range).ok_or_else(|| BuildToolError::UnresolvableRange {
            package,
            range: range.clone(),
        })?;

    match (minimum >= *floor, exemptions.contains(digest)) {
        (true, false) => Ok(FloorVerdict::Satisfied { package, minimum }),
        (true, true) => Ok(FloorVerdict::ExemptionNotNeeded(StaleExemption {
            package,
            minimum,
            floor: floor.clone(),
            digest: digest.to_owned(),
        })),
        (false, true) => Ok(FloorVerdict::Grandfathered {
            package,
            minimum,
            floor: floor.clone(),
        }),
        (false, false) => Err(BuildToolError::BelowFloor {
            package,
            range: range.clone(),
            minimum,
            floor: floor.clone(),
        }),
    }
}

/// Compute the lowest version satisfying an npm-style range.
///
/// Supports `||` alternatives, whitespace-separated comparators, the
/// operators `=`, `^`, `~`, `>`, `>=`, `<`, `<=`, `x`/`*` wildcards,
/// partial versions and hyphen ranges. Returns `None` when the range is
/// malformed or nothing satisfies it.
///
/// # Examples
///
/// ```
/// use registry_validator::build_tool::minimum_version;
/// use semver::Version;
///
/// assert_eq!(minimum_version("^0.9.0"), Some(Version::new(0, 9, 0)));
/// assert_eq!(minimum_version(">1.2"), Some(Version::new(1, 3, 0)));
/// assert_eq!(minimum_version("^2 || ~1.5"), Some(Version::new(1, 5, 0)));
/// assert_eq!(minimum_version("latest"), None);
/// ```
#[must_use]
pub fn minimum_version(range: &str) -> Option<Version> {
    let mut best: Option<Version> = None;
    for alternative in range.split("||") {
        let Some(candidate) = alternative_minimum(alternative.trim()).ok()? else {
            continue;
        };
        if best.as_ref().is_none_or(|current| candidate < *current) {
            best = Some(candidate);
        }
    }
    best
}

/// The range text is not a version range.
#[derive(Debug)]
struct RangeSyntax;

/// A version as written in a range, with wildcard or missing components
/// left as `None`.
#[derive(Debug)]
struct PartialVersion {
    major: Option<u64>,
    minor: Option<u64>,
    patch: Option<u64>,
    full: Option<Version>,
}

impl PartialVersion {
    fn parse(text: &str) -> Result<Self, RangeSyntax> {
        let text = text.strip_prefix('v').unwrap_or(text);
        if let Ok(full) = Version::parse(text) {
            return Ok(Self {
                major: Some(full.major),
                minor: Some(full.minor),
                patch: Some(full.patch),
                full: Some(full),
            });
        }
        let mut components = [None; 3];
        if !text.is_empty() {
            let parts: Vec<&str> = text.split('.').collect();
            if parts.len() > components.len() {
                return Err(RangeSyntax);
            }
            let mut wildcard_seen = false;
            for (slot, part) in components.iter_mut().zip(parts) {
                if matches!(part, "x" | "X" | "*") {
                    wildcard_seen = true;
                } else if wildcard_seen || part.is_empty() {
                    return Err(RangeSyntax);
                } else {
                    *slot = Some(part.parse::<u64>().map_err(|_| RangeSyntax)?);
                }
            }
        }
        let [major, minor, patch] = components;
        Ok(Self {
            major,
            minor,
            patch,
            full: None,
        })
    }

    /// The lowest version matching the written components.
    fn floor(&self) -> Version {
        self.full.clone().unwrap_or_else(|| {
            Version::new(
                self.major.unwrap_or(0),
                self.minor.unwrap_or(0),
                self.patch.unwrap_or(0),
            )
        })
    }

    /// The first version beyond every version matching the written
    /// components, or `None` for a bare wildcard.
    fn ceiling(&self) -> Result<Option<Version>, RangeSyntax> {
        let Some(major) = self.major else {
            return Ok(None);
        };
        let ceiling = match (self.minor, self.patch) {
            (None, _) => Version::new(increment(major)?, 0, 0),
            (Some(minor), None) => Version::new(major, increment(minor)?, 0),
            (Some(minor), Some(patch)) => Version::new(major, minor, increment(patch)?),
        };
        Ok(Some(ceiling))
    }

    fn is_complete(&self) -> bool {
        self.patch.is_some()
    }
}

/// Lower and upper limits accumulated for one alternative.
#[derive(Debug, Default)]
struct Bounds {
    lower: Option<Version>,
    uppers: Vec<(Version, bool)>,
}

impl Bounds {
    fn at_least(&mut self, version: Version) {
        if self.lower.as_ref().is_none_or(|current| version > *current) {
            self.lower = Some(version);
        }
    }

    fn below(&mut self, version: Version) {
        self.uppers.push((version, false));
    }

    fn at_most(&mut self, version: Version) {
        self.uppers.push((version, true));
    }

    fn nothing(&mut self) {
        self.below(Version::new(0, 0, 0));
    }

    fn minimum(self) -> Option<Version> {
        let candidate = self.lower.unwrap_or_else(|| Version::new(0, 0, 0));
        self.uppers
            .iter()
            .all(|(upper, inclusive)| {
                if *inclusive {
                    candidate <= *upper
                } else {
                    candidate < *upper
                }
            })
            .then_some(candidate)
    }
}

fn alternative_minimum(alternative: &str) -> Result<Option<Version>, RangeSyntax> {
    let mut bounds = Bounds::default();
    if let Some((low, high)) = alternative.split_once(" - ") {
        hyphen_bounds(&mut bounds, low.trim(), high.trim())?;
    } else {
        for comparator in comparators(alternative)? {
            comparator_bounds(&mut bounds, &comparator)?;
        }
    }
    Ok(bounds.minimum())
}

/// Split an alternative into comparators, joining operators written apart
/// from their version (`>= 1.2.0`).
fn comparators(alternative: &str) -> Result<Vec<String>, RangeSyntax> {
    let mut found = Vec::new();
    let mut pending = String::new();
    for token in alternative.split_whitespace() {
        pending.push_str(token);
        if !token.chars().all(|c| OPERATOR_CHARS.contains(&c)) {
            found.push(std::mem::take(&mut pending));
        }
    }
    if pending.is_empty() {
        Ok(found)
    } else {
        Err(RangeSyntax)
    }
}

fn hyphen_bounds(bounds: &mut Bounds, low: &str, high: &str) -> Result<(), RangeSyntax> {
    let from = PartialVersion::parse(low)?;
    let to = PartialVersion::parse(high)?;
    bounds.at_least(from.floor());
    if to.is_complete() {
        bounds.at_most(to.floor());
    } else if let Some(ceiling) = to.ceiling()? {
        bounds.below(ceiling);
    }
    Ok(())
}

fn comparator_bounds(bounds: &mut Bounds, comparator: &str) -> Result<(), RangeSyntax> {
    let split = comparator
        .find(|c: char| !OPERATOR_CHARS.contains(&c))
        .unwrap_or(comparator.len());
    let (operator, version_text) = comparator.split_at(split);
    let version = PartialVersion::parse(version_text)?;
    let Some(major) = version.major else {
        return wildcard_bounds(bounds, operator);
    };
    match operator {
        "" | "=" => {
            bounds.at_least(version.floor());
            if version.full.is_some() {
                bounds.at_most(version.floor());
            } else if let Some(ceiling) = version.ceiling()? {
                bounds.below(ceiling);
            }
        }
        ">=" => bounds.at_least(version.floor()),
        ">" => bounds.at_least(successor(&version)?),
        "<" => bounds.below(version.floor()),
        "<=" => {
            if version.is_complete() {
                bounds.at_most(version.floor());
            } else if let Some(ceiling) = version.ceiling()? {
                bounds.below(ceiling);
            }
        }
        "~" | "~>" => {
            bounds.at_least(version.floor());
            bounds.below(match version.minor {
                None => Version::new(increment(major)?, 0, 0),
                Some(minor) => Version::new(major, increment(minor)?, 0),
            });
        }
        "^" => {
            bounds.at_least(version.floor());
            bounds.below(caret_ceiling(&version, major)?);
        }
        _ => return Err(RangeSyntax),
    }
    Ok(())
}

fn wildcard_bounds(bounds: &mut Bounds, operator: &str) -> Result<(), RangeSyntax> {
    match operator {
        "" | "=" | ">=" | "<=" | "^" | "~" | "~>" => {}
        ">" | "<" => bounds.nothing(),
        _ => return Err(RangeSyntax),
    }
    Ok(())
}

/// The lowest version strictly greater than every version `version`
/// matches.
fn successor(version: &PartialVersion) -> Result<Version, RangeSyntax> {
    match &version.full {
        Some(full) if !full.pre.is_empty() => {
            let mut next = full.clone();
            next.pre = Prerelease::new(&format!("{}.0", full.pre)).unwrap_or(Prerelease::EMPTY);
            Ok(next)
        }
        _ => Ok(version
            .ceiling()?
            .unwrap_or_else(|| Version::new(0, 0, 0))),
    }
}

fn caret_ceiling(version: &PartialVersion, major: u64) -> Result<Version, RangeSyntax> {
    Ok(match (version.minor, version.patch) {
        _ if major > 0 => Version::new(increment(major)?, 0, 0),
        (None, _) => Version::new(1, 0, 0),
        (Some(minor), _) if minor > 0 => Version::new(0, increment(minor)?, 0),
        (Some(_), None) => Version::new(0, 1, 0),
        (Some(_), Some(patch)) => Version::new(0, 0, increment(patch)?),
    })
}

/// The next value of a version component. A range whose bound would pass
/// `u64::MAX` has no representable minimum.
fn increment(component: u64) -> Result<u64, RangeSyntax> {
    component.checked_add(1).ok_or(RangeSyntax)
}
