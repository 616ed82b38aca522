//! Release specifiers: a project name plus optional version constraints.

use std::{fmt, str::FromStr, sync::LazyLock};

use regex::Regex;

use crate::{
    error::{RegistryError, Result},
    version::Version,
};

static PROJECT_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9._-]*[A-Za-z0-9])?$")
        .expect("unable to compile project name regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Ge,
    Le,
    Gt,
    Lt,
}

impl Operator {
    /// Two-character operators come first so `>=` is not read as `>`.
    const ALL: [(&'static str, Operator); 6] = [
        ("==", Operator::Eq),
        ("!=", Operator::Ne),
        (">=", Operator::Ge),
        ("<=", Operator::Le),
        (">", Operator::Gt),
        ("<", Operator::Lt),
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Gt => ">",
            Operator::Lt => "<",
        }
    }

    pub fn accepts(&self, candidate: &Version, bound: &Version) -> bool {
        match self {
            Operator::Eq => candidate == bound,
            Operator::Ne => candidate != bound,
            Operator::Ge => candidate >= bound,
            Operator::Le => candidate <= bound,
            Operator::Gt => candidate > bound,
            Operator::Lt => candidate < bound,
        }
    }
}

/// Lowercases and folds `_` and `.` into `-`, so `Zope.Interface` and `zope-interface`
/// name the same project.
pub fn normalize_name(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| {
            match c {
                '_' | '.' => '-',
                c => c.to_ascii_lowercase(),
            }
        })
        .collect()
}

/// A parsed `name`, `name==1.0` or `name>=1.0,<2.0` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseSpecifier {
    raw: String,
    project: String,
    constraints: Vec<(Operator, Version)>,
}

impl ReleaseSpecifier {
    /// Parses a specifier.
    ///
    /// # Errors
    ///
    /// [`RegistryError::InvalidSpecifier`] if the project name is missing or malformed, or
    /// a constraint has no operator or no version.
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.trim();
        let invalid = || RegistryError::InvalidSpecifier(input.to_string());

        let split_at = raw.find(['=', '!', '<', '>']).unwrap_or(raw.len());
        let project = raw[..split_at].trim();
        if !PROJECT_NAME_RE.is_match(project) {
            return Err(invalid());
        }

        let mut constraints = Vec::new();
        let rest = raw[split_at..].trim();
        if !rest.is_empty() {
            for clause in rest.split(',') {
                let clause = clause.trim();
                let (op, version) = Operator::ALL
                    .iter()
                    .find_map(|(token, op)| clause.strip_prefix(token).map(|v| (*op, v)))
                    .ok_or_else(invalid)?;
                let version = version.trim();
                if version.is_empty() || version.starts_with(['=', '<', '>', '!']) {
                    return Err(invalid());
                }
                constraints.push((op, Version::parse(version)));
            }
        }

        Ok(Self {
            raw: raw.to_string(),
            project: project.to_string(),
            constraints,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn project_name(&self) -> &str {
        &self.project
    }

    /// Whether this specifier is about `project`, comparing normalized names.
    pub fn names(&self, project: &str) -> bool {
        normalize_name(&self.project) == normalize_name(project)
    }

    /// A bare project name, accepting every version.
    pub fn is_unconstrained(&self) -> bool {
        self.constraints.is_empty()
    }

    pub fn constraints(&self) -> &[(Operator, Version)] {
        &self.constraints
    }

    /// True when `version` satisfies every constraint.
    pub fn matches(&self, version: &Version) -> bool {
        self.constraints
            .iter()
            .all(|(op, bound)| op.accepts(version, bound))
    }
}

impl FromStr for ReleaseSpecifier {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ReleaseSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(s: &str) -> ReleaseSpecifier {
        ReleaseSpecifier::parse(s).unwrap()
    }

    #[test]
    fn test_parse_bare() {
        let s = spec("pkgsync");
        assert_eq!(s.project_name(), "pkgsync");
        assert!(s.is_unconstrained());
        assert!(s.matches(&Version::parse("0.0.0")));
        assert!(s.matches(&Version::parse("99")));
    }

    #[test]
    fn test_parse_constraints() {
        let s = spec("zope.interface >= 3.6, < 4.0");
        assert_eq!(s.project_name(), "zope.interface");
        assert_eq!(s.to_string(), "zope.interface >= 3.6, < 4.0");
        assert_eq!(
            s.constraints()
                .iter()
                .map(|(op, v)| format!("{}{}", op.as_str(), v))
                .collect::<Vec<_>>(),
            vec![">=3.6", "<4.0"]
        );
    }

    #[test]
    fn test_matches_intersection() {
        let s = spec("pkg>=1.0,<2.0,!=1.5");
        assert!(s.matches(&Version::parse("1.0")));
        assert!(s.matches(&Version::parse("1.9.9")));
        assert!(!s.matches(&Version::parse("1.5.0")));
        assert!(!s.matches(&Version::parse("2.0")));
        assert!(!s.matches(&Version::parse("0.9")));
    }

    #[test]
    fn test_matches_operators() {
        let zero = Version::parse("0.0.0");
        let one = Version::parse("0.0.1");
        assert!(!spec("pkgsync>0.0.0").matches(&zero));
        assert!(spec("pkgsync>0.0.0").matches(&one));
        assert!(spec("pkgsync>=0.0.0").matches(&zero));
        assert!(spec("pkgsync<=0.0.0").matches(&zero));
        assert!(spec("pkgsync<0.0.1").matches(&zero));
        assert!(spec("pkgsync==0.0").matches(&zero));
        assert!(spec("pkgsync!=0.0.1").matches(&zero));
    }

    #[test]
    fn test_invalid_specifiers() {
        for input in ["", "==1.0", "pkg==", "pkg=1.0", "pkg>=1.0,", "pkg===1.0", "-pkg", "pkg ~ 1"] {
            assert!(
                matches!(
                    ReleaseSpecifier::parse(input),
                    Err(RegistryError::InvalidSpecifier(_))
                ),
                "{input} should be rejected"
            );
        }
    }

    #[test]
    fn test_names_normalizes() {
        let s = spec("Zope.Interface==3.6.1");
        assert!(s.names("zope-interface"));
        assert!(s.names("ZOPE_INTERFACE"));
        assert!(!s.names("zope"));
    }
}
