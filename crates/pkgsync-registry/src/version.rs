//! Release version ordering.
//!
//! Versions compare by their numeric release segments first, ignoring trailing zeros.
//! Within one release, ordering is `dev` < pre-release (`a` < `b` < `rc`) < final < `post`.
//! Anything that cannot be classified is kept as a local label and compared as text after
//! everything else.

use std::{cmp::Ordering, fmt, sync::LazyLock};

use regex::Regex;

static VERSION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^v?
        (?P<release>\d+(?:\.\d+)*)
        (?:[-_.]?(?P<pre_l>alpha|a|beta|b|preview|pre|c|rc)[-_.]?(?P<pre_n>\d+)?)?
        (?:
            -(?P<post_n1>\d+)
            |
            [-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>\d+)?
        )?
        (?:[-_.]?dev[-_.]?(?P<dev_n>\d+)?(?P<dev>))?
        (?P<rest>.*)$",
    )
    .expect("unable to compile version regex")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    Alpha,
    Beta,
    Candidate,
}

impl PreRelease {
    fn from_label(label: &str) -> Self {
        match label {
            "a" | "alpha" => PreRelease::Alpha,
            "b" | "beta" => PreRelease::Beta,
            _ => PreRelease::Candidate,
        }
    }
}

/// Position of a version relative to its release's final version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Phase {
    DevOnly,
    Pre(PreRelease, u64),
    Final,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum DevKey {
    Dev(u64),
    NotDev,
}

/// A parsed release version. Parsing never fails; the original text is kept for display.
#[derive(Debug, Clone)]
pub struct Version {
    raw: String,
    release: Vec<u64>,
    pre: Option<(PreRelease, u64)>,
    post: Option<u64>,
    dev: Option<u64>,
    local: Option<String>,
}

fn number(caps: &regex::Captures, name: &str) -> u64 {
    caps.name(name)
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

impl Version {
    pub fn parse(input: &str) -> Self {
        let raw = input.trim().to_string();
        let lower = raw.to_ascii_lowercase();

        let Some(caps) = VERSION_RE.captures(&lower) else {
            return Version {
                raw,
                release: Vec::new(),
                pre: None,
                post: None,
                dev: None,
                local: Some(lower),
            };
        };

        let mut release: Vec<u64> = caps["release"]
            .split('.')
            .map(|part| part.parse().unwrap_or(u64::MAX))
            .collect();
        while release.last() == Some(&0) {
            release.pop();
        }

        let pre = caps
            .name("pre_l")
            .map(|label| (PreRelease::from_label(label.as_str()), number(&caps, "pre_n")));

        let post = if caps.name("post_n1").is_some() {
            Some(number(&caps, "post_n1"))
        } else if caps.name("post_l").is_some() {
            Some(number(&caps, "post_n2"))
        } else {
            None
        };

        let dev = caps.name("dev").map(|_| number(&caps, "dev_n"));

        let local = caps
            .name("rest")
            .map(|m| m.as_str().trim_start_matches(['+', '-', '_', '.']))
            .filter(|rest| !rest.is_empty())
            .map(String::from);

        Version {
            raw,
            release,
            pre,
            post,
            dev,
            local,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    fn phase(&self) -> Phase {
        match (self.pre, self.post, self.dev) {
            (Some((kind, n)), ..) => Phase::Pre(kind, n),
            (None, None, Some(_)) => Phase::DevOnly,
            _ => Phase::Final,
        }
    }

    fn dev_key(&self) -> DevKey {
        self.dev.map_or(DevKey::NotDev, DevKey::Dev)
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.release
            .cmp(&other.release)
            .then_with(|| self.phase().cmp(&other.phase()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<&str> for Version {
    fn from(value: &str) -> Self {
        Version::parse(value)
    }
}
