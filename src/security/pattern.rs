use globset::{GlobBuilder, GlobMatcher};

/// A glob matched against POSIX-style paths relative to the repository root
///
/// `*` may cross `/`, so `data/*` also covers nested files. A pattern ending
/// in `/**` also matches the bare prefix, which lets `.git/**` cover the
/// `.git` directory itself.
#[derive(Debug, Clone)]
pub struct Pattern {
    raw: String,
    matcher: GlobMatcher,
    bare_prefix: Option<GlobMatcher>,
}

impl Pattern {
    pub fn new(raw: &str) -> Result<Self, globset::Error> {
        let matcher = compile(raw)?;

        let bare_prefix = match raw.strip_suffix("/**") {
            Some(prefix) if !prefix.is_empty() => Some(compile(prefix)?),
            _ => None,
        };

        Ok(Self {
            raw: raw.to_string(),
            matcher,
            bare_prefix,
        })
    }

    pub fn is_match(&self, rel_path: &str) -> bool {
        self.matcher.is_match(rel_path)
            || self
                .bare_prefix
                .as_ref()
                .is_some_and(|prefix| prefix.is_match(rel_path))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn compile(pattern: &str) -> Result<GlobMatcher, globset::Error> {
    let glob = GlobBuilder::new(pattern).literal_separator(false).build()?;
    Ok(glob.compile_matcher())
}

/// An ordered list of patterns; a path matches the set if any pattern matches
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    patterns: Vec<Pattern>,
}

impl PatternSet {
    pub fn new(patterns: Vec<Pattern>) -> Self {
        Self { patterns }
    }

    /// Compile every raw pattern, failing on the first invalid one
    pub fn compile<S: AsRef<str>>(raw: &[S]) -> Result<Self, (String, globset::Error)> {
        let patterns = raw
            .iter()
            .map(|p| Pattern::new(p.as_ref()).map_err(|e| (p.as_ref().to_string(), e)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, rel_path: &str) -> bool {
        self.first_match(rel_path).is_some()
    }

    /// The first pattern matching `rel_path`, if any
    pub fn first_match(&self, rel_path: &str) -> Option<&Pattern> {
        self.patterns.iter().find(|p| p.is_match(rel_path))
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }
}
