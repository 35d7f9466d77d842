use std::fmt;
use std::path::Path;
use std::str::FromStr;

use indexmap::IndexMap;

use super::Backend;
use crate::OutputSink;

/// Source language of a debugged program, used to select a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    /// Go.
    Go,

    /// Rust.
    Rust,

    /// C.
    C,

    /// C++.
    Cpp,

    /// Python.
    Python,
}

impl Language {
    const ALL: [(Self, &'static str, &'static [&'static str]); 5] = [
        (Self::Go, "go", &["go"]),
        (Self::Rust, "rust", &["rs"]),
        (Self::C, "c", &["c", "h"]),
        (Self::Cpp, "cpp", &["cpp", "cc", "cxx", "hpp", "hh"]),
        (Self::Python, "python", &["py"]),
    ];

    /// Returns the tag of this language.
    pub fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .find_map(|(lang, name, _)| (*lang == self).then_some(*name))
            .unwrap_or("unknown")
    }

    /// Returns the language of the given source file, based on its
    /// extension.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();

        Self::ALL
            .iter()
            .find_map(|(lang, _, exts)| exts.contains(&ext.as_str()).then_some(*lang))
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = s.to_ascii_lowercase();

        Self::ALL
            .iter()
            .find_map(|(lang, name, _)| (*name == tag).then_some(*lang))
            .ok_or_else(|| crate::Error::UnsupportedLanguage(s.to_owned()))
    }
}

/// Function constructing a backend for the given executable, project root
/// and output sink.
pub type Constructor<B> = Box<dyn Fn(&Path, &Path, OutputSink) -> crate::Result<B> + Send + Sync>;

/// Table of the available backends, keyed by language.
pub struct Registry<B> {
    constructors: IndexMap<Language, Constructor<B>>,
}

impl<B: Backend> Registry<B> {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self {
            constructors: IndexMap::new(),
        }
    }

    /// Registers the backend constructor of the given language.
    ///
    /// A previous constructor of that language is replaced.
    pub fn register<F>(mut self, lang: Language, constructor: F) -> Self
    where
        F: Fn(&Path, &Path, OutputSink) -> crate::Result<B> + Send + Sync + 'static,
    {
        self.constructors.insert(lang, Box::new(constructor));
        self
    }

    /// Returns the registered languages, in registration order.
    pub fn languages(&self) -> impl Iterator<Item = Language> + '_ {
        self.constructors.keys().copied()
    }

    /// Returns whether a backend is registered for the given language.
    pub fn supports(&self, lang: Language) -> bool {
        self.constructors.contains_key(&lang)
    }

    /// Constructs a backend for the given language.
    pub fn create(
        &self,
        lang: Language,
        exe: &Path,
        root: &Path,
        sink: OutputSink,
    ) -> crate::Result<B> {
        let constructor = self.constructors.get(&lang).ok_or_else(|| {
            tracing::warn!(%lang, "no debugger for file type");
            crate::Error::UnsupportedLanguage(lang.to_string())
        })?;

        constructor(exe, root, sink)
    }
}

impl<B: Backend> Default for Registry<B> {
    fn default() -> Self {
        Self::new()
    }
}
