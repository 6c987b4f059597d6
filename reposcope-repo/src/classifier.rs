//! Language detection from file names, extensions and content

use regex::Regex;
use reposcope_core::{ErrorContext, Language, ReposcopeError, ReposcopeResult};
use std::collections::HashMap;
use std::path::Path;

/// Number of leading lines inspected by content heuristics
pub const SNIFF_LINES: usize = 50;

/// Result of classifying one file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Source(Language),
    /// Documentation and plain text; counted but never attributed to a language
    Prose,
    Unknown,
}

impl Classification {
    pub fn language(self) -> Option<Language> {
        match self {
            Classification::Source(language) => Some(language),
            Classification::Prose | Classification::Unknown => None,
        }
    }
}

/// What the path alone says about a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatch {
    Exact(Language),
    /// Extension shared by several languages; the first candidate is the fallback
    Ambiguous(&'static [Language]),
    Prose,
    NoMatch,
}

const C_FAMILY_HEADER: &[Language] = &[Language::C, Language::Cpp, Language::ObjectiveC];
const DOT_M: &[Language] = &[Language::ObjectiveC, Language::Matlab];
const DOT_PL: &[Language] = &[Language::Perl, Language::Prolog];
const DOT_V: &[Language] = &[Language::Verilog, Language::Coq];

const AMBIGUOUS_EXTENSIONS: &[(&str, &[Language])] = &[
    ("h", C_FAMILY_HEADER),
    ("m", DOT_M),
    ("pl", DOT_PL),
    ("v", DOT_V),
];

const EXTENSIONS: &[(&str, Language)] = &[
    ("rs", Language::Rust),
    ("c", Language::C),
    ("cc", Language::Cpp),
    ("cpp", Language::Cpp),
    ("cxx", Language::Cpp),
    ("c++", Language::Cpp),
    ("hpp", Language::Cpp),
    ("hh", Language::Cpp),
    ("hxx", Language::Cpp),
    ("ipp", Language::Cpp),
    ("cs", Language::CSharp),
    ("mm", Language::ObjectiveC),
    ("java", Language::Java),
    ("kt", Language::Kotlin),
    ("kts", Language::Kotlin),
    ("scala", Language::Scala),
    ("sc", Language::Scala),
    ("groovy", Language::Groovy),
    ("gradle", Language::Groovy),
    ("swift", Language::Swift),
    ("go", Language::Go),
    ("dart", Language::Dart),
    ("js", Language::JavaScript),
    ("mjs", Language::JavaScript),
    ("cjs", Language::JavaScript),
    ("jsx", Language::JavaScript),
    ("ts", Language::TypeScript),
    ("tsx", Language::TypeScript),
    ("mts", Language::TypeScript),
    ("cts", Language::TypeScript),
    ("php", Language::Php),
    ("py", Language::Python),
    ("pyw", Language::Python),
    ("pyi", Language::Python),
    ("rb", Language::Ruby),
    ("rake", Language::Ruby),
    ("gemspec", Language::Ruby),
    ("pm", Language::Perl),
    ("lua", Language::Lua),
    ("sh", Language::Shell),
    ("bash", Language::Shell),
    ("zsh", Language::Shell),
    ("ksh", Language::Shell),
    ("fish", Language::Shell),
    ("ps1", Language::PowerShell),
    ("psm1", Language::PowerShell),
    ("psd1", Language::PowerShell),
    ("bat", Language::Batch),
    ("cmd", Language::Batch),
    ("r", Language::R),
    ("hs", Language::Haskell),
    ("lhs", Language::Haskell),
    ("ml", Language::OCaml),
    ("mli", Language::OCaml),
    ("ex", Language::Elixir),
    ("exs", Language::Elixir),
    ("erl", Language::Erlang),
    ("hrl", Language::Erlang),
    ("clj", Language::Clojure),
    ("cljs", Language::Clojure),
    ("cljc", Language::Clojure),
    ("edn", Language::Clojure),
    ("zig", Language::Zig),
    ("sv", Language::Verilog),
    ("svh", Language::Verilog),
    ("html", Language::Html),
    ("htm", Language::Html),
    ("xhtml", Language::Html),
    ("xml", Language::Xml),
    ("xsd", Language::Xml),
    ("xsl", Language::Xml),
    ("svg", Language::Xml),
    ("plist", Language::Xml),
    ("css", Language::Css),
    ("scss", Language::Scss),
    ("sass", Language::Sass),
    ("less", Language::Less),
    ("sql", Language::Sql),
    ("json", Language::Json),
    ("yaml", Language::Yaml),
    ("yml", Language::Yaml),
    ("toml", Language::Toml),
    ("ini", Language::Ini),
    ("cfg", Language::Ini),
    ("conf", Language::Ini),
    ("mk", Language::Makefile),
    ("mak", Language::Makefile),
    ("dockerfile", Language::Dockerfile),
    ("cmake", Language::CMake),
];

const PROSE_EXTENSIONS: &[&str] = &[
    "md", "markdown", "mdx", "rst", "adoc", "asciidoc", "txt", "text",
];

const FILE_NAMES: &[(&str, Language)] = &[
    ("Makefile", Language::Makefile),
    ("makefile", Language::Makefile),
    ("GNUmakefile", Language::Makefile),
    ("Dockerfile", Language::Dockerfile),
    ("Containerfile", Language::Dockerfile),
    ("CMakeLists.txt", Language::CMake),
    ("Gemfile", Language::Ruby),
    ("Rakefile", Language::Ruby),
    ("Vagrantfile", Language::Ruby),
    ("Jenkinsfile", Language::Groovy),
];

const INTERPRETERS: &[(&str, Language)] = &[
    ("python", Language::Python),
    ("sh", Language::Shell),
    ("bash", Language::Shell),
    ("zsh", Language::Shell),
    ("ksh", Language::Shell),
    ("dash", Language::Shell),
    ("fish", Language::Shell),
    ("node", Language::JavaScript),
    ("nodejs", Language::JavaScript),
    ("deno", Language::TypeScript),
    ("ruby", Language::Ruby),
    ("perl", Language::Perl),
    ("php", Language::Php),
    ("lua", Language::Lua),
    ("pwsh", Language::PowerShell),
    ("Rscript", Language::R),
    ("elixir", Language::Elixir),
    ("escript", Language::Erlang),
];

/// Content markers tried in order; the first one whose language is a candidate wins
const MARKERS: &[(Language, &str)] = &[
    (
        Language::ObjectiveC,
        r"(?m)^\s*(@interface|@implementation|@protocol|@end\b|#import\b)",
    ),
    (
        Language::Cpp,
        r"(?m)(^\s*(class\s+\w+|namespace\s+\w+|template\s*<|using\s+namespace\b)|std::|#include\s*<(iostream|string|vector|memory|map)>|^\s*(public|private|protected):)",
    ),
    (
        Language::Perl,
        r"(?m)^\s*(use\s+(strict|warnings)\b|my\s+[$@%]|sub\s+\w+|package\s+[\w:]+;)",
    ),
    (Language::Prolog, r"(?m)^[a-z]\w*(\(.*\))?\s*:-"),
    (Language::Matlab, r"(?m)^\s*(function\b|%)"),
    (
        Language::Coq,
        r"(?m)^\s*(Theorem|Lemma|Proof\.|Qed\.|Definition|Inductive|Fixpoint|Require\s+Import)\b",
    ),
];

/// Maps files to languages. Owns its lookup tables, so callers pass it around explicitly.
#[derive(Debug)]
pub struct LanguageClassifier {
    by_extension: HashMap<&'static str, PathMatch>,
    by_file_name: HashMap<&'static str, Language>,
    shebang: Regex,
    markers: Vec<(Language, Regex)>,
}

impl LanguageClassifier {
    pub fn new() -> ReposcopeResult<Self> {
        let mut by_extension = HashMap::new();
        for (extension, language) in EXTENSIONS {
            by_extension.insert(*extension, PathMatch::Exact(*language));
        }
        for (extension, candidates) in AMBIGUOUS_EXTENSIONS {
            by_extension.insert(*extension, PathMatch::Ambiguous(candidates));
        }
        for extension in PROSE_EXTENSIONS {
            by_extension.insert(*extension, PathMatch::Prose);
        }

        let markers = MARKERS
            .iter()
            .map(|(language, pattern)| Ok((*language, compile(pattern)?)))
            .collect::<ReposcopeResult<Vec<_>>>()?;

        Ok(Self {
            by_extension,
            by_file_name: FILE_NAMES.iter().copied().collect(),
            shebang: compile(r"^#!\s*(?:\S*/)?(?:env\s+(?:-\S+\s+)*)?([A-Za-z]+)")?,
            markers,
        })
    }

    /// Classify from the path only. File names win over extensions, so
    /// `CMakeLists.txt` is CMake rather than prose.
    pub fn classify_path(&self, path: &Path) -> PathMatch {
        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");

        if let Some(language) = self.by_file_name.get(file_name) {
            return PathMatch::Exact(*language);
        }
        if file_name.starts_with("Dockerfile.") {
            return PathMatch::Exact(Language::Dockerfile);
        }

        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.by_extension.get(ext.to_ascii_lowercase().as_str()))
            .copied()
            .unwrap_or(PathMatch::NoMatch)
    }

    /// Classify a file, consulting `content` for ambiguous extensions and extensionless
    /// scripts. Without content an ambiguous extension resolves to its first candidate.
    pub fn classify(&self, path: &Path, content: Option<&str>) -> Classification {
        match self.classify_path(path) {
            PathMatch::Exact(language) => Classification::Source(language),
            PathMatch::Prose => Classification::Prose,
            PathMatch::Ambiguous(candidates) => {
                let language = content
                    .and_then(|text| self.resolve_ambiguous(candidates, &head(text)))
                    .unwrap_or(candidates[0]);
                Classification::Source(language)
            }
            PathMatch::NoMatch => content
                .and_then(|text| self.from_shebang(text))
                .map(Classification::Source)
                .unwrap_or(Classification::Unknown),
        }
    }

    fn resolve_ambiguous(&self, candidates: &[Language], head: &str) -> Option<Language> {
        self.markers
            .iter()
            .filter(|(language, _)| candidates.contains(language))
            .find(|(_, pattern)| pattern.is_match(head))
            .map(|(language, _)| *language)
    }

    fn from_shebang(&self, content: &str) -> Option<Language> {
        let first_line = content.lines().next()?;
        let interpreter = self.shebang.captures(first_line)?.get(1)?.as_str();
        INTERPRETERS
            .iter()
            .find(|(name, _)| *name == interpreter)
            .map(|(_, language)| *language)
    }
}

fn head(text: &str) -> String {
    text.lines().take(SNIFF_LINES).collect::<Vec<_>>().join("\n")
}

fn compile(pattern: &str) -> ReposcopeResult<Regex> {
    Regex::new(pattern).map_err(|e| ReposcopeError::Internal {
        message: format!("Invalid classifier pattern '{}': {}", pattern, e),
        source: Some(Box::new(e)),
        context: ErrorContext::new("language_classifier").with_operation("compile"),
    })
}
