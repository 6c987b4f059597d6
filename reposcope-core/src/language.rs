//! Language identities and their comment rules
//!
//! The table is static process data: every [`Language`] maps to exactly one
//! [`CommentRules`] value and nothing here is mutated at runtime.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Comment and string-literal delimiters for one language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentRules {
    /// Markers that start a comment running to the end of the line
    pub line_comments: &'static [&'static str],
    /// Open/close pairs of block comments
    pub block_comments: &'static [(&'static str, &'static str)],
    /// Characters that open and close a string literal on one line
    pub string_delimiters: &'static [char],
    /// Triple-quote markers: a comment when they open a line, a multi-line string anywhere
    /// else
    pub doc_strings: &'static [&'static str],
    /// `'x'` is a character literal, so a lone `'` must not start a string
    pub char_literals: bool,
}

impl CommentRules {
    /// Rules for files without a language: every non-blank line is code-equivalent
    pub const NONE: CommentRules = CommentRules {
        line_comments: &[],
        block_comments: &[],
        string_delimiters: &[],
        doc_strings: &[],
        char_literals: false,
    };

    pub fn has_comments(&self) -> bool {
        !self.line_comments.is_empty() || !self.block_comments.is_empty()
    }
}

const C_BLOCK: &[(&str, &str)] = &[("/*", "*/")];
const SLASH_LINE: &[&str] = &["//"];
const HASH_LINE: &[&str] = &["#"];
const DOUBLE_QUOTE: &[char] = &['"'];
const BOTH_QUOTES: &[char] = &['"', '\''];

const C_STYLE: CommentRules = CommentRules {
    line_comments: SLASH_LINE,
    block_comments: C_BLOCK,
    string_delimiters: BOTH_QUOTES,
    doc_strings: &[],
    char_literals: false,
};

const HASH_STYLE: CommentRules = CommentRules {
    line_comments: HASH_LINE,
    block_comments: &[],
    string_delimiters: BOTH_QUOTES,
    doc_strings: &[],
    char_literals: false,
};

const MARKUP_STYLE: CommentRules = CommentRules {
    line_comments: &[],
    block_comments: &[("<!--", "-->")],
    string_delimiters: &[],
    doc_strings: &[],
    char_literals: false,
};

/// A recognised programming, markup or data language
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Language {
    Rust,
    C,
    #[serde(rename = "C++")]
    Cpp,
    #[serde(rename = "C#")]
    CSharp,
    #[serde(rename = "Objective-C")]
    ObjectiveC,
    Java,
    Kotlin,
    Scala,
    Groovy,
    Swift,
    Go,
    Dart,
    JavaScript,
    TypeScript,
    #[serde(rename = "PHP")]
    Php,
    Python,
    Ruby,
    Perl,
    Lua,
    Shell,
    PowerShell,
    Batch,
    R,
    #[serde(rename = "MATLAB")]
    Matlab,
    Haskell,
    #[serde(rename = "OCaml")]
    OCaml,
    Elixir,
    Erlang,
    Clojure,
    Zig,
    Verilog,
    Coq,
    Prolog,
    #[serde(rename = "HTML")]
    Html,
    #[serde(rename = "XML")]
    Xml,
    #[serde(rename = "CSS")]
    Css,
    #[serde(rename = "SCSS")]
    Scss,
    Sass,
    Less,
    #[serde(rename = "SQL")]
    Sql,
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "YAML")]
    Yaml,
    #[serde(rename = "TOML")]
    Toml,
    #[serde(rename = "INI")]
    Ini,
    Makefile,
    Dockerfile,
    CMake,
}

impl Language {
    /// Display name, identical to the serialized identity
    pub fn name(self) -> &'static str {
        match self {
            Language::Rust => "Rust",
            Language::C => "C",
            Language::Cpp => "C++",
            Language::CSharp => "C#",
            Language::ObjectiveC => "Objective-C",
            Language::Java => "Java",
            Language::Kotlin => "Kotlin",
            Language::Scala => "Scala",
            Language::Groovy => "Groovy",
            Language::Swift => "Swift",
            Language::Go => "Go",
            Language::Dart => "Dart",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Php => "PHP",
            Language::Python => "Python",
            Language::Ruby => "Ruby",
            Language::Perl => "Perl",
            Language::Lua => "Lua",
            Language::Shell => "Shell",
            Language::PowerShell => "PowerShell",
            Language::Batch => "Batch",
            Language::R => "R",
            Language::Matlab => "MATLAB",
            Language::Haskell => "Haskell",
            Language::OCaml => "OCaml",
            Language::Elixir => "Elixir",
            Language::Erlang => "Erlang",
            Language::Clojure => "Clojure",
            Language::Zig => "Zig",
            Language::Verilog => "Verilog",
            Language::Coq => "Coq",
            Language::Prolog => "Prolog",
            Language::Html => "HTML",
            Language::Xml => "XML",
            Language::Css => "CSS",
            Language::Scss => "SCSS",
            Language::Sass => "Sass",
            Language::Less => "Less",
            Language::Sql => "SQL",
            Language::Json => "JSON",
            Language::Yaml => "YAML",
            Language::Toml => "TOML",
            Language::Ini => "INI",
            Language::Makefile => "Makefile",
            Language::Dockerfile => "Dockerfile",
            Language::CMake => "CMake",
        }
    }

    /// Comment and string rules used by the line counter
    pub fn rules(self) -> CommentRules {
        match self {
            Language::C
            | Language::Cpp
            | Language::CSharp
            | Language::ObjectiveC
            | Language::Java
            | Language::Kotlin
            | Language::Scala
            | Language::Groovy
            | Language::Swift
            | Language::Go
            | Language::Dart
            | Language::JavaScript
            | Language::TypeScript
            | Language::Verilog => C_STYLE,
            // Lifetimes and char literals make ' unreliable as a string delimiter
            Language::Rust | Language::Zig => CommentRules {
                line_comments: SLASH_LINE,
                block_comments: C_BLOCK,
                string_delimiters: DOUBLE_QUOTE,
                doc_strings: &[],
                char_literals: true,
            },
            Language::Php => CommentRules {
                line_comments: &["//", "#"],
                block_comments: C_BLOCK,
                string_delimiters: BOTH_QUOTES,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Python => CommentRules {
                line_comments: HASH_LINE,
                block_comments: &[],
                string_delimiters: BOTH_QUOTES,
                doc_strings: &["\"\"\"", "'''"],
                char_literals: false,
            },
            Language::Ruby => CommentRules {
                line_comments: HASH_LINE,
                block_comments: &[("=begin", "=end")],
                string_delimiters: BOTH_QUOTES,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Perl => CommentRules {
                line_comments: HASH_LINE,
                block_comments: &[("=pod", "=cut")],
                string_delimiters: BOTH_QUOTES,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Lua => CommentRules {
                line_comments: &["--"],
                block_comments: &[("--[[", "]]")],
                string_delimiters: BOTH_QUOTES,
                doc_strings: &[],
                char_literals: false,
            },
            Language::PowerShell => CommentRules {
                line_comments: HASH_LINE,
                block_comments: &[("<#", "#>")],
                string_delimiters: BOTH_QUOTES,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Batch => CommentRules {
                line_comments: &["::", "REM ", "rem ", "@REM ", "@rem "],
                block_comments: &[],
                string_delimiters: DOUBLE_QUOTE,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Matlab => CommentRules {
                line_comments: &["%"],
                block_comments: &[("%{", "%}")],
                string_delimiters: BOTH_QUOTES,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Haskell => CommentRules {
                line_comments: &["--"],
                block_comments: &[("{-", "-}")],
                string_delimiters: DOUBLE_QUOTE,
                doc_strings: &[],
                char_literals: false,
            },
            Language::OCaml | Language::Coq => CommentRules {
                line_comments: &[],
                block_comments: &[("(*", "*)")],
                string_delimiters: DOUBLE_QUOTE,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Erlang => CommentRules {
                line_comments: &["%"],
                block_comments: &[],
                string_delimiters: DOUBLE_QUOTE,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Prolog => CommentRules {
                line_comments: &["%"],
                block_comments: C_BLOCK,
                string_delimiters: BOTH_QUOTES,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Clojure => CommentRules {
                line_comments: &[";"],
                block_comments: &[],
                string_delimiters: DOUBLE_QUOTE,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Sql => CommentRules {
                line_comments: &["--"],
                block_comments: C_BLOCK,
                string_delimiters: &['\''],
                doc_strings: &[],
                char_literals: false,
            },
            Language::Css => CommentRules {
                line_comments: &[],
                block_comments: C_BLOCK,
                string_delimiters: BOTH_QUOTES,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Scss | Language::Sass | Language::Less => C_STYLE,
            Language::Html | Language::Xml => MARKUP_STYLE,
            Language::Json => CommentRules {
                line_comments: &[],
                block_comments: &[],
                string_delimiters: DOUBLE_QUOTE,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Ini => CommentRules {
                line_comments: &[";", "#"],
                block_comments: &[],
                string_delimiters: &[],
                doc_strings: &[],
                char_literals: false,
            },
            Language::CMake => CommentRules {
                line_comments: HASH_LINE,
                block_comments: &[("#[[", "]]")],
                string_delimiters: DOUBLE_QUOTE,
                doc_strings: &[],
                char_literals: false,
            },
            Language::Shell
            | Language::R
            | Language::Elixir
            | Language::Yaml
            | Language::Toml
            | Language::Makefile
            | Language::Dockerfile => HASH_STYLE,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
