//! # Assembler
//!
//! Compiles assembly source to an opcode array in four stages:
//!
//! 1. [`tokenizer`] - pattern-table lexing into classified spans
//! 2. [`math`] - `%{ ... }` expression parsing (left-to-right, no precedence)
//! 3. [`parser`] - recursive descent into a linear IR plus a variable table
//! 4. [`codegen`] - two-pass lowering with label backpatching
//!
//! Compilation needs a target processor (its instruction set decides which
//! keywords exist, its register file decides which names are addressable,
//! and its memory size bounds the program). A [`Processor::dummy`] works for
//! verification without allocating real storage.
//!
//! The first error aborts the compile; the same source against the same
//! processor always produces byte-identical output.
//!
//! [`Processor::dummy`]: crate::Processor::dummy

pub mod codegen;
pub mod math;
pub mod parser;
pub mod tokenizer;

use std::path::{Path, PathBuf};

use crate::error::CompileError;
use crate::processor::ProcessorInterface;
use self::tokenizer::TokenDef;

pub use self::codegen::{CompiledProgram, LabelInfo};
pub use self::math::{MathExpr, VariableResolver};
pub use self::parser::{LazyValue, Node, VariableTable};
pub use self::tokenizer::Token;

/// Token classes of the assembly language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Comment,
    Newline,
    Whitespace,
    MathBlock,
    Directive,
    CompilerVar,
    LabelDecl,
    CharLiteral,
    StringLiteral,
    Number,
    OpenBracket,
    CloseBracket,
    OpenBrace,
    CloseBrace,
    Comma,
    Identifier,
    /// Spans no definition matched; always a syntax error downstream.
    Unknown,
}

/// The token definition table, in priority order.
///
/// Order matters twice: ties at the same position go to the earlier entry
/// (`LabelDecl` before `Identifier` makes `loop:` a declaration, not an
/// identifier followed by garbage), and `Number` precedes `Identifier` so
/// radix prefixes lex as one literal.
pub fn lexicon() -> Vec<TokenDef<TokenKind>> {
    vec![
        TokenDef::pattern(TokenKind::Comment, r";[^\n]*"),
        TokenDef::pattern(TokenKind::Newline, r"\r?\n"),
        TokenDef::pattern(TokenKind::Whitespace, r"[ \t]+"),
        TokenDef::pattern(TokenKind::MathBlock, r"%\{([^}]*)\}"),
        TokenDef::pattern(TokenKind::Directive, r"#[A-Za-z]+"),
        TokenDef::pattern(TokenKind::CompilerVar, r"@[A-Za-z_][A-Za-z0-9_]*"),
        TokenDef::pattern(TokenKind::LabelDecl, r"[A-Za-z_][A-Za-z0-9_]*:"),
        TokenDef::pattern(TokenKind::CharLiteral, r"'(\\[0-9]+;|\\.|[^'\\])'"),
        TokenDef::pattern(TokenKind::StringLiteral, r#""((?:\\[0-9]+;|\\.|[^"\\])*)""#),
        TokenDef::pattern(
            TokenKind::Number,
            r"[+-]?(?:0[xX][0-9a-fA-F][0-9a-fA-F_]*|0[oO][0-7][0-7_]*|0[bB][01][01_]*|[0-9][0-9_]*)",
        ),
        TokenDef::literal(TokenKind::OpenBracket, "[", false),
        TokenDef::literal(TokenKind::CloseBracket, "]", false),
        TokenDef::literal(TokenKind::OpenBrace, "{", false),
        TokenDef::literal(TokenKind::CloseBrace, "}", false),
        TokenDef::literal(TokenKind::Comma, ",", false),
        TokenDef::pattern(TokenKind::Identifier, r"[A-Za-z_][A-Za-z0-9_]*"),
    ]
}

/// Locates and reads `#INCLUDE` targets.
///
/// The returned path must be canonical; the parser uses it for include-once
/// deduplication.
pub trait IncludeResolver {
    fn resolve(&self, from: Option<&Path>, target: &str)
        -> Result<(PathBuf, String), CompileError>;
}

/// Filesystem resolver: targets are relative to the including file.
pub struct FsResolver;

impl IncludeResolver for FsResolver {
    fn resolve(
        &self,
        from: Option<&Path>,
        target: &str,
    ) -> Result<(PathBuf, String), CompileError> {
        let joined = match from.and_then(Path::parent) {
            Some(dir) => dir.join(target),
            None => PathBuf::from(target),
        };
        let path = joined.canonicalize().map_err(|source| CompileError::File {
            path: joined.clone(),
            source,
        })?;
        let text = std::fs::read_to_string(&path).map_err(|source| CompileError::File {
            path: path.clone(),
            source,
        })?;
        Ok((path, text))
    }
}

/// The compiler entry point, bound to a target processor.
pub struct Assembler<'a> {
    interface: &'a dyn ProcessorInterface,
    includes: Box<dyn IncludeResolver>,
}

impl<'a> Assembler<'a> {
    pub fn new(interface: &'a dyn ProcessorInterface) -> Self {
        Self::with_resolver(interface, Box::new(FsResolver))
    }

    /// An assembler with a custom include resolver (embedded sources, tests,
    /// sandboxed hosts).
    pub fn with_resolver(
        interface: &'a dyn ProcessorInterface,
        includes: Box<dyn IncludeResolver>,
    ) -> Self {
        Self {
            interface,
            includes,
        }
    }

    /// Compiles inline source text.
    pub fn compile(&self, source: &str) -> Result<CompiledProgram, CompileError> {
        self.compile_named(source, None)
    }

    /// Compiles a source file from disk.
    pub fn compile_file(&self, path: &Path) -> Result<CompiledProgram, CompileError> {
        let (path, source) = self
            .includes
            .resolve(None, &path.to_string_lossy())?;
        self.compile_named(&source, Some(path))
    }

    fn compile_named(
        &self,
        source: &str,
        file: Option<PathBuf>,
    ) -> Result<CompiledProgram, CompileError> {
        let word = self.interface.memory().word();
        let (nodes, variables) = parser::parse(
            source,
            file,
            self.interface,
            self.includes.as_ref(),
        )?;
        tracing::debug!(
            nodes = nodes.len(),
            variables = variables.len(),
            "source parsed"
        );
        let program = codegen::generate(&nodes, &variables, word)?;
        let size = self.interface.memory().size();
        if program.len() > size {
            // Loading would fail with an address error; surface it here,
            // where the dummy-processor path catches it too.
            return Err(CompileError::Oversize {
                cells: program.len(),
                size,
            });
        }
        Ok(program)
    }
}
