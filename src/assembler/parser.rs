//! Recursive-descent parser producing the linear IR.
//!
//! The parser walks the token stream (comments, whitespace and newlines
//! already filtered out) and appends [`Node`]s to a flat program list. Every
//! node later occupies zero or more cells of the opcode array; no tree
//! survives past this stage.
//!
//! Statements:
//!
//! ```text
//! name:                       label declaration
//! @NAME value                 compiler variable declaration
//! #DW item, item, ...         emit data words
//! #DS "text"                  emit a string, one cell per character
//! #DA length { item, ... }    emit an array (unfilled cells are zero)
//! #INCLUDE "path"             splice another source file (include-once)
//! KEYWORD arg, arg            instruction
//! ```
//!
//! Register and flag operands are resolved here against the target
//! processor: a name with a memory address becomes that address, a name
//! without one (such as the cycle counter) is a compile error.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use crate::assembler::math::{MathExpr, VariableResolver};
use crate::assembler::tokenizer::{tokenize, Token};
use crate::assembler::{lexicon, IncludeResolver, TokenKind};
use crate::error::{CompileError, Location};
use crate::instruction::Instruction;
use crate::processor::ProcessorInterface;

/// A value that is evaluated at code generation, not at parse time.
///
/// Evaluation is a re-invoked pure function: nothing is memoized, and the
/// cycle-detection stack is an explicit parameter.
#[derive(Debug, Clone)]
pub enum LazyValue {
    Const(i64),
    Math(MathExpr),
    Variable { name: String, location: Location },
}

impl LazyValue {
    pub fn eval(
        &self,
        variables: &VariableTable,
        stack: &mut Vec<String>,
    ) -> Result<f64, CompileError> {
        match self {
            LazyValue::Const(value) => Ok(*value as f64),
            LazyValue::Math(expr) => expr.eval(variables, stack),
            LazyValue::Variable { name, location } => match variables.resolve(name, stack)? {
                Some(value) => Ok(value),
                None => Err(CompileError::Reference {
                    name: name.clone(),
                    location: location.clone(),
                }),
            },
        }
    }
}

/// Compiler variables declared with `@NAME value`.
///
/// Keys are stored without the `@` sigil. Values stay lazy; resolution
/// happens at code generation against the final table, so declaration order
/// does not matter (forward references between variables are legal as long
/// as they terminate).
#[derive(Debug, Default)]
pub struct VariableTable {
    entries: std::collections::HashMap<String, (LazyValue, Location)>,
}

impl VariableTable {
    pub fn declare(
        &mut self,
        name: &str,
        value: LazyValue,
        location: Location,
    ) -> Result<(), CompileError> {
        if let Some((_, first)) = self.entries.get(name) {
            return Err(CompileError::Type {
                message: format!("variable `@{}` already declared at {}", name, first),
                location,
            });
        }
        self.entries.insert(name.to_string(), (value, location));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl VariableResolver for VariableTable {
    fn resolve(&self, name: &str, stack: &mut Vec<String>) -> Result<Option<f64>, CompileError> {
        let Some((value, declared_at)) = self.entries.get(name) else {
            return Ok(None);
        };
        if stack.iter().any(|entry| entry == name) {
            let mut chain = stack.clone();
            chain.push(name.to_string());
            return Err(CompileError::Circular {
                chain,
                declared_at: declared_at.clone(),
            });
        }
        stack.push(name.to_string());
        let result = value.eval(self, stack);
        stack.pop();
        match result {
            Ok(value) => Ok(Some(value)),
            // A cycle already names the whole chain; anything else gets
            // wrapped so the error says which variable failed to resolve.
            Err(error @ CompileError::Circular { .. }) => Err(error),
            Err(error) => Err(CompileError::Variable {
                name: name.to_string(),
                message: error.to_string(),
            }),
        }
    }
}

/// One element of the linear IR. The set is closed; code generation matches
/// exhaustively and the compiler enforces that every new node kind is
/// handled there.
#[derive(Debug, Clone)]
pub enum Node {
    /// An instruction's opcode cell.
    Instruction {
        instruction: Arc<Instruction>,
        location: Location,
    },
    /// One cell holding a lazily evaluated value.
    Value { value: LazyValue, location: Location },
    /// One cell holding a register's memory address.
    Register {
        address: usize,
        name: String,
        location: Location,
    },
    /// Declaration point of a label (occupies no cells).
    LabelDecl { name: String, location: Location },
    /// One cell to be backpatched with a label's address plus an offset.
    LabelUsage {
        name: String,
        offset: Option<LazyValue>,
        location: Location,
    },
    /// One cell holding an address relative to the cell's own position.
    SelfOffset { value: LazyValue, location: Location },
    /// One cell per character.
    Str { text: String, location: Location },
    /// `length` cells, the first `values.len()` of them initialized. The
    /// length is lazy like any other value; it resolves at code generation,
    /// so variables declared later in the file are legal here.
    Array {
        length: LazyValue,
        values: Vec<LazyValue>,
        location: Location,
    },
}

/// Parses a complete source text (following includes) into the linear IR
/// and the compiler-variable table.
pub fn parse(
    source: &str,
    file: Option<PathBuf>,
    interface: &dyn ProcessorInterface,
    includes: &dyn IncludeResolver,
) -> Result<(Vec<Node>, VariableTable), CompileError> {
    let mut nodes = Vec::new();
    let mut variables = VariableTable::default();
    let mut included = HashSet::new();
    if let Some(path) = &file {
        included.insert(path.clone());
    }
    parse_into(
        source,
        file,
        interface,
        includes,
        &mut nodes,
        &mut variables,
        &mut included,
    )?;
    Ok((nodes, variables))
}

fn parse_into(
    source: &str,
    file: Option<PathBuf>,
    interface: &dyn ProcessorInterface,
    includes: &dyn IncludeResolver,
    nodes: &mut Vec<Node>,
    variables: &mut VariableTable,
    included: &mut HashSet<PathBuf>,
) -> Result<(), CompileError> {
    let tokens: Vec<Token<TokenKind>> = tokenize(source, &lexicon(), TokenKind::Unknown)
        .into_iter()
        .filter(|token| {
            !matches!(
                token.kind,
                TokenKind::Comment | TokenKind::Whitespace | TokenKind::Newline
            )
        })
        .collect();

    let mut parser = Parser {
        tokens,
        position: 0,
        file,
        interface,
    };

    while let Some(token) = parser.peek() {
        let location = parser.location(token);
        match token.kind {
            TokenKind::LabelDecl => {
                let name = token.text.trim_end_matches(':').to_string();
                parser.position += 1;
                nodes.push(Node::LabelDecl { name, location });
            }
            TokenKind::CompilerVar => {
                let name = token.text.trim_start_matches('@').to_string();
                parser.position += 1;
                let value = parser.lazy_value("variable value")?;
                variables.declare(&name, value, location)?;
            }
            TokenKind::Directive => {
                let directive = token.text.to_uppercase();
                parser.position += 1;
                parser.directive(&directive, location, nodes, variables, includes, included)?;
            }
            TokenKind::Identifier => {
                parser.instruction(nodes)?;
            }
            _ => {
                return Err(CompileError::Syntax {
                    expected: "instruction keyword, directive, label or variable declaration"
                        .to_string(),
                    found: format!("`{}`", token.text),
                    location,
                });
            }
        }
    }
    Ok(())
}

struct Parser<'a> {
    tokens: Vec<Token<TokenKind>>,
    position: usize,
    file: Option<PathBuf>,
    interface: &'a dyn ProcessorInterface,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&Token<TokenKind>> {
        self.tokens.get(self.position)
    }

    fn next(&mut self) -> Option<Token<TokenKind>> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn location(&self, token: &Token<TokenKind>) -> Location {
        Location::in_file(self.file.clone(), token.line, token.column)
    }

    fn end_location(&self) -> Location {
        self.tokens
            .last()
            .map(|token| self.location(token))
            .unwrap_or_default()
    }

    fn syntax(&self, expected: &str) -> CompileError {
        match self.peek() {
            Some(token) => CompileError::Syntax {
                expected: expected.to_string(),
                found: format!("`{}`", token.text),
                location: self.location(token),
            },
            None => CompileError::Syntax {
                expected: expected.to_string(),
                found: "end of input".to_string(),
                location: self.end_location(),
            },
        }
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token<TokenKind>, CompileError> {
        match self.peek() {
            Some(token) if token.kind == kind => Ok(self.next().unwrap_or_else(|| unreachable!())),
            _ => Err(self.syntax(expected)),
        }
    }

    fn skip_comma(&mut self) {
        if matches!(self.peek(), Some(token) if token.kind == TokenKind::Comma) {
            self.position += 1;
        }
    }

    // ===== Statements =====

    fn instruction(&mut self, nodes: &mut Vec<Node>) -> Result<(), CompileError> {
        let token = self.next().ok_or_else(|| self.syntax("instruction"))?;
        let location = self.location(&token);
        let keyword = token.text.to_uppercase();

        let Some(instruction) = self.interface.instruction_set().by_keyword(&keyword) else {
            return Err(CompileError::Syntax {
                expected: "instruction keyword".to_string(),
                found: format!("`{}`", token.text),
                location,
            });
        };
        let instruction = instruction.clone();

        nodes.push(Node::Instruction {
            instruction: instruction.clone(),
            location,
        });
        for index in 1..=instruction.arg_count() {
            if index > 1 {
                self.skip_comma();
            }
            let node = self
                .argument()
                .map_err(|error| self.argument_error(&instruction, index, error))?;
            nodes.push(node);
        }
        Ok(())
    }

    fn argument_error(
        &self,
        instruction: &Instruction,
        index: usize,
        error: CompileError,
    ) -> CompileError {
        match error {
            // Operand resolution failures keep their specific variant.
            error @ (CompileError::Processor { .. } | CompileError::Type { .. }) => error,
            CompileError::Syntax {
                expected,
                found,
                location,
            } => CompileError::Arguments {
                instruction: instruction.keyword().to_string(),
                index,
                message: format!("expected {}, found {}", expected, found),
                location,
            },
            other => other,
        }
    }

    fn directive(
        &mut self,
        directive: &str,
        location: Location,
        nodes: &mut Vec<Node>,
        variables: &mut VariableTable,
        includes: &dyn IncludeResolver,
        included: &mut HashSet<PathBuf>,
    ) -> Result<(), CompileError> {
        match directive {
            "#DW" => loop {
                nodes.push(self.data_item()?);
                if matches!(self.peek(), Some(token) if token.kind == TokenKind::Comma) {
                    self.position += 1;
                } else {
                    return Ok(());
                }
            },
            "#DS" => {
                let token = self.expect(TokenKind::StringLiteral, "string literal")?;
                let location = self.location(&token);
                let text = unescape(group_text(&token), &location)?;
                nodes.push(Node::Str { text, location });
                Ok(())
            }
            "#DA" => {
                let length = self.lazy_value("array length")?;
                let mut values = Vec::new();
                if matches!(self.peek(), Some(token) if token.kind == TokenKind::OpenBrace) {
                    self.position += 1;
                    while !matches!(self.peek(), Some(token) if token.kind == TokenKind::CloseBrace)
                    {
                        values.push(self.lazy_value("array value")?);
                        self.skip_comma();
                    }
                    self.expect(TokenKind::CloseBrace, "`}`")?;
                }
                nodes.push(Node::Array {
                    length,
                    values,
                    location,
                });
                Ok(())
            }
            "#INCLUDE" => {
                let token = self.expect(TokenKind::StringLiteral, "include path")?;
                let include_location = self.location(&token);
                let target = unescape(group_text(&token), &include_location)?;
                let (path, text) = includes.resolve(self.file.as_deref(), &target)?;
                // Include-once: a file spliced twice would double its code
                // and redeclare its labels.
                if included.insert(path.clone()) {
                    tracing::debug!(path = %path.display(), "including source file");
                    parse_into(
                        &text,
                        Some(path),
                        self.interface,
                        includes,
                        nodes,
                        variables,
                        included,
                    )?;
                }
                Ok(())
            }
            other => Err(CompileError::Syntax {
                expected: "#DW, #DS, #DA or #INCLUDE".to_string(),
                found: format!("`{}`", other),
                location,
            }),
        }
    }

    // ===== Values and operands =====

    /// A plain value item: number, math block, character or variable.
    fn lazy_value(&mut self, expected: &str) -> Result<LazyValue, CompileError> {
        let Some(token) = self.peek() else {
            return Err(self.syntax(expected));
        };
        let location = self.location(token);
        match token.kind {
            TokenKind::Number => {
                let text = token.text.clone();
                self.position += 1;
                Ok(LazyValue::Const(parse_int(&text).ok_or_else(|| {
                    CompileError::Type {
                        message: format!("numeric literal `{}` does not fit", text),
                        location,
                    }
                })?))
            }
            TokenKind::MathBlock => {
                let inner = group_text(token);
                let expr = MathExpr::parse(&inner, location)?;
                self.position += 1;
                Ok(LazyValue::Math(expr))
            }
            TokenKind::CharLiteral => {
                let inner = group_text(token).to_string();
                let text = unescape(&inner, &location)?;
                self.position += 1;
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(ch), None) => Ok(LazyValue::Const(i64::from(u32::from(ch)))),
                    _ => Err(CompileError::Type {
                        message: format!("`'{}'` is not a single character", inner),
                        location,
                    }),
                }
            }
            TokenKind::CompilerVar => {
                let name = token.text.trim_start_matches('@').to_string();
                self.position += 1;
                Ok(LazyValue::Variable { name, location })
            }
            _ => Err(self.syntax(expected)),
        }
    }

    /// An instruction operand or `#DW` item.
    fn argument(&mut self) -> Result<Node, CompileError> {
        let Some(token) = self.peek() else {
            return Err(self.syntax("operand"));
        };
        let location = self.location(token);
        match token.kind {
            TokenKind::Number
            | TokenKind::MathBlock
            | TokenKind::CharLiteral
            | TokenKind::CompilerVar => {
                let value = self.lazy_value("operand")?;
                Ok(Node::Value { value, location })
            }
            TokenKind::OpenBracket => {
                self.position += 1;
                let value = self.lazy_value("offset value")?;
                self.expect(TokenKind::CloseBracket, "`]`")?;
                Ok(Node::SelfOffset { value, location })
            }
            TokenKind::Identifier => {
                let name = token.text.clone();
                self.position += 1;
                self.name_operand(name, location)
            }
            _ => Err(self.syntax("operand")),
        }
    }

    /// An identifier operand: register, flag, or label usage.
    fn name_operand(&mut self, name: String, location: Location) -> Result<Node, CompileError> {
        let upper = name.to_uppercase();
        let mapped = self
            .interface
            .register(&upper)
            .map(|register| register.address())
            .or_else(|| self.interface.flag(&upper).map(|flag| flag.address()));
        if let Some(address) = mapped {
            return match address {
                Some(address) => Ok(Node::Register {
                    address,
                    name: upper,
                    location,
                }),
                None => Err(CompileError::Processor {
                    name: upper,
                    location,
                }),
            };
        }

        let offset = if matches!(self.peek(), Some(token) if token.kind == TokenKind::OpenBracket) {
            self.position += 1;
            let value = self.lazy_value("offset value")?;
            self.expect(TokenKind::CloseBracket, "`]`")?;
            Some(value)
        } else {
            None
        };
        Ok(Node::LabelUsage {
            name,
            offset,
            location,
        })
    }

    /// A `#DW` item: any operand plus string literals.
    fn data_item(&mut self) -> Result<Node, CompileError> {
        if let Some(token) = self.peek() {
            if token.kind == TokenKind::StringLiteral {
                let location = self.location(token);
                let text = unescape(group_text(token), &location)?;
                self.position += 1;
                return Ok(Node::Str { text, location });
            }
        }
        self.argument()
    }
}

fn group_text(token: &Token<TokenKind>) -> &str {
    token
        .groups
        .first()
        .and_then(|group| group.as_deref())
        .unwrap_or("")
}

/// Parses a signed integer literal with optional radix prefix and `_`
/// separators.
pub(crate) fn parse_int(text: &str) -> Option<i64> {
    let text: String = text.chars().filter(|c| *c != '_').collect();
    let (sign, body) = match text.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, text.strip_prefix('+').unwrap_or(&text)),
    };
    let magnitude = if let Some(hex) = body.strip_prefix("0x").or_else(|| body.strip_prefix("0X")) {
        i64::from_str_radix(hex, 16).ok()?
    } else if let Some(oct) = body.strip_prefix("0o").or_else(|| body.strip_prefix("0O")) {
        i64::from_str_radix(oct, 8).ok()?
    } else if let Some(bin) = body.strip_prefix("0b").or_else(|| body.strip_prefix("0B")) {
        i64::from_str_radix(bin, 2).ok()?
    } else {
        body.parse::<i64>().ok()?
    };
    Some(sign * magnitude)
}

/// Resolves escape sequences in character and string literals.
///
/// Supported: `\n \t \r \0 \\ \' \"` and `\<decimal>;` for an arbitrary
/// code point.
pub(crate) fn unescape(text: &str, location: &Location) -> Result<String, CompileError> {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') if chars.peek().map(char::is_ascii_digit) != Some(true) => {
                result.push('\0')
            }
            Some('\\') => result.push('\\'),
            Some('\'') => result.push('\''),
            Some('"') => result.push('"'),
            Some(digit) if digit.is_ascii_digit() => {
                let mut code = String::from(digit);
                loop {
                    match chars.next() {
                        Some(';') => break,
                        Some(next) if next.is_ascii_digit() => code.push(next),
                        _ => {
                            return Err(CompileError::Type {
                                message: format!("escape `\\{}` is missing its `;`", code),
                                location: location.clone(),
                            })
                        }
                    }
                }
                let point = code.parse::<u32>().ok().and_then(char::from_u32);
                match point {
                    Some(ch) => result.push(ch),
                    None => {
                        return Err(CompileError::Type {
                            message: format!("`\\{};` is not a valid code point", code),
                            location: location.clone(),
                        })
                    }
                }
            }
            Some(other) => {
                return Err(CompileError::Type {
                    message: format!("unknown escape `\\{}`", other),
                    location: location.clone(),
                })
            }
            None => {
                return Err(CompileError::Type {
                    message: "dangling `\\` at end of literal".to_string(),
                    location: location.clone(),
                })
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assembler::FsResolver;
    use crate::instructions::default_set;
    use crate::{Processor, Word};

    fn parse_source(source: &str) -> Result<(Vec<Node>, VariableTable), CompileError> {
        let processor = Processor::dummy(
            Word::new(8).unwrap(),
            256,
            Arc::new(default_set()),
        )
        .unwrap();
        parse(source, None, processor.as_ref(), &FsResolver)
    }

    #[test]
    fn test_instruction_with_operands() {
        let (nodes, _) = parse_source("ADD 100, 101").unwrap();
        assert_eq!(nodes.len(), 3);
        assert!(matches!(&nodes[0], Node::Instruction { instruction, .. }
            if instruction.keyword() == "ADD"));
        assert!(matches!(&nodes[1], Node::Value { value: LazyValue::Const(100), .. }));
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        let (nodes, _) = parse_source("add 1, 2").unwrap();
        assert!(matches!(&nodes[0], Node::Instruction { instruction, .. }
            if instruction.keyword() == "ADD"));
    }

    #[test]
    fn test_register_operand_resolves_to_address() {
        let (nodes, _) = parse_source("INC ax").unwrap();
        assert!(matches!(&nodes[1], Node::Register { address: 248, name, .. }
            if name == "AX"));
    }

    #[test]
    fn test_unaddressed_register_is_rejected() {
        let error = parse_source("INC CYC").unwrap_err();
        assert!(matches!(error, CompileError::Processor { name, .. } if name == "CYC"));
    }

    #[test]
    fn test_label_declaration_and_usage_with_offset() {
        let (nodes, _) = parse_source("loop:\nJMP loop[2]").unwrap();
        assert!(matches!(&nodes[0], Node::LabelDecl { name, .. } if name == "loop"));
        assert!(matches!(&nodes[2], Node::LabelUsage { name, offset: Some(_), .. }
            if name == "loop"));
    }

    #[test]
    fn test_variable_declaration_and_usage() {
        let (nodes, variables) = parse_source("@TEN 10\nSET 100, @TEN").unwrap();
        assert_eq!(variables.len(), 1);
        let value = match &nodes[2] {
            Node::Value { value, .. } => value,
            other => panic!("unexpected node {:?}", other),
        };
        assert_eq!(value.eval(&variables, &mut Vec::new()).unwrap(), 10.0);
    }

    #[test]
    fn test_duplicate_variable_is_type_error() {
        let error = parse_source("@X 1\n@X 2").unwrap_err();
        assert!(matches!(error, CompileError::Type { .. }));
    }

    #[test]
    fn test_circular_variables_are_detected() {
        let (_, variables) = parse_source("@A %{@B}\n@B %{@A}").unwrap();
        let usage = LazyValue::Variable {
            name: "A".to_string(),
            location: Location::new(1, 0),
        };
        let error = usage.eval(&variables, &mut Vec::new()).unwrap_err();
        match error {
            CompileError::Circular { chain, .. } => {
                assert_eq!(chain, vec!["A", "B", "A"]);
            }
            other => panic!("expected circular error, got {}", other),
        }
    }

    #[test]
    fn test_failing_variable_value_names_the_variable() {
        // The division error alone would not say which declaration broke.
        let (_, variables) = parse_source("@BAD %{1 / 0}").unwrap();
        let usage = LazyValue::Variable {
            name: "BAD".to_string(),
            location: Location::new(1, 0),
        };
        let error = usage.eval(&variables, &mut Vec::new()).unwrap_err();
        match error {
            CompileError::Variable { name, message } => {
                assert_eq!(name, "BAD");
                assert!(message.contains('/'), "got: {}", message);
            }
            other => panic!("expected a variable error, got {}", other),
        }
    }

    #[test]
    fn test_self_referential_variable() {
        let (_, variables) = parse_source("@A @A").unwrap();
        let usage = LazyValue::Variable {
            name: "A".to_string(),
            location: Location::new(1, 0),
        };
        assert!(matches!(
            usage.eval(&variables, &mut Vec::new()),
            Err(CompileError::Circular { .. })
        ));
    }

    #[test]
    fn test_char_literal_operand() {
        let (nodes, _) = parse_source("SET 100, 'A'").unwrap();
        assert!(matches!(&nodes[2], Node::Value { value: LazyValue::Const(65), .. }));
    }

    #[test]
    fn test_char_escape_codepoint() {
        let (nodes, _) = parse_source(r"SET 100, '\65;'").unwrap();
        assert!(matches!(&nodes[2], Node::Value { value: LazyValue::Const(65), .. }));
    }

    #[test]
    fn test_data_directives() {
        let (nodes, _) = parse_source("#DW 1, 2, 3\n#DS \"hi\"\n#DA 4 {9}").unwrap();
        assert_eq!(nodes.len(), 5);
        assert!(matches!(&nodes[3], Node::Str { text, .. } if text == "hi"));
        assert!(matches!(&nodes[4], Node::Array { length: LazyValue::Const(4), values, .. }
            if values.len() == 1));
    }

    #[test]
    fn test_array_length_may_be_a_variable() {
        // The length stays lazy, so a variable declared further down still
        // resolves; rejecting this here would reintroduce declaration order.
        let (nodes, _) = parse_source("#DA @N\n@N 4").unwrap();
        assert!(matches!(
            &nodes[0],
            Node::Array { length: LazyValue::Variable { name, .. }, .. } if name == "N"
        ));
    }

    #[test]
    fn test_unknown_keyword_is_syntax_error() {
        let error = parse_source("FROB 1").unwrap_err();
        assert!(matches!(error, CompileError::Syntax { .. }));
    }

    #[test]
    fn test_missing_operand_is_arguments_error() {
        let error = parse_source("ADD 100").unwrap_err();
        match error {
            CompileError::Arguments {
                instruction, index, ..
            } => {
                assert_eq!(instruction, "ADD");
                assert_eq!(index, 2);
            }
            other => panic!("expected arguments error, got {}", other),
        }
    }

    #[test]
    fn test_string_operand_is_rejected() {
        let error = parse_source("OUT \"no\"").unwrap_err();
        assert!(matches!(error, CompileError::Arguments { .. }));
    }

    #[test]
    fn test_parse_int_radixes() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("-42"), Some(-42));
        assert_eq!(parse_int("0xFF"), Some(255));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("0b1010"), Some(10));
        assert_eq!(parse_int("1_000_000"), Some(1_000_000));
    }

    #[test]
    fn test_unescape_sequences() {
        let location = Location::new(1, 0);
        assert_eq!(unescape(r"a\nb", &location).unwrap(), "a\nb");
        assert_eq!(unescape(r"\65;\66;", &location).unwrap(), "AB");
        assert_eq!(unescape(r"\0", &location).unwrap(), "\0");
        assert!(unescape(r"\q", &location).is_err());
        assert!(unescape(r"\65", &location).is_err());
    }
}
