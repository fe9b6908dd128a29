use std::fmt;
use std::mem;

use crate::ast::{AstNode, CommandKind, CommandNode};
use crate::tokenizer::{self, Token};

/// The closed builtin set. Classification happens here, once, at parse time.
/// `pwd` is a full member: the historical dispatcher that dropped it is not
/// reproduced.
const BUILTINS: &[&str] = &["cd", "pwd", "exit"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// An operator with nothing on one side, e.g. `&& ls` or `ls |`.
    MissingOperand { operator: String },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::MissingOperand { operator } => {
                write!(f, "syntax error: missing operand near '{}'", operator)
            }
        }
    }
}

impl std::error::Error for ParseError {}

/// Parse one input line into a single AST root.
///
/// The line is split on `;` before tokenization; blank statements are
/// skipped, so a trailing `;` is legal and a line of only `;` is a no-op.
/// A fully blank line parses to the empty command, which executes as a
/// no-op success.
pub fn parse_line(line: &str) -> Result<AstNode, ParseError> {
    let mut root: Option<AstNode> = None;
    for statement in tokenizer::split_statements(line) {
        if statement.trim().is_empty() {
            continue;
        }
        let node = parse_statement(statement)?;
        root = Some(match root {
            None => node,
            Some(prev) => AstNode::Sequence(Box::new(prev), Box::new(node)),
        });
    }
    Ok(root.unwrap_or(AstNode::Command(CommandNode::empty())))
}

/// `&&`, `||` and `|` share one precedence level and associate to the left:
/// `a | b && c` groups as `And(Pipeline(a, b), c)`. This is a deliberate
/// simplification over conventional shell grammar, kept from the design this
/// parser follows.
#[derive(Debug, Clone, Copy)]
enum Op {
    And,
    Or,
    Pipe,
}

impl Op {
    fn build(self, left: AstNode, right: AstNode) -> AstNode {
        let (l, r) = (Box::new(left), Box::new(right));
        match self {
            Op::And => AstNode::And(l, r),
            Op::Or => AstNode::Or(l, r),
            Op::Pipe => AstNode::Pipeline(l, r),
        }
    }
}

/// Left-accumulating single-pass parse of one `;`-free statement. An
/// operator node is only ever constructed once both of its operands exist.
struct StatementParser {
    tree: Option<AstNode>,
    pending: Option<Op>,
    args: Vec<String>,
}

impl StatementParser {
    fn new() -> Self {
        StatementParser {
            tree: None,
            pending: None,
            args: Vec::new(),
        }
    }

    /// Finalize the accumulated argv into a leaf and fold it into the tree
    /// under the previously seen operator, then remember the new one.
    fn shift(&mut self, op: Op, lexeme: &str) -> Result<(), ParseError> {
        let leaf = self.take_leaf(lexeme)?;
        self.tree = Some(self.fold(leaf));
        self.pending = Some(op);
        Ok(())
    }

    fn finish(mut self, statement: &str) -> Result<AstNode, ParseError> {
        match self.pending.take() {
            Some(op) => {
                let leaf = self.take_leaf(op_lexeme(op))?;
                match self.tree.take() {
                    Some(l) => Ok(op.build(l, leaf)),
                    None => unreachable!("pending operator without a left operand"),
                }
            }
            None => match self.tree.take() {
                Some(tree) => Ok(tree),
                None => self.take_leaf(statement.trim()),
            },
        }
    }

    fn take_leaf(&mut self, near: &str) -> Result<AstNode, ParseError> {
        if self.args.is_empty() {
            return Err(ParseError::MissingOperand {
                operator: near.to_string(),
            });
        }
        Ok(finalize(mem::take(&mut self.args)))
    }

    fn fold(&mut self, leaf: AstNode) -> AstNode {
        match (self.tree.take(), self.pending.take()) {
            (None, None) => leaf,
            (Some(left), Some(op)) => op.build(left, leaf),
            _ => unreachable!("tree and pending operator are set together"),
        }
    }
}

fn op_lexeme(op: Op) -> &'static str {
    match op {
        Op::And => "&&",
        Op::Or => "||",
        Op::Pipe => "|",
    }
}

fn parse_statement(statement: &str) -> Result<AstNode, ParseError> {
    let mut parser = StatementParser::new();
    for token in tokenizer::tokenize(statement) {
        match token {
            Token::Word(word) => parser.args.push(word),
            Token::And => parser.shift(Op::And, "&&")?,
            Token::Or => parser.shift(Op::Or, "||")?,
            Token::Pipe => parser.shift(Op::Pipe, "|")?,
        }
    }
    parser.finish(statement)
}

fn finalize(args: Vec<String>) -> AstNode {
    let kind = if BUILTINS.contains(&args[0].as_str()) {
        CommandKind::Builtin
    } else {
        CommandKind::External
    };
    AstNode::Command(CommandNode { args, kind })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmd(args: &[&str]) -> AstNode {
        AstNode::Command(CommandNode {
            args: args.iter().map(|s| s.to_string()).collect(),
            kind: CommandKind::External,
        })
    }

    fn builtin(args: &[&str]) -> AstNode {
        AstNode::Command(CommandNode {
            args: args.iter().map(|s| s.to_string()).collect(),
            kind: CommandKind::Builtin,
        })
    }

    #[test]
    fn test_simple_command() {
        assert_eq!(parse_line("echo hello").unwrap(), cmd(&["echo", "hello"]));
    }

    #[test]
    fn test_builtin_classification() {
        assert_eq!(parse_line("cd /tmp").unwrap(), builtin(&["cd", "/tmp"]));
        assert_eq!(parse_line("pwd").unwrap(), builtin(&["pwd"]));
        assert_eq!(parse_line("exit 3").unwrap(), builtin(&["exit", "3"]));
        // Only argv[0] is classified.
        assert_eq!(parse_line("echo cd").unwrap(), cmd(&["echo", "cd"]));
    }

    #[test]
    fn test_and_or_pipe() {
        assert_eq!(
            parse_line("a && b").unwrap(),
            AstNode::And(Box::new(cmd(&["a"])), Box::new(cmd(&["b"]))),
        );
        assert_eq!(
            parse_line("a || b").unwrap(),
            AstNode::Or(Box::new(cmd(&["a"])), Box::new(cmd(&["b"]))),
        );
        assert_eq!(
            parse_line("a | b").unwrap(),
            AstNode::Pipeline(Box::new(cmd(&["a"])), Box::new(cmd(&["b"]))),
        );
    }

    #[test]
    fn test_pipeline_is_left_nested() {
        assert_eq!(
            parse_line("a | b | c").unwrap(),
            AstNode::Pipeline(
                Box::new(AstNode::Pipeline(
                    Box::new(cmd(&["a"])),
                    Box::new(cmd(&["b"])),
                )),
                Box::new(cmd(&["c"])),
            ),
        );
    }

    #[test]
    fn test_operators_share_one_precedence_level() {
        // Unlike POSIX, `|` does not bind tighter than `&&`.
        assert_eq!(
            parse_line("a && b | c").unwrap(),
            AstNode::Pipeline(
                Box::new(AstNode::And(Box::new(cmd(&["a"])), Box::new(cmd(&["b"])))),
                Box::new(cmd(&["c"])),
            ),
        );
    }

    #[test]
    fn test_sequence_left_nested() {
        assert_eq!(
            parse_line("a ; b ; c").unwrap(),
            AstNode::Sequence(
                Box::new(AstNode::Sequence(
                    Box::new(cmd(&["a"])),
                    Box::new(cmd(&["b"])),
                )),
                Box::new(cmd(&["c"])),
            ),
        );
    }

    #[test]
    fn test_sequence_mixes_with_operators() {
        assert_eq!(
            parse_line("a && b ; c").unwrap(),
            AstNode::Sequence(
                Box::new(AstNode::And(Box::new(cmd(&["a"])), Box::new(cmd(&["b"])))),
                Box::new(cmd(&["c"])),
            ),
        );
    }

    #[test]
    fn test_blank_line_is_noop_command() {
        assert_eq!(
            parse_line("").unwrap(),
            AstNode::Command(CommandNode::empty()),
        );
        assert_eq!(
            parse_line("   \t ").unwrap(),
            AstNode::Command(CommandNode::empty()),
        );
    }

    #[test]
    fn test_stray_semicolons_are_tolerated() {
        assert_eq!(parse_line("echo hi ;").unwrap(), cmd(&["echo", "hi"]));
        assert_eq!(parse_line(";; a").unwrap(), cmd(&["a"]));
        assert_eq!(
            parse_line(";").unwrap(),
            AstNode::Command(CommandNode::empty()),
        );
    }

    #[test]
    fn test_missing_operand_is_an_error() {
        assert!(parse_line("&& ls").is_err());
        assert!(parse_line("ls &&").is_err());
        assert!(parse_line("| wc").is_err());
        assert!(parse_line("ls && || wc").is_err());
        assert!(parse_line("ls | ; wc").is_err());
    }
}
