/// One parsed command line. Binary nodes exclusively own both children;
/// the tree is built fresh for every input line and discarded after one
/// execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AstNode {
    Command(CommandNode),
    /// `;` - run both sides unconditionally, status of the right side wins.
    Sequence(Box<AstNode>, Box<AstNode>),
    /// `&&` - run the right side only if the left succeeded.
    And(Box<AstNode>, Box<AstNode>),
    /// `||` - run the right side only if the left failed.
    Or(Box<AstNode>, Box<AstNode>),
    /// `|` - left side's stdout feeds the right side's stdin.
    Pipeline(Box<AstNode>, Box<AstNode>),
    Redirect {
        node: Box<AstNode>,
        kind: RedirectKind,
        file: String,
    },
    /// Run the child without waiting for it.
    Background(Box<AstNode>),
    /// Invert the child's success/failure.
    Negate(Box<AstNode>),
    /// Set a variable in the interpreter's own process.
    Assignment { name: String, value: String },
    /// Capture the child's stdout as a string.
    Substitution(Box<AstNode>),
}

/// A leaf command: argv[0] is the executable (or builtin) name. The argv is
/// empty only for a blank input line, which executes as a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandNode {
    pub args: Vec<String>,
    pub kind: CommandKind,
}

impl CommandNode {
    pub fn empty() -> Self {
        CommandNode {
            args: Vec::new(),
            kind: CommandKind::External,
        }
    }
}

/// Decided once, at parse time, by matching argv[0] against the builtin set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Builtin,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectKind {
    /// `<` stdin from file
    In,
    /// `>` stdout, truncating
    Out,
    /// `>>` stdout, appending
    Append,
    /// `2>` stderr, truncating
    ErrOut,
    /// `2>>` stderr, appending
    ErrAppend,
    /// `&>` stdout and stderr, truncating
    AllOut,
    /// `&>>` stdout and stderr, appending
    AllAppend,
}
