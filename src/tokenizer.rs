/// A single token of one `;`-delimited statement.
///
/// Tokens are split on whitespace runs only; there is no quoting, escaping
/// or globbing, so a quoted string or glob pattern travels through as a
/// literal word. Arguments containing spaces therefore cannot be expressed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Word(String),
    /// `&&`
    And,
    /// `||`
    Or,
    /// `|`
    Pipe,
}

impl Token {
    fn classify(word: &str) -> Token {
        // Operators are recognized by exact equality, nothing fuzzier.
        match word {
            "&&" => Token::And,
            "||" => Token::Or,
            "|" => Token::Pipe,
            _ => Token::Word(word.to_string()),
        }
    }

    pub fn lexeme(&self) -> &str {
        match self {
            Token::Word(w) => w,
            Token::And => "&&",
            Token::Or => "||",
            Token::Pipe => "|",
        }
    }

}

/// Lazily tokenize one statement. The returned iterator is finite and
/// consumed once; the parser drives it left to right.
pub fn tokenize(line: &str) -> impl Iterator<Item = Token> + '_ {
    line.split_whitespace().map(Token::classify)
}

/// Statement split for `;`. Performed on the raw line before tokenization,
/// so `a;b` sequences even without surrounding spaces.
pub fn split_statements(line: &str) -> impl Iterator<Item = &str> {
    line.split(';')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(line: &str) -> Vec<Token> {
        tokenize(line).collect()
    }

    #[test]
    fn splits_on_whitespace_runs() {
        let toks = words("  echo   hello\tworld ");
        assert_eq!(
            toks,
            vec![
                Token::Word("echo".into()),
                Token::Word("hello".into()),
                Token::Word("world".into()),
            ]
        );
    }

    #[test]
    fn recognizes_operators_by_exact_match() {
        let toks = words("a && b || c | d");
        assert_eq!(
            toks,
            vec![
                Token::Word("a".into()),
                Token::And,
                Token::Word("b".into()),
                Token::Or,
                Token::Word("c".into()),
                Token::Pipe,
                Token::Word("d".into()),
            ]
        );
    }

    #[test]
    fn glued_operators_are_plain_words() {
        // No splitting inside words: `a|b` is one literal token.
        let toks = words("a|b c&&d");
        assert_eq!(
            toks,
            vec![Token::Word("a|b".into()), Token::Word("c&&d".into())]
        );
    }

    #[test]
    fn quotes_and_globs_pass_through_literally() {
        let toks = words("echo \"hi there\" *.txt");
        assert_eq!(
            toks,
            vec![
                Token::Word("echo".into()),
                Token::Word("\"hi".into()),
                Token::Word("there\"".into()),
                Token::Word("*.txt".into()),
            ]
        );
    }

    #[test]
    fn empty_and_blank_lines_yield_nothing() {
        assert!(words("").is_empty());
        assert!(words(" \t ").is_empty());
    }

    #[test]
    fn join_and_retokenize_round_trips() {
        let original: Vec<Token> = words("ls -l && grep foo | wc ||  cat");
        let joined = original
            .iter()
            .map(Token::lexeme)
            .collect::<Vec<_>>()
            .join(" ");
        assert_eq!(words(&joined), original);
    }

    #[test]
    fn statement_split_ignores_spacing() {
        let parts: Vec<&str> = split_statements("a;b ; c").collect();
        assert_eq!(parts, vec!["a", "b ", " c"]);
    }
}
