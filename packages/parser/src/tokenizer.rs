use logos::Logos;
use std::ops::Range;

/// Token types for the stylesheet language. Whitespace and silent comments
/// are skipped; adjacency is recovered from token spans where it matters
/// (space-separated lists, `&-suffix`, unary minus).
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
pub enum Token<'src> {
    /// Block comments are kept: loud ones survive into the CSS output.
    #[regex(r"/\*([^*]|\*+[^*/])*\*+/", |lex| lex.slice())]
    BlockComment(&'src str),

    #[regex(r"@[a-zA-Z-]+", |lex| &lex.slice()[1..])]
    AtWord(&'src str),

    #[regex(r"\$[a-zA-Z_][a-zA-Z0-9_-]*", |lex| &lex.slice()[1..])]
    Variable(&'src str),

    /// Unquoted url() bodies would otherwise trip the comment rules.
    #[regex(r"url\([^)\x22\x27]*\)", |lex| lex.slice())]
    Url(&'src str),

    #[regex(r"(--|-)?[a-zA-Z_][a-zA-Z0-9_-]*", |lex| lex.slice())]
    Ident(&'src str),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| lex.slice())]
    #[regex(r#"'([^'\\]|\\.)*'"#, |lex| lex.slice())]
    String(&'src str),

    /// A number with an optional unit, e.g. `12`, `1.5em`, `50%`.
    #[regex(r"[0-9]*\.?[0-9]+(%|[a-zA-Z]+)?", |lex| lex.slice())]
    Dimension(&'src str),

    /// `#abc`: a hex color in value position, an id elsewhere.
    #[regex(r"#[a-zA-Z0-9_-]+", |lex| lex.slice())]
    Hash(&'src str),

    #[token("#{")]
    InterpStart,

    #[token("...")]
    Ellipsis,

    #[token("==")]
    EqEq,

    #[token("!=")]
    BangEq,

    #[token("<=")]
    Le,

    #[token(">=")]
    Ge,

    #[token("<")]
    Lt,

    #[token(">")]
    Gt,

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("(")]
    LParen,

    #[token(")")]
    RParen,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token(";")]
    Semicolon,

    #[token(":")]
    Colon,

    #[token(",")]
    Comma,

    #[token(".")]
    Dot,

    #[token("&")]
    Ampersand,

    #[token("!")]
    Bang,

    #[token("+")]
    Plus,

    #[token("-")]
    Minus,

    #[token("*=")]
    StarEq,

    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    #[token("%")]
    Percent,

    #[token("~=")]
    TildeEq,

    #[token("~")]
    Tilde,

    #[token("^=")]
    CaretEq,

    #[token("$=")]
    DollarEq,

    #[token("|=")]
    PipeEq,

    #[token("|")]
    Pipe,

    #[token("=")]
    Eq,
}

/// Tokenizes `source`, returning tokens with their byte ranges. Invalid
/// characters come back as an `Err` entry so the parser can report a span.
pub fn tokenize(source: &str) -> Vec<(Result<Token<'_>, ()>, Range<usize>)> {
    Token::lexer(source).spanned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_tokens(source: &str) -> Vec<Token<'_>> {
        tokenize(source)
            .into_iter()
            .map(|(token, span)| token.unwrap_or_else(|_| panic!("bad token at {:?}", span)))
            .collect()
    }

    #[test]
    fn tokenizes_declarations() {
        let tokens = ok_tokens("color: #fff;");
        assert_eq!(
            tokens,
            vec![
                Token::Ident("color"),
                Token::Colon,
                Token::Hash("#fff"),
                Token::Semicolon
            ]
        );
    }

    #[test]
    fn tokenizes_dimensions() {
        assert_eq!(
            ok_tokens("1.5em 50% 12"),
            vec![
                Token::Dimension("1.5em"),
                Token::Dimension("50%"),
                Token::Dimension("12")
            ]
        );
    }

    #[test]
    fn tokenizes_variables_and_interpolation() {
        assert_eq!(
            ok_tokens("$x: a#{$y}b;"),
            vec![
                Token::Variable("x"),
                Token::Colon,
                Token::Ident("a"),
                Token::InterpStart,
                Token::Variable("y"),
                Token::RBrace,
                Token::Ident("b"),
                Token::Semicolon
            ]
        );
    }

    #[test]
    fn line_comments_are_dropped_block_comments_kept() {
        let tokens = ok_tokens("// gone\n/* kept */ a");
        assert_eq!(
            tokens,
            vec![Token::BlockComment("/* kept */"), Token::Ident("a")]
        );
    }

    #[test]
    fn unquoted_urls_survive() {
        assert_eq!(
            ok_tokens("url(http://example.com/a.png)"),
            vec![Token::Url("url(http://example.com/a.png)")]
        );
    }

    #[test]
    fn at_words_and_bang_flags() {
        assert_eq!(
            ok_tokens("@extend .a !optional;"),
            vec![
                Token::AtWord("extend"),
                Token::Dot,
                Token::Ident("a"),
                Token::Bang,
                Token::Ident("optional"),
                Token::Semicolon
            ]
        );
    }
}
