use crate::token::{lookup_ident, Token, TokenKind};

/// Converts source text into a stream of [`Token`]s on demand.
///
/// Operates directly on bytes: the language restricts identifiers and
/// keywords to ASCII, so there is no need to pay for UTF-8 decoding on the
/// hot path. String literal bodies are copied out verbatim (no escape
/// processing), so arbitrary UTF-8 inside a string literal still round-trips
/// correctly.
pub struct Lexer<'a> {
    input: &'a [u8],
    position: usize,
    read_position: usize,
    ch: u8,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Self {
            input: input.as_bytes(),
            position: 0,
            read_position: 0,
            ch: 0,
        };
        lexer.read_char();
        lexer
    }

    fn read_char(&mut self) {
        self.ch = if self.read_position >= self.input.len() {
            0
        } else {
            self.input[self.read_position]
        };
        self.position = self.read_position;
        self.read_position += 1;
    }

    fn peek_char(&self) -> u8 {
        if self.read_position >= self.input.len() {
            0
        } else {
            self.input[self.read_position]
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.ch, b' ' | b'\t' | b'\n' | b'\r') {
            self.read_char();
        }
    }

    fn skip_comment(&mut self) {
        while self.ch != b'\n' && self.ch != 0 {
            self.read_char();
        }
    }

    fn read_identifier(&mut self) -> &'a str {
        let start = self.position;
        while is_letter(self.ch) {
            self.read_char();
        }
        std::str::from_utf8(&self.input[start..self.position]).unwrap_or_default()
    }

    fn read_number(&mut self) -> &'a str {
        let start = self.position;
        while self.ch.is_ascii_digit() {
            self.read_char();
        }
        std::str::from_utf8(&self.input[start..self.position]).unwrap_or_default()
    }

    fn read_string(&mut self) -> &'a str {
        let start = self.position + 1;
        loop {
            self.read_char();
            if self.ch == b'"' || self.ch == 0 {
                break;
            }
        }
        std::str::from_utf8(&self.input[start..self.position]).unwrap_or_default()
    }

    /// Returns the next token, advancing the lexer. Returns an infinite
    /// stream of `Eof` tokens once the input is exhausted.
    pub fn next_token(&mut self) -> Token {
        let tok = self.scan_token();
        log::trace!("{:?} {:?}", tok.kind, tok.literal);
        tok
    }

    fn scan_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            if self.ch == b'#' {
                self.skip_comment();
                continue;
            }
            break;
        }

        let tok = match self.ch {
            b'=' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::Eq, "==")
                } else {
                    Token::new(TokenKind::Assign, "=")
                }
            }
            b'+' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::PlusAssign, "+=")
                } else {
                    Token::new(TokenKind::Plus, "+")
                }
            }
            b'-' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::MinusAssign, "-=")
                } else {
                    Token::new(TokenKind::Minus, "-")
                }
            }
            b'!' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::NotEq, "!=")
                } else {
                    Token::new(TokenKind::Bang, "!")
                }
            }
            b'*' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::AsteriskAssign, "*=")
                } else {
                    Token::new(TokenKind::Asterisk, "*")
                }
            }
            b'/' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::SlashAssign, "/=")
                } else {
                    Token::new(TokenKind::Slash, "/")
                }
            }
            b'%' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::PercentAssign, "%=")
                } else {
                    Token::new(TokenKind::Percent, "%")
                }
            }
            b'<' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::Lte, "<=")
                } else {
                    Token::new(TokenKind::Lt, "<")
                }
            }
            b'>' => {
                if self.peek_char() == b'=' {
                    self.read_char();
                    Token::new(TokenKind::Gte, ">=")
                } else {
                    Token::new(TokenKind::Gt, ">")
                }
            }
            b',' => Token::new(TokenKind::Comma, ","),
            b';' => Token::new(TokenKind::Semicolon, ";"),
            b':' => Token::new(TokenKind::Colon, ":"),
            b'(' => Token::new(TokenKind::LParen, "("),
            b')' => Token::new(TokenKind::RParen, ")"),
            b'{' => Token::new(TokenKind::LBrace, "{"),
            b'}' => Token::new(TokenKind::RBrace, "}"),
            b'[' => Token::new(TokenKind::LBracket, "["),
            b']' => Token::new(TokenKind::RBracket, "]"),
            b'"' => {
                let s = self.read_string().to_owned();
                Token::new(TokenKind::Str, s)
            }
            0 => Token::new(TokenKind::Eof, ""),
            ch if is_letter(ch) => {
                let ident = self.read_identifier();
                return Token::new(lookup_ident(ident), ident);
            }
            ch if ch.is_ascii_digit() => {
                let num = self.read_number();
                return Token::new(TokenKind::Int, num);
            }
            ch => {
                let illegal = (ch as char).to_string();
                log::warn!("lexer saw illegal byte: {illegal}");
                Token::new(TokenKind::Illegal, illegal)
            }
        };

        self.read_char();
        tok
    }
}

fn is_letter(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(src);
        let mut out = vec![];
        loop {
            let tok = lexer.next_token();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn test_next_token_basic_operators() {
        let input = "=+-!*/%<><=>===!=";
        use TokenKind::*;
        assert_eq!(
            kinds(input),
            vec![
                Assign, Plus, Minus, Bang, Asterisk, Slash, Percent, Lt, Gt, Lte, Gte, Eq, NotEq,
                Eof
            ]
        );
    }

    #[test]
    fn test_next_token_compound_assign() {
        use TokenKind::*;
        assert_eq!(
            kinds("+= -= *= /= %="),
            vec![
                PlusAssign,
                MinusAssign,
                AsteriskAssign,
                SlashAssign,
                PercentAssign,
                Eof
            ]
        );
    }

    #[test]
    fn test_next_token_let_statement() {
        let input = "let five = 5;";
        let mut lexer = Lexer::new(input);
        let expected = [
            (TokenKind::Let, "let"),
            (TokenKind::Ident, "five"),
            (TokenKind::Assign, "="),
            (TokenKind::Int, "5"),
            (TokenKind::Semicolon, ";"),
            (TokenKind::Eof, ""),
        ];
        for (kind, literal) in expected {
            let tok = lexer.next_token();
            assert_eq!(tok.kind, kind);
            assert_eq!(tok.literal, literal);
        }
    }

    #[test]
    fn test_next_token_keywords_and_control_flow() {
        use TokenKind::*;
        let input = "fn if else true false null while break continue return";
        assert_eq!(
            kinds(input),
            vec![
                Function, If, Else, True, False, Null, While, Break, Continue, Return, Eof
            ]
        );
    }

    #[test]
    fn test_next_token_string_literal_no_escape_processing() {
        let mut lexer = Lexer::new(r#""hello\n world""#);
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Str);
        assert_eq!(tok.literal, r"hello\n world");
    }

    #[test]
    fn test_next_token_array_and_hash_punctuation() {
        use TokenKind::*;
        assert_eq!(
            kinds("[1, 2]; {\"a\": 1}"),
            vec![
                LBracket, Int, Comma, Int, RBracket, Semicolon, LBrace, Str, Colon, Int, RBrace,
                Eof
            ]
        );
    }

    #[test]
    fn test_next_token_comment_is_skipped() {
        let mut lexer = Lexer::new("# a comment\nlet x = 1;");
        assert_eq!(lexer.next_token().kind, TokenKind::Let);
    }

    #[test]
    fn test_next_token_illegal_byte() {
        let mut lexer = Lexer::new("@");
        let tok = lexer.next_token();
        assert_eq!(tok.kind, TokenKind::Illegal);
        assert_eq!(tok.literal, "@");
    }
}
