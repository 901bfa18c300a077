#[cfg(test)]
mod scanner_tests {
    use rox as lox;

    use lox::error::LoxError;
    use lox::scanner::*;
    use lox::token::*;

    fn assert_token_sequence(source: &str, expected: &[(TokenType, &str)]) {
        let scanner = Scanner::new(source.as_bytes());
        let tokens: Vec<_> = scanner.filter_map(Result::ok).collect();

        assert_eq!(tokens.len(), expected.len());

        for (actual, (expected_type, expected_lexeme)) in tokens.iter().zip(expected.iter()) {
            assert_eq!(actual.token_type, *expected_type);
            assert_eq!(actual.lexeme, *expected_lexeme);
        }
    }

    #[test]
    fn test_scanner_01_symbols() {
        assert_token_sequence(
            "({*.,+*})",
            &[
                (TokenType::LEFT_PAREN, "("),
                (TokenType::LEFT_BRACE, "{"),
                (TokenType::STAR, "*"),
                (TokenType::DOT, "."),
                (TokenType::COMMA, ","),
                (TokenType::PLUS, "+"),
                (TokenType::STAR, "*"),
                (TokenType::RIGHT_BRACE, "}"),
                (TokenType::RIGHT_PAREN, ")"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_two_char_operators_and_comments() {
        assert_token_sequence(
            "a != b == c <= d >= e // trailing comment\n/ !",
            &[
                (TokenType::IDENTIFIER, "a"),
                (TokenType::BANG_EQUAL, "!="),
                (TokenType::IDENTIFIER, "b"),
                (TokenType::EQUAL_EQUAL, "=="),
                (TokenType::IDENTIFIER, "c"),
                (TokenType::LESS_EQUAL, "<="),
                (TokenType::IDENTIFIER, "d"),
                (TokenType::GREATER_EQUAL, ">="),
                (TokenType::IDENTIFIER, "e"),
                (TokenType::SLASH, "/"),
                (TokenType::BANG, "!"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_keywords_versus_identifiers() {
        assert_token_sequence(
            "fun funky var _x while orchid or",
            &[
                (TokenType::FUN, "fun"),
                (TokenType::IDENTIFIER, "funky"),
                (TokenType::VAR, "var"),
                (TokenType::IDENTIFIER, "_x"),
                (TokenType::WHILE, "while"),
                (TokenType::IDENTIFIER, "orchid"),
                (TokenType::OR, "or"),
                (TokenType::EOF, ""),
            ],
        );
    }

    #[test]
    fn test_literals_carry_values() {
        let (tokens, errors) = scan_tokens(b"12 3.5 \"hi there\" 7.");

        assert!(errors.is_empty());
        assert_eq!(tokens[0].literal, Some(Literal::Number(12.0)));
        assert_eq!(tokens[1].literal, Some(Literal::Number(3.5)));
        assert_eq!(tokens[2].literal, Some(Literal::Str("hi there".into())));
        assert_eq!(tokens[2].lexeme, "\"hi there\"");

        // A trailing dot is not part of the number.
        assert_eq!(tokens[3].literal, Some(Literal::Number(7.0)));
        assert_eq!(tokens[4].token_type, TokenType::DOT);
    }

    #[test]
    fn test_token_display() {
        let (tokens, _) = scan_tokens(b"var x = 3; \"s\"");

        let printed: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            printed,
            vec![
                "VAR var null",
                "IDENTIFIER x null",
                "EQUAL = null",
                "NUMBER 3 3.0",
                "SEMICOLON ; null",
                "STRING \"s\" s",
                "EOF  null",
            ]
        );
    }

    #[test]
    fn test_lines_are_tracked() {
        let (tokens, _) = scan_tokens(b"a\n// comment\nb \"multi\nline\" c");

        let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
        assert_eq!(lines, vec![1, 3, 4, 4, 4]);
    }

    #[test]
    fn test_unterminated_string() {
        let (tokens, errors) = scan_tokens(b"print \"oops");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].to_string(), "[line 1] Error: Unterminated string.");
        assert_eq!(tokens.last().map(|t| t.token_type), Some(TokenType::EOF));
    }

    #[test]
    fn test_unexpected_chars_token_sequence() {
        let source = ",.$(#";
        let scanner = Scanner::new(source.as_bytes());

        let results: Vec<_> = scanner.collect();

        // 0: COMMA ','
        // 1: DOT '.'
        // 2: Error for '$'
        // 3: LEFT_PAREN '('
        // 4: Error for '#'
        // 5: EOF
        assert_eq!(results.len(), 6, "Expected 6 items in result");

        assert_token_matches(&results[0], TokenType::COMMA, ",");
        assert_token_matches(&results[1], TokenType::DOT, ".");
        assert_token_matches(&results[3], TokenType::LEFT_PAREN, "(");
        assert_token_matches(&results[5], TokenType::EOF, "");

        let error_count = results.iter().filter(|r| r.is_err()).count();
        assert_eq!(error_count, 2, "Expected 2 error messages");

        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                err.to_string().contains("Unexpected character"),
                "Error message should contain 'Unexpected character', got: {}",
                err
            );
        }

        fn assert_token_matches(
            result: &Result<Token, LoxError>,
            expected_type: TokenType,
            expected_lexeme: &str,
        ) {
            match result {
                Ok(token) => {
                    assert_eq!(
                        token.token_type, expected_type,
                        "Expected token type {:?}, got {:?}",
                        expected_type, token.token_type
                    );
                    assert_eq!(
                        token.lexeme, expected_lexeme,
                        "Expected lexeme '{}', got '{}'",
                        expected_lexeme, token.lexeme
                    );
                }
                Err(e) => panic!("Expected token but got error: {}", e),
            }
        }
    }

    #[test]
    fn test_non_ascii_character_is_reported_once() {
        let (tokens, errors) = scan_tokens("a é b € c".as_bytes());

        let messages: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "[line 1] Error: Unexpected character: é",
                "[line 1] Error: Unexpected character: €",
            ]
        );

        let lexemes: Vec<&str> = tokens.iter().map(|t| t.lexeme.as_str()).collect();
        assert_eq!(lexemes, vec!["a", "b", "c", ""]);
    }

    #[test]
    fn test_invalid_utf8_byte() {
        let (tokens, errors) = scan_tokens(b"x \xff y");

        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors[0].to_string(),
            "[line 1] Error: Unexpected character: \u{FFFD}"
        );
        assert_eq!(tokens.len(), 3);
    }

    #[test]
    fn test_scanner_is_fused() {
        let mut scanner = Scanner::new(b"");

        assert!(matches!(scanner.next(), Some(Ok(ref t)) if t.token_type == TokenType::EOF));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
