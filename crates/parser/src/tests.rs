use super::*;

#[test]
fn lexer_tokenizes_basic_statement() {
    let tokens = Lexer::tokenize(r#"SELECT * FROM t WHERE a == "hi";"#).unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::Keyword(Keyword::Select),
            Token::Star,
            Token::Keyword(Keyword::From),
            Token::Ident("t".into()),
            Token::Keyword(Keyword::Where),
            Token::Ident("a".into()),
            Token::EqEq,
            Token::Str("hi".into()),
            Token::Semi,
            Token::Eof,
        ]
    );
}

#[test]
fn lexer_distinguishes_int_and_double() {
    let tokens = Lexer::tokenize("1 -2 3.5 -4.25").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::Int(1),
            Token::Int(-2),
            Token::Double(3.5),
            Token::Double(-4.25),
            Token::Eof,
        ]
    );
}

#[test]
fn lexer_keyword_lookup_is_case_insensitive() {
    let tokens = Lexer::tokenize("select From").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::Keyword(Keyword::Select),
            Token::Keyword(Keyword::From),
            Token::Eof,
        ]
    );
}

#[test]
fn lexer_rejects_empty_input() {
    assert!(Lexer::tokenize("   ").is_err());
}

#[test]
fn lexer_rejects_unterminated_string() {
    assert!(Lexer::tokenize(r#"SELECT * FROM t WHERE a == "hi"#).is_err());
}

#[test]
fn parse_create_with_nullable_string_column() {
    let stmt = parse("CREATE t { id INT, name STRING 20 NULL }").unwrap();
    match stmt {
        Statement::Create { table, columns } => {
            assert_eq!(table, "t");
            assert_eq!(columns.len(), 2);
            assert_eq!(columns[0].ty, SqlType::Int);
            assert!(!columns[0].nullable);
            assert_eq!(columns[1].ty, SqlType::String(20));
            assert!(columns[1].nullable);
        }
        other => panic!("expected Create, got {other:?}"),
    }
}

#[test]
fn parse_create_rejects_inline_index_clause() {
    let err = parse("CREATE t { id INT } INDEX id").unwrap_err();
    assert!(matches!(err, DbError::ParseError(_)));
}

#[test]
fn parse_create_rejects_missing_braces() {
    assert!(parse("CREATE t (id INT)").is_err());
}

#[test]
fn parse_insert_collects_value_tokens() {
    let stmt = parse(r#"INSERT INTO t VALUES (1, "Ada", 3.5)"#).unwrap();
    match stmt {
        Statement::Insert { table, values } => {
            assert_eq!(table, "t");
            assert_eq!(
                values,
                vec![Token::Int(1), Token::Str("Ada".into()), Token::Double(3.5)]
            );
        }
        other => panic!("expected Insert, got {other:?}"),
    }
}

#[test]
fn parse_select_star_and_field_list() {
    let star = parse("SELECT * FROM t").unwrap();
    assert!(matches!(
        star,
        Statement::Select {
            fields: SelectFields::Star,
            ..
        }
    ));

    let listed = parse("SELECT a, b FROM t").unwrap();
    match listed {
        Statement::Select { fields, .. } => {
            assert_eq!(fields, SelectFields::List(vec!["a".into(), "b".into()]));
        }
        other => panic!("expected Select, got {other:?}"),
    }
}

#[test]
fn parse_select_where_builds_and_chain() {
    let stmt = parse("SELECT * FROM t WHERE a == 1 AND b == 2").unwrap();
    match stmt {
        Statement::Select {
            where_clause: Some(expr),
            ..
        } => {
            assert!(matches!(expr, Expr::And(_, _)));
        }
        other => panic!("expected Select with WHERE, got {other:?}"),
    }
}

#[test]
fn parse_update_uses_paren_assignment_no_set_keyword() {
    let stmt = parse("UPDATE (score = 9.5) FROM t WHERE id == 1").unwrap();
    match stmt {
        Statement::Update {
            table,
            column,
            value,
            ..
        } => {
            assert_eq!(table, "t");
            assert_eq!(column, "score");
            assert_eq!(value, Token::Double(9.5));
        }
        other => panic!("expected Update, got {other:?}"),
    }
}

#[test]
fn parse_delete_without_where() {
    let stmt = parse("DELETE FROM t").unwrap();
    assert!(matches!(
        stmt,
        Statement::Delete {
            where_clause: None,
            ..
        }
    ));
}

#[test]
fn parse_drop() {
    let stmt = parse("DROP t").unwrap();
    assert!(matches!(stmt, Statement::Drop { table } if table == "t"));
}

#[test]
fn parse_rejects_trailing_garbage() {
    assert!(parse("DROP t EXTRA").is_err());
}

#[test]
fn parse_rejects_unknown_statement() {
    assert!(parse("FROB t").is_err());
}
