//! Análisis sintáctico.
//!
//! Parser recursivo descendente con un token de lookahead. Cada
//! sentencia se distingue por su primer token (`if` o identificador),
//! por lo cual nunca es necesario retroceder. La gramática es:
//!
//! ```text
//! program     := statement* EndOfInput
//! statement   := ifStatement | assignment
//! assignment  := Identifier '=' Number ';'
//! ifStatement := 'if' '(' condition ')' '{' statement* '}' ('else' '{' statement* '}')?
//! condition   := Identifier RelOp Number
//! ```
//!
//! No hay recuperación de errores: el primer token inesperado aborta
//! el análisis completo.

use std::{
    fmt::{self, Display},
    iter::Peekable,
};

use thiserror::Error;

use crate::{
    lex::{Identifier, Literal, RelOp, Token, TokenKind},
    source::{Located, Location},
};

/// Raíz del árbol sintáctico.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Assignment {
        target: Located<Identifier>,
        value: Located<Expr>,
    },

    /// `else_branch` es `None` cuando no existe la cláusula `else`,
    /// lo cual es distinto de una cláusula `else { }` vacía.
    If {
        condition: Condition,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub left: Located<Identifier>,
    pub op: Located<RelOp>,
    pub right: Located<Expr>,
}

/// Valor a la derecha de una asignación o comparación.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    Integer(Literal),
}

impl Display for Expr {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Integer(literal) => write!(fmt, "{}", literal),
        }
    }
}

impl Program {
    /// Escribe el árbol de manera indentada, una línea por nodo.
    pub fn pretty(&self) -> impl Display + '_ {
        Pretty(self)
    }
}

struct Pretty<'a>(&'a Program);

impl Display for Pretty<'_> {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(fmt, "Program")?;
        write_block(fmt, &self.0.statements, 1)
    }
}

fn write_block(fmt: &mut fmt::Formatter<'_>, block: &[Statement], level: usize) -> fmt::Result {
    let indent = level * 2;

    for statement in block {
        match statement {
            Statement::Assignment { target, value } => {
                writeln!(fmt, "{:indent$}Assignment: {} = {}", "", target.val(), value.val(), indent = indent)?;
            }

            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                writeln!(fmt, "{:indent$}If Statement", "", indent = indent)?;
                writeln!(
                    fmt,
                    "{:indent$}Condition: {} {} {}",
                    "",
                    condition.left.val(),
                    condition.op.val(),
                    condition.right.val(),
                    indent = indent + 2
                )?;

                // Las ramas van tres niveles más adentro que su `if`
                writeln!(fmt, "{:indent$}Then Block:", "", indent = indent + 2)?;
                write_block(fmt, then_branch, level + 3)?;

                // Un `else { }` vacío no se imprime
                match else_branch {
                    Some(else_branch) if !else_branch.is_empty() => {
                        writeln!(fmt, "{:indent$}Else Block:", "", indent = indent + 2)?;
                        write_block(fmt, else_branch, level + 3)?;
                    }

                    _ => (),
                }
            }
        }
    }

    Ok(())
}

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    #[error("Expected {0}, found {1} instead")]
    UnexpectedToken(TokenKind, Token),

    #[error("Expected `if` or assignment, found {0} instead")]
    ExpectedStatement(Token),

    #[error("Abrupt end of token stream")]
    UnexpectedEof,
}

pub type Parse<T> = Result<T, Located<ParserError>>;

/// Construye un árbol sintáctico a partir de un flujo de tokens.
///
/// El flujo debe terminar con [`Token::Eof`], tal como lo produce
/// [`crate::lex::tokenize`].
pub fn parse<'a, I>(tokens: I) -> Parse<Program>
where
    I: IntoIterator<Item = &'a Located<Token>>,
{
    let mut parser = Parser {
        tokens: tokens.into_iter().peekable(),
        last_known: Location::default(),
    };

    let program = parser.program()?;
    tracing::debug!(statements = program.statements.len(), "parsed program");

    Ok(program)
}

struct Parser<'a, I: Iterator<Item = &'a Located<Token>>> {
    tokens: Peekable<I>,
    last_known: Location,
}

impl<'a, I: Iterator<Item = &'a Located<Token>>> Parser<'a, I> {
    fn program(&mut self) -> Parse<Program> {
        let mut statements = Vec::new();
        while self.peek()? != TokenKind::EndOfInput {
            statements.push(self.statement()?);
        }

        self.expect(TokenKind::EndOfInput)?;
        Ok(Program { statements })
    }

    fn statement(&mut self) -> Parse<Statement> {
        match self.peek()? {
            TokenKind::If => self.if_statement(),
            TokenKind::Identifier => self.assignment(),

            _ => {
                let found = self.next()?.into_inner();
                self.fail(ParserError::ExpectedStatement(found))
            }
        }
    }

    fn assignment(&mut self) -> Parse<Statement> {
        let target = self.id()?;
        self.expect(TokenKind::Assign)?;
        let value = self.literal()?;
        self.expect(TokenKind::Semicolon)?;

        Ok(Statement::Assignment { target, value })
    }

    fn if_statement(&mut self) -> Parse<Statement> {
        self.expect(TokenKind::If)?;

        self.expect(TokenKind::LParen)?;
        let condition = self.condition()?;
        self.expect(TokenKind::RParen)?;

        let then_branch = self.statement_block()?;
        let else_branch = match self.peek()? {
            TokenKind::Else => {
                self.expect(TokenKind::Else)?;
                Some(self.statement_block()?)
            }

            _ => None,
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn statement_block(&mut self) -> Parse<Vec<Statement>> {
        self.expect(TokenKind::LBrace)?;

        // Un bloque sin cerrar termina en `Eof`, que `statement()` rechaza
        let mut statements = Vec::new();
        while self.peek()? != TokenKind::RBrace {
            statements.push(self.statement()?);
        }

        self.expect(TokenKind::RBrace)?;
        Ok(statements)
    }

    fn condition(&mut self) -> Parse<Condition> {
        let left = self.id()?;

        let (location, token) = self.next()?.split();
        let op = match token {
            Token::RelOp(op) => Located::at(op, location),
            found => self.fail(ParserError::UnexpectedToken(TokenKind::RelOp, found))?,
        };

        let right = self.literal()?;
        Ok(Condition { left, op, right })
    }

    fn literal(&mut self) -> Parse<Located<Expr>> {
        let (location, token) = self.next()?.split();
        match token {
            Token::IntLiteral(literal) => Ok(Located::at(Expr::Integer(literal), location)),
            found => self.fail(ParserError::UnexpectedToken(TokenKind::Number, found)),
        }
    }

    fn id(&mut self) -> Parse<Located<Identifier>> {
        let (location, token) = self.next()?.split();
        match token {
            Token::Id(id) => Ok(Located::at(id, location)),
            found => self.fail(ParserError::UnexpectedToken(TokenKind::Identifier, found)),
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Parse<()> {
        let found = self.next()?.into_inner();
        if found.kind() == kind {
            Ok(())
        } else {
            self.fail(ParserError::UnexpectedToken(kind, found))
        }
    }

    fn peek(&mut self) -> Parse<TokenKind> {
        match self.tokens.peek() {
            Some(token) => Ok(token.val().kind()),
            None => self.fail(ParserError::UnexpectedEof),
        }
    }

    fn next(&mut self) -> Parse<Located<Token>> {
        match self.tokens.next() {
            Some(token) => {
                self.last_known = *token.location();
                Ok(token.clone())
            }

            None => self.fail(ParserError::UnexpectedEof),
        }
    }

    fn fail<T>(&self, error: ParserError) -> Parse<T> {
        Err(Located::at(error, self.last_known))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::tokenize;

    fn parse_str(source: &str) -> Parse<Program> {
        let tokens = tokenize(source).unwrap();
        parse(&tokens)
    }

    fn error(source: &str) -> ParserError {
        parse_str(source).unwrap_err().into_inner()
    }

    #[test]
    fn single_assignment() {
        let program = parse_str("x = 10;").unwrap();

        match program.statements.as_slice() {
            [Statement::Assignment { target, value }] => {
                assert_eq!(target.val().as_ref(), "x");
                assert_eq!(value.val(), &Expr::Integer(Literal::from(10)));
            }

            other => panic!("unexpected statements: {:?}", other),
        }
    }

    #[test]
    fn if_without_else_has_no_else_branch() {
        let program = parse_str("if (x > 5) { y = 1; }").unwrap();

        match program.statements.as_slice() {
            [Statement::If {
                condition,
                then_branch,
                else_branch,
            }] => {
                assert_eq!(condition.left.val().as_ref(), "x");
                assert_eq!(condition.op.val(), &RelOp::Greater);
                assert_eq!(condition.right.val(), &Expr::Integer(Literal::from(5)));
                assert_eq!(then_branch.len(), 1);
                assert_eq!(else_branch, &None);
            }

            other => panic!("unexpected statements: {:?}", other),
        }
    }

    #[test]
    fn empty_else_is_not_absent_else() {
        let program = parse_str("if (x == 1) { } else { }").unwrap();

        match program.statements.as_slice() {
            [Statement::If {
                then_branch,
                else_branch,
                ..
            }] => {
                assert!(then_branch.is_empty());
                assert_eq!(else_branch, &Some(Vec::new()));
            }

            other => panic!("unexpected statements: {:?}", other),
        }
    }

    #[test]
    fn nested_if() {
        let program =
            parse_str("if (a < 1) { if (b != 2) { c = 3; } else { c = 4; } d = 5; }").unwrap();

        match program.statements.as_slice() {
            [Statement::If { then_branch, .. }] => {
                assert_eq!(then_branch.len(), 2);
                assert!(matches!(
                    &then_branch[0],
                    Statement::If {
                        else_branch: Some(_),
                        ..
                    }
                ));
            }

            other => panic!("unexpected statements: {:?}", other),
        }
    }

    #[test]
    fn empty_program() {
        assert_eq!(parse_str("").unwrap().statements, Vec::new());
    }

    #[test]
    fn missing_semicolon() {
        assert_eq!(
            error("x = 10"),
            ParserError::UnexpectedToken(TokenKind::Semicolon, Token::Eof)
        );
    }

    #[test]
    fn assignment_requires_a_literal() {
        assert_eq!(
            error("x = y;"),
            ParserError::UnexpectedToken(TokenKind::Number, Token::Id(Identifier::new("y")))
        );
    }

    #[test]
    fn unterminated_block_reports_eof() {
        assert_eq!(error("if (x > 5) { y = 1;"), ParserError::ExpectedStatement(Token::Eof));
    }

    #[test]
    fn condition_requires_relational_operator() {
        assert_eq!(
            error("if (x = 5) { }"),
            ParserError::UnexpectedToken(TokenKind::RelOp, Token::Assign)
        );
    }

    #[test]
    fn stray_token_at_statement_start() {
        assert_eq!(error("; x = 1;"), ParserError::ExpectedStatement(Token::Semicolon));
        assert_eq!(error("else { }"), ParserError::ExpectedStatement(Token::Keyword(crate::lex::Keyword::Else)));
    }

    #[test]
    fn error_points_at_offending_token() {
        let error = parse_str("x = 1;\ny 2;").unwrap_err();

        assert_eq!(error.location().start().line(), 2);
        assert_eq!(error.location().start().column(), 3);
    }

    #[test]
    fn stream_without_eof() {
        let tokens = tokenize("x = 1;").unwrap();
        let truncated = &tokens[..tokens.len() - 1];

        assert_eq!(
            parse(truncated).unwrap_err().into_inner(),
            ParserError::UnexpectedEof
        );
    }

    #[test]
    fn pretty_printing() {
        let program = parse_str("x = 10; if (x > 5) { z = 100; } else { z = 0; }").unwrap();
        let expected = "\
Program
  Assignment: x = 10
  If Statement
    Condition: x > 5
    Then Block:
        Assignment: z = 100
    Else Block:
        Assignment: z = 0
";

        assert_eq!(program.pretty().to_string(), expected);
    }

    #[test]
    fn pretty_printing_nested_and_empty_else() {
        let program = parse_str("if (a < 1) { if (b == 2) { c = 3; } else { } }").unwrap();
        let expected = "\
Program
  If Statement
    Condition: a < 1
    Then Block:
        If Statement
          Condition: b == 2
          Then Block:
              Assignment: c = 3
";

        assert_eq!(program.pretty().to_string(), expected);
    }
}
