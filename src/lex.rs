//! Análisis léxico.
//!
//! # Tokenization
//! Esta es la primera fase del compilador. Descompone el texto fuente
//! en unidades léxicas denominadas tokens, en un único recorrido de
//! izquierda a derecha. Los espacios en blanco se descartan durante esta
//! operación. Cada token emitido está asociado a una ubicación en el
//! código fuente original, lo cual permite rastrear errores tanto en los
//! mismos como en constructos más elevados de fases posteriores.
//!
//! # Contenido de un token
//! Operadores, puntuación y palabras clave se identifican por el hecho de
//! lo que son y no incluyen lexemas. Los identificadores sí incluyen su
//! lexema original. Las constantes enteras se preservan como [`Literal`],
//! que garantiza contener solo dígitos y no impone límite de longitud.
//! Todo flujo exitoso termina con exactamente un [`Token::Eof`].
//!
//! # Reglas importantes del lenguaje
//! - El lenguaje es case-sensitive: `If` es un identificador.
//! - Las palabras clave respetan fronteras de palabra: `ifx` es un
//!   identificador, al igual que una palabra pegada a una constante
//!   entera (`5if` produce `5` seguido del identificador `if`).
//! - Los operadores relacionales de dos caracteres tienen prioridad
//!   sobre los de uno, y `==` sobre `=`.
//!
//! # Errores
//! El lexer no se recupera de errores. El primer carácter desconocido
//! aborta el análisis y ningún token posterior se considera producido.

use crate::source::{Located, Location, Position};
use std::{
    fmt::{self, Display},
    io,
    iter::Peekable,
    str::{Chars, FromStr},
    sync::Arc,
};

use thiserror::Error;

/// Error de escaneo.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LexerError {
    /// Carácter desconocido o inesperado en el flujo de entrada.
    #[error("Bad character {0:?} in input stream")]
    BadChar(char),
}

/// Un identificador.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identifier(Arc<str>);

impl Identifier {
    pub fn new(name: &str) -> Self {
        Identifier(Arc::from(name))
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::new(name)
    }
}

impl AsRef<str> for Identifier {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Identifier {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

/// Constante entera no negativa.
///
/// Conserva los dígitos tal como aparecen en el código fuente, por lo
/// cual `007` se emite como `007` y no existe desbordamiento.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Literal(Arc<str>);

impl Literal {
    /// Construye a partir de texto, que debe ser uno o más dígitos ASCII.
    pub fn new(digits: &str) -> Option<Self> {
        let valid = !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit());
        valid.then(|| Literal(Arc::from(digits)))
    }

    pub fn digits(&self) -> &str {
        &self.0
    }
}

impl From<u32> for Literal {
    fn from(value: u32) -> Self {
        Literal(Arc::from(value.to_string()))
    }
}

impl Display for Literal {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.write_str(&self.0)
    }
}

/// Objeto resultante del análisis léxico.
///
/// Un token contiene suficiente información para describir completamente
/// a una entidad léxica en el programa fuente.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    /// Identificador.
    Id(Identifier),

    /// Palabra clave.
    Keyword(Keyword),

    /// Literal de entero.
    IntLiteral(Literal),

    /// Operador relacional.
    RelOp(RelOp),

    /// `=`
    Assign,

    /// `;`
    Semicolon,

    /// `(`
    OpenParen,

    /// `)`
    CloseParen,

    /// `{`
    OpenCurly,

    /// `}`
    CloseCurly,

    /// Fin de la entrada.
    Eof,
}

impl Token {
    /// Clase léxica del token, sin su contenido.
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Id(_) => TokenKind::Identifier,
            Token::Keyword(Keyword::If) => TokenKind::If,
            Token::Keyword(Keyword::Else) => TokenKind::Else,
            Token::IntLiteral(_) => TokenKind::Number,
            Token::RelOp(_) => TokenKind::RelOp,
            Token::Assign => TokenKind::Assign,
            Token::Semicolon => TokenKind::Semicolon,
            Token::OpenParen => TokenKind::LParen,
            Token::CloseParen => TokenKind::RParen,
            Token::OpenCurly => TokenKind::LBrace,
            Token::CloseCurly => TokenKind::RBrace,
            Token::Eof => TokenKind::EndOfInput,
        }
    }
}

impl Display for Token {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Token::*;

        match self {
            Id(id) => write!(fmt, "identifier `{}`", id),
            Token::Keyword(keyword) => write!(fmt, "keyword `{}`", keyword),
            IntLiteral(integer) => write!(fmt, "literal `{}`", integer),
            Token::RelOp(op) => write!(fmt, "operator `{}`", op),
            Assign => fmt.write_str("`=`"),
            Semicolon => fmt.write_str("`;`"),
            OpenParen => fmt.write_str("`(`"),
            CloseParen => fmt.write_str("`)`"),
            OpenCurly => fmt.write_str("`{`"),
            CloseCurly => fmt.write_str("`}`"),
            Eof => fmt.write_str("end of input"),
        }
    }
}

/// Clases léxicas.
///
/// El parser compara contra estas clases en vez de contra tokens
/// completos, ya que identificadores y literales tienen contenido
/// arbitrario.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    If,
    Else,
    Number,
    Identifier,
    RelOp,
    Assign,
    Semicolon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    EndOfInput,
}

impl Display for TokenKind {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let string = match self {
            If         => "keyword `if`",
            Else       => "keyword `else`",
            Number     => "integer literal",
            TokenKind::Identifier => "identifier",
            TokenKind::RelOp      => "relational operator",
            Assign     => "`=`",
            Semicolon  => "`;`",
            LParen     => "`(`",
            RParen     => "`)`",
            LBrace     => "`{`",
            RBrace     => "`}`",
            EndOfInput => "end of input",
        };

        fmt.write_str(string)
    }
}

/// Una palabra clave.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Keyword {
    If,
    Else,
}

impl Display for Keyword {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let string = match self {
            Keyword::If   => "if",
            Keyword::Else => "else",
        };

        fmt.write_str(string)
    }
}

impl FromStr for Keyword {
    type Err = ();

    fn from_str(string: &str) -> Result<Self, Self::Err> {
        const KEYWORDS: &[(&str, Keyword)] = &[
            ("if",   Keyword::If),
            ("else", Keyword::Else),
        ];

        KEYWORDS
            .iter()
            .find(|&&(name, _)| name == string)
            .map(|&(_, keyword)| keyword)
            .ok_or(())
    }
}

/// Operador relacional.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RelOp {
    Equal,
    NotEqual,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
}

impl Display for RelOp {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use RelOp::*;
        let string = match self {
            Equal          => "==",
            NotEqual       => "!=",
            Less           => "<",
            LessOrEqual    => "<=",
            Greater        => ">",
            GreaterOrEqual => ">=",
        };

        fmt.write_str(string)
    }
}

/// Reduce un texto fuente a su secuencia de tokens.
///
/// La secuencia siempre termina con exactamente un [`Token::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Located<Token>>, Located<LexerError>> {
    let tokens: Vec<_> = Lexer::new(source).collect::<Result<_, _>>()?;
    tracing::debug!(count = tokens.len(), "tokenized input");

    Ok(tokens)
}

/// Escribe un token por línea, precedido de su ubicación.
pub fn write_tokens<W: io::Write>(tokens: &[Located<Token>], output: &mut W) -> io::Result<()> {
    for token in tokens {
        writeln!(output, "{:>14}  {}", token.location().to_string(), token.val())?;
    }

    Ok(())
}

/// Máquina de estados para análisis léxico.
///
/// Un lexer puede encontrarse en uno de diversos estados. La
/// salida del lexer, así como su siguiente estado, se define
/// a partir de tanto su estado actual como el siguiente carácter
/// encontrado en el flujo de entrada.
pub struct Lexer<'a> {
    source: Peekable<Chars<'a>>,
    state: State,
    start: Position,
    next: Position,
    last_literal_end: Option<usize>,
    finished: bool,
}

/// Posibles estados del lexer.
enum State {
    /// Estado que ocurre antes de encontrar el inicio de un token.
    Start,

    /// Estado de completitud; siempre emite el token incluido,
    /// consume la entrada actual y pasa a [`State::Start`].
    Complete(Token),

    /// Se encontró uno de `=`, `!`, `<` o `>`, que podría estar
    /// seguido de `=`.
    Operator(char),

    /// Constante entera.
    ///
    /// Este estado incluirá dígitos en el token mientras que
    /// el siguiente carácter sea un dígito.
    Integer(String),

    /// Término que puede ser un identificador o una palabra clave.
    Word(String),
}

impl<'a> Lexer<'a> {
    /// Crea un lexer en estado inicial a partir de un texto.
    pub fn new(source: &'a str) -> Self {
        Lexer {
            source: source.chars().peekable(),
            state: State::Start,
            start: Position::default(),
            next: Position::default(),
            last_literal_end: None,
            finished: false,
        }
    }

    /// Intenta construir un siguiente token.
    ///
    /// Retorna el token junto a la posición de su último carácter.
    fn lex(&mut self) -> Result<Option<(Token, Position)>, LexerError> {
        use {State::*, Token::*};

        let mut last_accepted = self.start;
        let token = loop {
            let next_char = self.source.peek().copied();

            // La posición de origen se mueve junto a la posición
            // siguiente siempre que no se haya encontrado una
            // frontera de token
            if let Start = self.state {
                self.start = self.next;
            }

            // Switch table principal, determina cambios de estado
            // y de salida del lexer a partir de combinaciones del
            // estado actual y el siguiente carácter
            match (&mut self.state, next_char) {
                // Tokens triviales
                (Start, None) => return Ok(None),
                (Start, Some(';')) => self.state = Complete(Semicolon),
                (Start, Some('(')) => self.state = Complete(OpenParen),
                (Start, Some(')')) => self.state = Complete(CloseParen),
                (Start, Some('{')) => self.state = Complete(OpenCurly),
                (Start, Some('}')) => self.state = Complete(CloseCurly),

                // Operadores que se extienden con un `=` opcional
                (Start, Some(c)) if matches!(c, '=' | '!' | '<' | '>') => {
                    self.state = Operator(c)
                }

                // Identificadores y palabras clave
                (Start, Some(c)) if c.is_ascii_alphabetic() || c == '_' => {
                    self.state = Word(c.to_string())
                }

                // Inicio de una constante numérica. No se consume
                // el dígito, ya que esta lógica ya está implementada
                // en el respectivo caso para un estado de constante
                // entera. Por tanto, la constante es inicialmente vacía.
                (Start, Some(c)) if c.is_ascii_digit() => {
                    self.state = Integer(String::new());
                    continue;
                }

                // Espacios en blanco y caracteres inesperados
                (Start, Some(c)) if c.is_ascii_whitespace() => (),
                (Start, Some(c)) => break Err(LexerError::BadChar(c)),

                // Emisión retardada de tokens cualesquiera
                (Complete(value), _) => break Ok(std::mem::replace(value, Eof)),

                (Operator(first), Some('=')) => {
                    let op = match first {
                        '=' => self::RelOp::Equal,
                        '!' => self::RelOp::NotEqual,
                        '<' => self::RelOp::LessOrEqual,
                        _ => self::RelOp::GreaterOrEqual,
                    };

                    self.state = Complete(Token::RelOp(op));
                }

                // `!` solo es válido como parte de `!=`
                (Operator(first), _) => match first {
                    '=' => break Ok(Assign),
                    '<' => break Ok(Token::RelOp(self::RelOp::Less)),
                    '>' => break Ok(Token::RelOp(self::RelOp::Greater)),
                    other => break Err(LexerError::BadChar(*other)),
                },

                // Acumulación dígito por dígito de constantes enteras
                (Integer(digits), Some(digit)) if digit.is_ascii_digit() => digits.push(digit),

                // Si sigue algo que no es un dígito, la constante ha terminado
                (Integer(digits), _) => {
                    self.last_literal_end = Some(self.next.offset());
                    break Ok(IntLiteral(Literal(Arc::from(std::mem::take(digits)))));
                }

                // Extensión de términos
                (Word(word), Some(c)) if is_word_char(c) => word.push(c),

                // Si sigue algo que no puede formar parte del término, ha terminado
                (Word(word), _) => {
                    let glued = self.last_literal_end == Some(self.start.offset());
                    match self::Keyword::from_str(word) {
                        Ok(keyword) if !glued => break Ok(Token::Keyword(keyword)),
                        _ => break Ok(Id(Identifier::new(word))),
                    }
                }
            }

            // Si no hubo `continue`, aquí se consume el carácter que
            // se observó con lookahead anteriormente
            if let Some(c) = self.source.next() {
                last_accepted = self.next;
                self.next = self.next.after(c);
            }
        };

        token.map(|token| Some((token, last_accepted)))
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Located<Token>, Located<LexerError>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        match self.lex() {
            Ok(Some((token, last_accepted))) => {
                self.state = State::Start;

                let location = Location::span(
                    Location::single(self.start),
                    &Location::single(last_accepted),
                );

                Some(Ok(Located::at(token, location)))
            }

            Ok(None) => {
                self.finished = true;
                Some(Ok(Located::at(Token::Eof, Location::single(self.next))))
            }

            Err(error) => {
                self.finished = true;
                Some(Err(Located::at(error, Location::single(self.start))))
            }
        }
    }
}

/// Determina si un carácter puede pertenecer a un término.
fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
