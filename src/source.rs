//! Rastreo de ubicaciones originales en código fuente.
//!
//! Los distintos objetos internos que el compilador construye
//! deben llevar cuenta de posiciones o rangos de ubicaciones en
//! el código fuente original, lo cual permite determinar un punto
//! exacto o aproximado en donde ocurre un error.

use std::{
    error::Error,
    fmt::{self, Debug, Display, Formatter},
    io::{self, Read},
};

/// Ancho de los divisores de tabulador.
const TAB_STOP: u32 = 4;

/// Un objeto cualquiera con una posición original asociada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Located<T> {
    location: Location,
    value: T,
}

impl<T> Located<T> {
    /// Obtiene el valor.
    pub fn val(&self) -> &T {
        &self.value
    }

    /// Obtiene la ubicación.
    pub fn location(&self) -> &Location {
        &self.location
    }

    /// Descarta la ubicación y toma ownership del valor.
    pub fn into_inner(self) -> T {
        self.value
    }

    /// Descompone y toma ownership de las dos partes.
    pub fn split(self) -> (Location, T) {
        (self.location, self.value)
    }

    /// Construye a partir de un valor y una ubicación.
    pub fn at(value: T, location: Location) -> Self {
        Located { value, location }
    }

    /// Construye un valor sin ubicación conocida en el código fuente.
    ///
    /// Útil para árboles construidos a mano fuera del parser.
    pub fn synthetic(value: T) -> Self {
        Located::at(value, Location::default())
    }
}

impl<T> AsRef<T> for Located<T> {
    fn as_ref(&self) -> &T {
        &self.value
    }
}

impl<T: Display> Display for Located<T> {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}: {}", self.location, self.value)
    }
}

impl<E: Error> Error for Located<E> {}

/// Una ubicación es un rango inclusivo de posiciones.
#[derive(Copy, Clone, Default, PartialEq, Eq)]
pub struct Location {
    start: Position,
    end: Position,
}

impl Location {
    /// Ubicación de un único carácter.
    pub fn single(position: Position) -> Self {
        Location {
            start: position,
            end: position,
        }
    }

    /// Unifica un rango de ubicaciones.
    pub fn span(from: Location, to: &Location) -> Self {
        Location {
            start: from.start,
            end: to.end,
        }
    }

    /// Obtiene la posición de inicio.
    pub fn start(&self) -> Position {
        self.start
    }

    /// Obtiene la posición de fin (inclusiva).
    pub fn end(&self) -> Position {
        self.end
    }
}

impl Display for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            // Solo se señala una columna en específico
            write!(formatter, "{}", self.start)
        } else {
            write!(formatter, "[{}-{}]", self.start, self.end)
        }
    }
}

impl Debug for Location {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        <Self as Display>::fmt(self, formatter)
    }
}

/// Una posición línea-columna en un archivo.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Position {
    offset: usize,
    line: u32,
    column: u32,
}

impl Position {
    /// Obtiene el desplazamiento en bytes desde el inicio del texto.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Obtiene el número de línea.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// Obtiene el número de columna.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// Posición que sigue a un carácter que se encuentra en `self`.
    pub fn after(self, c: char) -> Position {
        let offset = self.offset + c.len_utf8();
        let Position { line, column, .. } = match c {
            '\n' => self.newline(),
            '\t' => self.tab(),
            _ => self.advance(),
        };

        Position {
            offset,
            line,
            column,
        }
    }

    /// Incrementa el número de columna.
    fn advance(self) -> Position {
        Position {
            column: self.column + 1,
            ..self
        }
    }

    /// Incrementa el número de línea y retorna a la columna 1.
    fn newline(self) -> Position {
        Position {
            line: self.line + 1,
            column: 1,
            ..self
        }
    }

    /// Ajusta la posición a la siguiente columna de tabulador.
    fn tab(self) -> Position {
        let column = 1 + ((self.column - 1) / TAB_STOP + 1) * TAB_STOP;
        Position { column, ..self }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Display for Position {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}", self.line, self.column)
    }
}

/// Un archivo de código fuente con nombre.
pub struct Source {
    name: String,
    text: String,
}

impl Source {
    /// Construye a partir de un nombre de origen y el texto completo.
    pub fn new<N, T>(name: N, text: T) -> Self
    where
        N: Into<String>,
        T: Into<String>,
    {
        Source {
            name: name.into(),
            text: text.into(),
        }
    }

    /// Lee por completo un flujo de entrada.
    pub fn read<R, N>(mut reader: R, name: N) -> io::Result<Self>
    where
        R: Read,
        N: Into<String>,
    {
        let mut text = String::new();
        reader.read_to_string(&mut text)?;

        Ok(Source::new(name, text))
    }

    /// Nombre de origen, usualmente una ruta.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Texto completo.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Obtiene una línea por número, comenzando en 1.
    pub fn line(&self, number: u32) -> Option<&str> {
        let index = (number as usize).checked_sub(1)?;
        self.text.lines().nth(index)
    }
}
