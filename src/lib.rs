//! Compilador para un lenguaje imperativo mínimo.
//!
//! # Front end
//! Cada programa deriva de un único texto fuente. Este texto se somete
//! primero a análisis léxico en [`lex`], de lo cual se obtiene un flujo
//! de tokens. El flujo de tokens se dispone en un AST por medio de
//! análisis sintáctico en [`parse`]. El árbol sintáctico es verificado
//! por análisis semántico en [`semantic`], que detecta variables usadas
//! antes de ser asignadas.
//!
//! # Back end
//! El árbol verificado se traduce en [`codegen`] a un listado plano de
//! pseudo-ensamblador, cuyas instrucciones se describen en [`ir`].
//!
//! Cada fase es una función pura de su entrada más un estado local a
//! la fase (tabla de símbolos, contador de etiquetas). Compilaciones
//! independientes nunca comparten estado.

use bitflags::bitflags;

pub mod codegen;
pub mod error;
pub mod ir;
pub mod lex;
pub mod parse;
pub mod semantic;
pub mod source;

pub use codegen::generate;
pub use lex::tokenize;
pub use parse::parse;
pub use semantic::check;

use crate::{
    error::Diagnostics,
    ir::Instruction,
    lex::Token,
    parse::Program,
    semantic::{SemanticError, SymbolTable},
    source::{Located, Source},
};

bitflags! {
    /// Opciones de compilación.
    pub struct CompileOptions: u32 {
        /// Tratar advertencias semánticas como errores.
        const DENY_WARNINGS = 0x01;

        /// Anotar cada `CMP` con su operador relacional.
        const ANNOTATE = 0x02;
    }
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions::empty()
    }
}

/// Productos de todas las fases de una compilación exitosa.
#[derive(Debug)]
pub struct Compilation {
    pub tokens: Vec<Located<Token>>,
    pub program: Program,
    pub symbols: SymbolTable,
    pub warnings: Vec<Located<SemanticError>>,
    pub instructions: Vec<Instruction>,
    options: CompileOptions,
}

impl Compilation {
    /// Listado final, una línea por instrucción.
    pub fn listing(&self) -> Vec<String> {
        self.instructions
            .iter()
            .map(|instruction| {
                if self.options.contains(CompileOptions::ANNOTATE) {
                    format!("{:#}", instruction)
                } else {
                    instruction.to_string()
                }
            })
            .collect()
    }

    /// Advertencias semánticas como diagnósticos presentables.
    pub fn warning_report(&self) -> Diagnostics {
        Diagnostics::from(self.warnings.clone())
            .kind("warning")
            .non_fatal()
    }
}

/// Ejecuta únicamente el análisis léxico.
///
/// A diferencia de [`compile`], un texto con errores sintácticos o
/// semánticos produce sus tokens de todos modos.
pub fn scan(source: &Source) -> Result<Vec<Located<Token>>, Diagnostics> {
    tokenize(source.text()).map_err(|error| Diagnostics::from(error).kind("Lexical error"))
}

/// Ejecuta todas las fases sobre un texto fuente.
///
/// Errores léxicos y sintácticos siempre abortan. Las advertencias
/// semánticas solo lo hacen con [`CompileOptions::DENY_WARNINGS`].
pub fn compile(
    source: &Source,
    symbols: SymbolTable,
    options: CompileOptions,
) -> Result<Compilation, Diagnostics> {
    let _span = tracing::debug_span!("compile", source = source.name()).entered();

    let tokens = scan(source)?;
    let program = parse(&tokens).map_err(|error| Diagnostics::from(error).kind("Syntax error"))?;

    let semantic::Analysis { symbols, warnings } = check(&program, symbols);
    if options.contains(CompileOptions::DENY_WARNINGS) && !warnings.is_empty() {
        return Err(Diagnostics::from(warnings).kind("Semantic error"));
    }

    let instructions = codegen::emit(&program);

    Ok(Compilation {
        tokens,
        program,
        symbols,
        warnings,
        instructions,
        options,
    })
}
