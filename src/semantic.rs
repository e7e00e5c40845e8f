//! Análisis semántico.
//!
//! Recorre el árbol en preorden, de izquierda a derecha, llevando una
//! tabla de símbolos global. Las asignaciones definen variables y las
//! condiciones las consultan. Usar una variable en una condición antes
//! de asignarla produce una advertencia, nunca un error fatal: la
//! generación de código procede de todos modos y es decisión de quien
//! invoca tratar las advertencias como bloqueantes.

use std::collections::BTreeSet;

use thiserror::Error;

use crate::{
    lex::Identifier,
    parse::{Condition, Program, Statement},
    source::Located,
};

/// Conjunto de variables definidas hasta el momento.
///
/// No existen ámbitos anidados. La presencia de un nombre en la
/// tabla es lo único que se registra.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: BTreeSet<Identifier>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registra una definición. Redefinir no tiene efecto adicional.
    pub fn define(&mut self, id: Identifier) {
        self.symbols.insert(id);
    }

    pub fn is_defined(&self, id: &Identifier) -> bool {
        self.symbols.contains(id)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Itera en orden lexicográfico.
    pub fn iter(&self) -> impl Iterator<Item = &Identifier> {
        self.symbols.iter()
    }
}

impl FromIterator<Identifier> for SymbolTable {
    fn from_iter<T: IntoIterator<Item = Identifier>>(iter: T) -> Self {
        SymbolTable {
            symbols: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a str> for SymbolTable {
    fn from_iter<T: IntoIterator<Item = &'a str>>(iter: T) -> Self {
        iter.into_iter().map(Identifier::new).collect()
    }
}

#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SemanticError {
    #[error("Variable `{0}` used in `if` condition before assignment")]
    UseBeforeDefinition(Identifier),
}

/// Resultado de una pasada semántica.
#[derive(Debug)]
pub struct Analysis {
    /// Tabla de símbolos al terminar el recorrido.
    pub symbols: SymbolTable,

    /// Advertencias, en orden de recorrido.
    pub warnings: Vec<Located<SemanticError>>,
}

/// Verifica un programa a partir de una tabla de símbolos inicial,
/// posiblemente vacía.
pub fn check(program: &Program, symbols: SymbolTable) -> Analysis {
    let mut context = Context {
        symbols,
        warnings: Vec::new(),
    };

    tracing::debug!("checking program");
    context.scan_block(&program.statements);

    let Context { symbols, warnings } = context;
    Analysis { symbols, warnings }
}

struct Context {
    symbols: SymbolTable,
    warnings: Vec<Located<SemanticError>>,
}

impl Context {
    fn scan_block(&mut self, block: &[Statement]) {
        for statement in block {
            self.scan_statement(statement);
        }
    }

    fn scan_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Assignment { target, .. } => {
                tracing::debug!(variable = %target.val(), "variable defined/updated");
                self.symbols.define(target.val().clone());
            }

            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.scan_condition(condition);
                self.scan_block(then_branch);

                if let Some(else_branch) = else_branch {
                    self.scan_block(else_branch);
                }
            }
        }
    }

    fn scan_condition(&mut self, condition: &Condition) {
        let left = &condition.left;
        if self.symbols.is_defined(left.val()) {
            tracing::debug!(variable = %left.val(), "condition variable is valid");
        } else {
            tracing::warn!(
                variable = %left.val(),
                location = %left.location(),
                "variable used in `if` condition before assignment"
            );

            self.warnings.push(Located::at(
                SemanticError::UseBeforeDefinition(left.val().clone()),
                *left.location(),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lex::{Literal, RelOp},
        parse::{Condition, Expr},
    };

    fn assign(target: &str, value: u32) -> Statement {
        Statement::Assignment {
            target: Located::synthetic(Identifier::new(target)),
            value: Located::synthetic(Expr::Integer(Literal::from(value))),
        }
    }

    fn branch(
        left: &str,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    ) -> Statement {
        Statement::If {
            condition: Condition {
                left: Located::synthetic(Identifier::new(left)),
                op: Located::synthetic(RelOp::Greater),
                right: Located::synthetic(Expr::Integer(Literal::from(5))),
            },
            then_branch,
            else_branch,
        }
    }

    fn warned(analysis: &Analysis) -> Vec<String> {
        analysis
            .warnings
            .iter()
            .map(|warning| match warning.val() {
                SemanticError::UseBeforeDefinition(id) => id.to_string(),
            })
            .collect()
    }

    #[test]
    fn defined_before_use() {
        let program = Program {
            statements: vec![assign("x", 10), branch("x", vec![assign("z", 1)], None)],
        };

        let analysis = check(&program, SymbolTable::new());
        assert!(analysis.warnings.is_empty());
        assert_eq!(analysis.symbols, ["x", "z"].into_iter().collect());
    }

    #[test]
    fn use_before_definition() {
        let program = Program {
            statements: vec![branch("y", vec![assign("y", 1)], None), assign("x", 10)],
        };

        let analysis = check(&program, SymbolTable::new());
        assert_eq!(warned(&analysis), vec!["y"]);
    }

    #[test]
    fn seeded_symbols_count_as_defined() {
        let program = Program {
            statements: vec![branch("x", vec![], None)],
        };

        let analysis = check(&program, ["x"].into_iter().collect());
        assert!(analysis.warnings.is_empty());
    }

    #[test]
    fn traversal_is_preorder() {
        // `a` se define en la rama `then` antes de que la condición
        // anidada la consulte; `b` solo se define en la rama `else`,
        // que se visita después
        let program = Program {
            statements: vec![
                assign("x", 1),
                branch(
                    "x",
                    vec![assign("a", 1), branch("a", vec![], None), branch("b", vec![], None)],
                    Some(vec![assign("b", 2)]),
                ),
                branch("b", vec![], None),
            ],
        };

        let analysis = check(&program, SymbolTable::new());
        assert_eq!(warned(&analysis), vec!["b"]);
        assert!(analysis.symbols.is_defined(&Identifier::new("b")));
    }

    #[test]
    fn every_undefined_use_is_reported() {
        let program = Program {
            statements: vec![branch("q", vec![], None), branch("q", vec![], None)],
        };

        let analysis = check(&program, SymbolTable::new());
        assert_eq!(warned(&analysis), vec!["q", "q"]);
        assert!(analysis.symbols.is_empty());
    }
}
