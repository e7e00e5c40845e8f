//! Generación de código.
//!
//! Traduce un árbol sintáctico a un listado lineal de instrucciones.
//! Esta fase es total: cualquier árbol que el parser acepte produce
//! código, haya o no advertencias semánticas.
//!
//! Cada `if` reserva dos etiquetas frescas, primero la de `else` y
//! luego la de fin, en el orden de un recorrido en preorden. La
//! etiqueta de `else` se emite aunque la rama no exista, de forma que
//! el salto por condición falsa siempre tenga un destino definido.

use std::io::{self, Write};

use crate::{
    ir::{Instruction, Label},
    parse::{Condition, Program, Statement},
};

/// Genera las instrucciones de un programa.
///
/// El contador de etiquetas es local a cada invocación, por lo cual
/// dos invocaciones sobre el mismo árbol producen la misma salida.
pub fn emit(program: &Program) -> Vec<Instruction> {
    let mut cx = Context {
        last_label: 0,
        output: Vec::new(),
    };

    cx.emit_block(&program.statements);
    tracing::debug!(
        instructions = cx.output.len(),
        labels = cx.last_label,
        "generated code"
    );

    cx.output
}

/// Genera el listado textual de un programa, una línea por instrucción.
pub fn generate(program: &Program) -> Vec<String> {
    emit(program).iter().map(Instruction::to_string).collect()
}

/// Escribe un listado, opcionalmente con anotaciones de operadores.
pub fn write<W: Write>(instructions: &[Instruction], annotate: bool, output: &mut W) -> io::Result<()> {
    for instruction in instructions {
        if annotate {
            writeln!(output, "{:#}", instruction)?;
        } else {
            writeln!(output, "{}", instruction)?;
        }
    }

    Ok(())
}

/// Estado de una única pasada de generación.
struct Context {
    last_label: u32,
    output: Vec<Instruction>,
}

impl Context {
    fn new_label(&mut self) -> Label {
        self.last_label += 1;
        Label(self.last_label)
    }

    fn push(&mut self, instruction: Instruction) {
        self.output.push(instruction);
    }

    fn emit_block(&mut self, block: &[Statement]) {
        for statement in block {
            self.emit_statement(statement);
        }
    }

    fn emit_statement(&mut self, statement: &Statement) {
        match statement {
            Statement::Assignment { target, value } => self.push(Instruction::Move {
                target: target.val().clone(),
                value: value.val().clone(),
            }),

            Statement::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let else_label = self.new_label();
                let end_label = self.new_label();

                self.emit_condition(condition);
                self.push(Instruction::JumpIfFalse(else_label));

                self.emit_block(then_branch);
                self.push(Instruction::Jump(end_label));

                self.push(Instruction::SetLabel(else_label));
                if let Some(else_branch) = else_branch {
                    self.emit_block(else_branch);
                }

                self.push(Instruction::SetLabel(end_label));
            }
        }
    }

    fn emit_condition(&mut self, condition: &Condition) {
        self.push(Instruction::Compare {
            left: condition.left.val().clone(),
            op: *condition.op.val(),
            right: condition.right.val().clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lex::{Identifier, Literal, RelOp},
        parse::Expr,
        source::Located,
    };

    fn assign(target: &str, value: u32) -> Statement {
        Statement::Assignment {
            target: Located::synthetic(Identifier::new(target)),
            value: Located::synthetic(Expr::Integer(Literal::from(value))),
        }
    }

    fn branch(
        left: &str,
        op: RelOp,
        right: u32,
        then_branch: Vec<Statement>,
        else_branch: Option<Vec<Statement>>,
    ) -> Statement {
        Statement::If {
            condition: Condition {
                left: Located::synthetic(Identifier::new(left)),
                op: Located::synthetic(op),
                right: Located::synthetic(Expr::Integer(Literal::from(right))),
            },
            then_branch,
            else_branch,
        }
    }

    #[test]
    fn assignments_in_order() {
        let program = Program {
            statements: vec![assign("x", 10), assign("y", 20)],
        };

        assert_eq!(generate(&program), vec!["MOV x, 10", "MOV y, 20"]);
    }

    #[test]
    fn if_else() {
        let program = Program {
            statements: vec![branch(
                "x",
                RelOp::Greater,
                5,
                vec![assign("z", 100)],
                Some(vec![assign("z", 0)]),
            )],
        };

        assert_eq!(
            generate(&program),
            vec!["CMP x, 5", "JMP_FALSE L1", "MOV z, 100", "JMP L2", "L1:", "MOV z, 0", "L2:"]
        );
    }

    #[test]
    fn if_without_else_still_emits_else_label() {
        let program = Program {
            statements: vec![branch("x", RelOp::Equal, 1, vec![assign("y", 1)], None)],
        };

        assert_eq!(
            generate(&program),
            vec!["CMP x, 1", "JMP_FALSE L1", "MOV y, 1", "JMP L2", "L1:", "L2:"]
        );
    }

    #[test]
    fn labels_follow_preorder() {
        let inner = branch("b", RelOp::Less, 2, vec![assign("c", 3)], None);
        let program = Program {
            statements: vec![
                branch("a", RelOp::Greater, 1, vec![inner], Some(vec![assign("d", 4)])),
                branch("e", RelOp::NotEqual, 5, vec![], None),
            ],
        };

        assert_eq!(
            generate(&program),
            vec![
                "CMP a, 1",
                "JMP_FALSE L1",
                "CMP b, 2",
                "JMP_FALSE L3",
                "MOV c, 3",
                "JMP L4",
                "L3:",
                "L4:",
                "JMP L2",
                "L1:",
                "MOV d, 4",
                "L2:",
                "CMP e, 5",
                "JMP_FALSE L5",
                "JMP L6",
                "L5:",
                "L6:",
            ]
        );
    }

    #[test]
    fn literals_are_emitted_verbatim() {
        let literal = |digits: &str| Located::synthetic(Expr::Integer(Literal::new(digits).unwrap()));
        let program = Program {
            statements: vec![
                Statement::Assignment {
                    target: Located::synthetic(Identifier::new("x")),
                    value: literal("007"),
                },
                Statement::If {
                    condition: Condition {
                        left: Located::synthetic(Identifier::new("x")),
                        op: Located::synthetic(RelOp::Less),
                        right: literal("2147483648"),
                    },
                    then_branch: vec![],
                    else_branch: None,
                },
            ],
        };

        let listing = generate(&program);
        assert_eq!(listing[0], "MOV x, 007");
        assert_eq!(listing[1], "CMP x, 2147483648");
    }

    #[test]
    fn independent_passes_are_identical() {
        let program = Program {
            statements: vec![
                branch("x", RelOp::Greater, 5, vec![assign("z", 1)], None),
                branch("x", RelOp::Greater, 6, vec![assign("z", 2)], None),
            ],
        };

        assert_eq!(generate(&program), generate(&program));
        assert_eq!(emit(&program), emit(&program));
    }

    #[test]
    fn operator_survives_in_ir() {
        let program = Program {
            statements: vec![branch("x", RelOp::GreaterOrEqual, 5, vec![], None)],
        };

        assert!(matches!(
            emit(&program).first(),
            Some(Instruction::Compare {
                op: RelOp::GreaterOrEqual,
                ..
            })
        ));

        let mut annotated = Vec::new();
        write(&emit(&program), true, &mut annotated).unwrap();
        let annotated = String::from_utf8(annotated).unwrap();

        assert_eq!(annotated.lines().next(), Some("CMP x, 5 ; >="));
    }
}
