//! Representación de pseudo-ensamblador.
//!
//! Las instrucciones se mantienen tipadas hasta el momento de
//! escribirlas. La forma textual estándar no incluye el operador
//! relacional de `CMP`; la forma alterna (`{:#}`) lo agrega como
//! comentario al final de la línea.

use std::fmt::{self, Display};

use crate::{lex::{Identifier, RelOp}, parse::Expr};

/// Destino de un salto.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Label(pub u32);

impl Display for Label {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Label(number) = self;
        write!(fmt, "L{}", number)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// `MOV target, value`
    Move { target: Identifier, value: Expr },

    /// `CMP left, right`
    ///
    /// `op` es el operador original. Un `JMP_FALSE` posterior salta
    /// cuando `left op right` es falso.
    Compare {
        left: Identifier,
        op: RelOp,
        right: Expr,
    },

    /// `JMP_FALSE label`
    JumpIfFalse(Label),

    /// `JMP label`
    Jump(Label),

    /// `label:`
    SetLabel(Label),
}

impl Display for Instruction {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        match self {
            Move { target, value } => write!(fmt, "MOV {}, {}", target, value),
            Compare { left, op, right } => {
                write!(fmt, "CMP {}, {}", left, right)?;
                if fmt.alternate() {
                    write!(fmt, " ; {}", op)?;
                }

                Ok(())
            }

            JumpIfFalse(label) => write!(fmt, "JMP_FALSE {}", label),
            Jump(label) => write!(fmt, "JMP {}", label),
            SetLabel(label) => write!(fmt, "{}:", label),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lex::Literal;

    #[test]
    fn textual_forms() {
        let compare = Instruction::Compare {
            left: Identifier::new("x"),
            op: RelOp::LessOrEqual,
            right: Expr::Integer(Literal::from(5)),
        };

        assert_eq!(compare.to_string(), "CMP x, 5");
        assert_eq!(format!("{:#}", compare), "CMP x, 5 ; <=");

        let assign = Instruction::Move {
            target: Identifier::new("z"),
            value: Expr::Integer(Literal::from(100)),
        };

        assert_eq!(assign.to_string(), "MOV z, 100");
        assert_eq!(format!("{:#}", assign), "MOV z, 100");
        assert_eq!(Instruction::JumpIfFalse(Label(1)).to_string(), "JMP_FALSE L1");
        assert_eq!(Instruction::Jump(Label(2)).to_string(), "JMP L2");
        assert_eq!(Instruction::SetLabel(Label(3)).to_string(), "L3:");
    }
}
