//! Recorre las cuatro fases sobre un programa de ejemplo, imprimiendo
//! el producto de cada una.

use toyc::{semantic::SymbolTable, source::Source};

const SOURCE: &str = "
x = 10;
y = 20;
if (x > 5) {
    z = 100;
} else {
    z = 0;
}
";

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().without_time().init();

    let source = Source::new("<demo>", SOURCE);
    println!("=== Source ===\n{}\n", source.text().trim());

    let tokens = match toyc::tokenize(source.text()) {
        Ok(tokens) => tokens,
        Err(error) => anyhow::bail!("{} at {}", error.val(), error.location()),
    };

    println!("=== Tokens ===");
    for token in &tokens {
        println!("{:>10}  {}", token.location().to_string(), token.val());
    }

    let program = match toyc::parse(&tokens) {
        Ok(program) => program,
        Err(error) => anyhow::bail!("{} at {}", error.val(), error.location()),
    };

    println!("\n=== Parse tree ===\n{}", program.pretty());

    let analysis = toyc::check(&program, SymbolTable::new());
    println!("=== Semantic checks ===");
    for warning in &analysis.warnings {
        println!("warning: {} at {}", warning.val(), warning.location());
    }

    println!("{} warning(s), {} symbol(s) defined\n", analysis.warnings.len(), analysis.symbols.len());

    println!("=== Target code ===");
    for line in toyc::generate(&program) {
        println!("{}", line);
    }

    Ok(())
}
