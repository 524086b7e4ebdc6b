/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: The program root and the closed `Declaration` / `Expr` enums
/// - expressions: Expression node structs and operators
/// - statements: Statement node structs
/// - types: The `DataType` lattice shared by every pass
pub mod ast;
pub mod expressions;
pub mod statements;
pub mod types;
