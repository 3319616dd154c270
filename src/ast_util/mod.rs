pub mod parens;
pub mod precedence;
pub mod statement_head;
