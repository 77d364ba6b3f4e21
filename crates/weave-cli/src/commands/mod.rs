pub mod check;
pub mod generate;
pub mod operations;
pub mod print;
