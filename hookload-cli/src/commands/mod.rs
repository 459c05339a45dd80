pub mod check;
pub mod paths;
