pub mod run;
pub mod seal;
