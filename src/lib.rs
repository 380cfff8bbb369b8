#[macro_use] extern crate log;
#[macro_use] extern crate lazy_static;
extern crate regex;

pub mod assembler;
