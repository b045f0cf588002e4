mod common;
mod file;
