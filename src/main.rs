//! Terminal build of the badge interpreter.

mod term;

fn main() {
    term::main();
}
