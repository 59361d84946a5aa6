fn main() {
    drill::main();
}
