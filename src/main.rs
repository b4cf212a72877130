fn main() {
    acid::cli::run();
}
